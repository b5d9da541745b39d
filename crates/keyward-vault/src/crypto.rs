// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM envelope: `nonce[12] || ciphertext || tag[16]`.
//!
//! Every call to [`seal`] draws a fresh 96-bit nonce from the system CSPRNG.
//! Nonce reuse under one key would break GCM confidentiality and integrity.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use keyward_core::CodecError;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// A 32-byte AES-256-GCM key, zeroed on drop.
#[derive(Clone)]
pub struct EncryptionKey(Zeroizing<[u8; KEY_LEN]>);

impl EncryptionKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Parse the configuration form: standard base64 of exactly 32 bytes.
    pub fn from_base64(encoded: &str) -> Result<Self, CodecError> {
        let decoded = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|e| CodecError::InvalidEncryptionKey(format!("not valid base64: {e}")))?,
        );
        let bytes: [u8; KEY_LEN] = decoded.as_slice().try_into().map_err(|_| {
            CodecError::InvalidEncryptionKey(format!(
                "expected {KEY_LEN} bytes, got {}",
                decoded.len()
            ))
        })?;
        Ok(Self::from_bytes(bytes))
    }

    /// Generate a random key from the system CSPRNG.
    pub fn generate() -> Result<Self, CodecError> {
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        SystemRandom::new()
            .fill(&mut bytes[..])
            .map_err(|_| CodecError::Crypto("failed to generate random key".to_string()))?;
        Ok(Self(bytes))
    }

    /// The configuration form of this key.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0[..])
    }

    fn aead_key(&self) -> Result<LessSafeKey, CodecError> {
        let unbound = UnboundKey::new(&AES_256_GCM, &self.0[..])
            .map_err(|_| CodecError::Crypto("failed to create AES-256-GCM key".to_string()))?;
        Ok(LessSafeKey::new(unbound))
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

/// Encrypt `plaintext`, returning `nonce || ciphertext || tag`.
pub fn seal(key: &EncryptionKey, plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
    let aead = key.aead_key()?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| CodecError::Crypto("failed to generate random nonce".to_string()))?;

    let mut in_out = plaintext.to_vec();
    aead.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(nonce_bytes),
        Aad::empty(),
        &mut in_out,
    )
    .map_err(|_| CodecError::Crypto("AES-256-GCM encryption failed".to_string()))?;

    let mut envelope = Vec::with_capacity(NONCE_LEN + in_out.len());
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&in_out);
    Ok(envelope)
}

/// Decrypt an envelope produced by [`seal`].
///
/// A failed tag check is reported as [`CodecError::KeyChanged`]: with an
/// intact envelope the only way to get there is a different key.
pub fn open(key: &EncryptionKey, envelope: &[u8]) -> Result<Zeroizing<Vec<u8>>, CodecError> {
    if envelope.len() < NONCE_LEN {
        return Err(CodecError::CiphertextTooShort);
    }
    let (nonce_bytes, ciphertext) = envelope.split_at(NONCE_LEN);
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
        .map_err(|_| CodecError::CiphertextTooShort)?;

    let aead = key.aead_key()?;
    let mut in_out = Zeroizing::new(ciphertext.to_vec());
    let plaintext = aead
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| CodecError::KeyChanged)?;

    Ok(Zeroizing::new(plaintext.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let key = EncryptionKey::generate().unwrap();
        let envelope = seal(&key, b"{\"login\":\"deploy\"}").unwrap();
        let plaintext = open(&key, &envelope).unwrap();
        assert_eq!(plaintext.as_slice(), b"{\"login\":\"deploy\"}");
    }

    #[test]
    fn envelope_is_nonce_plus_ciphertext_plus_tag() {
        let key = EncryptionKey::generate().unwrap();
        let envelope = seal(&key, b"hello").unwrap();
        assert_eq!(envelope.len(), NONCE_LEN + 5 + 16);
    }

    #[test]
    fn nonces_are_fresh_per_call() {
        let key = EncryptionKey::generate().unwrap();
        let a = seal(&key, b"same input").unwrap();
        let b = seal(&key, b"same input").unwrap();
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_reports_key_changed() {
        let k1 = EncryptionKey::from_bytes([1u8; KEY_LEN]);
        let k2 = EncryptionKey::from_bytes([2u8; KEY_LEN]);
        let envelope = seal(&k1, b"secret").unwrap();
        assert_eq!(open(&k2, &envelope).unwrap_err(), CodecError::KeyChanged);
    }

    #[test]
    fn tampered_ciphertext_reports_key_changed() {
        let key = EncryptionKey::generate().unwrap();
        let mut envelope = seal(&key, b"do not tamper").unwrap();
        envelope[NONCE_LEN] ^= 0x01;
        assert_eq!(open(&key, &envelope).unwrap_err(), CodecError::KeyChanged);
    }

    #[test]
    fn envelope_shorter_than_nonce_is_too_short() {
        let key = EncryptionKey::generate().unwrap();
        assert_eq!(
            open(&key, &[0u8; NONCE_LEN - 1]).unwrap_err(),
            CodecError::CiphertextTooShort
        );
    }

    #[test]
    fn envelope_with_nonce_but_no_full_tag_reports_key_changed() {
        let key = EncryptionKey::generate().unwrap();
        let tag_len = AES_256_GCM.tag_len();
        for len in [NONCE_LEN, NONCE_LEN + 1, NONCE_LEN + tag_len - 1] {
            assert_eq!(
                open(&key, &vec![0u8; len]).unwrap_err(),
                CodecError::KeyChanged,
                "envelope of {len} bytes"
            );
        }
    }

    #[test]
    fn key_parses_from_base64() {
        let key = EncryptionKey::from_bytes([9u8; KEY_LEN]);
        let parsed = EncryptionKey::from_base64(&key.to_base64()).unwrap();
        let envelope = seal(&key, b"x").unwrap();
        assert!(open(&parsed, &envelope).is_ok());
    }

    #[test]
    fn key_of_wrong_length_is_rejected() {
        let err = EncryptionKey::from_base64(&STANDARD.encode([0u8; 16])).unwrap_err();
        assert!(matches!(err, CodecError::InvalidEncryptionKey(msg) if msg.contains("got 16")));
    }

    #[test]
    fn debug_redacts_key() {
        let key = EncryptionKey::from_bytes([0xAB; KEY_LEN]);
        assert_eq!(format!("{key:?}"), "EncryptionKey([REDACTED])");
    }
}
