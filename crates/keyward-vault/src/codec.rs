// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translation between an access key's plaintext payload and its persisted secret.
//!
//! Three stored shapes are understood, checked in this order:
//!
//! 1. a raw private key ending in `\n`, stored before encryption existed
//!    (SSH keys only);
//! 2. `base64(payload)` when no encryption key is configured;
//! 3. `base64(nonce || AES-256-GCM(payload))` otherwise.
//!
//! Structured payloads (SSH keys, login/password pairs) are JSON; string
//! payloads are the raw UTF-8 bytes.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use keyward_config::model::AccessKeyConfig;
use keyward_core::{AccessKeyType, CodecError, KeywardError};
use tracing::debug;
use zeroize::Zeroizing;

use crate::access_key::{AccessKey, LoginPassword, SecretPayload, SshKey};
use crate::crypto::{self, EncryptionKey};

/// Encrypts and decrypts access key secrets under one process-wide setting.
///
/// Without an encryption key the codec stores secrets base64-encoded only.
/// That mode is intentionally fail-open for installations that never
/// configured a key.
#[derive(Debug, Clone, Default)]
pub struct SecretCodec {
    key: Option<EncryptionKey>,
}

impl SecretCodec {
    pub fn new(key: Option<EncryptionKey>) -> Self {
        Self { key }
    }

    /// A codec that stores secrets base64-encoded without encryption.
    pub fn unencrypted() -> Self {
        Self { key: None }
    }

    pub fn from_config(config: &AccessKeyConfig) -> Result<Self, KeywardError> {
        let key = config
            .encryption()
            .map(EncryptionKey::from_base64)
            .transpose()?;
        Ok(Self { key })
    }

    pub fn is_encrypted(&self) -> bool {
        self.key.is_some()
    }

    pub fn encryption_key(&self) -> Option<&EncryptionKey> {
        self.key.as_ref()
    }

    /// Encrypt the record's payload into its persisted secret.
    ///
    /// Empty payloads clear the secret rather than storing an empty
    /// ciphertext. A passphrase or login without the field that makes the
    /// payload usable is rejected.
    pub fn serialize(&self, key: &mut AccessKey) -> Result<(), KeywardError> {
        let secret = match plaintext_of(&key.payload)? {
            Some(plaintext) => Some(self.encode(&plaintext)?),
            None => None,
        };
        debug!(
            key_id = key.id,
            key_type = %key.key_type(),
            encrypted = self.is_encrypted(),
            empty = secret.is_none(),
            "access key secret serialized"
        );
        key.set_secret(secret);
        Ok(())
    }

    /// Decode the record's secret back into its payload.
    pub fn deserialize(&self, key: &mut AccessKey) -> Result<(), KeywardError> {
        key.payload = self.decode(key)?;
        Ok(())
    }

    /// Decode the record's secret without touching the record.
    pub fn decode(&self, key: &AccessKey) -> Result<SecretPayload, KeywardError> {
        Self::decode_with(key, self.key.as_ref())
    }

    /// Decode using `encryption` instead of the codec's own key.
    ///
    /// Used when re-keying: records written under a previous key are read
    /// with that key and re-serialized with the current one.
    pub fn decode_with(
        key: &AccessKey,
        encryption: Option<&EncryptionKey>,
    ) -> Result<SecretPayload, KeywardError> {
        let key_type = key.key_type();
        let secret = match key.secret() {
            Some(secret) if !secret.is_empty() => secret,
            _ => return Ok(SecretPayload::empty(key_type)),
        };

        if secret.ends_with('\n') {
            if key_type != AccessKeyType::Ssh {
                return Err(CodecError::InvalidType.into());
            }
            debug!(key_id = key.id, "decoded legacy unencrypted private key");
            return Ok(SecretPayload::Ssh(SshKey::new("", "", secret)));
        }

        let decoded = Zeroizing::new(
            STANDARD
                .decode(secret)
                .map_err(|e| CodecError::Malformed(e.to_string()))?,
        );

        let plaintext = match encryption {
            None => decoded,
            Some(encryption) => crypto::open(encryption, &decoded)?,
        };

        payload_from(key_type, &key.name, &plaintext)
    }

    fn encode(&self, plaintext: &[u8]) -> Result<String, KeywardError> {
        let bytes = match &self.key {
            None => return Ok(STANDARD.encode(plaintext)),
            Some(encryption) => crypto::seal(encryption, plaintext)?,
        };
        Ok(STANDARD.encode(bytes))
    }

    /// Generate a fresh key in its configuration (base64) form.
    pub fn generate_key() -> Result<String, KeywardError> {
        Ok(EncryptionKey::generate()?.to_base64())
    }
}

/// The bytes to encrypt for a payload, or `None` when the payload is empty.
fn plaintext_of(payload: &SecretPayload) -> Result<Option<Zeroizing<Vec<u8>>>, KeywardError> {
    let bytes = match payload {
        SecretPayload::None => return Ok(None),
        SecretPayload::String(value) if value.is_empty() => return Ok(None),
        SecretPayload::String(value) => value.as_bytes().to_vec(),
        SecretPayload::Ssh(key) if key.private_key.is_empty() => {
            if !key.login.is_empty() || !key.passphrase.is_empty() {
                return Err(KeywardError::Validation("invalid ssh key".to_string()));
            }
            return Ok(None);
        }
        SecretPayload::Ssh(key) => to_json(key)?,
        SecretPayload::LoginPassword(pair) if pair.password.is_empty() => {
            if !pair.login.is_empty() {
                return Err(KeywardError::Validation("invalid password key".to_string()));
            }
            return Ok(None);
        }
        SecretPayload::LoginPassword(pair) => to_json(pair)?,
    };
    Ok(Some(Zeroizing::new(bytes)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, KeywardError> {
    serde_json::to_vec(value)
        .map_err(|e| KeywardError::Internal(format!("failed to encode secret payload: {e}")))
}

/// Route decoded bytes into the payload variant for `key_type`.
fn payload_from(
    key_type: AccessKeyType,
    name: &str,
    plaintext: &[u8],
) -> Result<SecretPayload, KeywardError> {
    let invalid = || CodecError::InvalidPayload {
        name: name.to_string(),
    };

    let payload = match key_type {
        AccessKeyType::None => SecretPayload::None,
        AccessKeyType::String => SecretPayload::String(
            String::from_utf8(plaintext.to_vec()).map_err(|_| invalid())?,
        ),
        AccessKeyType::Ssh => {
            SecretPayload::Ssh(serde_json::from_slice::<SshKey>(plaintext).map_err(|_| invalid())?)
        }
        AccessKeyType::LoginPassword => SecretPayload::LoginPassword(
            serde_json::from_slice::<LoginPassword>(plaintext).map_err(|_| invalid())?,
        ),
    };
    Ok(payload)
}
