// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keygen`, `seal` and `open`.

use std::io::{Read, Write};

use keyward_core::{AccessKeyType, KeywardError};
use keyward_vault::{AccessKey, LoginPassword, SecretCodec, SecretPayload, SshKey};
use tracing::debug;
use zeroize::Zeroizing;

pub fn keygen(out: &mut impl Write) -> Result<(), KeywardError> {
    let key = Zeroizing::new(SecretCodec::generate_key()?);
    writeln!(out, "{}", key.as_str()).map_err(write_error)
}

/// Read a payload and print its stored secret.
///
/// Structured types take JSON (`{"login": .., "private_key": ..}`); `string`
/// takes raw text with one trailing newline removed.
pub fn seal(
    codec: &SecretCodec,
    key_type: AccessKeyType,
    input: impl Read,
    out: &mut impl Write,
) -> Result<(), KeywardError> {
    let raw = read_all(input)?;
    let payload = match key_type {
        AccessKeyType::None => SecretPayload::None,
        AccessKeyType::String => {
            let text = raw.strip_suffix('\n').unwrap_or(&raw);
            SecretPayload::String(text.to_string())
        }
        AccessKeyType::Ssh => SecretPayload::Ssh(parse_json::<SshKey>(&raw)?),
        AccessKeyType::LoginPassword => {
            SecretPayload::LoginPassword(parse_json::<LoginPassword>(&raw)?)
        }
    };

    let mut key = AccessKey::new("stdin", payload);
    codec.serialize(&mut key)?;
    debug!(%key_type, encrypted = codec.is_encrypted(), "sealed payload");

    match key.secret() {
        Some(secret) => writeln!(out, "{secret}").map_err(write_error),
        None => {
            eprintln!("keyward: payload is empty, nothing to store");
            Ok(())
        }
    }
}

/// Read a stored secret and print its payload as JSON.
pub fn open(
    codec: &SecretCodec,
    key_type: AccessKeyType,
    name: &str,
    input: impl Read,
    out: &mut impl Write,
) -> Result<(), KeywardError> {
    let raw = read_all(input)?;
    // Legacy keys are stored verbatim and keep their trailing newline.
    let secret = if raw.trim_start().starts_with("-----BEGIN") {
        raw.to_string()
    } else {
        raw.trim().to_string()
    };

    let key = AccessKey::from_stored(0, name, key_type, Some(secret));
    let payload = codec.decode(&key)?;
    let json = Zeroizing::new(
        serde_json::to_string_pretty(&payload)
            .map_err(|e| KeywardError::Internal(format!("encode payload: {e}")))?,
    );
    writeln!(out, "{}", json.as_str()).map_err(write_error)
}

fn read_all(mut input: impl Read) -> Result<Zeroizing<String>, KeywardError> {
    let mut buf = Zeroizing::new(String::new());
    input
        .read_to_string(&mut buf)
        .map_err(|e| KeywardError::Internal(format!("read stdin: {e}")))?;
    Ok(buf)
}

fn parse_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, KeywardError> {
    serde_json::from_str(raw)
        .map_err(|e| KeywardError::Validation(format!("payload must be a JSON object: {e}")))
}

fn write_error(e: std::io::Error) -> KeywardError {
    KeywardError::Internal(format!("write output: {e}"))
}
