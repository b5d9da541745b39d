// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints serde cannot express: the encryption key
//! must decode to exactly 32 bytes, the socket directory must be set, and the
//! log level must be a known name.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::diagnostic::ConfigError;
use crate::model::KeywardConfig;

/// AES-256 key length in bytes.
pub const ENCRYPTION_KEY_LEN: usize = 32;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &KeywardConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if let Some(key) = config.access_key.encryption() {
        match STANDARD.decode(key) {
            Ok(bytes) if bytes.len() == ENCRYPTION_KEY_LEN => {}
            Ok(bytes) => errors.push(ConfigError::Validation {
                message: format!(
                    "access_key.encryption must decode to {ENCRYPTION_KEY_LEN} bytes, got {}",
                    bytes.len()
                ),
            }),
            Err(e) => errors.push(ConfigError::Validation {
                message: format!("access_key.encryption is not valid base64: {e}"),
            }),
        }
    }

    if config.runtime.tmp_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "runtime.tmp_path must not be empty".to_string(),
        });
    }

    let level = config.logging.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{}` is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
