// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Keyward credential vault.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Keyward configuration.
///
/// Loaded once per process and treated as immutable afterwards; the codec and
/// agent manager receive the pieces they need at construction.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeywardConfig {
    /// Access key secret encryption.
    #[serde(default)]
    pub access_key: AccessKeyConfig,

    /// Runtime filesystem locations.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Access key encryption settings.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AccessKeyConfig {
    /// Base64 encoding of a 32-byte AES-256 key. `None` or empty stores
    /// secrets base64-encoded without encryption.
    #[serde(default)]
    pub encryption: Option<String>,
}

impl AccessKeyConfig {
    /// The configured key, with empty strings treated as absent.
    pub fn encryption(&self) -> Option<&str> {
        self.encryption
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl std::fmt::Debug for AccessKeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessKeyConfig")
            .field("encryption", &self.encryption().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Runtime paths.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Directory where per-job SSH agent sockets are created.
    #[serde(default = "default_tmp_path")]
    pub tmp_path: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tmp_path: default_tmp_path(),
        }
    }
}

fn default_tmp_path() -> String {
    std::env::temp_dir().join("keyward").display().to_string()
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
