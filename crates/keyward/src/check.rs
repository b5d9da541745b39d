// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keyward check`: report the effective configuration.

use std::io::Write;
use std::path::Path;

use keyward_config::KeywardConfig;
use keyward_core::KeywardError;
use keyward_vault::SecretCodec;

pub fn check(config: &KeywardConfig, out: &mut impl Write) -> Result<(), KeywardError> {
    let codec = SecretCodec::from_config(&config.access_key)?;
    let encryption = if codec.is_encrypted() {
        "enabled (AES-256-GCM)"
    } else {
        "disabled, secrets are stored base64-encoded only"
    };

    let tmp_path = Path::new(&config.runtime.tmp_path);
    let socket_dir = if tmp_path.is_dir() {
        "exists"
    } else {
        "missing, created when the first agent starts"
    };

    let report = format!(
        "config: ok\nencryption: {encryption}\nsocket directory: {} ({socket_dir})\nlog level: {}\n",
        tmp_path.display(),
        config.logging.level,
    );
    out.write_all(report.as_bytes())
        .map_err(|e| KeywardError::Internal(format!("write output: {e}")))
}
