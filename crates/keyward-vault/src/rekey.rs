// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Re-encryption of stored access keys after the encryption key changes.
//!
//! Records are decoded with the previous codec and serialized again with the
//! current one. The caller persists the records afterwards; records that
//! fail are left untouched so a partial run can simply be repeated.

use keyward_core::AccessKeyType;
use tracing::{info, warn};

use crate::access_key::{AccessKey, SecretPayload};
use crate::codec::SecretCodec;

/// What a re-keying pass did.
#[derive(Debug, Default)]
pub struct RekeyReport {
    /// IDs of records whose secret was re-encrypted.
    pub rekeyed: Vec<i64>,
    /// IDs of records with nothing to re-encrypt.
    pub skipped: Vec<i64>,
    /// IDs of records that could not be decoded, with the reason.
    pub failed: Vec<(i64, String)>,
}

impl RekeyReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Re-encrypt `records` from `previous` to `current`.
pub fn rekey_access_keys(
    records: &mut [AccessKey],
    previous: &SecretCodec,
    current: &SecretCodec,
) -> RekeyReport {
    let mut report = RekeyReport::default();

    for record in records.iter_mut() {
        if record.key_type() == AccessKeyType::None || record.secret().is_none_or(str::is_empty) {
            report.skipped.push(record.id);
            continue;
        }

        let payload = match previous.decode(record) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key_id = record.id, error = %e, "cannot decode access key with previous key");
                report.failed.push((record.id, e.to_string()));
                continue;
            }
        };

        let mut rekeyed = record.clone();
        rekeyed.payload = payload;
        if let Err(e) = current.serialize(&mut rekeyed) {
            warn!(key_id = record.id, error = %e, "cannot re-encrypt access key");
            report.failed.push((record.id, e.to_string()));
            continue;
        }

        // The plaintext must not outlive this pass.
        rekeyed.payload = SecretPayload::empty(rekeyed.key_type());
        *record = rekeyed;
        report.rekeyed.push(record.id);
    }

    info!(
        rekeyed = report.rekeyed.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "access key re-encryption finished"
    );
    report
}
