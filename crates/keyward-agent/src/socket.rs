// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent socket naming.

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

/// Length of the random part of an agent socket name.
pub const SOCKET_SUFFIX_LEN: usize = 10;

/// Alphanumeric suffix drawn from the OS CSPRNG.
pub fn random_suffix() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(SOCKET_SUFFIX_LEN)
        .map(char::from)
        .collect()
}

/// `ssh-agent-<key id>-<suffix>.sock`
pub fn socket_file_name(key_id: i64, suffix: &str) -> String {
    format!("ssh-agent-{key_id}-{suffix}.sock")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn suffix_is_ten_alphanumeric_chars() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), SOCKET_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn suffixes_do_not_repeat() {
        let suffixes: HashSet<String> = (0..100).map(|_| random_suffix()).collect();
        assert_eq!(suffixes.len(), 100);
    }

    #[test]
    fn file_name_carries_key_id() {
        assert_eq!(socket_file_name(42, "AbCdE12345"), "ssh-agent-42-AbCdE12345.sock");
    }
}
