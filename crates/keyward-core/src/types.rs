// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the vault, agent and installer crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The kind of secret an access key holds.
///
/// Determines which plaintext payload is valid for the record.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccessKeyType {
    Ssh,
    None,
    LoginPassword,
    String,
}

/// The context an access key is installed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum AccessKeyRole {
    /// Authenticating as the automation user on target hosts.
    #[strum(serialize = "ansible user")]
    AnsibleUser,
    /// Privilege escalation (become) credentials.
    #[strum(serialize = "ansible become user")]
    AnsibleBecomeUser,
    /// Password used to unlock encrypted variable files.
    #[strum(serialize = "ansible password vault")]
    AnsiblePasswordVault,
    /// Fetching the job's source repository.
    #[strum(serialize = "git")]
    Git,
}
