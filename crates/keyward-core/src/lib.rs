// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Keyward credential vault.
//!
//! This crate provides the error taxonomy, the shared access-key enums, and
//! the capability traits (SSH agent, task logger) that the vault, agent and
//! installer crates are written against.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{CodecError, KeywardError, StepError};
pub use types::{AccessKeyRole, AccessKeyType};

pub use traits::{AgentKey, AgentLauncher, SshAgent, TaskLogger, TracingTaskLogger};
