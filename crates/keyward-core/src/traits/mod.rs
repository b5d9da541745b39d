// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits injected into the agent manager and installer.
//!
//! Both are synchronous and object safe so callers can hold them as
//! `Arc<dyn ...>` and tests can substitute fakes.

pub mod agent;
pub mod task_logger;

pub use agent::{AgentKey, AgentLauncher, SshAgent};
pub use task_logger::{TaskLogger, TracingTaskLogger};
