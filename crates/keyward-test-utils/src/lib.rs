// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Keyward integration tests.
//!
//! Provides fakes for the injected capabilities so installer tests run
//! without opening sockets.
//!
//! # Components
//!
//! - [`FakeAgentLauncher`] - records the key material each agent was started with
//! - [`RecordingTaskLogger`] - captures task log lines for assertions
//! - [`fixtures`] - sample records, keys and PEM text
//! - [`agent_client`] - blocking agent protocol client for socket tests

#[cfg(unix)]
pub mod agent_client;
pub mod fake_agent;
pub mod fixtures;
pub mod recording_logger;

pub use fake_agent::{FakeAgentLauncher, StartedAgent};
pub use recording_logger::RecordingTaskLogger;
