// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ephemeral SSH agents for access key installations.
//!
//! Each installation of an SSH access key gets its own agent preloaded with
//! exactly that key, bound to a socket whose name carries the key ID and a
//! random suffix. Concurrent jobs installing the same key therefore never
//! share or collide on a socket, and no locking is needed.
//!
//! ```text
//! Installer ── AgentManager::start_agent ──► AgentLauncher::listen
//!                     │                            │
//!          <tmp>/ssh-agent-<id>-<rand>.sock   Box<dyn SshAgent>
//!                                                  │
//!                           Installation::destroy ─┘ close()
//! ```

pub mod manager;
pub mod socket;
#[cfg(unix)]
pub mod unix;

pub use manager::AgentManager;
pub use socket::{random_suffix, socket_file_name, SOCKET_SUFFIX_LEN};
#[cfg(unix)]
pub use unix::{UnixSocketAgent, UnixSocketLauncher};
