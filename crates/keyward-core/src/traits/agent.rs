// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ephemeral SSH agent capability.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::error::KeywardError;
use crate::traits::task_logger::TaskLogger;

/// One private key preloaded into an agent.
///
/// Both buffers are zeroed when the entry is dropped.
#[derive(Clone)]
pub struct AgentKey {
    pub key: Zeroizing<Vec<u8>>,
    pub passphrase: Zeroizing<Vec<u8>>,
}

impl AgentKey {
    pub fn new(key: &[u8], passphrase: &[u8]) -> Self {
        Self {
            key: Zeroizing::new(key.to_vec()),
            passphrase: Zeroizing::new(passphrase.to_vec()),
        }
    }
}

impl fmt::Debug for AgentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentKey")
            .field("key", &"[REDACTED]")
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}

/// A running agent bound to a local socket.
pub trait SshAgent: Send + fmt::Debug {
    /// Location of the listening socket, suitable for `SSH_AUTH_SOCK`.
    fn socket_path(&self) -> &Path;

    /// Whether the agent still accepts connections.
    fn is_listening(&self) -> bool;

    /// Stop listening and release the socket. Calling it again is a no-op.
    fn close(&mut self) -> Result<(), KeywardError>;
}

/// Starts agents. Implementations must fail rather than return an agent that
/// is not listening.
pub trait AgentLauncher: Send + Sync {
    fn listen(
        &self,
        keys: Vec<AgentKey>,
        socket_path: PathBuf,
        logger: Arc<dyn TaskLogger>,
    ) -> Result<Box<dyn SshAgent>, KeywardError>;
}
