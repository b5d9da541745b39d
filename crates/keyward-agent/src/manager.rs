// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Starts one agent per SSH access key installation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use keyward_config::model::RuntimeConfig;
use keyward_core::{AgentKey, AgentLauncher, KeywardError, SshAgent, TaskLogger};
use keyward_vault::{AccessKey, SshKey};
use tracing::info;

use crate::socket::{random_suffix, socket_file_name};

/// Places agent sockets under a fixed directory and starts agents through an
/// injected launcher.
#[derive(Clone)]
pub struct AgentManager {
    tmp_path: PathBuf,
    launcher: Arc<dyn AgentLauncher>,
}

impl std::fmt::Debug for AgentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentManager")
            .field("tmp_path", &self.tmp_path)
            .finish_non_exhaustive()
    }
}

impl AgentManager {
    pub fn new(tmp_path: impl Into<PathBuf>, launcher: Arc<dyn AgentLauncher>) -> Self {
        Self {
            tmp_path: tmp_path.into(),
            launcher,
        }
    }

    /// A manager backed by real Unix-socket agents.
    #[cfg(unix)]
    pub fn unix(tmp_path: impl Into<PathBuf>) -> Self {
        Self::new(tmp_path, Arc::new(crate::unix::UnixSocketLauncher))
    }

    #[cfg(unix)]
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::unix(&config.tmp_path)
    }

    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    /// A fresh socket path for `key_id`. Two calls never return the same path.
    pub fn socket_path_for(&self, key_id: i64) -> PathBuf {
        self.tmp_path
            .join(socket_file_name(key_id, &random_suffix()))
    }

    /// Start an agent holding exactly the decrypted `ssh` key of `key`.
    pub fn start_agent(
        &self,
        key: &AccessKey,
        ssh: &SshKey,
        logger: Arc<dyn TaskLogger>,
    ) -> Result<Box<dyn SshAgent>, KeywardError> {
        let socket_path = self.socket_path_for(key.id);
        let keys = vec![AgentKey::new(
            ssh.private_key.as_bytes(),
            ssh.passphrase.as_bytes(),
        )];

        let agent = self.launcher.listen(keys, socket_path, logger)?;
        info!(
            key_id = key.id,
            socket = %agent.socket_path().display(),
            "started ssh agent for access key"
        );
        Ok(agent)
    }
}
