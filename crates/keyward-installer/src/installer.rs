// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The role by key type installation matrix.

use std::fmt;
use std::sync::Arc;

use keyward_agent::AgentManager;
use keyward_config::model::KeywardConfig;
use keyward_core::{AccessKeyRole, AccessKeyType, KeywardError, StepError, TaskLogger};
use keyward_vault::{AccessKey, SecretCodec, SecretPayload};
use secrecy::SecretString;
use tracing::{debug, info};

use crate::installation::AccessKeyInstallation;

/// Turns stored access keys into installations for job steps.
#[derive(Debug, Clone)]
pub struct Installer {
    codec: SecretCodec,
    agents: AgentManager,
}

impl Installer {
    pub fn new(codec: SecretCodec, agents: AgentManager) -> Self {
        Self { codec, agents }
    }

    /// Build an installer with Unix-socket agents from loaded configuration.
    #[cfg(unix)]
    pub fn from_config(config: &KeywardConfig) -> Result<Self, KeywardError> {
        Ok(Self::new(
            SecretCodec::from_config(&config.access_key)?,
            AgentManager::from_config(&config.runtime),
        ))
    }

    pub fn codec(&self) -> &SecretCodec {
        &self.codec
    }

    /// Install `key` for a step that uses it as `role`.
    ///
    /// Keys of type `none` install as empty without being decrypted. Any
    /// other key is decrypted first, and a decryption failure is returned
    /// before the role is considered. On error nothing is left running.
    pub fn install(
        &self,
        key: &AccessKey,
        role: AccessKeyRole,
        logger: Arc<dyn TaskLogger>,
    ) -> Result<AccessKeyInstallation, KeywardError> {
        if key.key_type() == AccessKeyType::None {
            debug!(key_id = key.id, %role, "access key of type none, nothing to install");
            return Ok(AccessKeyInstallation::empty());
        }

        let payload = self.codec.decode(key)?;
        let key_type = payload.key_type();

        let installation = match (role, payload) {
            (AccessKeyRole::Git | AccessKeyRole::AnsibleUser, SecretPayload::Ssh(ssh)) => {
                let agent = self.agents.start_agent(key, &ssh, logger)?;
                AccessKeyInstallation::with_agent(agent, ssh.login.clone())
            }
            (AccessKeyRole::Git, _) => {
                debug!(key_id = key.id, %key_type, "git role installs only ssh keys, skipping");
                AccessKeyInstallation::empty()
            }
            (
                AccessKeyRole::AnsibleUser | AccessKeyRole::AnsibleBecomeUser,
                SecretPayload::LoginPassword(pair),
            ) => AccessKeyInstallation::with_credentials(
                Some(pair.login.clone()),
                SecretString::from(pair.password.clone()),
            ),
            (AccessKeyRole::AnsiblePasswordVault, SecretPayload::LoginPassword(pair)) => {
                AccessKeyInstallation::with_credentials(
                    None,
                    SecretString::from(pair.password.clone()),
                )
            }
            (role, _) => return Err(KeywardError::UnsupportedRole { role, key_type }),
        };

        info!(key_id = key.id, %role, %key_type, "access key installed");
        Ok(installation)
    }

    /// Install `key`, run `step` with the installation, then destroy it.
    ///
    /// The installation is destroyed whether or not the step succeeds. A step
    /// failure stays the primary error; a teardown failure is attached to it.
    pub fn run_scoped<T, E, F>(
        &self,
        key: &AccessKey,
        role: AccessKeyRole,
        logger: Arc<dyn TaskLogger>,
        step: F,
    ) -> Result<T, StepError<E>>
    where
        E: fmt::Debug + fmt::Display,
        F: FnOnce(&AccessKeyInstallation) -> Result<T, E>,
    {
        let installation = self.install(key, role, logger).map_err(StepError::Install)?;
        let outcome = step(&installation);
        let teardown = installation.destroy();

        match (outcome, teardown) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(teardown)) => Err(StepError::Teardown(teardown)),
            (Err(step), Ok(())) => Err(StepError::Step(step)),
            (Err(step), Err(teardown)) => Err(StepError::StepAndTeardown { step, teardown }),
        }
    }
}
