// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! What an installed access key exposes to a job step.

use std::fmt;
use std::path::Path;

use keyward_core::{KeywardError, SshAgent};
use secrecy::SecretString;
use tracing::warn;

/// Credentials made available to one job step.
///
/// Owns the step's SSH agent, if any. [`destroy`](Self::destroy) releases it;
/// an installation dropped without being destroyed still closes its agent.
#[derive(Default)]
pub struct AccessKeyInstallation {
    ssh_agent: Option<Box<dyn SshAgent>>,
    login: Option<String>,
    password: Option<SecretString>,
    script: Option<String>,
}

impl AccessKeyInstallation {
    /// An installation that provides nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn with_agent(agent: Box<dyn SshAgent>, login: String) -> Self {
        Self {
            ssh_agent: Some(agent),
            login: Some(login),
            password: None,
            script: None,
        }
    }

    pub(crate) fn with_credentials(login: Option<String>, password: SecretString) -> Self {
        Self {
            ssh_agent: None,
            login,
            password: Some(password),
            script: None,
        }
    }

    pub fn login(&self) -> Option<&str> {
        self.login.as_deref()
    }

    pub fn password(&self) -> Option<&SecretString> {
        self.password.as_ref()
    }

    /// Inline script for the step. No role resolves one today, so this is
    /// always `None`.
    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    pub fn ssh_agent(&self) -> Option<&dyn SshAgent> {
        self.ssh_agent.as_deref()
    }

    /// Value for `SSH_AUTH_SOCK` in the job's environment.
    pub fn ssh_auth_sock(&self) -> Option<&Path> {
        self.ssh_agent.as_ref().map(|agent| agent.socket_path())
    }

    pub fn is_empty(&self) -> bool {
        self.ssh_agent.is_none()
            && self.login.is_none()
            && self.password.is_none()
            && self.script.is_none()
    }

    /// Stop the SSH agent and release its socket. Without an agent this does
    /// nothing.
    pub fn destroy(mut self) -> Result<(), KeywardError> {
        match self.ssh_agent.take() {
            Some(mut agent) => agent.close(),
            None => Ok(()),
        }
    }
}

impl Drop for AccessKeyInstallation {
    fn drop(&mut self) {
        if let Some(mut agent) = self.ssh_agent.take() {
            warn!(
                socket = %agent.socket_path().display(),
                "access key installation dropped without destroy"
            );
            if let Err(e) = agent.close() {
                warn!("failed to close SSH agent on drop: {e}");
            }
        }
    }
}

impl fmt::Debug for AccessKeyInstallation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessKeyInstallation")
            .field("ssh_auth_sock", &self.ssh_auth_sock())
            .field("login", &self.login)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("script", &self.script)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use keyward_core::{AgentKey, AgentLauncher};
    use keyward_test_utils::{FakeAgentLauncher, RecordingTaskLogger};
    use secrecy::ExposeSecret;

    use super::*;

    fn fake_agent(launcher: &FakeAgentLauncher) -> Box<dyn SshAgent> {
        launcher
            .listen(
                vec![AgentKey::new(b"KEY", b"")],
                "/run/keyward/ssh-agent-1-abcdefghij.sock".into(),
                Arc::new(RecordingTaskLogger::new()),
            )
            .unwrap()
    }

    #[test]
    fn empty_installation_exposes_nothing() {
        let installation = AccessKeyInstallation::empty();
        assert!(installation.is_empty());
        assert!(installation.ssh_auth_sock().is_none());
        installation.destroy().unwrap();
    }

    #[test]
    fn no_installation_carries_a_script() {
        let launcher = FakeAgentLauncher::new();
        let with_agent = AccessKeyInstallation::with_agent(fake_agent(&launcher), "git".into());
        let with_credentials = AccessKeyInstallation::with_credentials(
            None,
            SecretString::from("vault".to_string()),
        );

        assert_eq!(AccessKeyInstallation::empty().script(), None);
        assert_eq!(with_agent.script(), None);
        assert_eq!(with_credentials.script(), None);
        with_agent.destroy().unwrap();
    }

    #[test]
    fn destroy_closes_agent() {
        let launcher = FakeAgentLauncher::new();
        let installation = AccessKeyInstallation::with_agent(fake_agent(&launcher), "git".into());

        assert_eq!(
            installation.ssh_auth_sock(),
            Some(Path::new("/run/keyward/ssh-agent-1-abcdefghij.sock"))
        );
        installation.destroy().unwrap();
        assert_eq!(launcher.open_agents(), 0);
    }

    #[test]
    fn drop_without_destroy_still_closes_agent() {
        let launcher = FakeAgentLauncher::new();
        {
            let _installation =
                AccessKeyInstallation::with_agent(fake_agent(&launcher), "git".into());
            assert_eq!(launcher.open_agents(), 1);
        }
        assert_eq!(launcher.open_agents(), 0);
    }

    #[test]
    fn destroy_reports_close_failure() {
        let launcher = FakeAgentLauncher::failing_close("socket busy");
        let installation = AccessKeyInstallation::with_agent(fake_agent(&launcher), "git".into());
        let err = installation.destroy().unwrap_err();
        assert!(err.to_string().contains("socket busy"));
    }

    #[test]
    fn debug_redacts_password() {
        let installation = AccessKeyInstallation::with_credentials(
            Some("bob".into()),
            SecretString::from("hunter2".to_string()),
        );
        assert_eq!(installation.password().unwrap().expose_secret(), "hunter2");
        let rendered = format!("{installation:?}");
        assert!(rendered.contains("bob"));
        assert!(!rendered.contains("hunter2"));
    }
}
