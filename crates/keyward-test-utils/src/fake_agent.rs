// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fake SSH agent launcher.
//!
//! `FakeAgentLauncher` implements `AgentLauncher` without binding sockets.
//! Every started agent is recorded together with the key material it was
//! preloaded with, and whether it has been closed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use keyward_core::{AgentKey, AgentLauncher, KeywardError, SshAgent, TaskLogger};

/// One agent started through the fake launcher.
#[derive(Debug, Clone)]
pub struct StartedAgent {
    pub socket_path: PathBuf,
    pub keys: Vec<AgentKey>,
    closed: Arc<AtomicBool>,
}

impl StartedAgent {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct LauncherState {
    started: Vec<StartedAgent>,
    listen_error: Option<String>,
    close_error: Option<String>,
}

/// Agent launcher that records instead of listening.
#[derive(Clone, Default)]
pub struct FakeAgentLauncher {
    state: Arc<Mutex<LauncherState>>,
}

impl FakeAgentLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A launcher whose `listen` always fails with `message`.
    pub fn failing_listen(message: impl Into<String>) -> Self {
        let launcher = Self::new();
        launcher.lock().listen_error = Some(message.into());
        launcher
    }

    /// A launcher whose agents fail to close with `message`.
    pub fn failing_close(message: impl Into<String>) -> Self {
        let launcher = Self::new();
        launcher.lock().close_error = Some(message.into());
        launcher
    }

    /// Every agent started so far, in order.
    pub fn started(&self) -> Vec<StartedAgent> {
        self.lock().started.clone()
    }

    /// Number of started agents that have not been closed.
    pub fn open_agents(&self) -> usize {
        self.lock().started.iter().filter(|a| !a.is_closed()).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LauncherState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AgentLauncher for FakeAgentLauncher {
    fn listen(
        &self,
        keys: Vec<AgentKey>,
        socket_path: PathBuf,
        logger: Arc<dyn TaskLogger>,
    ) -> Result<Box<dyn SshAgent>, KeywardError> {
        let mut state = self.lock();
        if let Some(message) = &state.listen_error {
            return Err(KeywardError::Agent {
                message: message.clone(),
                source: None,
            });
        }

        let closed = Arc::new(AtomicBool::new(false));
        state.started.push(StartedAgent {
            socket_path: socket_path.clone(),
            keys,
            closed: Arc::clone(&closed),
        });
        logger.log(&format!("fake SSH agent listening on {}", socket_path.display()));

        Ok(Box::new(FakeAgent {
            socket_path,
            closed,
            close_error: state.close_error.clone(),
        }))
    }
}

#[derive(Debug)]
struct FakeAgent {
    socket_path: PathBuf,
    closed: Arc<AtomicBool>,
    close_error: Option<String>,
}

impl SshAgent for FakeAgent {
    fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    fn is_listening(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    fn close(&mut self) -> Result<(), KeywardError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        match &self.close_error {
            Some(message) => Err(KeywardError::Agent {
                message: message.clone(),
                source: None,
            }),
            None => Ok(()),
        }
    }
}
