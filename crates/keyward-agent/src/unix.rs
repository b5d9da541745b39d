// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unix-socket agent speaking the OpenSSH agent protocol.
//!
//! Keys are parsed and decrypted before the socket is bound, so a bad key or
//! passphrase never leaves a socket behind. Each agent owns a thread running a
//! single-threaded tokio runtime that serves connections through
//! `ssh-agent-lib`. Closing cancels the listener, drops the runtime along with
//! every connection task, and joins the thread; the decrypted keys are gone by
//! the time `close` returns.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt as _;
use std::os::unix::net::UnixListener as StdUnixListener;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};

use keyward_core::{AgentKey, AgentLauncher, KeywardError, SshAgent, TaskLogger};
use signature::Signer as _;
use ssh_agent_lib::agent::{listen, Session};
use ssh_agent_lib::error::AgentError;
use ssh_agent_lib::proto::{Identity, SignRequest};
use ssh_key::{HashAlg, PrivateKey, Signature};
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Launches [`UnixSocketAgent`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixSocketLauncher;

impl AgentLauncher for UnixSocketLauncher {
    fn listen(
        &self,
        keys: Vec<AgentKey>,
        socket_path: PathBuf,
        logger: Arc<dyn TaskLogger>,
    ) -> Result<Box<dyn SshAgent>, KeywardError> {
        Ok(Box::new(UnixSocketAgent::listen(keys, socket_path, logger)?))
    }
}

/// Parse an OpenSSH private key, decrypting it with the entry's passphrase
/// when it is encrypted.
pub fn load_private_key(entry: &AgentKey) -> Result<PrivateKey, KeywardError> {
    let key = PrivateKey::from_openssh(entry.key.as_slice())
        .map_err(|e| agent_error(format!("invalid SSH private key: {e}")))?;
    if !key.is_encrypted() {
        return Ok(key);
    }
    key.decrypt(entry.passphrase.as_slice())
        .map_err(|e| agent_error(format!("cannot decrypt SSH private key: {e}")))
}

fn agent_error(message: impl Into<String>) -> KeywardError {
    KeywardError::Agent {
        message: message.into(),
        source: None,
    }
}

fn other_err(msg: impl Into<String>) -> AgentError {
    AgentError::other(io::Error::other(msg.into()))
}

/// Per-connection handler. Every clone shares the same decrypted keys.
#[derive(Clone)]
struct KeySession {
    keys: Arc<Vec<PrivateKey>>,
}

impl std::fmt::Debug for KeySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySession")
            .field("keys", &self.keys.len())
            .finish()
    }
}

#[ssh_agent_lib::async_trait]
impl Session for KeySession {
    async fn request_identities(&mut self) -> Result<Vec<Identity>, AgentError> {
        let identities: Vec<Identity> = self
            .keys
            .iter()
            .map(|key| Identity {
                pubkey: key.public_key().clone().into(),
                comment: key.comment().to_string(),
            })
            .collect();

        debug!(count = identities.len(), "request_identities");
        Ok(identities)
    }

    async fn sign(&mut self, request: SignRequest) -> Result<Signature, AgentError> {
        let fingerprint = request.pubkey.fingerprint(HashAlg::Sha256);
        let key = self
            .keys
            .iter()
            .find(|key| key.fingerprint(HashAlg::Sha256) == fingerprint)
            .ok_or_else(|| other_err("key not found"))?;

        debug!(fingerprint = %fingerprint, data_len = request.data.len(), "sign");

        key.try_sign(&request.data)
            .map_err(|e| other_err(format!("signing failed: {e}")))
    }
}

/// A listening agent. Dropping it without [`SshAgent::close`] still closes it.
pub struct UnixSocketAgent {
    socket_path: PathBuf,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
    keys: Weak<Vec<PrivateKey>>,
    logger: Arc<dyn TaskLogger>,
}

impl std::fmt::Debug for UnixSocketAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnixSocketAgent")
            .field("socket_path", &self.socket_path)
            .field("listening", &self.worker.is_some())
            .finish_non_exhaustive()
    }
}

impl UnixSocketAgent {
    /// Decrypt `keys`, bind `socket_path` and start serving connections.
    pub fn listen(
        keys: Vec<AgentKey>,
        socket_path: PathBuf,
        logger: Arc<dyn TaskLogger>,
    ) -> Result<Self, KeywardError> {
        let keys = keys
            .iter()
            .map(load_private_key)
            .collect::<Result<Vec<_>, _>>()?;
        let keys = Arc::new(keys);

        if let Some(dir) = socket_path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                KeywardError::agent_io(format!("create socket directory {}", dir.display()), e)
            })?;
        }

        let listener = StdUnixListener::bind(&socket_path).map_err(|e| {
            KeywardError::agent_io(format!("bind SSH agent socket {}", socket_path.display()), e)
        })?;

        let prepared = fs::set_permissions(&socket_path, fs::Permissions::from_mode(0o600))
            .map_err(|e| KeywardError::agent_io(format!("chmod 0600 {}", socket_path.display()), e))
            .and_then(|()| {
                listener
                    .set_nonblocking(true)
                    .map_err(|e| KeywardError::agent_io("set SSH agent socket non-blocking", e))
            })
            .and_then(|()| {
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| KeywardError::agent_io("start SSH agent runtime", e))
            });
        let runtime = match prepared {
            Ok(runtime) => runtime,
            Err(e) => {
                let _ = fs::remove_file(&socket_path);
                return Err(e);
            }
        };

        let cancel = CancellationToken::new();
        let held = Arc::downgrade(&keys);
        let worker = {
            let cancel = cancel.clone();
            let session = KeySession { keys };
            thread::Builder::new()
                .name("ssh-agent".to_string())
                .spawn(move || {
                    runtime.block_on(serve(listener, session, cancel));
                    // Dropping the runtime drops every connection task and
                    // with it the last session clones.
                    drop(runtime);
                })
        };
        let worker = match worker {
            Ok(worker) => worker,
            Err(e) => {
                let _ = fs::remove_file(&socket_path);
                return Err(KeywardError::agent_io("spawn SSH agent thread", e));
            }
        };

        debug!(socket = %socket_path.display(), "SSH agent listening");
        logger.log(&format!("SSH agent listening on {}", socket_path.display()));

        Ok(Self {
            socket_path,
            cancel,
            worker: Some(worker),
            keys: held,
            logger,
        })
    }

    /// Whether any decrypted key is still alive.
    pub fn holds_key_material(&self) -> bool {
        self.keys.strong_count() > 0
    }
}

async fn serve(listener: StdUnixListener, session: KeySession, cancel: CancellationToken) {
    let listener = match UnixListener::from_std(listener) {
        Ok(listener) => listener,
        Err(e) => {
            warn!("cannot register SSH agent socket: {e}");
            return;
        }
    };

    tokio::select! {
        () = cancel.cancelled() => debug!("SSH agent cancelled"),
        result = listen(listener, session) => {
            if let Err(e) = result {
                warn!("SSH agent listener failed: {e}");
            }
        }
    }
}

impl SshAgent for UnixSocketAgent {
    fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    fn is_listening(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
            && self.socket_path.exists()
    }

    fn close(&mut self) -> Result<(), KeywardError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        self.cancel.cancel();
        let joined = worker.join();

        let removed = match fs::remove_file(&self.socket_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(KeywardError::agent_io(
                format!("remove SSH agent socket {}", self.socket_path.display()),
                e,
            )),
        };

        if joined.is_err() {
            return Err(agent_error("SSH agent thread panicked"));
        }
        if self.holds_key_material() {
            return Err(agent_error("SSH agent stopped but key material is still referenced"));
        }
        removed?;

        debug!(socket = %self.socket_path.display(), "SSH agent stopped");
        self.logger.log("SSH agent stopped");
        Ok(())
    }
}

impl Drop for UnixSocketAgent {
    fn drop(&mut self) {
        if self.worker.is_some() {
            warn!(socket = %self.socket_path.display(), "SSH agent dropped without close");
            if let Err(e) = self.close() {
                warn!("failed to close SSH agent on drop: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::net::UnixStream;

    use keyward_test_utils::agent_client::{AgentClient, SSH_AGENT_FAILURE, SSH_AGENTC_SIGN_REQUEST};
    use keyward_test_utils::fixtures::{
        socket_dir, TEST_ENCRYPTED_PRIVATE_KEY, TEST_KEY_PASSPHRASE, TEST_PRIVATE_KEY,
    };
    use keyward_test_utils::RecordingTaskLogger;
    use signature::Verifier;
    use ssh_key::PublicKey;

    use super::*;

    fn start_with(dir: &Path, key: AgentKey, logger: Arc<RecordingTaskLogger>) -> UnixSocketAgent {
        UnixSocketAgent::listen(vec![key], dir.join("ssh-agent-1-test000000.sock"), logger).unwrap()
    }

    fn start(dir: &Path, logger: Arc<RecordingTaskLogger>) -> UnixSocketAgent {
        start_with(dir, AgentKey::new(TEST_PRIVATE_KEY.as_bytes(), b""), logger)
    }

    fn public_key(pem: &str, passphrase: &str) -> PublicKey {
        let key = PrivateKey::from_openssh(pem).unwrap();
        let key = if key.is_encrypted() { key.decrypt(passphrase).unwrap() } else { key };
        key.public_key().clone()
    }

    #[test]
    fn listen_creates_private_socket() {
        let dir = socket_dir();
        let mut agent = start(dir.path(), Arc::new(RecordingTaskLogger::new()));

        assert!(agent.is_listening());
        let mode = fs::metadata(agent.socket_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        agent.close().unwrap();
    }

    #[test]
    fn close_releases_socket_and_is_idempotent() {
        let dir = socket_dir();
        let logger = Arc::new(RecordingTaskLogger::new());
        let mut agent = start(dir.path(), logger.clone());
        let path = agent.socket_path().to_path_buf();

        agent.close().unwrap();
        assert!(!agent.is_listening());
        assert!(!agent.holds_key_material());
        assert!(!path.exists());
        assert!(UnixStream::connect(&path).is_err());
        agent.close().unwrap();

        assert!(logger.contains("SSH agent listening on"));
        assert!(logger.contains("SSH agent stopped"));
    }

    #[test]
    fn request_identities_lists_the_preloaded_key() {
        let dir = socket_dir();
        let mut agent = start(dir.path(), Arc::new(RecordingTaskLogger::new()));

        let mut client = AgentClient::connect(agent.socket_path()).unwrap();
        let identities = client.list_identities().unwrap();

        assert_eq!(identities.len(), 1);
        assert_eq!(
            identities[0].key_blob,
            public_key(TEST_PRIVATE_KEY, "").to_bytes().unwrap()
        );
        assert_eq!(identities[0].comment, "keyward-test");
        drop(client);
        agent.close().unwrap();
    }

    #[test]
    fn sign_request_is_signed_by_the_preloaded_key() {
        let dir = socket_dir();
        let mut agent = start(dir.path(), Arc::new(RecordingTaskLogger::new()));
        let public = public_key(TEST_PRIVATE_KEY, "");
        let data = b"session-id and userauth request";

        let mut client = AgentClient::connect(agent.socket_path()).unwrap();
        let blob = client.sign(&public.to_bytes().unwrap(), data).unwrap();

        let signature = Signature::try_from(blob.as_slice()).unwrap();
        Verifier::verify(&public, data, &signature).unwrap();
        drop(client);
        agent.close().unwrap();
    }

    #[test]
    fn sign_request_for_an_unknown_key_fails() {
        let dir = socket_dir();
        let mut agent = start(dir.path(), Arc::new(RecordingTaskLogger::new()));
        let other = public_key(TEST_ENCRYPTED_PRIVATE_KEY, TEST_KEY_PASSPHRASE);

        let mut client = AgentClient::connect(agent.socket_path()).unwrap();
        let mut body = Vec::new();
        let blob = other.to_bytes().unwrap();
        body.extend_from_slice(&(blob.len() as u32).to_be_bytes());
        body.extend_from_slice(&blob);
        body.extend_from_slice(&4u32.to_be_bytes());
        body.extend_from_slice(b"data");
        body.extend_from_slice(&0u32.to_be_bytes());
        let (kind, _) = client.request(SSH_AGENTC_SIGN_REQUEST, &body).unwrap();

        assert_eq!(kind, SSH_AGENT_FAILURE);
        drop(client);
        agent.close().unwrap();
    }

    #[test]
    fn encrypted_key_is_unlocked_with_its_passphrase() {
        let dir = socket_dir();
        let key = AgentKey::new(
            TEST_ENCRYPTED_PRIVATE_KEY.as_bytes(),
            TEST_KEY_PASSPHRASE.as_bytes(),
        );
        let mut agent = start_with(dir.path(), key, Arc::new(RecordingTaskLogger::new()));
        let public = public_key(TEST_ENCRYPTED_PRIVATE_KEY, TEST_KEY_PASSPHRASE);

        let mut client = AgentClient::connect(agent.socket_path()).unwrap();
        let identities = client.list_identities().unwrap();
        assert_eq!(identities.len(), 1);
        assert_eq!(identities[0].key_blob, public.to_bytes().unwrap());

        let blob = client.sign(&identities[0].key_blob, b"payload").unwrap();
        Verifier::verify(&public, b"payload", &Signature::try_from(blob.as_slice()).unwrap())
            .unwrap();
        drop(client);
        agent.close().unwrap();
    }

    #[test]
    fn wrong_passphrase_fails_before_binding() {
        let dir = socket_dir();
        let path = dir.path().join("ssh-agent-1-test000000.sock");

        let err = UnixSocketAgent::listen(
            vec![AgentKey::new(TEST_ENCRYPTED_PRIVATE_KEY.as_bytes(), b"wrong")],
            path.clone(),
            Arc::new(RecordingTaskLogger::new()),
        )
        .unwrap_err();

        assert!(matches!(err, KeywardError::Agent { source: None, .. }));
        assert!(err.to_string().contains("cannot decrypt"));
        assert!(!path.exists());
    }

    #[test]
    fn unparseable_key_fails_before_binding() {
        let dir = socket_dir();
        let path = dir.path().join("ssh-agent-1-test000000.sock");

        let err = UnixSocketAgent::listen(
            vec![AgentKey::new(b"not a key", b"")],
            path.clone(),
            Arc::new(RecordingTaskLogger::new()),
        )
        .unwrap_err();

        assert!(err.to_string().contains("invalid SSH private key"));
        assert!(!path.exists());
    }

    #[test]
    fn close_stops_the_worker_after_the_socket_is_unlinked() {
        let dir = socket_dir();
        let logger = Arc::new(RecordingTaskLogger::new());
        let mut agent = start(dir.path(), logger.clone());

        fs::remove_file(agent.socket_path()).unwrap();
        assert!(!agent.is_listening());
        assert!(agent.holds_key_material());

        agent.close().unwrap();
        assert!(!agent.holds_key_material());
        assert!(logger.contains("SSH agent stopped"));
    }

    #[test]
    fn close_drops_keys_held_by_open_connections() {
        let dir = socket_dir();
        let mut agent = start(dir.path(), Arc::new(RecordingTaskLogger::new()));

        let mut client = AgentClient::connect(agent.socket_path()).unwrap();
        assert_eq!(client.list_identities().unwrap().len(), 1);

        agent.close().unwrap();
        assert!(!agent.holds_key_material());
        drop(client);
    }

    #[test]
    fn binding_an_existing_path_fails() {
        let dir = socket_dir();
        let mut first = start(dir.path(), Arc::new(RecordingTaskLogger::new()));

        let err = UnixSocketAgent::listen(
            vec![],
            first.socket_path().to_path_buf(),
            Arc::new(RecordingTaskLogger::new()),
        )
        .unwrap_err();
        assert!(matches!(err, KeywardError::Agent { source: Some(_), .. }));
        first.close().unwrap();
    }

    #[test]
    fn drop_closes_the_agent() {
        let dir = socket_dir();
        let path = {
            let agent = start(dir.path(), Arc::new(RecordingTaskLogger::new()));
            agent.socket_path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn missing_socket_directory_is_created() {
        let dir = socket_dir();
        let nested = dir.path().join("jobs");
        let mut agent = start(&nested, Arc::new(RecordingTaskLogger::new()));
        assert!(agent.is_listening());
        agent.close().unwrap();
    }
}
