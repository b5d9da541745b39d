// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end installation of SSH keys with real Unix-socket agents.

#![cfg(unix)]

use std::os::unix::net::UnixStream;
use std::sync::Arc;

use keyward_agent::AgentManager;
use keyward_config::load_and_validate_str;
use keyward_core::{AccessKeyRole, AccessKeyType, StepError, TaskLogger};
use keyward_installer::Installer;
use keyward_test_utils::agent_client::AgentClient;
use keyward_test_utils::fixtures::{socket_dir, stored_key, TEST_PRIVATE_KEY};
use keyward_test_utils::RecordingTaskLogger;
use keyward_vault::{AccessKey, SecretCodec, SecretPayload, SshKey};
use tracing_test::traced_test;

fn unencrypted_ssh_key() -> AccessKey {
    let codec = SecretCodec::unencrypted();
    let mut key = AccessKey::new(
        "deploy",
        SecretPayload::Ssh(SshKey::new("ansible", "", TEST_PRIVATE_KEY)),
    );
    key.id = 21;
    codec.serialize(&mut key).unwrap();
    AccessKey::from_stored(key.id, key.name.clone(), AccessKeyType::Ssh, key.secret().map(String::from))
}

#[test]
fn ansible_user_ssh_key_runs_agent_until_destroyed() {
    let dir = socket_dir();
    let installer = Installer::new(SecretCodec::unencrypted(), AgentManager::unix(dir.path()));
    let logger = Arc::new(RecordingTaskLogger::new());
    let key = unencrypted_ssh_key();

    let installation = installer
        .install(&key, AccessKeyRole::AnsibleUser, logger.clone())
        .unwrap();
    assert_eq!(installation.login(), Some("ansible"));

    let sock = installation.ssh_auth_sock().unwrap().to_path_buf();
    assert!(sock.starts_with(dir.path()));
    let name = sock.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("ssh-agent-21-"));
    assert!(installation.ssh_agent().unwrap().is_listening());
    let mut client = AgentClient::connect(&sock).unwrap();
    assert_eq!(client.list_identities().unwrap().len(), 1);
    drop(client);

    installation.destroy().unwrap();
    assert!(!sock.exists());
    assert!(UnixStream::connect(&sock).is_err());
    assert!(logger.contains("SSH agent stopped"));
}

#[test]
fn legacy_newline_terminated_key_installs_for_ansible_user() {
    let dir = socket_dir();
    let installer = Installer::new(SecretCodec::unencrypted(), AgentManager::unix(dir.path()));
    assert!(TEST_PRIVATE_KEY.ends_with('\n'));
    let key = AccessKey::from_stored(
        12,
        "legacy",
        AccessKeyType::Ssh,
        Some(TEST_PRIVATE_KEY.to_string()),
    );

    let installation = installer
        .install(&key, AccessKeyRole::AnsibleUser, Arc::new(RecordingTaskLogger::new()))
        .unwrap();
    assert_eq!(installation.login(), Some(""));

    let sock = installation.ssh_auth_sock().unwrap().to_path_buf();
    assert!(installation.ssh_agent().unwrap().is_listening());
    let identities = AgentClient::connect(&sock).unwrap().list_identities().unwrap();
    assert_eq!(identities.len(), 1);
    assert_eq!(identities[0].comment, "keyward-test");

    installation.destroy().unwrap();
    assert!(!sock.exists());
}

#[test]
fn installer_built_from_config_uses_configured_socket_dir() {
    let dir = socket_dir();
    let toml = format!(
        "[runtime]\ntmp_path = \"{}\"\n\n[access_key]\nencryption = \"{}\"\n",
        dir.path().display(),
        SecretCodec::generate_key().unwrap(),
    );
    let config = load_and_validate_str(&toml).unwrap();
    let installer = Installer::from_config(&config).unwrap();
    assert!(installer.codec().is_encrypted());

    let key = stored_key(8, AccessKeyType::Ssh, installer.codec());
    let sock = installer
        .run_scoped(&key, AccessKeyRole::Git, Arc::new(RecordingTaskLogger::new()), |inst| {
            let sock = inst.ssh_auth_sock().map(|p| p.to_path_buf());
            assert!(sock.as_ref().is_some_and(|p| p.exists()));
            Ok::<_, String>(sock)
        })
        .unwrap()
        .unwrap();
    assert!(sock.starts_with(dir.path()));
    assert!(!sock.exists());
}

#[test]
fn failed_step_still_releases_socket() {
    let dir = socket_dir();
    let installer = Installer::new(SecretCodec::unencrypted(), AgentManager::unix(dir.path()));
    let logger: Arc<dyn TaskLogger> = Arc::new(RecordingTaskLogger::new());
    let key = unencrypted_ssh_key();

    let mut seen = None;
    let err = installer
        .run_scoped(&key, AccessKeyRole::AnsibleUser, logger, |inst| {
            seen = inst.ssh_auth_sock().map(|p| p.to_path_buf());
            Err::<(), _>("ansible-playbook exited with status 4".to_string())
        })
        .unwrap_err();

    assert!(matches!(err, StepError::Step(_)));
    let sock = seen.unwrap();
    assert!(!sock.exists());
}

#[test]
#[traced_test]
fn installing_never_logs_secret_material() {
    let dir = socket_dir();
    let installer = Installer::new(SecretCodec::unencrypted(), AgentManager::unix(dir.path()));
    let codec = SecretCodec::unencrypted();

    for key_type in [AccessKeyType::Ssh, AccessKeyType::LoginPassword] {
        let key = stored_key(30, key_type, &codec);
        let installation = installer
            .install(&key, AccessKeyRole::AnsibleUser, Arc::new(RecordingTaskLogger::new()))
            .unwrap();
        installation.destroy().unwrap();
    }

    assert!(logs_contain("access key installed"));
    assert!(!logs_contain("hunter2"));
    assert!(!logs_contain("s3cret"));
    assert!(!logs_contain("BEGIN OPENSSH PRIVATE KEY"));
}
