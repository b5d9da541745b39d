// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Keyward credential vault.

use std::fmt;

use thiserror::Error;

use crate::types::{AccessKeyRole, AccessKeyType};

/// The primary error type returned by every vault, agent and installer operation.
#[derive(Debug, Error)]
pub enum KeywardError {
    /// Record validation failures (missing name, missing or inconsistent secret fields).
    #[error("validation error: {0}")]
    Validation(String),

    /// Secret encoding, decoding, encryption or decryption failures.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The usage role cannot be served by this access key type.
    #[error("access key type not supported for {role}")]
    UnsupportedRole {
        role: AccessKeyRole,
        key_type: AccessKeyType,
    },

    /// Ephemeral SSH agent could not be started or stopped.
    #[error("ssh agent error: {message}")]
    Agent {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration errors (bad encryption key, empty socket directory).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KeywardError {
    /// Build an [`KeywardError::Agent`] from an I/O failure.
    pub fn agent_io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Agent {
            message: message.into(),
            source: Some(source),
        }
    }
}

/// Failures of the secret codec.
///
/// `KeyChanged` is kept distinct from `Crypto` so operators can tell a rotated
/// encryption key apart from a broken cipher setup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// A legacy newline-terminated secret was found on a non-SSH key.
    #[error("invalid access key type")]
    InvalidType,

    /// The decoded bytes are not a valid payload for the key type.
    #[error("secret must be valid structured data in key '{name}'")]
    InvalidPayload { name: String },

    /// The stored secret is not valid base64.
    #[error("malformed secret encoding: {0}")]
    Malformed(String),

    /// The decoded envelope cannot even hold a nonce.
    #[error("ciphertext too short")]
    CiphertextTooShort,

    /// AES-GCM authentication tag mismatch.
    #[error("cannot decrypt access key, perhaps encryption key was changed")]
    KeyChanged,

    /// The configured encryption key is unusable.
    #[error("invalid encryption key: {0}")]
    InvalidEncryptionKey(String),

    /// Cipher construction or random number generation failed.
    #[error("cryptographic failure: {0}")]
    Crypto(String),
}

/// Result of running a job step with an installed access key.
///
/// The job failure always stays primary: when both the step and the teardown
/// fail, the teardown error is attached rather than substituted.
#[derive(Debug, Error)]
pub enum StepError<E>
where
    E: fmt::Debug + fmt::Display,
{
    /// The access key could not be installed; the step never ran.
    #[error("failed to install access key: {0}")]
    Install(KeywardError),

    /// The step failed and the installation was released cleanly.
    #[error("{0}")]
    Step(E),

    /// The step succeeded but releasing the installation failed.
    #[error("failed to release access key installation: {0}")]
    Teardown(KeywardError),

    /// The step failed and releasing the installation failed as well.
    #[error("{step} (additionally, releasing the access key installation failed: {teardown})")]
    StepAndTeardown { step: E, teardown: KeywardError },
}

impl<E> StepError<E>
where
    E: fmt::Debug + fmt::Display,
{
    /// The job-level error, if the step itself failed.
    pub fn step_error(&self) -> Option<&E> {
        match self {
            Self::Step(step) | Self::StepAndTeardown { step, .. } => Some(step),
            Self::Install(_) | Self::Teardown(_) => None,
        }
    }

    /// The teardown error, if releasing the installation failed.
    pub fn teardown_error(&self) -> Option<&KeywardError> {
        match self {
            Self::Teardown(err) | Self::StepAndTeardown { teardown: err, .. } => Some(err),
            Self::Install(_) | Self::Step(_) => None,
        }
    }
}
