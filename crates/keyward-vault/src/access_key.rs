// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The access key record and its plaintext payload variants.

use std::fmt;

use keyward_core::{AccessKeyType, KeywardError};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Login and password pair.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct LoginPassword {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

impl LoginPassword {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginPassword")
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// SSH private key with the login it authenticates and its passphrase.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SshKey {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub passphrase: String,
    #[serde(default)]
    pub private_key: String,
}

impl SshKey {
    pub fn new(
        login: impl Into<String>,
        passphrase: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        Self {
            login: login.into(),
            passphrase: passphrase.into(),
            private_key: private_key.into(),
        }
    }
}

impl fmt::Debug for SshKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshKey")
            .field("login", &self.login)
            .field("passphrase", &"[REDACTED]")
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// The plaintext side of an access key, tagged by key type.
///
/// The variant *is* the key type, so a record can never hold a payload that
/// does not match its type.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SecretPayload {
    Ssh(SshKey),
    None,
    LoginPassword(LoginPassword),
    String(String),
}

impl SecretPayload {
    /// An empty payload of the given type.
    pub fn empty(key_type: AccessKeyType) -> Self {
        match key_type {
            AccessKeyType::Ssh => Self::Ssh(SshKey::default()),
            AccessKeyType::None => Self::None,
            AccessKeyType::LoginPassword => Self::LoginPassword(LoginPassword::default()),
            AccessKeyType::String => Self::String(String::new()),
        }
    }

    pub fn key_type(&self) -> AccessKeyType {
        match self {
            Self::Ssh(_) => AccessKeyType::Ssh,
            Self::None => AccessKeyType::None,
            Self::LoginPassword(_) => AccessKeyType::LoginPassword,
            Self::String(_) => AccessKeyType::String,
        }
    }
}

impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ssh(key) => f.debug_tuple("Ssh").field(key).finish(),
            Self::None => f.write_str("None"),
            Self::LoginPassword(pair) => f.debug_tuple("LoginPassword").field(pair).finish(),
            Self::String(_) => f.write_str("String([REDACTED])"),
        }
    }
}

/// The project, environment or user an access key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyOwner {
    Project(i64),
    Environment(i64),
    User(i64),
}

/// A stored credential.
///
/// `secret` is the persisted ciphertext. It is only ever written by
/// [`SecretCodec::serialize`](crate::SecretCodec::serialize) or loaded back
/// through [`AccessKey::from_stored`]; the payload is the transient plaintext.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessKey {
    #[serde(default)]
    pub id: i64,

    pub name: String,

    #[serde(flatten)]
    pub payload: SecretPayload,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<KeyOwner>,

    #[serde(skip)]
    secret: Option<String>,

    /// Asks the persistence layer to replace the stored secret on update
    /// instead of keeping the existing one.
    #[serde(default)]
    pub override_secret: bool,

    /// Presentation flag: no secret is configured.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub empty: bool,
}

impl AccessKey {
    /// A new, not yet serialized access key.
    pub fn new(name: impl Into<String>, payload: SecretPayload) -> Self {
        Self {
            id: 0,
            name: name.into(),
            payload,
            owner: None,
            secret: None,
            override_secret: false,
            empty: false,
        }
    }

    /// Rebuild a record read back from storage. The payload stays empty until
    /// the secret is decoded.
    pub fn from_stored(
        id: i64,
        name: impl Into<String>,
        key_type: AccessKeyType,
        secret: Option<String>,
    ) -> Self {
        Self {
            id,
            secret,
            ..Self::new(name, SecretPayload::empty(key_type))
        }
    }

    pub fn with_owner(mut self, owner: KeyOwner) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn key_type(&self) -> AccessKeyType {
        self.payload.key_type()
    }

    /// The persisted secret, if any.
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }

    pub(crate) fn set_secret(&mut self, secret: Option<String>) {
        self.secret = secret;
    }

    /// Set the presentation `empty` flag from whether a secret is stored.
    pub fn mark_empty(&mut self) {
        self.empty = self.secret.as_deref().is_none_or(str::is_empty);
    }

    /// Check the record before accepting it from a caller.
    ///
    /// The name is always required. With `require_secret_fields`, SSH keys
    /// need a private key and login/password keys need a password.
    pub fn validate(&self, require_secret_fields: bool) -> Result<(), KeywardError> {
        if self.name.is_empty() {
            return Err(KeywardError::Validation("name can not be empty".to_string()));
        }

        if !require_secret_fields {
            return Ok(());
        }

        match &self.payload {
            SecretPayload::Ssh(key) if key.private_key.is_empty() => Err(
                KeywardError::Validation("private key can not be empty".to_string()),
            ),
            SecretPayload::LoginPassword(pair) if pair.password.is_empty() => Err(
                KeywardError::Validation("password can not be empty".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessKey")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("payload", &self.payload)
            .field("owner", &self.owner)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("override_secret", &self.override_secret)
            .field("empty", &self.empty)
            .finish()
    }
}
