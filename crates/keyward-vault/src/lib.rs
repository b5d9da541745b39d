// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access key records and their secret codec.
//!
//! An [`AccessKey`] carries its plaintext payload only transiently. Before it
//! is persisted, [`SecretCodec::serialize`] turns the payload into an opaque
//! secret string: base64 of the payload when no encryption key is configured,
//! otherwise base64 of `nonce || AES-256-GCM(payload)`. Decoding also accepts
//! legacy newline-terminated private keys stored verbatim.

pub mod access_key;
pub mod codec;
pub mod crypto;
pub mod rekey;

pub use access_key::{AccessKey, KeyOwner, LoginPassword, SecretPayload, SshKey};
pub use codec::SecretCodec;
pub use crypto::EncryptionKey;
pub use rekey::{rekey_access_keys, RekeyReport};
