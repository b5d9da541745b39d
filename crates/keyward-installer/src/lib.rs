// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Installs access keys for a job step according to how the step uses them.
//!
//! An [`Installer`] decrypts the key, checks the usage role against the key
//! type and hands back an [`AccessKeyInstallation`]: the login, password and
//! SSH agent socket the job needs. The installation must be destroyed once
//! the step finishes; [`Installer::run_scoped`] does that on every path.

pub mod installation;
pub mod installer;

pub use installation::AccessKeyInstallation;
pub use installer::Installer;
