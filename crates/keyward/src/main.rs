// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyward - encrypted access keys and ephemeral SSH agents for job runners.
//!
//! This is the operator CLI: key generation, sealing and opening secrets
//! under the configured encryption key, and configuration checks.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod secrets;

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use keyward_config::KeywardConfig;
use keyward_core::{AccessKeyType, KeywardError};
use keyward_vault::SecretCodec;

/// Keyward - encrypted access keys and ephemeral SSH agents for job runners.
#[derive(Parser, Debug)]
#[command(name = "keyward", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a new random encryption key for `[access_key] encryption`.
    Keygen,
    /// Encrypt a payload read from stdin and print the stored secret.
    Seal {
        /// Access key type of the payload.
        #[arg(long = "type")]
        key_type: AccessKeyType,
    },
    /// Decrypt a stored secret read from stdin and print its payload as JSON.
    Open {
        /// Access key type the secret was sealed as.
        #[arg(long = "type")]
        key_type: AccessKeyType,
        /// Access key name, used in error messages.
        #[arg(long, default_value = "stdin")]
        name: String,
    },
    /// Validate configuration and report the effective settings.
    Check,
}

fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => keyward_config::load_and_validate_path(path),
        None => keyward_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            keyward_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    if let Err(e) = run(cli.command, &config) {
        eprintln!("keyward: {e}");
        std::process::exit(1);
    }
}

fn run(command: Commands, config: &KeywardConfig) -> Result<(), KeywardError> {
    let mut stdout = io::stdout().lock();
    match command {
        Commands::Keygen => secrets::keygen(&mut stdout),
        Commands::Check => check::check(config, &mut stdout),
        Commands::Seal { key_type } => {
            let codec = SecretCodec::from_config(&config.access_key)?;
            secrets::seal(&codec, key_type, io::stdin().lock(), &mut stdout)
        }
        Commands::Open { key_type, name } => {
            let codec = SecretCodec::from_config(&config.access_key)?;
            secrets::open(&codec, key_type, &name, io::stdin().lock(), &mut stdout)
        }
    }
}

/// Initialize the tracing subscriber. Output goes to stderr; stdout carries
/// command results.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keyward={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
