//! OTP Vault CLI - manage a password-protected TOTP store
//!
//! The store path comes from `--store`, then `storeFile` in settings.json,
//! then the platform data directory. Without `--password` the passphrase
//! is prompted for on the terminal.

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing::info;

use vault_cli::{run, Command};
use vault_core::{default_config_dir, Password, SettingsManager, Store};

/// OTP Vault - encrypted storage for TOTP secrets
#[derive(Parser, Debug)]
#[command(name = "otp-vault")]
#[command(version)]
#[command(about = "OTP Vault - encrypted storage for TOTP secrets")]
struct Args {
    /// Store file to operate on
    #[arg(long, global = true, env = "OTP_VAULT_STORE")]
    store: Option<PathBuf>,

    /// Store password (prompted for when omitted)
    #[arg(long, global = true, env = "OTP_VAULT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Directory holding settings.json
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(io::stderr)
        .init();

    let config_dir = match args.config_dir {
        Some(dir) => dir,
        None => default_config_dir()?,
    };
    let settings = SettingsManager::load(&config_dir)
        .with_context(|| format!("Failed to load settings from {:?}", config_dir))?;
    let settings = settings.get();

    let store_path = match args.store {
        Some(path) => path,
        None => settings.store_path()?,
    };
    info!("Using store {:?}", store_path);

    let password = if args.command.needs_password() {
        match args.password {
            Some(password) => Password::from(password),
            None => Password::from(rpassword::prompt_password("Store password: ")?),
        }
    } else {
        Password::default()
    };

    let mut store = Store::new(store_path, password)
        .with_format(settings.format)
        .with_kdf_params(settings.sealed_kdf);
    if args.command.needs_password() {
        store
            .load()
            .with_context(|| format!("Failed to open store {:?}", store.path()))?;
    }

    let stdout = io::stdout();
    run(&args.command, &mut store, &mut stdout.lock())
}
