//! # vault-cli
//!
//! Command-line host for OTP Vault. Resolves the store location from
//! flags and settings, then runs one subcommand against the store.

pub mod commands;

pub use commands::{run, Command, Direction};
