//! Subcommands and their execution against a loaded store

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use std::io::Write;
use tracing::debug;

use vault_core::{Store, StoreFormat};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List entries with their index
    List,

    /// Import otpauth:// or otpauth-migration:// URLs
    Add {
        /// One or more URLs; nothing is saved unless all of them parse
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Remove the entry at an index
    Remove { index: usize },

    /// Change the issuer and/or name of an entry
    Rename {
        index: usize,

        #[arg(long)]
        issuer: Option<String>,

        #[arg(long)]
        name: Option<String>,
    },

    /// Move an entry one place up or down
    Move {
        index: usize,

        #[arg(value_enum)]
        direction: Direction,
    },

    /// Print every entry as an otpauth:// URL
    Export,

    /// Re-save the store in the authenticated sealed format
    Seal,

    /// Print the resolved store path
    Path,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Command {
    /// Whether the command needs the store decrypted
    pub fn needs_password(&self) -> bool {
        !matches!(self, Command::Path)
    }
}

/// Run `command` against an already loaded store
///
/// Mutating commands save only after every step succeeded, so a failed
/// command leaves the file as it was.
pub fn run(command: &Command, store: &mut Store, out: &mut dyn Write) -> Result<()> {
    debug!("Running {:?}", command);

    match command {
        Command::List => {
            for (index, entry) in store.entries().iter().enumerate() {
                writeln!(out, "{:>3}  {}", index, entry.display_name())?;
            }
        }
        Command::Add { urls } => {
            let mut added = 0;
            for url in urls {
                added += store
                    .add_url(url)
                    .with_context(|| format!("Failed to import {}", redact_url(url)))?;
            }
            store.save().context("Failed to save store")?;
            writeln!(out, "Added {} entries", added)?;
        }
        Command::Remove { index } => {
            let entry = store.remove(*index)?;
            store.save().context("Failed to save store")?;
            writeln!(out, "Removed {}", entry.display_name())?;
        }
        Command::Rename {
            index,
            issuer,
            name,
        } => {
            let current = store
                .entries()
                .get(*index)
                .ok_or(vault_core::VaultError::EntryNotFound(*index))?;
            let issuer = issuer.clone().unwrap_or_else(|| current.issuer.clone());
            let name = name.clone().unwrap_or_else(|| current.name.clone());

            store.rename(*index, issuer, name)?;
            store.save().context("Failed to save store")?;
        }
        Command::Move { index, direction } => {
            match direction {
                Direction::Up => store.move_up(*index)?,
                Direction::Down => store.move_down(*index)?,
            }
            store.save().context("Failed to save store")?;
        }
        Command::Export => {
            for entry in store.entries() {
                writeln!(out, "{}", entry.to_otpauth_url())?;
            }
        }
        Command::Seal => {
            store.set_format(StoreFormat::Sealed);
            store.save().context("Failed to save store")?;
            writeln!(out, "Store sealed")?;
        }
        Command::Path => {
            writeln!(out, "{}", store.path().display())?;
        }
    }

    Ok(())
}

/// Keep secrets out of error messages
fn redact_url(url: &str) -> &str {
    url.split_once('?').map_or(url, |(head, _)| head)
}
