//! # vault-core
//!
//! Core functionality for OTP Vault, a password-protected TOTP credential store:
//! - Legacy AES-256-CBC file format (PBKDF2-HMAC-SHA1, IV doubles as salt)
//! - Opt-in sealed AES-256-GCM format with Argon2id key derivation
//! - `otpauth://` and `otpauth-migration://` URL ingestion
//! - Atomic store file writes and JSON settings

pub mod crypto;
pub mod entry;
pub mod error;
pub mod ingest;
pub mod settings;
pub mod storage;
mod store;

pub use crypto::{decrypt, decrypt_string, encrypt, encrypt_string, KeyDerivationParams, Password};
pub use entry::Entry;
pub use error::{Result, VaultError};
pub use ingest::{parse_url, IngestUrl, Payload};
pub use settings::{default_config_dir, default_store_path, Settings, SettingsManager};
pub use storage::{ContentKind, StoreFormat};
pub use store::Store;
