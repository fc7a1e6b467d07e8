//! Error types for vault-core

use thiserror::Error;

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Vault error types
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Secure random source unavailable: {0}")]
    RandomSourceError(String),

    #[error("Cipher initialization failed: {0}")]
    CipherInitError(String),

    #[error("Malformed ciphertext: {0}")]
    MalformedCiphertextError(String),

    #[error("Decryption failed: {0}")]
    DecryptionError(String),

    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationError(String),

    #[error("Store contents are not a valid entry list: {0}")]
    DeserializationError(#[source] serde_json::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[source] serde_json::Error),

    #[error("Could not read store file: {0}")]
    ReadError(#[source] std::io::Error),

    #[error("Could not write store file: {0}")]
    WriteError(#[source] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidSchemeError(String),

    #[error("OTP protocol not supported: {0}")]
    UnsupportedProtocolError(String),

    #[error("Missing secret")]
    MissingSecretError,

    #[error("Could not decode migration payload: {0}")]
    MigrationDecodeError(String),

    #[error("Entry not found at index {0}")]
    EntryNotFound(usize),

    #[error("Settings error: {0}")]
    SettingsError(String),
}
