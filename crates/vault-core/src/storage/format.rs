//! On-disk store formats and detection
//!
//! A store file is one of:
//! - plaintext JSON: exactly `[]`, or anything starting with `[{`
//!   (stores written before encryption, or empty stores)
//! - sealed: `OTPVAULT` magic + version, see [`crate::crypto::sealed`]
//! - legacy: anything else, read as `{iv}{aes-256-cbc ciphertext}`

use serde::{Deserialize, Serialize};

use crate::crypto::{self, sealed, KeyDerivationParams};
use crate::error::{Result, VaultError};

/// Contents of an empty, unencrypted store
pub const EMPTY_LIST: &[u8] = b"[]";

const PLAINTEXT_PREFIX: &[u8] = b"[{";

/// Encryption used when saving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    /// AES-256-CBC with PBKDF2-HMAC-SHA1, no integrity check
    #[default]
    Legacy,
    /// AES-256-GCM with Argon2id, authenticated
    Sealed,
}

/// What a store file turned out to contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Plaintext,
    Legacy,
    Sealed,
}

/// Classify raw file contents without decrypting anything
pub fn detect(contents: &[u8]) -> ContentKind {
    if contents == EMPTY_LIST || contents.starts_with(PLAINTEXT_PREFIX) {
        ContentKind::Plaintext
    } else if sealed::is_sealed(contents) {
        ContentKind::Sealed
    } else {
        ContentKind::Legacy
    }
}

/// Turn file contents into JSON text
pub fn decode(contents: &[u8], password: &[u8]) -> Result<String> {
    match detect(contents) {
        ContentKind::Plaintext => String::from_utf8(contents.to_vec()).map_err(|_| {
            VaultError::DecryptionError("plaintext store is not valid UTF-8".to_string())
        }),
        ContentKind::Sealed => {
            let plaintext = sealed::open(contents, password)?;
            String::from_utf8(plaintext).map_err(|_| {
                VaultError::DecryptionError("plaintext is not valid UTF-8".to_string())
            })
        }
        ContentKind::Legacy => crypto::decrypt_string(contents, password),
    }
}

/// Encrypt JSON text for writing
pub fn encode(
    json: &str,
    password: &[u8],
    format: StoreFormat,
    params: &KeyDerivationParams,
) -> Result<Vec<u8>> {
    match format {
        StoreFormat::Legacy => loop {
            // An IV starting with `[{` or the sealed magic would be
            // misdetected on load; draw a new one.
            let bytes = crypto::encrypt_string(json, password)?;
            if detect(&bytes) == ContentKind::Legacy {
                break Ok(bytes);
            }
        },
        StoreFormat::Sealed => sealed::seal(json.as_bytes(), password, params),
    }
}
