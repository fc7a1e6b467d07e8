//! Password-based key derivation
//!
//! - PBKDF2-HMAC-SHA1 for the legacy CBC format (salt = IV)
//! - Argon2id for the sealed format

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use sha1::Sha1;

use super::DerivedKey;
use crate::error::{Result, VaultError};

/// Iteration count for the legacy format
pub const PBKDF2_ITERATIONS: u32 = 20_000;

/// Size of every derived key: 32 bytes = AES-256
pub const KEY_SIZE: usize = 32;

/// Derive a 256-bit key with PBKDF2-HMAC-SHA1 and the legacy iteration count
pub fn derive_legacy_key(password: &[u8], salt: &[u8]) -> DerivedKey {
    derive_pbkdf2_key(password, salt, PBKDF2_ITERATIONS)
}

pub(crate) fn derive_pbkdf2_key(password: &[u8], salt: &[u8], iterations: u32) -> DerivedKey {
    let mut key_bytes = [0u8; KEY_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha1>(password, salt, iterations, &mut key_bytes);
    DerivedKey::new(key_bytes)
}

/// Parameters for Argon2id key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDerivationParams {
    /// Memory cost in KiB (default: 65536 = 64MB)
    pub memory_cost: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            memory_cost: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

/// Derive a 256-bit key from a password using Argon2id
///
/// # Arguments
/// * `password` - The store passphrase
/// * `salt` - Random salt stored alongside the ciphertext (at least 8 bytes)
/// * `params` - Cost parameters, also stored alongside the ciphertext
pub fn derive_sealed_key(
    password: &[u8],
    salt: &[u8],
    params: &KeyDerivationParams,
) -> Result<DerivedKey> {
    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| VaultError::KeyDerivationError(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key_bytes = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(password, salt, &mut key_bytes)
        .map_err(|e| VaultError::KeyDerivationError(e.to_string()))?;

    Ok(DerivedKey::new(key_bytes))
}

#[cfg(test)]
pub(crate) fn fast_params() -> KeyDerivationParams {
    KeyDerivationParams {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 6070 vectors; the first 20 bytes of a 32-byte output equal the
    // 20-byte output because they come from the same first PRF block.
    #[test]
    fn test_pbkdf2_sha1_known_answer() {
        let key = derive_pbkdf2_key(b"password", b"salt", 2);
        assert_eq!(
            hex::encode(&key.as_bytes()[..20]),
            "ea6c014dc72d6f8ccd1ed92ace1d41f0d8de8957"
        );

        let key = derive_pbkdf2_key(b"password", b"salt", 4096);
        assert_eq!(
            hex::encode(&key.as_bytes()[..20]),
            "4b007901b765489abead49d926f721d065a429c1"
        );
    }

    #[test]
    fn test_legacy_key_deterministic() {
        let salt = [9u8; 16];
        let key1 = derive_legacy_key(b"password", &salt);
        let key2 = derive_legacy_key(b"password", &salt);
        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_legacy_key_depends_on_salt_and_password() {
        let base = derive_legacy_key(b"password", &[1u8; 16]);
        let other_salt = derive_legacy_key(b"password", &[2u8; 16]);
        let other_password = derive_legacy_key(b"passw0rd", &[1u8; 16]);

        assert_ne!(base.as_bytes(), other_salt.as_bytes());
        assert_ne!(base.as_bytes(), other_password.as_bytes());
    }

    #[test]
    fn test_sealed_key_deterministic() {
        let salt = [3u8; 16];
        let params = fast_params();

        let key1 = derive_sealed_key(b"password", &salt, &params).unwrap();
        let key2 = derive_sealed_key(b"password", &salt, &params).unwrap();
        assert_eq!(key1.as_bytes(), key2.as_bytes());

        let key3 = derive_sealed_key(b"different", &salt, &params).unwrap();
        assert_ne!(key1.as_bytes(), key3.as_bytes());
    }

    #[test]
    fn test_sealed_key_rejects_bad_params() {
        let params = KeyDerivationParams {
            memory_cost: 1,
            time_cost: 0,
            parallelism: 0,
        };
        let result = derive_sealed_key(b"password", &[0u8; 16], &params);
        assert!(matches!(result, Err(VaultError::KeyDerivationError(_))));
    }

    #[test]
    fn test_sealed_key_rejects_short_salt() {
        let result = derive_sealed_key(b"password", &[0u8; 4], &fast_params());
        assert!(matches!(result, Err(VaultError::KeyDerivationError(_))));
    }
}
