//! Sealed format: Argon2id + AES-256-GCM authenticated encryption
//!
//! Layout (all integers little-endian):
//!
//! | bytes | field                         |
//! |-------|-------------------------------|
//! | 8     | magic `OTPVAULT`              |
//! | 1     | format version (`0x02`)       |
//! | 4     | argon2 memory cost (KiB)      |
//! | 4     | argon2 time cost              |
//! | 4     | argon2 parallelism            |
//! | 16    | salt                          |
//! | 12    | nonce                         |
//! | n+16  | ciphertext with auth tag      |
//!
//! The header is bound to the ciphertext as associated data, so the
//! stored KDF parameters cannot be altered without failing decryption.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use super::key_derivation::{derive_sealed_key, KeyDerivationParams};
use crate::error::{Result, VaultError};

/// Leading bytes of every sealed store file
pub const SEALED_MAGIC: &[u8; 8] = b"OTPVAULT";

/// Version byte following the magic
pub const SEALED_VERSION: u8 = 0x02;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = SEALED_MAGIC.len() + 1 + 12 + SALT_LEN + NONCE_LEN;

// Upper bound on memory cost read from a file header (4 GiB)
const MAX_MEMORY_COST: u32 = 4 * 1024 * 1024;

/// Whether `data` starts with the sealed-format discriminator
pub fn is_sealed(data: &[u8]) -> bool {
    data.len() > SEALED_MAGIC.len()
        && data.starts_with(SEALED_MAGIC)
        && data[SEALED_MAGIC.len()] == SEALED_VERSION
}

/// Encrypt plaintext into a self-describing sealed blob
pub fn seal(plaintext: &[u8], password: &[u8], params: &KeyDerivationParams) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .and_then(|_| OsRng.try_fill_bytes(&mut nonce))
        .map_err(|e| VaultError::RandomSourceError(e.to_string()))?;

    let key = derive_sealed_key(password, &salt, params)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::CipherInitError(e.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + plaintext.len() + TAG_LEN);
    out.extend_from_slice(SEALED_MAGIC);
    out.push(SEALED_VERSION);
    out.extend_from_slice(&params.memory_cost.to_le_bytes());
    out.extend_from_slice(&params.time_cost.to_le_bytes());
    out.extend_from_slice(&params.parallelism.to_le_bytes());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad: &out,
            },
        )
        .map_err(|e| VaultError::EncryptionError(e.to_string()))?;

    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt and authenticate a sealed blob
///
/// A wrong password and a modified file both fail with `DecryptionError`.
pub fn open(data: &[u8], password: &[u8]) -> Result<Vec<u8>> {
    if !is_sealed(data) {
        return Err(VaultError::MalformedCiphertextError(
            "missing sealed format header".to_string(),
        ));
    }
    if data.len() < HEADER_LEN + TAG_LEN {
        return Err(VaultError::MalformedCiphertextError(format!(
            "sealed data too short: {} bytes",
            data.len()
        )));
    }

    let (header, ciphertext) = data.split_at(HEADER_LEN);
    let mut pos = SEALED_MAGIC.len() + 1;
    let mut read_u32 = || {
        let mut word = [0u8; 4];
        word.copy_from_slice(&header[pos..pos + 4]);
        pos += 4;
        u32::from_le_bytes(word)
    };
    let params = KeyDerivationParams {
        memory_cost: read_u32(),
        time_cost: read_u32(),
        parallelism: read_u32(),
    };
    if params.memory_cost > MAX_MEMORY_COST {
        return Err(VaultError::MalformedCiphertextError(format!(
            "memory cost {} KiB exceeds limit",
            params.memory_cost
        )));
    }

    let salt_start = SEALED_MAGIC.len() + 1 + 12;
    let salt = &header[salt_start..salt_start + SALT_LEN];
    let nonce = &header[salt_start + SALT_LEN..HEADER_LEN];

    let key = derive_sealed_key(password, salt, &params)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::CipherInitError(e.to_string()))?;

    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: header,
            },
        )
        .map_err(|_| {
            VaultError::DecryptionError("wrong password or corrupted store".to_string())
        })
}
