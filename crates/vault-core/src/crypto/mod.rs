//! Cryptographic primitives for the store file
//!
//! This module provides:
//! - The legacy AES-256-CBC password cipher (PBKDF2-HMAC-SHA1, IV as salt)
//! - The sealed AES-256-GCM format with Argon2id key derivation
//! - Secure memory handling with zeroize

mod cipher;
mod key_derivation;
pub mod sealed;
mod secure_memory;

pub use cipher::{decrypt, decrypt_string, encrypt, encrypt_string, BLOCK_SIZE};
pub use key_derivation::{
    derive_legacy_key, derive_sealed_key, KeyDerivationParams, KEY_SIZE, PBKDF2_ITERATIONS,
};
pub use secure_memory::{DerivedKey, Password};

#[cfg(test)]
pub(crate) use key_derivation::fast_params;
