//! Legacy password cipher: PBKDF2-HMAC-SHA1 + AES-256-CBC
//!
//! Encryption format: `{iv}{ciphertext}` as raw bytes
//! - IV: 16 bytes, random per encryption, doubles as the PBKDF2 salt
//! - Ciphertext: whole AES blocks, no padding added by this layer
//!
//! There is no authentication tag. A wrong password or a tampered file
//! decrypts to garbage without an error here; the JSON decoder above is
//! what notices. The sealed format in [`super::sealed`] is the
//! authenticated alternative.

use cbc::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::{rngs::OsRng, RngCore};

use super::key_derivation::derive_legacy_key;
use crate::error::{Result, VaultError};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES block size; also the IV and salt length
pub const BLOCK_SIZE: usize = 16;

/// Encrypt block-aligned plaintext with a password
///
/// # Arguments
/// * `plaintext` - Data to encrypt; its length must be a multiple of 16
/// * `password` - Opaque passphrase bytes
///
/// # Returns
/// The random IV followed by the CBC ciphertext
pub fn encrypt(plaintext: &[u8], password: &[u8]) -> Result<Vec<u8>> {
    if plaintext.len() % BLOCK_SIZE != 0 {
        return Err(VaultError::EncryptionError(format!(
            "plaintext length {} is not a multiple of {}",
            plaintext.len(),
            BLOCK_SIZE
        )));
    }

    let mut iv = [0u8; BLOCK_SIZE];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| VaultError::RandomSourceError(e.to_string()))?;

    let key = derive_legacy_key(password, &iv);
    let ciphertext = cbc_encrypt(key.as_bytes(), &iv, plaintext)?;

    let mut out = Vec::with_capacity(BLOCK_SIZE + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt `{iv}{ciphertext}` produced by [`encrypt`]
///
/// Succeeds for any well-formed input, whatever the password.
pub fn decrypt(ciphertext: &[u8], password: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < BLOCK_SIZE {
        return Err(VaultError::MalformedCiphertextError(format!(
            "expected at least {} bytes, got {}",
            BLOCK_SIZE,
            ciphertext.len()
        )));
    }

    let (iv, body) = ciphertext.split_at(BLOCK_SIZE);
    if body.len() % BLOCK_SIZE != 0 {
        return Err(VaultError::MalformedCiphertextError(format!(
            "ciphertext body length {} is not a multiple of {}",
            body.len(),
            BLOCK_SIZE
        )));
    }

    let key = derive_legacy_key(password, iv);
    cbc_decrypt(key.as_bytes(), iv, body)
}

/// Zero-pad a string to the next block boundary and encrypt it
///
/// Always appends between 1 and 16 NUL bytes, so an already aligned
/// input gets a full block of padding.
pub fn encrypt_string(plaintext: &str, password: &[u8]) -> Result<Vec<u8>> {
    let bytes = plaintext.as_bytes();
    let padding = BLOCK_SIZE - bytes.len() % BLOCK_SIZE;

    let mut padded = Vec::with_capacity(bytes.len() + padding);
    padded.extend_from_slice(bytes);
    padded.resize(bytes.len() + padding, 0);

    encrypt(&padded, password)
}

/// Decrypt and strip trailing NUL padding
///
/// Zero padding is ambiguous for text that really ends in NUL bytes.
/// Store contents are JSON, which never does.
pub fn decrypt_string(ciphertext: &[u8], password: &[u8]) -> Result<String> {
    let mut plaintext = decrypt(ciphertext, password)?;
    let end = plaintext
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |pos| pos + 1);
    plaintext.truncate(end);

    String::from_utf8(plaintext)
        .map_err(|_| VaultError::DecryptionError("plaintext is not valid UTF-8".to_string()))
}

fn cbc_encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let encryptor = Aes256CbcEnc::new_from_slices(key, iv)
        .map_err(|e| VaultError::CipherInitError(e.to_string()))?;

    let mut buf = plaintext.to_vec();
    let len = buf.len();
    encryptor
        .encrypt_padded_mut::<NoPadding>(&mut buf, len)
        .map_err(|_| VaultError::EncryptionError("plaintext is not block aligned".to_string()))?;

    Ok(buf)
}

fn cbc_decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let decryptor = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|e| VaultError::CipherInitError(e.to_string()))?;

    let mut buf = ciphertext.to_vec();
    let len = decryptor
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|_| {
            VaultError::MalformedCiphertextError("ciphertext is not block aligned".to_string())
        })?
        .len();
    buf.truncate(len);

    Ok(buf)
}
