//! # Password-Based Encryption
//!
//! Protects a private key at rest with a key derived from the user's
//! password. PBKDF2-HMAC-SHA256 stretches the password with a fresh random
//! salt, then AES in CBC mode with PKCS#7 padding and a fresh random IV
//! encrypts the message.
//!
//! Every parameter needed to re-derive the key travels with the ciphertext
//! in an [`EncryptedBlob`], so old blobs stay readable after the defaults
//! change.
//!
//! ## Persisted format
//!
//! ```json
//! { "cipher": "<base64>", "iv": "<hex>", "salt": "<hex>",
//!   "iterations": 10000, "keyLength": 256 }
//! ```
//!
//! ## Failure contract
//!
//! Decryption never reports *why* it failed. A wrong password, a corrupted
//! blob and a tampered parameter all come back as `None`. CBC has no
//! authentication tag: a wrong key is caught by the padding check or by
//! UTF-8 validation of the output, never silently accepted as valid text
//! in practice.

use aes::{Aes128, Aes192, Aes256};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::config::{IV_LENGTH_BITS, KEY_ITERATIONS, KEY_LENGTH_BITS, SALT_LENGTH_BITS};

/// AES block size; CBC IVs must be exactly one block.
const AES_BLOCK_BITS: usize = 128;

/// Errors from [`encrypt_message_with`]. They only ever describe bad
/// parameters; decryption failures are reported as `None` instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncryptionError {
    #[error("unsupported key length: {0} bits (expected 128, 192 or 256)")]
    UnsupportedKeyLength(usize),

    #[error("invalid IV length: {0} bits (CBC requires {AES_BLOCK_BITS})")]
    InvalidIvLength(usize),

    #[error("invalid salt length: {0} bits (must be a positive multiple of 8)")]
    InvalidSaltLength(usize),

    #[error("iteration count must be positive")]
    ZeroIterations,
}

/// A password-encrypted secret plus everything needed to decrypt it.
///
/// Immutable once produced. Re-encrypting under a new password creates a
/// new blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedBlob {
    /// Base64 ciphertext.
    pub cipher: String,
    /// Hex initialization vector.
    pub iv: String,
    /// Hex PBKDF2 salt.
    pub salt: String,
    /// PBKDF2 iteration count.
    pub iterations: u32,
    /// Derived key length in bits.
    pub key_length: usize,
}

/// Tunables for [`encrypt_message_with`]. All lengths in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionParams {
    pub salt_bits: usize,
    pub iv_bits: usize,
    pub key_bits: usize,
    pub iterations: u32,
}

impl Default for EncryptionParams {
    fn default() -> Self {
        Self {
            salt_bits: SALT_LENGTH_BITS,
            iv_bits: IV_LENGTH_BITS,
            key_bits: KEY_LENGTH_BITS,
            iterations: KEY_ITERATIONS,
        }
    }
}

impl EncryptionParams {
    fn validate(&self) -> Result<(), EncryptionError> {
        if !matches!(self.key_bits, 128 | 192 | 256) {
            return Err(EncryptionError::UnsupportedKeyLength(self.key_bits));
        }
        if self.iv_bits != AES_BLOCK_BITS {
            return Err(EncryptionError::InvalidIvLength(self.iv_bits));
        }
        if self.salt_bits == 0 || self.salt_bits % 8 != 0 {
            return Err(EncryptionError::InvalidSaltLength(self.salt_bits));
        }
        if self.iterations == 0 {
            return Err(EncryptionError::ZeroIterations);
        }
        Ok(())
    }
}

fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes
}

fn derive_key(password: &str, salt: &[u8], iterations: u32, key_bits: usize) -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(vec![0u8; key_bits / 8]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

fn cbc_encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Option<Vec<u8>> {
    match key.len() {
        16 => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
            .ok()
            .map(|c| c.encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
        24 => cbc::Encryptor::<Aes192>::new_from_slices(key, iv)
            .ok()
            .map(|c| c.encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
        32 => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .ok()
            .map(|c| c.encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
        _ => None,
    }
}

fn cbc_decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Option<Vec<u8>> {
    match key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .ok()?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .ok(),
        24 => cbc::Decryptor::<Aes192>::new_from_slices(key, iv)
            .ok()?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .ok(),
        32 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .ok()?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .ok(),
        _ => None,
    }
}

/// Encrypts `message` under `password` with the default parameters
/// (128-bit salt, 128-bit IV, 256-bit key, 10 000 iterations).
///
/// Two calls with the same inputs produce different blobs: salt and IV are
/// fresh each time.
///
/// # Example
///
/// ```
/// use trader_protocol::crypto::encryption::{decrypt_message, encrypt_message};
///
/// let blob = encrypt_message("302e0201...", "correct horse battery").unwrap();
/// let plain = decrypt_message(&blob, "correct horse battery").unwrap();
/// assert_eq!(plain.as_str(), "302e0201...");
/// assert!(decrypt_message(&blob, "wrong").map_or(true, |p| p.as_str() != "302e0201..."));
/// ```
pub fn encrypt_message(message: &str, password: &str) -> Result<EncryptedBlob, EncryptionError> {
    encrypt_message_with(message, password, EncryptionParams::default())
}

/// [`encrypt_message`] with explicit parameters.
pub fn encrypt_message_with(
    message: &str,
    password: &str,
    params: EncryptionParams,
) -> Result<EncryptedBlob, EncryptionError> {
    params.validate()?;

    let salt = random_bytes(params.salt_bits / 8);
    let iv = random_bytes(params.iv_bits / 8);
    let key = derive_key(password, &salt, params.iterations, params.key_bits);

    // validate() pinned the key and IV lengths, so this can't miss.
    let ciphertext = cbc_encrypt(&key, &iv, message.as_bytes())
        .ok_or(EncryptionError::UnsupportedKeyLength(params.key_bits))?;

    Ok(EncryptedBlob {
        cipher: STANDARD.encode(ciphertext),
        iv: hex::encode(iv),
        salt: hex::encode(salt),
        iterations: params.iterations,
        key_length: params.key_bits,
    })
}

/// Re-derives the key from `password` and the blob's own parameters and
/// decrypts.
///
/// Returns `None` on any failure: wrong password, corrupted ciphertext,
/// malformed hex/base64, unsupported parameters, or plaintext that isn't
/// UTF-8. Callers treat `None` as "wrong password or corrupted blob".
pub fn decrypt_message(blob: &EncryptedBlob, password: &str) -> Option<Zeroizing<String>> {
    if !matches!(blob.key_length, 128 | 192 | 256) || blob.iterations == 0 {
        return None;
    }
    let salt = hex::decode(&blob.salt).ok()?;
    let iv = hex::decode(&blob.iv).ok()?;
    let ciphertext = STANDARD.decode(&blob.cipher).ok()?;

    let key = derive_key(password, &salt, blob.iterations, blob.key_length);
    let plaintext = Zeroizing::new(cbc_decrypt(&key, &iv, &ciphertext)?);
    let text = std::str::from_utf8(&plaintext).ok()?;
    Some(Zeroizing::new(text.to_string()))
}
