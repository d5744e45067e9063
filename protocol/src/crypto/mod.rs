//! # Cryptographic Primitives
//!
//! Everything the vault needs to keep a private key safe at rest, and
//! everything the rest of the crate needs to sign with it once unlocked.
//!
//! - **PBKDF2-HMAC-SHA256** stretches passwords into AES keys.
//! - **AES-CBC / PKCS#7** encrypts the key material.
//! - **SHA-256** with a random salt gates unlock attempts.
//! - **Ed25519** signs ledger transactions.
//!
//! Nothing here is novel. Each function is a typed wrapper around an
//! audited RustCrypto or dalek implementation.

pub mod encoding;
pub mod encryption;
pub mod hash;
pub mod keys;

pub use encoding::{decode_base64_to_string, encode_string_to_base64};
pub use encryption::{
    decrypt_message, encrypt_message, encrypt_message_with, EncryptedBlob, EncryptionError,
    EncryptionParams,
};
pub use hash::{check_password, hash_password, hash_password_with_salt_bits, sha256, PasswordHash};
pub use keys::{Credentials, KeyError, LedgerPrivateKey, LedgerPublicKey};
