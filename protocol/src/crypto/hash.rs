//! # Hashing
//!
//! SHA-256 helpers and the salted password hash the vault stores to gate
//! unlocks.
//!
//! A [`PasswordHash`] is `hex(sha256(salt_hex || password))`. It exists so a
//! wrong password can be rejected before any PBKDF2 work is spent on the
//! encrypted key. It is not a substitute for that derivation; the key blob
//! stays protected by PBKDF2 regardless.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::config::SALT_LENGTH_BITS;

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// A salted password digest. Both fields are lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHash {
    pub hash: String,
    pub salt: String,
}

/// Hashes `password` under a fresh 128-bit salt.
pub fn hash_password(password: &str) -> PasswordHash {
    hash_password_with_salt_bits(password, SALT_LENGTH_BITS)
}

/// Hashes `password` under a fresh salt of `salt_bits` bits, rounded up to
/// whole bytes.
pub fn hash_password_with_salt_bits(password: &str, salt_bits: usize) -> PasswordHash {
    let mut salt = vec![0u8; salt_bits.div_ceil(8)];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    let salt = hex::encode(salt);
    PasswordHash {
        hash: salted_digest(&salt, password),
        salt,
    }
}

/// Recomputes the digest with `stored_salt` and compares it with
/// `stored_hash` in constant time.
pub fn check_password(password: &str, stored_hash: &str, stored_salt: &str) -> bool {
    let candidate = salted_digest(stored_salt, password);
    candidate.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

fn salted_digest(salt_hex: &str, password: &str) -> String {
    let mut preimage = Zeroizing::new(Vec::with_capacity(salt_hex.len() + password.len()));
    preimage.extend_from_slice(salt_hex.as_bytes());
    preimage.extend_from_slice(password.as_bytes());
    sha256_hex(&preimage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_is_salt_then_password() {
        let expected = sha256_hex(b"00ffpassword");
        assert!(check_password("password", &expected, "00ff"));
    }

    #[test]
    fn hash_then_check() {
        let record = hash_password("Tr0ub4dor3AndMore");
        assert_eq!(record.salt.len(), 32);
        assert_eq!(record.hash.len(), 64);
        assert!(check_password("Tr0ub4dor3AndMore", &record.hash, &record.salt));
        assert!(!check_password("tr0ub4dor3AndMore", &record.hash, &record.salt));
        assert!(!check_password("", &record.hash, &record.salt));
    }

    #[test]
    fn perturbed_salt_fails() {
        let password = "abcdefghijklmnop987654321";
        let record = hash_password(password);
        assert!(check_password(password, &record.hash, &record.salt));
        assert!(!check_password("abcdefghijklmnop987654322", &record.hash, &record.salt));
        let longer_salt = format!("{}0", record.salt);
        assert!(!check_password(password, &record.hash, &longer_salt));
    }

    #[test]
    fn salts_differ_between_calls() {
        let a = hash_password("same");
        let b = hash_password("same");
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn custom_salt_length() {
        assert_eq!(hash_password_with_salt_bits("pw", 256).salt.len(), 64);
        assert_eq!(hash_password_with_salt_bits("pw", 12).salt.len(), 4);
    }

    #[test]
    fn mismatched_lengths_never_match() {
        assert!(!check_password("pw", "abcd", "00"));
    }

    #[test]
    fn stored_hash_must_match_in_full() {
        let record = hash_password("abcdefghijklmnop987654321");
        let truncated = &record.hash[..record.hash.len() - 1];
        assert!(!check_password("abcdefghijklmnop987654321", truncated, &record.salt));

        let mut flipped = record.hash.clone().into_bytes();
        flipped[0] = if flipped[0] == b'0' { b'1' } else { b'0' };
        let flipped = String::from_utf8(flipped).unwrap();
        assert!(!check_password("abcdefghijklmnop987654321", &flipped, &record.salt));

        assert!(!check_password("abcdefghijklmnop987654321", "", &record.salt));
    }
}
