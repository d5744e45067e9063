//! # Ledger Keys
//!
//! Ed25519 keys in the two textual forms users paste into the app: the raw
//! 32-byte hex secret, and the DER-wrapped hex the ledger's portal and SDKs
//! export (`302e020100300506032b657004220420` + 32 bytes).
//!
//! ## Security considerations
//!
//! - Signing keys are zeroized on drop (ed25519-dalek does this for us).
//! - `Debug` on a private key prints the public half only.
//! - Key bytes are never logged.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::ledger::ids::AccountId;

/// DER prefix of a PKCS#8 Ed25519 private key.
const DER_PRIVATE_PREFIX: [u8; 16] = [
    0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04, 0x20,
];

/// DER prefix of an SPKI Ed25519 public key.
const DER_PUBLIC_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

/// Errors that can occur while parsing keys.
///
/// Deliberately vague: the message never echoes the offending input.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid private key: expected 32-byte hex or DER-encoded hex")]
    InvalidPrivateKey,

    #[error("invalid public key: expected 32-byte hex or DER-encoded hex")]
    InvalidPublicKey,
}

fn strip_hex_prefix(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix("0x").unwrap_or(s)
}

// ---------------------------------------------------------------------------
// Private key
// ---------------------------------------------------------------------------

/// An account's Ed25519 signing key.
#[derive(Clone)]
pub struct LedgerPrivateKey {
    signing_key: SigningKey,
}

impl LedgerPrivateKey {
    /// Fresh key from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_bytes(bytes: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    pub fn public_key(&self) -> LedgerPublicKey {
        LedgerPublicKey {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// DER-wrapped hex, the form the vault encrypts and stores.
    pub fn to_der_hex(&self) -> Zeroizing<String> {
        let mut der = Zeroizing::new(Vec::with_capacity(48));
        der.extend_from_slice(&DER_PRIVATE_PREFIX);
        der.extend_from_slice(self.signing_key.as_bytes());
        Zeroizing::new(hex::encode(der.as_slice()))
    }
}

impl FromStr for LedgerPrivateKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = Zeroizing::new(
            hex::decode(strip_hex_prefix(s)).map_err(|_| KeyError::InvalidPrivateKey)?,
        );
        let secret = match bytes.len() {
            SECRET_KEY_LENGTH => &bytes[..],
            48 if bytes[..16] == DER_PRIVATE_PREFIX => &bytes[16..],
            _ => return Err(KeyError::InvalidPrivateKey),
        };
        let mut seed = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
        seed.copy_from_slice(secret);
        Ok(Self::from_bytes(&seed))
    }
}

impl fmt::Debug for LedgerPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LedgerPrivateKey(public={})", self.public_key())
    }
}

// ---------------------------------------------------------------------------
// Public key
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct LedgerPublicKey {
    verifying_key: VerifyingKey,
}

impl LedgerPublicKey {
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.verifying_key.verify(message, signature).is_ok()
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    pub fn to_der_hex(&self) -> String {
        let mut der = Vec::with_capacity(44);
        der.extend_from_slice(&DER_PUBLIC_PREFIX);
        der.extend_from_slice(self.verifying_key.as_bytes());
        hex::encode(der)
    }
}

impl FromStr for LedgerPublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(strip_hex_prefix(s)).map_err(|_| KeyError::InvalidPublicKey)?;
        let raw = match bytes.len() {
            32 => &bytes[..],
            44 if bytes[..12] == DER_PUBLIC_PREFIX => &bytes[12..],
            _ => return Err(KeyError::InvalidPublicKey),
        };
        let mut arr = [0u8; 32];
        arr.copy_from_slice(raw);
        let verifying_key =
            VerifyingKey::from_bytes(&arr).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { verifying_key })
    }
}

impl fmt::Display for LedgerPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_der_hex())
    }
}

impl fmt::Debug for LedgerPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LedgerPublicKey({})", self.to_der_hex())
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// An account together with the key that signs for it.
///
/// Produced by unlocking a vault record and passed explicitly into every
/// call that submits or signs a transaction.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub account: AccountId,
    pub key: LedgerPrivateKey,
}

impl Credentials {
    pub fn new(account: AccountId, key: LedgerPrivateKey) -> Self {
        Self { account, key }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_and_der_forms_parse_to_same_key() {
        let key = LedgerPrivateKey::generate();
        let der = key.to_der_hex();
        let raw = &der[32..];

        let from_der: LedgerPrivateKey = der.parse().unwrap();
        let from_raw: LedgerPrivateKey = raw.parse().unwrap();
        assert_eq!(from_der.public_key(), key.public_key());
        assert_eq!(from_raw.public_key(), key.public_key());
    }

    #[test]
    fn der_prefix_is_checked() {
        let key = LedgerPrivateKey::generate();
        let mut der = key.to_der_hex().to_string();
        der.replace_range(0..2, "31");
        assert!(der.parse::<LedgerPrivateKey>().is_err());
    }

    #[test]
    fn junk_is_rejected() {
        assert!("not hex".parse::<LedgerPrivateKey>().is_err());
        assert!("abcd".parse::<LedgerPrivateKey>().is_err());
        assert!("".parse::<LedgerPublicKey>().is_err());
    }

    #[test]
    fn sign_and_verify() {
        let key = LedgerPrivateKey::generate();
        let sig = key.sign(b"swap 0.0.77 for 5 hbar");
        assert!(key.public_key().verify(b"swap 0.0.77 for 5 hbar", &sig));
        assert!(!key.public_key().verify(b"swap 0.0.77 for 6 hbar", &sig));
    }

    #[test]
    fn public_key_der_roundtrip() {
        let public = LedgerPrivateKey::generate().public_key();
        let der = public.to_der_hex();
        assert!(der.starts_with("302a300506032b6570032100"));
        assert_eq!(der.parse::<LedgerPublicKey>().unwrap(), public);
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let key = LedgerPrivateKey::generate();
        let secret_hex = key.to_der_hex()[32..].to_string();
        let debug = format!("{:?}", key);
        assert!(!debug.contains(&secret_hex));
    }
}
