//! Credential hashing and verification.
//!
//! Encoded form: `sha256$<salt-hex>$<digest-hex>` where the digest is
//! `SHA-256(salt || password)` over a 16-byte random salt.

use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

/// Hashes new credentials and verifies presented ones.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> String;

    /// `false` for mismatches and for malformed encodings alike.
    fn verify(&self, password: &str, encoded: &str) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256CredentialHasher;

impl Sha256CredentialHasher {
    fn digest(salt: &[u8], password: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        hasher.finalize().into()
    }
}

impl CredentialHasher for Sha256CredentialHasher {
    fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let digest = Self::digest(&salt, password);
        format!("{SCHEME}${}${}", hex::encode(salt), hex::encode(digest))
    }

    fn verify(&self, password: &str, encoded: &str) -> bool {
        let mut parts = encoded.splitn(3, '$');
        let (Some(scheme), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        if scheme != SCHEME {
            return false;
        }
        let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
            return false;
        };

        let actual = Self::digest(&salt, password);
        actual.as_slice().ct_eq(expected.as_slice()).into()
    }
}
