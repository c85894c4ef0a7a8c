//! Hashing primitives.
//!
//! Commitments use SHA-256 truncated to [`TRUNCATED_HASH_LENGTH`] bytes, the
//! same truncation the host ledger applies to transaction hashes.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::utils::constants::{SALT_BYTES, TRUNCATED_HASH_LENGTH};

/// Compute the full SHA-256 digest of data
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-256 and keep the leading [`TRUNCATED_HASH_LENGTH`] bytes
pub fn sha256_truncated(data: &[u8]) -> [u8; TRUNCATED_HASH_LENGTH] {
    let full = sha256(data);
    let mut out = [0u8; TRUNCATED_HASH_LENGTH];
    out.copy_from_slice(&full[..TRUNCATED_HASH_LENGTH]);
    out
}

/// Generate a random salt, hex encoded
pub fn random_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256("abc")
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_truncation_is_prefix() {
        let full = sha256(b"oracle");
        let short = sha256_truncated(b"oracle");
        assert_eq!(&full[..TRUNCATED_HASH_LENGTH], &short[..]);
    }

    #[test]
    fn test_random_salt_shape() {
        let a = random_salt();
        let b = random_salt();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
