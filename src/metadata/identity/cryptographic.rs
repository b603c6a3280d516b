//! Public key token derivation for strong-named assemblies.
//!
//! A public key token is the compact 8-byte form of an assembly's public key: the
//! key is hashed and the last 8 bytes of the digest are taken in reverse order
//! (ECMA-335 II.6.2.1.3). SHA-1 is the standard algorithm; MD5 is supported for
//! legacy assemblies.
//!
//! # Examples
//!
//! ```rust
//! use dotmutate::metadata::identity::compute_public_key_token;
//!
//! // The ECMA standard public key
//! let ecma_key = [0u8, 0, 0, 0, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0];
//! let token = compute_public_key_token(&ecma_key);
//! assert_eq!(token, vec![0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89]);
//!
//! assert!(compute_public_key_token(&[]).is_empty());
//! ```
//!
//! # Thread Safety
//!
//! Token computation is stateless and can be called concurrently from multiple threads.

use md5::{Digest, Md5};
use sha1::Sha1;

/// Hash algorithm used to derive a public key token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-1 (`0x8004`), the algorithm used by virtually all strong-named assemblies
    #[default]
    Sha1,
    /// MD5 (`0x8003`), legacy
    Md5,
}

/// Compute the 8-byte public key token of `public_key` using SHA-1.
///
/// The function is pure: the same bytes always produce the same token. An empty key
/// produces an empty token rather than an error.
#[must_use]
pub fn compute_public_key_token(public_key: &[u8]) -> Vec<u8> {
    compute_public_key_token_with(public_key, HashAlgorithm::Sha1)
}

/// Compute the 8-byte public key token of `public_key` with the given hash algorithm.
#[must_use]
pub fn compute_public_key_token_with(public_key: &[u8], algorithm: HashAlgorithm) -> Vec<u8> {
    if public_key.is_empty() {
        return Vec::new();
    }

    let digest: Vec<u8> = match algorithm {
        HashAlgorithm::Sha1 => {
            let mut hasher = Sha1::new();
            hasher.update(public_key);
            hasher.finalize().to_vec()
        }
        HashAlgorithm::Md5 => {
            let mut hasher = Md5::new();
            hasher.update(public_key);
            hasher.finalize().to_vec()
        }
    };

    digest[digest.len() - 8..].iter().rev().copied().collect()
}
