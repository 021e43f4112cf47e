//! Digest helpers used to derive stable identifiers from arbitrary strings

use sha1::Sha1;
use sha2::{Digest, Sha256};

/// The number of hex characters kept by `short_sha1`
pub const SHORT_DIGEST_LEN: usize = 7;

/// Hex encoded SHA-1 of the input, truncated to `SHORT_DIGEST_LEN` characters
///
/// Used to disambiguate resource names when no more descriptive component
/// (e.g. a network interface) is available
pub fn short_sha1(input: &str) -> String {
    let digest = Sha1::digest(input.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(SHORT_DIGEST_LEN);
    encoded
}

/// Hex encoded SHA-256 of the input
pub fn sha256_hex(input: &[u8]) -> String {
    hex::encode(Sha256::digest(input))
}
