// src/hash.rs

//! Payload hashing for content addressing and chaincode ids
//!
//! - **SHA-256** (default): cryptographic, used for chaincode ids that leave the peer
//! - **XXH128**: fast non-cryptographic hash for local-only deployments

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use xxhash_rust::xxh3::xxh3_128;

/// Hash algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Xxh128,
}

impl HashAlgorithm {
    /// Hash output length as a hex string
    #[inline]
    pub const fn hex_len(&self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Xxh128 => 32,
        }
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Xxh128 => "xxh128",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "xxh128" | "xxhash" | "xxh3" => Ok(Self::Xxh128),
            _ => Err(format!("unknown hash algorithm: {s}")),
        }
    }
}

/// Compute the hex digest of a byte slice
pub fn hash_bytes(algorithm: HashAlgorithm, data: &[u8]) -> String {
    match algorithm {
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
        HashAlgorithm::Xxh128 => format!("{:032x}", xxh3_128(data)),
    }
}

/// Compute SHA-256 hex digest
#[inline]
pub fn sha256(data: &[u8]) -> String {
    hash_bytes(HashAlgorithm::Sha256, data)
}

/// Check that a string looks like a digest produced by `algorithm`
pub fn is_valid_digest(algorithm: HashAlgorithm, value: &str) -> bool {
    value.len() == algorithm.hex_len() && value.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256(b"Hello, World!"),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }

    #[test]
    fn test_xxh128_length() {
        let value = hash_bytes(HashAlgorithm::Xxh128, b"Hello, World!");
        assert_eq!(value.len(), 32);
        assert!(is_valid_digest(HashAlgorithm::Xxh128, &value));
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!("sha256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("SHA-256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("xxh128".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Xxh128);
        assert!("md5".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn test_digest_validation() {
        assert!(!is_valid_digest(HashAlgorithm::Sha256, "abc123"));
        assert!(!is_valid_digest(
            HashAlgorithm::Sha256,
            "gggg6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        ));
    }
}
