//! Hashing utilities
//!
//! SHA-512/256 with a domain-separation prefix is used for every identifier
//! the ledger derives (transaction ids, account and escrow addresses).
//! Plain SHA-256 is kept for address checksums.

use sha2::{Digest, Sha256, Sha512_256};

/// Domain prefix for transaction ids and transaction signatures
pub const TX_DOMAIN: &[u8] = b"TX";
/// Domain prefix for program (escrow) addresses and program delegation signatures
pub const PROGRAM_DOMAIN: &[u8] = b"Program";
/// Domain prefix for multisig account addresses
pub const MULTISIG_DOMAIN: &[u8] = b"MultisigAddr";

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes double SHA-256 hash (SHA-256 of SHA-256)
pub fn double_sha256(data: &[u8]) -> Vec<u8> {
    sha256(&sha256(data))
}

/// SHA-512/256 of `domain || data`
pub fn domain_hash(domain: &[u8], data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha512_256::new();
    hasher.update(domain);
    hasher.update(data);
    hasher.finalize().into()
}

/// Domain-separated hash rendered as lowercase hex
pub fn domain_hash_hex(domain: &[u8], data: &[u8]) -> String {
    hex::encode(domain_hash(domain, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let data = b"hello world";
        let hash = sha256(data);
        assert_eq!(hash.len(), 32);
        assert_eq!(
            hex::encode(hash),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_domain_separation() {
        let data = b"payload";
        assert_ne!(domain_hash(TX_DOMAIN, data), domain_hash(PROGRAM_DOMAIN, data));
        assert_eq!(domain_hash(TX_DOMAIN, data), domain_hash(TX_DOMAIN, data));
    }

    #[test]
    fn test_domain_hash_is_prefix_concatenation() {
        // "TX" || "abc" must equal "T" || "Xabc"
        assert_eq!(domain_hash(b"TX", b"abc"), domain_hash(b"T", b"Xabc"));
        assert_eq!(domain_hash_hex(b"TX", b"abc").len(), 64);
    }
}
