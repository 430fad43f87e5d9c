//! Cryptographic utilities
//!
//! This module provides:
//! - SHA-256 and domain-separated SHA-512/256 hashing
//! - ECDSA key management (secp256k1)

pub mod hash;
pub mod keys;

pub use hash::{
    domain_hash, domain_hash_hex, double_sha256, sha256, MULTISIG_DOMAIN, PROGRAM_DOMAIN,
    TX_DOMAIN,
};
pub use keys::{sign_message, verify_signature, KeyError, KeyPair, PubKey, Signature};
