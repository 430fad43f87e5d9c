//! ECDSA key management
//!
//! Provides key pair generation, signing, and verification using
//! the secp256k1 elliptic curve. Signatures are deterministic (RFC 6979),
//! so signing the same message twice with the same key yields identical bytes.

use rand::rngs::OsRng;
use secp256k1::{ecdsa, Message, PublicKey, Secp256k1, SecretKey};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use super::hash::sha256;
use crate::core::Address;

/// Length of a compressed public key
pub const PUBLIC_KEY_LEN: usize = 33;
/// Length of a compact ECDSA signature
pub const SIGNATURE_LEN: usize = 64;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A compressed secp256k1 public key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PubKey(PublicKey);

impl PubKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        PublicKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| KeyError::InvalidPublicKey)
    }

    pub fn from_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.0.serialize()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// The account address controlled by this key
    pub fn address(&self) -> Address {
        Address::from_public_key(self)
    }

    /// Verify a signature over `message`
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        verify_signature(&self.0, message, signature).unwrap_or(false)
    }
}

impl fmt::Debug for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PubKey({})", self.to_hex())
    }
}

impl fmt::Display for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A compact (r || s) ECDSA signature
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; SIGNATURE_LEN] = bytes.try_into().map_err(|_| KeyError::InvalidSignature)?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

// Hex strings in human-readable formats (JSON), raw bytes in binary ones.
fn serialize_bytes<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    if serializer.is_human_readable() {
        serializer.serialize_str(&hex::encode(bytes))
    } else {
        serializer.serialize_bytes(bytes)
    }
}

fn deserialize_bytes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    if deserializer.is_human_readable() {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(de::Error::custom)
    } else {
        Vec::<u8>::deserialize(deserializer)
    }
}

impl Serialize for PubKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_bytes(&self.to_bytes(), serializer)
    }
}

impl<'de> Deserialize<'de> for PubKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = deserialize_bytes(deserializer)?;
        PubKey::from_bytes(&bytes).map_err(de::Error::custom)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_bytes(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = deserialize_bytes(deserializer)?;
        Signature::from_bytes(&bytes).map_err(de::Error::custom)
    }
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    secret_key: SecretKey,
    public_key: PubKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key: PubKey(public_key),
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key: PubKey(public_key),
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key.trim()).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    pub fn public_key(&self) -> PubKey {
        self.public_key
    }

    pub fn address(&self) -> Address {
        self.public_key.address()
    }

    /// Sign the SHA-256 digest of a message
    pub fn sign(&self, message: &[u8]) -> Result<Signature, KeyError> {
        sign_message(&self.secret_key, message)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// Every message is hashed, whatever its length
fn message_digest(message: &[u8]) -> Result<Message, KeyError> {
    Ok(Message::from_digest_slice(&sha256(message))?)
}

/// Sign a message with a secret key
pub fn sign_message(secret_key: &SecretKey, message: &[u8]) -> Result<Signature, KeyError> {
    let secp = Secp256k1::new();
    let digest = message_digest(message)?;
    let signature = secp.sign_ecdsa(&digest, secret_key);
    Ok(Signature(signature.serialize_compact()))
}

/// Verify a signature against a public key
pub fn verify_signature(
    public_key: &PublicKey,
    message: &[u8],
    signature: &Signature,
) -> Result<bool, KeyError> {
    let secp = Secp256k1::new();
    let digest = message_digest(message)?;
    let sig =
        ecdsa::Signature::from_compact(&signature.0).map_err(|_| KeyError::InvalidSignature)?;

    match secp.verify_ecdsa(&digest, &sig, public_key) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}
