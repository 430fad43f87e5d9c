//! Key files
//!
//! A key file is either a JSON wallet written by `txkit keys new` or a
//! plain file holding the hex private key.

use crate::core::Address;
use crate::crypto::{KeyError, KeyPair, PubKey};
use crate::storage::{write_atomic, StorageError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
    #[error("Key file address {stored} does not match key address {derived}")]
    AddressMismatch { stored: Address, derived: Address },
}

/// Serializable wallet data for persistence
#[derive(Debug, Serialize, Deserialize)]
struct WalletData {
    private_key_hex: String,
    address: Address,
    label: Option<String>,
}

/// A signing key with an optional label
pub struct Wallet {
    /// The key pair for signing transactions
    key_pair: KeyPair,
    /// Optional label for the wallet
    pub label: Option<String>,
}

impl Wallet {
    /// Create a new wallet with a fresh key pair
    pub fn new() -> Self {
        Self {
            key_pair: KeyPair::generate(),
            label: None,
        }
    }

    /// Create a wallet with a label
    pub fn with_label(label: &str) -> Self {
        Self {
            key_pair: KeyPair::generate(),
            label: Some(label.to_string()),
        }
    }

    /// Import a wallet from a private key
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, WalletError> {
        let key_pair = KeyPair::from_private_key_hex(private_key_hex)?;
        Ok(Self {
            key_pair,
            label: None,
        })
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub fn address(&self) -> Address {
        self.key_pair.address()
    }

    pub fn public_key(&self) -> PubKey {
        self.key_pair.public_key()
    }

    /// Get the wallet's private key (hex)
    /// WARNING: Keep this secret!
    pub fn private_key(&self) -> String {
        self.key_pair.private_key_hex()
    }

    /// Save wallet to file as JSON
    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        let data = WalletData {
            private_key_hex: self.private_key(),
            address: self.address(),
            label: self.label.clone(),
        };

        let json = serde_json::to_string_pretty(&data)?;
        write_atomic(path, json.as_bytes())?;
        Ok(())
    }

    /// Load a wallet from a JSON wallet file or a plain hex key file
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let contents = fs::read_to_string(path)?;
        let trimmed = contents.trim();

        if !trimmed.starts_with('{') {
            return Self::from_private_key(trimmed);
        }

        let data: WalletData = serde_json::from_str(trimmed)?;
        let mut wallet = Self::from_private_key(&data.private_key_hex)?;
        if wallet.address() != data.address {
            return Err(WalletError::AddressMismatch {
                stored: data.address,
                derived: wallet.address(),
            });
        }
        wallet.label = data.label;
        Ok(wallet)
    }

    /// Export wallet info (without private key)
    pub fn export_public_info(&self) -> WalletInfo {
        WalletInfo {
            address: self.address(),
            public_key: self.public_key(),
            label: self.label.clone(),
        }
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

/// Public wallet information (safe to share)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletInfo {
    pub address: Address,
    pub public_key: PubKey,
    pub label: Option<String>,
}

/// Load just the signing key from a key file
pub fn load_key(path: &Path) -> Result<KeyPair, WalletError> {
    Ok(Wallet::load(path)?.key_pair)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_import() {
        let wallet1 = Wallet::new();
        let private_key = wallet1.private_key();

        let wallet2 = Wallet::from_private_key(&private_key).unwrap();
        assert_eq!(wallet1.address(), wallet2.address());
    }

    #[test]
    fn test_wallet_save_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("test_wallet.json");

        let wallet1 = Wallet::with_label("Test Wallet");
        wallet1.save(&path).unwrap();

        let wallet2 = Wallet::load(&path).unwrap();
        assert_eq!(wallet1.address(), wallet2.address());
        assert_eq!(wallet1.label, wallet2.label);

        // Only the key file is left in the directory
        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("test_wallet.json")]);
    }

    #[test]
    fn test_plain_hex_key_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("key.hex");

        let wallet = Wallet::new();
        fs::write(&path, format!("{}\n", wallet.private_key())).unwrap();

        let key = load_key(&path).unwrap();
        assert_eq!(key.address(), wallet.address());
    }

    #[test]
    fn test_tampered_address_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("wallet.json");

        let wallet = Wallet::new();
        let data = WalletData {
            private_key_hex: wallet.private_key(),
            address: Wallet::new().address(),
            label: None,
        };
        fs::write(&path, serde_json::to_string(&data).unwrap()).unwrap();

        assert!(matches!(
            Wallet::load(&path),
            Err(WalletError::AddressMismatch { .. })
        ));
    }

    #[test]
    fn test_public_info_has_no_secret() {
        let wallet = Wallet::with_label("alice");
        let json = serde_json::to_string(&wallet.export_public_info()).unwrap();
        assert!(!json.contains(&wallet.private_key()));
        assert!(json.contains(&wallet.address().to_string()));
    }
}
