//! Transaction file persistence
//!
//! The offline multisig flow hands state between processes through three
//! files in a data directory: the unsigned transaction, the multisig account
//! and the (partially) signed transaction. All use the canonical binary
//! encoding and are written atomically.

use crate::core::codec::CodecError;
use crate::core::{SignedTransaction, Transaction};
use crate::multisig::{MultisigAccount, MultisigError};
use log::debug;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Unsigned transaction file
pub const UNSIGNED_TXN_FILE: &str = "unsigned.txn";
/// Multisig account file
pub const MULTISIG_ACCOUNT_FILE: &str = "ma.txn";
/// Signed transaction file
pub const SIGNED_TXN_FILE: &str = "signed.stxn";

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Encoding error in {path}: {source}")]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Transaction files in one data directory
#[derive(Debug, Clone)]
pub struct TxFiles {
    data_dir: PathBuf,
}

impl TxFiles {
    /// Open (and create) the data directory
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    // ===== Unsigned transaction =====

    pub fn save_unsigned(&self, txn: &Transaction) -> Result<PathBuf, StorageError> {
        let path = self.path(UNSIGNED_TXN_FILE);
        let bytes = txn.encode().map_err(|source| StorageError::Codec {
            path: path.clone(),
            source,
        })?;
        write_atomic(&path, &bytes)?;
        Ok(path)
    }

    pub fn load_unsigned(&self) -> Result<Transaction, StorageError> {
        let path = self.path(UNSIGNED_TXN_FILE);
        let bytes = read(&path)?;
        Transaction::decode(&bytes).map_err(|source| StorageError::Codec { path, source })
    }

    // ===== Multisig account =====

    pub fn save_account(&self, account: &MultisigAccount) -> Result<PathBuf, StorageError> {
        let path = self.path(MULTISIG_ACCOUNT_FILE);
        let bytes = account.encode().map_err(|source| StorageError::Codec {
            path: path.clone(),
            source,
        })?;
        write_atomic(&path, &bytes)?;
        Ok(path)
    }

    /// Load the account, re-checking its threshold and members
    pub fn load_account(&self) -> Result<MultisigAccount, StorageError> {
        let path = self.path(MULTISIG_ACCOUNT_FILE);
        let bytes = read(&path)?;
        MultisigAccount::decode(&bytes).map_err(|e| match e {
            MultisigError::Codec(source) => StorageError::Codec { path, source },
            other => StorageError::InvalidData(format!("{}: {}", MULTISIG_ACCOUNT_FILE, other)),
        })
    }

    // ===== Signed transaction =====

    pub fn save_signed(&self, stx: &SignedTransaction) -> Result<PathBuf, StorageError> {
        let path = self.path(SIGNED_TXN_FILE);
        let bytes = stx.encode().map_err(|source| StorageError::Codec {
            path: path.clone(),
            source,
        })?;
        write_atomic(&path, &bytes)?;
        Ok(path)
    }

    /// Store already-encoded signed transaction bytes after checking they decode
    pub fn save_signed_bytes(&self, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.path(SIGNED_TXN_FILE);
        SignedTransaction::decode(bytes).map_err(|source| StorageError::Codec {
            path: path.clone(),
            source,
        })?;
        write_atomic(&path, bytes)?;
        Ok(path)
    }

    pub fn load_signed(&self) -> Result<SignedTransaction, StorageError> {
        let path = self.path(SIGNED_TXN_FILE);
        let bytes = read(&path)?;
        SignedTransaction::decode(&bytes).map_err(|source| StorageError::Codec { path, source })
    }

    pub fn load_signed_bytes(&self) -> Result<Vec<u8>, StorageError> {
        read(&self.path(SIGNED_TXN_FILE))
    }

    /// Delete the signed transaction, if any; returns whether one existed
    pub fn remove_signed(&self) -> Result<bool, StorageError> {
        remove_if_exists(&self.path(SIGNED_TXN_FILE))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).exists()
    }

    /// Delete all transaction files
    pub fn clear(&self) -> Result<(), StorageError> {
        for name in [UNSIGNED_TXN_FILE, MULTISIG_ACCOUNT_FILE, SIGNED_TXN_FILE] {
            remove_if_exists(&self.path(name))?;
        }
        Ok(())
    }
}

fn remove_if_exists(path: &Path) -> Result<bool, StorageError> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn read(path: &Path) -> Result<Vec<u8>, StorageError> {
    if !path.exists() {
        return Err(StorageError::NotFound(path.to_path_buf()));
    }
    Ok(fs::read(path)?)
}

/// Write to a temporary file first, then rename over the target
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StorageError::InvalidData(format!("bad file path: {}", path.display())))?;
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let mut file = fs::File::create(&temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    // Atomic rename
    fs::rename(&temp_path, path)?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
