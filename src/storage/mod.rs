//! Storage module for transaction files

pub mod persistence;

pub use persistence::{
    write_atomic, StorageError, TxFiles, MULTISIG_ACCOUNT_FILE, SIGNED_TXN_FILE,
    UNSIGNED_TXN_FILE,
};
