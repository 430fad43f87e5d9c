//! Core ledger types
//!
//! This module contains the fundamental building blocks:
//! - Addresses (Base58 with checksum)
//! - Canonical binary encoding
//! - Payment transactions, the builder and signed transactions

pub mod address;
pub mod codec;
pub mod transaction;

pub use address::{Address, AddressError, ADDRESS_LEN};
pub use codec::CodecError;
pub use transaction::{
    Authorization, SignedTransaction, SuggestedParams, Transaction, TransactionBuilder,
    TransactionError, MAX_TXN_LIFE, SIGNATURE_OVERHEAD,
};
