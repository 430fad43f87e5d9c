//! txkit: multisig and logic-signature transaction workflows in Rust
//!
//! This crate provides the client side of a round-based ledger:
//! - secp256k1 keys and checksummed Base58 addresses
//! - Payment transactions with a canonical binary encoding
//! - Offline single-key signing through transaction files
//! - k-of-n multisig accounts with offline, file-based signature collection
//! - A small stack-based logic language: assembler, disassembler and
//!   logic signatures for escrow and delegated accounts
//! - A node HTTP client, submitter and cancellable confirmation watcher
//! - End-to-end flows tying the pieces together
//!
//! # Example
//!
//! ```rust
//! use txkit::core::{Address, SignedTransaction, SuggestedParams, TransactionBuilder};
//! use txkit::crypto::KeyPair;
//! use txkit::multisig::{verify_multisig, MultisigAccount, MultisigSigner};
//!
//! let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
//! let account =
//!     MultisigAccount::new(1, 2, keys.iter().map(|k| k.public_key()).collect()).unwrap();
//!
//! let params = SuggestedParams {
//!     fee: 0,
//!     min_fee: 1000,
//!     flat_fee: false,
//!     first_valid: 100,
//!     last_valid: 1100,
//!     genesis_id: "testnet-v1".to_string(),
//!     genesis_hash: [0u8; 32],
//! };
//! let txn = TransactionBuilder::payment(params)
//!     .sender(account.address())
//!     .receiver(Address::new([1u8; 32]))
//!     .amount(10_000)
//!     .build()
//!     .unwrap();
//!
//! let signed = MultisigSigner::new(&account)
//!     .fold(SignedTransaction::unsigned(txn), [&keys[0], &keys[2]])
//!     .unwrap();
//! assert!(verify_multisig(&signed).is_ok());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod error;
pub mod flows;
pub mod logic;
pub mod multisig;
pub mod node;
pub mod storage;
pub mod wallet;

// Re-export commonly used types
pub use config::Config;
pub use crate::core::{
    Address, Authorization, SignedTransaction, SuggestedParams, Transaction, TransactionBuilder,
};
pub use crypto::{KeyPair, PubKey, Signature};
pub use error::{Error, Result};
pub use flows::{escrow_pay, CompileMode, Confirmation, EscrowPayment, MultisigFlow, SingleFlow};
pub use logic::{assemble, disassemble, CompiledProgram, LogicSig};
pub use multisig::{MultisigAccount, MultisigSig, MultisigSigner};
pub use node::{ConfirmationWatcher, HttpNode, NodeClient};
pub use storage::TxFiles;
pub use wallet::Wallet;
