//! Wallet module for key file management

pub mod wallet;

pub use wallet::{load_key, Wallet, WalletError, WalletInfo};
