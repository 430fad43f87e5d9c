//! Multi-signature accounts and authorizations
//!
//! A k-of-n account needs signatures from k of its n member keys. Members
//! sign independently (often in different processes, handing the partially
//! signed transaction around as a file) and the signatures accumulate in a
//! positional [`MultisigSig`].
//!
//! # Example
//!
//! ```ignore
//! use txkit::multisig::{MultisigAccount, MultisigSigner};
//!
//! // Create a 2-of-3 multisig account
//! let account = MultisigAccount::new(1, 2, vec![pk1, pk2, pk3])?;
//!
//! // Collect signatures
//! let signed = MultisigSigner::new(&account)
//!     .fold(SignedTransaction::unsigned(txn), [&key1, &key3])?;
//!
//! // Transaction is now ready to submit
//! ```

pub mod account;
pub mod signature;
pub mod signer;

pub use account::{MultisigAccount, MultisigError, MULTISIG_VERSION};
pub use signature::{MultisigSig, MultisigSubsig};
pub use signer::{append_multisig, merge_multisig, sign_multisig, verify_multisig, MultisigSigner};
