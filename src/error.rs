//! Crate-level error type
//!
//! Module errors keep their detail; this enum classifies them into the
//! handful of outcomes a caller acts on.

use crate::config::ConfigError;
use crate::core::{AddressError, CodecError, TransactionError};
use crate::crypto::KeyError;
use crate::logic::{AssemblerError, LogicError};
use crate::multisig::MultisigError;
use crate::node::{NodeError, WatchError};
use crate::storage::StorageError;
use crate::wallet::WalletError;
use thiserror::Error;

/// Result type for txkit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Node rejected request ({status}): {message}")]
    NodeRejected { status: u16, message: String },
    #[error("Transaction rejected by pool: {0}")]
    RejectedByPool(String),
    #[error("Transaction not confirmed within {timeout} rounds of round {start_round}")]
    TimedOut { start_round: u64, timeout: u64 },
    #[error("Authorization mismatch: {0}")]
    AuthorizationMismatch(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Error::Encoding(e.to_string())
    }
}

impl From<AddressError> for Error {
    fn from(e: AddressError) -> Self {
        Error::InvalidArgument(e.to_string())
    }
}

impl From<KeyError> for Error {
    fn from(e: KeyError) -> Self {
        match e {
            KeyError::InvalidSignature => Error::AuthorizationMismatch(e.to_string()),
            _ => Error::InvalidArgument(e.to_string()),
        }
    }
}

impl From<TransactionError> for Error {
    fn from(e: TransactionError) -> Self {
        match e {
            TransactionError::SenderMismatch { .. } | TransactionError::WrongAuthorization { .. } => {
                Error::AuthorizationMismatch(e.to_string())
            }
            TransactionError::Codec(e) => e.into(),
            TransactionError::Crypto(e) => e.into(),
            _ => Error::InvalidArgument(e.to_string()),
        }
    }
}

impl From<MultisigError> for Error {
    fn from(e: MultisigError) -> Self {
        match e {
            MultisigError::InvalidVersion(_)
            | MultisigError::InvalidThreshold(_)
            | MultisigError::DuplicateSigner
            | MultisigError::EmptyMerge => Error::InvalidArgument(e.to_string()),
            MultisigError::Codec(e) => e.into(),
            MultisigError::Crypto(e) => e.into(),
            _ => Error::AuthorizationMismatch(e.to_string()),
        }
    }
}

impl From<AssemblerError> for Error {
    fn from(e: AssemblerError) -> Self {
        Error::InvalidArgument(e.to_string())
    }
}

impl From<LogicError> for Error {
    fn from(e: LogicError) -> Self {
        match e {
            LogicError::EmptyProgram | LogicError::UnsupportedVersion(_) => {
                Error::InvalidArgument(e.to_string())
            }
            LogicError::Multisig(e) => e.into(),
            LogicError::Crypto(e) => e.into(),
            LogicError::Codec(e) => e.into(),
            _ => Error::AuthorizationMismatch(e.to_string()),
        }
    }
}

impl From<NodeError> for Error {
    fn from(e: NodeError) -> Self {
        match e {
            NodeError::Rejected { status, message } => Error::NodeRejected { status, message },
            NodeError::Url(_) | NodeError::InvalidRequest(_) => {
                Error::InvalidArgument(e.to_string())
            }
            NodeError::Base64(_) => Error::Encoding(e.to_string()),
            NodeError::Codec(e) => e.into(),
            NodeError::Http(_) | NodeError::InvalidResponse(_) => Error::Transport(e.to_string()),
        }
    }
}

impl From<WatchError> for Error {
    fn from(e: WatchError) -> Self {
        match e {
            WatchError::InvalidArgument(reason) => Error::InvalidArgument(reason.to_string()),
            WatchError::Rejected { pool_error, .. } => Error::RejectedByPool(pool_error),
            WatchError::TimedOut {
                start_round,
                timeout,
                ..
            } => Error::TimedOut {
                start_round,
                timeout,
            },
            WatchError::Failed { source, .. } => source.into(),
            WatchError::Cancelled { .. } => Error::Cancelled,
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::IoError(e) => Error::Io(e),
            StorageError::NotFound(_) => Error::InvalidArgument(e.to_string()),
            StorageError::Codec { .. } | StorageError::InvalidData(_) => {
                Error::Encoding(e.to_string())
            }
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::IoError(e) => Error::Io(e),
            _ => Error::InvalidArgument(e.to_string()),
        }
    }
}

impl From<WalletError> for Error {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::IoError(e) => Error::Io(e),
            WalletError::SerializationError(_) => Error::Encoding(e.to_string()),
            WalletError::CryptoError(e) => e.into(),
            WalletError::StorageError(e) => e.into(),
            WalletError::AddressMismatch { .. } => Error::InvalidArgument(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Address;

    #[test]
    fn test_multisig_classification() {
        let e: Error = MultisigError::NotMember(Address::default()).into();
        assert!(matches!(e, Error::AuthorizationMismatch(_)));

        let e: Error = MultisigError::InvalidThreshold("k > n".to_string()).into();
        assert!(matches!(e, Error::InvalidArgument(_)));

        let e: Error = MultisigError::AccountMismatch.into();
        assert!(matches!(e, Error::AuthorizationMismatch(_)));
    }

    #[test]
    fn test_watch_classification() {
        let e: Error = WatchError::Rejected {
            pool_error: "overspend".to_string(),
            polls: 2,
        }
        .into();
        assert!(matches!(e, Error::RejectedByPool(ref m) if m == "overspend"));

        let e: Error = WatchError::TimedOut {
            start_round: 10,
            timeout: 5,
            round: 15,
            polls: 5,
        }
        .into();
        assert!(matches!(
            e,
            Error::TimedOut {
                start_round: 10,
                timeout: 5
            }
        ));

        let e: Error = WatchError::Cancelled { polls: 0 }.into();
        assert!(matches!(e, Error::Cancelled));

        let e: Error = WatchError::Failed {
            source: NodeError::Rejected {
                status: 404,
                message: "not found".to_string(),
            },
            polls: 1,
        }
        .into();
        assert!(matches!(e, Error::NodeRejected { status: 404, .. }));
    }

    #[test]
    fn test_logic_classification() {
        let e: Error = LogicError::SenderMismatch {
            sender: Address::default(),
            expected: Address::new([1u8; 32]),
        }
        .into();
        assert!(matches!(e, Error::AuthorizationMismatch(_)));

        let e: Error = LogicError::EmptyProgram.into();
        assert!(matches!(e, Error::InvalidArgument(_)));
    }
}
