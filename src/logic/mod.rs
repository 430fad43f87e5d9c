//! Logic programs and logic signatures
//!
//! # Overview
//!
//! This module implements:
//! - An assembler from script source to versioned bytecode
//! - A disassembler for inspecting compiled programs
//! - Logic signatures for escrow and delegated authorization
//!
//! # Example
//!
//! ```rust
//! use txkit::logic::{arg_u64, assemble, LogicSig};
//!
//! let compiled = assemble("
//!     #pragma version 2
//!     arg_0
//!     btoi
//!     int 123
//!     ==
//! ").unwrap();
//!
//! let lsig = LogicSig::new(compiled.program, vec![arg_u64(123)]).unwrap();
//! assert_eq!(lsig.escrow_address(), compiled.hash);
//! ```

pub mod assembler;
pub mod lsig;
pub mod opcodes;

pub use assembler::{assemble, disassemble, Assembler, AssemblerError};
pub use lsig::{
    arg_str, arg_u64, escrow_address, sign_logic_transaction, CompiledProgram, Delegation,
    LogicError, LogicSig,
};
pub use opcodes::{OpCode, TxnField, MAX_PROGRAM_VERSION};
