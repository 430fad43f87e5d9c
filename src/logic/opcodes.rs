//! Script opcodes
//!
//! Defines the instruction set of logic programs. A program is one version
//! byte followed by a sequence of these opcodes and their immediates.

use serde::{Deserialize, Serialize};

/// Highest program version the assembler emits
pub const MAX_PROGRAM_VERSION: u8 = 2;

/// Opcodes for logic programs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OpCode {
    // Stack operations (0x00 - 0x0F)
    /// Fail immediately
    Err = 0x00,
    /// Push a 64-bit integer
    Int = 0x01,
    /// Push a byte string (1-byte length prefix)
    Byte = 0x02,
    /// Pop the top value from the stack
    Pop = 0x03,
    /// Duplicate the top value
    Dup = 0x04,
    /// Swap the top two values
    Swap = 0x05,

    // Arithmetic (0x10 - 0x1F)
    Add = 0x10,
    Sub = 0x11,
    Mul = 0x12,
    Div = 0x13,
    Mod = 0x14,

    // Comparison (0x20 - 0x2F)
    Eq = 0x20,
    Neq = 0x21,
    Lt = 0x22,
    Gt = 0x23,
    Le = 0x24,
    Ge = 0x25,

    // Logic (0x30 - 0x3F)
    And = 0x30,
    Or = 0x31,
    Not = 0x32,

    // Conversion (0x38 - 0x3F)
    /// Big-endian bytes to integer
    Btoi = 0x38,
    /// Integer to 8 big-endian bytes
    Itob = 0x39,
    /// Length of a byte string
    Len = 0x3a,
    /// SHA-256 of a byte string
    Sha256 = 0x3b,

    // Control flow (0x40 - 0x4F)
    /// Branch if top of stack is non-zero
    Bnz = 0x40,
    /// Branch if top of stack is zero
    Bz = 0x41,
    /// Unconditional branch
    B = 0x42,
    /// Stop with the top of stack as the result
    Return = 0x43,

    // Transaction fields (0x60 - 0x6F)
    /// Push a field of the current transaction
    Txn = 0x60,

    // Arguments (0x70 - 0x7F)
    /// Push argument by index
    Arg = 0x70,
    Arg0 = 0x71,
    Arg1 = 0x72,
    Arg2 = 0x73,
    Arg3 = 0x74,
}

impl OpCode {
    /// Convert byte to opcode
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(OpCode::Err),
            0x01 => Some(OpCode::Int),
            0x02 => Some(OpCode::Byte),
            0x03 => Some(OpCode::Pop),
            0x04 => Some(OpCode::Dup),
            0x05 => Some(OpCode::Swap),
            0x10 => Some(OpCode::Add),
            0x11 => Some(OpCode::Sub),
            0x12 => Some(OpCode::Mul),
            0x13 => Some(OpCode::Div),
            0x14 => Some(OpCode::Mod),
            0x20 => Some(OpCode::Eq),
            0x21 => Some(OpCode::Neq),
            0x22 => Some(OpCode::Lt),
            0x23 => Some(OpCode::Gt),
            0x24 => Some(OpCode::Le),
            0x25 => Some(OpCode::Ge),
            0x30 => Some(OpCode::And),
            0x31 => Some(OpCode::Or),
            0x32 => Some(OpCode::Not),
            0x38 => Some(OpCode::Btoi),
            0x39 => Some(OpCode::Itob),
            0x3a => Some(OpCode::Len),
            0x3b => Some(OpCode::Sha256),
            0x40 => Some(OpCode::Bnz),
            0x41 => Some(OpCode::Bz),
            0x42 => Some(OpCode::B),
            0x43 => Some(OpCode::Return),
            0x60 => Some(OpCode::Txn),
            0x70 => Some(OpCode::Arg),
            0x71 => Some(OpCode::Arg0),
            0x72 => Some(OpCode::Arg1),
            0x73 => Some(OpCode::Arg2),
            0x74 => Some(OpCode::Arg3),
            _ => None,
        }
    }

    /// Look up an opcode by its source mnemonic
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        ALL.iter().copied().find(|op| op.name() == name)
    }

    /// Fixed number of immediate bytes after the opcode
    ///
    /// `Byte` is variable: one length byte plus that many data bytes.
    pub fn immediate_bytes(&self) -> usize {
        match self {
            OpCode::Int => 8,
            OpCode::Byte => 1,
            OpCode::Bnz | OpCode::Bz | OpCode::B => 2,
            OpCode::Txn | OpCode::Arg => 1,
            _ => 0,
        }
    }

    /// Minimum program version that supports this opcode
    pub fn min_version(&self) -> u8 {
        match self {
            OpCode::B | OpCode::Bz | OpCode::Return | OpCode::Dup | OpCode::Swap => 2,
            _ => 1,
        }
    }

    /// Get opcode mnemonic for (dis)assembly
    pub fn name(&self) -> &'static str {
        match self {
            OpCode::Err => "err",
            OpCode::Int => "int",
            OpCode::Byte => "byte",
            OpCode::Pop => "pop",
            OpCode::Dup => "dup",
            OpCode::Swap => "swap",
            OpCode::Add => "+",
            OpCode::Sub => "-",
            OpCode::Mul => "*",
            OpCode::Div => "/",
            OpCode::Mod => "%",
            OpCode::Eq => "==",
            OpCode::Neq => "!=",
            OpCode::Lt => "<",
            OpCode::Gt => ">",
            OpCode::Le => "<=",
            OpCode::Ge => ">=",
            OpCode::And => "&&",
            OpCode::Or => "||",
            OpCode::Not => "!",
            OpCode::Btoi => "btoi",
            OpCode::Itob => "itob",
            OpCode::Len => "len",
            OpCode::Sha256 => "sha256",
            OpCode::Bnz => "bnz",
            OpCode::Bz => "bz",
            OpCode::B => "b",
            OpCode::Return => "return",
            OpCode::Txn => "txn",
            OpCode::Arg => "arg",
            OpCode::Arg0 => "arg_0",
            OpCode::Arg1 => "arg_1",
            OpCode::Arg2 => "arg_2",
            OpCode::Arg3 => "arg_3",
        }
    }
}

const ALL: [OpCode; 34] = [
    OpCode::Err,
    OpCode::Int,
    OpCode::Byte,
    OpCode::Pop,
    OpCode::Dup,
    OpCode::Swap,
    OpCode::Add,
    OpCode::Sub,
    OpCode::Mul,
    OpCode::Div,
    OpCode::Mod,
    OpCode::Eq,
    OpCode::Neq,
    OpCode::Lt,
    OpCode::Gt,
    OpCode::Le,
    OpCode::Ge,
    OpCode::And,
    OpCode::Or,
    OpCode::Not,
    OpCode::Btoi,
    OpCode::Itob,
    OpCode::Len,
    OpCode::Sha256,
    OpCode::Bnz,
    OpCode::Bz,
    OpCode::B,
    OpCode::Return,
    OpCode::Txn,
    OpCode::Arg,
    OpCode::Arg0,
    OpCode::Arg1,
    OpCode::Arg2,
    OpCode::Arg3,
];

/// Transaction fields readable with `txn`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TxnField {
    Sender = 0,
    Fee = 1,
    FirstValid = 2,
    LastValid = 3,
    Note = 4,
    Receiver = 5,
    Amount = 6,
    CloseRemainderTo = 7,
    Lease = 8,
}

impl TxnField {
    pub fn from_byte(byte: u8) -> Option<Self> {
        FIELDS.get(byte as usize).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        FIELDS.iter().copied().find(|f| f.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TxnField::Sender => "Sender",
            TxnField::Fee => "Fee",
            TxnField::FirstValid => "FirstValid",
            TxnField::LastValid => "LastValid",
            TxnField::Note => "Note",
            TxnField::Receiver => "Receiver",
            TxnField::Amount => "Amount",
            TxnField::CloseRemainderTo => "CloseRemainderTo",
            TxnField::Lease => "Lease",
        }
    }
}

const FIELDS: [TxnField; 9] = [
    TxnField::Sender,
    TxnField::Fee,
    TxnField::FirstValid,
    TxnField::LastValid,
    TxnField::Note,
    TxnField::Receiver,
    TxnField::Amount,
    TxnField::CloseRemainderTo,
    TxnField::Lease,
];
