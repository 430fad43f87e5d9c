//! Logic program assembler
//!
//! Compiles line-oriented script source to versioned bytecode.
//!
//! ```text
//! #pragma version 2
//! // accept when the first argument equals 123
//! arg_0
//! btoi
//! int 123
//! ==
//! ```

use crate::logic::lsig::CompiledProgram;
use crate::logic::opcodes::{OpCode, TxnField, MAX_PROGRAM_VERSION};
use std::collections::HashMap;
use std::fmt::Write;
use thiserror::Error;

/// Assembler errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblerError {
    #[error("line {line}: unknown instruction: {name}")]
    UnknownInstruction { line: usize, name: String },
    #[error("line {line}: invalid argument: {reason}")]
    InvalidArgument { line: usize, reason: String },
    #[error("line {line}: invalid number: {value}")]
    InvalidNumber { line: usize, value: String },
    #[error("Undefined label: {0}")]
    UndefinedLabel(String),
    #[error("Duplicate label: {0}")]
    DuplicateLabel(String),
    #[error("Unsupported program version: {0}")]
    UnsupportedVersion(u64),
    #[error("line {line}: '{name}' requires program version {required}")]
    VersionTooLow {
        line: usize,
        name: String,
        required: u8,
    },
    #[error("Program has no instructions")]
    EmptyProgram,
    #[error("Program too large for branch offsets")]
    ProgramTooLarge,
    #[error("Unknown opcode 0x{opcode:02x} at offset {offset}")]
    UnknownOpcode { offset: usize, opcode: u8 },
    #[error("Truncated immediate at offset {0}")]
    Truncated(usize),
}

/// Assembler for logic programs
pub struct Assembler {
    /// Program version from `#pragma version`
    version: u8,
    /// Output bytecode, without the version byte
    code: Vec<u8>,
    /// Label positions
    labels: HashMap<String, usize>,
    /// Pending label references (position, label_name)
    label_refs: Vec<(usize, String)>,
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            version: 1,
            code: Vec::new(),
            labels: HashMap::new(),
            label_refs: Vec::new(),
        }
    }

    /// Assemble source text into a program
    pub fn assemble(&mut self, source: &str) -> Result<CompiledProgram, AssemblerError> {
        self.version = 1;
        self.code.clear();
        self.labels.clear();
        self.label_refs.clear();

        let mut seen_instruction = false;

        for (index, raw) in source.lines().enumerate() {
            let line_no = index + 1;
            let line = strip_comment(raw).trim();

            if line.is_empty() {
                continue;
            }

            if let Some(rest) = line.strip_prefix("#pragma") {
                if seen_instruction {
                    return Err(AssemblerError::InvalidArgument {
                        line: line_no,
                        reason: "#pragma must precede all instructions".to_string(),
                    });
                }
                self.parse_pragma(line_no, rest)?;
                continue;
            }

            // Label definition
            if let Some(label) = line.strip_suffix(':') {
                let label = label.trim().to_string();
                if self.labels.insert(label.clone(), self.code.len()).is_some() {
                    return Err(AssemblerError::DuplicateLabel(label));
                }
                continue;
            }

            seen_instruction = true;
            self.assemble_instruction(line_no, line)?;
        }

        if self.code.is_empty() {
            return Err(AssemblerError::EmptyProgram);
        }

        // Resolve label references
        for (pos, label) in &self.label_refs {
            let target = *self
                .labels
                .get(label)
                .ok_or_else(|| AssemblerError::UndefinedLabel(label.clone()))?;
            let target = u16::try_from(target).map_err(|_| AssemblerError::ProgramTooLarge)?;
            self.code[*pos..*pos + 2].copy_from_slice(&target.to_be_bytes());
        }

        let mut program = Vec::with_capacity(self.code.len() + 1);
        program.push(self.version);
        program.extend_from_slice(&self.code);
        Ok(CompiledProgram::new(program))
    }

    fn parse_pragma(&mut self, line: usize, rest: &str) -> Result<(), AssemblerError> {
        let parts: Vec<&str> = rest.split_whitespace().collect();
        match parts.as_slice() {
            ["version", v] => {
                let version = parse_number(line, v)?;
                if version == 0 || version > MAX_PROGRAM_VERSION as u64 {
                    return Err(AssemblerError::UnsupportedVersion(version));
                }
                self.version = version as u8;
                Ok(())
            }
            _ => Err(AssemblerError::InvalidArgument {
                line,
                reason: format!("unknown pragma: {}", rest.trim()),
            }),
        }
    }

    /// Assemble a single instruction
    fn assemble_instruction(&mut self, line: usize, text: &str) -> Result<(), AssemblerError> {
        let (name, operand) = match text.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, Some(rest.trim())),
            None => (text, None),
        };

        let op = OpCode::from_mnemonic(name).ok_or_else(|| AssemblerError::UnknownInstruction {
            line,
            name: name.to_string(),
        })?;

        if op.min_version() > self.version {
            return Err(AssemblerError::VersionTooLow {
                line,
                name: name.to_string(),
                required: op.min_version(),
            });
        }

        let needs_operand = op.immediate_bytes() > 0;
        let operand = match (needs_operand, operand) {
            (true, Some(o)) if !o.is_empty() => o,
            (true, _) => {
                return Err(AssemblerError::InvalidArgument {
                    line,
                    reason: format!("{} requires an argument", name),
                })
            }
            (false, Some(o)) if !o.is_empty() => {
                return Err(AssemblerError::InvalidArgument {
                    line,
                    reason: format!("{} takes no argument", name),
                })
            }
            (false, _) => "",
        };

        self.code.push(op as u8);

        match op {
            OpCode::Int => {
                let value = parse_number(line, operand)?;
                self.code.extend_from_slice(&value.to_be_bytes());
            }
            OpCode::Byte => {
                let bytes = parse_bytes(line, operand)?;
                let len = u8::try_from(bytes.len()).map_err(|_| AssemblerError::InvalidArgument {
                    line,
                    reason: "byte constant longer than 255 bytes".to_string(),
                })?;
                self.code.push(len);
                self.code.extend_from_slice(&bytes);
            }
            OpCode::Bnz | OpCode::Bz | OpCode::B => {
                self.label_refs.push((self.code.len(), operand.to_string()));
                self.code.extend_from_slice(&[0, 0]); // Placeholder
            }
            OpCode::Txn => {
                let field =
                    TxnField::from_name(operand).ok_or_else(|| AssemblerError::InvalidArgument {
                        line,
                        reason: format!("unknown txn field: {}", operand),
                    })?;
                self.code.push(field as u8);
            }
            OpCode::Arg => {
                let index = operand
                    .parse::<u8>()
                    .map_err(|_| AssemblerError::InvalidNumber {
                        line,
                        value: operand.to_string(),
                    })?;
                self.code.push(index);
            }
            _ => {}
        }

        Ok(())
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source in one call
pub fn assemble(source: &str) -> Result<CompiledProgram, AssemblerError> {
    Assembler::new().assemble(source)
}

/// Drop a trailing `//` comment, ignoring `//` inside string literals
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let bytes = line.as_bytes();
    for i in 0..bytes.len() {
        match bytes[i] {
            b'"' => in_string = !in_string,
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Parse a number (decimal or hex)
fn parse_number(line: usize, s: &str) -> Result<u64, AssemblerError> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|_| AssemblerError::InvalidNumber {
        line,
        value: s.to_string(),
    })
}

/// Parse a byte constant: `"text"` or `0x` hex
fn parse_bytes(line: usize, s: &str) -> Result<Vec<u8>, AssemblerError> {
    if let Some(inner) = s.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        return Ok(inner.as_bytes().to_vec());
    }
    if let Some(h) = s.strip_prefix("0x") {
        return hex::decode(h).map_err(|e| AssemblerError::InvalidArgument {
            line,
            reason: format!("bad hex constant: {}", e),
        });
    }
    Err(AssemblerError::InvalidArgument {
        line,
        reason: format!("byte constant must be quoted or 0x-prefixed: {}", s),
    })
}

/// Disassemble a program to readable text
pub fn disassemble(program: &[u8]) -> Result<String, AssemblerError> {
    let (&version, code) = program.split_first().ok_or(AssemblerError::EmptyProgram)?;
    let mut output = format!("#pragma version {}\n", version);
    let mut pc = 0;

    while pc < code.len() {
        let opcode_byte = code[pc];
        let opcode = OpCode::from_byte(opcode_byte).ok_or(AssemblerError::UnknownOpcode {
            offset: pc,
            opcode: opcode_byte,
        })?;
        let _ = write!(output, "{:04x}: {}", pc, opcode.name());
        let start = pc;
        pc += 1;

        let immediate = code
            .get(pc..pc + opcode.immediate_bytes())
            .ok_or(AssemblerError::Truncated(start))?;

        match opcode {
            OpCode::Int => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(immediate);
                let _ = write!(output, " {}", u64::from_be_bytes(bytes));
            }
            OpCode::Byte => {
                let len = immediate[0] as usize;
                let data = code
                    .get(pc + 1..pc + 1 + len)
                    .ok_or(AssemblerError::Truncated(start))?;
                let _ = write!(output, " 0x{}", hex::encode(data));
                pc += len;
            }
            OpCode::Bnz | OpCode::Bz | OpCode::B => {
                let target = u16::from_be_bytes([immediate[0], immediate[1]]);
                let _ = write!(output, " 0x{:04x}", target);
            }
            OpCode::Txn => match TxnField::from_byte(immediate[0]) {
                Some(field) => {
                    let _ = write!(output, " {}", field.name());
                }
                None => {
                    let _ = write!(output, " ?{}", immediate[0]);
                }
            },
            OpCode::Arg => {
                let _ = write!(output, " {}", immediate[0]);
            }
            _ => {}
        }

        pc += opcode.immediate_bytes();
        output.push('\n');
    }

    Ok(output)
}
