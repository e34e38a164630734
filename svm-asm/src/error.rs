//! §7 assembler error namespace. `OK`/`NULL`/`BAD_ALLOC` aren't
//! variants here — a failed allocation is something Rust already
//! reports through ordinary `Result` (or a panic, for the truly
//! unrecoverable case), not a value this enum needs to carry.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssemblerError {
    /// A token was expected (a mnemonic, an argument, ...) but input ran out.
    ExpectedToken(&'static str),
    /// An argument violated the opcode's arity/kind constraint.
    ArgConstraintUnsatisfied { mnemonic: String, detail: &'static str },
    /// A label was referenced but never defined anywhere in the source.
    UndefinedLabel(String),
}

impl fmt::Display for AssemblerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssemblerError::ExpectedToken(what) => write!(f, "expected {}", what),
            AssemblerError::ArgConstraintUnsatisfied { mnemonic, detail } => {
                write!(f, "'{}': {}", mnemonic, detail)
            }
            AssemblerError::UndefinedLabel(name) => write!(f, "undefined label '{}'", name),
        }
    }
}

impl std::error::Error for AssemblerError {}
