//! Component A: packs and unpacks the 32-bit instruction word, and
//! declares the opcode/condition/argument-kind enums and their name
//! tables (§4.A).

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};
use util::MnemonicName;
use util_derive::{EnumFromStr, MnemonicName};

use super::constants::*;
use super::Word;

#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive, EnumFromStr, MnemonicName)]
pub enum OpCode {
    Nop,
    End,
    Mov,
    Push,
    Pop,
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Cmp,
    Clf,
    Jmp,
    Inv,
    Ret,
    Sys,
}

/// Condition (extension) codes. `None` gates nothing — the instruction
/// always executes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive, EnumFromStr, MnemonicName)]
pub enum Ext {
    None,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Nz,
    Z,
}

impl Ext {
    /// Index into a task's flag bit-set, or `None` for the unconditional case.
    pub fn flag_index(self) -> Option<usize> {
        if self == Ext::None {
            None
        } else {
            Some(self.to_usize().unwrap() - 1)
        }
    }
}

/// The kind of an argument byte (`arg1`/`arg2`) as it appears in the
/// instruction word: a register, an out-of-line immediate, or absent.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArgKind {
    None,
    Reg(u8),
    Imm,
}

const ARG_IMM: u8 = 16;
const ARG_NONE: u8 = 17;

impl ArgKind {
    pub fn to_byte(self) -> u8 {
        match self {
            ArgKind::None => ARG_NONE,
            ArgKind::Imm => ARG_IMM,
            ArgKind::Reg(r) => {
                debug_assert!((r as usize) < REGISTER_COUNT);
                r
            }
        }
    }

    pub fn from_byte(b: u8) -> Option<ArgKind> {
        match b {
            ARG_NONE => Some(ArgKind::None),
            ARG_IMM => Some(ArgKind::Imm),
            r if (r as usize) < REGISTER_COUNT => Some(ArgKind::Reg(r)),
            _ => None,
        }
    }

    /// Register names are written `r0`..`r15` in source text.
    pub fn parse_register(token: &str) -> Option<ArgKind> {
        let rest = token.strip_prefix('r')?;
        let idx: u8 = rest.parse().ok()?;
        if (idx as usize) < REGISTER_COUNT {
            Some(ArgKind::Reg(idx))
        } else {
            None
        }
    }

    pub fn register_index(self) -> Option<usize> {
        match self {
            ArgKind::Reg(r) => Some(r as usize),
            _ => None,
        }
    }

    pub fn is_register(self) -> bool {
        matches!(self, ArgKind::Reg(_))
    }
}

impl std::fmt::Display for ArgKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ArgKind::None => write!(f, ""),
            ArgKind::Imm => write!(f, "imm"),
            ArgKind::Reg(r) => write!(f, "r{}", r),
        }
    }
}

/// A decoded instruction header: the word at `pc` before any trailing
/// immediate word(s) are consumed.
#[derive(Clone, Copy, Debug)]
pub struct Instruction {
    pub op: OpCode,
    pub ext: Ext,
    pub arg1: ArgKind,
    pub arg2: ArgKind,
}

/// Packs the four one-byte fields into a single instruction word, with
/// no padding, in `{op, ext, arg1, arg2}` order.
pub fn pack(op: OpCode, ext: Ext, arg1: ArgKind, arg2: ArgKind) -> Word {
    ((op.to_u32().unwrap()) << OP_OFFSET)
        | ((ext.to_u32().unwrap()) << EXT_OFFSET)
        | ((arg1.to_byte() as u32) << ARG1_OFFSET)
        | ((arg2.to_byte() as u32) << ARG2_OFFSET)
}

/// Error returned when a word's opcode, extension, or argument-kind
/// byte doesn't name anything known. Corresponds to `UNKNOWN_INSTRUCTION`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct UnknownInstruction;

/// Unpacks a word's four byte fields, without validating that `op`
/// is a known opcode (the caller decides what to do with that).
pub fn unpack(word: Word) -> (u8, u8, u8, u8) {
    (
        ((word >> OP_OFFSET) & FIELD_MASK) as u8,
        ((word >> EXT_OFFSET) & FIELD_MASK) as u8,
        ((word >> ARG1_OFFSET) & FIELD_MASK) as u8,
        ((word >> ARG2_OFFSET) & FIELD_MASK) as u8,
    )
}

/// Decodes a word fully into an [`Instruction`], failing if any field
/// doesn't name a known opcode/extension/argument-kind.
pub fn decode(word: Word) -> Result<Instruction, UnknownInstruction> {
    let (op, ext, arg1, arg2) = unpack(word);
    let op = OpCode::from_u8(op).ok_or(UnknownInstruction)?;
    let ext = Ext::from_u8(ext).ok_or(UnknownInstruction)?;
    let arg1 = ArgKind::from_byte(arg1).ok_or(UnknownInstruction)?;
    let arg2 = ArgKind::from_byte(arg2).ok_or(UnknownInstruction)?;
    Ok(Instruction { op, ext, arg1, arg2 })
}

/// Renders `op[.ext]`, as used by both the disassembler and error messages.
pub fn format_mnemonic(op: OpCode, ext: Ext) -> String {
    if ext == Ext::None {
        op.mnemonic().to_string()
    } else {
        format!("{}.{}", op.mnemonic(), ext.mnemonic())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pack_unpack_roundtrip() {
        let word = pack(OpCode::Add, Ext::Eq, ArgKind::Reg(3), ArgKind::Imm);
        let decoded = decode(word).unwrap();
        assert_eq!(decoded.op, OpCode::Add);
        assert_eq!(decoded.ext, Ext::Eq);
        assert_eq!(decoded.arg1, ArgKind::Reg(3));
        assert_eq!(decoded.arg2, ArgKind::Imm);
    }

    #[test]
    fn unknown_opcode_byte_fails() {
        let word = 0xffu32 << OP_OFFSET;
        assert!(decode(word).is_err());
    }

    #[test]
    fn mnemonic_names_are_lower_case() {
        assert_eq!(OpCode::Mov.mnemonic(), "mov");
        assert_eq!(Ext::Eq.mnemonic(), "eq");
    }

    #[test]
    fn parse_register_tokens() {
        assert_eq!(ArgKind::parse_register("r0"), Some(ArgKind::Reg(0)));
        assert_eq!(ArgKind::parse_register("r15"), Some(ArgKind::Reg(15)));
        assert_eq!(ArgKind::parse_register("r16"), None);
        assert_eq!(ArgKind::parse_register("rax"), None);
    }

    #[test]
    fn ext_flag_index() {
        assert_eq!(Ext::None.flag_index(), None);
        assert_eq!(Ext::Eq.flag_index(), Some(0));
        assert_eq!(Ext::Z.flag_index(), Some(7));
    }
}
