//! Component C: the two-pass assembler (§4.C). A single left-to-right
//! emission pass records label definitions and forward-reference patch
//! sites as it goes; a second pass walks the patch list and overwrites
//! each placeholder with its now-resolved label offset.

use std::collections::HashMap;

use tracing::debug;

use svm::{pack, ArgKind, Ext, OpCode, Word};

use crate::error::AssemblerError;
use crate::tokenizer::{parse_literal, Tokenizer};

type Result<T> = std::result::Result<T, AssemblerError>;

/// An argument as classified during emission, before it's packed into
/// the instruction word.
enum Arg<'t> {
    None,
    Reg(u8),
    Imm(ImmSource<'t>),
}

enum ImmSource<'t> {
    Literal(i32),
    Label(&'t str),
}

impl<'t> Arg<'t> {
    fn kind(&self) -> ArgKind {
        match self {
            Arg::None => ArgKind::None,
            Arg::Reg(r) => ArgKind::Reg(*r),
            Arg::Imm(_) => ArgKind::Imm,
        }
    }
}

/// Assembles mnemonic source text into a flat code image. Labels are
/// bare identifiers; a line that opens with one (optionally written
/// with a trailing `:`, which is not itself a separator character) is
/// a label definition rather than an instruction.
pub fn assemble(source: &str) -> Result<Vec<Word>> {
    Assembler::new(source).run()
}

struct Assembler<'s> {
    tokens: Tokenizer<'s>,
    code: Vec<Word>,
    labels: HashMap<String, u32>,
    patches: Vec<(usize, String)>,
}

impl<'s> Assembler<'s> {
    fn new(source: &'s str) -> Assembler<'s> {
        Assembler {
            tokens: Tokenizer::new(source),
            code: Vec::new(),
            labels: HashMap::new(),
            patches: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Word>> {
        while let Some(token) = self.tokens.next_token() {
            match token.parse::<OpCode>() {
                Ok(op) => self.assemble_instruction(op)?,
                Err(_) => self.define_label(token),
            }
        }
        self.resolve_patches()?;
        Ok(self.code)
    }

    fn define_label(&mut self, token: &str) {
        let name = token.strip_suffix(':').unwrap_or(token);
        debug!(label = name, offset = self.code.len(), "label defined");
        self.labels.insert(name.to_string(), self.code.len() as u32);
    }

    fn assemble_instruction(&mut self, op: OpCode) -> Result<()> {
        let ext = self.read_ext();
        let (arg1, arg2) = self.read_args(op)?;

        self.code.push(pack(op, ext, arg1.kind(), arg2.kind()));
        self.emit_immediate(arg1)?;
        self.emit_immediate(arg2)?;
        Ok(())
    }

    /// Reads the condition suffix, if present. A token that doesn't
    /// parse as one is rolled back — it's the instruction's first
    /// argument, not a suffix (§4.C step 2).
    fn read_ext(&mut self) -> Ext {
        match self.tokens.next_token() {
            Some(token) => match token.parse::<Ext>() {
                Ok(ext) => ext,
                Err(_) => {
                    self.tokens.rollback();
                    Ext::None
                }
            },
            None => Ext::None,
        }
    }

    fn read_args(&mut self, op: OpCode) -> Result<(Arg<'s>, Arg<'s>)> {
        use OpCode::*;
        match op {
            Nop | End | Ret | Clf => Ok((Arg::None, Arg::None)),
            Jmp | Inv | Sys => {
                let a = self.classify_required("argument")?;
                Ok((a, Arg::None))
            }
            Mov | Add | Sub | Mul | Div | And | Or | Xor | Shl | Shr | Cmp => {
                let a = self.classify_required("first argument")?;
                let b = self.classify_required("second argument")?;
                Ok((a, b))
            }
            Push => self.read_push_args(),
            Pop => self.read_pop_args(),
        }
    }

    fn classify_required(&mut self, what: &'static str) -> Result<Arg<'s>> {
        let token = self.tokens.next_token().ok_or(AssemblerError::ExpectedToken(what))?;
        Ok(classify_arg(token))
    }

    fn required_register(&mut self, what: &'static str, mnemonic: &str) -> Result<u8> {
        let token = self.tokens.next_token().ok_or(AssemblerError::ExpectedToken(what))?;
        ArgKind::parse_register(token)
            .and_then(ArgKind::register_index)
            .map(|idx| idx as u8)
            .ok_or_else(|| AssemblerError::ArgConstraintUnsatisfied {
                mnemonic: mnemonic.to_string(),
                detail: "argument must be a register",
            })
    }

    /// `PUSH imm` / `PUSH reg` / `PUSH rLo, rHi` (§4.D). The second
    /// register is only there to peek at; if it isn't one, it belongs
    /// to the next instruction and is rolled back.
    fn read_push_args(&mut self) -> Result<(Arg<'s>, Arg<'s>)> {
        let first = self.classify_required("argument")?;
        if let Arg::Reg(lo) = first {
            if let Some(token) = self.tokens.next_token() {
                if let Some(hi) = ArgKind::parse_register(token).and_then(ArgKind::register_index) {
                    return Ok((Arg::Reg(lo), Arg::Reg(hi as u8)));
                }
                self.tokens.rollback();
            }
            return Ok((Arg::Reg(lo), Arg::None));
        }
        Ok((first, Arg::None))
    }

    /// `POP reg` / `POP rLo, rHi` (§4.D). Unlike `PUSH`, the first
    /// argument must always be a register.
    fn read_pop_args(&mut self) -> Result<(Arg<'s>, Arg<'s>)> {
        let lo = self.required_register("argument", "pop")?;
        if let Some(token) = self.tokens.next_token() {
            if let Some(hi) = ArgKind::parse_register(token).and_then(ArgKind::register_index) {
                return Ok((Arg::Reg(lo), Arg::Reg(hi as u8)));
            }
            self.tokens.rollback();
        }
        Ok((Arg::Reg(lo), Arg::None))
    }

    fn emit_immediate(&mut self, arg: Arg<'s>) -> Result<()> {
        match arg {
            Arg::None | Arg::Reg(_) => Ok(()),
            Arg::Imm(ImmSource::Literal(value)) => {
                self.code.push(value as u32);
                Ok(())
            }
            Arg::Imm(ImmSource::Label(name)) => {
                if let Some(&offset) = self.labels.get(name) {
                    self.code.push(offset);
                } else {
                    self.patches.push((self.code.len(), name.to_string()));
                    self.code.push(0);
                }
                Ok(())
            }
        }
    }

    fn resolve_patches(&mut self) -> Result<()> {
        debug!(count = self.patches.len(), "resolving patch sites");
        for (offset, name) in &self.patches {
            let resolved = self
                .labels
                .get(name)
                .ok_or_else(|| AssemblerError::UndefinedLabel(name.clone()))?;
            self.code[*offset] = *resolved;
        }
        Ok(())
    }
}

/// Register names take priority; anything else is an immediate if it
/// parses as one, or a (possibly forward) label reference otherwise.
fn classify_arg(token: &str) -> Arg<'_> {
    if let Some(idx) = ArgKind::parse_register(token).and_then(ArgKind::register_index) {
        return Arg::Reg(idx as u8);
    }
    match parse_literal(token) {
        Some(value) => Arg::Imm(ImmSource::Literal(value)),
        None => Arg::Imm(ImmSource::Label(token)),
    }
}
