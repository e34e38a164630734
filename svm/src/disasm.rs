//! Component G: a linear disassembler. Walks a code image in program
//! order, decoding one instruction per line and skipping the
//! out-of-line immediate word(s) that follow an `IMM` argument (§4.G).

use std::fmt::Write as _;

use super::encoding::{decode, format_mnemonic, ArgKind};
use super::Word;

/// One decoded line of disassembly output.
#[derive(Clone, Debug)]
pub struct Line {
    /// Word offset of the instruction's header word within `code`.
    pub offset: usize,
    pub text: String,
}

/// Disassembles `code` from the first word to the last, in program
/// order. Unlike execution, this never branches: a word that isn't
/// reachable by straight-line flow (e.g. data following an `END`) is
/// still decoded in place, best-effort, and any word that fails to
/// decode is rendered as `.word <value>` rather than aborting the walk.
pub fn disassemble(code: &[Word]) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut pc = 0usize;
    while pc < code.len() {
        let offset = pc;
        let word = code[pc];
        pc += 1;

        let instr = match decode(word) {
            Ok(instr) => instr,
            Err(_) => {
                lines.push(Line { offset, text: format!(".word {}", word as i32) });
                continue;
            }
        };

        let mut text = format_mnemonic(instr.op, instr.ext);
        for arg in [instr.arg1, instr.arg2] {
            match arg {
                ArgKind::None => {}
                ArgKind::Reg(r) => {
                    let _ = write!(text, " r{}", r);
                }
                ArgKind::Imm => {
                    let value = code.get(pc).copied().unwrap_or(0);
                    pc += 1;
                    let _ = write!(text, " {}", value as i32);
                }
            }
        }
        lines.push(Line { offset, text });
    }
    lines
}

/// Renders `disassemble`'s output as `offset | text` lines, one per
/// instruction.
pub fn format(code: &[Word]) -> String {
    let mut out = String::new();
    for line in disassemble(code) {
        let _ = writeln!(out, "{:>6} | {}", line.offset, line.text);
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::encoding::{pack, Ext, OpCode};

    #[test]
    fn skips_immediate_words() {
        let code = [
            pack(OpCode::Mov, Ext::None, ArgKind::Reg(0), ArgKind::Imm),
            5,
            pack(OpCode::End, Ext::None, ArgKind::None, ArgKind::None),
        ];
        let lines = disassemble(&code);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].offset, 0);
        assert_eq!(lines[0].text, "mov r0 5");
        assert_eq!(lines[1].offset, 2);
        assert_eq!(lines[1].text, "end");
    }

    #[test]
    fn unknown_word_renders_as_data() {
        let code = [0xffffffffu32];
        let lines = disassemble(&code);
        assert_eq!(lines[0].text, ".word -1");
    }
}
