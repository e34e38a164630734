//! Component B: tokenizer and integer-literal parser (§4.B).
//!
//! The original tokenizer writes NULs into a mutable source buffer to
//! terminate tokens in place; this one slices an immutable `&str`
//! instead, so the one-token rollback the assembler needs is just
//! "restore the cursor" (design note, §9).

/// A maximal run of non-whitespace, non-`.` bytes is one token.
/// Separators: space, tab, newline, `.`. Comments run from `#` to the
/// next newline and are skipped like whitespace.
pub struct Tokenizer<'s> {
    source: &'s str,
    cursor: usize,
    checkpoint: usize,
}

fn is_separator(b: u8) -> bool {
    b == b' ' || b == b'\t' || b == b'\r' || b == b'\n' || b == b'.'
}

impl<'s> Tokenizer<'s> {
    pub fn new(source: &'s str) -> Tokenizer<'s> {
        Tokenizer { source, cursor: 0, checkpoint: 0 }
    }

    /// Returns the next token, or `None` once input is exhausted.
    pub fn next_token(&mut self) -> Option<&'s str> {
        self.checkpoint = self.cursor;
        self.skip_trivia();

        let bytes = self.source.as_bytes();
        let start = self.cursor;
        while self.cursor < bytes.len() && !is_separator(bytes[self.cursor]) {
            self.cursor += 1;
        }

        if start == self.cursor {
            None
        } else {
            Some(&self.source[start..self.cursor])
        }
    }

    /// Un-reads the token most recently returned by `next_token`, so the
    /// next call returns it again. Used when a mnemonic has no condition
    /// suffix: the token read speculatively as `ext_str` is actually the
    /// first argument.
    pub fn rollback(&mut self) {
        self.cursor = self.checkpoint;
    }

    fn skip_trivia(&mut self) {
        let bytes = self.source.as_bytes();
        loop {
            while self.cursor < bytes.len() && is_separator(bytes[self.cursor]) {
                self.cursor += 1;
            }
            if self.cursor < bytes.len() && bytes[self.cursor] == b'#' {
                while self.cursor < bytes.len() && bytes[self.cursor] != b'\n' {
                    self.cursor += 1;
                }
            } else {
                break;
            }
        }
    }
}

/// Parses an integer literal: `0x` hex, `0b` binary, otherwise decimal.
/// Returns `None` rather than panicking on an invalid digit (§4.B).
pub fn parse_literal(token: &str) -> Option<i32> {
    let (digits, radix) = if let Some(rest) = token.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = token.strip_prefix("0b") {
        (rest, 2)
    } else {
        (token, 10)
    };
    if digits.is_empty() {
        return None;
    }
    u32::from_str_radix(digits, radix).ok().map(|v| v as i32)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn splits_on_dot_and_whitespace() {
        let mut t = Tokenizer::new("mov.eq r0 r1\n");
        assert_eq!(t.next_token(), Some("mov"));
        assert_eq!(t.next_token(), Some("eq"));
        assert_eq!(t.next_token(), Some("r0"));
        assert_eq!(t.next_token(), Some("r1"));
        assert_eq!(t.next_token(), None);
    }

    #[test]
    fn rollback_re_reads_token() {
        let mut t = Tokenizer::new("jmp skip");
        assert_eq!(t.next_token(), Some("jmp"));
        let before = t.next_token();
        assert_eq!(before, Some("skip"));
        t.rollback();
        assert_eq!(t.next_token(), Some("skip"));
    }

    #[test]
    fn comments_run_to_end_of_line() {
        let mut t = Tokenizer::new("mov r0 1 # set r0\nend");
        assert_eq!(t.next_token(), Some("mov"));
        assert_eq!(t.next_token(), Some("r0"));
        assert_eq!(t.next_token(), Some("1"));
        assert_eq!(t.next_token(), Some("end"));
    }

    #[test]
    fn literal_bases() {
        assert_eq!(parse_literal("42"), Some(42));
        assert_eq!(parse_literal("0x2a"), Some(42));
        assert_eq!(parse_literal("0b101010"), Some(42));
        assert_eq!(parse_literal("0xFF"), Some(255));
        assert_eq!(parse_literal("0xg"), None);
        assert_eq!(parse_literal(""), None);
    }
}
