use std::mem;

use super::Word;

pub const BYTE_WIDTH: u32 = 8;
pub const WORD_BYTES: u32 = mem::size_of::<Word>() as u32;
pub const WORD_WIDTH: u32 = WORD_BYTES * BYTE_WIDTH;

/// Number of general-purpose registers per task.
pub const REGISTER_COUNT: usize = 16;

/// Default call-stack depth when a code image's metadata requests "0".
pub const DEFAULT_CALL_STACK_SIZE: usize = 8;

/// Default data-stack depth when a code image's metadata requests "0".
pub const DEFAULT_DATA_STACK_SIZE: usize = 32;

/// Bit field offsets within a packed instruction word `{op, ext, arg1, arg2}`,
/// each field exactly one byte wide with no padding.
pub const OP_OFFSET: u32 = 24;
pub const EXT_OFFSET: u32 = 16;
pub const ARG1_OFFSET: u32 = 8;
pub const ARG2_OFFSET: u32 = 0;

pub const FIELD_MASK: u32 = 0xff;

/// Number of flags tracked per task, one per non-`NONE` condition extension.
pub const FLAG_COUNT: usize = 8;
