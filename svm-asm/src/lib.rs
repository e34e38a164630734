//! Two-pass assembler that turns SVM mnemonic source text into the
//! flat [`svm::Word`] code image the execution engine consumes.

mod assembler;
mod error;
mod tokenizer;

pub use assembler::assemble;
pub use error::AssemblerError;
pub use tokenizer::{parse_literal, Tokenizer};
