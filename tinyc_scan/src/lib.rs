//! Scanner and token model for the tinyc source language.
//!
//! This crate is deliberately small: it only turns source text into a flat
//! token sequence. Everything that understands the *meaning* of those tokens
//! (scope, types, control flow) lives downstream in `tinyc_vm`, so that an
//! embedder who only needs tokenization (an editor plugin, a syntax
//! highlighter) can depend on this crate alone.

mod error;
mod lexer;
mod token;

pub use error::ScanError;
pub use lexer::scan;
pub use token::{Token, TokenKind};
