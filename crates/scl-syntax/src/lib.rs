//! `scl-syntax` - Lexer for Siemens SCL / IEC 61131-3 Structured Text.
//!
//! The simulator does not need a full syntax tree: it locates unit bodies,
//! scans `TYPE` declarations and parses statements directly from the token
//! stream produced here.
//!
//! # Example
//!
//! ```
//! use scl_syntax::lexer::{lex_significant, TokenKind};
//!
//! let tokens = lex_significant("#count := #count + 1;");
//! assert_eq!(tokens[0].kind, TokenKind::Hash);
//! assert_eq!(tokens[1].kind, TokenKind::Ident);
//! assert_eq!(tokens[2].kind, TokenKind::Assign);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod lexer;

pub use lexer::{lex, lex_significant, lex_with_text, Lexer, LineIndex, Token, TokenKind};
pub use text_size::{TextRange, TextSize};
