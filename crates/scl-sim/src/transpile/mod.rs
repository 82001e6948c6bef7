//! Source-to-snippet translation.
//!
//! [`transpile`] locates the unit body in the full source, rejects units that
//! call hardware or communication primitives, and parses the body into a
//! typed tree. The tree is what [`crate::eval`] compiles; the rendered C-like
//! text accompanies it for diagnostics.

#![allow(missing_docs)]

pub mod ast;
mod parser;
mod render;
mod scope;

use std::fmt;
use std::ops::Range;

use scl_syntax::{lex_significant, LineIndex, Token, TokenKind};
use smol_str::SmolStr;
use tracing::{debug, warn};

pub use render::snippet_type;
pub use scope::{Local, Locals};

use crate::context::{ExecutionContext, UnitKind};
use crate::error::SimError;

use ast::Stmt;
use parser::Parser;

/// Calls that need real hardware or a network peer.
pub const UNSUPPORTED_FUNCTIONS: &[&str] = &[
    "TCON",
    "TDISCON",
    "TSEND",
    "TRCV",
    "RUNTIME",
    "RD_SYS_T",
    "WR_SYS_T",
    "DPRD_DAT",
    "DPWR_DAT",
    "RDREC",
    "WRREC",
    "RALRM",
    "QRY_DINT",
    "DeviceStates",
    "ModuleStates",
    "LED",
    "GET",
    "PUT",
];

/// A translated unit body.
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    pub unit: SmolStr,
    pub kind: UnitKind,
    pub locals: Locals,
    pub body: Vec<Stmt>,
    text: String,
}

impl Snippet {
    /// Rendered C-like text: map-in, logic, map-out.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Snippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Translates the body of the context's unit found in `source`.
///
/// A unit whose header or body cannot be found translates to an empty body.
/// Anything else that does not translate is carried as an invalid node and
/// reported when the snippet is compiled.
pub fn transpile(source: &str, ctx: &ExecutionContext) -> Result<Snippet, SimError> {
    let tokens = lex_significant(source);
    let lines = LineIndex::new(source);
    let body_tokens = match locate_body(&tokens, source, ctx.unit_name(), ctx.kind()) {
        Some(range) => &tokens[range],
        None => {
            warn!(unit = ctx.unit_name(), kind = %ctx.kind(), "unit body not found");
            &[]
        }
    };

    if let Some((name, line)) = find_unsupported(body_tokens, source, &lines) {
        return Err(SimError::UnsupportedFunction { name, line });
    }

    let body = Parser::new(source, body_tokens, &lines, ctx.catalog()).parse_body();
    if body.is_empty() {
        warn!(unit = ctx.unit_name(), "unit body is empty");
    }
    let locals = Locals::from_context(ctx);
    let text = render::render(&locals, &body);
    debug!(unit = ctx.unit_name(), statements = body.len(), "unit translated");
    Ok(Snippet {
        unit: SmolStr::new(ctx.unit_name()),
        kind: ctx.kind(),
        locals,
        body,
        text,
    })
}

fn header_keyword(kind: UnitKind) -> TokenKind {
    match kind {
        UnitKind::Function => TokenKind::KwFunction,
        UnitKind::FunctionBlock => TokenKind::KwFunctionBlock,
        UnitKind::Program => TokenKind::KwProgram,
        UnitKind::OrganizationBlock => TokenKind::KwOrganizationBlock,
    }
}

/// Token range of the executable body: after `BEGIN` when present, else after
/// the last `END_VAR`, else after the header, up to the matching end keyword.
fn locate_body(tokens: &[Token], source: &str, name: &str, kind: UnitKind) -> Option<Range<usize>> {
    let header = header_keyword(kind);
    let end_kind = header.unit_end()?;
    let name = name.trim().trim_matches('"');
    let start = tokens.windows(2).position(|pair| {
        pair[0].kind == header
            && matches!(pair[1].kind, TokenKind::Ident | TokenKind::QuotedIdent)
            && pair[1].text(source).trim_matches('"').eq_ignore_ascii_case(name)
    })?;
    let after_name = start + 2;
    let end = after_name
        + tokens[after_name..]
            .iter()
            .position(|token| token.kind == end_kind)?;
    let unit = &tokens[after_name..end];

    let body_start = if let Some(begin) = unit.iter().position(|t| t.kind == TokenKind::KwBegin) {
        begin + 1
    } else if let Some(end_var) = unit.iter().rposition(|t| t.kind == TokenKind::KwEndVar) {
        end_var + 1
    } else if unit.first().is_some_and(|t| t.kind == TokenKind::Colon) {
        // `FUNCTION Name : Type` without declaration sections.
        2.min(unit.len())
    } else {
        0
    };
    Some(after_name + body_start..end)
}

fn find_unsupported(tokens: &[Token], source: &str, lines: &LineIndex) -> Option<(SmolStr, usize)> {
    tokens.iter().find_map(|token| {
        if !matches!(token.kind, TokenKind::Ident | TokenKind::QuotedIdent) {
            return None;
        }
        let text = token.text(source).trim_matches('"');
        UNSUPPORTED_FUNCTIONS
            .iter()
            .find(|name| name.eq_ignore_ascii_case(text))
            .map(|name| (SmolStr::new(name), lines.line(token.range.start())))
    })
}
