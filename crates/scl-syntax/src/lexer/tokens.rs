//! Token definitions for SCL / Structured Text program units.
//!
//! Only the tokens needed to locate a unit body, discover type declarations and
//! translate executable statements are distinguished. Elementary type names
//! (`BOOL`, `INT`, ...) lex as identifiers since they only matter as text.

use logos::Logos;

fn lex_block_comment_pascal(lex: &mut logos::Lexer<TokenKind>) -> bool {
    lex_nested_comment(lex, b"(*", b"*)")
}

fn lex_block_comment_c(lex: &mut logos::Lexer<TokenKind>) -> bool {
    lex_nested_comment(lex, b"/*", b"*/")
}

fn lex_nested_comment(lex: &mut logos::Lexer<TokenKind>, open: &[u8], close: &[u8]) -> bool {
    let mut depth = 1usize;
    let bytes = lex.remainder().as_bytes();
    let mut i = 0usize;

    while i + 1 < bytes.len() {
        if bytes[i] == open[0] && bytes[i + 1] == open[1] {
            depth += 1;
            i += 2;
            continue;
        }
        if bytes[i] == close[0] && bytes[i + 1] == close[1] {
            depth -= 1;
            i += 2;
            if depth == 0 {
                lex.bump(i);
                return true;
            }
            continue;
        }
        i += 1;
    }

    lex.bump(bytes.len());
    false
}

/// All token kinds recognised in SCL source.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u16)]
pub enum TokenKind {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    /// Whitespace (spaces, tabs, newlines)
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    /// Single-line comment: // ...
    #[regex(r"//[^\r\n]*", allow_greedy = true)]
    LineComment,

    /// Block comment: (* ... *) or /* ... */ (supports nesting).
    #[token("(*", lex_block_comment_pascal)]
    #[token("/*", lex_block_comment_c)]
    BlockComment,

    /// Attribute block: { S7_Optimized_Access := 'TRUE' }
    #[regex(r"\{[^}]*\}")]
    Pragma,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    /// `;`
    #[token(";")]
    Semicolon,

    /// `:`
    #[token(":")]
    Colon,

    /// `,`
    #[token(",")]
    Comma,

    /// `.`
    #[token(".")]
    Dot,

    /// `..`
    #[token("..")]
    DotDot,

    /// `(`
    #[token("(")]
    LParen,

    /// `)`
    #[token(")")]
    RParen,

    /// `[`
    #[token("[")]
    LBracket,

    /// `]`
    #[token("]")]
    RBracket,

    /// `#` (Siemens local-variable prefix)
    #[token("#")]
    Hash,

    // =========================================================================
    // OPERATORS
    // =========================================================================
    /// `:=`
    #[token(":=")]
    Assign,

    /// `=>`
    #[token("=>")]
    Arrow,

    /// `=`
    #[token("=")]
    Eq,

    /// `<>`
    #[token("<>")]
    Neq,

    /// `<`
    #[token("<")]
    Lt,

    /// `<=`
    #[token("<=")]
    LtEq,

    /// `>`
    #[token(">")]
    Gt,

    /// `>=`
    #[token(">=")]
    GtEq,

    /// `+`
    #[token("+")]
    Plus,

    /// `-`
    #[token("-")]
    Minus,

    /// `*`
    #[token("*")]
    Star,

    /// `/`
    #[token("/")]
    Slash,

    /// `**`
    #[token("**")]
    Power,

    /// `&`
    #[token("&")]
    Ampersand,

    // =========================================================================
    // KEYWORDS - Program units
    // =========================================================================
    /// `PROGRAM`
    #[token("PROGRAM", ignore(case))]
    KwProgram,

    /// `END_PROGRAM`
    #[token("END_PROGRAM", ignore(case))]
    KwEndProgram,

    /// `FUNCTION`
    #[token("FUNCTION", ignore(case))]
    KwFunction,

    /// `END_FUNCTION`
    #[token("END_FUNCTION", ignore(case))]
    KwEndFunction,

    /// `FUNCTION_BLOCK`
    #[token("FUNCTION_BLOCK", ignore(case))]
    KwFunctionBlock,

    /// `END_FUNCTION_BLOCK`
    #[token("END_FUNCTION_BLOCK", ignore(case))]
    KwEndFunctionBlock,

    /// `ORGANIZATION_BLOCK`
    #[token("ORGANIZATION_BLOCK", ignore(case))]
    KwOrganizationBlock,

    /// `END_ORGANIZATION_BLOCK`
    #[token("END_ORGANIZATION_BLOCK", ignore(case))]
    KwEndOrganizationBlock,

    /// `BEGIN`
    #[token("BEGIN", ignore(case))]
    KwBegin,

    // =========================================================================
    // KEYWORDS - Declarations
    // =========================================================================
    /// `VAR`
    #[token("VAR", ignore(case))]
    KwVar,

    /// `VAR_INPUT`
    #[token("VAR_INPUT", ignore(case))]
    KwVarInput,

    /// `VAR_OUTPUT`
    #[token("VAR_OUTPUT", ignore(case))]
    KwVarOutput,

    /// `VAR_IN_OUT`
    #[token("VAR_IN_OUT", ignore(case))]
    KwVarInOut,

    /// `VAR_TEMP`
    #[token("VAR_TEMP", ignore(case))]
    KwVarTemp,

    /// `VAR_STAT`
    #[token("VAR_STAT", ignore(case))]
    KwVarStat,

    /// `CONSTANT`
    #[token("CONSTANT", ignore(case))]
    KwConstant,

    /// `END_VAR`
    #[token("END_VAR", ignore(case))]
    KwEndVar,

    /// `TYPE`
    #[token("TYPE", ignore(case))]
    KwType,

    /// `END_TYPE`
    #[token("END_TYPE", ignore(case))]
    KwEndType,

    /// `STRUCT`
    #[token("STRUCT", ignore(case))]
    KwStruct,

    /// `END_STRUCT`
    #[token("END_STRUCT", ignore(case))]
    KwEndStruct,

    /// `ARRAY`
    #[token("ARRAY", ignore(case))]
    KwArray,

    /// `OF`
    #[token("OF", ignore(case))]
    KwOf,

    // =========================================================================
    // KEYWORDS - Statements
    // =========================================================================
    /// `IF`
    #[token("IF", ignore(case))]
    KwIf,

    /// `THEN`
    #[token("THEN", ignore(case))]
    KwThen,

    /// `ELSIF`
    #[token("ELSIF", ignore(case))]
    KwElsif,

    /// `ELSE`
    #[token("ELSE", ignore(case))]
    KwElse,

    /// `END_IF`
    #[token("END_IF", ignore(case))]
    KwEndIf,

    /// `CASE`
    #[token("CASE", ignore(case))]
    KwCase,

    /// `END_CASE`
    #[token("END_CASE", ignore(case))]
    KwEndCase,

    /// `FOR`
    #[token("FOR", ignore(case))]
    KwFor,

    /// `TO`
    #[token("TO", ignore(case))]
    KwTo,

    /// `BY`
    #[token("BY", ignore(case))]
    KwBy,

    /// `DO`
    #[token("DO", ignore(case))]
    KwDo,

    /// `END_FOR`
    #[token("END_FOR", ignore(case))]
    KwEndFor,

    /// `WHILE`
    #[token("WHILE", ignore(case))]
    KwWhile,

    /// `END_WHILE`
    #[token("END_WHILE", ignore(case))]
    KwEndWhile,

    /// `REPEAT`
    #[token("REPEAT", ignore(case))]
    KwRepeat,

    /// `UNTIL`
    #[token("UNTIL", ignore(case))]
    KwUntil,

    /// `END_REPEAT`
    #[token("END_REPEAT", ignore(case))]
    KwEndRepeat,

    /// `RETURN`
    #[token("RETURN", ignore(case))]
    KwReturn,

    /// `EXIT`
    #[token("EXIT", ignore(case))]
    KwExit,

    /// `CONTINUE`
    #[token("CONTINUE", ignore(case))]
    KwContinue,

    /// `REGION <title>` - the title runs to the end of the line.
    #[regex(r"REGION([ \t][^\r\n]*)?", priority = 5, ignore(case))]
    KwRegion,

    /// `END_REGION`
    #[token("END_REGION", ignore(case))]
    KwEndRegion,

    // =========================================================================
    // KEYWORDS - Operators and constants
    // =========================================================================
    /// `AND`
    #[token("AND", ignore(case))]
    KwAnd,

    /// `OR`
    #[token("OR", ignore(case))]
    KwOr,

    /// `XOR`
    #[token("XOR", ignore(case))]
    KwXor,

    /// `NOT`
    #[token("NOT", ignore(case))]
    KwNot,

    /// `MOD`
    #[token("MOD", ignore(case))]
    KwMod,

    /// `TRUE`
    #[token("TRUE", ignore(case))]
    KwTrue,

    /// `FALSE`
    #[token("FALSE", ignore(case))]
    KwFalse,

    // =========================================================================
    // LITERALS
    // =========================================================================
    /// Integer literal: 123, 16#FF, 2#1010, 8#77, 1_000
    #[regex(r"[0-9]([0-9]|_[0-9])*")]
    #[regex(r"16#[0-9A-Fa-f]([0-9A-Fa-f]|_[0-9A-Fa-f])*")]
    #[regex(r"2#[01]([01]|_[01])*")]
    #[regex(r"8#[0-7]([0-7]|_[0-7])*")]
    IntLiteral,

    /// Real literal: 3.14, 1.0E10, 2.5e-3
    #[regex(r"[0-9]([0-9]|_[0-9])*\.[0-9]([0-9]|_[0-9])*([eE][+-]?[0-9]+)?")]
    RealLiteral,

    /// Duration literal: T#500ms, TIME#1h30m, T#1s_500ms
    #[regex(
        r"(?:T|TIME)#[+-]?(?:[0-9]+(?:\.[0-9]+)?(?:ms|d|h|m|s))(?:_?(?:[0-9]+(?:\.[0-9]+)?(?:ms|d|h|m|s)))*",
        ignore(case)
    )]
    TimeLiteral,

    /// Date literal: D#2024-01-15, DATE#2024-1-5
    #[regex(r"(?:DATE|D)#[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}", ignore(case))]
    DateLiteral,

    /// Time of day literal: TOD#14:30:00, TIME_OF_DAY#8:15:00.250
    #[regex(
        r"(?:TOD|TIME_OF_DAY)#[0-9]{1,2}:[0-9]{2}(?::[0-9]{2}(?:\.[0-9]+)?)?",
        ignore(case)
    )]
    TimeOfDayLiteral,

    /// Date and time literal: DT#2024-01-15-14:30:00
    #[regex(
        r"(?:DT|DATE_AND_TIME)#[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}-[0-9]{1,2}:[0-9]{2}(?::[0-9]{2}(?:\.[0-9]+)?)?",
        ignore(case)
    )]
    DateAndTimeLiteral,

    /// Single-quoted string: 'it$'s'
    #[regex(r"'([^$'\r\n]|\$[^\r\n])*'")]
    StringLiteral,

    /// Typed or enum-qualified literal prefix: INT#, Color#
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*#")]
    TypedLiteralPrefix,

    /// Direct hardware address: %I0.0, %QW10, %MD100
    #[regex(r"%[IQM][XBWDL]?[0-9]+(\.[0-9]+)?")]
    DirectAddress,

    // =========================================================================
    // IDENTIFIERS
    // =========================================================================
    /// Identifier: starts with letter or underscore
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    /// Siemens quoted symbol: "Motor_1"
    #[regex(r#""[^"\r\n]*""#)]
    QuotedIdent,

    // =========================================================================
    // SPECIAL TOKENS
    // =========================================================================
    /// Lexer error - unrecognized character
    #[default]
    Error,
}

impl TokenKind {
    /// Returns `true` if this token is trivia (whitespace, comment, or pragma).
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::Whitespace | Self::LineComment | Self::BlockComment | Self::Pragma
        )
    }

    /// Returns `true` for the header keyword of a program unit.
    pub fn is_unit_start(self) -> bool {
        matches!(
            self,
            Self::KwProgram
                | Self::KwFunction
                | Self::KwFunctionBlock
                | Self::KwOrganizationBlock
        )
    }

    /// Returns the end keyword that closes a unit opened by `self`.
    #[must_use]
    pub fn unit_end(self) -> Option<TokenKind> {
        match self {
            Self::KwProgram => Some(Self::KwEndProgram),
            Self::KwFunction => Some(Self::KwEndFunction),
            Self::KwFunctionBlock => Some(Self::KwEndFunctionBlock),
            Self::KwOrganizationBlock => Some(Self::KwEndOrganizationBlock),
            _ => None,
        }
    }

    /// Returns `true` for literal tokens.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            Self::IntLiteral
                | Self::RealLiteral
                | Self::TimeLiteral
                | Self::DateLiteral
                | Self::TimeOfDayLiteral
                | Self::DateAndTimeLiteral
                | Self::StringLiteral
                | Self::KwTrue
                | Self::KwFalse
        )
    }

    /// Binding powers of infix operators, lowest first. `**` is right
    /// associative.
    pub fn infix_binding_power(self) -> Option<(u8, u8)> {
        Some(match self {
            Self::KwOr => (1, 2),
            Self::KwXor => (3, 4),
            Self::KwAnd | Self::Ampersand => (5, 6),
            Self::Eq | Self::Neq => (7, 8),
            Self::Lt | Self::LtEq | Self::Gt | Self::GtEq => (9, 10),
            Self::Plus | Self::Minus => (11, 12),
            Self::Star | Self::Slash | Self::KwMod => (13, 14),
            Self::Power => (16, 15),
            _ => return None,
        })
    }

    /// Binding power of prefix operators.
    pub fn prefix_binding_power(self) -> Option<u8> {
        Some(match self {
            Self::KwNot | Self::Plus | Self::Minus => 17,
            _ => return None,
        })
    }

    /// Tokens that close a statement list.
    pub fn ends_block(self) -> bool {
        matches!(
            self,
            Self::KwElse
                | Self::KwElsif
                | Self::KwEndIf
                | Self::KwEndCase
                | Self::KwEndFor
                | Self::KwEndWhile
                | Self::KwUntil
                | Self::KwEndRepeat
                | Self::KwEndProgram
                | Self::KwEndFunction
                | Self::KwEndFunctionBlock
                | Self::KwEndOrganizationBlock
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        TokenKind::lexer(source)
            .map(|kind| kind.unwrap_or(TokenKind::Error))
            .filter(|kind| !kind.is_trivia())
            .collect()
    }

    #[test]
    fn keywords_ignore_case() {
        assert_eq!(
            kinds("if x THEN end_if"),
            vec![
                TokenKind::KwIf,
                TokenKind::Ident,
                TokenKind::KwThen,
                TokenKind::KwEndIf
            ]
        );
    }

    #[test]
    fn duration_literals() {
        let kinds = kinds("T#500ms TIME#1h30m t#1s_500ms T#2.5s");
        assert!(kinds.iter().all(|k| *k == TokenKind::TimeLiteral));
        assert_eq!(kinds.len(), 4);
    }

    #[test]
    fn integer_literal_forms() {
        let kinds = kinds("42 16#FF 2#1010 8#77 1_000");
        assert!(kinds.iter().all(|k| *k == TokenKind::IntLiteral));
    }

    #[test]
    fn case_range_splits_into_dotdot() {
        assert_eq!(
            kinds("1..5"),
            vec![
                TokenKind::IntLiteral,
                TokenKind::DotDot,
                TokenKind::IntLiteral
            ]
        );
    }

    #[test]
    fn region_consumes_title() {
        assert_eq!(
            kinds("REGION Motor control (main)\nx := 1;\nEND_REGION"),
            vec![
                TokenKind::KwRegion,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::IntLiteral,
                TokenKind::Semicolon,
                TokenKind::KwEndRegion
            ]
        );
        assert_eq!(kinds("Regional"), vec![TokenKind::Ident]);
    }

    #[test]
    fn enum_and_siemens_prefixes() {
        assert_eq!(
            kinds("#state := Color#Red;"),
            vec![
                TokenKind::Hash,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::TypedLiteralPrefix,
                TokenKind::Ident,
                TokenKind::Semicolon
            ]
        );
    }

    #[test]
    fn nested_block_comment_is_trivia() {
        assert_eq!(kinds("(* outer (* inner *) still *) x"), vec![TokenKind::Ident]);
    }
}
