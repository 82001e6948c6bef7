//! Lexer for SCL program units.
//!
//! Produces a lossless token stream with byte ranges. Consumers that only care
//! about significant tokens use [`lex_significant`].

mod tokens;

pub use tokens::TokenKind;

use logos::Logos;
use text_size::{TextRange, TextSize};

/// A token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The byte range of the token in the source text.
    pub range: TextRange,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(kind: TokenKind, range: TextRange) -> Self {
        Self { kind, range }
    }

    /// Returns the source text covered by this token.
    #[must_use]
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        &source[usize::from(self.range.start())..usize::from(self.range.end())]
    }

    /// Returns the length of the token in bytes.
    #[must_use]
    pub fn len(&self) -> TextSize {
        self.range.len()
    }

    /// Returns true if the token has zero length.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Lexer for SCL source code.
///
/// Unrecognized characters are returned as `TokenKind::Error`; lexing never
/// stops early.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    source: &'src str,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source text.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            source,
        }
    }

    /// Returns the source text being lexed.
    #[must_use]
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Returns the text of the current token.
    #[must_use]
    pub fn slice(&self) -> &'src str {
        self.inner.slice()
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let kind = self.inner.next()?.unwrap_or(TokenKind::Error);
        let span = self.inner.span();
        let range = TextRange::new(offset(span.start), offset(span.end));
        Some(Token::new(kind, range))
    }
}

fn offset(value: usize) -> TextSize {
    TextSize::try_from(value).unwrap_or(TextSize::from(u32::MAX))
}

/// Lex the entire source and return all tokens.
#[must_use]
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).collect()
}

/// Lex source and return tokens paired with their text.
#[must_use]
pub fn lex_with_text(source: &str) -> Vec<(Token, &str)> {
    Lexer::new(source)
        .map(|token| (token, token.text(source)))
        .collect()
}

/// Lex source and drop trivia.
#[must_use]
pub fn lex_significant(source: &str) -> Vec<Token> {
    Lexer::new(source)
        .filter(|token| !token.kind.is_trivia())
        .collect()
}

/// Maps byte offsets to 1-based line numbers.
#[derive(Debug, Clone)]
pub struct LineIndex {
    newlines: Vec<TextSize>,
}

impl LineIndex {
    /// Builds the index for `source`.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let newlines = source
            .char_indices()
            .filter(|(_, ch)| *ch == '\n')
            .map(|(idx, _)| offset(idx))
            .collect();
        Self { newlines }
    }

    /// Returns the 1-based line containing `at`.
    #[must_use]
    pub fn line(&self, at: TextSize) -> usize {
        self.newlines.partition_point(|nl| *nl < at) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexer_basic() {
        let tokens = lex_significant("x := 42;");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[1].kind, TokenKind::Assign);
        assert_eq!(tokens[2].kind, TokenKind::IntLiteral);
        assert_eq!(tokens[3].kind, TokenKind::Semicolon);
    }

    #[test]
    fn test_lexer_preserves_positions() {
        let tokens = lex("abc := 123");
        assert_eq!(tokens[0].range, TextRange::new(0.into(), 3.into()));
        assert_eq!(tokens[1].range, TextRange::new(3.into(), 4.into()));
        assert_eq!(tokens[2].range, TextRange::new(4.into(), 6.into()));
    }

    #[test]
    fn test_lex_with_text() {
        let tokens = lex_with_text("x := 42");
        let non_trivia: Vec<_> = tokens.iter().filter(|(t, _)| !t.kind.is_trivia()).collect();
        assert_eq!(non_trivia[0].1, "x");
        assert_eq!(non_trivia[1].1, ":=");
        assert_eq!(non_trivia[2].1, "42");
    }

    #[test]
    fn test_line_index() {
        let source = "a\nbb\n\nc";
        let index = LineIndex::new(source);
        assert_eq!(index.line(0.into()), 1);
        assert_eq!(index.line(2.into()), 2);
        assert_eq!(index.line(5.into()), 3);
        assert_eq!(index.line(6.into()), 4);
    }
}
