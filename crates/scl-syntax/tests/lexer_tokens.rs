use expect_test::expect;
use scl_syntax::lexer::{lex_with_text, TokenKind};

fn non_trivia(source: &str) -> Vec<(TokenKind, &str)> {
    lex_with_text(source)
        .into_iter()
        .filter(|(token, _)| !token.kind.is_trivia())
        .map(|(token, text)| (token.kind, text))
        .collect()
}

fn non_trivia_kinds(source: &str) -> Vec<TokenKind> {
    non_trivia(source).into_iter().map(|(kind, _)| kind).collect()
}

#[test]
fn siemens_function_block_header() {
    let source = r#"
FUNCTION_BLOCK "FB_Motor"
{ S7_Optimized_Access := 'TRUE' }
VERSION : 0.1
   VAR_INPUT
      start : Bool;
   END_VAR
BEGIN
   #running := #start;
END_FUNCTION_BLOCK
"#;
    let kinds = non_trivia_kinds(source);
    assert_eq!(kinds[0], TokenKind::KwFunctionBlock);
    assert_eq!(kinds[1], TokenKind::QuotedIdent);
    assert!(kinds.contains(&TokenKind::KwBegin));
    assert!(!kinds.contains(&TokenKind::Error));
    assert_eq!(kinds.last(), Some(&TokenKind::KwEndFunctionBlock));
}

#[test]
fn statement_tokens() {
    let kinds = non_trivia_kinds("IF a AND NOT b THEN x := y ** 2; ELSIF c <> d THEN EXIT; END_IF;");
    expect!["[KwIf, Ident, KwAnd, KwNot, Ident, KwThen, Ident, Assign, Ident, Power, IntLiteral, Semicolon, KwElsif, Ident, Neq, Ident, KwThen, KwExit, Semicolon, KwEndIf, Semicolon]"]
        .assert_eq(&format!("{kinds:?}"));
}

#[test]
fn date_and_time_literals() {
    let tokens = non_trivia("D#2024-01-15 TOD#14:30:00 DT#2024-01-15-14:30:00 DATE_AND_TIME#2024-1-5-8:00");
    assert_eq!(
        tokens,
        vec![
            (TokenKind::DateLiteral, "D#2024-01-15"),
            (TokenKind::TimeOfDayLiteral, "TOD#14:30:00"),
            (TokenKind::DateAndTimeLiteral, "DT#2024-01-15-14:30:00"),
            (TokenKind::DateAndTimeLiteral, "DATE_AND_TIME#2024-1-5-8:00"),
        ]
    );
}

#[test]
fn typed_literals_split_prefix() {
    let tokens = non_trivia("INT#5 Color#Green");
    assert_eq!(
        tokens,
        vec![
            (TokenKind::TypedLiteralPrefix, "INT#"),
            (TokenKind::IntLiteral, "5"),
            (TokenKind::TypedLiteralPrefix, "Color#"),
            (TokenKind::Ident, "Green"),
        ]
    );
}

#[test]
fn strings_and_escapes() {
    let tokens = non_trivia("s := 'it$'s';");
    assert_eq!(tokens[2], (TokenKind::StringLiteral, "'it$'s'"));
}

#[test]
fn fb_call_with_output_binding() {
    let kinds = non_trivia_kinds("#t1(IN := #go, PT := T#5s, Q => #done);");
    expect!["[Hash, Ident, LParen, Ident, Assign, Hash, Ident, Comma, Ident, Assign, TimeLiteral, Comma, Ident, Arrow, Hash, Ident, RParen, Semicolon]"]
        .assert_eq(&format!("{kinds:?}"));
}

#[test]
fn direct_addresses_are_tokens() {
    let tokens = non_trivia("%I0.1 %QW10 %MD100");
    assert!(tokens
        .iter()
        .all(|(kind, _)| *kind == TokenKind::DirectAddress));
}

#[test]
fn unknown_character_is_error() {
    let kinds = non_trivia_kinds("x := 1 @ 2;");
    assert!(kinds.contains(&TokenKind::Error));
}
