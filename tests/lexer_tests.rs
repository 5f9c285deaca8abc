//! Lexer tests

use comet::lexer::{tokenize, TokenKind};

#[test]
fn test_lex_empty() {
    let tokens = tokenize("").unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Eof);
}

#[test]
fn test_lex_keywords() {
    let tokens = tokenize("var const fn import native null").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Var);
    assert_eq!(tokens[1].kind, TokenKind::Const);
    assert_eq!(tokens[2].kind, TokenKind::Function);
    assert_eq!(tokens[3].kind, TokenKind::Import);
    assert_eq!(tokens[4].kind, TokenKind::Native);
    assert_eq!(tokens[5].kind, TokenKind::Null);
}

#[test]
fn test_lex_boolean_keeps_lexeme() {
    let tokens = tokenize("true false").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Boolean);
    assert_eq!(tokens[0].text, "true");
    assert_eq!(tokens[1].kind, TokenKind::Boolean);
    assert_eq!(tokens[1].text, "false");
}

#[test]
fn test_lex_punctuation() {
    let tokens = tokenize("( ) { } [ ] , ; : = + * / %").unwrap();

    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        &kinds[..14],
        &[
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::RBrace,
            TokenKind::LBracket,
            TokenKind::RBracket,
            TokenKind::Comma,
            TokenKind::Semicolon,
            TokenKind::Colon,
            TokenKind::Equals,
            TokenKind::Addition,
            TokenKind::Multiplication,
            TokenKind::Division,
            TokenKind::Modulus,
        ]
    );
}

#[test]
fn test_lex_comparisons_use_equals_prefix() {
    // The Language spells them =<, => and ==
    let tokens = tokenize("== =< =>").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::CompareEquals);
    assert_eq!(tokens[1].kind, TokenKind::CompareSmaller);
    assert_eq!(tokens[2].kind, TokenKind::CompareBigger);
}

#[test]
fn test_lex_arrow() {
    let tokens = tokenize("-> int").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::ArrowRight);
    assert_eq!(tokens[0].text, "->");
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
}

#[test]
fn test_lex_variadic_markers() {
    let tokens = tokenize("int32... string..?").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].text, "int32");
    assert_eq!(tokens[1].kind, TokenKind::Variadic);
    assert_eq!(tokens[2].kind, TokenKind::Identifier);
    assert_eq!(tokens[2].text, "string");
    assert_eq!(tokens[3].kind, TokenKind::VariadicNoValidate);
}

#[test]
fn test_lex_line_feed_is_a_token() {
    let tokens = tokenize("a\nb").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[1].kind, TokenKind::Lf);
    assert_eq!(tokens[2].kind, TokenKind::Identifier);
}

#[test]
fn test_lex_line_comment_swallows_newline() {
    let tokens = tokenize("a // comment\nb").unwrap();

    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::Eof]
    );
}

#[test]
fn test_lex_block_comment() {
    let tokens = tokenize("a /* ignored * text */ b").unwrap();

    assert_eq!(tokens[0].text, "a");
    assert_eq!(tokens[1].text, "b");
    assert_eq!(tokens[2].kind, TokenKind::Eof);
}

#[test]
fn test_lex_numbers() {
    let tokens = tokenize("42 3.14 .5").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].text, "42");
    assert_eq!(tokens[1].text, "3.14");
    assert_eq!(tokens[2].text, ".5");
}

#[test]
fn test_lex_negative_literal_after_equals() {
    let tokens = tokenize("x = -5").unwrap();

    assert_eq!(tokens[2].kind, TokenKind::Number);
    assert_eq!(tokens[2].text, "-5");
}

#[test]
fn test_lex_subtraction_between_values() {
    for source in ["1 - 2", "1-2", "a - b"] {
        let tokens = tokenize(source).unwrap();
        assert!(
            tokens.iter().any(|t| t.kind == TokenKind::Subtraction),
            "no subtraction token in {source:?}"
        );
    }
}

#[test]
fn test_lex_negative_literal_in_parens() {
    let tokens = tokenize("(-3)").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::LParen);
    assert_eq!(tokens[1].kind, TokenKind::Number);
    assert_eq!(tokens[1].text, "-3");
    assert_eq!(tokens[2].kind, TokenKind::RParen);
}

#[test]
fn test_lex_identifier_may_contain_dots_and_digits() {
    let tokens = tokenize("foo.bar x2").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].text, "foo.bar");
    assert_eq!(tokens[1].text, "x2");
}

#[test]
fn test_lex_string_keeps_raw_escapes() {
    let tokens = tokenize(r#""a\"b""#).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].text, r#"a\"b"#);
    assert_eq!(tokens[1].kind, TokenKind::Eof);
}

#[test]
fn test_lex_string_double_backslash_closes() {
    // \\" terminates: the second backslash is itself escaped
    let tokens = tokenize(r#""a\\" b"#).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].text, r"a\\");
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
    assert_eq!(tokens[1].text, "b");
}

#[test]
fn test_lex_unknown_character_fails_with_location() {
    let err = tokenize("var x\n  ?").unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Unknown character"), "{message}");
    assert!(message.contains("2:3"), "{message}");
}

#[test]
fn test_lex_traces_are_in_bounds_and_one_based() {
    let source = "var x : int32 = 1 + 2\nfn main() -> int { }\n";
    let tokens = tokenize(source).unwrap();

    for token in &tokens {
        assert!(token.trace.index < source.chars().count());
        assert!(token.trace.row >= 1, "{:?}", token);
        assert!(token.trace.column >= 1, "{:?}", token);
    }
}

#[test]
fn test_lex_keyword_trace_points_at_start() {
    let tokens = tokenize("  var x").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Var);
    assert_eq!(tokens[0].trace.index, 2);
    assert_eq!(tokens[0].trace.column, 3);
    assert_eq!(tokens[1].trace.index, 6);
}
