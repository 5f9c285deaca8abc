//! Lexer for the Comet language
//!
//! A single forward scanner over code points. The scanner is
//! context-sensitive: an in-progress identifier changes how digits, `.`
//! and `-` are interpreted, and line feeds are tokens of their own (they
//! terminate statements). Rows and columns are filled in by a second pass
//! over the precomputed line-feed table.

mod tokens;

pub use tokens::{Token, TokenKind};

use crate::common::{SourceMap, SourceTrace};
use crate::diagnostics::CompileError;

/// Tokenize Comet source, ending the stream with an `Eof` token
pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    let map = SourceMap::new(source);
    let mut scanner = Scanner::new(source);

    while !scanner.is_done() {
        let ch = scanner.current();

        // Comments consume without emitting; a pending identifier ends first
        if ch == '/' && scanner.after() == '/' {
            scanner.flush_identifier();
            scanner.index += 2;
            scanner.skip_line_comment();
            continue;
        }

        if ch == '/' && scanner.after() == '*' {
            scanner.flush_identifier();
            scanner.index += 2;
            scanner.skip_block_comment();
            continue;
        }

        if ch == '"' {
            scanner.flush_identifier();
            scanner.scan_string();
            continue;
        }

        if ch == '-' && scanner.after() == '>' {
            scanner.push_multi(TokenKind::ArrowRight, 2);
            continue;
        }

        // A number may only begin outside an identifier. A leading `-` is
        // part of the literal when a digit or `.` follows and the previous
        // token cannot end an expression; otherwise `-` is subtraction.
        if scanner.identifier.is_empty() && scanner.starts_number(ch) {
            scanner.scan_number();
            continue;
        }

        if ch == '\n' {
            scanner.push_single(TokenKind::Lf);
            continue;
        }

        if let Some(kind) = single_punctuation(ch) {
            scanner.push_single(kind);
            continue;
        }

        if ch == '=' {
            match scanner.after() {
                '=' => scanner.push_multi(TokenKind::CompareEquals, 2),
                '<' => scanner.push_multi(TokenKind::CompareSmaller, 2),
                '>' => scanner.push_multi(TokenKind::CompareBigger, 2),
                _ => scanner.push_single(TokenKind::Equals),
            }
            continue;
        }

        if ch == '.' && scanner.after() == '.' && scanner.at(scanner.index + 2) == '.' {
            scanner.push_multi(TokenKind::Variadic, 3);
            continue;
        }

        if ch == '.' && scanner.after() == '.' && scanner.at(scanner.index + 2) == '?' {
            scanner.push_multi(TokenKind::VariadicNoValidate, 3);
            continue;
        }

        if ch == ' ' || ch == '\t' || ch == '\r' {
            scanner.flush_identifier();
            scanner.consume();
            continue;
        }

        // Identifiers must start with a letter and can then contain digits or `.`
        if ch.is_alphabetic()
            || (!scanner.identifier.is_empty() && (ch.is_ascii_digit() || ch == '.'))
        {
            let ch = scanner.consume();
            scanner.identifier.push(ch);
            continue;
        }

        let (row, column) = map.locate(scanner.index);
        let trace = SourceTrace {
            index: scanner.index,
            row,
            column,
        };
        return Err(CompileError::UnknownCharacter {
            ch,
            trace,
            span: trace.span(),
        });
    }

    // End a possibly pending identifier
    scanner.flush_identifier();

    let eof_index = scanner.length.saturating_sub(1);
    scanner.tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        trace: SourceTrace::at(eof_index),
    });

    let mut tokens = scanner.tokens;
    for token in &mut tokens {
        map.resolve(&mut token.trace);
    }

    Ok(tokens)
}

fn single_punctuation(ch: char) -> Option<TokenKind> {
    match ch {
        ';' => Some(TokenKind::Semicolon),
        ':' => Some(TokenKind::Colon),
        ',' => Some(TokenKind::Comma),
        '(' => Some(TokenKind::LParen),
        ')' => Some(TokenKind::RParen),
        '{' => Some(TokenKind::LBrace),
        '}' => Some(TokenKind::RBrace),
        '[' => Some(TokenKind::LBracket),
        ']' => Some(TokenKind::RBracket),
        '+' => Some(TokenKind::Addition),
        '-' => Some(TokenKind::Subtraction),
        '*' => Some(TokenKind::Multiplication),
        '/' => Some(TokenKind::Division),
        '%' => Some(TokenKind::Modulus),
        _ => None,
    }
}

struct Scanner {
    text: Vec<char>,
    length: usize,
    index: usize,
    tokens: Vec<Token>,
    identifier: String,
}

impl Scanner {
    fn new(source: &str) -> Self {
        let text: Vec<char> = source.chars().collect();
        let length = text.len();
        Self {
            text,
            length,
            index: 0,
            tokens: Vec::new(),
            identifier: String::new(),
        }
    }

    fn at(&self, i: usize) -> char {
        self.text.get(i).copied().unwrap_or('\0')
    }

    fn current(&self) -> char {
        self.at(self.index)
    }

    fn before(&self) -> char {
        if self.index == 0 {
            '\0'
        } else {
            self.at(self.index - 1)
        }
    }

    fn after(&self) -> char {
        self.at(self.index + 1)
    }

    fn consume(&mut self) -> char {
        let ch = self.at(self.index);
        self.index += 1;
        ch
    }

    fn is_done(&self) -> bool {
        self.index >= self.length
    }

    fn starts_number(&self, ch: char) -> bool {
        if ch.is_ascii_digit() || ch == '.' {
            return true;
        }
        if ch != '-' {
            return false;
        }
        let next = self.after();
        if !next.is_ascii_digit() && next != '.' {
            return false;
        }
        !self
            .tokens
            .last()
            .map(|t| t.kind.ends_expression())
            .unwrap_or(false)
    }

    fn skip_line_comment(&mut self) {
        while !self.is_done() && self.current() != '\n' {
            self.consume();
        }
        // The terminating line feed belongs to the comment, no Lf token
        if !self.is_done() {
            self.consume();
        }
    }

    fn skip_block_comment(&mut self) {
        while !self.is_done() {
            if self.current() == '*' && self.after() == '/' {
                self.index += 2;
                return;
            }
            self.consume();
        }
    }

    /// Scan a string. Termination looks back two characters: a `"` closes
    /// the string unless the previous character is an unescaped backslash.
    fn scan_string(&mut self) {
        let start = self.index;
        self.consume();

        let mut value = String::new();
        loop {
            if self.is_done() {
                break;
            }
            let ch = self.current();

            let escaped = self.before() == '\\' && self.at(self.index.wrapping_sub(2)) != '\\';
            if ch == '"' && !escaped {
                self.consume();
                break;
            }

            value.push(ch);
            self.consume();
        }

        self.tokens.push(Token {
            kind: TokenKind::String,
            text: value,
            trace: SourceTrace::at(start),
        });
    }

    /// Scan a number: optional leading `-`, digits, at most one `.`
    fn scan_number(&mut self) {
        let start = self.index;
        let mut value = String::new();
        let mut dots = 0;
        let mut i = 0;

        loop {
            let ch = self.current();
            if i == 0 && ch == '-' {
                value.push(self.consume());
            } else if dots == 0 && ch == '.' {
                value.push(self.consume());
                dots += 1;
            } else if ch.is_ascii_digit() {
                value.push(self.consume());
            } else {
                break;
            }
            i += 1;
        }

        self.tokens.push(Token {
            kind: TokenKind::Number,
            text: value,
            trace: SourceTrace::at(start),
        });
    }

    fn push_single(&mut self, kind: TokenKind) {
        self.flush_identifier();
        let start = self.index;
        let text = self.consume().to_string();
        self.tokens.push(Token {
            kind,
            text,
            trace: SourceTrace::at(start),
        });
    }

    fn push_multi(&mut self, kind: TokenKind, width: usize) {
        self.flush_identifier();
        let start = self.index;
        let mut text = String::new();
        for _ in 0..width {
            text.push(self.consume());
        }
        self.tokens.push(Token {
            kind,
            text,
            trace: SourceTrace::at(start),
        });
    }

    fn flush_identifier(&mut self) {
        if self.identifier.is_empty() {
            return;
        }

        let text = std::mem::take(&mut self.identifier);
        let start = self.index - text.chars().count();
        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier);

        self.tokens.push(Token {
            kind,
            text,
            trace: SourceTrace::at(start),
        });
    }
}
