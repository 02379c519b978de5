//! # Lexer
//!
//! Splits JavaScript source into tokens. Comments are collected on the side
//! so the tree builder can attach them to statements afterwards.

use super::node::{Comment, CommentKind};
use super::source::SourceText;
use crate::errors::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifiers and keywords
    Ident,
    Num,
    Str,
    Template,
    Regex,
    Punct,
    Eof,
}

#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    /// A line break separates this token from the previous one
    pub newline_before: bool,
}

/// Longest first, so prefix matching picks the right operator
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "<<", ">>", "{", "}", "(", ")", "[", "]", ";", ",", "<", ">", "+", "-",
    "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", ".", "@", "#",
];

/// Keywords after which a `/` starts a regular expression
const KEYWORDS_BEFORE_EXPRESSION: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

pub struct Lexed {
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
    /// Byte length of the `#!` line, if any
    pub hashbang_end: Option<usize>,
}

pub fn tokenize(source: &SourceText) -> Result<Lexed, ParseError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a SourceText,
    bytes: &'a [u8],
    text: &'a str,
    pos: usize,
    tokens: Vec<Token>,
    comments: Vec<Comment>,
    newline_before: bool,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a SourceText) -> Self {
        Self {
            source,
            bytes: source.text().as_bytes(),
            text: source.text(),
            pos: 0,
            tokens: Vec::new(),
            comments: Vec::new(),
            newline_before: false,
        }
    }

    fn run(mut self) -> Result<Lexed, ParseError> {
        let hashbang_end = if self.text.starts_with("#!") {
            let end = self.text.find('\n').unwrap_or(self.text.len());
            self.pos = end;
            Some(end)
        } else {
            None
        };

        loop {
            self.skip_trivia()?;
            if self.pos >= self.bytes.len() {
                self.push(TokenKind::Eof, self.pos, self.pos);
                break;
            }
            self.next_token()?;
        }

        Ok(Lexed {
            tokens: self.tokens,
            comments: self.comments,
            hashbang_end,
        })
    }

    fn error(&self, message: impl Into<String>, offset: usize) -> ParseError {
        ParseError::new(message, self.source.position_at(offset.min(self.text.len())))
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            start,
            end,
            newline_before: self.newline_before,
        });
        self.newline_before = false;
    }

    fn peek_byte(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        while let Some(byte) = self.peek_byte(0) {
            match byte {
                b'\n' => {
                    self.newline_before = true;
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' | 0x0b | 0x0c => self.pos += 1,
                b'/' if self.peek_byte(1) == Some(b'/') => {
                    let start = self.pos;
                    let end = self.text[start..]
                        .find('\n')
                        .map(|i| start + i)
                        .unwrap_or(self.text.len());
                    self.record_comment(CommentKind::Line, start, end);
                    self.pos = end;
                }
                b'/' if self.peek_byte(1) == Some(b'*') => {
                    let start = self.pos;
                    let Some(close) = self.text[start + 2..].find("*/") else {
                        return Err(self.error("Unterminated comment", start));
                    };
                    let end = start + 2 + close + 2;
                    if self.text[start..end].contains('\n') {
                        self.newline_before = true;
                    }
                    self.record_comment(CommentKind::Block, start, end);
                    self.pos = end;
                }
                _ => {
                    // Non-ASCII whitespace such as NBSP
                    let ch = self.text[self.pos..].chars().next().unwrap_or(' ');
                    if ch.is_whitespace() {
                        self.pos += ch.len_utf8();
                    } else {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn record_comment(&mut self, kind: CommentKind, start: usize, end: usize) {
        let span = super::position::Span::new(
            start,
            end,
            self.source.position_at(start),
            self.source.position_at(end),
        );
        self.comments.push(Comment {
            kind,
            text: self.text[start..end].to_string(),
            span: Some(span),
        });
    }

    fn next_token(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let ch = self.text[start..].chars().next().unwrap_or('\0');

        if is_identifier_start(ch) {
            let end = self.scan_while(start, is_identifier_part);
            self.push(TokenKind::Ident, start, end);
            return Ok(());
        }

        if ch.is_ascii_digit() || (ch == '.' && self.peek_byte(1).is_some_and(|b| b.is_ascii_digit())) {
            let end = self.scan_number(start);
            self.push(TokenKind::Num, start, end);
            return Ok(());
        }

        match ch {
            '"' | '\'' => {
                let end = self.scan_string(start, ch as u8)?;
                self.push(TokenKind::Str, start, end);
            }
            '`' => {
                let end = self.scan_template(start)?;
                self.push(TokenKind::Template, start, end);
            }
            '/' if self.regex_allowed() => {
                let end = self.scan_regex(start)?;
                self.push(TokenKind::Regex, start, end);
            }
            _ => {
                let rest = &self.text[start..];
                let Some(punct) = PUNCTUATORS.iter().find(|p| rest.starts_with(**p)) else {
                    return Err(self.error(format!("Unexpected character '{ch}'"), start));
                };
                // `a?.5:b` is a conditional, not optional chaining
                let len = if *punct == "?." && self.peek_byte(2).is_some_and(|b| b.is_ascii_digit()) {
                    1
                } else {
                    punct.len()
                };
                self.push(TokenKind::Punct, start, start + len);
                self.pos = start + len;
                return Ok(());
            }
        }
        Ok(())
    }

    fn scan_while(&mut self, start: usize, predicate: fn(char) -> bool) -> usize {
        let end = self.text[start..]
            .char_indices()
            .find(|(_, c)| !predicate(*c))
            .map(|(i, _)| start + i)
            .unwrap_or(self.text.len());
        self.pos = end;
        end
    }

    fn scan_number(&mut self, start: usize) -> usize {
        let mut end = start;
        let mut previous = '\0';
        for (i, c) in self.text[start..].char_indices() {
            let exponent_sign = (c == '+' || c == '-')
                && (previous == 'e' || previous == 'E')
                && !self.text[start..start + i].starts_with("0x");
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                end = start + i + c.len_utf8();
                previous = c;
            } else {
                break;
            }
        }
        self.pos = end;
        end
    }

    fn scan_string(&mut self, start: usize, quote: u8) -> Result<usize, ParseError> {
        let mut i = start + 1;
        while let Some(&byte) = self.bytes.get(i) {
            match byte {
                b'\\' => i += 2,
                b'\n' => break,
                b if b == quote => {
                    self.pos = i + 1;
                    return Ok(i + 1);
                }
                _ => i += 1,
            }
        }
        Err(self.error("Unterminated string constant", start))
    }

    /// Templates are kept opaque; interpolations are skipped with brace
    /// counting, recursing into nested strings and templates.
    fn scan_template(&mut self, start: usize) -> Result<usize, ParseError> {
        let mut i = start + 1;
        while let Some(&byte) = self.bytes.get(i) {
            match byte {
                b'\\' => i += 2,
                b'`' => {
                    self.pos = i + 1;
                    return Ok(i + 1);
                }
                b'$' if self.bytes.get(i + 1) == Some(&b'{') => {
                    i = self.skip_interpolation(i + 2)?;
                }
                _ => i += 1,
            }
        }
        Err(self.error("Unterminated template", start))
    }

    fn skip_interpolation(&mut self, mut i: usize) -> Result<usize, ParseError> {
        let mut depth = 1;
        while let Some(&byte) = self.bytes.get(i) {
            match byte {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(i + 1);
                    }
                }
                b'"' | b'\'' => {
                    i = self.scan_string(i, byte)?;
                    continue;
                }
                b'`' => {
                    i = self.scan_template(i)?;
                    continue;
                }
                _ => {}
            }
            i += 1;
        }
        Err(self.error("Unterminated template", i))
    }

    fn scan_regex(&mut self, start: usize) -> Result<usize, ParseError> {
        let mut i = start + 1;
        let mut in_class = false;
        while let Some(&byte) = self.bytes.get(i) {
            match byte {
                b'\\' => i += 2,
                b'[' => {
                    in_class = true;
                    i += 1;
                }
                b']' => {
                    in_class = false;
                    i += 1;
                }
                b'/' if !in_class => {
                    let end = self.scan_while(i + 1, is_identifier_part);
                    return Ok(end);
                }
                b'\n' => break,
                _ => i += 1,
            }
        }
        Err(self.error("Unterminated regular expression", start))
    }

    fn regex_allowed(&self) -> bool {
        let Some(previous) = self.tokens.last() else {
            return true;
        };
        let text = &self.text[previous.start..previous.end];
        match previous.kind {
            TokenKind::Punct => !matches!(text, ")" | "]" | "}"),
            TokenKind::Ident => KEYWORDS_BEFORE_EXPRESSION.contains(&text),
            _ => false,
        }
    }
}

pub fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(code: &str) -> Vec<String> {
        let source = SourceText::new(code);
        let lexed = tokenize(&source).unwrap();
        lexed
            .tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| code[t.start..t.end].to_string())
            .collect()
    }

    #[test]
    fn test_punctuators_use_longest_match() {
        assert_eq!(texts("a !== b >>>= c"), vec!["a", "!==", "b", ">>>=", "c"]);
    }

    #[test]
    fn test_regex_versus_division() {
        assert_eq!(texts("x = a / b / c"), vec!["x", "=", "a", "/", "b", "/", "c"]);
        assert_eq!(texts("x = /ab+c/gi.test(y)")[2], "/ab+c/gi");
    }

    #[test]
    fn test_template_with_nested_braces() {
        let tokens = texts("`a ${ {b: 1}.b } ${`c`}` + 1");
        assert_eq!(tokens[0], "`a ${ {b: 1}.b } ${`c`}`");
        assert_eq!(tokens[1], "+");
    }

    #[test]
    fn test_comments_are_collected() {
        let source = SourceText::new("a(); // one\n/* two */ b();");
        let lexed = tokenize(&source).unwrap();
        let comments: Vec<_> = lexed.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(comments, vec!["// one", "/* two */"]);
        assert!(lexed.tokens[4].newline_before);
    }

    #[test]
    fn test_hashbang_is_skipped() {
        let source = SourceText::new("#!/usr/bin/env node\nrun();");
        let lexed = tokenize(&source).unwrap();
        assert_eq!(lexed.hashbang_end, Some(19));
        assert_eq!(&source.text()[lexed.tokens[0].start..lexed.tokens[0].end], "run");
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        let source = SourceText::new("const a = 'oops;\n");
        let error = tokenize(&source).err().unwrap();
        assert_eq!(error.position.line, 0);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(texts("1e-5 + 0x1F + 1_000n"), vec!["1e-5", "+", "0x1F", "+", "1_000n"]);
    }
}
