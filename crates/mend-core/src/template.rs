//! Concatenated prompt templates
//!
//! Workflow code nodes build LLM prompts by concatenating string literals:
//!
//! ```text
//! const userPrompt =
//!   '{\n' +
//!   '  "title": "max 60 chars",\n' +
//!   '  "image_url": "pick one:\n' + imageList + '\nuse the full URL",\n' +
//!   '  "region": "Sierra|Costa"\n' +
//!   '}\n';
//! ```
//!
//! [`ConcatTemplate`] scans such code into string-literal and operator tokens
//! and removes one named field's contribution as a unit: the literal that opens
//! `"image_url":` plus every operand up to the literal that closes the JSON
//! value and ends the prompt line. Interleaved expressions (`imageList`) go with
//! it. Code whose shape does not fit the model is left untouched.

use crate::error::RuleError;
use std::borrow::Cow;
use std::ops::Range;

/// Lexical token relevant to concatenation chains
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// Quoted literal with its source span and decoded value
    Str { span: Range<usize>, value: String },
    /// Binary `+`
    Plus(usize),
    /// `(`, `[` or `{`
    Open,
    /// `)`, `]` or `}`
    Close,
    /// `;` or `,`
    Terminator,
    /// Anything else (identifiers, other operators, template literals)
    Other,
}

/// Tokenized view of embedded code
#[derive(Debug, Clone)]
pub struct ConcatTemplate<'a> {
    source: &'a str,
    tokens: Vec<Token>,
}

impl<'a> ConcatTemplate<'a> {
    /// Scan `source`
    #[must_use]
    pub fn parse(source: &'a str) -> Self {
        Self {
            source,
            tokens: tokenize(source),
        }
    }

    /// Decoded values of every string literal, in source order
    #[must_use]
    pub fn literals(&self) -> Vec<&str> {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                Token::Str { value, .. } => Some(value.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether some literal opens `"field":`
    #[must_use]
    pub fn declares_field(&self, field: &str) -> bool {
        self.tokens
            .iter()
            .any(|t| matches!(t, Token::Str { value, .. } if opens_field(value, field)))
    }

    /// Source with the first well-formed line declaring `field` removed
    #[must_use]
    pub fn without_field(&self, field: &str) -> Option<String> {
        self.tokens.iter().enumerate().find_map(|(idx, token)| match token {
            Token::Str { value, .. } if opens_field(value, field) => self.removal_for(idx),
            _ => None,
        })
    }

    fn removal_for(&self, start_idx: usize) -> Option<String> {
        let end_idx = self.unit_end(start_idx)?;
        let (Token::Str { span: first, .. }, Token::Str { span: last, .. }) =
            (&self.tokens[start_idx], &self.tokens[end_idx])
        else {
            return None;
        };
        let src = self.source;

        let (range, filler) = match self.tokens.get(end_idx + 1) {
            // Followed by more operands: drop through the next operand's start
            Some(Token::Plus(plus)) => (first.start..skip_ws_forward(src, plus + 1), ""),
            _ => match start_idx.checked_sub(1).map(|i| &self.tokens[i]) {
                // Last operand: drop the preceding `+` instead
                Some(Token::Plus(plus)) => (skip_ws_backward(src, *plus)..last.end, ""),
                // Sole operand
                _ => (first.start..last.end, "''"),
            },
        };

        let mut out = String::with_capacity(src.len());
        out.push_str(&src[..range.start]);
        out.push_str(filler);
        out.push_str(&src[range.end..]);
        Some(out)
    }

    /// Index of the literal that completes the unit opened at `start_idx`
    fn unit_end(&self, start_idx: usize) -> Option<usize> {
        let Token::Str { value, .. } = &self.tokens[start_idx] else {
            return None;
        };
        let mut text = value.clone();
        if closes_line(&text) {
            return Some(start_idx);
        }
        let mut depth = 0usize;
        for (idx, token) in self.tokens.iter().enumerate().skip(start_idx + 1) {
            match token {
                Token::Open => depth += 1,
                Token::Close if depth == 0 => return None,
                Token::Close => depth -= 1,
                Token::Terminator if depth == 0 => return None,
                Token::Str { value, .. } if depth == 0 => {
                    text.push_str(value);
                    if closes_line(&text) {
                        return Some(idx);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

/// Edit that removes a field's line from prompt templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRemoval {
    name: String,
    field: String,
}

impl FieldRemoval {
    /// Remove every line declaring `field`
    ///
    /// # Errors
    /// `RuleError::InvalidField` for empty names or names containing quotes.
    pub fn new(field: impl Into<String>) -> Result<Self, RuleError> {
        let field = field.into();
        if field.is_empty() || field.contains(['"', '\'', '\n']) {
            return Err(RuleError::InvalidField(field));
        }
        Ok(Self {
            name: format!("remove field {field}"),
            field,
        })
    }

    /// Edit name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field being removed
    #[inline]
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Remove every occurrence, borrowing when there is none
    #[must_use]
    pub fn apply<'a>(&self, code: &'a str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(code);
        loop {
            let next = ConcatTemplate::parse(&current).without_field(&self.field);
            match next {
                Some(next) => current = Cow::Owned(next),
                None => return current,
            }
        }
    }
}

/// `value` starts (after indentation) with `"field"` followed by `:`
fn opens_field(value: &str, field: &str) -> bool {
    value
        .trim_start()
        .strip_prefix('"')
        .and_then(|rest| rest.strip_prefix(field))
        .and_then(|rest| rest.strip_prefix('"'))
        .is_some_and(|rest| rest.trim_start().starts_with(':'))
}

/// Accumulated literal text ends a prompt line with every JSON string closed
fn closes_line(text: &str) -> bool {
    if !text.ends_with('\n') {
        return false;
    }
    let mut quotes = 0usize;
    let mut escaped = false;
    for c in text.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => quotes += 1,
            _ => {}
        }
    }
    quotes % 2 == 0
}

fn skip_ws_forward(src: &str, mut pos: usize) -> usize {
    let bytes = src.as_bytes();
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

fn skip_ws_backward(src: &str, mut pos: usize) -> usize {
    let bytes = src.as_bytes();
    while pos > 0 && bytes[pos - 1].is_ascii_whitespace() {
        pos -= 1;
    }
    pos
}

fn tokenize(src: &str) -> Vec<Token> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b if b.is_ascii_whitespace() => i += 1,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
            }
            b'\'' | b'"' => match scan_string(bytes, i) {
                Some(end) => {
                    tokens.push(Token::Str {
                        span: i..end,
                        value: unescape(&src[i + 1..end - 1]),
                    });
                    i = end;
                }
                None => {
                    tokens.push(Token::Other);
                    i += 1;
                }
            },
            b'`' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'`' {
                    i += if bytes[i] == b'\\' { 2 } else { 1 };
                }
                i = (i + 1).min(bytes.len());
                tokens.push(Token::Other);
            }
            b'+' if matches!(bytes.get(i + 1), Some(b'+' | b'=')) => {
                tokens.push(Token::Other);
                i += 2;
            }
            b'+' => {
                tokens.push(Token::Plus(i));
                i += 1;
            }
            b'(' | b'[' | b'{' => {
                tokens.push(Token::Open);
                i += 1;
            }
            b')' | b']' | b'}' => {
                tokens.push(Token::Close);
                i += 1;
            }
            b';' | b',' => {
                tokens.push(Token::Terminator);
                i += 1;
            }
            _ => {
                tokens.push(Token::Other);
                i += 1;
            }
        }
    }
    tokens
}

/// End (exclusive, past the closing quote) of the literal opened at `start`
fn scan_string(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return None,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
