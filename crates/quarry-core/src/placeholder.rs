// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Placeholder scanning.
//!
//! Splits SQL text into literal runs and placeholder tokens:
//!
//! | Token | Meaning |
//! |-------|---------|
//! | `?3` | Third formal parameter (1-based) |
//! | `:name` | Parameter or field called `name` (`[A-Za-z0-9_]+`) |
//!
//! Single-quoted string literals are copied verbatim, `::` casts are not
//! tokens, and a bare `?` stays literal text. Rendering replaces every token
//! with a `?` bind marker and collects the bound values in appearance order.

use crate::value::Value;

/// One placeholder reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// `?n`, 1-based.
    Positional(usize),

    /// `:name`.
    Named(String)
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positional(n) => write!(f, "?{n}"),
            Self::Named(name) => write!(f, ":{name}")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Token(Token)
}

/// SQL text split into literal runs and placeholder tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSql {
    source:   String,
    segments: Vec<Segment>
}

impl ParsedSql {
    /// Scan `sql`.
    pub fn parse(sql: &str) -> Self {
        let chars: Vec<char> = sql.chars().collect();
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut in_literal = false;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if in_literal {
                text.push(c);
                if c == '\'' {
                    in_literal = false;
                }
                i += 1;
                continue;
            }

            match c {
                '\'' => {
                    in_literal = true;
                    text.push(c);
                    i += 1;
                }
                '?' => {
                    let end = scan_while(&chars, i + 1, |ch| ch.is_ascii_digit());
                    if end == i + 1 {
                        text.push(c);
                        i += 1;
                        continue;
                    }
                    let digits: String = chars[i + 1..end].iter().collect();
                    match digits.parse::<usize>() {
                        Ok(n) => {
                            flush(&mut text, &mut segments);
                            segments.push(Segment::Token(Token::Positional(n)));
                        }
                        Err(_) => text.extend(&chars[i..end])
                    }
                    i = end;
                }
                ':' => {
                    let after_colon = i > 0 && chars[i - 1] == ':';
                    let end = scan_while(&chars, i + 1, is_name_char);
                    if after_colon || end == i + 1 {
                        text.push(c);
                        i += 1;
                        continue;
                    }
                    flush(&mut text, &mut segments);
                    let name: String = chars[i + 1..end].iter().collect();
                    segments.push(Segment::Token(Token::Named(name)));
                    i = end;
                }
                _ => {
                    text.push(c);
                    i += 1;
                }
            }
        }

        flush(&mut text, &mut segments);

        Self {
            source: sql.to_string(),
            segments
        }
    }

    /// Original text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder tokens in appearance order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Token(t) => Some(t),
            Segment::Text(_) => None
        })
    }

    /// Check if the text contains no placeholder.
    pub fn is_static(&self) -> bool {
        self.tokens().next().is_none()
    }

    /// Replace every token with `?`, resolving values in appearance order.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `resolve`.
    pub fn render<E>(
        &self,
        mut resolve: impl FnMut(&Token) -> Result<Value, E>
    ) -> Result<(String, Vec<Value>), E> {
        let mut sql = String::with_capacity(self.source.len());
        let mut values = Vec::new();

        for segment in &self.segments {
            match segment {
                Segment::Text(t) => sql.push_str(t),
                Segment::Token(token) => {
                    values.push(resolve(token)?);
                    sql.push('?');
                }
            }
        }

        Ok((sql, values))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn scan_while(chars: &[char], start: usize, pred: impl Fn(char) -> bool) -> usize {
    let mut end = start;
    while end < chars.len() && pred(chars[end]) {
        end += 1;
    }
    end
}

fn flush(text: &mut String, segments: &mut Vec<Segment>) {
    if !text.is_empty() {
        segments.push(Segment::Text(std::mem::take(text)));
    }
}
