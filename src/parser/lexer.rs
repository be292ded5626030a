use std::str::CharIndices;

use crate::errors::CompileError;
use crate::parser::token::Token;
use crate::parser::{is_identifier_char, HEADER_TAG};

/// A token with the 1-based line number it was found on.
pub type SpannedToken<'input> = (usize, Token<'input>);

pub struct Lexer<'input> {
    input: &'input str,
    chars: CharIndices<'input>,
    lookahead: Option<(usize, char)>,
    line: usize,
}

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str) -> Self {
        let mut chars = input.char_indices();
        Self {
            input,
            lookahead: chars.next(),
            chars,
            line: 0,
        }
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let current = self.lookahead;
        if current.is_some() {
            self.lookahead = self.chars.next();
        }
        current
    }

    /// Consumes one physical line, including its newline, and returns it without the newline.
    fn rest_of_line(&mut self, start: usize) -> &'input str {
        while let Some((loc, c)) = self.bump() {
            if c == '\n' {
                return &self.input[start..loc];
            }
        }
        &self.input[start..]
    }
}

impl<'input> Iterator for Lexer<'input> {
    type Item = Result<SpannedToken<'input>, CompileError>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((start, _)) = self.lookahead {
            self.line += 1;
            let text = self.rest_of_line(start).trim();

            // Blank lines and comments produce nothing.
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            let line = self.line;
            return Some(classify(line, text).map(|token| (line, token)));
        }

        None
    }
}

fn classify(line: usize, text: &str) -> Result<Token<'_>, CompileError> {
    if let Some(inner) = text.strip_prefix("{{") {
        let inner = inner.trim_start();
        // `{{ConversationNameShown}}` is a function marker, not a header.
        if let Some(after_tag) = inner.strip_prefix(HEADER_TAG) {
            if !after_tag.starts_with(is_identifier_char) {
                return header(line, text, inner);
            }
        }
        // Any other marker at the start of a line is part of the text.
        return Ok(Token::Text(text));
    }

    if text.len() >= 2 && text.starts_with('[') && text.ends_with(']') {
        return Ok(Token::Speaker(text[1..text.len() - 1].trim()));
    }

    if text == "-" || text.starts_with("- ") || text.starts_with("-\t") {
        return choice(line, text);
    }

    Ok(Token::Text(text))
}

fn header<'input>(line: usize, text: &'input str, inner: &'input str) -> Result<Token<'input>, CompileError> {
    let malformed = || CompileError::MalformedHeader {
        line,
        text: text.to_string(),
    };

    let rest = inner[HEADER_TAG.len()..].trim_start();
    let rest = rest.strip_prefix('(').ok_or_else(malformed)?;
    let rest = rest.strip_suffix("}}").ok_or_else(malformed)?.trim_end();
    let name = rest.strip_suffix(')').ok_or_else(malformed)?.trim();

    if name.is_empty() || name.contains(|c: char| c == '(' || c == ')') {
        return Err(malformed());
    }

    Ok(Token::Header(name))
}

fn choice(line: usize, text: &str) -> Result<Token<'_>, CompileError> {
    let malformed = || CompileError::MalformedChoice {
        line,
        text: text.to_string(),
    };

    let body = text[1..].trim();
    let arrow = body.rfind("->").ok_or_else(malformed)?;
    let label = body[..arrow].trim();
    let target = body[arrow + 2..].trim();

    if label.is_empty() || target.is_empty() {
        return Err(malformed());
    }

    Ok(Token::Choice { label, target })
}
