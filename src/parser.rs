//! Lexing for dialogue scripts. [`lexer::Lexer`] classifies whole lines and
//! [`markup::MarkupLexer`] splits a text line into its inline segments.

pub mod lexer;
pub mod markup;
pub mod token;

pub use lexer::{Lexer, SpannedToken};
pub use markup::MarkupLexer;
pub use token::{Segment, Token};

pub(crate) const HEADER_TAG: &str = "ConversationName";
pub(crate) const IMAGE_TAG: &str = "Image";

pub(crate) fn is_identifier_char(c: char) -> bool {
    matches!(c, '_' | 'a'..='z' | 'A'..='Z' | '0'..='9')
}

pub(crate) fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_identifier_char)
}
