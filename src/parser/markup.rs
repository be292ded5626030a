use crate::errors::CompileError;
use crate::parser::token::Segment;
use crate::parser::{is_identifier, is_identifier_char, IMAGE_TAG};

/// Splits one text line into literals, `$variable` references and `{{...}}` markers.
pub struct MarkupLexer<'input> {
    input: &'input str,
    pos: usize,
    line: usize,
}

impl<'input> MarkupLexer<'input> {
    pub fn new(input: &'input str, line: usize) -> Self {
        Self { input, pos: 0, line }
    }

    fn rest(&self) -> &'input str {
        &self.input[self.pos..]
    }

    fn variable(&mut self) -> Segment<'input> {
        // Skip the '$'.
        let start = self.pos + 1;
        let rest = &self.input[start..];

        if rest.starts_with('$') {
            self.pos = start + 1;
            return Segment::Literal(&self.input[start..start + 1]);
        }

        let len = rest
            .char_indices()
            .find(|&(_, c)| !is_identifier_char(c))
            .map_or(rest.len(), |(i, _)| i);

        if len == 0 {
            // A lone '$' is just text.
            self.pos = start;
            return Segment::Literal(&self.input[start - 1..start]);
        }

        self.pos = start + len;
        Segment::Variable(&rest[..len])
    }

    fn marker(&mut self) -> Result<Segment<'input>, CompileError> {
        let start = self.pos + 2;
        let close = match self.input[start..].find("}}") {
            Some(i) => start + i,
            None => {
                self.pos = self.input.len();
                return Err(CompileError::UnterminatedMarker { line: self.line });
            }
        };
        let inner = self.input[start..close].trim();
        self.pos = close + 2;

        if is_identifier(inner) {
            return Ok(Segment::Function(inner));
        }

        let image_path = inner
            .strip_prefix(IMAGE_TAG)
            .map(str::trim_start)
            .and_then(|rest| rest.strip_prefix('('))
            .and_then(|rest| rest.strip_suffix(')'))
            .map(str::trim)
            .filter(|path| !path.is_empty());

        image_path.map(Segment::Image).ok_or_else(|| CompileError::MalformedMarker {
            line: self.line,
            marker: inner.to_string(),
        })
    }

    fn literal(&mut self) -> Segment<'input> {
        let rest = self.rest();
        let mut len = rest.len();
        for (i, c) in rest.char_indices().skip(1) {
            if c == '$' || rest[i..].starts_with("{{") {
                len = i;
                break;
            }
        }

        let start = self.pos;
        self.pos += len;
        Segment::Literal(&self.input[start..start + len])
    }
}

impl<'input> Iterator for MarkupLexer<'input> {
    type Item = Result<Segment<'input>, CompileError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest();
        if rest.is_empty() {
            return None;
        }

        if rest.starts_with('$') {
            Some(Ok(self.variable()))
        } else if rest.starts_with("{{") {
            Some(self.marker())
        } else {
            Some(Ok(self.literal()))
        }
    }
}
