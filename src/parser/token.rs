/// One classified line of a dialogue script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'input> {
    /// `{{ConversationName(Name)}}`
    Header(&'input str),
    /// `[Speaker]`
    Speaker(&'input str),
    /// `- Label -> Target`
    Choice {
        label: &'input str,
        target: &'input str,
    },
    /// Any other non-empty, non-comment line, trimmed.
    Text(&'input str),
}

/// A piece of a text line's inline markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'input> {
    Literal(&'input str),
    /// `$Name`
    Variable(&'input str),
    /// `{{Name}}`
    Function(&'input str),
    /// `{{Image(path)}}`
    Image(&'input str),
}
