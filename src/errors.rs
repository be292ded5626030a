use thiserror::Error;

/// A structural problem in a dialogue script. Any of these aborts the whole compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("line {line}: malformed conversation header \"{text}\"")]
    MalformedHeader { line: usize, text: String },
    #[error("line {line}: content found before the first conversation header")]
    MissingHeader { line: usize },
    #[error("line {line}: a conversation named \"{name}\" already exists")]
    DuplicateConversation { line: usize, name: String },
    #[error("line {line}: conversation \"{name}\" has no lines")]
    EmptyConversation { line: usize, name: String },
    #[error("line {line}: malformed choice \"{text}\", expected \"- Label -> Target\"")]
    MalformedChoice { line: usize, text: String },
    #[error("line {line}: choice \"{label}\" appears before any line of its conversation")]
    ChoiceWithoutLine { line: usize, label: String },
    #[error("line {line}: no global variable named \"{name}\"")]
    UnresolvedVariable { line: usize, name: String },
    #[error("line {line}: unterminated \"{{{{\" marker")]
    UnterminatedMarker { line: usize },
    #[error("line {line}: malformed marker \"{{{{{marker}}}}}\"")]
    MalformedMarker { line: usize, marker: String },
    #[error("line {line}: invocation offset {offset} is invalid for text of length {len}")]
    InvalidOffset { line: usize, offset: usize, len: usize },
}

/// A precondition violated by a caller of the [`DialogueManager`](crate::DialogueManager).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("no dialogue asset was given")]
    NullAsset,
    #[error("conversation index {index} is out of range, expected 0..{count}")]
    OutOfRange { index: usize, count: usize },
    #[error("there is no ongoing conversation, therefore the jump cannot be executed")]
    NoActiveConversation,
    #[error("there is no conversation named \"{0}\"")]
    NotFound(String),
    #[error("no choice is waiting to be selected")]
    NoPendingChoice,
    #[error("{index} is not a valid choice, expected 0..{count}")]
    InvalidChoice { index: usize, count: usize },
    #[error(transparent)]
    Compile(#[from] CompileError),
}
