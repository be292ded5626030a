//! The compiled, immutable shape of a dialogue script.

use std::fs;
use std::io;
use std::path::Path;

/// The choice target reserved for embedded choices, which are not implemented yet.
pub const EMBEDDED_CHOICE_TOKEN: &str = ">>";

const DEFAULT_TEMPLATE: &str = "\
# A new dialogue. Each conversation starts with a header.
{{ConversationName(Start)}}
[Speaker]
Hello! This is a new dialogue.
Players can pick one of the choices below.
- Tell me more -> More
- Goodbye -> End

{{ConversationName(More)}}
[Speaker]
Lines are grouped by the speaker tag above them.

{{ConversationName(End)}}
[Speaker]
Goodbye!
";

/// Raw dialogue script text as written by a content author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueAsset {
    pub name: String,
    pub source: String,
}

impl DialogueAsset {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Reads a script file, naming the asset after the file's stem.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let source = fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, source))
    }

    /// The starter script for a new dialogue.
    pub fn template() -> Self {
        Self::new("New Dialogue", DEFAULT_TEMPLATE)
    }
}

/// A function marker found in a line, addressed by character offset into [`LineContent::text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub offset: usize,
    pub function: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineContent {
    /// Display text with variables substituted and markers removed.
    pub text: String,
    /// Ordered by offset. Several invocations may share an offset.
    pub invocations: Vec<Invocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    pub speaker: String,
    pub content: LineContent,
    /// Opaque handle to a portrait, passed through to the view untouched.
    pub speaker_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub choice_name: String,
    pub leading_conversation_name: String,
}

impl Choice {
    pub fn new(choice_name: impl Into<String>, leading_conversation_name: impl Into<String>) -> Self {
        Self {
            choice_name: choice_name.into(),
            leading_conversation_name: leading_conversation_name.into(),
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.leading_conversation_name == EMBEDDED_CHOICE_TOKEN
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub name: String,
    pub lines: Vec<Line>,
    /// Each choice with the line index at which it becomes active, in source order.
    /// Entries are distinct even when two choices share a label.
    pub choices: Vec<(Choice, usize)>,
}

impl Conversation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lines: Vec::new(),
            choices: Vec::new(),
        }
    }

    /// All choices that become active at `line_index`, in source order.
    pub fn choices_at(&self, line_index: usize) -> impl Iterator<Item = &Choice> {
        self.choices
            .iter()
            .filter(move |(_, index)| *index == line_index)
            .map(|(choice, _)| choice)
    }

    pub fn has_choices_at(&self, line_index: usize) -> bool {
        self.choices.iter().any(|(_, index)| *index == line_index)
    }
}

/// Finds a conversation by name. A linear scan is fine for the tens of
/// conversations a single asset holds.
pub fn find_conversation<'a>(conversations: &'a [Conversation], name: &str) -> Option<&'a Conversation> {
    conversations.iter().find(|conversation| conversation.name == name)
}
