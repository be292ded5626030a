//! The seams between the conversation engine and whatever presents it.

use log::Level;

use crate::conversation::{Choice, Conversation};

/// A line ready for display, with function output already spliced in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedLine {
    pub speaker: String,
    pub text: String,
    pub speaker_image: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DisplayStatus {
    /// The line is fully shown and the manager may advance.
    Complete,
    /// The view is still revealing the line and will call
    /// [`DialogueManager::finish_line`](crate::DialogueManager::finish_line) when done.
    Revealing,
}

/// Renders lines and choices. Selection flows back through
/// [`DialogueManager::select_choice`](crate::DialogueManager::select_choice).
pub trait DialogueView {
    fn display_line(&mut self, line: &DisplayedLine) -> DisplayStatus;

    /// `choices` are in source order; their positions are the indices to select with.
    fn display_choices(&mut self, choices: &[Choice]);

    fn clear(&mut self);
}

/// A view that shows nothing, used until a real one is attached.
#[derive(Debug, Default)]
pub struct NullView;

impl DialogueView for NullView {
    fn display_line(&mut self, _line: &DisplayedLine) -> DisplayStatus {
        DisplayStatus::Complete
    }

    fn display_choices(&mut self, _choices: &[Choice]) {}

    fn clear(&mut self) {}
}

/// An extension that runs alongside the view for every displayed line, such
/// as a portrait display.
pub trait ManagerPlugin {
    fn display(&mut self, conversation: &Conversation, line_index: usize);
    fn clear(&mut self, conversation: Option<&Conversation>, line_index: usize);
}

/// A non-fatal problem found while playing content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

/// Receives conversation lifecycle notifications. All methods default to doing nothing.
pub trait DialogueObserver {
    fn conversation_started(&mut self, _conversation: &Conversation) {}
    fn conversation_ended(&mut self) {}
    fn diagnostic(&mut self, _diagnostic: &Diagnostic) {}
}
