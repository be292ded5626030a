//! A compiler and runtime for branching dialogue scripts.
//!
//! A script declares any number of conversations:
//!
//! ```text
//! {{ConversationName(Intro)}}
//! [Guard]
//! Halt, $Player! {{Image(Portraits/Guard)}}
//! State your business.{{PlayHorn}}
//! - I'm a merchant -> Merchant
//! - Just passing -> >>
//! ```
//!
//! [`compile`] turns a [`DialogueAsset`] into [`Conversation`]s, and a
//! [`DialogueManager`] walks them line by line, presenting each line and its
//! choices to a [`DialogueView`].

use std::sync::Arc;

use log::*;

pub use crate::{
    compiler::{compile, compile_string, ConversationCache},
    conversation::{find_conversation, Choice, Conversation, DialogueAsset, Invocation, Line, LineContent, EMBEDDED_CHOICE_TOKEN},
    errors::{CompileError, EngineError},
    functions::{DialogueFunction, FunctionKind, FunctionRegistry},
    interaction::Interaction,
    variables::{GlobalVariables, VariableError},
    view::{Diagnostic, DialogueObserver, DialogueView, DisplayStatus, DisplayedLine, ManagerPlugin, NullView},
};

mod compiler;
mod conversation;
mod errors;
pub mod functions;
mod interaction;
pub mod parser;
mod variables;
mod view;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExecutionState {
    /// No conversation is active.
    Idle,
    /// A line is shown and the manager may advance.
    Playing,
    /// The current line has choices; advancing waits for a selection.
    ChoicePending,
    /// The view is still revealing the current line.
    LineBusy,
}

/// What selecting a choice led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceOutcome {
    /// The named conversation started at its first line.
    Entered(String),
    /// The choice used the reserved embedded-choice target. Choices stay pending.
    Reserved,
    /// No conversation matched the choice's target. Choices stay pending.
    Unresolved,
}

/// Drives one conversation at a time through a compiled set of conversations.
pub struct DialogueManager {
    functions: Arc<FunctionRegistry>,
    variables: GlobalVariables,
    cache: ConversationCache,

    parsed_conversations: Arc<[Conversation]>,
    current: Option<usize>,
    line_index: usize,
    line_playing: bool,
    pending_choices: Vec<Choice>,
    displayed_line: Option<DisplayedLine>,

    view: Box<dyn DialogueView>,
    plugins: Vec<Box<dyn ManagerPlugin>>,
    observers: Vec<Box<dyn DialogueObserver>>,
}

impl DialogueManager {
    pub fn new(functions: Arc<FunctionRegistry>) -> Self {
        Self {
            functions,
            variables: GlobalVariables::new(),
            cache: ConversationCache::new(),
            parsed_conversations: Arc::from(Vec::new()),
            current: None,
            line_index: 0,
            line_playing: false,
            pending_choices: Vec::new(),
            displayed_line: None,
            view: Box::new(NullView),
            plugins: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn with_variables(mut self, variables: GlobalVariables) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_view(mut self, view: Box<dyn DialogueView>) -> Self {
        self.view = view;
        self
    }

    pub fn set_view(&mut self, view: Box<dyn DialogueView>) {
        self.view = view;
    }

    pub fn add_plugin(&mut self, plugin: Box<dyn ManagerPlugin>) {
        self.plugins.push(plugin);
    }

    /// Observers stay registered across conversations.
    pub fn add_observer(&mut self, observer: Box<dyn DialogueObserver>) {
        self.observers.push(observer);
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn variables(&self) -> &GlobalVariables {
        &self.variables
    }

    /// Changes take effect the next time an asset is started.
    pub fn variables_mut(&mut self) -> &mut GlobalVariables {
        &mut self.variables
    }

    pub fn state(&self) -> ExecutionState {
        if self.current.is_none() {
            ExecutionState::Idle
        } else if !self.pending_choices.is_empty() {
            ExecutionState::ChoicePending
        } else if self.line_playing {
            ExecutionState::LineBusy
        } else {
            ExecutionState::Playing
        }
    }

    pub fn parsed_conversations(&self) -> &[Conversation] {
        &self.parsed_conversations
    }

    pub fn current_conversation(&self) -> Option<&Conversation> {
        self.current.map(|index| &self.parsed_conversations[index])
    }

    pub fn line_index(&self) -> usize {
        self.line_index
    }

    pub fn current_line(&self) -> Option<&Line> {
        self.current_conversation()
            .and_then(|conversation| conversation.lines.get(self.line_index))
    }

    /// The current line as it was handed to the view.
    pub fn displayed_line(&self) -> Option<&DisplayedLine> {
        self.displayed_line.as_ref()
    }

    pub fn pending_choices(&self) -> &[Choice] {
        &self.pending_choices
    }

    /// Compiles `asset` and starts the conversation at `start_index`.
    ///
    /// On error the manager is left as it was.
    pub fn start_conversation(&mut self, asset: Option<&DialogueAsset>, start_index: usize) -> Result<(), EngineError> {
        let asset = asset.ok_or(EngineError::NullAsset)?;
        let conversations = self.cache.get_or_compile(asset, &self.variables)?;

        if start_index >= conversations.len() {
            return Err(EngineError::OutOfRange {
                index: start_index,
                count: conversations.len(),
            });
        }

        self.enter(Some(conversations), start_index);
        Ok(())
    }

    /// Stops the active conversation, if any, and clears the view.
    pub fn stop_conversation(&mut self) {
        let was_active = self.current.is_some();

        self.clear_dialogue_box();
        self.line_index = 0;
        self.current = None;

        if was_active {
            debug!("Conversation ended");
            for observer in self.observers.iter_mut() {
                observer.conversation_ended();
            }
        }
    }

    /// Restarts at the first line of the named conversation in the current set.
    pub fn jump_to(&mut self, conversation_name: &str) -> Result<(), EngineError> {
        if self.parsed_conversations.is_empty() {
            return Err(EngineError::NoActiveConversation);
        }

        let index = self
            .position_of(conversation_name)
            .ok_or_else(|| EngineError::NotFound(conversation_name.to_string()))?;
        self.enter(None, index);
        Ok(())
    }

    /// Moves to the next line, or ends the conversation after the last one.
    ///
    /// Does nothing, returning `false`, while a line is still being revealed,
    /// while choices are pending, or when no conversation is active.
    pub fn try_advance(&mut self) -> bool {
        if self.line_playing || !self.pending_choices.is_empty() {
            return false;
        }

        let line_count = match self.current_conversation() {
            Some(conversation) => conversation.lines.len(),
            None => return false,
        };

        self.clear_dialogue_box();

        if self.line_index + 1 < line_count {
            self.line_index += 1;
            self.display_current_line();
        } else {
            self.stop_conversation();
        }

        true
    }

    /// Called by a view that returned [`DisplayStatus::Revealing`] once the line is fully shown.
    pub fn finish_line(&mut self) {
        self.line_playing = false;
    }

    /// Selects one of the [`pending_choices`](Self::pending_choices) by position.
    pub fn select_choice(&mut self, index: usize) -> Result<ChoiceOutcome, EngineError> {
        if self.pending_choices.is_empty() {
            return Err(EngineError::NoPendingChoice);
        }

        let choice = self
            .pending_choices
            .get(index)
            .cloned()
            .ok_or(EngineError::InvalidChoice {
                index,
                count: self.pending_choices.len(),
            })?;

        if choice.is_embedded() {
            self.report(
                Level::Warn,
                format!(
                    "The embedded choice is not yet implemented, '{}' keyword is reserved for future use",
                    EMBEDDED_CHOICE_TOKEN
                ),
            );
            return Ok(ChoiceOutcome::Reserved);
        }

        match self.position_of(&choice.leading_conversation_name) {
            Some(target) => {
                debug!("Selected choice \"{}\"", choice.choice_name);
                self.enter(None, target);
                Ok(ChoiceOutcome::Entered(choice.leading_conversation_name))
            }
            None => {
                let current = self
                    .current_conversation()
                    .map(|conversation| conversation.name.clone())
                    .unwrap_or_default();
                self.report(
                    Level::Error,
                    format!(
                        "No conversation called \"{}\" found for choice \"{}\" in \"{}\".",
                        choice.leading_conversation_name, choice.choice_name, current
                    ),
                );
                Ok(ChoiceOutcome::Unresolved)
            }
        }
    }

    fn position_of(&self, conversation_name: &str) -> Option<usize> {
        self.parsed_conversations
            .iter()
            .position(|conversation| conversation.name == conversation_name)
    }

    /// Stops the active conversation, then starts conversation `index` of
    /// `conversations`, or of the current set when `None`. The old set stays in
    /// place until the stop has run against it.
    fn enter(&mut self, conversations: Option<Arc<[Conversation]>>, index: usize) {
        self.stop_conversation();
        if let Some(conversations) = conversations {
            self.parsed_conversations = conversations;
        }
        self.current = Some(index);
        self.line_index = 0;

        let conversations = Arc::clone(&self.parsed_conversations);
        let conversation = &conversations[index];
        debug!("Starting conversation \"{}\"", conversation.name);
        for observer in self.observers.iter_mut() {
            observer.conversation_started(conversation);
        }

        self.display_current_line();
    }

    fn display_current_line(&mut self) {
        let index = match self.current {
            Some(index) => index,
            None => return,
        };
        self.line_playing = true;

        let conversations = Arc::clone(&self.parsed_conversations);
        let conversation = &conversations[index];
        let line_index = self.line_index;
        let line = &conversation.lines[line_index];

        let (text, missing) = self.invoke_functions(&line.content);
        for function in missing {
            self.report(
                Level::Warn,
                format!(
                    "No dialogue function called \"{}\" for line {} of \"{}\", skipping it",
                    function, line_index, conversation.name
                ),
            );
        }

        let displayed = DisplayedLine {
            speaker: line.speaker.clone(),
            text,
            speaker_image: line.speaker_image.clone(),
        };
        trace!("Displaying {:?}", displayed);
        let status = self.view.display_line(&displayed);
        for plugin in self.plugins.iter_mut() {
            plugin.display(conversation, line_index);
        }
        self.displayed_line = Some(displayed);

        if conversation.has_choices_at(line_index) {
            self.pending_choices = conversation.choices_at(line_index).cloned().collect();
            debug!("Waiting on {} choices", self.pending_choices.len());
            self.view.display_choices(&self.pending_choices);
        }

        self.line_playing = status == DisplayStatus::Revealing;
    }

    /// Runs a line's functions in offset order and splices text-producing
    /// results into the line. Each result is inserted after everything spliced
    /// before it, so two results at the same offset read in marker order.
    ///
    /// Returns the spliced text and the names that did not resolve.
    fn invoke_functions(&self, content: &LineContent) -> (String, Vec<String>) {
        let mut invocations: Vec<&Invocation> = content.invocations.iter().collect();
        invocations.sort_by_key(|invocation| invocation.offset);

        let mut text = String::with_capacity(content.text.len());
        let mut chars = content.text.chars();
        let mut consumed = 0;
        let mut missing = Vec::new();

        for invocation in invocations {
            while consumed < invocation.offset {
                match chars.next() {
                    Some(c) => text.push(c),
                    None => break,
                }
                consumed += 1;
            }

            match self.functions.resolve(&invocation.function) {
                Some(function) => {
                    if let Some(result) = function.call(self) {
                        text.push_str(&result);
                    }
                }
                None => missing.push(invocation.function.clone()),
            }
        }

        text.extend(chars);
        (text, missing)
    }

    fn clear_dialogue_box(&mut self) {
        self.line_playing = false;
        self.view.clear();

        let conversations = Arc::clone(&self.parsed_conversations);
        let conversation = self.current.map(|index| &conversations[index]);
        for plugin in self.plugins.iter_mut() {
            plugin.clear(conversation, self.line_index);
        }

        self.pending_choices.clear();
        self.displayed_line = None;
    }

    fn report(&mut self, level: Level, message: String) {
        log!(level, "{}", message);
        let diagnostic = Diagnostic { level, message };
        for observer in self.observers.iter_mut() {
            observer.diagnostic(&diagnostic);
        }
    }
}
