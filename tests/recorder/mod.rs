#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ibralogue::*;
use log::Level;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Line(DisplayedLine),
    Choices(Vec<String>),
    Clear,
    Started(String),
    Ended,
    Diagnostic(Level, String),
    PluginDisplay(String, usize),
    PluginClear(Option<String>, usize),
}

/// Records everything the manager presents, in order.
#[derive(Clone, Default)]
pub struct Recorder {
    pub events: Rc<RefCell<Vec<Event>>>,
    /// When set, lines are reported as still revealing.
    pub reveal: Rc<Cell<bool>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, manager: &mut DialogueManager) {
        manager.set_view(Box::new(self.clone()));
        manager.add_observer(Box::new(self.clone()));
        manager.add_plugin(Box::new(self.clone()));
    }

    pub fn take(&self) -> Vec<Event> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events.borrow().iter().filter(|event| predicate(event)).count()
    }

    pub fn lines(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Line(line) => Some(line.text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn diagnostics(&self) -> Vec<(Level, String)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Diagnostic(level, message) => Some((*level, message.clone())),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl DialogueView for Recorder {
    fn display_line(&mut self, line: &DisplayedLine) -> DisplayStatus {
        self.push(Event::Line(line.clone()));
        if self.reveal.get() {
            DisplayStatus::Revealing
        } else {
            DisplayStatus::Complete
        }
    }

    fn display_choices(&mut self, choices: &[Choice]) {
        self.push(Event::Choices(choices.iter().map(|c| c.choice_name.clone()).collect()));
    }

    fn clear(&mut self) {
        self.push(Event::Clear);
    }
}

impl DialogueObserver for Recorder {
    fn conversation_started(&mut self, conversation: &Conversation) {
        self.push(Event::Started(conversation.name.clone()));
    }

    fn conversation_ended(&mut self) {
        self.push(Event::Ended);
    }

    fn diagnostic(&mut self, diagnostic: &Diagnostic) {
        self.push(Event::Diagnostic(diagnostic.level, diagnostic.message.clone()));
    }
}

impl ManagerPlugin for Recorder {
    fn display(&mut self, conversation: &Conversation, line_index: usize) {
        self.push(Event::PluginDisplay(conversation.name.clone(), line_index));
    }

    fn clear(&mut self, conversation: Option<&Conversation>, line_index: usize) {
        self.push(Event::PluginClear(conversation.map(|c| c.name.clone()), line_index));
    }
}
