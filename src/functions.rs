//! The library of functions that `{{Name}}` markers can invoke.

use std::collections::HashMap;
use std::fmt;

use crate::DialogueManager;

pub type TextFunction = dyn Fn(&DialogueManager) -> String + Send + Sync;
pub type EffectFunction = dyn Fn(&DialogueManager) + Send + Sync;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FunctionKind {
    /// The result is spliced into the line at the marker's offset.
    TextProducing,
    /// Run for its side effect only.
    EffectOnly,
}

pub enum DialogueFunction {
    Text(Box<TextFunction>),
    Effect(Box<EffectFunction>),
}

impl DialogueFunction {
    pub fn text<F>(func: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self::Text(Box::new(move |_: &DialogueManager| func()))
    }

    pub fn text_with_manager<F>(func: F) -> Self
    where
        F: Fn(&DialogueManager) -> String + Send + Sync + 'static,
    {
        Self::Text(Box::new(func))
    }

    pub fn effect<F>(func: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::Effect(Box::new(move |_: &DialogueManager| func()))
    }

    pub fn effect_with_manager<F>(func: F) -> Self
    where
        F: Fn(&DialogueManager) + Send + Sync + 'static,
    {
        Self::Effect(Box::new(func))
    }

    pub fn kind(&self) -> FunctionKind {
        match self {
            Self::Text(_) => FunctionKind::TextProducing,
            Self::Effect(_) => FunctionKind::EffectOnly,
        }
    }

    /// Runs the function, returning the text to splice in if it produces any.
    pub fn call(&self, manager: &DialogueManager) -> Option<String> {
        match self {
            Self::Text(func) => Some((func)(manager)),
            Self::Effect(func) => {
                (func)(manager);
                None
            }
        }
    }
}

impl fmt::Debug for DialogueFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DialogueFunction::{:?}", self.kind())
    }
}

/// Maps marker names to functions. Fill it once at start-up and share it
/// between managers behind an `Arc`.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, DialogueFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `func` under `name`, returning any function it replaces.
    pub fn register(&mut self, name: impl Into<String>, func: DialogueFunction) -> Option<DialogueFunction> {
        self.functions.insert(name.into(), func)
    }

    pub fn resolve(&self, name: &str) -> Option<&DialogueFunction> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut registry = FunctionRegistry::new();
        assert!(registry.register("Greet", DialogueFunction::text(|| "hi".to_string())).is_none());
        assert!(registry.register("Wave", DialogueFunction::effect(|| {})).is_none());
        assert!(registry.register("Greet", DialogueFunction::text(|| "hello".to_string())).is_some());

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("Greet").map(DialogueFunction::kind), Some(FunctionKind::TextProducing));
        assert_eq!(registry.resolve("Wave").map(DialogueFunction::kind), Some(FunctionKind::EffectOnly));
        assert!(registry.resolve("Missing").is_none());
        assert!(registry.contains("Wave"));
        assert!(!registry.contains("Missing"));

        let mut names: Vec<_> = registry.names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["Greet", "Wave"]);
    }

    #[test]
    fn test_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let effect = DialogueFunction::effect(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let text = DialogueFunction::text_with_manager(|manager| format!("{:?}", manager.state()));

        let manager = DialogueManager::new(Arc::new(FunctionRegistry::new()));
        assert_eq!(effect.call(&manager), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(text.call(&manager), Some("Idle".to_string()));
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FunctionRegistry>();
    }
}
