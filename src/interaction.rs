use crate::conversation::DialogueAsset;
use crate::errors::EngineError;
use crate::DialogueManager;

/// The dialogues an NPC or object can start, in the order they are offered.
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    dialogues: Vec<DialogueAsset>,
}

impl Interaction {
    pub fn new(dialogues: Vec<DialogueAsset>) -> Self {
        Self { dialogues }
    }

    pub fn dialogues(&self) -> &[DialogueAsset] {
        &self.dialogues
    }

    /// Starts the first conversation of dialogue `dialogue_index`.
    ///
    /// An index with no dialogue behind it fails with [`EngineError::NullAsset`].
    pub fn start(&self, manager: &mut DialogueManager, dialogue_index: usize) -> Result<(), EngineError> {
        manager.start_conversation(self.dialogues.get(dialogue_index), 0)
    }
}
