use std::collections::HashMap;
use std::sync::Arc;

use log::*;

use crate::conversation::{find_conversation, Choice, Conversation, DialogueAsset, Invocation, Line, LineContent};
use crate::errors::CompileError;
use crate::parser::{Lexer, MarkupLexer, Segment, Token};
use crate::variables::GlobalVariables;

/// Compiles every conversation declared in `asset`, in file order.
pub fn compile(asset: &DialogueAsset, globals: &GlobalVariables) -> Result<Vec<Conversation>, CompileError> {
    let conversations = compile_string(&asset.source, globals)?;
    debug!("Compiled {} conversations from \"{}\"", conversations.len(), asset.name);
    Ok(conversations)
}

pub fn compile_string(src: &str, globals: &GlobalVariables) -> Result<Vec<Conversation>, CompileError> {
    let mut conversations = Vec::new();
    // The open conversation and the line its header was on.
    let mut current: Option<(usize, Conversation)> = None;
    let mut speaker = String::new();

    for token in Lexer::new(src) {
        let (line, token) = token?;
        match token {
            Token::Header(name) => {
                if let Some((header_line, conversation)) = current.take() {
                    close(&mut conversations, header_line, conversation)?;
                }
                if find_conversation(&conversations, name).is_some() {
                    return Err(CompileError::DuplicateConversation {
                        line,
                        name: name.to_string(),
                    });
                }
                current = Some((line, Conversation::new(name)));
                speaker.clear();
            }
            Token::Speaker(name) => {
                open(&mut current, line)?;
                speaker = name.to_string();
            }
            Token::Text(text) => {
                let conversation = open(&mut current, line)?;
                conversation.lines.push(compile_line(line, &speaker, text, globals)?);
            }
            Token::Choice { label, target } => {
                let conversation = open(&mut current, line)?;
                let index = conversation
                    .lines
                    .len()
                    .checked_sub(1)
                    .ok_or_else(|| CompileError::ChoiceWithoutLine {
                        line,
                        label: label.to_string(),
                    })?;
                conversation.choices.push((Choice::new(label, target), index));
            }
        }
    }

    if let Some((header_line, conversation)) = current {
        close(&mut conversations, header_line, conversation)?;
    }

    Ok(conversations)
}

fn open(current: &mut Option<(usize, Conversation)>, line: usize) -> Result<&mut Conversation, CompileError> {
    current
        .as_mut()
        .map(|(_, conversation)| conversation)
        .ok_or(CompileError::MissingHeader { line })
}

fn close(conversations: &mut Vec<Conversation>, header_line: usize, conversation: Conversation) -> Result<(), CompileError> {
    if conversation.lines.is_empty() {
        return Err(CompileError::EmptyConversation {
            line: header_line,
            name: conversation.name,
        });
    }
    conversations.push(conversation);
    Ok(())
}

/// Substitutes variables and strips markers. Invocation offsets are character
/// offsets into the substituted text.
fn compile_line(line: usize, speaker: &str, raw: &str, globals: &GlobalVariables) -> Result<Line, CompileError> {
    let mut text = String::with_capacity(raw.len());
    let mut len = 0;
    let mut invocations = Vec::new();
    let mut speaker_image = None;

    for segment in MarkupLexer::new(raw, line) {
        match segment? {
            Segment::Literal(literal) => {
                text.push_str(literal);
                len += literal.chars().count();
            }
            Segment::Variable(name) => {
                let value = globals.get(name).ok_or_else(|| CompileError::UnresolvedVariable {
                    line,
                    name: name.to_string(),
                })?;
                text.push_str(value);
                len += value.chars().count();
            }
            Segment::Function(function) => invocations.push(Invocation {
                offset: len,
                function: function.to_string(),
            }),
            Segment::Image(path) => speaker_image = Some(path.to_string()),
        }
    }

    check_offsets(line, &text, &invocations)?;

    Ok(Line {
        speaker: speaker.to_string(),
        content: LineContent { text, invocations },
        speaker_image,
    })
}

fn check_offsets(line: usize, text: &str, invocations: &[Invocation]) -> Result<(), CompileError> {
    let len = text.chars().count();
    let mut previous = 0;
    for invocation in invocations {
        if invocation.offset < previous || invocation.offset > len {
            return Err(CompileError::InvalidOffset {
                line,
                offset: invocation.offset,
                len,
            });
        }
        previous = invocation.offset;
    }
    Ok(())
}

struct CacheEntry {
    source: String,
    globals: GlobalVariables,
    conversations: Arc<[Conversation]>,
}

/// Compiled conversation sets keyed by asset name. An entry is reused only
/// while both the asset's source and the variable snapshot are unchanged.
#[derive(Default)]
pub struct ConversationCache {
    entries: HashMap<String, CacheEntry>,
}

impl ConversationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compile(
        &mut self,
        asset: &DialogueAsset,
        globals: &GlobalVariables,
    ) -> Result<Arc<[Conversation]>, CompileError> {
        if let Some(entry) = self.entries.get(&asset.name) {
            if entry.source == asset.source && entry.globals == *globals {
                trace!("Reusing compiled conversations for \"{}\"", asset.name);
                return Ok(Arc::clone(&entry.conversations));
            }
        }

        let conversations: Arc<[Conversation]> = compile(asset, globals)?.into();
        self.entries.insert(
            asset.name.clone(),
            CacheEntry {
                source: asset.source.clone(),
                globals: globals.clone(),
                conversations: Arc::clone(&conversations),
            },
        );
        Ok(conversations)
    }

    pub fn invalidate(&mut self, asset_name: &str) {
        self.entries.remove(asset_name);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
