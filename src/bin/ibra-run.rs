use std::env;
use std::error::Error;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use ibralogue::*;

const USAGE: &str = "usage: ibra-run <script> [start-index] [--vars <csv>]";

struct TerminalView;

impl DialogueView for TerminalView {
    fn display_line(&mut self, line: &DisplayedLine) -> DisplayStatus {
        if line.speaker.is_empty() {
            println!("{}", line.text);
        } else {
            println!("{}: {}", line.speaker, line.text);
        }
        DisplayStatus::Complete
    }

    fn display_choices(&mut self, choices: &[Choice]) {
        println!("== Choose option ==");
        for (i, choice) in choices.iter().enumerate() {
            println!("{}: {}", i, choice.choice_name);
        }
    }

    fn clear(&mut self) {}
}

struct TerminalObserver;

impl DialogueObserver for TerminalObserver {
    fn conversation_started(&mut self, conversation: &Conversation) {
        println!("== Conversation start: {} ==", conversation.name);
    }

    fn conversation_ended(&mut self) {
        println!("== Conversation end ==");
    }

    fn diagnostic(&mut self, diagnostic: &Diagnostic) {
        eprintln!("[{}] {}", diagnostic.level, diagnostic.message);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let mut script_path = None;
    let mut start_index = 0;
    let mut vars_path = None;

    while let Some(arg) = args.next() {
        if arg == "--vars" {
            vars_path = Some(PathBuf::from(args.next().ok_or(USAGE)?));
        } else if script_path.is_none() {
            script_path = Some(PathBuf::from(arg));
        } else {
            start_index = arg.parse()?;
        }
    }

    let script_path = script_path.ok_or(USAGE)?;
    let asset = DialogueAsset::from_path(&script_path)?;
    let variables = match vars_path {
        Some(path) => GlobalVariables::from_csv_path(&path)?,
        None => GlobalVariables::new(),
    };

    let mut manager = DialogueManager::new(Arc::new(FunctionRegistry::new()))
        .with_variables(variables)
        .with_view(Box::new(TerminalView));
    manager.add_observer(Box::new(TerminalObserver));

    manager.start_conversation(Some(&asset), start_index)?;

    // Block on the player: enter advances, a number picks a choice.
    let stdin = io::stdin();
    for input in stdin.lock().lines() {
        let input = input?;
        match manager.state() {
            ExecutionState::Idle => break,
            ExecutionState::ChoicePending => match input.trim().parse::<usize>() {
                Ok(selection) => {
                    if let Err(err) = manager.select_choice(selection) {
                        eprintln!("{}", err);
                    }
                }
                Err(_) => eprintln!("Enter the number of a choice."),
            },
            _ => {
                manager.try_advance();
            }
        }

        if manager.state() == ExecutionState::Idle {
            break;
        }
    }

    Ok(())
}
