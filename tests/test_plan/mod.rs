use std::cell::RefCell;
use std::error::Error;
use std::fs;
use std::io;
use std::path::Path;
use std::rc::Rc;

use ibralogue::*;

#[derive(Debug, PartialEq, Eq)]
pub enum PlanStep {
    Line(String),
    Option(String),
    Select(usize),
    Stop,
}

impl PlanStep {
    fn new(line: &str) -> Self {
        let mut split_line = line.splitn(2, ": ");
        match split_line.next() {
            Some("line") => Self::Line(split_line.next().unwrap().to_owned()),
            Some("option") => Self::Option(split_line.next().unwrap().to_owned()),
            Some("select") => {
                let index: usize = split_line.next().and_then(|s| s.parse().ok()).unwrap();
                if index < 1 {
                    panic!("Select index must be 1 or greater.");
                }
                Self::Select(index - 1)
            }
            Some("stop") => Self::Stop,
            Some(step) => panic!(
                "Could not parse test plan step \"{}\" in line \"{}\"",
                step, line
            ),
            None => panic!("Could not parse test plan step in line \"{}\"", line),
        }
    }
}

pub struct TestPlan {
    steps: Vec<PlanStep>,
    next_step_index: usize,
    options: Vec<String>,
}

impl TestPlan {
    pub fn load(plan_path: &Path) -> io::Result<Self> {
        let plan_text = fs::read_to_string(plan_path)?;
        let steps: Vec<_> = plan_text
            .lines()
            .map(|line| line.trim_start())
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(PlanStep::new)
            .collect();

        Ok(Self {
            steps,
            next_step_index: 0,
            options: Vec::new(),
        })
    }

    /// Steps forward to the next line, select or stop expectation,
    /// collecting any option steps on the way.
    pub fn next(&mut self) {
        let prev_step = match self.next_step_index {
            i if i > 0 && i <= self.steps.len() => Some(&self.steps[i - 1]),
            _ => None,
        };
        if let Some(PlanStep::Select(_)) = prev_step {
            // The previous expectation was a selection, so its options are done with.
            self.options.clear();
        }

        while self.next_step_index <= self.steps.len() {
            let current_step = self.steps.get(self.next_step_index);

            self.next_step_index += 1;

            match current_step {
                Some(PlanStep::Option(option)) => {
                    self.options.push(option.clone());
                    continue;
                }
                _ => return,
            }
        }
    }

    pub fn get_current_step(&self) -> Option<&PlanStep> {
        match self.next_step_index {
            0 => None,
            i if i <= self.steps.len() => Some(&self.steps[i - 1]),
            // Falling off the end of the plan means a stop is expected.
            _ => Some(&PlanStep::Stop),
        }
    }
}

enum Presented {
    Line(String),
    Choices(Vec<String>),
}

#[derive(Clone, Default)]
struct QueueView {
    queue: Rc<RefCell<Vec<Presented>>>,
}

impl DialogueView for QueueView {
    fn display_line(&mut self, line: &DisplayedLine) -> DisplayStatus {
        let text = if line.speaker.is_empty() {
            line.text.clone()
        } else {
            format!("{}: {}", line.speaker, line.text)
        };
        self.queue.borrow_mut().push(Presented::Line(text));
        DisplayStatus::Complete
    }

    fn display_choices(&mut self, choices: &[Choice]) {
        let labels = choices.iter().map(|choice| choice.choice_name.clone()).collect();
        self.queue.borrow_mut().push(Presented::Choices(labels));
    }

    fn clear(&mut self) {}
}

fn test_functions() -> FunctionRegistry {
    let mut functions = FunctionRegistry::new();
    functions.register("PlayerTitle", DialogueFunction::text(|| "Captain".to_string()));
    functions.register("Chime", DialogueFunction::effect(|| log::info!("*chime*")));
    functions.register(
        "Here",
        DialogueFunction::text_with_manager(|manager| {
            manager
                .current_conversation()
                .map(|conversation| conversation.name.clone())
                .unwrap_or_default()
        }),
    );
    functions
}

pub struct PlanRunner {
    manager: DialogueManager,
    asset: DialogueAsset,
    plan: TestPlan,
    queue: Rc<RefCell<Vec<Presented>>>,
}

impl PlanRunner {
    /// Loads `<name>.ibra`, its `<name>.testplan`, and `<name>.csv` variables if present.
    pub fn new(script_path: &str) -> Self {
        let _ = pretty_env_logger::try_init();

        let script_path = Path::new(script_path);
        let asset = DialogueAsset::from_path(script_path).unwrap();

        let csv_path = script_path.with_extension("csv");
        let variables = if csv_path.exists() {
            GlobalVariables::from_csv_path(&csv_path).unwrap()
        } else {
            GlobalVariables::new()
        };

        let view = QueueView::default();
        let queue = Rc::clone(&view.queue);
        let manager = DialogueManager::new(std::sync::Arc::new(test_functions()))
            .with_variables(variables)
            .with_view(Box::new(view));

        let plan_path = script_path.with_extension("testplan");
        let plan = TestPlan::load(&plan_path).unwrap();

        Self {
            manager,
            asset,
            plan,
            queue,
        }
    }

    pub fn run(&mut self) -> Result<(), Box<dyn Error>> {
        self.manager.start_conversation(Some(&self.asset), 0)?;

        loop {
            let presented: Vec<_> = self.queue.borrow_mut().drain(..).collect();
            for item in presented {
                match item {
                    Presented::Line(line_text) => {
                        // Assert that the test plan expects this line.
                        self.plan.next();
                        let plan_step = self.plan.get_current_step().unwrap();
                        assert!(
                            matches!(plan_step, PlanStep::Line(plan_text) if *plan_text == line_text),
                            "[{}] Expected the line {:?}, got \"{}\"",
                            self.plan.next_step_index,
                            plan_step,
                            line_text
                        );
                    }
                    Presented::Choices(labels) => {
                        // Assert that the test plan expects these options.
                        self.plan.next();
                        assert_eq!(labels, self.plan.options);
                        match self.plan.get_current_step().unwrap() {
                            PlanStep::Select(i) => {
                                let outcome = self.manager.select_choice(*i)?;
                                assert!(
                                    matches!(outcome, ChoiceOutcome::Entered(_)),
                                    "Selecting option {} led to {:?}",
                                    i + 1,
                                    outcome
                                );
                            }
                            step => panic!("Expected PlanStep::Select, got {:?}", step),
                        }
                    }
                }
            }

            if !self.queue.borrow().is_empty() {
                continue;
            }

            match self.manager.state() {
                ExecutionState::Idle => {
                    // Assert that the test plan expects the end of dialogue.
                    self.plan.next();
                    assert_eq!(*self.plan.get_current_step().unwrap(), PlanStep::Stop);
                    break;
                }
                ExecutionState::ChoicePending => panic!("Choices are pending but none were presented"),
                _ => {
                    self.manager.try_advance();
                }
            }
        }

        Ok(())
    }
}
