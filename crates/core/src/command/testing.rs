use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::{Command, CommandBase, CommandManager, CommandRegistry, Op};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TestCommand {
    #[serde(skip)]
    base: CommandBase,
    pub label: String,
    #[serde(default)]
    pub is_orphan: bool,
    #[serde(default)]
    pub no_effect: bool,
}

impl TestCommand {
    pub(crate) fn boxed(label: &str) -> Box<dyn Command> {
        Box::new(Self::new(label))
    }

    pub(crate) fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn orphan(label: &str) -> Box<dyn Command> {
        Box::new(Self {
            is_orphan: true,
            ..Self::new(label)
        })
    }

    pub(crate) fn without_effect(label: &str) -> Box<dyn Command> {
        Box::new(Self {
            no_effect: true,
            ..Self::new(label)
        })
    }
}

impl Command for TestCommand {
    command_plumbing!();

    fn type_name(&self) -> &'static str {
        "TestCommand"
    }

    fn description(&self) -> String {
        format!("Test {}", self.label)
    }

    fn validate(&self) -> Result<(), String> {
        if self.label.is_empty() {
            return Err("Missing label".to_string());
        }
        Ok(())
    }

    fn has_undo_effect(&self) -> bool {
        !self.no_effect
    }

    fn has_redo_effect(&self) -> bool {
        !self.no_effect
    }

    fn should_be_added_as_orphan(&self) -> bool {
        self.is_orphan
    }
}

/// Executed operations, recorded as `do(label)` / `undo(label)`.
#[derive(Default)]
pub(crate) struct OpLog {
    pub ops: Vec<String>,
    pub validating: Vec<bool>,
}

impl OpLog {
    pub(crate) fn take(&mut self) -> Vec<String> {
        self.validating.clear();
        std::mem::take(&mut self.ops)
    }
}

pub(crate) fn recording_manager() -> (CommandManager, Rc<RefCell<OpLog>>) {
    let log = Rc::new(RefCell::new(OpLog::default()));
    let mut manager = CommandManager::new();
    let exec_log = log.clone();
    manager.register_function("TestCommand", move |command, op| {
        let is_validating = command.base().is_validating();
        let Some(test) = command.downcast_ref::<TestCommand>() else {
            panic!("expected a TestCommand");
        };
        let name = match op {
            Op::Do => format!("do({})", test.label),
            Op::Undo => format!("undo({})", test.label),
        };
        let mut log = exec_log.borrow_mut();
        log.ops.push(name);
        log.validating.push(is_validating);
    });
    (manager, log)
}

pub(crate) fn test_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::with_builtin_commands();
    registry.add_type::<TestCommand>("TestCommand");
    registry
}

pub(crate) fn label(command: &dyn Command) -> String {
    command
        .downcast_ref::<TestCommand>()
        .map(|test| test.label.clone())
        .unwrap_or_default()
}
