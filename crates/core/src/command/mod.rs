//! Undoable model mutations and the machinery that records and replays them.
//!
//! A command is a value object. Its effect is produced by an executor
//! function registered with the [`CommandManager`] under the command's type
//! name, which is also the name used in session files.

use std::any::Any;
use std::fmt;

/// Implements the [`Command`] plumbing shared by every concrete command:
/// base access, downcasting and JSON serialization of the command fields.
macro_rules! command_plumbing {
    () => {
        fn base(&self) -> &$crate::command::CommandBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut $crate::command::CommandBase {
            &mut self.base
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }

        fn to_json(&self) -> serde_json::Result<serde_json::Value> {
            serde_json::to_value(self)
        }
    };
}

mod list;
mod manager;
mod registry;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use list::{AppInfo, CommandList, SessionState};
pub use manager::{CommandManager, ExecFunc, HookFunc};
pub use registry::CommandRegistry;
pub use types::{
    ChangeCylinderCommand, ChangeEdgeTargetCommand, ChangePlaneCommand, ChangePointTargetCommand,
    ChangeSpinCommand, ChangeTorusCommand, PlaneCommandKind, RotateCommand, ScaleCommand,
    ScaleSide, SpinCommandKind, TranslateCommand,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Do,
    Undo,
}

/// State every command carries besides its own fields.
#[derive(Default)]
pub struct CommandBase {
    is_finalized: bool,
    is_validating: bool,
    exec_data: Option<Box<dyn Any>>,
    orphaned_commands: Vec<Box<dyn Command>>,
}

impl fmt::Debug for CommandBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBase")
            .field("is_finalized", &self.is_finalized)
            .field("is_validating", &self.is_validating)
            .field("has_exec_data", &self.exec_data.is_some())
            .field("orphaned_commands", &self.orphaned_commands.len())
            .finish()
    }
}

impl CommandBase {
    /// Set once the command is added to the list; executors use it to tell
    /// interactive simulation from final execution.
    pub fn is_finalized(&self) -> bool {
        self.is_finalized
    }

    pub fn set_is_finalized(&mut self) {
        self.is_finalized = true;
    }

    /// True while the command is replayed during session loading.
    pub fn is_validating(&self) -> bool {
        self.is_validating
    }

    pub fn set_is_validating(&mut self, is_validating: bool) {
        self.is_validating = is_validating;
    }

    /// Executor scratch data. `None` on the first execution.
    pub fn exec_data<T: Any>(&self) -> Option<&T> {
        self.exec_data.as_ref()?.downcast_ref::<T>()
    }

    pub fn exec_data_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.exec_data.as_mut()?.downcast_mut::<T>()
    }

    pub fn has_exec_data(&self) -> bool {
        self.exec_data.is_some()
    }

    pub fn set_exec_data<T: Any>(&mut self, data: T) {
        self.exec_data = Some(Box::new(data));
    }

    pub fn orphaned_commands(&self) -> &[Box<dyn Command>] {
        &self.orphaned_commands
    }

    pub fn add_orphaned_commands(&mut self, commands: impl IntoIterator<Item = Box<dyn Command>>) {
        self.orphaned_commands.extend(commands);
    }

    pub(crate) fn orphaned_commands_mut(&mut self) -> &mut Vec<Box<dyn Command>> {
        &mut self.orphaned_commands
    }
}

pub trait Command: Any {
    /// Stable name used as the executor key and in session files.
    fn type_name(&self) -> &'static str;

    /// Human-readable description, used for undo/redo tooltips.
    fn description(&self) -> String;

    fn base(&self) -> &CommandBase;
    fn base_mut(&mut self) -> &mut CommandBase;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Serializes the command's own fields (not the base state).
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;

    /// Checks the fields after reading from a session.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    fn model_names(&self) -> &[String] {
        &[]
    }

    fn has_undo_effect(&self) -> bool {
        true
    }

    fn has_redo_effect(&self) -> bool {
        true
    }

    /// Commands that affect state outside the models (targets, clipboard)
    /// survive being discarded from the redo tail.
    fn should_be_added_as_orphan(&self) -> bool {
        false
    }
}

impl fmt::Debug for dyn Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.type_name())
            .field("base", self.base())
            .finish_non_exhaustive()
    }
}

impl<'a> dyn Command + 'a {
    pub fn downcast_ref<T: Command>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Command>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    pub fn is<T: Command>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Description fragment for one model.
pub fn model_desc(name: &str) -> String {
    format!("Model \"{name}\"")
}

/// Description fragment for a list of models.
pub fn models_desc(names: &[String]) -> String {
    match names {
        [name] => model_desc(name),
        _ => format!("{} Models", names.len()),
    }
}

/// Shared check for commands that operate on selected models.
pub(crate) fn validate_model_names(names: &[String]) -> Result<(), String> {
    if names.is_empty() {
        return Err("Missing model names".to_string());
    }
    if let Some(name) = names.iter().find(|name| name.trim().is_empty()) {
        return Err(format!("Invalid model name {name:?}"));
    }
    Ok(())
}
