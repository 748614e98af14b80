use std::fmt;

use serde::{Deserialize, Serialize};

use super::Command;
use crate::error::{Result, SessionError};

/// Application state saved with a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub point_target_visible: bool,
    pub edge_target_visible: bool,
    pub edges_shown: bool,
    pub build_volume_visible: bool,
    pub axis_aligned: bool,
    pub hidden_models: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppInfo {
    pub version: String,
    #[serde(default)]
    pub session_state: SessionState,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            session_state: SessionState::default(),
        }
    }
}

/// Ordered command log with an undo cursor. Commands at or after
/// `current_index` have been undone.
#[derive(Default)]
pub struct CommandList {
    app_info: Option<AppInfo>,
    commands: Vec<Box<dyn Command>>,
    current_index: usize,
    index_at_clear: usize,
}

impl fmt::Debug for CommandList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandList")
            .field("app_info", &self.app_info)
            .field("commands", &self.commands)
            .field("current_index", &self.current_index)
            .finish_non_exhaustive()
    }
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the list and installs fresh app info.
    pub fn reset(&mut self) {
        self.app_info = Some(AppInfo::default());
        self.commands.clear();
        self.current_index = 0;
        self.index_at_clear = 0;
    }

    pub fn app_info(&self) -> Option<&AppInfo> {
        self.app_info.as_ref()
    }

    pub fn set_app_info(&mut self, app_info: AppInfo) {
        self.app_info = Some(app_info);
    }

    pub fn session_state(&self) -> Option<&SessionState> {
        self.app_info.as_ref().map(|info| &info.session_state)
    }

    pub fn session_state_mut(&mut self) -> &mut SessionState {
        &mut self
            .app_info
            .get_or_insert_with(AppInfo::default)
            .session_state
    }

    /// Appends a command at the cursor. Undone commands after the cursor are
    /// dropped, except those that must be kept as orphans, which move onto
    /// the new command.
    pub fn add_command(&mut self, mut command: Box<dyn Command>) {
        if self.current_index < self.commands.len() {
            let tail = self.commands.split_off(self.current_index);
            let orphans: Vec<_> = tail
                .into_iter()
                .filter(|command| command.should_be_added_as_orphan())
                .collect();
            if !orphans.is_empty() {
                tracing::debug!(
                    "{} keeps {} orphaned command(s)",
                    command.type_name(),
                    orphans.len()
                );
                command.base_mut().add_orphaned_commands(orphans);
            }
        }
        self.commands.push(command);
        self.current_index = self.commands.len();
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub(crate) fn set_current_index(&mut self, index: usize) {
        self.current_index = index;
    }

    pub fn command(&self, index: usize) -> &dyn Command {
        &*self.commands[index]
    }

    pub fn command_mut(&mut self, index: usize) -> &mut dyn Command {
        &mut *self.commands[index]
    }

    pub fn commands(&self) -> impl Iterator<Item = &(dyn Command + 'static)> + '_ {
        self.commands.iter().map(|command| &**command)
    }

    pub(crate) fn commands_mut(&mut self) -> &mut [Box<dyn Command>] {
        &mut self.commands
    }

    fn undo_index(&self) -> Option<usize> {
        (0..self.current_index)
            .rev()
            .find(|&index| self.commands[index].has_undo_effect())
    }

    fn redo_index(&self) -> Option<usize> {
        (self.current_index..self.commands.len())
            .find(|&index| self.commands[index].has_redo_effect())
    }

    pub fn can_undo(&self) -> bool {
        self.undo_index().is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.redo_index().is_some()
    }

    pub fn command_to_undo(&self) -> Option<&dyn Command> {
        self.undo_index().map(|index| self.command(index))
    }

    pub fn command_to_redo(&self) -> Option<&dyn Command> {
        self.redo_index().map(|index| self.command(index))
    }

    /// Moves the cursor back past the next command with an undo effect and
    /// returns it.
    pub fn process_undo(&mut self) -> &mut dyn Command {
        let Some(index) = self.undo_index() else {
            panic!("process_undo() requires can_undo()");
        };
        self.current_index = index;
        self.command_mut(index)
    }

    /// Moves the cursor forward past the next command with a redo effect and
    /// returns it.
    pub fn process_redo(&mut self) -> &mut dyn Command {
        let Some(index) = self.redo_index() else {
            panic!("process_redo() requires can_redo()");
        };
        self.current_index = index + 1;
        self.command_mut(index)
    }

    pub fn remove_last_command(&mut self) -> Box<dyn Command> {
        let Some(command) = self.commands.pop() else {
            panic!("remove_last_command() on an empty command list");
        };
        self.current_index = self.current_index.min(self.commands.len());
        command
    }

    /// Marks the current state as saved.
    pub fn clear_changes(&mut self) {
        self.index_at_clear = self.current_index;
    }

    pub fn was_any_command_added(&self) -> bool {
        self.index_at_clear < self.commands.len()
    }

    pub fn are_any_changes(&self) -> bool {
        self.current_index > 0 && self.index_at_clear != self.current_index
    }

    /// Drops every command after the cursor.
    pub fn clear_orphaned_commands(&mut self) {
        self.commands.truncate(self.current_index);
    }

    pub fn validate(&self) -> Result<()> {
        if self.app_info.is_none() {
            return Err(SessionError::MissingAppInfo);
        }
        if self.current_index > self.commands.len() {
            return Err(SessionError::InvalidCurrentIndex {
                index: self.current_index,
                count: self.commands.len(),
            });
        }
        Ok(())
    }
}
