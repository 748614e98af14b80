use std::collections::HashMap;

use super::{Command, CommandList, Op, SessionState};
use crate::error::{Result, SessionError};

/// Executor function registered per command type.
pub type ExecFunc = Box<dyn FnMut(&mut dyn Command, Op)>;

/// Hook invoked around command execution.
pub type HookFunc = Box<dyn FnMut(&dyn Command)>;

struct Dispatch {
    functions: HashMap<String, ExecFunc>,
    pre_do: Option<HookFunc>,
    post_undo: Option<HookFunc>,
    is_validating: bool,
}

impl Dispatch {
    fn run(&mut self, command: &mut dyn Command, op: Op) {
        command.base_mut().set_is_validating(self.is_validating);
        if op == Op::Do {
            if let Some(pre_do) = self.pre_do.as_mut() {
                pre_do(command);
            }
        }
        let type_name = command.type_name();
        let Some(func) = self.functions.get_mut(type_name) else {
            panic!("no executor registered for {type_name}");
        };
        tracing::debug!("{op:?} {type_name}");
        func(command, op);
        if op == Op::Undo {
            if let Some(post_undo) = self.post_undo.as_mut() {
                post_undo(command);
            }
        }
    }

    /// Does the orphans, then the command, then undoes the orphans in
    /// reverse so their transient effects are reproduced.
    fn replay(&mut self, command: &mut dyn Command) {
        let mut orphans = std::mem::take(command.base_mut().orphaned_commands_mut());
        for orphan in orphans.iter_mut() {
            self.replay(&mut **orphan);
        }
        command.base_mut().set_is_finalized();
        self.run(command, Op::Do);
        for orphan in orphans.iter_mut().rev() {
            self.run(&mut **orphan, Op::Undo);
        }
        *command.base_mut().orphaned_commands_mut() = orphans;
    }

    fn check_registered(&self, command: &dyn Command) -> Result<()> {
        if !self.functions.contains_key(command.type_name()) {
            return Err(SessionError::MissingExecutor(command.type_name().to_string()));
        }
        command
            .base()
            .orphaned_commands()
            .iter()
            .try_for_each(|orphan| self.check_registered(&**orphan))
    }
}

/// Executes commands and maintains the undo/redo history.
pub struct CommandManager {
    command_list: CommandList,
    dispatch: Dispatch,
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandManager {
    pub fn new() -> Self {
        let mut command_list = CommandList::new();
        command_list.reset();
        Self {
            command_list,
            dispatch: Dispatch {
                functions: HashMap::new(),
                pre_do: None,
                post_undo: None,
                is_validating: false,
            },
        }
    }

    /// Registers the executor for one command type. Each type is registered
    /// exactly once.
    pub fn register_function(
        &mut self,
        type_name: &str,
        func: impl FnMut(&mut dyn Command, Op) + 'static,
    ) {
        assert!(
            !self.dispatch.functions.contains_key(type_name),
            "executor for {type_name} registered twice"
        );
        self.dispatch
            .functions
            .insert(type_name.to_string(), Box::new(func));
    }

    pub fn has_function(&self, type_name: &str) -> bool {
        self.dispatch.functions.contains_key(type_name)
    }

    /// Called before every do, including simulated ones.
    pub fn set_pre_do_func(&mut self, func: impl FnMut(&dyn Command) + 'static) {
        self.dispatch.pre_do = Some(Box::new(func));
    }

    pub fn set_post_undo_func(&mut self, func: impl FnMut(&dyn Command) + 'static) {
        self.dispatch.post_undo = Some(Box::new(func));
    }

    pub fn command_list(&self) -> &CommandList {
        &self.command_list
    }

    pub fn command_list_mut(&mut self) -> &mut CommandList {
        &mut self.command_list
    }

    pub fn reset_command_list(&mut self) {
        self.command_list.reset();
    }

    pub fn session_state(&self) -> Option<&SessionState> {
        self.command_list.session_state()
    }

    pub fn session_state_mut(&mut self) -> &mut SessionState {
        self.command_list.session_state_mut()
    }

    pub fn is_validating(&self) -> bool {
        self.dispatch.is_validating
    }

    /// Replaces the history with `list` and replays it: every command is
    /// done, then commands at or after the list's cursor are undone.
    pub fn process_command_list(&mut self, list: CommandList) -> Result<()> {
        list.validate()?;
        list.commands()
            .try_for_each(|command| self.dispatch.check_registered(command))?;

        let count = list.command_count();
        let current = list.current_index();
        tracing::info!("replaying {count} command(s), current index {current}");
        self.command_list = list;

        self.dispatch.is_validating = true;
        for index in 0..count {
            self.dispatch.replay(self.command_list.command_mut(index));
        }
        for index in (current..count).rev() {
            self.dispatch
                .run(self.command_list.command_mut(index), Op::Undo);
        }
        self.dispatch.is_validating = false;
        Ok(())
    }

    /// Adds `command` at the cursor and executes it.
    pub fn add_and_do(&mut self, mut command: Box<dyn Command>) {
        command.base_mut().set_is_finalized();
        self.command_list.add_command(command);
        let index = self.command_list.current_index() - 1;
        self.dispatch
            .run(self.command_list.command_mut(index), Op::Do);
    }

    /// Executes `command` without recording it. Each call re-applies the
    /// command from its current fields.
    pub fn simulate_do(&mut self, command: &mut dyn Command) {
        self.dispatch.run(command, Op::Do);
    }

    /// Reverts a simulated command that is being discarded.
    pub fn simulate_undo(&mut self, command: &mut dyn Command) {
        self.dispatch.run(command, Op::Undo);
    }

    pub fn can_undo(&self) -> bool {
        self.command_list.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.command_list.can_redo()
    }

    pub fn undo(&mut self) {
        assert!(self.can_undo(), "undo() requires can_undo()");
        let command = self.command_list.process_undo();
        self.dispatch.run(command, Op::Undo);
    }

    /// Undoes the most recently done command and removes it from the list.
    pub fn undo_and_purge(&mut self) {
        let count = self.command_list.command_count();
        assert!(
            count > 0
                && self.command_list.current_index() == count
                && self.command_list.command(count - 1).has_undo_effect(),
            "undo_and_purge() requires the last command to be undoable"
        );
        self.undo();
        self.command_list.remove_last_command();
    }

    pub fn redo(&mut self) {
        assert!(self.can_redo(), "redo() requires can_redo()");
        let command = self.command_list.process_redo();
        self.dispatch.run(command, Op::Do);
    }

    /// The command that the next undo would undo.
    pub fn last_command(&self) -> &dyn Command {
        match self.command_list.command_to_undo() {
            Some(command) => command,
            None => panic!("last_command() requires can_undo()"),
        }
    }
}
