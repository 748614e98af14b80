//! Executor functions applying commands to the models and targets.
//!
//! Every executor saves the state it changes in the command's exec data on
//! first execution, re-applies the command fields on each do and restores
//! the saved state on undo.

mod models;
mod targets;

#[cfg(test)]
mod tests;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use forma_scene::{Model, ModelStore, SceneError};

use crate::command::{Command, CommandBase, CommandManager};
use crate::targets::TargetManager;

/// What executors operate on.
#[derive(Clone)]
pub struct ExecContext {
    pub models: Rc<RefCell<ModelStore>>,
    pub target_manager: Weak<TargetManager>,
}

/// Registers an executor for every built-in command type.
pub fn register_executors(manager: &mut CommandManager, context: &ExecContext) {
    models::register(manager, &context.models);
    targets::register(manager, &context.target_manager);
}

fn typed<C: Command>(command: &mut dyn Command) -> &mut C {
    let type_name = command.type_name();
    match command.downcast_mut::<C>() {
        Some(command) => command,
        None => panic!("executor received unexpected {type_name}"),
    }
}

/// Values saved per model, in the order the command names them. Models
/// that cannot be found are left out.
type Snapshot<T> = Vec<(String, T)>;

fn save_once<T: Clone + 'static>(
    base: &mut CommandBase,
    models: &ModelStore,
    names: &[String],
    read: impl Fn(&Model) -> Result<T, SceneError>,
) {
    if base.has_exec_data() {
        return;
    }
    let saved: Snapshot<T> = names
        .iter()
        .filter_map(|name| match models.get(name).and_then(&read) {
            Ok(value) => Some((name.clone(), value)),
            Err(err) => {
                tracing::warn!("skipping model: {err}");
                None
            }
        })
        .collect();
    base.set_exec_data(saved);
}

/// Calls `apply` with each saved model and its saved value.
fn apply_saved<T: Clone + 'static>(
    base: &CommandBase,
    models: &mut ModelStore,
    mut apply: impl FnMut(&mut Model, &T) -> Result<(), SceneError>,
) {
    let Some(saved) = base.exec_data::<Snapshot<T>>() else {
        return;
    };
    for (name, value) in saved {
        if let Err(err) = models.get_mut(name).and_then(|model| apply(model, value)) {
            tracing::warn!("skipping model: {err}");
        }
    }
}
