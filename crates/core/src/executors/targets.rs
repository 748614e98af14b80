use std::rc::Weak;

use super::typed;
use crate::command::{ChangeEdgeTargetCommand, ChangePointTargetCommand, CommandManager, Op};
use crate::targets::TargetManager;

pub(super) fn register(manager: &mut CommandManager, target_manager: &Weak<TargetManager>) {
    let targets = Weak::clone(target_manager);
    manager.register_function("ChangePointTargetCommand", move |command, op| {
        let command: &mut ChangePointTargetCommand = typed(command);
        let Some(targets) = targets.upgrade() else {
            tracing::warn!("point target changed without a target manager");
            return;
        };
        targets.set_point_target(match op {
            Op::Do => command.new_target,
            Op::Undo => command.old_target,
        });
    });

    let targets = Weak::clone(target_manager);
    manager.register_function("ChangeEdgeTargetCommand", move |command, op| {
        let command: &mut ChangeEdgeTargetCommand = typed(command);
        let Some(targets) = targets.upgrade() else {
            tracing::warn!("edge target changed without a target manager");
            return;
        };
        targets.set_edge_target(match op {
            Op::Do => command.new_target,
            Op::Undo => command.old_target,
        });
    });
}
