use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use forma_scene::{are_directions_close, rotation_between, Dimensionality};
use glam::{Quat, Vec3};

use super::{EdgeTarget, EdgeTargetWidget, PointTarget, PointTargetWidget};
use crate::command::{
    ChangeEdgeTargetCommand, ChangePointTargetCommand, CommandManager, SessionState,
};
use crate::notifier::Notifier;
use crate::tuning::Tuning;
use crate::widgets::{DragInfo, DraggableWidget};

/// Owns the point and edge targets and answers snapping queries from
/// tools. Target changes made by dragging the target widgets are issued as
/// commands. All positions are in stage coordinates.
pub struct TargetManager {
    command_manager: Rc<RefCell<CommandManager>>,
    tuning: RefCell<Tuning>,
    point_widget: RefCell<PointTargetWidget>,
    edge_widget: RefCell<EdgeTargetWidget>,
    is_point_visible: Cell<bool>,
    is_edge_visible: Cell<bool>,
    is_snapping: Cell<bool>,
    activation: RefCell<Notifier<bool>>,
    point_command: RefCell<Option<ChangePointTargetCommand>>,
    edge_command: RefCell<Option<ChangeEdgeTargetCommand>>,
}

impl TargetManager {
    pub fn new(command_manager: Rc<RefCell<CommandManager>>, tuning: Tuning) -> Self {
        Self {
            command_manager,
            tuning: RefCell::new(tuning),
            point_widget: RefCell::new(PointTargetWidget::new()),
            edge_widget: RefCell::new(EdgeTargetWidget::new()),
            is_point_visible: Cell::new(false),
            is_edge_visible: Cell::new(false),
            is_snapping: Cell::new(false),
            activation: RefCell::new(Notifier::new()),
            point_command: RefCell::new(None),
            edge_command: RefCell::new(None),
        }
    }

    pub fn set_tuning(&self, tuning: Tuning) {
        *self.tuning.borrow_mut() = tuning;
    }

    pub fn tuning(&self) -> Ref<'_, Tuning> {
        self.tuning.borrow()
    }

    /// Notified with `true` when a target drag starts and `false` when it
    /// ends, before the target command is created or committed.
    pub fn target_activation(&self) -> RefMut<'_, Notifier<bool>> {
        self.activation.borrow_mut()
    }

    pub fn is_point_target_visible(&self) -> bool {
        self.is_point_visible.get()
    }

    pub fn is_edge_target_visible(&self) -> bool {
        self.is_edge_visible.get()
    }

    pub fn set_point_target_visible(&self, visible: bool) {
        self.is_point_visible.set(visible);
        self.command_manager
            .borrow_mut()
            .session_state_mut()
            .point_target_visible = visible;
    }

    pub fn set_edge_target_visible(&self, visible: bool) {
        self.is_edge_visible.set(visible);
        self.command_manager
            .borrow_mut()
            .session_state_mut()
            .edge_target_visible = visible;
    }

    /// Returns the new state.
    pub fn toggle_point_target(&self) -> bool {
        let visible = !self.is_point_target_visible();
        self.set_point_target_visible(visible);
        visible
    }

    /// Returns the new state.
    pub fn toggle_edge_target(&self) -> bool {
        let visible = !self.is_edge_target_visible();
        self.set_edge_target_visible(visible);
        visible
    }

    /// Applies the target visibility saved with a session.
    pub fn restore_session_state(&self, state: &SessionState) {
        self.is_point_visible.set(state.point_target_visible);
        self.is_edge_visible.set(state.edge_target_visible);
    }

    pub fn point_target(&self) -> PointTarget {
        *self.point_widget.borrow().target()
    }

    /// The direction is normalized.
    pub fn set_point_target(&self, target: PointTarget) {
        self.point_widget.borrow_mut().set_target(target);
    }

    pub fn edge_target(&self) -> EdgeTarget {
        *self.edge_widget.borrow().target()
    }

    pub fn set_edge_target(&self, target: EdgeTarget) {
        self.edge_widget.borrow_mut().set_target(target);
    }

    pub fn point_widget(&self) -> Ref<'_, PointTargetWidget> {
        self.point_widget.borrow()
    }

    pub fn edge_widget(&self) -> Ref<'_, EdgeTargetWidget> {
        self.edge_widget.borrow()
    }

    pub fn is_snapping(&self) -> bool {
        self.is_snapping.get()
    }

    /// Brackets a tool drag that snaps to targets.
    pub fn start_snapping(&self) {
        self.is_snapping.set(true);
    }

    /// Always clears the snap feedback on both targets.
    pub fn end_snapping(&self) {
        self.is_snapping.set(false);
        self.point_widget
            .borrow_mut()
            .show_snap_feedback(false, Vec3::ZERO);
        self.edge_widget.borrow_mut().show_snap_feedback(false);
    }

    /// Snaps `start + motion` onto the plane through the point target
    /// perpendicular to `motion`. On success `motion` is adjusted and true
    /// is returned.
    pub fn snap_to_point(&self, start: Vec3, motion: &mut Vec3) -> bool {
        if !self.is_point_target_visible() {
            return false;
        }
        let length = motion.length();
        if length <= f32::EPSILON {
            return false;
        }
        let dir = *motion / length;
        let target_pos = self.point_target().position;
        let snapped_length = (target_pos - start).dot(dir);
        let tolerance = self.tuning.borrow().snap_point_tolerance;
        let is_snapped = (snapped_length - length).abs() <= tolerance;
        if is_snapped {
            *motion = dir * snapped_length;
        }
        self.point_widget
            .borrow_mut()
            .show_snap_feedback(is_snapped, start + *motion);
        is_snapped
    }

    /// True if `length` is within tolerance of the edge target length.
    pub fn snap_to_length(&self, length: f32) -> bool {
        let is_snapped = self.length_diff(length).is_some();
        if self.is_edge_target_visible() {
            self.edge_widget.borrow_mut().show_snap_feedback(is_snapped);
        }
        is_snapped
    }

    /// Checks each component of `lengths` in `dims` against the edge target
    /// and returns the dimensions that snapped.
    pub fn snap_dims_to_length(&self, dims: Dimensionality, lengths: Vec3) -> Dimensionality {
        let mut snapped = Dimensionality::new();
        for dim in dims.dimensions() {
            if self.length_diff(lengths[dim]).is_some() {
                snapped.add_dimension(dim);
            }
        }
        if self.is_edge_target_visible() {
            self.edge_widget
                .borrow_mut()
                .show_snap_feedback(!snapped.is_empty());
        }
        snapped
    }

    /// Rotation taking `dir` onto the point target direction, when the two
    /// are within the direction tolerance.
    pub fn snap_to_direction(&self, dir: Vec3) -> Option<Quat> {
        if !self.is_point_target_visible() {
            return None;
        }
        let target = self.point_target();
        let tolerance = self.tuning.borrow().snap_direction_tolerance;
        let is_snapped = are_directions_close(dir, target.direction, tolerance);
        self.point_widget
            .borrow_mut()
            .show_snap_feedback(is_snapped, target.position);
        is_snapped.then(|| rotation_between(dir, target.direction))
    }

    fn length_diff(&self, length: f32) -> Option<f32> {
        if !self.is_edge_target_visible() {
            return None;
        }
        let diff = (length - self.edge_target().length()).abs();
        (diff <= self.tuning.borrow().snap_length_tolerance).then_some(diff)
    }

    pub fn start_point_drag(&self, info: &DragInfo) {
        self.activation.borrow_mut().notify(&true);
        self.point_widget.borrow_mut().start_drag(info);
        let target = self.point_target();
        *self.point_command.borrow_mut() = Some(ChangePointTargetCommand::new(target, target));
        tracing::debug!("point target drag started");
    }

    pub fn continue_point_drag(&self, info: &DragInfo) {
        self.point_widget.borrow_mut().continue_drag(info);
        let target = self.point_target();
        if let Some(command) = self.point_command.borrow_mut().as_mut() {
            command.new_target = target;
        }
    }

    /// Commits the change when the target moved.
    pub fn end_point_drag(&self) {
        self.point_widget.borrow_mut().end_drag();
        self.activation.borrow_mut().notify(&false);
        let command = self.point_command.borrow_mut().take();
        match command {
            Some(command) if command.new_target != command.old_target => {
                tracing::debug!("point target moved to {:?}", command.new_target.position);
                self.command_manager.borrow_mut().add_and_do(Box::new(command));
            }
            Some(_) => {}
            None => panic!("end_point_drag() without start_point_drag()"),
        }
    }

    pub fn start_edge_drag(&self, info: &DragInfo) {
        self.activation.borrow_mut().notify(&true);
        self.edge_widget.borrow_mut().start_drag(info);
        let target = self.edge_target();
        *self.edge_command.borrow_mut() = Some(ChangeEdgeTargetCommand::new(target, target));
        tracing::debug!("edge target drag started");
    }

    pub fn continue_edge_drag(&self, info: &DragInfo) {
        self.edge_widget.borrow_mut().continue_drag(info);
        let target = self.edge_target();
        if let Some(command) = self.edge_command.borrow_mut().as_mut() {
            command.new_target = target;
        }
    }

    pub fn end_edge_drag(&self) {
        self.edge_widget.borrow_mut().end_drag();
        self.activation.borrow_mut().notify(&false);
        let command = self.edge_command.borrow_mut().take();
        match command {
            Some(command) if command.new_target != command.old_target => {
                self.command_manager.borrow_mut().add_and_do(Box::new(command));
            }
            Some(_) => {}
            None => panic!("end_edge_drag() without start_edge_drag()"),
        }
    }

    /// Reverses the edge target as its own command, without activation.
    pub fn click_edge_target(&self) {
        let old_target = self.edge_target();
        let command = ChangeEdgeTargetCommand::new(old_target, old_target.reversed());
        self.command_manager.borrow_mut().add_and_do(Box::new(command));
    }
}
