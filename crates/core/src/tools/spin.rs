use std::rc::Rc;

use forma_scene::{
    are_close, are_directions_close, are_points_close, snap_to_axis, snap_to_bounds, CircleArc,
    ModelKind, Selection, Spin,
};

use super::{closest_direction, GripGuideType, GripInfo, Tool, ToolBase, ToolContext};
use crate::command::{ChangeSpinCommand, SpinCommandKind};
use crate::feedback::{AngularFeedback, Feedback, FeedbackId};
use crate::widgets::{DragInfo, DraggableWidget, SpinChange, SpinWidget};

const WIDGET: &str = "SpinWidget";
const ROTATOR: &str = "Rotator";
const RING: &str = "Ring";
const MIN_WIDGET_RADIUS: f32 = 0.5;
const MAX_WIDGET_RADIUS: f32 = 1.0e3;
const FEEDBACK_AXIS_OFFSET: f32 = 1.2;

/// Edits the spin of twisted or bent models with a [`SpinWidget`].
pub struct SpinBasedTool {
    base: ToolBase,
    kind: SpinCommandKind,
    widget: SpinWidget,
    stage_spin: Spin,
    start_stage_spin: Spin,
    command: Option<ChangeSpinCommand>,
    feedback: Option<FeedbackId<AngularFeedback>>,
    is_snapped: bool,
}

impl SpinBasedTool {
    pub fn twist(context: Rc<ToolContext>) -> Self {
        Self::new("TwistTool", SpinCommandKind::Twist, context)
    }

    pub fn bend(context: Rc<ToolContext>) -> Self {
        Self::new("BendTool", SpinCommandKind::Bend, context)
    }

    fn new(type_name: &'static str, kind: SpinCommandKind, context: Rc<ToolContext>) -> Self {
        let mut widget = SpinWidget::new();
        widget.set_grip_drag_scale(context.tuning().grip_drag_scale);
        Self {
            base: ToolBase::new(type_name, context),
            kind,
            widget,
            stage_spin: Spin::default(),
            start_stage_spin: Spin::default(),
            command: None,
            feedback: None,
            is_snapped: false,
        }
    }

    pub fn kind(&self) -> SpinCommandKind {
        self.kind
    }

    pub fn widget(&self) -> &SpinWidget {
        &self.widget
    }

    /// Current spin in stage coordinates, including snapping.
    pub fn stage_spin(&self) -> Spin {
        self.stage_spin
    }

    pub fn is_snapped(&self) -> bool {
        self.is_snapped
    }

    pub fn feedback(&self) -> Option<FeedbackId<AngularFeedback>> {
        self.feedback
    }

    fn snap_axis(&mut self) -> bool {
        let context = self.base.context();
        let targets = &context.target_manager;
        let axis = if targets.snap_to_direction(self.stage_spin.axis).is_some() {
            Some(targets.point_target().direction)
        } else {
            let tolerance = context.tuning().snap_direction_tolerance;
            snap_to_axis(self.stage_spin.axis, tolerance).map(|(_, axis)| axis)
        };
        match axis {
            Some(axis) => {
                self.stage_spin.axis = axis;
                true
            }
            None => false,
        }
    }

    /// Point target first, then the min, center and max of the model bounds
    /// in the dimensions the center can move in.
    fn snap_center(&mut self) -> bool {
        let start = self.start_stage_spin.center;
        let mut motion = self.stage_spin.center - start;
        let context = self.base.context();
        if context.target_manager.snap_to_point(start, &mut motion) {
            self.stage_spin.center = start + motion;
            return true;
        }

        let tolerance = context.tuning().snap_point_tolerance;
        let bounds = self.base.model().stage_bounds();
        let (snapped, dims) = snap_to_bounds(&bounds, self.stage_spin.center, tolerance);
        let axis = self.stage_spin.axis;
        let is_snapped = dims.dimensions().any(|dim| axis[dim].abs() < 0.999);
        if is_snapped {
            // Keep the center in the plane it is dragged in.
            self.stage_spin.center = snapped - axis * (snapped - start).dot(axis);
        }
        is_snapped
    }

    fn apply_precision(&mut self, change: SpinChange) {
        let precision = self.base.context().precision.get();
        match change {
            SpinChange::Angle => {
                self.stage_spin.angle = precision.apply_angle(self.stage_spin.angle);
            }
            SpinChange::Offset => {
                self.stage_spin.offset = precision.apply_linear(self.stage_spin.offset);
            }
            SpinChange::Axis | SpinChange::Center => {}
        }
    }

    fn update_angle_feedback(&mut self) {
        let spin = self.stage_spin;
        let color = self.base.neutral_color();
        let mut feedback_manager = self.base.context().feedback_manager.borrow_mut();
        let id = *self
            .feedback
            .get_or_insert_with(|| feedback_manager.activate::<AngularFeedback>());
        let feedback = feedback_manager.get_mut(id);
        feedback.set_color(color);
        feedback.subtend_arc(
            spin.center + FEEDBACK_AXIS_OFFSET * spin.axis,
            0.0,
            0.0,
            spin.axis,
            CircleArc::new(0.0, spin.angle),
        );
    }

    fn release_feedback(&mut self) {
        if let Some(id) = self.feedback.take() {
            self.base.context().feedback_manager.borrow_mut().deactivate(id);
        }
    }

    fn finish_drag(&mut self, commit: bool) {
        self.widget.end_drag();
        self.base.context().target_manager.end_snapping();
        self.release_feedback();
        self.base.notify_drag_ended();

        if let Some(command) = self.command.take() {
            let changed = commit && self.has_changed(&command.spin);
            self.base.commit_or_discard(command, changed);
        }
        self.is_snapped = false;
    }

    fn has_changed(&self, spin: &Spin) -> bool {
        let tuning = self.base.context().tuning();
        let start = &self.start_stage_spin;
        let distance = tuning.commit_distance_tolerance;
        let angle = tuning.commit_angle_tolerance;
        !are_points_close(spin.center, start.center, distance)
            || !are_directions_close(spin.axis, start.axis, angle)
            || !are_close(spin.angle, start.angle, angle)
            || !are_close(spin.offset, start.offset, distance)
    }
}

impl Tool for SpinBasedTool {
    fn base(&self) -> &ToolBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ToolBase {
        &mut self.base
    }

    fn is_specialized(&self) -> bool {
        true
    }

    fn can_attach(&self, selection: &Selection) -> bool {
        let kind = self.kind;
        self.base.are_selected_models(selection, |model| match kind {
            SpinCommandKind::Twist => matches!(model.kind, ModelKind::Twisted { .. }),
            SpinCommandKind::Bend => matches!(model.kind, ModelKind::Bent { .. }),
        })
    }

    fn attach(&mut self) {
        let model = self.base.model();
        let size = self.base.match_model_and_get_size(false);
        self.stage_spin = model.spin().unwrap_or_default().transformed(&model.matrix());

        let half_size = 0.5 * size.length();
        self.widget.set_offset_range(-half_size, half_size);
        self.widget
            .set_spin(self.stage_spin.transformed(&self.base.frame().inverse()));
        self.widget.set_size(ToolBase::part_scale(
            size,
            0.5,
            MIN_WIDGET_RADIUS,
            MAX_WIDGET_RADIUS,
        ));
    }

    fn detach(&mut self) {
        self.release_feedback();
    }

    fn update_grip_info(&self, info: &mut GripInfo) {
        let axis = self.stage_spin.axis;
        let max_angle = self.base.context().tuning().max_grip_hover_angle;
        let center = self.stage_spin.center;
        if closest_direction(info.guide_direction, &[axis, -axis], max_angle).is_some() {
            info.set_widget(GripGuideType::Basic, [WIDGET, ROTATOR], center);
        } else {
            info.set_widget(GripGuideType::Rotation, [WIDGET, RING], center);
        }
    }

    fn start_drag(&mut self, info: &DragInfo) {
        let frame_info = self.base.to_frame(info);
        self.widget.start_drag(&frame_info);
        self.start_stage_spin = self.stage_spin;
        self.base.context().target_manager.start_snapping();
    }

    fn continue_drag(&mut self, info: &DragInfo) {
        let frame_info = self.base.to_frame(info);
        self.widget.continue_drag(&frame_info);
        let Some(change) = self.widget.active_change() else {
            return;
        };
        self.stage_spin = self.widget.spin().transformed(&self.base.frame());

        if self.command.is_none() {
            self.command = Some(ChangeSpinCommand::new(
                self.kind,
                self.base.selection().model_names(),
                self.stage_spin,
            ));
            self.base.notify_drag_started();
        }

        self.is_snapped = false;
        if !info.is_modified_mode {
            self.is_snapped = match change {
                SpinChange::Axis => self.snap_axis(),
                SpinChange::Center => self.snap_center(),
                SpinChange::Angle | SpinChange::Offset => false,
            };
            if !self.is_snapped {
                self.apply_precision(change);
            }
        }

        if let Some(command) = self.command.as_mut() {
            command.spin = self.stage_spin;
            self.base
                .context()
                .command_manager
                .borrow_mut()
                .simulate_do(command);
        }
        if change == SpinChange::Angle {
            self.update_angle_feedback();
        }
    }

    fn end_drag(&mut self) {
        self.finish_drag(true);
        self.reattach_to_selection();
    }

    fn abort_drag(&mut self) {
        self.finish_drag(false);
    }

    fn is_dragging(&self) -> bool {
        self.widget.is_dragging()
    }
}
