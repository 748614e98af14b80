use std::rc::Rc;

use forma_scene::{
    are_close, min_outer_radius_for_inner, ModelKind, Selection, MIN_CYLINDER_RADIUS,
    MIN_TORUS_INNER_RADIUS,
};
use glam::{Vec2, Vec3};

use super::{closest_direction, GripGuideType, GripInfo, Tool, ToolBase, ToolContext};
use crate::command::{ChangeCylinderCommand, ChangeTorusCommand};
use crate::feedback::{Feedback, FeedbackId, LinearFeedback};
use crate::widgets::{DragInfo, DraggableWidget, ScaleMode, ScaleWidget};

const MIN_SLIDER: &str = "MinSlider";
const MAX_SLIDER: &str = "MaxSlider";

/// Symmetric scaler whose half length is a radius.
struct RadiusScaler {
    widget: ScaleWidget,
    origin: Vec3,
    /// Frame axis the radius is measured along.
    dim: usize,
}

/// Drag state shared by the cylinder and torus tools. Radii are in stage
/// units until the tool converts them for its command.
struct RadiusScalers {
    scalers: [RadiusScaler; 2],
    model_scale: Vec3,
    active: Option<usize>,
    start_radius: f32,
    feedback: Option<FeedbackId<LinearFeedback>>,
    is_snapped: bool,
}

impl RadiusScalers {
    fn new(context: &ToolContext, names: [&str; 2], dims: [usize; 2]) -> Self {
        let grip_drag_scale = context.tuning().grip_drag_scale;
        let make = |name: &str, dim: usize| {
            let mut widget = ScaleWidget::new(name);
            widget.set_mode(ScaleMode::Symmetric);
            widget.set_precision_based(true);
            widget.set_grip_drag_scale(grip_drag_scale);
            RadiusScaler {
                widget,
                origin: Vec3::ZERO,
                dim,
            }
        };
        Self {
            scalers: [make(names[0], dims[0]), make(names[1], dims[1])],
            model_scale: Vec3::ONE,
            active: None,
            start_radius: 0.0,
            feedback: None,
            is_snapped: false,
        }
    }

    /// Places scaler `index` on a line through `origin` along its axis,
    /// spanning `radius` on both sides.
    fn set_scaler(&mut self, index: usize, origin: Vec3, radius: f32, min_radius: f32, max_length: f32) {
        let scaler = &mut self.scalers[index];
        let direction = Vec3::AXES[scaler.dim];
        scaler.origin = origin;
        scaler.widget.set_limits(Vec2::new(2.0 * min_radius, max_length));
        scaler.widget.set_line(origin, direction);
        scaler.widget.set_span(-radius, radius);
    }

    fn widget(&self, index: usize) -> &ScaleWidget {
        &self.scalers[index].widget
    }

    fn start_drag(&mut self, base: &ToolBase, info: &DragInfo) {
        let found = info.outer_part().and_then(|name| {
            self.scalers
                .iter()
                .position(|scaler| scaler.widget.name() == name)
        });
        let Some(index) = found else {
            panic!("{}: no scaler for {:?}", base.type_name(), info.hit.path);
        };
        let widget = &mut self.scalers[index].widget;
        widget.start_drag(&base.to_frame(info));
        self.start_radius = 0.5 * widget.length();
        self.active = Some(index);
        base.context().target_manager.start_snapping();
    }

    /// Returns the active scaler and its new radius in object units after
    /// snapping.
    fn continue_drag(&mut self, base: &ToolBase, info: &DragInfo) -> (usize, f32) {
        let Some(index) = self.active else {
            panic!("{}: continue_drag() without start_drag()", base.type_name());
        };
        let widget = &mut self.scalers[index].widget;
        widget.continue_drag(&base.to_frame(info));
        let length = widget.length();
        let radius = self.snap_radius(base, 0.5 * length);
        self.update_feedback(base, index, radius);
        (index, radius / self.model_scale[self.scalers[index].dim])
    }

    /// Snaps the radius, then the diameter, to the edge target length, or
    /// rounds the radius to the linear precision.
    fn snap_radius(&mut self, base: &ToolBase, radius: f32) -> f32 {
        let context = base.context();
        let targets = &context.target_manager;
        self.is_snapped = true;
        if targets.snap_to_length(radius) {
            targets.edge_target().length()
        } else if targets.snap_to_length(2.0 * radius) {
            0.5 * targets.edge_target().length()
        } else {
            self.is_snapped = false;
            context.precision.get().apply_linear(radius)
        }
    }

    fn update_feedback(&mut self, base: &ToolBase, index: usize, radius: f32) {
        let scaler = &self.scalers[index];
        let start = base.to_stage_point(scaler.origin);
        let direction = base.to_stage_vector(Vec3::AXES[scaler.dim]);
        let color = if self.is_snapped {
            base.snapped_color()
        } else {
            base.neutral_color()
        };
        let mut feedback_manager = base.context().feedback_manager.borrow_mut();
        let id = *self
            .feedback
            .get_or_insert_with(|| feedback_manager.activate::<LinearFeedback>());
        let feedback = feedback_manager.get_mut(id);
        feedback.set_color(color);
        feedback.span_length(start, direction, radius);
    }

    fn release_feedback(&mut self, base: &ToolBase) {
        if let Some(id) = self.feedback.take() {
            base.context().feedback_manager.borrow_mut().deactivate(id);
        }
    }

    fn end_drag(&mut self, base: &ToolBase) -> usize {
        let Some(index) = self.active.take() else {
            panic!("{}: end_drag() without start_drag()", base.type_name());
        };
        self.scalers[index].widget.end_drag();
        base.context().target_manager.end_snapping();
        self.release_feedback(base);
        self.is_snapped = false;
        index
    }

    fn has_changed(&self, base: &ToolBase, index: usize, object_radius: f32) -> bool {
        let stage_radius = object_radius * self.model_scale[self.scalers[index].dim];
        let tolerance = base.context().tuning().commit_distance_tolerance;
        !are_close(stage_radius, self.start_radius, tolerance)
    }

    /// A guide along the positive axis of a scaler reaches its min handle;
    /// along the negative axis, its max handle.
    fn update_grip_info(&self, base: &ToolBase, info: &mut GripInfo) {
        let max_angle = base.context().tuning().max_grip_hover_angle;
        let candidates: Vec<Vec3> = self
            .scalers
            .iter()
            .flat_map(|scaler| {
                let axis = base.to_stage_vector(Vec3::AXES[scaler.dim]);
                [axis, -axis]
            })
            .collect();
        let Some(index) = closest_direction(info.guide_direction, &candidates, max_angle) else {
            info.clear_widget();
            return;
        };
        let scaler = &self.scalers[index / 2];
        let (slider, value) = if index % 2 == 0 {
            (MIN_SLIDER, scaler.widget.min_value())
        } else {
            (MAX_SLIDER, scaler.widget.max_value())
        };
        let point = scaler.origin + Vec3::AXES[scaler.dim] * value;
        info.set_widget(
            GripGuideType::Basic,
            [scaler.widget.name(), slider],
            base.to_stage_point(point),
        );
    }
}

fn max_length(context: &ToolContext) -> f32 {
    context.tuning().scale_widget_limits[1]
}

/// Changes the top radius (scaler along X at the top) or the bottom
/// radius (scaler along Z at the bottom) of cylinders.
pub struct CylinderTool {
    base: ToolBase,
    radii: RadiusScalers,
    command: Option<ChangeCylinderCommand>,
}

impl CylinderTool {
    pub fn new(context: Rc<ToolContext>) -> Self {
        let radii = RadiusScalers::new(&context, ["TopRadiusScaler", "BottomRadiusScaler"], [0, 2]);
        Self {
            base: ToolBase::new("CylinderTool", context),
            radii,
            command: None,
        }
    }

    pub fn top_scaler(&self) -> &ScaleWidget {
        self.radii.widget(0)
    }

    pub fn bottom_scaler(&self) -> &ScaleWidget {
        self.radii.widget(1)
    }

    pub fn is_snapped(&self) -> bool {
        self.radii.is_snapped
    }

    fn finish_drag(&mut self, commit: bool) {
        let index = self.radii.end_drag(&self.base);
        self.base.notify_drag_ended();
        if let Some(command) = self.command.take() {
            let changed = commit && self.radii.has_changed(&self.base, index, command.new_radius);
            self.base.commit_or_discard(command, changed);
        }
    }
}

impl Tool for CylinderTool {
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
        self.base
            .are_selected_models(selection, |model| matches!(model.kind, ModelKind::Cylinder { .. }))
    }

    fn attach(&mut self) {
        let model = self.base.model();
        self.base.match_model_and_get_size(false);
        let (top, bottom) = model.cylinder_radii().unwrap_or((1.0, 1.0));
        let scale = model.scale;
        let max_length = max_length(self.base.context());
        self.radii.model_scale = scale;
        self.radii.set_scaler(
            0,
            Vec3::new(0.0, scale.y, 0.0),
            top * scale.x,
            MIN_CYLINDER_RADIUS * scale.x,
            max_length,
        );
        self.radii.set_scaler(
            1,
            Vec3::new(0.0, -scale.y, 0.0),
            bottom * scale.z,
            MIN_CYLINDER_RADIUS * scale.z,
            max_length,
        );
    }

    fn detach(&mut self) {
        self.radii.release_feedback(&self.base);
    }

    fn update_grip_info(&self, info: &mut GripInfo) {
        self.radii.update_grip_info(&self.base, info);
    }

    fn start_drag(&mut self, info: &DragInfo) {
        self.radii.start_drag(&self.base, info);
    }

    fn continue_drag(&mut self, info: &DragInfo) {
        let (index, radius) = self.radii.continue_drag(&self.base, info);
        if self.command.is_none() {
            let names = self.base.selection().model_names();
            self.command = Some(ChangeCylinderCommand::new(names, index == 0, radius));
            self.base.notify_drag_started();
        }
        if let Some(command) = self.command.as_mut() {
            command.new_radius = radius;
            self.base
                .context()
                .command_manager
                .borrow_mut()
                .simulate_do(command);
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
        self.radii.active.is_some()
    }
}

/// Changes the inner radius (scaler along Y across the tube) or the outer
/// radius (scaler along X) of tori. Growing the inner radius may grow the
/// outer one to keep a hole.
pub struct TorusTool {
    base: ToolBase,
    radii: RadiusScalers,
    command: Option<ChangeTorusCommand>,
}

impl TorusTool {
    pub fn new(context: Rc<ToolContext>) -> Self {
        let radii = RadiusScalers::new(&context, ["InnerRadiusScaler", "OuterRadiusScaler"], [1, 0]);
        Self {
            base: ToolBase::new("TorusTool", context),
            radii,
            command: None,
        }
    }

    pub fn inner_scaler(&self) -> &ScaleWidget {
        self.radii.widget(0)
    }

    pub fn outer_scaler(&self) -> &ScaleWidget {
        self.radii.widget(1)
    }

    pub fn is_snapped(&self) -> bool {
        self.radii.is_snapped
    }

    fn finish_drag(&mut self, commit: bool) {
        let index = self.radii.end_drag(&self.base);
        self.base.notify_drag_ended();
        if let Some(command) = self.command.take() {
            let changed = commit && self.radii.has_changed(&self.base, index, command.new_radius);
            self.base.commit_or_discard(command, changed);
        }
    }
}

impl Tool for TorusTool {
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
        self.base
            .are_selected_models(selection, |model| matches!(model.kind, ModelKind::Torus { .. }))
    }

    fn attach(&mut self) {
        let model = self.base.model();
        self.base.match_model_and_get_size(false);
        let (inner, outer) = model.torus_radii().unwrap_or((0.5, 2.0));
        let scale = model.scale;
        let max_length = max_length(self.base.context());
        self.radii.model_scale = scale;
        self.radii.set_scaler(
            0,
            Vec3::new((outer - inner) * scale.x, 0.0, 0.0),
            inner * scale.y,
            MIN_TORUS_INNER_RADIUS * scale.y,
            max_length,
        );
        self.radii.set_scaler(
            1,
            Vec3::ZERO,
            outer * scale.x,
            min_outer_radius_for_inner(inner) * scale.x,
            max_length,
        );
    }

    fn detach(&mut self) {
        self.radii.release_feedback(&self.base);
    }

    fn update_grip_info(&self, info: &mut GripInfo) {
        self.radii.update_grip_info(&self.base, info);
    }

    fn start_drag(&mut self, info: &DragInfo) {
        self.radii.start_drag(&self.base, info);
    }

    fn continue_drag(&mut self, info: &DragInfo) {
        let (index, radius) = self.radii.continue_drag(&self.base, info);
        if self.command.is_none() {
            let names = self.base.selection().model_names();
            self.command = Some(ChangeTorusCommand::new(names, index == 0, radius));
            self.base.notify_drag_started();
        }
        if let Some(command) = self.command.as_mut() {
            command.new_radius = radius;
            self.base
                .context()
                .command_manager
                .borrow_mut()
                .simulate_do(command);
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
        self.radii.active.is_some()
    }
}
