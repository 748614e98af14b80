use std::rc::Rc;

use forma_scene::{are_close, are_directions_close, snap_to_axis, Model, ModelKind, Plane, Selection};
use glam::Vec3;

use super::{closest_direction, GripGuideType, GripInfo, Tool, ToolBase, ToolContext};
use crate::command::{ChangePlaneCommand, PlaneCommandKind};
use crate::feedback::{Feedback, FeedbackId, LinearFeedback};
use crate::widgets::{DragInfo, DraggableWidget, PlaneWidget};

const WIDGET: &str = "PlaneWidget";
const ROTATOR: &str = "Rotator";
const TRANSLATOR: &str = "Translator";
const MIN_WIDGET_RADIUS: f32 = 0.5;
const MAX_WIDGET_RADIUS: f32 = 1.0e3;

/// Edits the plane of clipped or mirrored models with a [`PlaneWidget`].
/// The plane is kept in stage coordinates; the widget shows it in the tool
/// frame.
pub struct PlaneBasedTool {
    base: ToolBase,
    kind: PlaneCommandKind,
    widget: PlaneWidget,
    stage_plane: Plane,
    start_stage_plane: Plane,
    stage_center: Vec3,
    command: Option<ChangePlaneCommand>,
    feedback: Option<FeedbackId<LinearFeedback>>,
    is_snapped: bool,
}

impl PlaneBasedTool {
    pub fn clip(context: Rc<ToolContext>) -> Self {
        Self::new("ClipTool", PlaneCommandKind::Clip, context)
    }

    pub fn mirror(context: Rc<ToolContext>) -> Self {
        Self::new("MirrorTool", PlaneCommandKind::Mirror, context)
    }

    fn new(type_name: &'static str, kind: PlaneCommandKind, context: Rc<ToolContext>) -> Self {
        let mut widget = PlaneWidget::new();
        widget.set_grip_drag_scale(context.tuning().grip_drag_scale);
        Self {
            base: ToolBase::new(type_name, context),
            kind,
            widget,
            stage_plane: Plane::default(),
            start_stage_plane: Plane::default(),
            stage_center: Vec3::ZERO,
            command: None,
            feedback: None,
            is_snapped: false,
        }
    }

    pub fn kind(&self) -> PlaneCommandKind {
        self.kind
    }

    pub fn widget(&self) -> &PlaneWidget {
        &self.widget
    }

    /// Current plane in stage coordinates, including snapping.
    pub fn stage_plane(&self) -> Plane {
        self.stage_plane
    }

    pub fn is_snapped(&self) -> bool {
        self.is_snapped
    }

    pub fn feedback(&self) -> Option<FeedbackId<LinearFeedback>> {
        self.feedback
    }

    fn stage_plane_from_widget(&self) -> Plane {
        self.widget.plane().transformed(&self.base.frame())
    }

    fn update_widget_plane(&mut self) {
        let plane = self.stage_plane.transformed(&self.base.frame().inverse());
        if self.widget.is_dragging() {
            self.widget.show_plane_during_drag(plane);
        } else {
            self.widget.set_plane(plane);
        }
    }

    /// Clip planes stay within the model; mirror planes may move one model
    /// length beyond it on either side.
    fn update_translation_range(&mut self, model: &Model) {
        let bounds = self.base.model_bounds_in_frame(model);
        let normal = self.base.to_frame_vector(self.stage_plane.normal);
        let (min, max) = bounds.range_along(normal);
        let (min, max) = match self.kind {
            PlaneCommandKind::Clip => (min, max),
            PlaneCommandKind::Mirror => {
                let size = max - min;
                (min - size, max + size)
            }
        };
        self.widget.set_translation_range(min, max);
    }

    /// Point target direction first, then the principal axes. A snapped
    /// plane keeps its starting distance from the model center.
    fn snap_rotation(&mut self) -> bool {
        let context = self.base.context();
        let targets = &context.target_manager;
        let normal = if targets.snap_to_direction(self.stage_plane.normal).is_some() {
            Some(targets.point_target().direction)
        } else {
            let tolerance = context.tuning().snap_direction_tolerance;
            snap_to_axis(self.stage_plane.normal, tolerance).map(|(_, axis)| axis)
        };
        let Some(normal) = normal else {
            return false;
        };
        let distance = self.start_stage_plane.signed_distance(self.stage_center);
        self.stage_plane = Plane::from_point_normal(self.stage_center - distance * normal, normal);
        true
    }

    /// Snaps to the point target or the model center, whichever is closer.
    fn snap_translation(&mut self) -> bool {
        let context = self.base.context();
        let targets = &context.target_manager;
        let mut distance = self.stage_plane.signed_distance(self.stage_center);
        if targets.is_point_target_visible() {
            let target_distance = self
                .stage_plane
                .signed_distance(targets.point_target().position);
            if target_distance.abs() < distance.abs() {
                distance = target_distance;
            }
        }
        let is_snapped = distance.abs() <= context.tuning().snap_point_tolerance;
        if is_snapped {
            self.stage_plane.distance += distance;
        }
        is_snapped
    }

    /// Spans from the model point farthest behind the plane to the plane.
    fn update_translation_feedback(&mut self) {
        let model = self.base.model();
        let normal = self.stage_plane.normal;
        let start = model
            .stage_bounds()
            .corners()
            .into_iter()
            .min_by(|a, b| a.dot(normal).total_cmp(&b.dot(normal)))
            .unwrap_or(self.stage_center);
        let length = (self.stage_plane.point() - start).dot(normal);
        let color = if self.is_snapped {
            self.base.snapped_color()
        } else {
            self.base.neutral_color()
        };

        let mut feedback_manager = self.base.context().feedback_manager.borrow_mut();
        let id = *self
            .feedback
            .get_or_insert_with(|| feedback_manager.activate::<LinearFeedback>());
        let feedback = feedback_manager.get_mut(id);
        feedback.set_color(color);
        feedback.span_length(start, normal, length);
    }

    fn release_feedback(&mut self) {
        if let Some(id) = self.feedback.take() {
            self.base.context().feedback_manager.borrow_mut().deactivate(id);
        }
    }

    /// Ends the widget drag, committing the command only when `commit`
    /// is set and the plane moved.
    fn finish_drag(&mut self, commit: bool) {
        self.widget.end_drag();
        self.base.context().target_manager.end_snapping();
        self.release_feedback();
        self.base.notify_drag_ended();

        if let Some(command) = self.command.take() {
            let changed = commit && self.has_changed(&command.plane);
            self.base.commit_or_discard(command, changed);
        }
        self.is_snapped = false;
    }

    fn has_changed(&self, plane: &Plane) -> bool {
        let tuning = self.base.context().tuning();
        let start = &self.start_stage_plane;
        !are_close(plane.distance, start.distance, tuning.commit_distance_tolerance)
            || !are_directions_close(plane.normal, start.normal, tuning.commit_angle_tolerance)
    }
}

impl Tool for PlaneBasedTool {
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
            PlaneCommandKind::Clip => matches!(model.kind, ModelKind::Clipped { .. }),
            PlaneCommandKind::Mirror => matches!(model.kind, ModelKind::Mirrored { .. }),
        })
    }

    fn attach(&mut self) {
        let model = self.base.model();
        let size = self.base.match_model_and_get_size(true);
        self.widget.set_size(ToolBase::part_scale(
            size,
            0.5,
            MIN_WIDGET_RADIUS,
            MAX_WIDGET_RADIUS,
        ));
        self.stage_plane = model.plane().unwrap_or_default().transformed(&model.matrix());
        self.update_translation_range(&model);
        self.update_widget_plane();
    }

    fn detach(&mut self) {
        self.release_feedback();
    }

    /// A guide along either side of the normal hovers the translator;
    /// anything else hovers the rotator.
    fn update_grip_info(&self, info: &mut GripInfo) {
        let normal = self.stage_plane.normal;
        let max_angle = self.base.context().tuning().max_grip_hover_angle;
        let center = self.base.frame_position();
        if closest_direction(info.guide_direction, &[normal, -normal], max_angle).is_some() {
            let target = self.stage_plane.project_point(center);
            info.set_widget(GripGuideType::Basic, [WIDGET, TRANSLATOR], target);
        } else {
            info.set_widget(GripGuideType::Rotation, [WIDGET, ROTATOR], center);
        }
    }

    fn start_drag(&mut self, info: &DragInfo) {
        let frame_info = self.base.to_frame(info);
        self.widget.start_drag(&frame_info);
        self.stage_plane = self.stage_plane_from_widget();
        self.start_stage_plane = self.stage_plane;
        self.stage_center = self.base.frame_position();
        self.base.context().target_manager.start_snapping();
    }

    fn continue_drag(&mut self, info: &DragInfo) {
        let frame_info = self.base.to_frame(info);
        self.widget.continue_drag(&frame_info);
        let is_rotation = self.widget.active_part() == Some(ROTATOR);
        self.stage_plane = self.stage_plane_from_widget();

        if self.command.is_none() {
            self.command = Some(ChangePlaneCommand::new(
                self.kind,
                self.base.selection().model_names(),
                self.stage_plane,
            ));
            self.base.notify_drag_started();
        }

        self.is_snapped = !info.is_modified_mode
            && if is_rotation {
                self.snap_rotation()
            } else {
                self.snap_translation()
            };
        if self.is_snapped {
            self.update_widget_plane();
        }

        if let Some(command) = self.command.as_mut() {
            command.plane = self.stage_plane;
            self.base
                .context()
                .command_manager
                .borrow_mut()
                .simulate_do(command);
        }
        if !is_rotation {
            self.update_translation_feedback();
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
