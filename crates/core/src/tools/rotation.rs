use std::rc::Rc;

use forma_scene::{signed_angle_deg, CircleArc, Selection};
use glam::{Quat, Vec3};

use super::{closest_direction, GripGuideType, GripInfo, Tool, ToolBase, ToolContext};
use crate::command::RotateCommand;
use crate::feedback::{AngularFeedback, Feedback, FeedbackId};
use crate::widgets::{DiscWidget, DragInfo, DraggableWidget, SphereWidget};

const AXIS_ROTATORS: [&str; 3] = ["XAxisRotator", "YAxisRotator", "ZAxisRotator"];
const FREE_ROTATOR: &str = "FreeRotator";
const OUTER_RADIUS_SCALE: f32 = 0.51;
const FREE_RADIUS_SCALE: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rotator {
    Axis(usize),
    Free,
}

/// Rotates the selected models with a disc per frame axis and a free
/// rotation sphere. Drags that start in modified mode rotate each model
/// about its own position.
pub struct RotationTool {
    base: ToolBase,
    axis_rotators: [DiscWidget; 3],
    free_rotator: SphereWidget,
    outer_radius: f32,
    active: Option<Rotator>,
    is_in_place: bool,
    command: Option<RotateCommand>,
    feedback: Option<FeedbackId<AngularFeedback>>,
    is_snapped: bool,
}

impl RotationTool {
    pub fn new(context: Rc<ToolContext>) -> Self {
        Self {
            base: ToolBase::new("RotationTool", context),
            axis_rotators: AXIS_ROTATORS.map(DiscWidget::new),
            free_rotator: SphereWidget::new(FREE_ROTATOR),
            outer_radius: 1.0,
            active: None,
            is_in_place: false,
            command: None,
            feedback: None,
            is_snapped: false,
        }
    }

    pub fn axis_rotator(&self, dim: usize) -> &DiscWidget {
        &self.axis_rotators[dim]
    }

    pub fn free_rotator(&self) -> &SphereWidget {
        &self.free_rotator
    }

    pub fn outer_radius(&self) -> f32 {
        self.outer_radius
    }

    pub fn is_snapped(&self) -> bool {
        self.is_snapped
    }

    pub fn feedback(&self) -> Option<FeedbackId<AngularFeedback>> {
        self.feedback
    }

    fn active_widget_mut(&mut self, rotator: Rotator) -> &mut dyn DraggableWidget {
        match rotator {
            Rotator::Axis(dim) => &mut self.axis_rotators[dim],
            Rotator::Free => &mut self.free_rotator,
        }
    }

    /// Snaps the angle so one of the other frame axes lines up with the
    /// point target direction; otherwise rounds it to the angular
    /// precision.
    fn snap_angle(&mut self, dim: usize, stage_axis: Vec3, angle: f32) -> f32 {
        let context = self.base.context();
        let targets = &context.target_manager;
        self.is_snapped = false;
        if targets.is_point_target_visible() {
            let rotation = Quat::from_axis_angle(stage_axis, angle.to_radians());
            let frame_rotation = self.base.frame_rotation();
            for other in (0..3).filter(|other| *other != dim) {
                let start_dir = frame_rotation * Vec3::AXES[other];
                if targets.snap_to_direction(rotation * start_dir).is_some() {
                    self.is_snapped = true;
                    let target_dir = targets.point_target().direction;
                    return signed_angle_deg(start_dir, target_dir, stage_axis);
                }
            }
        }
        context.precision.get().apply_angle(angle)
    }

    fn update_feedback(&mut self, dim: usize, stage_axis: Vec3, angle: f32) {
        let center = self.base.frame_position();
        let color = self.base.feedback_color(dim, self.is_snapped);
        let mut feedback_manager = self.base.context().feedback_manager.borrow_mut();
        let id = *self
            .feedback
            .get_or_insert_with(|| feedback_manager.activate::<AngularFeedback>());
        let feedback = feedback_manager.get_mut(id);
        feedback.set_color(color);
        feedback.subtend_arc(
            center,
            0.0,
            self.outer_radius,
            stage_axis,
            CircleArc::new(0.0, angle),
        );
    }

    fn release_feedback(&mut self) {
        if let Some(id) = self.feedback.take() {
            self.base.context().feedback_manager.borrow_mut().deactivate(id);
        }
    }

    fn finish_drag(&mut self, commit: bool) {
        let Some(rotator) = self.active.take() else {
            panic!("RotationTool: end_drag() without start_drag()");
        };
        self.active_widget_mut(rotator).end_drag();
        self.base.context().target_manager.end_snapping();
        self.release_feedback();
        self.base.notify_drag_ended();

        if let Some(command) = self.command.take() {
            let tolerance = self.base.context().tuning().commit_angle_tolerance;
            let angle = command.rotation.angle_between(Quat::IDENTITY).to_degrees();
            self.base.commit_or_discard(command, commit && angle > tolerance);
        }
        self.is_snapped = false;
    }
}

impl Tool for RotationTool {
    fn base(&self) -> &ToolBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ToolBase {
        &mut self.base
    }

    fn can_attach(&self, selection: &Selection) -> bool {
        self.base.are_selected_models(selection, |_| true)
    }

    fn attach(&mut self) {
        let size = self.base.match_model_and_get_size(true);
        self.outer_radius = OUTER_RADIUS_SCALE * size.length();
        for (dim, rotator) in self.axis_rotators.iter_mut().enumerate() {
            rotator.set_geometry(Vec3::ZERO, Vec3::AXES[dim]);
            rotator.set_angle(0.0);
        }
        self.free_rotator
            .set_sphere(Vec3::ZERO, FREE_RADIUS_SCALE * self.outer_radius);
        self.free_rotator.set_rotation(Quat::IDENTITY);
    }

    fn detach(&mut self) {
        self.release_feedback();
    }

    /// A guide along either side of a frame axis hovers that axis rotator;
    /// anything else hovers the free rotator.
    fn update_grip_info(&self, info: &mut GripInfo) {
        let max_angle = self.base.context().tuning().max_grip_hover_angle;
        let candidates: Vec<Vec3> = Vec3::AXES
            .iter()
            .flat_map(|axis| {
                let axis = self.base.to_stage_vector(*axis);
                [axis, -axis]
            })
            .collect();
        let center = self.base.frame_position();
        match closest_direction(info.guide_direction, &candidates, max_angle) {
            Some(index) => {
                let dim = index / 2;
                info.set_widget(GripGuideType::Rotation, [AXIS_ROTATORS[dim]], center);
                info.color = Some(self.base.feedback_color(dim, false));
            }
            None => {
                info.set_widget(GripGuideType::Rotation, [FREE_ROTATOR], center);
                info.color = None;
            }
        }
    }

    fn start_drag(&mut self, info: &DragInfo) {
        let rotator = match info.outer_part() {
            Some(FREE_ROTATOR) => Rotator::Free,
            name => match AXIS_ROTATORS.iter().position(|axis| Some(*axis) == name) {
                Some(dim) => Rotator::Axis(dim),
                None => panic!("RotationTool: no rotator for {:?}", info.hit.path),
            },
        };
        let frame_info = self.base.to_frame(info);
        self.active_widget_mut(rotator).start_drag(&frame_info);
        self.active = Some(rotator);
        self.is_in_place = info.is_modified_mode;
        self.base.context().target_manager.start_snapping();
    }

    fn continue_drag(&mut self, info: &DragInfo) {
        let Some(rotator) = self.active else {
            panic!("RotationTool: continue_drag() without start_drag()");
        };
        let frame_info = self.base.to_frame(info);
        self.active_widget_mut(rotator).continue_drag(&frame_info);

        let rotation = match rotator {
            Rotator::Axis(dim) => {
                let stage_axis = self.base.to_stage_vector(Vec3::AXES[dim]);
                let drag_angle = self.axis_rotators[dim].drag_angle();
                let angle = self.snap_angle(dim, stage_axis, drag_angle);
                self.update_feedback(dim, stage_axis, angle);
                Quat::from_axis_angle(Vec3::AXES[dim], angle.to_radians())
            }
            Rotator::Free => self.free_rotator.drag_rotation(),
        };

        if self.command.is_none() {
            let mut command = RotateCommand::new(self.base.selection().model_names(), rotation);
            command.is_in_place = self.is_in_place;
            command.is_axis_aligned = self.base.context().is_axis_aligned();
            self.command = Some(command);
            self.base.notify_drag_started();
        }
        if let Some(command) = self.command.as_mut() {
            command.rotation = rotation;
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
        self.active.is_some()
    }
}
