use std::rc::Rc;

use forma_scene::Selection;
use glam::Vec3;

use super::{closest_direction, GripGuideType, GripInfo, Tool, ToolBase, ToolContext};
use crate::command::TranslateCommand;
use crate::feedback::{Feedback, FeedbackId, LinearFeedback};
use crate::widgets::{DragInfo, DraggableWidget, Slider1DWidget};

const SLIDERS: [&str; 3] = ["XSlider", "YSlider", "ZSlider"];
const SLIDER_RANGE: f32 = 1.0e4;

/// Translates the selected models with a slider along each frame axis.
/// The model center, bounds min and bounds max along the slider axis all
/// snap to the point target.
pub struct TranslationTool {
    base: ToolBase,
    sliders: [Slider1DWidget; 3],
    active: Option<usize>,
    /// Center, min and max of the primary model along the active axis.
    start_points: [Vec3; 3],
    command: Option<TranslateCommand>,
    feedback: Option<FeedbackId<LinearFeedback>>,
    is_snapped: bool,
}

impl TranslationTool {
    pub fn new(context: Rc<ToolContext>) -> Self {
        let grip_drag_scale = context.tuning().grip_drag_scale;
        let sliders = SLIDERS.map(|name| {
            let mut slider = Slider1DWidget::new(name);
            slider.set_range(-SLIDER_RANGE, SLIDER_RANGE);
            slider.set_precision_based(true);
            slider.set_grip_drag_scale(grip_drag_scale);
            slider
        });
        Self {
            base: ToolBase::new("TranslationTool", context),
            sliders,
            active: None,
            start_points: [Vec3::ZERO; 3],
            command: None,
            feedback: None,
            is_snapped: false,
        }
    }

    pub fn slider(&self, dim: usize) -> &Slider1DWidget {
        &self.sliders[dim]
    }

    pub fn is_snapped(&self) -> bool {
        self.is_snapped
    }

    pub fn feedback(&self) -> Option<FeedbackId<LinearFeedback>> {
        self.feedback
    }

    /// Snaps the first start point that lands on the point target, or
    /// rounds the motion length to the linear precision.
    fn snap_motion(&mut self, motion: Vec3) -> Vec3 {
        let context = self.base.context();
        for start in self.start_points {
            let mut snapped = motion;
            if context.target_manager.snap_to_point(start, &mut snapped) {
                self.is_snapped = true;
                return snapped;
            }
        }
        self.is_snapped = false;
        let length = motion.length();
        if length <= f32::EPSILON {
            return motion;
        }
        motion * (context.precision.get().apply_linear(length) / length)
    }

    fn update_feedback(&mut self, dim: usize, motion: Vec3) {
        let direction = self.base.to_stage_vector(Vec3::AXES[dim]);
        let length = motion.dot(direction);
        let start = self.start_points[0];
        let color = self.base.feedback_color(dim, self.is_snapped);
        let mut feedback_manager = self.base.context().feedback_manager.borrow_mut();
        let id = *self
            .feedback
            .get_or_insert_with(|| feedback_manager.activate::<LinearFeedback>());
        let feedback = feedback_manager.get_mut(id);
        feedback.set_color(color);
        feedback.span_length(start, direction, length);
    }

    fn release_feedback(&mut self) {
        if let Some(id) = self.feedback.take() {
            self.base.context().feedback_manager.borrow_mut().deactivate(id);
        }
    }

    fn finish_drag(&mut self, commit: bool) {
        let Some(dim) = self.active.take() else {
            panic!("TranslationTool: end_drag() without start_drag()");
        };
        self.sliders[dim].end_drag();
        self.base.context().target_manager.end_snapping();
        self.release_feedback();
        self.base.notify_drag_ended();

        if let Some(command) = self.command.take() {
            let changed = commit && command.translation != Vec3::ZERO;
            self.base.commit_or_discard(command, changed);
        }
        self.is_snapped = false;
    }
}

impl Tool for TranslationTool {
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
        self.base.match_model_and_get_size(true);
        for (dim, slider) in self.sliders.iter_mut().enumerate() {
            slider.set_line(Vec3::ZERO, Vec3::AXES[dim]);
            slider.set_value(0.0);
        }
    }

    fn detach(&mut self) {
        self.release_feedback();
    }

    fn update_grip_info(&self, info: &mut GripInfo) {
        let max_angle = self.base.context().tuning().max_grip_hover_angle;
        let candidates: Vec<Vec3> = Vec3::AXES
            .iter()
            .flat_map(|axis| {
                let axis = self.base.to_stage_vector(*axis);
                [axis, -axis]
            })
            .collect();
        match closest_direction(info.guide_direction, &candidates, max_angle) {
            Some(index) => {
                let dim = index / 2;
                let center = self.base.frame_position();
                info.set_widget(GripGuideType::Basic, [SLIDERS[dim]], center);
                info.color = Some(self.base.feedback_color(dim, false));
            }
            None => info.clear_widget(),
        }
    }

    fn start_drag(&mut self, info: &DragInfo) {
        let found = info
            .outer_part()
            .and_then(|name| SLIDERS.iter().position(|slider| *slider == name));
        let Some(dim) = found else {
            panic!("TranslationTool: no slider for {:?}", info.hit.path);
        };
        let model = self.base.model();
        let bounds = self.base.model_bounds_in_frame(&model);
        let center = bounds.center();
        let mut min = center;
        min[dim] = bounds.min[dim];
        let mut max = center;
        max[dim] = bounds.max[dim];
        self.start_points = [center, min, max].map(|point| self.base.to_stage_point(point));

        let frame_info = self.base.to_frame(info);
        self.sliders[dim].start_drag(&frame_info);
        self.active = Some(dim);
        self.base.context().target_manager.start_snapping();
    }

    fn continue_drag(&mut self, info: &DragInfo) {
        let Some(dim) = self.active else {
            panic!("TranslationTool: continue_drag() without start_drag()");
        };
        let frame_info = self.base.to_frame(info);
        let slider = &mut self.sliders[dim];
        slider.continue_drag(&frame_info);
        let distance = slider.value() - slider.start_value();
        let motion = self.base.to_stage_vector(Vec3::AXES[dim]) * distance;
        let motion = self.snap_motion(motion);

        if self.command.is_none() {
            let names = self.base.selection().model_names();
            self.command = Some(TranslateCommand::new(names, motion));
            self.base.notify_drag_started();
        }
        if let Some(command) = self.command.as_mut() {
            command.translation = motion;
            self.base
                .context()
                .command_manager
                .borrow_mut()
                .simulate_do(command);
        }
        self.update_feedback(dim, motion);
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
