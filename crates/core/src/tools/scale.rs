use std::rc::Rc;

use forma_scene::{Dimensionality, Selection};
use glam::{Vec2, Vec3};

use super::{closest_direction, GripGuideType, GripInfo, Tool, ToolBase, ToolContext};
use crate::command::{ScaleCommand, ScaleSide};
use crate::feedback::{Feedback, FeedbackId, LinearFeedback};
use crate::widgets::{DragInfo, DraggableWidget, ScaleMode, ScaleWidget};

const MIN_SLIDER: &str = "MinSlider";
const MAX_SLIDER: &str = "MaxSlider";

/// One scaler per frame axis, then the uniform scaler (`dim` is `None`).
struct Scaler {
    dim: Option<usize>,
    widget: ScaleWidget,
}

impl Scaler {
    fn dims(&self) -> Dimensionality {
        match self.dim {
            Some(dim) => {
                let mut dims = Dimensionality::new();
                dims.add_dimension(dim);
                dims
            }
            None => Dimensionality::from_letters("XYZ"),
        }
    }
}

/// Scales the selected models with one [`ScaleWidget`] per frame axis
/// and a uniform scaler along the model diagonal. A drag that starts in
/// modified mode scales symmetrically about the center.
pub struct ScaleTool {
    base: ToolBase,
    scalers: Vec<Scaler>,
    active: Option<usize>,
    start_size: Vec3,
    start_length: f32,
    command: Option<ScaleCommand>,
    feedback: Option<FeedbackId<LinearFeedback>>,
    is_snapped: bool,
}

impl ScaleTool {
    pub fn new(context: Rc<ToolContext>) -> Self {
        let (limits, grip_drag_scale) = {
            let tuning = context.tuning();
            (Vec2::from(tuning.scale_widget_limits), tuning.grip_drag_scale)
        };
        let scalers = [
            ("XScaler", Some(0)),
            ("YScaler", Some(1)),
            ("ZScaler", Some(2)),
            ("XYZScaler", None),
        ]
        .into_iter()
        .map(|(name, dim)| {
            let mut widget = ScaleWidget::new(name);
            widget.set_use_modified_mode(true);
            widget.set_precision_based(true);
            widget.set_grip_drag_scale(grip_drag_scale);
            widget.set_limits(limits);
            Scaler { dim, widget }
        })
        .collect();
        Self {
            base: ToolBase::new("ScaleTool", context),
            scalers,
            active: None,
            start_size: Vec3::ONE,
            start_length: 1.0,
            command: None,
            feedback: None,
            is_snapped: false,
        }
    }

    /// Scaler widget by name, such as `"XScaler"`.
    pub fn scaler(&self, name: &str) -> Option<&ScaleWidget> {
        self.scalers
            .iter()
            .find(|scaler| scaler.widget.name() == name)
            .map(|scaler| &scaler.widget)
    }

    pub fn is_snapped(&self) -> bool {
        self.is_snapped
    }

    pub fn feedback(&self) -> Option<FeedbackId<LinearFeedback>> {
        self.feedback
    }

    fn release_feedback(&mut self) {
        if let Some(id) = self.feedback.take() {
            self.base.context().feedback_manager.borrow_mut().deactivate(id);
        }
    }

    fn finish_drag(&mut self, commit: bool) {
        let Some(index) = self.active.take() else {
            panic!("ScaleTool: end_drag() without start_drag()");
        };
        self.scalers[index].widget.end_drag();
        self.base.context().target_manager.end_snapping();
        self.release_feedback();
        self.base.notify_drag_ended();

        if let Some(command) = self.command.take() {
            let changed = commit && command.ratios != Vec3::ONE;
            self.base.commit_or_discard(command, changed);
        }
        self.is_snapped = false;
    }

    /// Ratio after snapping the new sizes to the edge target length, or
    /// rounding the first size to the linear precision.
    fn snapped_ratio(&mut self, dims: Dimensionality, ratio: f32) -> f32 {
        let start_size = self.start_size;
        let context = self.base.context();
        let snapped = context
            .target_manager
            .snap_dims_to_length(dims, start_size * ratio);
        self.is_snapped = !snapped.is_empty();

        let first = snapped.dimensions().next().or_else(|| dims.dimensions().next());
        let Some(dim) = first else {
            return ratio;
        };
        if start_size[dim] <= f32::EPSILON {
            return ratio;
        }
        let size = if self.is_snapped {
            context.target_manager.edge_target().length()
        } else {
            context.precision.get().apply_linear(start_size[dim] * ratio)
        };
        size / start_size[dim]
    }

    fn update_feedback(&mut self, index: usize, ratio: f32) {
        let scaler = &self.scalers[index];
        let direction = scaler.widget.direction();
        let start = self
            .base
            .to_stage_point(direction * scaler.widget.min_value());
        let stage_direction = self.base.to_stage_vector(direction);
        let length = self.start_length * ratio;
        let color = match scaler.dim {
            Some(dim) => self.base.feedback_color(dim, self.is_snapped),
            None if self.is_snapped => self.base.snapped_color(),
            None => self.base.neutral_color(),
        };

        let mut feedback_manager = self.base.context().feedback_manager.borrow_mut();
        let id = *self
            .feedback
            .get_or_insert_with(|| feedback_manager.activate::<LinearFeedback>());
        let feedback = feedback_manager.get_mut(id);
        feedback.set_color(color);
        feedback.span_length(start, stage_direction, length);
    }
}

impl Tool for ScaleTool {
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
        let model = self.base.model();
        let size = self.base.match_model_and_get_size(true);
        let bounds = self.base.model_bounds_in_frame(&model);
        let diagonal = if size.length_squared() > 0.0 {
            size.normalize()
        } else {
            Vec3::ONE.normalize()
        };
        for scaler in &mut self.scalers {
            let direction = match scaler.dim {
                Some(dim) => Vec3::AXES[dim],
                None => diagonal,
            };
            scaler.widget.set_line(Vec3::ZERO, direction);
            scaler
                .widget
                .set_span(bounds.min.dot(direction), bounds.max.dot(direction));
        }
    }

    fn detach(&mut self) {
        self.release_feedback();
    }

    /// The guide picks the closest axis of the tool frame. A guide along
    /// the positive axis reaches the min handle from the far side.
    fn update_grip_info(&self, info: &mut GripInfo) {
        let max_angle = self.base.context().tuning().max_grip_hover_angle;
        let candidates: Vec<Vec3> = Vec3::AXES
            .iter()
            .flat_map(|axis| {
                let axis = self.base.to_stage_vector(*axis);
                [axis, -axis]
            })
            .collect();
        let Some(index) = closest_direction(info.guide_direction, &candidates, max_angle) else {
            info.clear_widget();
            return;
        };
        let dim = index / 2;
        let widget = &self.scalers[dim].widget;
        let (slider, value) = if index % 2 == 0 {
            (MIN_SLIDER, widget.min_value())
        } else {
            (MAX_SLIDER, widget.max_value())
        };
        let target = self.base.to_stage_point(widget.direction() * value);
        info.set_widget(GripGuideType::Basic, [widget.name(), slider], target);
        info.color = Some(self.base.feedback_color(dim, false));
    }

    fn start_drag(&mut self, info: &DragInfo) {
        let found = info.outer_part().and_then(|name| {
            self.scalers
                .iter()
                .position(|scaler| scaler.widget.name() == name)
        });
        let Some(index) = found else {
            panic!("ScaleTool: no scaler for {:?}", info.hit.path);
        };
        let model = self.base.model();
        self.start_size = self.base.model_bounds_in_frame(&model).size();

        let frame_info = self.base.to_frame(info);
        let widget = &mut self.scalers[index].widget;
        widget.start_drag(&frame_info);
        self.start_length = widget.length();
        self.active = Some(index);
        self.base.context().target_manager.start_snapping();
    }

    fn continue_drag(&mut self, info: &DragInfo) {
        let Some(index) = self.active else {
            panic!("ScaleTool: continue_drag() without start_drag()");
        };
        let frame_info = self.base.to_frame(info);
        let scaler = &mut self.scalers[index];
        scaler.widget.continue_drag(&frame_info);
        let dims = scaler.dims();
        let side = match (scaler.widget.mode(), scaler.widget.active_is_max()) {
            (ScaleMode::Symmetric, _) => ScaleSide::Center,
            (ScaleMode::Asymmetric, Some(true)) => ScaleSide::Max,
            (ScaleMode::Asymmetric, _) => ScaleSide::Min,
        };
        let length = scaler.widget.length();
        if self.start_length <= f32::EPSILON {
            return;
        }

        let ratio = self.snapped_ratio(dims, length / self.start_length);
        let mut ratios = Vec3::ONE;
        for dim in dims.dimensions() {
            ratios[dim] = ratio;
        }

        if self.command.is_none() {
            let names = self.base.selection().model_names();
            self.command = Some(ScaleCommand::new(names, ratios, side));
            self.base.notify_drag_started();
        }
        if let Some(command) = self.command.as_mut() {
            command.ratios = ratios;
            command.side = side;
            self.base
                .context()
                .command_manager
                .borrow_mut()
                .simulate_do(command);
        }
        self.update_feedback(index, ratio);
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
