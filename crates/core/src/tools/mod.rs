//! Tools attach to the selection and turn widget drags into commands.
//!
//! A tool owns its widgets. Drags arrive in stage coordinates and are
//! forwarded into the tool frame, which follows the attached model's
//! position and (unless axis-aligned) its rotation. Each drag lazily
//! creates one command on the first change, previews it with
//! [`CommandManager::simulate_do`] and commits it on drag end only when the
//! value actually changed.

mod plane;
mod radius;
mod rotation;
mod scale;
mod spin;
mod translation;

#[cfg(test)]
mod tests;

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use forma_scene::{are_directions_close, Bounds, CoordConv, Model, ModelStore, Selection};
use glam::{Mat4, Quat, Vec3};

use crate::command::{Command, CommandManager};
use crate::feedback::FeedbackManager;
use crate::notifier::Notifier;
use crate::precision::PrecisionStore;
use crate::targets::TargetManager;
use crate::tuning::{Color, Tuning};
use crate::widgets::DragInfo;

pub use plane::PlaneBasedTool;
pub use radius::{CylinderTool, TorusTool};
pub use rotation::RotationTool;
pub use scale::ScaleTool;
pub use spin::SpinBasedTool;
pub use translation::TranslationTool;

/// Managers and stores shared by every tool.
pub struct ToolContext {
    pub models: Rc<RefCell<ModelStore>>,
    pub command_manager: Rc<RefCell<CommandManager>>,
    pub target_manager: Rc<TargetManager>,
    pub feedback_manager: Rc<RefCell<FeedbackManager>>,
    pub precision: Cell<PrecisionStore>,
}

impl ToolContext {
    pub fn new(
        models: Rc<RefCell<ModelStore>>,
        command_manager: Rc<RefCell<CommandManager>>,
        target_manager: Rc<TargetManager>,
        feedback_manager: Rc<RefCell<FeedbackManager>>,
    ) -> Self {
        Self {
            models,
            command_manager,
            target_manager,
            feedback_manager,
            precision: Cell::new(PrecisionStore::default()),
        }
    }

    pub fn tuning(&self) -> Ref<'_, Tuning> {
        self.target_manager.tuning()
    }

    /// Session flag that aligns tools with the stage axes.
    pub fn is_axis_aligned(&self) -> bool {
        self.command_manager
            .borrow()
            .session_state()
            .is_some_and(|state| state.axis_aligned)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GripGuideType {
    #[default]
    None,
    Basic,
    Rotation,
}

/// Result of a grip hover query.
#[derive(Debug, Clone, PartialEq)]
pub struct GripInfo {
    /// Controller guide direction in stage coordinates.
    pub guide_direction: Vec3,
    pub guide_type: GripGuideType,
    /// Hit path a grip drag would start with. Empty when nothing is hovered.
    pub widget_path: Vec<String>,
    pub target_point: Vec3,
    pub color: Option<Color>,
}

impl GripInfo {
    pub fn new(guide_direction: Vec3) -> Self {
        Self {
            guide_direction,
            guide_type: GripGuideType::None,
            widget_path: Vec::new(),
            target_point: Vec3::ZERO,
            color: None,
        }
    }

    pub fn set_widget<S: Into<String>>(
        &mut self,
        guide_type: GripGuideType,
        path: impl IntoIterator<Item = S>,
        target_point: Vec3,
    ) {
        self.guide_type = guide_type;
        self.widget_path = path.into_iter().map(Into::into).collect();
        self.target_point = target_point;
    }

    pub fn clear_widget(&mut self) {
        self.guide_type = GripGuideType::None;
        self.widget_path.clear();
    }
}

/// Index of the first candidate within `max_angle` degrees of `guide`.
pub(crate) fn closest_direction(guide: Vec3, candidates: &[Vec3], max_angle: f32) -> Option<usize> {
    candidates
        .iter()
        .position(|candidate| are_directions_close(guide, *candidate, max_angle))
}

pub type CompletionFunc = Box<dyn FnMut()>;

/// Attachment state shared by all tools.
pub struct ToolBase {
    type_name: &'static str,
    context: Rc<ToolContext>,
    selection: Selection,
    model_index: Option<usize>,
    frame: Mat4,
    drag_started: Notifier<str>,
    drag_ended: Notifier<str>,
    completion: Option<CompletionFunc>,
}

impl ToolBase {
    pub fn new(type_name: &'static str, context: Rc<ToolContext>) -> Self {
        Self {
            type_name,
            context,
            selection: Selection::new(),
            model_index: None,
            frame: Mat4::IDENTITY,
            drag_started: Notifier::new(),
            drag_ended: Notifier::new(),
            completion: None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn context(&self) -> &ToolContext {
        &self.context
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_attached(&self) -> bool {
        self.model_index.is_some()
    }

    /// Notified with the tool type name when a drag changes something.
    pub fn drag_started(&mut self) -> &mut Notifier<str> {
        &mut self.drag_started
    }

    pub fn drag_ended(&mut self) -> &mut Notifier<str> {
        &mut self.drag_ended
    }

    pub(crate) fn notify_drag_started(&mut self) {
        self.drag_started.notify(self.type_name);
    }

    pub(crate) fn notify_drag_ended(&mut self) {
        self.drag_ended.notify(self.type_name);
    }

    pub fn set_completion_func(&mut self, func: impl FnMut() + 'static) {
        self.completion = Some(Box::new(func));
    }

    fn set_selection(&mut self, selection: &Selection, index: usize) {
        self.selection = selection.clone();
        self.model_index = Some(index);
    }

    fn clear_selection(&mut self) {
        self.selection = Selection::new();
        self.model_index = None;
    }

    pub fn model_name(&self) -> &str {
        let name = self
            .model_index
            .and_then(|index| self.selection.paths().get(index))
            .and_then(|path| path.model_name());
        match name {
            Some(name) => name,
            None => panic!("{} is not attached to a model", self.type_name),
        }
    }

    /// Copy of the model the tool is attached to.
    pub fn model(&self) -> Model {
        let name = self.model_name();
        match self.context.models.borrow().get(name) {
            Ok(model) => model.clone(),
            Err(err) => panic!("{}: {err}", self.type_name),
        }
    }

    /// True when every selected model exists and passes `accept`.
    pub fn are_selected_models(&self, selection: &Selection, accept: impl Fn(&Model) -> bool) -> bool {
        let models = self.context.models.borrow();
        selection
            .model_names()
            .iter()
            .all(|name| models.get(name).is_ok_and(&accept))
    }

    /// Tool frame to stage matrix. Tools are never scaled.
    pub fn frame(&self) -> Mat4 {
        self.frame
    }

    pub fn frame_rotation(&self) -> Quat {
        self.frame.to_scale_rotation_translation().1
    }

    pub fn frame_position(&self) -> Vec3 {
        self.frame.w_axis.truncate()
    }

    /// Places the tool frame on the attached model and returns the model
    /// size in that frame. With `allow_axis_aligned` the frame drops the
    /// model rotation while the session is axis-aligned.
    pub fn match_model_and_get_size(&mut self, allow_axis_aligned: bool) -> Vec3 {
        let model = self.model();
        let is_aligned = allow_axis_aligned && self.context.is_axis_aligned();
        let rotation = if is_aligned {
            Quat::IDENTITY
        } else {
            model.rotation
        };
        self.frame = Mat4::from_rotation_translation(rotation, model.translation);
        self.model_bounds_in_frame(&model).size()
    }

    /// Bounds of `model` in the tool frame.
    pub fn model_bounds_in_frame(&self, model: &Model) -> Bounds {
        model
            .bounds()
            .transformed(&(self.frame.inverse() * model.matrix()))
    }

    /// Drag sample converted into the tool frame.
    pub fn to_frame(&self, info: &DragInfo) -> DragInfo {
        let parent = info.coord_conv.object_to_root_matrix();
        info.in_frame(CoordConv::from_path(&[parent, self.frame]))
    }

    pub fn to_stage_point(&self, point: Vec3) -> Vec3 {
        self.frame.transform_point3(point)
    }

    pub fn to_stage_vector(&self, vector: Vec3) -> Vec3 {
        self.frame.transform_vector3(vector)
    }

    pub fn to_frame_vector(&self, vector: Vec3) -> Vec3 {
        self.frame.inverse().transform_vector3(vector)
    }

    /// Size of a tool part as `fraction` of the model diagonal, clamped.
    pub fn part_scale(model_size: Vec3, fraction: f32, min_size: f32, max_size: f32) -> f32 {
        (fraction * model_size.length()).clamp(min_size, max_size)
    }

    pub fn neutral_color(&self) -> Color {
        self.context.tuning().colors.neutral
    }

    pub fn snapped_color(&self) -> Color {
        self.context.tuning().colors.snapped
    }

    pub fn feedback_color(&self, dim: usize, is_snapped: bool) -> Color {
        self.context.tuning().feedback_color(dim, is_snapped)
    }

    /// Commits `command` when `changed`, otherwise reverts its preview.
    pub(crate) fn commit_or_discard<C: Command>(&self, mut command: C, changed: bool) {
        let mut manager = self.context.command_manager.borrow_mut();
        if changed {
            tracing::debug!("{} commits {}", self.type_name, command.description());
            manager.add_and_do(Box::new(command));
        } else {
            tracing::debug!("{} discards an unchanged drag", self.type_name);
            manager.simulate_undo(&mut command);
        }
    }
}

/// An interactive editor for the selected models.
pub trait Tool {
    fn base(&self) -> &ToolBase;
    fn base_mut(&mut self) -> &mut ToolBase;

    /// Specialized tools only apply to one model kind.
    fn is_specialized(&self) -> bool {
        false
    }

    /// Pure eligibility check for `selection`.
    fn can_attach(&self, selection: &Selection) -> bool;

    /// Derives widget geometry from the attached model.
    fn attach(&mut self);

    /// Releases anything taken while attached.
    fn detach(&mut self) {}

    /// Chooses the part a grip with `info.guide_direction` would hover.
    fn update_grip_info(&self, info: &mut GripInfo) {
        info.clear_widget();
    }

    fn start_drag(&mut self, info: &DragInfo);
    fn continue_drag(&mut self, info: &DragInfo);
    fn end_drag(&mut self);
    /// Ends a drag without committing. The preview is reverted and any
    /// feedback is released.
    fn abort_drag(&mut self);
    fn is_dragging(&self) -> bool;

    fn type_name(&self) -> &'static str {
        self.base().type_name()
    }

    fn can_be_used_for(&self, selection: &Selection) -> bool {
        !selection.is_empty() && self.can_attach(selection)
    }

    fn attach_to_selection(&mut self, selection: &Selection, index: usize) {
        assert!(
            !self.base().is_attached(),
            "{}: attach_to_selection() while attached",
            self.type_name()
        );
        assert!(
            self.can_be_used_for(selection),
            "{}: attach_to_selection() requires can_attach()",
            self.type_name()
        );
        assert!(index < selection.count(), "selection index {index} out of range");
        self.base_mut().set_selection(selection, index);
        tracing::debug!("attached {} to {}", self.type_name(), self.base().model_name());
        self.attach();
    }

    fn detach_from_selection(&mut self) {
        assert!(
            self.base().is_attached(),
            "{}: detach_from_selection() while detached",
            self.type_name()
        );
        if self.is_dragging() {
            tracing::debug!("{} detached during a drag", self.type_name());
            self.abort_drag();
        }
        self.detach();
        self.base_mut().clear_selection();
        tracing::debug!("detached {}", self.type_name());
    }

    /// Re-reads the attached model after it changed.
    fn reattach_to_selection(&mut self) {
        self.detach();
        self.attach();
    }

    /// Runs the completion function of a specialized tool.
    fn finish(&mut self) {
        if let Some(func) = self.base_mut().completion.as_mut() {
            func();
        }
    }
}
