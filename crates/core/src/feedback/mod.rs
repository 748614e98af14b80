//! Transient visual feedback shown while tools are dragged.

mod kinds;
mod manager;

use std::any::Any;

use forma_scene::Bounds;

use crate::tuning::Color;

pub use kinds::{AngularFeedback, AngularFrame, LinearFeedback, LinearFrame, TooltipFeedback};
pub use manager::{FeedbackId, FeedbackManager, FeedbackParent};

/// One kind of pooled feedback object.
pub trait Feedback: Any {
    fn type_name(&self) -> &'static str;

    /// World feedback (tooltips) is parented outside the stage.
    fn is_in_world_coordinates(&self) -> bool {
        false
    }

    fn set_color(&mut self, color: Color);

    /// Called when the instance leaves the pool.
    fn activate(&mut self, _scene_bounds: &Bounds) {}

    /// Called when the instance returns to the pool.
    fn deactivate(&mut self) {}

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Copy used to grow the pool.
    fn clone_feedback(&self) -> Box<dyn Feedback>;
}
