use std::any::Any;

use forma_scene::{round_to_precision, rotation_between, Bounds, CircleArc};
use glam::{Quat, Vec3};

use super::Feedback;
use crate::tuning::Color;

const LINEAR_EXTRA_HEIGHT: f32 = 0.5;
const LINEAR_EXTRA_UPRIGHT_LENGTH: f32 = 2.0;
const LINEAR_HEIGHT_SCALE: f32 = 1.1;
const LINEAR_MIN_TEXT_Y: f32 = 1.0;
const LINEAR_TEXT_Y_OFFSET: f32 = 3.0;
const ANGULAR_LINE_LENGTH: f32 = 24.0;
const ANGULAR_TEXT_X: f32 = 4.0;
const TOOLTIP_DISTANCE: f32 = 2.0;

const NEUTRAL: Color = [1.0, 1.0, 1.0];

macro_rules! feedback_plumbing {
    ($name:literal) => {
        fn type_name(&self) -> &'static str {
            $name
        }

        fn set_color(&mut self, color: Color) {
            self.color = color;
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }

        fn clone_feedback(&self) -> Box<dyn Feedback> {
            Box::new(self.clone())
        }
    };
}

/// Geometry of a linear span: two uprights joined by a crossbar with the
/// length shown above it.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFrame {
    pub p0: Vec3,
    pub p1: Vec3,
    pub up_direction: Vec3,
    pub crossbar_height: f32,
    pub upright_length: f32,
    pub text_position: Vec3,
    pub text: String,
}

/// Shows a length from a point along a direction.
#[derive(Debug, Clone)]
pub struct LinearFeedback {
    color: Color,
    scene_bounds: Bounds,
    frame: Option<LinearFrame>,
}

impl Default for LinearFeedback {
    fn default() -> Self {
        Self {
            color: NEUTRAL,
            scene_bounds: Bounds::default(),
            frame: None,
        }
    }
}

impl LinearFeedback {
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn frame(&self) -> Option<&LinearFrame> {
        self.frame.as_ref()
    }

    /// The crossbar is raised above the scene bounds so it does not
    /// intersect the models.
    pub fn span_length(&mut self, point: Vec3, direction: Vec3, length: f32) {
        let up_dim = if direction.y.abs() > 0.9 { 0 } else { 1 };
        let up_direction = if up_dim == 0 { Vec3::X } else { Vec3::Y };
        let scene_height = LINEAR_HEIGHT_SCALE * (self.scene_bounds.max[up_dim] - point[up_dim]);
        let crossbar_height = scene_height.max(1.0) + LINEAR_EXTRA_HEIGHT;
        let p1 = point + length * direction;
        let mut text_position = p1 + (crossbar_height + LINEAR_TEXT_Y_OFFSET) * up_direction;
        text_position.y = text_position.y.max(LINEAR_MIN_TEXT_Y);
        self.frame = Some(LinearFrame {
            p0: point,
            p1,
            up_direction,
            crossbar_height,
            upright_length: crossbar_height + LINEAR_EXTRA_UPRIGHT_LENGTH,
            text_position,
            text: format!("{}", (100.0 * length).round() / 100.0),
        });
    }
}

impl Feedback for LinearFeedback {
    feedback_plumbing!("LinearFeedback");

    fn activate(&mut self, scene_bounds: &Bounds) {
        self.scene_bounds = *scene_bounds;
    }

    fn deactivate(&mut self) {
        self.frame = None;
    }
}

/// Geometry of an angular arc, in the feedback's own frame where the
/// rotation axis is +Z.
#[derive(Debug, Clone, PartialEq)]
pub struct AngularFrame {
    pub translation: Vec3,
    pub rotation: Quat,
    pub arc: CircleArc,
    pub start_line_end: Vec3,
    pub end_line_end: Vec3,
    pub text_position: Vec3,
    pub text: String,
}

/// Shows the angle subtended by a rotation about an axis.
#[derive(Debug, Clone)]
pub struct AngularFeedback {
    color: Color,
    frame: Option<AngularFrame>,
}

impl Default for AngularFeedback {
    fn default() -> Self {
        Self {
            color: NEUTRAL,
            frame: None,
        }
    }
}

impl AngularFeedback {
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn frame(&self) -> Option<&AngularFrame> {
        self.frame.as_ref()
    }

    /// Angles are in degrees. The arc angle is shown rounded to whole
    /// degrees and wrapped below 360.
    pub fn subtend_arc(
        &mut self,
        center: Vec3,
        up_offset: f32,
        text_up_offset: f32,
        axis: Vec3,
        arc: CircleArc,
    ) {
        let mut degrees = round_to_precision(arc.arc_angle, 1.0);
        if degrees >= 360.0 {
            degrees -= 360.0;
        }
        let arc = CircleArc::new(arc.start_angle, degrees);
        let line_end = |angle: f32| {
            Quat::from_rotation_z(angle.to_radians()) * Vec3::new(ANGULAR_LINE_LENGTH, 0.0, 0.0)
        };
        self.frame = Some(AngularFrame {
            translation: center + Vec3::new(0.0, up_offset, 0.0),
            rotation: rotation_between(Vec3::Z, axis),
            arc,
            start_line_end: line_end(arc.start_angle),
            end_line_end: line_end(arc.start_angle + arc.arc_angle),
            text_position: Vec3::new(ANGULAR_TEXT_X, text_up_offset, 0.0),
            text: format!("{degrees}"),
        });
    }
}

impl Feedback for AngularFeedback {
    feedback_plumbing!("AngularFeedback");

    fn deactivate(&mut self) {
        self.frame = None;
    }
}

/// Text shown near a point, in world coordinates.
#[derive(Debug, Clone)]
pub struct TooltipFeedback {
    color: Color,
    text: String,
    position: Vec3,
}

impl Default for TooltipFeedback {
    fn default() -> Self {
        Self {
            color: NEUTRAL,
            text: String::new(),
            position: Vec3::ZERO,
        }
    }
}

impl TooltipFeedback {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Places the text `TOOLTIP_DISTANCE` in front of `point` toward the
    /// viewer along `view_direction`.
    pub fn set_text(&mut self, text: impl Into<String>, point: Vec3, view_direction: Vec3) {
        self.text = text.into();
        self.position = point - TOOLTIP_DISTANCE * view_direction.normalize_or_zero();
    }
}

impl Feedback for TooltipFeedback {
    feedback_plumbing!("TooltipFeedback");

    fn is_in_world_coordinates(&self) -> bool {
        true
    }

    fn deactivate(&mut self) {
        self.text.clear();
    }
}
