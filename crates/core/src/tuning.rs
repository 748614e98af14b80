use serde::{Deserialize, Serialize};

pub type Color = [f32; 3];

/// Interaction constants. Every field can be overridden from a JSON file
/// or directly in tests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Tuning {
    /// Stage distance within which a motion snaps to the point target.
    pub snap_point_tolerance: f32,
    /// Length difference within which a length snaps to the edge target.
    pub snap_length_tolerance: f32,
    /// Angle in degrees within which a direction snaps.
    pub snap_direction_tolerance: f32,
    /// Minimum plane or spin center change for a drag to be committed.
    pub commit_distance_tolerance: f32,
    /// Minimum angle change in degrees for a drag to be committed.
    pub commit_angle_tolerance: f32,
    pub max_grip_hover_angle: f32,
    pub scale_widget_limits: [f32; 2],
    /// Controller motion is multiplied by this before driving sliders.
    pub grip_drag_scale: f32,
    pub colors: FeedbackColors,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            snap_point_tolerance: 1.0,
            snap_length_tolerance: 1.0,
            snap_direction_tolerance: 15.0,
            commit_distance_tolerance: 0.01,
            commit_angle_tolerance: 0.01,
            max_grip_hover_angle: 20.0,
            scale_widget_limits: [0.01, 100.0],
            grip_drag_scale: 80.0,
            colors: FeedbackColors::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedbackColors {
    pub neutral: Color,
    pub snapped: Color,
    pub dimensions: [Color; 3],
    pub active: Color,
}

impl Default for FeedbackColors {
    fn default() -> Self {
        Self {
            neutral: [1.0, 1.0, 1.0],
            snapped: [0.94, 0.78, 0.16],
            dimensions: [
                [0.86, 0.31, 0.31],
                [0.31, 0.78, 0.47],
                [0.31, 0.47, 0.86],
            ],
            active: [0.9, 0.4, 0.9],
        }
    }
}

impl Tuning {
    /// Color for feedback along `dim`, or the snapped color.
    pub fn feedback_color(&self, dim: usize, is_snapped: bool) -> Color {
        if is_snapped {
            self.colors.snapped
        } else {
            self.colors.dimensions[dim.min(2)]
        }
    }
}
