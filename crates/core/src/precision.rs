use forma_scene::round_to_precision;
use serde::{Deserialize, Serialize};

/// Current linear and angular precision. Interactive values are rounded to
/// these steps unless they snapped to a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecisionStore {
    pub linear: f32,
    /// Degrees.
    pub angular: f32,
}

impl Default for PrecisionStore {
    fn default() -> Self {
        Self {
            linear: 0.1,
            angular: 1.0,
        }
    }
}

impl PrecisionStore {
    pub fn new(linear: f32, angular: f32) -> Self {
        Self { linear, angular }
    }

    pub fn apply_linear(&self, value: f32) -> f32 {
        round_to_precision(value, self.linear)
    }

    pub fn apply_angle(&self, degrees: f32) -> f32 {
        round_to_precision(degrees, self.angular)
    }
}
