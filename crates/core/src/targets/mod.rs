//! Point and edge targets used to snap interactive edits.

mod manager;
mod widgets;


use forma_scene::CircleArc;
use glam::Vec3;
use serde::{Deserialize, Serialize};

pub use manager::TargetManager;
pub use widgets::{
    BoundsTargetable, EdgePlacement, EdgeTargetWidget, PointPlacement, PointTargetWidget,
    TargetWidgetState, Targetable,
};

/// Snap position and direction. The radius and arc describe the radial
/// layout drawn around the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointTarget {
    pub position: Vec3,
    pub direction: Vec3,
    #[serde(default)]
    pub radius: f32,
    #[serde(default)]
    pub arc: CircleArc,
}

impl Default for PointTarget {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::Y,
            radius: 1.0,
            arc: CircleArc::default(),
        }
    }
}

impl PointTarget {
    pub fn new(position: Vec3, direction: Vec3) -> Self {
        Self {
            position,
            direction: direction.normalize_or_zero(),
            ..Self::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.direction.length_squared() > 1.0e-12 && self.radius >= 0.0
    }
}

/// Snap length defined by two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeTarget {
    pub position0: Vec3,
    pub position1: Vec3,
}

impl Default for EdgeTarget {
    fn default() -> Self {
        Self {
            position0: Vec3::ZERO,
            position1: Vec3::new(0.0, 4.0, 0.0),
        }
    }
}

impl EdgeTarget {
    /// Returns `None` for a zero-length edge.
    pub fn new(position0: Vec3, position1: Vec3) -> Option<Self> {
        let target = Self {
            position0,
            position1,
        };
        target.is_valid().then_some(target)
    }

    pub fn length(&self) -> f32 {
        self.position0.distance(self.position1)
    }

    pub fn direction(&self) -> Vec3 {
        (self.position1 - self.position0).normalize_or_zero()
    }

    pub fn is_valid(&self) -> bool {
        self.length() > 1.0e-6
    }

    pub fn reversed(&self) -> Self {
        Self {
            position0: self.position1,
            position1: self.position0,
        }
    }
}
