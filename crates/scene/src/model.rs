use std::collections::BTreeMap;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{Bounds, Plane, Spin};

pub const MIN_CYLINDER_RADIUS: f32 = 0.01;
pub const MIN_TORUS_INNER_RADIUS: f32 = 0.01;
pub const MIN_TORUS_HOLE_RADIUS: f32 = 0.01;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("no model named {0:?}")]
    MissingModel(String),
    #[error("model {name:?} is a {actual}, expected a {expected}")]
    WrongKind {
        name: String,
        actual: &'static str,
        expected: &'static str,
    },
    #[error("model {0:?} already exists")]
    DuplicateModel(String),
}

/// Parametric shape of a model. Converted kinds (clipped, mirrored,
/// twisted, bent) keep the bounds of their operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ModelKind {
    Box,
    Cylinder {
        top_radius: f32,
        bottom_radius: f32,
    },
    Torus {
        inner_radius: f32,
        outer_radius: f32,
    },
    Clipped {
        plane: Plane,
        #[serde(default)]
        operand_bounds: Bounds,
    },
    Mirrored {
        plane: Plane,
        #[serde(default)]
        operand_bounds: Bounds,
    },
    Twisted {
        spin: Spin,
        #[serde(default)]
        operand_bounds: Bounds,
    },
    Bent {
        spin: Spin,
        #[serde(default)]
        operand_bounds: Bounds,
    },
}

impl ModelKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ModelKind::Box => "BoxModel",
            ModelKind::Cylinder { .. } => "CylinderModel",
            ModelKind::Torus { .. } => "TorusModel",
            ModelKind::Clipped { .. } => "ClippedModel",
            ModelKind::Mirrored { .. } => "MirroredModel",
            ModelKind::Twisted { .. } => "TwistedModel",
            ModelKind::Bent { .. } => "BentModel",
        }
    }
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub kind: ModelKind,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub rotation: Quat,
    #[serde(default)]
    pub translation: Vec3,
}

impl Model {
    pub fn new(name: impl Into<String>, kind: ModelKind) -> Self {
        Self {
            name: name.into(),
            kind,
            scale: Vec3::ONE,
            rotation: Quat::IDENTITY,
            translation: Vec3::ZERO,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Object-space bounds, before scaling.
    pub fn bounds(&self) -> Bounds {
        match &self.kind {
            ModelKind::Box => Bounds::default(),
            ModelKind::Cylinder {
                top_radius,
                bottom_radius,
            } => {
                let r = top_radius.max(*bottom_radius);
                Bounds::new(Vec3::new(-r, -1.0, -r), Vec3::new(r, 1.0, r))
            }
            ModelKind::Torus {
                inner_radius,
                outer_radius,
            } => Bounds::new(
                Vec3::new(-outer_radius, -inner_radius, -outer_radius),
                Vec3::new(*outer_radius, *inner_radius, *outer_radius),
            ),
            ModelKind::Clipped { operand_bounds, .. }
            | ModelKind::Mirrored { operand_bounds, .. }
            | ModelKind::Twisted { operand_bounds, .. }
            | ModelKind::Bent { operand_bounds, .. } => *operand_bounds,
        }
    }

    pub fn scaled_bounds(&self) -> Bounds {
        let bounds = self.bounds();
        Bounds::new(bounds.min * self.scale, bounds.max * self.scale)
    }

    /// Object-to-parent matrix (scale, then rotation, then translation).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Axis-aligned bounds in the parent (stage) coordinates.
    pub fn stage_bounds(&self) -> Bounds {
        self.bounds().transformed(&self.matrix())
    }

    pub fn plane(&self) -> Option<Plane> {
        match &self.kind {
            ModelKind::Clipped { plane, .. } | ModelKind::Mirrored { plane, .. } => Some(*plane),
            _ => None,
        }
    }

    pub fn set_plane(&mut self, new_plane: Plane) -> Result<(), SceneError> {
        match &mut self.kind {
            ModelKind::Clipped { plane, .. } | ModelKind::Mirrored { plane, .. } => {
                *plane = new_plane;
                Ok(())
            }
            _ => Err(self.wrong_kind("ClippedModel")),
        }
    }

    pub fn spin(&self) -> Option<Spin> {
        match &self.kind {
            ModelKind::Twisted { spin, .. } | ModelKind::Bent { spin, .. } => Some(*spin),
            _ => None,
        }
    }

    pub fn set_spin(&mut self, new_spin: Spin) -> Result<(), SceneError> {
        match &mut self.kind {
            ModelKind::Twisted { spin, .. } | ModelKind::Bent { spin, .. } => {
                *spin = new_spin;
                Ok(())
            }
            _ => Err(self.wrong_kind("TwistedModel")),
        }
    }

    /// Returns `(top, bottom)` radii of a cylinder.
    pub fn cylinder_radii(&self) -> Option<(f32, f32)> {
        match self.kind {
            ModelKind::Cylinder {
                top_radius,
                bottom_radius,
            } => Some((top_radius, bottom_radius)),
            _ => None,
        }
    }

    pub fn set_cylinder_radius(&mut self, is_top: bool, radius: f32) -> Result<(), SceneError> {
        match &mut self.kind {
            ModelKind::Cylinder {
                top_radius,
                bottom_radius,
            } => {
                let radius = radius.max(MIN_CYLINDER_RADIUS);
                if is_top {
                    *top_radius = radius;
                } else {
                    *bottom_radius = radius;
                }
                Ok(())
            }
            _ => Err(self.wrong_kind("CylinderModel")),
        }
    }

    /// Returns `(inner, outer)` radii of a torus.
    pub fn torus_radii(&self) -> Option<(f32, f32)> {
        match self.kind {
            ModelKind::Torus {
                inner_radius,
                outer_radius,
            } => Some((inner_radius, outer_radius)),
            _ => None,
        }
    }

    /// Changing the inner radius grows the outer radius when needed to keep
    /// a hole; the outer radius never shrinks below that minimum.
    pub fn set_torus_radius(&mut self, is_inner: bool, radius: f32) -> Result<(), SceneError> {
        match &mut self.kind {
            ModelKind::Torus {
                inner_radius,
                outer_radius,
            } => {
                if is_inner {
                    *inner_radius = radius.max(MIN_TORUS_INNER_RADIUS);
                    *outer_radius =
                        outer_radius.max(min_outer_radius_for_inner(*inner_radius));
                } else {
                    *outer_radius = radius.max(min_outer_radius_for_inner(*inner_radius));
                }
                Ok(())
            }
            _ => Err(self.wrong_kind("TorusModel")),
        }
    }

    fn wrong_kind(&self, expected: &'static str) -> SceneError {
        SceneError::WrongKind {
            name: self.name.clone(),
            actual: self.type_name(),
            expected,
        }
    }
}

pub fn min_outer_radius_for_inner(inner_radius: f32) -> f32 {
    2.0 * inner_radius + MIN_TORUS_HOLE_RADIUS
}

/// Top-level models of the scene, keyed by unique name.
#[derive(Debug, Clone, Default)]
pub struct ModelStore {
    models: BTreeMap<String, Model>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, model: Model) -> Result<(), SceneError> {
        if self.models.contains_key(&model.name) {
            return Err(SceneError::DuplicateModel(model.name));
        }
        self.models.insert(model.name.clone(), model);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Model> {
        self.models.remove(name)
    }

    pub fn get(&self, name: &str) -> Result<&Model, SceneError> {
        self.models
            .get(name)
            .ok_or_else(|| SceneError::MissingModel(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Model, SceneError> {
        self.models
            .get_mut(name)
            .ok_or_else(|| SceneError::MissingModel(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn torus_inner_radius_pushes_outer() {
        let mut model = Model::new(
            "T",
            ModelKind::Torus {
                inner_radius: 0.2,
                outer_radius: 1.0,
            },
        );
        model.set_torus_radius(true, 0.6).expect("torus");
        let (inner, outer) = model.torus_radii().expect("radii");
        assert!((inner - 0.6).abs() < 1.0e-6);
        assert!((outer - 1.21).abs() < 1.0e-5);

        model.set_torus_radius(false, 0.1).expect("torus");
        let (_, outer) = model.torus_radii().expect("radii");
        assert!((outer - 1.21).abs() < 1.0e-5);
    }

    #[test]
    fn wrong_kind_is_reported() {
        let mut model = Model::new("B", ModelKind::Box);
        let err = model.set_plane(Plane::default()).unwrap_err();
        assert!(matches!(err, SceneError::WrongKind { .. }));
        assert!(model.plane().is_none());
    }

    #[test]
    fn stage_bounds_follow_transform() {
        let mut model = Model::new("B", ModelKind::Box);
        model.scale = Vec3::new(2.0, 1.0, 1.0);
        model.translation = Vec3::new(0.0, 5.0, 0.0);
        let bounds = model.stage_bounds();
        assert!((bounds.min - Vec3::new(-2.0, 4.0, -1.0)).length() < 1.0e-5);
        assert!((bounds.max - Vec3::new(2.0, 6.0, 1.0)).length() < 1.0e-5);
    }

    #[test]
    fn store_rejects_duplicates() {
        let mut store = ModelStore::new();
        store.add(Model::new("A", ModelKind::Box)).expect("add");
        assert_eq!(
            store.add(Model::new("A", ModelKind::Box)),
            Err(SceneError::DuplicateModel("A".to_string()))
        );
        assert!(store.get("B").is_err());
    }
}
