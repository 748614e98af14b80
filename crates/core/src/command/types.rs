use forma_scene::{Plane, Spin};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::{models_desc, validate_model_names, Command, CommandBase};
use crate::targets::{EdgeTarget, PointTarget};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaneCommandKind {
    #[default]
    Clip,
    Mirror,
}

/// Sets the plane of clipped or mirrored models. The plane is in stage
/// coordinates.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangePlaneCommand {
    #[serde(skip)]
    base: CommandBase,
    #[serde(skip)]
    kind: PlaneCommandKind,
    pub model_names: Vec<String>,
    pub plane: Plane,
}

impl ChangePlaneCommand {
    pub fn new(kind: PlaneCommandKind, model_names: Vec<String>, plane: Plane) -> Self {
        Self {
            base: CommandBase::default(),
            kind,
            model_names,
            plane,
        }
    }

    pub fn kind(&self) -> PlaneCommandKind {
        self.kind
    }

    pub(crate) fn set_kind(&mut self, kind: PlaneCommandKind) {
        self.kind = kind;
    }
}

impl Command for ChangePlaneCommand {
    command_plumbing!();

    fn type_name(&self) -> &'static str {
        match self.kind {
            PlaneCommandKind::Clip => "ChangeClipCommand",
            PlaneCommandKind::Mirror => "ChangeMirrorCommand",
        }
    }

    fn description(&self) -> String {
        let what = match self.kind {
            PlaneCommandKind::Clip => "clip",
            PlaneCommandKind::Mirror => "mirror",
        };
        format!("Changed {what} plane of {}", models_desc(&self.model_names))
    }

    fn validate(&self) -> Result<(), String> {
        validate_model_names(&self.model_names)?;
        if !self.plane.is_valid() {
            return Err("Zero-length plane normal".to_string());
        }
        Ok(())
    }

    fn model_names(&self) -> &[String] {
        &self.model_names
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpinCommandKind {
    #[default]
    Twist,
    Bend,
}

/// Sets the spin of twisted or bent models, in stage coordinates.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangeSpinCommand {
    #[serde(skip)]
    base: CommandBase,
    #[serde(skip)]
    kind: SpinCommandKind,
    pub model_names: Vec<String>,
    pub spin: Spin,
}

impl ChangeSpinCommand {
    pub fn new(kind: SpinCommandKind, model_names: Vec<String>, spin: Spin) -> Self {
        Self {
            base: CommandBase::default(),
            kind,
            model_names,
            spin,
        }
    }

    pub fn kind(&self) -> SpinCommandKind {
        self.kind
    }

    pub(crate) fn set_kind(&mut self, kind: SpinCommandKind) {
        self.kind = kind;
    }
}

impl Command for ChangeSpinCommand {
    command_plumbing!();

    fn type_name(&self) -> &'static str {
        match self.kind {
            SpinCommandKind::Twist => "ChangeTwistCommand",
            SpinCommandKind::Bend => "ChangeBendCommand",
        }
    }

    fn description(&self) -> String {
        let what = match self.kind {
            SpinCommandKind::Twist => "twist",
            SpinCommandKind::Bend => "bend",
        };
        format!("Changed {what} of {}", models_desc(&self.model_names))
    }

    fn validate(&self) -> Result<(), String> {
        validate_model_names(&self.model_names)?;
        if !self.spin.is_valid() {
            return Err("Zero-length spin axis".to_string());
        }
        Ok(())
    }

    fn model_names(&self) -> &[String] {
        &self.model_names
    }
}

/// Which side of the bounds moves during a scale. The opposite side stays
/// fixed; `Center` keeps the center fixed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleSide {
    #[default]
    Center,
    Min,
    Max,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScaleCommand {
    #[serde(skip)]
    base: CommandBase,
    pub model_names: Vec<String>,
    pub ratios: Vec3,
    #[serde(default)]
    pub side: ScaleSide,
}

impl Default for ScaleCommand {
    fn default() -> Self {
        Self::new(Vec::new(), Vec3::ONE, ScaleSide::Center)
    }
}

impl ScaleCommand {
    pub fn new(model_names: Vec<String>, ratios: Vec3, side: ScaleSide) -> Self {
        Self {
            base: CommandBase::default(),
            model_names,
            ratios,
            side,
        }
    }
}

impl Command for ScaleCommand {
    command_plumbing!();

    fn type_name(&self) -> &'static str {
        "ScaleCommand"
    }

    fn description(&self) -> String {
        format!("Scaled {}", models_desc(&self.model_names))
    }

    fn validate(&self) -> Result<(), String> {
        validate_model_names(&self.model_names)?;
        if !self.ratios.is_finite() || self.ratios.min_element() <= 0.0 {
            return Err(format!("Invalid scale ratios {:?}", self.ratios));
        }
        Ok(())
    }

    fn model_names(&self) -> &[String] {
        &self.model_names
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RotateCommand {
    #[serde(skip)]
    base: CommandBase,
    pub model_names: Vec<String>,
    pub rotation: Quat,
    /// Rotate each model about its own center instead of the primary's.
    #[serde(default)]
    pub is_in_place: bool,
    /// The rotation is about stage axes rather than model axes.
    #[serde(default)]
    pub is_axis_aligned: bool,
}

impl Default for RotateCommand {
    fn default() -> Self {
        Self::new(Vec::new(), Quat::IDENTITY)
    }
}

impl RotateCommand {
    pub fn new(model_names: Vec<String>, rotation: Quat) -> Self {
        Self {
            base: CommandBase::default(),
            model_names,
            rotation,
            is_in_place: false,
            is_axis_aligned: false,
        }
    }
}

impl Command for RotateCommand {
    command_plumbing!();

    fn type_name(&self) -> &'static str {
        "RotateCommand"
    }

    fn description(&self) -> String {
        format!("Rotated {}", models_desc(&self.model_names))
    }

    fn validate(&self) -> Result<(), String> {
        validate_model_names(&self.model_names)?;
        if !self.rotation.is_finite() || self.rotation.length_squared() <= 1.0e-12 {
            return Err("Invalid rotation".to_string());
        }
        Ok(())
    }

    fn model_names(&self) -> &[String] {
        &self.model_names
    }
}

/// Moves models by a stage-space vector.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslateCommand {
    #[serde(skip)]
    base: CommandBase,
    pub model_names: Vec<String>,
    pub translation: Vec3,
}

impl TranslateCommand {
    pub fn new(model_names: Vec<String>, translation: Vec3) -> Self {
        Self {
            base: CommandBase::default(),
            model_names,
            translation,
        }
    }
}

impl Command for TranslateCommand {
    command_plumbing!();

    fn type_name(&self) -> &'static str {
        "TranslateCommand"
    }

    fn description(&self) -> String {
        format!("Translated {}", models_desc(&self.model_names))
    }

    fn validate(&self) -> Result<(), String> {
        validate_model_names(&self.model_names)?;
        if !self.translation.is_finite() {
            return Err("Invalid translation".to_string());
        }
        Ok(())
    }

    fn model_names(&self) -> &[String] {
        &self.model_names
    }
}

/// Sets the top or bottom radius of cylinders, in object coordinates.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangeCylinderCommand {
    #[serde(skip)]
    base: CommandBase,
    pub model_names: Vec<String>,
    pub is_top_radius: bool,
    pub new_radius: f32,
}

impl ChangeCylinderCommand {
    pub fn new(model_names: Vec<String>, is_top_radius: bool, new_radius: f32) -> Self {
        Self {
            base: CommandBase::default(),
            model_names,
            is_top_radius,
            new_radius,
        }
    }
}

impl Command for ChangeCylinderCommand {
    command_plumbing!();

    fn type_name(&self) -> &'static str {
        "ChangeCylinderCommand"
    }

    fn description(&self) -> String {
        let which = if self.is_top_radius { "top" } else { "bottom" };
        format!("Changed {which} radius of {}", models_desc(&self.model_names))
    }

    fn validate(&self) -> Result<(), String> {
        validate_model_names(&self.model_names)?;
        if !(self.new_radius > 0.0) {
            return Err(format!("Invalid radius {}", self.new_radius));
        }
        Ok(())
    }

    fn model_names(&self) -> &[String] {
        &self.model_names
    }
}

/// Sets the inner or outer radius of tori, in object coordinates.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangeTorusCommand {
    #[serde(skip)]
    base: CommandBase,
    pub model_names: Vec<String>,
    pub is_inner_radius: bool,
    pub new_radius: f32,
}

impl ChangeTorusCommand {
    pub fn new(model_names: Vec<String>, is_inner_radius: bool, new_radius: f32) -> Self {
        Self {
            base: CommandBase::default(),
            model_names,
            is_inner_radius,
            new_radius,
        }
    }
}

impl Command for ChangeTorusCommand {
    command_plumbing!();

    fn type_name(&self) -> &'static str {
        "ChangeTorusCommand"
    }

    fn description(&self) -> String {
        let which = if self.is_inner_radius { "inner" } else { "outer" };
        format!("Changed {which} radius of {}", models_desc(&self.model_names))
    }

    fn validate(&self) -> Result<(), String> {
        validate_model_names(&self.model_names)?;
        if !(self.new_radius > 0.0) {
            return Err(format!("Invalid radius {}", self.new_radius));
        }
        Ok(())
    }

    fn model_names(&self) -> &[String] {
        &self.model_names
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangePointTargetCommand {
    #[serde(skip)]
    base: CommandBase,
    pub old_target: PointTarget,
    pub new_target: PointTarget,
}

impl ChangePointTargetCommand {
    pub fn new(old_target: PointTarget, new_target: PointTarget) -> Self {
        Self {
            base: CommandBase::default(),
            old_target,
            new_target,
        }
    }
}

impl Command for ChangePointTargetCommand {
    command_plumbing!();

    fn type_name(&self) -> &'static str {
        "ChangePointTargetCommand"
    }

    fn description(&self) -> String {
        "Changed the point target".to_string()
    }

    fn validate(&self) -> Result<(), String> {
        if !self.old_target.is_valid() || !self.new_target.is_valid() {
            return Err("Invalid point target direction".to_string());
        }
        Ok(())
    }

    fn should_be_added_as_orphan(&self) -> bool {
        true
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangeEdgeTargetCommand {
    #[serde(skip)]
    base: CommandBase,
    pub old_target: EdgeTarget,
    pub new_target: EdgeTarget,
}

impl ChangeEdgeTargetCommand {
    pub fn new(old_target: EdgeTarget, new_target: EdgeTarget) -> Self {
        Self {
            base: CommandBase::default(),
            old_target,
            new_target,
        }
    }
}

impl Command for ChangeEdgeTargetCommand {
    command_plumbing!();

    fn type_name(&self) -> &'static str {
        "ChangeEdgeTargetCommand"
    }

    fn description(&self) -> String {
        "Changed the edge target".to_string()
    }

    fn validate(&self) -> Result<(), String> {
        if !self.old_target.is_valid() || !self.new_target.is_valid() {
            return Err("Zero-length edge target".to_string());
        }
        Ok(())
    }

    fn should_be_added_as_orphan(&self) -> bool {
        true
    }
}
