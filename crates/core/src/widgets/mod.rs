//! Interactive widgets that turn drag samples into value changes.
//!
//! Every [`DragInfo`] is expressed in stage coordinates. `coord_conv`
//! converts between the stage and the frame of the widget's owner, which
//! is where widget geometry (slider axes, disc centers) is defined.

mod composite;
mod plane;
mod rotators;
mod scale;
mod slider;
mod spin;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::rc::Rc;

use forma_scene::{CoordConv, Ray};
use glam::{Quat, Vec3};

use crate::notifier::Notifier;
use crate::targets::Targetable;

pub use composite::CompositeWidget;
pub use plane::PlaneWidget;
pub use rotators::{DiscWidget, SphereWidget};
pub use scale::{ScaleMode, ScaleWidget};
pub use slider::{Slider1DWidget, Slider2DWidget};
pub use spin::{SpinChange, SpinWidget};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Trigger {
    #[default]
    Pointer,
    Grip,
    Touch,
}

/// What the drag started on. `path` names the widget parts from the
/// outermost owner down to the part that was hit.
#[derive(Clone, Default)]
pub struct Hit {
    pub path: Vec<String>,
    pub point: Vec3,
    pub normal: Vec3,
    /// Surface under the pointer that can place targets.
    pub targetable: Option<Rc<dyn Targetable>>,
}

impl fmt::Debug for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hit")
            .field("path", &self.path)
            .field("point", &self.point)
            .field("normal", &self.normal)
            .field("has_targetable", &self.targetable.is_some())
            .finish()
    }
}

impl Hit {
    pub fn with_path<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            path: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// One drag sample.
#[derive(Debug, Clone)]
pub struct DragInfo {
    pub trigger: Trigger,
    pub is_modified_mode: bool,
    /// Zero disables precision scaling.
    pub linear_precision: f32,
    pub angular_precision: f32,
    pub ray: Ray,
    pub grip_position: Vec3,
    pub grip_orientation: Quat,
    pub grip_guide_direction: Vec3,
    pub touch_position: Vec3,
    pub hit: Hit,
    pub coord_conv: CoordConv,
}

impl Default for DragInfo {
    fn default() -> Self {
        Self {
            trigger: Trigger::Pointer,
            is_modified_mode: false,
            linear_precision: 0.0,
            angular_precision: 0.0,
            ray: Ray::default(),
            grip_position: Vec3::ZERO,
            grip_orientation: Quat::IDENTITY,
            grip_guide_direction: Vec3::NEG_X,
            touch_position: Vec3::ZERO,
            hit: Hit::default(),
            coord_conv: CoordConv::default(),
        }
    }
}

impl DragInfo {
    pub fn is_grip(&self) -> bool {
        self.trigger == Trigger::Grip
    }

    /// Name of the outermost part that was hit.
    pub fn outer_part(&self) -> Option<&str> {
        self.hit.path.first().map(String::as_str)
    }

    /// Name of the innermost part that was hit.
    pub fn inner_part(&self) -> Option<&str> {
        self.hit.path.last().map(String::as_str)
    }

    /// Copy with `coord_conv` replaced, used when a drag is forwarded into
    /// another frame.
    pub fn in_frame(&self, coord_conv: CoordConv) -> Self {
        Self {
            coord_conv,
            ..self.clone()
        }
    }
}

/// State shared by all widgets: name, enable flags, active state and the
/// saved start of the current drag.
pub struct WidgetBase {
    name: String,
    is_interaction_enabled: bool,
    is_hovering_enabled: bool,
    is_active: bool,
    is_highlighted: bool,
    start_info: Option<DragInfo>,
    activation: Notifier<bool>,
}

impl fmt::Debug for WidgetBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetBase")
            .field("name", &self.name)
            .field("is_active", &self.is_active)
            .field("is_dragging", &self.start_info.is_some())
            .finish()
    }
}

impl WidgetBase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_interaction_enabled: true,
            is_hovering_enabled: true,
            is_active: false,
            is_highlighted: false,
            start_info: None,
            activation: Notifier::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_interaction_enabled(&self) -> bool {
        self.is_interaction_enabled
    }

    pub fn set_interaction_enabled(&mut self, enabled: bool) {
        self.is_interaction_enabled = enabled;
    }

    pub fn is_hovering_enabled(&self) -> bool {
        self.is_hovering_enabled
    }

    pub fn set_hovering_enabled(&mut self, enabled: bool) {
        self.is_hovering_enabled = enabled;
    }

    pub fn is_highlighted(&self) -> bool {
        self.is_highlighted
    }

    pub fn set_highlighted(&mut self, highlighted: bool) {
        self.is_highlighted = highlighted;
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Notifies activation observers when the state changes.
    pub fn set_active(&mut self, is_active: bool) {
        if self.is_active != is_active {
            self.is_active = is_active;
            self.activation.notify(&is_active);
        }
    }

    pub fn activation(&mut self) -> &mut Notifier<bool> {
        &mut self.activation
    }

    pub fn is_dragging(&self) -> bool {
        self.start_info.is_some()
    }

    /// Saves the start sample and activates the widget.
    pub fn begin_drag(&mut self, info: &DragInfo) {
        assert!(
            self.start_info.is_none(),
            "{}: start_drag() called during a drag",
            self.name
        );
        self.start_info = Some(info.clone());
        self.set_active(true);
    }

    pub fn start_info(&self) -> &DragInfo {
        match &self.start_info {
            Some(info) => info,
            None => panic!("{}: drag sample outside of a drag", self.name),
        }
    }

    pub fn finish_drag(&mut self) {
        assert!(
            self.start_info.take().is_some(),
            "{}: end_drag() called without start_drag()",
            self.name
        );
        self.set_active(false);
    }
}

/// Widget driven by `start_drag`, any number of `continue_drag` calls and
/// exactly one `end_drag`. Each `continue_drag` is computed from the start
/// sample and the current one.
pub trait DraggableWidget {
    fn base(&self) -> &WidgetBase;
    fn base_mut(&mut self) -> &mut WidgetBase;

    fn start_drag(&mut self, info: &DragInfo);
    fn continue_drag(&mut self, info: &DragInfo);
    fn end_drag(&mut self);

    fn name(&self) -> &str {
        self.base().name()
    }

    fn is_dragging(&self) -> bool {
        self.base().is_dragging()
    }
}

/// Clamp that tolerates an inverted range by preferring the minimum.
pub(crate) fn clamp_value(value: f32, min: f32, max: f32) -> f32 {
    value.min(max).max(min)
}
