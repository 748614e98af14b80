use forma_scene::{rotation_between, Spin};
use glam::{Vec2, Vec3};

use super::{
    CompositeWidget, DiscWidget, DragInfo, DraggableWidget, Slider1DWidget, Slider2DWidget,
    SphereWidget, WidgetBase,
};
use crate::notifier::Notifier;

const ROTATOR: &str = "Rotator";
const TRANSLATOR: &str = "Translator";
const RING: &str = "Ring";
const OFFSET: &str = "Offset";

/// Which part of a spin a drag changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinChange {
    Axis,
    Center,
    Angle,
    Offset,
}

impl SpinChange {
    fn from_part(name: &str) -> Self {
        match name {
            ROTATOR => SpinChange::Axis,
            TRANSLATOR => SpinChange::Center,
            RING => SpinChange::Angle,
            _ => SpinChange::Offset,
        }
    }
}

/// Edits a spin: the rotator turns the axis, the translator moves the
/// center in the plane perpendicular to the axis, the ring changes the
/// angle and the offset slider moves along the axis.
pub struct SpinWidget {
    composite: CompositeWidget,
    rotator: SphereWidget,
    translator: Slider2DWidget,
    ring: DiscWidget,
    offset: Slider1DWidget,
    spin: Spin,
    start_spin: Spin,
    spin_changed: Notifier<SpinChange>,
}

impl Default for SpinWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl SpinWidget {
    pub fn new() -> Self {
        let mut translator = Slider2DWidget::new(TRANSLATOR);
        translator.set_range(Vec2::splat(-1.0e4), Vec2::splat(1.0e4));
        let mut offset = Slider1DWidget::new(OFFSET);
        offset.set_range(-1.0, 1.0);
        let mut widget = Self {
            composite: CompositeWidget::new("SpinWidget", [ROTATOR, TRANSLATOR, RING, OFFSET]),
            rotator: SphereWidget::new(ROTATOR),
            translator,
            ring: DiscWidget::new(RING),
            offset,
            spin: Spin::default(),
            start_spin: Spin::default(),
            spin_changed: Notifier::new(),
        };
        widget.update_parts();
        widget
    }

    pub fn spin(&self) -> Spin {
        self.spin
    }

    /// Spin in the owner's frame.
    pub fn set_spin(&mut self, spin: Spin) {
        assert!(!self.is_dragging(), "set_spin() called during a drag");
        self.spin = spin;
        self.update_parts();
    }

    pub fn set_size(&mut self, radius: f32) {
        self.rotator.set_sphere(self.spin.center, radius);
    }

    pub fn set_offset_range(&mut self, min: f32, max: f32) {
        self.offset.set_range(min, max);
        self.offset.set_value(self.spin.offset);
    }

    pub fn set_grip_drag_scale(&mut self, scale: f32) {
        self.translator.set_grip_drag_scale(scale);
        self.offset.set_grip_drag_scale(scale);
    }

    pub fn spin_changed(&mut self) -> &mut Notifier<SpinChange> {
        &mut self.spin_changed
    }

    pub fn active_part(&self) -> Option<&str> {
        self.composite.active_sub_widget()
    }

    /// Part of the spin the current drag changes.
    pub fn active_change(&self) -> Option<SpinChange> {
        self.active_part().map(SpinChange::from_part)
    }

    fn update_parts(&mut self) {
        let spin = self.spin;
        self.rotator
            .set_rotation(rotation_between(Vec3::Y, spin.axis));
        self.translator.set_plane(spin.center, spin.axis);
        self.translator.set_value(Vec2::ZERO);
        self.ring.set_geometry(spin.center, spin.axis);
        self.ring.set_angle(spin.angle);
        self.offset.set_line(spin.center, spin.axis);
        self.offset.set_value(spin.offset);
    }

    fn part_mut(&mut self, name: &str) -> &mut dyn DraggableWidget {
        match name {
            ROTATOR => &mut self.rotator,
            TRANSLATOR => &mut self.translator,
            RING => &mut self.ring,
            _ => &mut self.offset,
        }
    }
}

impl DraggableWidget for SpinWidget {
    fn base(&self) -> &WidgetBase {
        self.composite.base()
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        self.composite.base_mut()
    }

    fn is_dragging(&self) -> bool {
        self.composite.is_dragging()
    }

    fn start_drag(&mut self, info: &DragInfo) {
        let name = self.composite.pick_sub_widget(info);
        self.composite.sub_widget_activated(&name, true);
        self.start_spin = self.spin;
        self.part_mut(&name).start_drag(info);
    }

    fn continue_drag(&mut self, info: &DragInfo) {
        let Some(name) = self.composite.active_sub_widget().map(str::to_string) else {
            panic!("SpinWidget: continue_drag() without start_drag()");
        };
        self.part_mut(&name).continue_drag(info);

        let start = self.start_spin;
        let change = SpinChange::from_part(&name);
        match change {
            SpinChange::Axis => {
                self.spin.axis = (self.rotator.drag_rotation() * start.axis).normalize_or_zero();
            }
            SpinChange::Center => {
                self.spin.center = start.center + self.translator.offset();
            }
            SpinChange::Angle => {
                self.spin.angle = start.angle + self.ring.drag_angle();
            }
            SpinChange::Offset => {
                self.spin.offset = self.offset.value();
            }
        }
        self.spin_changed.notify(&change);
    }

    fn end_drag(&mut self) {
        let Some(name) = self.composite.active_sub_widget().map(str::to_string) else {
            panic!("SpinWidget: end_drag() without start_drag()");
        };
        self.part_mut(&name).end_drag();
        self.composite.sub_widget_activated(&name, false);
        self.update_parts();
    }
}
