use forma_scene::{rotation_between, Plane};
use glam::Vec3;

use super::{CompositeWidget, DragInfo, DraggableWidget, Slider1DWidget, SphereWidget, WidgetBase};
use crate::notifier::Notifier;

const ROTATOR: &str = "Rotator";
const TRANSLATOR: &str = "Translator";

/// Edits a plane: the rotator turns the normal about the plane point and
/// the translator slides the plane along its normal.
pub struct PlaneWidget {
    composite: CompositeWidget,
    rotator: SphereWidget,
    translator: Slider1DWidget,
    plane: Plane,
    start_plane: Plane,
    plane_changed: Notifier<bool>,
}

impl Default for PlaneWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaneWidget {
    pub fn new() -> Self {
        let mut translator = Slider1DWidget::new(TRANSLATOR);
        translator.set_precision_based(true);
        let mut widget = Self {
            composite: CompositeWidget::new("PlaneWidget", [ROTATOR, TRANSLATOR]),
            rotator: SphereWidget::new(ROTATOR),
            translator,
            plane: Plane::default(),
            start_plane: Plane::default(),
            plane_changed: Notifier::new(),
        };
        widget.set_translation_range(-1.0, 1.0);
        widget.set_plane(Plane::default());
        widget
    }

    /// Plane in the owner's frame.
    pub fn plane(&self) -> Plane {
        self.plane
    }

    pub fn set_plane(&mut self, plane: Plane) {
        assert!(!self.is_dragging(), "set_plane() called during a drag");
        self.plane = plane;
        self.update_parts();
    }

    /// Shows `plane` while a drag is in progress, such as after snapping.
    /// The next `continue_drag()` still measures from the drag start.
    pub fn show_plane_during_drag(&mut self, plane: Plane) {
        assert!(self.is_dragging(), "show_plane_during_drag() outside a drag");
        self.plane = plane;
        self.update_parts();
    }

    /// Range of plane distances the translator can reach.
    pub fn set_translation_range(&mut self, min: f32, max: f32) {
        self.translator.set_range(min, max);
    }

    pub fn translation_range(&self) -> (f32, f32) {
        self.translator.range()
    }

    pub fn set_size(&mut self, radius: f32) {
        self.rotator.set_sphere(Vec3::ZERO, radius);
    }

    pub fn set_grip_drag_scale(&mut self, scale: f32) {
        self.translator.set_grip_drag_scale(scale);
    }

    /// Notified with `true` for rotations and `false` for translations.
    pub fn plane_changed(&mut self) -> &mut Notifier<bool> {
        &mut self.plane_changed
    }

    pub fn active_part(&self) -> Option<&str> {
        self.composite.active_sub_widget()
    }

    pub fn composite(&self) -> &CompositeWidget {
        &self.composite
    }

    fn update_parts(&mut self) {
        self.rotator
            .set_rotation(rotation_between(Vec3::Y, self.plane.normal));
        self.translator.set_line(Vec3::ZERO, self.plane.normal);
        self.translator.set_value(self.plane.distance);
    }
}

impl DraggableWidget for PlaneWidget {
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
        self.start_plane = self.plane;
        if name == ROTATOR {
            self.rotator.start_drag(info);
        } else {
            self.translator.start_drag(info);
        }
    }

    fn continue_drag(&mut self, info: &DragInfo) {
        let is_rotation = match self.composite.active_sub_widget() {
            Some(ROTATOR) => true,
            Some(_) => false,
            None => panic!("PlaneWidget: continue_drag() without start_drag()"),
        };
        if is_rotation {
            self.rotator.continue_drag(info);
            let normal = self.rotator.drag_rotation() * self.start_plane.normal;
            self.plane = Plane::from_point_normal(self.start_plane.point(), normal);
        } else {
            self.translator.continue_drag(info);
            self.plane = Plane::new(self.translator.value(), self.start_plane.normal);
        }
        self.plane_changed.notify(&is_rotation);
    }

    fn end_drag(&mut self) {
        let Some(name) = self.composite.active_sub_widget().map(str::to_string) else {
            panic!("PlaneWidget: end_drag() without start_drag()");
        };
        if name == ROTATOR {
            self.rotator.end_drag();
        } else {
            self.translator.end_drag();
        }
        self.composite.sub_widget_activated(&name, false);
        self.update_parts();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::testing::DragTester;

    #[test]
    fn translator_moves_along_normal() {
        let mut widget = PlaneWidget::new();
        widget.set_translation_range(-10.0, 10.0);
        widget.set_plane(Plane::new(1.0, Vec3::X));
        let tester = DragTester::new(["Translator"]);
        tester.apply(&mut widget, tester.mouse_drag(Vec3::new(1.0, 0.0, 0.0), Vec3::new(3.5, 0.0, 0.0)));
        assert!((widget.plane().distance - 3.5).abs() < 1.0e-4);
        assert!(widget.plane().normal.distance(Vec3::X) < 1.0e-6);
        assert!(widget.active_part().is_none());
    }

    #[test]
    fn rotator_keeps_plane_point() {
        let mut widget = PlaneWidget::new();
        widget.set_translation_range(-10.0, 10.0);
        widget.set_plane(Plane::new(0.0, Vec3::Z));
        let tester = DragTester::new(["Rotator"]);
        tester.apply(&mut widget, tester.mouse_drag(Vec3::ZERO, Vec3::X));
        assert!(widget.plane().normal.distance(Vec3::X) < 1.0e-4);
        assert!(widget.plane().distance.abs() < 1.0e-4);
    }

    #[test]
    fn plane_shown_during_drag_is_kept_at_end() {
        let mut widget = PlaneWidget::new();
        widget.set_translation_range(-10.0, 10.0);
        let tester = DragTester::new(["Translator"]);
        let infos = tester.mouse_drag(Vec3::ZERO, Vec3::new(0.0, 1.8, 0.0));
        widget.start_drag(&infos[0]);
        widget.continue_drag(&infos[1]);
        assert!((widget.plane().distance - 1.8).abs() < 1.0e-4);

        widget.show_plane_during_drag(Plane::new(2.0, Vec3::Y));
        assert!((widget.plane().distance - 2.0).abs() < 1.0e-6);
        widget.end_drag();
        assert!((widget.plane().distance - 2.0).abs() < 1.0e-6);
    }
}
