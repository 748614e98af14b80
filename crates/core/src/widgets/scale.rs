use glam::{Vec2, Vec3};

use super::{clamp_value, CompositeWidget, DragInfo, DraggableWidget, Slider1DWidget, WidgetBase};
use crate::notifier::Notifier;
use crate::tuning::Tuning;

const MIN_SLIDER: &str = "MinSlider";
const MAX_SLIDER: &str = "MaxSlider";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScaleMode {
    /// The dragged handle moves and the other stays fixed.
    #[default]
    Asymmetric,
    /// Both handles move about the center.
    Symmetric,
}

/// Span along a line with a slider at each end. The span length always
/// stays within the limits.
pub struct ScaleWidget {
    composite: CompositeWidget,
    min_slider: Slider1DWidget,
    max_slider: Slider1DWidget,
    mode: ScaleMode,
    use_modified_mode: bool,
    limits: Vec2,
    min_value: f32,
    max_value: f32,
    start_center: f32,
    scale_changed: Notifier<bool>,
}

impl ScaleWidget {
    pub fn new(name: impl Into<String>) -> Self {
        let [min_limit, max_limit] = Tuning::default().scale_widget_limits;
        let mut widget = Self {
            composite: CompositeWidget::new(name, [MIN_SLIDER, MAX_SLIDER]),
            min_slider: Slider1DWidget::new(MIN_SLIDER),
            max_slider: Slider1DWidget::new(MAX_SLIDER),
            mode: ScaleMode::Asymmetric,
            use_modified_mode: false,
            limits: Vec2::new(min_limit, max_limit),
            min_value: 0.0,
            max_value: 0.0,
            start_center: 0.0,
            scale_changed: Notifier::new(),
        };
        widget.update_sliders();
        widget
    }

    /// Line the handles move along, in the owner's frame. Values are
    /// positions along `direction` measured from `origin`.
    pub fn set_line(&mut self, origin: Vec3, direction: Vec3) {
        self.min_slider.set_line(origin, direction);
        self.max_slider.set_line(origin, direction);
    }

    pub fn direction(&self) -> Vec3 {
        self.min_slider.direction()
    }

    pub fn mode(&self) -> ScaleMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ScaleMode) {
        self.mode = mode;
    }

    pub fn is_using_modified_mode(&self) -> bool {
        self.use_modified_mode
    }

    /// When set, each drag is symmetric exactly when it starts in modified
    /// mode.
    pub fn set_use_modified_mode(&mut self, use_modified_mode: bool) {
        self.use_modified_mode = use_modified_mode;
    }

    pub fn set_precision_based(&mut self, is_precision_based: bool) {
        self.min_slider.set_precision_based(is_precision_based);
        self.max_slider.set_precision_based(is_precision_based);
    }

    pub fn set_grip_drag_scale(&mut self, scale: f32) {
        self.min_slider.set_grip_drag_scale(scale);
        self.max_slider.set_grip_drag_scale(scale);
    }

    pub fn limits(&self) -> Vec2 {
        self.limits
    }

    pub fn set_limits(&mut self, limits: Vec2) {
        assert!(!self.is_dragging(), "set_limits() called during a drag");
        assert!(limits.y > limits.x, "invalid scale limits {limits:?}");
        self.limits = limits;
        let length = self.length();
        if length < limits.x || length > limits.y {
            self.set_max_value(self.max_value);
        }
    }

    pub fn min_value(&self) -> f32 {
        self.min_value
    }

    pub fn max_value(&self) -> f32 {
        self.max_value
    }

    pub fn length(&self) -> f32 {
        self.max_value - self.min_value
    }

    pub fn set_min_value(&mut self, value: f32) {
        assert!(!self.is_dragging(), "set_min_value() called during a drag");
        self.min_value = clamp_value(
            value,
            self.max_value - self.limits.y,
            self.max_value - self.limits.x,
        );
        self.update_sliders();
    }

    pub fn set_max_value(&mut self, value: f32) {
        assert!(!self.is_dragging(), "set_max_value() called during a drag");
        self.max_value = clamp_value(
            value,
            self.min_value + self.limits.x,
            self.min_value + self.limits.y,
        );
        self.update_sliders();
    }

    /// Sets both handles. The length is clamped to the limits about `min`.
    pub fn set_span(&mut self, min: f32, max: f32) {
        assert!(!self.is_dragging(), "set_span() called during a drag");
        self.min_value = min;
        self.max_value = min + clamp_value(max - min, self.limits.x, self.limits.y);
        self.update_sliders();
    }

    pub fn min_slider(&self) -> &Slider1DWidget {
        &self.min_slider
    }

    pub fn max_slider(&self) -> &Slider1DWidget {
        &self.max_slider
    }

    /// Notified with `true` when the max handle was dragged.
    pub fn scale_changed(&mut self) -> &mut Notifier<bool> {
        &mut self.scale_changed
    }

    /// Which handle the current drag moves.
    pub fn active_is_max(&self) -> Option<bool> {
        self.composite
            .active_sub_widget()
            .map(|name| name == MAX_SLIDER)
    }

    fn slider_mut(&mut self, is_max: bool) -> &mut Slider1DWidget {
        if is_max {
            &mut self.max_slider
        } else {
            &mut self.min_slider
        }
    }

    fn update_sliders(&mut self) {
        let half = 0.5 * self.length();
        self.min_slider
            .set_range(self.min_value - half, self.min_value + half);
        self.max_slider
            .set_range(self.max_value - half, self.max_value + half);
        self.min_slider.set_value(self.min_value);
        self.max_slider.set_value(self.max_value);
    }

    /// Sets the motion range of the dragged slider for the current mode.
    fn init_for_drag(&mut self, is_max: bool) {
        let limits = self.limits;
        match self.mode {
            ScaleMode::Asymmetric => {
                if is_max {
                    self.max_slider
                        .set_range(self.min_value + limits.x, self.min_value + limits.y);
                } else {
                    self.min_slider
                        .set_range(self.max_value - limits.y, self.max_value - limits.x);
                }
            }
            ScaleMode::Symmetric => {
                let center = 0.5 * (self.min_value + self.max_value);
                self.start_center = center;
                self.min_slider
                    .set_range(center - 0.5 * limits.y, center - 0.5 * limits.x);
                self.max_slider
                    .set_range(center + 0.5 * limits.x, center + 0.5 * limits.y);
            }
        }
    }
}

impl DraggableWidget for ScaleWidget {
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
        let is_max = name == MAX_SLIDER;
        self.composite.sub_widget_activated(&name, true);
        if self.use_modified_mode {
            self.mode = if info.is_modified_mode {
                ScaleMode::Symmetric
            } else {
                ScaleMode::Asymmetric
            };
        }
        self.init_for_drag(is_max);
        self.slider_mut(is_max).start_drag(info);
    }

    fn continue_drag(&mut self, info: &DragInfo) {
        let Some(is_max) = self.active_is_max() else {
            panic!("{}: continue_drag() without start_drag()", self.name());
        };
        self.slider_mut(is_max).continue_drag(info);
        self.min_value = self.min_slider.value();
        self.max_value = self.max_slider.value();

        if self.mode == ScaleMode::Symmetric {
            let mirrored = 2.0 * self.start_center;
            if is_max {
                self.min_value = mirrored - self.max_value;
                self.min_slider.set_value(self.min_value);
            } else {
                self.max_value = mirrored - self.min_value;
                self.max_slider.set_value(self.max_value);
            }
        }
        self.scale_changed.notify(&is_max);
    }

    fn end_drag(&mut self) {
        let Some(is_max) = self.active_is_max() else {
            panic!("{}: end_drag() without start_drag()", self.name());
        };
        self.slider_mut(is_max).end_drag();
        let name = if is_max { MAX_SLIDER } else { MIN_SLIDER };
        self.composite.sub_widget_activated(name, false);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::widgets::testing::DragTester;

    fn count_changes(widget: &mut ScaleWidget) -> Rc<RefCell<(usize, usize)>> {
        let counts = Rc::new(RefCell::new((0, 0)));
        let seen = counts.clone();
        widget.scale_changed().add_observer("test", move |is_max: &bool| {
            let mut counts = seen.borrow_mut();
            if *is_max {
                counts.1 += 1;
            } else {
                counts.0 += 1;
            }
        });
        counts
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1.0e-4
    }

    #[test]
    fn defaults() {
        let widget = ScaleWidget::new("Scaler");
        assert_eq!(widget.mode(), ScaleMode::Asymmetric);
        assert!(!widget.is_using_modified_mode());
        assert_eq!(widget.limits(), Vec2::new(0.01, 100.0));
        assert_eq!(widget.min_value(), 0.0);
        assert_eq!(widget.max_value(), 0.0);
        assert_eq!(widget.length(), 0.0);
        assert_eq!(widget.min_slider().value(), 0.0);
        assert_eq!(widget.max_slider().value(), 0.0);
    }

    #[test]
    fn setters_respect_limits() {
        let mut widget = ScaleWidget::new("Scaler");
        widget.set_use_modified_mode(true);
        widget.set_mode(ScaleMode::Symmetric);
        assert_eq!(widget.mode(), ScaleMode::Symmetric);
        widget.set_limits(Vec2::new(0.1, 1000.0));

        widget.set_min_value(-10.0);
        widget.set_max_value(123.0);
        assert!(close(widget.min_value(), -10.0));
        assert!(close(widget.max_value(), 123.0));
        assert!(close(widget.length(), 133.0));

        widget.set_max_value(10.0);
        widget.set_min_value(9.99);
        assert!(close(widget.min_value(), 9.9));

        widget.set_min_value(-10.0);
        widget.set_max_value(2000.0);
        assert!(close(widget.max_value(), 990.0));
        assert!(close(widget.length(), 1000.0));
    }

    #[test]
    fn asymmetric_drags_move_one_handle() {
        let mut widget = ScaleWidget::new("Scaler");
        let counts = count_changes(&mut widget);
        let min = DragTester::new(["Scaler", "MinSlider"]);
        let max = DragTester::new(["Scaler", "MaxSlider"]);

        min.apply(&mut widget, min.mouse_drag(Vec3::new(4.0, 0.0, 0.0), Vec3::new(-2.0, 0.0, 0.0)));
        assert!(close(widget.min_value(), -6.0));
        assert!(close(widget.max_value(), 0.0));
        assert!(close(widget.length(), 6.0));
        assert_eq!(*counts.borrow(), (1, 0));

        max.apply(&mut widget, max.mouse_drag(Vec3::new(1.0, 0.0, 0.0), Vec3::new(8.0, 0.0, 0.0)));
        assert!(close(widget.min_value(), -6.0));
        assert!(close(widget.max_value(), 7.0));
        assert!(close(widget.length(), 13.0));
        assert_eq!(*counts.borrow(), (1, 1));
    }

    #[test]
    fn symmetric_drags_keep_center() {
        let mut widget = ScaleWidget::new("Scaler");
        widget.set_use_modified_mode(true);
        let counts = count_changes(&mut widget);
        let mut min = DragTester::new(["Scaler", "MinSlider"]);
        let mut max = DragTester::new(["Scaler", "MaxSlider"]);
        min.set_is_modified_mode(true);
        max.set_is_modified_mode(true);

        min.apply(&mut widget, min.mouse_drag(Vec3::new(4.0, 0.0, 0.0), Vec3::new(-2.0, 0.0, 0.0)));
        assert!(close(widget.min_value(), -6.0));
        assert!(close(widget.max_value(), 6.0));
        assert!(close(widget.length(), 12.0));

        max.apply(&mut widget, max.mouse_drag(Vec3::new(1.0, 0.0, 0.0), Vec3::new(8.0, 0.0, 0.0)));
        assert!(close(widget.min_value(), -13.0));
        assert!(close(widget.max_value(), 13.0));
        assert!(close(widget.length(), 26.0));
        assert_eq!(*counts.borrow(), (1, 1));
        assert_eq!(widget.mode(), ScaleMode::Symmetric);
    }

    #[test]
    fn drag_length_stays_in_limits() {
        let mut widget = ScaleWidget::new("Scaler");
        widget.set_limits(Vec2::new(1.0, 5.0));
        widget.set_max_value(2.0);
        let max = DragTester::new(["Scaler", "MaxSlider"]);
        max.apply(&mut widget, max.mouse_drag(Vec3::ZERO, Vec3::new(-10.0, 0.0, 0.0)));
        assert!(close(widget.length(), 1.0));
        max.apply(&mut widget, max.mouse_drag(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)));
        assert!(close(widget.length(), 5.0));
    }

    #[test]
    #[should_panic(expected = "during a drag")]
    fn set_limits_during_drag_panics() {
        let mut widget = ScaleWidget::new("Scaler");
        let max = DragTester::new(["Scaler", "MaxSlider"]);
        let infos = max.mouse_drag(Vec3::ZERO, Vec3::X);
        widget.start_drag(&infos[0]);
        widget.set_limits(Vec2::new(1.0, 2.0));
    }
}
