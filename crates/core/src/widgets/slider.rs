use forma_scene::{Plane, Ray};
use glam::{Vec2, Vec3};

use super::{clamp_value, DragInfo, DraggableWidget, Trigger, WidgetBase};
use crate::notifier::Notifier;

/// Value along a line. Pointer drags use the point on the line closest to
/// the ray; grip and touch drags use the motion projected onto the line.
pub struct Slider1DWidget {
    base: WidgetBase,
    origin: Vec3,
    direction: Vec3,
    min_value: f32,
    max_value: f32,
    value: f32,
    is_precision_based: bool,
    grip_drag_scale: f32,
    start_value: f32,
    start_ray_value: f32,
    value_changed: Notifier<f32>,
}

impl Slider1DWidget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: WidgetBase::new(name),
            origin: Vec3::ZERO,
            direction: Vec3::X,
            min_value: 0.0,
            max_value: 1.0,
            value: 0.0,
            is_precision_based: false,
            grip_drag_scale: 1.0,
            start_value: 0.0,
            start_ray_value: 0.0,
            value_changed: Notifier::new(),
        }
    }

    /// The slider line, in the owner's frame.
    pub fn set_line(&mut self, origin: Vec3, direction: Vec3) {
        self.origin = origin;
        self.direction = direction.normalize_or_zero();
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn set_range(&mut self, min_value: f32, max_value: f32) {
        self.min_value = min_value;
        self.max_value = max_value;
    }

    pub fn range(&self) -> (f32, f32) {
        (self.min_value, self.max_value)
    }

    pub fn set_precision_based(&mut self, is_precision_based: bool) {
        self.is_precision_based = is_precision_based;
    }

    pub fn set_grip_drag_scale(&mut self, scale: f32) {
        self.grip_drag_scale = scale;
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn start_value(&self) -> f32 {
        self.start_value
    }

    /// Clamps to the range and notifies observers.
    pub fn set_value(&mut self, value: f32) {
        self.value = clamp_value(value, self.min_value, self.max_value);
        self.value_changed.notify(&self.value);
    }

    pub fn value_changed(&mut self) -> &mut Notifier<f32> {
        &mut self.value_changed
    }

    /// Position along the line for a pointer ray.
    fn ray_value(&self, info: &DragInfo, ray: &Ray) -> Option<f32> {
        let local = ray.transformed(&info.coord_conv.root_to_object_matrix());
        local.closest_line_param(self.origin, self.direction)
    }

    fn motion_value(&self, info: &DragInfo, from: Vec3, to: Vec3) -> f32 {
        let cc = &info.coord_conv;
        (cc.root_to_object_point(to) - cc.root_to_object_point(from)).dot(self.direction)
    }
}

impl DraggableWidget for Slider1DWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn start_drag(&mut self, info: &DragInfo) {
        if info.trigger == Trigger::Pointer {
            self.start_ray_value = self.ray_value(info, &info.ray).unwrap_or(0.0);
        }
        self.start_value = self.value;
        self.base.begin_drag(info);
    }

    fn continue_drag(&mut self, info: &DragInfo) {
        let start = self.base.start_info();
        let delta = match info.trigger {
            Trigger::Pointer => match self.ray_value(start, &info.ray) {
                Some(value) => value - self.start_ray_value,
                None => self.value - self.start_value,
            },
            Trigger::Grip => {
                self.grip_drag_scale
                    * self.motion_value(start, start.grip_position, info.grip_position)
            }
            Trigger::Touch => self.motion_value(start, start.touch_position, info.touch_position),
        };
        let delta = if self.is_precision_based && info.linear_precision > 0.0 {
            delta * info.linear_precision
        } else {
            delta
        };
        self.set_value(self.start_value + delta);
    }

    fn end_drag(&mut self) {
        self.base.finish_drag();
    }
}

/// Value in a plane, as coordinates along two perpendicular axes.
pub struct Slider2DWidget {
    base: WidgetBase,
    origin: Vec3,
    axes: [Vec3; 2],
    min_value: Vec2,
    max_value: Vec2,
    value: Vec2,
    grip_drag_scale: f32,
    start_value: Vec2,
    start_point: Option<Vec3>,
    value_changed: Notifier<Vec2>,
}

impl Slider2DWidget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: WidgetBase::new(name),
            origin: Vec3::ZERO,
            axes: [Vec3::X, Vec3::Z],
            min_value: Vec2::splat(-1.0),
            max_value: Vec2::splat(1.0),
            value: Vec2::ZERO,
            grip_drag_scale: 1.0,
            start_value: Vec2::ZERO,
            start_point: None,
            value_changed: Notifier::new(),
        }
    }

    /// Plane through `origin` perpendicular to `normal`, in the owner's
    /// frame. The value axes are chosen perpendicular to the normal.
    pub fn set_plane(&mut self, origin: Vec3, normal: Vec3) {
        let normal = normal.normalize_or_zero();
        let (u, v) = normal.any_orthonormal_pair();
        self.origin = origin;
        self.axes = [u, v];
    }

    pub fn axes(&self) -> [Vec3; 2] {
        self.axes
    }

    pub fn set_range(&mut self, min_value: Vec2, max_value: Vec2) {
        self.min_value = min_value;
        self.max_value = max_value;
    }

    pub fn set_grip_drag_scale(&mut self, scale: f32) {
        self.grip_drag_scale = scale;
    }

    pub fn value(&self) -> Vec2 {
        self.value
    }

    /// Value converted back to a displacement in the owner's frame.
    pub fn offset(&self) -> Vec3 {
        self.axes[0] * self.value.x + self.axes[1] * self.value.y
    }

    pub fn set_value(&mut self, value: Vec2) {
        self.value = value.max(self.min_value).min(self.max_value);
        self.value_changed.notify(&self.value);
    }

    pub fn value_changed(&mut self) -> &mut Notifier<Vec2> {
        &mut self.value_changed
    }

    fn normal(&self) -> Vec3 {
        self.axes[0].cross(self.axes[1])
    }

    fn ray_point(&self, info: &DragInfo, ray: &Ray) -> Option<Vec3> {
        let local = ray.transformed(&info.coord_conv.root_to_object_matrix());
        let plane = Plane::from_point_normal(self.origin, self.normal());
        local.intersect_plane(&plane).map(|t| local.point_at(t))
    }

    fn to_value(&self, motion: Vec3) -> Vec2 {
        Vec2::new(motion.dot(self.axes[0]), motion.dot(self.axes[1]))
    }
}

impl DraggableWidget for Slider2DWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn start_drag(&mut self, info: &DragInfo) {
        self.start_point = match info.trigger {
            Trigger::Pointer => self.ray_point(info, &info.ray),
            Trigger::Grip | Trigger::Touch => None,
        };
        self.start_value = self.value;
        self.base.begin_drag(info);
    }

    fn continue_drag(&mut self, info: &DragInfo) {
        let start = self.base.start_info();
        let cc = &start.coord_conv;
        let motion = match info.trigger {
            Trigger::Pointer => match (self.start_point, self.ray_point(start, &info.ray)) {
                (Some(p0), Some(p1)) => p1 - p0,
                _ => Vec3::ZERO,
            },
            Trigger::Grip => {
                self.grip_drag_scale
                    * (cc.root_to_object_point(info.grip_position)
                        - cc.root_to_object_point(start.grip_position))
            }
            Trigger::Touch => {
                cc.root_to_object_point(info.touch_position)
                    - cc.root_to_object_point(start.touch_position)
            }
        };
        let mut delta = self.to_value(motion);
        if info.linear_precision > 0.0 {
            delta *= info.linear_precision;
        }
        self.set_value(self.start_value + delta);
    }

    fn end_drag(&mut self) {
        self.start_point = None;
        self.base.finish_drag();
    }
}
