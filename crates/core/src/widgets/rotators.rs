use forma_scene::{signed_angle_deg, twist_angle_deg, Plane};
use glam::{Quat, Vec3};

use super::{DragInfo, DraggableWidget, Trigger, WidgetBase};
use crate::notifier::Notifier;

/// Rotation about a fixed axis. Pointer and touch drags measure the angle
/// swept around the center in the disc plane; grip drags use the twist of
/// the controller about the axis.
pub struct DiscWidget {
    base: WidgetBase,
    center: Vec3,
    axis: Vec3,
    angle: f32,
    start_angle: f32,
    drag_angle: f32,
    world_plane: Plane,
    world_center: Vec3,
    start_point: Vec3,
    last_point: Vec3,
    rotation_changed: Notifier<f32>,
}

impl DiscWidget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: WidgetBase::new(name),
            center: Vec3::ZERO,
            axis: Vec3::Y,
            angle: 0.0,
            start_angle: 0.0,
            drag_angle: 0.0,
            world_plane: Plane::default(),
            world_center: Vec3::ZERO,
            start_point: Vec3::ZERO,
            last_point: Vec3::ZERO,
            rotation_changed: Notifier::new(),
        }
    }

    pub fn set_geometry(&mut self, center: Vec3, axis: Vec3) {
        self.center = center;
        self.axis = axis.normalize_or_zero();
    }

    pub fn axis(&self) -> Vec3 {
        self.axis
    }

    /// Accumulated angle in degrees.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn set_angle(&mut self, degrees: f32) {
        self.angle = degrees;
    }

    /// Degrees rotated since the drag started.
    pub fn drag_angle(&self) -> f32 {
        self.drag_angle
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_axis_angle(self.axis, self.angle.to_radians())
    }

    /// Notified with the drag angle.
    pub fn rotation_changed(&mut self) -> &mut Notifier<f32> {
        &mut self.rotation_changed
    }

    fn plane_point(&self, info: &DragInfo) -> Option<Vec3> {
        match info.trigger {
            Trigger::Pointer => info
                .ray
                .intersect_plane(&self.world_plane)
                .map(|t| info.ray.point_at(t)),
            Trigger::Touch => Some(self.world_plane.project_point(info.touch_position)),
            Trigger::Grip => None,
        }
    }
}

impl DraggableWidget for DiscWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn start_drag(&mut self, info: &DragInfo) {
        let cc = &info.coord_conv;
        self.world_center = cc.object_to_root_point(self.center);
        let normal = cc.object_to_root_vector(self.axis).normalize_or_zero();
        self.world_plane = Plane::from_point_normal(self.world_center, normal);
        self.start_point = self
            .plane_point(info)
            .unwrap_or_else(|| self.world_plane.project_point(info.hit.point));
        self.last_point = self.start_point;
        self.start_angle = self.angle;
        self.drag_angle = 0.0;
        self.base.begin_drag(info);
    }

    fn continue_drag(&mut self, info: &DragInfo) {
        let start_orientation = self.base.start_info().grip_orientation;
        let normal = self.world_plane.normal;
        let delta = if info.trigger == Trigger::Grip {
            twist_angle_deg(info.grip_orientation * start_orientation.inverse(), normal)
        } else {
            let point = self.plane_point(info).unwrap_or(self.last_point);
            self.last_point = point;
            signed_angle_deg(
                self.start_point - self.world_center,
                point - self.world_center,
                normal,
            )
        };
        self.drag_angle = delta;
        self.angle = self.start_angle + delta;
        self.rotation_changed.notify(&delta);
    }

    fn end_drag(&mut self) {
        self.base.finish_drag();
    }
}

/// Free rotation on a virtual sphere. A pointer motion of one radius
/// rotates by 90 degrees; grip drags follow the controller orientation.
pub struct SphereWidget {
    base: WidgetBase,
    center: Vec3,
    radius: f32,
    rotation: Quat,
    start_rotation: Quat,
    drag_rotation: Quat,
    plane: Plane,
    start_point: Vec3,
    world_radius: f32,
    rotation_changed: Notifier<Quat>,
}

impl SphereWidget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: WidgetBase::new(name),
            center: Vec3::ZERO,
            radius: 1.0,
            rotation: Quat::IDENTITY,
            start_rotation: Quat::IDENTITY,
            drag_rotation: Quat::IDENTITY,
            plane: Plane::default(),
            start_point: Vec3::ZERO,
            world_radius: 1.0,
            rotation_changed: Notifier::new(),
        }
    }

    pub fn set_sphere(&mut self, center: Vec3, radius: f32) {
        self.center = center;
        self.radius = radius;
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    /// Rotation applied since the drag started, in the owner's frame.
    pub fn drag_rotation(&self) -> Quat {
        self.drag_rotation
    }

    pub fn rotation_changed(&mut self) -> &mut Notifier<Quat> {
        &mut self.rotation_changed
    }

    fn plane_point(&self, info: &DragInfo) -> Option<Vec3> {
        match info.trigger {
            Trigger::Pointer => info.ray.intersect_plane(&self.plane).map(|t| info.ray.point_at(t)),
            Trigger::Touch => Some(self.plane.project_point(info.touch_position)),
            Trigger::Grip => None,
        }
    }
}

impl DraggableWidget for SphereWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn start_drag(&mut self, info: &DragInfo) {
        let cc = &info.coord_conv;
        let world_center = cc.object_to_root_point(self.center);
        self.world_radius = cc.object_to_root_vector(Vec3::X * self.radius).length().max(1.0e-6);
        self.plane = Plane::from_point_normal(world_center, -info.ray.direction);
        self.start_point = self.plane_point(info).unwrap_or(world_center);
        self.start_rotation = self.rotation;
        self.drag_rotation = Quat::IDENTITY;
        self.base.begin_drag(info);
    }

    fn continue_drag(&mut self, info: &DragInfo) {
        let start = self.base.start_info();
        let world_rotation = if info.trigger == Trigger::Grip {
            info.grip_orientation * start.grip_orientation.inverse()
        } else {
            let point = self.plane_point(info).unwrap_or(self.start_point);
            let diff = point - self.start_point;
            let length = diff.length();
            if length < 1.0e-4 {
                Quat::IDENTITY
            } else {
                let axis = self.plane.normal.cross(diff).normalize_or_zero();
                let degrees = 90.0 * length / self.world_radius;
                Quat::from_axis_angle(axis, degrees.to_radians())
            }
        };

        let (axis, angle) = world_rotation.to_axis_angle();
        let local_axis = start.coord_conv.root_to_object_vector(axis).normalize_or_zero();
        self.drag_rotation = if local_axis == Vec3::ZERO {
            Quat::IDENTITY
        } else {
            Quat::from_axis_angle(local_axis, angle)
        };
        self.rotation = self.drag_rotation * self.start_rotation;
        self.rotation_changed.notify(&self.drag_rotation);
    }

    fn end_drag(&mut self) {
        self.base.finish_drag();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::testing::DragTester;

    #[test]
    fn disc_pointer_drag_measures_swept_angle() {
        let mut disc = DiscWidget::new("Disc");
        let mut tester = DragTester::new(["Disc"]);
        tester.set_ray_direction(Vec3::NEG_Y);
        tester.apply(&mut disc, tester.mouse_drag(Vec3::X, Vec3::NEG_Z));
        assert!((disc.angle() - 90.0).abs() < 1.0e-3);
        assert!((disc.drag_angle() - 90.0).abs() < 1.0e-3);
        assert!(disc.rotation().mul_vec3(Vec3::X).distance(Vec3::NEG_Z) < 1.0e-4);
    }

    #[test]
    fn disc_grip_drag_uses_twist() {
        let mut disc = DiscWidget::new("Disc");
        disc.set_angle(10.0);
        let tester = DragTester::new(["Disc"]);
        let twisted = Quat::from_rotation_y(30.0_f32.to_radians()) * Quat::from_rotation_x(0.2);
        tester.apply(
            &mut disc,
            tester.grip_rotation_drag(Vec3::NEG_X, Quat::from_rotation_x(0.2), twisted),
        );
        assert!((disc.drag_angle() - 30.0).abs() < 1.0e-2);
        assert!((disc.angle() - 40.0).abs() < 1.0e-2);
    }

    #[test]
    fn sphere_pointer_drag_rotates_toward_motion() {
        let mut sphere = SphereWidget::new("Sphere");
        let tester = DragTester::new(["Sphere"]);
        tester.apply(&mut sphere, tester.mouse_drag(Vec3::ZERO, Vec3::X));
        let front = sphere.rotation().mul_vec3(Vec3::Z);
        assert!(front.distance(Vec3::X) < 1.0e-4);
    }

    #[test]
    fn sphere_grip_drag_follows_controller() {
        let mut sphere = SphereWidget::new("Sphere");
        let tester = DragTester::new(["Sphere"]);
        let turn = Quat::from_rotation_z(0.5);
        tester.apply(
            &mut sphere,
            tester.grip_rotation_drag(Vec3::NEG_X, Quat::IDENTITY, turn),
        );
        assert!(sphere.rotation().angle_between(turn) < 1.0e-4);
    }
}
