use std::rc::Rc;

use forma_scene::{CoordConv, Ray};
use glam::{Quat, Vec3};

use super::{DragInfo, DraggableWidget, Hit, Trigger};
use crate::targets::Targetable;

/// Builds drag sample sequences. Points are given in the frame described
/// by the tester's `CoordConv` and converted to stage coordinates.
pub(crate) struct DragTester {
    base: DragInfo,
}

impl DragTester {
    pub(crate) fn new<S: Into<String>>(path: impl IntoIterator<Item = S>) -> Self {
        let base = DragInfo {
            hit: Hit::with_path(path),
            ..DragInfo::default()
        };
        Self { base }
    }

    pub(crate) fn set_is_modified_mode(&mut self, is_modified_mode: bool) {
        self.base.is_modified_mode = is_modified_mode;
    }

    pub(crate) fn set_linear_precision(&mut self, precision: f32) {
        self.base.linear_precision = precision;
    }

    pub(crate) fn set_angular_precision(&mut self, precision: f32) {
        self.base.angular_precision = precision;
    }

    pub(crate) fn set_ray_direction(&mut self, direction: Vec3) {
        self.base.ray.direction = direction.normalize();
    }

    pub(crate) fn set_coord_conv(&mut self, coord_conv: CoordConv) {
        self.base.coord_conv = coord_conv;
    }

    pub(crate) fn set_targetable(&mut self, targetable: Rc<dyn Targetable>) {
        self.base.hit.targetable = Some(targetable);
    }

    pub(crate) fn mouse_drag(&self, p0: Vec3, p1: Vec3) -> Vec<DragInfo> {
        self.mouse_drag_steps(p0, p1, 0)
    }

    /// Pointer drag with `count_between` interpolated samples. The ray
    /// passes through each point.
    pub(crate) fn mouse_drag_steps(&self, p0: Vec3, p1: Vec3, count_between: usize) -> Vec<DragInfo> {
        self.samples(p0, p1, count_between, |info, point| {
            let root = info.coord_conv.object_to_root_point(point);
            info.trigger = Trigger::Pointer;
            info.hit.point = root;
            info.ray = Ray::new(root - 10.0 * info.ray.direction, info.ray.direction);
        })
    }

    pub(crate) fn grip_drag(&self, p0: Vec3, p1: Vec3) -> Vec<DragInfo> {
        self.samples(p0, p1, 0, |info, point| {
            info.trigger = Trigger::Grip;
            info.grip_position = info.coord_conv.object_to_root_point(point);
        })
    }

    pub(crate) fn touch_drag(&self, p0: Vec3, p1: Vec3) -> Vec<DragInfo> {
        self.samples(p0, p1, 0, |info, point| {
            info.trigger = Trigger::Touch;
            info.touch_position = info.coord_conv.object_to_root_point(point);
        })
    }

    pub(crate) fn grip_rotation_drag(&self, guide: Vec3, r0: Quat, r1: Quat) -> Vec<DragInfo> {
        [r0, r1]
            .into_iter()
            .map(|rotation| {
                let mut info = self.base.clone();
                info.trigger = Trigger::Grip;
                info.grip_guide_direction = guide;
                info.grip_orientation = rotation;
                info
            })
            .collect()
    }

    fn samples(
        &self,
        p0: Vec3,
        p1: Vec3,
        count_between: usize,
        set: impl Fn(&mut DragInfo, Vec3),
    ) -> Vec<DragInfo> {
        let step = 1.0 / (count_between + 1) as f32;
        (0..=count_between + 1)
            .map(|i| {
                let mut info = self.base.clone();
                set(&mut info, p0.lerp(p1, i as f32 * step));
                info
            })
            .collect()
    }

    /// Starts with the first sample, continues with the rest, then ends.
    pub(crate) fn apply<W: DraggableWidget + ?Sized>(&self, widget: &mut W, infos: Vec<DragInfo>) {
        assert!(infos.len() >= 2, "a drag needs at least two samples");
        assert!(!widget.is_dragging());
        widget.start_drag(&infos[0]);
        assert!(widget.is_dragging());
        for info in &infos[1..] {
            widget.continue_drag(info);
        }
        widget.end_drag();
        assert!(!widget.is_dragging());
    }
}
