use forma_scene::{snap_to_bounds, Bounds, Dimensionality};
use glam::Vec3;

use super::{EdgeTarget, PointTarget};
use crate::widgets::{DragInfo, DraggableWidget, WidgetBase};

/// Where a dragged point target lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointPlacement {
    pub position: Vec3,
    pub direction: Vec3,
    /// Dimensions in which the position snapped to a feature.
    pub snapped_dims: Dimensionality,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgePlacement {
    pub position0: Vec3,
    pub position1: Vec3,
}

/// Surface that decides where targets dragged over it are placed. All
/// values are in stage coordinates.
pub trait Targetable {
    fn place_point_target(&self, info: &DragInfo) -> PointPlacement;

    /// Places an edge starting at the hit point; `current_length` is the
    /// length of the edge before the drag.
    fn place_edge_target(&self, info: &DragInfo, current_length: f32) -> EdgePlacement;
}

/// Targetable surface of a model's stage bounds. Hit points within
/// `tolerance` of the bounds' min, center or max snap to it.
#[derive(Debug, Clone, Copy)]
pub struct BoundsTargetable {
    pub bounds: Bounds,
    pub tolerance: f32,
}

impl Targetable for BoundsTargetable {
    fn place_point_target(&self, info: &DragInfo) -> PointPlacement {
        let (position, snapped_dims) = snap_to_bounds(&self.bounds, info.hit.point, self.tolerance);
        let direction = if info.hit.normal.length_squared() > 0.0 {
            info.hit.normal.normalize()
        } else {
            Vec3::Y
        };
        PointPlacement {
            position,
            direction,
            snapped_dims,
        }
    }

    fn place_edge_target(&self, info: &DragInfo, current_length: f32) -> EdgePlacement {
        let placement = self.place_point_target(info);
        EdgePlacement {
            position0: placement.position,
            position1: placement.position + current_length * placement.direction,
        }
    }
}

/// Display state shared by the target widgets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetWidgetState {
    /// A tool is currently snapping to this target.
    pub is_snap_feedback_shown: bool,
    /// Dimensions shown by the snap indicator while placing.
    pub snapped_dims: Dimensionality,
}

/// Draggable point target. Dragging it over a [`Targetable`] moves it.
pub struct PointTargetWidget {
    base: WidgetBase,
    target: PointTarget,
    state: TargetWidgetState,
    /// End of the snap feedback line, in stage coordinates.
    feedback_end: Vec3,
}

impl Default for PointTargetWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl PointTargetWidget {
    pub fn new() -> Self {
        Self {
            base: WidgetBase::new("PointTargetWidget"),
            target: PointTarget::default(),
            state: TargetWidgetState::default(),
            feedback_end: Vec3::ZERO,
        }
    }

    pub fn target(&self) -> &PointTarget {
        &self.target
    }

    pub fn set_target(&mut self, target: PointTarget) {
        self.target = PointTarget {
            direction: target.direction.normalize_or_zero(),
            ..target
        };
    }

    pub fn state(&self) -> TargetWidgetState {
        self.state
    }

    pub fn feedback_end(&self) -> Vec3 {
        self.feedback_end
    }

    pub fn show_snap_feedback(&mut self, is_snapping: bool, end_point: Vec3) {
        self.state.is_snap_feedback_shown = is_snapping;
        if is_snapping {
            self.feedback_end = end_point;
        }
    }
}

impl DraggableWidget for PointTargetWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn start_drag(&mut self, info: &DragInfo) {
        self.base.begin_drag(info);
    }

    fn continue_drag(&mut self, info: &DragInfo) {
        self.base.start_info();
        if let Some(targetable) = &info.hit.targetable {
            let placement = targetable.place_point_target(info);
            self.target.position = placement.position;
            self.target.direction = placement.direction.normalize_or_zero();
            self.state.snapped_dims = placement.snapped_dims;
        }
    }

    fn end_drag(&mut self) {
        self.state.snapped_dims = Dimensionality::new();
        self.base.finish_drag();
    }
}

/// Draggable edge target. Dragging places the edge on a [`Targetable`]
/// keeping its length.
pub struct EdgeTargetWidget {
    base: WidgetBase,
    target: EdgeTarget,
    start_length: f32,
    state: TargetWidgetState,
}

impl Default for EdgeTargetWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeTargetWidget {
    pub fn new() -> Self {
        Self {
            base: WidgetBase::new("EdgeTargetWidget"),
            target: EdgeTarget::default(),
            start_length: 0.0,
            state: TargetWidgetState::default(),
        }
    }

    pub fn target(&self) -> &EdgeTarget {
        &self.target
    }

    pub fn set_target(&mut self, target: EdgeTarget) {
        assert!(target.is_valid(), "zero-length edge target");
        self.target = target;
    }

    pub fn state(&self) -> TargetWidgetState {
        self.state
    }

    pub fn show_snap_feedback(&mut self, is_snapping: bool) {
        self.state.is_snap_feedback_shown = is_snapping;
    }
}

impl DraggableWidget for EdgeTargetWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn start_drag(&mut self, info: &DragInfo) {
        self.start_length = self.target.length();
        self.base.begin_drag(info);
    }

    fn continue_drag(&mut self, info: &DragInfo) {
        self.base.start_info();
        if let Some(targetable) = &info.hit.targetable {
            let placement = targetable.place_edge_target(info, self.start_length);
            if let Some(target) = EdgeTarget::new(placement.position0, placement.position1) {
                self.target = target;
            }
        }
    }

    fn end_drag(&mut self) {
        self.base.finish_drag();
    }
}
