mod coord_conv;
mod math;
mod model;
mod selection;

pub use coord_conv::CoordConv;
pub use math::{
    angle_between_deg, are_close, are_directions_close, are_points_close, round_to_precision,
    rotation_between, signed_angle_deg, snap_to_axis, snap_to_bounds, twist_angle_deg, Bounds,
    CircleArc, Dimensionality, Plane, Ray, Spin,
};
pub use model::{
    min_outer_radius_for_inner, Model, ModelKind, ModelStore, SceneError, MIN_CYLINDER_RADIUS,
    MIN_TORUS_HOLE_RADIUS, MIN_TORUS_INNER_RADIUS,
};
pub use selection::{SelPath, Selection};
