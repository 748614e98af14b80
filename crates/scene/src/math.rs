use std::fmt;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Plane satisfying `normal.dot(p) == distance`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub distance: f32,
    pub normal: Vec3,
}

impl Default for Plane {
    fn default() -> Self {
        Self {
            distance: 0.0,
            normal: Vec3::Y,
        }
    }
}

impl Plane {
    pub fn new(distance: f32, normal: Vec3) -> Self {
        Self {
            distance,
            normal: normal.normalize_or_zero(),
        }
    }

    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            distance: normal.dot(point),
            normal,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.normal.length_squared() > 1.0e-12 && self.distance.is_finite()
    }

    pub fn point(&self) -> Vec3 {
        self.normal * self.distance
    }

    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }

    pub fn project_point(&self, point: Vec3) -> Vec3 {
        point - self.normal * self.signed_distance(point)
    }

    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let point = matrix.transform_point3(self.point());
        let normal = matrix.inverse().transpose().transform_vector3(self.normal);
        Self::from_point_normal(point, normal)
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self::from_point_normal(self.point() + offset, self.normal)
    }
}

/// Rotation of `angle` degrees about `axis` through `center`, with an
/// optional offset along the axis used by bends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spin {
    pub center: Vec3,
    pub axis: Vec3,
    pub angle: f32,
    #[serde(default)]
    pub offset: f32,
}

impl Default for Spin {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            axis: Vec3::Y,
            angle: 0.0,
            offset: 0.0,
        }
    }
}

impl Spin {
    pub fn is_valid(&self) -> bool {
        self.axis.length_squared() > 1.0e-12 && self.center.is_finite() && self.angle.is_finite()
    }

    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let scale = matrix.transform_vector3(self.axis).length();
        Self {
            center: matrix.transform_point3(self.center),
            axis: matrix.transform_vector3(self.axis).normalize_or_zero(),
            angle: self.angle,
            offset: self.offset * scale,
        }
    }
}

/// Arc in degrees, measured counterclockwise from `start_angle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CircleArc {
    pub start_angle: f32,
    pub arc_angle: f32,
}

impl CircleArc {
    pub fn new(start_angle: f32, arc_angle: f32) -> Self {
        Self {
            start_angle,
            arc_angle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        }
    }
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_size(size: Vec3) -> Self {
        Self::new(-0.5 * size, 0.5 * size)
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        0.5 * (self.min + self.max)
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let corners = self.corners().map(|c| matrix.transform_point3(c));
        Self::from_points(corners).unwrap_or(*self)
    }

    /// Min, center and max along one dimension.
    pub fn principal_values(&self, dim: usize) -> [f32; 3] {
        [self.min[dim], self.center()[dim], self.max[dim]]
    }

    /// Projected extent of the bounds along `dir`.
    pub fn range_along(&self, dir: Vec3) -> (f32, f32) {
        let dir = dir.normalize_or_zero();
        self.corners()
            .iter()
            .map(|c| c.dot(dir))
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::NEG_Z,
        }
    }
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self::new(
            matrix.transform_point3(self.origin),
            matrix.transform_vector3(self.direction),
        )
    }

    pub fn intersect_plane(&self, plane: &Plane) -> Option<f32> {
        let denom = plane.normal.dot(self.direction);
        if denom.abs() <= 1.0e-6 {
            return None;
        }
        let t = (plane.distance - plane.normal.dot(self.origin)) / denom;
        (t >= 0.0).then_some(t)
    }

    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let root = disc.sqrt();
        let t = if -b - root >= 0.0 { -b - root } else { -b + root };
        (t >= 0.0).then_some(t)
    }

    /// Parameter along the line `line_origin + s * line_dir` of the point
    /// closest to this ray. `None` when the two are parallel.
    pub fn closest_line_param(&self, line_origin: Vec3, line_dir: Vec3) -> Option<f32> {
        let u = line_dir.normalize_or_zero();
        let v = self.direction;
        let w = line_origin - self.origin;
        let b = u.dot(v);
        let denom = 1.0 - b * b;
        if denom.abs() <= 1.0e-6 {
            return None;
        }
        let d = u.dot(w);
        let e = v.dot(w);
        Some((b * e - d) / denom)
    }
}

/// Set of dimensions (X, Y, Z) stored as bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensionality {
    bits: u8,
}

impl Dimensionality {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses letters such as `"XZ"`; other characters are ignored.
    pub fn from_letters(letters: &str) -> Self {
        let mut dims = Self::default();
        for c in letters.chars() {
            match c.to_ascii_uppercase() {
                'X' => dims.add_dimension(0),
                'Y' => dims.add_dimension(1),
                'Z' => dims.add_dimension(2),
                _ => {}
            }
        }
        dims
    }

    pub fn add_dimension(&mut self, dim: usize) {
        assert!(dim < 3, "dimension {dim} out of range");
        self.bits |= 1 << dim;
    }

    pub fn has_dimension(&self, dim: usize) -> bool {
        dim < 3 && self.bits & (1 << dim) != 0
    }

    pub fn count(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn dimensions(&self) -> impl Iterator<Item = usize> + '_ {
        (0..3).filter(|dim| self.has_dimension(*dim))
    }

    pub fn as_string(&self) -> String {
        ["X", "Y", "Z"]
            .iter()
            .enumerate()
            .filter(|(dim, _)| self.has_dimension(*dim))
            .map(|(_, letter)| *letter)
            .collect()
    }
}

impl fmt::Display for Dimensionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

pub fn are_close(a: f32, b: f32, tolerance: f32) -> bool {
    (a - b).abs() <= tolerance
}

pub fn are_points_close(a: Vec3, b: Vec3, tolerance: f32) -> bool {
    a.distance(b) <= tolerance
}

/// Unsigned angle between two vectors in degrees.
pub fn angle_between_deg(a: Vec3, b: Vec3) -> f32 {
    let a = a.normalize_or_zero();
    let b = b.normalize_or_zero();
    a.dot(b).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Signed angle in degrees from `from` to `to` around `axis`, both
/// projected onto the plane perpendicular to `axis`.
pub fn signed_angle_deg(from: Vec3, to: Vec3, axis: Vec3) -> f32 {
    let axis = axis.normalize_or_zero();
    let a = (from - axis * from.dot(axis)).normalize_or_zero();
    let b = (to - axis * to.dot(axis)).normalize_or_zero();
    let sin = a.cross(b).dot(axis);
    let cos = a.dot(b);
    sin.atan2(cos).to_degrees()
}

pub fn are_directions_close(a: Vec3, b: Vec3, tolerance_deg: f32) -> bool {
    angle_between_deg(a, b) <= tolerance_deg
}

/// Rotation taking direction `from` onto direction `to`.
pub fn rotation_between(from: Vec3, to: Vec3) -> Quat {
    let from = from.normalize_or_zero();
    let to = to.normalize_or_zero();
    if from == Vec3::ZERO || to == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(from, to)
}

/// Angle in degrees of the twist component of `rotation` about `axis`.
pub fn twist_angle_deg(rotation: Quat, axis: Vec3) -> f32 {
    let axis = axis.normalize_or_zero();
    let v = Vec3::new(rotation.x, rotation.y, rotation.z);
    let proj = axis * v.dot(axis);
    let twist = Quat::from_xyzw(proj.x, proj.y, proj.z, rotation.w);
    if twist.length_squared() <= 1.0e-12 {
        return 0.0;
    }
    let twist = twist.normalize();
    let (twist_axis, angle) = twist.to_axis_angle();
    let sign = if twist_axis.dot(axis) < 0.0 { -1.0 } else { 1.0 };
    let mut degrees = sign * angle.to_degrees();
    if degrees > 180.0 {
        degrees -= 360.0;
    } else if degrees < -180.0 {
        degrees += 360.0;
    }
    degrees
}

/// Snaps `dir` to the first principal axis (X, Y, Z, either sign) within
/// `tolerance_deg`. Returns the axis index and the signed axis.
pub fn snap_to_axis(dir: Vec3, tolerance_deg: f32) -> Option<(usize, Vec3)> {
    for (dim, axis) in [Vec3::X, Vec3::Y, Vec3::Z].into_iter().enumerate() {
        if are_directions_close(dir, axis, tolerance_deg) {
            return Some((dim, axis));
        }
        if are_directions_close(dir, -axis, tolerance_deg) {
            return Some((dim, -axis));
        }
    }
    None
}

/// Moves each coordinate of `point` onto the nearest principal value of
/// `bounds` (min, center or max) within `tolerance`. Returns the snapped
/// point and the dimensions that snapped.
pub fn snap_to_bounds(bounds: &Bounds, point: Vec3, tolerance: f32) -> (Vec3, Dimensionality) {
    let mut snapped = point;
    let mut dims = Dimensionality::new();
    for dim in 0..3 {
        let nearest = bounds
            .principal_values(dim)
            .into_iter()
            .min_by(|a, b| (a - point[dim]).abs().total_cmp(&(b - point[dim]).abs()));
        if let Some(value) = nearest {
            if are_close(value, point[dim], tolerance) {
                snapped[dim] = value;
                dims.add_dimension(dim);
            }
        }
    }
    (snapped, dims)
}

/// Rounds `value` to the nearest multiple of `precision` (no-op for zero).
pub fn round_to_precision(value: f32, precision: f32) -> f32 {
    if precision <= 0.0 {
        value
    } else {
        (value / precision).round() * precision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_transform_keeps_point_on_plane() {
        let plane = Plane::new(2.0, Vec3::Y);
        let matrix = Mat4::from_scale_rotation_translation(
            Vec3::splat(3.0),
            Quat::IDENTITY,
            Vec3::new(0.0, 1.0, 0.0),
        );
        let moved = plane.transformed(&matrix);
        assert!((moved.distance - 7.0).abs() < 1.0e-4);
        assert!((moved.normal - Vec3::Y).length() < 1.0e-5);
        let back = moved.transformed(&matrix.inverse());
        assert!((back.distance - 2.0).abs() < 1.0e-4);
    }

    #[test]
    fn dimensionality_letters() {
        let dims = Dimensionality::from_letters("xz");
        assert!(dims.has_dimension(0));
        assert!(!dims.has_dimension(1));
        assert!(dims.has_dimension(2));
        assert_eq!(dims.count(), 2);
        assert_eq!(dims.as_string(), "XZ");
    }

    #[test]
    fn snap_to_axis_prefers_enumeration_order() {
        let (dim, axis) = snap_to_axis(Vec3::new(0.05, -1.0, 0.0), 10.0).expect("snap");
        assert_eq!(dim, 1);
        assert_eq!(axis, Vec3::NEG_Y);
        assert!(snap_to_axis(Vec3::new(1.0, 1.0, 0.0), 10.0).is_none());
    }

    #[test]
    fn signed_angle_has_direction() {
        let angle = signed_angle_deg(Vec3::X, Vec3::NEG_Z, Vec3::Y);
        assert!((angle - 90.0).abs() < 1.0e-3);
        let angle = signed_angle_deg(Vec3::X, Vec3::Z, Vec3::Y);
        assert!((angle + 90.0).abs() < 1.0e-3);
    }

    #[test]
    fn twist_angle_recovers_axis_rotation() {
        let rot = Quat::from_axis_angle(Vec3::Y, 30.0_f32.to_radians());
        assert!((twist_angle_deg(rot, Vec3::Y) - 30.0).abs() < 1.0e-3);
        assert!((twist_angle_deg(rot, Vec3::NEG_Y) + 30.0).abs() < 1.0e-3);
    }

    #[test]
    fn ray_closest_line_param() {
        let ray = Ray::new(Vec3::new(0.0, 2.0, 5.0), Vec3::NEG_Z);
        let t = ray.closest_line_param(Vec3::ZERO, Vec3::Y).expect("not parallel");
        assert!((t - 2.0).abs() < 1.0e-5);
    }

    #[test]
    fn bounds_snap_to_principal_points() {
        let bounds = Bounds::new(Vec3::splat(-2.0), Vec3::splat(2.0));
        let (point, dims) = snap_to_bounds(&bounds, Vec3::new(1.9, 0.3, 5.0), 0.5);
        assert_eq!(dims.as_string(), "XY");
        assert!((point - Vec3::new(2.0, 0.0, 5.0)).length() < 1.0e-6);
    }
}
