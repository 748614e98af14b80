use glam::{Mat4, Vec3};

/// Converts between the coordinates of the last node on a path and the
/// root of that path. "Object" coordinates include the node's own
/// transform, "local" coordinates stop at its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordConv {
    object_to_root: Mat4,
    local_to_root: Mat4,
}

impl Default for CoordConv {
    fn default() -> Self {
        Self {
            object_to_root: Mat4::IDENTITY,
            local_to_root: Mat4::IDENTITY,
        }
    }
}

impl CoordConv {
    /// Builds from the node matrices along a path, root first.
    pub fn from_path(matrices: &[Mat4]) -> Self {
        let Some((last, parents)) = matrices.split_last() else {
            return Self::default();
        };
        let local_to_root = parents
            .iter()
            .fold(Mat4::IDENTITY, |acc, matrix| acc * *matrix);
        Self {
            object_to_root: local_to_root * *last,
            local_to_root,
        }
    }

    pub fn object_to_root_matrix(&self) -> Mat4 {
        self.object_to_root
    }

    pub fn root_to_object_matrix(&self) -> Mat4 {
        self.object_to_root.inverse()
    }

    pub fn local_to_root_matrix(&self) -> Mat4 {
        self.local_to_root
    }

    pub fn root_to_local_matrix(&self) -> Mat4 {
        self.local_to_root.inverse()
    }

    pub fn object_to_root_point(&self, point: Vec3) -> Vec3 {
        self.object_to_root.transform_point3(point)
    }

    pub fn object_to_root_vector(&self, vector: Vec3) -> Vec3 {
        self.object_to_root.transform_vector3(vector)
    }

    pub fn root_to_object_point(&self, point: Vec3) -> Vec3 {
        self.root_to_object_matrix().transform_point3(point)
    }

    pub fn root_to_object_vector(&self, vector: Vec3) -> Vec3 {
        self.root_to_object_matrix().transform_vector3(vector)
    }

    pub fn local_to_root_point(&self, point: Vec3) -> Vec3 {
        self.local_to_root.transform_point3(point)
    }

    pub fn local_to_root_vector(&self, vector: Vec3) -> Vec3 {
        self.local_to_root.transform_vector3(vector)
    }

    pub fn root_to_local_point(&self, point: Vec3) -> Vec3 {
        self.root_to_local_matrix().transform_point3(point)
    }

    pub fn root_to_local_vector(&self, vector: Vec3) -> Vec3 {
        self.root_to_local_matrix().transform_vector3(vector)
    }
}
