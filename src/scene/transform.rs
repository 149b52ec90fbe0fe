use glam::{Mat3, Mat4, Vec3};

/// Position, Euler rotation, and scale of a model.
///
/// # Transformation Order
///
/// [`Transform::matrix()`] composes `translation * rot_z * rot_y * rot_x * scale`:
/// the model is scaled, rotated about X, then Y, then Z, and finally translated.
///
/// The matrix is never cached. Identical field values always produce a
/// bit-identical matrix, so recomputing it every frame cannot drift.
///
/// ```
/// use lantern::{Transform, Vec3};
///
/// let transform = Transform::new()
///     .position(Vec3::new(0.0, 2.0, -5.0))
///     .rotation(Vec3::new(0.0, 35f32.to_radians(), 0.0))
///     .uniform_scale(2.0);
/// assert_eq!(transform.matrix(), transform.matrix());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// World-space position (translation).
    pub position: Vec3,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vec3,
    /// Scale factors for each axis.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Identity transform (origin, no rotation, unit scale).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Sets the Euler rotation in radians.
    pub fn rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Model-to-world matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_z(self.rotation.z)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_scale(self.scale)
    }

    /// Normal matrix for this transform's model matrix.
    pub fn normal_matrix(&self) -> Mat3 {
        normal_matrix(&self.matrix())
    }
}

/// Transpose of the inverse of the upper-left 3x3 block of `model`.
///
/// Transforms normals correctly under non-uniform scale. A singular block
/// (zero scale on some axis) yields a zero matrix rather than NaNs; tiny but
/// invertible scales still get their exact inverse.
pub fn normal_matrix(model: &Mat4) -> Mat3 {
    let upper = Mat3::from_mat4(*model);
    if upper.determinant() == 0.0 {
        return Mat3::ZERO;
    }
    let inverse = upper.inverse();
    if !inverse.is_finite() {
        return Mat3::ZERO;
    }
    inverse.transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_by_default() {
        assert_eq!(Transform::new().matrix(), Mat4::IDENTITY);
        assert_eq!(Transform::new().normal_matrix(), Mat3::IDENTITY);
    }

    #[test]
    fn matrix_is_bit_identical_across_calls() {
        let transform = Transform::new()
            .position(Vec3::new(1.25, -3.5, 0.1))
            .rotation(Vec3::new(0.3, 35f32.to_radians(), -1.1))
            .scale(Vec3::new(2.0, 0.5, 3.0));
        let copy = transform;

        let a = transform.matrix().to_cols_array();
        let b = copy.matrix().to_cols_array();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn bottom_row_stays_affine() {
        let m = Transform::new()
            .position(Vec3::new(4.0, 5.0, 6.0))
            .rotation(Vec3::new(1.0, 2.0, 3.0))
            .scale(Vec3::new(0.1, 7.0, 2.0))
            .matrix();
        assert_eq!(m.row(3), Vec4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn composition_order_is_t_rz_ry_rx_s() {
        // Scale X by 2, rotate 90 degrees about Y, then about Z, then move up.
        let m = Transform::new()
            .position(Vec3::new(0.0, 1.0, 0.0))
            .rotation(Vec3::new(0.0, FRAC_PI_2, FRAC_PI_2))
            .scale(Vec3::new(2.0, 1.0, 1.0))
            .matrix();
        // +X -> (2,0,0) -> rot_y -> (0,0,-2) -> rot_z -> (0,0,-2) -> +Y
        let p = m.transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 1.0, -2.0), 1e-5));
        // +Y -> rot_y -> +Y -> rot_z -> -X -> +Y
        let q = m.transform_point3(Vec3::Y);
        assert!(q.abs_diff_eq(Vec3::new(-1.0, 1.0, 0.0), 1e-5));
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        // Rotate 90 degrees about Z, scale (2, 3, 4).
        let transform = Transform::new()
            .rotation(Vec3::new(0.0, 0.0, FRAC_PI_2))
            .scale(Vec3::new(2.0, 3.0, 4.0));

        // Upper 3x3 = Rz * S, columns: (0,2,0), (-3,0,0), (0,0,4).
        // inverse = S^-1 * Rz^T; transpose = Rz * S^-1,
        // columns: (0,1/2,0), (-1/3,0,0), (0,0,1/4).
        let expected = Mat3::from_cols(
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::new(-1.0 / 3.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 0.25),
        );
        assert!(transform.normal_matrix().abs_diff_eq(expected, 1e-6));

        // A surface normal stays perpendicular to a transformed tangent.
        let tangent = Vec3::new(1.0, 1.0, 0.0);
        let normal = Vec3::new(1.0, -1.0, 0.0);
        let m = transform.matrix();
        let world_tangent = m.transform_vector3(tangent);
        let world_normal = transform.normal_matrix() * normal;
        assert!(world_tangent.dot(world_normal).abs() < 1e-5);
    }

    #[test]
    fn tiny_uniform_scale_keeps_its_inverse() {
        let transform = Transform::new().uniform_scale(0.001);
        let expected = Mat3::from_diagonal(Vec3::splat(1000.0));
        assert!(transform.normal_matrix().abs_diff_eq(expected, 1e-2));

        let rotated = Transform::new()
            .rotation(Vec3::new(0.0, FRAC_PI_2, 0.0))
            .uniform_scale(0.004);
        let n = rotated.normal_matrix() * Vec3::X;
        assert!(n.normalize().abs_diff_eq(Vec3::NEG_Z, 1e-5));
    }

    #[test]
    fn singular_scale_gives_zero_normal_matrix() {
        let transform = Transform::new().scale(Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(transform.normal_matrix(), Mat3::ZERO);
    }
}
