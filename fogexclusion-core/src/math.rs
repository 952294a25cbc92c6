//! Math types for FogExclusion

pub use glam::{EulerRot, Mat4, Quat, Vec3, Vec4};

/// Tolerance used when deciding whether a rotation is the identity.
///
/// A unit quaternion `q` counts as identity when `|dot(q, IDENTITY)| >= 1 - ROTATION_EPSILON`,
/// so both `q` and `-q` (the same rotation) compare equal to identity.
///
/// Since `dot(q, IDENTITY) = cos(angle / 2)`, this accepts rotations of up to
/// `2 * acos(1 - 1e-5)`, about 0.51°, as unrotated. Such boxes take the
/// axis-aligned path, which differs from the exact rotated box by at most
/// `extent * sin(0.51°)` (under 1 cm per metre of extent) near the corners.
pub const ROTATION_EPSILON: f32 = 1e-5;

/// World-space placement of a volume: translation, rotation and non-uniform scale.
///
/// Applied in scale → rotation → translation order, the same order as
/// [`Mat4::from_scale_rotation_translation`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    pub fn from_translation_scale(translation: Vec3, scale: Vec3) -> Self {
        Self {
            translation,
            scale,
            ..Self::identity()
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Local-to-world matrix, built from [`unit_rotation`](Self::unit_rotation).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.unit_rotation(), self.translation)
    }

    /// The rotation scaled to unit length.
    ///
    /// A zero or non-finite quaternion yields identity, matching
    /// [`is_identity_rotation`].
    pub fn unit_rotation(&self) -> Quat {
        let length = self.rotation.length();
        if length == 0.0 || !length.is_finite() {
            return Quat::IDENTITY;
        }
        self.rotation * (1.0 / length)
    }

    /// World-to-local matrix, or `None` when the transform cannot be inverted
    /// (a zero scale axis or non-finite components).
    pub fn inverse_matrix(&self) -> Option<Mat4> {
        if !self.is_finite() || self.scale.cmpeq(Vec3::ZERO).any() {
            return None;
        }

        let inverse = self.matrix().inverse();
        inverse.is_finite().then_some(inverse)
    }

    /// Returns true if the rotation differs from identity by more than [`ROTATION_EPSILON`].
    pub fn is_rotated(&self) -> bool {
        !is_identity_rotation(self.rotation)
    }

    pub fn is_finite(&self) -> bool {
        self.translation.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Identity test for rotations, tolerant of float noise and quaternion sign.
pub fn is_identity_rotation(rotation: Quat) -> bool {
    let length = rotation.length();
    if length == 0.0 || !length.is_finite() {
        // Not a rotation at all; treat as identity so it takes the unrotated path.
        return true;
    }
    (rotation.dot(Quat::IDENTITY) / length).abs() >= 1.0 - ROTATION_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_rotation_policy() {
        assert!(is_identity_rotation(Quat::IDENTITY));
        assert!(is_identity_rotation(-Quat::IDENTITY));
        assert!(is_identity_rotation(Quat::from_rotation_y(1e-4)));
        assert!(!is_identity_rotation(Quat::from_rotation_y(0.1)));
        assert!(!is_identity_rotation(Quat::from_rotation_x(
            std::f32::consts::FRAC_PI_2
        )));
    }

    #[test]
    fn test_identity_tolerance_is_about_half_a_degree() {
        assert!(is_identity_rotation(Quat::from_rotation_y(0.5f32.to_radians())));
        assert!(!is_identity_rotation(Quat::from_rotation_y(0.6f32.to_radians())));
        assert!(!is_identity_rotation(Quat::from_rotation_z(-0.6f32.to_radians())));
    }

    #[test]
    fn test_matrix_ignores_rotation_length() {
        let rotation = Quat::from_rotation_y(0.8);
        let unit = Transform::new(Vec3::X, rotation, Vec3::splat(2.0));
        let stretched = unit.with_rotation(rotation * 2.0);

        assert!(stretched.unit_rotation().is_normalized());
        assert!(stretched.matrix().abs_diff_eq(unit.matrix(), 1e-5));

        let zero = unit.with_rotation(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0));
        assert_eq!(zero.unit_rotation(), Quat::IDENTITY);
    }

    #[test]
    fn test_inverse_maps_translation_to_origin() {
        let transform = Transform::new(
            Vec3::new(3.0, -2.0, 5.0),
            Quat::from_rotation_z(0.7),
            Vec3::new(2.0, 4.0, 0.5),
        );
        let inverse = transform.inverse_matrix().unwrap();
        let local = inverse.transform_point3(transform.translation);
        assert!(local.length() < 1e-5);
    }

    #[test]
    fn test_zero_scale_is_not_invertible() {
        let transform = Transform::from_translation_scale(Vec3::ONE, Vec3::new(1.0, 0.0, 1.0));
        assert!(transform.inverse_matrix().is_none());
    }

    #[test]
    fn test_non_finite_is_not_invertible() {
        let transform = Transform::from_translation(Vec3::new(f32::NAN, 0.0, 0.0));
        assert!(!transform.is_finite());
        assert!(transform.inverse_matrix().is_none());
    }
}
