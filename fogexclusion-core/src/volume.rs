//! Exclusion volume descriptor.
//!
//! A volume is pure data: a unit cube `[-0.5, 0.5]^3` placed in the world by its
//! [`Transform`], plus the color and display flag used to visualize it. It has no
//! behavior; the [`ExclusionManager`](crate::ExclusionManager) reads its transform.

use crate::math::{Mat4, Transform, Vec3, Vec4};

/// Linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with a different alpha.
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }
}

/// Fog exclusion zone placed in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionVolume {
    /// World placement of the unit cube
    pub transform: Transform,
    /// Color used to visualize this volume
    pub gizmo_color: Rgba,
    /// Whether the gizmo is drawn when the volume is not selected
    pub always_show_gizmo: bool,
}

impl ExclusionVolume {
    pub const DEFAULT_GIZMO_COLOR: Rgba = Rgba::new(1.0, 0.3, 0.3, 0.3);

    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            ..Default::default()
        }
    }

    /// Axis-aligned box centered at `center` with full edge lengths `size`.
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        Self::new(Transform::from_translation_scale(center, size))
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.gizmo_color = color;
        self
    }

    pub fn with_always_show_gizmo(mut self, always_show: bool) -> Self {
        self.always_show_gizmo = always_show;
        self
    }

    /// World-space center of the box.
    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }

    /// Half of the world-space edge lengths.
    pub fn half_extent(&self) -> Vec3 {
        self.transform.scale * 0.5
    }

    pub fn local_to_world(&self) -> Mat4 {
        self.transform.matrix()
    }

    pub fn world_to_local(&self) -> Option<Mat4> {
        self.transform.inverse_matrix()
    }

    /// Returns the 8 world-space corners of the box.
    pub fn corners(&self) -> [Vec3; 8] {
        let matrix = self.local_to_world();
        let mut corners = [Vec3::ZERO; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            let local = Vec3::new(
                if i & 1 == 0 { -0.5 } else { 0.5 },
                if i & 2 == 0 { -0.5 } else { 0.5 },
                if i & 4 == 0 { -0.5 } else { 0.5 },
            );
            *corner = matrix.transform_point3(local);
        }
        corners
    }
}

impl Default for ExclusionVolume {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            gizmo_color: Self::DEFAULT_GIZMO_COLOR,
            always_show_gizmo: true,
        }
    }
}
