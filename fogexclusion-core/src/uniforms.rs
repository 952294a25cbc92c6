//! CPU mirror of the fog shader's exclusion test.
//!
//! [`ExclusionUniforms`] is the published state as the shader sees it: five global
//! values read back by identifier. Its inside test follows the shader contract
//! exactly, so it can be used to check published data, drive CPU-side effects
//! (particles, audio) that should agree with the fog, or visualize exclusion.

use crate::manager::{MAX_EXCLUSION_VOLUMES, PackedExclusionData};
use crate::math::{Mat4, Vec3, Vec4};
use crate::sink::{UniformStore, properties};

/// Published exclusion state.
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionUniforms {
    pub positions: [Vec4; MAX_EXCLUSION_VOLUMES],
    pub half_sizes: [Vec4; MAX_EXCLUSION_VOLUMES],
    pub world_to_local: [Mat4; MAX_EXCLUSION_VOLUMES],
    pub use_rotation: [f32; MAX_EXCLUSION_VOLUMES],
    pub count: i32,
}

impl ExclusionUniforms {
    /// Reads the published values back from a store.
    ///
    /// Returns `None` if any identifier is missing or has the wrong type. Arrays
    /// shorter than the capacity are padded with empty slots, longer ones are cut.
    pub fn from_store(store: &UniformStore) -> Option<Self> {
        let positions = store.vector_array(properties::POSITIONS)?;
        let half_sizes = store.vector_array(properties::SIZES)?;
        let world_to_local = store.matrix_array(properties::WORLD_TO_LOCAL)?;
        let use_rotation = store.float_array(properties::USE_ROTATION)?;
        let count = store.integer(properties::COUNT)?;

        Some(Self {
            positions: fixed(positions, Vec4::ZERO),
            half_sizes: fixed(half_sizes, Vec4::ZERO),
            world_to_local: fixed(world_to_local, Mat4::IDENTITY),
            use_rotation: fixed(use_rotation, 0.0),
            count,
        })
    }

    pub fn from_packed(packed: &PackedExclusionData) -> Self {
        Self {
            positions: packed.positions,
            half_sizes: packed.half_sizes,
            world_to_local: packed.world_to_local,
            use_rotation: packed.use_rotation,
            count: packed.count as i32,
        }
    }

    /// Live slot count clamped to `0..=MAX_EXCLUSION_VOLUMES`.
    pub fn live_count(&self) -> usize {
        (self.count.max(0) as usize).min(MAX_EXCLUSION_VOLUMES)
    }

    /// Inside test for slot `index`.
    ///
    /// Empty slots (zero half size) never contain anything. Unrotated slots use
    /// the axis-aligned test against center and half size; rotated ones map the
    /// point into the unit cube. Both bounds are inclusive.
    pub fn slot_contains(&self, index: usize, point: Vec3) -> bool {
        if index >= MAX_EXCLUSION_VOLUMES {
            return false;
        }

        let half_size = self.half_sizes[index].truncate();
        if half_size == Vec3::ZERO {
            return false;
        }

        if self.use_rotation[index] == 0.0 {
            let offset = (point - self.positions[index].truncate()).abs();
            offset.cmple(half_size.abs()).all()
        } else {
            let local = self.world_to_local[index].transform_point3(point);
            local.abs().cmple(Vec3::splat(0.5)).all()
        }
    }

    /// First live slot containing `point`.
    pub fn containing_slot(&self, point: Vec3) -> Option<usize> {
        (0..self.live_count()).find(|&index| self.slot_contains(index, point))
    }

    pub fn contains(&self, point: Vec3) -> bool {
        self.containing_slot(point).is_some()
    }

    /// Fog multiplier at `point`: 0.0 inside any exclusion volume, 1.0 elsewhere.
    pub fn fog_visibility(&self, point: Vec3) -> f32 {
        if self.contains(point) { 0.0 } else { 1.0 }
    }
}

fn fixed<T: Copy>(values: &[T], fill: T) -> [T; MAX_EXCLUSION_VOLUMES] {
    let mut out = [fill; MAX_EXCLUSION_VOLUMES];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = *value;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::PackedSlot;
    use crate::math::{Quat, Transform};
    use crate::volume::ExclusionVolume;

    fn uniforms_for(volumes: &[ExclusionVolume]) -> ExclusionUniforms {
        let mut packed = PackedExclusionData::new();
        for (index, volume) in volumes.iter().enumerate() {
            packed.set_slot(index, PackedSlot::from_volume(volume).unwrap());
        }
        packed.count = volumes.len();
        ExclusionUniforms::from_packed(&packed)
    }

    #[test]
    fn test_center_is_inside() {
        let center = Vec3::new(4.0, -1.0, 7.5);
        let uniforms = uniforms_for(&[ExclusionVolume::from_center_size(
            center,
            Vec3::new(0.2, 3.0, 1.0),
        )]);
        assert!(uniforms.contains(center));
        assert_eq!(uniforms.fog_visibility(center), 0.0);
    }

    #[test]
    fn test_face_is_inside() {
        let uniforms = uniforms_for(&[ExclusionVolume::from_center_size(
            Vec3::ZERO,
            Vec3::new(2.0, 2.0, 2.0),
        )]);
        assert!(uniforms.contains(Vec3::new(1.0, 0.3, -0.9)));
        assert!(uniforms.contains(Vec3::new(1.0, 1.0, 1.0)));
        assert!(!uniforms.contains(Vec3::new(1.001, 0.0, 0.0)));
        assert_eq!(uniforms.fog_visibility(Vec3::new(0.0, 2.0, 0.0)), 1.0);
    }

    #[test]
    fn test_rotated_box_uses_matrix() {
        let volume = ExclusionVolume::new(
            Transform::from_translation_scale(Vec3::ZERO, Vec3::new(4.0, 1.0, 1.0))
                .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)),
        );
        let uniforms = uniforms_for(&[volume]);
        assert_eq!(uniforms.use_rotation[0], 1.0);

        // The long axis now runs along Z.
        assert!(uniforms.contains(Vec3::new(0.0, 0.0, 1.9)));
        assert!(!uniforms.contains(Vec3::new(1.9, 0.0, 0.0)));
    }

    #[test]
    fn test_rotated_face_is_inside() {
        let volume = ExclusionVolume::new(
            Transform::from_translation_scale(Vec3::new(5.0, 0.0, 0.0), Vec3::splat(2.0))
                .with_rotation(Quat::from_rotation_z(0.3)),
        );
        let face = volume.local_to_world().transform_point3(Vec3::new(0.5, 0.0, 0.0));
        let uniforms = uniforms_for(&[volume]);
        // Within float error of the face; nudge slightly inward.
        let inward = face + (Vec3::new(5.0, 0.0, 0.0) - face) * 1e-5;
        assert!(uniforms.contains(inward));
    }

    #[test]
    fn test_exact_rotated_faces_are_inside() {
        // Box centered at (4, 0, 0), size 2, turned 90° about Y, with an exact matrix.
        let mut uniforms = uniforms_for(&[]);
        uniforms.positions[0] = Vec4::new(4.0, 0.0, 0.0, 0.0);
        uniforms.half_sizes[0] = Vec4::new(1.0, 1.0, 1.0, 0.0);
        uniforms.world_to_local[0] = Mat4::from_cols(
            Vec4::new(0.0, 0.0, -0.5, 0.0),
            Vec4::new(0.0, 0.5, 0.0, 0.0),
            Vec4::new(0.5, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 2.0, 1.0),
        );
        uniforms.use_rotation[0] = 1.0;
        uniforms.count = 1;

        assert!(uniforms.contains(Vec3::new(4.0, 0.0, 1.0)));
        assert!(uniforms.contains(Vec3::new(3.0, 0.0, 0.0)));
        assert!(uniforms.contains(Vec3::new(5.0, -1.0, -1.0)));
        assert!(!uniforms.contains(Vec3::new(4.0, 0.0, 1.001)));
        assert!(!uniforms.contains(Vec3::new(2.999, 0.0, 0.0)));
        assert!(!uniforms.contains(Vec3::new(4.0, 1.001, 0.0)));
    }

    #[test]
    fn test_unnormalized_rotation_keeps_box_size() {
        let rotation = Quat::from_rotation_y(0.8);
        let volume = ExclusionVolume::new(
            Transform::from_translation_scale(Vec3::ZERO, Vec3::splat(2.0))
                .with_rotation(rotation * 2.0),
        );
        let uniforms = uniforms_for(&[volume]);
        assert_eq!(uniforms.use_rotation[0], 1.0);
        assert_eq!(uniforms.half_sizes[0], Vec4::new(1.0, 1.0, 1.0, 0.0));

        assert!(uniforms.contains(rotation * Vec3::new(0.9, 0.0, 0.0)));
        assert!(!uniforms.contains(rotation * Vec3::new(2.8, 0.0, 0.0)));
        assert!(!uniforms.contains(rotation * Vec3::new(0.0, 0.0, 1.2)));
    }

    #[test]
    fn test_slots_past_count_are_ignored() {
        let mut uniforms = uniforms_for(&[
            ExclusionVolume::from_center_size(Vec3::ZERO, Vec3::ONE),
            ExclusionVolume::from_center_size(Vec3::new(10.0, 0.0, 0.0), Vec3::ONE),
        ]);
        uniforms.count = 1;
        assert!(uniforms.contains(Vec3::ZERO));
        assert!(!uniforms.contains(Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(uniforms.containing_slot(Vec3::ZERO), Some(0));
    }

    #[test]
    fn test_empty_slot_never_contains() {
        let mut uniforms = uniforms_for(&[]);
        uniforms.count = 3;
        // Identity matrix would accept the origin; the zero half size rejects it.
        assert!(!uniforms.contains(Vec3::ZERO));
    }

    #[test]
    fn test_from_store_pads_short_arrays() {
        use crate::sink::UniformSink;

        let mut store = UniformStore::new();
        assert!(ExclusionUniforms::from_store(&store).is_none());

        store.set_vector_array(properties::POSITIONS, &[Vec4::new(1.0, 0.0, 0.0, 0.0)]);
        store.set_vector_array(properties::SIZES, &[Vec4::new(0.5, 0.5, 0.5, 0.0)]);
        store.set_matrix_array(properties::WORLD_TO_LOCAL, &[]);
        store.set_float_array(properties::USE_ROTATION, &[0.0]);
        store.set_integer(properties::COUNT, 42);

        let uniforms = ExclusionUniforms::from_store(&store).unwrap();
        assert_eq!(uniforms.live_count(), MAX_EXCLUSION_VOLUMES);
        assert_eq!(uniforms.world_to_local[0], Mat4::IDENTITY);
        assert_eq!(uniforms.half_sizes[1], Vec4::ZERO);
        assert!(uniforms.contains(Vec3::new(1.4, 0.0, 0.0)));
    }
}
