//! Exclusion volume aggregation and uniform publishing.
//!
//! [`ExclusionManager`] owns an ordered list of volume handles and a fixed set of
//! [`MAX_EXCLUSION_VOLUMES`] packed slots. Every publish rebuilds all slots from
//! the volumes' current transforms and writes them, plus the live count, to the
//! manager's [`UniformSink`].
//!
//! # Update cadence
//!
//! The manager has no timer of its own. The host calls [`ExclusionManager::tick`]
//! once per frame with a monotonic timestamp, and the configured
//! [`UpdatePolicy`] decides whether that tick publishes.
//!
//! # Failure model
//!
//! Nothing on the publish path fails. Publishing before initialization does
//! nothing, entries past the capacity are ignored, and a missing or degenerate
//! volume leaves its slot empty. The published arrays are always complete.

use crate::config::{ExclusionManagerDesc, UpdatePolicy};
use crate::math::{Mat4, Vec4};
use crate::scene::{VolumeId, VolumeSource};
use crate::sink::{UniformSink, properties};
use crate::volume::ExclusionVolume;
use std::time::Duration;

/// Maximum number of simultaneously active exclusion volumes.
///
/// Must match the array sizes declared by the fog shader.
pub const MAX_EXCLUSION_VOLUMES: usize = 8;

/// Shader-ready data for all slots.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedExclusionData {
    /// Box centers, `w = 0`.
    pub positions: [Vec4; MAX_EXCLUSION_VOLUMES],
    /// Half extents along the box's local axes, `w = 0`.
    pub half_sizes: [Vec4; MAX_EXCLUSION_VOLUMES],
    pub world_to_local: [Mat4; MAX_EXCLUSION_VOLUMES],
    /// 1.0 if the box is rotated, else 0.0.
    pub use_rotation: [f32; MAX_EXCLUSION_VOLUMES],
    /// Number of leading live slots, at most [`MAX_EXCLUSION_VOLUMES`].
    pub count: usize,
}

/// One slot of [`PackedExclusionData`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackedSlot {
    pub position: Vec4,
    pub half_size: Vec4,
    pub world_to_local: Mat4,
    pub use_rotation: bool,
}

impl PackedSlot {
    pub const EMPTY: Self = Self {
        position: Vec4::ZERO,
        half_size: Vec4::ZERO,
        world_to_local: Mat4::IDENTITY,
        use_rotation: false,
    };

    /// Packs a volume, or returns `None` if its transform has no inverse.
    pub fn from_volume(volume: &ExclusionVolume) -> Option<Self> {
        let world_to_local = volume.world_to_local()?;
        Some(Self {
            position: volume.position().extend(0.0),
            half_size: volume.half_extent().extend(0.0),
            world_to_local,
            use_rotation: volume.transform.is_rotated(),
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl PackedExclusionData {
    /// All slots empty and a count of zero.
    pub fn new() -> Self {
        Self {
            positions: [Vec4::ZERO; MAX_EXCLUSION_VOLUMES],
            half_sizes: [Vec4::ZERO; MAX_EXCLUSION_VOLUMES],
            world_to_local: [Mat4::IDENTITY; MAX_EXCLUSION_VOLUMES],
            use_rotation: [0.0; MAX_EXCLUSION_VOLUMES],
            count: 0,
        }
    }

    /// Returns slot `index`, or `None` if the index is out of range.
    pub fn slot(&self, index: usize) -> Option<PackedSlot> {
        (index < MAX_EXCLUSION_VOLUMES).then(|| PackedSlot {
            position: self.positions[index],
            half_size: self.half_sizes[index],
            world_to_local: self.world_to_local[index],
            use_rotation: self.use_rotation[index] != 0.0,
        })
    }

    /// Overwrites slot `index`. Indices past the capacity are ignored.
    pub fn set_slot(&mut self, index: usize, slot: PackedSlot) {
        if index >= MAX_EXCLUSION_VOLUMES {
            return;
        }
        self.positions[index] = slot.position;
        self.half_sizes[index] = slot.half_size;
        self.world_to_local[index] = slot.world_to_local;
        self.use_rotation[index] = if slot.use_rotation { 1.0 } else { 0.0 };
    }

    pub fn clear_slot(&mut self, index: usize) {
        self.set_slot(index, PackedSlot::EMPTY);
    }

    /// Writes all five global values.
    pub fn write_to<S: UniformSink + ?Sized>(&self, sink: &mut S) {
        sink.set_vector_array(properties::POSITIONS, &self.positions);
        sink.set_vector_array(properties::SIZES, &self.half_sizes);
        sink.set_matrix_array(properties::WORLD_TO_LOCAL, &self.world_to_local);
        sink.set_integer(properties::COUNT, self.count as i32);
        sink.set_float_array(properties::USE_ROTATION, &self.use_rotation);
    }
}

impl Default for PackedExclusionData {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of one publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishReport {
    /// Published live count.
    pub count: usize,
    /// Slots filled from a volume.
    pub resolved: usize,
    /// Live slots left empty because their handle was unset or no longer resolves.
    pub missing: usize,
    /// Live slots left empty because the volume's transform cannot be inverted.
    pub degenerate: usize,
    /// Assigned handles beyond capacity that were ignored.
    pub truncated: usize,
}

impl PublishReport {
    /// True if every assigned handle made it into a slot.
    pub fn is_clean(&self) -> bool {
        self.missing == 0 && self.degenerate == 0 && self.truncated == 0
    }
}

/// Collects exclusion volumes and publishes them to the fog shader.
///
/// Use one manager per scene: every manager writes the same global identifiers.
pub struct ExclusionManager<S: UniformSink> {
    desc: ExclusionManagerDesc,
    sink: S,
    volumes: Vec<Option<VolumeId>>,
    packed: Option<PackedExclusionData>,
    last_update: Duration,
    last_report: Option<PublishReport>,
    publish_count: u64,
}

impl<S: UniformSink> ExclusionManager<S> {
    /// Creates a manager that writes through `sink`.
    ///
    /// Nothing is published until [`initialize`](Self::initialize) runs.
    pub fn new(desc: ExclusionManagerDesc, sink: S) -> Self {
        Self {
            desc,
            sink,
            volumes: Vec::new(),
            packed: None,
            last_update: Duration::ZERO,
            last_report: None,
            publish_count: 0,
        }
    }

    pub fn desc(&self) -> &ExclusionManagerDesc {
        &self.desc
    }

    /// Changes the update cadence. Takes effect on the next tick.
    pub fn set_desc(&mut self, desc: ExclusionManagerDesc) {
        self.desc = desc;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consumes the manager and returns its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn is_initialized(&self) -> bool {
        self.packed.is_some()
    }

    /// Packed data from the last publish, or `None` before initialization.
    pub fn packed(&self) -> Option<&PackedExclusionData> {
        self.packed.as_ref()
    }

    /// Number of publishes performed so far.
    pub fn publish_count(&self) -> u64 {
        self.publish_count
    }

    pub fn last_report(&self) -> Option<PublishReport> {
        self.last_report
    }

    /// Assigned handles, in slot order. May be longer than the capacity.
    pub fn volumes(&self) -> &[Option<VolumeId>] {
        &self.volumes
    }

    /// Assigned handles counted toward the published count.
    pub fn live_count(&self) -> usize {
        self.volumes.len().min(MAX_EXCLUSION_VOLUMES)
    }

    /// Replaces the assigned handles. `None` entries occupy a slot but exclude nothing.
    pub fn set_volumes<I>(&mut self, volumes: I)
    where
        I: IntoIterator<Item = Option<VolumeId>>,
    {
        self.volumes = volumes.into_iter().collect();
        self.warn_about_assignment();
    }

    /// Appends a handle at the end of the list.
    pub fn push_volume(&mut self, id: VolumeId) {
        self.volumes.push(Some(id));
        if self.volumes.len() == MAX_EXCLUSION_VOLUMES + 1 {
            self.warn_about_assignment();
        }
    }

    /// Assigns `id` to position `index`, growing the list with empty entries if needed.
    pub fn set_slot(&mut self, index: usize, id: Option<VolumeId>) {
        if index >= self.volumes.len() {
            let Some(len) = index.checked_add(1) else {
                log::warn!("Exclusion slot index {} is out of range, ignoring", index);
                return;
            };
            self.volumes.resize(len, None);
        }
        self.volumes[index] = id;
    }

    /// Drops every handle equal to `id`, shifting later handles down.
    pub fn remove_volume(&mut self, id: VolumeId) {
        self.volumes.retain(|entry| *entry != Some(id));
    }

    pub fn clear_volumes(&mut self) {
        self.volumes.clear();
    }

    /// Allocates the packed slots and performs the initial publish.
    ///
    /// `now` seeds the interval gate. Runs once; later calls are ignored.
    pub fn initialize<V: VolumeSource + ?Sized>(
        &mut self,
        source: &V,
        now: Duration,
    ) -> Option<PublishReport> {
        if self.is_initialized() {
            log::warn!("Exclusion manager is already initialized, ignoring");
            return None;
        }

        self.packed = Some(PackedExclusionData::new());
        self.last_update = now;
        log::debug!(
            "Exclusion manager initialized with policy {:?}",
            self.desc.policy()
        );

        self.publish(source)
    }

    /// Scheduler callback. Publishes if the update policy allows it at `now`.
    ///
    /// Returns the report of the publish, or `None` if this tick was skipped.
    pub fn tick<V: VolumeSource + ?Sized>(
        &mut self,
        source: &V,
        now: Duration,
    ) -> Option<PublishReport> {
        if !self.is_initialized() {
            return None;
        }

        match self.desc.policy() {
            UpdatePolicy::OnDemand => None,
            UpdatePolicy::EveryTick => self.publish(source),
            UpdatePolicy::Interval(interval) => {
                if now.saturating_sub(self.last_update) < interval {
                    return None;
                }
                let report = self.publish(source);
                self.last_update = now;
                report
            }
        }
    }

    /// Rebuilds every slot from the current volume transforms and writes the result.
    ///
    /// Does nothing and returns `None` before [`initialize`](Self::initialize).
    pub fn publish<V: VolumeSource + ?Sized>(&mut self, source: &V) -> Option<PublishReport> {
        let packed = self.packed.as_mut()?;

        let count = self.volumes.len().min(MAX_EXCLUSION_VOLUMES);
        let mut report = PublishReport {
            count,
            truncated: self.volumes.len() - count,
            ..Default::default()
        };

        for index in 0..MAX_EXCLUSION_VOLUMES {
            if index >= count {
                packed.clear_slot(index);
                continue;
            }

            let Some(volume) = self.volumes[index].and_then(|id| source.volume(id)) else {
                report.missing += 1;
                packed.clear_slot(index);
                continue;
            };

            match PackedSlot::from_volume(volume) {
                Some(slot) => {
                    report.resolved += 1;
                    packed.set_slot(index, slot);
                }
                None => {
                    report.degenerate += 1;
                    packed.clear_slot(index);
                }
            }
        }
        packed.count = count;
        packed.write_to(&mut self.sink);

        if self.last_report.is_none_or(|last| {
            last.missing != report.missing || last.degenerate != report.degenerate
        }) {
            if report.missing > 0 {
                log::warn!(
                    "{} exclusion slot(s) have no volume and exclude nothing",
                    report.missing
                );
            }
            if report.degenerate > 0 {
                log::warn!(
                    "{} exclusion volume(s) have a zero-size axis or non-finite transform and were left empty",
                    report.degenerate
                );
            }
        }

        self.publish_count += 1;
        self.last_report = Some(report);
        log::trace!("Published exclusion volumes: {:?}", report);
        Some(report)
    }

    fn warn_about_assignment(&self) {
        if self.volumes.len() > MAX_EXCLUSION_VOLUMES {
            log::warn!(
                "{} exclusion volumes assigned, only the first {} are used",
                self.volumes.len(),
                MAX_EXCLUSION_VOLUMES
            );
        }
        let unset = self.volumes[..self.live_count()]
            .iter()
            .filter(|entry| entry.is_none())
            .count();
        if unset > 0 {
            log::warn!("{} exclusion slot(s) assigned without a volume", unset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Quat, Transform, Vec3};
    use crate::scene::ExclusionScene;
    use crate::sink::{RecordingSink, UniformValue};

    fn scene_with(count: usize) -> (ExclusionScene, Vec<VolumeId>) {
        let mut scene = ExclusionScene::new();
        let ids = (0..count)
            .map(|i| {
                scene
                    .add_volume(ExclusionVolume::from_center_size(
                        Vec3::new(i as f32 * 10.0, 1.0, 0.0),
                        Vec3::new(2.0, 4.0, 6.0),
                    ))
                    .unwrap()
            })
            .collect();
        (scene, ids)
    }

    fn manager() -> ExclusionManager<RecordingSink> {
        ExclusionManager::new(ExclusionManagerDesc::default(), RecordingSink::new())
    }

    #[test]
    fn test_publish_before_initialize_is_noop() {
        let (scene, ids) = scene_with(2);
        let mut manager = manager();
        manager.set_volumes(ids.into_iter().map(Some));

        assert!(manager.publish(&scene).is_none());
        assert!(manager.tick(&scene, Duration::from_secs(1)).is_none());
        assert!(manager.sink().is_empty());
        assert!(manager.packed().is_none());
    }

    #[test]
    fn test_initialize_publishes_once() {
        let (scene, ids) = scene_with(3);
        let mut manager = manager();
        manager.set_volumes(ids.into_iter().map(Some));

        let report = manager.initialize(&scene, Duration::ZERO).unwrap();
        assert_eq!(report.count, 3);
        assert_eq!(report.resolved, 3);
        assert!(report.is_clean());
        assert_eq!(manager.sink().len(), 5);
        assert_eq!(manager.publish_count(), 1);

        assert!(manager.initialize(&scene, Duration::ZERO).is_none());
        assert_eq!(manager.publish_count(), 1);
    }

    #[test]
    fn test_writes_all_identifiers_in_order() {
        let (scene, ids) = scene_with(1);
        let mut manager = manager();
        manager.set_volumes(ids.into_iter().map(Some));
        manager.initialize(&scene, Duration::ZERO);

        let ids: Vec<&str> = manager.sink().calls().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                properties::POSITIONS,
                properties::SIZES,
                properties::WORLD_TO_LOCAL,
                properties::COUNT,
                properties::USE_ROTATION,
            ]
        );
        assert_eq!(manager.sink().last(properties::COUNT), Some(&UniformValue::Integer(1)));
    }

    #[test]
    fn test_packs_volume_fields() {
        let mut scene = ExclusionScene::new();
        let rotation = Quat::from_rotation_y(0.5);
        let id = scene
            .add_volume(ExclusionVolume::new(Transform::new(
                Vec3::new(1.0, 2.0, 3.0),
                rotation,
                Vec3::new(4.0, 6.0, 8.0),
            )))
            .unwrap();

        let mut manager = manager();
        manager.push_volume(id);
        manager.initialize(&scene, Duration::ZERO);

        let slot = manager.packed().unwrap().slot(0).unwrap();
        assert_eq!(slot.position, Vec4::new(1.0, 2.0, 3.0, 0.0));
        assert_eq!(slot.half_size, Vec4::new(2.0, 3.0, 4.0, 0.0));
        assert!(slot.use_rotation);
        let expected = scene.get(id).unwrap().world_to_local().unwrap();
        assert!(slot.world_to_local.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_count_clamped_to_capacity() {
        let (scene, ids) = scene_with(12);
        let mut manager = manager();
        manager.set_volumes(ids.into_iter().map(Some));

        let report = manager.initialize(&scene, Duration::ZERO).unwrap();
        assert_eq!(report.count, MAX_EXCLUSION_VOLUMES);
        assert_eq!(report.truncated, 4);
        assert_eq!(manager.packed().unwrap().count, 8);
        assert_eq!(manager.sink().last(properties::COUNT), Some(&UniformValue::Integer(8)));
    }

    #[test]
    fn test_missing_reference_is_empty_slot() {
        let (mut scene, ids) = scene_with(3);
        let mut manager = manager();
        manager.set_volumes(vec![Some(ids[0]), None, Some(ids[2])]);
        scene.remove_volume(ids[2]);

        let report = manager.initialize(&scene, Duration::ZERO).unwrap();
        assert_eq!(report.count, 3);
        assert_eq!(report.resolved, 1);
        assert_eq!(report.missing, 2);

        let packed = manager.packed().unwrap();
        assert!(!packed.slot(0).unwrap().is_empty());
        assert!(packed.slot(1).unwrap().is_empty());
        assert!(packed.slot(2).unwrap().is_empty());
    }

    #[test]
    fn test_degenerate_volume_is_empty_slot() {
        let mut scene = ExclusionScene::new();
        let id = scene
            .add_volume(ExclusionVolume::from_center_size(Vec3::ONE, Vec3::new(1.0, 0.0, 1.0)))
            .unwrap();
        let mut manager = manager();
        manager.push_volume(id);

        let report = manager.initialize(&scene, Duration::ZERO).unwrap();
        assert_eq!(report.degenerate, 1);
        assert_eq!(report.count, 1);
        assert!(manager.packed().unwrap().slot(0).unwrap().is_empty());
    }

    #[test]
    fn test_shrinking_list_clears_stale_slots() {
        let (scene, ids) = scene_with(5);
        let mut manager = manager();
        manager.set_volumes(ids.iter().copied().map(Some));
        manager.initialize(&scene, Duration::ZERO);

        manager.set_volumes(vec![Some(ids[4])]);
        manager.publish(&scene);

        let packed = manager.packed().unwrap();
        assert_eq!(packed.count, 1);
        assert_eq!(packed.positions[0], Vec4::new(40.0, 1.0, 0.0, 0.0));
        for index in 1..MAX_EXCLUSION_VOLUMES {
            assert!(packed.slot(index).unwrap().is_empty());
        }
    }

    #[test]
    fn test_on_demand_ticks_do_nothing() {
        let (scene, ids) = scene_with(1);
        let mut manager = manager();
        manager.set_volumes(ids.into_iter().map(Some));
        manager.initialize(&scene, Duration::ZERO);
        manager.sink_mut().take();

        for frame in 1..100 {
            assert!(manager.tick(&scene, Duration::from_millis(frame * 16)).is_none());
        }
        assert!(manager.sink().is_empty());
        assert_eq!(manager.publish_count(), 1);
    }

    #[test]
    fn test_every_tick_policy() {
        let (scene, ids) = scene_with(1);
        let mut manager = ExclusionManager::new(ExclusionManagerDesc::every_tick(), RecordingSink::new());
        manager.set_volumes(ids.into_iter().map(Some));
        manager.initialize(&scene, Duration::ZERO);

        for frame in 1..=10 {
            assert!(manager.tick(&scene, Duration::from_millis(frame)).is_some());
        }
        assert_eq!(manager.publish_count(), 11);
    }

    #[test]
    fn test_packed_slot_index_past_capacity_is_ignored() {
        let mut packed = PackedExclusionData::new();
        let volume = ExclusionVolume::from_center_size(Vec3::ONE, Vec3::ONE);
        let slot = PackedSlot::from_volume(&volume).unwrap();

        packed.set_slot(MAX_EXCLUSION_VOLUMES, slot);
        packed.clear_slot(usize::MAX);
        assert!(packed.slot(MAX_EXCLUSION_VOLUMES).is_none());
        assert_eq!(packed, PackedExclusionData::new());

        packed.set_slot(MAX_EXCLUSION_VOLUMES - 1, slot);
        assert_eq!(packed.slot(MAX_EXCLUSION_VOLUMES - 1), Some(slot));
    }

    #[test]
    fn test_set_slot_grows_list() {
        let mut manager = manager();
        let (_, ids) = scene_with(1);
        manager.set_slot(3, Some(ids[0]));
        assert_eq!(manager.volumes(), &[None, None, None, Some(ids[0])]);
        assert_eq!(manager.live_count(), 4);

        manager.set_slot(usize::MAX, Some(ids[0]));
        assert_eq!(manager.volumes().len(), 4);

        manager.remove_volume(ids[0]);
        assert_eq!(manager.live_count(), 3);
        manager.clear_volumes();
        assert_eq!(manager.live_count(), 0);
    }
}
