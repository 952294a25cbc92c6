//! Host-side storage for exclusion volumes.
//!
//! The scene owns volumes and hands out [`VolumeId`] handles. Managers keep
//! handles, never the volumes themselves, and resolve them through
//! [`VolumeSource`] every time they publish. A handle whose volume was removed
//! simply stops resolving.

use crate::error::{FogExclusionError, Result};
use crate::math::Transform;
use crate::volume::ExclusionVolume;
use std::collections::HashMap;

/// Lightweight, type-safe handle for exclusion volumes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VolumeId(u64);

impl VolumeId {
    /// Raw handle value; only meaningful to the scene that issued it.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for VolumeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VolumeId({})", self.0)
    }
}

/// Anything that can resolve volume handles into volumes.
///
/// Implement this for your own scene graph to feed a manager directly from
/// engine-side storage instead of [`ExclusionScene`].
pub trait VolumeSource {
    fn volume(&self, id: VolumeId) -> Option<&ExclusionVolume>;
}

/// Default in-memory volume store.
#[derive(Debug, Default)]
pub struct ExclusionScene {
    volumes: HashMap<VolumeId, ExclusionVolume>,
    next_id: u64,
}

impl ExclusionScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a volume in the scene and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns [`FogExclusionError::InvalidTransform`] if the volume's transform
    /// has non-finite components or a zero-length rotation. The stored rotation
    /// is normalized.
    pub fn add_volume(&mut self, mut volume: ExclusionVolume) -> Result<VolumeId> {
        volume.transform = validate_transform(volume.transform)?;

        let id = VolumeId(self.next_id);
        self.next_id += 1;
        self.volumes.insert(id, volume);
        log::debug!("Added exclusion volume {}", id);
        Ok(id)
    }

    /// Removes a volume. Handles to it held elsewhere become empty references.
    pub fn remove_volume(&mut self, id: VolumeId) -> Option<ExclusionVolume> {
        let removed = self.volumes.remove(&id);
        if removed.is_some() {
            log::debug!("Removed exclusion volume {}", id);
        }
        removed
    }

    pub fn get(&self, id: VolumeId) -> Option<&ExclusionVolume> {
        self.volumes.get(&id)
    }

    pub fn get_mut(&mut self, id: VolumeId) -> Option<&mut ExclusionVolume> {
        self.volumes.get_mut(&id)
    }

    pub fn contains(&self, id: VolumeId) -> bool {
        self.volumes.contains_key(&id)
    }

    /// Moves, rotates or rescales a volume.
    ///
    /// Published shader data only reflects the change after the manager's next publish.
    ///
    /// # Errors
    ///
    /// Returns an error if the volume does not exist, or the transform has
    /// non-finite components or a zero-length rotation.
    pub fn set_transform(&mut self, id: VolumeId, transform: Transform) -> Result<()> {
        let transform = validate_transform(transform)?;
        let volume = self
            .volumes
            .get_mut(&id)
            .ok_or(FogExclusionError::VolumeNotFound(id))?;
        volume.transform = transform;
        Ok(())
    }

    /// Returns all handles in creation order.
    pub fn ids(&self) -> Vec<VolumeId> {
        let mut ids: Vec<VolumeId> = self.volumes.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (VolumeId, &ExclusionVolume)> {
        self.volumes.iter().map(|(id, volume)| (*id, volume))
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }
}

impl VolumeSource for ExclusionScene {
    fn volume(&self, id: VolumeId) -> Option<&ExclusionVolume> {
        self.get(id)
    }
}

/// Rejects transforms the shader data cannot represent and normalizes the rotation.
fn validate_transform(transform: Transform) -> Result<Transform> {
    if !transform.is_finite() {
        return Err(FogExclusionError::InvalidTransform(format!(
            "non-finite component in {:?}",
            transform
        )));
    }
    if transform.rotation.length_squared() == 0.0 {
        return Err(FogExclusionError::InvalidTransform(format!(
            "zero-length rotation in {:?}",
            transform
        )));
    }
    Ok(transform.with_rotation(transform.unit_rotation()))
}
