//! # FogExclusion Core
//!
//! Fog exclusion volumes for baked volumetric fog.
//!
//! Designers place boxes where fog should not render. An [`ExclusionManager`]
//! packs up to [`MAX_EXCLUSION_VOLUMES`] of them into fixed-size arrays (center,
//! half size, world-to-local matrix, rotation hint) and publishes those arrays
//! plus a live count as global shader inputs. The fog shader tests each sample
//! point against the live boxes and drops fog inside any of them.
//!
//! ## Quick Start
//!
//! ```
//! use fogexclusion_core::*;
//! use std::time::Duration;
//!
//! // Host-side volume storage
//! let mut scene = ExclusionScene::new();
//! let doorway = scene.add_volume(ExclusionVolume::from_center_size(
//!     Vec3::new(0.0, 1.0, 0.0),
//!     Vec3::new(2.0, 2.0, 1.0),
//! ))?;
//!
//! // Manager publishing into an in-memory global uniform table
//! let mut manager = ExclusionManager::new(ExclusionManagerDesc::every_tick(), UniformStore::new());
//! manager.push_volume(doorway);
//! manager.initialize(&scene, Duration::ZERO);
//!
//! // Once per frame
//! manager.tick(&scene, Duration::from_millis(16));
//!
//! // Read back what the shader sees
//! let uniforms = ExclusionUniforms::from_store(manager.sink()).unwrap();
//! assert!(uniforms.contains(Vec3::new(0.0, 1.0, 0.0)));
//! # Ok::<(), FogExclusionError>(())
//! ```
//!
//! ## Key Components
//!
//! - **[`ExclusionVolume`]**: box descriptor (transform + gizmo color)
//! - **[`ExclusionScene`]**: volume store handing out [`VolumeId`] handles
//! - **[`ExclusionManager`]**: packs volumes and publishes them on its update cadence
//! - **[`UniformSink`]**: where published values go; implement it for your engine
//! - **[`ExclusionUniforms`]**: CPU mirror of the shader's inside test
//! - **[`GizmoPainter`]**: hook for drawing volume gizmos
//!
//! ## Threading
//!
//! Everything is single-threaded and driven by the host's frame loop. Only one
//! manager should publish per scene, since all managers write the same global
//! identifiers.

pub mod config;
pub mod error;
pub mod gizmo;
pub mod manager;
pub mod math;
pub mod scene;
pub mod sink;
pub mod uniforms;
pub mod volume;

pub use config::{ExclusionManagerDesc, UpdatePolicy};
pub use error::FogExclusionError;
pub use gizmo::{GizmoBox, GizmoPainter, collect_gizmos, draw_gizmos, wire_cube_edges};
pub use manager::{
    ExclusionManager, MAX_EXCLUSION_VOLUMES, PackedExclusionData, PackedSlot, PublishReport,
};
pub use math::{Mat4, Quat, Transform, Vec3, Vec4};
pub use scene::{ExclusionScene, VolumeId, VolumeSource};
pub use sink::{RecordingSink, SinkCall, UniformSink, UniformStore, UniformValue, properties};
pub use uniforms::ExclusionUniforms;
pub use volume::{ExclusionVolume, Rgba};
