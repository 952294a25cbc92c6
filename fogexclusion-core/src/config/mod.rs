//! Configuration types for FogExclusion

mod manager_desc;

pub use manager_desc::{ExclusionManagerDesc, UpdatePolicy};
