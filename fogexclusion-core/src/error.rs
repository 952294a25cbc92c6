//! Error types for FogExclusion

use crate::scene::VolumeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FogExclusionError {
    #[error("Exclusion volume {0} not found")]
    VolumeNotFound(VolumeId),

    #[error("Invalid transform: {0}")]
    InvalidTransform(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, FogExclusionError>;
