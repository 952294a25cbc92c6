use crate::error::{FogExclusionError, Result};
use std::time::Duration;

/// Configuration descriptor for an [`ExclusionManager`](crate::ExclusionManager)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionManagerDesc {
    /// Re-publish on scheduler ticks. When false, the manager publishes once on
    /// initialization and afterwards only when `publish()` is called explicitly.
    pub continuous_update: bool,
    /// Minimum time between two automatic publishes. Zero publishes on every tick.
    /// Only used if `continuous_update` is true.
    pub update_interval: Duration,
}

impl Default for ExclusionManagerDesc {
    fn default() -> Self {
        Self {
            continuous_update: false,
            update_interval: Duration::ZERO,
        }
    }
}

impl ExclusionManagerDesc {
    /// Publish once on initialization, then only on demand.
    pub fn on_demand() -> Self {
        Self::default()
    }

    /// Publish on every scheduler tick.
    pub fn every_tick() -> Self {
        Self {
            continuous_update: true,
            update_interval: Duration::ZERO,
        }
    }

    /// Publish at most once per `interval`.
    pub fn every(interval: Duration) -> Self {
        Self {
            continuous_update: true,
            update_interval: interval,
        }
    }

    /// Same as [`every`](Self::every) with the interval given in seconds, as
    /// authoring tools usually expose it.
    ///
    /// # Errors
    ///
    /// Returns [`FogExclusionError::Configuration`] if `seconds` is negative,
    /// NaN or too large to represent.
    pub fn every_secs(seconds: f32) -> Result<Self> {
        let interval = Duration::try_from_secs_f32(seconds).map_err(|e| {
            FogExclusionError::Configuration(format!(
                "update interval {} s is not a valid duration: {}",
                seconds, e
            ))
        })?;
        Ok(Self::every(interval))
    }

    /// Resolves the two flags into the policy applied on each tick.
    pub fn policy(&self) -> UpdatePolicy {
        match (self.continuous_update, self.update_interval.is_zero()) {
            (false, _) => UpdatePolicy::OnDemand,
            (true, true) => UpdatePolicy::EveryTick,
            (true, false) => UpdatePolicy::Interval(self.update_interval),
        }
    }
}

/// When a manager re-publishes on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// Only the publish performed during initialization.
    OnDemand,
    /// Every scheduler tick.
    EveryTick,
    /// At most once per interval, gated on the last publish time.
    Interval(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_resolution() {
        assert_eq!(ExclusionManagerDesc::default().policy(), UpdatePolicy::OnDemand);
        assert_eq!(
            ExclusionManagerDesc {
                continuous_update: false,
                update_interval: Duration::from_secs(1),
            }
            .policy(),
            UpdatePolicy::OnDemand
        );
        assert_eq!(ExclusionManagerDesc::every_tick().policy(), UpdatePolicy::EveryTick);
        assert_eq!(
            ExclusionManagerDesc::every(Duration::from_millis(500)).policy(),
            UpdatePolicy::Interval(Duration::from_millis(500))
        );
    }

    #[test]
    fn test_every_secs_validation() {
        let desc = ExclusionManagerDesc::every_secs(0.25).unwrap();
        assert_eq!(desc.update_interval, Duration::from_millis(250));
        assert_eq!(ExclusionManagerDesc::every_secs(0.0).unwrap().policy(), UpdatePolicy::EveryTick);

        assert!(matches!(
            ExclusionManagerDesc::every_secs(-1.0),
            Err(FogExclusionError::Configuration(_))
        ));
        assert!(ExclusionManagerDesc::every_secs(f32::NAN).is_err());
    }
}
