//! Session configuration, validation, and error types.
//!
//! [`SessionConfig`] is immutable for the lifetime of a run. Validation
//! is fail-fast: every structural error is caught before a single
//! thread is spawned.

use std::error::Error;
use std::fmt;

// ── SessionConfig ──────────────────────────────────────────────────

/// Configuration for one pipeline run.
///
/// The number of visibility blocks is derived, not configured: an
/// observation of `num_time_samples` time samples is sliced into blocks
/// of at most `max_times_per_block` samples each.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Number of compute devices. One worker thread per device.
    pub device_count: usize,
    /// Total time samples in the observation. Zero is a valid (empty)
    /// observation: the run performs no compute and no finalise.
    pub num_time_samples: usize,
    /// Maximum time samples per visibility block.
    pub max_times_per_block: usize,
}

impl SessionConfig {
    /// Number of visibility blocks this session will simulate.
    ///
    /// `ceil(num_time_samples / max_times_per_block)`; the final block
    /// may be partial.
    pub fn block_count(&self) -> usize {
        self.num_time_samples.div_ceil(self.max_times_per_block)
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_count == 0 {
            return Err(ConfigError::NoDevices);
        }
        if self.max_times_per_block == 0 {
            return Err(ConfigError::ZeroTimesPerBlock);
        }
        Ok(())
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SessionConfig::validate()`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `device_count` is zero: the pipeline needs at least one device
    /// worker to make progress.
    NoDevices,
    /// `max_times_per_block` is zero: the block count would be
    /// undefined.
    ZeroTimesPerBlock,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDevices => write!(f, "device_count must be at least 1"),
            Self::ZeroTimesPerBlock => {
                write!(f, "max_times_per_block must be at least 1")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> SessionConfig {
        SessionConfig {
            device_count: 2,
            num_time_samples: 100,
            max_times_per_block: 8,
        }
    }

    #[test]
    fn validate_valid_config_succeeds() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_zero_devices_fails() {
        let mut cfg = valid_config();
        cfg.device_count = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::NoDevices));
    }

    #[test]
    fn validate_zero_block_size_fails() {
        let mut cfg = valid_config();
        cfg.max_times_per_block = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroTimesPerBlock));
    }

    #[test]
    fn block_count_rounds_up() {
        // 100 samples in blocks of 8: 12 full + 1 partial.
        assert_eq!(valid_config().block_count(), 13);

        let exact = SessionConfig {
            device_count: 1,
            num_time_samples: 96,
            max_times_per_block: 8,
        };
        assert_eq!(exact.block_count(), 12);
    }

    #[test]
    fn block_count_zero_for_empty_observation() {
        let cfg = SessionConfig {
            device_count: 4,
            num_time_samples: 0,
            max_times_per_block: 8,
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.block_count(), 0);
    }
}
