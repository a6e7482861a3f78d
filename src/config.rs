//! Processor configuration
//!
//! Loaded from a JSON file. Every field has a default, so `{}` is a valid
//! configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dsp::DEFAULT_RAMP_SECONDS;
use crate::engine::MAX_SUB_BLOCK_SIZE;
use crate::error::{FxError, Result};
use crate::fifo::MIN_CAPACITY;

/// Default history of each order queue
pub const DEFAULT_ORDER_QUEUE_CAPACITY: usize = 100;

/// Tunables of the block scheduler and order exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Parameter ramp time in seconds.
    #[serde(default = "default_smoothing_seconds")]
    pub smoothing_seconds: f64,

    /// Largest sub-block the scheduler hands to the modules.
    #[serde(default = "default_max_sub_block")]
    pub max_sub_block: usize,

    /// Slots in each order queue.
    #[serde(default = "default_order_queue_capacity")]
    pub order_queue_capacity: usize,
}

fn default_smoothing_seconds() -> f64 {
    DEFAULT_RAMP_SECONDS
}

fn default_max_sub_block() -> usize {
    MAX_SUB_BLOCK_SIZE
}

fn default_order_queue_capacity() -> usize {
    DEFAULT_ORDER_QUEUE_CAPACITY
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            smoothing_seconds: default_smoothing_seconds(),
            max_sub_block: default_max_sub_block(),
            order_queue_capacity: default_order_queue_capacity(),
        }
    }
}

impl ProcessorConfig {
    /// Check the values make sense
    pub fn validate(&self) -> Result<()> {
        if !self.smoothing_seconds.is_finite() || self.smoothing_seconds < 0.0 {
            return Err(FxError::InvalidConfig {
                reason: format!(
                    "smoothing_seconds must be a non-negative number, got {}",
                    self.smoothing_seconds
                ),
            });
        }

        if self.max_sub_block == 0 {
            return Err(FxError::InvalidConfig {
                reason: "max_sub_block must be at least 1".to_string(),
            });
        }

        if self.order_queue_capacity < MIN_CAPACITY {
            return Err(FxError::InvalidConfig {
                reason: format!(
                    "order_queue_capacity must be at least {}, got {}",
                    MIN_CAPACITY, self.order_queue_capacity
                ),
            });
        }

        Ok(())
    }

    /// Load and validate a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FxError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path)?;
        let config: ProcessorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ProcessorConfig::default();
        assert_eq!(config.smoothing_seconds, 0.005);
        assert_eq!(config.max_sub_block, 64);
        assert_eq!(config.order_queue_capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let config: ProcessorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ProcessorConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ProcessorConfig::default();
        config.order_queue_capacity = 1;
        assert!(config.validate().is_err());

        let mut config = ProcessorConfig::default();
        config.max_sub_block = 0;
        assert!(config.validate().is_err());

        let mut config = ProcessorConfig::default();
        config.smoothing_seconds = -0.1;
        assert_eq!(config.validate().unwrap_err().error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "max_sub_block": 32 }}"#).unwrap();

        let config = ProcessorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_sub_block, 32);
        assert_eq!(config.order_queue_capacity, 100);
    }

    #[test]
    fn test_from_missing_file() {
        let err = ProcessorConfig::from_file(Path::new("/nonexistent/fx.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }
}
