//! Error handling for the effects processor
//!
//! Nothing in here is ever constructed on the audio thread. Errors are raised at
//! configuration time, at the control-thread push boundary, or while loading state.

use thiserror::Error;

/// Result type alias for processor operations
pub type Result<T> = std::result::Result<T, FxError>;

/// Main error type for processor operations
#[derive(Error, Debug)]
pub enum FxError {
    // Order Errors
    #[error("Invalid DSP order: {reason}")]
    InvalidOrder { reason: String },

    // Configuration Errors
    #[error("Unsupported channel layout: {input} in, {output} out (stereo only)")]
    UnsupportedLayout { input: String, output: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Parameter Errors
    #[error("Unknown parameter: {name}")]
    UnknownParameter { name: String },

    #[error("Invalid parameter {param}: got {value}, expected {expected}")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    // State Errors
    #[error("Unreadable processor state: {reason}")]
    State { reason: String },

    // Audio File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio { reason: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FxError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::InvalidOrder { .. } => "INVALID_ORDER",
            FxError::UnsupportedLayout { .. } => "UNSUPPORTED_LAYOUT",
            FxError::InvalidConfig { .. } => "INVALID_CONFIG",
            FxError::UnknownParameter { .. } => "UNKNOWN_PARAMETER",
            FxError::InvalidParameter { .. } => "INVALID_PARAMETER",
            FxError::State { .. } => "STATE_ERROR",
            FxError::FileNotFound { .. } => "FILE_NOT_FOUND",
            FxError::InvalidAudio { .. } => "INVALID_AUDIO",
            FxError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            FxError::Io(_) => "IO_ERROR",
            FxError::Wav(_) => "WAV_ERROR",
            FxError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error leaves the processor untouched and usable
    ///
    /// Rejected orders and unreadable state never reach the audio thread, so the
    /// processor keeps running with whatever it had before.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FxError::InvalidOrder { .. }
                | FxError::UnknownParameter { .. }
                | FxError::InvalidParameter { .. }
                | FxError::State { .. }
                | FxError::Serialization(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = FxError::InvalidOrder {
            reason: "duplicate Chorus".to_string(),
        };
        assert_eq!(err.error_code(), "INVALID_ORDER");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_layout_error_is_not_recoverable() {
        let err = FxError::UnsupportedLayout {
            input: "mono".to_string(),
            output: "stereo".to_string(),
        };
        assert_eq!(err.error_code(), "UNSUPPORTED_LAYOUT");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("stereo only"));
    }
}
