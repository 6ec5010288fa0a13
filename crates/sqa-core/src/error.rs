//! Error handling for the signal quality framework
//!
//! Every component surfaces one of four error kinds; the transport layer
//! maps them to its own status codes via [`ErrorDescriptor`].

use core::fmt;

use serde::Serialize;

/// Result type alias for framework operations
pub type SqaResult<T> = Result<T, SqaError>;

/// Error type for all signal quality operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SqaError {
    /// Malformed, too short, non-monotonic or empty input signal
    InvalidSignal {
        /// Description of the contract violation
        reason: String,
    },

    /// Out-of-range or missing numeric parameters for a method
    InvalidParameters {
        /// Description of the parameter problem
        reason: String,
    },

    /// Unknown outlier/filter/metric identifier
    UnsupportedMethod {
        /// The identifier that failed to resolve
        method: String,
    },

    /// Degenerate numeric condition with no safe fallback
    NumericInstability {
        /// Description of the degenerate condition
        reason: String,
    },
}

impl SqaError {
    /// Stable kind tag consumed by the transport layer
    pub fn kind(&self) -> &'static str {
        match self {
            SqaError::InvalidSignal { .. } => "InvalidSignal",
            SqaError::InvalidParameters { .. } => "InvalidParameters",
            SqaError::UnsupportedMethod { .. } => "UnsupportedMethod",
            SqaError::NumericInstability { .. } => "NumericInstability",
        }
    }

    /// Convert into the structured descriptor handed to callers
    pub fn to_descriptor(&self) -> ErrorDescriptor {
        ErrorDescriptor {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

impl fmt::Display for SqaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqaError::InvalidSignal { reason } => {
                write!(f, "Invalid signal: {}", reason)
            }
            SqaError::InvalidParameters { reason } => {
                write!(f, "Invalid parameters: {}", reason)
            }
            SqaError::UnsupportedMethod { method } => {
                write!(f, "Unsupported method: '{}'", method)
            }
            SqaError::NumericInstability { reason } => {
                write!(f, "Numeric instability: {}", reason)
            }
        }
    }
}

impl std::error::Error for SqaError {}

/// Structured error descriptor for the transport boundary
///
/// Serializes to `{"kind": ..., "message": ...}` so callers can map errors
/// to their own status codes without parsing display strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDescriptor {
    pub kind: &'static str,
    pub message: String,
}

/// Convenience macro for creating invalid-signal errors
#[macro_export]
macro_rules! invalid_signal {
    ($($arg:tt)*) => {
        $crate::error::SqaError::InvalidSignal {
            reason: format!($($arg)*),
        }
    };
}

/// Convenience macro for creating invalid-parameter errors
#[macro_export]
macro_rules! invalid_parameters {
    ($($arg:tt)*) => {
        $crate::error::SqaError::InvalidParameters {
            reason: format!($($arg)*),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SqaError::UnsupportedMethod {
            method: "wavelet".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Unsupported method"));
        assert!(display.contains("wavelet"));
    }

    #[test]
    fn test_error_equality() {
        let error1 = SqaError::InvalidSignal {
            reason: "test".to_string(),
        };
        let error2 = SqaError::InvalidSignal {
            reason: "test".to_string(),
        };
        assert_eq!(error1, error2);
    }

    #[test]
    fn test_descriptor_kinds() {
        let cases = [
            (
                SqaError::InvalidSignal { reason: "x".into() },
                "InvalidSignal",
            ),
            (
                SqaError::InvalidParameters { reason: "x".into() },
                "InvalidParameters",
            ),
            (
                SqaError::UnsupportedMethod { method: "x".into() },
                "UnsupportedMethod",
            ),
            (
                SqaError::NumericInstability { reason: "x".into() },
                "NumericInstability",
            ),
        ];

        for (error, kind) in cases {
            assert_eq!(error.kind(), kind);
            assert_eq!(error.to_descriptor().kind, kind);
        }
    }

    #[test]
    fn test_descriptor_json_shape() {
        let descriptor = SqaError::InvalidParameters {
            reason: "lowcut must be below highcut".to_string(),
        }
        .to_descriptor();

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["kind"], "InvalidParameters");
        assert!(json["message"]
            .as_str()
            .unwrap()
            .contains("lowcut must be below highcut"));
    }

    #[test]
    fn test_error_macros() {
        let error = invalid_signal!("need at least {} samples", 4);
        assert_eq!(
            error,
            SqaError::InvalidSignal {
                reason: "need at least 4 samples".to_string()
            }
        );

        let error = invalid_parameters!("sigma must be positive");
        assert_eq!(error.kind(), "InvalidParameters");
    }
}
