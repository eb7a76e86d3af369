//! # Error Types
//!
//! Structured error types for section_core. Only structural preconditions
//! are reported through [`CalcError`]: malformed elements, unsupported
//! integration degrees, out-of-range parameters and sections that cannot
//! fail at all.
//!
//! Numerical infeasibility (a target axial force a solver cannot reach, a
//! degenerate bracket) is not an error. Those paths return `Option` and the
//! caller simply skips the branch.
//!
//! ## Example
//!
//! ```rust
//! use section_core::errors::{CalcError, CalcResult};
//!
//! fn validate_area(area: f64) -> CalcResult<()> {
//!     if area <= 0.0 {
//!         return Err(CalcError::InvalidInput {
//!             field: "area".to_string(),
//!             value: area.to_string(),
//!             reason: "Fiber area must be positive".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for section_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for section analysis operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (out of range, non-finite, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// An operation was called with arguments it cannot honor
    /// (e.g. an integration degree above the material's cap)
    #[error("Invalid operation: {operation} - {reason}")]
    InvalidOperation { operation: String, reason: String },

    /// A section element is geometrically malformed
    #[error("Invalid element: {element} - {reason}")]
    InvalidElement { element: String, reason: String },

    /// The section carries no tension-sensitive or no pressure-sensitive fibers
    #[error("Unsatisfiable snapshot: section has no {missing} fibers")]
    UnsatisfiableSnapshot { missing: String },

    /// Calculation failed as a whole (degenerate section response, etc.)
    #[error("Calculation failed: {calculation_type} - {reason}")]
    CalculationFailed {
        calculation_type: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidOperation error
    pub fn invalid_operation(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidOperation {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidElement error
    pub fn invalid_element(element: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidElement {
            element: element.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnsatisfiableSnapshot error
    pub fn unsatisfiable_snapshot(missing: impl Into<String>) -> Self {
        CalcError::UnsatisfiableSnapshot {
            missing: missing.into(),
        }
    }

    /// Create a CalculationFailed error
    pub fn calculation_failed(
        calculation_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalcError::CalculationFailed {
            calculation_type: calculation_type.into(),
            reason: reason.into(),
        }
    }

    /// Check whether the error comes from caller input rather than the
    /// section's own structure
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CalcError::InvalidInput { .. } | CalcError::InvalidOperation { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::InvalidOperation { .. } => "INVALID_OPERATION",
            CalcError::InvalidElement { .. } => "INVALID_ELEMENT",
            CalcError::UnsatisfiableSnapshot { .. } => "UNSATISFIABLE_SNAPSHOT",
            CalcError::CalculationFailed { .. } => "CALCULATION_FAILED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_element("surface[0]", "first and last points must be same");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidElement\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            CalcError::invalid_operation("integrate_stress", "r + s > 3").error_code(),
            "INVALID_OPERATION"
        );
        assert_eq!(
            CalcError::unsatisfiable_snapshot("tension-sensitive").error_code(),
            "UNSATISFIABLE_SNAPSHOT"
        );
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            CalcError::invalid_input("n_count", "0", "must be at least 2"),
            CalcError::invalid_operation("integrate_stress", "r + s > 3"),
            CalcError::invalid_element("fiber[0]", "area must be positive"),
            CalcError::unsatisfiable_snapshot("tension-sensitive"),
            CalcError::calculation_failed("n-teta", "flat"),
            serde_json::from_str::<f64>("x").unwrap_err().into(),
        ];
        let mut codes: Vec<&str> = errors.iter().map(CalcError::error_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_input_errors() {
        assert!(CalcError::invalid_input("v", "1.5", "outside [0, 1]").is_input_error());
        assert!(!CalcError::calculation_failed("n-teta", "flat").is_input_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: CalcError = serde_json::from_str::<f64>("not a number").unwrap_err().into();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }
}
