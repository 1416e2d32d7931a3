//! # Error Types
//!
//! Structured error types for bend_core. Construction and query errors are
//! `CalcError`; a solver run that fails to converge is *not* an error but a
//! [`NotSuccessful`] value carrying a [`FailureReason`] - curve generators
//! collect these per anchor and keep going.
//!
//! ## Example
//!
//! ```rust
//! use bend_core::errors::{CalcError, CalcResult};
//!
//! fn validate_width(width: f64) -> CalcResult<()> {
//!     if width <= 0.0 {
//!         return Err(CalcError::invalid_input(
//!             "width",
//!             width.to_string(),
//!             "Width must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::strain::StrainPosition;

/// Result type alias for bend_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for construction and query operations.
///
/// Each variant provides specific context about what went wrong, enabling
/// programmatic error handling by consumers.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (out of range, inverted edges, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// Two sections of a cross-section occupy the same (y, z) region
    #[error("Sections {first} and {second} overlap")]
    SectionsOverlap { first: usize, second: usize },

    /// A stress-strain curve violates its invariants
    #[error("Invalid material curve: {reason}")]
    InvalidMaterialCurve { reason: String },

    /// A strain query lies outside the material's admissible range
    #[error("Strain {strain} outside admissible range [{minimum}, {maximum}]")]
    StrainOutOfRange {
        strain: f64,
        minimum: f64,
        maximum: f64,
    },

    /// A curve query (moment, axial force, strain difference) lies outside
    /// the computed range; the curve is never extrapolated
    #[error("Query {value} outside computed range of '{curve}'")]
    OutsideCurveRange { curve: String, value: f64 },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
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

    /// Create an InvalidMaterialCurve error
    pub fn invalid_material_curve(reason: impl Into<String>) -> Self {
        CalcError::InvalidMaterialCurve {
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::SectionsOverlap { .. } => "SECTIONS_OVERLAP",
            CalcError::InvalidMaterialCurve { .. } => "INVALID_MATERIAL_CURVE",
            CalcError::StrainOutOfRange { .. } => "STRAIN_OUT_OF_RANGE",
            CalcError::OutsideCurveRange { .. } => "OUTSIDE_CURVE_RANGE",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

/// Why an equilibrium solve did not converge.
///
/// Attached to the failed anchor by the curve generators; a failed anchor
/// never aborts a curve (policy of the error-handling design).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "reason")]
pub enum FailureReason {
    /// The anchor strain exceeds every admissible strain distribution
    StrainOutOfRange {
        strain: f64,
        minimum: f64,
        maximum: f64,
    },
    /// Residuals at both variable bounds carry the same sign, so no root
    /// is bracketed
    NoBracketingPair { variable: String },
    /// The iteration cap was reached before the residual tolerance
    MaxIterations { limit: usize },
    /// The finite-difference derivative degenerated (zero or non-finite)
    /// and no bisection bracket was available
    DegenerateDerivative,
    /// A queried state left the computed resistance curve or surface;
    /// curves are never extrapolated
    OutsideCurveRange { value: f64 },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::StrainOutOfRange {
                strain,
                minimum,
                maximum,
            } => write!(
                f,
                "strain {strain} outside admissible range [{minimum}, {maximum}]"
            ),
            FailureReason::NoBracketingPair { variable } => write!(
                f,
                "residuals at minimum and maximum {variable} have the same sign"
            ),
            FailureReason::MaxIterations { limit } => {
                write!(f, "maximum number of iterations ({limit}) reached")
            }
            FailureReason::DegenerateDerivative => {
                write!(f, "derivative degenerated and no bracketing pair available")
            }
            FailureReason::OutsideCurveRange { value } => {
                write!(f, "state {value} left the computed resistance curve")
            }
        }
    }
}

/// A solver run that ended without equilibrium.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotSuccessful {
    /// why the run failed
    pub reason: FailureReason,
    /// the anchor the run was started from, if any
    pub strain_position: Option<StrainPosition>,
}

impl NotSuccessful {
    pub fn new(reason: FailureReason) -> Self {
        Self {
            reason,
            strain_position: None,
        }
    }

    pub fn at(reason: FailureReason, strain_position: StrainPosition) -> Self {
        Self {
            reason,
            strain_position: Some(strain_position),
        }
    }
}

impl std::fmt::Display for NotSuccessful {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.strain_position {
            Some(sp) => write!(
                f,
                "{} (anchor: strain {} at position {})",
                self.reason, sp.strain, sp.position
            ),
            None => write!(f, "{}", self.reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_input("width", "-5.0", "Width must be positive");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            CalcError::invalid_material_curve("missing origin").error_code(),
            "INVALID_MATERIAL_CURVE"
        );
        assert_eq!(
            CalcError::SectionsOverlap { first: 0, second: 1 }.error_code(),
            "SECTIONS_OVERLAP"
        );
    }

    #[test]
    fn test_failure_reason_display() {
        let reason = FailureReason::NoBracketingPair {
            variable: "neutral-axis".to_string(),
        };
        assert!(reason.to_string().contains("neutral-axis"));
    }
}
