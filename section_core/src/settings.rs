//! # Engine Settings
//!
//! Tuning knobs of the solver and the curve finders, grouped the way they
//! are consumed. Every struct has sensible defaults, serializes to JSON and
//! validates itself before a run.
//!
//! ## Example
//!
//! ```rust
//! use section_core::settings::EngineSettings;
//!
//! let mut settings = EngineSettings::default();
//! settings.n_teta.n_count = 5;
//! settings.validate().unwrap();
//!
//! let json = settings.to_json().unwrap();
//! let back = EngineSettings::from_json(&json).unwrap();
//! assert_eq!(back.n_teta.n_count, 5);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

fn positive(field: &str, value: f64) -> CalcResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CalcError::invalid_input(field, value.to_string(), "must be positive"));
    }
    Ok(())
}

fn at_least(field: &str, value: usize, min: usize) -> CalcResult<()> {
    if value < min {
        return Err(CalcError::invalid_input(
            field,
            value.to_string(),
            format!("must be at least {}", min),
        ));
    }
    Ok(())
}

/// Root finding parameters of [`Func1DSolver`](crate::solver::Func1DSolver).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Absolute axial force tolerance (N), replaced by the finders with a
    /// tolerance relative to the section's force span
    pub absolute_tolerance: f64,
    /// Cap on false-position iterations
    pub max_iterations: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings {
            absolute_tolerance: 1e-6,
            max_iterations: 100,
        }
    }
}

impl SolverSettings {
    pub fn validate(&self) -> CalcResult<()> {
        positive("absolute_tolerance", self.absolute_tolerance)?;
        at_least("max_iterations", self.max_iterations, 1)
    }
}

/// Constant axial force rings from direction sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NTetaSettings {
    /// Direction step (degrees)
    pub delta_teta: f64,
    /// Number of evenly spaced axial force targets, ends included
    pub n_count: usize,
    /// Solver tolerance relative to the axial force span
    pub tolerance: f64,
    /// Spread solvers and rings over the rayon pool
    pub parallel: bool,
}

impl Default for NTetaSettings {
    fn default() -> Self {
        NTetaSettings {
            delta_teta: 1.0,
            n_count: 10,
            tolerance: 1e-4,
            parallel: true,
        }
    }
}

impl NTetaSettings {
    pub fn validate(&self) -> CalcResult<()> {
        positive("delta_teta", self.delta_teta)?;
        at_least("n_count", self.n_count, 2)?;
        positive("tolerance", self.tolerance)
    }
}

/// Rings resampled at evenly spaced moment directions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NAlphaSettings {
    /// Moment direction step (degrees)
    pub delta_alpha: f64,
    pub n_count: usize,
    pub tolerance: f64,
    /// Apply one Newton correction to every resampled point
    pub improve: bool,
    pub parallel: bool,
}

impl Default for NAlphaSettings {
    fn default() -> Self {
        NAlphaSettings {
            delta_alpha: 5.0,
            n_count: 10,
            tolerance: 1e-3,
            improve: false,
            parallel: true,
        }
    }
}

impl NAlphaSettings {
    pub fn validate(&self) -> CalcResult<()> {
        positive("delta_alpha", self.delta_alpha)?;
        at_least("n_count", self.n_count, 2)?;
        positive("tolerance", self.tolerance)
    }
}

/// Raw point cloud sampled along every critical range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DTetaSettings {
    pub delta_teta: f64,
    /// Samples per range, ends included
    pub d_count: usize,
    pub parallel: bool,
}

impl Default for DTetaSettings {
    fn default() -> Self {
        DTetaSettings {
            delta_teta: 5.0,
            d_count: 10,
            parallel: true,
        }
    }
}

impl DTetaSettings {
    pub fn validate(&self) -> CalcResult<()> {
        positive("delta_teta", self.delta_teta)?;
        at_least("d_count", self.d_count, 1)
    }
}

/// All engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub solver: SolverSettings,
    pub n_teta: NTetaSettings,
    pub n_alpha: NAlphaSettings,
    pub d_teta: DTetaSettings,
}

impl EngineSettings {
    pub fn validate(&self) -> CalcResult<()> {
        self.solver.validate()?;
        self.n_teta.validate()?;
        self.n_alpha.validate()?;
        self.d_teta.validate()
    }

    /// Parse and validate
    pub fn from_json(json: &str) -> CalcResult<Self> {
        let settings: EngineSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> CalcResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let s = EngineSettings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.n_teta.delta_teta, 1.0);
        assert_eq!(s.n_teta.tolerance, 1e-4);
        assert_eq!(s.n_alpha.tolerance, 1e-3);
        assert!(!s.n_alpha.improve);
        assert_eq!(s.solver.max_iterations, 100);
    }

    #[test]
    fn test_validation_errors() {
        let mut s = NTetaSettings::default();
        s.n_count = 1;
        let err = s.validate().unwrap_err();
        assert!(err.is_input_error());
        assert!(err.to_string().contains("n_count"));

        let mut a = NAlphaSettings::default();
        a.delta_alpha = 0.0;
        assert!(a.validate().is_err());

        let mut d = DTetaSettings::default();
        d.delta_teta = f64::NAN;
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let s = EngineSettings::from_json(r#"{"n_teta": {"n_count": 7}}"#).unwrap();
        assert_eq!(s.n_teta.n_count, 7);
        assert_eq!(s.n_teta.delta_teta, 1.0);
        assert_eq!(s.n_alpha, NAlphaSettings::default());

        let s = EngineSettings::from_json(r#"{"d_teta": {"parallel": false}}"#).unwrap();
        assert!(!s.d_teta.parallel);
        assert_eq!(s.d_teta.d_count, 10);
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(EngineSettings::from_json(r#"{"n_teta": {"n_count": 0}}"#).is_err());
        let err = EngineSettings::from_json("not json").unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_round_trip() {
        let mut s = EngineSettings::default();
        s.n_alpha.improve = true;
        s.d_teta.d_count = 3;
        let back = EngineSettings::from_json(&s.to_json().unwrap()).unwrap();
        assert_eq!(s, back);
    }
}
