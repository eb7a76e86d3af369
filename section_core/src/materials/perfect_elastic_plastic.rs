//! # Perfect Elastic-Plastic Steel
//!
//! Bilinear law, symmetric in tension and compression. Beyond the yield strain
//! the stress keeps a tiny hardening slope (100 Pa) so the tangent modulus
//! never vanishes inside the usable range, then drops to zero at the rupture
//! strain `eu`.

use serde::{Deserialize, Serialize};

use super::{Material, MaterialLimits};
use crate::errors::{CalcError, CalcResult};

/// Default elastic modulus for reinforcing steel (Pa)
pub const DEFAULT_STEEL_MODULUS: f64 = 210e9;

/// Default rupture strain
pub const DEFAULT_RUPTURE_STRAIN: f64 = 0.02;

/// Post-yield slope (Pa)
const HARDENING_MODULUS: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfectElasticPlastic {
    /// Yield stress (Pa)
    fy: f64,
    /// Yield strain
    ey: f64,
    /// Rupture strain
    eu: f64,
    /// Elastic modulus (Pa)
    es: f64,
    pub limits: MaterialLimits,
}

impl PerfectElasticPlastic {
    /// Steel with yield stress `fy_mpa`, `E = 210 GPa` and `eu = 0.02`
    pub fn create(fy_mpa: f64) -> CalcResult<Self> {
        Self::create_with(fy_mpa, DEFAULT_STEEL_MODULUS, DEFAULT_RUPTURE_STRAIN)
    }

    /// Steel with explicit modulus `es` (Pa) and rupture strain `eu`.
    ///
    /// The rupture strain is raised to at least the yield strain so the
    /// plastic plateau is never empty.
    pub fn create_with(fy_mpa: f64, es: f64, eu: f64) -> CalcResult<Self> {
        if !fy_mpa.is_finite() || fy_mpa <= 0.0 {
            return Err(CalcError::invalid_input(
                "fy_mpa",
                fy_mpa.to_string(),
                "Yield stress must be positive",
            ));
        }
        if !es.is_finite() || es <= 0.0 {
            return Err(CalcError::invalid_input(
                "es",
                es.to_string(),
                "Elastic modulus must be positive",
            ));
        }
        if !eu.is_finite() || eu <= 0.0 {
            return Err(CalcError::invalid_input(
                "eu",
                eu.to_string(),
                "Rupture strain must be positive",
            ));
        }

        let fy = fy_mpa * 1e6;
        let ey = fy / es;
        let eu = eu.max(ey) + 1e-8;

        Ok(PerfectElasticPlastic {
            fy,
            ey,
            eu,
            es,
            limits: MaterialLimits::labeled(format!("EP fy={}", fy_mpa)),
        })
    }

    pub fn yield_strain(&self) -> f64 {
        self.ey
    }

    pub fn rupture_strain(&self) -> f64 {
        self.eu
    }

    pub fn yield_stress(&self) -> f64 {
        self.fy
    }
}

impl Material for PerfectElasticPlastic {
    fn stress(&self, strain: f64) -> f64 {
        if strain < -self.eu || strain > self.eu {
            return 0.0;
        }
        if strain < self.ey && strain > -self.ey {
            return strain * self.es;
        }
        if strain < 0.0 {
            -self.fy - HARDENING_MODULUS * (strain + self.ey)
        } else {
            self.fy + HARDENING_MODULUS * (strain - self.ey)
        }
    }

    fn tangent_modulus(&self, strain: f64) -> f64 {
        if strain < self.ey && strain > -self.ey {
            return self.es;
        }
        HARDENING_MODULUS
    }

    fn walls(&self) -> Vec<f64> {
        vec![-self.eu, -self.ey, self.ey, self.eu]
    }

    fn limits(&self) -> &MaterialLimits {
        &self.limits
    }

    fn limits_mut(&mut self) -> &mut MaterialLimits {
        &mut self.limits
    }

    fn clone_box(&self) -> Box<dyn Material> {
        Box::new(self.clone())
    }
}
