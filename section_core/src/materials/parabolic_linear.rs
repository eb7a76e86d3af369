//! # Parabolic-Linear Concrete
//!
//! Compression law made of a parabola from zero up to the peak strain `e0`
//! followed by a straight branch down to the crushing strain `e_min`:
//!
//! ```text
//!            | 0                      ε < e_min
//!   σ(ε) =   | a·ε + b                e_min ≤ ε ≤ e0
//!            | c·ε² + d·ε + e         e0 < ε ≤ 0
//!            | d·ε  (tension only)    0 < ε < etu
//!            | 0                      ε ≥ etu
//! ```
//!
//! With tension disabled `etu = 0`; otherwise the initial slope `d` is
//! carried up to a cut-off stress of `0.1·fc`.
//!
//! ## References
//!
//! - EN 1992-1-1 §3.1.7, parabola-rectangle diagram (`create_ec2`)
//! - Descending-branch variant with `ks` strength reduction (`create`)

use serde::{Deserialize, Serialize};

use super::{Material, MaterialLimits};
use crate::errors::{CalcError, CalcResult};

/// Largest characteristic strength accepted by the EC2 parabola-rectangle law (MPa)
const EC2_MAX_FC_MPA: f64 = 50.0;

/// Crushing strain used by the generic law
const GENERIC_E_MIN: f64 = -0.0038;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParabolicLinearConcrete {
    /// Compressive strength (MPa)
    pub fc_mpa: f64,
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    /// Crushing strain (negative)
    e_min: f64,
    /// Strain at peak stress (negative)
    e0: f64,
    allow_tension: bool,
    pub limits: MaterialLimits,
}

impl ParabolicLinearConcrete {
    /// EC2 parabola-rectangle law: `e0 = -0.002`, `e_min = -0.0035`,
    /// constant plateau at `-fc` after the peak.
    pub fn create_ec2(fc_mpa: f64, allow_tension: bool) -> CalcResult<Self> {
        if !fc_mpa.is_finite() || fc_mpa <= 0.0 || fc_mpa > EC2_MAX_FC_MPA {
            return Err(CalcError::invalid_input(
                "fc_mpa",
                fc_mpa.to_string(),
                "EC2 parabola-rectangle law requires 0 < fc <= 50 MPa",
            ));
        }

        let e0 = -0.002;
        Ok(ParabolicLinearConcrete {
            fc_mpa,
            a: 0.0,
            b: -1e6 * fc_mpa,
            c: 1e6 * fc_mpa / (e0 * e0),
            d: 1e6 * -2.0 * fc_mpa / e0,
            e: 0.0,
            e_min: -0.0035,
            e0,
            allow_tension,
            limits: MaterialLimits::labeled(format!("EC2 C{}", fc_mpa)),
        })
    }

    /// Generic law with `Ec = 4700·√fc`.
    ///
    /// `is_constant` selects a flat branch after the peak instead of the
    /// descending one.
    pub fn create(fc_mpa: f64, is_constant: bool, allow_tension: bool) -> CalcResult<Self> {
        if !fc_mpa.is_finite() || fc_mpa <= 0.0 {
            return Err(CalcError::invalid_input(
                "fc_mpa",
                fc_mpa.to_string(),
                "Compressive strength must be positive",
            ));
        }
        let ec = 4700.0 * fc_mpa.sqrt() * 1e6;
        Self::create_with_modulus(fc_mpa, ec, is_constant, allow_tension)
    }

    /// Generic law with an explicit initial modulus `ec` (Pa).
    pub fn create_with_modulus(
        fc_mpa: f64,
        ec: f64,
        is_constant: bool,
        allow_tension: bool,
    ) -> CalcResult<Self> {
        if !fc_mpa.is_finite() || fc_mpa <= 0.0 {
            return Err(CalcError::invalid_input(
                "fc_mpa",
                fc_mpa.to_string(),
                "Compressive strength must be positive",
            ));
        }
        if !ec.is_finite() || ec <= 0.0 {
            return Err(CalcError::invalid_input(
                "ec",
                ec.to_string(),
                "Elastic modulus must be positive",
            ));
        }

        let ks = strength_reduction(fc_mpa);
        let fzeg = ks * fc_mpa;
        let e0 = -1.8 * fzeg / ec * 1e6;
        if e0 <= GENERIC_E_MIN {
            return Err(CalcError::invalid_input(
                "ec",
                ec.to_string(),
                "Peak strain falls beyond the crushing strain, modulus too small",
            ));
        }
        let alfa = (-0.15 * fzeg) / (e0 - GENERIC_E_MIN);

        let (a, b) = if is_constant {
            (0.0, -1e6 * fzeg)
        } else {
            (1e6 * alfa, 1e6 * (alfa * -GENERIC_E_MIN - fzeg * 0.85))
        };

        Ok(ParabolicLinearConcrete {
            fc_mpa,
            a,
            b,
            c: 1e6 * fzeg / (e0 * e0),
            d: 1e6 * -2.0 * fzeg / e0,
            e: 0.0,
            e_min: GENERIC_E_MIN,
            e0,
            allow_tension,
            limits: MaterialLimits::labeled(format!("PL C{}", fc_mpa)),
        })
    }

    /// Strain at which tension stress is cut off (0 when tension is disabled)
    pub fn tension_cutoff(&self) -> f64 {
        if self.allow_tension {
            0.1 * 1e6 * self.fc_mpa / self.d
        } else {
            0.0
        }
    }

    pub fn peak_strain(&self) -> f64 {
        self.e0
    }

    pub fn crushing_strain(&self) -> f64 {
        self.e_min
    }
}

/// Strength reduction factor ks, interpolated between 15 and 30 MPa
fn strength_reduction(fc_mpa: f64) -> f64 {
    if fc_mpa <= 15.0 {
        1.0
    } else if fc_mpa < 30.0 {
        1.0 - (fc_mpa - 15.0) * 0.08 / 15.0
    } else {
        0.92
    }
}

impl Material for ParabolicLinearConcrete {
    fn stress(&self, strain: f64) -> f64 {
        let etu = self.tension_cutoff();

        if strain > etu {
            return 0.0;
        }
        if strain > 0.0 && strain < etu {
            return if self.allow_tension { self.d * strain } else { 0.0 };
        }
        if strain < self.e_min {
            return 0.0;
        }
        if strain <= self.e0 {
            return self.a * strain + self.b;
        }
        self.c * strain * strain + self.d * strain + self.e
    }

    fn tangent_modulus(&self, strain: f64) -> f64 {
        let etu = self.tension_cutoff();

        if strain > etu {
            return 0.0;
        }
        if strain > 0.0 && strain < etu {
            return if self.allow_tension { self.d } else { 0.0 };
        }
        if strain < self.e_min {
            return 0.0;
        }
        if strain <= self.e0 {
            return self.a;
        }
        2.0 * self.c * strain + self.d
    }

    fn walls(&self) -> Vec<f64> {
        let mut walls = vec![self.e_min, self.e0, 0.0];
        if self.allow_tension {
            walls.push(self.tension_cutoff());
        }
        walls
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ec2_regions() {
        let m = ParabolicLinearConcrete::create_ec2(20.0, false).unwrap();
        assert_relative_eq!(m.stress(-0.003), -20e6, epsilon = 1e-6);
        assert_relative_eq!(m.stress(-0.002), -20e6, epsilon = 1e-6);
        // parabola: σ = fc·(ε/e0)·(ε/e0 - 2) at ε = -0.001 gives -0.75·fc
        assert_relative_eq!(m.stress(-0.001), -15e6, epsilon = 1e-3);
        assert_eq!(m.stress(-0.004), 0.0);
        assert_eq!(m.stress(0.001), 0.0);
        assert_eq!(m.stress(0.0), 0.0);
    }

    #[test]
    fn test_ec2_tangent_modulus() {
        let m = ParabolicLinearConcrete::create_ec2(30.0, false).unwrap();
        assert_eq!(m.tangent_modulus(-0.003), 0.0);
        // initial slope 2·fc/|e0|
        assert_relative_eq!(m.tangent_modulus(-1e-12), 2.0 * 30e6 / 0.002, max_relative = 1e-6);
        assert_eq!(m.tangent_modulus(0.01), 0.0);
    }

    #[test]
    fn test_ec2_tension() {
        let m = ParabolicLinearConcrete::create_ec2(20.0, true).unwrap();
        let etu = m.tension_cutoff();
        assert_relative_eq!(etu, 0.0001, epsilon = 1e-12);
        assert!(m.stress(0.5 * etu) > 0.0);
        assert_eq!(m.stress(2.0 * etu), 0.0);
        assert_eq!(m.walls(), vec![-0.0035, -0.002, 0.0, etu]);
    }

    #[test]
    fn test_ec2_rejects_high_strength() {
        assert!(ParabolicLinearConcrete::create_ec2(60.0, false).is_err());
        assert!(ParabolicLinearConcrete::create_ec2(-5.0, false).is_err());
    }

    #[test]
    fn test_generic_continuity_at_peak() {
        for &constant in &[true, false] {
            let m = ParabolicLinearConcrete::create(25.0, constant, false).unwrap();
            let e0 = m.peak_strain();
            let left = m.stress(e0 - 1e-12);
            let right = m.stress(e0 + 1e-12);
            assert_relative_eq!(left, right, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_generic_strength_reduction() {
        assert_eq!(strength_reduction(10.0), 1.0);
        assert_relative_eq!(strength_reduction(22.5), 0.96, epsilon = 1e-12);
        assert_eq!(strength_reduction(40.0), 0.92);

        let m = ParabolicLinearConcrete::create(40.0, true, false).unwrap();
        let peak = m.stress(m.peak_strain());
        assert_relative_eq!(peak, -0.92 * 40e6, max_relative = 1e-9);
    }

    #[test]
    fn test_integral_across_walls_is_piecewise_exact() {
        // integrate a uniform strain through the plateau: σ = -fc everywhere
        let m = ParabolicLinearConcrete::create_ec2(20.0, false).unwrap();
        let v = m.integrate_stress(0.0, 2.0, 0.0, 1.0, 0.0, -0.003, 1, 0).unwrap();
        assert_relative_eq!(v, -40e6, epsilon = 1e-3);
    }
}
