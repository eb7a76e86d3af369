//! # Materials
//!
//! The material contract every section element integrates against, plus a
//! small set of reference stress-strain laws.
//!
//! Elements never look inside a material. They ask for the stress or the
//! tangent modulus at a strain, for the ordered strain "walls" where the law
//! changes form, and for weighted integrals of the form
//!
//! ```text
//! ∫[z0, z1] (α·z + β)^r · z^s · σ(φ·z + e0) dz
//! ```
//!
//! Between two walls every reference law is a low order polynomial in
//! strain, so a 3-point Gauss-Legendre rule integrates these exactly up to
//! the degree cap each material reports. Asking for more is an
//! [`CalcError::InvalidOperation`].
//!
//! ## Material Types
//!
//! - **Elastic**: linear `σ = E·ε`
//! - **Null**: zero response, placeholder for empty regions
//! - **Parabolic-linear concrete**: generic and EC2 parabola-rectangle laws
//! - **Perfect elastic-plastic**: bilinear steel with a rupture strain
//!
//! ## Example
//!
//! ```rust
//! use section_core::materials::{Material, ParabolicLinearConcrete, PerfectElasticPlastic};
//!
//! let mut concrete = ParabolicLinearConcrete::create_ec2(20.0, false).unwrap();
//! concrete.limits_mut().negative_failure_strain = Some(-0.0035);
//!
//! let steel = PerfectElasticPlastic::create(350.0).unwrap();
//! assert!(steel.stress(0.01) > 350e6);
//! assert!(concrete.stress(-0.002) < 0.0);
//! ```

pub mod elastic;
pub mod null;
pub mod parabolic_linear;
pub mod perfect_elastic_plastic;

pub use elastic::ElasticMaterial;
pub use null::NullMaterial;
pub use parabolic_linear::ParabolicLinearConcrete;
pub use perfect_elastic_plastic::PerfectElasticPlastic;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

// ============================================================================
// Gauss-Legendre kernel
// ============================================================================

/// Outer node of the 3-point rule, `-√(3/5)`
const GAUSS_K1: f64 = -0.774_596_669_241_483_4;

const GAUSS_W1: f64 = 5.0 / 9.0;
const GAUSS_W2: f64 = 8.0 / 9.0;

/// 3-point Gauss-Legendre quadrature of `f` over `[z0, z1]`.
///
/// Exact for polynomials up to degree 5. `z1 < z0` yields the signed
/// (negated) integral.
pub fn gauss_legendre_3(z0: f64, z1: f64, f: impl Fn(f64) -> f64) -> f64 {
    let sum = 0.5 * (z1 + z0);
    let neg = 0.5 * (z1 - z0);

    let v1 = f(sum + neg * GAUSS_K1);
    let v2 = f(sum);
    let v3 = f(sum - neg * GAUSS_K1);

    neg * (GAUSS_W1 * v1 + GAUSS_W2 * v2 + GAUSS_W1 * v3)
}

/// The polynomial weight `(α·z + β)^r · z^s`
#[inline]
pub fn monomial_weight(alpha: f64, beta: f64, r: u32, s: u32, z: f64) -> f64 {
    (alpha * z + beta).powi(r as i32) * z.powi(s as i32)
}

fn check_degree(operation: &str, r: u32, s: u32, cap: u32) -> CalcResult<()> {
    if r + s > cap {
        return Err(CalcError::invalid_operation(
            operation,
            format!("polynomial degree r + s = {} exceeds supported degree {}", r + s, cap),
        ));
    }
    Ok(())
}

// ============================================================================
// Failure limits
// ============================================================================

/// Label and ultimate strains shared by every material.
///
/// A missing failure strain means the material never governs failure on that
/// side; the critical strain calculator ignores it there.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialLimits {
    pub label: String,
    /// Tensile strain at which the material fails (positive)
    pub positive_failure_strain: Option<f64>,
    /// Compressive strain at which the material fails (negative)
    pub negative_failure_strain: Option<f64>,
}

impl MaterialLimits {
    pub fn labeled(label: impl Into<String>) -> Self {
        MaterialLimits {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Scale both failure strains by `factor`, keeping absent ones absent
    pub fn scale(&mut self, factor: f64) {
        if let Some(e) = self.positive_failure_strain.as_mut() {
            *e *= factor;
        }
        if let Some(e) = self.negative_failure_strain.as_mut() {
            *e *= factor;
        }
    }
}

// ============================================================================
// Material contract
// ============================================================================

/// Stress-strain law consumed by the section elements.
///
/// Implementors provide the pointwise law and its walls; the integrals
/// default to Gauss-Legendre quadrature over the requested interval, which is
/// exact when the caller has already split the interval at [`walls`].
///
/// [`walls`]: Material::walls
pub trait Material: fmt::Debug + Send + Sync {
    /// Stress (Pa) at `strain`
    fn stress(&self, strain: f64) -> f64;

    /// Tangent modulus dσ/dε (Pa) at `strain`
    fn tangent_modulus(&self, strain: f64) -> f64;

    /// Ascending strains where the law changes form. May be empty.
    fn walls(&self) -> Vec<f64>;

    /// Highest `r + s` accepted by [`integrate_stress`](Material::integrate_stress)
    fn stress_degree(&self) -> u32 {
        3
    }

    /// Highest `r + s` accepted by
    /// [`integrate_tangent_modulus`](Material::integrate_tangent_modulus)
    fn modulus_degree(&self) -> u32 {
        4
    }

    /// `∫[z0, z1] (α·z + β)^r · z^s · σ(φ·z + e0) dz`
    #[allow(clippy::too_many_arguments)]
    fn integrate_stress(
        &self,
        z0: f64,
        z1: f64,
        alpha: f64,
        beta: f64,
        phi: f64,
        e0: f64,
        r: u32,
        s: u32,
    ) -> CalcResult<f64> {
        check_degree("integrate_stress", r, s, self.stress_degree())?;
        Ok(gauss_legendre_3(z0, z1, |z| {
            monomial_weight(alpha, beta, r, s, z) * self.stress(phi * z + e0)
        }))
    }

    /// `∫[z0, z1] (α·z + β)^r · z^s · Et(φ·z + e0) dz`
    #[allow(clippy::too_many_arguments)]
    fn integrate_tangent_modulus(
        &self,
        z0: f64,
        z1: f64,
        alpha: f64,
        beta: f64,
        phi: f64,
        e0: f64,
        r: u32,
        s: u32,
    ) -> CalcResult<f64> {
        check_degree("integrate_tangent_modulus", r, s, self.modulus_degree())?;
        Ok(gauss_legendre_3(z0, z1, |z| {
            monomial_weight(alpha, beta, r, s, z) * self.tangent_modulus(phi * z + e0)
        }))
    }

    fn limits(&self) -> &MaterialLimits;

    fn limits_mut(&mut self) -> &mut MaterialLimits;

    fn label(&self) -> &str {
        &self.limits().label
    }

    fn positive_failure_strain(&self) -> Option<f64> {
        self.limits().positive_failure_strain
    }

    fn negative_failure_strain(&self) -> Option<f64> {
        self.limits().negative_failure_strain
    }

    /// True for materials that contribute nothing to the section response
    fn is_null(&self) -> bool {
        false
    }

    /// Independent deep copy
    fn clone_box(&self) -> Box<dyn Material>;
}

impl Clone for Box<dyn Material> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gauss_exact_for_quintic() {
        // ∫[0,2] z^5 dz = 64/6
        let v = gauss_legendre_3(0.0, 2.0, |z| z.powi(5));
        assert_relative_eq!(v, 64.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gauss_reversed_interval() {
        let fwd = gauss_legendre_3(-1.0, 3.0, |z| z * z);
        let rev = gauss_legendre_3(3.0, -1.0, |z| z * z);
        assert_relative_eq!(fwd, -rev, epsilon = 1e-12);
        assert_relative_eq!(fwd, 28.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_monomial_weight() {
        assert_eq!(monomial_weight(2.0, 1.0, 0, 0, 5.0), 1.0);
        assert_eq!(monomial_weight(2.0, 1.0, 2, 1, 1.0), 9.0);
    }

    #[test]
    fn test_degree_cap() {
        let m = ElasticMaterial::new(200e9);
        let err = m.integrate_stress(0.0, 1.0, 1.0, 0.0, 0.0, 0.001, 2, 2);
        assert_eq!(err.unwrap_err().error_code(), "INVALID_OPERATION");
        assert!(m.integrate_tangent_modulus(0.0, 1.0, 1.0, 0.0, 0.0, 0.001, 2, 2).is_ok());
        assert!(m.integrate_tangent_modulus(0.0, 1.0, 1.0, 0.0, 0.0, 0.001, 3, 2).is_err());
    }

    #[test]
    fn test_limits_scale() {
        let mut limits = MaterialLimits {
            label: "steel".to_string(),
            positive_failure_strain: Some(0.01),
            negative_failure_strain: None,
        };
        limits.scale(0.5);
        assert_eq!(limits.positive_failure_strain, Some(0.005));
        assert_eq!(limits.negative_failure_strain, None);
    }

    #[test]
    fn test_boxed_clone_is_independent() {
        let mut original: Box<dyn Material> = Box::new(ElasticMaterial::new(30e9));
        let copy = original.clone();
        original.limits_mut().positive_failure_strain = Some(0.002);
        assert_eq!(copy.positive_failure_strain(), None);
        assert_eq!(original.positive_failure_strain(), Some(0.002));
    }
}
