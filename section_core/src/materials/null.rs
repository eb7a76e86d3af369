//! Material with no response at all.
//!
//! Useful as an explicit placeholder (a hole, an unassigned region) where an
//! element must exist but should not contribute.

use serde::{Deserialize, Serialize};

use super::{Material, MaterialLimits};
use crate::errors::CalcResult;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NullMaterial {
    pub limits: MaterialLimits,
}

impl NullMaterial {
    pub fn new() -> Self {
        NullMaterial {
            limits: MaterialLimits::labeled("null"),
        }
    }
}

impl Material for NullMaterial {
    fn stress(&self, _strain: f64) -> f64 {
        0.0
    }

    fn tangent_modulus(&self, _strain: f64) -> f64 {
        0.0
    }

    fn walls(&self) -> Vec<f64> {
        Vec::new()
    }

    fn integrate_stress(
        &self,
        _z0: f64,
        _z1: f64,
        _alpha: f64,
        _beta: f64,
        _phi: f64,
        _e0: f64,
        _r: u32,
        _s: u32,
    ) -> CalcResult<f64> {
        Ok(0.0)
    }

    fn integrate_tangent_modulus(
        &self,
        _z0: f64,
        _z1: f64,
        _alpha: f64,
        _beta: f64,
        _phi: f64,
        _e0: f64,
        _r: u32,
        _s: u32,
    ) -> CalcResult<f64> {
        Ok(0.0)
    }

    fn limits(&self) -> &MaterialLimits {
        &self.limits
    }

    fn limits_mut(&mut self) -> &mut MaterialLimits {
        &mut self.limits
    }

    fn is_null(&self) -> bool {
        true
    }

    fn clone_box(&self) -> Box<dyn Material> {
        Box::new(self.clone())
    }
}
