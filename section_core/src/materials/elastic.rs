//! Linear elastic material, `σ = E·ε` everywhere.

use serde::{Deserialize, Serialize};

use super::{Material, MaterialLimits};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticMaterial {
    /// Elastic modulus (Pa)
    pub e: f64,
    pub limits: MaterialLimits,
}

impl ElasticMaterial {
    pub fn new(e: f64) -> Self {
        ElasticMaterial {
            e,
            limits: MaterialLimits::labeled("elastic"),
        }
    }
}

impl Material for ElasticMaterial {
    fn stress(&self, strain: f64) -> f64 {
        self.e * strain
    }

    fn tangent_modulus(&self, _strain: f64) -> f64 {
        self.e
    }

    fn walls(&self) -> Vec<f64> {
        vec![-1.0, 1.0]
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
