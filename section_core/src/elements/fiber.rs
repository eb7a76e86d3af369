//! # Fiber Element
//!
//! A concentrated area, typically a reinforcing bar. In simple mode the
//! strain at the centre acts on the whole area. In advanced mode the fiber
//! is treated as a disc of the same area and the stress is linearised about
//! the centre, which adds the disc's own second moments
//! (`I = A·(r²/4 + c²)`).

use serde::{Deserialize, Serialize};

use super::{Element, ElementMaterials};
use crate::errors::{CalcError, CalcResult};
use crate::force::{Force, Stiffness};
use crate::geometry::Point;
use crate::materials::Material;
use crate::strain::StrainProfile;

/// Area moments of a disc-shaped fiber
#[derive(Debug, Clone, Copy)]
struct DiscMoments {
    i00: f64,
    i10: f64,
    i01: f64,
    i11: f64,
    i20: f64,
    i02: f64,
}

impl DiscMoments {
    fn new(center: Point, area: f64) -> Self {
        let (y, z) = (center.y, center.z);
        let r2 = area / std::f64::consts::PI;
        DiscMoments {
            i00: area,
            i10: y * area,
            i01: z * area,
            i11: y * z * area,
            i20: area * (r2 / 4.0 + y * y),
            i02: area * (r2 / 4.0 + z * z),
        }
    }
}

/// Geometry of a fiber. Serializable on its own; materials are attached
/// separately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiberGeometry {
    pub center: Point,
    /// Area (m²)
    pub area: f64,
    /// Linearise the stress over a disc instead of sampling the centre only
    pub advanced: bool,
}

#[derive(Debug, Clone)]
pub struct FiberElement {
    pub geometry: FiberGeometry,
    pub materials: ElementMaterials,
}

impl FiberElement {
    pub fn new(center: Point, area: f64) -> Self {
        FiberElement {
            geometry: FiberGeometry {
                center,
                area,
                advanced: false,
            },
            materials: ElementMaterials::default(),
        }
    }

    /// Circular bar of diameter `d` (m)
    pub fn bar(center: Point, d: f64) -> Self {
        Self::new(center, std::f64::consts::PI * d * d / 4.0)
    }

    pub fn with_foreground(mut self, material: Box<dyn Material>) -> Self {
        self.materials.foreground = Some(material);
        self
    }

    pub fn with_background(mut self, material: Box<dyn Material>) -> Self {
        self.materials.background = Some(material);
        self
    }

    pub fn advanced(mut self, advanced: bool) -> Self {
        self.geometry.advanced = advanced;
        self
    }

    pub fn center(&self) -> Point {
        self.geometry.center
    }

    pub fn area(&self) -> f64 {
        self.geometry.area
    }

    /// Net stress and tangent modulus at the centre strain
    fn net_response(&self, eps: f64) -> (f64, f64) {
        self.materials
            .contributions()
            .fold((0.0, 0.0), |(s, e), (sign, m)| {
                (s + sign * m.stress(eps), e + sign * m.tangent_modulus(eps))
            })
    }

    fn advanced_force(&self, strain: &StrainProfile) -> Force {
        let c = self.geometry.center;
        let i = DiscMoments::new(c, self.geometry.area);
        let eps = strain.strain_at(c);

        let (sigma, er0) = self.net_response(eps);
        let a = er0 * strain.ky;
        let b = er0 * strain.kz;
        let k = sigma - er0 * (strain.ky * c.y + strain.kz * c.z);

        Force::new(
            a * i.i10 + b * i.i01 + k * i.i00,
            a * i.i11 + b * i.i02 + k * i.i01,
            a * i.i20 + b * i.i11 + k * i.i10,
        )
    }
}

impl Element for FiberElement {
    fn kind(&self) -> &'static str {
        "fiber"
    }

    fn force(&self, strain: &StrainProfile) -> CalcResult<Force> {
        if self.geometry.advanced {
            return Ok(self.advanced_force(strain));
        }
        let c = self.geometry.center;
        let (sigma, _) = self.net_response(strain.strain_at(c));
        let n = sigma * self.geometry.area;
        Ok(Force::new(n, n * c.z, n * c.y))
    }

    fn axial_force(&self, strain: &StrainProfile) -> CalcResult<f64> {
        if self.geometry.advanced {
            return Ok(self.advanced_force(strain).nx);
        }
        let (sigma, _) = self.net_response(strain.strain_at(self.geometry.center));
        Ok(sigma * self.geometry.area)
    }

    fn stiffness(&self, strain: &StrainProfile) -> CalcResult<Stiffness> {
        let c = self.geometry.center;
        let (_, et) = self.net_response(strain.strain_at(c));
        let (y, z) = (c.y, c.z);

        if self.geometry.advanced {
            let i = DiscMoments::new(c, self.geometry.area);
            return Ok(Stiffness {
                rnx_re0: et * i.i00,
                rnx_rky: et * i.i10,
                rnx_rkz: et * i.i01,
                rmz_re0: et * i.i10,
                rmz_rky: et * i.i20,
                rmz_rkz: et * i.i11,
                rmy_re0: et * i.i01,
                rmy_rky: et * i.i11,
                rmy_rkz: et * i.i02,
            });
        }

        let e = et * self.geometry.area;
        Ok(Stiffness {
            rnx_re0: e,
            rnx_rky: e * y,
            rnx_rkz: e * z,
            rmz_re0: e * y,
            rmz_rky: e * y * y,
            rmz_rkz: e * y * z,
            rmy_re0: e * z,
            rmy_rky: e * y * z,
            rmy_rkz: e * z * z,
        })
    }

    fn validate(&self) -> CalcResult<()> {
        let area = self.geometry.area;
        if !area.is_finite() || area <= 0.0 {
            return Err(CalcError::invalid_element(
                "fiber",
                format!("area must be positive, got {}", area),
            ));
        }
        if !self.geometry.center.is_finite() {
            return Err(CalcError::invalid_element("fiber", "center must be finite"));
        }
        Ok(())
    }

    fn control_points(&self) -> Vec<Point> {
        vec![self.geometry.center]
    }

    fn materials(&self) -> &ElementMaterials {
        &self.materials
    }

    fn materials_mut(&mut self) -> &mut ElementMaterials {
        &mut self.materials
    }

    fn translate(&mut self, dy: f64, dz: f64) {
        self.geometry.center = self.geometry.center.translate(dy, dz);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::{ElasticMaterial, NullMaterial, PerfectElasticPlastic};
    use approx::assert_relative_eq;

    fn elastic_fiber(y: f64, z: f64) -> FiberElement {
        FiberElement::new(Point::new(y, z), 0.01).with_foreground(Box::new(ElasticMaterial::new(200e9)))
    }

    #[test]
    fn test_simple_force() {
        let f = elastic_fiber(0.1, -0.2);
        let force = f.force(&StrainProfile::uniform(0.001)).unwrap();
        assert_relative_eq!(force.nx, 200e9 * 0.001 * 0.01, max_relative = 1e-12);
        assert_relative_eq!(force.my, force.nx * -0.2, max_relative = 1e-12);
        assert_relative_eq!(force.mz, force.nx * 0.1, max_relative = 1e-12);
    }

    #[test]
    fn test_background_subtracted() {
        let f = FiberElement::new(Point::new(0.0, 0.0), 0.01)
            .with_foreground(Box::new(ElasticMaterial::new(200e9)))
            .with_background(Box::new(ElasticMaterial::new(30e9)));
        let strain = StrainProfile::uniform(-0.001);
        let force = f.force(&strain).unwrap();
        assert_relative_eq!(force.nx, -170e9 * 0.001 * 0.01, max_relative = 1e-12);
        assert_relative_eq!(f.axial_force(&strain).unwrap(), force.nx, max_relative = 1e-12);
        let k = f.stiffness(&strain).unwrap();
        assert_relative_eq!(k.rnx_re0, 170e9 * 0.01, max_relative = 1e-12);
    }

    #[test]
    fn test_advanced_background_subtracted() {
        let f = FiberElement::new(Point::new(0.2, 0.1), 0.01)
            .with_foreground(Box::new(ElasticMaterial::new(200e9)))
            .with_background(Box::new(ElasticMaterial::new(200e9)))
            .advanced(true);
        let strain = StrainProfile::new(0.001, 0.002, -0.0005);
        assert_eq!(f.axial_force(&strain).unwrap(), 0.0);
        assert_eq!(f.force(&strain).unwrap(), Force::zero());
    }

    #[test]
    fn test_advanced_matches_simple_for_linear_material() {
        // linear law: the disc linearisation is exact, nx identical to simple mode
        let strain = StrainProfile::new(0.002, -0.003, 0.0001);
        let simple = elastic_fiber(0.3, 0.4);
        let adv = elastic_fiber(0.3, 0.4).advanced(true);
        let fs = simple.force(&strain).unwrap();
        let fa = adv.force(&strain).unwrap();
        assert_relative_eq!(fs.nx, fa.nx, max_relative = 1e-12);
        // the disc adds its own second moment to the bending terms
        assert!((fa.mz - fs.mz).abs() > 0.0);
    }

    #[test]
    fn test_stiffness_is_derivative_of_force() {
        let f = FiberElement::new(Point::new(0.1, 0.2), 0.002)
            .with_foreground(Box::new(PerfectElasticPlastic::create(350.0).unwrap()));
        let s = StrainProfile::new(0.001, 0.002, 0.0);
        let h = 1e-9;
        let k = f.stiffness(&s).unwrap();
        let f0 = f.force(&s).unwrap();
        let f1 = f.force(&StrainProfile::new(s.ky, s.kz + h, s.e0)).unwrap();
        assert_relative_eq!((f1.my - f0.my) / h, k.rmy_rkz, max_relative = 1e-4);
        assert_relative_eq!((f1.nx - f0.nx) / h, k.rnx_rkz, max_relative = 1e-4);
    }

    #[test]
    fn test_null_and_missing_materials() {
        let f = FiberElement::new(Point::new(0.0, 0.0), 0.01).with_foreground(Box::new(NullMaterial::new()));
        assert_eq!(f.force(&StrainProfile::uniform(0.01)).unwrap(), Force::zero());
        let bare = FiberElement::new(Point::new(0.0, 0.0), 0.01);
        assert_eq!(bare.axial_force(&StrainProfile::uniform(0.01)).unwrap(), 0.0);
    }

    #[test]
    fn test_validate() {
        assert!(elastic_fiber(0.0, 0.0).validate().is_ok());
        assert!(FiberElement::new(Point::new(0.0, 0.0), 0.0).validate().is_err());
        assert!(FiberElement::new(Point::new(f64::NAN, 0.0), 1.0).validate().is_err());
    }

    #[test]
    fn test_bar_area() {
        let f = FiberElement::bar(Point::new(0.0, 0.0), 0.02);
        assert_relative_eq!(f.area(), 3.141_592_653_589_793e-4, max_relative = 1e-12);
    }
}
