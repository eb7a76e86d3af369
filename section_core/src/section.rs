//! # Composite Section
//!
//! Owns the surface, polyline and fiber elements of one cross-section and
//! sums their responses. Element geometry is not checked for overlap; a bar
//! embedded in concrete is modelled with the concrete as the bar's
//! background material.
//!
//! The ultimate-fiber snapshot used by the critical strain calculator is
//! built lazily on first use and dropped whenever the section is mutated
//! through its API.
//!
//! ## Example
//!
//! ```rust
//! use section_core::elements::SurfaceElement;
//! use section_core::geometry::{rectangle, Point};
//! use section_core::materials::ParabolicLinearConcrete;
//! use section_core::section::Section;
//! use section_core::strain::StrainProfile;
//!
//! let concrete = ParabolicLinearConcrete::create_ec2(20.0, false).unwrap();
//! let mut section = Section::new();
//! section.add_surface(
//!     SurfaceElement::new(rectangle(Point::new(0.0, 0.0), 0.5, 0.5))
//!         .with_foreground(Box::new(concrete)),
//! );
//!
//! let f = section.forces(&StrainProfile::uniform(-0.003)).unwrap();
//! assert!((f.nx + 5.0e6).abs() < 1.0);
//! ```

use once_cell::sync::OnceCell;

use crate::critical_strain::UltimateFibersSnapshot;
use crate::elements::{Element, FiberElement, PolylineElement, SurfaceElement};
use crate::errors::{CalcError, CalcResult};
use crate::force::{Force, Stiffness};
use crate::strain::StrainProfile;

/// Default uniform strain used to locate the plastic centre
pub const PLASTIC_CENTER_STRAIN: f64 = -0.0035 + 1e-5;

/// Default relative reduction applied by [`Section::scale_ultimate_strains`]
pub const ULTIMATE_STRAIN_REDUCTION: f64 = 1e-4;

/// A composite cross-section. Cloning deep-copies every element and material.
#[derive(Debug, Clone, Default)]
pub struct Section {
    surfaces: Vec<SurfaceElement>,
    polylines: Vec<PolylineElement>,
    fibers: Vec<FiberElement>,
    snapshot: OnceCell<UltimateFibersSnapshot>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_surface(&mut self, element: SurfaceElement) -> &mut Self {
        self.surfaces.push(element);
        self.invalidate();
        self
    }

    pub fn add_polyline(&mut self, element: PolylineElement) -> &mut Self {
        self.polylines.push(element);
        self.invalidate();
        self
    }

    pub fn add_fiber(&mut self, element: FiberElement) -> &mut Self {
        self.fibers.push(element);
        self.invalidate();
        self
    }

    pub fn surfaces(&self) -> &[SurfaceElement] {
        &self.surfaces
    }

    pub fn polylines(&self) -> &[PolylineElement] {
        &self.polylines
    }

    pub fn fibers(&self) -> &[FiberElement] {
        &self.fibers
    }

    /// Mutable access to the surfaces. Drops the cached snapshot.
    pub fn surfaces_mut(&mut self) -> &mut Vec<SurfaceElement> {
        self.invalidate();
        &mut self.surfaces
    }

    /// Mutable access to the polylines. Drops the cached snapshot.
    pub fn polylines_mut(&mut self) -> &mut Vec<PolylineElement> {
        self.invalidate();
        &mut self.polylines
    }

    /// Mutable access to the fibers. Drops the cached snapshot.
    pub fn fibers_mut(&mut self) -> &mut Vec<FiberElement> {
        self.invalidate();
        &mut self.fibers
    }

    /// All elements: surfaces, then polylines, then fibers
    pub fn elements(&self) -> impl Iterator<Item = &dyn Element> {
        self.surfaces
            .iter()
            .map(|e| e as &dyn Element)
            .chain(self.polylines.iter().map(|e| e as &dyn Element))
            .chain(self.fibers.iter().map(|e| e as &dyn Element))
    }

    fn elements_mut(&mut self) -> impl Iterator<Item = &mut dyn Element> {
        self.surfaces
            .iter_mut()
            .map(|e| e as &mut dyn Element)
            .chain(self.polylines.iter_mut().map(|e| e as &mut dyn Element))
            .chain(self.fibers.iter_mut().map(|e| e as &mut dyn Element))
    }

    pub fn element_count(&self) -> usize {
        self.surfaces.len() + self.polylines.len() + self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.element_count() == 0
    }

    fn invalidate(&mut self) {
        self.snapshot.take();
    }

    // ========================================================================
    // Response
    // ========================================================================

    /// Net force resultant of every element.
    ///
    /// Strains beyond the failure bounds are logged, never rejected.
    pub fn forces(&self, strain: &StrainProfile) -> CalcResult<Force> {
        let mut total = Force::zero();
        for element in self.elements() {
            total += element.force(strain)?;
        }
        if let Some(message) = self.validate_strain(strain) {
            tracing::debug!(
                ky = strain.ky,
                kz = strain.kz,
                e0 = strain.e0,
                %message,
                "strain profile exceeds failure bounds"
            );
        }
        Ok(total)
    }

    pub fn stiffness(&self, strain: &StrainProfile) -> CalcResult<Stiffness> {
        let mut total = Stiffness::zero();
        for element in self.elements() {
            total += element.stiffness(strain)?;
        }
        Ok(total)
    }

    /// Net axial force without the moment terms of fibers and the failure check
    pub fn axial_force(&self, strain: &StrainProfile) -> CalcResult<f64> {
        let mut total = 0.0;
        for element in self.elements() {
            total += element.axial_force(strain)?;
        }
        Ok(total)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Count control points whose strain lies outside their element's
    /// failure bounds. `None` when every point is admissible.
    pub fn validate_strain(&self, strain: &StrainProfile) -> Option<String> {
        let failed: usize = self
            .elements()
            .map(|e| e.count_strain_violations(strain))
            .sum();
        if failed == 0 {
            None
        } else {
            Some(format!(
                "failed: {} points exceed their failure strain",
                failed
            ))
        }
    }

    /// Check every element's geometry and material degrees
    pub fn is_valid_section(&self) -> CalcResult<()> {
        if self.is_empty() {
            return Err(CalcError::invalid_operation(
                "is_valid_section",
                "section has no elements",
            ));
        }
        for element in self.elements() {
            element.validate()?;
        }
        Ok(())
    }

    // ========================================================================
    // Snapshot and utilities
    // ========================================================================

    /// Tension- and pressure-sensitive points, built once and cached
    pub fn ultimate_fibers(&self) -> CalcResult<&UltimateFibersSnapshot> {
        self.snapshot
            .get_or_try_init(|| UltimateFibersSnapshot::create(self))
    }

    /// Shift every element by `(dy, dz)`
    pub fn translate(&mut self, dy: f64, dz: f64) {
        for element in self.elements_mut() {
            element.translate(dy, dz);
        }
        self.invalidate();
    }

    /// Copy of the section moved so that its plastic centre, the resultant
    /// location under uniform strain `e0`, sits at the origin.
    pub fn move_to_plastic_center(&self, e0: f64) -> CalcResult<Section> {
        self.is_valid_section()?;
        let f = self.forces(&StrainProfile::uniform(e0))?;
        if f.nx.abs() < 1e-6 {
            return Err(CalcError::calculation_failed(
                "plastic_center",
                format!("axial force {} at uniform strain {} is too small", f.nx, e0),
            ));
        }
        let (dy, dz) = (-f.mz / f.nx, -f.my / f.nx);
        tracing::debug!(dy, dz, "moving section to plastic centre");

        let mut moved = self.clone();
        moved.translate(dy, dz);
        Ok(moved)
    }

    /// Reduce every present failure strain by the relative amount `sc`, so
    /// that points exactly at their limit are counted as admissible.
    pub fn scale_ultimate_strains(&mut self, sc: f64) {
        for element in self.elements_mut() {
            for m in element.materials_mut().iter_mut() {
                m.limits_mut().scale(1.0 - sc);
            }
        }
        self.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{rectangle, Point};
    use crate::materials::{ElasticMaterial, ParabolicLinearConcrete, PerfectElasticPlastic};
    use crate::test_support::reinforced_column;
    use approx::assert_relative_eq;

    #[test]
    fn test_ec2_benchmark() {
        let concrete = ParabolicLinearConcrete::create_ec2(20.0, false).unwrap();
        let mut section = Section::new();
        section.add_surface(
            SurfaceElement::new(rectangle(Point::new(0.0, 0.0), 0.5, 0.5)).with_foreground(Box::new(concrete)),
        );
        let f = section.forces(&StrainProfile::uniform(-0.003)).unwrap();
        assert_relative_eq!(f.nx, -5.0e6, max_relative = 1e-9);
        assert_relative_eq!(section.axial_force(&StrainProfile::uniform(-0.003)).unwrap(), f.nx, max_relative = 1e-12);
    }

    #[test]
    fn test_centrosymmetric_uniform_strain_has_no_moment() {
        let section = reinforced_column(0.4, 0.6);
        for &e0 in &[-0.003, -0.001, 0.0005, 0.004] {
            let f = section.forces(&StrainProfile::uniform(e0)).unwrap();
            assert_relative_eq!(f.my, 0.0, epsilon = 1e-6);
            assert_relative_eq!(f.mz, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_order_permutation_invariance() {
        let section = reinforced_column(0.4, 0.6);
        let mut reversed = Section::new();
        for f in section.fibers().iter().rev() {
            reversed.add_fiber(f.clone());
        }
        for s in section.surfaces().iter().rev() {
            reversed.add_surface(s.clone());
        }
        let strain = StrainProfile::new(0.003, -0.005, -0.0008);
        let a = section.forces(&strain).unwrap();
        let b = reversed.forces(&strain).unwrap();
        assert_relative_eq!(a.nx, b.nx, max_relative = 1e-12);
        assert_relative_eq!(a.my, b.my, max_relative = 1e-12);
        assert_relative_eq!(a.mz, b.mz, max_relative = 1e-12);

        let ka = section.stiffness(&strain).unwrap();
        let kb = reversed.stiffness(&strain).unwrap();
        assert_relative_eq!(ka.rmy_rkz, kb.rmy_rkz, max_relative = 1e-12);
    }

    #[test]
    fn test_validate_strain() {
        let section = reinforced_column(0.4, 0.4);
        assert!(section.validate_strain(&StrainProfile::uniform(-0.002)).is_none());
        // exactly on the concrete limit counts as admissible
        assert!(section.validate_strain(&StrainProfile::uniform(-0.0035)).is_none());
        let msg = section.validate_strain(&StrainProfile::uniform(-0.004)).unwrap();
        // 5 polygon vertices (closing point included) and 4 bars
        assert!(msg.contains("9"), "{}", msg);
        assert!(section.validate_strain(&StrainProfile::uniform(0.02)).is_some());
    }

    #[test]
    fn test_is_valid_section() {
        assert!(Section::new().is_valid_section().is_err());
        assert!(reinforced_column(0.3, 0.3).is_valid_section().is_ok());

        let mut bad = reinforced_column(0.3, 0.3);
        bad.add_fiber(FiberElement::new(Point::new(0.0, 0.0), -1.0));
        assert_eq!(bad.is_valid_section().unwrap_err().error_code(), "INVALID_ELEMENT");
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let original = reinforced_column(0.3, 0.3);
        let mut copy = original.clone();
        copy.scale_ultimate_strains(0.5);
        let concrete = original.surfaces()[0].materials.foreground.as_ref().unwrap();
        assert_eq!(concrete.negative_failure_strain(), Some(-0.0035));
        let scaled = copy.surfaces()[0].materials.foreground.as_ref().unwrap();
        assert_relative_eq!(scaled.negative_failure_strain().unwrap(), -0.00175, epsilon = 1e-15);
    }

    #[test]
    fn test_default_strain_reduction_tightens_snapshot() {
        let mut section = reinforced_column(0.3, 0.3);
        section.scale_ultimate_strains(ULTIMATE_STRAIN_REDUCTION);
        let snap = section.ultimate_fibers().unwrap();
        assert!(snap.tension.iter().all(|f| f.height < 0.01 && f.height > 0.0099));
        assert!(snap.pressure.iter().all(|f| f.height > -0.0035));
    }

    #[test]
    fn test_snapshot_cache_invalidated_on_mutation() {
        let mut section = reinforced_column(0.3, 0.3);
        let before = section.ultimate_fibers().unwrap().tension.len();
        section.add_fiber(
            FiberElement::new(Point::new(0.0, 0.0), 1e-4).with_foreground(Box::new({
                let mut s = PerfectElasticPlastic::create(350.0).unwrap();
                s.limits.positive_failure_strain = Some(0.01);
                s
            })),
        );
        assert_eq!(section.ultimate_fibers().unwrap().tension.len(), before + 1);
    }

    #[test]
    fn test_move_to_plastic_center() {
        let mut section = Section::new();
        section.add_surface(
            SurfaceElement::new(rectangle(Point::new(1.0, -2.0), 0.2, 0.2))
                .with_foreground(Box::new(ElasticMaterial::new(30e9))),
        );
        let moved = section.move_to_plastic_center(PLASTIC_CENTER_STRAIN).unwrap();
        let f = moved.forces(&StrainProfile::uniform(-0.001)).unwrap();
        assert_relative_eq!(f.my, 0.0, epsilon = 1e-3);
        assert_relative_eq!(f.mz, 0.0, epsilon = 1e-3);
        // source untouched
        assert_eq!(section.surfaces()[0].points(), rectangle(Point::new(1.0, -2.0), 0.2, 0.2).as_slice());
    }

    #[test]
    fn test_move_to_plastic_center_requires_force() {
        let mut section = Section::new();
        section.add_surface(SurfaceElement::new(rectangle(Point::new(0.0, 0.0), 1.0, 1.0)));
        let err = section.move_to_plastic_center(PLASTIC_CENTER_STRAIN).unwrap_err();
        assert_eq!(err.error_code(), "CALCULATION_FAILED");
    }
}
