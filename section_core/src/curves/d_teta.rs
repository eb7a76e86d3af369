//! # D-Teta Curve Finder
//!
//! Samples every critical strain range of every bending direction at evenly
//! spaced normalised slopes. No axial force is targeted: the result is a raw
//! point cloud on the failure surface, returned as a single ring whose
//! targeted force is the mean axial force of its points.

use rayon::prelude::*;

use crate::critical_strain::{calculate_for_section, CriticalStrainRange};
use crate::errors::CalcResult;
use crate::section::Section;
use crate::settings::DTetaSettings;
use crate::solver::Func1D;
use crate::surface::{FailurePoint, FailureRing, FailureSurface};

pub struct DTetaCurveFinder<'a> {
    pub section: &'a Section,
    pub settings: DTetaSettings,
}

impl<'a> DTetaCurveFinder<'a> {
    pub fn new(section: &'a Section) -> Self {
        DTetaCurveFinder {
            section,
            settings: DTetaSettings::default(),
        }
    }

    pub fn create_surface(&self) -> CalcResult<FailureSurface> {
        self.settings.validate()?;
        self.section.is_valid_section()?;

        let ranges: Vec<CriticalStrainRange> = calculate_for_section(self.section, self.settings.delta_teta)?
            .into_iter()
            .flatten()
            .collect();

        let sampled: Vec<Vec<FailurePoint>> = if self.settings.parallel {
            ranges
                .par_iter()
                .map(|range| self.sample_range(range))
                .collect::<CalcResult<_>>()?
        } else {
            ranges
                .iter()
                .map(|range| self.sample_range(range))
                .collect::<CalcResult<_>>()?
        };

        let mut ring = FailureRing::new(0.0);
        ring.points = sampled.into_iter().flatten().collect();
        ring.targeted_axial_force = ring.mean_force().nx;

        let mut surface = FailureSurface::new("DTetaCurveFinder");
        surface.statistics.successful_solutions = ring.len();
        surface.rings.push(ring);

        tracing::info!(
            ranges = ranges.len(),
            points = surface.point_count(),
            "d-teta point cloud created"
        );
        Ok(surface)
    }

    fn sample_range(&self, range: &CriticalStrainRange) -> CalcResult<Vec<FailurePoint>> {
        let f = Func1D::new(self.section, *range);
        let d_count = self.settings.d_count;
        (0..=d_count)
            .map(|i| {
                let v = i as f64 / d_count as f64;
                FailurePoint::evaluate(self.section, f.strain(v)?, range.hinge_position, range.hinge_height)
            })
            .collect()
    }
}
