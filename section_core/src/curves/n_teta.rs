//! # N-Teta Curve Finder
//!
//! Builds a failure surface as rings of constant axial force. Every critical
//! strain range of every bending direction gets a [`Func1DSolver`]; each
//! ring collects the solutions of all solvers able to reach the ring's
//! targeted axial force.
//!
//! The moment directions of the resulting points follow the bending
//! directions only loosely, so the points of one ring are unevenly spread
//! around it. [`NAlphaCurveFinder`](super::NAlphaCurveFinder) resamples them.
//!
//! ## Example
//!
//! ```rust,no_run
//! use section_core::curves::NTetaCurveFinder;
//! # fn section() -> section_core::section::Section { unimplemented!() }
//!
//! let section = section();
//! let mut finder = NTetaCurveFinder::new(&section);
//! finder.settings.n_count = 5;
//! let surface = finder.create_surface(&[0.5]).unwrap();
//! assert_eq!(surface.ring_count(), 6);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::critical_strain::calculate_for_section;
use crate::errors::{CalcError, CalcResult};
use crate::section::Section;
use crate::settings::{NTetaSettings, SolverSettings};
use crate::solver::{evaluation_count, Func1DSolver};
use crate::surface::{FailurePoint, FailureRing, FailureSurface, SurfaceAnomaly};

/// Targets closer than this fraction of the force span are merged
const TARGET_MERGE_TOLERANCE: f64 = 1e-12;

pub struct NTetaCurveFinder<'a> {
    pub section: &'a Section,
    pub settings: NTetaSettings,
    pub solver_settings: SolverSettings,
    min_axial_force: f64,
    max_axial_force: f64,
    successful_solutions: usize,
    failed_solutions: usize,
}

impl<'a> NTetaCurveFinder<'a> {
    pub fn new(section: &'a Section) -> Self {
        Self::with_settings(section, NTetaSettings::default(), SolverSettings::default())
    }

    pub fn with_settings(section: &'a Section, settings: NTetaSettings, solver_settings: SolverSettings) -> Self {
        NTetaCurveFinder {
            section,
            settings,
            solver_settings,
            min_axial_force: f64::NAN,
            max_axial_force: f64::NAN,
            successful_solutions: 0,
            failed_solutions: 0,
        }
    }

    /// Smallest axial force reached by any range in the last run
    pub fn min_axial_force(&self) -> f64 {
        self.min_axial_force
    }

    /// Largest axial force reached by any range in the last run
    pub fn max_axial_force(&self) -> f64 {
        self.max_axial_force
    }

    pub fn successful_solutions(&self) -> usize {
        self.successful_solutions
    }

    pub fn failed_solutions(&self) -> usize {
        self.failed_solutions
    }

    /// Build the surface.
    ///
    /// Rings are placed at `n_count` evenly spaced axial forces between the
    /// section's extremes, plus one ring per entry of `additional_coefs`: a
    /// positive coefficient `c` targets `min(c, 1)·max`, any other
    /// coefficient targets `-max(c, -1)·min`.
    pub fn create_surface(&mut self, additional_coefs: &[f64]) -> CalcResult<FailureSurface> {
        self.settings.validate()?;
        self.solver_settings.validate()?;
        self.section.is_valid_section()?;

        let evaluations_before = evaluation_count();
        let directions = calculate_for_section(self.section, self.settings.delta_teta)?;

        let mut solvers: Vec<Vec<Func1DSolver<'a>>> = directions
            .into_iter()
            .map(|ranges| {
                ranges
                    .into_iter()
                    .map(|r| Func1DSolver::with_settings(self.section, r, &self.solver_settings))
                    .collect()
            })
            .collect();
        analyse_directions(&mut solvers, self.settings.parallel)?;

        let mut solvers: Vec<Func1DSolver<'a>> = solvers.into_iter().flatten().collect();
        if solvers.is_empty() {
            return Err(CalcError::calculation_failed(
                "n_teta_surface",
                "no critical strain range found in any direction",
            ));
        }

        let n_min = solvers.iter().map(Func1DSolver::min).fold(f64::MAX, f64::min);
        let n_max = solvers.iter().map(Func1DSolver::max).fold(f64::MIN, f64::max);
        if !(n_max - n_min > 0.0) {
            return Err(CalcError::calculation_failed(
                "n_teta_surface",
                format!("degenerate axial force span [{}, {}]", n_min, n_max),
            ));
        }
        self.min_axial_force = n_min;
        self.max_axial_force = n_max;

        let tolerance = (n_max - n_min) * self.settings.tolerance;
        for s in &mut solvers {
            s.absolute_tolerance = tolerance;
        }

        let targets = axial_force_targets(n_min, n_max, self.settings.n_count, additional_coefs);
        tracing::debug!(
            solvers = solvers.len(),
            rings = targets.len(),
            n_min,
            n_max,
            tolerance,
            "n-teta solvers analysed"
        );

        let successes = AtomicUsize::new(0);
        let failures = AtomicUsize::new(0);
        let build = |target: f64| ring_at(self.section, &solvers, target, &successes, &failures);
        let rings: Vec<FailureRing> = if self.settings.parallel {
            targets.par_iter().map(|&t| build(t)).collect::<CalcResult<_>>()?
        } else {
            targets.iter().map(|&t| build(t)).collect::<CalcResult<_>>()?
        };

        self.successful_solutions = successes.into_inner();
        self.failed_solutions = failures.into_inner();

        let mut surface = FailureSurface::new("NTetaCurveFinder");
        for ring in &rings {
            if ring.is_empty() {
                tracing::warn!(
                    targeted_axial_force = ring.targeted_axial_force,
                    "no failure point reaches the targeted axial force"
                );
                surface.anomalies.push(SurfaceAnomaly::EmptyRing {
                    targeted_axial_force: ring.targeted_axial_force,
                });
            }
        }
        surface.rings = rings;
        surface.statistics.successful_solutions = self.successful_solutions;
        surface.statistics.failed_solutions = self.failed_solutions;
        surface.statistics.evaluations = evaluation_count().saturating_sub(evaluations_before);

        tracing::info!(
            rings = surface.ring_count(),
            points = surface.point_count(),
            failed = self.failed_solutions,
            "n-teta failure surface created"
        );
        Ok(surface)
    }
}

/// Run the wall analysis of every solver, one rayon task per direction.
fn analyse_directions(solvers: &mut [Vec<Func1DSolver<'_>>], parallel: bool) -> CalcResult<()> {
    if parallel {
        solvers.par_iter_mut().try_for_each(analyse_direction)
    } else {
        solvers.iter_mut().try_for_each(analyse_direction)
    }
}

fn analyse_direction(solvers: &mut Vec<Func1DSolver<'_>>) -> CalcResult<()> {
    solvers.iter_mut().try_for_each(Func1DSolver::analyse_for_walls)
}

/// Evenly spaced targets plus the coefficient targets, sorted and deduplicated
fn axial_force_targets(n_min: f64, n_max: f64, n_count: usize, additional_coefs: &[f64]) -> Vec<f64> {
    let step = (n_max - n_min) / (n_count - 1) as f64;
    let mut targets: Vec<f64> = (0..n_count).map(|i| n_min + i as f64 * step).collect();
    // pin the last target so rounding never pushes it past the extreme
    if let Some(last) = targets.last_mut() {
        *last = n_max;
    }

    targets.extend(additional_coefs.iter().filter(|c| c.is_finite()).map(|&c| {
        if c > 0.0 {
            c.min(1.0) * n_max
        } else {
            -c.max(-1.0) * n_min
        }
    }));

    targets.sort_by(f64::total_cmp);
    let merge = TARGET_MERGE_TOLERANCE * (n_max - n_min);
    targets.dedup_by(|a, b| (*a - *b).abs() <= merge);
    targets
}

fn ring_at(
    section: &Section,
    solvers: &[Func1DSolver<'_>],
    target: f64,
    successes: &AtomicUsize,
    failures: &AtomicUsize,
) -> CalcResult<FailureRing> {
    let mut ring = FailureRing::new(target);
    for solver in solvers.iter().filter(|s| s.can_reach(target)) {
        match solver.solve(target)? {
            Some(v) => {
                let range = solver.range();
                let strain = range.strain_profile(v)?;
                ring.points.push(FailurePoint::evaluate(
                    section,
                    strain,
                    range.hinge_position,
                    range.hinge_height,
                )?);
                successes.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
    Ok(ring)
}
