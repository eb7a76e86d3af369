//! # N-Alpha Curve Finder
//!
//! Resamples the rings of an [`NTetaCurveFinder`] surface at evenly spaced
//! moment directions `alpha`, so that every interior ring carries one point
//! per direction. The lowest and highest rings collapse to (nearly) pure
//! axial states and are kept as found.
//!
//! For each direction the finder looks for, in order:
//!
//! 1. an existing point whose moment already points along `alpha`;
//! 2. two neighbouring points whose moments straddle `alpha`. When both
//!    rotate about the same hinge, the strain is interpolated between them.
//!    Otherwise the pair is bisected with fresh solvers until a same-hinge
//!    pair straddles `alpha`.
//!
//! Directions where neither works are recorded as
//! [`SurfaceAnomaly::DroppedAngle`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use section_core::curves::NAlphaCurveFinder;
//! # fn section() -> section_core::section::Section { unimplemented!() }
//!
//! let section = section();
//! let mut finder = NAlphaCurveFinder::new(&section);
//! finder.settings.delta_alpha = 10.0;
//! let surface = finder.create_surface(&[]).unwrap();
//! println!("{} anomalies", surface.anomalies.len());
//! ```

use std::f64::consts::PI;

use rayon::prelude::*;

use crate::critical_strain::{calculate, UltimateFibersSnapshot};
use crate::errors::{CalcError, CalcResult};
use crate::geometry::{is_between, moment_angle, moment_unit_vector, wrap_angle, VectorYZ};
use crate::section::Section;
use crate::settings::{NAlphaSettings, NTetaSettings, SolverSettings};
use crate::solver::{evaluation_count, Func1DSolver};
use crate::strain::StrainProfile;
use crate::surface::{FailurePoint, FailureRing, FailureSurface, SurfaceAnomaly, SurfaceMetadata};

use super::NTetaCurveFinder;

/// Per-component tolerance on moment unit vectors for reusing a point as is
const DIRECTION_TOLERANCE: f64 = 1e-3;

/// Cap on bisection steps for one straddling pair
const MAX_BISECTIONS: usize = 100;

pub struct NAlphaCurveFinder<'a> {
    pub section: &'a Section,
    pub settings: NAlphaSettings,
    pub solver_settings: SolverSettings,
    min_axial_force: f64,
    max_axial_force: f64,
}

impl<'a> NAlphaCurveFinder<'a> {
    pub fn new(section: &'a Section) -> Self {
        Self::with_settings(section, NAlphaSettings::default(), SolverSettings::default())
    }

    pub fn with_settings(section: &'a Section, settings: NAlphaSettings, solver_settings: SolverSettings) -> Self {
        NAlphaCurveFinder {
            section,
            settings,
            solver_settings,
            min_axial_force: f64::NAN,
            max_axial_force: f64::NAN,
        }
    }

    pub fn min_axial_force(&self) -> f64 {
        self.min_axial_force
    }

    pub fn max_axial_force(&self) -> f64 {
        self.max_axial_force
    }

    /// Moment directions swept on every interior ring, from -π up to but
    /// excluding π
    pub fn alphas(&self) -> Vec<f64> {
        let step = self.settings.delta_alpha.to_radians();
        let count = (2.0 * PI / step - 1e-9).ceil() as usize;
        (0..count).map(|i| -PI + i as f64 * step).collect()
    }

    /// Build the resampled surface. `additional_coefs` is handed to the
    /// underlying [`NTetaCurveFinder`].
    pub fn create_surface(&mut self, additional_coefs: &[f64]) -> CalcResult<FailureSurface> {
        self.settings.validate()?;
        let evaluations_before = evaluation_count();

        let n_teta_settings = NTetaSettings {
            delta_teta: self.settings.delta_alpha * 0.5,
            n_count: self.settings.n_count,
            tolerance: self.settings.tolerance,
            parallel: self.settings.parallel,
        };
        let mut n_teta = NTetaCurveFinder::with_settings(self.section, n_teta_settings, self.solver_settings);
        let mut surface = n_teta.create_surface(additional_coefs)?;
        self.min_axial_force = n_teta.min_axial_force();
        self.max_axial_force = n_teta.max_axial_force();

        let resampler = Resampler {
            section: self.section,
            snapshot: self.section.ultimate_fibers()?,
            solver_settings: SolverSettings {
                absolute_tolerance: (self.max_axial_force - self.min_axial_force) * self.settings.tolerance,
                ..self.solver_settings
            },
            improve: self.settings.improve,
        };
        let alphas = self.alphas();

        let last = surface.rings.len().saturating_sub(1);
        let resample = |(idx, ring): (usize, &mut FailureRing)| -> CalcResult<Vec<SurfaceAnomaly>> {
            if idx == 0 || idx == last || ring.is_empty() {
                return Ok(Vec::new());
            }
            let (points, dropped) = resampler.resample(ring, &alphas)?;
            ring.points = points;
            Ok(dropped
                .into_iter()
                .map(|alpha| SurfaceAnomaly::DroppedAngle { ring: idx, alpha })
                .collect())
        };
        let dropped: Vec<Vec<SurfaceAnomaly>> = if self.settings.parallel {
            surface
                .rings
                .par_iter_mut()
                .enumerate()
                .map(resample)
                .collect::<CalcResult<_>>()?
        } else {
            surface
                .rings
                .iter_mut()
                .enumerate()
                .map(resample)
                .collect::<CalcResult<_>>()?
        };
        surface.anomalies.extend(dropped.into_iter().flatten());

        surface.metadata = SurfaceMetadata::new("NAlphaCurveFinder");
        surface.statistics.evaluations = evaluation_count().saturating_sub(evaluations_before);

        tracing::info!(
            rings = surface.ring_count(),
            points = surface.point_count(),
            anomalies = surface.anomalies.len(),
            "n-alpha failure surface created"
        );
        Ok(surface)
    }
}

/// Shared read-only state of one resampling run
struct Resampler<'a> {
    section: &'a Section,
    snapshot: &'a UltimateFibersSnapshot,
    solver_settings: SolverSettings,
    improve: bool,
}

impl Resampler<'_> {
    /// Points of `ring` at the directions `alphas`, plus the directions
    /// that could not be resolved
    fn resample(&self, ring: &FailureRing, alphas: &[f64]) -> CalcResult<(Vec<FailurePoint>, Vec<f64>)> {
        let center = ring.mean_force();
        let nx = center.nx;

        let mut sorted = ring.points.clone();
        sorted.sort_by(|a, b| {
            let ta = (a.force.mz - center.mz).atan2(a.force.my - center.my);
            let tb = (b.force.mz - center.mz).atan2(b.force.my - center.my);
            ta.total_cmp(&tb)
        });

        let mut points = Vec::with_capacity(alphas.len());
        let mut dropped = Vec::new();
        let mut worst_error: f64 = 0.0;

        for &alpha in alphas {
            let found = match best_point(&sorted, alpha) {
                Some(p) => Some(p),
                None => match self.matching_points(&sorted, alpha, nx)? {
                    Some((a, b)) => Some(interpolate(&a, &b, alpha, self.section)?),
                    None => None,
                },
            };

            match found {
                Some(p) => {
                    let p = if self.improve {
                        improve(&p, alpha, nx, self.section)?
                    } else {
                        p
                    };
                    worst_error = worst_error.max(wrap_angle(p.moment_angle() - alpha).abs());
                    points.push(p);
                }
                None => {
                    tracing::debug!(alpha, nx, "no failure point found for moment direction");
                    dropped.push(alpha);
                }
            }
        }

        tracing::debug!(
            nx,
            points = points.len(),
            dropped = dropped.len(),
            worst_error_deg = worst_error.to_degrees(),
            "ring resampled"
        );
        Ok((points, dropped))
    }

    /// Two neighbouring points (wrapping around) whose moments straddle
    /// `alpha` and that rotate about one hinge.
    fn matching_points(
        &self,
        points: &[FailurePoint],
        alpha: f64,
        nx: f64,
    ) -> CalcResult<Option<(FailurePoint, FailurePoint)>> {
        let target = VectorYZ::from_direction(alpha, 1.0);
        let n = points.len();

        for i in 0..n {
            let (a, b) = (points[i], points[(i + 1) % n]);
            let (Some(va), Some(vb)) = (moment_unit_vector(&a.force), moment_unit_vector(&b.force)) else {
                continue;
            };
            if !is_between(va, vb, target) {
                continue;
            }
            if a.can_interpolate(&b) {
                return Ok(Some((a, b)));
            }
            if let Some(pair) = self.narrow_pair(a, b, target, nx)? {
                return Ok(Some(pair));
            }
        }
        Ok(None)
    }

    /// Bisect a straddling pair until both ends share a hinge
    fn narrow_pair(
        &self,
        mut f1: FailurePoint,
        mut f2: FailurePoint,
        target: VectorYZ,
        nx: f64,
    ) -> CalcResult<Option<(FailurePoint, FailurePoint)>> {
        for _ in 0..MAX_BISECTIONS {
            let Some(f3) = self.bisect(nx, &f1, &f2)? else {
                return Ok(None);
            };
            let (Some(v1), Some(v2), Some(v3)) = (
                moment_unit_vector(&f1.force),
                moment_unit_vector(&f2.force),
                moment_unit_vector(&f3.force),
            ) else {
                return Ok(None);
            };

            if is_between(v1, v3, target) {
                if f1.can_interpolate(&f3) {
                    return Ok(Some((f1, f3)));
                }
                f2 = f3;
            } else if is_between(v3, v2, target) {
                if f3.can_interpolate(&f2) {
                    return Ok(Some((f3, f2)));
                }
                f1 = f3;
            } else {
                return Ok(None);
            }
        }
        Ok(None)
    }

    /// Failure point at axial force `target_nx` in the bending direction
    /// halfway between `p1` and `p2`, rotating about the hinge of either.
    fn bisect(&self, target_nx: f64, p1: &FailurePoint, p2: &FailurePoint) -> CalcResult<Option<FailurePoint>> {
        let ky = 0.5 * (p1.strain.ky + p2.strain.ky);
        let kz = 0.5 * (p1.strain.kz + p2.strain.kz);
        let l = (ky * ky + kz * kz).sqrt();
        if l == 0.0 || !l.is_finite() {
            return Ok(None);
        }
        let (sin, cos) = (-ky / l, kz / l);

        let range = calculate(self.snapshot, sin, cos).into_iter().find(|r| {
            r.same_hinge(p1.hinge_position, p1.hinge_height) || r.same_hinge(p2.hinge_position, p2.hinge_height)
        });
        let Some(range) = range else {
            return Ok(None);
        };

        let mut solver = Func1DSolver::with_settings(self.section, range, &self.solver_settings);
        solver.analyse_for_walls()?;
        match solver.solve(target_nx)? {
            Some(v) => Ok(Some(FailurePoint::evaluate(
                self.section,
                range.strain_profile(v)?,
                range.hinge_position,
                range.hinge_height,
            )?)),
            None => Ok(None),
        }
    }
}

/// A point, excluding the last, whose moment already points along `alpha`
fn best_point(points: &[FailurePoint], alpha: f64) -> Option<FailurePoint> {
    let target = VectorYZ::from_direction(alpha, 1.0);
    let n = points.len().saturating_sub(1);
    points[..n]
        .iter()
        .find(|p| {
            moment_unit_vector(&p.force).is_some_and(|v| {
                (v.y - target.y).abs() < DIRECTION_TOLERANCE && (v.z - target.z).abs() < DIRECTION_TOLERANCE
            })
        })
        .copied()
}

/// Linear interpolation of the curvature between two points sharing a hinge,
/// at the fraction of the moment angle from `a` to `b` that `alpha` sits at.
/// The force is evaluated exactly at the interpolated strain.
pub fn interpolate(a: &FailurePoint, b: &FailurePoint, alpha: f64, section: &Section) -> CalcResult<FailurePoint> {
    if !a.can_interpolate(b) {
        return Err(CalcError::invalid_operation(
            "interpolate",
            "failure points rotate about different hinges",
        ));
    }

    let aa = a.moment_angle();
    let span = wrap_angle(b.moment_angle() - aa);
    if span == 0.0 {
        return Ok(*a);
    }
    let gamma = wrap_angle(alpha - aa) / span;

    let ky = a.strain.ky + gamma * (b.strain.ky - a.strain.ky);
    let kz = a.strain.kz + gamma * (b.strain.kz - a.strain.kz);
    let strain = StrainProfile::through_hinge(ky, kz, a.hinge_position, a.hinge_height);
    FailurePoint::evaluate(section, strain, a.hinge_position, a.hinge_height)
}

/// One Newton step on the curvature, keeping the hinge strain fixed, that
/// drives the moment towards direction `alpha` and the axial force towards
/// `target_nx`. A singular Jacobian leaves the point unchanged.
pub fn improve(a: &FailurePoint, alpha: f64, target_nx: f64, section: &Section) -> CalcResult<FailurePoint> {
    let (yh, zh) = (a.hinge_position.y, a.hinge_position.z);
    let k = section.stiffness(&a.strain)?;

    // derivatives with e0 following the hinge
    let rmy_ky = k.rmy_rky - k.rmy_re0 * yh;
    let rmy_kz = k.rmy_rkz - k.rmy_re0 * zh;
    let rmz_ky = k.rmz_rky - k.rmz_re0 * yh;
    let rmz_kz = k.rmz_rkz - k.rmz_re0 * zh;
    let rnx_ky = k.rnx_rky - k.rnx_re0 * yh;
    let rnx_kz = k.rnx_rkz - k.rnx_re0 * zh;

    let (c, e) = (-alpha.sin(), alpha.cos());
    let b11 = -c * rmy_ky - e * rmz_ky;
    let b12 = -c * rmy_kz - e * rmz_kz;
    let b21 = -rnx_ky;
    let b22 = -rnx_kz;

    let det = b11 * b22 - b12 * b21;
    if det == 0.0 || !det.is_finite() {
        return Ok(*a);
    }
    let (c11, c12, c21, c22) = (b22 / det, -b12 / det, -b21 / det, b11 / det);

    let off_axis = c * a.force.my + e * a.force.mz;
    let excess = a.force.nx - target_nx;
    let ky = a.strain.ky + c11 * off_axis + c12 * excess;
    let kz = a.strain.kz + c21 * off_axis + c22 * excess;

    let strain = StrainProfile::through_hinge(ky, kz, a.hinge_position, a.hinge_height);
    FailurePoint::evaluate(section, strain, a.hinge_position, a.hinge_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::critical_strain::calculate_for_section;
    use crate::test_support::reinforced_column;
    use approx::assert_relative_eq;

    fn point_on(section: &Section, range: &crate::critical_strain::CriticalStrainRange, v: f64) -> FailurePoint {
        FailurePoint::evaluate(
            section,
            range.strain_profile(v).unwrap(),
            range.hinge_position,
            range.hinge_height,
        )
        .unwrap()
    }

    fn finder(section: &Section) -> NAlphaCurveFinder<'_> {
        let mut f = NAlphaCurveFinder::new(section);
        f.settings.delta_alpha = 30.0;
        f.settings.n_count = 5;
        f
    }

    #[test]
    fn test_alphas_cover_full_turn() {
        let section = reinforced_column(0.3, 0.3);
        let f = finder(&section);
        let alphas = f.alphas();
        assert_eq!(alphas.len(), 12);
        assert_relative_eq!(alphas[0], -PI);
        assert_relative_eq!(alphas[11], 5.0 * PI / 6.0, epsilon = 1e-12);
        assert!(alphas.iter().all(|&a| a < PI));

        // a step that does not divide the turn stops short of π
        let mut f = finder(&section);
        f.settings.delta_alpha = 7.0;
        let alphas = f.alphas();
        assert_eq!(alphas.len(), 52);
        assert_relative_eq!(alphas[51], -PI + 51.0 * 7f64.to_radians(), epsilon = 1e-12);
        assert!(alphas[51] < PI);
    }

    #[test]
    fn test_interpolate_end_points() {
        let section = reinforced_column(0.4, 0.6);
        let range = calculate_for_section(&section, 30.0).unwrap()[1][0];
        let a = point_on(&section, &range, 0.3);
        let b = point_on(&section, &range, 0.7);

        let at_a = interpolate(&a, &b, a.moment_angle(), &section).unwrap();
        assert_relative_eq!(at_a.strain.ky, a.strain.ky, epsilon = 1e-15);
        assert_relative_eq!(at_a.strain.kz, a.strain.kz, epsilon = 1e-15);

        let mid = interpolate(&a, &b, a.moment_angle() + 0.5 * wrap_angle(b.moment_angle() - a.moment_angle()), &section)
            .unwrap();
        assert_relative_eq!(mid.strain.strain_at(range.hinge_position), range.hinge_height, epsilon = 1e-12);
        assert_relative_eq!(mid.strain.kz, 0.5 * (a.strain.kz + b.strain.kz), epsilon = 1e-12);
    }

    #[test]
    fn test_interpolate_rejects_different_hinges() {
        let section = reinforced_column(0.4, 0.6);
        let ranges = &calculate_for_section(&section, 30.0).unwrap()[1];
        let other = ranges
            .iter()
            .find(|r| !r.same_hinge(ranges[0].hinge_position, ranges[0].hinge_height))
            .unwrap();
        let a = point_on(&section, &ranges[0], 0.5);
        let b = point_on(&section, other, 0.5);
        assert!(interpolate(&a, &b, 0.0, &section).is_err());
    }

    #[test]
    fn test_improve_reduces_residual() {
        let section = reinforced_column(0.4, 0.6);
        let range = calculate_for_section(&section, 30.0).unwrap()[1][0];
        let a = point_on(&section, &range, 0.5);
        let alpha = a.moment_angle() + 0.02;
        let target = a.force.nx + 0.01 * a.force.nx.abs().max(1e4);

        let residual = |p: &FailurePoint| {
            let off = -alpha.sin() * p.force.my + alpha.cos() * p.force.mz;
            (off / p.force.moment().max(1.0)).abs() + ((p.force.nx - target) / target.abs()).abs()
        };
        let b = improve(&a, alpha, target, &section).unwrap();
        assert!(residual(&b) < residual(&a), "{} >= {}", residual(&b), residual(&a));
        assert_relative_eq!(b.strain.strain_at(range.hinge_position), range.hinge_height, epsilon = 1e-12);
    }

    #[test]
    fn test_best_point_skips_last() {
        let section = reinforced_column(0.4, 0.6);
        let range = calculate_for_section(&section, 30.0).unwrap()[1][0];
        let a = point_on(&section, &range, 0.5);
        assert!(best_point(&[a], a.moment_angle()).is_none());
        let found = best_point(&[a, a], a.moment_angle()).unwrap();
        assert_eq!(found, a);
    }

    #[test]
    fn test_resampled_rings() {
        let section = reinforced_column(0.4, 0.4);
        let mut f = finder(&section);
        let surface = f.create_surface(&[]).unwrap();
        let alphas = f.alphas();

        assert_eq!(surface.metadata.generator, "NAlphaCurveFinder");
        assert_eq!(surface.ring_count(), 5);
        for (idx, ring) in surface.rings.iter().enumerate().take(4).skip(1) {
            let dropped = surface
                .anomalies
                .iter()
                .filter(|a| matches!(a, SurfaceAnomaly::DroppedAngle { ring, .. } if *ring == idx))
                .count();
            assert_eq!(ring.len() + dropped, alphas.len());
            assert!(ring.len() > alphas.len() / 2);

            for p in &ring.points {
                assert_relative_eq!(p.strain.strain_at(p.hinge_position), p.hinge_height, epsilon = 1e-12);
                let nearest = alphas
                    .iter()
                    .map(|&a| wrap_angle(p.moment_angle() - a).abs())
                    .fold(f64::MAX, f64::min);
                assert!(nearest < 10f64.to_radians(), "{}", nearest.to_degrees());
            }
        }
    }

    #[test]
    fn test_end_rings_untouched() {
        let section = reinforced_column(0.4, 0.4);
        let mut f = finder(&section);
        f.settings.parallel = false;
        let surface = f.create_surface(&[]).unwrap();
        let first = &surface.rings[0];
        assert_eq!(first.targeted_axial_force, f.min_axial_force());
        assert!(first.points.iter().all(|p| (p.force.nx - first.targeted_axial_force).abs()
            < (f.max_axial_force() - f.min_axial_force()) * 1.01 * f.settings.tolerance));
    }
}
