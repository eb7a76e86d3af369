//! # One-Dimensional Axial Force Solver
//!
//! Along a [`CriticalStrainRange`] the strain profile depends on a single
//! normalised slope `v ∈ [0, 1]`, so the section's axial force becomes a
//! scalar function `N(v)` ([`Func1D`]). [`Func1DSolver`] inverts it: given a
//! target axial force it finds a `v` with `N(v) = target`.
//!
//! `N(v)` is continuous but not monotonic. The solver first samples it and
//! locates the turning points ("walls") where `dN/dv` changes sign, then
//! solves each query by false position inside a bracket taken from the
//! recorded samples.
//!
//! The sample history is shared by concurrent queries and guarded by a
//! mutex; everything else is read-only after [`Func1DSolver::analyse_for_walls`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::critical_strain::CriticalStrainRange;
use crate::errors::CalcResult;
use crate::force::Force;
use crate::section::Section;
use crate::settings::SolverSettings;
use crate::strain::StrainProfile;

/// Default absolute tolerance on the axial force (N)
pub const DEFAULT_ABSOLUTE_TOLERANCE: f64 = 1e-6;

/// Default cap on false-position iterations
pub const MAX_ITERATIONS: usize = 100;

/// Number of intervals sampled by [`Func1DSolver::analyse_for_walls`]
const SAMPLE_INTERVALS: usize = 10;

static EVALUATIONS: AtomicUsize = AtomicUsize::new(0);

/// Axial force evaluations performed by every [`Func1D`] in this process
pub fn evaluation_count() -> usize {
    EVALUATIONS.load(Ordering::Relaxed)
}

// ============================================================================
// Func1D
// ============================================================================

/// Axial force along one critical strain range.
#[derive(Debug, Clone, Copy)]
pub struct Func1D<'a> {
    pub section: &'a Section,
    pub range: CriticalStrainRange,
}

impl<'a> Func1D<'a> {
    pub fn new(section: &'a Section, range: CriticalStrainRange) -> Self {
        Func1D { section, range }
    }

    pub fn strain(&self, v: f64) -> CalcResult<StrainProfile> {
        self.range.strain_profile(v)
    }

    pub fn axial_force(&self, v: f64) -> CalcResult<f64> {
        EVALUATIONS.fetch_add(1, Ordering::Relaxed);
        self.section.axial_force(&self.strain(v)?)
    }

    /// Full force resultant at `v`
    pub fn force(&self, v: f64) -> CalcResult<Force> {
        self.section.forces(&self.strain(v)?)
    }

    /// `dN/dv` from the section stiffness by the chain rule through the
    /// hinge: `e0` moves with the slope so the hinge strain stays fixed.
    pub fn axial_force_derivative(&self, v: f64) -> CalcResult<f64> {
        let k = self.section.stiffness(&self.strain(v)?)?;
        let r = &self.range;
        let (yh, zh) = (r.hinge_position.y, r.hinge_position.z);
        let ds = -r.sin * (k.rnx_rky - yh * k.rnx_re0) + r.cos * (k.rnx_rkz - zh * k.rnx_re0);
        Ok(ds * r.width())
    }
}

// ============================================================================
// Func1DSolver
// ============================================================================

#[derive(Debug)]
pub struct Func1DSolver<'a> {
    pub func: Func1D<'a>,
    pub absolute_tolerance: f64,
    pub max_iterations: usize,
    min: f64,
    max: f64,
    walls: Vec<(f64, f64)>,
    history: Mutex<Vec<(f64, f64)>>,
}

/// False-position bracket: input and residual at each end
#[derive(Debug, Clone, Copy)]
struct Bracket {
    x1: f64,
    r1: f64,
    x2: f64,
    r2: f64,
}

impl Bracket {
    /// Next estimate, or `None` for a flat or inverted bracket
    fn next_guess(&self) -> Option<f64> {
        let (x_min, r_min, x_max, r_max) = if self.x1 <= self.x2 {
            (self.x1, self.r1, self.x2, self.r2)
        } else {
            (self.x2, self.r2, self.x1, self.r1)
        };
        if r_max == r_min {
            return None;
        }
        let x = -r_min * (x_max - x_min) / (r_max - r_min) + x_min;
        if !(x_min..=x_max).contains(&x) {
            return None;
        }
        Some(x)
    }

    /// Replace the end whose residual shares the sign of `r`
    fn narrow(&mut self, x: f64, r: f64) {
        if r * self.r1 > 0.0 {
            self.x1 = x;
            self.r1 = r;
        } else {
            self.x2 = x;
            self.r2 = r;
        }
    }
}

impl<'a> Func1DSolver<'a> {
    pub fn new(section: &'a Section, range: CriticalStrainRange) -> Self {
        Func1DSolver {
            func: Func1D::new(section, range),
            absolute_tolerance: DEFAULT_ABSOLUTE_TOLERANCE,
            max_iterations: MAX_ITERATIONS,
            min: f64::MAX,
            max: f64::MIN,
            walls: Vec::new(),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn with_settings(section: &'a Section, range: CriticalStrainRange, settings: &SolverSettings) -> Self {
        Func1DSolver {
            absolute_tolerance: settings.absolute_tolerance,
            max_iterations: settings.max_iterations,
            ..Self::new(section, range)
        }
    }

    pub fn range(&self) -> &CriticalStrainRange {
        &self.func.range
    }

    /// Smallest axial force seen so far
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest axial force seen so far
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Turning points of `N(v)` plus both ends, sorted by `v`
    pub fn walls(&self) -> &[(f64, f64)] {
        &self.walls
    }

    /// Copy of every recorded `(v, N)` sample
    pub fn history(&self) -> Vec<(f64, f64)> {
        self.lock_history().clone()
    }

    fn lock_history(&self) -> MutexGuard<'_, Vec<(f64, f64)>> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, x: f64, y: f64) {
        let mut history = self.lock_history();
        if !history.iter().any(|&(hx, _)| hx == x) {
            history.push((x, y));
        }
    }

    fn refresh_extremes(&mut self) {
        let history = self.history.get_mut().unwrap_or_else(|p| p.into_inner());
        for &(_, y) in history.iter() {
            self.min = self.min.min(y);
            self.max = self.max.max(y);
        }
    }

    /// Sample `N(v)`, locate its turning points and record the extremes.
    pub fn analyse_for_walls(&mut self) -> CalcResult<()> {
        let mut samples = Vec::with_capacity(SAMPLE_INTERVALS + 1);
        for i in 0..=SAMPLE_INTERVALS {
            let x = i as f64 / SAMPLE_INTERVALS as f64;
            samples.push((x, self.func.axial_force(x)?, self.func.axial_force_derivative(x)?));
        }
        for &(x, f, _) in &samples {
            self.record(x, f);
        }

        let tol = 1e-2 * samples.iter().map(|s| s.2.abs()).fold(0.0, f64::max);

        let mut walls = vec![(samples[0].0, samples[0].1)];
        if let Some(last) = samples.last() {
            walls.push((last.0, last.1));
        }

        for pair in samples.windows(2) {
            let (xa, _, da) = pair[0];
            let (xb, _, db) = pair[1];
            if da * db < 0.0 {
                if let Some(root) = self.derivative_root(xa, da, xb, db, tol)? {
                    let f = self.func.axial_force(root)?;
                    walls.push((root, f));
                    self.record(root, f);
                }
            }
        }

        walls.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.walls = walls;
        self.refresh_extremes();
        Ok(())
    }

    /// False-position search for `dN/dv = 0` between `a` and `b`, `None`
    /// when it does not converge
    fn derivative_root(&self, mut a: f64, mut da: f64, mut b: f64, mut db: f64, tol: f64) -> CalcResult<Option<f64>> {
        for _ in 0..self.max_iterations {
            if db == da {
                return Ok(None);
            }
            let x = a - da * (b - a) / (db - da);
            let dx = self.func.axial_force_derivative(x)?;
            if dx.abs() < tol {
                return Ok(Some(x));
            }
            if dx * da < 0.0 {
                b = x;
                db = dx;
            } else {
                a = x;
                da = dx;
            }
        }
        Ok(None)
    }

    /// Evaluate and record extra samples, widening the known extremes
    pub fn add_guesses(&mut self, xs: &[f64]) -> CalcResult<()> {
        for &x in xs {
            let y = self.func.axial_force(x)?;
            self.record(x, y);
        }
        self.refresh_extremes();
        Ok(())
    }

    /// Whether `target` lies within the recorded extremes, padded by the tolerance
    pub fn can_reach(&self, target: f64) -> bool {
        let tol = self.absolute_tolerance;
        (self.max > target || (self.max - target).abs() < tol)
            && (self.min < target || (self.min - target).abs() < tol)
    }

    /// Find `v` with `|N(v) - y| < tolerance`, or `None` when `y` is out of
    /// reach or the iteration stalls.
    pub fn solve(&self, y: f64) -> CalcResult<Option<f64>> {
        let tol = self.absolute_tolerance;

        let mut sorted = {
            let history = self.lock_history();
            if let Some(&(x, _)) = history.iter().find(|&&(_, out)| (out - y).abs() < tol) {
                return Ok(Some(x));
            }
            history.clone()
        };

        if y < self.min - tol || y > self.max + tol {
            return Ok(None);
        }

        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut bracket = match sorted
            .windows(2)
            .find(|w| (w[0].1 - y) * (w[1].1 - y) <= 0.0)
        {
            Some(w) => Bracket {
                x1: w[0].0,
                r1: w[0].1 - y,
                x2: w[1].0,
                r2: w[1].1 - y,
            },
            None => Bracket {
                x1: 0.0,
                r1: self.func.axial_force(0.0)? - y,
                x2: 1.0,
                r2: self.func.axial_force(1.0)? - y,
            },
        };

        for _ in 0..self.max_iterations {
            let x = match bracket.next_guess() {
                Some(x) => x,
                None => return Ok(None),
            };
            let out = self.func.axial_force(x)?;
            self.record(x, out);
            if (out - y).abs() < tol {
                return Ok(Some(x));
            }
            bracket.narrow(x, out - y);
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::critical_strain::calculate_for_section;
    use crate::test_support::reinforced_column;
    use approx::assert_relative_eq;

    /// Analysed solvers for every range, with the tolerance the curve finders
    /// use: 1e-4 of the section's whole axial force span
    fn solvers(section: &Section, delta_teta: f64) -> Vec<Func1DSolver<'_>> {
        let mut out: Vec<Func1DSolver<'_>> = calculate_for_section(section, delta_teta)
            .unwrap()
            .into_iter()
            .flatten()
            .map(|r| Func1DSolver::new(section, r))
            .collect();
        for s in &mut out {
            s.analyse_for_walls().unwrap();
        }
        let n_min = out.iter().map(Func1DSolver::min).fold(f64::MAX, f64::min);
        let n_max = out.iter().map(Func1DSolver::max).fold(f64::MIN, f64::max);
        for s in &mut out {
            s.absolute_tolerance = (n_max - n_min) * 1e-4;
        }
        out
    }

    #[test]
    fn test_bracket_guess() {
        let b = Bracket {
            x1: 1.0,
            r1: 2.0,
            x2: 0.0,
            r2: -2.0,
        };
        assert_relative_eq!(b.next_guess().unwrap(), 0.5, epsilon = 1e-15);
        let flat = Bracket {
            x1: 0.0,
            r1: 1.0,
            x2: 1.0,
            r2: 1.0,
        };
        assert!(flat.next_guess().is_none());
        // same-sign residuals extrapolate outside the bracket
        let outside = Bracket {
            x1: 0.0,
            r1: 1.0,
            x2: 1.0,
            r2: 2.0,
        };
        assert!(outside.next_guess().is_none());
    }

    #[test]
    fn test_range_end_points_within_extremes() {
        let section = reinforced_column(0.4, 0.6);
        for s in solvers(&section, 30.0) {
            let n0 = s.func.axial_force(0.0).unwrap();
            let n1 = s.func.axial_force(1.0).unwrap();
            assert!(n0 >= s.min() && n0 <= s.max());
            assert!(n1 >= s.min() && n1 <= s.max());
            assert!(s.walls().len() >= 2);
            assert!(s.walls().windows(2).all(|w| w[0].0 <= w[1].0));
        }
    }

    #[test]
    fn test_solve_every_interior_target() {
        let section = reinforced_column(0.4, 0.6);
        let all = solvers(&section, 15.0);
        assert!(!all.is_empty());
        for (i, s) in all.iter().enumerate() {
            let span = s.max() - s.min();
            for k in 1..20 {
                let y = s.min() + k as f64 / 20.0 * span;
                let v = s
                    .solve(y)
                    .unwrap()
                    .unwrap_or_else(|| panic!("range {} has no solution for N = {}", i, y));
                assert!((0.0..=1.0).contains(&v));
                let n = s.func.axial_force(v).unwrap();
                assert!((n - y).abs() < s.absolute_tolerance, "range {}: N={} y={}", i, n, y);
            }
        }
    }

    #[test]
    fn test_solve_is_idempotent() {
        let section = reinforced_column(0.4, 0.6);
        let all = solvers(&section, 30.0);
        let s = all.iter().find(|s| s.max() - s.min() > 1e3).unwrap();
        let y = s.min() + 0.37 * (s.max() - s.min());
        let first = s.solve(y).unwrap();
        let second = s.solve(y).unwrap();
        assert_eq!(first.is_some(), second.is_some());
        if let (Some(a), Some(b)) = (first, second) {
            let na = s.func.axial_force(a).unwrap();
            let nb = s.func.axial_force(b).unwrap();
            assert!((na - nb).abs() < 2.0 * s.absolute_tolerance);
        }
    }

    #[test]
    fn test_out_of_reach() {
        let section = reinforced_column(0.4, 0.6);
        let all = solvers(&section, 30.0);
        let s = &all[0];
        assert_eq!(s.solve(s.max() + 1e6).unwrap(), None);
        assert_eq!(s.solve(s.min() - 1e6).unwrap(), None);
        assert!(!s.can_reach(s.max() + 1e6));
        assert!(s.can_reach(s.max()));
    }

    #[test]
    fn test_unconverged_turning_points_are_not_walls() {
        let section = reinforced_column(0.4, 0.6);
        for analysed in solvers(&section, 15.0) {
            // every interior wall is a converged turning point
            let d_max = (0..=SAMPLE_INTERVALS)
                .map(|i| analysed.func.axial_force_derivative(i as f64 / SAMPLE_INTERVALS as f64).unwrap().abs())
                .fold(0.0, f64::max);
            for &(x, _) in &analysed.walls()[1..analysed.walls().len() - 1] {
                assert!(analysed.func.axial_force_derivative(x).unwrap().abs() < 1e-2 * d_max);
            }

            let mut s = Func1DSolver::new(&section, *analysed.range());
            s.max_iterations = 0;
            s.analyse_for_walls().unwrap();
            assert_eq!(s.walls().len(), 2);
            assert_eq!(s.walls()[0].0, 0.0);
            assert_eq!(s.walls()[1].0, 1.0);
        }
        let s = Func1DSolver::new(&section, calculate_for_section(&section, 30.0).unwrap()[1][0]);
        assert_eq!(s.derivative_root(0.0, 1.0, 1.0, 1.0, 1e-9).unwrap(), None);
    }

    #[test]
    fn test_add_guesses_records_samples() {
        let section = reinforced_column(0.4, 0.6);
        let range = calculate_for_section(&section, 90.0).unwrap()[0][0];
        let mut s = Func1DSolver::new(&section, range);
        s.add_guesses(&[0.0, 0.3, 0.3, 1.0]).unwrap();
        assert_eq!(s.history().len(), 3);
        assert!(s.min() <= s.max());
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let section = reinforced_column(0.4, 0.6);
        let range = calculate_for_section(&section, 45.0).unwrap()[1][0];
        let f = Func1D::new(&section, range);
        let (v, h) = (0.4, 1e-6);
        let fd = (f.axial_force(v + h).unwrap() - f.axial_force(v - h).unwrap()) / (2.0 * h);
        let d = f.axial_force_derivative(v).unwrap();
        assert_relative_eq!(d, fd, max_relative = 1e-3, epsilon = 1.0);
    }

    #[test]
    fn test_evaluation_counter_advances() {
        let section = reinforced_column(0.3, 0.3);
        let range = calculate_for_section(&section, 90.0).unwrap()[0][0];
        let f = Func1D::new(&section, range);
        let before = evaluation_count();
        f.axial_force(0.5).unwrap();
        assert!(evaluation_count() > before);
    }
}
