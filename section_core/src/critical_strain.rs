//! # Critical Strain Calculator
//!
//! Finds, for a bending direction, every strain profile family in which one
//! point of the section sits exactly at its failure strain while no other
//! point exceeds its own.
//!
//! A direction `teta` fixes the curvature vector up to a scalar slope `s`:
//! `ky = -sin·s`, `kz = cos·s`. Projecting each ultimate point onto
//! `λ = -sin·y + cos·z` reduces the problem to a line: the strain is
//! `ε(λ) = εh + s·(λ - λh)` through a chosen hinge `(λh, εh)`. Every other
//! point bounds `s` from above or below depending on its side and on whether
//! it limits tension or compression, which yields the admissible slope
//! interval of a [`CriticalStrainRange`].
//!
//! ```text
//!   ε
//!   │   ○ tension limit (top)
//!   │    ╲
//!   │ ────●──── hinge, slopes rotate around it
//!   │      ╲
//!   │       ○ compression limit (bottom)
//!   └──────────── λ
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::geometry::Point;
use crate::section::Section;
use crate::strain::StrainProfile;

/// Points sharing λ within this distance are treated as one
const LAMBDA_TOLERANCE: f64 = 1e-10;

/// Ranges narrower than this are discarded
const MIN_RANGE_WIDTH: f64 = 1e-6;

// ============================================================================
// Ultimate fibers
// ============================================================================

/// A point with the strain at which it fails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UltimateFiber {
    pub position: Point,
    pub height: f64,
}

/// Every point of the section that can govern failure.
///
/// Tension-sensitive points carry a positive failure strain, pressure
/// sensitive points a negative one. A point whose foreground and background
/// both carry a limit appears once per limit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UltimateFibersSnapshot {
    pub tension: Vec<UltimateFiber>,
    pub pressure: Vec<UltimateFiber>,
}

impl UltimateFibersSnapshot {
    pub fn create(section: &Section) -> CalcResult<Self> {
        let mut snapshot = UltimateFibersSnapshot::default();

        for element in section.elements() {
            let points = element.control_points();
            for m in element.materials().iter() {
                if let Some(height) = m.positive_failure_strain() {
                    snapshot
                        .tension
                        .extend(points.iter().map(|&position| UltimateFiber { position, height }));
                }
                if let Some(height) = m.negative_failure_strain() {
                    snapshot
                        .pressure
                        .extend(points.iter().map(|&position| UltimateFiber { position, height }));
                }
            }
        }

        if snapshot.tension.is_empty() {
            return Err(CalcError::unsatisfiable_snapshot("tension-sensitive"));
        }
        if snapshot.pressure.is_empty() {
            return Err(CalcError::unsatisfiable_snapshot("pressure-sensitive"));
        }

        tracing::debug!(
            tension = snapshot.tension.len(),
            pressure = snapshot.pressure.len(),
            "ultimate fibers snapshot created"
        );
        Ok(snapshot)
    }
}

// ============================================================================
// Critical strain range
// ============================================================================

/// Admissible slope interval of the strain profiles rotating about one hinge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalStrainRange {
    pub sin: f64,
    pub cos: f64,
    pub hinge_position: Point,
    pub hinge_height: f64,
    pub minimum_slope: f64,
    pub maximum_slope: f64,
}

impl CriticalStrainRange {
    /// Strain profile at the normalised slope `v ∈ [0, 1]`
    pub fn strain_profile(&self, v: f64) -> CalcResult<StrainProfile> {
        if !(0.0..=1.0).contains(&v) {
            return Err(CalcError::invalid_input(
                "v",
                v.to_string(),
                "normalised slope must lie in [0, 1]",
            ));
        }
        if self.maximum_slope <= self.minimum_slope {
            return Err(CalcError::invalid_operation(
                "strain_profile",
                format!(
                    "empty slope range [{}, {}]",
                    self.minimum_slope, self.maximum_slope
                ),
            ));
        }

        let s = self.minimum_slope + (self.maximum_slope - self.minimum_slope) * v;
        Ok(StrainProfile::through_hinge(
            -self.sin * s,
            self.cos * s,
            self.hinge_position,
            self.hinge_height,
        ))
    }

    pub fn width(&self) -> f64 {
        self.maximum_slope - self.minimum_slope
    }

    /// Same hinge position and failure strain
    pub fn same_hinge(&self, position: Point, height: f64) -> bool {
        self.hinge_position == position && self.hinge_height == height
    }
}

/// Ultimate point projected onto the direction's λ axis
#[derive(Debug, Clone, Copy)]
struct ProjectedFiber {
    lambda: f64,
    height: f64,
    position: Point,
}

/// Project, sort by λ and merge points sharing λ. `keep_first` decides
/// which of two merged heights survives.
fn project(
    fibers: &[UltimateFiber],
    sin: f64,
    cos: f64,
    keep_first: impl Fn(f64, f64) -> bool,
) -> Vec<ProjectedFiber> {
    let mut all: Vec<ProjectedFiber> = fibers
        .iter()
        .map(|f| ProjectedFiber {
            lambda: -sin * f.position.y + cos * f.position.z,
            height: f.height,
            position: f.position,
        })
        .collect();
    all.sort_by(|a, b| a.lambda.total_cmp(&b.lambda));

    let mut merged: Vec<ProjectedFiber> = Vec::with_capacity(all.len());
    for f in all {
        match merged
            .iter_mut()
            .find(|m| (m.lambda - f.lambda).abs() < LAMBDA_TOLERANCE)
        {
            Some(m) => {
                if !keep_first(m.height, f.height) {
                    m.height = f.height;
                    m.position = f.position;
                }
            }
            None => merged.push(f),
        }
    }
    merged
}

/// Slope interval `(min, max)` for strain profiles through `hinge`.
///
/// Compression limits below the hinge and tension limits above it cap the
/// slope; tension limits below and compression limits above floor it.
fn generate_for_hinge(
    tops: &[ProjectedFiber],
    bots: &[ProjectedFiber],
    hinge: &ProjectedFiber,
) -> Option<(f64, f64)> {
    let slope = |j: &ProjectedFiber| (hinge.height - j.height) / (hinge.lambda - j.lambda);
    let below = |j: &&ProjectedFiber| j.lambda < hinge.lambda;
    let above = |j: &&ProjectedFiber| j.lambda > hinge.lambda;

    let lh = bots.iter().filter(below).map(slope).fold(f64::MAX, f64::min);
    let ll = tops.iter().filter(below).map(slope).fold(f64::MIN, f64::max);
    let rh = tops.iter().filter(above).map(slope).fold(f64::MAX, f64::min);
    let rl = bots.iter().filter(above).map(slope).fold(f64::MIN, f64::max);

    let h = rh.min(lh);
    let l = rl.max(ll);

    if (h - l).abs() < LAMBDA_TOLERANCE || h <= l {
        return None;
    }
    Some((l, h))
}

/// Critical strain ranges for the direction `(sin, cos)`: first every
/// tension hinge, then every compression hinge.
pub fn calculate(snapshot: &UltimateFibersSnapshot, sin: f64, cos: f64) -> Vec<CriticalStrainRange> {
    let tops = project(&snapshot.tension, sin, cos, |kept, new| kept <= new);
    let bots = project(&snapshot.pressure, sin, cos, |kept, new| kept >= new);

    tops.iter()
        .chain(bots.iter())
        .filter_map(|hinge| {
            let (l, h) = generate_for_hinge(&tops, &bots, hinge)?;
            Some(CriticalStrainRange {
                sin,
                cos,
                hinge_position: hinge.position,
                hinge_height: hinge.height,
                minimum_slope: l,
                maximum_slope: h,
            })
        })
        // an unbounded side means no point limits the rotation there
        .filter(|r| r.minimum_slope > f64::MIN && r.maximum_slope < f64::MAX)
        .filter(|r| r.width().abs() >= MIN_RANGE_WIDTH)
        .collect()
}

/// Ranges for every direction `teta = 0, Δ, 2Δ, … ≤ 180°`, one list per
/// direction.
pub fn calculate_for_section(
    section: &Section,
    delta_teta: f64,
) -> CalcResult<Vec<Vec<CriticalStrainRange>>> {
    if !delta_teta.is_finite() || delta_teta <= 0.0 {
        return Err(CalcError::invalid_input(
            "delta_teta",
            delta_teta.to_string(),
            "direction step must be positive",
        ));
    }
    let snapshot = section.ultimate_fibers()?;

    let steps = (180.0 / delta_teta + 1e-9).floor() as usize;
    let directions: Vec<Vec<CriticalStrainRange>> = (0..=steps)
        .map(|i| {
            let t = (i as f64 * delta_teta).to_radians();
            calculate(snapshot, t.sin(), t.cos())
        })
        .collect();

    tracing::debug!(
        directions = directions.len(),
        ranges = directions.iter().map(Vec::len).sum::<usize>(),
        "critical strain ranges calculated"
    );
    Ok(directions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::reinforced_column;
    use approx::assert_relative_eq;

    #[test]
    fn test_snapshot_counts() {
        let section = reinforced_column(0.4, 0.4);
        let snap = UltimateFibersSnapshot::create(&section).unwrap();
        // bars: steel tension limit; concrete background adds a compression limit
        assert_eq!(snap.tension.len(), 4);
        assert_eq!(snap.pressure.len(), 5 + 4);
        assert!(snap.tension.iter().all(|f| f.height == 0.01));
    }

    #[test]
    fn test_snapshot_requires_both_sides() {
        use crate::elements::SurfaceElement;
        use crate::geometry::rectangle;
        let mut section = Section::new();
        section.add_surface(
            SurfaceElement::new(rectangle(Point::new(0.0, 0.0), 1.0, 1.0))
                .with_foreground(Box::new(crate::test_support::concrete())),
        );
        let err = UltimateFibersSnapshot::create(&section).unwrap_err();
        assert_eq!(err.error_code(), "UNSATISFIABLE_SNAPSHOT");
    }

    #[test]
    fn test_ranges_keep_every_point_admissible() {
        let section = reinforced_column(0.4, 0.6);
        let directions = calculate_for_section(&section, 15.0).unwrap();
        assert_eq!(directions.len(), 13);
        for ranges in &directions {
            assert!(!ranges.is_empty());
            for r in ranges {
                for &v in &[0.0, 0.25, 0.5, 1.0] {
                    let strain = r.strain_profile(v).unwrap();
                    assert_relative_eq!(strain.strain_at(r.hinge_position), r.hinge_height, epsilon = 1e-12);
                    assert!(section.validate_strain(&strain).is_none(), "{:?} at v={}", r, v);
                }
            }
        }
    }

    #[test]
    fn test_strain_profile_direction() {
        let r = CriticalStrainRange {
            sin: 0.6,
            cos: 0.8,
            hinge_position: Point::new(0.1, 0.2),
            hinge_height: -0.0035,
            minimum_slope: -0.01,
            maximum_slope: 0.03,
        };
        let s = r.strain_profile(0.5).unwrap();
        assert_relative_eq!(s.ky, -0.6 * 0.01, epsilon = 1e-15);
        assert_relative_eq!(s.kz, 0.8 * 0.01, epsilon = 1e-15);
        assert!(r.strain_profile(1.5).is_err());
        assert!(r.strain_profile(-0.1).is_err());

        let empty = CriticalStrainRange {
            maximum_slope: -0.01,
            ..r
        };
        assert!(empty.strain_profile(0.5).is_err());
    }

    #[test]
    fn test_merge_keeps_governing_height() {
        let fibers = [
            UltimateFiber {
                position: Point::new(0.0, 1.0),
                height: 0.02,
            },
            UltimateFiber {
                position: Point::new(5.0, 1.0),
                height: 0.01,
            },
        ];
        // direction teta = 0: λ = z, both share λ = 1
        let tops = project(&fibers, 0.0, 1.0, |kept, new| kept <= new);
        assert_eq!(tops.len(), 1);
        assert_eq!(tops[0].height, 0.01);
        assert_eq!(tops[0].position, Point::new(5.0, 1.0));
    }

    #[test]
    fn test_invalid_delta() {
        let section = reinforced_column(0.3, 0.3);
        assert!(calculate_for_section(&section, 0.0).is_err());
        assert!(calculate_for_section(&section, -1.0).is_err());
    }

    #[test]
    fn test_range_serialization() {
        let r = CriticalStrainRange {
            sin: 0.0,
            cos: 1.0,
            hinge_position: Point::new(0.0, 0.2),
            hinge_height: 0.01,
            minimum_slope: 0.0,
            maximum_slope: 0.05,
        };
        let json = serde_json::to_string(&r).unwrap();
        let back: CriticalStrainRange = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }
}
