//! # Failure Surface
//!
//! Result model of the curve finders: failure points grouped into rings of
//! (nearly) constant axial force, ordered by ascending targeted force.
//!
//! Each surface carries metadata (random id, UTC creation time, the finder
//! that produced it), solver statistics, and the anomalies met while
//! building it. An anomaly never aborts construction; it documents a ring
//! that stayed empty or a direction that could not be resolved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CalcResult;
use crate::force::Force;
use crate::geometry::{moment_angle, wrap_angle, Point};
use crate::section::Section;
use crate::strain::StrainProfile;

// ============================================================================
// Points and rings
// ============================================================================

/// A strain profile at failure together with the force it produces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FailurePoint {
    pub force: Force,
    pub strain: StrainProfile,
    pub hinge_position: Point,
    pub hinge_height: f64,
}

impl FailurePoint {
    /// Failure point at `strain`, with the force evaluated on `section`
    pub fn evaluate(
        section: &Section,
        strain: StrainProfile,
        hinge_position: Point,
        hinge_height: f64,
    ) -> CalcResult<Self> {
        Ok(FailurePoint {
            force: section.forces(&strain)?,
            strain,
            hinge_position,
            hinge_height,
        })
    }

    /// Points rotating about the same hinge lie on one strain family and
    /// can be interpolated linearly.
    pub fn can_interpolate(&self, other: &FailurePoint) -> bool {
        self.hinge_position == other.hinge_position && self.hinge_height == other.hinge_height
    }

    /// Direction of the moment vector `(my, mz)`
    pub fn moment_angle(&self) -> f64 {
        moment_angle(&self.force)
    }
}

/// Failure points sharing one targeted axial force.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRing {
    pub targeted_axial_force: f64,
    pub points: Vec<FailurePoint>,
}

impl FailureRing {
    pub fn new(targeted_axial_force: f64) -> Self {
        FailureRing {
            targeted_axial_force,
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Mean force of the ring's points, zero for an empty ring
    pub fn mean_force(&self) -> Force {
        if self.points.is_empty() {
            return Force::zero();
        }
        let sum: Force = self.points.iter().map(|p| p.force).sum();
        sum.scale(1.0 / self.points.len() as f64)
    }
}

// ============================================================================
// Surface
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMetadata {
    pub id: Uuid,
    pub created: DateTime<Utc>,
    /// Name of the finder that built the surface
    pub generator: String,
}

impl SurfaceMetadata {
    pub fn new(generator: impl Into<String>) -> Self {
        SurfaceMetadata {
            id: Uuid::new_v4(),
            created: Utc::now(),
            generator: generator.into(),
        }
    }
}

/// Non-fatal irregularities met while building a surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum SurfaceAnomaly {
    /// No range reached the targeted axial force
    EmptyRing { targeted_axial_force: f64 },
    /// No failure point could be found for a moment direction
    DroppedAngle { ring: usize, alpha: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SolverStatistics {
    pub successful_solutions: usize,
    pub failed_solutions: usize,
    /// Axial force evaluations spent on the surface
    pub evaluations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureSurface {
    pub metadata: SurfaceMetadata,
    /// Rings ordered by ascending targeted axial force
    pub rings: Vec<FailureRing>,
    pub anomalies: Vec<SurfaceAnomaly>,
    pub statistics: SolverStatistics,
}

impl FailureSurface {
    pub fn new(generator: impl Into<String>) -> Self {
        FailureSurface {
            metadata: SurfaceMetadata::new(generator),
            rings: Vec::new(),
            anomalies: Vec::new(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    pub fn point_count(&self) -> usize {
        self.rings.iter().map(FailureRing::len).sum()
    }

    pub fn points(&self) -> impl Iterator<Item = &FailurePoint> {
        self.rings.iter().flat_map(|r| r.points.iter())
    }

    /// Ratio of the surface's moment capacity to the moment of `force`.
    ///
    /// Picks the ring whose mean axial force is closest to `force.nx`, then
    /// the point whose moment direction is closest to the force's. Returns
    /// 0 for a surface without points and infinity for a force without
    /// moment.
    pub fn safety_factor(&self, force: &Force) -> f64 {
        let ring = self
            .rings
            .iter()
            .filter(|r| !r.is_empty())
            .min_by(|a, b| {
                let da = (a.mean_force().nx - force.nx).abs();
                let db = (b.mean_force().nx - force.nx).abs();
                da.total_cmp(&db)
            });
        let Some(ring) = ring else {
            return 0.0;
        };

        if force.moment() == 0.0 {
            return f64::INFINITY;
        }
        let alpha = moment_angle(force);
        let nearest = ring.points.iter().min_by(|a, b| {
            let da = wrap_angle(a.moment_angle() - alpha).abs();
            let db = wrap_angle(b.moment_angle() - alpha).abs();
            da.total_cmp(&db)
        });

        match nearest {
            Some(p) => p.force.moment() / force.moment(),
            None => 0.0,
        }
    }

    pub fn to_json(&self) -> CalcResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> CalcResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
