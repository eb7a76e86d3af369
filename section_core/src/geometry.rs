//! # Geometric Primitives
//!
//! Points and vectors in the section's local y-z plane, plus the handful of
//! polygon and angle utilities the analysis needs.
//!
//! ## Conventions
//!
//! - `y` is the horizontal section axis, `z` the vertical one
//! - Polygons are closed point lists (first point repeated at the end)
//! - Positive signed area means counter-clockwise orientation
//! - Angles are radians, measured from +y toward +z

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::force::Force;

/// A location in section-local coordinates (m).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub const fn new(y: f64, z: f64) -> Self {
        Point { y, z }
    }

    /// Point shifted by `(dy, dz)`
    pub fn translate(&self, dy: f64, dz: f64) -> Point {
        Point::new(self.y + dy, self.z + dz)
    }

    /// Coordinates in a frame rotated so that `(cos, -sin)` maps onto +z.
    ///
    /// Used by the polygon and polyline integrators to turn biaxial bending
    /// into bending about a single axis.
    pub fn rotate(&self, cos: f64, sin: f64) -> Point {
        Point::new(cos * self.y + sin * self.z, -sin * self.y + cos * self.z)
    }

    pub fn is_finite(&self) -> bool {
        self.y.is_finite() && self.z.is_finite()
    }
}

/// A vector in the y-z plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VectorYZ {
    pub y: f64,
    pub z: f64,
}

impl VectorYZ {
    pub const fn new(y: f64, z: f64) -> Self {
        VectorYZ { y, z }
    }

    /// Vector of length `l` pointing at angle `teta` (radians)
    pub fn from_direction(teta: f64, l: f64) -> Self {
        VectorYZ::new(l * teta.cos(), l * teta.sin())
    }

    pub fn length(&self) -> f64 {
        (self.y * self.y + self.z * self.z).sqrt()
    }
}

// ============================================================================
// Scalar helpers
// ============================================================================

/// Tolerant float comparison. A zero tolerance means exact equality.
pub fn approx_eq(v1: f64, v2: f64, tol: f64) -> bool {
    if tol == 0.0 {
        return v1 == v2;
    }
    (v1 - v2).abs() < tol
}

/// Wrap an angle difference into (-π, π]
pub fn wrap_angle(a: f64) -> f64 {
    let mut w = a % (2.0 * PI);
    if w > PI {
        w -= 2.0 * PI;
    } else if w <= -PI {
        w += 2.0 * PI;
    }
    w
}

// ============================================================================
// Moment direction utilities
// ============================================================================

/// Angle between the moment vector `(my, mz)` and the +y axis
pub fn moment_angle(force: &Force) -> f64 {
    force.mz.atan2(force.my)
}

/// Unit vector along the moment `(my, mz)`, or `None` for a zero moment
pub fn moment_unit_vector(force: &Force) -> Option<VectorYZ> {
    let l = (force.my * force.my + force.mz * force.mz).sqrt();
    if l == 0.0 || !l.is_finite() {
        return None;
    }
    Some(VectorYZ::new(force.my / l, force.mz / l))
}

/// Whether `v3` lies inside the smaller angle spanned by `v1` and `v2`.
///
/// Both vectors are rotated into a frame aligned with `v3`; `v3` is between
/// them when they straddle that axis on its positive side.
pub fn is_between(v1: VectorYZ, v2: VectorYZ, v3: VectorYZ) -> bool {
    let l3 = v3.length();
    if l3 == 0.0 {
        return false;
    }
    let sin = v3.z / l3;
    let cos = v3.y / l3;

    let v1p = VectorYZ::new(cos * v1.y + sin * v1.z, -sin * v1.y + cos * v1.z);
    let v2p = VectorYZ::new(cos * v2.y + sin * v2.z, -sin * v2.y + cos * v2.z);

    v1p.z * v2p.z < 0.0 && v1p.y > 0.0 && v2p.y > 0.0
}

// ============================================================================
// Polygon utilities
// ============================================================================

/// Signed area of a closed point list (shoelace). Positive when counter-clockwise.
pub fn signed_area(points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| w[0].y * w[1].z - w[0].z * w[1].y)
        .sum::<f64>()
        / 2.0
}

pub fn is_clockwise(points: &[Point]) -> bool {
    signed_area(points) < 0.0
}

/// Length of the open chain through `points`
pub fn perimeter(points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| {
            let dy = w[1].y - w[0].y;
            let dz = w[1].z - w[0].z;
            (dy * dy + dz * dz).sqrt()
        })
        .sum()
}

/// Closed, counter-clockwise rectangle of width `w` (along y) and height `h`
/// (along z) centred on `center`.
pub fn rectangle(center: Point, w: f64, h: f64) -> Vec<Point> {
    let (cy, cz) = (center.y, center.z);
    vec![
        Point::new(cy - w / 2.0, cz - h / 2.0),
        Point::new(cy + w / 2.0, cz - h / 2.0),
        Point::new(cy + w / 2.0, cz + h / 2.0),
        Point::new(cy - w / 2.0, cz + h / 2.0),
        Point::new(cy - w / 2.0, cz - h / 2.0),
    ]
}
