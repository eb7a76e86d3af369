//! # Strain Profile
//!
//! Plane sections remain plane: the strain over the section is the linear
//! field
//!
//! ```text
//! ε(y, z) = e0 + kz·z + ky·y
//! ```
//!
//! ## Example
//!
//! ```rust
//! use section_core::geometry::Point;
//! use section_core::strain::StrainProfile;
//!
//! let s = StrainProfile::new(0.0, 0.01, -0.001);
//! assert!((s.strain_at(Point::new(0.0, 0.1)) - 0.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Linear strain field over the section.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StrainProfile {
    /// Curvature about z, strain gradient along y (1/m)
    pub ky: f64,
    /// Curvature about y, strain gradient along z (1/m)
    pub kz: f64,
    /// Strain at the section origin
    pub e0: f64,
}

impl StrainProfile {
    pub const fn new(ky: f64, kz: f64, e0: f64) -> Self {
        StrainProfile { ky, kz, e0 }
    }

    /// Uniform strain `e0` with no curvature
    pub const fn uniform(e0: f64) -> Self {
        StrainProfile { ky: 0.0, kz: 0.0, e0 }
    }

    pub fn strain_at(&self, p: Point) -> f64 {
        self.e0 + self.kz * p.z + self.ky * p.y
    }

    /// True when both curvatures are exactly zero
    pub fn is_uniform(&self) -> bool {
        self.ky == 0.0 && self.kz == 0.0
    }

    /// Magnitude of the curvature vector
    pub fn curvature(&self) -> f64 {
        (self.kz * self.kz + self.ky * self.ky).sqrt()
    }

    /// Profile with the same curvature that passes through `height` at `hinge`
    pub fn through_hinge(ky: f64, kz: f64, hinge: Point, height: f64) -> Self {
        StrainProfile::new(ky, kz, height - kz * hinge.z - ky * hinge.y)
    }
}
