//! # Force and Stiffness Aggregates
//!
//! [`Force`] holds the section resultants, [`Stiffness`] their partial
//! derivatives with respect to the strain profile parameters. Both are plain
//! values that add across elements; the background material of an element is
//! subtracted from its foreground.
//!
//! ## Sign Conventions
//!
//! - `nx = ∫σ dA` (tension positive)
//! - `my = ∫σ·z dA`
//! - `mz = ∫σ·y dA`

use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Section force resultants (N, N·m).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Force {
    pub nx: f64,
    pub my: f64,
    pub mz: f64,
}

impl Force {
    pub const fn new(nx: f64, my: f64, mz: f64) -> Self {
        Force { nx, my, mz }
    }

    pub const fn zero() -> Self {
        Force::new(0.0, 0.0, 0.0)
    }

    /// Magnitude of the resultant moment
    pub fn moment(&self) -> f64 {
        (self.my * self.my + self.mz * self.mz).sqrt()
    }

    pub fn scale(&self, f: f64) -> Force {
        Force::new(self.nx * f, self.my * f, self.mz * f)
    }
}

impl Add for Force {
    type Output = Force;

    fn add(self, rhs: Force) -> Force {
        Force::new(self.nx + rhs.nx, self.my + rhs.my, self.mz + rhs.mz)
    }
}

impl Sub for Force {
    type Output = Force;

    fn sub(self, rhs: Force) -> Force {
        Force::new(self.nx - rhs.nx, self.my - rhs.my, self.mz - rhs.mz)
    }
}

impl Neg for Force {
    type Output = Force;

    fn neg(self) -> Force {
        Force::new(-self.nx, -self.my, -self.mz)
    }
}

impl AddAssign for Force {
    fn add_assign(&mut self, rhs: Force) {
        *self = *self + rhs;
    }
}

impl SubAssign for Force {
    fn sub_assign(&mut self, rhs: Force) {
        *self = *self - rhs;
    }
}

impl Sum for Force {
    fn sum<I: Iterator<Item = Force>>(iter: I) -> Force {
        iter.fold(Force::zero(), Add::add)
    }
}

/// Partial derivatives of the resultants with respect to `ky`, `kz` and `e0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Stiffness {
    pub rnx_rky: f64,
    pub rnx_rkz: f64,
    pub rnx_re0: f64,

    pub rmy_rky: f64,
    pub rmy_rkz: f64,
    pub rmy_re0: f64,

    pub rmz_rky: f64,
    pub rmz_rkz: f64,
    pub rmz_re0: f64,
}

impl Stiffness {
    pub fn zero() -> Self {
        Stiffness::default()
    }

    fn to_array(self) -> [f64; 9] {
        [
            self.rnx_rky,
            self.rnx_rkz,
            self.rnx_re0,
            self.rmy_rky,
            self.rmy_rkz,
            self.rmy_re0,
            self.rmz_rky,
            self.rmz_rkz,
            self.rmz_re0,
        ]
    }

    fn from_array(a: [f64; 9]) -> Self {
        Stiffness {
            rnx_rky: a[0],
            rnx_rkz: a[1],
            rnx_re0: a[2],
            rmy_rky: a[3],
            rmy_rkz: a[4],
            rmy_re0: a[5],
            rmz_rky: a[6],
            rmz_rkz: a[7],
            rmz_re0: a[8],
        }
    }

    fn zip_with(self, rhs: Stiffness, f: impl Fn(f64, f64) -> f64) -> Stiffness {
        let a = self.to_array();
        let b = rhs.to_array();
        let mut out = [0.0; 9];
        for i in 0..9 {
            out[i] = f(a[i], b[i]);
        }
        Stiffness::from_array(out)
    }

    /// Component-wise division, useful for comparing two stiffness states
    pub fn dot_divide(&self, rhs: &Stiffness) -> Stiffness {
        self.zip_with(*rhs, |a, b| a / b)
    }

    pub fn scale(&self, f: f64) -> Stiffness {
        self.zip_with(Stiffness::zero(), |a, _| a * f)
    }

    /// Largest absolute component
    pub fn max_abs(&self) -> f64 {
        self.to_array().iter().fold(0.0_f64, |m, v| m.max(v.abs()))
    }
}

impl Add for Stiffness {
    type Output = Stiffness;

    fn add(self, rhs: Stiffness) -> Stiffness {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Sub for Stiffness {
    type Output = Stiffness;

    fn sub(self, rhs: Stiffness) -> Stiffness {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl AddAssign for Stiffness {
    fn add_assign(&mut self, rhs: Stiffness) {
        *self = *self + rhs;
    }
}

impl SubAssign for Stiffness {
    fn sub_assign(&mut self, rhs: Stiffness) {
        *self = *self - rhs;
    }
}

impl Sum for Stiffness {
    fn sum<I: Iterator<Item = Stiffness>>(iter: I) -> Stiffness {
        iter.fold(Stiffness::zero(), Add::add)
    }
}
