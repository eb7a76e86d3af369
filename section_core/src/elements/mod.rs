//! # Section Elements
//!
//! The building blocks of a [`Section`](crate::section::Section):
//!
//! - [`FiberElement`]: point-like area (a reinforcing bar), strain sampled at
//!   its centre
//! - [`SurfaceElement`]: closed counter-clockwise polygon (a concrete block)
//! - [`PolylineElement`]: open chain with a thickness (a thin steel plate)
//!
//! Every element carries an optional foreground and background material. The
//! net response is foreground minus background, which models holes and
//! embedded materials: a bar inside concrete has steel as foreground and the
//! concrete it displaces as background.
//!
//! ## Algorithm Overview
//!
//! Surfaces and polylines are integrated exactly, edge by edge:
//!
//! 1. Rotate the section so the strain gradient points along +z'
//!    ([`BendingFrame`]). Strain then depends on z' only: `ε = e0 + r·z'`.
//! 2. Map every material wall strain to a height `z' = (wall - e0)/r`.
//! 3. Split each edge at those heights so each piece sees a single
//!    polynomial branch of the material law.
//! 4. Ask the material for the weighted integral over each piece.
//! 5. Rotate the resultants back to the section axes.

pub mod fiber;
pub mod polyline;
pub mod surface;

pub use fiber::FiberElement;
pub use polyline::PolylineElement;
pub use surface::SurfaceElement;

use std::fmt;

use crate::errors::{CalcError, CalcResult};
use crate::force::{Force, Stiffness};
use crate::geometry::Point;
use crate::materials::Material;
use crate::strain::StrainProfile;

/// Tolerance used when a point's strain sits exactly on a failure bound
pub const FAILURE_STRAIN_TOLERANCE: f64 = 1e-8;

// ============================================================================
// Element contract
// ============================================================================

/// Common behaviour of all section elements.
pub trait Element: fmt::Debug + Send + Sync {
    /// Short element kind used in diagnostics ("fiber", "surface", "polyline")
    fn kind(&self) -> &'static str;

    /// Net force resultant (foreground minus background)
    fn force(&self, strain: &StrainProfile) -> CalcResult<Force>;

    /// Net stiffness (foreground minus background)
    fn stiffness(&self, strain: &StrainProfile) -> CalcResult<Stiffness>;

    /// Net axial force. Elements override this when they have a cheaper path.
    fn axial_force(&self, strain: &StrainProfile) -> CalcResult<f64> {
        Ok(self.force(strain)?.nx)
    }

    /// Geometric and material consistency checks
    fn validate(&self) -> CalcResult<()>;

    /// Points whose strain governs failure: vertices, or the fiber centre
    fn control_points(&self) -> Vec<Point>;

    fn materials(&self) -> &ElementMaterials;

    fn materials_mut(&mut self) -> &mut ElementMaterials;

    /// Shift the element by `(dy, dz)`
    fn translate(&mut self, dy: f64, dz: f64);

    /// Number of control points whose strain lies outside the failure bounds
    fn count_strain_violations(&self, strain: &StrainProfile) -> usize {
        let (min, max) = self.materials().failure_bounds();
        self.control_points()
            .into_iter()
            .map(|p| strain.strain_at(p))
            .filter(|&e| {
                let on_bound = (e - max).abs() < FAILURE_STRAIN_TOLERANCE
                    || (e - min).abs() < FAILURE_STRAIN_TOLERANCE;
                !on_bound && (e > max || e < min)
            })
            .count()
    }
}

// ============================================================================
// Foreground / background materials
// ============================================================================

/// Foreground and background materials of one element.
///
/// Cloning deep-copies both materials.
#[derive(Debug, Clone, Default)]
pub struct ElementMaterials {
    pub foreground: Option<Box<dyn Material>>,
    pub background: Option<Box<dyn Material>>,
}

impl ElementMaterials {
    pub fn new(
        foreground: Option<Box<dyn Material>>,
        background: Option<Box<dyn Material>>,
    ) -> Self {
        ElementMaterials {
            foreground,
            background,
        }
    }

    /// Materials that contribute to the response, with their sign:
    /// `+1` for the foreground, `-1` for the background.
    pub fn contributions(&self) -> impl Iterator<Item = (f64, &dyn Material)> {
        let fg = self
            .foreground
            .as_deref()
            .filter(|m| !m.is_null())
            .map(|m| (1.0, m));
        let bg = self
            .background
            .as_deref()
            .filter(|m| !m.is_null())
            .map(|m| (-1.0, m));
        fg.into_iter().chain(bg)
    }

    /// Both materials, present ones only
    pub fn iter(&self) -> impl Iterator<Item = &dyn Material> {
        self.foreground
            .as_deref()
            .into_iter()
            .chain(self.background.as_deref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Material>> {
        self.foreground.iter_mut().chain(self.background.iter_mut())
    }

    /// Admissible strain interval `(min, max)`: the tightest negative and
    /// positive failure strains of both materials, unbounded when absent.
    pub fn failure_bounds(&self) -> (f64, f64) {
        let mut max = f64::MAX;
        let mut min = f64::MIN;
        for m in self.iter().filter(|m| !m.is_null()) {
            if let Some(p) = m.positive_failure_strain() {
                max = max.min(p);
            }
            if let Some(n) = m.negative_failure_strain() {
                min = min.max(n);
            }
        }
        (min, max)
    }

    /// Check that every contributing material supports the integration
    /// degrees the element will request.
    pub fn check_degrees(&self, element: &str, stress: u32, modulus: u32) -> CalcResult<()> {
        for (_, m) in self.contributions() {
            if m.stress_degree() < stress || m.modulus_degree() < modulus {
                return Err(CalcError::invalid_element(
                    element,
                    format!(
                        "material '{}' supports degrees {}/{}, element needs {}/{}",
                        m.label(),
                        m.stress_degree(),
                        m.modulus_degree(),
                        stress,
                        modulus
                    ),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Rotated bending frame
// ============================================================================

/// Frame in which the strain gradient points along +z'.
///
/// In this frame `ε(z') = e0 + r·z'` with `r = |(ky, kz)|`. Uniform strain
/// uses the identity rotation and `r = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BendingFrame {
    pub r: f64,
    pub cos: f64,
    pub sin: f64,
}

impl BendingFrame {
    pub fn new(strain: &StrainProfile) -> Self {
        if strain.is_uniform() {
            return BendingFrame {
                r: 0.0,
                cos: 1.0,
                sin: 0.0,
            };
        }
        let r = strain.curvature();
        BendingFrame {
            r,
            cos: strain.kz / r,
            sin: -strain.ky / r,
        }
    }

    pub fn rotate(&self, p: Point) -> Point {
        p.rotate(self.cos, self.sin)
    }

    pub fn rotate_all(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|&p| self.rotate(p)).collect()
    }

    /// Heights z' where the strain crosses each wall, bracketed by ±∞.
    pub fn wall_heights(&self, e0: f64, walls: &[f64]) -> Vec<f64> {
        let mut zs = Vec::with_capacity(walls.len() + 2);
        zs.push(f64::NEG_INFINITY);
        if self.r != 0.0 {
            zs.extend(walls.iter().map(|w| (w - e0) / self.r));
        }
        zs.push(f64::INFINITY);
        zs
    }

    /// Rotate a force computed in this frame back to section axes
    pub fn unrotate_force(&self, f: Force) -> Force {
        let (c, s) = (self.cos, self.sin);
        Force::new(f.nx, c * f.my + s * f.mz, -s * f.my + c * f.mz)
    }

    /// Rotate a stiffness computed in this frame back to section axes.
    ///
    /// Output rows transform like the moments, input columns like the
    /// curvatures (`ky' = c·ky + s·kz`, `kz' = -s·ky + c·kz`).
    pub fn unrotate_stiffness(&self, k: Stiffness) -> Stiffness {
        let (c, s) = (self.cos, self.sin);

        // rows: nx, my, mz in the rotated frame
        let rows = [
            [k.rnx_rky, k.rnx_rkz, k.rnx_re0],
            [k.rmy_rky, k.rmy_rkz, k.rmy_re0],
            [k.rmz_rky, k.rmz_rkz, k.rmz_re0],
        ];
        let out_map = [[1.0, 0.0, 0.0], [0.0, c, s], [0.0, -s, c]];
        let in_map = [[c, s, 0.0], [-s, c, 0.0], [0.0, 0.0, 1.0]];

        let mut g = [[0.0; 3]; 3];
        for (i, gi) in g.iter_mut().enumerate() {
            for (j, gij) in gi.iter_mut().enumerate() {
                let mut v = 0.0;
                for a in 0..3 {
                    for b in 0..3 {
                        v += out_map[i][a] * rows[a][b] * in_map[b][j];
                    }
                }
                *gij = v;
            }
        }

        Stiffness {
            rnx_rky: g[0][0],
            rnx_rkz: g[0][1],
            rnx_re0: g[0][2],
            rmy_rky: g[1][0],
            rmy_rkz: g[1][1],
            rmy_re0: g[1][2],
            rmz_rky: g[2][0],
            rmz_rkz: g[2][1],
            rmz_re0: g[2][2],
        }
    }
}

/// Split `[z_min, z_max]` at the wall heights `zs` (ascending, bracketed by
/// ±∞) into pieces that each lie inside a single region. Zero-length pieces
/// are dropped.
pub fn split_at_walls(z_min: f64, z_max: f64, zs: &[f64]) -> Vec<(f64, f64)> {
    let same_region = zs
        .windows(2)
        .find(|w| z_min >= w[0] && z_min < w[1])
        .map(|w| z_max >= w[0] && z_max <= w[1])
        .unwrap_or(false);

    if same_region || zs.len() < 2 {
        return vec![(z_min, z_max)];
    }

    let s = zs.iter().position(|&z| z >= z_min).unwrap_or(0);
    let e = zs.iter().rposition(|&z| z < z_max).unwrap_or(zs.len() - 1);

    let mut pieces = Vec::with_capacity(e.saturating_sub(s) + 2);
    pieces.push((z_min, zs[s]));
    for k in s..e {
        pieces.push((zs[k], zs[k + 1]));
    }
    pieces.push((zs[e], z_max));
    pieces.retain(|(a, b)| a != b);
    pieces
}
