//! # Surface Element
//!
//! Closed counter-clockwise polygon integrated exactly by Green's theorem.
//! Each edge turns an area integral `∫∫ f(z')·y'^n dA` into the line integral
//! `∮ y'^(n+1)/(n+1) · f(z') dz'`, which the material evaluates piece by piece
//! between its walls.

use super::{split_at_walls, BendingFrame, Element, ElementMaterials};
use crate::errors::{CalcError, CalcResult};
use crate::force::{Force, Stiffness};
use crate::geometry::{is_clockwise, signed_area, Point};
use crate::materials::Material;
use crate::strain::StrainProfile;

/// Polygon edge oriented by ascending z, with its line `y = α·z + β`
#[derive(Debug, Clone, Copy)]
struct OrientedEdge {
    z_lo: f64,
    z_hi: f64,
    alpha: f64,
    beta: f64,
    /// -1 when the edge runs downward in the polygon
    sign: f64,
}

fn oriented_edges(points: &[Point]) -> Vec<OrientedEdge> {
    points
        .windows(2)
        .filter_map(|w| {
            let (p1, p2, sign) = if w[0].z > w[1].z {
                (w[1], w[0], -1.0)
            } else {
                (w[0], w[1], 1.0)
            };
            if p1.z == p2.z {
                return None;
            }
            let dz = p1.z - p2.z;
            Some(OrientedEdge {
                z_lo: p1.z,
                z_hi: p2.z,
                alpha: (p1.y - p2.y) / dz,
                beta: (p2.y * p1.z - p1.y * p2.z) / dz,
                sign,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct SurfaceElement {
    points: Vec<Point>,
    pub materials: ElementMaterials,
}

impl SurfaceElement {
    /// Polygon from a closed, counter-clockwise point list
    pub fn new(points: Vec<Point>) -> Self {
        SurfaceElement {
            points,
            materials: ElementMaterials::default(),
        }
    }

    pub fn with_foreground(mut self, material: Box<dyn Material>) -> Self {
        self.materials.foreground = Some(material);
        self
    }

    pub fn with_background(mut self, material: Box<dyn Material>) -> Self {
        self.materials.background = Some(material);
        self
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.points)
    }

    fn check_closed(&self) -> CalcResult<()> {
        if self.points.len() < 3 {
            return Err(CalcError::invalid_element(
                "surface",
                "at least 3 points are required",
            ));
        }
        if self.points.first() != self.points.last() {
            return Err(CalcError::invalid_element(
                "surface",
                "first and last points must be the same",
            ));
        }
        Ok(())
    }

    /// Force of one material in the rotated frame
    fn material_force(
        frame: &BendingFrame,
        edges: &[OrientedEdge],
        e0: f64,
        m: &dyn Material,
    ) -> CalcResult<Force> {
        let zs = frame.wall_heights(e0, &m.walls());
        let mut total = Force::zero();
        for edge in edges {
            let (a, b, r) = (edge.alpha, edge.beta, frame.r);
            let mut f = Force::zero();
            for (z0, z1) in split_at_walls(edge.z_lo, edge.z_hi, &zs) {
                f.nx += m.integrate_stress(z0, z1, a, b, r, e0, 1, 0)?;
                f.my += m.integrate_stress(z0, z1, a, b, r, e0, 1, 1)?;
                f.mz += 0.5 * m.integrate_stress(z0, z1, a, b, r, e0, 2, 0)?;
            }
            total += f.scale(edge.sign);
        }
        Ok(total)
    }

    fn material_stiffness(
        frame: &BendingFrame,
        edges: &[OrientedEdge],
        e0: f64,
        m: &dyn Material,
    ) -> CalcResult<Stiffness> {
        let zs = frame.wall_heights(e0, &m.walls());
        let mut total = Stiffness::zero();
        for edge in edges {
            let (a, b, r) = (edge.alpha, edge.beta, frame.r);
            let (mut e, mut ey, mut ez, mut eyz, mut ey2, mut ez2) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
            for (z0, z1) in split_at_walls(edge.z_lo, edge.z_hi, &zs) {
                e += m.integrate_tangent_modulus(z0, z1, a, b, r, e0, 1, 0)?;
                ey += 0.5 * m.integrate_tangent_modulus(z0, z1, a, b, r, e0, 2, 0)?;
                ez += m.integrate_tangent_modulus(z0, z1, a, b, r, e0, 1, 1)?;
                eyz += 0.5 * m.integrate_tangent_modulus(z0, z1, a, b, r, e0, 2, 1)?;
                ey2 += m.integrate_tangent_modulus(z0, z1, a, b, r, e0, 3, 0)? / 3.0;
                ez2 += m.integrate_tangent_modulus(z0, z1, a, b, r, e0, 1, 2)?;
            }
            let k = Stiffness {
                rnx_re0: e,
                rnx_rky: ey,
                rnx_rkz: ez,
                rmy_re0: ez,
                rmy_rky: eyz,
                rmy_rkz: ez2,
                rmz_re0: ey,
                rmz_rky: ey2,
                rmz_rkz: eyz,
            };
            total += k.scale(edge.sign);
        }
        Ok(total)
    }
}

impl Element for SurfaceElement {
    fn kind(&self) -> &'static str {
        "surface"
    }

    fn force(&self, strain: &StrainProfile) -> CalcResult<Force> {
        self.check_closed()?;
        let frame = BendingFrame::new(strain);
        let edges = oriented_edges(&frame.rotate_all(&self.points));

        let mut total = Force::zero();
        for (sign, m) in self.materials.contributions() {
            total += Self::material_force(&frame, &edges, strain.e0, m)?.scale(sign);
        }
        Ok(frame.unrotate_force(total))
    }

    fn stiffness(&self, strain: &StrainProfile) -> CalcResult<Stiffness> {
        self.check_closed()?;
        let frame = BendingFrame::new(strain);
        let edges = oriented_edges(&frame.rotate_all(&self.points));

        let mut total = Stiffness::zero();
        for (sign, m) in self.materials.contributions() {
            total += Self::material_stiffness(&frame, &edges, strain.e0, m)?.scale(sign);
        }
        Ok(frame.unrotate_stiffness(total))
    }

    fn validate(&self) -> CalcResult<()> {
        self.check_closed()?;
        if self.points.iter().any(|p| !p.is_finite()) {
            return Err(CalcError::invalid_element("surface", "points must be finite"));
        }
        if is_clockwise(&self.points) {
            return Err(CalcError::invalid_element(
                "surface",
                "points must be in counter clockwise order",
            ));
        }
        self.materials.check_degrees("surface", 2, 3)
    }

    fn control_points(&self) -> Vec<Point> {
        self.points.clone()
    }

    fn materials(&self) -> &ElementMaterials {
        &self.materials
    }

    fn materials_mut(&mut self) -> &mut ElementMaterials {
        &mut self.materials
    }

    fn translate(&mut self, dy: f64, dz: f64) {
        for p in &mut self.points {
            *p = p.translate(dy, dz);
        }
    }
}
