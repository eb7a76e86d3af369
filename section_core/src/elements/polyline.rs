//! # Polyline Element
//!
//! Open chain of straight segments with a constant thickness, for thin-walled
//! parts such as steel plates and profiles. Each segment is integrated along
//! its length: a slice between heights `z0` and `z1` contributes
//! `t·l/|dz| · ∫ y(z)^r z^s σ(ε(z)) dz`.
//!
//! A segment lying exactly along the neutral axis sees a constant strain
//! and is treated as a uniformly stressed strip. When it is only nearly
//! parallel (`|dz| < 1e-8·|dy|`) the line coefficients blow up, so the
//! `mz` term of each slice assumes the stress at the slice's lower end along
//! its whole length; `nx` and `my` stay integrated.

use super::{split_at_walls, BendingFrame, Element, ElementMaterials};
use crate::errors::{CalcError, CalcResult};
use crate::force::{Force, Stiffness};
use crate::geometry::{perimeter, Point};
use crate::materials::Material;
use crate::strain::StrainProfile;

/// Below this `|dz| / |dy|` the `mz` integral is replaced by a constant-stress slice
const PARALLEL_TOLERANCE: f64 = 1e-8;

/// Straight segment in the rotated frame
#[derive(Debug, Clone, Copy)]
struct Segment {
    p1: Point,
    p2: Point,
}

impl Segment {
    fn dy(&self) -> f64 {
        self.p2.y - self.p1.y
    }

    fn dz(&self) -> f64 {
        self.p2.z - self.p1.z
    }

    fn length(&self) -> f64 {
        self.dy().hypot(self.dz())
    }

    fn is_level(&self) -> bool {
        self.dz() == 0.0
    }

    fn is_near_parallel(&self) -> bool {
        self.dz().abs() < PARALLEL_TOLERANCE * self.dy().abs()
    }

    /// `y` at height `z`, interpolated along the segment
    fn y_at(&self, z: f64) -> f64 {
        let (lo, hi) = if self.p1.z < self.p2.z {
            (self.p1, self.p2)
        } else {
            (self.p2, self.p1)
        };
        lo.y + (z - lo.z) / (hi.z - lo.z) * (hi.y - lo.y)
    }

    /// Line `y = α·z + β` through the segment, with its z extent ascending
    fn line(&self) -> (f64, f64, f64, f64) {
        let alpha = self.dy() / self.dz();
        let beta = self.p1.y - alpha * self.p1.z;
        let (lo, hi) = if self.p1.z < self.p2.z {
            (self.p1.z, self.p2.z)
        } else {
            (self.p2.z, self.p1.z)
        };
        (alpha, beta, lo, hi)
    }
}

#[derive(Debug, Clone)]
pub struct PolylineElement {
    points: Vec<Point>,
    /// Wall thickness (m)
    thickness: f64,
    pub materials: ElementMaterials,
}

impl PolylineElement {
    pub fn new(points: Vec<Point>, thickness: f64) -> Self {
        PolylineElement {
            points,
            thickness,
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

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Cross-sectional area `t·L`
    pub fn area(&self) -> f64 {
        self.thickness * perimeter(&self.points)
    }

    fn segments(&self, frame: &BendingFrame) -> Vec<Segment> {
        frame
            .rotate_all(&self.points)
            .windows(2)
            .map(|w| Segment { p1: w[0], p2: w[1] })
            .filter(|s| s.length() > 0.0)
            .collect()
    }

    fn check_shape(&self) -> CalcResult<()> {
        if self.points.len() < 2 {
            return Err(CalcError::invalid_element(
                "polyline",
                "at least 2 points are required",
            ));
        }
        if !self.thickness.is_finite() || self.thickness <= 0.0 {
            return Err(CalcError::invalid_element(
                "polyline",
                format!("thickness must be positive, got {}", self.thickness),
            ));
        }
        Ok(())
    }

    fn material_force(
        &self,
        frame: &BendingFrame,
        segments: &[Segment],
        e0: f64,
        m: &dyn Material,
    ) -> CalcResult<Force> {
        let t = self.thickness;
        let zs = frame.wall_heights(e0, &m.walls());
        let mut total = Force::zero();

        for seg in segments {
            let l = seg.length();
            if seg.is_level() {
                let cy = seg.p1.y + seg.dy() / 2.0;
                let cz = seg.p1.z;
                let n = t * l * m.stress(frame.r * cz + e0);
                total += Force::new(n, n * cz, n * cy);
                continue;
            }

            let (alpha, beta, lo, hi) = seg.line();
            let sc = t * l / seg.dz().abs();
            let near_parallel = seg.is_near_parallel();
            for (z0, z1) in split_at_walls(lo, hi, &zs) {
                total.nx += sc * m.integrate_stress(z0, z1, alpha, beta, frame.r, e0, 0, 0)?;
                total.my += sc * m.integrate_stress(z0, z1, alpha, beta, frame.r, e0, 0, 1)?;
                if near_parallel {
                    // t·(slice length) = sc·(z1 - z0)
                    let (y0, y1) = (seg.y_at(z0), seg.y_at(z1));
                    let n = sc * (z1 - z0) * m.stress(frame.r * z0 + e0);
                    total.mz += (y0 + (y1 - y0) / 2.0) * n;
                } else {
                    total.mz += sc * m.integrate_stress(z0, z1, alpha, beta, frame.r, e0, 1, 0)?;
                }
            }
        }
        Ok(total)
    }

    fn material_stiffness(
        &self,
        frame: &BendingFrame,
        segments: &[Segment],
        e0: f64,
        m: &dyn Material,
    ) -> CalcResult<Stiffness> {
        let t = self.thickness;
        let zs = frame.wall_heights(e0, &m.walls());
        let mut total = Stiffness::zero();

        for seg in segments {
            let l = seg.length();
            let (e, ey, ez, eyz, ey2, ez2);
            if seg.is_level() {
                let cy = seg.p1.y + seg.dy() / 2.0;
                let cz = seg.p1.z;
                let ea = t * l * m.tangent_modulus(frame.r * cz + e0);
                e = ea;
                ey = ea * cy;
                ez = ea * cz;
                eyz = ea * cy * cz;
                ey2 = ea * (cy * cy + l * l / 12.0);
                ez2 = ea * cz * cz;
            } else {
                let (alpha, beta, lo, hi) = seg.line();
                let sc = t * l / seg.dz().abs();
                let near_parallel = seg.is_near_parallel();
                let mut acc = [0.0; 6];
                for (z0, z1) in split_at_walls(lo, hi, &zs) {
                    let int = |r, s| m.integrate_tangent_modulus(z0, z1, alpha, beta, frame.r, e0, r, s);
                    acc[0] += int(0, 0)?;
                    acc[2] += int(0, 1)?;
                    acc[5] += int(0, 2)?;
                    if near_parallel {
                        // y-weighted terms follow the constant-stress mz slice
                        let (y0, y1) = (seg.y_at(z0), seg.y_at(z1));
                        let cy = y0 + (y1 - y0) / 2.0;
                        let ea = (z1 - z0) * m.tangent_modulus(frame.r * z0 + e0);
                        acc[1] += ea * cy;
                        acc[3] += ea * cy * z0;
                        acc[4] += ea * (cy * cy + (y1 - y0) * (y1 - y0) / 12.0);
                    } else {
                        acc[1] += int(1, 0)?;
                        acc[3] += int(1, 1)?;
                        acc[4] += int(2, 0)?;
                    }
                }
                e = sc * acc[0];
                ey = sc * acc[1];
                ez = sc * acc[2];
                eyz = sc * acc[3];
                ey2 = sc * acc[4];
                ez2 = sc * acc[5];
            }

            total += Stiffness {
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
        }
        Ok(total)
    }
}

impl Element for PolylineElement {
    fn kind(&self) -> &'static str {
        "polyline"
    }

    fn force(&self, strain: &StrainProfile) -> CalcResult<Force> {
        self.check_shape()?;
        let frame = BendingFrame::new(strain);
        let segments = self.segments(&frame);

        let mut total = Force::zero();
        for (sign, m) in self.materials.contributions() {
            total += self.material_force(&frame, &segments, strain.e0, m)?.scale(sign);
        }
        Ok(frame.unrotate_force(total))
    }

    fn stiffness(&self, strain: &StrainProfile) -> CalcResult<Stiffness> {
        self.check_shape()?;
        let frame = BendingFrame::new(strain);
        let segments = self.segments(&frame);

        let mut total = Stiffness::zero();
        for (sign, m) in self.materials.contributions() {
            total += self.material_stiffness(&frame, &segments, strain.e0, m)?.scale(sign);
        }
        Ok(frame.unrotate_stiffness(total))
    }

    fn validate(&self) -> CalcResult<()> {
        self.check_shape()?;
        if self.points.iter().any(|p| !p.is_finite()) {
            return Err(CalcError::invalid_element("polyline", "points must be finite"));
        }
        self.materials.check_degrees("polyline", 1, 2)
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
