//! Shared section fixtures for unit tests.

use crate::elements::{FiberElement, SurfaceElement};
use crate::geometry::{rectangle, Point};
use crate::materials::{Material, ParabolicLinearConcrete, PerfectElasticPlastic};
use crate::section::Section;

pub const COVER: f64 = 0.04;
pub const BAR_DIAMETER: f64 = 0.02;

pub fn concrete() -> ParabolicLinearConcrete {
    let mut c = ParabolicLinearConcrete::create_ec2(20.0, false).unwrap();
    c.limits_mut().negative_failure_strain = Some(-0.0035);
    c
}

pub fn rebar() -> PerfectElasticPlastic {
    let mut s = PerfectElasticPlastic::create(350.0).unwrap();
    s.limits_mut().positive_failure_strain = Some(0.01);
    s
}

/// `w × h` concrete column centred on the origin with one bar in each
/// corner; the bars displace concrete through their background material.
pub fn reinforced_column(w: f64, h: f64) -> Section {
    let mut section = Section::new();
    section.add_surface(
        SurfaceElement::new(rectangle(Point::new(0.0, 0.0), w, h)).with_foreground(Box::new(concrete())),
    );

    let d = COVER + BAR_DIAMETER / 2.0;
    let (y, z) = (w / 2.0 - d, h / 2.0 - d);
    for (sy, sz) in [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)] {
        section.add_fiber(
            FiberElement::bar(Point::new(sy * y, sz * z), BAR_DIAMETER)
                .with_foreground(Box::new(rebar()))
                .with_background(Box::new(concrete())),
        );
    }
    section
}
