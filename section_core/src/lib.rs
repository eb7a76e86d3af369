//! # section_core - Composite Cross-Section Failure Surfaces
//!
//! `section_core` computes the ultimate resistance of arbitrary composite
//! cross-sections under combined axial force and biaxial bending. A section
//! is assembled from surface, polyline and fiber elements, each carrying a
//! foreground material and optionally a background material it displaces.
//! Under the plane-sections hypothesis a [`StrainProfile`] yields the
//! resultant [`Force`] and its [`Stiffness`]; the curve finders search the
//! strain profiles at which some point reaches its failure strain and
//! collect them into a [`FailureSurface`].
//!
//! ## Design Philosophy
//!
//! - **Exact integration**: element forces come from closed-form or
//!   Gauss-Legendre integrals between material walls, never from meshing
//! - **JSON-First**: results, settings and errors implement Serialize/Deserialize
//! - **Rich Errors**: structured [`CalcError`] values, not strings
//! - **Data-parallel**: the finders spread independent solvers over rayon
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use section_core::curves::NTetaCurveFinder;
//! use section_core::elements::{FiberElement, SurfaceElement};
//! use section_core::geometry::{rectangle, Point};
//! use section_core::materials::{Material, ParabolicLinearConcrete, PerfectElasticPlastic};
//! use section_core::section::Section;
//!
//! let mut concrete = ParabolicLinearConcrete::create_ec2(30.0, false).unwrap();
//! concrete.limits_mut().negative_failure_strain = Some(-0.0035);
//! let mut steel = PerfectElasticPlastic::create(400.0).unwrap();
//! steel.limits_mut().positive_failure_strain = Some(0.01);
//!
//! let mut section = Section::new();
//! section.add_surface(
//!     SurfaceElement::new(rectangle(Point::new(0.0, 0.0), 0.3, 0.5))
//!         .with_foreground(Box::new(concrete.clone())),
//! );
//! for (y, z) in [(0.1, 0.2), (-0.1, 0.2), (-0.1, -0.2), (0.1, -0.2)] {
//!     section.add_fiber(
//!         FiberElement::bar(Point::new(y, z), 0.02)
//!             .with_foreground(Box::new(steel.clone()))
//!             .with_background(Box::new(concrete.clone())),
//!     );
//! }
//!
//! let surface = NTetaCurveFinder::new(&section).create_surface(&[]).unwrap();
//! let json = surface.to_json().unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`section`] - Element container, section forces and stiffness
//! - [`elements`] - Surface, polyline and fiber elements
//! - [`materials`] - Material contract and reference stress-strain laws
//! - [`critical_strain`] - Admissible failure strain ranges per direction
//! - [`solver`] - Axial force root finding along one range
//! - [`curves`] - Failure surface finders
//! - [`surface`] - Failure surface result model
//! - [`settings`] - Solver and finder settings
//! - [`errors`] - Structured error types

pub mod critical_strain;
pub mod curves;
pub mod elements;
pub mod errors;
pub mod force;
pub mod geometry;
pub mod materials;
pub mod section;
pub mod settings;
pub mod solver;
pub mod strain;
pub mod surface;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types at crate root for convenience
pub use curves::{DTetaCurveFinder, NAlphaCurveFinder, NTetaCurveFinder};
pub use errors::{CalcError, CalcResult};
pub use force::{Force, Stiffness};
pub use section::Section;
pub use settings::EngineSettings;
pub use strain::StrainProfile;
pub use surface::{FailurePoint, FailureRing, FailureSurface};
