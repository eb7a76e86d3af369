//! # Failure Surface Construction
//!
//! Three finders turn a [`Section`](crate::section::Section) into a
//! [`FailureSurface`](crate::surface::FailureSurface):
//!
//! - [`NTetaCurveFinder`]: rings of constant axial force, one point per
//!   critical strain range that reaches the ring's force
//! - [`NAlphaCurveFinder`]: the same rings resampled at evenly spaced moment
//!   directions
//! - [`DTetaCurveFinder`]: an unclassified point cloud sampled along every
//!   range

pub mod d_teta;
pub mod n_alpha;
pub mod n_teta;

pub use d_teta::DTetaCurveFinder;
pub use n_alpha::NAlphaCurveFinder;
pub use n_teta::NTetaCurveFinder;
