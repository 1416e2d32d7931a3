//! # Curve Generators
//!
//! Full resistance curves assembled from many equilibrium points:
//!
//! - [`m_kappa`] - moment-curvature curves of a single cross-section
//!   (full interaction)
//! - [`m_n_kappa`] - moment-axial-force(-curvature) curves and the
//!   M-N-κ-εΔ surface of a cross-section split into two sub-cross-sections
//!   coupled through a shear joint
//!
//! Anchors are independent of each other, so both generators fan the
//! per-anchor solves out over a thread pool and re-sort the collected
//! points deterministically afterwards.

pub mod m_kappa;
pub mod m_n_kappa;

pub use m_kappa::{MKappaCurve, MKappaCurvePoint, MKappaCurvePoints, MKappaCurveResult};
pub use m_n_kappa::{
    MNCurve, MNCurveResult, MNKappaCurve, MNKappaCurvePoint, MNKappaCurvePoints,
    MNKappaCurveResult,
};
