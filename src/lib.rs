//! # bend_core - Strain-Based Bending Calculation Engine
//!
//! `bend_core` computes the bending response of beam cross-sections built
//! from arbitrary piecewise-linear materials, and from that response the
//! deflection of single-span beams - including composite beams whose slab
//! and girder shift against each other at a shear joint.
//!
//! The method is strain-based: a strain distribution over the section depth
//! is described by a curvature κ and a neutral axis z_n; stresses are
//! integrated analytically to axial force and moment, and scalar solvers
//! vary the distribution until the axial forces balance. Enumerating every
//! material breakpoint yields the full moment-curvature curve.
//!
//! ## Design Philosophy
//!
//! - **Value-based**: geometries, materials, sections and cross-sections
//!   are immutable values; solver runs never mutate shared state
//! - **Failures are data**: an anchor that reaches no equilibrium becomes
//!   a [`NotSuccessful`] record next to the curve, never an exception
//! - **JSON-First**: the data model implements Serialize/Deserialize
//! - **Deterministic parallelism**: anchors and beam nodes are solved on a
//!   thread pool and re-sorted deterministically afterwards
//!
//! ## Units and Signs
//!
//! Newton and millimetre throughout (N, mm, N/mm², N·mm). The vertical
//! coordinate z grows downward from the top of the cross-section;
//! compression strains and stresses are negative; positive curvature and
//! positive moment compress the top fibre.
//!
//! ## Quick Start
//!
//! ```rust
//! use bend_core::crosssection::Crosssection;
//! use bend_core::curves::MKappaCurve;
//! use bend_core::geometry::{Geometry, Rectangle};
//! use bend_core::materials::steel::Steel;
//! use bend_core::section::Section;
//!
//! // a 10 x 20 mm steel rectangle
//! let steel = Steel::new(355.0).unwrap().with_failure_strain(0.15);
//! let rectangle = Rectangle::new(0.0, 20.0, 10.0).unwrap();
//! let section = Section::new(Geometry::Rectangle(rectangle), steel.material());
//! let cross_section = Crosssection::new(vec![section]).unwrap();
//!
//! // its positive moment-curvature branch
//! let curve = MKappaCurve::new(&cross_section).compute().unwrap();
//! assert!(curve.points.maximum_moment() > 0.0);
//! ```
//!
//! ## Modules
//!
//! - [`geometry`] - rectangle, trapezoid and point-mass circle primitives
//! - [`materials`] - piecewise-linear curves: concrete, steel, reinforcement
//! - [`section`] - geometry + material, analytic stress integration
//! - [`crosssection`] - section sets and their strain-state evaluation
//! - [`boundaries`] - admissible curvature and neutral-axis ranges
//! - [`solver`] - scalar Newton root finder with bisection fallback
//! - [`points`] - single equilibrium states (M-κ, M-N, M-N-κ)
//! - [`curves`] - full M-κ curves and M-N-κ-εΔ surfaces
//! - [`loading`] - single-span internal forces
//! - [`width`] - effective slab widths
//! - [`connector`] - headed-stud shear connectors
//! - [`fitting`] - damped Gauss-Newton for the slip distribution
//! - [`beam`] - node discretisation, deflection, slip iteration
//! - [`errors`] - structured errors and solver failure records

pub mod beam;
pub mod boundaries;
pub mod connector;
pub mod crosssection;
pub mod curves;
pub mod errors;
pub mod fitting;
pub mod geometry;
pub mod loading;
pub mod materials;
pub mod points;
pub mod section;
pub mod solver;
pub mod strain;
pub mod width;

// Re-export commonly used types at crate root for convenience
pub use beam::{Beam, CompositeBeam};
pub use connector::HeadedStud;
pub use crosssection::Crosssection;
pub use curves::{MKappaCurve, MNKappaCurve};
pub use errors::{CalcError, CalcResult, FailureReason, NotSuccessful};
pub use geometry::{Circle, Geometry, Rectangle, Trapezoid};
pub use loading::{Loading, SingleLoad};
pub use materials::{Concrete, Material, Reinforcement, Steel};
pub use section::Section;
pub use strain::StrainPosition;
pub use width::EffectiveWidths;
