//! # Strain-Distribution Primitives
//!
//! A strain state over the section depth is fully described by a curvature
//! κ and the neutral-axis depth z_n: ε(z) = κ·(z − z_n). This module holds
//! the conversions between the four quantities (strain, depth, curvature,
//! neutral axis), the [`StrainPosition`] anchor used throughout the solvers,
//! and the [`EdgeStrains`] pair that defines a curvature between two
//! section edges.
//!
//! Sign convention: z grows downward from the top of the cross-section,
//! compression strains are negative, positive curvature compresses the top
//! fibre.

use serde::{Deserialize, Serialize};

use crate::materials::MaterialKind;

/// Strain at a vertical position within a given material.
///
/// Used as anchor for solver runs and as breakpoint generator for the
/// curve generators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StrainPosition {
    /// strain value at `position`
    pub strain: f64,
    /// vertical position (z, growing downward)
    pub position: f64,
    /// material the strain belongs to
    pub material: MaterialKind,
}

impl StrainPosition {
    pub fn new(strain: f64, position: f64, material: MaterialKind) -> Self {
        Self {
            strain,
            position,
            material,
        }
    }
}

impl PartialEq for StrainPosition {
    fn eq(&self, other: &Self) -> bool {
        self.strain == other.strain && self.position == other.position
    }
}

/// Strains at the top- and bottom-edge of a region, defining a curvature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeStrains {
    pub top_edge_strain: StrainPosition,
    pub bottom_edge_strain: StrainPosition,
}

impl EdgeStrains {
    pub fn new(top_edge_strain: StrainPosition, bottom_edge_strain: StrainPosition) -> Self {
        Self {
            top_edge_strain,
            bottom_edge_strain,
        }
    }

    /// curvature between the two edge strains:
    /// κ = (ε_top − ε_bottom) / (z_top − z_bottom)
    pub fn curvature(&self) -> f64 {
        curvature_by_points(
            self.top_edge_strain.position,
            self.bottom_edge_strain.position,
            self.top_edge_strain.strain,
            self.bottom_edge_strain.strain,
        )
    }
}

/// curvature from a neutral axis, a position and the strain at that
/// position: κ = ε / (z − z_n)
///
/// The caller must make sure `neutral_axis` and `position` differ.
pub fn curvature(neutral_axis: f64, position: f64, strain_at_position: f64) -> f64 {
    strain_at_position / (position - neutral_axis)
}

/// curvature from strains at two distinct depths
pub fn curvature_by_points(
    top_edge: f64,
    bottom_edge: f64,
    top_strain: f64,
    bottom_strain: f64,
) -> f64 {
    (top_strain - bottom_strain) / (top_edge - bottom_edge)
}

/// strain at `position` under the distribution (κ, z_n): ε = κ·(z − z_n)
pub fn strain(neutral_axis: f64, curvature: f64, position: f64) -> f64 {
    curvature * (position - neutral_axis)
}

/// position where `strain_at_position` occurs: z = z_n + ε/κ
pub fn position(strain_at_position: f64, neutral_axis: f64, curvature: f64) -> f64 {
    neutral_axis + strain_at_position / curvature
}

/// neutral axis from a known (strain, position) pair and curvature:
/// z_n = z − ε/κ
pub fn neutral_axis(strain_at_position: f64, curvature: f64, position: f64) -> f64 {
    position - strain_at_position / curvature
}

/// Linear interpolation: given two (key, value) pairs, the value at `key`.
pub fn interpolation(key: f64, first: (f64, f64), second: (f64, f64)) -> f64 {
    first.1 + (key - first.0) * (second.1 - first.1) / (second.0 - first.0)
}

/// Round a strain to 7 decimals before a curve lookup.
///
/// Breakpoint depths are inverted through z = ε/κ + z_n; re-deriving the
/// strain from such a depth reproduces the breakpoint only to ~1e-12, which
/// would otherwise land the lookup in the wrong segment.
pub(crate) fn round_strain(strain_value: f64) -> f64 {
    (strain_value * 1e7).round() / 1e7
}
