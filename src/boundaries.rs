//! # Boundary Analysis
//!
//! Every material limits the strain it can take; over a cross-section these
//! limits bound the admissible strain distributions. Given the
//! (position, strain-limit) pairs of all section edges this module answers
//! two questions:
//!
//! - what is the largest (and smallest) curvature an anchor (z₀, ε₀) can be
//!   combined with before some material fails ([`MaximumCurvature`],
//!   [`MinimumCurvature`]), and
//! - between which neutral-axis depths may a given curvature move without
//!   failing a material ([`NeutralAxisBounds`]).
//!
//! These bounds seed the Newton iterations and clamp their excursions.

use serde::{Deserialize, Serialize};

use crate::strain::{neutral_axis, EdgeStrains, StrainPosition};

/// pad applied to the anchor strain when it lies inside every material
/// range, so the minimum curvature never degenerates to exactly zero
const EDGE_STRAIN_PAD: f64 = 0.0001;

fn pair_curvatures(
    anchor: StrainPosition,
    candidates: &[StrainPosition],
) -> Vec<EdgeStrains> {
    candidates
        .iter()
        .filter(|candidate| candidate.position != anchor.position)
        .map(|candidate| {
            if candidate.position < anchor.position {
                EdgeStrains::new(*candidate, anchor)
            } else {
                EdgeStrains::new(anchor, *candidate)
            }
        })
        .collect()
}

/// Deterministic selection: smallest |κ| first, ties broken by the smaller
/// distance between anchor and opposing limit.
fn select_by_smallest_magnitude(
    anchor: &StrainPosition,
    edge_strains: Vec<EdgeStrains>,
) -> Option<EdgeStrains> {
    edge_strains.into_iter().min_by(|a, b| {
        let key_a = (a.curvature().abs(), distance_to_anchor(anchor, a));
        let key_b = (b.curvature().abs(), distance_to_anchor(anchor, b));
        key_a
            .0
            .total_cmp(&key_b.0)
            .then(key_a.1.total_cmp(&key_b.1))
    })
}

fn select_by_largest_magnitude(
    anchor: &StrainPosition,
    edge_strains: Vec<EdgeStrains>,
) -> Option<EdgeStrains> {
    edge_strains.into_iter().min_by(|a, b| {
        let key_a = (-a.curvature().abs(), distance_to_anchor(anchor, a));
        let key_b = (-b.curvature().abs(), distance_to_anchor(anchor, b));
        key_a
            .0
            .total_cmp(&key_b.0)
            .then(key_a.1.total_cmp(&key_b.1))
    })
}

fn distance_to_anchor(anchor: &StrainPosition, edge_strains: &EdgeStrains) -> f64 {
    let other = if edge_strains.top_edge_strain == *anchor {
        &edge_strains.bottom_edge_strain
    } else {
        &edge_strains.top_edge_strain
    };
    (other.position - anchor.position).abs()
}

fn higher_positions(position: f64, candidates: &[StrainPosition]) -> Vec<StrainPosition> {
    candidates
        .iter()
        .filter(|c| c.position < position)
        .copied()
        .collect()
}

fn lower_positions(position: f64, candidates: &[StrainPosition]) -> Vec<StrainPosition> {
    candidates
        .iter()
        .filter(|c| c.position > position)
        .copied()
        .collect()
}

fn smaller_strains(strain: f64, candidates: Vec<StrainPosition>) -> Vec<StrainPosition> {
    candidates.into_iter().filter(|c| c.strain < strain).collect()
}

fn greater_strains(strain: f64, candidates: Vec<StrainPosition>) -> Vec<StrainPosition> {
    candidates.into_iter().filter(|c| c.strain > strain).collect()
}

/// The largest admissible curvature (one sign) and the strain limits it was
/// derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaximumCurvature {
    /// maximum curvature of the cross-section itself
    pub curvature: f64,
    /// anchor strain of the failure state
    pub start: StrainPosition,
    /// opposing strain limit of the failure state
    pub other: StrainPosition,
    /// maximum positive strain limits of all section edges
    pub maximum_positive_section_strains: Vec<StrainPosition>,
    /// maximum negative strain limits of all section edges
    pub maximum_negative_section_strains: Vec<StrainPosition>,
}

impl MaximumCurvature {
    /// Largest admissible curvature through the given anchor.
    ///
    /// Pairs the anchor with every strain limit that produces a curvature
    /// of the wanted sign; the limit reached first (smallest |κ|) governs.
    pub fn compute(&self, anchor: StrainPosition) -> f64 {
        let candidates = if self.curvature > 0.0 {
            let mut c = higher_positions(
                anchor.position,
                &self.maximum_negative_section_strains,
            );
            c.extend(lower_positions(
                anchor.position,
                &self.maximum_positive_section_strains,
            ));
            c
        } else {
            let mut c = higher_positions(
                anchor.position,
                &self.maximum_positive_section_strains,
            );
            c.extend(lower_positions(
                anchor.position,
                &self.maximum_negative_section_strains,
            ));
            c
        };
        let edge_strains = pair_curvatures(anchor, &candidates);
        select_by_smallest_magnitude(&anchor, edge_strains)
            .map(|edges| edges.curvature())
            .unwrap_or(0.0)
    }
}

/// The smallest curvature an anchor must at least be combined with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinimumCurvature {
    pub maximum_positive_section_strains: Vec<StrainPosition>,
    pub maximum_negative_section_strains: Vec<StrainPosition>,
    /// sign of the curvature branch this instance belongs to
    pub curvature_is_positive: bool,
    /// top edge of the cross-section
    pub top_edge: f64,
    /// bottom edge of the cross-section
    pub bottom_edge: f64,
}

impl MinimumCurvature {
    /// Smallest admissible curvature through the given anchor.
    ///
    /// When the anchor strain lies inside every material range any
    /// curvature is admissible; the cross-section edges padded by a small
    /// strain then give a near-zero but non-degenerate bound. Otherwise the
    /// limit strains of the governing sign bound the curvature from below.
    pub fn compute(&self, anchor: StrainPosition) -> f64 {
        let smallest_positive_limit = self
            .maximum_positive_section_strains
            .iter()
            .map(|c| c.strain)
            .fold(f64::INFINITY, f64::min);
        let largest_negative_limit = self
            .maximum_negative_section_strains
            .iter()
            .map(|c| c.strain)
            .fold(f64::NEG_INFINITY, f64::max);
        if largest_negative_limit <= anchor.strain && anchor.strain <= smallest_positive_limit {
            let edge_strains = pair_curvatures(anchor, &self.padded_edges(&anchor));
            edge_strains
                .into_iter()
                .min_by(|a, b| a.curvature().abs().total_cmp(&b.curvature().abs()))
                .map(|edges| edges.curvature())
                .unwrap_or(0.0)
        } else {
            let candidates = self.governing_candidates(&anchor);
            let edge_strains = pair_curvatures(anchor, &candidates);
            select_by_largest_magnitude(&anchor, edge_strains)
                .map(|edges| edges.curvature())
                .unwrap_or(0.0)
        }
    }

    fn padded_edges(&self, anchor: &StrainPosition) -> Vec<StrainPosition> {
        let (top_pad, bottom_pad) = if self.curvature_is_positive {
            (-EDGE_STRAIN_PAD, EDGE_STRAIN_PAD)
        } else {
            (EDGE_STRAIN_PAD, -EDGE_STRAIN_PAD)
        };
        vec![
            StrainPosition::new(anchor.strain + top_pad, self.top_edge, anchor.material),
            StrainPosition::new(anchor.strain + bottom_pad, self.bottom_edge, anchor.material),
        ]
    }

    fn governing_candidates(&self, anchor: &StrainPosition) -> Vec<StrainPosition> {
        match (self.curvature_is_positive, anchor.strain > 0.0) {
            (true, true) => {
                let mut c = greater_strains(
                    anchor.strain,
                    lower_positions(anchor.position, &self.maximum_positive_section_strains),
                );
                c.extend(smaller_strains(
                    anchor.strain,
                    higher_positions(anchor.position, &self.maximum_positive_section_strains),
                ));
                c
            }
            (true, false) => {
                let mut c = smaller_strains(
                    anchor.strain,
                    higher_positions(anchor.position, &self.maximum_negative_section_strains),
                );
                c.extend(greater_strains(
                    anchor.strain,
                    lower_positions(anchor.position, &self.maximum_negative_section_strains),
                ));
                c
            }
            (false, true) => {
                let mut c = smaller_strains(
                    anchor.strain,
                    lower_positions(anchor.position, &self.maximum_positive_section_strains),
                );
                c.extend(greater_strains(
                    anchor.strain,
                    higher_positions(anchor.position, &self.maximum_positive_section_strains),
                ));
                c
            }
            (false, false) => {
                let mut c = greater_strains(
                    anchor.strain,
                    higher_positions(anchor.position, &self.maximum_negative_section_strains),
                );
                c.extend(smaller_strains(
                    anchor.strain,
                    lower_positions(anchor.position, &self.maximum_negative_section_strains),
                ));
                c
            }
        }
    }
}

/// Admissible neutral-axis depths for a given curvature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeutralAxisBounds {
    pub maximum_positive_section_strains: Vec<StrainPosition>,
    pub maximum_negative_section_strains: Vec<StrainPosition>,
}

impl NeutralAxisBounds {
    /// The two neutral-axis depths bounding the admissible band under the
    /// given curvature, not necessarily ordered - callers take min/max.
    ///
    /// Outside the band the strain induced at some section edge would
    /// exceed its material limit, so the axial-force iteration must not
    /// leave it. One value stems from the positive strain limits, the other
    /// from the negative ones; at the maximum curvature the band collapses
    /// to a single depth.
    pub fn compute(&self, curvature: f64) -> (f64, f64) {
        let axis = |strain_position: &StrainPosition| {
            neutral_axis(strain_position.strain, curvature, strain_position.position)
        };
        let (minimum, maximum) = if curvature > 0.0 {
            (
                self.maximum_negative_section_strains
                    .iter()
                    .map(axis)
                    .fold(f64::INFINITY, f64::min),
                self.maximum_positive_section_strains
                    .iter()
                    .map(axis)
                    .fold(f64::NEG_INFINITY, f64::max),
            )
        } else {
            (
                self.maximum_positive_section_strains
                    .iter()
                    .map(axis)
                    .fold(f64::INFINITY, f64::min),
                self.maximum_negative_section_strains
                    .iter()
                    .map(axis)
                    .fold(f64::NEG_INFINITY, f64::max),
            )
        };
        (minimum, maximum)
    }
}

/// Maximum and minimum curvature for one curvature sign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryValues {
    pub maximum_curvature: MaximumCurvature,
    pub minimum_curvature: MinimumCurvature,
}

/// Curvature and neutral-axis bounds of a cross-section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boundaries {
    pub positive: BoundaryValues,
    pub negative: BoundaryValues,
    pub neutral_axes: NeutralAxisBounds,
}
