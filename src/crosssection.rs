//! # Cross-Sections
//!
//! A [`Crosssection`] is an unordered collection of [`Section`]s, possibly
//! with effective slab widths attached. Evaluating it under a strain field
//! sums the per-section integrations; the boundary analysis derives the
//! admissible curvature and neutral-axis ranges from the strain limits of
//! all section edges.
//!
//! ## Example
//!
//! ```rust
//! use bend_core::crosssection::Crosssection;
//! use bend_core::geometry::{Geometry, Rectangle};
//! use bend_core::materials::steel::Steel;
//! use bend_core::section::Section;
//!
//! let steel = Steel::new(355.0).unwrap();
//! let flange = Section::new(
//!     Geometry::Rectangle(Rectangle::new(0.0, 15.0, 200.0).unwrap()),
//!     steel.material(),
//! );
//! let web = Section::new(
//!     Geometry::Rectangle(Rectangle::new(15.0, 185.0, 9.5).unwrap()),
//!     steel.material(),
//! );
//! let cross_section = Crosssection::new(vec![flange, web]).unwrap();
//! assert_eq!(cross_section.top_edge(), 0.0);
//! assert_eq!(cross_section.bottom_edge(), 185.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::boundaries::{
    Boundaries, BoundaryValues, MaximumCurvature, MinimumCurvature, NeutralAxisBounds,
};
use crate::errors::{CalcError, CalcResult};
use crate::geometry::Geometry;
use crate::materials::SectionKind;
use crate::section::{axial_force, moment, ComputedSection, Section};
use crate::strain::{neutral_axis, EdgeStrains, StrainPosition};
use crate::width::EffectiveWidths;

/// A set of sections forming one cross-section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crosssection {
    sections: Vec<Section>,
    slab_effective_widths: Option<EffectiveWidths>,
    top_edge: f64,
    bottom_edge: f64,
}

impl Crosssection {
    pub fn new(sections: Vec<Section>) -> CalcResult<Self> {
        Self::build(sections, None)
    }

    /// Cross-section whose slab sections are clamped to effective widths.
    pub fn with_effective_widths(
        sections: Vec<Section>,
        widths: EffectiveWidths,
    ) -> CalcResult<Self> {
        Self::build(sections, Some(widths))
    }

    fn build(sections: Vec<Section>, widths: Option<EffectiveWidths>) -> CalcResult<Self> {
        if sections.is_empty() {
            return Err(CalcError::invalid_input(
                "sections",
                "[]",
                "a cross-section needs at least one section",
            ));
        }
        check_overlap(&sections)?;
        let top_edge = sections
            .iter()
            .map(|s| s.geometry.top_edge())
            .fold(f64::INFINITY, f64::min);
        let bottom_edge = sections
            .iter()
            .map(|s| s.geometry.bottom_edge())
            .fold(f64::NEG_INFINITY, f64::max);
        Ok(Self {
            sections,
            slab_effective_widths: widths,
            top_edge,
            bottom_edge,
        })
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn slab_effective_widths(&self) -> Option<&EffectiveWidths> {
        self.slab_effective_widths.as_ref()
    }

    /// top edge over all sections
    pub fn top_edge(&self) -> f64 {
        self.top_edge
    }

    /// bottom edge over all sections
    pub fn bottom_edge(&self) -> f64 {
        self.bottom_edge
    }

    pub fn height(&self) -> f64 {
        self.bottom_edge - self.top_edge
    }

    /// vertical middle between top and bottom
    pub fn half_point(&self) -> f64 {
        0.5 * (self.top_edge + self.bottom_edge)
    }

    /// sections of the given kind (girder or slab)
    pub fn sections_of_kind(&self, kind: SectionKind) -> Vec<&Section> {
        self.sections
            .iter()
            .filter(|s| s.section_kind() == kind)
            .collect()
    }

    /// Sub-cross-section made of all sections of the given kind.
    ///
    /// Returns an error when no section of that kind exists.
    pub fn sub_cross_section(&self, kind: SectionKind) -> CalcResult<Crosssection> {
        let sections: Vec<Section> = self
            .sections
            .iter()
            .filter(|s| s.section_kind() == kind)
            .cloned()
            .collect();
        if sections.is_empty() {
            return Err(CalcError::invalid_input(
                "kind",
                format!("{kind:?}"),
                "cross-section has no section of this kind",
            ));
        }
        let mut sub = Crosssection::build(sections, self.slab_effective_widths)?;
        // the sub-cross-section keeps the parent's widths only for the slab
        if kind == SectionKind::Girder {
            sub.slab_effective_widths = None;
        }
        Ok(sub)
    }

    /// smallest of all maximum section strains, with its position
    pub fn decisive_maximum_positive_strain_position(&self) -> StrainPosition {
        self.sections
            .iter()
            .map(|s| s.top_edge_maximum_strain())
            .min_by(|a, b| a.strain.total_cmp(&b.strain))
            .expect("cross-section is never empty")
    }

    /// largest of all minimum section strains, with its position
    pub fn decisive_maximum_negative_strain_position(&self) -> StrainPosition {
        self.sections
            .iter()
            .map(|s| s.top_edge_minimum_strain())
            .max_by(|a, b| a.strain.total_cmp(&b.strain))
            .expect("cross-section is never empty")
    }

    pub fn maximum_positive_strain(&self) -> f64 {
        self.sections
            .iter()
            .map(|s| s.material.maximum_strain())
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn maximum_negative_strain(&self) -> f64 {
        self.sections
            .iter()
            .map(|s| s.material.minimum_strain())
            .fold(f64::INFINITY, f64::min)
    }

    /// Evaluate the cross-section under a uniform strain (κ = 0).
    pub fn computed_under_constant_strain(
        &self,
        strain_value: f64,
    ) -> CalcResult<ComputedCrosssection> {
        let mut computed = Vec::with_capacity(self.sections.len());
        for section in &self.sections {
            computed.push(section.under_constant_strain(strain_value)?);
        }
        Ok(ComputedCrosssection { computed })
    }

    /// Evaluate the cross-section under ε(z) = κ·(z − z_n).
    pub fn computed_under_curvature(
        &self,
        curvature: f64,
        neutral_axis_value: f64,
    ) -> CalcResult<ComputedCrosssection> {
        let mut computed = Vec::new();
        for section in &self.sections {
            let widths = self.widths_for(section);
            computed.extend(section.under_curvature(curvature, neutral_axis_value, widths)?);
        }
        Ok(ComputedCrosssection { computed })
    }

    /// Material breakpoints lying between zero strain and the strain state
    /// (κ, z_n), deduplicated over all sections.
    pub fn material_points_inside_curvature(
        &self,
        curvature: f64,
        neutral_axis_value: f64,
    ) -> Vec<StrainPosition> {
        let mut points: Vec<StrainPosition> = self
            .sections
            .iter()
            .flat_map(|s| s.material_points_inside_curvature(curvature, neutral_axis_value))
            .collect();
        points.sort_by(|a, b| {
            a.strain
                .total_cmp(&b.strain)
                .then(a.position.total_cmp(&b.position))
        });
        points.dedup_by(|a, b| a.strain == b.strain && a.position == b.position);
        points
    }

    /// Curvature and neutral-axis boundary values of this cross-section.
    pub fn boundaries(&self) -> CalcResult<Boundaries> {
        let maximum_strains = self.sections_maximum_strains();
        let minimum_strains = self.sections_minimum_strains();
        let positive_failure = self
            .maximum_curvature_edges(&maximum_strains, &minimum_strains, true)
            .ok_or_else(|| CalcError::Internal {
                message: "no positive curvature possible".to_string(),
            })?;
        let negative_failure = self
            .maximum_curvature_edges(&minimum_strains, &maximum_strains, false)
            .ok_or_else(|| CalcError::Internal {
                message: "no negative curvature possible".to_string(),
            })?;
        let positive_start = self.curvature_start_bound(&positive_failure)?;
        let negative_start = self.curvature_start_bound(&negative_failure)?;
        Ok(Boundaries {
            positive: self.boundary_values(
                &positive_failure,
                positive_start,
                &maximum_strains,
                &minimum_strains,
                true,
            ),
            negative: self.boundary_values(
                &negative_failure,
                negative_start,
                &maximum_strains,
                &minimum_strains,
                false,
            ),
            neutral_axes: NeutralAxisBounds {
                maximum_positive_section_strains: maximum_strains,
                maximum_negative_section_strains: minimum_strains,
            },
        })
    }

    fn boundary_values(
        &self,
        failure: &EdgeStrains,
        start: StrainPosition,
        maximum_strains: &[StrainPosition],
        minimum_strains: &[StrainPosition],
        curvature_is_positive: bool,
    ) -> BoundaryValues {
        let other = if start == failure.top_edge_strain {
            failure.bottom_edge_strain
        } else {
            failure.top_edge_strain
        };
        BoundaryValues {
            maximum_curvature: MaximumCurvature {
                curvature: failure.curvature(),
                start,
                other,
                maximum_positive_section_strains: maximum_strains.to_vec(),
                maximum_negative_section_strains: minimum_strains.to_vec(),
            },
            minimum_curvature: MinimumCurvature {
                maximum_positive_section_strains: maximum_strains.to_vec(),
                maximum_negative_section_strains: minimum_strains.to_vec(),
                curvature_is_positive,
                top_edge: self.top_edge,
                bottom_edge: self.bottom_edge,
            },
        }
    }

    fn sections_maximum_strains(&self) -> Vec<StrainPosition> {
        let mut strains: Vec<StrainPosition> = self
            .sections
            .iter()
            .flat_map(|s| [s.top_edge_maximum_strain(), s.bottom_edge_maximum_strain()])
            .collect();
        strains.sort_by(|a, b| a.position.total_cmp(&b.position));
        strains
    }

    fn sections_minimum_strains(&self) -> Vec<StrainPosition> {
        let mut strains: Vec<StrainPosition> = self
            .sections
            .iter()
            .flat_map(|s| [s.top_edge_minimum_strain(), s.bottom_edge_minimum_strain()])
            .collect();
        strains.sort_by(|a, b| a.position.total_cmp(&b.position));
        strains
    }

    /// The edge-strain pair reaching the maximum curvature of the wanted
    /// sign: every bottom limit paired with every higher top limit, the
    /// pair failing first (smallest |κ|) governs.
    fn maximum_curvature_edges(
        &self,
        bottom_limits: &[StrainPosition],
        top_limits: &[StrainPosition],
        positive: bool,
    ) -> Option<EdgeStrains> {
        let mut pairs = Vec::new();
        for bottom in bottom_limits {
            for top in top_limits {
                if top.position < bottom.position {
                    pairs.push(EdgeStrains::new(*top, *bottom));
                }
            }
        }
        if positive {
            pairs
                .into_iter()
                .min_by(|a, b| a.curvature().total_cmp(&b.curvature()))
        } else {
            pairs
                .into_iter()
                .max_by(|a, b| a.curvature().total_cmp(&b.curvature()))
        }
    }

    /// Of the two edge strains defining the failure curvature, the anchor
    /// for the equilibrium iteration is the one whose curvature reduction
    /// changes the axial force least (the opposite edge carries the
    /// equilibrium-sensitive strain).
    fn curvature_start_bound(&self, failure: &EdgeStrains) -> CalcResult<StrainPosition> {
        let factor = 0.9;
        let initial = self.axial_force_anchored(failure.top_edge_strain, failure.curvature())?;
        let anchored_top = self.axial_force_anchored(
            failure.top_edge_strain,
            factor * failure.curvature(),
        )?;
        let anchored_bottom = self.axial_force_anchored(
            failure.bottom_edge_strain,
            factor * failure.curvature(),
        )?;
        if (anchored_top - initial).abs() > (anchored_bottom - initial).abs() {
            Ok(failure.bottom_edge_strain)
        } else {
            Ok(failure.top_edge_strain)
        }
    }

    fn axial_force_anchored(
        &self,
        anchor: StrainPosition,
        curvature: f64,
    ) -> CalcResult<f64> {
        let axis = neutral_axis(anchor.strain, curvature, anchor.position);
        Ok(self
            .computed_under_curvature(curvature, axis)?
            .total_axial_force())
    }

    fn widths_for(&self, section: &Section) -> Option<&EffectiveWidths> {
        match &self.slab_effective_widths {
            Some(widths) if widths.for_section_kind == section.section_kind() => Some(widths),
            _ => None,
        }
    }
}

/// A cross-section evaluated under one strain field.
#[derive(Debug, Clone)]
pub struct ComputedCrosssection {
    computed: Vec<ComputedSection>,
}

impl ComputedCrosssection {
    /// the integrated slices
    pub fn computed_sections(&self) -> &[ComputedSection] {
        &self.computed
    }

    /// ΣN over all slices
    pub fn total_axial_force(&self) -> f64 {
        axial_force(&self.computed)
    }

    /// ΣM over all slices
    pub fn total_moment(&self) -> f64 {
        moment(&self.computed)
    }

    /// ΣN over the slices of one kind
    pub fn axial_force_of_kind(&self, kind: SectionKind) -> f64 {
        self.computed
            .iter()
            .filter(|s| s.section_kind() == kind)
            .map(|s| s.axial_force())
            .sum()
    }

    /// ΣM over the slices of one kind
    pub fn moment_of_kind(&self, kind: SectionKind) -> f64 {
        self.computed
            .iter()
            .filter(|s| s.section_kind() == kind)
            .map(|s| s.moment())
            .sum()
    }
}

/// Reject rectangle pairs that overlap with positive measure in both
/// directions; shapes merely touching are fine.
fn check_overlap(sections: &[Section]) -> CalcResult<()> {
    const TOLERANCE: f64 = 1e-9;
    for (first_index, first) in sections.iter().enumerate() {
        for (second_index, second) in sections.iter().enumerate().skip(first_index + 1) {
            let (Geometry::Rectangle(a), Geometry::Rectangle(b)) =
                (&first.geometry, &second.geometry)
            else {
                continue;
            };
            let vertical =
                a.bottom_edge().min(b.bottom_edge()) - a.top_edge().max(b.top_edge());
            let horizontal =
                a.right_edge().min(b.right_edge()) - a.left_edge().max(b.left_edge());
            if vertical > TOLERANCE && horizontal > TOLERANCE {
                return Err(CalcError::SectionsOverlap {
                    first: first_index,
                    second: second_index,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rectangle;
    use crate::materials::steel::Steel;
    use approx::assert_relative_eq;

    fn heb_like() -> Crosssection {
        // symmetric I: flanges 200x15, web 9.5x170, total depth 200
        let steel = Steel::new(355.0).unwrap().with_failure_strain(0.15);
        let sections = vec![
            Section::new(
                Geometry::Rectangle(Rectangle::new(0.0, 15.0, 200.0).unwrap()),
                steel.material(),
            ),
            Section::new(
                Geometry::Rectangle(Rectangle::new(15.0, 185.0, 9.5).unwrap()),
                steel.material(),
            ),
            Section::new(
                Geometry::Rectangle(Rectangle::new(185.0, 200.0, 200.0).unwrap()),
                steel.material(),
            ),
        ];
        Crosssection::new(sections).unwrap()
    }

    #[test]
    fn test_edges() {
        let cs = heb_like();
        assert_relative_eq!(cs.top_edge(), 0.0);
        assert_relative_eq!(cs.bottom_edge(), 200.0);
        assert_relative_eq!(cs.half_point(), 100.0);
    }

    #[test]
    fn test_overlap_rejected() {
        let steel = Steel::new(355.0).unwrap();
        let sections = vec![
            Section::new(
                Geometry::Rectangle(Rectangle::new(0.0, 20.0, 100.0).unwrap()),
                steel.material(),
            ),
            Section::new(
                Geometry::Rectangle(Rectangle::new(10.0, 30.0, 100.0).unwrap()),
                steel.material(),
            ),
        ];
        let result = Crosssection::new(sections);
        assert!(matches!(result, Err(CalcError::SectionsOverlap { .. })));
    }

    #[test]
    fn test_touching_sections_allowed() {
        // the I assembles from touching rectangles
        assert_eq!(heb_like().sections().len(), 3);
    }

    #[test]
    fn test_symmetric_section_balances_at_mid_depth() {
        let cs = heb_like();
        let computed = cs.computed_under_curvature(0.0001, 100.0).unwrap();
        assert_relative_eq!(computed.total_axial_force(), 0.0, epsilon = 1e-6);
        assert!(computed.total_moment() > 0.0);
    }

    #[test]
    fn test_constant_strain_totals() {
        let cs = heb_like();
        let computed = cs.computed_under_constant_strain(0.001).unwrap();
        // area 200*15*2 + 9.5*170 = 7615 mm2, sigma = 210
        assert_relative_eq!(computed.total_axial_force(), 7615.0 * 210.0, epsilon = 1e-6);
    }

    #[test]
    fn test_boundaries_failure_curvature() {
        let cs = heb_like();
        let boundaries = cs.boundaries().unwrap();
        // symmetric limits +/-0.15 over depth 200: kappa_max = 0.3/200
        assert_relative_eq!(
            boundaries.positive.maximum_curvature.curvature,
            0.0015,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            boundaries.negative.maximum_curvature.curvature,
            -0.0015,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_sub_cross_section_requires_kind() {
        let cs = heb_like();
        assert!(cs.sub_cross_section(SectionKind::Girder).is_ok());
        assert!(cs.sub_cross_section(SectionKind::Slab).is_err());
    }
}
