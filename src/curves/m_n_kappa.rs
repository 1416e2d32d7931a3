//! # Moment-Axial-Force(-Curvature) Curves
//!
//! For a cross-section split into two sub-cross-sections that shift against
//! each other at a horizontal joint, the bending resistance depends on the
//! axial force N transferred through the joint and on the strain jump εΔ
//! across it. Two generators build that picture:
//!
//! - [`MNCurve`] - the zero-curvature edge: every material breakpoint of
//!   one sub-cross-section is applied as a uniform strain, its axial force
//!   is balanced on the other, one (M, N, 0, εΔ) point each,
//! - [`MNKappaCurve`] - the interior: for every axial-force level of the
//!   M-N curve the moment-curvature procedure runs on both sub-cross-
//!   sections, producing (M, N, κ, εΔ) points.
//!
//! [`MNKappaCurvePoints::state_by`] interpolates the resulting surface
//! bilinearly over (N, εΔ); the beam slip solver queries it at every node.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::crosssection::Crosssection;
use crate::errors::{CalcError, CalcResult, NotSuccessful};
use crate::points::{MomentAxialForce, MomentAxialForceCurvature, MNByStrain};
use crate::strain::{interpolation, StrainPosition};

/// One point of the M-N-κ-εΔ surface.
///
/// `axial_force` and `strain_difference` always refer to the first
/// sub-cross-section: +N acts on it, −N on the second, and
/// εΔ = ε₁ − ε₂ at the reference depth.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MNKappaCurvePoint {
    pub moment: f64,
    pub curvature: f64,
    pub axial_force: f64,
    pub strain_difference: f64,
    /// neutral axes of the sub-cross-sections; `None` at zero curvature
    pub neutral_axes: (Option<f64>, Option<f64>),
    /// anchor that produced this point
    pub strain_position: StrainPosition,
}

impl PartialEq for MNKappaCurvePoint {
    fn eq(&self, other: &Self) -> bool {
        self.moment == other.moment
            && self.curvature == other.curvature
            && self.axial_force == other.axial_force
            && self.strain_difference == other.strain_difference
    }
}

/// Points of the M-N-κ-εΔ surface, ordered lexicographically by
/// (curvature, axial force).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MNKappaCurvePoints {
    points: Vec<MNKappaCurvePoint>,
}

impl MNKappaCurvePoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[MNKappaCurvePoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn moments(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.moment).collect()
    }

    pub fn curvatures(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.curvature).collect()
    }

    pub fn axial_forces(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.axial_force).collect()
    }

    pub fn strain_differences(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.strain_difference).collect()
    }

    pub fn maximum_moment(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.moment)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn add(&mut self, point: MNKappaCurvePoint) {
        if !self.points.contains(&point) {
            self.points.push(point);
            self.sort();
        }
    }

    pub fn extend(&mut self, other: &MNKappaCurvePoints) {
        for point in &other.points {
            self.add(*point);
        }
    }

    /// Resisting moment and curvature at the given axial force and strain
    /// difference, bilinearly interpolated over the (N, εΔ) grid.
    ///
    /// Queries outside the computed hull are an error - the surface is
    /// never extrapolated.
    pub fn state_by(
        &self,
        axial_force: f64,
        strain_difference: f64,
    ) -> CalcResult<(f64, f64)> {
        let mut levels: Vec<f64> = self.points.iter().map(|p| p.axial_force).collect();
        levels.sort_by(|a, b| a.total_cmp(b));
        levels.dedup();
        if levels.is_empty() {
            return Err(CalcError::OutsideCurveRange {
                curve: "m-n-kappa surface".to_string(),
                value: axial_force,
            });
        }
        let first = levels[0];
        let last = levels[levels.len() - 1];
        if axial_force < first || axial_force > last {
            return Err(CalcError::OutsideCurveRange {
                curve: "m-n-kappa surface".to_string(),
                value: axial_force,
            });
        }
        let upper_index = levels
            .iter()
            .position(|level| *level >= axial_force)
            .expect("axial force within level range");
        let lower_index = if levels[upper_index] == axial_force || upper_index == 0 {
            upper_index
        } else {
            upper_index - 1
        };
        let at_lower = self.state_at_level(levels[lower_index], strain_difference)?;
        if lower_index == upper_index {
            return Ok(at_lower);
        }
        let at_upper = self.state_at_level(levels[upper_index], strain_difference)?;
        let moment = interpolation(
            axial_force,
            (levels[lower_index], at_lower.0),
            (levels[upper_index], at_upper.0),
        );
        let curvature = interpolation(
            axial_force,
            (levels[lower_index], at_lower.1),
            (levels[upper_index], at_upper.1),
        );
        Ok((moment, curvature))
    }

    /// (moment, curvature) at one axial-force level, interpolated over εΔ
    fn state_at_level(&self, level: f64, strain_difference: f64) -> CalcResult<(f64, f64)> {
        let mut on_level: Vec<&MNKappaCurvePoint> = self
            .points
            .iter()
            .filter(|p| p.axial_force == level)
            .collect();
        on_level.sort_by(|a, b| a.strain_difference.total_cmp(&b.strain_difference));
        if on_level.len() == 1 {
            return Ok((on_level[0].moment, on_level[0].curvature));
        }
        for pair in on_level.windows(2) {
            if pair[0].strain_difference <= strain_difference
                && strain_difference <= pair[1].strain_difference
            {
                let moment = interpolation(
                    strain_difference,
                    (pair[0].strain_difference, pair[0].moment),
                    (pair[1].strain_difference, pair[1].moment),
                );
                let curvature = interpolation(
                    strain_difference,
                    (pair[0].strain_difference, pair[0].curvature),
                    (pair[1].strain_difference, pair[1].curvature),
                );
                return Ok((moment, curvature));
            }
        }
        Err(CalcError::OutsideCurveRange {
            curve: "m-n-kappa surface".to_string(),
            value: strain_difference,
        })
    }

    fn sort(&mut self) {
        self.points.sort_by(|a, b| {
            a.curvature
                .total_cmp(&b.curvature)
                .then(a.axial_force.total_cmp(&b.axial_force))
                .then(a.strain_difference.total_cmp(&b.strain_difference))
        });
    }
}

/// Result of the zero-curvature M-N computation.
#[derive(Debug, Clone)]
pub struct MNCurveResult {
    pub points: MNKappaCurvePoints,
    /// anchors per sub-cross-section (already limited to the balanced
    /// strain range)
    pub strain_positions: (Vec<StrainPosition>, Vec<StrainPosition>),
    pub not_successful: Vec<NotSuccessful>,
}

/// Zero-curvature moment-axial-force curve over two sub-cross-sections.
#[derive(Debug, Clone)]
pub struct MNCurve<'a> {
    sub_cross_sections: (&'a Crosssection, &'a Crosssection),
}

impl<'a> MNCurve<'a> {
    pub fn new(sub_cross_sections: (&'a Crosssection, &'a Crosssection)) -> Self {
        Self { sub_cross_sections }
    }

    pub fn compute(&self) -> CalcResult<MNCurveResult> {
        let mut points = MNKappaCurvePoints::new();
        let mut not_successful = Vec::new();
        let decisive = self.decisive_strains()?;
        let anchors = (
            self.anchors(self.sub_cross_sections.0, decisive.0),
            self.anchors(self.sub_cross_sections.1, decisive.1),
        );
        for (index, cross_section_anchors) in [&anchors.0, &anchors.1].into_iter().enumerate()
        {
            let ordered = if index == 0 {
                (self.sub_cross_sections.0, self.sub_cross_sections.1)
            } else {
                (self.sub_cross_sections.1, self.sub_cross_sections.0)
            };
            let solver = MomentAxialForce::new(ordered);
            for anchor in dedup_by_strain(cross_section_anchors) {
                match solver.solve_by_strain(anchor.strain) {
                    Ok(point) => {
                        let sign = if index == 0 { 1.0 } else { -1.0 };
                        points.add(MNKappaCurvePoint {
                            moment: point.moment,
                            curvature: 0.0,
                            axial_force: sign * point.axial_force,
                            strain_difference: sign * point.strain_difference,
                            neutral_axes: (None, None),
                            strain_position: anchor,
                        });
                    }
                    Err(reason) => not_successful.push(reason),
                }
            }
        }
        Ok(MNCurveResult {
            points,
            strain_positions: anchors,
            not_successful,
        })
    }

    /// Uniform strain limits of both sub-cross-sections, balanced against
    /// each other: the sub-cross-section with the smaller axial capacity
    /// governs; the other one's limit strain is reduced to the strain that
    /// carries the opposite of that capacity.
    fn decisive_strains(&self) -> CalcResult<((f64, f64), (f64, f64))> {
        let (first, second) = self.sub_cross_sections;
        let mut first_limits = Vec::with_capacity(2);
        let mut second_limits = Vec::with_capacity(2);
        for (strain_1, strain_2) in [
            (
                first.decisive_maximum_positive_strain_position().strain,
                second.decisive_maximum_negative_strain_position().strain,
            ),
            (
                first.decisive_maximum_negative_strain_position().strain,
                second.decisive_maximum_positive_strain_position().strain,
            ),
        ] {
            let force_1 = first
                .computed_under_constant_strain(strain_1)?
                .total_axial_force();
            let force_2 = second
                .computed_under_constant_strain(strain_2)?
                .total_axial_force();
            if force_1.abs() <= force_2.abs() {
                first_limits.push(strain_1);
                let balanced = MNByStrain::new(second, -force_1)
                    .solve()
                    .map_err(|failed| CalcError::Internal {
                        message: format!("balancing strain not found: {failed}"),
                    })?;
                second_limits.push(balanced.strain);
            } else {
                let balanced = MNByStrain::new(first, -force_2)
                    .solve()
                    .map_err(|failed| CalcError::Internal {
                        message: format!("balancing strain not found: {failed}"),
                    })?;
                first_limits.push(balanced.strain);
                second_limits.push(strain_2);
            }
        }
        Ok((
            (first_limits[0], first_limits[1]),
            (second_limits[0], second_limits[1]),
        ))
    }

    /// material breakpoints of one sub-cross-section within its balanced
    /// strain limits, the limits themselves included
    fn anchors(&self, cross_section: &Crosssection, limits: (f64, f64)) -> Vec<StrainPosition> {
        let (lower, upper) = (limits.0.min(limits.1), limits.0.max(limits.1));
        let mut anchors: Vec<StrainPosition> = Vec::new();
        for section in cross_section.sections() {
            anchors.extend(section.strain_positions(Some((lower, upper))));
            anchors.push(StrainPosition::new(
                lower,
                section.geometry.top_edge(),
                section.material_kind(),
            ));
            anchors.push(StrainPosition::new(
                upper,
                section.geometry.top_edge(),
                section.material_kind(),
            ));
        }
        anchors.sort_by(|a, b| {
            a.strain
                .total_cmp(&b.strain)
                .then(a.position.total_cmp(&b.position))
        });
        anchors.dedup_by(|a, b| a.strain == b.strain && a.position == b.position);
        anchors
    }
}

/// deduplicate anchors that share the same strain (the uniform-strain
/// computation does not care about the position)
fn dedup_by_strain(anchors: &[StrainPosition]) -> Vec<StrainPosition> {
    let mut sorted = anchors.to_vec();
    sorted.sort_by(|a, b| a.strain.total_cmp(&b.strain));
    sorted.dedup_by(|a, b| a.strain == b.strain);
    sorted
}

/// Result of the full surface computation.
#[derive(Debug, Clone)]
pub struct MNKappaCurveResult {
    pub points: MNKappaCurvePoints,
    pub not_successful: Vec<NotSuccessful>,
}

/// M-N-κ-εΔ surface generator over two sub-cross-sections.
#[derive(Debug, Clone)]
pub struct MNKappaCurve<'a> {
    sub_cross_sections: (&'a Crosssection, &'a Crosssection),
    include_positive_curvature: bool,
    include_negative_curvature: bool,
}

impl<'a> MNKappaCurve<'a> {
    pub fn new(sub_cross_sections: (&'a Crosssection, &'a Crosssection)) -> Self {
        Self {
            sub_cross_sections,
            include_positive_curvature: true,
            include_negative_curvature: false,
        }
    }

    pub fn include_positive_curvature(mut self, include: bool) -> Self {
        self.include_positive_curvature = include;
        self
    }

    pub fn include_negative_curvature(mut self, include: bool) -> Self {
        self.include_negative_curvature = include;
        self
    }

    pub fn compute(&self) -> CalcResult<MNKappaCurveResult> {
        let m_n = MNCurve::new(self.sub_cross_sections).compute()?;
        let mut points = m_n.points.clone();
        let mut not_successful = m_n.not_successful;
        let mut levels: Vec<f64> = m_n.points.axial_forces();
        levels.sort_by(|a, b| a.total_cmp(b));
        levels.dedup();
        for (enabled, positive) in [
            (self.include_positive_curvature, true),
            (self.include_negative_curvature, false),
        ] {
            if !enabled {
                continue;
            }
            // every axial-force level crossed with every anchor of both
            // sub-cross-sections; each combination is one independent solve
            let mut jobs: Vec<(f64, StrainPosition, bool)> = Vec::new();
            for level in &levels {
                for anchor in dedup_by_strain(&m_n.strain_positions.0) {
                    jobs.push((*level, anchor, true));
                }
                for anchor in dedup_by_strain(&m_n.strain_positions.1) {
                    jobs.push((*level, anchor, false));
                }
            }
            let solved: Vec<Result<MNKappaCurvePoint, NotSuccessful>> = jobs
                .par_iter()
                .map(|(level, anchor, on_first)| {
                    self.solve_job(*level, *anchor, *on_first, positive)
                })
                .collect();
            for outcome in solved {
                match outcome {
                    Ok(point) => points.add(point),
                    Err(reason) => not_successful.push(reason),
                }
            }
        }
        Ok(MNKappaCurveResult {
            points,
            not_successful,
        })
    }

    fn solve_job(
        &self,
        level: f64,
        anchor: StrainPosition,
        anchor_on_first: bool,
        positive: bool,
    ) -> Result<MNKappaCurvePoint, NotSuccessful> {
        if anchor_on_first {
            let point = MomentAxialForceCurvature::new(
                self.sub_cross_sections,
                level,
                anchor,
                positive,
            )
            .solve()?;
            Ok(MNKappaCurvePoint {
                moment: point.moment,
                curvature: point.curvature,
                axial_force: point.axial_force,
                strain_difference: point.strain_difference,
                neutral_axes: (Some(point.neutral_axes.0), Some(point.neutral_axes.1)),
                strain_position: anchor,
            })
        } else {
            // anchor lives on the second sub-cross-section: solve with the
            // roles swapped and express the result first-centric again
            let swapped = (self.sub_cross_sections.1, self.sub_cross_sections.0);
            let point =
                MomentAxialForceCurvature::new(swapped, -level, anchor, positive).solve()?;
            Ok(MNKappaCurvePoint {
                moment: point.moment,
                curvature: point.curvature,
                axial_force: -point.axial_force,
                strain_difference: -point.strain_difference,
                neutral_axes: (Some(point.neutral_axes.1), Some(point.neutral_axes.0)),
                strain_position: anchor,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Geometry, Rectangle};
    use crate::materials::steel::Steel;
    use crate::section::Section;
    use approx::assert_relative_eq;

    fn steel_pair() -> (Crosssection, Crosssection) {
        let steel = Steel::new(355.0).unwrap().with_failure_strain(0.15);
        let top = Crosssection::new(vec![Section::new(
            Geometry::Rectangle(Rectangle::new(0.0, 10.0, 10.0).unwrap()),
            steel.material(),
        )])
        .unwrap();
        let bottom = Crosssection::new(vec![Section::new(
            Geometry::Rectangle(Rectangle::new(10.0, 20.0, 10.0).unwrap()),
            steel.material(),
        )])
        .unwrap();
        (top, bottom)
    }

    #[test]
    fn test_mn_curve_symmetric_pair() {
        let (top, bottom) = steel_pair();
        let result = MNCurve::new((&top, &bottom)).compute().unwrap();
        let points = result.points;
        assert!(!points.is_empty());
        // identical sub-sections: the axial forces come in +/- pairs
        let forces = points.axial_forces();
        let maximum = forces.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let minimum = forces.iter().cloned().fold(f64::INFINITY, f64::min);
        assert_relative_eq!(maximum, -minimum, epsilon = 20.0);
        // plastic capacity of one 10x10 block
        assert_relative_eq!(maximum, 35_500.0, epsilon = 20.0);
        // all curvatures are zero on the M-N edge
        assert!(points.curvatures().iter().all(|k| *k == 0.0));
    }

    #[test]
    fn test_mn_kappa_surface(){
        let (top, bottom) = steel_pair();
        let result = MNKappaCurve::new((&top, &bottom)).compute().unwrap();
        let points = result.points;
        // curvature points joined the zero-curvature edge
        assert!(points.curvatures().iter().any(|k| *k > 0.0));
        assert!(points.curvatures().iter().any(|k| *k == 0.0));
        // lexicographic ordering by (curvature, axial force)
        for pair in points.points().windows(2) {
            assert!(
                pair[0].curvature < pair[1].curvature
                    || (pair[0].curvature == pair[1].curvature
                        && pair[0].axial_force <= pair[1].axial_force)
            );
        }
    }

    #[test]
    fn test_state_by_interpolation() {
        let mut points = MNKappaCurvePoints::new();
        let anchor = StrainPosition::new(0.001, 0.0, crate::materials::MaterialKind::Steel);
        for (n, delta, m, k) in [
            (0.0, 0.0, 0.0, 0.0),
            (0.0, 0.002, 100.0, 1e-5),
            (1000.0, 0.0, 50.0, 0.0),
            (1000.0, 0.002, 200.0, 3e-5),
        ] {
            points.add(MNKappaCurvePoint {
                moment: m,
                curvature: k,
                axial_force: n,
                strain_difference: delta,
                neutral_axes: (None, None),
                strain_position: anchor,
            });
        }
        // centre of the patch: mean of the four corners
        let (moment, curvature) = points.state_by(500.0, 0.001).unwrap();
        assert_relative_eq!(moment, 87.5);
        assert_relative_eq!(curvature, 1e-5);
        // on an edge
        let (moment, _) = points.state_by(0.0, 0.001).unwrap();
        assert_relative_eq!(moment, 50.0);
        // outside the hull
        assert!(points.state_by(2000.0, 0.001).is_err());
        assert!(points.state_by(500.0, 0.01).is_err());
    }
}
