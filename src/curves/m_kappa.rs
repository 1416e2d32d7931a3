//! # Moment-Curvature Curve
//!
//! The full M-κ curve of a cross-section under full interaction:
//!
//! 1. find the failure curvature - the largest admissible curvature where
//!    at least one section edge sits exactly at its material strain limit,
//! 2. enumerate every material breakpoint the failure state passes through;
//!    each becomes an anchor for one equilibrium solve,
//! 3. solve all anchors (Newton; a failed anchor is retried with plain
//!    bisection and a larger iteration budget),
//! 4. deduplicate, insert the zero point, sort by curvature.
//!
//! Anchors are independent: the solves run on a thread pool and the result
//! is ordered deterministically afterwards. Failed anchors are reported
//! next to the curve, never aborting it.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::crosssection::Crosssection;
use crate::errors::{CalcError, CalcResult, NotSuccessful};
use crate::materials::MaterialKind;
use crate::points::{MKappaByStrainPosition, DEFAULT_AXIAL_FORCE_TOLERANCE};
use crate::solver::SolveMethod;
use crate::strain::{interpolation, StrainPosition};

/// retry budget when the Newton run of an anchor fails
const BISECTION_RETRY_ITERATIONS: usize = 100;

/// One point of a moment-curvature curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MKappaCurvePoint {
    pub moment: f64,
    pub curvature: f64,
    pub neutral_axis: f64,
    /// equilibrium axial force (≈ 0 for pure bending)
    pub axial_force: f64,
    /// anchor that produced this point
    pub strain_position: StrainPosition,
}

impl PartialEq for MKappaCurvePoint {
    fn eq(&self, other: &Self) -> bool {
        self.moment == other.moment
            && self.curvature == other.curvature
            && self.neutral_axis == other.neutral_axis
    }
}

/// Points of a moment-curvature curve, sorted by curvature.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MKappaCurvePoints {
    points: Vec<MKappaCurvePoint>,
}

impl MKappaCurvePoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[MKappaCurvePoint] {
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

    /// largest moment of the curve
    pub fn maximum_moment(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.moment)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Add a point unless an equal one is present, keeping the curvature
    /// ordering.
    pub fn add(&mut self, point: MKappaCurvePoint) {
        if !self.points.contains(&point) {
            self.points.push(point);
            self.sort();
        }
    }

    /// Curvature at the given moment by linear interpolation along the
    /// curve.
    ///
    /// Moments up to 0.1 % beyond the curve maximum are clamped onto it
    /// (they stem from float noise in load stepping); anything further out
    /// is an error - the curve is never extrapolated.
    pub fn curvature_by(&self, moment: f64) -> CalcResult<f64> {
        if (-1e-5..=1e-5).contains(&moment) {
            return Ok(0.0);
        }
        let maximum = self.maximum_moment();
        let minimum = self
            .points
            .iter()
            .map(|p| p.moment)
            .fold(f64::INFINITY, f64::min);
        let moment = if moment > maximum {
            if moment * 0.999 > maximum {
                return Err(CalcError::OutsideCurveRange {
                    curve: "moment-curvature".to_string(),
                    value: moment,
                });
            }
            maximum
        } else if moment < minimum {
            if moment * 0.999 < minimum {
                return Err(CalcError::OutsideCurveRange {
                    curve: "moment-curvature".to_string(),
                    value: moment,
                });
            }
            minimum
        } else {
            moment
        };
        for pair in self.points.windows(2) {
            if pair[0].moment <= moment && moment <= pair[1].moment {
                return Ok(interpolation(
                    moment,
                    (pair[0].moment, pair[0].curvature),
                    (pair[1].moment, pair[1].curvature),
                ));
            }
        }
        Err(CalcError::OutsideCurveRange {
            curve: "moment-curvature".to_string(),
            value: moment,
        })
    }

    fn sort(&mut self) {
        self.points.sort_by(|a, b| {
            a.curvature
                .total_cmp(&b.curvature)
                .then(a.moment.total_cmp(&b.moment))
        });
    }
}

/// A computed curve with its per-anchor failures.
#[derive(Debug, Clone)]
pub struct MKappaCurveResult {
    pub points: MKappaCurvePoints,
    /// anchors that reached no equilibrium, with their reasons
    pub not_successful: Vec<NotSuccessful>,
}

/// Moment-curvature curve generator.
#[derive(Debug, Clone)]
pub struct MKappaCurve<'a> {
    cross_section: &'a Crosssection,
    include_positive_curvature: bool,
    include_negative_curvature: bool,
    tolerance: f64,
}

impl<'a> MKappaCurve<'a> {
    /// Generator for the positive-curvature branch only.
    pub fn new(cross_section: &'a Crosssection) -> Self {
        Self {
            cross_section,
            include_positive_curvature: true,
            include_negative_curvature: false,
            tolerance: DEFAULT_AXIAL_FORCE_TOLERANCE,
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

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Compute the enabled branches.
    pub fn compute(&self) -> CalcResult<MKappaCurveResult> {
        let boundaries = self.cross_section.boundaries()?;
        let mut points = MKappaCurvePoints::new();
        let mut not_successful = Vec::new();
        for (enabled, positive) in [
            (self.include_positive_curvature, true),
            (self.include_negative_curvature, false),
        ] {
            if !enabled {
                continue;
            }
            let boundary = if positive {
                &boundaries.positive
            } else {
                &boundaries.negative
            };
            let start = boundary.maximum_curvature.start;
            let anchors = match self.solve_anchor(boundary, start, positive) {
                Ok(failure_point) => {
                    let anchors = self.cross_section.material_points_inside_curvature(
                        failure_point.curvature,
                        failure_point.neutral_axis,
                    );
                    points.add(failure_point);
                    anchors
                }
                Err(reason) => {
                    not_successful.push(reason);
                    continue;
                }
            };
            let solved: Vec<Result<MKappaCurvePoint, NotSuccessful>> = anchors
                .par_iter()
                .map(|anchor| self.solve_anchor(boundary, *anchor, positive))
                .collect();
            for outcome in solved {
                match outcome {
                    Ok(point) => points.add(point),
                    Err(reason) => not_successful.push(reason),
                }
            }
        }
        // the unloaded state belongs to every curve
        points.add(MKappaCurvePoint {
            moment: 0.0,
            curvature: 0.0,
            neutral_axis: 0.0,
            axial_force: 0.0,
            strain_position: StrainPosition::new(0.0, 0.0, MaterialKind::Custom),
        });
        Ok(MKappaCurveResult {
            points,
            not_successful,
        })
    }

    fn solve_anchor(
        &self,
        boundary: &crate::boundaries::BoundaryValues,
        anchor: StrainPosition,
        positive: bool,
    ) -> Result<MKappaCurvePoint, NotSuccessful> {
        let minimum = boundary.minimum_curvature.compute(anchor);
        let maximum = boundary.maximum_curvature.compute(anchor);
        let newton = MKappaByStrainPosition::new(self.cross_section, anchor, positive)
            .with_curvature_bounds(minimum, maximum)
            .with_tolerance(self.tolerance)
            .solve();
        let solved = match newton {
            Ok(point) => Ok(point),
            Err(_) => MKappaByStrainPosition::new(self.cross_section, anchor, positive)
                .with_curvature_bounds(minimum, maximum)
                .with_tolerance(self.tolerance)
                .with_max_iterations(BISECTION_RETRY_ITERATIONS)
                .with_method(SolveMethod::Bisection)
                .solve(),
        };
        solved.map(|point| MKappaCurvePoint {
            moment: point.moment,
            curvature: point.curvature,
            neutral_axis: point.neutral_axis,
            axial_force: point.axial_force,
            strain_position: anchor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Geometry, Rectangle};
    use crate::materials::concrete::Concrete;
    use crate::materials::steel::Steel;
    use crate::section::Section;
    use approx::assert_relative_eq;

    /// HEB-200-like I-profile: flanges 200x15, web 9.5x170, S355
    fn heb200_s355() -> Crosssection {
        let steel = Steel::new(355.0)
            .unwrap()
            .with_f_u(400.0)
            .with_failure_strain(0.15);
        Crosssection::new(vec![
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
        ])
        .unwrap()
    }

    fn composite_cross_section() -> Crosssection {
        let concrete = Concrete::new(38.0).unwrap();
        let steel = Steel::new(355.0)
            .unwrap()
            .with_f_u(400.0)
            .with_failure_strain(0.15);
        Crosssection::new(vec![
            Section::new(
                Geometry::Rectangle(Rectangle::new(0.0, 100.0, 2000.0).unwrap()),
                concrete.material().unwrap(),
            ),
            Section::new(
                Geometry::Rectangle(Rectangle::new(100.0, 115.0, 200.0).unwrap()),
                steel.material(),
            ),
            Section::new(
                Geometry::Rectangle(Rectangle::new(115.0, 285.0, 9.5).unwrap()),
                steel.material(),
            ),
            Section::new(
                Geometry::Rectangle(Rectangle::new(285.0, 300.0, 200.0).unwrap()),
                steel.material(),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_heb200_plastic_plateau() {
        let cs = heb200_s355();
        let result = MKappaCurve::new(&cs).compute().unwrap();
        let points = result.points;
        assert!(points.len() > 3);
        // plastic moment of the profile:
        // Z = 2*200*15*92.5 + 9.5*170^2/4 = 623,637.5 mm3
        // M_pl = 355*Z = 221.4e6 Nmm; hardening to f_u caps it at 400*Z
        let plastic = 355.0 * 623_637.5;
        let maximum = points.maximum_moment();
        assert!(
            maximum >= 0.95 * plastic && maximum <= 400.0 * 623_637.5,
            "maximum moment {maximum}"
        );
        // curvature strictly monotone along the branch
        for pair in points.points().windows(2) {
            assert!(pair[0].curvature < pair[1].curvature);
        }
        // first yielded point: extreme fibre at f_y/E,
        // kappa = 2*eps_y/200 for the symmetric profile
        let yield_curvature = 2.0 * (355.0 / 210_000.0) / 200.0;
        let elastic: Vec<&MKappaCurvePoint> = points
            .points()
            .iter()
            .filter(|p| p.curvature > 0.0)
            .collect();
        assert_relative_eq!(elastic[0].curvature, yield_curvature, epsilon = 1e-6);
    }

    #[test]
    fn test_heb200_negative_branch_mirrors() {
        let cs = heb200_s355();
        let result = MKappaCurve::new(&cs)
            .include_negative_curvature(true)
            .compute()
            .unwrap();
        let points = result.points;
        let maximum = points.maximum_moment();
        let minimum = points
            .points()
            .iter()
            .map(|p| p.moment)
            .fold(f64::INFINITY, f64::min);
        assert_relative_eq!(maximum, -minimum, epsilon = 1e-3 * maximum);
    }

    #[test]
    fn test_curvature_by_moment_roundtrip() {
        let cs = heb200_s355();
        let result = MKappaCurve::new(&cs).compute().unwrap();
        let points = result.points;
        // on the elastic branch M = E*I*kappa with I = 56.96e6 mm4
        let inertia = 2.0 * (200.0 * 15.0f64.powi(3) / 12.0 + 200.0 * 15.0 * 92.5 * 92.5)
            + 9.5 * 170.0f64.powi(3) / 12.0;
        let moment = 20.0e6;
        let curvature = points.curvature_by(moment).unwrap();
        assert_relative_eq!(curvature, moment / (210_000.0 * inertia), epsilon = 2e-7);
        // beyond the maximum: hard error
        assert!(points.curvature_by(points.maximum_moment() * 1.1).is_err());
        // a hair over the maximum clamps
        assert!(points
            .curvature_by(points.maximum_moment() * 1.0005)
            .is_ok());
    }

    #[test]
    fn test_composite_maximum_moment() {
        let cs = composite_cross_section();
        let result = MKappaCurve::new(&cs).compute().unwrap();
        let points = result.points;
        assert!(!points.is_empty());
        // documented capacity of the slab + HEB 200 example: about 550 kNm
        let maximum = points.maximum_moment();
        assert!(
            maximum > 450.0e6 && maximum < 650.0e6,
            "maximum moment {maximum}"
        );
        // at peak the neutral axis lies near the underside of the slab
        let peak = points
            .points()
            .iter()
            .max_by(|a, b| a.moment.total_cmp(&b.moment))
            .unwrap();
        assert!(
            peak.neutral_axis > 40.0 && peak.neutral_axis < 160.0,
            "neutral axis at peak {}",
            peak.neutral_axis
        );
    }

    #[test]
    fn test_single_point_scenario() {
        // anchor: concrete top fibre at -0.002
        let cs = composite_cross_section();
        let anchor = StrainPosition::new(-0.002, 0.0, MaterialKind::Concrete);
        let point = MKappaByStrainPosition::new(&cs, anchor, true)
            .with_max_iterations(30)
            .solve()
            .unwrap();
        assert!(point.axial_force.abs() < 10.0);
        assert_relative_eq!(point.moment, 5.32e8, epsilon = 0.01 * 5.32e8);
        assert_relative_eq!(point.curvature, 3.27e-5, epsilon = 0.01 * 3.27e-5);
        assert_relative_eq!(point.neutral_axis, 61.2, epsilon = 0.012 * 61.2);
    }

    #[test]
    fn test_points_reproduce_on_reevaluation() {
        // evaluating the cross-section at a point's (kappa, z_n) must give
        // back the point's moment and axial force
        let cs = heb200_s355();
        let result = MKappaCurve::new(&cs).compute().unwrap();
        for point in result.points.points().iter().filter(|p| p.curvature > 0.0) {
            let computed = cs
                .computed_under_curvature(point.curvature, point.neutral_axis)
                .unwrap();
            assert_relative_eq!(computed.total_moment(), point.moment, epsilon = 1e-6);
            assert_relative_eq!(
                computed.total_axial_force(),
                point.axial_force,
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn test_failed_anchors_reported_not_fatal() {
        // concrete-only cross-section: plenty of tension anchors cannot
        // balance, the curve must still come out
        let concrete = Concrete::new(30.0).unwrap();
        let cs = Crosssection::new(vec![Section::new(
            Geometry::Rectangle(Rectangle::new(0.0, 100.0, 500.0).unwrap()),
            concrete.material().unwrap(),
        )])
        .unwrap();
        let result = MKappaCurve::new(&cs).compute().unwrap();
        assert!(!result.points.is_empty());
    }
}
