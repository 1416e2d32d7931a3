//! # Equilibrium Points
//!
//! Each type here states one equilibrium problem over a cross-section and
//! solves it with the scalar root finder:
//!
//! - [`MKappaByStrainPosition`] - hold a (strain, position) anchor, vary
//!   the neutral axis; the curvature follows from the anchor,
//!   κ(z_n) = ε₀/(z₀ − z_n)
//! - [`MKappaByConstantCurvature`] - hold the curvature, vary the neutral
//!   axis
//! - [`MNByStrain`] - zero curvature, vary the uniform strain until the
//!   applied axial force is reached
//! - [`MomentAxialForce`] - two sub-cross-sections at zero curvature, +N on
//!   the first and −N on the second
//! - [`MomentAxialForceCurvature`] - two sub-cross-sections under a common
//!   curvature with opposite axial forces
//!
//! A run that cannot reach equilibrium returns a [`NotSuccessful`] value
//! instead of a point; curve generators collect these per anchor.

use serde::{Deserialize, Serialize};

use crate::crosssection::Crosssection;
use crate::errors::{CalcError, FailureReason, NotSuccessful};
use crate::solver::{ScalarSolver, SolveMethod};
use crate::strain::{curvature, neutral_axis, strain, StrainPosition};

/// default |ΣN − N_applied| tolerance in N
pub const DEFAULT_AXIAL_FORCE_TOLERANCE: f64 = 10.0;
/// default iteration budget of a single equilibrium solve
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// A converged moment-curvature state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MKappaPoint {
    pub moment: f64,
    pub curvature: f64,
    pub neutral_axis: f64,
    /// axial force at the solution, within tolerance of the applied one
    pub axial_force: f64,
}

/// A converged uniform-strain state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MNStrainPoint {
    pub strain: f64,
    pub axial_force: f64,
    pub moment: f64,
}

/// A converged composite zero-curvature state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MNPoint {
    pub moment: f64,
    /// axial force on the first sub-cross-section (−N acts on the second)
    pub axial_force: f64,
    /// ε₁ − ε₂ between the sub-cross-sections
    pub strain_difference: f64,
    /// uniform strains of the two sub-cross-sections
    pub strains: (f64, f64),
}

/// A converged composite curvature state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MNKappaPoint {
    pub moment: f64,
    pub curvature: f64,
    /// axial force on the first sub-cross-section (−N acts on the second)
    pub axial_force: f64,
    /// strain difference at the reference depth z = 0
    pub strain_difference: f64,
    /// neutral axes of the two sub-cross-sections
    pub neutral_axes: (f64, f64),
    /// anchor the first sub-cross-section was solved from
    pub strain_position: StrainPosition,
}

fn failure(anchor: Option<StrainPosition>, reason: FailureReason) -> NotSuccessful {
    match anchor {
        Some(anchor) => NotSuccessful::at(reason, anchor),
        None => NotSuccessful::new(reason),
    }
}

fn failure_from_error(anchor: Option<StrainPosition>, error: CalcError) -> NotSuccessful {
    let reason = match error {
        CalcError::StrainOutOfRange {
            strain,
            minimum,
            maximum,
        } => FailureReason::StrainOutOfRange {
            strain,
            minimum,
            maximum,
        },
        _ => FailureReason::DegenerateDerivative,
    };
    failure(anchor, reason)
}

/// M-κ point from a fixed strain anchor; the neutral axis is the unknown.
#[derive(Debug, Clone)]
pub struct MKappaByStrainPosition<'a> {
    cross_section: &'a Crosssection,
    strain_position: StrainPosition,
    positive_curvature: bool,
    curvature_bounds: Option<(f64, f64)>,
    applied_axial_force: f64,
    max_iterations: usize,
    tolerance: f64,
    method: SolveMethod,
}

impl<'a> MKappaByStrainPosition<'a> {
    pub fn new(
        cross_section: &'a Crosssection,
        strain_position: StrainPosition,
        positive_curvature: bool,
    ) -> Self {
        Self {
            cross_section,
            strain_position,
            positive_curvature,
            curvature_bounds: None,
            applied_axial_force: 0.0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_AXIAL_FORCE_TOLERANCE,
            method: SolveMethod::Newton,
        }
    }

    /// Reuse externally computed (minimum, maximum) curvature bounds
    /// instead of deriving them from the cross-section boundaries.
    pub fn with_curvature_bounds(mut self, minimum: f64, maximum: f64) -> Self {
        self.curvature_bounds = Some((minimum, maximum));
        self
    }

    pub fn with_applied_axial_force(mut self, axial_force: f64) -> Self {
        self.applied_axial_force = axial_force;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_method(mut self, method: SolveMethod) -> Self {
        self.method = method;
        self
    }

    pub fn solve(&self) -> Result<MKappaPoint, NotSuccessful> {
        let anchor = self.strain_position;
        if anchor.strain == 0.0 {
            return Err(failure(
                Some(anchor),
                FailureReason::StrainOutOfRange {
                    strain: 0.0,
                    minimum: self.cross_section.maximum_negative_strain(),
                    maximum: self.cross_section.maximum_positive_strain(),
                },
            ));
        }
        let (minimum_curvature, maximum_curvature) = match self.curvature_bounds {
            Some(bounds) => bounds,
            None => {
                let boundaries = self
                    .cross_section
                    .boundaries()
                    .map_err(|e| failure_from_error(Some(anchor), e))?;
                let values = if self.positive_curvature {
                    &boundaries.positive
                } else {
                    &boundaries.negative
                };
                (
                    values.minimum_curvature.compute(anchor),
                    values.maximum_curvature.compute(anchor),
                )
            }
        };
        if maximum_curvature == 0.0 {
            // the anchor strain exceeds every admissible distribution
            return Err(failure(
                Some(anchor),
                FailureReason::StrainOutOfRange {
                    strain: anchor.strain,
                    minimum: self.cross_section.maximum_negative_strain(),
                    maximum: self.cross_section.maximum_positive_strain(),
                },
            ));
        }
        let axis_at = |kappa: f64| neutral_axis(anchor.strain, kappa, anchor.position);
        let bound_a = axis_at(minimum_curvature);
        let bound_b = axis_at(maximum_curvature);
        let solver = ScalarSolver::new(self.max_iterations, self.tolerance)
            .with_method(self.method);
        let root = solver
            .solve(
                bound_a.min(bound_b),
                bound_a.max(bound_b),
                |axis| {
                    let kappa = curvature(axis, anchor.position, anchor.strain);
                    Ok(self
                        .cross_section
                        .computed_under_curvature(kappa, axis)?
                        .total_axial_force()
                        - self.applied_axial_force)
                },
                "neutral-axis",
            )
            .map_err(|reason| failure(Some(anchor), reason))?;
        let kappa = curvature(root.variable, anchor.position, anchor.strain);
        let computed = self
            .cross_section
            .computed_under_curvature(kappa, root.variable)
            .map_err(|e| failure_from_error(Some(anchor), e))?;
        Ok(MKappaPoint {
            moment: computed.total_moment(),
            curvature: kappa,
            neutral_axis: root.variable,
            axial_force: computed.total_axial_force(),
        })
    }
}

/// M-κ point at a prescribed curvature; the neutral axis is the unknown.
#[derive(Debug, Clone)]
pub struct MKappaByConstantCurvature<'a> {
    cross_section: &'a Crosssection,
    applied_curvature: f64,
    applied_axial_force: f64,
    axis_bounds: Option<(f64, f64)>,
    max_iterations: usize,
    tolerance: f64,
    method: SolveMethod,
}

impl<'a> MKappaByConstantCurvature<'a> {
    pub fn new(
        cross_section: &'a Crosssection,
        applied_curvature: f64,
        applied_axial_force: f64,
    ) -> Self {
        Self {
            cross_section,
            applied_curvature,
            applied_axial_force,
            axis_bounds: None,
            max_iterations: 20,
            tolerance: DEFAULT_AXIAL_FORCE_TOLERANCE,
            method: SolveMethod::Newton,
        }
    }

    pub fn with_axis_bounds(mut self, minimum: f64, maximum: f64) -> Self {
        self.axis_bounds = Some((minimum, maximum));
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_method(mut self, method: SolveMethod) -> Self {
        self.method = method;
        self
    }

    pub fn solve(&self) -> Result<MKappaPoint, NotSuccessful> {
        let (bound_a, bound_b) = match self.axis_bounds {
            Some(bounds) => bounds,
            None => {
                let boundaries = self
                    .cross_section
                    .boundaries()
                    .map_err(|e| failure_from_error(None, e))?;
                boundaries.neutral_axes.compute(self.applied_curvature)
            }
        };
        let solver = ScalarSolver::new(self.max_iterations, self.tolerance)
            .with_method(self.method);
        let root = solver
            .solve(
                bound_a.min(bound_b),
                bound_a.max(bound_b),
                |axis| {
                    Ok(self
                        .cross_section
                        .computed_under_curvature(self.applied_curvature, axis)?
                        .total_axial_force()
                        - self.applied_axial_force)
                },
                "neutral-axis",
            )
            .map_err(|reason| failure(None, reason))?;
        let computed = self
            .cross_section
            .computed_under_curvature(self.applied_curvature, root.variable)
            .map_err(|e| failure_from_error(None, e))?;
        Ok(MKappaPoint {
            moment: computed.total_moment(),
            curvature: self.applied_curvature,
            neutral_axis: root.variable,
            axial_force: computed.total_axial_force(),
        })
    }
}

/// Uniform strain balancing an applied axial force (the κ = 0 problem).
#[derive(Debug, Clone)]
pub struct MNByStrain<'a> {
    cross_section: &'a Crosssection,
    applied_axial_force: f64,
    max_iterations: usize,
    tolerance: f64,
}

impl<'a> MNByStrain<'a> {
    pub fn new(cross_section: &'a Crosssection, applied_axial_force: f64) -> Self {
        Self {
            cross_section,
            applied_axial_force,
            max_iterations: 20,
            tolerance: DEFAULT_AXIAL_FORCE_TOLERANCE,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn solve(&self) -> Result<MNStrainPoint, NotSuccessful> {
        let lower = self
            .cross_section
            .decisive_maximum_negative_strain_position()
            .strain;
        let upper = self
            .cross_section
            .decisive_maximum_positive_strain_position()
            .strain;
        let solver = ScalarSolver::new(self.max_iterations, self.tolerance);
        let root = solver
            .solve(
                lower,
                upper,
                |strain_value| {
                    Ok(self
                        .cross_section
                        .computed_under_constant_strain(strain_value)?
                        .total_axial_force()
                        - self.applied_axial_force)
                },
                "strain",
            )
            .map_err(|reason| failure(None, reason))?;
        let computed = self
            .cross_section
            .computed_under_constant_strain(root.variable)
            .map_err(|e| failure_from_error(None, e))?;
        Ok(MNStrainPoint {
            strain: root.variable,
            axial_force: computed.total_axial_force(),
            moment: computed.total_moment(),
        })
    }
}

/// Composite zero-curvature point: +N on the first sub-cross-section, −N
/// on the second, both under uniform strain.
#[derive(Debug, Clone)]
pub struct MomentAxialForce<'a> {
    sub_cross_sections: (&'a Crosssection, &'a Crosssection),
    tolerance: f64,
}

impl<'a> MomentAxialForce<'a> {
    pub fn new(sub_cross_sections: (&'a Crosssection, &'a Crosssection)) -> Self {
        Self {
            sub_cross_sections,
            tolerance: DEFAULT_AXIAL_FORCE_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Apply a uniform strain to the first sub-cross-section; its axial
    /// force is then balanced on the second.
    pub fn solve_by_strain(&self, strain_value: f64) -> Result<MNPoint, NotSuccessful> {
        let first = self
            .sub_cross_sections
            .0
            .computed_under_constant_strain(strain_value)
            .map_err(|e| failure_from_error(None, e))?;
        let axial_force = first.total_axial_force();
        let second = MNByStrain::new(self.sub_cross_sections.1, -axial_force)
            .with_tolerance(self.tolerance)
            .solve()?;
        Ok(MNPoint {
            moment: first.total_moment() + second.moment,
            axial_force,
            strain_difference: strain_value - second.strain,
            strains: (strain_value, second.strain),
        })
    }

    /// Apply an axial force: +N on the first sub-cross-section, −N on the
    /// second.
    pub fn solve_by_axial_force(&self, axial_force: f64) -> Result<MNPoint, NotSuccessful> {
        let first = MNByStrain::new(self.sub_cross_sections.0, axial_force)
            .with_tolerance(self.tolerance)
            .solve()?;
        let second = MNByStrain::new(self.sub_cross_sections.1, -axial_force)
            .with_tolerance(self.tolerance)
            .solve()?;
        Ok(MNPoint {
            moment: first.moment + second.moment,
            axial_force,
            strain_difference: first.strain - second.strain,
            strains: (first.strain, second.strain),
        })
    }
}

/// Composite curvature point: the first sub-cross-section is solved from a
/// strain anchor under +N, the second follows the resulting curvature
/// under −N.
#[derive(Debug, Clone)]
pub struct MomentAxialForceCurvature<'a> {
    sub_cross_sections: (&'a Crosssection, &'a Crosssection),
    axial_force: f64,
    strain_position: StrainPosition,
    positive_curvature: bool,
}

impl<'a> MomentAxialForceCurvature<'a> {
    pub fn new(
        sub_cross_sections: (&'a Crosssection, &'a Crosssection),
        axial_force: f64,
        strain_position: StrainPosition,
        positive_curvature: bool,
    ) -> Self {
        Self {
            sub_cross_sections,
            axial_force,
            strain_position,
            positive_curvature,
        }
    }

    pub fn solve(&self) -> Result<MNKappaPoint, NotSuccessful> {
        let first = MKappaByStrainPosition::new(
            self.sub_cross_sections.0,
            self.strain_position,
            self.positive_curvature,
        )
        .with_applied_axial_force(self.axial_force)
        .solve()?;
        let second = MKappaByConstantCurvature::new(
            self.sub_cross_sections.1,
            first.curvature,
            -self.axial_force,
        )
        .solve()?;
        let strain_first = strain(first.neutral_axis, first.curvature, 0.0);
        let strain_second = strain(second.neutral_axis, second.curvature, 0.0);
        Ok(MNKappaPoint {
            moment: first.moment + second.moment,
            curvature: first.curvature,
            axial_force: self.axial_force,
            strain_difference: strain_first - strain_second,
            neutral_axes: (first.neutral_axis, second.neutral_axis),
            strain_position: self.strain_position,
        })
    }
}
