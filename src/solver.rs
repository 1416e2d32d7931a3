//! # Scalar Equilibrium Solver
//!
//! All equilibrium problems reduce to a scalar root find: vary one quantity
//! (neutral axis, curvature anchor, uniform strain) until the axial-force
//! residual vanishes. The solver is a small state machine:
//!
//! 1. evaluate the residual at both variable bounds; same sign means no
//!    root is bracketed and the run fails immediately,
//! 2. iterate Newton steps whose derivative is a finite difference over the
//!    two best iterates so far,
//! 3. fall back to bisection between the best bracketing pair whenever the
//!    Newton step degenerates (non-finite or zero derivative, repeated
//!    iterate, step outside the bounds, residual not improving),
//! 4. stop on |residual| below tolerance, or fail after the iteration
//!    budget.
//!
//! Residual evaluation happens through a caller closure; the solver never
//! sees cross-sections.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult, FailureReason};

/// One residual evaluation of a solver run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub variable: f64,
    pub residual: f64,
}

/// Lifecycle of a solver run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SolverStatus {
    NotStarted,
    Iterating,
    Converged,
    Failed(FailureReason),
}

/// Root-finding strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SolveMethod {
    /// Newton with finite-difference derivative, bisection fallback
    #[default]
    Newton,
    /// plain bisection between the best bracketing pair
    Bisection,
}

/// A converged root.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedRoot {
    /// variable value satisfying the residual tolerance
    pub variable: f64,
    /// residual at the solution
    pub residual: f64,
    /// number of residual evaluations
    pub iterations: usize,
    /// full evaluation history
    pub records: Vec<IterationRecord>,
    /// final state of the run (always `Converged` on the `Ok` side)
    pub status: SolverStatus,
}

/// Scalar root finder over a bounded variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarSolver {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub method: SolveMethod,
}

impl ScalarSolver {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
            method: SolveMethod::Newton,
        }
    }

    pub fn with_method(mut self, method: SolveMethod) -> Self {
        self.method = method;
        self
    }

    /// Find the root of `residual` between `lower` and `upper`.
    ///
    /// `variable` names the unknown in failure reports.
    pub fn solve(
        &self,
        lower: f64,
        upper: f64,
        mut residual: impl FnMut(f64) -> CalcResult<f64>,
        variable: &str,
    ) -> Result<SolvedRoot, FailureReason> {
        let mut records: Vec<IterationRecord> = Vec::new();
        for bound in [lower, upper] {
            let value = residual(bound).map_err(failure_from)?;
            records.push(IterationRecord {
                variable: bound,
                residual: value,
            });
            if value.abs() < self.tolerance {
                return Ok(converged(records));
            }
        }
        if records[0].residual * records[1].residual > 0.0 {
            return Err(FailureReason::NoBracketingPair {
                variable: variable.to_string(),
            });
        }
        for _ in 0..self.max_iterations {
            let guess = match self.method {
                SolveMethod::Newton => self
                    .newton_guess(&records, lower, upper)
                    .or_else(|| bisection_guess(&records)),
                SolveMethod::Bisection => bisection_guess(&records),
            };
            let Some(next) = guess else {
                return Err(FailureReason::DegenerateDerivative);
            };
            let value = residual(next).map_err(failure_from)?;
            records.push(IterationRecord {
                variable: next,
                residual: value,
            });
            if value.abs() < self.tolerance {
                return Ok(converged(records));
            }
        }
        Err(FailureReason::MaxIterations {
            limit: self.max_iterations,
        })
    }

    /// Newton step from the two iterates with the smallest residuals; the
    /// derivative is their finite difference.
    fn newton_guess(
        &self,
        records: &[IterationRecord],
        lower: f64,
        upper: f64,
    ) -> Option<f64> {
        // once past the bound evaluations, a residual that stopped
        // improving hands over to bisection
        if records.len() > 2 {
            let last = records[records.len() - 1].residual.abs();
            let before = records[records.len() - 2].residual.abs();
            if last >= before {
                return None;
            }
        }
        let mut sorted: Vec<&IterationRecord> = records.iter().collect();
        sorted.sort_by(|a, b| a.residual.abs().total_cmp(&b.residual.abs()));
        let best = sorted[0];
        let second = sorted.iter().skip(1).find(|r| r.variable != best.variable)?;
        let derivative =
            (second.residual - best.residual) / (second.variable - best.variable);
        if !derivative.is_finite() || derivative == 0.0 {
            return None;
        }
        let next = best.variable - best.residual / derivative;
        if !next.is_finite() || next < lower.min(upper) || next > lower.max(upper) {
            return None;
        }
        // a repeated iterate would loop forever
        let step_scale = 1e-12 * next.abs().max(1.0);
        if records
            .iter()
            .any(|r| (r.variable - next).abs() < step_scale)
        {
            return None;
        }
        Some(next)
    }
}

/// Midpoint between the records closest to the root from either side.
///
/// Residual plateaus produce ties; among tied candidates the pair with the
/// smallest variable distance keeps the bracket shrinking.
fn bisection_guess(records: &[IterationRecord]) -> Option<f64> {
    let smallest_over = records
        .iter()
        .filter(|r| r.residual > 0.0)
        .map(|r| r.residual)
        .fold(f64::INFINITY, f64::min);
    let largest_under = records
        .iter()
        .filter(|r| r.residual < 0.0)
        .map(|r| r.residual)
        .fold(f64::NEG_INFINITY, f64::max);
    if !smallest_over.is_finite() || !largest_under.is_finite() {
        return None;
    }
    let mut best: Option<(f64, f64)> = None;
    for over in records.iter().filter(|r| r.residual == smallest_over) {
        for under in records.iter().filter(|r| r.residual == largest_under) {
            let distance = (over.variable - under.variable).abs();
            let midpoint = 0.5 * (over.variable + under.variable);
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, midpoint));
            }
        }
    }
    let (_, midpoint) = best?;
    if records.iter().any(|r| r.variable == midpoint) {
        return None;
    }
    Some(midpoint)
}

fn converged(records: Vec<IterationRecord>) -> SolvedRoot {
    let last = records[records.len() - 1];
    SolvedRoot {
        variable: last.variable,
        residual: last.residual,
        iterations: records.len(),
        records,
        status: SolverStatus::Converged,
    }
}

fn failure_from(error: CalcError) -> FailureReason {
    match error {
        CalcError::StrainOutOfRange {
            strain,
            minimum,
            maximum,
        } => FailureReason::StrainOutOfRange {
            strain,
            minimum,
            maximum,
        },
        // bounds keep the residual inside the admissible strain band, so
        // any other evaluation error marks a degenerate run
        _ => FailureReason::DegenerateDerivative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_residual_converges_in_one_step() {
        let solver = ScalarSolver::new(10, 1e-9);
        let root = solver
            .solve(-10.0, 10.0, |x| Ok(2.0 * x - 3.0), "x")
            .unwrap();
        assert_relative_eq!(root.variable, 1.5, epsilon = 1e-9);
        assert!(root.iterations <= 3);
    }

    #[test]
    fn test_nonlinear_residual() {
        let solver = ScalarSolver::new(30, 1e-9);
        let root = solver
            .solve(0.0, 3.0, |x| Ok(x * x - 2.0), "x")
            .unwrap();
        assert_relative_eq!(root.variable, 2f64.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_no_bracketing_pair() {
        let solver = ScalarSolver::new(10, 1e-9);
        let result = solver.solve(1.0, 2.0, |x| Ok(x * x + 1.0), "x");
        assert!(matches!(
            result,
            Err(FailureReason::NoBracketingPair { .. })
        ));
    }

    #[test]
    fn test_max_iterations() {
        let solver = ScalarSolver::new(2, 1e-15).with_method(SolveMethod::Bisection);
        let result = solver.solve(0.0, 3.0, |x| Ok(x.powi(7) - 2.0), "x");
        assert!(matches!(result, Err(FailureReason::MaxIterations { .. })));
    }

    #[test]
    fn test_bisection_handles_flat_regions() {
        // plateau around the root defeats the secant step; bisection closes in
        let solver = ScalarSolver::new(60, 1e-6);
        let root = solver
            .solve(-4.0, 8.0, |x| {
                Ok(if x < 1.0 {
                    -1.0
                } else if x > 2.0 {
                    1.0
                } else {
                    2.0 * (x - 1.5)
                })
            }, "x")
            .unwrap();
        assert!(root.variable > 1.0 && root.variable < 2.0);
    }

    #[test]
    fn test_residual_error_is_reported() {
        let solver = ScalarSolver::new(10, 1e-9);
        let result = solver.solve(
            -1.0,
            1.0,
            |_| {
                Err(CalcError::StrainOutOfRange {
                    strain: 0.2,
                    minimum: -0.15,
                    maximum: 0.15,
                })
            },
            "strain",
        );
        assert!(matches!(
            result,
            Err(FailureReason::StrainOutOfRange { .. })
        ));
    }

    #[test]
    fn test_tolerance_met_at_bound() {
        let solver = ScalarSolver::new(10, 0.5);
        let root = solver.solve(0.0, 5.0, |x| Ok(x - 0.1), "x").unwrap();
        assert_relative_eq!(root.variable, 0.0);
        assert_eq!(root.iterations, 1);
    }
}
