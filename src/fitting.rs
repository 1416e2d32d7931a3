//! # Damped Gauss-Newton Fitting
//!
//! The slip distribution of a composite beam is found by driving a residual
//! vector f(s) = M_R(s) − M_E to zero. The iteration is a Gauss-Newton
//! scheme with Levenberg damping:
//!
//! ```text
//! (JᵀJ + λ·diag(JᵀJ)) Δ = Jᵀ f(s)
//! s ← s − α·Δ
//! ```
//!
//! J is a forward-difference Jacobian, the inner system is solved by QR
//! decomposition, α is a halving line search, and λ shrinks on accepted
//! steps and grows on rejected ones (or a singular inner system). The run
//! accepts when ‖f‖∞ and ‖Δs‖ drop below their tolerances, or stops on a
//! residual plateau.

use nalgebra::{DMatrix, DVector};

use crate::errors::{CalcError, CalcResult, FailureReason, NotSuccessful};

/// Levenberg-Marquardt configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevenbergMarquardt {
    pub max_iterations: usize,
    /// acceptance bound on ‖f‖∞
    pub residual_tolerance: f64,
    /// acceptance bound on ‖Δs‖
    pub step_tolerance: f64,
    pub max_line_search_iterations: usize,
    /// residual-change plateau below which the run counts as converged
    pub minimum_residual_change: f64,
    /// initial damping λ₀
    pub initial_damping: f64,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            residual_tolerance: 0.1,
            step_tolerance: 0.1,
            max_line_search_iterations: 10,
            minimum_residual_change: 1e-9,
            initial_damping: 1e-3,
        }
    }
}

/// A converged fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub solution: Vec<f64>,
    /// ‖f‖∞ at the solution
    pub residual_norm: f64,
    pub iterations: usize,
}

impl LevenbergMarquardt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerances(mut self, residual: f64, step: f64) -> Self {
        self.residual_tolerance = residual;
        self.step_tolerance = step;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Minimize ‖f(x)‖ starting from `start`.
    pub fn solve(
        &self,
        start: &[f64],
        mut f: impl FnMut(&[f64]) -> CalcResult<Vec<f64>>,
    ) -> Result<FitResult, NotSuccessful> {
        let mut x = DVector::from_column_slice(start);
        let mut fx = DVector::from_vec(f(x.as_slice()).map_err(failure)?);
        if infinity_norm(&fx) < self.residual_tolerance {
            return Ok(FitResult {
                solution: x.as_slice().to_vec(),
                residual_norm: infinity_norm(&fx),
                iterations: 0,
            });
        }
        let mut damping = self.initial_damping;
        for iteration in 1..=self.max_iterations {
            let jacobian = self.forward_jacobian(&mut f, &x, &fx)?;
            let normal = jacobian.transpose() * &jacobian;
            let gradient = jacobian.transpose() * &fx;
            let mut delta = None;
            // a singular inner system stiffens the damping until it solves
            for _ in 0..self.max_line_search_iterations {
                let mut damped = normal.clone();
                for i in 0..damped.nrows() {
                    damped[(i, i)] += damping * normal[(i, i)].abs().max(1e-12);
                }
                match damped.qr().solve(&gradient) {
                    Some(solution) => {
                        delta = Some(solution);
                        break;
                    }
                    None => damping *= 2.0,
                }
            }
            let Some(delta) = delta else {
                return Err(NotSuccessful::new(FailureReason::DegenerateDerivative));
            };
            // halving line search on the euclidean residual
            let mut step_size = 1.0;
            let mut accepted = None;
            for _ in 0..self.max_line_search_iterations {
                let candidate = &x - step_size * &delta;
                let f_candidate =
                    DVector::from_vec(f(candidate.as_slice()).map_err(failure)?);
                if f_candidate.norm() < fx.norm() {
                    accepted = Some((candidate, f_candidate, step_size));
                    break;
                }
                step_size *= 0.5;
            }
            match accepted {
                Some((candidate, f_candidate, step_size)) => {
                    let residual_change = fx.norm() - f_candidate.norm();
                    let step_norm = step_size * delta.norm();
                    x = candidate;
                    fx = f_candidate;
                    damping = (damping * 0.5).max(1e-12);
                    if infinity_norm(&fx) < self.residual_tolerance
                        && step_norm < self.step_tolerance
                    {
                        return Ok(FitResult {
                            solution: x.as_slice().to_vec(),
                            residual_norm: infinity_norm(&fx),
                            iterations: iteration,
                        });
                    }
                    if residual_change.abs() < self.minimum_residual_change {
                        // plateau: more iterations will not improve the fit
                        return Ok(FitResult {
                            solution: x.as_slice().to_vec(),
                            residual_norm: infinity_norm(&fx),
                            iterations: iteration,
                        });
                    }
                }
                None => damping *= 2.0,
            }
        }
        Err(NotSuccessful::new(FailureReason::MaxIterations {
            limit: self.max_iterations,
        }))
    }

    /// forward-difference Jacobian, step proportional to the variable size
    fn forward_jacobian(
        &self,
        f: &mut impl FnMut(&[f64]) -> CalcResult<Vec<f64>>,
        x: &DVector<f64>,
        fx: &DVector<f64>,
    ) -> Result<DMatrix<f64>, NotSuccessful> {
        let rows = fx.len();
        let columns = x.len();
        let mut jacobian = DMatrix::zeros(rows, columns);
        for column in 0..columns {
            let step = 1e-6 * x[column].abs().max(1.0);
            let mut shifted = x.clone();
            shifted[column] += step;
            let f_shifted = DVector::from_vec(f(shifted.as_slice()).map_err(failure)?);
            let derivative = (f_shifted - fx) / step;
            jacobian.set_column(column, &derivative);
        }
        Ok(jacobian)
    }
}

fn infinity_norm(vector: &DVector<f64>) -> f64 {
    vector.iter().map(|v| v.abs()).fold(0.0, f64::max)
}

fn failure(error: CalcError) -> NotSuccessful {
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
        CalcError::OutsideCurveRange { value, .. } => {
            FailureReason::OutsideCurveRange { value }
        }
        _ => FailureReason::DegenerateDerivative,
    };
    NotSuccessful::new(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_system_in_one_iteration() {
        // f(x) = A x - b with A = [[2, 0], [0, 3]], b = [2, 6]
        let solver = LevenbergMarquardt::new().with_tolerances(1e-8, 1e-4);
        let result = solver
            .solve(&[0.0, 0.0], |x| {
                Ok(vec![2.0 * x[0] - 2.0, 3.0 * x[1] - 6.0])
            })
            .unwrap();
        assert_relative_eq!(result.solution[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(result.solution[1], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rosenbrock() {
        // the classic valley, reformulated as a residual vector:
        // f1 = sqrt(2)(1 - x1), f2 = sqrt(200)(x2 - x1^2)
        let solver = LevenbergMarquardt::new()
            .with_tolerances(1e-6, 1e-6)
            .with_max_iterations(200);
        let result = solver
            .solve(&[0.0, -0.1], |x| {
                Ok(vec![
                    2f64.sqrt() * (1.0 - x[0]),
                    200f64.sqrt() * (x[1] - x[0] * x[0]),
                ])
            })
            .unwrap();
        assert_relative_eq!(result.solution[0], 1.0, epsilon = 1e-4);
        assert_relative_eq!(result.solution[1], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_overdetermined_plateau() {
        // three equations, two unknowns: the fit settles on the least-
        // squares plateau instead of failing
        let solver = LevenbergMarquardt::new().with_tolerances(1e-9, 1e-9);
        let result = solver.solve(&[0.0, 0.0], |x| {
            Ok(vec![x[0] - 1.0, x[1] - 1.0, x[0] + x[1] - 2.1])
        });
        assert!(result.is_ok());
    }

    #[test]
    fn test_iteration_cap() {
        let solver = LevenbergMarquardt::new()
            .with_tolerances(1e-12, 1e-12)
            .with_max_iterations(2);
        let result = solver.solve(&[10.0], |x| Ok(vec![x[0].exp() - 1.0]));
        assert!(matches!(
            result,
            Err(NotSuccessful {
                reason: FailureReason::MaxIterations { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_residual_error_propagates() {
        let solver = LevenbergMarquardt::new();
        let result = solver.solve(&[0.0], |_| {
            Err(CalcError::OutsideCurveRange {
                curve: "m-n-kappa surface".to_string(),
                value: 42.0,
            })
        });
        assert!(matches!(
            result,
            Err(NotSuccessful {
                reason: FailureReason::OutsideCurveRange { .. },
                ..
            })
        ));
    }
}
