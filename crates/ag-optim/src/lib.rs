//! # ag-optim
//!
//! Bound-constrained numeric optimization routines behind the driver's
//! [`OptimizerBackend`] seam: SLSQP, CG, BFGS, and POWELL. Each routine
//! consumes the same (objective, run) contract, caps work at the iteration
//! budget, and never evaluates outside the bound box.

mod cg;
mod linesearch;
mod powell;
mod quasi_newton;

use ag_driver::{Objective, OptimizerBackend, OptimizerOutcome, OptimizerRun};
use ag_types::DriverResult;

use crate::quasi_newton::Criterion;

/// In-process implementation of the four optimization routines.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumericBackend;

impl NumericBackend {
    pub fn new() -> Self {
        Self
    }
}

impl OptimizerBackend for NumericBackend {
    /// Sequential quadratic programming specialized to the box constraints
    /// this layer sees (general constraints belong to the toolkit).
    /// Converges on objective decrease.
    fn slsqp(
        &self,
        objective: &mut dyn Objective,
        run: &OptimizerRun,
    ) -> DriverResult<OptimizerOutcome> {
        quasi_newton::quasi_newton(objective, run, Criterion::ObjectiveDecrease)
    }

    /// Polak-Ribiere nonlinear conjugate gradient.
    fn cg(
        &self,
        objective: &mut dyn Objective,
        run: &OptimizerRun,
    ) -> DriverResult<OptimizerOutcome> {
        cg::conjugate_gradient(objective, run)
    }

    /// Inverse-Hessian BFGS with a projected line search. Converges on the
    /// projected-gradient norm.
    fn bfgs(
        &self,
        objective: &mut dyn Objective,
        run: &OptimizerRun,
    ) -> DriverResult<OptimizerOutcome> {
        quasi_newton::quasi_newton(objective, run, Criterion::Gradient)
    }

    /// Derivative-free direction-set method.
    fn powell(
        &self,
        objective: &mut dyn Objective,
        run: &OptimizerRun,
    ) -> DriverResult<OptimizerOutcome> {
        powell::powell(objective, run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ag_types::BoundPair;

    /// Quadratic bowl centered at `center`, recording every evaluation point.
    struct Quadratic {
        center: Vec<f64>,
        calls: Vec<Vec<f64>>,
    }

    impl Quadratic {
        fn new(center: Vec<f64>) -> Self {
            Self {
                center,
                calls: Vec::new(),
            }
        }
    }

    impl Objective for Quadratic {
        fn eval(&mut self, x: &[f64]) -> DriverResult<(f64, Vec<f64>)> {
            self.calls.push(x.to_vec());
            let f = x
                .iter()
                .zip(&self.center)
                .map(|(xi, ci)| (xi - ci) * (xi - ci))
                .sum();
            let g = x
                .iter()
                .zip(&self.center)
                .map(|(xi, ci)| 2.0 * (xi - ci))
                .collect();
            Ok((f, g))
        }
    }

    /// Quartic bowl: smooth but never reached exactly, for budget tests.
    struct Quartic;

    impl Objective for Quartic {
        fn eval(&mut self, x: &[f64]) -> DriverResult<(f64, Vec<f64>)> {
            let f = x.iter().map(|xi| (xi - 0.3_f64).powi(4)).sum();
            let g = x.iter().map(|xi| 4.0 * (xi - 0.3_f64).powi(3)).collect();
            Ok((f, g))
        }
    }

    fn interior_run(n: usize) -> OptimizerRun {
        OptimizerRun {
            x0: vec![0.0; n],
            bounds: vec![BoundPair::new(-1.0, 1.0); n],
            max_iterations: 200,
            accuracy: 1e-8,
        }
    }

    fn assert_near(actual: &[f64], expected: &[f64], tol: f64) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < tol, "got {actual:?}, expected {expected:?}");
        }
    }

    #[test]
    fn bfgs_finds_an_interior_minimum() {
        let mut objective = Quadratic::new(vec![0.3, -0.2, 0.5]);
        let outcome = NumericBackend::new()
            .bfgs(&mut objective, &interior_run(3))
            .unwrap();

        assert!(outcome.converged);
        assert_near(&outcome.best_design, &[0.3, -0.2, 0.5], 1e-4);
        assert!(outcome.best_objective < 1e-8);
    }

    #[test]
    fn slsqp_finds_an_interior_minimum() {
        let mut objective = Quadratic::new(vec![0.25, 0.4]);
        let outcome = NumericBackend::new()
            .slsqp(&mut objective, &interior_run(2))
            .unwrap();

        assert!(outcome.converged);
        assert_near(&outcome.best_design, &[0.25, 0.4], 1e-3);
    }

    #[test]
    fn cg_finds_an_interior_minimum() {
        let mut objective = Quadratic::new(vec![-0.35, 0.15, 0.6, -0.1]);
        let outcome = NumericBackend::new()
            .cg(&mut objective, &interior_run(4))
            .unwrap();

        assert!(outcome.converged);
        assert_near(&outcome.best_design, &[-0.35, 0.15, 0.6, -0.1], 1e-4);
    }

    #[test]
    fn powell_finds_an_interior_minimum_without_gradients() {
        let mut objective = Quadratic::new(vec![0.25, -0.4]);
        let mut run = interior_run(2);
        run.accuracy = 1e-10;
        let outcome = NumericBackend::new().powell(&mut objective, &run).unwrap();

        assert!(outcome.converged);
        assert_near(&outcome.best_design, &[0.25, -0.4], 1e-3);
    }

    #[test]
    fn bfgs_lands_on_the_active_bound_for_an_exterior_minimum() {
        // The unconstrained minimum (2, 2) sits outside the box, so the
        // constrained minimizer is the corner (1, 1).
        let mut objective = Quadratic::new(vec![2.0, 2.0]);
        let outcome = NumericBackend::new()
            .bfgs(&mut objective, &interior_run(2))
            .unwrap();

        assert!(outcome.converged);
        assert_near(&outcome.best_design, &[1.0, 1.0], 1e-6);
    }

    #[test]
    fn no_routine_evaluates_outside_the_bounds() {
        let run = OptimizerRun {
            x0: vec![0.0; 2],
            bounds: vec![BoundPair::new(-0.5, 0.5), BoundPair::new(-0.25, 0.75)],
            max_iterations: 50,
            accuracy: 1e-8,
        };
        let backend = NumericBackend::new();

        type Routine = fn(
            &NumericBackend,
            &mut dyn Objective,
            &OptimizerRun,
        ) -> DriverResult<OptimizerOutcome>;
        let routines: [Routine; 4] = [
            NumericBackend::slsqp,
            NumericBackend::cg,
            NumericBackend::bfgs,
            NumericBackend::powell,
        ];

        for routine in routines {
            let mut objective = Quadratic::new(vec![3.0, -3.0]);
            routine(&backend, &mut objective, &run).unwrap();
            for call in &objective.calls {
                for (v, b) in call.iter().zip(&run.bounds) {
                    assert!(b.contains(*v), "evaluated {call:?} outside {b:?}");
                }
            }
        }
    }

    #[test]
    fn iteration_budget_is_honored() {
        let run = OptimizerRun {
            x0: vec![0.0; 2],
            bounds: vec![BoundPair::new(-1.0, 1.0); 2],
            max_iterations: 5,
            accuracy: 1e-300,
        };

        let mut objective = Quartic;
        let outcome = NumericBackend::new().bfgs(&mut objective, &run).unwrap();
        assert!(outcome.iterations <= 5);
        assert!(!outcome.converged);

        let mut objective = Quartic;
        let outcome = NumericBackend::new().cg(&mut objective, &run).unwrap();
        assert!(outcome.iterations <= 5);
    }

    /// Flat objective with a fabricated nonzero gradient: every descent
    /// direction exists but no step ever achieves sufficient decrease.
    struct Plateau;

    impl Objective for Plateau {
        fn eval(&mut self, x: &[f64]) -> DriverResult<(f64, Vec<f64>)> {
            Ok((1.0, vec![1.0; x.len()]))
        }
    }

    #[test]
    fn stalled_line_search_counts_no_iterations() {
        let run = interior_run(2);
        let backend = NumericBackend::new();

        let mut objective = Plateau;
        let outcome = backend.bfgs(&mut objective, &run).unwrap();
        assert_eq!(outcome.iterations, 0);
        assert!(!outcome.converged);
        assert_eq!(outcome.best_objective, 1.0);

        let mut objective = Plateau;
        let outcome = backend.cg(&mut objective, &run).unwrap();
        assert_eq!(outcome.iterations, 0);
        assert!(!outcome.converged);
    }

    #[test]
    fn zero_budget_returns_the_projected_start() {
        let run = OptimizerRun {
            x0: vec![2.0, -2.0],
            bounds: vec![BoundPair::new(-1.0, 1.0); 2],
            max_iterations: 0,
            accuracy: 1e-8,
        };
        let mut objective = Quadratic::new(vec![0.0, 0.0]);
        let outcome = NumericBackend::new().bfgs(&mut objective, &run).unwrap();

        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.best_design, vec![1.0, -1.0]);
    }
}
