//! Quasi-Newton core shared by the BFGS and SLSQP routines.

use ag_driver::{Objective, OptimizerOutcome, OptimizerRun};
use ag_types::DriverResult;
use tracing::debug;

use crate::linesearch::{
    armijo_projected, dot, eval_with_gradient, project, projected_gradient_norm,
};

/// Which convergence test ends the run.
pub(crate) enum Criterion {
    /// Projected-gradient norm below the accuracy (BFGS).
    Gradient,
    /// Objective decrease below the accuracy (SLSQP).
    ObjectiveDecrease,
}

pub(crate) fn quasi_newton(
    objective: &mut dyn Objective,
    run: &OptimizerRun,
    criterion: Criterion,
) -> DriverResult<OptimizerOutcome> {
    let bounds = &run.bounds;
    let mut x = project(&run.x0, bounds);
    let (mut fx, mut g) = eval_with_gradient(objective, &x)?;

    let mut best_x = x.clone();
    let mut best_f = fx;
    let mut h = identity(x.len());
    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..run.max_iterations {
        if projected_gradient_norm(&x, &g, bounds) <= run.accuracy {
            converged = true;
            break;
        }
        let direction: Vec<f64> = h.iter().map(|row| -dot(row, &g)).collect();
        let Some(step) = armijo_projected(objective, &x, fx, &g, &direction, bounds)? else {
            break;
        };
        // Counted only once the line search accepted a step, so a stalled
        // sweep does not inflate the reported iteration count.
        iterations += 1;

        let s: Vec<f64> = step.x.iter().zip(&x).map(|(a, b)| a - b).collect();
        let y: Vec<f64> = step.gradient.iter().zip(&g).map(|(a, b)| a - b).collect();
        update_inverse_hessian(&mut h, &s, &y);

        let decrease = fx - step.fx;
        x = step.x;
        fx = step.fx;
        g = step.gradient;
        if fx < best_f {
            best_f = fx;
            best_x = x.clone();
        }

        if matches!(criterion, Criterion::ObjectiveDecrease) && decrease.abs() <= run.accuracy {
            converged = true;
            break;
        }
    }

    debug!(
        "Quasi-Newton stopped after {} iterations (converged: {}, best {:.6e})",
        iterations, converged, best_f
    );
    Ok(OptimizerOutcome {
        best_design: best_x,
        best_objective: best_f,
        iterations,
        converged,
    })
}

fn identity(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}

/// Standard inverse BFGS update, skipped when the curvature condition fails
/// (keeps the approximation positive definite).
fn update_inverse_hessian(h: &mut [Vec<f64>], s: &[f64], y: &[f64]) {
    let sy = dot(s, y);
    if sy <= 1e-12 {
        return;
    }
    let rho = 1.0 / sy;
    let n = s.len();
    let hy: Vec<f64> = h.iter().map(|row| dot(row, y)).collect();
    let yhy = dot(y, &hy);
    for i in 0..n {
        for j in 0..n {
            h[i][j] += rho * (1.0 + rho * yhy) * s[i] * s[j] - rho * (s[i] * hy[j] + hy[i] * s[j]);
        }
    }
}
