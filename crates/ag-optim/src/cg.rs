//! Polak-Ribiere nonlinear conjugate gradient with periodic restarts.

use ag_driver::{Objective, OptimizerOutcome, OptimizerRun};
use ag_types::DriverResult;
use tracing::debug;

use crate::linesearch::{
    armijo_projected, dot, eval_with_gradient, project, projected_gradient_norm,
};

pub(crate) fn conjugate_gradient(
    objective: &mut dyn Objective,
    run: &OptimizerRun,
) -> DriverResult<OptimizerOutcome> {
    let bounds = &run.bounds;
    let n = run.x0.len();
    let mut x = project(&run.x0, bounds);
    let (mut fx, mut g) = eval_with_gradient(objective, &x)?;

    let mut best_x = x.clone();
    let mut best_f = fx;
    let mut direction: Vec<f64> = g.iter().map(|v| -v).collect();
    let mut iterations = 0;
    let mut converged = false;

    for iter in 0..run.max_iterations {
        if projected_gradient_norm(&x, &g, bounds) <= run.accuracy {
            converged = true;
            break;
        }
        if dot(&g, &direction) >= 0.0 {
            // Conjugacy has degraded; restart with steepest descent.
            direction = g.iter().map(|v| -v).collect();
        }
        let Some(step) = armijo_projected(objective, &x, fx, &g, &direction, bounds)? else {
            break;
        };
        // Counted only once the line search accepted a step, so a stalled
        // sweep does not inflate the reported iteration count.
        iterations += 1;

        // PR+ beta, reset to steepest descent every n iterations.
        let gg = dot(&g, &g);
        let beta = if gg > 0.0 && (iter + 1) % n.max(1) != 0 {
            let num: f64 = step
                .gradient
                .iter()
                .zip(&g)
                .map(|(gn, go)| gn * (gn - go))
                .sum();
            (num / gg).max(0.0)
        } else {
            0.0
        };

        direction = step
            .gradient
            .iter()
            .zip(&direction)
            .map(|(gn, di)| -gn + beta * di)
            .collect();
        x = step.x;
        fx = step.fx;
        g = step.gradient;
        if fx < best_f {
            best_f = fx;
            best_x = x.clone();
        }
    }

    debug!(
        "CG stopped after {} iterations (converged: {}, best {:.6e})",
        iterations, converged, best_f
    );
    Ok(OptimizerOutcome {
        best_design: best_x,
        best_objective: best_f,
        iterations,
        converged,
    })
}
