//! Derivative-free direction-set method with golden-section line searches.

use ag_driver::{Objective, OptimizerOutcome, OptimizerRun};
use ag_types::{BoundPair, DriverResult};
use tracing::debug;

use crate::linesearch::{norm, project};

pub(crate) fn powell(
    objective: &mut dyn Objective,
    run: &OptimizerRun,
) -> DriverResult<OptimizerOutcome> {
    let bounds = &run.bounds;
    let n = run.x0.len();
    let mut x = project(&run.x0, bounds);
    // Gradient is ignored: POWELL is derivative-free.
    let (mut fx, _) = objective.eval(&x)?;

    let mut directions: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let mut d = vec![0.0; n];
            d[i] = 1.0;
            d
        })
        .collect();
    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..run.max_iterations {
        iterations += 1;
        let x_start = x.clone();
        let f_start = fx;
        let mut biggest_drop = 0.0;
        let mut biggest_idx = 0;

        for (i, dir) in directions.iter().enumerate() {
            let (x_new, f_new) = line_minimize(objective, &x, fx, dir, bounds)?;
            if fx - f_new > biggest_drop {
                biggest_drop = fx - f_new;
                biggest_idx = i;
            }
            x = x_new;
            fx = f_new;
        }

        if 2.0 * (f_start - fx) <= run.accuracy * (f_start.abs() + fx.abs()) + 1e-20 {
            converged = true;
            break;
        }

        // Replace the direction of the biggest decrease with the overall
        // displacement of this sweep, then minimize once along it.
        let sweep: Vec<f64> = x.iter().zip(&x_start).map(|(a, b)| a - b).collect();
        if norm(&sweep) > 1e-14 {
            let (x_new, f_new) = line_minimize(objective, &x, fx, &sweep, bounds)?;
            x = x_new;
            fx = f_new;
            directions[biggest_idx] = sweep;
        }
    }

    debug!(
        "Direction-set search stopped after {} sweeps (converged: {}, best {:.6e})",
        iterations, converged, fx
    );
    Ok(OptimizerOutcome {
        best_design: x,
        best_objective: fx,
        iterations,
        converged,
    })
}

/// Golden-section minimization of `t -> f(P(x + t d))` over the segment of
/// the line that stays inside the bound box. Never moves uphill: when no
/// sampled point improves on `fx`, the input point is returned unchanged.
fn line_minimize(
    objective: &mut dyn Objective,
    x: &[f64],
    fx: f64,
    direction: &[f64],
    bounds: &[BoundPair],
) -> DriverResult<(Vec<f64>, f64)> {
    const INV_PHI: f64 = 0.618_033_988_749_894_8;
    const GOLDEN_STEPS: usize = 40;

    let (t_lo, t_hi) = segment_extent(x, direction, bounds);
    if t_hi - t_lo < 1e-14 {
        return Ok((x.to_vec(), fx));
    }

    let mut a = t_lo;
    let mut b = t_hi;
    let mut c = b - INV_PHI * (b - a);
    let mut d = a + INV_PHI * (b - a);
    let mut fc = eval_at(objective, x, direction, c, bounds)?;
    let mut fd = eval_at(objective, x, direction, d, bounds)?;
    let mut best_t = if fc < fd { c } else { d };
    let mut best_f = fc.min(fd);

    for _ in 0..GOLDEN_STEPS {
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - INV_PHI * (b - a);
            fc = eval_at(objective, x, direction, c, bounds)?;
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + INV_PHI * (b - a);
            fd = eval_at(objective, x, direction, d, bounds)?;
        }
        if fc < best_f {
            best_f = fc;
            best_t = c;
        }
        if fd < best_f {
            best_f = fd;
            best_t = d;
        }
    }

    if best_f < fx {
        Ok((point_at(x, direction, best_t, bounds), best_f))
    } else {
        Ok((x.to_vec(), fx))
    }
}

fn point_at(x: &[f64], direction: &[f64], t: f64, bounds: &[BoundPair]) -> Vec<f64> {
    x.iter()
        .zip(direction)
        .zip(bounds)
        .map(|((xi, di), b)| b.clamp(xi + t * di))
        .collect()
}

fn eval_at(
    objective: &mut dyn Objective,
    x: &[f64],
    direction: &[f64],
    t: f64,
    bounds: &[BoundPair],
) -> DriverResult<f64> {
    let point = point_at(x, direction, t, bounds);
    Ok(objective.eval(&point)?.0)
}

/// The parameter range [t_lo, t_hi] for which `x + t d` stays inside the
/// bound box, widened to always include t = 0. A direction with no nonzero
/// component spans nothing.
fn segment_extent(x: &[f64], direction: &[f64], bounds: &[BoundPair]) -> (f64, f64) {
    let mut t_lo = f64::NEG_INFINITY;
    let mut t_hi = f64::INFINITY;
    for ((xi, di), b) in x.iter().zip(direction).zip(bounds) {
        if *di > 0.0 {
            t_hi = t_hi.min((b.upper - xi) / di);
            t_lo = t_lo.max((b.lower - xi) / di);
        } else if *di < 0.0 {
            t_hi = t_hi.min((b.lower - xi) / di);
            t_lo = t_lo.max((b.upper - xi) / di);
        }
    }
    if !t_lo.is_finite() || !t_hi.is_finite() {
        return (0.0, 0.0);
    }
    (t_lo.min(0.0), t_hi.max(0.0))
}
