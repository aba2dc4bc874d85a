//! Shared vector helpers and the projected backtracking line search.

use ag_driver::Objective;
use ag_types::{BoundPair, DriverResult, EvaluationError};

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub(crate) fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

pub(crate) fn project(x: &[f64], bounds: &[BoundPair]) -> Vec<f64> {
    x.iter().zip(bounds).map(|(v, b)| b.clamp(*v)).collect()
}

/// First-order criticality measure for box constraints: the infinity norm of
/// the projected gradient step `P(x - g) - x`.
pub(crate) fn projected_gradient_norm(x: &[f64], g: &[f64], bounds: &[BoundPair]) -> f64 {
    x.iter()
        .zip(g)
        .zip(bounds)
        .map(|((xi, gi), b)| (b.clamp(xi - gi) - xi).abs())
        .fold(0.0, f64::max)
}

/// Evaluate and insist on a full-length gradient. The gradient-based
/// routines cannot proceed on a collaborator that returns none.
pub(crate) fn eval_with_gradient(
    objective: &mut dyn Objective,
    x: &[f64],
) -> DriverResult<(f64, Vec<f64>)> {
    let (fx, g) = objective.eval(x)?;
    if g.len() != x.len() {
        return Err(EvaluationError::DimensionMismatch {
            expected: x.len(),
            got: g.len(),
        }
        .into());
    }
    Ok((fx, g))
}

pub(crate) struct LineSearchStep {
    pub x: Vec<f64>,
    pub fx: f64,
    pub gradient: Vec<f64>,
}

/// Backtracking Armijo search along the projected path `t -> P(x + t d)`.
///
/// Sufficient decrease is tested against the realized (projected)
/// displacement, so steps truncated by a bound face are still judged fairly.
/// Returns `None` when no acceptable step exists: a non-descent direction,
/// or a stall on a bound face.
pub(crate) fn armijo_projected(
    objective: &mut dyn Objective,
    x: &[f64],
    fx: f64,
    g: &[f64],
    direction: &[f64],
    bounds: &[BoundPair],
) -> DriverResult<Option<LineSearchStep>> {
    const C1: f64 = 1e-4;
    const SHRINK: f64 = 0.5;
    const MAX_BACKTRACKS: usize = 30;

    if dot(g, direction) >= 0.0 {
        return Ok(None);
    }

    let mut t = 1.0;
    for _ in 0..MAX_BACKTRACKS {
        let trial: Vec<f64> = x
            .iter()
            .zip(direction)
            .zip(bounds)
            .map(|((xi, di), b)| b.clamp(xi + t * di))
            .collect();
        let decrease: f64 = trial
            .iter()
            .zip(x)
            .zip(g)
            .map(|((ti, xi), gi)| gi * (ti - xi))
            .sum();
        if decrease < 0.0 {
            let (ft, gt) = eval_with_gradient(objective, &trial)?;
            if ft <= fx + C1 * decrease {
                return Ok(Some(LineSearchStep {
                    x: trial,
                    fx: ft,
                    gradient: gt,
                }));
            }
        }
        t *= SHRINK;
    }
    Ok(None)
}
