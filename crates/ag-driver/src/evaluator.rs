//! The evaluation seam between the driver and the external simulation toolkit.

use tracing::debug;

use ag_types::{DriverResult, EvaluationError, GradientMethod};

use crate::project::Project;

/// Objective and gradient values returned by the collaborator for one design.
///
/// The gradient may be empty when the gradient method is `NONE` (the
/// derivative-free routines never read it).
#[derive(Debug, Clone, PartialEq)]
pub struct EvalOutput {
    pub objective: f64,
    pub gradient: Vec<f64>,
}

/// The external simulation toolkit: evaluates the objective function and its
/// gradient at a normalized design vector.
///
/// Injected explicitly wherever it is needed; the core never resolves the
/// toolkit from the process environment.
pub trait Evaluator {
    fn evaluate(
        &mut self,
        design: &[f64],
        gradient: GradientMethod,
    ) -> Result<EvalOutput, EvaluationError>;
}

/// The uniform objective contract every optimizer routine consumes.
pub trait Objective {
    fn eval(&mut self, x: &[f64]) -> DriverResult<(f64, Vec<f64>)>;
}

/// Binds a [`Project`] to an [`Evaluator`]: every call is validated,
/// recorded into the run history, and logged.
pub struct ProjectObjective<'a> {
    project: &'a mut Project,
    evaluator: &'a mut dyn Evaluator,
    gradient: GradientMethod,
}

impl<'a> ProjectObjective<'a> {
    pub fn new(
        project: &'a mut Project,
        evaluator: &'a mut dyn Evaluator,
        gradient: GradientMethod,
    ) -> Self {
        Self {
            project,
            evaluator,
            gradient,
        }
    }
}

impl Objective for ProjectObjective<'_> {
    fn eval(&mut self, x: &[f64]) -> DriverResult<(f64, Vec<f64>)> {
        let output = self.evaluator.evaluate(x, self.gradient)?;
        if !output.gradient.is_empty() && output.gradient.len() != x.len() {
            return Err(EvaluationError::DimensionMismatch {
                expected: x.len(),
                got: output.gradient.len(),
            }
            .into());
        }

        let record = self
            .project
            .record(x.to_vec(), output.objective, output.gradient.clone());
        debug!(
            "Evaluation {}: objective {:.6e}",
            record.number, record.objective
        );

        Ok((output.objective, output.gradient))
    }
}
