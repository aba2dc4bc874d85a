//! Optimizer selection and uniform dispatch.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

use ag_types::{BoundPair, DriverResult, OptimizerError};

use crate::evaluator::Objective;

/// The fixed set of interchangeable optimization techniques.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizerKind {
    #[serde(rename = "SLSQP")]
    Slsqp,
    #[serde(rename = "CG")]
    Cg,
    #[serde(rename = "BFGS")]
    Bfgs,
    #[serde(rename = "POWELL")]
    Powell,
}

impl OptimizerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OptimizerKind::Slsqp => "SLSQP",
            OptimizerKind::Cg => "CG",
            OptimizerKind::Bfgs => "BFGS",
            OptimizerKind::Powell => "POWELL",
        }
    }
}

impl std::fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptimizerKind {
    type Err = OptimizerError;

    /// An unmatched tag fails loudly, before any evaluation work begins.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SLSQP" => Ok(OptimizerKind::Slsqp),
            "CG" => Ok(OptimizerKind::Cg),
            "BFGS" => Ok(OptimizerKind::Bfgs),
            "POWELL" => Ok(OptimizerKind::Powell),
            _ => Err(OptimizerError::Unsupported {
                name: s.to_string(),
            }),
        }
    }
}

/// The uniform argument bundle every optimizer routine receives, regardless
/// of which technique is selected.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerRun {
    /// Starting normalized design vector.
    pub x0: Vec<f64>,
    /// Per-variable bound sequence, index-aligned with `x0`.
    pub bounds: Vec<BoundPair>,
    /// Iteration budget.
    pub max_iterations: usize,
    /// Convergence accuracy, in scaled units.
    pub accuracy: f64,
}

/// Summary returned by an optimizer routine.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerOutcome {
    pub best_design: Vec<f64>,
    pub best_objective: f64,
    /// Outer iterations actually performed.
    pub iterations: usize,
    /// Whether the accuracy criterion was met within the budget.
    pub converged: bool,
}

/// The external optimization routines, one per supported technique. All four
/// consume the same (objective, run) contract.
pub trait OptimizerBackend {
    fn slsqp(
        &self,
        objective: &mut dyn Objective,
        run: &OptimizerRun,
    ) -> DriverResult<OptimizerOutcome>;

    fn cg(
        &self,
        objective: &mut dyn Objective,
        run: &OptimizerRun,
    ) -> DriverResult<OptimizerOutcome>;

    fn bfgs(
        &self,
        objective: &mut dyn Objective,
        run: &OptimizerRun,
    ) -> DriverResult<OptimizerOutcome>;

    fn powell(
        &self,
        objective: &mut dyn Objective,
        run: &OptimizerRun,
    ) -> DriverResult<OptimizerOutcome>;
}

/// Invoke exactly the routine matching `kind` with the uniform run bundle.
pub fn dispatch(
    kind: OptimizerKind,
    backend: &dyn OptimizerBackend,
    objective: &mut dyn Objective,
    run: &OptimizerRun,
) -> DriverResult<OptimizerOutcome> {
    info!(
        "Dispatching {} over {} design variables (budget {}, accuracy {:.3e})",
        kind,
        run.x0.len(),
        run.max_iterations,
        run.accuracy
    );
    match kind {
        OptimizerKind::Slsqp => backend.slsqp(objective, run),
        OptimizerKind::Cg => backend.cg(objective, run),
        OptimizerKind::Bfgs => backend.bfgs(objective, run),
        OptimizerKind::Powell => backend.powell(objective, run),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct NullObjective;

    impl Objective for NullObjective {
        fn eval(&mut self, x: &[f64]) -> DriverResult<(f64, Vec<f64>)> {
            Ok((0.0, vec![0.0; x.len()]))
        }
    }

    /// Records which routine ran and with which arguments.
    #[derive(Default)]
    struct RecordingBackend {
        calls: RefCell<Vec<(&'static str, OptimizerRun)>>,
    }

    impl RecordingBackend {
        fn respond(&self, name: &'static str, run: &OptimizerRun) -> DriverResult<OptimizerOutcome> {
            self.calls.borrow_mut().push((name, run.clone()));
            Ok(OptimizerOutcome {
                best_design: run.x0.clone(),
                best_objective: 0.0,
                iterations: 0,
                converged: true,
            })
        }
    }

    impl OptimizerBackend for RecordingBackend {
        fn slsqp(
            &self,
            _objective: &mut dyn Objective,
            run: &OptimizerRun,
        ) -> DriverResult<OptimizerOutcome> {
            self.respond("slsqp", run)
        }

        fn cg(
            &self,
            _objective: &mut dyn Objective,
            run: &OptimizerRun,
        ) -> DriverResult<OptimizerOutcome> {
            self.respond("cg", run)
        }

        fn bfgs(
            &self,
            _objective: &mut dyn Objective,
            run: &OptimizerRun,
        ) -> DriverResult<OptimizerOutcome> {
            self.respond("bfgs", run)
        }

        fn powell(
            &self,
            _objective: &mut dyn Objective,
            run: &OptimizerRun,
        ) -> DriverResult<OptimizerOutcome> {
            self.respond("powell", run)
        }
    }

    fn sample_run() -> OptimizerRun {
        OptimizerRun {
            x0: vec![0.0; 3],
            bounds: vec![BoundPair::new(-0.5, 0.5); 3],
            max_iterations: 25,
            accuracy: 1e-6,
        }
    }

    #[test]
    fn each_tag_invokes_exactly_one_routine_with_identical_arguments() {
        let cases = [
            (OptimizerKind::Slsqp, "slsqp"),
            (OptimizerKind::Cg, "cg"),
            (OptimizerKind::Bfgs, "bfgs"),
            (OptimizerKind::Powell, "powell"),
        ];
        let run = sample_run();

        for (kind, expected) in cases {
            let backend = RecordingBackend::default();
            let mut objective = NullObjective;
            dispatch(kind, &backend, &mut objective, &run).unwrap();

            let calls = backend.calls.borrow();
            assert_eq!(calls.len(), 1, "{kind} must invoke exactly one routine");
            assert_eq!(calls[0].0, expected);
            assert_eq!(calls[0].1, run);
        }
    }

    #[test]
    fn unknown_tag_is_rejected_up_front() {
        match "NELDER_MEAD".parse::<OptimizerKind>() {
            Err(OptimizerError::Unsupported { name }) => assert_eq!(name, "NELDER_MEAD"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn tags_parse_case_insensitively() {
        assert_eq!("slsqp".parse::<OptimizerKind>().unwrap(), OptimizerKind::Slsqp);
        assert_eq!("Powell".parse::<OptimizerKind>().unwrap(), OptimizerKind::Powell);
        assert_eq!("CG".parse::<OptimizerKind>().unwrap(), OptimizerKind::Cg);
        assert_eq!("bfgs".parse::<OptimizerKind>().unwrap(), OptimizerKind::Bfgs);
    }
}
