//! Top-level run orchestration: adapt, bound, scale, resume, dispatch, persist.

use std::path::PathBuf;
use tracing::info;

use ag_types::{Config, DriverResult, RunOptions};

use crate::adapter::OptSettings;
use crate::bounds::build_bounds;
use crate::dispatch::{dispatch, OptimizerBackend, OptimizerKind, OptimizerRun};
use crate::evaluator::{Evaluator, ProjectObjective};
use crate::project::Project;
use crate::scaling::Scaling;
use crate::state::State;

/// Everything needed to set up one optimization run.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// The run configuration, as loaded (run options not yet applied).
    pub config: Config,
    /// Per-run option overrides.
    pub options: RunOptions,
    /// Which optimization technique to dispatch to.
    pub optimizer: OptimizerKind,
    /// Project snapshot to resume from, and to move the result to.
    pub restart: Option<PathBuf>,
    /// Directory receiving the serialized project.
    pub output_dir: PathBuf,
}

/// Run one complete optimization.
///
/// Applies the run options onto the configuration, builds the scaled bound
/// sequence, resumes or creates the project, dispatches to the selected
/// optimizer routine, and persists the project snapshot. Returns the project
/// with its full evaluation history.
pub fn run(
    plan: RunPlan,
    backend: &dyn OptimizerBackend,
    evaluator: &mut dyn Evaluator,
) -> DriverResult<Project> {
    let config = plan.options.apply(&plan.config);
    let settings = OptSettings::from_config(&config)?;

    let scaling = Scaling::derive(
        settings.relax_factor,
        settings.accuracy,
        settings.gradient_factor,
    )?;
    let default_pair = scaling.scale_pair(settings.default_bounds);
    let bounds = build_bounds(&settings.definition, default_pair, settings.flow_control_bounds)?;

    let n = bounds.len();
    let run_args = OptimizerRun {
        x0: vec![0.0; n],
        bounds,
        max_iterations: settings.iterations,
        accuracy: scaling.accuracy,
    };

    let state = State::find_files(&config)?;
    let mut project = Project::resume_or_create(plan.restart.as_deref(), config, state)?;

    let outcome = {
        let mut objective = ProjectObjective::new(&mut project, evaluator, plan.options.gradient);
        dispatch(plan.optimizer, backend, &mut objective, &run_args)?
    };
    info!(
        "Optimization finished after {} iterations (converged: {}, best objective {:.6e})",
        outcome.iterations, outcome.converged, outcome.best_objective
    );

    let snapshot = project.persist(&plan.output_dir, plan.restart.as_deref())?;
    info!("Project snapshot written to {}", snapshot.display());

    Ok(project)
}
