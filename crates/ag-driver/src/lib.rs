//! # ag-driver
//!
//! Orchestration core for AeroGrad shape and flow-control optimization runs.
//!
//! Turns a run configuration into a bounded, normalized optimization problem,
//! resumes or creates the persistent project, and dispatches to one of the
//! interchangeable optimizer routines. The flow solve, adjoint, and mesh
//! deformation live behind the [`Evaluator`] seam; the optimizer routines
//! live behind [`OptimizerBackend`]. Both are injected explicitly.

mod adapter;
mod bounds;
mod dispatch;
mod driver;
mod evaluator;
mod project;
mod scaling;
mod state;

pub use adapter::OptSettings;
pub use bounds::build_bounds;
pub use dispatch::{dispatch, OptimizerBackend, OptimizerKind, OptimizerOutcome, OptimizerRun};
pub use driver::{run, RunPlan};
pub use evaluator::{EvalOutput, Evaluator, Objective, ProjectObjective};
pub use project::{Evaluation, Project, ProjectSnapshot, DEFAULT_PROJECT_FILE, SNAPSHOT_SCHEMA_VERSION};
pub use scaling::Scaling;
pub use state::State;
