//! Subprocess bridge to the simulation toolkit.
//!
//! Each evaluation spawns the configured toolkit command, writes one JSON
//! request to its stdin, and reads one JSON response from its stdout. The
//! command is passed in explicitly on the command line; nothing is resolved
//! from the process environment.

use std::io::Write;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::debug;

use ag_driver::{EvalOutput, Evaluator};
use ag_types::{EvaluationError, GradientMethod};

#[derive(Debug, Serialize)]
struct ToolkitRequest<'a> {
    design: &'a [f64],
    gradient_method: &'a str,
}

#[derive(Debug, Deserialize)]
struct ToolkitResponse {
    objective: f64,
    #[serde(default)]
    gradient: Vec<f64>,
}

/// Runs the toolkit command once per evaluation.
pub struct ToolkitEvaluator {
    command: String,
    quiet: bool,
}

impl ToolkitEvaluator {
    pub fn new(command: String, quiet: bool) -> Self {
        Self { command, quiet }
    }
}

impl Evaluator for ToolkitEvaluator {
    fn evaluate(
        &mut self,
        design: &[f64],
        gradient: GradientMethod,
    ) -> Result<EvalOutput, EvaluationError> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().ok_or_else(|| EvaluationError::Failed {
            message: "toolkit command is empty".into(),
        })?;

        let request = serde_json::to_vec(&ToolkitRequest {
            design,
            gradient_method: gradient.as_str(),
        })
        .map_err(|e| EvaluationError::Failed {
            message: format!("failed to encode toolkit request: {e}"),
        })?;

        debug!("Invoking toolkit: {}", self.command);
        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(if self.quiet {
                Stdio::null()
            } else {
                Stdio::inherit()
            })
            .spawn()
            .map_err(|e| EvaluationError::Failed {
                message: format!("failed to spawn toolkit '{}': {e}", self.command),
            })?;

        // Take stdin so it is dropped (closed) after the write, otherwise the
        // toolkit blocks waiting for more input.
        let mut stdin = child.stdin.take().ok_or_else(|| EvaluationError::Failed {
            message: "toolkit stdin unavailable".into(),
        })?;
        stdin
            .write_all(&request)
            .map_err(|e| EvaluationError::Failed {
                message: format!("failed to write toolkit request: {e}"),
            })?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .map_err(|e| EvaluationError::Failed {
                message: format!("failed to wait for toolkit: {e}"),
            })?;
        if !output.status.success() {
            return Err(EvaluationError::Failed {
                message: format!("toolkit '{}' exited with {}", self.command, output.status),
            });
        }

        let response: ToolkitResponse =
            serde_json::from_slice(&output.stdout).map_err(|e| EvaluationError::Failed {
                message: format!("failed to decode toolkit response: {e}"),
            })?;

        Ok(EvalOutput {
            objective: response.objective,
            gradient: response.gradient,
        })
    }
}
