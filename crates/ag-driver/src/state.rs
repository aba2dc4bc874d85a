//! Resolved artifact locations required by the evaluation collaborator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use ag_types::{Config, ConfigError};

/// File locations the evaluation collaborator needs for a run. Populated
/// once per run from the configuration and carried inside the project
/// snapshot so a restarted run sees the same artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Computational mesh. Always required.
    pub mesh: PathBuf,
    /// Direct flow solution to warm-start from, when one exists on disk.
    pub solution_flow: Option<PathBuf>,
    /// Adjoint solution to warm-start from, when one exists on disk.
    pub solution_adjoint: Option<PathBuf>,
}

impl State {
    /// Resolve the artifact files named by the configuration.
    ///
    /// The mesh must exist; solution files are picked up only when present
    /// (a missing solution means a cold solver start, not an error).
    pub fn find_files(config: &Config) -> Result<Self, ConfigError> {
        let mesh = required_file(config, "MESH_FILENAME")?;
        let solution_flow = optional_file(config, "SOLUTION_FLOW_FILENAME");
        let solution_adjoint = optional_file(config, "SOLUTION_ADJ_FILENAME");

        debug!(
            "Resolved mesh {} (flow solution: {}, adjoint solution: {})",
            mesh.display(),
            solution_flow.is_some(),
            solution_adjoint.is_some()
        );

        Ok(Self {
            mesh,
            solution_flow,
            solution_adjoint,
        })
    }
}

fn config_path(config: &Config, key: &str) -> Option<PathBuf> {
    config.get(key).and_then(|v| v.as_str()).map(PathBuf::from)
}

fn required_file(config: &Config, key: &str) -> Result<PathBuf, ConfigError> {
    let path = config_path(config, key).ok_or_else(|| ConfigError::MissingKey {
        key: key.to_string(),
    })?;
    if !path.exists() {
        return Err(ConfigError::ArtifactNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(path)
}

fn optional_file(config: &Config, key: &str) -> Option<PathBuf> {
    config_path(config, key).filter(|path| path.exists())
}
