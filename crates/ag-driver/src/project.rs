//! The persisted, resumable optimization run state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use ag_types::{Config, PersistError, RestartError};

use crate::state::State;

/// Schema version stamped into every snapshot, so a restart can distinguish
/// an incompatible format from corrupt data.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Default file name for the serialized project inside the output directory.
pub const DEFAULT_PROJECT_FILE: &str = "project.json";

/// One objective/gradient evaluation recorded in the run history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: Uuid,
    /// Sequence number within the project (0-indexed).
    pub number: usize,
    /// Normalized design vector the collaborator was called with.
    pub design: Vec<f64>,
    pub objective: f64,
    pub gradient: Vec<f64>,
    pub evaluated_at: DateTime<Utc>,
}

/// The mutable optimization run state: configuration, resolved artifacts,
/// and the accumulated evaluation history. Owned exclusively by the single
/// in-flight optimization call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub config: Config,
    pub state: State,
    pub evaluations: Vec<Evaluation>,
    pub created_at: DateTime<Utc>,
}

/// Versioned wrapper actually written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub schema_version: u32,
    pub project: Project,
}

impl Project {
    pub fn new(config: Config, state: State) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            state,
            evaluations: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Append an evaluation to the run history.
    pub fn record(&mut self, design: Vec<f64>, objective: f64, gradient: Vec<f64>) -> &Evaluation {
        let number = self.evaluations.len();
        self.evaluations.push(Evaluation {
            id: Uuid::new_v4(),
            number,
            design,
            objective,
            gradient,
            evaluated_at: Utc::now(),
        });
        &self.evaluations[number]
    }

    pub fn evaluation_count(&self) -> usize {
        self.evaluations.len()
    }

    /// Best (lowest objective) evaluation recorded so far.
    pub fn best(&self) -> Option<&Evaluation> {
        self.evaluations.iter().min_by(|a, b| {
            a.objective
                .partial_cmp(&b.objective)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Deserialize a project snapshot. Failures are never downgraded to a
    /// fresh project: that would mask accidental loss of evaluation history.
    pub fn load(path: &Path) -> Result<Self, RestartError> {
        let text = std::fs::read_to_string(path).map_err(|e| RestartError::Unreadable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let snapshot: ProjectSnapshot =
            serde_json::from_str(&text).map_err(|e| RestartError::Corrupt {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(RestartError::IncompatibleVersion {
                path: path.display().to_string(),
                found: snapshot.schema_version,
                expected: SNAPSHOT_SCHEMA_VERSION,
            });
        }
        Ok(snapshot.project)
    }

    /// Serialize this project as a versioned snapshot.
    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        let snapshot = ProjectSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            project: self.clone(),
        };
        let text = serde_json::to_string_pretty(&snapshot).map_err(|e| PersistError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, text).map_err(|e| PersistError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Resume from `restart` when it names an existing snapshot, otherwise
    /// start a fresh project.
    ///
    /// A resumed project keeps its recorded evaluation history but always
    /// takes the currently supplied configuration: a restart reuses history,
    /// not stale settings.
    pub fn resume_or_create(
        restart: Option<&Path>,
        config: Config,
        state: State,
    ) -> Result<Self, RestartError> {
        match restart {
            Some(path) if path.exists() => {
                let mut project = Self::load(path)?;
                info!(
                    "Resuming project from {} with {} recorded evaluations",
                    path.display(),
                    project.evaluations.len()
                );
                project.config = config;
                Ok(project)
            }
            _ => {
                info!("Starting a fresh optimization project");
                Ok(Self::new(config, state))
            }
        }
    }

    /// Write the default-named snapshot in `dir`, then move it to `name`
    /// when one was supplied. Returns the final snapshot path.
    ///
    /// The move never runs when the write failed, so a prior named snapshot
    /// survives a mid-write failure.
    pub fn persist(&self, dir: &Path, name: Option<&Path>) -> Result<PathBuf, PersistError> {
        let default_path = dir.join(DEFAULT_PROJECT_FILE);
        self.save(&default_path)?;

        match name {
            Some(name) => {
                let target = if name.is_absolute() {
                    name.to_path_buf()
                } else {
                    dir.join(name)
                };
                std::fs::rename(&default_path, &target).map_err(|e| PersistError::Rename {
                    from: default_path.display().to_string(),
                    to: target.display().to_string(),
                    message: e.to_string(),
                })?;
                debug!("Moved project snapshot to {}", target.display());
                Ok(target)
            }
            None => Ok(default_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state(dir: &Path) -> State {
        let mesh = dir.join("mesh.su2");
        std::fs::write(&mesh, "mesh").unwrap();
        State {
            mesh,
            solution_flow: None,
            solution_adjoint: None,
        }
    }

    fn sample_project(dir: &Path) -> Project {
        let config = Config::new().with("OPT_ITERATIONS", 50);
        let mut project = Project::new(config, sample_state(dir));
        project.record(vec![0.0, 0.0], 1.25, vec![0.5, -0.5]);
        project.record(vec![0.1, -0.1], 0.75, vec![0.2, -0.2]);
        project
    }

    #[test]
    fn snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let project = sample_project(dir.path());
        let path = dir.path().join("project.json");

        project.save(&path).unwrap();
        let restored = Project::load(&path).unwrap();
        assert_eq!(restored, project);
    }

    #[test]
    fn resume_replaces_config_and_keeps_history() {
        let dir = tempfile::tempdir().unwrap();
        let project = sample_project(dir.path());
        let path = dir.path().join("project.json");
        project.save(&path).unwrap();

        let new_config = Config::new().with("OPT_ITERATIONS", 200);
        let resumed =
            Project::resume_or_create(Some(&path), new_config.clone(), sample_state(dir.path()))
                .unwrap();

        assert_eq!(resumed.config, new_config);
        assert_eq!(resumed.evaluations, project.evaluations);
        assert_eq!(resumed.id, project.id);
    }

    #[test]
    fn missing_restart_path_creates_fresh_project() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new();
        let missing = dir.path().join("nope.json");

        let fresh =
            Project::resume_or_create(Some(&missing), config.clone(), sample_state(dir.path()))
                .unwrap();
        assert!(fresh.evaluations.is_empty());

        let none = Project::resume_or_create(None, config, sample_state(dir.path())).unwrap();
        assert!(none.evaluations.is_empty());
    }

    #[test]
    fn corrupt_snapshot_fails_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        std::fs::write(&path, "{ not json").unwrap();

        match Project::load(&path) {
            Err(RestartError::Corrupt { .. }) => (),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn structurally_invalid_snapshot_fails_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        // Valid JSON, but not a well-formed project (missing fields).
        std::fs::write(&path, r#"{"schema_version": 1, "project": {"id": "x"}}"#).unwrap();

        match Project::load(&path) {
            Err(RestartError::Corrupt { .. }) => (),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn incompatible_schema_version_fails_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let project = sample_project(dir.path());
        let path = dir.path().join("project.json");

        let mut snapshot = ProjectSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            project,
        };
        snapshot.schema_version = 99;
        let text = serde_json::to_string(&snapshot).unwrap();
        std::fs::write(&path, text).unwrap();

        match Project::load(&path) {
            Err(RestartError::IncompatibleVersion {
                found: 99,
                expected: SNAPSHOT_SCHEMA_VERSION,
                ..
            }) => (),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn persist_without_name_keeps_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let project = sample_project(dir.path());

        let path = project.persist(dir.path(), None).unwrap();
        assert_eq!(path, dir.path().join(DEFAULT_PROJECT_FILE));
        assert!(path.exists());
    }

    #[test]
    fn persist_with_name_moves_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let project = sample_project(dir.path());

        let path = project
            .persist(dir.path(), Some(Path::new("wing_run.json")))
            .unwrap();
        assert_eq!(path, dir.path().join("wing_run.json"));
        assert!(path.exists());
        assert!(!dir.path().join(DEFAULT_PROJECT_FILE).exists());

        let restored = Project::load(&path).unwrap();
        assert_eq!(restored.evaluation_count(), 2);
    }

    #[test]
    fn best_picks_lowest_objective() {
        let dir = tempfile::tempdir().unwrap();
        let project = sample_project(dir.path());
        assert_eq!(project.best().unwrap().objective, 0.75);
    }
}
