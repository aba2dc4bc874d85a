use thiserror::Error;

/// Main error type for the AeroGrad driver
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Restart error: {0}")]
    Restart(#[from] RestartError),

    #[error("Optimizer error: {0}")]
    Optimizer(#[from] OptimizerError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),
}

/// Configuration-related errors. All of these are fatal: a misconfigured
/// bound or design-variable definition must never start an expensive run.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting: {key}")]
    MissingKey { key: String },

    #[error("Setting {key} has invalid value {value}: expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("Design variable definition is inconsistent: {kinds} kinds vs {sizes} sizes")]
    DefinitionMismatch { kinds: usize, sizes: usize },

    #[error("Design variable definition contributes no variables")]
    EmptyDesignSpace,

    #[error("{context} bound is inverted: lower {lower} > upper {upper}")]
    InvertedBound {
        context: String,
        lower: f64,
        upper: f64,
    },

    #[error("Relaxation factor must be nonzero")]
    ZeroRelaxFactor,

    #[error("Unknown gradient method: {name}")]
    UnknownGradientMethod { name: String },

    #[error("Required artifact not found: {path}")]
    ArtifactNotFound { path: String },
}

/// Errors restoring a serialized project. Never degraded to a fresh project:
/// silently dropping a snapshot would discard accumulated evaluation history.
#[derive(Error, Debug)]
pub enum RestartError {
    #[error("Project snapshot {path} could not be read: {message}")]
    Unreadable { path: String, message: String },

    #[error("Project snapshot {path} is corrupt: {message}")]
    Corrupt { path: String, message: String },

    #[error("Project snapshot {path} has schema version {found}, expected {expected}")]
    IncompatibleVersion {
        path: String,
        found: u32,
        expected: u32,
    },
}

/// Optimizer selection errors
#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("Unsupported optimizer '{name}': expected one of SLSQP, CG, BFGS, POWELL")]
    Unsupported { name: String },
}

/// Snapshot persistence errors. Reported after optimization has otherwise
/// completed: the evaluation work is not lost, only its durable record.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to write project snapshot {path}: {message}")]
    Write { path: String, message: String },

    #[error("Failed to rename project snapshot {from} to {to}: {message}")]
    Rename {
        from: String,
        to: String,
        message: String,
    },
}

/// Errors surfaced by the external evaluation collaborator
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Evaluation failed: {message}")]
    Failed { message: String },

    #[error("Gradient has {got} components for a {expected}-dimensional design")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Result type alias for AeroGrad operations
pub type DriverResult<T> = Result<T, DriverError>;
