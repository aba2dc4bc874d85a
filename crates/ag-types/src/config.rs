//! Run configuration, design-variable definitions, and run options.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::errors::ConfigError;

/// Named-settings mapping for an optimization run.
///
/// Values are kept as opaque JSON so this crate doesn't depend on the
/// external toolkit's configuration schema; the driver's adapter coerces the
/// entries it needs into typed values. A `Config` is immutable once built:
/// overrides go through [`Config::with`], which returns a new value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    settings: BTreeMap<String, serde_json::Value>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            settings: BTreeMap::new(),
        }
    }

    pub fn from_map(settings: BTreeMap<String, serde_json::Value>) -> Self {
        Self { settings }
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.settings.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.settings.contains_key(key)
    }

    /// Return a copy of this configuration with `key` set to `value`.
    pub fn with(&self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Config {
        let mut settings = self.settings.clone();
        settings.insert(key.into(), value.into());
        Self { settings }
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }
}

/// The kind tag classifying a group of design variables.
///
/// Serialized in the toolkit's wire form (e.g. `TRANSP_DV`). Shape kinds
/// share the default optimization bounds; the transpiration (flow-control)
/// kind carries its own absolute bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DvKind {
    #[serde(rename = "HICKS_HENNE")]
    HicksHenne,
    #[serde(rename = "FFD_CONTROL_POINT")]
    FfdControlPoint,
    #[serde(rename = "FFD_CAMBER")]
    FfdCamber,
    #[serde(rename = "TRANSP_DV")]
    TranspDv,
}

impl DvKind {
    /// Whether this kind is the distinguished flow-control actuator kind.
    pub fn is_flow_control(self) -> bool {
        matches!(self, DvKind::TranspDv)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DvKind::HicksHenne => "HICKS_HENNE",
            DvKind::FfdControlPoint => "FFD_CONTROL_POINT",
            DvKind::FfdCamber => "FFD_CAMBER",
            DvKind::TranspDv => "TRANSP_DV",
        }
    }
}

impl std::fmt::Display for DvKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete definition of the design variables: parallel kind/size lists.
///
/// Entry `i` contributes `sizes[i]` scalar variables of kind `kinds[i]` to
/// the flattened design vector, so the total dimension is the sum of sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignVariableDef {
    #[serde(rename = "KIND")]
    pub kinds: Vec<DvKind>,
    #[serde(rename = "SIZE")]
    pub sizes: Vec<usize>,
}

impl DesignVariableDef {
    pub fn new(kinds: Vec<DvKind>, sizes: Vec<usize>) -> Result<Self, ConfigError> {
        let def = Self { kinds, sizes };
        def.validate()?;
        Ok(def)
    }

    /// Check the parallel-list invariant. Needed separately from [`Self::new`]
    /// because definitions also arrive through deserialization.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kinds.len() != self.sizes.len() {
            return Err(ConfigError::DefinitionMismatch {
                kinds: self.kinds.len(),
                sizes: self.sizes.len(),
            });
        }
        Ok(())
    }

    /// Total number of scalar design variables.
    pub fn total_size(&self) -> usize {
        self.sizes.iter().sum()
    }

    pub fn has_kind(&self, kind: DvKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Iterate (kind, size) entries in definition order.
    pub fn entries(&self) -> impl Iterator<Item = (DvKind, usize)> + '_ {
        self.kinds.iter().copied().zip(self.sizes.iter().copied())
    }
}

/// A lower/upper bound pair for one scalar design variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundPair {
    pub lower: f64,
    pub upper: f64,
}

impl BoundPair {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Construct a pair, rejecting `lower > upper`.
    pub fn validated(lower: f64, upper: f64, context: &str) -> Result<Self, ConfigError> {
        if lower > upper {
            return Err(ConfigError::InvertedBound {
                context: context.to_string(),
                lower,
                upper,
            });
        }
        Ok(Self { lower, upper })
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.lower && x <= self.upper
    }

    pub fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.lower, self.upper)
    }
}

/// How the evaluation collaborator computes objective gradients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GradientMethod {
    #[default]
    #[serde(rename = "CONTINUOUS_ADJOINT")]
    ContinuousAdjoint,
    #[serde(rename = "DISCRETE_ADJOINT")]
    DiscreteAdjoint,
    #[serde(rename = "FINDIFF")]
    FinDiff,
    #[serde(rename = "NONE")]
    None,
}

impl GradientMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            GradientMethod::ContinuousAdjoint => "CONTINUOUS_ADJOINT",
            GradientMethod::DiscreteAdjoint => "DISCRETE_ADJOINT",
            GradientMethod::FinDiff => "FINDIFF",
            GradientMethod::None => "NONE",
        }
    }
}

impl std::fmt::Display for GradientMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GradientMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CONTINUOUS_ADJOINT" => Ok(GradientMethod::ContinuousAdjoint),
            "DISCRETE_ADJOINT" => Ok(GradientMethod::DiscreteAdjoint),
            "FINDIFF" => Ok(GradientMethod::FinDiff),
            "NONE" => Ok(GradientMethod::None),
            other => Err(ConfigError::UnknownGradientMethod {
                name: other.to_string(),
            }),
        }
    }
}

/// Console verbosity of the evaluation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConsoleMode {
    #[default]
    #[serde(rename = "FULL")]
    Full,
    #[serde(rename = "CONCISE")]
    Concise,
}

impl ConsoleMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ConsoleMode::Full => "FULL",
            ConsoleMode::Concise => "CONCISE",
        }
    }
}

/// Per-run options supplied on the command line and applied onto the
/// configuration at setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Number of solver partitions.
    pub partitions: usize,
    /// Number of mesh zones.
    pub zones: usize,
    /// Quiet the collaborator's console output (optimizer output only).
    pub quiet: bool,
    /// Gradient computation method.
    pub gradient: GradientMethod,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            partitions: 1,
            zones: 1,
            quiet: false,
            gradient: GradientMethod::ContinuousAdjoint,
        }
    }
}

impl RunOptions {
    /// Apply these options onto a configuration, returning the new value.
    ///
    /// Idempotent: applying twice yields the same configuration as once.
    pub fn apply(&self, config: &Config) -> Config {
        let mut out = config
            .with("NUMBER_PART", self.partitions)
            .with("NZONES", self.zones)
            .with("GRADIENT_METHOD", self.gradient.as_str());
        if self.quiet {
            out = out.with("CONSOLE", ConsoleMode::Concise.as_str());
        }
        out
    }
}
