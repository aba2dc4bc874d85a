//! Coercion of raw configuration values into typed optimizer settings.

use ag_types::{BoundPair, Config, ConfigError, DesignVariableDef, DvKind};

/// Typed optimization settings extracted from a run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OptSettings {
    /// Optimizer iteration budget.
    pub iterations: usize,
    /// Default bound pair, in physical design units (pre-scaling).
    pub default_bounds: BoundPair,
    /// Line-search scale mapping optimizer units to physical units.
    pub relax_factor: f64,
    /// Objective/gradient magnitude scale.
    pub gradient_factor: f64,
    /// Base optimizer accuracy (pre-scaling).
    pub accuracy: f64,
    /// Complete design-variable definition.
    pub definition: DesignVariableDef,
    /// Absolute bounds for flow-control variables, present exactly when the
    /// definition contains the flow-control kind.
    pub flow_control_bounds: Option<BoundPair>,
}

impl OptSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let iterations = require_usize(config, "OPT_ITERATIONS")?;
        let lower = require_f64(config, "OPT_BOUND_LOWER")?;
        let upper = require_f64(config, "OPT_BOUND_UPPER")?;
        let default_bounds = BoundPair::validated(lower, upper, "default")?;

        let relax_factor = require_f64(config, "OPT_RELAX_FACTOR")?;
        if relax_factor == 0.0 {
            return Err(ConfigError::ZeroRelaxFactor);
        }
        let gradient_factor = require_f64(config, "OPT_GRADIENT_FACTOR")?;
        let accuracy = require_f64(config, "OPT_ACCURACY")?;

        let definition = require_definition(config)?;

        let flow_control_bounds = if definition.has_kind(DvKind::TranspDv) {
            let afc_lower = require_f64(config, "OPT_BOUND_LOWER_AFC")?;
            let afc_upper = require_f64(config, "OPT_BOUND_UPPER_AFC")?;
            Some(BoundPair::validated(afc_lower, afc_upper, "flow-control")?)
        } else {
            None
        };

        Ok(Self {
            iterations,
            default_bounds,
            relax_factor,
            gradient_factor,
            accuracy,
            definition,
            flow_control_bounds,
        })
    }
}

fn require_value<'a>(config: &'a Config, key: &str) -> Result<&'a serde_json::Value, ConfigError> {
    config.get(key).ok_or_else(|| ConfigError::MissingKey {
        key: key.to_string(),
    })
}

/// Raw configurations are stringly typed, so numeric settings may arrive as
/// JSON numbers or as numeric strings.
fn require_f64(config: &Config, key: &str) -> Result<f64, ConfigError> {
    let value = require_value(config, key)?;
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: "a floating point number",
    })
}

fn require_usize(config: &Config, key: &str) -> Result<usize, ConfigError> {
    let value = require_value(config, key)?;
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_u64().map(|v| v as usize),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: "a non-negative integer",
    })
}

fn require_definition(config: &Config) -> Result<DesignVariableDef, ConfigError> {
    let value = require_value(config, "DEFINITION_DV")?;
    let definition: DesignVariableDef =
        serde_json::from_value(value.clone()).map_err(|_| ConfigError::InvalidValue {
            key: "DEFINITION_DV".to_string(),
            value: value.to_string(),
            expected: "a KIND/SIZE design variable definition",
        })?;
    definition.validate()?;
    Ok(definition)
}
