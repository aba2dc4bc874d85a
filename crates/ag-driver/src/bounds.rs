//! Per-variable optimization bounds over heterogeneous design-variable kinds.

use ag_types::{BoundPair, ConfigError, DesignVariableDef};

/// Build the flattened bound sequence for a design-variable definition.
///
/// Every scalar slot starts at `default_pair`. Entries of the flow-control
/// kind then overwrite their contiguous run of slots with
/// `flow_control_pair`. Flat slot indices follow the prefix sum of entry
/// sizes, so variable-width entries land at the right offsets and zero-size
/// entries contribute nothing.
pub fn build_bounds(
    definition: &DesignVariableDef,
    default_pair: BoundPair,
    flow_control_pair: Option<BoundPair>,
) -> Result<Vec<BoundPair>, ConfigError> {
    definition.validate()?;
    let n = definition.total_size();
    if n == 0 {
        return Err(ConfigError::EmptyDesignSpace);
    }

    let mut bounds = vec![default_pair; n];
    if let Some(afc) = flow_control_pair {
        let mut offset = 0;
        for (kind, size) in definition.entries() {
            if kind.is_flow_control() {
                for slot in &mut bounds[offset..offset + size] {
                    *slot = afc;
                }
            }
            offset += size;
        }
    }
    Ok(bounds)
}
