//! Normalization of bounds and accuracy into the optimizer's unit space.

use ag_types::{BoundPair, ConfigError};

/// Scale factors mapping the physical design space into the optimizer's
/// normalized step space, where a unit step corresponds to one relaxation
/// factor of physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    /// Multiplier for the default bound endpoints (1 / relaxation factor).
    pub bound_scale: f64,
    /// Optimizer convergence accuracy (base accuracy x gradient factor).
    pub accuracy: f64,
}

impl Scaling {
    pub fn derive(
        relax_factor: f64,
        base_accuracy: f64,
        gradient_factor: f64,
    ) -> Result<Self, ConfigError> {
        if relax_factor == 0.0 {
            return Err(ConfigError::ZeroRelaxFactor);
        }
        Ok(Self {
            bound_scale: 1.0 / relax_factor,
            accuracy: base_accuracy * gradient_factor,
        })
    }

    /// Scale a default bound pair into optimizer units.
    ///
    /// Flow-control bounds must not pass through here: they are absolute
    /// overrides already expressed in optimizer units.
    pub fn scale_pair(&self, pair: BoundPair) -> BoundPair {
        BoundPair::new(pair.lower * self.bound_scale, pair.upper * self.bound_scale)
    }
}
