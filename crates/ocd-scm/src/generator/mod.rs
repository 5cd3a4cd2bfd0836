//! SCM generators and the registry that resolves them by name.

pub mod random;
pub mod registry;

pub use random::{GraphKind, RandomScmGenerator};
pub use registry::{GeneratorFactory, GeneratorRegistry};

use serde::{Deserialize, Serialize};

use ocd_core::errors::{ConfigError, OcdResult};

use crate::mechanism::MechanismKind;
use crate::scm::Scm;

/// Produces structural causal models.
pub trait ScmGenerator: Send {
    /// Registry key or other human-readable label.
    fn name(&self) -> &str;

    /// Build one SCM.
    fn generate_scm(&mut self) -> OcdResult<Scm>;
}

/// Arguments shared by the built-in random generators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScmGeneratorArgs {
    pub num_nodes: usize,
    /// Edge probability for `erdos_renyi`; ignored by other graph kinds.
    pub edge_probability: f64,
    /// Edge weights are drawn from `±[weight_low, weight_high]`.
    pub weight_low: f64,
    pub weight_high: f64,
    pub noise_std: f64,
    pub mechanism: MechanismKind,
}

impl Default for ScmGeneratorArgs {
    fn default() -> Self {
        Self {
            num_nodes: 5,
            edge_probability: 0.5,
            weight_low: 0.5,
            weight_high: 2.0,
            noise_std: 1.0,
            mechanism: MechanismKind::Linear,
        }
    }
}

impl ScmGeneratorArgs {
    /// Parse from a JSON-like table (null means all defaults).
    pub fn from_value(args: &serde_json::Value) -> Result<Self, ConfigError> {
        let parsed: Self = if args.is_null() {
            Self::default()
        } else {
            serde_json::from_value(args.clone()).map_err(|e| ConfigError::InvalidArguments {
                component: "scm generator".into(),
                reason: e.to_string(),
            })?
        };
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, reason: &str| ConfigError::InvalidValue {
            field: field.to_string(),
            reason: reason.to_string(),
        };
        if self.num_nodes == 0 {
            return Err(invalid("num_nodes", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.edge_probability) {
            return Err(invalid("edge_probability", "must lie in [0, 1]"));
        }
        if !(0.0 <= self.weight_low && self.weight_low <= self.weight_high) {
            return Err(invalid("weight_low", "must satisfy 0 <= weight_low <= weight_high"));
        }
        if !(self.noise_std >= 0.0 && self.noise_std.is_finite()) {
            return Err(invalid("noise_std", "must be finite and non-negative"));
        }
        Ok(())
    }
}
