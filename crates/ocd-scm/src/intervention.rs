//! Functions that force a variable's value during an interventional draw.

use ndarray::{Array1, ArrayView1};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use ocd_core::errors::ConfigError;

/// Registry keys accepted by [`InterventionFunction::resolve`].
pub const INTERVENTION_KEYS: &[&str] = &["constant", "gaussian", "uniform", "shift"];

/// Replacement rule for the intervened column.
///
/// `natural` is what the mechanism would have produced; only `Shift` reads it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterventionFunction {
    Constant {
        #[serde(default)]
        value: f64,
    },
    Gaussian {
        #[serde(default)]
        mean: f64,
        #[serde(default = "one")]
        std: f64,
    },
    Uniform {
        #[serde(default = "minus_one")]
        low: f64,
        #[serde(default = "one")]
        high: f64,
    },
    Shift {
        #[serde(default = "one")]
        offset: f64,
    },
}

fn one() -> f64 {
    1.0
}

fn minus_one() -> f64 {
    -1.0
}

impl Default for InterventionFunction {
    fn default() -> Self {
        InterventionFunction::Gaussian {
            mean: 0.0,
            std: 1.0,
        }
    }
}

impl InterventionFunction {
    /// Look up `key` and parse `args` (an object or null) into its parameters.
    pub fn resolve(key: &str, args: &serde_json::Value) -> Result<Self, ConfigError> {
        if !INTERVENTION_KEYS.contains(&key) {
            return Err(ConfigError::UnknownKey {
                registry: "intervention function".into(),
                key: key.to_string(),
                known: INTERVENTION_KEYS.join(", "),
            });
        }
        let mut object = match args {
            serde_json::Value::Null => serde_json::Map::new(),
            serde_json::Value::Object(map) => map.clone(),
            other => {
                return Err(ConfigError::InvalidArguments {
                    component: key.to_string(),
                    reason: format!("expected a table of arguments, got {other}"),
                })
            }
        };
        object.insert("kind".into(), serde_json::Value::String(key.to_string()));
        let function: Self = serde_json::from_value(serde_json::Value::Object(object)).map_err(
            |e| ConfigError::InvalidArguments {
                component: key.to_string(),
                reason: e.to_string(),
            },
        )?;
        function.validate()?;
        tracing::debug!(key, ?function, "resolved intervention function");
        Ok(function)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let bad = |reason: &str| ConfigError::InvalidArguments {
            component: format!("{self:?}"),
            reason: reason.to_string(),
        };
        match *self {
            InterventionFunction::Gaussian { std, .. } if !(std >= 0.0 && std.is_finite()) => {
                Err(bad("std must be finite and non-negative"))
            }
            InterventionFunction::Uniform { low, high } if !(low < high) => {
                Err(bad("low must be smaller than high"))
            }
            _ => Ok(()),
        }
    }

    /// Produce the intervened column.
    pub fn intervene(&self, natural: ArrayView1<'_, f64>, rng: &mut StdRng) -> Array1<f64> {
        let n = natural.len();
        match *self {
            InterventionFunction::Constant { value } => Array1::from_elem(n, value),
            InterventionFunction::Gaussian { mean, std } => Array1::from_shape_fn(n, |_| {
                let z: f64 = rng.sample(StandardNormal);
                mean + std * z
            }),
            InterventionFunction::Uniform { low, high } => {
                Array1::from_shape_fn(n, |_| rng.gen_range(low..high))
            }
            InterventionFunction::Shift { offset } => natural.mapv(|x| x + offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn resolve_applies_argument_defaults() {
        let f = InterventionFunction::resolve("uniform", &serde_json::Value::Null).unwrap();
        assert_eq!(
            f,
            InterventionFunction::Uniform {
                low: -1.0,
                high: 1.0
            }
        );
    }

    #[test]
    fn resolve_rejects_unknown_key_and_bad_arguments() {
        assert!(InterventionFunction::resolve("soft", &serde_json::Value::Null).is_err());
        let args = serde_json::json!({ "low": 3.0, "high": 1.0 });
        assert!(InterventionFunction::resolve("uniform", &args).is_err());
        assert!(InterventionFunction::resolve("constant", &serde_json::json!(3.0)).is_err());
    }

    #[test]
    fn shift_reads_the_natural_values() {
        let f = InterventionFunction::Shift { offset: 2.0 };
        let natural = ndarray::arr1(&[1.0, -1.0]);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(f.intervene(natural.view(), &mut rng), ndarray::arr1(&[3.0, 1.0]));
    }
}
