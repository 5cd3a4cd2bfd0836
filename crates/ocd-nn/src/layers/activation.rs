//! Element-wise activations, resolved by name.

use ndarray::Array2;
use serde_json::Value;
use tracing::debug;

use ocd_core::errors::ConfigError;

const SQRT_2_OVER_PI: f64 = 0.797_884_560_802_865_4;
const KAPPA: f64 = 0.044_715;

/// Registry keys accepted by [`Activation::resolve`].
pub const ACTIVATION_KEYS: &[&str] = &[
    "elu",
    "gelu",
    "identity",
    "leaky_relu",
    "relu",
    "sigmoid",
    "softplus",
    "tanh",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activation {
    Relu,
    LeakyRelu { negative_slope: f64 },
    Elu { alpha: f64 },
    Tanh,
    Sigmoid,
    Softplus { beta: f64, threshold: f64 },
    /// Tanh approximation.
    Gelu,
    Identity,
}

impl Activation {
    /// Look up `name` and bind its keyword arguments.
    ///
    /// Names are matched case-insensitively with underscores and a leading
    /// `torch.nn.` / `nn.` ignored, so `LeakyReLU`, `leaky_relu` and
    /// `torch.nn.LeakyReLU` are the same key.
    pub fn resolve(name: &str, args: &Value) -> Result<Self, ConfigError> {
        let args = match args {
            Value::Null => None,
            Value::Object(map) => Some(map),
            other => {
                return Err(ConfigError::InvalidArguments {
                    component: format!("activation `{name}`"),
                    reason: format!("expected a table of keyword arguments, got {other}"),
                })
            }
        };
        let arg = |key: &str, default: f64| -> Result<f64, ConfigError> {
            match args.and_then(|map| map.get(key)) {
                None => Ok(default),
                Some(v) => v.as_f64().ok_or_else(|| ConfigError::InvalidArguments {
                    component: format!("activation `{name}`"),
                    reason: format!("`{key}` must be a number, got {v}"),
                }),
            }
        };

        let activation = match normalise(name).as_str() {
            "relu" => Activation::Relu,
            "leakyrelu" => Activation::LeakyRelu {
                negative_slope: arg("negative_slope", 0.01)?,
            },
            "elu" => Activation::Elu {
                alpha: arg("alpha", 1.0)?,
            },
            "tanh" => Activation::Tanh,
            "sigmoid" => Activation::Sigmoid,
            "softplus" => {
                let beta = arg("beta", 1.0)?;
                if !(beta > 0.0) {
                    return Err(ConfigError::InvalidArguments {
                        component: "activation `softplus`".into(),
                        reason: format!("`beta` must be positive, got {beta}"),
                    });
                }
                Activation::Softplus {
                    beta,
                    threshold: arg("threshold", 20.0)?,
                }
            }
            "gelu" => Activation::Gelu,
            "identity" => Activation::Identity,
            _ => {
                return Err(ConfigError::UnknownKey {
                    registry: "activation".into(),
                    key: name.to_string(),
                    known: ACTIVATION_KEYS.join(", "),
                })
            }
        };
        debug!(name, ?activation, "resolved activation");
        Ok(activation)
    }

    pub fn apply(&self, x: f64) -> f64 {
        match *self {
            Activation::Relu => x.max(0.0),
            Activation::LeakyRelu { negative_slope } => {
                if x >= 0.0 {
                    x
                } else {
                    negative_slope * x
                }
            }
            Activation::Elu { alpha } => {
                if x > 0.0 {
                    x
                } else {
                    alpha * x.exp_m1()
                }
            }
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Softplus { beta, threshold } => {
                if beta * x > threshold {
                    x
                } else {
                    (beta * x).exp().ln_1p() / beta
                }
            }
            Activation::Gelu => {
                let inner = SQRT_2_OVER_PI * (x + KAPPA * x * x * x);
                0.5 * x * (1.0 + inner.tanh())
            }
            Activation::Identity => x,
        }
    }

    pub fn forward(&self, inputs: Array2<f64>) -> Array2<f64> {
        inputs.mapv_into(|x| self.apply(x))
    }
}

fn normalise(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    let stripped = lower
        .strip_prefix("torch.nn.")
        .or_else(|| lower.strip_prefix("nn."))
        .unwrap_or(&lower);
    stripped.replace('_', "")
}
