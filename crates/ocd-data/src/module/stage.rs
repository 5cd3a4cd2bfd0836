use std::fmt;
use std::str::FromStr;

use ocd_core::errors::ConfigError;

/// Lifecycle stage requested by the training driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fit,
    Validate,
    Test,
    Predict,
    Tune,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fit => "fit",
            Stage::Validate => "validate",
            Stage::Test => "test",
            Stage::Predict => "predict",
            Stage::Tune => "tune",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fit" => Ok(Stage::Fit),
            "validate" => Ok(Stage::Validate),
            "test" => Ok(Stage::Test),
            "predict" => Ok(Stage::Predict),
            "tune" => Ok(Stage::Tune),
            other => Err(ConfigError::UnknownKey {
                registry: "stage".into(),
                key: other.to_string(),
                known: "fit, validate, test, predict, tune".into(),
            }),
        }
    }
}
