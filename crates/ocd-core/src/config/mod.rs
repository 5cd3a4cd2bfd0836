pub mod data_config;
pub mod defaults;
pub mod model_config;
pub mod observability_config;

pub use data_config::{DataModuleConfig, LoaderArgs, Split, SplitSettings, ValSize};
pub use model_config::{BatchNormArgs, Features, MaskPolicy, MaskedBlockConfig, MaskedMlpConfig};
pub use observability_config::ObservabilityConfig;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, OcdResult};

/// Top-level configuration, one section per subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OcdConfig {
    pub data: DataModuleConfig,
    pub model: MaskedMlpConfig,
    pub observability: ObservabilityConfig,
}

impl OcdConfig {
    /// Load config from a TOML string. Missing sections and fields use defaults.
    pub fn from_toml(toml_str: &str) -> OcdResult<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.data.validate()?;
        Ok(config)
    }

    /// Load config from a file on disk.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> OcdResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            reason: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml(&contents)
    }
}
