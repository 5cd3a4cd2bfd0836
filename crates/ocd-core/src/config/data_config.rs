use std::fmt;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::{ConfigError, OcdResult, SizingError};

/// Size of the validation split carved out of every dataset.
///
/// An integer is an absolute row count; a float is a fraction in `(0, 1)`.
/// Zero (either form) disables validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValSize {
    Count(usize),
    Fraction(f64),
}

impl ValSize {
    /// Reject fractions outside `[0, 1)` and non-finite values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            ValSize::Count(_) => Ok(()),
            ValSize::Fraction(f) if f.is_finite() && (0.0..1.0).contains(&f) => Ok(()),
            ValSize::Fraction(f) => Err(ConfigError::InvalidValSize {
                value: f.to_string(),
                reason: "either an integer, a fraction between zero and one, or none".into(),
            }),
        }
    }

    /// Whether this size actually produces a validation split.
    pub fn is_enabled(&self) -> bool {
        match *self {
            ValSize::Count(n) => n > 0,
            ValSize::Fraction(f) => f > 0.0,
        }
    }

    /// Number of rows left for training out of a dataset of length `len`.
    pub fn train_len(&self, dataset: &str, len: usize) -> Result<usize, SizingError> {
        match *self {
            ValSize::Count(n) => len.checked_sub(n).ok_or_else(|| SizingError::ValidationTooLarge {
                dataset: dataset.to_string(),
                val_size: n,
                len,
            }),
            ValSize::Fraction(f) => Ok((len as f64 * (1.0 - f)).floor() as usize),
        }
    }
}

impl fmt::Display for ValSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValSize::Count(n) => write!(f, "{n}"),
            ValSize::Fraction(v) => write!(f, "{v}"),
        }
    }
}

/// Extra batch-source arguments. A split-specific set replaces the shared
/// one entirely rather than merging field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderArgs {
    /// Drop the trailing batch when it is smaller than the batch size.
    pub drop_last: bool,
    /// Seed for the shuffling stream. Falls back to the module seed.
    pub seed: Option<u64>,
}

impl Default for LoaderArgs {
    fn default() -> Self {
        Self {
            drop_last: defaults::DEFAULT_DROP_LAST,
            seed: None,
        }
    }
}

/// Which partition a batch source serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Val,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Batch-source settings for one split after the override chain is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitSettings {
    /// Zero means the split is disabled.
    pub batch_size: usize,
    pub shuffle: bool,
    pub num_workers: usize,
    pub pin_memory: bool,
    pub loader_args: LoaderArgs,
}

/// Data orchestrator configuration.
///
/// Split-specific `train_*` / `val_*` knobs override their shared
/// counterpart; see [`DataModuleConfig::resolve`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataModuleConfig {
    /// Row count of the observational sample.
    pub observation_size: usize,
    /// Number of interventional episodes; none or zero disables them.
    pub interventional_episode_count: Option<usize>,
    /// Row count of each episode. Defaults to `observation_size`.
    pub interventional_episode_size: Option<usize>,
    /// Registry key of the intervention function.
    pub intervention_function: Option<String>,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub intervention_function_args: serde_json::Value,
    /// Registry key of the SCM generator.
    pub scm_generator: String,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub scm_generator_args: serde_json::Value,
    pub val_size: Option<ValSize>,
    /// Base seed for generation and splitting.
    pub seed: u64,

    pub dl_args: Option<LoaderArgs>,
    pub train_dl_args: Option<LoaderArgs>,
    pub val_dl_args: Option<LoaderArgs>,

    pub batch_size: Option<usize>,
    pub train_batch_size: Option<usize>,
    pub val_batch_size: Option<usize>,

    pub pin_memory: bool,
    pub train_pin_memory: Option<bool>,
    pub val_pin_memory: Option<bool>,

    pub train_shuffle: bool,
    pub val_shuffle: bool,

    pub num_workers: usize,
    pub train_num_workers: Option<usize>,
    pub val_num_workers: Option<usize>,
}

impl Default for DataModuleConfig {
    fn default() -> Self {
        Self {
            observation_size: defaults::DEFAULT_OBSERVATION_SIZE,
            interventional_episode_count: None,
            interventional_episode_size: None,
            intervention_function: None,
            intervention_function_args: serde_json::Value::Null,
            scm_generator: defaults::DEFAULT_SCM_GENERATOR.to_string(),
            scm_generator_args: serde_json::Value::Null,
            val_size: None,
            seed: defaults::DEFAULT_SEED,
            dl_args: None,
            train_dl_args: None,
            val_dl_args: None,
            batch_size: Some(defaults::DEFAULT_BATCH_SIZE),
            train_batch_size: None,
            val_batch_size: None,
            pin_memory: defaults::DEFAULT_PIN_MEMORY,
            train_pin_memory: None,
            val_pin_memory: None,
            train_shuffle: defaults::DEFAULT_TRAIN_SHUFFLE,
            val_shuffle: defaults::DEFAULT_VAL_SHUFFLE,
            num_workers: defaults::DEFAULT_NUM_WORKERS,
            train_num_workers: None,
            val_num_workers: None,
        }
    }
}

impl DataModuleConfig {
    /// Check the knobs that can be judged without generating any data.
    pub fn validate(&self) -> OcdResult<()> {
        if let Some(val_size) = &self.val_size {
            val_size.validate()?;
        }
        let train = self.resolve(Split::Train).batch_size;
        let val = self.resolve(Split::Val).batch_size;
        if train == 0 && val == 0 {
            return Err(ConfigError::NoPositiveBatchSize.into());
        }
        Ok(())
    }

    /// Row count of each interventional episode.
    pub fn episode_size(&self) -> usize {
        self.interventional_episode_size
            .unwrap_or(self.observation_size)
    }

    /// Validation size if it actually carves out rows.
    pub fn effective_val_size(&self) -> Option<ValSize> {
        self.val_size.filter(ValSize::is_enabled)
    }

    /// Apply the override chain for `split`.
    pub fn resolve(&self, split: Split) -> SplitSettings {
        let (batch_size, shuffle, num_workers, pin_memory, loader_args) = match split {
            Split::Train => (
                self.train_batch_size,
                self.train_shuffle,
                self.train_num_workers,
                self.train_pin_memory,
                self.train_dl_args,
            ),
            Split::Val => (
                self.val_batch_size,
                self.val_shuffle,
                self.val_num_workers,
                self.val_pin_memory,
                self.val_dl_args,
            ),
        };
        SplitSettings {
            batch_size: batch_size.or(self.batch_size).unwrap_or(0),
            shuffle,
            num_workers: num_workers.unwrap_or(self.num_workers),
            pin_memory: pin_memory.unwrap_or(self.pin_memory),
            loader_args: loader_args.or(self.dl_args).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_train_len_floors() {
        let v = ValSize::Fraction(0.3);
        assert_eq!(v.train_len("d", 10).unwrap(), 7);
        assert_eq!(v.train_len("d", 11).unwrap(), 7);
    }

    #[test]
    fn count_larger_than_dataset_is_rejected() {
        let v = ValSize::Count(20);
        assert!(v.train_len("d", 10).is_err());
    }

    #[test]
    fn fraction_out_of_range_is_rejected() {
        assert!(ValSize::Fraction(1.0).validate().is_err());
        assert!(ValSize::Fraction(-0.1).validate().is_err());
        assert!(ValSize::Fraction(f64::NAN).validate().is_err());
        assert!(ValSize::Fraction(0.0).validate().is_ok());
    }
}
