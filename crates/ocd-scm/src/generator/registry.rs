//! Name → generator factory lookup.
//!
//! Keys are validated when a configuration is loaded; the factory itself
//! runs lazily, the first time data is generated.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ocd_core::errors::ConfigError;

use super::{GraphKind, RandomScmGenerator, ScmGenerator, ScmGeneratorArgs};

/// Builds a generator from `(seed, args)`.
pub type GeneratorFactory =
    Arc<dyn Fn(u64, &serde_json::Value) -> Result<Box<dyn ScmGenerator>, ConfigError> + Send + Sync>;

/// Fixed set of generator constructors, extensible by the caller.
#[derive(Clone)]
pub struct GeneratorRegistry {
    factories: BTreeMap<String, GeneratorFactory>,
}

impl GeneratorRegistry {
    /// A registry with no entries.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Add or replace a factory.
    pub fn register(&mut self, key: impl Into<String>, factory: GeneratorFactory) -> &mut Self {
        self.factories.insert(key.into(), factory);
        self
    }

    /// Look up a factory, failing with the list of known keys.
    pub fn resolve(&self, key: &str) -> Result<GeneratorFactory, ConfigError> {
        self.factories
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownKey {
                registry: "scm generator".into(),
                key: key.to_string(),
                known: self.keys().join(", "),
            })
    }

    pub fn keys(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

fn random_factory(kind: GraphKind) -> GeneratorFactory {
    Arc::new(
        move |seed: u64, args: &serde_json::Value| -> Result<Box<dyn ScmGenerator>, ConfigError> {
            let args = ScmGeneratorArgs::from_value(args)?;
            Ok(Box::new(RandomScmGenerator::new(kind, seed, args)))
        },
    )
}

impl Default for GeneratorRegistry {
    /// The built-in random generators: `erdos_renyi`, `chain`, `full`.
    fn default() -> Self {
        let mut registry = Self::empty();
        for kind in [GraphKind::ErdosRenyi, GraphKind::Chain, GraphKind::Full] {
            registry.register(kind.key(), random_factory(kind));
        }
        registry
    }
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
