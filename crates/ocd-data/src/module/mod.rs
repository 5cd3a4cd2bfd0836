//! OcdDataModule: owns the SCM generator, builds the observational and
//! interventional datasets, splits them, and hands out batch sources.

mod stage;

pub use stage::Stage;

use std::fmt;
use std::sync::Arc;

use rand::seq::SliceRandom;
use tracing::{debug, info};

use ocd_core::config::{DataModuleConfig, Split, SplitSettings};
use ocd_core::errors::{OcdError, OcdResult, SizingError};
use ocd_scm::{
    stream_rng, GeneratorFactory, GeneratorRegistry, InterventionFunction, Scm, ScmGenerator,
    SeedStream,
};

use crate::dataset::{random_split, OcdDataset, Subset};
use crate::loader::{DataLoader, LoaderOverrides, Loaders};

/// Where the module is in its lifecycle. There is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Constructed and validated, nothing generated.
    Configured,
    /// `generate_datasets` has run at least once.
    Generated,
    /// `setup` has stored train (and maybe val) data; loaders are available.
    Ready,
}

/// The generator is built on first use and reused for the module's lifetime.
struct GeneratorSlot {
    key: String,
    factory: GeneratorFactory,
    args: serde_json::Value,
    instance: Option<Box<dyn ScmGenerator>>,
}

impl GeneratorSlot {
    fn get_or_build(&mut self, seed: u64) -> OcdResult<&mut dyn ScmGenerator> {
        let generator = match self.instance.take() {
            Some(generator) => generator,
            None => {
                let generator = (self.factory)(seed, &self.args)?;
                debug!(key = %self.key, "constructed scm generator");
                generator
            }
        };
        Ok(self.instance.insert(generator).as_mut())
    }
}

impl fmt::Debug for GeneratorSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorSlot")
            .field("key", &self.key)
            .field("built", &self.instance.is_some())
            .finish()
    }
}

/// Data orchestrator for one observational dataset plus interventional
/// episodes, all sharing one DAG.
#[derive(Debug)]
pub struct OcdDataModule {
    config: DataModuleConfig,
    intervention_function: Option<InterventionFunction>,
    train_settings: SplitSettings,
    val_settings: SplitSettings,
    generator: GeneratorSlot,
    scm: Option<Scm>,
    datasets: Vec<Arc<OcdDataset>>,
    train_data: Option<Vec<Subset>>,
    val_data: Option<Vec<Subset>>,
    state: ModuleState,
}

impl OcdDataModule {
    /// Build with the built-in generator registry.
    pub fn new(config: DataModuleConfig) -> OcdResult<Self> {
        Self::with_registry(config, &GeneratorRegistry::default())
    }

    /// Build, resolving the generator key against `registry`.
    ///
    /// Every configuration problem that does not need generated data
    /// surfaces here.
    pub fn with_registry(config: DataModuleConfig, registry: &GeneratorRegistry) -> OcdResult<Self> {
        config.validate()?;
        let factory = registry.resolve(&config.scm_generator)?;
        let intervention_function = config
            .intervention_function
            .as_deref()
            .map(|key| InterventionFunction::resolve(key, &config.intervention_function_args))
            .transpose()?;

        let train_settings = config.resolve(Split::Train);
        let val_settings = config.resolve(Split::Val);
        debug!(?train_settings, ?val_settings, "resolved batch source settings");

        Ok(Self {
            generator: GeneratorSlot {
                key: config.scm_generator.clone(),
                factory,
                args: config.scm_generator_args.clone(),
                instance: None,
            },
            intervention_function,
            train_settings,
            val_settings,
            scm: None,
            datasets: Vec::new(),
            train_data: None,
            val_data: None,
            state: ModuleState::Configured,
            config,
        })
    }

    pub fn config(&self) -> &DataModuleConfig {
        &self.config
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    /// The SCM behind the most recent generation.
    pub fn scm(&self) -> Option<&Scm> {
        self.scm.as_ref()
    }

    /// Datasets stored by the most recent `setup`.
    pub fn datasets(&self) -> &[Arc<OcdDataset>] {
        &self.datasets
    }

    pub fn train_data(&self) -> Option<&[Subset]> {
        self.train_data.as_deref()
    }

    pub fn val_data(&self) -> Option<&[Subset]> {
        self.val_data.as_deref()
    }

    pub fn settings(&self, split: Split) -> SplitSettings {
        match split {
            Split::Train => self.train_settings,
            Split::Val => self.val_settings,
        }
    }

    /// The generator, constructed on first call.
    fn generator(&mut self) -> OcdResult<&mut dyn ScmGenerator> {
        self.generator.get_or_build(self.config.seed)
    }

    /// Generate the observational dataset followed by the interventional
    /// episodes in permutation order.
    ///
    /// Episode `i` intervenes on the `i`-th variable of a permutation drawn
    /// from the episode stream of `seed`, and samples with seed `seed + i + 1`.
    pub fn generate_datasets(&mut self) -> OcdResult<Vec<Arc<OcdDataset>>> {
        let seed = self.config.seed;
        let scm = self.generator()?.generate_scm()?;

        let episode_count = self
            .config
            .interventional_episode_count
            .filter(|&count| count > 0);
        let mut nodes = scm.nodes();
        if let Some(count) = episode_count {
            if count > nodes.len() {
                return Err(SizingError::TooManyEpisodes {
                    requested: count,
                    available: nodes.len(),
                }
                .into());
            }
        }

        let observational = scm.simulate(self.config.observation_size, seed, None, None)?;
        let mut datasets = vec![Arc::new(OcdDataset::new(
            observational,
            Arc::clone(scm.dag()),
            None,
            "observational",
        ))];
        info!(rows = self.config.observation_size, seed, "generated observational dataset");

        if let Some(count) = episode_count {
            let mut rng = stream_rng(seed, SeedStream::Episodes, 0);
            nodes.shuffle(&mut rng);

            let episode_size = self.config.episode_size();
            for (i, &node) in nodes.iter().take(count).enumerate() {
                let episode_seed = seed.wrapping_add(i as u64 + 1);
                let samples = scm.simulate(
                    episode_size,
                    episode_seed,
                    Some(node),
                    self.intervention_function.as_ref(),
                )?;
                datasets.push(Arc::new(OcdDataset::new(
                    samples,
                    Arc::clone(scm.dag()),
                    Some(node),
                    format!("interventional_{i}"),
                )));
                info!(
                    episode = i,
                    node,
                    rows = episode_size,
                    seed = episode_seed,
                    "generated interventional dataset"
                );
            }
        }

        self.scm = Some(scm);
        if self.state == ModuleState::Configured {
            self.state = ModuleState::Generated;
        }
        Ok(datasets)
    }

    /// Prepare data for `stage`.
    ///
    /// `Fit` and `Tune` regenerate every dataset and split it; running
    /// `setup` again redraws the same samples and overwrites the previous
    /// split. `Test` is not supported.
    pub fn setup(&mut self, stage: Stage) -> OcdResult<()> {
        match stage {
            Stage::Fit | Stage::Tune if self.train_settings.batch_size > 0 => self.setup_fit(),
            Stage::Test => Err(OcdError::UnsupportedStage {
                stage: stage.to_string(),
            }),
            _ => {
                debug!(%stage, "nothing to set up");
                Ok(())
            }
        }
    }

    fn setup_fit(&mut self) -> OcdResult<()> {
        let datasets = self.generate_datasets()?;

        let val_size = self
            .config
            .effective_val_size()
            .filter(|_| self.val_settings.batch_size > 0);

        let (train, val) = match val_size {
            Some(val_size) => {
                let mut prng = stream_rng(self.config.seed, SeedStream::Split, 0);
                let mut train = Vec::with_capacity(datasets.len());
                let mut val = Vec::with_capacity(datasets.len());
                for dataset in &datasets {
                    let train_len = val_size.train_len(dataset.name(), dataset.len())?;
                    let (t, v) = random_split(dataset, train_len, &mut prng)?;
                    debug!(
                        dataset = dataset.name(),
                        train = t.len(),
                        val = v.len(),
                        "split dataset"
                    );
                    train.push(t);
                    val.push(v);
                }
                (train, Some(val))
            }
            None => (
                datasets.iter().cloned().map(Subset::full).collect(),
                None,
            ),
        };

        self.datasets = datasets;
        self.train_data = Some(train);
        self.val_data = val;
        self.state = ModuleState::Ready;
        Ok(())
    }

    /// One batch source per stored dataset for `split`, or `None` when the
    /// split holds no data.
    pub fn get_dataloader(
        &self,
        split: Split,
        overrides: LoaderOverrides,
    ) -> OcdResult<Option<Loaders>> {
        let data = match split {
            Split::Train => self.train_data.as_ref(),
            Split::Val => self.val_data.as_ref(),
        };
        let Some(data) = data else {
            return Ok(None);
        };
        let settings = overrides.apply(self.settings(split));
        let loaders = data
            .iter()
            .enumerate()
            .map(|(i, subset)| {
                DataLoader::new(subset.clone(), settings, self.config.seed)
                    .map(|loader| loader.with_stream(i as u32))
            })
            .collect::<OcdResult<Vec<_>>>()?;
        Ok(Loaders::from_vec(loaders))
    }

    pub fn train_dataloader(&self) -> OcdResult<Option<Loaders>> {
        self.get_dataloader(Split::Train, LoaderOverrides::default())
    }

    pub fn val_dataloader(&self) -> OcdResult<Option<Loaders>> {
        self.get_dataloader(Split::Val, LoaderOverrides::default())
    }
}
