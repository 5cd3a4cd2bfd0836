//! Batch sources over dataset views.

use std::cell::{Cell, OnceCell};
use std::sync::Arc;

use ndarray::{Array2, Axis};
use rand::seq::SliceRandom;
use rayon::prelude::*;
use rayon::ThreadPool;

use ocd_core::config::SplitSettings;
use ocd_core::errors::{ConfigError, OcdResult};
use ocd_core::NodeId;
use ocd_scm::{stream_rng, SeedStream};

use crate::dataset::{OcdDataset, Subset};

/// One collated batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// `(batch_size, num_variables)` rows copied out of the dataset.
    pub samples: Array2<f64>,
    /// Row indices into the source dataset.
    pub indices: Vec<usize>,
    pub intervention_column: Option<NodeId>,
    pub dataset: String,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

fn collate(dataset: &OcdDataset, indices: &[usize]) -> Batch {
    Batch {
        samples: dataset.samples().values().select(Axis(0), indices),
        indices: indices.to_vec(),
        intervention_column: dataset.intervention_column(),
        dataset: dataset.name().to_string(),
    }
}

/// Per-call overrides for [`crate::OcdDataModule::get_dataloader`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderOverrides {
    pub batch_size: Option<usize>,
    pub shuffle: Option<bool>,
    pub num_workers: Option<usize>,
    pub pin_memory: Option<bool>,
    pub drop_last: Option<bool>,
    pub seed: Option<u64>,
}

impl LoaderOverrides {
    /// Layer these overrides on top of resolved split settings.
    pub fn apply(&self, settings: SplitSettings) -> SplitSettings {
        let mut out = settings;
        out.batch_size = self.batch_size.unwrap_or(settings.batch_size);
        out.shuffle = self.shuffle.unwrap_or(settings.shuffle);
        out.num_workers = self.num_workers.unwrap_or(settings.num_workers);
        out.pin_memory = self.pin_memory.unwrap_or(settings.pin_memory);
        out.loader_args.drop_last = self.drop_last.unwrap_or(settings.loader_args.drop_last);
        out.loader_args.seed = self.seed.or(settings.loader_args.seed);
        out
    }
}

/// Iterates a [`Subset`] in batches.
///
/// With shuffling on, every call to [`DataLoader::iter`] starts a new epoch
/// whose order is derived from `(seed, stream, epoch)`. Loaders over
/// different datasets use different streams, so they never shuffle in lockstep
/// even when they share a seed.
#[derive(Debug)]
pub struct DataLoader {
    source: Subset,
    batch_size: usize,
    shuffle: bool,
    drop_last: bool,
    num_workers: usize,
    pin_memory: bool,
    seed: u64,
    stream: u32,
    epoch: Cell<u64>,
    pool: OnceCell<Option<ThreadPool>>,
}

impl DataLoader {
    pub fn new(source: Subset, settings: SplitSettings, seed: u64) -> OcdResult<Self> {
        if settings.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch_size".into(),
                reason: "must be positive to build a batch source".into(),
            }
            .into());
        }
        Ok(Self {
            source,
            batch_size: settings.batch_size,
            shuffle: settings.shuffle,
            drop_last: settings.loader_args.drop_last,
            num_workers: settings.num_workers,
            pin_memory: settings.pin_memory,
            seed: settings.loader_args.seed.unwrap_or(seed),
            stream: 0,
            epoch: Cell::new(0),
            pool: OnceCell::new(),
        })
    }

    /// Shuffle on stream `stream`, usually the dataset's position.
    pub fn with_stream(mut self, stream: u32) -> Self {
        self.stream = stream;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn stream(&self) -> u32 {
        self.stream
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn drop_last(&self) -> bool {
        self.drop_last
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Carried for callers that move batches to pinned host memory.
    pub fn pin_memory(&self) -> bool {
        self.pin_memory
    }

    pub fn source(&self) -> &Subset {
        &self.source
    }

    /// Number of batches per epoch.
    pub fn len(&self) -> usize {
        let rows = self.source.len();
        if self.drop_last {
            rows / self.batch_size
        } else {
            rows.div_ceil(self.batch_size)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start the next epoch.
    pub fn iter(&self) -> BatchIter {
        let epoch = self.epoch.get();
        self.epoch.set(epoch + 1);
        self.iter_epoch(epoch)
    }

    /// Iterate a specific epoch without advancing the counter.
    pub fn iter_epoch(&self, epoch: u64) -> BatchIter {
        BatchIter {
            dataset: Arc::clone(self.source.dataset()),
            order: self.epoch_order(epoch),
            batch_size: self.batch_size,
            drop_last: self.drop_last,
            position: 0,
        }
    }

    /// Collate a whole epoch up front, on `num_workers` threads when set.
    pub fn prefetch(&self) -> Vec<Batch> {
        let epoch = self.epoch.get();
        self.epoch.set(epoch + 1);
        let order = self.epoch_order(epoch);
        let chunks: Vec<&[usize]> = order
            .chunks(self.batch_size)
            .filter(|c| !self.drop_last || c.len() == self.batch_size)
            .collect();
        let dataset = self.source.dataset();

        match self.worker_pool() {
            Some(pool) => pool.install(|| chunks.par_iter().map(|c| collate(dataset, c)).collect()),
            None => chunks.into_iter().map(|c| collate(dataset, c)).collect(),
        }
    }

    /// The collation pool, built on first use and kept for the loader's
    /// lifetime. `None` without workers or when the pool cannot be built.
    fn worker_pool(&self) -> Option<&ThreadPool> {
        if self.num_workers == 0 {
            return None;
        }
        self.pool
            .get_or_init(|| {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.num_workers)
                    .build()
                    .map_err(|e| {
                        tracing::warn!(error = %e, "worker pool unavailable, collating on the caller thread");
                    })
                    .ok()
            })
            .as_ref()
    }

    /// Whether the collation pool has been built.
    pub fn has_worker_pool(&self) -> bool {
        matches!(self.pool.get(), Some(Some(_)))
    }

    fn epoch_order(&self, epoch: u64) -> Vec<usize> {
        let mut order = self.source.indices().to_vec();
        if self.shuffle {
            let mut rng = stream_rng(self.seed.wrapping_add(epoch), SeedStream::Loader, self.stream);
            order.shuffle(&mut rng);
        }
        order
    }
}

/// Iterator over the batches of one epoch.
#[derive(Debug)]
pub struct BatchIter {
    dataset: Arc<OcdDataset>,
    order: Vec<usize>,
    batch_size: usize,
    drop_last: bool,
    position: usize,
}

impl Iterator for BatchIter {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        let remaining = self.order.len() - self.position;
        if remaining == 0 || (self.drop_last && remaining < self.batch_size) {
            return None;
        }
        let end = self.position + remaining.min(self.batch_size);
        let batch = collate(&self.dataset, &self.order[self.position..end]);
        self.position = end;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.order.len() - self.position;
        let n = if self.drop_last {
            remaining / self.batch_size
        } else {
            remaining.div_ceil(self.batch_size)
        };
        (n, Some(n))
    }
}

impl ExactSizeIterator for BatchIter {}

/// What a split hands to the training driver: one loader per dataset,
/// unwrapped when there is only one.
#[derive(Debug)]
pub enum Loaders {
    Single(DataLoader),
    Multiple(Vec<DataLoader>),
}

impl Loaders {
    pub(crate) fn from_vec(mut loaders: Vec<DataLoader>) -> Option<Self> {
        match loaders.len() {
            0 => None,
            1 => loaders.pop().map(Loaders::Single),
            _ => Some(Loaders::Multiple(loaders)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Loaders::Single(_) => 1,
            Loaders::Multiple(loaders) => loaders.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[DataLoader] {
        match self {
            Loaders::Single(loader) => std::slice::from_ref(loader),
            Loaders::Multiple(loaders) => loaders,
        }
    }

    pub fn into_vec(self) -> Vec<DataLoader> {
        match self {
            Loaders::Single(loader) => vec![loader],
            Loaders::Multiple(loaders) => loaders,
        }
    }
}
