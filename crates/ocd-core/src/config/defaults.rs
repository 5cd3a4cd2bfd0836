// Single source of truth for all default values.

// --- Data generation ---
pub const DEFAULT_OBSERVATION_SIZE: usize = 1_000;
pub const DEFAULT_SEED: u64 = 0;
pub const DEFAULT_SCM_GENERATOR: &str = "erdos_renyi";

// --- Batch sources ---
pub const DEFAULT_BATCH_SIZE: usize = 16;
pub const DEFAULT_PIN_MEMORY: bool = true;
pub const DEFAULT_TRAIN_SHUFFLE: bool = true;
pub const DEFAULT_VAL_SHUFFLE: bool = false;
pub const DEFAULT_NUM_WORKERS: usize = 0;
pub const DEFAULT_DROP_LAST: bool = false;

// --- Masked layers ---
pub const DEFAULT_BIAS: bool = true;
pub const DEFAULT_AUTO_CONNECTION: bool = true;
pub const DEFAULT_REVERSED_ORDERING: bool = false;
pub const DEFAULT_ELEMENTWISE_PERM: bool = false;
pub const DEFAULT_DROPOUT: f64 = 0.0;
pub const DEFAULT_MASK_THRESHOLD: f64 = 0.5;

// --- Batch norm ---
pub const DEFAULT_BATCH_NORM_EPS: f64 = 1e-5;
pub const DEFAULT_BATCH_NORM_MOMENTUM: f64 = 0.1;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_WITH_SOURCE_LOCATION: bool = false;
