/// Invalid or unresolvable configuration. Raised at construction time.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid validation size {value}: {reason}")]
    InvalidValSize { value: String, reason: String },

    #[error("unknown {registry} `{key}` (known: {known})")]
    UnknownKey {
        registry: String,
        key: String,
        known: String,
    },

    #[error("invalid arguments for {component}: {reason}")]
    InvalidArguments { component: String, reason: String },

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("at least one of the batch sizes must be positive")]
    NoPositiveBatchSize,

    #[error("failed to parse config: {reason}")]
    Parse { reason: String },
}
