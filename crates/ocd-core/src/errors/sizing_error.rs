/// A requested size does not fit the data it applies to.
#[derive(Debug, thiserror::Error)]
pub enum SizingError {
    #[error(
        "interventional episode count {requested} is larger than the number of variables {available} \
         (try increasing the episode sizes instead)"
    )]
    TooManyEpisodes { requested: usize, available: usize },

    #[error("validation size {val_size} exceeds dataset `{dataset}` of length {len}")]
    ValidationTooLarge {
        dataset: String,
        val_size: usize,
        len: usize,
    },
}
