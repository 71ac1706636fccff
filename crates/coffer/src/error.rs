use coffer_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChestError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("no loader configured; set one with Coffer::with_loader")]
    MissingLoader,

    #[error("loader error: {0}")]
    Loader(String),

    #[error("background task failed: {0}")]
    Task(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// Some keys could not be deleted. Keys that were deleted stay deleted.
    #[error("failed to delete {failed} of {attempted} entries; first error: {first}")]
    DeleteAll {
        attempted: usize,
        failed: usize,
        #[source]
        first: StoreError,
    },
}

pub type ChestResult<T> = Result<T, ChestError>;
