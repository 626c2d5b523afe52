/// Error taxonomy for the sorting pipeline.
///
/// Lookup misses are deliberately NOT errors: they are recovered locally
/// (logged and substituted with [`crate::sort::MISS_RANK`]) so a single
/// unknown signature never aborts a multi-million-word batch.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SortError {
    /// The sharded path needs a minimum number of producer workers; raised
    /// before any worker is launched so the failure is atomic.
    #[error("insufficient parallelism: {available} usable worker(s), at least {required} required")]
    InsufficientParallelism { available: usize, required: usize },

    /// A sort key's arity differs from the batch arity. Structurally
    /// impossible when padding is correct; raised rather than swallowed
    /// because it means the padding stage is defective.
    #[error("malformed batch: sort key arity {found} does not match batch arity {expected}")]
    MalformedBatch { expected: usize, found: usize },

    /// A pipeline worker thread terminated abnormally.
    #[error("{0} worker terminated abnormally")]
    WorkerPanicked(&'static str),
}
