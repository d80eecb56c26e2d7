use thiserror::Error;

/// Errors surfaced by a [`crate::CuckooMap`].
///
/// Duplicate-on-insert and not-found-on-remove/lookup are *not* represented
/// here — they are ordinary `bool`/`Finding` outcomes, not faults. This enum
/// exists solely for the one genuinely exceptional path: failing to grow the
/// cascade.
#[derive(Error, Debug)]
pub enum CuckooError {
    /// Appending a new overflow layer failed to allocate its backing
    /// storage. The map's invariants are preserved: the partial layer is
    /// never linked in, and the pair that triggered the growth is dropped
    /// rather than retried.
    #[error("failed to allocate overflow layer with {requested_buckets} buckets")]
    LayerAllocation { requested_buckets: usize },
}

pub type Result<T> = std::result::Result<T, CuckooError>;
