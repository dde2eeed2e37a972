//! Error types for ring construction, enqueue and dequeue.

use thiserror::Error;

/// Construction and producer-side failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// A ring must have at least one slot.
    #[error("ring capacity must be greater than zero")]
    CapacityZero,
    /// A slot must be able to hold at least one byte.
    #[error("slot block size must be greater than zero")]
    BlockSizeZero,
    /// The block does not fit into a slot payload.
    #[error("block of {size} bytes exceeds slot capacity of {max} bytes")]
    SizeExceeded { size: usize, max: usize },
}

/// Why a single dequeue attempt did not claim a block.
///
/// Every variant except [`DequeueError::BufferTooSmall`] is transient: the
/// ring is still consistent and the caller may simply try again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DequeueError {
    /// The slot at the tail is empty, being written, or already consumed.
    #[error("no ready block at the tail slot")]
    NotReady,
    /// Another consumer advanced the tail first.
    #[error("tail claim lost to a competing consumer")]
    ClaimLost,
    /// The producer lapped the consumers; the tail was moved forward past
    /// blocks that had already been overwritten.
    #[error("consumers fell behind, skipped {skipped} overwritten blocks")]
    Lagged { skipped: usize },
    /// The producer rewrote the claimed slot while it was being copied out.
    #[error("claimed block was overwritten during copy-out")]
    Overwritten,
    /// The destination cannot hold a full slot payload.
    #[error("destination buffer of {len} bytes is smaller than slot capacity of {required} bytes")]
    BufferTooSmall { len: usize, required: usize },
}

impl DequeueError {
    /// Whether retrying the same call can succeed.
    #[inline]
    pub fn is_transient(&self) -> bool {
        !matches!(self, DequeueError::BufferTooSmall { .. })
    }
}
