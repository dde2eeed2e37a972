//! slotring - Lock-free single-producer, multi-consumer block ring
//!
//! Arsitektur:
//! - Satu producer publish block ukuran tetap ke versioned slots
//! - Consumer berebut setiap block dengan CAS pada tail yang sama
//! - Setiap block sampai ke paling banyak satu consumer
//! - Tanpa backpressure: consumer yang tertinggal kehilangan block yang
//!   di-overwrite (dan diberi tahu lewat error), producer tidak pernah menunggu
//!
//! ```
//! use slotring::{channel, DequeueError, BLOCK_SIZE};
//!
//! let (mut tx, rx) = channel(16).unwrap();
//! tx.enqueue(b"hello").unwrap();
//!
//! let mut buf = [0u8; BLOCK_SIZE];
//! assert_eq!(rx.try_dequeue(&mut buf), Ok(5));
//! assert_eq!(&buf[..5], b"hello");
//! assert_eq!(rx.try_dequeue(&mut buf), Err(DequeueError::NotReady));
//! ```

pub mod baseline;
pub mod core;
pub mod error;
pub mod retry;

pub use crate::core::{
    channel, BlockRing, Consumer, Producer, RingBuffer, SlotState, BLOCK_SIZE,
};
pub use crate::error::{DequeueError, RingError};
pub use crate::retry::RetryPolicy;
