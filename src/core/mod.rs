//! Core module: Versioned-slot SPMC ring
//!
//! Prinsip desain:
//! - Lock-Free: Hanya atomic operations, tidak ada Mutex/RwLock
//! - No-Allocation: Slot array di-allocate sekali saat init
//! - Non-Blocking: Setiap call adalah urutan atomic yang pendek dan tetap

mod ring_buffer;
mod slot;
mod sync;

pub use ring_buffer::{channel, BlockRing, Consumer, Producer, RingBuffer, BLOCK_SIZE};
pub use slot::SlotState;
