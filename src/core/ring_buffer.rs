//! Lock-Free Single-Producer Multi-Consumer (SPMC) Ring Buffer
//!
//! Satu producer publish block ukuran tetap; consumer berebut tail yang sama
//! lewat compare-and-swap, jadi setiap block sampai ke paling banyak satu
//! consumer. Tidak ada backpressure: producer tidak pernah menunggu dan akan
//! overwrite block yang belum di-claim.
//!
//! Ring tidak pernah block atau retry sendiri. Strategi retry ada di caller,
//! lihat [`crate::retry`].

use crossbeam_utils::CachePadded;
use tracing::{debug, trace};

use super::slot::{Slot, SlotState};
use super::sync::{Arc, AtomicBool, AtomicUsize, Ordering};
use crate::error::{DequeueError, RingError};

/// Default ukuran payload slot, satu cache line.
pub const BLOCK_SIZE: usize = 64;

/// Ring dengan block default 64 bytes.
pub type BlockRing = RingBuffer<BLOCK_SIZE>;

/// Ring berkapasitas tetap dengan block `N` bytes.
///
/// `head` dan `tail` adalah counter yang terus naik; counter dipetakan ke
/// slot `counter % capacity`. Keduanya di cache line terpisah untuk
/// menghindari false sharing antara producer dan consumer.
///
/// Invariant: `tail <= head`, dan hanya counter di `[tail, head)` yang boleh
/// di-claim.
pub struct RingBuffer<const N: usize> {
    // Producer side
    head: CachePadded<AtomicUsize>,
    // Consumer side, advanced by CAS only
    tail: CachePadded<AtomicUsize>,
    slots: Box<[Slot<N>]>,
    capacity: usize,
    producer_alive: AtomicBool,
}

impl<const N: usize> RingBuffer<N> {
    /// Alokasi `capacity` slot kosong. Ini satu-satunya alokasi ring.
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        if N == 0 {
            return Err(RingError::BlockSizeZero);
        }
        if capacity == 0 {
            return Err(RingError::CapacityZero);
        }

        let slots: Box<[Slot<N>]> = (0..capacity).map(|_| Slot::new()).collect();
        debug!(capacity, block_size = N, "ring buffer allocated");

        Ok(Self {
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            slots,
            capacity,
            producer_alive: AtomicBool::new(true),
        })
    }

    /// Pecah ring menjadi producer unik dan consumer yang bisa di-clone.
    pub fn split(self) -> (Producer<N>, Consumer<N>) {
        let ring = Arc::new(self);
        (
            Producer {
                ring: Arc::clone(&ring),
            },
            Consumer { ring },
        )
    }

    #[inline(always)]
    fn slot(&self, counter: usize) -> &Slot<N> {
        &self.slots[counter % self.capacity]
    }

    /// Publish satu block. Hanya boleh jalan di satu thread;
    /// [`Producer`] menjamin itu karena hanya dia yang bisa memanggil ini.
    #[inline]
    fn enqueue(&self, data: &[u8]) -> Result<(), RingError> {
        if data.len() > N {
            return Err(RingError::SizeExceeded {
                size: data.len(),
                max: N,
            });
        }

        // Only the producer writes head, so its own view is current.
        let head = self.head.load(Ordering::Relaxed);
        let slot = self.slot(head);

        slot.begin_write();
        slot.write(data);
        // Head moves before READY: whoever acquires READY also sees the new
        // head, which keeps lag detection exact.
        self.head.store(head.wrapping_add(1), Ordering::Release);
        slot.publish();

        Ok(())
    }

    /// Coba claim block di tail.
    ///
    /// Jika berhasil, block di-copy ke `buf` dan panjangnya dikembalikan.
    /// Jika gagal, `buf` tidak diubah sama sekali. `buf` minimal `N` bytes.
    pub fn try_dequeue(&self, buf: &mut [u8]) -> Result<usize, DequeueError> {
        if buf.len() < N {
            return Err(DequeueError::BufferTooSmall {
                len: buf.len(),
                required: N,
            });
        }

        let tail = self.tail.load(Ordering::Acquire);
        let slot = self.slot(tail);

        match slot.state() {
            SlotState::Ready => {}
            SlotState::Consumed => return self.skip_consumed(tail, slot),
            SlotState::Empty | SlotState::Writing => return Err(DequeueError::NotReady),
        }

        // READY was acquired, so head is at least as new as that publish.
        let head = self.head.load(Ordering::Acquire);
        let pending = head.wrapping_sub(tail);
        if pending == 0 {
            // Previous lap's block, claimed but not yet marked CONSUMED.
            return Err(DequeueError::NotReady);
        }
        if pending > self.capacity {
            return self.skip_lagged(tail, head);
        }
        // The READY above may predate this lap's rewrite. Under the acquired
        // head the producer's WRITING store for `tail` is visible, so READY
        // now belongs to this counter or to a later lap the final head
        // check catches.
        if !slot.state().is_claimable() {
            return Err(DequeueError::NotReady);
        }

        if self
            .tail
            .compare_exchange(
                tail,
                tail.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_err()
        {
            return Err(DequeueError::ClaimLost);
        }

        let mut scratch = [0u8; N];
        let len = slot.read_into(&mut scratch);

        if !slot.finish_read() {
            trace!(tail, "slot rewritten during copy-out");
            return Err(DequeueError::Overwritten);
        }
        // A full lap lands back on READY and fools the version check, but
        // its publish came after the head store, so the head gives it away.
        // The later block we marked is skipped by `skip_consumed`.
        if self.head.load(Ordering::Acquire).wrapping_sub(tail) > self.capacity {
            trace!(tail, "ring lapped during copy-out");
            return Err(DequeueError::Overwritten);
        }

        buf[..len].copy_from_slice(&scratch[..len]);
        Ok(len)
    }

    /// The tail slot reads CONSUMED. Normally that is just a drained ring,
    /// but if the producer already moved past the tail the block there was
    /// lost to a lapped reader and the tail has to step over it.
    #[cold]
    fn skip_consumed(&self, tail: usize, slot: &Slot<N>) -> Result<usize, DequeueError> {
        let head = self.head.load(Ordering::Acquire);
        if head == tail {
            return Err(DequeueError::NotReady);
        }
        // The head we acquired orders after the producer's WRITING store for
        // this counter; still CONSUMED now means the block is gone.
        if slot.state() != SlotState::Consumed {
            return Err(DequeueError::NotReady);
        }
        if head.wrapping_sub(tail) > self.capacity {
            return self.skip_lagged(tail, head);
        }
        match self.tail.compare_exchange(
            tail,
            tail.wrapping_add(1),
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => {
                trace!(tail, "skipping block lost to a lapped reader");
                Err(DequeueError::Lagged { skipped: 1 })
            }
            Err(_) => Err(DequeueError::ClaimLost),
        }
    }

    /// Majukan tail ke block tertua yang masih tersimpan.
    #[cold]
    fn skip_lagged(&self, tail: usize, head: usize) -> Result<usize, DequeueError> {
        let oldest = head.wrapping_sub(self.capacity);
        match self
            .tail
            .compare_exchange(tail, oldest, Ordering::AcqRel, Ordering::Relaxed)
        {
            Ok(_) => {
                let skipped = oldest.wrapping_sub(tail);
                trace!(tail, oldest, skipped, "consumers lapped, skipping");
                Err(DequeueError::Lagged { skipped })
            }
            Err(_) => Err(DequeueError::ClaimLost),
        }
    }

    /// Jumlah slot.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Block terbesar yang muat di satu slot.
    #[inline(always)]
    pub const fn block_size(&self) -> usize {
        N
    }

    /// Perkiraan jumlah block yang belum di-claim. Racy, tapi tidak pernah
    /// lebih dari capacity.
    #[inline]
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        head.wrapping_sub(tail).min(self.capacity)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// State slot yang akan dicek dequeue berikutnya.
    pub fn tail_state(&self) -> SlotState {
        self.slot(self.tail.load(Ordering::Acquire)).state()
    }
}

/// Write handle unik untuk sebuah ring.
pub struct Producer<const N: usize = BLOCK_SIZE> {
    ring: Arc<RingBuffer<N>>,
}

impl<const N: usize> Producer<N> {
    /// Publish `data`, overwrite slot tertua jika consumer tertinggal satu
    /// putaran penuh. Hanya gagal jika `data` tidak muat di slot.
    #[inline]
    pub fn enqueue(&mut self, data: &[u8]) -> Result<(), RingError> {
        self.ring.enqueue(data)
    }

    #[inline(always)]
    pub fn ring(&self) -> &RingBuffer<N> {
        &self.ring
    }
}

impl<const N: usize> Drop for Producer<N> {
    fn drop(&mut self) {
        self.ring.producer_alive.store(false, Ordering::Release);
        debug!("producer dropped");
    }
}

/// Read handle. Clone satu per consumer thread.
pub struct Consumer<const N: usize = BLOCK_SIZE> {
    ring: Arc<RingBuffer<N>>,
}

impl<const N: usize> Clone for Consumer<N> {
    fn clone(&self) -> Self {
        Self {
            ring: Arc::clone(&self.ring),
        }
    }
}

impl<const N: usize> Consumer<N> {
    /// See [`RingBuffer::try_dequeue`].
    #[inline]
    pub fn try_dequeue(&self, buf: &mut [u8]) -> Result<usize, DequeueError> {
        self.ring.try_dequeue(buf)
    }

    /// Satu kali coba, `Some(len)` jika berhasil.
    #[inline]
    pub fn dequeue(&self, buf: &mut [u8]) -> Option<usize> {
        self.ring.try_dequeue(buf).ok()
    }

    /// `false` setelah producer di-drop. Block yang di-publish sebelumnya
    /// mungkin masih menunggu di-claim.
    #[inline]
    pub fn producer_alive(&self) -> bool {
        self.ring.producer_alive.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub fn ring(&self) -> &RingBuffer<N> {
        &self.ring
    }
}

/// Buat ring dengan block default lalu pecah jadi producer/consumer.
pub fn channel(capacity: usize) -> Result<(Producer, Consumer), RingError> {
    Ok(BlockRing::new(capacity)?.split())
}
