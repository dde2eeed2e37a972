//! Versioned slot: satu block payload yang dijaga atomic version word.
//!
//! Version sekaligus menjadi lifecycle state slot:
//!
//! ```text
//!  EMPTY(0) ──┐
//!             ├─ producer: store 1 ──> WRITING(1) ── producer: +1 ──> READY(2)
//! CONSUMED(4) ┘                                                          │
//!      ^                                                                 │
//!      └──────────────── winning consumer: READY -> CONSUMED ────────────┘
//! ```
//!
//! Producer selalu reset ke WRITING dengan plain store, apapun nilai
//! sebelumnya. Ganjil berarti write sedang berjalan; hanya READY yang persis
//! bisa di-claim.
//!
//! Payload disimpan sebagai relaxed atomic bytes. Consumer yang copy saat
//! producer overwrite slot hanya dapat data sampah (bukan undefined
//! behavior), dan version check sesudahnya membuang copy tersebut.

use super::sync::{fence, AtomicU8, AtomicUsize, Ordering};

pub(crate) const EMPTY: usize = 0;
pub(crate) const WRITING: usize = 1;
pub(crate) const READY: usize = 2;
pub(crate) const CONSUMED: usize = 4;

/// Lifecycle state hasil decode raw version slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Belum pernah ditulis.
    Empty,
    /// Producer sedang menulis block.
    Writing,
    /// Block sudah di-publish, belum di-claim.
    Ready,
    /// Sudah di-claim consumer; basi sampai producer menulis ulang.
    Consumed,
}

impl SlotState {
    /// Classifies a raw version word.
    #[inline]
    pub const fn from_version(version: usize) -> Self {
        if version == EMPTY {
            SlotState::Empty
        } else if version & 1 == 1 {
            SlotState::Writing
        } else if version == READY {
            SlotState::Ready
        } else {
            SlotState::Consumed
        }
    }

    /// Only a ready slot may be claimed.
    #[inline]
    pub const fn is_claimable(self) -> bool {
        matches!(self, SlotState::Ready)
    }
}

/// Satu slot dalam ring.
#[repr(C, align(64))] // Cache line alignment untuk menghindari false sharing
pub(crate) struct Slot<const N: usize> {
    version: AtomicUsize,
    length: AtomicUsize,
    payload: [AtomicU8; N],
}

impl<const N: usize> Slot<N> {
    pub(crate) fn new() -> Self {
        Self {
            version: AtomicUsize::new(EMPTY),
            length: AtomicUsize::new(0),
            payload: std::array::from_fn(|_| AtomicU8::new(0)),
        }
    }

    /// Acquire-loads the version. Payload is only trusted after this
    /// observed READY.
    #[inline(always)]
    pub(crate) fn version(&self) -> usize {
        self.version.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub(crate) fn state(&self) -> SlotState {
        SlotState::from_version(self.version())
    }

    /// Tandai slot WRITING. Blind reset: version lama diabaikan.
    #[inline(always)]
    pub(crate) fn begin_write(&self) {
        self.version.store(WRITING, Ordering::Release);
        // Payload stores below must not become visible ahead of WRITING.
        fence(Ordering::Release);
    }

    /// Copies `data` in and records its length. Producer only, between
    /// [`Slot::begin_write`] and [`Slot::publish`]; bytes past `N` are
    /// dropped.
    #[inline(always)]
    pub(crate) fn write(&self, data: &[u8]) {
        debug_assert!(data.len() <= N);
        for (cell, &byte) in self.payload.iter().zip(data) {
            cell.store(byte, Ordering::Relaxed);
        }
        self.length.store(data.len().min(N), Ordering::Release);
    }

    /// WRITING -> READY.
    #[inline(always)]
    pub(crate) fn publish(&self) {
        self.version.fetch_add(1, Ordering::Release);
    }

    /// Copies the stored block into `out` and returns its length.
    ///
    /// Only meaningful after observing READY and winning the tail claim. A
    /// concurrent overwrite by a lapping producer may tear the copy;
    /// [`Slot::finish_read`] reports that.
    #[inline(always)]
    pub(crate) fn read_into(&self, out: &mut [u8; N]) -> usize {
        let len = self.length.load(Ordering::Acquire).min(N);
        for (byte, cell) in out[..len].iter_mut().zip(&self.payload) {
            *byte = cell.load(Ordering::Relaxed);
        }
        len
    }

    /// READY -> CONSUMED after a copy-out.
    ///
    /// Returns `false` if the version moved off READY during the copy, which
    /// means the producer started rewriting the slot and the copy is torn.
    #[inline(always)]
    pub(crate) fn finish_read(&self) -> bool {
        // Orders the payload reads before the version check.
        fence(Ordering::Acquire);
        self.version
            .compare_exchange(READY, CONSUMED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
