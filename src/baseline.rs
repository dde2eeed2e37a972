//! Mutex Queue: Baseline dengan locking untuk benchmark
//!
//! Unbounded dan lossless: setiap block dikirim tepat satu kali, urutan FIFO.
//! Alokasi hanya saat deque tumbuh.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::error::{DequeueError, RingError};

struct Block<const N: usize> {
    len: usize,
    data: [u8; N],
}

/// `VecDeque` of fixed-size blocks behind a `parking_lot::Mutex`.
pub struct MutexQueue<const N: usize> {
    queue: Mutex<VecDeque<Block<N>>>,
}

impl<const N: usize> Default for MutexQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MutexQueue<N> {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    /// Safe to call from any number of threads.
    pub fn enqueue(&self, data: &[u8]) -> Result<(), RingError> {
        if data.len() > N {
            return Err(RingError::SizeExceeded {
                size: data.len(),
                max: N,
            });
        }
        let mut block = Block {
            len: data.len(),
            data: [0u8; N],
        };
        block.data[..data.len()].copy_from_slice(data);
        self.queue.lock().push_back(block);
        Ok(())
    }

    /// Pops the oldest block into `buf`.
    pub fn try_dequeue(&self, buf: &mut [u8]) -> Result<usize, DequeueError> {
        if buf.len() < N {
            return Err(DequeueError::BufferTooSmall {
                len: buf.len(),
                required: N,
            });
        }
        let block = self
            .queue
            .lock()
            .pop_front()
            .ok_or(DequeueError::NotReady)?;
        buf[..block.len].copy_from_slice(&block.data[..block.len]);
        Ok(block.len)
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo() {
        let q: MutexQueue<8> = MutexQueue::new();
        q.enqueue(b"one").unwrap();
        q.enqueue(b"two!").unwrap();
        assert_eq!(q.len(), 2);

        let mut buf = [0u8; 8];
        assert_eq!(q.try_dequeue(&mut buf), Ok(3));
        assert_eq!(&buf[..3], b"one");
        assert_eq!(q.try_dequeue(&mut buf), Ok(4));
        assert_eq!(&buf[..4], b"two!");
        assert_eq!(q.try_dequeue(&mut buf), Err(DequeueError::NotReady));
        assert!(q.is_empty());
    }

    #[test]
    fn test_never_drops() {
        let q: MutexQueue<8> = MutexQueue::new();
        for i in 0..100u8 {
            q.enqueue(&[i]).unwrap();
        }
        let mut buf = [0u8; 8];
        for i in 0..100u8 {
            q.try_dequeue(&mut buf).unwrap();
            assert_eq!(buf[0], i);
        }
    }

    #[test]
    fn test_size_checks() {
        let q: MutexQueue<4> = MutexQueue::new();
        assert_eq!(
            q.enqueue(&[0u8; 5]),
            Err(RingError::SizeExceeded { size: 5, max: 4 })
        );
        let mut small = [0u8; 2];
        assert!(matches!(
            q.try_dequeue(&mut small),
            Err(DequeueError::BufferTooSmall { .. })
        ));
    }
}
