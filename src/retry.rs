//! Retry policy di sisi caller.
//!
//! Ring tidak pernah menunggu. Helper ini adalah strategi tunggu eksplisit
//! yang dibungkus di sekitar [`Consumer::try_dequeue`]. Policy tanpa batas
//! akan spin selamanya jika producer sudah hilang.

use crossbeam_utils::Backoff;

use crate::core::Consumer;
use crate::error::DequeueError;

/// How to wait between failed dequeue attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Busy-spin with a CPU pause hint.
    Spin,
    /// Yield the thread to the OS scheduler.
    Yield,
    /// Exponential spin that degrades to yielding.
    #[default]
    Backoff,
    /// Like `Backoff`, but gives up after `attempts` tries.
    Bounded { attempts: u32 },
}

impl RetryPolicy {
    /// Repeats [`Consumer::try_dequeue`] until it succeeds, fails with a
    /// permanent error, or the bounded budget runs out.
    pub fn dequeue<const N: usize>(
        &self,
        consumer: &Consumer<N>,
        buf: &mut [u8],
    ) -> Result<usize, DequeueError> {
        self.run(|| consumer.try_dequeue(buf))
    }

    /// Drives any fallible attempt under this policy.
    pub fn run<T>(
        &self,
        mut attempt: impl FnMut() -> Result<T, DequeueError>,
    ) -> Result<T, DequeueError> {
        let backoff = Backoff::new();
        let mut tries: u32 = 0;
        loop {
            let err = match attempt() {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) => err,
            };
            tries = tries.saturating_add(1);

            match *self {
                RetryPolicy::Spin => std::hint::spin_loop(),
                RetryPolicy::Yield => std::thread::yield_now(),
                RetryPolicy::Backoff => backoff.snooze(),
                RetryPolicy::Bounded { attempts } => {
                    if tries >= attempts {
                        return Err(err);
                    }
                    backoff.snooze();
                }
            }
        }
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use crate::core::channel;

    #[test]
    fn test_bounded_gives_up() {
        let (_tx, rx) = channel(4).unwrap();
        let mut buf = [0u8; 64];
        let policy = RetryPolicy::Bounded { attempts: 5 };
        assert_eq!(policy.dequeue(&rx, &mut buf), Err(DequeueError::NotReady));
    }

    #[test]
    fn test_bounded_counts_attempts() {
        let mut calls = 0;
        let result: Result<(), _> = RetryPolicy::Bounded { attempts: 3 }.run(|| {
            calls += 1;
            Err(DequeueError::ClaimLost)
        });
        assert_eq!(result, Err(DequeueError::ClaimLost));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_permanent_error_not_retried() {
        let (_tx, rx) = channel(4).unwrap();
        let mut small = [0u8; 1];
        assert!(matches!(
            RetryPolicy::Spin.dequeue(&rx, &mut small),
            Err(DequeueError::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn test_retries_until_success() {
        let mut calls = 0;
        let result = RetryPolicy::Yield.run(|| {
            calls += 1;
            if calls < 4 {
                Err(DequeueError::NotReady)
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result, Ok(4));
    }

    #[test]
    fn test_succeeds_after_lag() {
        let (mut tx, rx) = crate::core::RingBuffer::<8>::new(2).unwrap().split();
        for i in 0..5u8 {
            tx.enqueue(&[i]).unwrap();
        }
        let mut buf = [0u8; 8];
        assert_eq!(RetryPolicy::Backoff.dequeue(&rx, &mut buf), Ok(1));
        assert_eq!(buf[0], 3);
    }
}
