//! Lock-free frame sequence numbering.
//!
//! Each frame produced by the capture pipeline is stamped with a sequence
//! number so log lines from the grab, encode and send steps of the same frame
//! can be correlated, and so a gap in the numbers shows how many frames were
//! dropped.
//!
//! # Thread safety
//!
//! The counter is an `AtomicU64`.  A single `fetch_add` both reads and
//! increments, so concurrent callers never receive the same number.

use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing counter starting at 0.
///
/// Wraps to 0 after `u64::MAX` without panicking.
///
/// # Examples
///
/// ```rust
/// use rdesk_core::protocol::SequenceCounter;
///
/// let counter = SequenceCounter::new();
/// assert_eq!(counter.next(), 0);
/// assert_eq!(counter.next(), 1);
/// assert_eq!(counter.issued(), 2);
/// ```
#[derive(Debug)]
pub struct SequenceCounter {
    inner: AtomicU64,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self {
            inner: AtomicU64::new(0),
        }
    }

    /// Returns the next number and advances the counter.
    ///
    /// `Relaxed` is enough: the numbers label frames, they do not publish
    /// memory to other threads.
    pub fn next(&self) -> u64 {
        self.inner.fetch_add(1, Ordering::Relaxed)
    }

    /// How many numbers have been handed out so far.
    pub fn issued(&self) -> u64 {
        self.inner.load(Ordering::Relaxed)
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_sequence_counter_starts_at_zero() {
        // Arrange
        let counter = SequenceCounter::new();

        // Act
        let first = counter.next();

        // Assert
        assert_eq!(first, 0);
        assert_eq!(counter.issued(), 1);
    }

    #[test]
    fn test_sequence_counter_wraps_at_u64_max() {
        // Arrange – one step before overflow
        let counter = SequenceCounter {
            inner: AtomicU64::new(u64::MAX),
        };

        // Act
        let before_wrap = counter.next();
        let after_wrap = counter.next();

        // Assert
        assert_eq!(before_wrap, u64::MAX);
        assert_eq!(after_wrap, 0);
    }

    #[test]
    fn test_sequence_numbers_unique_across_threads() {
        // Arrange
        let counter = Arc::new(SequenceCounter::new());

        // Act
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&counter);
                thread::spawn(move || (0..250).map(|_| c.next()).collect::<Vec<_>>())
            })
            .collect();
        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread panicked"))
            .collect();

        // Assert
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 1000);
    }
}
