//! Counting semaphores.

use crate::status::Status;
use crate::sys::backend;
use crate::timeout::Timeout;

/// Semaphore creation attributes.
#[derive(Clone, Copy, Debug)]
pub struct SemaphoreAttr {
    pub initial_count: u32,
    pub max_count: u32,
}

impl Default for SemaphoreAttr {
    fn default() -> Self {
        Self {
            initial_count: 0,
            max_count: u32::MAX,
        }
    }
}

/// A counting semaphore handle.
pub struct Semaphore {
    inner: backend::Semaphore,
}

impl Semaphore {
    /// Create a semaphore. Returns `None` if `initial_count > max_count`
    /// or the back-end could not allocate one.
    pub fn new(attr: SemaphoreAttr) -> Option<Semaphore> {
        if attr.initial_count > attr.max_count {
            return None;
        }
        Some(Semaphore {
            inner: backend::Semaphore::new(attr.initial_count, attr.max_count),
        })
    }

    /// Decrement the count, waiting at most `timeout` for it to become
    /// nonzero.
    pub fn take(&self, timeout: Timeout) -> Status {
        let timeout_ms = if timeout.is_wait_forever() {
            None
        } else {
            Some(timeout.as_millis())
        };
        if self.inner.take(timeout_ms) {
            Status::Success
        } else {
            Status::Timeout
        }
    }

    /// Increment the count by one. Returns [`Status::Error`] if the
    /// count is already at its configured maximum — the call has no
    /// effect in that case, per the contract's Open Question resolution
    /// (see `DESIGN.md`).
    pub fn give(&self) -> Status {
        if self.inner.give() {
            Status::Success
        } else {
            Status::Error
        }
    }

    /// The current count, for diagnostics. Not part of any invariant —
    /// callers must not use it to decide whether a subsequent `take` will
    /// block, since the count can change between the read and the call.
    pub fn count(&self) -> u32 {
        self.inner.count()
    }

    /// Destroy the semaphore, for parity with the contract's `create`/
    /// `delete` pair. As with `Mutex::delete`, the only failure the
    /// source's `osal_semaphore_delete` reports is a null handle, which
    /// an owned `Semaphore` can never be — always returns
    /// `Status::Success`.
    pub fn delete(self) -> Status {
        Status::Success
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn take_blocks_until_given() {
        let s = Arc::new(
            Semaphore::new(SemaphoreAttr {
                initial_count: 0,
                max_count: 1,
            })
            .unwrap(),
        );
        let s2 = Arc::clone(&s);
        let start = Instant::now();
        let handle = thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(50));
            s2.give()
        });
        assert_eq!(s.take(Timeout::WAIT_FOREVER), Status::Success);
        let elapsed = start.elapsed().as_millis() as i64;
        assert!((20..=130).contains(&elapsed), "elapsed={elapsed}");
        assert_eq!(handle.join().unwrap(), Status::Success);
    }

    #[test]
    fn give_past_max_is_rejected() {
        let s = Semaphore::new(SemaphoreAttr {
            initial_count: 1,
            max_count: 1,
        })
        .unwrap();
        assert_eq!(s.give(), Status::Error);
        assert_eq!(s.count(), 1);
    }

    #[test]
    fn take_with_timeout_on_empty_semaphore_times_out() {
        let s = Semaphore::new(SemaphoreAttr::default()).unwrap();
        assert_eq!(s.take(Timeout::from_millis(10)), Status::Timeout);
    }

    #[test]
    fn construction_rejects_inverted_bounds() {
        assert!(Semaphore::new(SemaphoreAttr {
            initial_count: 5,
            max_count: 1,
        })
        .is_none());
    }
}
