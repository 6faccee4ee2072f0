//! 32-bit event flag groups.
//!
//! Built once, generically, on the back-end's `RawMutex`/`RawCondvar` pair.
//! `wait`'s predicate loop is the direct Rust expression of
//! `examples/original_source/src/macos/osal_event_flags.c`'s
//! `osal_event_flags_wait`, the canonical generic implementation this
//! contract is specified against.

use crate::status::Status;
use crate::sys::backend::{RawCondvar, RawMutex};
use crate::time::get_tick_ms;
use crate::timeout::Timeout;

bitflags::bitflags! {
    /// Match mode for [`EventFlags::wait`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct EventWaitOptions: u32 {
        /// Satisfied when *any* requested bit is set. This is the default
        /// (the all-zero value), matching `OSAL_EVENT_WAIT_ANY == 0`.
        const ANY = 0x0;
        /// Satisfied only when *every* requested bit is set.
        const ALL = 0x1;
        /// Leave the matched bits set instead of clearing them. Without
        /// this flag, a successful wait clears exactly the bits it
        /// matched (not the full requested mask, and not the full flag
        /// set — only the bits that were actually observed set).
        const NO_CLEAR = 0x2;
    }
}

/// A handle to a 32-bit event flag group.
pub struct EventFlags {
    bits: RawMutex<u32>,
    changed: RawCondvar,
}

impl EventFlags {
    /// Create an event flag group with all bits initially clear.
    pub fn new() -> Option<Self> {
        Some(Self {
            bits: RawMutex::new(0),
            changed: RawCondvar::new(),
        })
    }

    /// Set `bits_to_set` and wake every waiter. Returns the full bit
    /// pattern after the set.
    pub fn set(&self, bits_to_set: u32) -> u32 {
        let mut guard = self.bits.lock();
        *guard |= bits_to_set;
        let current = *guard;
        drop(guard);
        self.changed.notify_all();
        current
    }

    /// Clear `bits_to_clear` unconditionally. Returns the bit pattern as
    /// it was *before* this call — matching the contract's `clear`
    /// (see `DESIGN.md`'s Open Question resolution), so a caller can
    /// always tell which bits it just turned off.
    pub fn clear(&self, bits_to_clear: u32) -> u32 {
        let mut guard = self.bits.lock();
        let previous = *guard;
        *guard &= !bits_to_clear;
        previous
    }

    /// The current bit pattern, without side effects.
    pub fn get(&self) -> u32 {
        *self.bits.lock()
    }

    /// Wait for `pattern` to be satisfied according to `options`, for at
    /// most `timeout`. On success, returns the subset of `pattern` that
    /// was observed set; on timeout, returns `None`.
    pub fn wait(&self, pattern: u32, options: EventWaitOptions, timeout: Timeout) -> (Status, Option<u32>) {
        let wait_all = options.contains(EventWaitOptions::ALL);
        let auto_clear = !options.contains(EventWaitOptions::NO_CLEAR);

        let mut guard = self.bits.lock();
        let deadline = if timeout.is_wait_forever() {
            None
        } else {
            timeout.deadline_from(get_tick_ms())
        };

        loop {
            let observed = *guard & pattern;
            let satisfied = if wait_all {
                observed == pattern
            } else {
                observed != 0
            };

            if satisfied {
                if auto_clear {
                    *guard &= !observed;
                }
                return (Status::Success, Some(observed));
            }

            if timeout.is_wait_forever() {
                guard = self.changed.wait(guard);
                continue;
            }

            let now = get_tick_ms();
            let Some(d) = deadline else {
                return (Status::Timeout, None);
            };
            if Timeout::has_elapsed(d, now) {
                return (Status::Timeout, None);
            }
            let remaining = d.wrapping_sub(now);
            let (g, timed_out) = self.changed.wait_timeout_ms(guard, remaining);
            guard = g;
            if timed_out && Timeout::has_elapsed(d, get_tick_ms()) {
                let observed = *guard & pattern;
                let satisfied = if wait_all {
                    observed == pattern
                } else {
                    observed != 0
                };
                if !satisfied {
                    return (Status::Timeout, None);
                }
            }
        }
    }

    /// Destroy the event flag group, for parity with the contract's
    /// `create`/`delete` pair. `osal_event_flags_delete`'s only failure
    /// mode in `examples/original_source/src/macos/osal_event_flags.c`
    /// is a null handle, which an owned `EventFlags` can never be —
    /// always returns `Status::Success`.
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
    fn wait_any_matches_first_set_bit() {
        let f = EventFlags::new().unwrap();
        f.set(0x04);
        let (status, observed) = f.wait(0x07, EventWaitOptions::ANY, Timeout::NO_WAIT);
        assert_eq!(status, Status::Success);
        assert_eq!(observed, Some(0x04));
        // auto-cleared
        assert_eq!(f.get(), 0);
    }

    #[test]
    fn wait_all_requires_every_bit() {
        let f = EventFlags::new().unwrap();
        f.set(0x05);
        assert_eq!(
            f.wait(0x07, EventWaitOptions::ALL, Timeout::NO_WAIT),
            (Status::Timeout, None)
        );
        f.set(0x02);
        let (status, observed) = f.wait(0x07, EventWaitOptions::ALL, Timeout::NO_WAIT);
        assert_eq!(status, Status::Success);
        assert_eq!(observed, Some(0x07));
    }

    #[test]
    fn no_clear_leaves_bits_set() {
        let f = EventFlags::new().unwrap();
        f.set(0x01);
        let (status, observed) = f.wait(0x01, EventWaitOptions::NO_CLEAR, Timeout::NO_WAIT);
        assert_eq!(status, Status::Success);
        assert_eq!(observed, Some(0x01));
        assert_eq!(f.get(), 0x01);
    }

    #[test]
    fn clear_returns_previous_value() {
        let f = EventFlags::new().unwrap();
        f.set(0x03);
        let previous = f.clear(0x01);
        assert_eq!(previous, 0x03);
        assert_eq!(f.get(), 0x02);
    }

    #[test]
    fn cross_thread_signal_wakes_waiter() {
        let f = Arc::new(EventFlags::new().unwrap());
        let f2 = Arc::clone(&f);
        let start = Instant::now();
        let handle = thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(50));
            f2.set(0x01);
        });
        let (status, observed) = f.wait(0x01, EventWaitOptions::ANY, Timeout::WAIT_FOREVER);
        assert_eq!(status, Status::Success);
        assert_eq!(observed, Some(0x01));
        let elapsed = start.elapsed().as_millis() as i64;
        assert!((20..=130).contains(&elapsed), "elapsed={elapsed}");
        handle.join().unwrap();
    }
}
