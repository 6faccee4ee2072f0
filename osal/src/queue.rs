//! Fixed-capacity, blocking FIFO message queues.
//!
//! Built once, generically, on the back-end's `RawMutex`/`RawCondvar` pair
//! — the "reference back-end... built on generic primitives" case the
//! contract calls out, rather than on a native per-platform queue object.

use crate::status::Status;
use crate::sys::backend::{RawCondvar, RawMutex};
use crate::time::get_tick_ms;
use crate::timeout::Timeout;

struct State<T, const N: usize> {
    buf: [Option<T>; N],
    head: usize,
    len: usize,
}

impl<T: Copy, const N: usize> State<T, N> {
    const fn new() -> Self {
        Self {
            buf: [None; N],
            head: 0,
            len: 0,
        }
    }

    fn push(&mut self, item: T) {
        let idx = (self.head + self.len) % N;
        self.buf[idx] = Some(item);
        self.len += 1;
    }

    fn pop(&mut self) -> T {
        let item = self.buf[self.head].take().expect("queue non-empty invariant");
        self.head = (self.head + 1) % N;
        self.len -= 1;
        item
    }
}

/// A fixed-capacity FIFO of `N` items of type `T`.
///
/// `send` blocks while the queue is full; `receive` blocks while it is
/// empty, honoring [`Timeout`] in each case. FIFO order is preserved
/// regardless of contention.
pub struct MessageQueue<T: Copy, const N: usize> {
    state: RawMutex<State<T, N>>,
    not_empty: RawCondvar,
    not_full: RawCondvar,
}

impl<T: Copy, const N: usize> MessageQueue<T, N> {
    /// Create an empty queue. `N` must be at least 1.
    pub fn new() -> Option<Self> {
        if N == 0 {
            return None;
        }
        Some(Self {
            state: RawMutex::new(State::new()),
            not_empty: RawCondvar::new(),
            not_full: RawCondvar::new(),
        })
    }

    /// Enqueue `item`, waiting at most `timeout` for room.
    pub fn send(&self, item: T, timeout: Timeout) -> Status {
        let mut guard = self.state.lock();
        if timeout.is_wait_forever() {
            while guard.len == N {
                guard = self.not_full.wait(guard);
            }
        } else {
            let deadline = timeout.deadline_from(get_tick_ms());
            while guard.len == N {
                let remaining = match deadline {
                    Some(d) if !Timeout::has_elapsed(d, get_tick_ms()) => {
                        d.wrapping_sub(get_tick_ms())
                    }
                    _ => return Status::Timeout,
                };
                let (g, timed_out) = self.not_full.wait_timeout_ms(guard, remaining);
                guard = g;
                if timed_out
                    && guard.len == N
                    && deadline.is_some_and(|d| Timeout::has_elapsed(d, get_tick_ms()))
                {
                    return Status::Timeout;
                }
            }
        }
        guard.push(item);
        drop(guard);
        self.not_empty.notify_one();
        Status::Success
    }

    /// Dequeue the oldest item, waiting at most `timeout` for one to
    /// arrive.
    pub fn receive(&self, timeout: Timeout) -> (Status, Option<T>) {
        let mut guard = self.state.lock();
        if timeout.is_wait_forever() {
            while guard.len == 0 {
                guard = self.not_empty.wait(guard);
            }
        } else {
            let deadline = timeout.deadline_from(get_tick_ms());
            while guard.len == 0 {
                let remaining = match deadline {
                    Some(d) if !Timeout::has_elapsed(d, get_tick_ms()) => {
                        d.wrapping_sub(get_tick_ms())
                    }
                    _ => return (Status::Timeout, None),
                };
                let (g, timed_out) = self.not_empty.wait_timeout_ms(guard, remaining);
                guard = g;
                if timed_out
                    && guard.len == 0
                    && deadline.is_some_and(|d| Timeout::has_elapsed(d, get_tick_ms()))
                {
                    return (Status::Timeout, None);
                }
            }
        }
        let item = guard.pop();
        drop(guard);
        self.not_full.notify_one();
        (Status::Success, Some(item))
    }

    /// Number of items currently queued. Diagnostic only — can change
    /// immediately after the call returns under contention.
    pub fn len(&self) -> usize {
        self.state.lock().len
    }

    /// `true` if the queue holds no items at the moment of the call.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard all queued items, returning the queue to its empty state
    /// and releasing any thread blocked in `send`.
    pub fn reset(&self) {
        let mut guard = self.state.lock();
        *guard = State::new();
        drop(guard);
        self.not_full.notify_all();
    }

    /// Destroy the queue, for parity with the contract's `create`/
    /// `delete` pair. `osal_message_queue_delete`'s only failure mode in
    /// `examples/original_source/src/freertos/osal_message_queue.c` is a
    /// null handle, which an owned `MessageQueue` can never be — always
    /// returns `Status::Success`.
    pub fn delete(self) -> Status {
        Status::Success
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn fifo_order_is_preserved() {
        let q: MessageQueue<i32, 5> = MessageQueue::new().unwrap();
        for i in 0..5 {
            assert_eq!(q.send(i, Timeout::NO_WAIT), Status::Success);
        }
        assert_eq!(q.send(99, Timeout::NO_WAIT), Status::Timeout);
        for i in 0..5 {
            assert_eq!(q.receive(Timeout::NO_WAIT), (Status::Success, Some(i)));
        }
        assert_eq!(q.receive(Timeout::NO_WAIT), (Status::Timeout, None));
    }

    #[test]
    fn receive_blocks_until_send() {
        let q: Arc<MessageQueue<i32, 1>> = Arc::new(MessageQueue::new().unwrap());
        let q2 = Arc::clone(&q);
        let handle = thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(30));
            q2.send(7, Timeout::WAIT_FOREVER)
        });
        assert_eq!(q.receive(Timeout::WAIT_FOREVER), (Status::Success, Some(7)));
        assert_eq!(handle.join().unwrap(), Status::Success);
    }

    #[test]
    fn reset_empties_and_wakes_full_senders() {
        let q: Arc<MessageQueue<i32, 1>> = Arc::new(MessageQueue::new().unwrap());
        assert_eq!(q.send(1, Timeout::NO_WAIT), Status::Success);
        let q2 = Arc::clone(&q);
        let handle = thread::spawn(move || q2.send(2, Timeout::from_millis(200)));
        thread::sleep(std::time::Duration::from_millis(30));
        q.reset();
        assert_eq!(handle.join().unwrap(), Status::Success);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(MessageQueue::<i32, 0>::new().is_none());
    }
}
