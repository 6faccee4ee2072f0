//! Thread creation, identity, and joining.

use crate::status::Status;
use crate::sys::backend;

#[cfg(feature = "psp")]
use alloc::boxed::Box;

/// Scheduling priority, ordered `Low < Normal < High < Realtime`
/// regardless of a back-end's own raw priority numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low,
    Normal,
    High,
    Realtime,
}

impl Priority {
    /// The back-end's raw ordinal for this level, per `spec.md` §6
    /// (`LOW=1, NORMAL=0, HIGH=3, REALTIME=4`). Only meaningful to the
    /// `psp` back-end; the hosted back-end has no scheduler priority
    /// knob and ignores it.
    pub const fn raw(self) -> i32 {
        match self {
            Priority::Low => 1,
            Priority::Normal => 0,
            Priority::High => 3,
            Priority::Realtime => 4,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Thread creation attributes.
#[derive(Clone, Copy, Debug)]
pub struct ThreadAttr {
    pub name: &'static str,
    pub priority: Priority,
    pub stack_size: usize,
}

impl Default for ThreadAttr {
    fn default() -> Self {
        Self {
            name: "osal-thread",
            priority: Priority::Normal,
            stack_size: 64 * 1024,
        }
    }
}

/// A joinable handle to a spawned thread.
pub struct Thread {
    inner: backend::thread::RawThread,
}

impl Thread {
    /// Spawn `f` on a new thread. `f`'s return value becomes the thread's
    /// exit code, retrievable via [`Thread::join`].
    pub fn spawn<F>(attr: ThreadAttr, f: F) -> Option<Thread>
    where
        F: FnOnce() -> i32 + Send + 'static,
    {
        #[cfg(feature = "std")]
        let spawned = backend::thread::spawn(attr.name, attr.stack_size, Box::new(f));
        #[cfg(feature = "psp")]
        let spawned =
            backend::thread::spawn(attr.name, attr.stack_size, attr.priority.raw(), Box::new(f));

        spawned.ok().map(|inner| Thread { inner })
    }

    /// Block until the thread exits. Returns its exit code, or
    /// [`Status::Error`] if the back-end could not report one.
    pub fn join(self) -> Result<i32, Status> {
        self.inner.join().ok_or(Status::Error)
    }

    /// Destroy the handle without waiting for the thread to finish, for
    /// parity with the contract's `create`/`delete` pair (`join` already
    /// covers the "wait and reap" half of that pair). This is exactly
    /// what dropping an unjoined `Thread` already does: on `psp`, the
    /// back-end's own forced-termination call
    /// (`__psp_terminate_delete_thread`, `RawThread`'s `Drop`); on
    /// `hosted`, `std::thread::JoinHandle` has no kill primitive, so the
    /// thread is left to run to completion detached, same as dropping
    /// any other unjoined `JoinHandle`. Always returns `Status::Success`,
    /// matching the contract's NULL-handle-only delete failure mode.
    pub fn delete(self) -> Status {
        Status::Success
    }
}

/// Yield the remainder of the current time slice to another runnable
/// thread.
pub fn yield_now() {
    backend::thread::yield_now();
}

#[cfg(feature = "std")]
type RawThreadId = std::thread::ThreadId;
#[cfg(feature = "psp")]
type RawThreadId = i32;

/// An opaque identifier for the calling thread, stable for its lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ThreadId(RawThreadId);

/// The identity of the calling thread. Backed directly by the back-end's
/// own thread-identity call (`std::thread::current().id()` on `hosted`,
/// `sceKernelGetThreadId()` on `psp`) rather than a trampoline-populated
/// slot — both already answer "who am I" correctly from any context,
/// including a thread the crate did not spawn (e.g. the process's
/// initial thread).
pub fn current() -> ThreadId {
    ThreadId(backend::thread::current_id())
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn spawn_and_join_returns_exit_code() {
        let t = Thread::spawn(ThreadAttr::default(), || 42).unwrap();
        assert_eq!(t.join(), Ok(42));
    }

    #[test]
    fn priority_ordering_holds() {
        assert!(Priority::Low < Priority::Normal);
        assert!(Priority::Normal < Priority::High);
        assert!(Priority::High < Priority::Realtime);
    }

    #[test]
    fn current_thread_id_is_stable_within_a_thread() {
        let a = current();
        let b = current();
        assert_eq!(a, b);
    }

    #[test]
    fn spawned_thread_has_distinct_identity() {
        let main_id = current();
        let t = Thread::spawn(ThreadAttr::default(), move || {
            if current() != main_id { 1 } else { 0 }
        })
        .unwrap();
        assert_eq!(t.join(), Ok(1));
    }
}
