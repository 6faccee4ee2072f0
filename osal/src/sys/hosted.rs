//! Hosted reference back-end: POSIX and macOS workstations, built on the
//! standard library.
//!
//! This is the contract's behavioral oracle. Where the host lacks a
//! primitive natively (a timed mutex lock — `std::sync::Mutex` has none,
//! same as macOS's `pthread_mutex_t`), it is emulated by bounded polling
//! against an absolute deadline, exactly as
//! `examples/original_source/src/macos/osal_mutex.c` does.

use std::sync::{Condvar, Mutex as StdMutex, MutexGuard};
use std::thread::ThreadId;
use std::time::{Duration, Instant};

// ── RawMutex / RawCondvar: the generic core `queue` and `flags` build on ──

/// A plain (non-recursive, non-owner-tracked) lock wrapping a value.
///
/// Used only by [`crate::queue`] and [`crate::flags`] as the "mutex" half
/// of the mutex+condvar reference core. [`crate::mutex::Mutex`] does not
/// use this type — see the `sys` module docs.
pub(crate) struct RawMutex<T> {
    inner: StdMutex<T>,
}

impl<T> RawMutex<T> {
    pub(crate) const fn new(val: T) -> Self {
        Self {
            inner: StdMutex::new(val),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
        // A poisoned lock means a prior holder panicked mid-critical-section.
        // The contract has no "poisoned" status; recovering the guard is the
        // closest honest behavior (the data invariant may be violated, but
        // so would discarding it silently).
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A condition variable paired with [`RawMutex`]'s guard type.
pub(crate) struct RawCondvar {
    inner: Condvar,
}

impl RawCondvar {
    pub(crate) const fn new() -> Self {
        Self {
            inner: Condvar::new(),
        }
    }

    pub(crate) fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        self.inner.wait(guard).unwrap_or_else(|e| e.into_inner())
    }

    /// Wait for at most `timeout_ms`. Returns `(guard, timed_out)`.
    pub(crate) fn wait_timeout_ms<'a, T>(
        &self,
        guard: MutexGuard<'a, T>,
        timeout_ms: u32,
    ) -> (MutexGuard<'a, T>, bool) {
        let (guard, result) = self
            .inner
            .wait_timeout(guard, Duration::from_millis(timeout_ms as u64))
            .unwrap_or_else(|e| e.into_inner());
        (guard, result.timed_out())
    }

    pub(crate) fn notify_one(&self) {
        self.inner.notify_one();
    }

    pub(crate) fn notify_all(&self) {
        self.inner.notify_all();
    }
}

// ── Mutex: wraps the native equivalent directly ───────────────────────

/// Owner + recursion-depth state protected by a native `std::sync::Mutex`.
struct MutexState {
    owner: Option<ThreadId>,
    depth: u32,
}

pub(crate) struct Mutex {
    recursive: bool,
    state: StdMutex<MutexState>,
    cond: Condvar,
}

unsafe impl Send for Mutex {}
unsafe impl Sync for Mutex {}

impl Mutex {
    pub(crate) fn new(recursive: bool) -> Self {
        Self {
            recursive,
            state: StdMutex::new(MutexState {
                owner: None,
                depth: 0,
            }),
            cond: Condvar::new(),
        }
    }

    /// `true` on success, `false` on timeout.
    pub(crate) fn lock(&self, timeout_ms: Option<u32>) -> bool {
        let me = std::thread::current().id();
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if self.recursive && guard.owner == Some(me) {
            guard.depth += 1;
            return true;
        }

        match timeout_ms {
            None => {
                // WAIT_FOREVER
                while guard.owner.is_some() {
                    guard = self.cond.wait(guard).unwrap_or_else(|e| e.into_inner());
                }
            }
            Some(0) => {
                // NO_WAIT: single attempt
                if guard.owner.is_some() {
                    return false;
                }
            }
            Some(ms) => {
                let deadline = Instant::now() + Duration::from_millis(ms as u64);
                while guard.owner.is_some() {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    let (g, result) = self
                        .cond
                        .wait_timeout(guard, deadline - now)
                        .unwrap_or_else(|e| e.into_inner());
                    guard = g;
                    if result.timed_out() && guard.owner.is_some() {
                        return false;
                    }
                }
            }
        }

        guard.owner = Some(me);
        guard.depth = 1;
        true
    }

    /// `true` on success, `false` if the caller does not hold the mutex.
    pub(crate) fn unlock(&self) -> bool {
        let me = std::thread::current().id();
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if guard.owner != Some(me) {
            return false;
        }
        guard.depth -= 1;
        if guard.depth == 0 {
            guard.owner = None;
            drop(guard);
            self.cond.notify_one();
        }
        true
    }
}

// ── Semaphore: wraps the native equivalent directly ───────────────────

struct SemaphoreState {
    count: u32,
    max: u32,
}

pub(crate) struct Semaphore {
    state: StdMutex<SemaphoreState>,
    cond: Condvar,
}

impl Semaphore {
    pub(crate) fn new(initial: u32, max: u32) -> Self {
        Self {
            state: StdMutex::new(SemaphoreState {
                count: initial,
                max,
            }),
            cond: Condvar::new(),
        }
    }

    pub(crate) fn take(&self, timeout_ms: Option<u32>) -> bool {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match timeout_ms {
            None => {
                while guard.count == 0 {
                    guard = self.cond.wait(guard).unwrap_or_else(|e| e.into_inner());
                }
            }
            Some(0) => {
                if guard.count == 0 {
                    return false;
                }
            }
            Some(ms) => {
                let deadline = Instant::now() + Duration::from_millis(ms as u64);
                while guard.count == 0 {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    let (g, result) = self
                        .cond
                        .wait_timeout(guard, deadline - now)
                        .unwrap_or_else(|e| e.into_inner());
                    guard = g;
                    if result.timed_out() && guard.count == 0 {
                        return false;
                    }
                }
            }
        }
        guard.count -= 1;
        true
    }

    /// `true` on success, `false` if already at `max`.
    pub(crate) fn give(&self) -> bool {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if guard.count >= guard.max {
            return false;
        }
        guard.count += 1;
        drop(guard);
        self.cond.notify_one();
        true
    }

    pub(crate) fn count(&self) -> u32 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).count
    }
}

// ── Time ───────────────────────────────────────────────────────────────

pub(crate) fn delay_ms(ms: u32) {
    std::thread::sleep(Duration::from_millis(ms as u64));
}

pub(crate) fn get_tick_ms() -> u32 {
    use std::sync::OnceLock;
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let epoch = *EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_millis() as u32
}

pub(crate) fn get_unix_time() -> Option<(u32, u32)> {
    use std::time::{SystemTime, UNIX_EPOCH};
    let dur = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    Some((dur.as_secs() as u32, dur.subsec_micros()))
}

// ── Memory ──────────────────────────────────────────────────────────────

pub(crate) unsafe fn alloc(layout: std::alloc::Layout) -> *mut u8 {
    // SAFETY: forwarded verbatim to the global allocator; caller upholds
    // the `Layout` contract.
    unsafe { std::alloc::alloc(layout) }
}

pub(crate) unsafe fn dealloc(ptr: *mut u8, layout: std::alloc::Layout) {
    // SAFETY: caller guarantees `ptr` came from `alloc` with this `layout`.
    unsafe { std::alloc::dealloc(ptr, layout) }
}

// ── Thread ──────────────────────────────────────────────────────────────

pub(crate) mod thread {
    use std::thread::JoinHandle as StdJoinHandle;

    pub(crate) struct RawThread {
        handle: StdJoinHandle<i32>,
    }

    pub(crate) fn spawn(
        name: &str,
        stack_size: usize,
        f: Box<dyn FnOnce() -> i32 + Send + 'static>,
    ) -> std::io::Result<RawThread> {
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .stack_size(stack_size)
            .spawn(f)?;
        Ok(RawThread { handle })
    }

    impl RawThread {
        pub(crate) fn join(self) -> Option<i32> {
            self.handle.join().ok()
        }
    }

    pub(crate) fn yield_now() {
        std::thread::yield_now();
    }

    pub(crate) type ThreadId = std::thread::ThreadId;

    pub(crate) fn current_id() -> ThreadId {
        std::thread::current().id()
    }
}
