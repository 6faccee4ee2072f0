//! Portable operating-system abstraction layer.
//!
//! `osal` exposes one concurrency and timing contract — mutual exclusion,
//! counting semaphores, fixed-capacity message queues, 32-bit event flag
//! groups, threads, and millisecond timing — with identical call-level
//! semantics across every back-end. Application code written once against
//! [`mutex`], [`semaphore`], [`queue`], [`flags`], [`thread`] and [`time`]
//! runs unchanged on a hosted POSIX/macOS workstation or on a bare-metal
//! RTOS target.
//!
//! # Back-ends
//!
//! Exactly one back-end is compiled in, selected by Cargo feature:
//!
//! - `std` (default): the hosted reference back-end, built from
//!   `std::sync::{Mutex, Condvar}` and `std::thread`. This is the
//!   behavioral oracle every other back-end is expected to match.
//! - `psp`: a thin `no_std` shim over a PSP-class RTOS kernel, wrapping
//!   native kernel primitives directly where the kernel has them.
//!
//! Both back-ends implement the same public types; the back-end seam
//! ([`sys`]) is not part of the public API.
//!
//! # Status and timeouts
//!
//! Every fallible operation returns a [`status::Status`]. Every blocking
//! operation accepts a [`timeout::Timeout`]: [`timeout::Timeout::NO_WAIT`]
//! attempts once, [`timeout::Timeout::WAIT_FOREVER`] blocks indefinitely,
//! and any other value is a finite millisecond deadline measured from call
//! entry.
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "psp")]
extern crate alloc;

/// Backs every [`memory::Memory`] allocation on the `psp` back-end. Starts
/// empty; a board-support crate initializes it with `init` before any
/// allocation is attempted, the same precondition
/// `linked_list_allocator::LockedHeap` always carries.
#[cfg(feature = "psp")]
#[global_allocator]
static HEAP: linked_list_allocator::LockedHeap = linked_list_allocator::LockedHeap::empty();

#[cfg(all(feature = "std", feature = "psp"))]
compile_error!("osal: the `std` and `psp` back-ends are mutually exclusive; build with --no-default-features --features psp for the bare-metal back-end");

#[cfg(not(any(feature = "std", feature = "psp")))]
compile_error!("osal: no back-end selected; enable the `std` feature (default) or the `psp` feature");

mod sys;

pub mod flags;
pub mod memory;
pub mod mutex;
pub mod queue;
pub mod semaphore;
pub mod status;
pub mod thread;
pub mod time;
pub mod timeout;

pub use flags::EventFlags;
pub use memory::Memory;
pub use mutex::Mutex;
pub use queue::MessageQueue;
pub use semaphore::Semaphore;
pub use status::Status;
pub use thread::Thread;
pub use timeout::Timeout;
