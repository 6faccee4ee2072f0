//! Back-end seam.
//!
//! Not part of the public API. Exactly one of `hosted`/`psp` compiles in,
//! selected by the `std`/`psp` Cargo feature, and is re-exported here
//! under the name `backend`. [`queue`](crate::queue) and
//! [`flags`](crate::flags) are written once, generically, against
//! `backend::{RawMutex, RawCondvar}` — the Rust expression of the
//! contract's "generic primitives: a mutex plus condition variables plus
//! atomic words" reference core (`spec.md` §2, §9).
//!
//! [`mutex`](crate::mutex) and [`semaphore`](crate::semaphore) are *not*
//! built on `RawMutex`/`RawCondvar`: each back-end gives them a dedicated
//! implementation (`backend::Mutex`, `backend::Semaphore`) that wraps its
//! own native (or emulated-native) primitive directly, per `spec.md` §5
//! ("mutex and semaphore objects on the reference back-end wrap the
//! native equivalents directly").
//!
//! Every `backend` module also supplies the raw time/thread primitives
//! ([`time`](crate::time) and [`thread`](crate::thread) build directly on
//! these rather than on `RawMutex`/`RawCondvar`, since timing and thread
//! lifecycle aren't mutex/condvar-shaped problems).

#[cfg(feature = "std")]
mod hosted;
#[cfg(feature = "std")]
pub(crate) use hosted as backend;

#[cfg(feature = "psp")]
mod psp;
#[cfg(feature = "psp")]
pub(crate) use psp as backend;
