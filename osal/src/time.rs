//! Millisecond tick source and wall-clock time.

use crate::sys::backend;

/// Block the calling thread for at least `ms` milliseconds.
pub fn delay_ms(ms: u32) {
    backend::delay_ms(ms);
}

/// A monotonic millisecond counter with an arbitrary, back-end-chosen
/// epoch. Wraps around `u32::MAX`; always compare two readings with
/// [`crate::timeout::Timeout::has_elapsed`], never with `>`/`<` directly.
pub fn get_tick_ms() -> u32 {
    backend::get_tick_ms()
}

/// Wall-clock time as seconds and microseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnixTime {
    pub secs: u32,
    pub micros: u32,
}

/// Read the current wall-clock time. Returns `None` if the back-end has
/// no notion of wall-clock time (e.g. an RTC that was never set) or the
/// reading failed.
pub fn get_unix_time() -> Option<UnixTime> {
    backend::get_unix_time().map(|(secs, micros)| UnixTime { secs, micros })
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn tick_is_monotonic_across_a_short_delay() {
        let before = get_tick_ms();
        delay_ms(5);
        let after = get_tick_ms();
        assert!(after.wrapping_sub(before) >= 5);
    }

    #[test]
    fn unix_time_is_plausible() {
        let t = get_unix_time().expect("hosted back-end always has wall-clock time");
        // 2020-01-01T00:00:00Z
        assert!(t.secs > 1_577_836_800);
    }
}
