//! Debug assertion macros for the stream coordination invariants.
//!
//! Active only in debug builds (`cfg(debug_assertions)`), so there is zero
//! overhead in release builds.

/// An observer's `position` must never move backwards.
macro_rules! debug_assert_position_monotonic {
    ($old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "observer position regressed: {} -> {}",
            $old,
            $new
        )
    };
}

/// Every append (or close) must bump the generation counter before the
/// notifier fires, so a concurrently-waiting observer that wakes always
/// sees a higher generation than the one it last observed.
macro_rules! debug_assert_generation_advanced {
    ($old:expr, $new:expr) => {
        debug_assert!(
            $new > $old,
            "generation counter did not advance: {} -> {}",
            $old,
            $new
        )
    };
}

/// A handle removed from the observer registry must not still be counted
/// as active in metrics.
macro_rules! debug_assert_handle_deregistered {
    ($was_present:expr) => {
        debug_assert!(
            $was_present,
            "unobserve called on a handle id that was never registered or already removed"
        )
    };
}

pub(crate) use debug_assert_generation_advanced;
pub(crate) use debug_assert_position_monotonic;
#[allow(unused_imports)]
pub(crate) use debug_assert_handle_deregistered;
