// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Host services used by the manager.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of the current time in nanoseconds since the Unix Epoch.
pub trait Clock: Send + Sync {
    fn now_ns(&self) -> u64;
}

/// Wall clock of the machine running the canister.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ns(&self) -> u64 {
        match crate::get_current_timestamp_u64_ns() {
            Ok(now) => now,
            Err(e) => {
                log::error!("{e}");
                0
            }
        }
    }
}

/// Clock that only moves when told to. Every read advances it by one
/// nanosecond so consecutive reads stay strictly increasing.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn new(start_ns: u64) -> Self {
        Self(AtomicU64::new(start_ns))
    }

    pub fn advance(&self, delta_ns: u64) {
        self.0.fetch_add(delta_ns, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_strictly_increasing() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now_ns(), 100);
        assert_eq!(clock.now_ns(), 101);
        clock.advance(1_000);
        assert_eq!(clock.now_ns(), 1_102);
    }

    #[test]
    fn system_clock_is_after_2023() {
        assert!(SystemClock.now_ns() > 1_672_531_200_000_000_000);
    }
}
