// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.

use super::Time;
use chrono::{Timelike, Utc};
use std::sync::Mutex;

/// A source of the current UTC time
///
/// Decoders take a clock at construction instead of reaching for the wall
/// clock so replay and tests can drive them deterministically.
pub trait Clock: Send + Sync {
    /// Gets the current UTC time
    fn now(&self) -> Time;
}

/// The wall clock, shifted by a settable offset for simulation and replay
///
/// The offset is guarded by a mutex; a caller that needs to observe
/// monotonicity across [`SystemClock::set`] must serialize on its own.
#[derive(Debug, Default)]
pub struct SystemClock {
    offset: Mutex<f64>,
}

impl SystemClock {
    /// Makes a wall clock with a zero offset
    #[must_use]
    pub fn new() -> SystemClock {
        SystemClock::default()
    }

    /// Shifts the clock so that `now()` currently reads `t`
    pub fn set(&self, t: Time) {
        let wall = wall_utc();
        *self.offset.lock().unwrap() = t.diff(&wall);
    }

    /// Clears the offset, returning to the plain wall clock
    pub fn reset(&self) {
        *self.offset.lock().unwrap() = 0.0;
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Time {
        let offset = *self.offset.lock().unwrap();
        wall_utc().add_seconds(offset)
    }
}

/// A clock frozen at a fixed time, for tests and batch reprocessing
#[derive(Debug, Copy, Clone)]
pub struct FixedClock(pub Time);

impl Clock for FixedClock {
    fn now(&self) -> Time {
        self.0
    }
}

fn wall_utc() -> Time {
    let now = Utc::now();
    Time::new(
        now.timestamp().max(0) as u64,
        f64::from(now.nanosecond()) * 1e-9,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_set_reset() {
        let clock = SystemClock::new();
        let target = Time::from_epoch(2015, 4, 1, 12, 0, 0.0).unwrap();
        clock.set(target);
        let read = clock.now();
        assert!(read.diff(&target).abs() < 1.0);
        clock.reset();
        let wall = clock.now();
        assert!(wall.diff(&target).abs() > 1e6);
    }

    #[test]
    fn fixed_clock_is_fixed() {
        let t = Time::from_epoch(2021, 1, 2, 3, 4, 5.0).unwrap();
        let clock = FixedClock(t);
        assert_eq!(clock.now(), t);
        assert_eq!(clock.now(), t);
    }
}
