// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! State-space representation correction records
//!
//! Each satellite carries one record with six independently-timed
//! correction classes. A message updating one class never disturbs the
//! reference time, update interval or IOD of another class; consumers
//! re-check per-class age every epoch.

use crate::signal::consts::MAX_CODE;
use crate::time::Time;

/// Correction classes carried by a [`SsrCorrection`] record
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(usize)]
pub enum SsrClass {
    /// Orbit deltas in radial/along/cross axes
    Orbit = 0,
    /// Clock polynomial deltas
    Clock = 1,
    /// High-rate clock correction
    HighRateClock = 2,
    /// User range accuracy
    Ura = 3,
    /// Per-code biases
    CodeBias = 4,
    /// Per-code phase biases
    PhaseBias = 5,
}

/// Number of correction classes
pub const SSR_CLASSES: usize = 6;

/// Per-satellite state-space correction record
#[derive(Debug, Clone)]
pub struct SsrCorrection {
    /// Reference time per correction class
    pub t0: [Time; SSR_CLASSES],
    /// Update interval per correction class (s)
    pub udi: [f64; SSR_CLASSES],
    /// IOD SSR per correction class
    pub iod: [i64; SSR_CLASSES],
    /// Broadcast ephemeris IODE the orbit correction refers to
    pub iode: i64,
    /// CRC of the broadcast ephemeris (BeiDou orbit reference)
    pub iodcrc: i64,
    /// User range accuracy code
    pub ura: u8,
    /// Satellite reference datum (false: ITRF, true: regional)
    pub refd: bool,
    /// Orbit deltas: radial, along-track, cross-track (m)
    pub deph: [f64; 3],
    /// Orbit delta rates (m/s)
    pub ddeph: [f64; 3],
    /// Clock polynomial deltas: C0 (m), C1 (m/s), C2 (m/s²)
    pub dclk: [f64; 3],
    /// High-rate clock correction (m)
    pub hrclk: f64,
    /// Code biases indexed by observation code number (m)
    pub cbias: [f32; MAX_CODE as usize + 1],
    /// Phase biases indexed by observation code number (m)
    pub pbias: [f64; MAX_CODE as usize + 1],
    /// Phase bias standard deviations (m)
    pub stdpb: [f32; MAX_CODE as usize + 1],
    /// Yaw angle of the phase bias reference (rad)
    pub yaw_ang: f64,
    /// Yaw rate (rad/s)
    pub yaw_rate: f64,
    /// Set when the record changed since the consumer last looked
    pub update: bool,
}

impl Default for SsrCorrection {
    fn default() -> Self {
        SsrCorrection {
            t0: [Time::default(); SSR_CLASSES],
            udi: [0.0; SSR_CLASSES],
            iod: [0; SSR_CLASSES],
            iode: 0,
            iodcrc: 0,
            ura: 0,
            refd: false,
            deph: [0.0; 3],
            ddeph: [0.0; 3],
            dclk: [0.0; 3],
            hrclk: 0.0,
            cbias: [0.0; MAX_CODE as usize + 1],
            pbias: [0.0; MAX_CODE as usize + 1],
            stdpb: [0.0; MAX_CODE as usize + 1],
            yaw_ang: 0.0,
            yaw_rate: 0.0,
            update: false,
        }
    }
}

impl SsrCorrection {
    /// Checks whether a correction class is within its validity window
    ///
    /// The window is `max_age` plus half the update interval, measured
    /// from the class reference time.
    #[must_use]
    pub fn is_valid(&self, class: SsrClass, t: Time, max_age: f64) -> bool {
        let i = class as usize;
        let age = t.diff(&self.t0[i]).abs();
        self.t0[i].sec() != 0 && age <= max_age + self.udi[i] * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_independence() {
        let mut ssr = SsrCorrection::default();
        let t_orbit = Time::from_gps(2100, 1000.0);
        let t_clock = Time::from_gps(2100, 1010.0);

        ssr.t0[SsrClass::Orbit as usize] = t_orbit;
        ssr.udi[SsrClass::Orbit as usize] = 60.0;
        ssr.iod[SsrClass::Orbit as usize] = 4;

        ssr.t0[SsrClass::Clock as usize] = t_clock;
        ssr.udi[SsrClass::Clock as usize] = 5.0;

        assert_eq!(ssr.t0[SsrClass::Orbit as usize], t_orbit);
        assert_eq!(ssr.t0[SsrClass::Clock as usize], t_clock);
        assert_eq!(ssr.iod[SsrClass::Clock as usize], 0);
    }

    #[test]
    fn validity_window() {
        let mut ssr = SsrCorrection::default();
        let t0 = Time::from_gps(2100, 1000.0);
        ssr.t0[SsrClass::Clock as usize] = t0;
        ssr.udi[SsrClass::Clock as usize] = 10.0;

        assert!(ssr.is_valid(SsrClass::Clock, t0.add_seconds(30.0), 90.0));
        assert!(!ssr.is_valid(SsrClass::Clock, t0.add_seconds(200.0), 90.0));
        /* an unset class is never valid */
        assert!(!ssr.is_valid(SsrClass::Orbit, t0, 90.0));
    }
}
