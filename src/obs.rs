// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Observation records
//!
//! One [`ObsData`] holds every signal measured on one satellite at one
//! epoch by one receiver; an [`ObsEpoch`] is the bounded working set a
//! decoder assembles until the epoch completes. Within an epoch the
//! (time, receiver, satellite) triple is unique and records order by
//! time, then receiver, then satellite.

use crate::signal::consts::NUM_OBS_SLOTS;
use crate::signal::{Code, Sat};
use crate::time::Time;
use serde::{Deserialize, Serialize};

/// Maximum number of observation records in one epoch
pub const MAX_OBS: usize = 96;

/// Loss-of-lock indicator: cycle slip
pub const LLI_SLIP: u8 = 0x01;
/// Loss-of-lock indicator: half-cycle ambiguity
pub const LLI_HALF_CYCLE: u8 = 0x02;
/// Loss-of-lock indicator: half-cycle ambiguity possibly present
pub const LLI_HALF_SUSPECT: u8 = 0x08;

/// Scale of the quantized carrier-to-noise ratio (dB-Hz per count)
pub const SNR_UNIT: f64 = 0.001;

/// Observation data of one satellite at one epoch
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct ObsData {
    /// Receiver time stamp of the epoch (GPST)
    pub time: Time,
    /// Observed satellite
    pub sat: Sat,
    /// Receiver index (1 = rover, 2 = base)
    pub rcv: u8,
    /// Pseudorange per frequency slot (m), 0 when absent
    pub pseudorange: [f64; NUM_OBS_SLOTS],
    /// Carrier phase per frequency slot (cycles), 0 when absent
    pub carrier: [f64; NUM_OBS_SLOTS],
    /// Doppler per frequency slot (Hz)
    pub doppler: [f64; NUM_OBS_SLOTS],
    /// Carrier-to-noise density, quantized by [`SNR_UNIT`]
    pub snr: [u16; NUM_OBS_SLOTS],
    /// Loss-of-lock indicator bits per frequency slot
    pub lli: [u8; NUM_OBS_SLOTS],
    /// Observation code per frequency slot
    pub code: [Code; NUM_OBS_SLOTS],
}

impl ObsData {
    /// Makes an empty record for a satellite at an epoch
    #[must_use]
    pub fn new(time: Time, sat: Sat, rcv: u8) -> ObsData {
        ObsData {
            time,
            sat,
            rcv,
            pseudorange: [0.0; NUM_OBS_SLOTS],
            carrier: [0.0; NUM_OBS_SLOTS],
            doppler: [0.0; NUM_OBS_SLOTS],
            snr: [0; NUM_OBS_SLOTS],
            lli: [0; NUM_OBS_SLOTS],
            code: [Code::None; NUM_OBS_SLOTS],
        }
    }

    /// Checks whether any frequency slot carries a measurement
    #[must_use]
    pub fn has_any_signal(&self) -> bool {
        (0..NUM_OBS_SLOTS).any(|i| {
            self.pseudorange[i] != 0.0 || self.carrier[i] != 0.0 || self.code[i] != Code::None
        })
    }
}

/// A bounded, ordered set of observation records forming one epoch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObsEpoch {
    records: Vec<ObsData>,
}

impl ObsEpoch {
    /// Makes an empty epoch
    #[must_use]
    pub fn new() -> ObsEpoch {
        ObsEpoch::default()
    }

    /// Number of records in the epoch
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Checks whether the epoch is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Views the records
    #[must_use]
    pub fn records(&self) -> &[ObsData] {
        &self.records
    }

    /// Views the records mutably
    #[must_use]
    pub fn records_mut(&mut self) -> &mut [ObsData] {
        &mut self.records
    }

    /// Appends a record, dropping it when the epoch buffer is full
    ///
    /// Returns whether the record was stored.
    pub fn push(&mut self, obs: ObsData) -> bool {
        if self.records.len() >= MAX_OBS {
            log::warn!("observation buffer full, dropping {}", obs.sat);
            return false;
        }
        self.records.push(obs);
        true
    }

    /// Finds the record of a satellite within the epoch
    #[must_use]
    pub fn find(&self, sat: Sat) -> Option<&ObsData> {
        self.records.iter().find(|o| o.sat == sat)
    }

    /// Finds the record of a satellite within the epoch, mutably
    #[must_use]
    pub fn find_mut(&mut self, sat: Sat) -> Option<&mut ObsData> {
        self.records.iter_mut().find(|o| o.sat == sat)
    }

    /// Sorts records by time, receiver, satellite and drops duplicates
    ///
    /// The later record of a duplicated (time, receiver, satellite) triple
    /// wins, matching the arrival-order replacement rule.
    pub fn sort_and_dedup(&mut self) {
        self.records.sort_by(|a, b| {
            a.time
                .partial_cmp(&b.time)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.rcv.cmp(&b.rcv))
                .then(a.sat.cmp(&b.sat))
        });
        /* keep the last arrival of each triple */
        self.records.reverse();
        self.records
            .dedup_by(|a, b| a.time == b.time && a.rcv == b.rcv && a.sat == b.sat);
        self.records.reverse();
    }

    /// Empties the epoch
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::System;

    fn sat(prn: u8) -> Sat {
        Sat::new(System::Gps, prn).unwrap()
    }

    #[test]
    fn push_bounded() {
        let t = Time::from_gps(2100, 0.0);
        let mut epoch = ObsEpoch::new();
        for i in 0..MAX_OBS {
            let s = Sat::from_number((i + 1) as u16).unwrap();
            assert!(epoch.push(ObsData::new(t, s, 1)));
        }
        /* buffer full: excess record is dropped */
        assert!(!epoch.push(ObsData::new(t, sat(1), 1)));
        assert_eq!(epoch.len(), MAX_OBS);
    }

    #[test]
    fn ordering_and_dedup() {
        let t0 = Time::from_gps(2100, 0.0);
        let t1 = Time::from_gps(2100, 1.0);
        let mut epoch = ObsEpoch::new();

        epoch.push(ObsData::new(t1, sat(3), 1));
        epoch.push(ObsData::new(t0, sat(7), 2));
        epoch.push(ObsData::new(t0, sat(5), 1));
        let mut dup = ObsData::new(t0, sat(5), 1);
        dup.pseudorange[0] = 2.0e7;
        epoch.push(dup);

        epoch.sort_and_dedup();
        assert_eq!(epoch.len(), 3);
        assert_eq!(epoch.records()[0].sat, sat(5));
        /* the later arrival replaced the duplicate */
        assert!(epoch.records()[0].pseudorange[0] != 0.0);
        assert_eq!(epoch.records()[1].sat, sat(7));
        assert_eq!(epoch.records()[2].sat, sat(3));
    }

    #[test]
    fn signal_presence() {
        let t = Time::from_gps(2100, 0.0);
        let mut obs = ObsData::new(t, sat(1), 1);
        assert!(!obs.has_any_signal());
        obs.code[0] = Code::L1C;
        assert!(obs.has_any_signal());
    }
}
