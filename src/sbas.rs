// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! SBAS augmentation engine
//!
//! Decoded SBAS messages accumulate into fast corrections, long-term
//! corrections, geostationary ephemerides and an ionospheric grid; the
//! engine answers per-satellite range/clock correction queries and
//! grid-interpolated ionospheric delay queries, both gated by validity
//! windows.
//!
//! Message types handled (RTCA DO-229):
//!
//! | type | content |
//! |------|---------|
//! | 1 | PRN mask (210 slots, up to 51 selected) |
//! | 0, 2-5 | fast pseudorange corrections, 13 satellites each |
//! | 6 | integrity (UDRE refresh, gated on IODF) |
//! | 7 | fast correction degradation factors |
//! | 9 | geostationary navigation message |
//! | 18 | ionospheric grid point mask per band |
//! | 24 | mixed fast / long-term corrections |
//! | 25 | long-term satellite error corrections |
//! | 26 | ionospheric delays per grid point |

use crate::bits::{get_bits, get_bitu};
use crate::consts::{CLIGHT, P2_11, P2_31, P2_39, RE_WGS84, R2D};
use crate::eph::{GeoEph, NavData};
use crate::signal::{Sat, System};
use crate::time::{utc_to_gpst, Time};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Fast correction age limit (s)
pub const MAX_SBS_AGE_F: f64 = 30.0;
/// Long-term correction age limit (s)
pub const MAX_SBS_AGE_L: f64 = 1800.0;
/// Number of ionospheric bands
pub const MAX_BAND: usize = 10;
/// Grid points per band
pub const MAX_NIGP: usize = 201;

/// Fast correction variance by UDRE indicator (m²)
const VAR_UDRE: [f64; 14] = [
    0.052, 0.0924, 0.1444, 0.283, 0.4678, 0.8315, 1.2992, 1.8709, 2.5465, 3.326, 5.1968,
    20.787, 230.9661, 2078.695,
];

/// Fast correction degradation factor by ai indicator (m/s²)
const DEG_F: [f64; 16] = [
    0.0, 0.000_05, 0.000_09, 0.000_12, 0.000_15, 0.000_20, 0.000_30, 0.000_45, 0.000_60,
    0.000_90, 0.001_50, 0.002_10, 0.002_70, 0.003_30, 0.004_60, 0.005_80,
];

/// Ionospheric delay variance by GIVE indicator (m²)
const VAR_GIVE: [f64; 15] = [
    0.0084, 0.0333, 0.0749, 0.1331, 0.2079, 0.2994, 0.4075, 0.5322, 0.6735, 0.8315, 1.1974,
    1.8709, 3.3260, 20.787, 187.0826,
];

fn var_fast(udre: u8) -> f64 {
    /* the stored indicator counts from 1 */
    VAR_UDRE
        .get((udre as usize).saturating_sub(1))
        .copied()
        .unwrap_or(f64::MAX)
}

fn deg_fast(ai: u8) -> f64 {
    DEG_F.get(ai as usize).copied().unwrap_or(0.0058)
}

fn var_iono(give: u8) -> f64 {
    VAR_GIVE
        .get((give as usize).saturating_sub(1))
        .copied()
        .unwrap_or(187.0826)
}

/// One raw SBAS message: 250 bits delivered as 29 packed bytes
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct SbasMessage {
    /// GPS week of reception
    pub week: i64,
    /// GPS time of week of reception (s)
    pub tow: f64,
    /// Transmitting geostationary PRN
    pub prn: u8,
    /// Packed message: 8-bit preamble, 6-bit type, 212-bit payload,
    /// 24-bit CRC
    pub data: [u8; 29],
}

impl SbasMessage {
    /// Gets the 6-bit message type
    #[must_use]
    pub fn message_type(&self) -> u8 {
        get_bitu(&self.data, 8, 6) as u8
    }

    /// Gets the reception time as a time point
    #[must_use]
    pub fn time(&self) -> Time {
        Time::from_gps(self.week, self.tow)
    }
}

/// Fast pseudorange correction of one satellite
#[derive(Debug, Copy, Clone, Default)]
pub struct FastCorrection {
    /// Reference time
    pub t0: Time,
    /// Pseudorange correction (m)
    pub prc: f64,
    /// Range-rate correction (m/s)
    pub rrc: f64,
    /// Interval between the samples forming `rrc` (s)
    pub dt: f64,
    /// Issue of data, fast correction
    pub iodf: u8,
    /// UDRE indicator + 1 (0 = not set, 15+1 = don't use)
    pub udre: u8,
    /// Degradation factor indicator
    pub ai: u8,
}

/// Long-term satellite error correction
#[derive(Debug, Copy, Clone, Default)]
pub struct LongTermCorrection {
    /// Reference time
    pub t0: Time,
    /// Broadcast ephemeris issue of data the correction refers to
    pub iode: i64,
    /// Position delta (ECEF m)
    pub dpos: [f64; 3],
    /// Velocity delta (ECEF m/s)
    pub dvel: [f64; 3],
    /// Clock offset delta (s)
    pub daf0: f64,
    /// Clock drift delta (s/s)
    pub daf1: f64,
}

/// Correction state of one PRN-mask slot
#[derive(Debug, Copy, Clone, Default)]
pub struct SbasSatCorrection {
    /// The satellite the slot maps to (`None` for unsupported slots)
    pub sat: Option<Sat>,
    /// Fast correction
    pub fast: FastCorrection,
    /// Long-term correction
    pub long_term: LongTermCorrection,
}

/// One ionospheric grid point
#[derive(Debug, Copy, Clone, Default)]
pub struct IonoGridPoint {
    /// Latitude (deg)
    pub lat: i16,
    /// Longitude (deg)
    pub lon: i16,
    /// Reference time of the delay
    pub t0: Time,
    /// Vertical delay (m); 0 with an unset `t0` means no data
    pub delay: f64,
    /// GIVE indicator + 1 (0 = not set)
    pub give: u8,
}

/// One ionospheric band: its masked grid points
#[derive(Debug, Clone, Default)]
pub struct IonoBand {
    /// Issue of data, ionosphere
    pub iodi: u8,
    /// Activated grid points
    pub igps: Vec<IonoGridPoint>,
}

/// SBAS correction state accumulated from messages
#[derive(Debug, Clone)]
pub struct SbasEngine {
    /// Issue of data of the PRN mask
    pub iodp: u8,
    /// PRN mask slots in mask order
    pub sats: Vec<SbasSatCorrection>,
    /// System latency from the type 7 message (s)
    pub tlat: f64,
    /// Ionospheric bands 0..=10
    pub bands: Vec<IonoBand>,
}

impl Default for SbasEngine {
    fn default() -> Self {
        SbasEngine {
            iodp: 0,
            sats: Vec::new(),
            tlat: 0.0,
            bands: vec![IonoBand::default(); MAX_BAND + 1],
        }
    }
}

/// Maps a 210-slot PRN mask index onto a satellite
fn mask_slot_to_sat(slot: u16) -> Option<Sat> {
    match slot {
        1..=37 => Sat::new(System::Gps, slot as u8).ok(),
        38..=61 => Sat::new(System::Glo, (slot - 37) as u8).ok(),
        120..=138 => Sat::new(System::Sbs, slot as u8).ok(),
        183..=192 => Sat::new(System::Sbs, (slot + 10) as u8).ok(),
        193..=202 => Sat::new(System::Qzs, slot as u8).ok(),
        _ => None,
    }
}

impl SbasEngine {
    /// Makes an empty engine
    #[must_use]
    pub fn new() -> SbasEngine {
        SbasEngine::default()
    }

    /// Folds one message into the correction state
    ///
    /// Geo navigation messages land in `nav`. Returns the message type
    /// when the message changed any state.
    pub fn update(&mut self, msg: &SbasMessage, nav: &mut NavData) -> Option<u8> {
        let msg_type = msg.message_type();
        let handled = match msg_type {
            1 => self.decode_mask(msg),
            0 | 2..=5 => self.decode_fast(msg, msg_type),
            6 => self.decode_integrity(msg),
            7 => self.decode_degradation(msg),
            9 => decode_geo_nav(msg, nav),
            18 => self.decode_igp_mask(msg),
            24 => self.decode_mixed(msg),
            25 => self.decode_long_term(msg),
            26 => self.decode_iono_delay(msg),
            _ => {
                log::debug!("sbas type {} not processed", msg_type);
                false
            }
        };
        if handled {
            Some(msg_type)
        } else {
            None
        }
    }

    /// Type 1: PRN mask
    fn decode_mask(&mut self, msg: &SbasMessage) -> bool {
        let mut sats = Vec::new();
        for slot in 1..=210u16 {
            if get_bitu(&msg.data, 13 + slot as usize, 1) == 1 {
                sats.push(SbasSatCorrection {
                    sat: mask_slot_to_sat(slot),
                    ..SbasSatCorrection::default()
                });
            }
        }
        self.iodp = get_bitu(&msg.data, 224, 2) as u8;
        self.sats = sats;
        log::debug!("sbas mask: nsat={} iodp={}", self.sats.len(), self.iodp);
        true
    }

    /// Types 0 and 2-5: fast corrections, 13 satellites per message
    fn decode_fast(&mut self, msg: &SbasMessage, msg_type: u8) -> bool {
        let effective = if msg_type == 0 { 2 } else { msg_type };
        let iodf = get_bitu(&msg.data, 14, 2) as u8;
        if self.iodp != get_bitu(&msg.data, 16, 2) as u8 {
            log::warn!("sbas fast correction iodp mismatch");
            return false;
        }
        let offset = 13 * (effective as usize - 2);
        let t_new = msg.time();

        for i in 0..13 {
            let j = offset + i;
            if j >= self.sats.len() {
                break;
            }
            let udre = get_bitu(&msg.data, 174 + 4 * i, 4) as u8;
            let prc_new = f64::from(get_bits(&msg.data, 18 + i * 12, 12)) * 0.125;

            let slot = &mut self.sats[j];
            let t_prev = slot.fast.t0;
            let prc_prev = slot.fast.prc;
            slot.fast.t0 = t_new;
            slot.fast.prc = prc_new;
            slot.fast.udre = udre + 1;
            let dt = t_new.diff(&t_prev);
            if t_prev.sec() == 0 || dt <= 0.0 || dt > 18.0 || slot.fast.ai == 0 {
                slot.fast.rrc = 0.0;
                slot.fast.dt = 0.0;
            } else {
                slot.fast.rrc = (prc_new - prc_prev) / dt;
                slot.fast.dt = dt;
            }
            slot.fast.iodf = iodf;
        }
        true
    }

    /// Type 6: integrity information
    fn decode_integrity(&mut self, msg: &SbasMessage) -> bool {
        for i in 0..self.sats.len().min(51) {
            let iodf = get_bitu(&msg.data, 14 + (i / 13) * 2, 2) as u8;
            if self.sats[i].fast.iodf != iodf {
                continue;
            }
            let udre = get_bitu(&msg.data, 22 + i * 4, 4) as u8;
            self.sats[i].fast.udre = udre + 1;
        }
        true
    }

    /// Type 7: fast correction degradation factors
    fn decode_degradation(&mut self, msg: &SbasMessage) -> bool {
        if self.iodp != get_bitu(&msg.data, 18, 2) as u8 {
            return false;
        }
        self.tlat = get_bitu(&msg.data, 14, 4) as f64;
        for i in 0..self.sats.len().min(51) {
            self.sats[i].fast.ai = get_bitu(&msg.data, 22 + i * 4, 4) as u8;
        }
        true
    }

    /// Type 18: ionospheric grid point mask of one band
    fn decode_igp_mask(&mut self, msg: &SbasMessage) -> bool {
        let band = get_bitu(&msg.data, 18, 4) as usize;
        if band > MAX_BAND {
            return false;
        }
        let iodi = get_bitu(&msg.data, 22, 2) as u8;

        let mut igps = Vec::new();
        for bit in 1..=MAX_NIGP {
            if get_bitu(&msg.data, 23 + bit, 1) == 0 {
                continue;
            }
            if let Some((lat, lon)) = igp_grid_position(band, bit as u16) {
                igps.push(IonoGridPoint {
                    lat,
                    lon,
                    ..IonoGridPoint::default()
                });
            }
        }
        log::debug!("sbas igp mask: band={} nigp={}", band, igps.len());
        self.bands[band] = IonoBand { iodi, igps };
        true
    }

    /// Type 24: mixed fast / long-term corrections
    fn decode_mixed(&mut self, msg: &SbasMessage) -> bool {
        if self.iodp != get_bitu(&msg.data, 110, 2) as u8 {
            return false;
        }
        let block = get_bitu(&msg.data, 112, 2) as usize;
        let iodf = get_bitu(&msg.data, 114, 2) as u8;
        let t_new = msg.time();

        for i in 0..6 {
            let j = 13 * block + i;
            if j >= self.sats.len() {
                break;
            }
            let udre = get_bitu(&msg.data, 86 + 4 * i, 4) as u8;
            let prc_new = f64::from(get_bits(&msg.data, 14 + i * 12, 12)) * 0.125;

            let slot = &mut self.sats[j];
            let t_prev = slot.fast.t0;
            let prc_prev = slot.fast.prc;
            slot.fast.t0 = t_new;
            slot.fast.prc = prc_new;
            slot.fast.udre = udre + 1;
            let dt = t_new.diff(&t_prev);
            if t_prev.sec() == 0 || dt <= 0.0 || dt > 18.0 || slot.fast.ai == 0 {
                slot.fast.rrc = 0.0;
                slot.fast.dt = 0.0;
            } else {
                slot.fast.rrc = (prc_new - prc_prev) / dt;
                slot.fast.dt = dt;
            }
            slot.fast.iodf = iodf;
        }
        self.decode_long_term_half(msg, 120)
    }

    /// Type 25: long-term satellite error corrections
    fn decode_long_term(&mut self, msg: &SbasMessage) -> bool {
        let first = self.decode_long_term_half(msg, 14);
        let second = self.decode_long_term_half(msg, 120);
        first || second
    }

    /// One 106-bit long-term half message at bit position `p`
    fn decode_long_term_half(&mut self, msg: &SbasMessage, p: usize) -> bool {
        if get_bitu(&msg.data, p, 1) == 0 {
            /* velocity code 0: two compact blocks */
            if self.iodp != get_bitu(&msg.data, p + 103, 2) as u8 {
                return false;
            }
            let a = self.decode_long_term_v0(msg, p + 1);
            let b = self.decode_long_term_v0(msg, p + 52);
            a || b
        } else {
            if self.iodp != get_bitu(&msg.data, p + 104, 2) as u8 {
                return false;
            }
            self.decode_long_term_v1(msg, p + 1)
        }
    }

    /// Velocity-code-0 block: position and clock offset only
    fn decode_long_term_v0(&mut self, msg: &SbasMessage, p: usize) -> bool {
        let n = get_bitu(&msg.data, p, 6) as usize;
        if n == 0 || n > self.sats.len() {
            return false;
        }
        let slot = &mut self.sats[n - 1];
        slot.long_term.iode = i64::from(get_bitu(&msg.data, p + 6, 8));
        for k in 0..3 {
            slot.long_term.dpos[k] = f64::from(get_bits(&msg.data, p + 14 + 9 * k, 9)) * 0.125;
        }
        slot.long_term.daf0 = f64::from(get_bits(&msg.data, p + 41, 10)) * P2_31;
        slot.long_term.daf1 = 0.0;
        slot.long_term.dvel = [0.0; 3];
        slot.long_term.t0 = msg.time();
        true
    }

    /// Velocity-code-1 block: adds velocity, drift and an explicit epoch
    fn decode_long_term_v1(&mut self, msg: &SbasMessage, p: usize) -> bool {
        let n = get_bitu(&msg.data, p, 6) as usize;
        if n == 0 || n > self.sats.len() {
            return false;
        }
        let slot = &mut self.sats[n - 1];
        slot.long_term.iode = i64::from(get_bitu(&msg.data, p + 6, 8));
        for k in 0..3 {
            slot.long_term.dpos[k] = f64::from(get_bits(&msg.data, p + 14 + 11 * k, 11)) * 0.125;
        }
        for k in 0..3 {
            slot.long_term.dvel[k] = f64::from(get_bits(&msg.data, p + 47 + 8 * k, 8)) * P2_11;
        }
        slot.long_term.daf0 = f64::from(get_bits(&msg.data, p + 71, 11)) * P2_31;
        slot.long_term.daf1 = f64::from(get_bits(&msg.data, p + 82, 8)) * P2_39;

        /* time-of-day epoch resolved against the reception time */
        let mut t = f64::from(get_bitu(&msg.data, p + 90, 13)) * 16.0 - msg.tow % 86_400.0;
        if t <= -43_200.0 {
            t += 86_400.0;
        } else if t > 43_200.0 {
            t -= 86_400.0;
        }
        slot.long_term.t0 = Time::from_gps(msg.week, msg.tow + t);
        true
    }

    /// Type 26: ionospheric delays of one band block
    fn decode_iono_delay(&mut self, msg: &SbasMessage) -> bool {
        let band = get_bitu(&msg.data, 14, 4) as usize;
        if band > MAX_BAND {
            return false;
        }
        if self.bands[band].iodi != get_bitu(&msg.data, 217, 2) as u8 {
            log::warn!("sbas iono delay iodi mismatch, band={}", band);
            return false;
        }
        let block = get_bitu(&msg.data, 18, 4) as usize;
        let t0 = msg.time();

        for i in 0..15 {
            let j = block * 15 + i;
            if j >= self.bands[band].igps.len() {
                continue;
            }
            let delay = get_bitu(&msg.data, 22 + i * 13, 9);
            let give = get_bitu(&msg.data, 22 + i * 13 + 9, 4) as u8;

            let igp = &mut self.bands[band].igps[j];
            igp.t0 = t0;
            /* 0x1FF flags an unusable delay */
            igp.delay = if delay == 0x1FF {
                0.0
            } else {
                f64::from(delay) * 0.125
            };
            igp.give = if give >= 15 { 0 } else { give + 1 };
        }
        true
    }

    fn find_slot(&self, sat: Sat) -> Option<&SbasSatCorrection> {
        self.sats.iter().find(|s| s.sat == Some(sat))
    }

    /// Long-term correction at an epoch
    fn long_term_at(&self, time: Time, sat: Sat) -> Option<([f64; 3], f64)> {
        match self.find_slot(sat) {
            Some(slot) if slot.long_term.t0.sec() != 0 => {
                let t = time.diff(&slot.long_term.t0);
                if t.abs() > MAX_SBS_AGE_L {
                    log::warn!("sbas long-term correction expired: {}", sat);
                    return None;
                }
                let mut dpos = [0.0; 3];
                for k in 0..3 {
                    dpos[k] = slot.long_term.dpos[k] + slot.long_term.dvel[k] * t;
                }
                Some((dpos, slot.long_term.daf0 + slot.long_term.daf1 * t))
            }
            /* geo satellites may fly without a long-term correction */
            _ if sat.system() == System::Sbs => Some(([0.0; 3], 0.0)),
            _ => None,
        }
    }

    /// Fast correction at an epoch: (prc, variance)
    fn fast_at(&self, time: Time, sat: Sat) -> Option<(f64, f64)> {
        let slot = self.find_slot(sat)?;
        if slot.fast.t0.sec() == 0 {
            return None;
        }
        let t = time.diff(&slot.fast.t0) + self.tlat;
        if t.abs() > MAX_SBS_AGE_F || slot.fast.udre >= 15 {
            log::warn!("sbas fast correction unusable: {}", sat);
            return None;
        }
        let mut prc = slot.fast.prc;
        if slot.fast.ai > 0 && t.abs() <= 8.0 * slot.fast.dt {
            prc += slot.fast.rrc * t;
        }
        let var = var_fast(slot.fast.udre) + deg_fast(slot.fast.ai) * t * t / 2.0;
        Some((prc, var))
    }

    /// Applies the SBAS range and clock correction to a satellite state
    ///
    /// On success `rs` gains the long-term position delta, `dts` gains
    /// the clock delta plus the fast correction converted to seconds,
    /// and the combined variance is returned. A stale or missing
    /// correction yields `None` with the state untouched.
    pub fn satellite_correction(
        &self,
        time: Time,
        sat: Sat,
        rs: &mut [f64; 3],
        dts: &mut f64,
    ) -> Option<f64> {
        let (dpos, dclk) = self.long_term_at(time, sat)?;
        let (prc, var) = self.fast_at(time, sat)?;
        for k in 0..3 {
            rs[k] += dpos[k];
        }
        *dts += dclk + prc / CLIGHT;
        Some(var)
    }

    /// Grid-interpolated ionospheric delay at the pierce point
    ///
    /// Bilinear over the four surrounding grid points, with triangular
    /// fallbacks when one corner is missing; fewer than three usable
    /// corners yields `None`. Output is the L1 slant delay (m) and its
    /// variance.
    pub fn ionosphere_correction(
        &self,
        time: Time,
        pos: &[f64; 3],
        az: f64,
        el: f64,
    ) -> Option<(f64, f64)> {
        if pos[2] < -100.0 || el <= 0.0 {
            return Some((0.0, 0.0));
        }

        /* pierce point at the 350 km shell */
        let (pierce, fp) = pierce_point(pos, az, el, RE_WGS84 / 1000.0, 350.0);

        let (corners, x, y) = self.surrounding_igps(&pierce);
        let mut w = [0.0f64; 4];
        let have = |k: usize| corners[k].is_some();

        if have(0) && have(1) && have(2) && have(3) {
            w[0] = (1.0 - x) * (1.0 - y);
            w[1] = x * (1.0 - y);
            w[2] = (1.0 - x) * y;
            w[3] = x * y;
        } else if have(0) && have(1) && have(2) {
            w[1] = x;
            w[2] = y;
            w[0] = 1.0 - w[1] - w[2];
            if w[0] < 0.0 {
                return None;
            }
        } else if have(0) && have(1) && have(3) {
            w[0] = 1.0 - x;
            w[3] = y;
            w[1] = 1.0 - w[0] - w[3];
            if w[1] < 0.0 {
                return None;
            }
        } else if have(0) && have(2) && have(3) {
            w[0] = 1.0 - y;
            w[3] = x;
            w[2] = 1.0 - w[0] - w[3];
            if w[2] < 0.0 {
                return None;
            }
        } else if have(1) && have(2) && have(3) {
            w[1] = 1.0 - y;
            w[2] = 1.0 - x;
            w[3] = 1.0 - w[1] - w[2];
            if w[3] < 0.0 {
                return None;
            }
        } else {
            return None;
        }

        let mut delay = 0.0;
        let mut var = 0.0;
        for k in 0..4 {
            if let Some(igp) = corners[k] {
                let t = time.diff(&igp.t0);
                delay += w[k] * igp.delay;
                var += w[k] * var_iono(igp.give) * 9e-8 * t.abs();
            }
        }
        Some((delay * fp, var * fp * fp))
    }

    /// Finds the four grid points around a pierce point
    ///
    /// Returns the corners in the order (SW, SE, NW, NE) together with
    /// the fractional cell position.
    fn surrounding_igps(
        &self,
        pierce: &[f64; 2],
    ) -> ([Option<&IonoGridPoint>; 4], f64, f64) {
        let lat = pierce[0] * R2D;
        let mut lon = pierce[1] * R2D;
        if lon >= 180.0 {
            lon -= 360.0;
        }

        let (lats, lons, x, y);
        if (-55.0..55.0).contains(&lat) {
            let lat0 = (lat / 5.0).floor() * 5.0;
            let lon0 = (lon / 5.0).floor() * 5.0;
            lats = [lat0, lat0, lat0 + 5.0, lat0 + 5.0];
            lons = [lon0, lon0 + 5.0, lon0, lon0 + 5.0];
            x = (lon - lon0) / 5.0;
            y = (lat - lat0) / 5.0;
        } else {
            /* 10 degree grid towards the poles */
            let lat0 = ((lat - 5.0) / 10.0).floor() * 10.0 + 5.0;
            let lon0 = (lon / 10.0).floor() * 10.0;
            lats = [lat0, lat0, lat0 + 10.0, lat0 + 10.0];
            lons = [lon0, lon0 + 10.0, lon0, lon0 + 10.0];
            x = (lon - lon0) / 10.0;
            y = (lat - lat0) / 10.0;
        }

        let mut corners: [Option<&IonoGridPoint>; 4] = [None; 4];
        for band in self.bands.iter() {
            for igp in band.igps.iter() {
                if igp.t0.sec() == 0 {
                    continue;
                }
                for k in 0..4 {
                    let mut lon_k = lons[k];
                    if lon_k == 180.0 {
                        lon_k = -180.0;
                    }
                    if f64::from(igp.lat) == lats[k] && f64::from(igp.lon) == lon_k {
                        corners[k] = Some(igp);
                    }
                }
            }
        }
        (corners, x, y)
    }
}

/// Type 9: geostationary navigation message
fn decode_geo_nav(msg: &SbasMessage, nav: &mut NavData) -> bool {
    let sat = match Sat::new(System::Sbs, msg.prn) {
        Ok(sat) => sat,
        Err(_) => {
            log::warn!("sbas geo nav: invalid prn {}", msg.prn);
            return false;
        }
    };
    let data = &msg.data;

    let mut t = f64::from(get_bitu(data, 22, 13)) * 16.0 - msg.tow % 86_400.0;
    if t <= -43_200.0 {
        t += 86_400.0;
    } else if t > 43_200.0 {
        t -= 86_400.0;
    }
    let sva = get_bitu(data, 35, 4) as u8;
    let seph = GeoEph {
        sat: Some(sat),
        t0: Time::from_gps(msg.week, msg.tow + t),
        tof: Time::from_gps(msg.week, msg.tow),
        sva,
        svh: if sva == 15 { 1 } else { 0 },
        pos: [
            f64::from(get_bits(data, 39, 30)) * 0.08,
            f64::from(get_bits(data, 69, 30)) * 0.08,
            f64::from(get_bits(data, 99, 25)) * 0.4,
        ],
        vel: [
            f64::from(get_bits(data, 124, 17)) * 0.000_625,
            f64::from(get_bits(data, 141, 17)) * 0.000_625,
            f64::from(get_bits(data, 158, 18)) * 0.004,
        ],
        acc: [
            f64::from(get_bits(data, 176, 10)) * 0.000_012_5,
            f64::from(get_bits(data, 186, 10)) * 0.000_012_5,
            f64::from(get_bits(data, 196, 10)) * 0.000_062_5,
        ],
        af0: f64::from(get_bits(data, 206, 12)) * P2_31,
        af1: f64::from(get_bits(data, 218, 8)) * P2_39,
    };

    /* an unchanged reference epoch leaves the store alone */
    if let Some(current) = nav.seph(sat, false) {
        if current.t0.diff(&seph.t0).abs() < 1e-3 {
            return false;
        }
    }
    nav.set_seph(seph);
    true
}

/// Ionospheric pierce point at a thin shell; returns the geodetic pierce
/// position (lat, lon) and the obliquity factor
fn pierce_point(pos: &[f64; 3], az: f64, el: f64, re_km: f64, hion_km: f64) -> ([f64; 2], f64) {
    use std::f64::consts::FRAC_PI_2;

    let rp = re_km / (re_km + hion_km) * el.cos();
    let ap = FRAC_PI_2 - el - rp.asin();
    let (sinap, cosap) = ap.sin_cos();
    let tanap = ap.tan();
    let cosaz = az.cos();

    let lat_p = (pos[0].sin() * cosap + pos[0].cos() * sinap * cosaz).asin();
    let lon_p = if (pos[0] > 70.0_f64.to_radians() && tanap * cosaz > (FRAC_PI_2 - pos[0]).tan())
        || (pos[0] < -70.0_f64.to_radians() && -tanap * cosaz > (FRAC_PI_2 + pos[0]).tan())
    {
        pos[1] + std::f64::consts::PI - (sinap * az.sin() / lat_p.cos()).asin()
    } else {
        pos[1] + (sinap * az.sin() / lat_p.cos()).asin()
    };
    ([lat_p, lon_p], 1.0 / (1.0 - rp * rp).sqrt())
}

/* MOPS troposphere ---------------------------------------------------- */

/// Meteorological parameter table, latitudes 15°..75°: averages then
/// seasonal amplitudes of (P0 hPa, T0 K, e0 hPa, β K/m, λ)
const MET_TABLE: [[f64; 10]; 5] = [
    [1013.25, 299.65, 26.31, 6.30e-3, 2.77, 0.00, 0.00, 0.00, 0.00e-3, 0.00],
    [1017.25, 294.15, 21.79, 6.05e-3, 3.15, -3.75, 7.00, 8.85, 0.25e-3, 0.33],
    [1015.75, 283.15, 11.66, 5.58e-3, 2.57, -2.25, 11.00, 7.24, 0.32e-3, 0.46],
    [1011.75, 272.15, 6.78, 5.39e-3, 1.81, -1.75, 15.00, 5.36, 0.81e-3, 0.74],
    [1013.00, 263.65, 4.11, 4.53e-3, 1.55, -0.50, 14.50, 3.39, 0.62e-3, 0.30],
];

fn interp_met(values: impl Fn(usize) -> f64, lat_deg: f64) -> f64 {
    let i = (lat_deg / 15.0) as i32;
    if i < 1 {
        values(0)
    } else if i > 4 {
        values(4)
    } else {
        let frac = lat_deg / 15.0 - i as f64;
        values(i as usize - 1) * (1.0 - frac) + values(i as usize) * frac
    }
}

/// MOPS tropospheric delay (m) and its variance (m²)
///
/// Monthly meteorological parameters interpolated over latitude, with
/// the seasonal term anchored on day 28 (northern hemisphere) or day
/// 211 (southern). The mapping function is `1.001/√(0.002001+sin²el)`.
#[must_use]
pub fn mops_troposphere(time: Time, pos: &[f64; 3], el: f64) -> (f64, f64) {
    const K1: f64 = 77.604;
    const K2: f64 = 382_000.0;
    const RD: f64 = 287.054;
    const GM: f64 = 9.784;
    const G: f64 = 9.806_65;

    if pos[2] < -100.0 || pos[2] > 1e4 || el <= 0.0 {
        return (0.0, 0.0);
    }
    let lat_deg = pos[0] * R2D;
    let hgt = pos[2];

    /* seasonal anchor flips hemispheres */
    let anchor = if lat_deg >= 0.0 { 28.0 } else { 211.0 };
    let doy = time.day_of_year();
    let cosy = (2.0 * std::f64::consts::PI * (doy - anchor) / 365.25).cos();
    let lat_abs = lat_deg.abs();

    let mut met = [0.0; 5];
    for (k, met_k) in met.iter_mut().enumerate() {
        let avg = interp_met(|row| MET_TABLE[row][k], lat_abs);
        let amp = interp_met(|row| MET_TABLE[row][k + 5], lat_abs);
        *met_k = avg - amp * cosy;
    }
    let (p, t, e, beta, lambda) = (met[0], met[1], met[2], met[3], met[4]);

    /* zenith delays at sea level, scaled to the station height */
    let zh = 1e-6 * K1 * RD * p / GM;
    let zw = 1e-6 * K2 * RD / (GM * (lambda + 1.0) - beta * RD) * e / t;
    let zh = zh * (1.0 - beta * hgt / t).powf(G / (RD * beta));
    let zw = zw * (1.0 - beta * hgt / t).powf((lambda + 1.0) * G / (RD * beta) - 1.0);

    let sinel = el.sin();
    let m = 1.001 / (0.002_001 + sinel * sinel).sqrt();
    ((zh + zw) * m, 0.12 * 0.12 * m * m)
}

/* message log readers ------------------------------------------------- */

/// Errors raised while reading an SBAS message log
#[derive(Debug, thiserror::Error)]
pub enum SbasLogError {
    #[error("sbas log unreadable: {0}")]
    /// The file could not be opened or read
    Io(#[from] std::io::Error),
}

fn hex_bytes(field: &str, out: &mut [u8; 29]) -> bool {
    let cleaned: String = field
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .collect();
    if cleaned.len() < 58 {
        return false;
    }
    for (k, out_byte) in out.iter_mut().enumerate() {
        match u8::from_str_radix(&cleaned[2 * k..2 * k + 2], 16) {
            Ok(byte) => *out_byte = byte,
            Err(_) => return false,
        }
    }
    true
}

/// Parses one `.sbs` log line: `week tow prn : 58-hex-chars`
fn parse_sbs_line(line: &str) -> Option<SbasMessage> {
    let (head, hex) = line.split_once(':')?;
    let mut it = head.split_whitespace();
    let week: i64 = it.next()?.parse().ok()?;
    let tow: f64 = it.next()?.parse().ok()?;
    let prn: u8 = it.next()?.parse().ok()?;
    let mut data = [0u8; 29];
    if !hex_bytes(hex, &mut data) {
        return None;
    }
    Some(SbasMessage {
        week,
        tow,
        prn,
        data,
    })
}

/// Parses one EGNOS Message Service line:
/// `prn year month day hour minute second hex-message`
fn parse_ems_line(line: &str) -> Option<SbasMessage> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 8 {
        return None;
    }
    let prn: u8 = fields[0].parse().ok()?;
    let mut year: u16 = fields[1].parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    let month: u8 = fields[2].parse().ok()?;
    let day: u8 = fields[3].parse().ok()?;
    let hour: u8 = fields[4].parse().ok()?;
    let minute: u8 = fields[5].parse().ok()?;
    let seconds: f64 = fields[6].parse().ok()?;

    let utc = Time::from_epoch(year, month, day, hour, minute, seconds).ok()?;
    let (week, tow) = utc_to_gpst(utc).to_gps();
    let mut data = [0u8; 29];
    if !hex_bytes(fields[7], &mut data) {
        return None;
    }
    Some(SbasMessage {
        week,
        tow,
        prn,
        data,
    })
}

/// Parses a NovAtel `#RAWWAASFRAMEA` (OEM4) log line
fn parse_novatel_oem4_line(line: &str) -> Option<SbasMessage> {
    if !line.starts_with("#RAWWAASFRAMEA") {
        return None;
    }
    let (header, body) = line.split_once(';')?;
    let head_fields: Vec<&str> = header.split(',').collect();
    /* reception week and tow sit in the log header */
    let week: i64 = head_fields.get(5)?.trim().parse().ok()?;
    let tow: f64 = head_fields.get(6)?.trim().parse().ok()?;

    let body_fields: Vec<&str> = body.split(',').collect();
    let prn: u8 = body_fields.get(1)?.trim().parse().ok()?;
    let mut data = [0u8; 29];
    if !hex_bytes(body_fields.get(3)?, &mut data) {
        return None;
    }
    Some(SbasMessage {
        week,
        tow,
        prn,
        data,
    })
}

/// Parses a NovAtel `$FRMA` (OEM3) log line
fn parse_novatel_oem3_line(line: &str) -> Option<SbasMessage> {
    if !line.starts_with("$FRMA") {
        return None;
    }
    let fields: Vec<&str> = line.split(',').collect();
    let mut week: i64 = fields.get(1)?.trim().parse().ok()?;
    let tow: f64 = fields.get(2)?.trim().parse().ok()?;
    let prn: u8 = fields.get(3)?.trim().parse().ok()?;
    if week < 1024 {
        week += 1024;
    }
    let mut data = [0u8; 29];
    if !hex_bytes(fields.get(6)?, &mut data) {
        return None;
    }
    Some(SbasMessage {
        week,
        tow,
        prn,
        data,
    })
}

/// Reads an SBAS message log into a time-ordered queue
///
/// `.sbs`, `.ems` and NovAtel ASCII logs (`#RAWWAASFRAMEA`, `$FRMA`)
/// are recognized line by line; unparseable lines are skipped.
pub fn read_sbas_log<P: AsRef<Path>>(path: P) -> Result<Vec<SbasMessage>, SbasLogError> {
    let is_ems = path
        .as_ref()
        .extension()
        .map_or(false, |e| e.eq_ignore_ascii_case("ems"));
    let file = File::open(path)?;
    let mut messages = Vec::new();

    for line in BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed = if line.starts_with("#RAWWAASFRAMEA") {
            parse_novatel_oem4_line(line)
        } else if line.starts_with("$FRMA") {
            parse_novatel_oem3_line(line)
        } else if is_ems {
            parse_ems_line(line)
        } else {
            parse_sbs_line(line)
        };
        if let Some(msg) = parsed {
            messages.push(msg);
        }
    }

    messages.sort_by(|a, b| {
        a.time()
            .partial_cmp(&b.time())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    log::info!("sbas log: {} messages", messages.len());
    Ok(messages)
}

/* IGP band geometry --------------------------------------------------- */

/// Latitude rows of the dense (5°) mask columns
const IGP_LATS_28A: [i16; 28] = [
    -75, -65, -55, -50, -45, -40, -35, -30, -25, -20, -15, -10, -5, 0, 5, 10, 15, 20, 25, 30,
    35, 40, 45, 50, 55, 65, 75, 85,
];
const IGP_LATS_23: [i16; 23] = [
    -55, -50, -45, -40, -35, -30, -25, -20, -15, -10, -5, 0, 5, 10, 15, 20, 25, 30, 35, 40, 45,
    50, 55,
];
const IGP_LATS_27: [i16; 27] = [
    -75, -65, -55, -50, -45, -40, -35, -30, -25, -20, -15, -10, -5, 0, 5, 10, 15, 20, 25, 30,
    35, 40, 45, 50, 55, 65, 75,
];
const IGP_LATS_28B: [i16; 28] = [
    -85, -75, -65, -55, -50, -45, -40, -35, -30, -25, -20, -15, -10, -5, 0, 5, 10, 15, 20, 25,
    30, 35, 40, 45, 50, 55, 65, 75,
];

/// A mask column of bands 0-8: longitude, first/last mask bit, latitudes
struct IgpColumn {
    lon: i16,
    first: u16,
    last: u16,
    lats: &'static [i16],
}

/// Returns (lat, lon) of a mask bit in bands 0-8
fn igp_band_column(band: usize, column: usize) -> Option<IgpColumn> {
    /* per-band starting longitude; columns step 5 degrees */
    let lon0: i16 = match band {
        0 => -180,
        1 => -140,
        2 => -100,
        3 => -60,
        4 => -20,
        5 => 20,
        6 => 60,
        7 => 100,
        8 => 140,
        _ => return None,
    };
    /* the 85N grid points sit on the -180/-90/0/90 meridians, the 85S
     * points on -140/-50/40/130; the remaining 10-degree meridians reach
     * ±75 and the odd 5-degree meridians stop at ±55 */
    let column_lats = |lon: i16| -> &'static [i16] {
        if lon % 90 == 0 {
            &IGP_LATS_28A
        } else if (lon + 140) % 90 == 0 {
            &IGP_LATS_28B
        } else if lon % 10 == 0 {
            &IGP_LATS_27
        } else {
            &IGP_LATS_23
        }
    };

    let lon = lon0 + (column as i16) * 5;
    let lats = column_lats(lon);

    let mut first = 1u16;
    for c in 0..column {
        first += column_lats(lon0 + (c as i16) * 5).len() as u16;
    }
    Some(IgpColumn {
        lon,
        first,
        last: first + lats.len() as u16 - 1,
        lats,
    })
}

/// Maps a band and mask bit to the grid point coordinates
fn igp_grid_position(band: usize, bit: u16) -> Option<(i16, i16)> {
    if band <= 8 {
        for column in 0..8 {
            if let Some(col) = igp_band_column(band, column) {
                if (col.first..=col.last).contains(&bit) {
                    let lat = col.lats[(bit - col.first) as usize];
                    return Some((lat, col.lon));
                }
            }
        }
        return None;
    }
    /* bands 9/10: rings of constant latitude towards the poles */
    let sign: i16 = if band == 9 { 1 } else { -1 };
    match bit {
        1..=72 => {
            let lon = -180 + ((bit - 1) as i16) * 5;
            Some((60 * sign, lon))
        }
        73..=108 => {
            let lon = -180 + ((bit - 73) as i16) * 10;
            Some((65 * sign, lon))
        }
        109..=144 => {
            let lon = -180 + ((bit - 109) as i16) * 10;
            Some((70 * sign, lon))
        }
        145..=180 => {
            let lon = -180 + ((bit - 145) as i16) * 10;
            Some((75 * sign, lon))
        }
        181..=192 => {
            let lon = if band == 9 {
                -180 + ((bit - 181) as i16) * 30
            } else {
                -170 + ((bit - 181) as i16) * 30
            };
            Some((85 * sign, lon))
        }
        _ => None,
    }
}
