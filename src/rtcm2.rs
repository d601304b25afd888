// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! RTCM 2 stream decoder
//!
//! RTCM 2 transports 30-bit words in a 6-of-8 byte form with the GPS
//! navigation-message parity algorithm. The two header words carry the
//! message type, station id, the modified z-count (0.6 s units within
//! the hour), a sequence number and the frame length. Supported types:
//!
//! | type | content |
//! |------|---------|
//! | 1, 9 | differential GPS pseudorange corrections |
//! | 3, 22 | reference station parameters |
//! | 14 | GPS week / hour / leap seconds |
//! | 16 | special text message |
//! | 17 | GPS broadcast ephemeris |
//! | 18, 19 | uncorrected carrier phase / pseudorange |
//!
//! Once a station message fixes the station id, frames carrying another
//! id are rejected.

use crate::bits::{get_bits, get_bitu};
use crate::consts::{P2_19, P2_29, P2_31, P2_33, P2_43, P2_5, P2_55, SC2RAD};
use crate::decoder::Event;
use crate::eph::{EphSet, Keplerian, NavData};
use crate::obs::{ObsData, ObsEpoch, LLI_SLIP, MAX_OBS};
use crate::signal::consts::MAX_SAT;
use crate::signal::{Code, Sat, System};
use crate::station::StationInfo;
use crate::time::{adj_gps_week, utc_to_gpst, Clock, SystemClock, Time};
use std::collections::HashMap;
use std::sync::Arc;

/// RTCM 2 word preamble
const PREAMBLE: u8 = 0x66;

/// Hamming parity masks of the GPS word algorithm
const HAMMING: [u32; 6] = [
    0xBB1F_3480,
    0x5D8F_9A40,
    0xAEC7_CD00,
    0x5763_E680,
    0x6BB1_F340,
    0x8B7A_89C0,
];

/// A differential GPS pseudorange correction
#[derive(Debug, Copy, Clone, Default)]
pub struct DgpsCorrection {
    /// Reference time of the correction
    pub t0: Time,
    /// Pseudorange correction (m)
    pub prc: f64,
    /// Range-rate correction (m/s)
    pub rrc: f64,
    /// Issue of data the correction refers to
    pub iod: i64,
    /// User differential range error class
    pub udre: u8,
}

/// RTCM 2 single-byte-feed decoder state
pub struct Rtcm2Decoder {
    clock: Arc<dyn Clock>,
    /// Navigation data accumulated from this stream
    pub nav: NavData,
    /// Station parameters of this stream
    pub station: StationInfo,
    /// Differential corrections by satellite index
    pub dgps: Vec<Option<DgpsCorrection>>,
    /// Latest special message (type 16)
    pub message: String,
    /// Time of the last decoded frame
    pub time: Time,
    obs: ObsEpoch,
    obs_complete: bool,
    word: u32,
    /* two header words plus up to 31 data words of 3 bytes */
    buf: [u8; 128],
    nbyte: usize,
    nbit: usize,
    frame_len: usize,
    seqno: u8,
    fixed_staid: Option<u16>,
    loss_cache: Vec<[u8; 2]>,
    /// Per-message-type tallies for observability
    pub msg_counts: HashMap<u16, u32>,
    /// Framing/parity error count
    pub error_count: u32,
}

impl Rtcm2Decoder {
    /// Makes a decoder driven by the wall clock
    #[must_use]
    pub fn new() -> Rtcm2Decoder {
        Rtcm2Decoder::with_clock(Arc::new(SystemClock::new()))
    }

    /// Makes a decoder with an injected clock
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Rtcm2Decoder {
        Rtcm2Decoder {
            clock,
            nav: NavData::new(),
            station: StationInfo::default(),
            dgps: vec![None; MAX_SAT as usize],
            message: String::new(),
            time: Time::default(),
            obs: ObsEpoch::new(),
            obs_complete: false,
            word: 0,
            buf: [0; 128],
            nbyte: 0,
            nbit: 0,
            frame_len: 0,
            seqno: 0,
            fixed_staid: None,
            loss_cache: vec![[0; 2]; MAX_SAT as usize],
            msg_counts: HashMap::new(),
            error_count: 0,
        }
    }

    /// Feeds one byte; returns what, if anything, completed
    ///
    /// Bytes whose upper two bits are not `01` are discarded, matching
    /// the 6-of-8 transport encoding.
    pub fn input(&mut self, mut byte: u8) -> Event {
        if byte & 0xC0 != 0x40 {
            return Event::None;
        }
        for _ in 0..6 {
            self.word = (self.word << 1) + u32::from(byte & 1);
            byte >>= 1;

            if self.nbyte == 0 {
                let mut preamble = (self.word >> 22) as u8;
                if self.word & 0x4000_0000 != 0 {
                    preamble ^= 0xFF;
                }
                if preamble != PREAMBLE {
                    continue;
                }
                if !self.decode_word(0) {
                    continue;
                }
                self.nbyte = 3;
                self.nbit = 0;
                continue;
            }
            self.nbit += 1;
            if self.nbit < 30 {
                continue;
            }
            self.nbit = 0;

            let at = self.nbyte;
            if !self.decode_word(at) {
                log::warn!("rtcm2 parity error: word={:08x}", self.word);
                self.error_count += 1;
                self.nbyte = 0;
                self.word &= 0x3;
                continue;
            }
            self.nbyte += 3;
            if self.nbyte == 6 {
                self.frame_len = (self.buf[5] >> 3) as usize * 3 + 6;
            }
            if self.nbyte < self.frame_len {
                continue;
            }
            self.nbyte = 0;
            self.word &= 0x3;
            return self.dispatch();
        }
        Event::None
    }

    /// GPS-word parity check; on success drops the 24 data bits into the
    /// frame buffer
    fn decode_word(&mut self, at: usize) -> bool {
        let mut word = self.word;
        if word & 0x4000_0000 != 0 {
            word ^= 0x3FFF_FFC0;
        }
        let mut parity = 0u32;
        for mask in HAMMING.iter() {
            parity <<= 1;
            let mut w = (word & mask) >> 6;
            while w != 0 {
                parity ^= w & 1;
                w >>= 1;
            }
        }
        if parity != word & 0x3F {
            return false;
        }
        for k in 0..3 {
            self.buf[at + k] = (word >> (22 - k * 8)) as u8;
        }
        true
    }

    fn reference_time(&self) -> Time {
        if self.time.sec() != 0 {
            self.time
        } else {
            utc_to_gpst(self.clock.now())
        }
    }

    /// Maps the intra-hour z-count onto the nearest absolute hour
    fn adjust_hour(&self, zcnt: f64) -> Time {
        let reference = self.reference_time();
        let (week, tow) = reference.to_gps();
        let hour = (tow / 3600.0).floor();
        let sec = tow - hour * 3600.0;
        let zcnt = if zcnt < sec - 1800.0 {
            zcnt + 3600.0
        } else if zcnt > sec + 1800.0 {
            zcnt - 3600.0
        } else {
            zcnt
        };
        Time::from_gps(week, hour * 3600.0 + zcnt)
    }

    fn dispatch(&mut self) -> Event {
        let buf_len = self.frame_len;
        let msg_type = get_bitu(&self.buf, 8, 6) as u16;
        *self.msg_counts.entry(msg_type).or_insert(0) += 1;

        let staid = get_bitu(&self.buf, 14, 10) as u16;
        let zcnt = get_bitu(&self.buf, 24, 13) as f64 * 0.6;
        if zcnt >= 3600.0 {
            log::warn!("rtcm2 invalid zcnt: {}", zcnt);
            self.error_count += 1;
            return Event::Error;
        }
        let seqno = get_bitu(&self.buf, 37, 3) as u8;
        let _health = get_bitu(&self.buf, 45, 3);

        if seqno.wrapping_sub(self.seqno) & 0x7 != 1 {
            log::debug!("rtcm2 message outage: seqno {} -> {}", self.seqno, seqno);
        }
        self.seqno = seqno;

        /* a station message fixes the station id for the stream */
        if let Some(fixed) = self.fixed_staid {
            if staid != fixed {
                log::warn!("rtcm2 station id mismatch: {} != {}", staid, fixed);
                self.error_count += 1;
                return Event::Error;
            }
        }

        self.time = self.adjust_hour(zcnt);

        match msg_type {
            1 | 9 => self.decode_diff_corrections(buf_len),
            3 => self.decode_ref_station(staid, buf_len),
            14 => self.decode_week_time(),
            16 => self.decode_special_message(buf_len),
            17 => self.decode_gps_eph(),
            18 => self.decode_raw_carrier(buf_len),
            19 => self.decode_raw_pseudorange(buf_len),
            22 => self.decode_ref_station_ext(staid, buf_len),
            _ => {
                log::debug!("rtcm2 {}: unhandled message", msg_type);
                Event::None
            }
        }
    }

    /// Types 1 and 9: differential pseudorange corrections
    fn decode_diff_corrections(&mut self, buf_len: usize) -> Event {
        let mut i = 48;
        let mut updated = false;
        while i + 40 <= buf_len * 8 {
            let fact = get_bitu(&self.buf, i, 1);
            i += 1;
            let udre = get_bitu(&self.buf, i, 2) as u8;
            i += 2;
            let mut prn = get_bitu(&self.buf, i, 5) as u8;
            i += 5;
            let prc = get_bits(&self.buf, i, 16);
            i += 16;
            let rrc = get_bits(&self.buf, i, 8);
            i += 8;
            let iod = get_bits(&self.buf, i, 8);
            i += 8;
            if prn == 0 {
                prn = 32;
            }
            /* the most negative field values flag an unusable satellite */
            if prc == -32_768 || rrc == -128 {
                log::warn!("rtcm2 invalid correction: prn={}", prn);
                continue;
            }
            let sat = match Sat::new(System::Gps, prn) {
                Ok(sat) => sat,
                Err(_) => continue,
            };
            /* the fact bit doubles the LSB scale range */
            let (prc_scale, rrc_scale) = if fact == 1 { (0.32, 0.032) } else { (0.02, 0.002) };
            self.dgps[sat.index()] = Some(DgpsCorrection {
                t0: self.time,
                prc: f64::from(prc) * prc_scale,
                rrc: f64::from(rrc) * rrc_scale,
                iod: i64::from(iod),
                udre,
            });
            updated = true;
        }
        if updated {
            Event::SsrCorrection
        } else {
            Event::None
        }
    }

    /// Type 3: reference station ECEF coordinates
    fn decode_ref_station(&mut self, staid: u16, buf_len: usize) -> Event {
        let i = 48;
        if i + 96 > buf_len * 8 {
            log::warn!("rtcm2 type 3: length error");
            self.error_count += 1;
            return Event::Error;
        }
        self.station.name = format!("{:04}", staid);
        self.station.del_type = crate::station::DEL_TYPE_XYZ;
        self.station.pos = [
            f64::from(get_bits(&self.buf, i, 32)) * 0.01,
            f64::from(get_bits(&self.buf, i + 32, 32)) * 0.01,
            f64::from(get_bits(&self.buf, i + 64, 32)) * 0.01,
        ];
        self.station.del = [0.0; 3];
        self.station.hgt = 0.0;
        self.fixed_staid = Some(staid);
        Event::StationParams
    }

    /// Type 22: extended reference station parameters
    fn decode_ref_station_ext(&mut self, staid: u16, buf_len: usize) -> Event {
        let mut i = 48;
        if i + 24 > buf_len * 8 {
            log::warn!("rtcm2 type 22: length error");
            self.error_count += 1;
            return Event::Error;
        }
        let mut del = [0.0; 3];
        for d in del.iter_mut() {
            *d = f64::from(get_bits(&self.buf, i, 8)) / 25_600.0;
            i += 8;
        }
        /* optional antenna height word */
        let hgt = if i + 18 <= buf_len * 8 {
            let h = get_bitu(&self.buf, i, 18) as f64 / 25_600.0;
            i += 18;
            h
        } else {
            0.0
        };
        let _ = i;

        self.station.name = format!("{:04}", staid);
        self.station.del_type = crate::station::DEL_TYPE_XYZ;
        self.station.del = del;
        self.station.hgt = hgt;
        self.fixed_staid = Some(staid);
        Event::StationParams
    }

    /// Type 14: GPS week, hour of week and leap seconds
    fn decode_week_time(&mut self) -> Event {
        let i = 48;
        let week = i64::from(get_bitu(&self.buf, i, 10));
        let hour = get_bitu(&self.buf, i + 10, 8) as f64;
        let leaps = get_bitu(&self.buf, i + 18, 6) as f64;

        let week = adj_gps_week(week, self.clock.now());
        let (_, tow) = self.time.to_gps();
        let sec_in_hour = tow % 3600.0;
        self.time = Time::from_gps(week, hour * 3600.0 + sec_in_hour);
        self.nav.ion_utc_gps.utc[4] = leaps;
        Event::IonUtcParams
    }

    /// Type 16: GPS special message (plain text, up to 90 characters)
    fn decode_special_message(&mut self, buf_len: usize) -> Event {
        let mut i = 48;
        let mut text = String::new();
        while i + 8 <= buf_len * 8 && text.len() < 90 {
            let c = get_bitu(&self.buf, i, 8);
            i += 8;
            if c == 0 {
                break;
            }
            if let Some(ch) = char::from_u32(c) {
                text.push(ch);
            }
        }
        log::info!("rtcm2 message: {}", text);
        self.message = text;
        Event::None
    }

    /// Type 17: full GPS broadcast ephemeris
    fn decode_gps_eph(&mut self) -> Event {
        let buf = &self.buf;
        let mut eph = Keplerian::default();
        let mut i = 48;

        let week = i64::from(get_bitu(buf, i, 10));
        i += 10;
        eph.idot = f64::from(get_bits(buf, i, 14)) * P2_43 * SC2RAD;
        i += 14;
        eph.iode = i64::from(get_bitu(buf, i, 8));
        i += 8;
        let toc = get_bitu(buf, i, 16) as f64 * 16.0;
        i += 16;
        eph.f1 = f64::from(get_bits(buf, i, 16)) * P2_43;
        i += 16;
        eph.f2 = f64::from(get_bits(buf, i, 8)) * P2_55;
        i += 8;
        eph.crs = f64::from(get_bits(buf, i, 16)) * P2_5;
        i += 16;
        eph.deln = f64::from(get_bits(buf, i, 16)) * P2_43 * SC2RAD;
        i += 16;
        eph.cuc = f64::from(get_bits(buf, i, 16)) * P2_29;
        i += 16;
        eph.e = get_bitu(buf, i, 32) as f64 * P2_33;
        i += 32;
        eph.cus = f64::from(get_bits(buf, i, 16)) * P2_29;
        i += 16;
        let sqrt_a = get_bitu(buf, i, 32) as f64 * P2_19;
        i += 32;
        eph.toes = get_bitu(buf, i, 16) as f64 * 16.0;
        i += 16;
        eph.omg0 = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
        i += 32;
        eph.cic = f64::from(get_bits(buf, i, 16)) * P2_29;
        i += 16;
        eph.i0 = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
        i += 32;
        eph.cis = f64::from(get_bits(buf, i, 16)) * P2_29;
        i += 16;
        eph.omg = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
        i += 32;
        eph.crc = f64::from(get_bits(buf, i, 16)) * P2_5;
        i += 16;
        eph.omgd = f64::from(get_bits(buf, i, 24)) * P2_43 * SC2RAD;
        i += 24;
        eph.m0 = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
        i += 32;
        eph.iodc = i64::from(get_bitu(buf, i, 10));
        i += 10;
        eph.f0 = f64::from(get_bits(buf, i, 22)) * P2_31;
        i += 22;
        let mut prn = get_bitu(buf, i, 5) as u8;
        i += 5 + 3;
        eph.tgd[0] = f64::from(get_bits(buf, i, 8)) * P2_31;
        i += 8;
        eph.code = get_bitu(buf, i, 2);
        i += 2;
        eph.sva = get_bitu(buf, i, 4) as u8;
        i += 4;
        eph.svh = get_bitu(buf, i, 6);
        i += 6;
        eph.flag = get_bitu(buf, i, 1);

        if prn == 0 {
            prn = 32;
        }
        let sat = match Sat::new(System::Gps, prn) {
            Ok(sat) => sat,
            Err(_) => {
                log::warn!("rtcm2 type 17: invalid prn {}", prn);
                return Event::Error;
            }
        };

        eph.week = adj_gps_week(week, self.clock.now());
        eph.a = sqrt_a * sqrt_a;
        eph.toe = Time::from_gps(eph.week, eph.toes);
        eph.toc = Time::from_gps(eph.week, toc);
        eph.ttr = self.time;
        eph.fit = 4.0;
        eph.sat = Some(sat);
        self.nav.set_eph(eph, EphSet::INav);
        Event::Ephemeris(sat, EphSet::INav)
    }

    fn obs_slot(&mut self, time: Time, sat: Sat) -> Option<usize> {
        if self.obs_complete
            || self
                .obs
                .records()
                .first()
                .map_or(false, |first| time.diff(&first.time).abs() > 1e-9)
        {
            self.obs.clear();
            self.obs_complete = false;
        }
        if let Some(idx) = self.obs.records().iter().position(|o| o.sat == sat) {
            return Some(idx);
        }
        if self.obs.len() >= MAX_OBS || !self.obs.push(ObsData::new(time, sat, 1)) {
            return None;
        }
        Some(self.obs.len() - 1)
    }

    /// Common header of types 18/19: frequency field and microsecond tag
    ///
    /// Bit 0 of the frequency field is reserved and must be zero; bit 1
    /// selects L2.
    fn raw_obs_header(&mut self, buf_len: usize) -> Option<(usize, f64, usize)> {
        let mut i = 48;
        if i + 24 > buf_len * 8 {
            return None;
        }
        let freq_field = get_bitu(&self.buf, i, 2);
        i += 2 + 2;
        let usec = get_bitu(&self.buf, i, 20) as f64;
        i += 20;
        if freq_field & 1 != 0 {
            log::warn!("rtcm2 raw obs: unsupported frequency field {}", freq_field);
            return None;
        }
        Some(((freq_field >> 1) as usize, usec, i))
    }

    /// Type 18: uncorrected carrier phase
    fn decode_raw_carrier(&mut self, buf_len: usize) -> Event {
        let (freq, usec, mut i) = match self.raw_obs_header(buf_len) {
            Some(parsed) => parsed,
            None => return Event::Error,
        };
        let mut sync = true;
        while i + 48 <= buf_len * 8 {
            sync = get_bitu(&self.buf, i, 1) == 1;
            i += 1;
            let code = get_bitu(&self.buf, i, 1);
            i += 1;
            let is_glo = get_bitu(&self.buf, i, 1) == 1;
            i += 1;
            let mut prn = get_bitu(&self.buf, i, 5) as u8;
            i += 5 + 3;
            let loss = get_bitu(&self.buf, i, 5) as u8;
            i += 5;
            let cp = get_bits(&self.buf, i, 32);
            i += 32;

            if prn == 0 {
                prn = 32;
            }
            let sys = if is_glo { System::Glo } else { System::Gps };
            let sat = match Sat::new(sys, prn) {
                Ok(sat) => sat,
                Err(_) => {
                    log::warn!("rtcm2 type 18: invalid prn {}", prn);
                    continue;
                }
            };
            let mut time = self.time.add_seconds(usec * 1e-6);
            if is_glo {
                /* glonass measurement time is utc */
                time = utc_to_gpst(time);
            }
            let slot = match self.obs_slot(time, sat) {
                Some(slot) => slot,
                None => continue,
            };
            let slipped = self.loss_cache[sat.index()][freq] != loss;
            self.loss_cache[sat.index()][freq] = loss;

            let obs = &mut self.obs.records_mut()[slot];
            obs.carrier[freq] = -f64::from(cp) / 256.0;
            obs.lli[freq] = if slipped { LLI_SLIP } else { 0 };
            obs.code[freq] = if freq == 0 {
                if code == 1 {
                    Code::L1P
                } else {
                    Code::L1C
                }
            } else if code == 1 {
                Code::L2P
            } else {
                Code::L2C
            };
        }
        self.finish_obs(sync)
    }

    /// Type 19: uncorrected pseudorange
    fn decode_raw_pseudorange(&mut self, buf_len: usize) -> Event {
        let (freq, usec, mut i) = match self.raw_obs_header(buf_len) {
            Some(parsed) => parsed,
            None => return Event::Error,
        };
        let mut sync = true;
        while i + 48 <= buf_len * 8 {
            sync = get_bitu(&self.buf, i, 1) == 1;
            i += 1;
            let code = get_bitu(&self.buf, i, 1);
            i += 1;
            let is_glo = get_bitu(&self.buf, i, 1) == 1;
            i += 1;
            let mut prn = get_bitu(&self.buf, i, 5) as u8;
            i += 5 + 3;
            i += 5; /* data quality */
            let pr = get_bitu(&self.buf, i, 32);
            i += 32;

            if prn == 0 {
                prn = 32;
            }
            let sys = if is_glo { System::Glo } else { System::Gps };
            let sat = match Sat::new(sys, prn) {
                Ok(sat) => sat,
                Err(_) => {
                    log::warn!("rtcm2 type 19: invalid prn {}", prn);
                    continue;
                }
            };
            let mut time = self.time.add_seconds(usec * 1e-6);
            if is_glo {
                time = utc_to_gpst(time);
            }
            let slot = match self.obs_slot(time, sat) {
                Some(slot) => slot,
                None => continue,
            };
            let obs = &mut self.obs.records_mut()[slot];
            obs.pseudorange[freq] = pr as f64 * 0.02;
            obs.code[freq] = if freq == 0 {
                if code == 1 {
                    Code::L1P
                } else {
                    Code::L1C
                }
            } else if code == 1 {
                Code::L2P
            } else {
                Code::L2C
            };
        }
        self.finish_obs(sync)
    }

    fn finish_obs(&mut self, sync: bool) -> Event {
        if sync {
            return Event::None;
        }
        self.obs_complete = true;
        let mut epoch = self.obs.clone();
        epoch.sort_and_dedup();
        Event::Observations(epoch)
    }
}

impl Default for Rtcm2Decoder {
    fn default() -> Self {
        Rtcm2Decoder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::set_bitu;
    use crate::time::FixedClock;
    use float_eq::assert_float_eq;

    fn decoder() -> Rtcm2Decoder {
        let t = Time::from_epoch(2021, 6, 1, 0, 30, 0.0).unwrap();
        Rtcm2Decoder::with_clock(Arc::new(FixedClock(t)))
    }

    /// Computes the 6 parity bits over a register holding the previous
    /// word's trailing bits and the plain (uncomplemented) data
    fn parity_of(w: u32) -> u32 {
        let mut parity = 0u32;
        for mask in HAMMING.iter() {
            parity <<= 1;
            let mut bits = (w & mask) >> 6;
            while bits != 0 {
                parity ^= bits & 1;
                bits >>= 1;
            }
        }
        parity
    }

    /// Packs 24-bit data groups into parity-carrying words and then into
    /// the 6-of-8 byte transport form
    ///
    /// The parity chain starts from a zeroed register, so when feeding a
    /// decoder that already consumed data, prepend [`pad`] to flush the
    /// carried word bits.
    fn encode_frame(data: &[u8]) -> Vec<u8> {
        assert!(data.len() % 3 == 0);
        let mut out = Vec::new();
        let mut prev = 0u32; /* D29*/
        /* D30* of the previous word */
        for group in data.chunks(3) {
            let d = (u32::from(group[0]) << 16) | (u32::from(group[1]) << 8) | u32::from(group[2]);
            /* parity spans the previous word's trailing bits and the
             * plain data */
            let plain = (prev << 30) | (d << 6);
            let parity = parity_of(plain);
            /* transmitted data bits are complemented when D30* is set */
            let data_tx = if prev & 1 == 1 { (!d) & 0x00FF_FFFF } else { d };
            let word = (data_tx << 6) | parity;

            /* bytes in the 6-of-8 form, LSB-first within each byte */
            let mut bits = [0u8; 30];
            for (k, bit) in bits.iter_mut().enumerate() {
                *bit = ((word >> (29 - k)) & 1) as u8;
            }
            for chunk in bits.chunks(6) {
                let mut byte = 0u8;
                for (k, bit) in chunk.iter().enumerate() {
                    byte |= bit << k;
                }
                out.push(0x40 | byte);
            }
            prev = word & 0x3;
        }
        out
    }

    /// One transport byte of zero bits: flushes the decoder's parity
    /// chain so an independently encoded frame can follow
    fn pad() -> [u8; 1] {
        [0x40]
    }

    /// Builds the 6-byte frame header: type, station id, z-count, seqno,
    /// word count, health
    fn frame_header(msg_type: u32, staid: u32, zcnt_06: u32, seqno: u32, nword: u32) -> [u8; 6] {
        let mut buf = [0u8; 6];
        set_bitu(&mut buf, 0, 8, 0x66);
        set_bitu(&mut buf, 8, 6, msg_type);
        set_bitu(&mut buf, 14, 10, staid);
        set_bitu(&mut buf, 24, 13, zcnt_06);
        set_bitu(&mut buf, 37, 3, seqno);
        set_bitu(&mut buf, 40, 5, nword);
        set_bitu(&mut buf, 45, 3, 0);
        buf
    }

    fn feed(dec: &mut Rtcm2Decoder, stream: &[u8]) -> Vec<Event> {
        stream
            .iter()
            .map(|b| dec.input(*b))
            .filter(|e| !matches!(e, Event::None))
            .collect()
    }

    #[test]
    fn type1_differential_corrections() {
        /* one correction record: fact=0, udre=1, prn=7,
         * prc=+500 (10 m), rrc=+50 (0.1 m/s), iod=23 */
        let mut body = [0u8; 6];
        let mut i = 0;
        set_bitu(&mut body, i, 1, 0);
        i += 1;
        set_bitu(&mut body, i, 2, 1);
        i += 2;
        set_bitu(&mut body, i, 5, 7);
        i += 5;
        crate::bits::set_bits(&mut body, i, 16, 500);
        i += 16;
        crate::bits::set_bits(&mut body, i, 8, 50);
        i += 8;
        crate::bits::set_bits(&mut body, i, 8, 23);
        i += 8;
        let _ = i;

        let mut frame = Vec::new();
        /* z-count of 1800 s = 3000 counts */
        frame.extend_from_slice(&frame_header(1, 10, 3000, 1, 2));
        frame.extend_from_slice(&body);
        let stream = encode_frame(&frame);

        let mut dec = decoder();
        let events = feed(&mut dec, &stream);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::SsrCorrection));

        let sat = Sat::new(System::Gps, 7).unwrap();
        let corr = dec.dgps[sat.index()].unwrap();
        assert_float_eq!(corr.prc, 10.0, abs <= 1e-9);
        assert_float_eq!(corr.rrc, 0.1, abs <= 1e-9);
        assert_eq!(corr.iod, 23);
        assert_eq!(corr.udre, 1);
        /* z-count mapped into the clock hour */
        let (_, tow) = corr.t0.to_gps();
        assert_float_eq!(tow % 3600.0, 1800.0, abs <= 1e-6);
    }

    #[test]
    fn type1_sentinel_drops_satellite() {
        let mut body = [0u8; 6];
        let mut i = 0;
        set_bitu(&mut body, i, 1, 0);
        i += 1;
        set_bitu(&mut body, i, 2, 0);
        i += 2;
        set_bitu(&mut body, i, 5, 9);
        i += 5;
        crate::bits::set_bits(&mut body, i, 16, -32_768); /* sentinel */
        i += 16;
        crate::bits::set_bits(&mut body, i, 8, 0);
        i += 8;
        crate::bits::set_bits(&mut body, i, 8, 0);
        i += 8;
        let _ = i;

        let mut frame = Vec::new();
        frame.extend_from_slice(&frame_header(1, 10, 3000, 1, 2));
        frame.extend_from_slice(&body);
        let stream = encode_frame(&frame);

        let mut dec = decoder();
        let events = feed(&mut dec, &stream);
        /* nothing stored, no correction event */
        assert!(events.is_empty());
        let sat = Sat::new(System::Gps, 9).unwrap();
        assert!(dec.dgps[sat.index()].is_none());
    }

    #[test]
    fn type3_station_and_id_consistency() {
        let mut body = [0u8; 12];
        crate::bits::set_bits(&mut body, 0, 32, 100_000_000); /* x = 1e6 m */
        crate::bits::set_bits(&mut body, 32, 32, -200_000_000);
        crate::bits::set_bits(&mut body, 64, 32, 300_000_000);

        let mut frame = Vec::new();
        frame.extend_from_slice(&frame_header(3, 99, 3000, 1, 4));
        frame.extend_from_slice(&body);
        let stream = encode_frame(&frame);

        let mut dec = decoder();
        let events = feed(&mut dec, &stream);
        assert!(matches!(events[0], Event::StationParams));
        assert_eq!(dec.station.name, "0099");
        assert_float_eq!(dec.station.pos[0], 1e6, abs <= 1e-6);
        assert_float_eq!(dec.station.pos[1], -2e6, abs <= 1e-6);

        /* a frame with another station id is now rejected */
        let mut frame = Vec::new();
        frame.extend_from_slice(&frame_header(1, 44, 3001, 2, 2));
        frame.extend_from_slice(&[0u8; 6]);
        let mut stream = Vec::new();
        stream.extend_from_slice(&pad());
        stream.extend_from_slice(&encode_frame(&frame));
        let events = feed(&mut dec, &stream);
        assert!(matches!(events[0], Event::Error));
        assert!(dec.error_count > 0);
    }

    #[test]
    fn type14_week_and_leaps() {
        /* week 2160 broadcast as 112, hour-of-week 5, 18 leap seconds */
        let mut body = [0u8; 3];
        set_bitu(&mut body, 0, 10, 2160 % 1024);
        set_bitu(&mut body, 10, 8, 5);
        set_bitu(&mut body, 18, 6, 18);

        let mut frame = Vec::new();
        frame.extend_from_slice(&frame_header(14, 10, 3000, 1, 1));
        frame.extend_from_slice(&body);
        let stream = encode_frame(&frame);

        let mut dec = decoder();
        let events = feed(&mut dec, &stream);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::IonUtcParams));
        assert_eq!(dec.nav.ion_utc_gps.utc[4], 18.0);

        /* the stream clock moved onto the broadcast hour, keeping the
         * z-count second within it */
        let (week, tow) = dec.time.to_gps();
        assert_eq!(week, 2160);
        assert_float_eq!(tow, 5.0 * 3600.0 + 1800.0, abs <= 1e-6);
    }

    #[test]
    fn type16_special_message() {
        let text = b"RTCM TEST MESSAGE";
        let mut body = vec![0u8; 18]; /* padded to whole words */
        body[..text.len()].copy_from_slice(text);

        let mut frame = Vec::new();
        frame.extend_from_slice(&frame_header(16, 10, 3000, 1, 6));
        frame.extend_from_slice(&body);
        let stream = encode_frame(&frame);

        let mut dec = decoder();
        let events = feed(&mut dec, &stream);
        /* the text lands in the decoder state without an event */
        assert!(events.is_empty());
        assert_eq!(dec.message, "RTCM TEST MESSAGE");
        assert_eq!(dec.msg_counts.get(&16), Some(&1));
    }

    #[test]
    fn type17_gps_ephemeris_roundtrip() {
        let mut body = [0u8; 60];
        let mut i = 0;
        set_bitu(&mut body, i, 10, 2160 % 1024); /* week */
        i += 10;
        crate::bits::set_bits(&mut body, i, 14, -10); /* idot */
        i += 14;
        set_bitu(&mut body, i, 8, 44); /* iode */
        i += 8;
        set_bitu(&mut body, i, 16, 345_600 / 16); /* toc */
        i += 16;
        crate::bits::set_bits(&mut body, i, 16, -100); /* f1 */
        i += 16;
        crate::bits::set_bits(&mut body, i, 8, 0); /* f2 */
        i += 8;
        crate::bits::set_bits(&mut body, i, 16, 100); /* crs */
        i += 16;
        crate::bits::set_bits(&mut body, i, 16, 1000); /* deln */
        i += 16;
        crate::bits::set_bits(&mut body, i, 16, -50); /* cuc */
        i += 16;
        set_bitu(&mut body, i, 32, 85_000_000); /* e */
        i += 32;
        crate::bits::set_bits(&mut body, i, 16, 60); /* cus */
        i += 16;
        set_bitu(&mut body, i, 32, 2_702_930_000); /* sqrtA */
        i += 32;
        set_bitu(&mut body, i, 16, 345_600 / 16); /* toe */
        i += 16;
        crate::bits::set_bits(&mut body, i, 32, -300_000_000); /* omg0 */
        i += 32;
        crate::bits::set_bits(&mut body, i, 16, 10); /* cic */
        i += 16;
        crate::bits::set_bits(&mut body, i, 32, 660_000_000); /* i0 */
        i += 32;
        crate::bits::set_bits(&mut body, i, 16, -12); /* cis */
        i += 16;
        crate::bits::set_bits(&mut body, i, 32, 100_000_000); /* omg */
        i += 32;
        crate::bits::set_bits(&mut body, i, 16, 4000); /* crc */
        i += 16;
        crate::bits::set_bits(&mut body, i, 24, -1500); /* omgd */
        i += 24;
        crate::bits::set_bits(&mut body, i, 32, 500_000_000); /* m0 */
        i += 32;
        set_bitu(&mut body, i, 10, 44); /* iodc */
        i += 10;
        crate::bits::set_bits(&mut body, i, 22, 20_000); /* f0 */
        i += 22;
        set_bitu(&mut body, i, 5, 9); /* prn */
        i += 5 + 3;
        crate::bits::set_bits(&mut body, i, 8, 5); /* tgd */
        i += 8;
        set_bitu(&mut body, i, 2, 1); /* code on L2 */
        i += 2;
        set_bitu(&mut body, i, 4, 0); /* sva */
        i += 4;
        set_bitu(&mut body, i, 6, 0); /* svh */
        i += 6;
        set_bitu(&mut body, i, 1, 0); /* flag */
        i += 1;
        let _ = i;

        let mut frame = Vec::new();
        frame.extend_from_slice(&frame_header(17, 10, 3000, 1, 20));
        frame.extend_from_slice(&body);
        let stream = encode_frame(&frame);

        let mut dec = decoder();
        let events = feed(&mut dec, &stream);
        assert_eq!(events.len(), 1);
        let sat = Sat::new(System::Gps, 9).unwrap();
        assert!(matches!(events[0], Event::Ephemeris(s, EphSet::INav) if s == sat));

        let eph = dec.nav.eph(sat, EphSet::INav).unwrap();
        assert_eq!(eph.iode, 44);
        assert_eq!(eph.iodc, 44);
        assert_eq!(eph.week, 2160);
        assert_eq!(eph.code, 1);
        assert_float_eq!(eph.e, 85_000_000.0 * P2_33, abs <= 1e-15);
        let sqrt_a = 2_702_930_000.0 * P2_19;
        assert_float_eq!(eph.a, sqrt_a * sqrt_a, abs <= 1e-3);
        assert_float_eq!(eph.f0, 20_000.0 * P2_31, abs <= 1e-15);
        let (_, toes) = eph.toe.to_gps();
        assert_float_eq!(toes, 345_600.0, abs <= 1e-9);
        let (_, toc) = eph.toc.to_gps();
        assert_float_eq!(toc, 345_600.0, abs <= 1e-9);
    }

    /// Builds the MT 18/19 body: frequency field, microsecond tag and
    /// one satellite record (`value` is the carrier or pseudorange word)
    fn raw_obs_body(
        freq_field: u32,
        usec: u32,
        code: u32,
        is_glo: bool,
        prn: u32,
        quality: u32,
        value: i64,
    ) -> [u8; 9] {
        let mut body = [0u8; 9];
        let mut i = 0;
        set_bitu(&mut body, i, 2, freq_field);
        i += 2 + 2;
        set_bitu(&mut body, i, 20, usec);
        i += 20;
        set_bitu(&mut body, i, 1, 0); /* sync=0: epoch completes */
        i += 1;
        set_bitu(&mut body, i, 1, code);
        i += 1;
        set_bitu(&mut body, i, 1, if is_glo { 1 } else { 0 });
        i += 1;
        set_bitu(&mut body, i, 5, prn);
        i += 5 + 3;
        set_bitu(&mut body, i, 5, quality);
        i += 5;
        crate::bits::set_bits(&mut body, i, 32, value as i32);
        i += 32;
        let _ = i;
        body
    }

    #[test]
    fn type18_carrier_gps_and_glo_branches() {
        let mut dec = decoder();

        /* frequency field 0 = L1, C/A code, GPS PRN 9 */
        let mut frame = Vec::new();
        frame.extend_from_slice(&frame_header(18, 10, 3000, 1, 3));
        frame.extend_from_slice(&raw_obs_body(0, 500, 0, false, 9, 3, -256_000));
        let events = feed(&mut dec, &encode_frame(&frame));
        assert_eq!(events.len(), 1);
        let g_time;
        match &events[0] {
            Event::Observations(epoch) => {
                assert_eq!(epoch.len(), 1);
                let obs = &epoch.records()[0];
                assert_eq!(obs.sat, Sat::new(System::Gps, 9).unwrap());
                /* carrier = -cp/256 cycles on the L1 slot */
                assert_float_eq!(obs.carrier[0], 1000.0, abs <= 1e-9);
                assert_eq!(obs.code[0], Code::L1C);
                /* first sight of the loss counter flags a slip */
                assert_eq!(obs.lli[0], LLI_SLIP);
                g_time = obs.time;
            }
            other => panic!("expected observations, got {:?}", other),
        }

        /* frequency field 2 = L2 (bit 1), P code, GLONASS PRN 5 */
        let mut frame = Vec::new();
        frame.extend_from_slice(&frame_header(18, 10, 3000, 2, 3));
        frame.extend_from_slice(&raw_obs_body(2, 500, 1, true, 5, 3, 512_000));
        let mut stream = Vec::new();
        stream.extend_from_slice(&pad());
        stream.extend_from_slice(&encode_frame(&frame));
        let events = feed(&mut dec, &stream);
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::Observations(epoch) => {
                assert_eq!(epoch.len(), 1);
                let obs = &epoch.records()[0];
                assert_eq!(obs.sat, Sat::new(System::Glo, 5).unwrap());
                /* bit 1 of the frequency field selected the L2 slot */
                assert_float_eq!(obs.carrier[1], -2000.0, abs <= 1e-9);
                assert_eq!(obs.code[1], Code::L2P);
                assert_eq!(obs.carrier[0], 0.0);
                /* glonass measurement time is utc; the tag moved onto
                 * gpst by the leap seconds */
                assert_float_eq!(obs.time.diff(&g_time), 18.0, abs <= 1e-6);
            }
            other => panic!("expected observations, got {:?}", other),
        }
    }

    #[test]
    fn type18_reserved_frequency_bit_rejected() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&frame_header(18, 10, 3000, 1, 3));
        frame.extend_from_slice(&raw_obs_body(1, 0, 0, false, 9, 0, 0));

        let mut dec = decoder();
        let events = feed(&mut dec, &encode_frame(&frame));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::Error));
    }

    #[test]
    fn type19_pseudorange_gps_and_glo_branches() {
        let mut dec = decoder();

        /* L1 C/A pseudorange, GPS PRN 3: 1_050_000_000 * 0.02 = 21e6 m */
        let mut frame = Vec::new();
        frame.extend_from_slice(&frame_header(19, 10, 3000, 1, 3));
        frame.extend_from_slice(&raw_obs_body(0, 500, 0, false, 3, 0, 1_050_000_000));
        let events = feed(&mut dec, &encode_frame(&frame));
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::Observations(epoch) => {
                let obs = &epoch.records()[0];
                assert_eq!(obs.sat, Sat::new(System::Gps, 3).unwrap());
                assert_float_eq!(obs.pseudorange[0], 21_000_000.0, abs <= 1e-6);
                assert_eq!(obs.code[0], Code::L1C);
            }
            other => panic!("expected observations, got {:?}", other),
        }

        /* L2 P pseudorange, GLONASS PRN 11 */
        let mut frame = Vec::new();
        frame.extend_from_slice(&frame_header(19, 10, 3000, 2, 3));
        frame.extend_from_slice(&raw_obs_body(2, 500, 1, true, 11, 0, 1_000_000_000));
        let mut stream = Vec::new();
        stream.extend_from_slice(&pad());
        stream.extend_from_slice(&encode_frame(&frame));
        let events = feed(&mut dec, &stream);
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::Observations(epoch) => {
                let obs = &epoch.records()[0];
                assert_eq!(obs.sat, Sat::new(System::Glo, 11).unwrap());
                assert_float_eq!(obs.pseudorange[1], 20_000_000.0, abs <= 1e-6);
                assert_eq!(obs.code[1], Code::L2P);
                assert_eq!(obs.pseudorange[0], 0.0);
            }
            other => panic!("expected observations, got {:?}", other),
        }
    }

    #[test]
    fn type22_extended_station_parameters() {
        let mut body = [0u8; 6];
        let mut i = 0;
        crate::bits::set_bits(&mut body, i, 8, 64); /* east 0.0025 m */
        i += 8;
        crate::bits::set_bits(&mut body, i, 8, -128); /* north -0.005 m */
        i += 8;
        crate::bits::set_bits(&mut body, i, 8, 0);
        i += 8;
        set_bitu(&mut body, i, 18, 25_600); /* height 1.0 m */
        i += 18;
        let _ = i;

        let mut frame = Vec::new();
        frame.extend_from_slice(&frame_header(22, 77, 3000, 1, 2));
        frame.extend_from_slice(&body);
        let stream = encode_frame(&frame);

        let mut dec = decoder();
        let events = feed(&mut dec, &stream);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::StationParams));
        assert_eq!(dec.station.name, "0077");
        assert_eq!(dec.station.del_type, crate::station::DEL_TYPE_XYZ);
        assert_float_eq!(dec.station.del[0], 64.0 / 25_600.0, abs <= 1e-12);
        assert_float_eq!(dec.station.del[1], -128.0 / 25_600.0, abs <= 1e-12);
        assert_float_eq!(dec.station.del[2], 0.0, abs <= 1e-12);
        assert_float_eq!(dec.station.hgt, 1.0, abs <= 1e-9);
    }

    #[test]
    fn parity_failure_recovery() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&frame_header(16, 5, 3000, 1, 1));
        frame.extend_from_slice(b"HI!");
        let mut stream = encode_frame(&frame);
        /* corrupt a transport byte in the body */
        let len = stream.len();
        stream[len - 2] ^= 0x15;

        let mut dec = decoder();
        let _ = feed(&mut dec, &stream);
        assert!(dec.message.is_empty());
        assert!(dec.error_count > 0);

        /* clean retransmission decodes after the chain is flushed */
        let mut stream = Vec::new();
        stream.extend_from_slice(&pad());
        stream.extend_from_slice(&encode_frame(&frame));
        let _ = feed(&mut dec, &stream);
        assert_eq!(dec.message, "HI!");
    }
}
