// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! RTCM 3 stream decoder
//!
//! Frame: `0xD3`, 6 reserved bits, a 10-bit payload length, the payload
//! and a CRC-24Q over everything before it. The 12 leading payload bits
//! carry the message number. Supported message groups:
//!
//! - 1002/1004, 1010/1012 legacy GPS/GLONASS observations
//! - 1005/1006/1007/1008/1033 station and antenna descriptors
//! - 1019/1020/1041/1042/1044/1045/1046 (and tentative 63) broadcast
//!   ephemerides, in [`eph`]
//! - MSM 4/5/6/7 of every constellation, in [`msm`]
//! - SSR orbit/clock/bias corrections incl. IGS 4076, in [`ssr`]
//!
//! Observation epochs accumulate across messages until one arrives with
//! the sync flag cleared or the epoch time moves; completed epochs are
//! handed out by value.

mod eph;
mod msm;
mod ssr;

use crate::bits::{get_bits38, get_bitu};
use crate::decoder::Event;
use crate::edc::compute_crc24q;
use crate::eph::NavData;
use crate::obs::{ObsData, ObsEpoch, LLI_SLIP};
use crate::signal::consts::NUM_OBS_SLOTS;
use crate::signal::{Code, CodePriorities, Sat, System};
use crate::station::StationInfo;
use crate::time::{adjust_day, adjust_week, gpst_to_utc, utc_to_gpst, Clock, SystemClock, Time};
use std::collections::HashMap;
use std::sync::Arc;

/// Longest possible frame: header, 1023-byte payload, CRC
const FRAME_MAX: usize = 3 + 1023 + 3;

/// Pseudorange modulus of legacy GPS observation messages (m)
const PRUNIT_GPS: f64 = 299_792.458;
/// Pseudorange modulus of legacy GLONASS observation messages (m)
const PRUNIT_GLO: f64 = 599_584.916;

/// GPS L2 code indicator of legacy messages
const L2_CODES: [Code; 4] = [Code::L2C, Code::L2P, Code::L2W, Code::L2W];

/// RTCM 3 single-byte-feed decoder state
pub struct Rtcm3Decoder {
    clock: Arc<dyn Clock>,
    /// Decode options, e.g. `-EPHALL` or forced-code markers
    pub opt: String,
    pub(crate) priorities: CodePriorities,
    /// Navigation data accumulated from this stream
    pub nav: NavData,
    /// Station parameters of this stream
    pub station: StationInfo,
    /// Time of the last decoded message (GPST)
    pub time: Time,
    pub(crate) obs: ObsEpoch,
    pub(crate) obs_complete: bool,
    buf: Box<[u8; FRAME_MAX]>,
    nbyte: usize,
    frame_len: usize,
    /// Per-message-type tallies for observability
    pub msg_counts: HashMap<u16, u32>,
    /// Framing/CRC error count
    pub error_count: u32,
    pub(crate) carrier_cache: Vec<[f64; NUM_OBS_SLOTS]>,
    pub(crate) lock_cache: Vec<[u16; NUM_OBS_SLOTS]>,
}

impl Rtcm3Decoder {
    /// Makes a decoder driven by the wall clock
    #[must_use]
    pub fn new() -> Rtcm3Decoder {
        Rtcm3Decoder::with_clock(Arc::new(SystemClock::new()))
    }

    /// Makes a decoder with an injected clock (tests, replay)
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Rtcm3Decoder {
        Rtcm3Decoder {
            clock,
            opt: String::new(),
            priorities: CodePriorities::default(),
            nav: NavData::new(),
            station: StationInfo::default(),
            time: Time::default(),
            obs: ObsEpoch::new(),
            obs_complete: false,
            buf: Box::new([0; FRAME_MAX]),
            nbyte: 0,
            frame_len: 0,
            msg_counts: HashMap::new(),
            error_count: 0,
            carrier_cache: vec![
                [0.0; NUM_OBS_SLOTS];
                crate::signal::consts::MAX_SAT as usize
            ],
            lock_cache: vec![[0; NUM_OBS_SLOTS]; crate::signal::consts::MAX_SAT as usize],
        }
    }

    /// Feeds one byte; returns what, if anything, completed
    pub fn input(&mut self, byte: u8) -> Event {
        if self.nbyte == 0 {
            /* hunt for the preamble */
            if byte != 0xD3 {
                return Event::None;
            }
            self.buf[0] = byte;
            self.nbyte = 1;
            return Event::None;
        }
        self.buf[self.nbyte] = byte;
        self.nbyte += 1;

        if self.nbyte == 3 {
            self.frame_len = get_bitu(&self.buf[..], 14, 10) as usize + 3;
        }
        if self.nbyte < 3 || self.nbyte < self.frame_len + 3 {
            return Event::None;
        }
        self.nbyte = 0;

        /* checksum gate */
        let crc = compute_crc24q(&self.buf[..self.frame_len], 0);
        if crc != get_bitu(&self.buf[..], self.frame_len * 8, 24) {
            log::warn!("rtcm3 crc error, len={}", self.frame_len);
            self.error_count += 1;
            return Event::Error;
        }
        self.dispatch()
    }

    fn dispatch(&mut self) -> Event {
        let msg_type = get_bitu(&self.buf[..], 24, 12) as u16;
        *self.msg_counts.entry(msg_type).or_insert(0) += 1;

        let payload_bits = self.frame_len * 8;
        match msg_type {
            1001 | 1003 | 1009 | 1011 => {
                /* reduced-precision legacy observables carry no ambiguity
                 * field; nothing useful to emit */
                log::debug!("rtcm3 {}: not supported", msg_type);
                Event::None
            }
            1002 => self.decode_legacy_gps(payload_bits, false),
            1004 => self.decode_legacy_gps(payload_bits, true),
            1010 => self.decode_legacy_glo(payload_bits, false),
            1012 => self.decode_legacy_glo(payload_bits, true),
            1005 => self.decode_station_pos(false),
            1006 => self.decode_station_pos(true),
            1007 => self.decode_antenna_desc(false),
            1008 => self.decode_antenna_desc(true),
            1033 => self.decode_receiver_desc(),
            1019 => self.decode_eph_gps(System::Gps),
            1044 => self.decode_eph_gps(System::Qzs),
            1020 => self.decode_eph_glo(),
            1041 => self.decode_eph_irn(),
            1042 | 63 => self.decode_eph_bds(),
            1045 => self.decode_eph_gal(true),
            1046 => self.decode_eph_gal(false),
            1071..=1077 => self.decode_msm(System::Gps, msg_type - 1070),
            1081..=1087 => self.decode_msm(System::Glo, msg_type - 1080),
            1091..=1097 => self.decode_msm(System::Gal, msg_type - 1090),
            1101..=1107 => self.decode_msm(System::Sbs, msg_type - 1100),
            1111..=1117 => self.decode_msm(System::Qzs, msg_type - 1110),
            1121..=1127 => self.decode_msm(System::Bds, msg_type - 1120),
            1131..=1137 => self.decode_msm(System::Irn, msg_type - 1130),
            1057..=1062 => self.decode_ssr(System::Gps, (msg_type - 1056) as u8),
            1063..=1068 => self.decode_ssr(System::Glo, (msg_type - 1062) as u8),
            1240..=1245 => self.decode_ssr(System::Gal, (msg_type - 1239) as u8),
            1246..=1251 => self.decode_ssr(System::Qzs, (msg_type - 1245) as u8),
            1252..=1257 => self.decode_ssr(System::Sbs, (msg_type - 1251) as u8),
            1258..=1263 => self.decode_ssr(System::Bds, (msg_type - 1257) as u8),
            11..=16 => self.decode_ssr(System::Irn, (msg_type - 10) as u8),
            4076 => self.decode_igs_ssr(),
            _ => {
                log::debug!("rtcm3 {}: unhandled message", msg_type);
                Event::None
            }
        }
    }

    /// Current GPS time: last message time, falling back to the clock
    pub(crate) fn reference_time(&self) -> Time {
        if self.time.sec() != 0 {
            self.time
        } else {
            utc_to_gpst(self.clock.now())
        }
    }

    /// Current UTC from the injected clock
    pub(crate) fn clock_now(&self) -> Time {
        self.clock.now()
    }

    /// Resolves a GPS time of week against the stream time
    pub(crate) fn adjust_gps_tow(&mut self, tow: f64) -> Time {
        let t = adjust_week(self.reference_time(), tow);
        self.time = t;
        t
    }

    /// Resolves a GLONASS time of day (UTC+3h scale) against the stream
    /// time
    pub(crate) fn adjust_glo_tod(&mut self, tod: f64) -> Time {
        let glot = gpst_to_utc(self.reference_time()).add_seconds(10_800.0);
        let adjusted = adjust_day(glot, tod);
        let t = utc_to_gpst(adjusted.add_seconds(-10_800.0));
        self.time = t;
        t
    }

    /// Starts a record for a satellite in the working epoch, clearing the
    /// epoch first when it completed or its time moved
    pub(crate) fn obs_slot(&mut self, time: Time, sat: Sat) -> Option<usize> {
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
        if !self.obs.push(ObsData::new(time, sat, 1)) {
            return None;
        }
        Some(self.obs.len() - 1)
    }

    /// Finishes an observation message: emits the epoch when sync cleared
    pub(crate) fn finish_obs(&mut self, sync: bool) -> Event {
        if sync {
            return Event::None;
        }
        self.obs_complete = true;
        let mut epoch = self.obs.clone();
        epoch.sort_and_dedup();
        Event::Observations(epoch)
    }

    /// Carrier phase continuity: keeps the value within ±750 cycles of
    /// the cached one by shifting whole 1500-cycle wraps
    pub(crate) fn adjust_carrier(&mut self, sat: Sat, idx: usize, mut cp: f64) -> f64 {
        let cached = self.carrier_cache[sat.index()][idx];
        if cached != 0.0 {
            if cp < cached - 750.0 {
                cp += 1500.0;
            } else if cp > cached + 750.0 {
                cp -= 1500.0;
            }
        }
        self.carrier_cache[sat.index()][idx] = cp;
        cp
    }

    /// Lock indicator comparison: a decrease (or a fresh zero) flags a
    /// cycle slip
    pub(crate) fn loss_of_lock(&mut self, sat: Sat, idx: usize, lock: u16) -> bool {
        let cached = self.lock_cache[sat.index()][idx];
        let slip = (lock == 0 && cached == 0) || lock < cached;
        self.lock_cache[sat.index()][idx] = lock;
        slip
    }

    /// Quantizes a carrier-to-noise density for the observation record
    pub(crate) fn quantize_snr(cnr: f64) -> u16 {
        if cnr <= 0.0 {
            0
        } else {
            (cnr / crate::obs::SNR_UNIT + 0.5) as u16
        }
    }

    /* ---- legacy observations --------------------------------------- */

    fn decode_legacy_gps(&mut self, payload_bits: usize, has_l2: bool) -> Event {
        let buf = &self.buf[..];
        let mut i = 24 + 12;
        let staid = get_bitu(buf, i, 12);
        i += 12;
        let tow = get_bitu(buf, i, 30) as f64 * 0.001;
        i += 30;
        let sync = get_bitu(buf, i, 1) == 1;
        i += 1;
        let nsat = get_bitu(buf, i, 5) as usize;
        i += 5 + 3 + 3; /* smoothing indicator and interval */

        let _ = staid;
        let time = self.adjust_gps_tow(tow);
        let body_bits = if has_l2 { 125 } else { 74 };
        if i + nsat * body_bits > payload_bits {
            log::warn!("rtcm3 legacy gps: length error nsat={}", nsat);
            return Event::Error;
        }

        for _ in 0..nsat {
            let buf = &self.buf[..];
            let mut prn = get_bitu(buf, i, 6) as u8;
            i += 6;
            let code1 = get_bitu(buf, i, 1);
            i += 1;
            let pr1_raw = get_bitu(buf, i, 24);
            i += 24;
            let ppr1 = crate::bits::get_bits(buf, i, 20);
            i += 20;
            let lock1 = get_bitu(buf, i, 7);
            i += 7;
            let amb = get_bitu(buf, i, 8);
            i += 8;
            let cnr1 = get_bitu(buf, i, 8);
            i += 8;

            let mut l2 = None;
            if has_l2 {
                let code2 = get_bitu(buf, i, 2);
                i += 2;
                let pr21 = crate::bits::get_bits(buf, i, 14);
                i += 14;
                let ppr2 = crate::bits::get_bits(buf, i, 20);
                i += 20;
                let lock2 = get_bitu(buf, i, 7);
                i += 7;
                let cnr2 = get_bitu(buf, i, 8);
                i += 8;
                l2 = Some((code2, pr21, ppr2, lock2, cnr2));
            }

            let sys = if prn >= 40 {
                prn += 80;
                System::Sbs
            } else {
                System::Gps
            };
            let sat = match Sat::new(sys, prn) {
                Ok(sat) => sat,
                Err(_) => {
                    log::warn!("rtcm3 legacy: invalid prn {}", prn);
                    continue;
                }
            };
            let slot = match self.obs_slot(time, sat) {
                Some(slot) => slot,
                None => continue,
            };

            let pr1 = pr1_raw as f64 * 0.02 + amb as f64 * PRUNIT_GPS;
            let freq1 = Code::L1C.carrier_frequency(sys, 0).unwrap_or(0.0);
            let lli1 = self.loss_of_lock(sat, 0, lock1 as u16);
            let carrier1 = if ppr1 != -524_288 {
                Some(self.adjust_carrier(
                    sat,
                    0,
                    ppr1 as f64 * 0.0005 * freq1 / crate::consts::CLIGHT,
                ))
            } else {
                None
            };

            let obs = &mut self.obs.records_mut()[slot];
            obs.pseudorange[0] = pr1;
            if let Some(cp) = carrier1 {
                obs.carrier[0] = pr1 * freq1 / crate::consts::CLIGHT + cp;
            }
            obs.lli[0] = if lli1 { LLI_SLIP } else { 0 };
            obs.snr[0] = Self::quantize_snr(cnr1 as f64 * 0.25);
            obs.code[0] = if code1 == 1 { Code::L1P } else { Code::L1C };

            if let Some((code2, pr21, ppr2, lock2, cnr2)) = l2 {
                let freq2 = Code::L2W.carrier_frequency(sys, 0).unwrap_or(0.0);
                let lli2 = self.loss_of_lock(sat, 1, lock2 as u16);
                let carrier2 = if ppr2 != -524_288 {
                    Some(self.adjust_carrier(
                        sat,
                        1,
                        ppr2 as f64 * 0.0005 * freq2 / crate::consts::CLIGHT,
                    ))
                } else {
                    None
                };
                let obs = &mut self.obs.records_mut()[slot];
                /* L2-L1 pseudorange difference, sentinel when absent */
                if pr21 != -8192 {
                    obs.pseudorange[1] = pr1 + pr21 as f64 * 0.02;
                }
                if let Some(cp) = carrier2 {
                    obs.carrier[1] = pr1 * freq2 / crate::consts::CLIGHT + cp;
                }
                obs.lli[1] = if lli2 { LLI_SLIP } else { 0 };
                obs.snr[1] = Self::quantize_snr(cnr2 as f64 * 0.25);
                obs.code[1] = L2_CODES[code2 as usize];
            }
        }
        self.finish_obs(sync)
    }

    fn decode_legacy_glo(&mut self, payload_bits: usize, has_l2: bool) -> Event {
        let buf = &self.buf[..];
        let mut i = 24 + 12;
        let _staid = get_bitu(buf, i, 12);
        i += 12;
        let tod = get_bitu(buf, i, 27) as f64 * 0.001;
        i += 27;
        let sync = get_bitu(buf, i, 1) == 1;
        i += 1;
        let nsat = get_bitu(buf, i, 5) as usize;
        i += 5 + 3 + 3;

        let time = self.adjust_glo_tod(tod);
        let body_bits = if has_l2 { 130 } else { 79 };
        if i + nsat * body_bits > payload_bits {
            log::warn!("rtcm3 legacy glo: length error nsat={}", nsat);
            return Event::Error;
        }

        for _ in 0..nsat {
            let buf = &self.buf[..];
            let prn = get_bitu(buf, i, 6) as u8;
            i += 6;
            let code1 = get_bitu(buf, i, 1);
            i += 1;
            let fcn = get_bitu(buf, i, 5) as i8 - 7;
            i += 5;
            let pr1_raw = get_bitu(buf, i, 25);
            i += 25;
            let ppr1 = crate::bits::get_bits(buf, i, 20);
            i += 20;
            let lock1 = get_bitu(buf, i, 7);
            i += 7;
            let amb = get_bitu(buf, i, 7);
            i += 7;
            let cnr1 = get_bitu(buf, i, 8);
            i += 8;

            let mut l2 = None;
            if has_l2 {
                let code2 = get_bitu(buf, i, 2);
                i += 2;
                let pr21 = crate::bits::get_bits(buf, i, 14);
                i += 14;
                let ppr2 = crate::bits::get_bits(buf, i, 20);
                i += 20;
                let lock2 = get_bitu(buf, i, 7);
                i += 7;
                let cnr2 = get_bitu(buf, i, 8);
                i += 8;
                l2 = Some((code2, pr21, ppr2, lock2, cnr2));
            }

            let sat = match Sat::new(System::Glo, prn) {
                Ok(sat) => sat,
                Err(_) => {
                    log::warn!("rtcm3 legacy glo: invalid prn {}", prn);
                    continue;
                }
            };
            self.nav.set_glo_frequency_channel(sat, fcn);
            let slot = match self.obs_slot(time, sat) {
                Some(slot) => slot,
                None => continue,
            };

            let pr1 = pr1_raw as f64 * 0.02 + amb as f64 * PRUNIT_GLO;
            let freq1 = Code::L1C
                .carrier_frequency(System::Glo, fcn)
                .unwrap_or(0.0);
            let lli1 = self.loss_of_lock(sat, 0, lock1 as u16);
            let carrier1 = if ppr1 != -524_288 {
                Some(self.adjust_carrier(
                    sat,
                    0,
                    ppr1 as f64 * 0.0005 * freq1 / crate::consts::CLIGHT,
                ))
            } else {
                None
            };

            let obs = &mut self.obs.records_mut()[slot];
            obs.pseudorange[0] = pr1;
            if let Some(cp) = carrier1 {
                obs.carrier[0] = pr1 * freq1 / crate::consts::CLIGHT + cp;
            }
            obs.lli[0] = if lli1 { LLI_SLIP } else { 0 };
            obs.snr[0] = Self::quantize_snr(cnr1 as f64 * 0.25);
            obs.code[0] = if code1 == 1 { Code::L1P } else { Code::L1C };

            if let Some((code2, pr21, ppr2, lock2, cnr2)) = l2 {
                let freq2 = Code::L2C
                    .carrier_frequency(System::Glo, fcn)
                    .unwrap_or(0.0);
                let lli2 = self.loss_of_lock(sat, 1, lock2 as u16);
                let carrier2 = if ppr2 != -524_288 {
                    Some(self.adjust_carrier(
                        sat,
                        1,
                        ppr2 as f64 * 0.0005 * freq2 / crate::consts::CLIGHT,
                    ))
                } else {
                    None
                };
                let obs = &mut self.obs.records_mut()[slot];
                if pr21 != -8192 {
                    obs.pseudorange[1] = pr1 + pr21 as f64 * 0.02;
                }
                if let Some(cp) = carrier2 {
                    obs.carrier[1] = pr1 * freq2 / crate::consts::CLIGHT + cp;
                }
                obs.lli[1] = if lli2 { LLI_SLIP } else { 0 };
                obs.snr[1] = Self::quantize_snr(cnr2 as f64 * 0.25);
                obs.code[1] = if code2 != 0 { Code::L2P } else { Code::L2C };
            }
        }
        self.finish_obs(sync)
    }

    /* ---- station descriptors --------------------------------------- */

    fn decode_station_pos(&mut self, with_height: bool) -> Event {
        let buf = &self.buf[..];
        let mut i = 24 + 12;
        let staid = get_bitu(buf, i, 12);
        i += 12;
        let itrf = get_bitu(buf, i, 6);
        i += 6 + 4;
        let x = get_bits38(buf, i) * 0.0001;
        i += 38 + 2;
        let y = get_bits38(buf, i) * 0.0001;
        i += 38 + 2;
        let z = get_bits38(buf, i) * 0.0001;
        i += 38;
        let hgt = if with_height {
            get_bitu(buf, i, 16) as f64 * 0.0001
        } else {
            0.0
        };

        self.station.name = format!("{:04}", staid);
        self.station.itrf = itrf as i32;
        self.station.del_type = crate::station::DEL_TYPE_XYZ;
        self.station.pos = [x, y, z];
        self.station.del = [0.0; 3];
        self.station.hgt = hgt;
        Event::StationParams
    }

    fn read_string(&self, pos_bits: &mut usize, len: usize) -> String {
        let mut s = String::new();
        for _ in 0..len {
            let c = get_bitu(&self.buf[..], *pos_bits, 8);
            *pos_bits += 8;
            if let Some(ch) = char::from_u32(c) {
                if ch.is_ascii() && c >= 0x20 {
                    s.push(ch);
                }
            }
        }
        s
    }

    fn decode_antenna_desc(&mut self, with_serial: bool) -> Event {
        let mut i = 24 + 12;
        let staid = get_bitu(&self.buf[..], i, 12);
        i += 12;
        let n = get_bitu(&self.buf[..], i, 8) as usize;
        i += 8;
        if n > 31 {
            log::warn!("rtcm3 antenna descriptor length error: {}", n);
            return Event::Error;
        }
        let descriptor = self.read_string(&mut i, n);
        let setup = get_bitu(&self.buf[..], i, 8);
        i += 8;

        let serial = if with_serial {
            let m = get_bitu(&self.buf[..], i, 8) as usize;
            i += 8;
            if m > 31 {
                log::warn!("rtcm3 antenna serial length error: {}", m);
                return Event::Error;
            }
            self.read_string(&mut i, m)
        } else {
            String::new()
        };

        self.station.name = format!("{:04}", staid);
        self.station.antenna_descriptor = descriptor;
        self.station.antenna_setup = setup as i32;
        self.station.antenna_serial = serial;
        Event::AntennaParams
    }

    fn decode_receiver_desc(&mut self) -> Event {
        let mut i = 24 + 12;
        let staid = get_bitu(&self.buf[..], i, 12);
        i += 12;

        let mut fields = Vec::with_capacity(5);
        for _ in 0..2 {
            let n = get_bitu(&self.buf[..], i, 8) as usize;
            i += 8;
            if n > 31 {
                return Event::Error;
            }
            fields.push(self.read_string(&mut i, n));
            if fields.len() == 1 {
                /* antenna setup id sits between descriptor and serial */
                self.station.antenna_setup = get_bitu(&self.buf[..], i, 8) as i32;
                i += 8;
            }
        }
        for _ in 0..3 {
            let n = get_bitu(&self.buf[..], i, 8) as usize;
            i += 8;
            if n > 31 {
                return Event::Error;
            }
            fields.push(self.read_string(&mut i, n));
        }

        self.station.name = format!("{:04}", staid);
        self.station.antenna_descriptor = fields[0].clone();
        self.station.antenna_serial = fields[1].clone();
        self.station.receiver_descriptor = fields[2].clone();
        self.station.receiver_version = fields[3].clone();
        self.station.receiver_serial = fields[4].clone();
        Event::AntennaParams
    }

    /// Views the raw frame currently in the buffer (dispatch context)
    pub(crate) fn frame(&self) -> &[u8] {
        &self.buf[..self.frame_len + 3]
    }

    /// Payload length in bits, message header included
    pub(crate) fn payload_bits(&self) -> usize {
        self.frame_len * 8
    }
}

impl Default for Rtcm3Decoder {
    fn default() -> Self {
        Rtcm3Decoder::new()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::bits::set_bitu;
    use crate::edc::compute_crc24q;

    /// Wraps payload bits already placed after bit 24 into a framed RTCM 3
    /// message: fills the header and appends the CRC
    pub(crate) fn seal_frame(buf: &mut Vec<u8>, payload_len: usize) {
        buf.resize(3 + payload_len + 3, 0);
        set_bitu(buf, 0, 8, 0xD3);
        set_bitu(buf, 8, 6, 0);
        set_bitu(buf, 14, 10, payload_len as u32);
        let crc = compute_crc24q(&buf[..3 + payload_len], 0);
        set_bitu(buf, (3 + payload_len) * 8, 24, crc);
    }
}
