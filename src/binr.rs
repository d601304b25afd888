// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! NVS BINR stream decoder
//!
//! Frames start with `0x10`, end with `0x10 0x03`, and double every
//! literal `0x10` inside the payload; the framer undoes the stuffing and
//! recognizes the end marker by an odd run of `0x10` bytes followed by
//! `0x03`. Messages handled:
//!
//! - `0xF5` raw measurements: UTC time tag, per-satellite carrier,
//!   pseudorange (milliseconds) and Doppler. The epoch is rounded onto a
//!   10 ms grid with the residual folded into the pseudoranges so the
//!   absolute ranges survive the retagging; `-TADJ=t` aligns onto a
//!   caller-chosen grid the same way.
//! - `0xF7` broadcast ephemeris, GPS Keplerian or GLONASS state vector
//! - `0xE5` subframe buffer; SBAS records are CRC-checked and handed out
//!   as raw SBAS messages
//! - `0x4A`/`0x4B` ionosphere / UTC parameters

use crate::consts::CLIGHT;
use crate::decoder::Event;
use crate::edc::compute_crc24q;
use crate::eph::{EphSet, GlonassEph, Keplerian, NavData};
use crate::obs::{ObsData, ObsEpoch, LLI_SLIP};
use crate::sbas::SbasMessage;
use crate::signal::consts::{DFRQ1_GLO, FREQ1_GLO, FREQ_L1};
use crate::signal::{Code, Sat, System};
use crate::time::{adjust_day, gpst_to_utc, utc_to_gpst, Clock, SystemClock, Time};
use std::collections::HashMap;
use std::sync::Arc;

/// Frame sync byte
const SYNC: u8 = 0x10;
/// End-of-frame byte (follows an unstuffed sync)
const END: u8 = 0x03;
/// Working buffer bound
const MAX_RAW_LEN: usize = 16_384;

/// Little-endian field readers of the BINR payload
fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}
fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}
fn read_f32(buf: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}
fn read_f64(buf: &[u8], at: usize) -> f64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    f64::from_le_bytes(bytes)
}

/// NVS BINR single-byte-feed decoder state
pub struct BinrDecoder {
    clock: Arc<dyn Clock>,
    /// Decode options; `-TADJ=t` aligns epochs onto a t-second grid
    pub opt: String,
    /// Navigation data accumulated from this stream
    pub nav: NavData,
    /// Time of the last emitted observation epoch
    pub time: Time,
    buf: Vec<u8>,
    nbyte: usize,
    stuff_flag: bool,
    /// Per-message-type tallies for observability
    pub msg_counts: HashMap<u8, u32>,
    /// Framing error count
    pub error_count: u32,
}

impl BinrDecoder {
    /// Makes a decoder driven by the wall clock
    #[must_use]
    pub fn new() -> BinrDecoder {
        BinrDecoder::with_clock(Arc::new(SystemClock::new()))
    }

    /// Makes a decoder with an injected clock
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> BinrDecoder {
        BinrDecoder {
            clock,
            opt: String::new(),
            nav: NavData::new(),
            time: Time::default(),
            buf: vec![0; MAX_RAW_LEN],
            nbyte: 0,
            stuff_flag: false,
            msg_counts: HashMap::new(),
            error_count: 0,
        }
    }

    /// Feeds one byte; returns what, if anything, completed
    pub fn input(&mut self, byte: u8) -> Event {
        if self.nbyte == 0 {
            if byte == SYNC {
                self.buf[0] = byte;
                self.nbyte = 1;
            }
            return Event::None;
        }
        if self.nbyte == 1 {
            if byte != SYNC && byte != END {
                self.buf[1] = byte;
                self.nbyte = 2;
                self.stuff_flag = false;
            } else {
                /* a doubled sync or stray end marker: stay hunting */
                self.nbyte = 0;
            }
            return Event::None;
        }

        /* byte-stuffing: every second 0x10 of a run is a literal */
        if byte == SYNC {
            self.stuff_flag = !self.stuff_flag;
        }
        if byte != SYNC || self.stuff_flag {
            self.buf[self.nbyte] = byte;
            self.nbyte += 1;
        }

        if byte == END && self.stuff_flag {
            /* complete frame: [0x10, type, payload..., 0x10, 0x03] */
            let len = self.nbyte;
            self.nbyte = 0;
            self.stuff_flag = false;
            return self.dispatch(len);
        }
        if self.nbyte >= MAX_RAW_LEN {
            log::warn!("binr frame size error: len={}", self.nbyte);
            self.error_count += 1;
            self.nbyte = 0;
            return Event::Error;
        }
        Event::None
    }

    fn dispatch(&mut self, frame_len: usize) -> Event {
        if frame_len < 4 {
            self.error_count += 1;
            return Event::Error;
        }
        let msg_type = self.buf[1];
        *self.msg_counts.entry(msg_type).or_insert(0) += 1;
        /* strip the trailing 0x10 0x03 */
        let payload_len = frame_len - 4;

        match msg_type {
            0xF5 => self.decode_raw_meas(payload_len),
            0xF7 => self.decode_ephemeris(payload_len),
            0xE5 => self.decode_subframe_buffer(payload_len),
            0x4A => self.decode_ionosphere(payload_len),
            0x4B => self.decode_utc_params(payload_len),
            _ => {
                log::debug!("binr 0x{:02X}: unhandled message", msg_type);
                Event::None
            }
        }
    }

    fn tadj(&self) -> f64 {
        self.opt
            .split("-TADJ=")
            .nth(1)
            .and_then(|tail| {
                tail.split_whitespace()
                    .next()
                    .and_then(|v| v.parse::<f64>().ok())
            })
            .unwrap_or(0.0)
    }

    /// 0xF5 raw measurements
    fn decode_raw_meas(&mut self, payload_len: usize) -> Event {
        const HEADER: usize = 27;
        const RECORD: usize = 30;
        if payload_len < HEADER || (payload_len - HEADER) % RECORD != 0 {
            log::warn!("binr f5 length error: len={}", payload_len);
            self.error_count += 1;
            return Event::Error;
        }
        let p = &self.buf[2..2 + payload_len];

        let tow_utc_ms = read_f64(p, 0);
        let week_raw = read_u16(p, 8);
        let gps_utc_shift_ms = read_f64(p, 10);
        /* glonass-utc shift and receiver scale correction are unused */
        let _rcv_scale = p[26];

        if week_raw >= 4096 {
            log::warn!("binr f5 week error: {}", week_raw);
            self.error_count += 1;
            return Event::Error;
        }
        let week = crate::time::adj_gps_week(i64::from(week_raw), self.clock.now());

        /* retag onto the 10 ms grid; the residual moves into the
         * pseudoranges below so absolute ranges are preserved */
        let tow_gps_ms = tow_utc_ms + gps_utc_shift_ms;
        let tow_int_ms = 10.0 * (tow_gps_ms / 10.0 + 0.5).floor();
        let tow_frac_ms = tow_gps_ms - tow_int_ms;
        let mut time = Time::from_gps(week, tow_int_ms * 0.001);

        /* optional user grid alignment */
        let tadj = self.tadj();
        let mut toff = 0.0;
        if tadj > 0.0 {
            let (_, tow) = time.to_gps();
            let tn = tow / tadj;
            toff = (tn - (tn + 0.5).floor()) * tadj;
            time = time.add_seconds(-toff);
        }

        if self.time.sec() != 0 && time.diff(&self.time).abs() > 86_400.0 {
            log::warn!("binr f5 time tag jump: {}", time);
        }
        if self.time.sec() != 0 && time.diff(&self.time).abs() <= 1e-3 {
            log::debug!("binr f5 time tag duplicated: {}", time);
            return Event::None;
        }

        let mut epoch = ObsEpoch::new();
        let mut at = HEADER;
        while at + RECORD <= payload_len {
            let rec = &p[at..at + RECORD];
            at += RECORD;

            let sys = match rec[0] {
                1 => System::Glo,
                2 => System::Gps,
                4 => System::Sbs,
                _ => {
                    log::warn!("binr f5 unknown system code {}", rec[0]);
                    continue;
                }
            };
            let mut prn = rec[1];
            if sys == System::Sbs {
                prn += 120;
            }
            let sat = match Sat::new(sys, prn) {
                Ok(sat) => sat,
                Err(_) => {
                    log::warn!("binr f5 satellite number error: prn={}", prn);
                    continue;
                }
            };
            let fcn = rec[2] as i8;
            let carrier = read_f64(rec, 3);
            let pseudorange_ms = read_f64(rec, 11);
            let doppler = read_f64(rec, 19);
            let snr_db = rec[27] as i8;
            let flags = rec[28];

            /* sanity ranges */
            if carrier.abs() > 1e10 || pseudorange_ms.abs() > 1e10 || doppler.abs() > 1e5 {
                log::warn!("binr f5 obs range error: {}", sat);
                continue;
            }

            let freq = if sys == System::Glo {
                FREQ1_GLO + DFRQ1_GLO * f64::from(fcn)
            } else {
                FREQ_L1
            };
            if sys == System::Glo {
                self.nav.set_glo_frequency_channel(sat, fcn);
            }

            let mut obs = ObsData::new(time, sat, 1);
            obs.carrier[0] = carrier - toff * freq;
            obs.pseudorange[0] = (pseudorange_ms - tow_frac_ms) * CLIGHT * 0.001 - toff * CLIGHT;
            obs.doppler[0] = doppler;
            obs.snr[0] = if snr_db > 0 {
                (f64::from(snr_db) / crate::obs::SNR_UNIT + 0.5) as u16
            } else {
                0
            };
            obs.lli[0] = flags & LLI_SLIP;
            obs.code[0] = Code::L1C;
            epoch.push(obs);
        }

        self.time = time;
        epoch.sort_and_dedup();
        Event::Observations(epoch)
    }

    /// 0xF7 broadcast ephemeris, dispatched by the nested system byte
    fn decode_ephemeris(&mut self, payload_len: usize) -> Event {
        if payload_len < 2 {
            self.error_count += 1;
            return Event::Error;
        }
        let p = &self.buf[2..2 + payload_len];
        match p[0] {
            1 => self.decode_gps_eph(payload_len),
            2 => self.decode_glo_eph(payload_len),
            other => {
                log::debug!("binr f7 system {} not handled", other);
                Event::None
            }
        }
    }

    /// GPS Keplerian ephemeris of the 0xF7 message
    ///
    /// Field order follows the receiver protocol; the rate terms
    /// (`deln`, `idot`, `omgd`) and the millisecond-based clock and time
    /// fields carry the native 10³ scalings.
    fn decode_gps_eph(&mut self, payload_len: usize) -> Event {
        const LEN: usize = 2 + 12 * 4 + 9 * 8 + 4 * 2;
        if payload_len < LEN {
            log::warn!("binr f7 gps length error: len={}", payload_len);
            self.error_count += 1;
            return Event::Error;
        }
        let p = &self.buf[2..2 + payload_len];
        let prn = p[1];

        let mut eph = Keplerian::default();
        let mut at = 2;
        eph.crs = f64::from(read_f32(p, at));
        at += 4;
        eph.deln = f64::from(read_f32(p, at)) * 1e3;
        at += 4;
        eph.m0 = read_f64(p, at);
        at += 8;
        eph.e = read_f64(p, at);
        at += 8;
        let sqrt_a = read_f64(p, at);
        at += 8;
        eph.cuc = f64::from(read_f32(p, at));
        at += 4;
        eph.cus = f64::from(read_f32(p, at));
        at += 4;
        eph.crc = f64::from(read_f32(p, at));
        at += 4;
        eph.cic = f64::from(read_f32(p, at));
        at += 4;
        eph.cis = f64::from(read_f32(p, at));
        at += 4;
        eph.i0 = read_f64(p, at);
        at += 8;
        eph.idot = f64::from(read_f32(p, at)) * 1e3;
        at += 4;
        eph.omg0 = read_f64(p, at);
        at += 8;
        eph.omgd = read_f64(p, at) * 1e3;
        at += 8;
        eph.omg = read_f64(p, at);
        at += 8;
        eph.toes = read_f64(p, at) * 1e-3;
        at += 8;
        eph.f2 = f64::from(read_f32(p, at)) * 1e3;
        at += 4;
        eph.f1 = f64::from(read_f32(p, at));
        at += 4;
        eph.f0 = f64::from(read_f32(p, at)) * 1e-3;
        at += 4;
        eph.tgd[0] = f64::from(read_f32(p, at)) * 1e-3;
        at += 4;
        let toc_ms = read_f64(p, at);
        at += 8;
        eph.sva = p[at];
        at += 2;
        eph.svh = u32::from(read_u16(p, at));
        at += 2;
        eph.iodc = i64::from(read_u16(p, at));
        at += 2;
        let week_raw = read_u16(p, at);

        if week_raw >= 4096 {
            log::warn!("binr f7 gps week error: {}", week_raw);
            self.error_count += 1;
            return Event::Error;
        }
        let sat = match Sat::new(System::Gps, prn) {
            Ok(sat) => sat,
            Err(_) => {
                log::warn!("binr f7 invalid gps prn {}", prn);
                return Event::Error;
            }
        };

        eph.week = crate::time::adj_gps_week(i64::from(week_raw), self.clock.now());
        eph.a = sqrt_a * sqrt_a;
        eph.iode = eph.iodc & 0xFF;
        eph.toe = Time::from_gps(eph.week, eph.toes);
        eph.toc = Time::from_gps(eph.week, toc_ms * 1e-3);
        eph.ttr = self.time;
        eph.fit = 4.0;
        eph.sat = Some(sat);
        self.nav.set_eph(eph, EphSet::INav);
        Event::Ephemeris(sat, EphSet::INav)
    }

    /// GLONASS state-vector ephemeris of the 0xF7 message
    fn decode_glo_eph(&mut self, payload_len: usize) -> Event {
        const LEN: usize = 3 + 10 * 8 + 2 * 4 + 2;
        if payload_len < LEN {
            log::warn!("binr f7 glo length error: len={}", payload_len);
            self.error_count += 1;
            return Event::Error;
        }
        let p = &self.buf[2..2 + payload_len];
        let prn = p[1];
        let frq = p[2] as i8;

        let mut geph = GlonassEph::default();
        let mut at = 3;
        for k in 0..3 {
            geph.pos[k] = read_f64(p, at) * 1e3;
            at += 8;
        }
        for k in 0..3 {
            geph.vel[k] = read_f64(p, at) * 1e3;
            at += 8;
        }
        for k in 0..3 {
            geph.acc[k] = read_f64(p, at) * 1e3;
            at += 8;
        }
        let tb_ms = read_f64(p, at);
        at += 8;
        geph.gamn = f64::from(read_f32(p, at));
        at += 4;
        geph.taun = f64::from(read_f32(p, at)) * 1e-3;
        at += 4;
        geph.age = u32::from(read_u16(p, at));

        let sat = match Sat::new(System::Glo, prn) {
            Ok(sat) => sat,
            Err(_) => {
                log::warn!("binr f7 invalid glo prn {}", prn);
                return Event::Error;
            }
        };

        /* tb is time of day on the UTC+3h scale */
        let tb = tb_ms * 1e-3;
        let glot = gpst_to_utc(self.reference_time()).add_seconds(10_800.0);
        let toe_glot = adjust_day(glot, tb);
        geph.toe = utc_to_gpst(toe_glot.add_seconds(-10_800.0));
        geph.iode = ((tb / 900.0) as i64) & 0x7F;
        geph.frq = frq;
        geph.sat = Some(sat);
        self.nav.set_geph(geph);
        Event::Ephemeris(sat, EphSet::INav)
    }

    /// 0xE5 subframe buffer: walks records and hands SBAS frames out
    fn decode_subframe_buffer(&mut self, payload_len: usize) -> Event {
        let p = &self.buf[2..2 + payload_len];
        let mut at = 0usize;

        while at + 3 <= payload_len {
            let rec_type = p[at];
            let prn = p[at + 1];
            let rec_len = p[at + 2] as usize;
            at += 3;
            if at + rec_len > payload_len {
                log::warn!("binr e5 record length error");
                self.error_count += 1;
                return Event::Error;
            }
            let rec = &p[at..at + rec_len];
            at += rec_len;

            if rec_type != 4 {
                /* only SBAS sub-frames are consumed from the buffer */
                continue;
            }
            if rec_len < 32 {
                log::warn!("binr e5 sbas record too short: {}", rec_len);
                continue;
            }

            /* byte-aligned 250-bit frame in 32 bytes: 29 data bytes
             * followed by the 24-bit CRC-24Q */
            let mut data = [0u8; 29];
            data.copy_from_slice(&rec[..29]);
            let crc_calc = compute_crc24q(&rec[..29], 0);
            let crc_recv = (u32::from(rec[29]) << 16)
                | (u32::from(rec[30]) << 8)
                | u32::from(rec[31]);
            if crc_calc != crc_recv {
                log::warn!("binr e5 sbas crc error: prn={}", prn);
                self.error_count += 1;
                continue;
            }

            let (week, tow) = self.reference_time().to_gps();
            return Event::SbasMessage(SbasMessage {
                week,
                tow,
                prn,
                data,
            });
        }
        Event::None
    }

    /// 0x4A ionosphere parameters (8 × f32 Klobuchar terms)
    fn decode_ionosphere(&mut self, payload_len: usize) -> Event {
        if payload_len < 33 {
            log::warn!("binr 4a length error: len={}", payload_len);
            self.error_count += 1;
            return Event::Error;
        }
        let p = &self.buf[2..2 + payload_len];
        for k in 0..8 {
            self.nav.ion_utc_gps.ion[k] = f64::from(read_f32(p, k * 4));
        }
        Event::IonUtcParams
    }

    /// 0x4B GPS-UTC time scale parameters
    fn decode_utc_params(&mut self, payload_len: usize) -> Event {
        if payload_len < 23 {
            log::warn!("binr 4b length error: len={}", payload_len);
            self.error_count += 1;
            return Event::Error;
        }
        let p = &self.buf[2..2 + payload_len];
        self.nav.ion_utc_gps.utc[1] = read_f64(p, 0); /* A1 */
        self.nav.ion_utc_gps.utc[0] = read_f64(p, 8); /* A0 */
        self.nav.ion_utc_gps.utc[2] = f64::from(read_u32(p, 16)); /* tot */
        self.nav.ion_utc_gps.utc[3] = f64::from(read_u16(p, 20)); /* week */
        self.nav.ion_utc_gps.utc[4] = f64::from(p[22] as i8); /* leaps */
        Event::IonUtcParams
    }

    fn reference_time(&self) -> Time {
        if self.time.sec() != 0 {
            self.time
        } else {
            utc_to_gpst(self.clock.now())
        }
    }
}

impl Default for BinrDecoder {
    fn default() -> Self {
        BinrDecoder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;
    use float_eq::assert_float_eq;

    fn decoder() -> BinrDecoder {
        let t = Time::from_epoch(2021, 6, 1, 3, 25, 0.0).unwrap();
        BinrDecoder::with_clock(Arc::new(FixedClock(t)))
    }

    /// Wraps a payload into a stuffed BINR frame
    fn frame(msg_type: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![SYNC, msg_type];
        for b in payload {
            out.push(*b);
            if *b == SYNC {
                out.push(SYNC);
            }
        }
        out.push(SYNC);
        out.push(END);
        out
    }

    fn feed(dec: &mut BinrDecoder, stream: &[u8]) -> Vec<Event> {
        stream
            .iter()
            .map(|b| dec.input(*b))
            .filter(|e| !matches!(e, Event::None))
            .collect()
    }

    /// Builds an F5 payload: header plus one GPS satellite record
    fn f5_payload(tow_utc_ms: f64, gps_shift_ms: f64, pr_ms: f64, carrier: f64) -> Vec<u8> {
        let mut p = vec![0u8; 27 + 30];
        p[0..8].copy_from_slice(&tow_utc_ms.to_le_bytes());
        p[8..10].copy_from_slice(&2160u16.to_le_bytes());
        p[10..18].copy_from_slice(&gps_shift_ms.to_le_bytes());

        let rec = &mut p[27..57];
        rec[0] = 2; /* GPS */
        rec[1] = 7; /* prn */
        rec[2] = 0;
        rec[3..11].copy_from_slice(&carrier.to_le_bytes());
        rec[11..19].copy_from_slice(&pr_ms.to_le_bytes());
        rec[19..27].copy_from_slice(&1234.5f64.to_le_bytes());
        rec[27] = 45; /* snr */
        rec[28] = 0;
        p
    }

    #[test]
    fn f5_time_grid_folds_residual_into_range() {
        let mut dec = decoder();
        dec.opt = "-TADJ=0.1".to_string();

        /* utc tow 12345.678 s, no gps-utc shift for clarity */
        let range = 21_000_000.0f64;
        let pr_ms = range / (CLIGHT * 1e-3);
        let carrier = 110_345_678.5f64;
        let payload = f5_payload(12_345_678.0, 0.0, pr_ms, carrier);
        let events = feed(&mut dec, &frame(0xF5, &payload));
        assert_eq!(events.len(), 1);

        let epoch = match &events[0] {
            Event::Observations(epoch) => epoch,
            other => panic!("expected observations, got {:?}", other),
        };
        let obs = &epoch.records()[0];
        assert_eq!(obs.sat, Sat::new(System::Gps, 7).unwrap());

        /* 12345.678 rounds to 12345.680 on the 10 ms grid, then the
         * 0.1 s alignment shifts to 12345.700 */
        let (_, tow) = obs.time.to_gps();
        assert_float_eq!(tow, 12_345.700, abs <= 1e-9);

        /* 22 ms of retagging moved into the pseudorange */
        assert_float_eq!(
            obs.pseudorange[0],
            range + 0.022 * CLIGHT,
            abs <= 1e-2
        );
        /* and the carrier moved by toff * f_L1 (toff = -0.02 s) */
        assert_float_eq!(
            obs.carrier[0],
            carrier + 0.02 * FREQ_L1,
            abs <= 1e-2
        );
        assert_eq!(obs.code[0], Code::L1C);
        assert_eq!(obs.snr[0], (45.0 / crate::obs::SNR_UNIT + 0.5) as u16);
    }

    #[test]
    fn f5_duplicate_epoch_dropped() {
        let mut dec = decoder();
        let payload = f5_payload(12_345_680.0, 0.0, 70.0, 1.0e8);
        let events = feed(&mut dec, &frame(0xF5, &payload));
        assert_eq!(events.len(), 1);
        /* identical time tag: silently dropped */
        let events = feed(&mut dec, &frame(0xF5, &payload));
        assert!(events.is_empty());
    }

    #[test]
    fn byte_stuffing_roundtrip() {
        let mut dec = decoder();
        /* payload containing sync bytes exercises the unstuffing */
        let mut payload = vec![0u8; 33];
        payload[0] = SYNC;
        payload[4] = SYNC;
        payload[5] = SYNC;
        let events = feed(&mut dec, &frame(0x4A, &payload));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::IonUtcParams));
        /* the stuffed 0x10 at offset 0 landed in alpha0 */
        assert_float_eq!(
            dec.nav.ion_utc_gps.ion[0],
            f64::from(f32::from_le_bytes([0x10, 0, 0, 0])),
            abs <= 1e-20
        );
    }

    #[test]
    fn utc_parameters() {
        let mut dec = decoder();
        let mut payload = vec![0u8; 23];
        payload[0..8].copy_from_slice(&1e-12f64.to_le_bytes());
        payload[8..16].copy_from_slice(&(-5e-9f64).to_le_bytes());
        payload[16..20].copy_from_slice(&405_504u32.to_le_bytes());
        payload[20..22].copy_from_slice(&2160u16.to_le_bytes());
        payload[22] = 18;
        let events = feed(&mut dec, &frame(0x4B, &payload));
        assert!(matches!(events[0], Event::IonUtcParams));
        assert_float_eq!(dec.nav.ion_utc_gps.utc[0], -5e-9, abs <= 1e-20);
        assert_float_eq!(dec.nav.ion_utc_gps.utc[1], 1e-12, abs <= 1e-20);
        assert_eq!(dec.nav.ion_utc_gps.utc[4], 18.0);
    }

    #[test]
    fn e5_sbas_record_with_crc() {
        let mut dec = decoder();

        /* a 32-byte SBAS frame: 29 data bytes + 24-bit CRC */
        let mut sbas = [0u8; 32];
        sbas[0] = 0x9A; /* preamble */
        crate::bits::set_bitu(&mut sbas, 8, 6, 2); /* type 2 */
        let crc = compute_crc24q(&sbas[..29], 0);
        sbas[29] = (crc >> 16) as u8;
        sbas[30] = (crc >> 8) as u8;
        sbas[31] = crc as u8;

        let mut payload = vec![4u8, 133, 32];
        payload.extend_from_slice(&sbas);
        let events = feed(&mut dec, &frame(0xE5, &payload));
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::SbasMessage(msg) => {
                assert_eq!(msg.prn, 133);
                assert_eq!(msg.message_type(), 2);
                assert_eq!(msg.data[0], 0x9A);
            }
            other => panic!("expected sbas message, got {:?}", other),
        }

        /* corrupting the frame fails the CRC gate */
        let mut bad = payload.clone();
        bad[5] ^= 0xFF;
        let events = feed(&mut dec, &frame(0xE5, &bad));
        assert!(events.is_empty());
        assert!(dec.error_count > 0);
    }

    #[test]
    fn gps_ephemeris_roundtrip() {
        let mut dec = decoder();
        let mut p = vec![0u8; 2 + 12 * 4 + 9 * 8 + 4 * 2];
        p[0] = 1; /* GPS */
        p[1] = 12; /* prn */
        let mut at = 2;
        let f32s = |p: &mut [u8], at: &mut usize, v: f32| {
            p[*at..*at + 4].copy_from_slice(&v.to_le_bytes());
            *at += 4;
        };
        let f64s = |p: &mut [u8], at: &mut usize, v: f64| {
            p[*at..*at + 8].copy_from_slice(&v.to_le_bytes());
            *at += 8;
        };
        f32s(&mut p, &mut at, 100.0); /* crs */
        f32s(&mut p, &mut at, 4.3e-12); /* deln (1/ms) */
        f64s(&mut p, &mut at, 0.5); /* m0 */
        f64s(&mut p, &mut at, 0.01); /* e */
        f64s(&mut p, &mut at, 5153.7); /* sqrtA */
        f32s(&mut p, &mut at, 1e-6); /* cuc */
        f32s(&mut p, &mut at, 2e-6); /* cus */
        f32s(&mut p, &mut at, 200.0); /* crc */
        f32s(&mut p, &mut at, 1e-7); /* cic */
        f32s(&mut p, &mut at, -1e-7); /* cis */
        f64s(&mut p, &mut at, 0.96); /* i0 */
        f32s(&mut p, &mut at, 1e-13); /* idot */
        f64s(&mut p, &mut at, -1.2); /* omg0 */
        f64s(&mut p, &mut at, -8e-12); /* omgd (1/ms) */
        f64s(&mut p, &mut at, 0.3); /* omg */
        f64s(&mut p, &mut at, 345_600_000.0); /* toe (ms) */
        f32s(&mut p, &mut at, 0.0); /* f2 */
        f32s(&mut p, &mut at, 1e-11); /* f1 */
        f32s(&mut p, &mut at, 0.012); /* f0 (ms) */
        f32s(&mut p, &mut at, 5e-6); /* tgd (ms) */
        f64s(&mut p, &mut at, 345_600_000.0); /* toc (ms) */
        p[at] = 2; /* ura */
        at += 2;
        p[at..at + 2].copy_from_slice(&0u16.to_le_bytes()); /* svh */
        at += 2;
        p[at..at + 2].copy_from_slice(&157u16.to_le_bytes()); /* iodc */
        at += 2;
        p[at..at + 2].copy_from_slice(&(2160u16 % 1024).to_le_bytes());

        let events = feed(&mut dec, &frame(0xF7, &p));
        assert_eq!(events.len(), 1);
        let sat = Sat::new(System::Gps, 12).unwrap();
        assert!(matches!(events[0], Event::Ephemeris(s, EphSet::INav) if s == sat));

        let eph = dec.nav.eph(sat, EphSet::INav).unwrap();
        assert_eq!(eph.iodc, 157);
        assert_eq!(eph.iode, 157);
        assert_eq!(eph.week, 2160);
        assert_float_eq!(eph.a, 5153.7 * 5153.7, abs <= 1e-3);
        assert_float_eq!(eph.toes, 345_600.0, abs <= 1e-9);
        assert_float_eq!(eph.f0, 1.2e-5, abs <= 1e-12);
        let (_, toc_tow) = eph.toc.to_gps();
        assert_float_eq!(toc_tow, 345_600.0, abs <= 1e-9);
    }

    #[test]
    fn glonass_ephemeris_day_anchoring() {
        let mut dec = decoder();
        let mut p = vec![0u8; 3 + 10 * 8 + 2 * 4 + 2];
        p[0] = 2; /* GLONASS */
        p[1] = 3; /* prn */
        p[2] = 0xFB; /* fcn = -5 */
        let mut at = 3;
        for v in [
            19_100.0f64, 10_000.0, 10_500.0, /* pos (km) */
            -1.0, 2.0, 2.5, /* vel (km/s) */
            0.0, 0.0, 0.0, /* acc */
        ]
        .iter()
        {
            p[at..at + 8].copy_from_slice(&v.to_le_bytes());
            at += 8;
        }
        /* tb = 12600 s of day (GLONASS time scale) in ms */
        p[at..at + 8].copy_from_slice(&12_600_000.0f64.to_le_bytes());
        at += 8;
        p[at..at + 4].copy_from_slice(&1e-12f32.to_le_bytes()); /* gamn */
        at += 4;
        p[at..at + 4].copy_from_slice(&0.5f32.to_le_bytes()); /* taun (ms) */
        at += 4;
        p[at..at + 2].copy_from_slice(&3u16.to_le_bytes()); /* age */

        let events = feed(&mut dec, &frame(0xF7, &p));
        assert_eq!(events.len(), 1);
        let sat = Sat::new(System::Glo, 3).unwrap();
        let geph = dec.nav.geph(sat).unwrap();
        assert_eq!(geph.frq, -5);
        assert_eq!(geph.iode, (12_600 / 900) & 0x7F);
        assert_float_eq!(geph.pos[0], 19_100_000.0, abs <= 1e-6);
        assert_float_eq!(geph.taun, 5e-4, abs <= 1e-12);

        /* toe is on GPST: tb - 3 h, back to UTC day, plus leaps; the
         * clock sits at 03:25 UTC so no day wrap occurs */
        let expect_utc = Time::from_epoch(2021, 6, 1, 0, 0, 0.0)
            .unwrap()
            .add_seconds(12_600.0 - 10_800.0);
        let expect = utc_to_gpst(expect_utc);
        assert_float_eq!(geph.toe.diff(&expect), 0.0, abs <= 1e-6);

        assert_eq!(dec.nav.glo_frequency_channel(sat), Some(-5));
    }
}
