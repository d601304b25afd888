// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! RTCM 3 broadcast ephemeris messages
//!
//! Field scalings follow the interface specifications of each system
//! (IS-GPS-200, GLONASS ICD, Galileo OS SIS ICD, BDS ICD, IRNSS ICD).
//! Replacement policy: a fresh record replaces the cache iff its issue
//! of data differs — IODE alone for GPS/Galileo/IRNSS, IODE+IODC for
//! QZSS, and toe+IODE+IODC for BeiDou (the BeiDou test is deliberately
//! stricter and is not unified with the others). The `-EPHALL` option
//! disables the guard for diagnostics.

use crate::bits::{get_bits, get_bitu};
use crate::consts::{
    P2_11, P2_19, P2_20, P2_28, P2_29, P2_30, P2_31, P2_32, P2_33, P2_34, P2_38, P2_40, P2_41,
    P2_43, P2_46, P2_5, P2_50, P2_55, P2_59, P2_6, P2_66, SC2RAD,
};
use crate::decoder::Event;
use crate::eph::{EphSet, GlonassEph, Keplerian};
use crate::signal::{Sat, System};
use crate::time::{
    adj_bds_week, adj_gps_week, bdt_to_gpst, gpst_to_utc, utc_to_gpst, Time,
};

/// Sign-magnitude field of the GLONASS navigation message
fn get_bitg(buf: &[u8], pos: usize, len: usize) -> f64 {
    let magnitude = get_bitu(buf, pos + 1, len - 1) as f64;
    if get_bitu(buf, pos, 1) != 0 {
        -magnitude
    } else {
        magnitude
    }
}

impl super::Rtcm3Decoder {
    fn eph_all(&self) -> bool {
        self.opt.contains("-EPHALL")
    }

    /// MT 1019 (GPS) and MT 1044 (QZSS)
    pub(crate) fn decode_eph_gps(&mut self, sys: System) -> Event {
        let buf = self.frame();
        let mut eph = Keplerian::default();
        let mut i = 24 + 12;

        let prn;
        let toc;
        if sys == System::Qzs {
            prn = get_bitu(buf, i, 4) as u8 + 192;
            i += 4;
            toc = get_bitu(buf, i, 16) as f64 * 16.0;
            i += 16;
            eph.f2 = f64::from(get_bits(buf, i, 8)) * P2_55;
            i += 8;
            eph.f1 = f64::from(get_bits(buf, i, 16)) * P2_43;
            i += 16;
            eph.f0 = f64::from(get_bits(buf, i, 22)) * P2_31;
            i += 22;
            eph.iode = i64::from(get_bitu(buf, i, 8));
            i += 8;
            eph.crs = f64::from(get_bits(buf, i, 16)) * P2_5;
            i += 16;
            eph.deln = f64::from(get_bits(buf, i, 16)) * P2_43 * SC2RAD;
            i += 16;
            eph.m0 = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
            i += 32;
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
            eph.cic = f64::from(get_bits(buf, i, 16)) * P2_29;
            i += 16;
            eph.omg0 = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
            i += 32;
            eph.cis = f64::from(get_bits(buf, i, 16)) * P2_29;
            i += 16;
            eph.i0 = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
            i += 32;
            eph.crc = f64::from(get_bits(buf, i, 16)) * P2_5;
            i += 16;
            eph.omg = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
            i += 32;
            eph.omgd = f64::from(get_bits(buf, i, 24)) * P2_43 * SC2RAD;
            i += 24;
            eph.idot = f64::from(get_bits(buf, i, 14)) * P2_43 * SC2RAD;
            i += 14;
            eph.code = get_bitu(buf, i, 2);
            i += 2;
            eph.week = i64::from(get_bitu(buf, i, 10));
            i += 10;
            eph.sva = get_bitu(buf, i, 4) as u8;
            i += 4;
            eph.svh = get_bitu(buf, i, 6);
            i += 6;
            eph.tgd[0] = f64::from(get_bits(buf, i, 8)) * P2_31;
            i += 8;
            eph.iodc = i64::from(get_bitu(buf, i, 10));
            i += 10;
            eph.fit = if get_bitu(buf, i, 1) != 0 { 0.0 } else { 2.0 };
            eph.a = sqrt_a * sqrt_a;
        } else {
            prn = get_bitu(buf, i, 6) as u8;
            i += 6;
            eph.week = i64::from(get_bitu(buf, i, 10));
            i += 10;
            eph.sva = get_bitu(buf, i, 4) as u8;
            i += 4;
            eph.code = get_bitu(buf, i, 2);
            i += 2;
            eph.idot = f64::from(get_bits(buf, i, 14)) * P2_43 * SC2RAD;
            i += 14;
            eph.iode = i64::from(get_bitu(buf, i, 8));
            i += 8;
            toc = get_bitu(buf, i, 16) as f64 * 16.0;
            i += 16;
            eph.f2 = f64::from(get_bits(buf, i, 8)) * P2_55;
            i += 8;
            eph.f1 = f64::from(get_bits(buf, i, 16)) * P2_43;
            i += 16;
            eph.f0 = f64::from(get_bits(buf, i, 22)) * P2_31;
            i += 22;
            eph.iodc = i64::from(get_bitu(buf, i, 10));
            i += 10;
            eph.crs = f64::from(get_bits(buf, i, 16)) * P2_5;
            i += 16;
            eph.deln = f64::from(get_bits(buf, i, 16)) * P2_43 * SC2RAD;
            i += 16;
            eph.m0 = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
            i += 32;
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
            eph.cic = f64::from(get_bits(buf, i, 16)) * P2_29;
            i += 16;
            eph.omg0 = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
            i += 32;
            eph.cis = f64::from(get_bits(buf, i, 16)) * P2_29;
            i += 16;
            eph.i0 = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
            i += 32;
            eph.crc = f64::from(get_bits(buf, i, 16)) * P2_5;
            i += 16;
            eph.omg = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
            i += 32;
            eph.omgd = f64::from(get_bits(buf, i, 24)) * P2_43 * SC2RAD;
            i += 24;
            eph.tgd[0] = f64::from(get_bits(buf, i, 8)) * P2_31;
            i += 8;
            eph.svh = get_bitu(buf, i, 6);
            i += 6;
            eph.flag = get_bitu(buf, i, 1);
            i += 1;
            eph.fit = if get_bitu(buf, i, 1) != 0 { 0.0 } else { 4.0 };
            eph.a = sqrt_a * sqrt_a;
        }
        let _ = i;

        let sat = match Sat::new(sys, prn) {
            Ok(sat) => sat,
            Err(_) => {
                log::warn!("rtcm3 eph: invalid prn {} sys {}", prn, sys);
                return Event::Error;
            }
        };

        eph.week = adj_gps_week(eph.week, self.clock_now());
        eph.toe = Time::from_gps(eph.week, eph.toes);
        eph.toc = Time::from_gps(eph.week, toc);
        eph.ttr = self.reference_time();
        eph.sat = Some(sat);

        if !self.eph_all() {
            if let Some(old) = self.nav.eph(sat, EphSet::INav) {
                let unchanged = if sys == System::Qzs {
                    old.iode == eph.iode && old.iodc == eph.iodc
                } else {
                    old.iode == eph.iode
                };
                if unchanged {
                    return Event::None;
                }
            }
        }
        self.nav.set_eph(eph, EphSet::INav);
        Event::Ephemeris(sat, EphSet::INav)
    }

    /// MT 1020 (GLONASS)
    pub(crate) fn decode_eph_glo(&mut self) -> Event {
        let buf = self.frame();
        let mut geph = GlonassEph::default();
        let mut i = 24 + 12;

        let prn = get_bitu(buf, i, 6) as u8;
        i += 6;
        geph.frq = get_bitu(buf, i, 5) as i8 - 7;
        i += 5 + 2 + 2;
        let tk_h = get_bitu(buf, i, 5) as f64;
        i += 5;
        let tk_m = get_bitu(buf, i, 6) as f64;
        i += 6;
        let tk_s = get_bitu(buf, i, 1) as f64 * 30.0;
        i += 1;
        let bn = get_bitu(buf, i, 1);
        i += 1 + 1;
        let tb = get_bitu(buf, i, 7);
        i += 7;
        for k in 0..3 {
            geph.vel[k] = get_bitg(buf, i, 24) * P2_20 * 1e3;
            i += 24;
            geph.pos[k] = get_bitg(buf, i, 27) * P2_11 * 1e3;
            i += 27;
            geph.acc[k] = get_bitg(buf, i, 5) * P2_30 * 1e3;
            i += 5;
        }
        i += 1; /* P3 */
        geph.gamn = get_bitg(buf, i, 11) * P2_40;
        i += 11 + 3;
        geph.taun = get_bitg(buf, i, 22) * P2_30;
        i += 22;
        geph.dtaun = get_bitg(buf, i, 5) * P2_30;
        i += 5;
        geph.age = get_bitu(buf, i, 5);

        let sat = match Sat::new(System::Glo, prn) {
            Ok(sat) => sat,
            Err(_) => {
                log::warn!("rtcm3 1020: invalid prn {}", prn);
                return Event::Error;
            }
        };

        /* frame time and ephemeris time carry only time-of-day on the
         * UTC+3h scale; resolve both against the stream day with a
         * half-day wrap */
        let (week, tow_full) = gpst_to_utc(self.reference_time()).to_gps();
        let tod_now = tow_full % 86_400.0;
        let day_start = tow_full - tod_now;

        let mut tof = tk_h * 3600.0 + tk_m * 60.0 + tk_s - 10_800.0;
        if tof < tod_now - 43_200.0 {
            tof += 86_400.0;
        } else if tof > tod_now + 43_200.0 {
            tof -= 86_400.0;
        }
        geph.tof = utc_to_gpst(Time::from_gps(week, day_start + tof));

        let mut toe = f64::from(tb) * 900.0 - 10_800.0;
        if toe < tod_now - 43_200.0 {
            toe += 86_400.0;
        } else if toe > tod_now + 43_200.0 {
            toe -= 86_400.0;
        }
        geph.toe = utc_to_gpst(Time::from_gps(week, day_start + toe));

        geph.svh = bn;
        geph.iode = i64::from(tb & 0x7F);
        geph.sat = Some(sat);

        if !self.eph_all() {
            if let Some(old) = self.nav.geph(sat) {
                if geph.toe.diff(&old.toe).abs() < 1.0 && geph.svh == old.svh {
                    return Event::None;
                }
            }
        }
        self.nav.set_geph(geph);
        Event::Ephemeris(sat, EphSet::INav)
    }

    /// MT 1045 (Galileo F/NAV) and MT 1046 (Galileo I/NAV)
    pub(crate) fn decode_eph_gal(&mut self, fnav: bool) -> Event {
        let buf = self.frame();
        let mut eph = Keplerian::default();
        let mut i = 24 + 12;

        let prn = get_bitu(buf, i, 6) as u8;
        i += 6;
        let week = i64::from(get_bitu(buf, i, 12));
        i += 12;
        eph.iode = i64::from(get_bitu(buf, i, 10));
        i += 10;
        eph.sva = get_bitu(buf, i, 8) as u8;
        i += 8;
        eph.idot = f64::from(get_bits(buf, i, 14)) * P2_43 * SC2RAD;
        i += 14;
        let toc = get_bitu(buf, i, 14) as f64 * 60.0;
        i += 14;
        eph.f2 = f64::from(get_bits(buf, i, 6)) * P2_59;
        i += 6;
        eph.f1 = f64::from(get_bits(buf, i, 21)) * P2_46;
        i += 21;
        eph.f0 = f64::from(get_bits(buf, i, 31)) * P2_34;
        i += 31;
        eph.crs = f64::from(get_bits(buf, i, 16)) * P2_5;
        i += 16;
        eph.deln = f64::from(get_bits(buf, i, 16)) * P2_43 * SC2RAD;
        i += 16;
        eph.m0 = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
        i += 32;
        eph.cuc = f64::from(get_bits(buf, i, 16)) * P2_29;
        i += 16;
        eph.e = get_bitu(buf, i, 32) as f64 * P2_33;
        i += 32;
        eph.cus = f64::from(get_bits(buf, i, 16)) * P2_29;
        i += 16;
        let sqrt_a = get_bitu(buf, i, 32) as f64 * P2_19;
        i += 32;
        eph.toes = get_bitu(buf, i, 14) as f64 * 60.0;
        i += 14;
        eph.cic = f64::from(get_bits(buf, i, 16)) * P2_29;
        i += 16;
        eph.omg0 = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
        i += 32;
        eph.cis = f64::from(get_bits(buf, i, 16)) * P2_29;
        i += 16;
        eph.i0 = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
        i += 32;
        eph.crc = f64::from(get_bits(buf, i, 16)) * P2_5;
        i += 16;
        eph.omg = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
        i += 32;
        eph.omgd = f64::from(get_bits(buf, i, 24)) * P2_43 * SC2RAD;
        i += 24;
        eph.tgd[0] = f64::from(get_bits(buf, i, 10)) * P2_32; /* E5a/E1 */
        i += 10;
        if fnav {
            let e5a_hs = get_bitu(buf, i, 2);
            i += 2;
            let e5a_dvs = get_bitu(buf, i, 1);
            /* health in the F/NAV layout */
            eph.svh = (e5a_hs << 4) + (e5a_dvs << 3);
            eph.code = (1 << 1) + (1 << 8);
        } else {
            eph.tgd[1] = f64::from(get_bits(buf, i, 10)) * P2_32; /* E5b/E1 */
            i += 10;
            let e5b_hs = get_bitu(buf, i, 2);
            i += 2;
            let e5b_dvs = get_bitu(buf, i, 1);
            i += 1;
            let e1_hs = get_bitu(buf, i, 2);
            i += 2;
            let e1_dvs = get_bitu(buf, i, 1);
            eph.svh = (e5b_hs << 7) + (e5b_dvs << 6) + (e1_hs << 1) + e1_dvs;
            eph.code = (1 << 0) + (1 << 2) + (1 << 9);
        }

        let sat = match Sat::new(System::Gal, prn) {
            Ok(sat) => sat,
            Err(_) => {
                log::warn!("rtcm3 gal eph: invalid prn {}", prn);
                return Event::Error;
            }
        };

        /* galileo week counts from GPS week 1024 */
        eph.week = week + 1024;
        eph.a = sqrt_a * sqrt_a;
        eph.toe = Time::from_gps(eph.week, eph.toes);
        eph.toc = Time::from_gps(eph.week, toc);
        eph.ttr = self.reference_time();
        eph.sat = Some(sat);

        let set = if fnav { EphSet::FNav } else { EphSet::INav };
        if !self.eph_all() {
            if let Some(old) = self.nav.eph(sat, set) {
                if old.iode == eph.iode {
                    return Event::None;
                }
            }
        }
        self.nav.set_eph(eph, set);
        Event::Ephemeris(sat, set)
    }

    /// MT 1042 (and tentative 63) BeiDou
    pub(crate) fn decode_eph_bds(&mut self) -> Event {
        let buf = self.frame();
        let mut eph = Keplerian::default();
        let mut i = 24 + 12;

        let prn = get_bitu(buf, i, 6) as u8;
        i += 6;
        let week = i64::from(get_bitu(buf, i, 13));
        i += 13;
        eph.sva = get_bitu(buf, i, 4) as u8;
        i += 4;
        eph.idot = f64::from(get_bits(buf, i, 14)) * P2_43 * SC2RAD;
        i += 14;
        eph.iode = i64::from(get_bitu(buf, i, 5)); /* AODE */
        i += 5;
        let toc = get_bitu(buf, i, 17) as f64 * 8.0;
        i += 17;
        eph.f2 = f64::from(get_bits(buf, i, 11)) * P2_66;
        i += 11;
        eph.f1 = f64::from(get_bits(buf, i, 22)) * P2_50;
        i += 22;
        eph.f0 = f64::from(get_bits(buf, i, 24)) * P2_33;
        i += 24;
        eph.iodc = i64::from(get_bitu(buf, i, 5)); /* AODC */
        i += 5;
        eph.crs = f64::from(get_bits(buf, i, 18)) * P2_6;
        i += 18;
        eph.deln = f64::from(get_bits(buf, i, 16)) * P2_43 * SC2RAD;
        i += 16;
        eph.m0 = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
        i += 32;
        eph.cuc = f64::from(get_bits(buf, i, 18)) * P2_31;
        i += 18;
        eph.e = get_bitu(buf, i, 32) as f64 * P2_33;
        i += 32;
        eph.cus = f64::from(get_bits(buf, i, 18)) * P2_31;
        i += 18;
        let sqrt_a = get_bitu(buf, i, 32) as f64 * P2_19;
        i += 32;
        eph.toes = get_bitu(buf, i, 17) as f64 * 8.0;
        i += 17;
        eph.cic = f64::from(get_bits(buf, i, 18)) * P2_31;
        i += 18;
        eph.omg0 = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
        i += 32;
        eph.cis = f64::from(get_bits(buf, i, 18)) * P2_31;
        i += 18;
        eph.i0 = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
        i += 32;
        eph.crc = f64::from(get_bits(buf, i, 18)) * P2_6;
        i += 18;
        eph.omg = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
        i += 32;
        eph.omgd = f64::from(get_bits(buf, i, 24)) * P2_43 * SC2RAD;
        i += 24;
        eph.tgd[0] = f64::from(get_bits(buf, i, 10)) * 1e-10;
        i += 10;
        eph.tgd[1] = f64::from(get_bits(buf, i, 10)) * 1e-10;
        i += 10;
        eph.svh = get_bitu(buf, i, 1);

        let sat = match Sat::new(System::Bds, prn) {
            Ok(sat) => sat,
            Err(_) => {
                log::warn!("rtcm3 1042: invalid prn {}", prn);
                return Event::Error;
            }
        };

        eph.week = adj_bds_week(week, self.clock_now());
        eph.a = sqrt_a * sqrt_a;
        /* toe/toc are broadcast in BDT; shift onto GPST */
        eph.toe = bdt_to_gpst(Time::from_bds(eph.week, eph.toes));
        eph.toc = bdt_to_gpst(Time::from_bds(eph.week, toc));
        eph.ttr = self.reference_time();
        eph.sat = Some(sat);

        if !self.eph_all() {
            if let Some(old) = self.nav.eph(sat, EphSet::INav) {
                /* the BeiDou uniqueness test also compares toe */
                if eph.toe.diff(&old.toe) == 0.0
                    && eph.iode == old.iode
                    && eph.iodc == old.iodc
                {
                    return Event::None;
                }
            }
        }
        self.nav.set_eph(eph, EphSet::INav);
        Event::Ephemeris(sat, EphSet::INav)
    }

    /// MT 1041 (IRNSS/NavIC)
    pub(crate) fn decode_eph_irn(&mut self) -> Event {
        let buf = self.frame();
        let mut eph = Keplerian::default();
        let mut i = 24 + 12;

        let prn = get_bitu(buf, i, 6) as u8;
        i += 6;
        let week = i64::from(get_bitu(buf, i, 10));
        i += 10;
        eph.f0 = f64::from(get_bits(buf, i, 22)) * P2_31;
        i += 22;
        eph.f1 = f64::from(get_bits(buf, i, 16)) * P2_43;
        i += 16;
        eph.f2 = f64::from(get_bits(buf, i, 8)) * P2_55;
        i += 8;
        eph.sva = get_bitu(buf, i, 4) as u8;
        i += 4;
        let toc = get_bitu(buf, i, 16) as f64 * 16.0;
        i += 16;
        eph.tgd[0] = f64::from(get_bits(buf, i, 8)) * P2_31;
        i += 8;
        eph.deln = f64::from(get_bits(buf, i, 22)) * P2_41 * SC2RAD;
        i += 22;
        eph.iode = i64::from(get_bitu(buf, i, 8)); /* IODEC */
        i += 8 + 10; /* reserved */
        eph.svh = get_bitu(buf, i, 2); /* L5+S health */
        i += 2;
        eph.cuc = f64::from(get_bits(buf, i, 15)) * P2_28;
        i += 15;
        eph.cus = f64::from(get_bits(buf, i, 15)) * P2_28;
        i += 15;
        eph.cic = f64::from(get_bits(buf, i, 15)) * P2_28;
        i += 15;
        eph.cis = f64::from(get_bits(buf, i, 15)) * P2_28;
        i += 15;
        eph.crc = f64::from(get_bits(buf, i, 15)) * 0.0625;
        i += 15;
        eph.crs = f64::from(get_bits(buf, i, 15)) * 0.0625;
        i += 15;
        eph.idot = f64::from(get_bits(buf, i, 14)) * P2_43 * SC2RAD;
        i += 14;
        eph.m0 = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
        i += 32;
        eph.toes = get_bitu(buf, i, 16) as f64 * 16.0;
        i += 16;
        eph.e = get_bitu(buf, i, 32) as f64 * P2_33;
        i += 32;
        let sqrt_a = get_bitu(buf, i, 32) as f64 * P2_19;
        i += 32;
        eph.omg0 = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
        i += 32;
        eph.omg = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;
        i += 32;
        eph.omgd = f64::from(get_bits(buf, i, 22)) * P2_38 * SC2RAD;
        i += 22;
        eph.i0 = f64::from(get_bits(buf, i, 32)) * P2_31 * SC2RAD;

        let sat = match Sat::new(System::Irn, prn) {
            Ok(sat) => sat,
            Err(_) => {
                log::warn!("rtcm3 1041: invalid prn {}", prn);
                return Event::Error;
            }
        };

        eph.week = adj_gps_week(week, self.clock_now());
        eph.a = sqrt_a * sqrt_a;
        eph.toe = Time::from_gps(eph.week, eph.toes);
        eph.toc = Time::from_gps(eph.week, toc);
        eph.ttr = self.reference_time();
        eph.sat = Some(sat);

        if !self.eph_all() {
            if let Some(old) = self.nav.eph(sat, EphSet::INav) {
                if old.iode == eph.iode {
                    return Event::None;
                }
            }
        }
        self.nav.set_eph(eph, EphSet::INav);
        Event::Ephemeris(sat, EphSet::INav)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::seal_frame;
    use super::*;
    use crate::bits::{set_bits, set_bitu};
    use crate::decoder::Event;
    use crate::rtcm3::Rtcm3Decoder;
    use crate::time::FixedClock;
    use float_eq::assert_float_eq;
    use std::sync::Arc;

    fn decoder() -> Rtcm3Decoder {
        let t = Time::from_epoch(2021, 6, 1, 0, 0, 0.0).unwrap();
        Rtcm3Decoder::with_clock(Arc::new(FixedClock(t)))
    }

    fn feed(dec: &mut Rtcm3Decoder, frame: &[u8]) -> Event {
        let mut out = Event::None;
        for b in frame {
            let e = dec.input(*b);
            if !matches!(e, Event::None) {
                out = e;
            }
        }
        out
    }

    /// Builds an MT 1019 frame for a given PRN/IODE with plausible orbit
    /// fields
    fn build_1019(prn: u32, iode: u32) -> Vec<u8> {
        let mut buf = vec![0u8; 80];
        let mut i = 24;
        set_bitu(&mut buf, i, 12, 1019);
        i += 12;
        set_bitu(&mut buf, i, 6, prn);
        i += 6;
        set_bitu(&mut buf, i, 10, 2160 % 1024); /* week */
        i += 10;
        set_bitu(&mut buf, i, 4, 0); /* sva */
        i += 4;
        set_bitu(&mut buf, i, 2, 1); /* code on L2 */
        i += 2;
        set_bits(&mut buf, i, 14, -10); /* idot */
        i += 14;
        set_bitu(&mut buf, i, 8, iode);
        i += 8;
        set_bitu(&mut buf, i, 16, 345_600 / 16); /* toc */
        i += 16;
        set_bits(&mut buf, i, 8, 0); /* f2 */
        i += 8;
        set_bits(&mut buf, i, 16, -100); /* f1 */
        i += 16;
        set_bits(&mut buf, i, 22, 20_000); /* f0 */
        i += 22;
        set_bitu(&mut buf, i, 10, iode); /* iodc */
        i += 10;
        set_bits(&mut buf, i, 16, 100); /* crs */
        i += 16;
        set_bits(&mut buf, i, 16, 1000); /* deln */
        i += 16;
        set_bits(&mut buf, i, 32, 500_000_000); /* m0 */
        i += 32;
        set_bits(&mut buf, i, 16, -50); /* cuc */
        i += 16;
        set_bitu(&mut buf, i, 32, 85_000_000); /* e ~ 0.0099 */
        i += 32;
        set_bits(&mut buf, i, 16, 60); /* cus */
        i += 16;
        set_bitu(&mut buf, i, 32, 2_702_930_000); /* sqrtA ~ 5154.6 */
        i += 32;
        set_bitu(&mut buf, i, 16, 345_600 / 16); /* toes */
        i += 16;
        set_bits(&mut buf, i, 16, 10); /* cic */
        i += 16;
        set_bits(&mut buf, i, 32, -300_000_000); /* omg0 */
        i += 32;
        set_bits(&mut buf, i, 16, -12); /* cis */
        i += 16;
        set_bits(&mut buf, i, 32, 660_000_000); /* i0 ~ 0.966 sc */
        i += 32;
        set_bits(&mut buf, i, 16, 4000); /* crc */
        i += 16;
        set_bits(&mut buf, i, 32, 100_000_000); /* omg */
        i += 32;
        set_bits(&mut buf, i, 24, -1500); /* omgd */
        i += 24;
        set_bits(&mut buf, i, 8, 5); /* tgd */
        i += 8;
        set_bitu(&mut buf, i, 6, 0); /* svh */
        i += 6;
        set_bitu(&mut buf, i, 1, 0); /* flag */
        i += 1;
        set_bitu(&mut buf, i, 1, 0); /* fit */
        i += 1;
        let payload_len = (i + 7) / 8 - 3;
        seal_frame(&mut buf, payload_len);
        buf.truncate(3 + payload_len + 3);
        buf
    }

    #[test]
    fn type1019_decode_and_replace() {
        let mut dec = decoder();
        let sat = Sat::new(System::Gps, 5).unwrap();

        /* first record lands in the store */
        let event = feed(&mut dec, &build_1019(5, 10));
        assert!(matches!(event, Event::Ephemeris(s, EphSet::INav) if s == sat));
        let eph = dec.nav.eph(sat, EphSet::INav).unwrap();
        assert_eq!(eph.iode, 10);
        assert_eq!(eph.week, 2160);
        /* scaled fields */
        assert_float_eq!(eph.e, 85_000_000.0 * P2_33, abs <= 1e-15);
        let sqrt_a = 2_702_930_000.0 * P2_19;
        assert_float_eq!(eph.a, sqrt_a * sqrt_a, abs <= 1e-3);
        let (_, toes) = eph.toe.to_gps();
        assert_float_eq!(toes, 345_600.0, abs <= 1e-9);

        /* same iode again: unchanged, no event */
        let event = feed(&mut dec, &build_1019(5, 10));
        assert!(matches!(event, Event::None));
        assert_eq!(dec.nav.eph(sat, EphSet::INav).unwrap().iode, 10);

        /* fresh iode replaces exactly this satellite's record */
        let event = feed(&mut dec, &build_1019(5, 11));
        assert!(matches!(event, Event::Ephemeris(_, _)));
        assert_eq!(dec.nav.eph(sat, EphSet::INav).unwrap().iode, 11);
    }

    #[test]
    fn ephall_option_disables_guard() {
        let mut dec = decoder();
        dec.opt = "-EPHALL".to_string();
        let event = feed(&mut dec, &build_1019(7, 33));
        assert!(matches!(event, Event::Ephemeris(_, _)));
        /* identical record still reported with the guard off */
        let event = feed(&mut dec, &build_1019(7, 33));
        assert!(matches!(event, Event::Ephemeris(_, _)));
    }

    #[test]
    fn invalid_prn_is_rejected() {
        let mut dec = decoder();
        let event = feed(&mut dec, &build_1019(33, 1));
        assert!(matches!(event, Event::Error));
        assert!(dec
            .nav
            .eph(Sat::new(System::Gps, 1).unwrap(), EphSet::INav)
            .is_none());
    }
}
