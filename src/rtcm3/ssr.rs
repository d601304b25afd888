// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! RTCM 3 state-space representation corrections
//!
//! Six RTCM message types per constellation carry orbit, clock, code
//! bias, combined orbit+clock, URA and high-rate clock corrections; a
//! seventh carries phase biases. The IGS SSR envelope (message 4076)
//! transports the same bodies keyed by an 8-bit subtype. Every write
//! touches only its own correction class of the satellite record: each
//! class keeps an independent reference time, update interval and IOD.

use crate::bits::{get_bits, get_bitu};
use crate::consts::D2R;
use crate::decoder::Event;
use crate::signal::{Code, Sat, System};
use crate::ssr::SsrClass;
use crate::time::Time;

/// Update interval codes to seconds
const UDI_TABLE: [f64; 16] = [
    1.0, 2.0, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0, 240.0, 300.0, 600.0, 900.0, 1800.0, 3600.0,
    7200.0, 10800.0,
];

/// SSR signal-and-tracking-mode to observation code, GPS
const SSR_SIG_GPS: [Code; 32] = [
    Code::L1C,
    Code::L1P,
    Code::L1W,
    Code::L1S,
    Code::L1L,
    Code::L2C,
    Code::L2D,
    Code::L2S,
    Code::L2L,
    Code::L2X,
    Code::L2P,
    Code::L2W,
    Code::None,
    Code::None,
    Code::L5I,
    Code::L5Q,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
];
/// SSR signal-and-tracking-mode to observation code, GLONASS
const SSR_SIG_GLO: [Code; 32] = [
    Code::L1C,
    Code::L1P,
    Code::L2C,
    Code::L2P,
    Code::L4A,
    Code::L4B,
    Code::L6A,
    Code::L6B,
    Code::L3I,
    Code::L3Q,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
];
/// SSR signal-and-tracking-mode to observation code, Galileo
const SSR_SIG_GAL: [Code; 32] = [
    Code::L1A,
    Code::L1B,
    Code::L1C,
    Code::None,
    Code::None,
    Code::L5I,
    Code::L5Q,
    Code::None,
    Code::L7I,
    Code::L7Q,
    Code::None,
    Code::L8L,
    Code::L8Q,
    Code::None,
    Code::L6A,
    Code::L6B,
    Code::L6C,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
];
/// SSR signal-and-tracking-mode to observation code, QZSS
const SSR_SIG_QZS: [Code; 32] = [
    Code::L1C,
    Code::L1S,
    Code::L1L,
    Code::L2S,
    Code::L2L,
    Code::None,
    Code::L5I,
    Code::L5Q,
    Code::None,
    Code::L6S,
    Code::L6L,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::L6E,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
];
/// SSR signal-and-tracking-mode to observation code, BeiDou
const SSR_SIG_BDS: [Code; 32] = [
    Code::L2I,
    Code::L2Q,
    Code::None,
    Code::L6I,
    Code::L6Q,
    Code::None,
    Code::L7I,
    Code::L7Q,
    Code::None,
    Code::L1D,
    Code::L1P,
    Code::None,
    Code::L5D,
    Code::L5P,
    Code::None,
    Code::L1A,
    Code::None,
    Code::None,
    Code::L6A,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
];
/// SSR signal-and-tracking-mode to observation code, SBAS
const SSR_SIG_SBS: [Code; 32] = [
    Code::L1C,
    Code::L5I,
    Code::L5Q,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
    Code::None,
];

fn ssr_signal_table(sys: System) -> &'static [Code; 32] {
    match sys {
        System::Glo => &SSR_SIG_GLO,
        System::Gal => &SSR_SIG_GAL,
        System::Qzs => &SSR_SIG_QZS,
        System::Bds => &SSR_SIG_BDS,
        System::Sbs => &SSR_SIG_SBS,
        _ => &SSR_SIG_GPS,
    }
}

/// Per-system satellite-field widths: (prn bits, iode bits, iodcrc bits,
/// prn offset)
fn ssr_sat_params(sys: System) -> (usize, usize, usize, u8) {
    match sys {
        System::Glo => (5, 8, 0, 0),
        System::Gal => (6, 10, 0, 0),
        System::Qzs => (4, 8, 0, 192),
        System::Bds => (6, 10, 24, 1),
        System::Sbs => (6, 9, 24, 120),
        _ => (6, 8, 0, 0),
    }
}

struct SsrHead {
    time: Time,
    udi: f64,
    iod: i64,
    refd: bool,
    nsat: usize,
    /// bit position after the header
    i: usize,
}

impl super::Rtcm3Decoder {
    fn decode_ssr_head(&mut self, sys: System, class: u8, igs: bool) -> Option<SsrHead> {
        let buf = self.frame();
        let mut i = 24 + 12;
        let raw_time;
        if igs {
            /* IGS envelope: version, subtype already consumed by caller */
            i += 3 + 8;
            raw_time = get_bitu(buf, i, 20) as f64;
            i += 20;
        } else if sys == System::Glo {
            raw_time = get_bitu(buf, i, 17) as f64;
            i += 17;
        } else {
            raw_time = get_bitu(buf, i, 20) as f64;
            i += 20;
        }
        let udi = UDI_TABLE[get_bitu(buf, i, 4) as usize];
        i += 4;
        let _sync = get_bitu(buf, i, 1);
        i += 1;
        /* the satellite reference datum flag is carried by orbit-bearing
         * messages only */
        let mut refd = false;
        if class == 1 || class == 4 {
            refd = get_bitu(buf, i, 1) == 1;
            i += 1;
        }
        let iod = i64::from(get_bitu(buf, i, 4));
        i += 4;
        let _provider = get_bitu(buf, i, 16);
        i += 16;
        let _solution = get_bitu(buf, i, 4);
        i += 4;
        if class == 7 {
            /* dispersive-bias consistency and MW consistency flags */
            i += 1 + 1;
        }
        let nsat = get_bitu(buf, i, 6) as usize;
        i += 6;

        let time = if !igs && sys == System::Glo {
            self.adjust_glo_tod(raw_time)
        } else {
            self.adjust_gps_tow(raw_time)
        };
        Some(SsrHead {
            time,
            udi,
            iod,
            refd,
            nsat,
            i,
        })
    }

    fn read_ssr_sat(&self, i: &mut usize, sys: System) -> Option<Sat> {
        let (np, _, _, offp) = ssr_sat_params(sys);
        let prn = get_bitu(self.frame(), *i, np) as u8 + offp;
        *i += np;
        match Sat::new(sys, prn) {
            Ok(sat) => Some(sat),
            Err(_) => {
                log::warn!("rtcm3 ssr: invalid prn {} sys {}", prn, sys);
                None
            }
        }
    }

    fn read_orbit_block(&self, i: &mut usize, sys: System) -> (i64, i64, [f64; 3], [f64; 3]) {
        let (_, ni, nj, _) = ssr_sat_params(sys);
        let buf = self.frame();
        let iode = i64::from(get_bitu(buf, *i, ni));
        *i += ni;
        let iodcrc = if nj > 0 {
            let v = i64::from(get_bitu(buf, *i, nj));
            *i += nj;
            v
        } else {
            0
        };
        let deph = [
            f64::from(get_bits(buf, *i, 22)) * 1e-4,
            f64::from(get_bits(buf, *i + 22, 20)) * 4e-4,
            f64::from(get_bits(buf, *i + 42, 20)) * 4e-4,
        ];
        *i += 62;
        let ddeph = [
            f64::from(get_bits(buf, *i, 21)) * 1e-6,
            f64::from(get_bits(buf, *i + 21, 19)) * 4e-6,
            f64::from(get_bits(buf, *i + 40, 19)) * 4e-6,
        ];
        *i += 59;
        (iode, iodcrc, deph, ddeph)
    }

    fn read_clock_block(&self, i: &mut usize) -> [f64; 3] {
        let buf = self.frame();
        let dclk = [
            f64::from(get_bits(buf, *i, 22)) * 1e-4,
            f64::from(get_bits(buf, *i + 22, 21)) * 1e-6,
            f64::from(get_bits(buf, *i + 43, 27)) * 2e-8,
        ];
        *i += 70;
        dclk
    }

    /// One RTCM SSR message; `class` is 1..=7 in the order orbit, clock,
    /// code bias, combined, URA, high-rate clock, phase bias
    pub(crate) fn decode_ssr(&mut self, sys: System, class: u8) -> Event {
        self.decode_ssr_common(sys, class, false)
    }

    /// IGS SSR envelope, message 4076
    pub(crate) fn decode_igs_ssr(&mut self) -> Event {
        let buf = self.frame();
        let subtype = get_bitu(buf, 24 + 12 + 3, 8);
        let (sys, class) = match subtype {
            21..=27 => (System::Gps, subtype - 20),
            41..=47 => (System::Glo, subtype - 40),
            61..=67 => (System::Gal, subtype - 60),
            81..=87 => (System::Qzs, subtype - 80),
            101..=107 => (System::Bds, subtype - 100),
            121..=127 => (System::Sbs, subtype - 120),
            _ => {
                log::debug!("rtcm3 igs ssr: unhandled subtype {}", subtype);
                return Event::None;
            }
        };
        /* IGS subtype order: orbit, clock, combined, hrclock, codebias,
         * phasebias, ura */
        let rtcm_class = match class {
            1 => 1,
            2 => 2,
            3 => 4,
            4 => 6,
            5 => 3,
            6 => 7,
            _ => 5,
        };
        self.decode_ssr_common(sys, rtcm_class, true)
    }

    fn decode_ssr_common(&mut self, sys: System, class: u8, igs: bool) -> Event {
        let head = match self.decode_ssr_head(sys, class, igs) {
            Some(head) => head,
            None => return Event::Error,
        };
        let mut i = head.i;
        let payload_bits = self.payload_bits();

        for _ in 0..head.nsat {
            if i >= payload_bits {
                log::warn!("rtcm3 ssr: length error sys {} class {}", sys, class);
                self.error_count += 1;
                return Event::Error;
            }
            let sat = match self.read_ssr_sat(&mut i, sys) {
                Some(sat) => sat,
                None => return Event::Error,
            };

            match class {
                1 => {
                    let (iode, iodcrc, deph, ddeph) = self.read_orbit_block(&mut i, sys);
                    let ssr = self.nav.ssr_mut(sat);
                    ssr.t0[SsrClass::Orbit as usize] = head.time;
                    ssr.udi[SsrClass::Orbit as usize] = head.udi;
                    ssr.iod[SsrClass::Orbit as usize] = head.iod;
                    ssr.iode = iode;
                    ssr.iodcrc = iodcrc;
                    ssr.deph = deph;
                    ssr.ddeph = ddeph;
                    ssr.refd = head.refd;
                    ssr.update = true;
                }
                2 => {
                    let dclk = self.read_clock_block(&mut i);
                    let ssr = self.nav.ssr_mut(sat);
                    ssr.t0[SsrClass::Clock as usize] = head.time;
                    ssr.udi[SsrClass::Clock as usize] = head.udi;
                    ssr.iod[SsrClass::Clock as usize] = head.iod;
                    ssr.dclk = dclk;
                    ssr.update = true;
                }
                3 => {
                    let nbias = get_bitu(self.frame(), i, 5) as usize;
                    i += 5;
                    let mut biases = Vec::with_capacity(nbias);
                    for _ in 0..nbias {
                        let mode = get_bitu(self.frame(), i, 5) as usize;
                        i += 5;
                        let bias = f64::from(get_bits(self.frame(), i, 14)) * 0.01;
                        i += 14;
                        biases.push((mode, bias));
                    }
                    let table = ssr_signal_table(sys);
                    let ssr = self.nav.ssr_mut(sat);
                    ssr.t0[SsrClass::CodeBias as usize] = head.time;
                    ssr.udi[SsrClass::CodeBias as usize] = head.udi;
                    ssr.iod[SsrClass::CodeBias as usize] = head.iod;
                    for (mode, bias) in biases {
                        match table.get(mode).copied().unwrap_or(Code::None) {
                            Code::None => {
                                log::warn!("rtcm3 ssr: unknown code bias mode {}", mode)
                            }
                            code => ssr.cbias[code.number() as usize] = bias as f32,
                        }
                    }
                    ssr.update = true;
                }
                4 => {
                    let (iode, iodcrc, deph, ddeph) = self.read_orbit_block(&mut i, sys);
                    let dclk = self.read_clock_block(&mut i);
                    let ssr = self.nav.ssr_mut(sat);
                    for class in [SsrClass::Orbit, SsrClass::Clock].iter() {
                        ssr.t0[*class as usize] = head.time;
                        ssr.udi[*class as usize] = head.udi;
                        ssr.iod[*class as usize] = head.iod;
                    }
                    ssr.iode = iode;
                    ssr.iodcrc = iodcrc;
                    ssr.deph = deph;
                    ssr.ddeph = ddeph;
                    ssr.dclk = dclk;
                    ssr.refd = head.refd;
                    ssr.update = true;
                }
                5 => {
                    let ura = get_bitu(self.frame(), i, 6) as u8;
                    i += 6;
                    let ssr = self.nav.ssr_mut(sat);
                    ssr.t0[SsrClass::Ura as usize] = head.time;
                    ssr.udi[SsrClass::Ura as usize] = head.udi;
                    ssr.iod[SsrClass::Ura as usize] = head.iod;
                    ssr.ura = ura;
                    ssr.update = true;
                }
                6 => {
                    let hrclk = f64::from(get_bits(self.frame(), i, 22)) * 1e-4;
                    i += 22;
                    let ssr = self.nav.ssr_mut(sat);
                    ssr.t0[SsrClass::HighRateClock as usize] = head.time;
                    ssr.udi[SsrClass::HighRateClock as usize] = head.udi;
                    ssr.iod[SsrClass::HighRateClock as usize] = head.iod;
                    ssr.hrclk = hrclk;
                    ssr.update = true;
                }
                7 => {
                    let nbias = get_bitu(self.frame(), i, 5) as usize;
                    i += 5;
                    let yaw_ang = get_bitu(self.frame(), i, 9) as f64 / 256.0 * 180.0 * D2R;
                    i += 9;
                    let yaw_rate =
                        f64::from(get_bits(self.frame(), i, 8)) / 8192.0 * 180.0 * D2R;
                    i += 8;
                    let mut biases = Vec::with_capacity(nbias);
                    for _ in 0..nbias {
                        let mode = get_bitu(self.frame(), i, 5) as usize;
                        i += 5;
                        let _integer_ind = get_bitu(self.frame(), i, 1);
                        i += 1;
                        let _wl_ind = get_bitu(self.frame(), i, 2);
                        i += 2;
                        let _disc = get_bitu(self.frame(), i, 4);
                        i += 4;
                        let bias = f64::from(get_bits(self.frame(), i, 20)) * 1e-4;
                        i += 20;
                        let std = get_bitu(self.frame(), i, 17) as f64 * 1e-4;
                        i += 17;
                        biases.push((mode, bias, std));
                    }
                    let table = ssr_signal_table(sys);
                    let ssr = self.nav.ssr_mut(sat);
                    ssr.t0[SsrClass::PhaseBias as usize] = head.time;
                    ssr.udi[SsrClass::PhaseBias as usize] = head.udi;
                    ssr.iod[SsrClass::PhaseBias as usize] = head.iod;
                    ssr.yaw_ang = yaw_ang;
                    ssr.yaw_rate = yaw_rate;
                    for (mode, bias, std) in biases {
                        match table.get(mode).copied().unwrap_or(Code::None) {
                            Code::None => {
                                log::warn!("rtcm3 ssr: unknown phase bias mode {}", mode)
                            }
                            code => {
                                ssr.pbias[code.number() as usize] = bias;
                                ssr.stdpb[code.number() as usize] = std as f32;
                            }
                        }
                    }
                    ssr.update = true;
                }
                _ => return Event::None,
            }
        }
        Event::SsrCorrection
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::seal_frame;
    use super::*;
    use crate::bits::{set_bits, set_bitu};
    use crate::rtcm3::Rtcm3Decoder;
    use crate::ssr::SsrClass;
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

    /// Common SSR header; returns the bit cursor after it
    fn put_head(
        buf: &mut Vec<u8>,
        msg_type: u32,
        tow: u32,
        udi_code: u32,
        iod: u32,
        with_refd: bool,
        nsat: u32,
    ) -> usize {
        let mut i = 24;
        set_bitu(buf, i, 12, msg_type);
        i += 12;
        set_bitu(buf, i, 20, tow);
        i += 20;
        set_bitu(buf, i, 4, udi_code);
        i += 4;
        set_bitu(buf, i, 1, 0); /* sync */
        i += 1;
        if with_refd {
            set_bitu(buf, i, 1, 0);
            i += 1;
        }
        set_bitu(buf, i, 4, iod);
        i += 4;
        set_bitu(buf, i, 16, 258); /* provider */
        i += 16;
        set_bitu(buf, i, 4, 1); /* solution */
        i += 4;
        set_bitu(buf, i, 6, nsat);
        i += 6;
        i
    }

    #[test]
    fn gps_orbit_then_clock_classes_stay_independent() {
        let mut dec = decoder();
        let sat = Sat::new(System::Gps, 12).unwrap();

        /* MT 1057: orbit correction for G12 */
        let mut buf = vec![0u8; 64];
        let mut i = put_head(&mut buf, 1057, 345_600, 5, 9, true, 1);
        set_bitu(&mut buf, i, 6, 12); /* prn */
        i += 6;
        set_bitu(&mut buf, i, 8, 77); /* iode */
        i += 8;
        set_bits(&mut buf, i, 22, 1234); /* radial 0.1234 m */
        i += 22;
        set_bits(&mut buf, i, 20, -250); /* along -0.1 m */
        i += 20;
        set_bits(&mut buf, i, 20, 50); /* cross 0.02 m */
        i += 20;
        set_bits(&mut buf, i, 21, 100);
        i += 21;
        set_bits(&mut buf, i, 19, -10);
        i += 19;
        set_bits(&mut buf, i, 19, 5);
        i += 19;
        let payload_len = (i + 7) / 8 - 3;
        seal_frame(&mut buf, payload_len);
        buf.truncate(3 + payload_len + 3);
        let event = feed(&mut dec, &buf);
        assert!(matches!(event, Event::SsrCorrection));

        {
            let ssr = dec.nav.ssr(sat);
            assert_eq!(ssr.iode, 77);
            assert_float_eq!(ssr.deph[0], 0.1234, abs <= 1e-9);
            assert_float_eq!(ssr.deph[1], -0.1, abs <= 1e-9);
            assert_float_eq!(ssr.ddeph[0], 1e-4, abs <= 1e-12);
            assert_eq!(ssr.iod[SsrClass::Orbit as usize], 9);
            assert_float_eq!(ssr.udi[SsrClass::Orbit as usize], 30.0, abs <= 1e-9);
        }

        /* MT 1058: clock correction; the orbit class is untouched */
        let mut buf = vec![0u8; 64];
        let mut i = put_head(&mut buf, 1058, 345_610, 2, 10, false, 1);
        set_bitu(&mut buf, i, 6, 12);
        i += 6;
        set_bits(&mut buf, i, 22, -5000); /* C0 -0.5 m */
        i += 22;
        set_bits(&mut buf, i, 21, 100);
        i += 21;
        set_bits(&mut buf, i, 27, -50);
        i += 27;
        let payload_len = (i + 7) / 8 - 3;
        seal_frame(&mut buf, payload_len);
        buf.truncate(3 + payload_len + 3);
        let event = feed(&mut dec, &buf);
        assert!(matches!(event, Event::SsrCorrection));

        let ssr = dec.nav.ssr(sat);
        assert_float_eq!(ssr.dclk[0], -0.5, abs <= 1e-9);
        assert_eq!(ssr.iod[SsrClass::Clock as usize], 10);
        assert_float_eq!(ssr.udi[SsrClass::Clock as usize], 5.0, abs <= 1e-9);
        /* orbit class kept its own reference data */
        assert_eq!(ssr.iod[SsrClass::Orbit as usize], 9);
        assert_float_eq!(ssr.deph[0], 0.1234, abs <= 1e-9);
        let dt = ssr.t0[SsrClass::Clock as usize]
            .diff(&ssr.t0[SsrClass::Orbit as usize]);
        assert_float_eq!(dt, 10.0, abs <= 1e-6);
    }

    #[test]
    fn code_bias_resolves_signal_modes() {
        let mut dec = decoder();
        let sat = Sat::new(System::Gps, 1).unwrap();

        let mut buf = vec![0u8; 64];
        let mut i = put_head(&mut buf, 1059, 345_600, 0, 3, false, 1);
        set_bitu(&mut buf, i, 6, 1);
        i += 6;
        set_bitu(&mut buf, i, 5, 2); /* two biases */
        i += 5;
        set_bitu(&mut buf, i, 5, 0); /* mode 0 = 1C */
        i += 5;
        set_bits(&mut buf, i, 14, 123); /* 1.23 m */
        i += 14;
        set_bitu(&mut buf, i, 5, 11); /* mode 11 = 2W */
        i += 5;
        set_bits(&mut buf, i, 14, -321);
        i += 14;
        let payload_len = (i + 7) / 8 - 3;
        seal_frame(&mut buf, payload_len);
        buf.truncate(3 + payload_len + 3);

        let event = feed(&mut dec, &buf);
        assert!(matches!(event, Event::SsrCorrection));
        let ssr = dec.nav.ssr(sat);
        assert_float_eq!(
            f64::from(ssr.cbias[Code::L1C.number() as usize]),
            1.23,
            abs <= 1e-6
        );
        assert_float_eq!(
            f64::from(ssr.cbias[Code::L2W.number() as usize]),
            -3.21,
            abs <= 1e-6
        );
    }

    #[test]
    fn igs_envelope_maps_subtypes() {
        let mut dec = decoder();
        let sat = Sat::new(System::Gps, 30).unwrap();

        /* IGS 4076 subtype 22: GPS clock */
        let mut buf = vec![0u8; 64];
        let mut i = 24;
        set_bitu(&mut buf, i, 12, 4076);
        i += 12;
        set_bitu(&mut buf, i, 3, 1); /* version */
        i += 3;
        set_bitu(&mut buf, i, 8, 22); /* subtype */
        i += 8;
        set_bitu(&mut buf, i, 20, 345_600);
        i += 20;
        set_bitu(&mut buf, i, 4, 0);
        i += 4;
        set_bitu(&mut buf, i, 1, 0); /* sync */
        i += 1;
        set_bitu(&mut buf, i, 4, 6); /* iod ssr */
        i += 4;
        set_bitu(&mut buf, i, 16, 10);
        i += 16;
        set_bitu(&mut buf, i, 4, 0);
        i += 4;
        set_bitu(&mut buf, i, 6, 1); /* nsat */
        i += 6;
        set_bitu(&mut buf, i, 6, 30);
        i += 6;
        set_bits(&mut buf, i, 22, 777);
        i += 22;
        set_bits(&mut buf, i, 21, 0);
        i += 21;
        set_bits(&mut buf, i, 27, 0);
        i += 27;
        let payload_len = (i + 7) / 8 - 3;
        seal_frame(&mut buf, payload_len);
        buf.truncate(3 + payload_len + 3);

        let event = feed(&mut dec, &buf);
        assert!(matches!(event, Event::SsrCorrection));
        let ssr = dec.nav.ssr(sat);
        assert_float_eq!(ssr.dclk[0], 0.0777, abs <= 1e-9);
        assert_eq!(ssr.iod[SsrClass::Clock as usize], 6);
    }
}
