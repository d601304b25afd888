// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! RTCM 3 Multiple Signal Messages
//!
//! An MSM packs an nsat × nsig cell matrix of observables. The header
//! carries satellite and signal masks plus the cell mask; per-satellite
//! fields give the rough range (integer milliseconds and a fractional
//! part), per-cell fields the fine pseudorange/phase offsets, lock,
//! half-cycle and C/N₀. MSM 4/5/6/7 are decoded; 1-3 carry no full
//! pseudoranges and are counted only.
//!
//! Every field uses the most negative code as an "unavailable" sentinel.
//! Cell signals resolve through fixed per-constellation signal tables to
//! observation codes; the output frequency slot is chosen by the code
//! priority tables, with spill-over into the extended slots.

use crate::bits::{get_bits, get_bitu};
use crate::consts::{CLIGHT, P2_10, P2_24, P2_29, P2_31};
use crate::decoder::Event;
use crate::obs::{LLI_HALF_CYCLE, LLI_SLIP};
use crate::signal::consts::{NUM_FREQ, NUM_OBS_SLOTS};
use crate::signal::{Code, Sat, System};

/// One millisecond of range (m)
const RANGE_MS: f64 = CLIGHT * 0.001;

/// MSM signal number to observation designator, GPS
const MSM_SIG_GPS: [&str; 32] = [
    "", "1C", "1P", "1W", "", "", "", "2C", "2P", "2W", "", "", //
    "", "", "2S", "2L", "2X", "", "", "", "", "5I", "5Q", "5X", //
    "", "", "", "", "", "1S", "1L", "1X",
];
/// MSM signal number to observation designator, GLONASS
const MSM_SIG_GLO: [&str; 32] = [
    "", "1C", "1P", "", "", "", "", "2C", "2P", "", "3I", "3Q", //
    "3X", "", "", "", "", "", "", "", "", "", "", "", //
    "", "", "", "", "", "", "", "",
];
/// MSM signal number to observation designator, Galileo
const MSM_SIG_GAL: [&str; 32] = [
    "", "1C", "1A", "1B", "1X", "1Z", "", "6C", "6A", "6B", "6X", "6Z", //
    "", "7I", "7Q", "7X", "", "8I", "8Q", "8X", "", "5I", "5Q", "5X", //
    "", "", "", "", "", "", "", "",
];
/// MSM signal number to observation designator, SBAS
const MSM_SIG_SBS: [&str; 32] = [
    "", "1C", "", "", "", "", "", "", "", "", "", "", //
    "", "", "", "", "", "", "", "", "", "5I", "5Q", "5X", //
    "", "", "", "", "", "", "", "",
];
/// MSM signal number to observation designator, QZSS
const MSM_SIG_QZS: [&str; 32] = [
    "", "1C", "", "", "", "", "", "", "", "6S", "6L", "6X", //
    "", "", "2S", "2L", "2X", "", "", "", "", "5I", "5Q", "5X", //
    "", "", "", "", "", "1S", "1L", "1X",
];
/// MSM signal number to observation designator, BeiDou
const MSM_SIG_BDS: [&str; 32] = [
    "", "2I", "2Q", "2X", "", "", "", "6I", "6Q", "6X", "", "", //
    "", "7I", "7Q", "7X", "", "", "", "", "", "5D", "5P", "5X", //
    "7D", "", "", "", "", "1D", "1P", "1X",
];
/// MSM signal number to observation designator, IRNSS
const MSM_SIG_IRN: [&str; 32] = [
    "", "", "", "", "", "", "", "", "", "", "", "", //
    "", "", "", "", "", "", "", "", "", "5A", "", "", //
    "", "", "", "", "", "", "", "",
];

fn msm_signal_table(sys: System) -> &'static [&'static str; 32] {
    match sys {
        System::Gps | System::Leo => &MSM_SIG_GPS,
        System::Glo => &MSM_SIG_GLO,
        System::Gal => &MSM_SIG_GAL,
        System::Sbs => &MSM_SIG_SBS,
        System::Qzs => &MSM_SIG_QZS,
        System::Bds => &MSM_SIG_BDS,
        System::Irn => &MSM_SIG_IRN,
    }
}

/// Decoded MSM header
struct MsmHeader {
    time: crate::time::Time,
    sync: bool,
    sats: Vec<u8>,
    sigs: Vec<usize>,
    cell_mask: Vec<bool>,
}

/// Per-satellite rough observables
#[derive(Default, Clone, Copy)]
struct SatFields {
    range: f64,
    rate: f64,
    ex_info: Option<u8>,
}

/// Per-cell fine observables
#[derive(Default, Clone, Copy)]
struct CellFields {
    pseudorange: f64,
    phase: f64,
    lock: u16,
    half: bool,
    cnr: f64,
    rate: f64,
}

impl super::Rtcm3Decoder {
    /// Dispatch of one MSM message (`msm` is the sub-number 1..=7)
    pub(crate) fn decode_msm(&mut self, sys: System, msm: u16) -> Event {
        match msm {
            4 | 5 | 6 | 7 => self.decode_msm_body(sys, msm),
            1 | 2 | 3 => {
                log::debug!("rtcm3 msm{}: not supported", msm);
                Event::None
            }
            _ => Event::None,
        }
    }

    fn decode_msm_header(&mut self, sys: System) -> Option<(MsmHeader, usize)> {
        let payload_bits = self.payload_bits();
        let buf = self.frame();
        let mut i = 24 + 12;
        let _staid = get_bitu(buf, i, 12);
        i += 12;

        if i + 30 > payload_bits {
            return None;
        }
        let raw_time = if sys == System::Glo {
            let _dow = get_bitu(buf, i, 3);
            get_bitu(buf, i + 3, 27) as f64 * 0.001
        } else {
            let mut tow = get_bitu(buf, i, 30) as f64 * 0.001;
            if sys == System::Bds {
                /* BDT -> GPST */
                tow += 14.0;
            }
            tow
        };
        i += 30;

        let sync = get_bitu(buf, i, 1) == 1;
        i += 1;
        let _iod = get_bitu(buf, i, 3);
        i += 3;
        i += 7 + 2 + 2 + 1 + 3; /* session, clk steering/ext, smoothing */

        let mut sats = Vec::new();
        for k in 0..64 {
            if get_bitu(buf, i + k, 1) == 1 {
                sats.push(k as u8 + 1);
            }
        }
        i += 64;
        let mut sigs = Vec::new();
        for k in 0..32 {
            if get_bitu(buf, i + k, 1) == 1 {
                sigs.push(k + 1);
            }
        }
        i += 32;

        if sats.len() * sigs.len() > 64 {
            log::warn!(
                "rtcm3 msm: cell matrix overflow nsat={} nsig={}",
                sats.len(),
                sigs.len()
            );
            return None;
        }
        let ncell = sats.len() * sigs.len();
        if i + ncell > payload_bits {
            return None;
        }
        let mut cell_mask = Vec::with_capacity(ncell);
        for k in 0..ncell {
            cell_mask.push(get_bitu(buf, i + k, 1) == 1);
        }
        i += ncell;

        let time = if sys == System::Glo {
            self.adjust_glo_tod(raw_time)
        } else {
            self.adjust_gps_tow(raw_time)
        };
        Some((
            MsmHeader {
                time,
                sync,
                sats,
                sigs,
                cell_mask,
            },
            i,
        ))
    }

    fn decode_msm_body(&mut self, sys: System, msm: u16) -> Event {
        let (header, mut i) = match self.decode_msm_header(sys) {
            Some(parsed) => parsed,
            None => {
                self.error_count += 1;
                return Event::Error;
            }
        };
        let nsat = header.sats.len();
        let ncell = header.cell_mask.iter().filter(|c| **c).count();
        let has_extended = msm == 5 || msm == 7;
        let high_res = msm == 6 || msm == 7;

        /* field widths per flavor */
        let sat_bits = 8 + if has_extended { 4 + 10 + 14 } else { 10 };
        let cell_bits = if high_res { 20 + 24 + 10 + 1 + 10 } else { 15 + 22 + 4 + 1 + 6 }
            + if has_extended { 15 } else { 0 };
        if i + nsat * sat_bits + ncell * cell_bits > self.payload_bits() {
            log::warn!("rtcm3 msm{}: length error", msm);
            self.error_count += 1;
            return Event::Error;
        }

        let buf = self.frame();

        /* per-satellite blocks, field-major order */
        let mut sat_fields = vec![SatFields::default(); nsat];
        for f in sat_fields.iter_mut() {
            let rng = get_bitu(buf, i, 8);
            i += 8;
            if rng != 255 {
                f.range = rng as f64 * RANGE_MS;
            }
        }
        if has_extended {
            for f in sat_fields.iter_mut() {
                f.ex_info = Some(get_bitu(buf, i, 4) as u8);
                i += 4;
            }
        }
        for f in sat_fields.iter_mut() {
            let rng_m = get_bitu(buf, i, 10);
            i += 10;
            if f.range != 0.0 {
                f.range += rng_m as f64 * P2_10 * RANGE_MS;
            }
        }
        if has_extended {
            for f in sat_fields.iter_mut() {
                let rate = get_bits(buf, i, 14);
                i += 14;
                if rate != -8192 {
                    f.rate = f64::from(rate);
                }
            }
        }

        /* per-cell blocks, field-major order */
        let mut cells = vec![CellFields::default(); ncell];
        for c in cells.iter_mut() {
            let (raw, width, sentinel, scale) = if high_res {
                (get_bits(buf, i, 20), 20, -524_288, P2_29 * RANGE_MS)
            } else {
                (get_bits(buf, i, 15), 15, -16_384, P2_24 * RANGE_MS)
            };
            i += width;
            c.pseudorange = if raw != sentinel {
                f64::from(raw) * scale
            } else {
                f64::NEG_INFINITY
            };
        }
        for c in cells.iter_mut() {
            let (raw, width, sentinel, scale) = if high_res {
                (get_bits(buf, i, 24), 24, -8_388_608, P2_31 * RANGE_MS)
            } else {
                (get_bits(buf, i, 22), 22, -2_097_152, P2_29 * RANGE_MS)
            };
            i += width;
            c.phase = if raw != sentinel {
                f64::from(raw) * scale
            } else {
                f64::NEG_INFINITY
            };
        }
        for c in cells.iter_mut() {
            let width = if high_res { 10 } else { 4 };
            c.lock = get_bitu(buf, i, width) as u16;
            i += width;
        }
        for c in cells.iter_mut() {
            c.half = get_bitu(buf, i, 1) == 1;
            i += 1;
        }
        for c in cells.iter_mut() {
            if high_res {
                c.cnr = get_bitu(buf, i, 10) as f64 * 0.0625;
                i += 10;
            } else {
                c.cnr = get_bitu(buf, i, 6) as f64;
                i += 6;
            }
        }
        if has_extended {
            for c in cells.iter_mut() {
                let raw = get_bits(buf, i, 15);
                i += 15;
                if raw != -16_384 {
                    c.rate = f64::from(raw) * 0.0001;
                }
            }
        }

        self.save_msm_obs(sys, &header, &sat_fields, &cells);
        self.finish_obs(header.sync)
    }

    /// Output slot selection: the highest-priority code of each frequency
    /// keeps the primary slot, the rest spill into extended slots
    fn signal_slots(&self, sys: System, codes: &[Code]) -> Vec<Option<usize>> {
        let mut slots: Vec<Option<usize>> = vec![None; codes.len()];
        let mut best_pri = [0u8; NUM_FREQ];
        let mut best_sig: [Option<usize>; NUM_FREQ] = [None; NUM_FREQ];
        let mut extended: Vec<usize> = Vec::new();

        for (k, code) in codes.iter().enumerate() {
            if *code == Code::None {
                continue;
            }
            match code.freq_index(sys) {
                Some(idx) if idx < NUM_FREQ => {
                    let pri = self.priorities.priority(sys, *code, &self.opt);
                    if pri > best_pri[idx] {
                        if let Some(loser) = best_sig[idx] {
                            extended.push(loser);
                        }
                        best_pri[idx] = pri;
                        best_sig[idx] = Some(k);
                        slots[k] = Some(idx);
                    } else {
                        extended.push(k);
                    }
                }
                _ => extended.push(k),
            }
        }
        /* spill-over */
        let mut next_ext = NUM_FREQ;
        extended.sort_unstable();
        for k in extended {
            if next_ext < NUM_OBS_SLOTS {
                slots[k] = Some(next_ext);
                next_ext += 1;
            } else {
                slots[k] = None;
            }
        }
        slots
    }

    fn save_msm_obs(
        &mut self,
        sys: System,
        header: &MsmHeader,
        sat_fields: &[SatFields],
        cells: &[CellFields],
    ) {
        let table = msm_signal_table(sys);
        let codes: Vec<Code> = header
            .sigs
            .iter()
            .map(|sig| Code::from_obs_str(table[*sig - 1]))
            .collect();
        let slots = self.signal_slots(sys, &codes);

        let mut cell = 0usize;
        for (j, raw_prn) in header.sats.iter().enumerate() {
            /* per-system PRN offsets of the satellite mask */
            let prn = match sys {
                System::Qzs => raw_prn + 192,
                System::Sbs => raw_prn + 119,
                _ => *raw_prn,
            };
            let sat = Sat::new(sys, prn).ok();
            if sat.is_none() {
                log::warn!("rtcm3 msm: invalid prn {} sys {}", prn, sys);
            }

            /* GLONASS channel: extended info when carried (values above
             * 13 mean unknown), else the cached channel */
            let fcn: Option<i8> = if sys == System::Glo {
                match sat_fields[j].ex_info {
                    Some(ex) if ex <= 13 => Some(ex as i8 - 7),
                    _ => sat.and_then(|s| self.nav.glo_frequency_channel(s)),
                }
            } else {
                Some(0)
            };
            if let (Some(s), Some(f)) = (sat, fcn) {
                if sys == System::Glo {
                    self.nav.set_glo_frequency_channel(s, f);
                }
            }

            for (k, code) in codes.iter().enumerate() {
                if !header.cell_mask[j * codes.len() + k] {
                    continue;
                }
                let c = cells[cell];
                cell += 1;

                let sat = match sat {
                    Some(sat) => sat,
                    None => continue,
                };
                let slot = match slots[k] {
                    Some(slot) => slot,
                    None => continue,
                };
                let index = match self.obs_slot(header.time, sat) {
                    Some(index) => index,
                    None => continue,
                };

                let freq = fcn.and_then(|f| code.carrier_frequency(sys, f));
                let wavelength = freq.map(|f| CLIGHT / f).unwrap_or(0.0);

                let range = sat_fields[j].range;
                let slip = self.loss_of_lock(sat, slot, c.lock);

                let obs = &mut self.obs.records_mut()[index];
                if range != 0.0 && c.pseudorange.is_finite() {
                    obs.pseudorange[slot] = range + c.pseudorange;
                }
                if range != 0.0 && c.phase.is_finite() && wavelength > 0.0 {
                    obs.carrier[slot] = (range + c.phase) / wavelength;
                }
                if wavelength > 0.0 {
                    obs.doppler[slot] = -(sat_fields[j].rate + c.rate) / wavelength;
                }
                obs.lli[slot] =
                    (if slip { LLI_SLIP } else { 0 }) | (if c.half { LLI_HALF_CYCLE } else { 0 });
                obs.snr[slot] = Self::quantize_snr(c.cnr);
                obs.code[slot] = *code;
            }
        }
    }
}
