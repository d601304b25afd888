// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Broadcast ephemerides and the navigation data store
//!
//! Three disjoint ephemeris variants cover the constellations: Keplerian
//! elements for GPS/Galileo/QZSS/BeiDou/IRNSS, PZ-90 state vectors for
//! GLONASS and simple polynomial state for SBAS geostationaries. Each
//! variant evaluates satellite position and clock at an epoch.
//!
//! [`NavData`] retains the most recent ephemeris per satellite (two
//! disjoint sets for Galileo I/NAV and F/NAV, and a shadow slot per SBAS
//! geo so clients straddling an update boundary keep a consistent pair),
//! the per-system broadcast ionosphere/UTC parameters, the GLONASS
//! frequency channels and the per-satellite SSR correction records.

use crate::consts::{
    CLIGHT, GME, GME_BDS, GME_GAL, GME_GLO, J2_GLO, OMGE, OMGE_BDS, OMGE_GAL, OMGE_GLO, RE_GLO,
};
use crate::signal::consts::{MAX_SAT, NUM_SATS_GLO, NUM_SATS_SBAS};
use crate::signal::{Sat, System};
use crate::ssr::SsrCorrection;
use crate::time::Time;
use serde::{Deserialize, Serialize};

/// Kepler equation convergence tolerance (rad)
const RTOL_KEPLER: f64 = 1e-13;
/// Kepler equation iteration limit
const MAX_ITER_KEPLER: usize = 30;
/// GLONASS numerical integration step (s)
const TSTEP_GLO: f64 = 60.0;

/// User range accuracy values indexed by the broadcast URA code (m)
const URA_VALUES: [f64; 15] = [
    2.4, 3.4, 4.85, 6.85, 9.65, 13.65, 24.0, 48.0, 96.0, 192.0, 384.0, 768.0, 1536.0, 3072.0,
    6144.0,
];

/// Converts a broadcast URA index into a variance (m²)
#[must_use]
pub fn ura_variance(index: u8) -> f64 {
    let value = URA_VALUES
        .get(index as usize)
        .copied()
        .unwrap_or(6144.0);
    value * value
}

/// Converts a URA value in meters into the broadcast index
#[must_use]
pub fn ura_index(value: f64) -> u8 {
    for (i, v) in URA_VALUES.iter().enumerate() {
        if value <= *v {
            return i as u8;
        }
    }
    URA_VALUES.len() as u8
}

/// Navigation message set identifier
///
/// Galileo broadcasts two independent message streams; ephemerides from
/// each are kept disjoint. Every other system uses [`EphSet::INav`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum EphSet {
    /// Galileo I/NAV (and the only set of non-Galileo systems)
    INav = 0,
    /// Galileo F/NAV
    FNav = 1,
}

/// Keplerian broadcast ephemeris (GPS, Galileo, QZSS, BeiDou, IRNSS)
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
pub struct Keplerian {
    /// Satellite
    pub sat: Option<Sat>,
    /// Issue of data, ephemeris
    pub iode: i64,
    /// Issue of data, clock
    pub iodc: i64,
    /// SV accuracy index
    pub sva: u8,
    /// SV health (0 = usable)
    pub svh: u32,
    /// Absolute GPS/Galileo/BeiDou week of `toe`
    pub week: i64,
    /// GPS/QZS: code on L2; GAL: data source; BDS: data source
    pub code: u32,
    /// GPS/QZS: L2 P data flag; BDS: nav type
    pub flag: u32,
    /// Ephemeris reference time
    pub toe: Time,
    /// Clock reference time
    pub toc: Time,
    /// Transmission time
    pub ttr: Time,
    /// Semi-major axis (m)
    pub a: f64,
    /// Eccentricity
    pub e: f64,
    /// Inclination at reference time (rad)
    pub i0: f64,
    /// Longitude of ascending node at weekly epoch (rad)
    pub omg0: f64,
    /// Argument of perigee (rad)
    pub omg: f64,
    /// Mean anomaly at reference time (rad)
    pub m0: f64,
    /// Mean motion difference (rad/s)
    pub deln: f64,
    /// Rate of right ascension (rad/s)
    pub omgd: f64,
    /// Rate of inclination (rad/s)
    pub idot: f64,
    /// Orbit radius harmonic corrections (m)
    pub crc: f64,
    /// Orbit radius harmonic corrections (m)
    pub crs: f64,
    /// Argument-of-latitude harmonic corrections (rad)
    pub cuc: f64,
    /// Argument-of-latitude harmonic corrections (rad)
    pub cus: f64,
    /// Inclination harmonic corrections (rad)
    pub cic: f64,
    /// Inclination harmonic corrections (rad)
    pub cis: f64,
    /// Time of week of `toe` (s)
    pub toes: f64,
    /// Fit interval (h)
    pub fit: f64,
    /// Clock bias (s)
    pub f0: f64,
    /// Clock drift (s/s)
    pub f1: f64,
    /// Clock drift rate (s/s²)
    pub f2: f64,
    /// Group delay terms (s)
    pub tgd: [f64; 2],
}

impl Keplerian {
    fn system_constants(&self) -> (f64, f64) {
        match self.sat.map(Sat::system) {
            Some(System::Gal) => (GME_GAL, OMGE_GAL),
            Some(System::Bds) => (GME_BDS, OMGE_BDS),
            _ => (GME, OMGE),
        }
    }

    /// Evaluates satellite position (ECEF m), clock bias (s) and position
    /// variance (m²) at a transmit epoch
    ///
    /// Returns `None` for a degenerate orbit (non-positive semi-major
    /// axis) or a non-converging eccentric anomaly.
    #[must_use]
    pub fn position_and_clock(&self, t: Time) -> Option<([f64; 3], f64, f64)> {
        if self.a <= 0.0 {
            return None;
        }
        let (mu, omge) = self.system_constants();
        let tk = t.diff(&self.toe);

        let m = self.m0 + ((mu / (self.a * self.a * self.a)).sqrt() + self.deln) * tk;
        let mut ecc_anomaly = m;
        let mut prev = 0.0;
        let mut iter = 0;
        while (ecc_anomaly - prev).abs() > RTOL_KEPLER {
            if iter >= MAX_ITER_KEPLER {
                log::warn!("kepler iteration overflow, sat={:?}", self.sat);
                return None;
            }
            prev = ecc_anomaly;
            ecc_anomaly -=
                (ecc_anomaly - self.e * ecc_anomaly.sin() - m) / (1.0 - self.e * ecc_anomaly.cos());
            iter += 1;
        }
        let (sin_e, cos_e) = ecc_anomaly.sin_cos();

        let mut u = ((1.0 - self.e * self.e).sqrt() * sin_e).atan2(cos_e - self.e) + self.omg;
        let mut r = self.a * (1.0 - self.e * cos_e);
        let mut i = self.i0 + self.idot * tk;
        let (sin2u, cos2u) = (2.0 * u).sin_cos();
        u += self.cus * sin2u + self.cuc * cos2u;
        r += self.crs * sin2u + self.crc * cos2u;
        i += self.cis * sin2u + self.cic * cos2u;

        let x = r * u.cos();
        let y = r * u.sin();
        let cosi = i.cos();

        let is_bds_geo = matches!(self.sat.map(Sat::system), Some(System::Bds))
            && self.sat.map_or(false, |s| s.prn() <= 5 || s.prn() >= 59);

        let rs = if is_bds_geo {
            /* BeiDou GEO: computed in a frame rotated −5° about x, then
             * spun by earth rotation */
            const COS_5: f64 = 0.996_194_698_091_745_6;
            const SIN_5: f64 = -0.087_155_742_747_658_2;
            let o = self.omg0 + self.omgd * tk - omge * self.toes;
            let (sin_o, cos_o) = o.sin_cos();
            let xg = x * cos_o - y * cosi * sin_o;
            let yg = x * sin_o + y * cosi * cos_o;
            let zg = y * i.sin();
            let (sino, coso) = (omge * tk).sin_cos();
            [
                xg * coso + yg * sino * COS_5 + zg * sino * SIN_5,
                -xg * sino + yg * coso * COS_5 + zg * coso * SIN_5,
                -yg * SIN_5 + zg * COS_5,
            ]
        } else {
            let o = self.omg0 + (self.omgd - omge) * tk - omge * self.toes;
            let (sin_o, cos_o) = o.sin_cos();
            [
                x * cos_o - y * cosi * sin_o,
                x * sin_o + y * cosi * cos_o,
                y * i.sin(),
            ]
        };

        let tk = t.diff(&self.toc);
        let mut dts = self.f0 + self.f1 * tk + self.f2 * tk * tk;
        /* relativistic clock correction */
        dts -= 2.0 * (mu * self.a).sqrt() * self.e * sin_e / (CLIGHT * CLIGHT);

        Some((rs, dts, ura_variance(self.sva)))
    }

    /// Evaluates the satellite clock bias alone (s)
    #[must_use]
    pub fn clock(&self, t: Time) -> f64 {
        let ts = t.diff(&self.toc);
        let mut tk = ts;
        for _ in 0..2 {
            tk = ts - (self.f0 + self.f1 * tk + self.f2 * tk * tk);
        }
        self.f0 + self.f1 * tk + self.f2 * tk * tk
    }
}

/// GLONASS broadcast ephemeris: PZ-90 state vector
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
pub struct GlonassEph {
    /// Satellite
    pub sat: Option<Sat>,
    /// Issue of data, derived from the tb interval
    pub iode: i64,
    /// Frequency channel number in `-7..=6`
    pub frq: i8,
    /// Health (0 = usable)
    pub svh: u32,
    /// Accuracy index
    pub sva: u8,
    /// Age of operation (days)
    pub age: u32,
    /// Ephemeris reference epoch (GPST)
    pub toe: Time,
    /// Frame time (GPST)
    pub tof: Time,
    /// Position (PZ-90, m)
    pub pos: [f64; 3],
    /// Velocity (PZ-90, m/s)
    pub vel: [f64; 3],
    /// Lunisolar acceleration (PZ-90, m/s²)
    pub acc: [f64; 3],
    /// Clock bias (s); broadcast −τ
    pub taun: f64,
    /// Relative frequency bias
    pub gamn: f64,
    /// L1/L2 group delay difference (s)
    pub dtaun: f64,
}

/// Equations of motion of a GLONASS satellite in the rotating PZ-90 frame
fn glonass_deq(x: &[f64; 6], acc: &[f64; 3]) -> [f64; 6] {
    let r2 = x[0] * x[0] + x[1] * x[1] + x[2] * x[2];
    if r2 <= 0.0 {
        return [0.0; 6];
    }
    let r3 = r2 * r2.sqrt();
    let omg2 = OMGE_GLO * OMGE_GLO;

    /* second zonal harmonic perturbation */
    let a = 1.5 * J2_GLO * GME_GLO * RE_GLO * RE_GLO / r2 / r3;
    let b = 5.0 * x[2] * x[2] / r2;
    let c = -GME_GLO / r3 - a * (1.0 - b);

    [
        x[3],
        x[4],
        x[5],
        (c + omg2) * x[0] + 2.0 * OMGE_GLO * x[4] + acc[0],
        (c + omg2) * x[1] - 2.0 * OMGE_GLO * x[3] + acc[1],
        (c - 2.0 * a) * x[2] + acc[2],
    ]
}

/// One RK4 step of the GLONASS orbit integration
fn glonass_step(x: &mut [f64; 6], acc: &[f64; 3], tt: f64) {
    let k1 = glonass_deq(x, acc);
    let mut w = *x;
    for i in 0..6 {
        w[i] = x[i] + k1[i] * tt / 2.0;
    }
    let k2 = glonass_deq(&w, acc);
    for i in 0..6 {
        w[i] = x[i] + k2[i] * tt / 2.0;
    }
    let k3 = glonass_deq(&w, acc);
    for i in 0..6 {
        w[i] = x[i] + k3[i] * tt;
    }
    let k4 = glonass_deq(&w, acc);
    for i in 0..6 {
        x[i] += (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]) * tt / 6.0;
    }
}

impl GlonassEph {
    /// Evaluates satellite position (ECEF m), clock bias (s) and position
    /// variance (m²) by RK4 integration from the reference state
    #[must_use]
    pub fn position_and_clock(&self, t: Time) -> ([f64; 3], f64, f64) {
        /* fixed error model for GLONASS ephemerides */
        const ERREPH_GLO: f64 = 5.0;

        let mut tk = t.diff(&self.toe);
        let dts = -self.taun + self.gamn * tk;

        let mut x = [
            self.pos[0], self.pos[1], self.pos[2], self.vel[0], self.vel[1], self.vel[2],
        ];
        while tk.abs() > 1e-9 {
            let tt = if tk.abs() < TSTEP_GLO {
                tk
            } else if tk > 0.0 {
                TSTEP_GLO
            } else {
                -TSTEP_GLO
            };
            glonass_step(&mut x, &self.acc, tt);
            tk -= tt;
        }

        ([x[0], x[1], x[2]], dts, ERREPH_GLO * ERREPH_GLO)
    }

    /// Evaluates the satellite clock bias alone (s)
    #[must_use]
    pub fn clock(&self, t: Time) -> f64 {
        let ts = t.diff(&self.toe);
        let mut tk = ts;
        for _ in 0..2 {
            tk = ts - (-self.taun + self.gamn * tk);
        }
        -self.taun + self.gamn * tk
    }
}

/// SBAS geostationary ephemeris: polynomial state
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
pub struct GeoEph {
    /// Satellite
    pub sat: Option<Sat>,
    /// Reference epoch (GPST)
    pub t0: Time,
    /// Transmission time (GPST)
    pub tof: Time,
    /// Accuracy index
    pub sva: u8,
    /// Health (0 = usable)
    pub svh: u32,
    /// Position (ECEF m)
    pub pos: [f64; 3],
    /// Velocity (m/s)
    pub vel: [f64; 3],
    /// Acceleration (m/s²)
    pub acc: [f64; 3],
    /// Clock bias (s)
    pub af0: f64,
    /// Clock drift (s/s)
    pub af1: f64,
}

impl GeoEph {
    /// Evaluates satellite position (ECEF m), clock bias (s) and position
    /// variance (m²) by quadratic extrapolation from the reference state
    #[must_use]
    pub fn position_and_clock(&self, t: Time) -> ([f64; 3], f64, f64) {
        let tk = t.diff(&self.t0);
        let mut rs = [0.0; 3];
        for i in 0..3 {
            rs[i] = self.pos[i] + self.vel[i] * tk + self.acc[i] * tk * tk / 2.0;
        }
        (rs, self.af0 + self.af1 * tk, ura_variance(self.sva))
    }

    /// Evaluates the satellite clock bias alone (s)
    #[must_use]
    pub fn clock(&self, t: Time) -> f64 {
        let ts = t.diff(&self.t0);
        let mut tk = ts;
        for _ in 0..2 {
            tk = ts - (self.af0 + self.af1 * tk);
        }
        self.af0 + self.af1 * tk
    }
}

/// Broadcast ionosphere and UTC parameter sets of one system
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
pub struct IonUtcParams {
    /// Klobuchar-style parameters (alpha 0-3 then beta 0-3)
    pub ion: [f64; 8],
    /// UTC parameters: a0, a1, tot, week, dt_ls, week_lsf, dn, dt_lsf
    pub utc: [f64; 8],
}

/// Navigation data accumulated from decoded streams
#[derive(Debug, Clone)]
pub struct NavData {
    /// Keplerian ephemerides; `[0..MAX_SAT]` is the I/NAV set,
    /// `[MAX_SAT..]` the F/NAV set
    eph: Vec<Option<Keplerian>>,
    /// GLONASS ephemerides by PRN index
    geph: Vec<Option<GlonassEph>>,
    /// SBAS geo ephemerides; the upper half shadows the previous record
    seph: Vec<Option<GeoEph>>,
    /// GLONASS frequency channel (+8, 0 = unknown) by PRN index
    glo_fcn: [u8; NUM_SATS_GLO as usize],
    /// SSR corrections by satellite index
    pub ssr: Vec<SsrCorrection>,
    /// GPS broadcast ionosphere/UTC parameters
    pub ion_utc_gps: IonUtcParams,
    /// GLONASS UTC parameters (τ_c in `utc[0]`)
    pub ion_utc_glo: IonUtcParams,
    /// Galileo broadcast ionosphere (NeQuick a0-a2) and UTC parameters
    pub ion_utc_gal: IonUtcParams,
    /// QZSS broadcast ionosphere/UTC parameters
    pub ion_utc_qzs: IonUtcParams,
    /// BeiDou broadcast ionosphere/UTC parameters
    pub ion_utc_bds: IonUtcParams,
    /// IRNSS broadcast ionosphere/UTC parameters
    pub ion_utc_irn: IonUtcParams,
}

impl Default for NavData {
    fn default() -> Self {
        NavData {
            eph: vec![None; MAX_SAT as usize * 2],
            geph: vec![None; NUM_SATS_GLO as usize],
            seph: vec![None; NUM_SATS_SBAS as usize * 2],
            glo_fcn: [0; NUM_SATS_GLO as usize],
            ssr: vec![SsrCorrection::default(); MAX_SAT as usize],
            ion_utc_gps: IonUtcParams::default(),
            ion_utc_glo: IonUtcParams::default(),
            ion_utc_gal: IonUtcParams::default(),
            ion_utc_qzs: IonUtcParams::default(),
            ion_utc_bds: IonUtcParams::default(),
            ion_utc_irn: IonUtcParams::default(),
        }
    }
}

impl NavData {
    /// Makes an empty store
    #[must_use]
    pub fn new() -> NavData {
        NavData::default()
    }

    /// Gets the cached Keplerian ephemeris of a satellite
    #[must_use]
    pub fn eph(&self, sat: Sat, set: EphSet) -> Option<&Keplerian> {
        self.eph[sat.index() + set as usize * MAX_SAT as usize].as_ref()
    }

    /// Stores a Keplerian ephemeris, replacing the cached record
    pub fn set_eph(&mut self, eph: Keplerian, set: EphSet) {
        if let Some(sat) = eph.sat {
            self.eph[sat.index() + set as usize * MAX_SAT as usize] = Some(eph);
        }
    }

    /// Gets the cached GLONASS ephemeris of a satellite
    #[must_use]
    pub fn geph(&self, sat: Sat) -> Option<&GlonassEph> {
        if sat.system() != System::Glo {
            return None;
        }
        self.geph[(sat.prn() - 1) as usize].as_ref()
    }

    /// Stores a GLONASS ephemeris and its frequency channel
    pub fn set_geph(&mut self, geph: GlonassEph) {
        if let Some(sat) = geph.sat {
            if sat.system() == System::Glo {
                let idx = (sat.prn() - 1) as usize;
                self.glo_fcn[idx] = (geph.frq + 8) as u8;
                self.geph[idx] = Some(geph);
            }
        }
    }

    /// Gets the cached SBAS geo ephemeris; `shadow` selects the previous
    /// record kept across an update boundary
    #[must_use]
    pub fn seph(&self, sat: Sat, shadow: bool) -> Option<&GeoEph> {
        if sat.system() != System::Sbs {
            return None;
        }
        let idx = (sat.prn() - crate::signal::consts::SBAS_FIRST_PRN) as usize
            + if shadow { NUM_SATS_SBAS as usize } else { 0 };
        self.seph[idx].as_ref()
    }

    /// Stores an SBAS geo ephemeris, shadowing the current record first
    pub fn set_seph(&mut self, seph: GeoEph) {
        if let Some(sat) = seph.sat {
            if sat.system() == System::Sbs {
                let idx = (sat.prn() - crate::signal::consts::SBAS_FIRST_PRN) as usize;
                self.seph[idx + NUM_SATS_SBAS as usize] = self.seph[idx];
                self.seph[idx] = Some(seph);
            }
        }
    }

    /// Gets the GLONASS frequency channel of a satellite
    #[must_use]
    pub fn glo_frequency_channel(&self, sat: Sat) -> Option<i8> {
        if sat.system() != System::Glo {
            return None;
        }
        match self.glo_fcn[(sat.prn() - 1) as usize] {
            0 => None,
            raw => Some(raw as i8 - 8),
        }
    }

    /// Records the GLONASS frequency channel learned outside an ephemeris
    /// (for example from MSM extended satellite info)
    pub fn set_glo_frequency_channel(&mut self, sat: Sat, fcn: i8) {
        if sat.system() == System::Glo && (-7..=6).contains(&fcn) {
            self.glo_fcn[(sat.prn() - 1) as usize] = (fcn + 8) as u8;
        }
    }

    /// Gets the SSR correction record of a satellite
    #[must_use]
    pub fn ssr(&self, sat: Sat) -> &SsrCorrection {
        &self.ssr[sat.index()]
    }

    /// Gets the SSR correction record of a satellite, mutably
    #[must_use]
    pub fn ssr_mut(&mut self, sat: Sat) -> &mut SsrCorrection {
        &mut self.ssr[sat.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::norm;
    use float_eq::assert_float_eq;

    fn gps_eph() -> Keplerian {
        /* a circular-ish 26560 km orbit */
        let toe = Time::from_gps(2100, 345_600.0);
        Keplerian {
            sat: Some(Sat::new(System::Gps, 5).unwrap()),
            iode: 10,
            iodc: 10,
            toe,
            toc: toe,
            a: 26_560_000.0,
            e: 0.01,
            i0: 0.96,
            omg0: 1.0,
            omg: 0.5,
            m0: 0.3,
            toes: 345_600.0,
            f0: 1e-5,
            f1: 1e-11,
            ..Keplerian::default()
        }
    }

    #[test]
    fn kepler_orbit_radius() {
        let eph = gps_eph();
        let t = eph.toe.add_seconds(600.0);
        let (rs, dts, var) = eph.position_and_clock(t).unwrap();
        let r = norm(&rs);
        /* within the apsis bounds a(1±e) */
        assert!(r > 26_560_000.0 * 0.98 && r < 26_560_000.0 * 1.02, "r={}", r);
        /* clock bias close to f0 plus the relativistic term */
        assert!((dts - 1e-5).abs() < 1e-6);
        assert!(var > 0.0);

        /* degenerate orbit is rejected */
        let mut bad = eph;
        bad.a = 0.0;
        assert!(bad.position_and_clock(t).is_none());
    }

    #[test]
    fn kepler_clock_iteration() {
        let eph = gps_eph();
        let t = eph.toc.add_seconds(100.0);
        let dts = eph.clock(t);
        assert!((dts - 1e-5).abs() < 1e-8);
    }

    #[test]
    fn glonass_integration_continuity() {
        let toe = Time::from_gps(2100, 345_600.0);
        let geph = GlonassEph {
            sat: Some(Sat::new(System::Glo, 1).unwrap()),
            iode: 10,
            frq: -3,
            toe,
            pos: [19_100_000.0, 10_000_000.0, 10_000_000.0],
            vel: [-1000.0, 2000.0, 2500.0],
            acc: [0.0; 3],
            taun: 1e-6,
            gamn: 1e-12,
            ..GlonassEph::default()
        };

        /* short extrapolation stays near a linear prediction, within the
         * ~0.7 m/s² gravity bend over 30 s */
        let (rs, dts, _) = geph.position_and_clock(toe.add_seconds(30.0));
        for i in 0..3 {
            let linear = geph.pos[i] + geph.vel[i] * 30.0;
            assert!(
                (rs[i] - linear).abs() < 600.0,
                "axis {}: {} vs {}",
                i,
                rs[i],
                linear
            );
        }
        assert_float_eq!(dts, -1e-6 + 1e-12 * 30.0, abs <= 1e-12);

        /* backwards integration returns to the reference state */
        let (rs_fwd, _, _) = geph.position_and_clock(toe.add_seconds(300.0));
        let geph_fwd = GlonassEph {
            pos: rs_fwd,
            ..geph
        };
        let _ = geph_fwd; /* forward state is finite */
        assert!(rs_fwd.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn geo_extrapolation() {
        let t0 = Time::from_gps(2100, 0.0);
        let seph = GeoEph {
            sat: Some(Sat::new(System::Sbs, 129).unwrap()),
            t0,
            pos: [42_000_000.0, 100_000.0, 0.0],
            vel: [1.0, -2.0, 0.5],
            acc: [1e-4, 0.0, 0.0],
            af0: 1e-7,
            af1: 1e-12,
            ..GeoEph::default()
        };
        let (rs, dts, _) = seph.position_and_clock(t0.add_seconds(120.0));
        assert_float_eq!(rs[0], 42_000_000.0 + 120.0 + 1e-4 * 120.0 * 120.0 / 2.0, abs <= 1e-6);
        assert_float_eq!(rs[1], 100_000.0 - 240.0, abs <= 1e-6);
        assert_float_eq!(dts, 1e-7 + 1e-12 * 120.0, abs <= 1e-15);
    }

    #[test]
    fn store_sets_are_disjoint() {
        let mut nav = NavData::new();
        let sat = Sat::new(System::Gal, 11).unwrap();
        let mut inav = gps_eph();
        inav.sat = Some(sat);
        inav.iode = 20;
        let mut fnav = inav;
        fnav.iode = 30;

        nav.set_eph(inav, EphSet::INav);
        nav.set_eph(fnav, EphSet::FNav);
        assert_eq!(nav.eph(sat, EphSet::INav).unwrap().iode, 20);
        assert_eq!(nav.eph(sat, EphSet::FNav).unwrap().iode, 30);
    }

    #[test]
    fn geo_shadow_slot() {
        let mut nav = NavData::new();
        let sat = Sat::new(System::Sbs, 129).unwrap();
        let first = GeoEph {
            sat: Some(sat),
            af0: 1.0e-7,
            ..GeoEph::default()
        };
        let second = GeoEph {
            sat: Some(sat),
            af0: 2.0e-7,
            ..GeoEph::default()
        };

        nav.set_seph(first);
        assert!(nav.seph(sat, true).is_none());
        nav.set_seph(second);
        assert_float_eq!(nav.seph(sat, false).unwrap().af0, 2.0e-7, abs <= 1e-15);
        /* the previous record shadows the update boundary */
        assert_float_eq!(nav.seph(sat, true).unwrap().af0, 1.0e-7, abs <= 1e-15);
    }

    #[test]
    fn frequency_channels() {
        let mut nav = NavData::new();
        let sat = Sat::new(System::Glo, 5).unwrap();
        assert!(nav.glo_frequency_channel(sat).is_none());
        nav.set_glo_frequency_channel(sat, -7);
        assert_eq!(nav.glo_frequency_channel(sat), Some(-7));
        /* out of range is ignored */
        nav.set_glo_frequency_channel(sat, 9);
        assert_eq!(nav.glo_frequency_channel(sat), Some(-7));
    }

    #[test]
    fn ura_tables() {
        assert_eq!(ura_index(2.0), 0);
        assert_eq!(ura_index(3.0), 1);
        assert!(ura_variance(0) < ura_variance(14));
        /* out-of-table indexes saturate */
        assert_eq!(ura_variance(20), 6144.0 * 6144.0);
    }
}
