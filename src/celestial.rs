// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Earth orientation and celestial body positions
//!
//! The ECI→ECEF transform composes IAU 1976 precession, IAU 1980 nutation
//! (the dominant terms of the series), Greenwich apparent sidereal time and
//! the polar motion / UT1−UTC parameters of an [`ErpTable`]. Sun and moon
//! positions are evaluated in ECI from compact analytic series and rotated
//! into ECEF for the tide and wide-area correction consumers.

use crate::consts::{AS2R, AU, D2R, RE_WGS84};
use crate::matrix::mat_mul;
use crate::time::Time;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Earth rotation parameter values interpolated at an epoch
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ErpValues {
    /// Pole offset x (rad)
    pub xp: f64,
    /// Pole offset y (rad)
    pub yp: f64,
    /// UT1 − UTC (s)
    pub ut1_utc: f64,
    /// Length-of-day excess (s/day)
    pub lod: f64,
}

#[derive(Debug, Copy, Clone)]
struct ErpEntry {
    mjd: f64,
    xp: f64,
    yp: f64,
    ut1_utc: f64,
    lod: f64,
}

/// A table of Earth rotation parameters read from an IGS ERP (version 2)
/// file
#[derive(Debug, Clone, Default)]
pub struct ErpTable {
    entries: Vec<ErpEntry>,
}

/// Errors raised while loading an ERP file
#[derive(Debug, thiserror::Error)]
pub enum ErpFileError {
    #[error("erp file unreadable: {0}")]
    /// The file could not be opened or read
    Io(#[from] std::io::Error),
    #[error("no erp entries found in file")]
    /// No data lines parsed
    Empty,
}

/// Modified Julian Date of a UTC time point
fn mjd_of(t: Time) -> f64 {
    /* the Unix epoch is MJD 40587 */
    40587.0 + (t.sec() as f64 + t.frac()) / 86400.0
}

impl ErpTable {
    /// Loads an IGS ERP version 2 file
    ///
    /// Data lines carry MJD, pole offsets in 10⁻⁶ arcsec and UT1−UTC /
    /// LOD in 10⁻⁷ s; header lines are skipped.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<ErpTable, ErpFileError> {
        let file = File::open(path)?;
        let mut entries = Vec::new();

        for line in BufReader::new(file).lines() {
            let line = line?;
            let fields: Vec<f64> = line
                .split_whitespace()
                .map_while(|f| f.parse().ok())
                .collect();
            if fields.len() < 5 || fields[0] < 10_000.0 {
                continue;
            }
            entries.push(ErpEntry {
                mjd: fields[0],
                xp: fields[1] * 1e-6 * AS2R,
                yp: fields[2] * 1e-6 * AS2R,
                ut1_utc: fields[3] * 1e-7,
                lod: fields[4] * 1e-7,
            });
        }
        if entries.is_empty() {
            return Err(ErpFileError::Empty);
        }
        entries.sort_by(|a, b| a.mjd.partial_cmp(&b.mjd).unwrap());
        log::info!("erp table loaded, {} entries", entries.len());
        Ok(ErpTable { entries })
    }

    /// Interpolates the parameters at a UTC time point
    ///
    /// Outside the table span the nearest entry is held constant; an empty
    /// table yields zeros, which degrades the ECI→ECEF transform
    /// gracefully rather than failing it.
    #[must_use]
    pub fn values(&self, t: Time) -> ErpValues {
        if self.entries.is_empty() {
            return ErpValues::default();
        }
        let mjd = mjd_of(t);
        let first = &self.entries[0];
        let last = &self.entries[self.entries.len() - 1];
        if mjd <= first.mjd {
            return ErpValues {
                xp: first.xp,
                yp: first.yp,
                ut1_utc: first.ut1_utc,
                lod: first.lod,
            };
        }
        if mjd >= last.mjd {
            return ErpValues {
                xp: last.xp,
                yp: last.yp,
                ut1_utc: last.ut1_utc,
                lod: last.lod,
            };
        }
        let i = self
            .entries
            .partition_point(|e| e.mjd < mjd)
            .max(1);
        let (a, b) = (&self.entries[i - 1], &self.entries[i]);
        let w = (mjd - a.mjd) / (b.mjd - a.mjd);
        ErpValues {
            xp: a.xp * (1.0 - w) + b.xp * w,
            yp: a.yp * (1.0 - w) + b.yp * w,
            ut1_utc: a.ut1_utc * (1.0 - w) + b.ut1_utc * w,
            lod: a.lod * (1.0 - w) + b.lod * w,
        }
    }
}

/// Rotation about the x axis, column-major
fn rot_x(t: f64) -> [f64; 9] {
    let (s, c) = t.sin_cos();
    [1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c]
}

/// Rotation about the y axis, column-major
fn rot_y(t: f64) -> [f64; 9] {
    let (s, c) = t.sin_cos();
    [c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c]
}

/// Rotation about the z axis, column-major
fn rot_z(t: f64) -> [f64; 9] {
    let (s, c) = t.sin_cos();
    [c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0]
}

fn mul3(a: &[f64; 9], b: &[f64; 9]) -> [f64; 9] {
    let mut c = [0.0; 9];
    mat_mul("NN", 3, 3, 3, 1.0, a, b, 0.0, &mut c);
    c
}

/// Terrestrial-time Julian centuries since J2000.0 of a UTC time point
fn tt_centuries(tutc: Time) -> f64 {
    /* 2000-01-01 12:00:00 UTC */
    let j2000 = Time::from_epoch(2000, 1, 1, 12, 0, 0.0).unwrap();
    (tutc.diff(&j2000) + 19.0 + 32.184) / 86400.0 / 36525.0
}

/// Fundamental lunisolar arguments of the IAU 1980 nutation theory (rad)
fn ast_args(t: f64) -> [f64; 5] {
    /* l, l', F, D, Omega series coefficients (deg, arcsec/century...) */
    const FC: [[f64; 5]; 5] = [
        [134.963_402_51, 1_717_915_923.2178, 31.8792, 0.051_635, -0.000_244_70],
        [357.529_109_18, 129_596_581.0481, -0.5532, 0.000_136, -0.000_011_49],
        [93.272_090_62, 1_739_527_262.8478, -12.7512, -0.001_037, 0.000_004_17],
        [297.850_195_47, 1_602_961_601.2090, -6.3706, 0.006_593, -0.000_031_69],
        [125.044_555_01, -6_962_890.2665, 7.4722, 0.007_702, -0.000_059_39],
    ];
    let tt = [t, t * t, t * t * t, t * t * t * t];
    let mut f = [0.0; 5];
    for i in 0..5 {
        f[i] = FC[i][0] * D2R;
        for j in 0..4 {
            f[i] += FC[i][j + 1] * AS2R * tt[j];
        }
        f[i] %= 2.0 * std::f64::consts::PI;
    }
    f
}

/// Dominant terms of the IAU 1980 nutation series
///
/// Columns: multipliers of (l, l', F, D, Ω), then the longitude
/// coefficients (0.1 mas, 0.1 mas/century) and obliquity coefficients.
/// The omitted tail of the 106-term series contributes below 0.3 mas,
/// well under the needs of the wide-area correction consumers.
const NUT_TERMS: [[f64; 9]; 30] = [
    [0.0, 0.0, 0.0, 0.0, 1.0, -171_996.0, -174.2, 92_025.0, 8.9],
    [0.0, 0.0, 2.0, -2.0, 2.0, -13_187.0, -1.6, 5_736.0, -3.1],
    [0.0, 0.0, 2.0, 0.0, 2.0, -2_274.0, -0.2, 977.0, -0.5],
    [0.0, 0.0, 0.0, 0.0, 2.0, 2_062.0, 0.2, -895.0, 0.5],
    [0.0, -1.0, 0.0, 0.0, 0.0, -1_426.0, 3.4, 54.0, -0.1],
    [1.0, 0.0, 0.0, 0.0, 0.0, 712.0, 0.1, -7.0, 0.0],
    [0.0, 1.0, 2.0, -2.0, 2.0, -517.0, 1.2, 224.0, -0.6],
    [0.0, 0.0, 2.0, 0.0, 1.0, -386.0, -0.4, 200.0, 0.0],
    [1.0, 0.0, 2.0, 0.0, 2.0, -301.0, 0.0, 129.0, -0.1],
    [0.0, -1.0, 2.0, -2.0, 2.0, 217.0, -0.5, -95.0, 0.3],
    [-1.0, 0.0, 0.0, 2.0, 0.0, 158.0, 0.0, -1.0, 0.0],
    [0.0, 0.0, 2.0, -2.0, 1.0, 129.0, 0.1, -70.0, 0.0],
    [-1.0, 0.0, 2.0, 0.0, 2.0, 123.0, 0.0, -53.0, 0.0],
    [1.0, 0.0, 0.0, 0.0, 1.0, 63.0, 0.1, -33.0, 0.0],
    [0.0, 0.0, 0.0, 2.0, 0.0, 63.0, 0.0, -2.0, 0.0],
    [-1.0, 0.0, 2.0, 2.0, 2.0, -59.0, 0.0, 26.0, 0.0],
    [-1.0, 0.0, 0.0, 0.0, 1.0, -58.0, -0.1, 32.0, 0.0],
    [1.0, 0.0, 2.0, 0.0, 1.0, -51.0, 0.0, 27.0, 0.0],
    [-2.0, 0.0, 0.0, 2.0, 0.0, -48.0, 0.0, 1.0, 0.0],
    [-2.0, 0.0, 2.0, 0.0, 1.0, 46.0, 0.0, -24.0, 0.0],
    [0.0, 0.0, 2.0, 2.0, 2.0, -38.0, 0.0, 16.0, 0.0],
    [2.0, 0.0, 2.0, 0.0, 2.0, -31.0, 0.0, 13.0, 0.0],
    [2.0, 0.0, 0.0, 0.0, 0.0, 29.0, 0.0, -1.0, 0.0],
    [1.0, 0.0, 2.0, -2.0, 2.0, 29.0, 0.0, -12.0, 0.0],
    [0.0, 0.0, 2.0, 0.0, 0.0, 26.0, 0.0, -1.0, 0.0],
    [0.0, 0.0, 2.0, -2.0, 0.0, -22.0, 0.0, 0.0, 0.0],
    [-1.0, 0.0, 2.0, 0.0, 1.0, 21.0, 0.0, -10.0, 0.0],
    [0.0, 2.0, 0.0, 0.0, 0.0, 17.0, -0.1, 0.0, 0.0],
    [0.0, 2.0, 2.0, -2.0, 2.0, -16.0, 0.1, 7.0, 0.0],
    [-1.0, 0.0, 0.0, 2.0, 1.0, 16.0, 0.0, -8.0, 0.0],
];

/// Evaluates nutation in longitude and obliquity (rad)
fn nutation_iau1980(t: f64, f: &[f64; 5]) -> (f64, f64) {
    let mut dpsi = 0.0;
    let mut deps = 0.0;
    for term in NUT_TERMS.iter() {
        let mut ang = 0.0;
        for j in 0..5 {
            ang += term[j] * f[j];
        }
        dpsi += (term[5] + term[6] * t) * ang.sin();
        deps += (term[7] + term[8] * t) * ang.cos();
    }
    (dpsi * 1e-4 * AS2R, deps * 1e-4 * AS2R)
}

/// Greenwich mean sidereal time of a UTC time point (rad)
#[must_use]
pub fn utc_to_gmst(tutc: Time, ut1_utc: f64) -> f64 {
    let tut = tutc.add_seconds(ut1_utc);
    let ut = tut.sec_of_day();
    let tut0 = tut.add_seconds(-ut);

    let j2000 = Time::from_epoch(2000, 1, 1, 12, 0, 0.0).unwrap();
    let t1 = tut0.diff(&j2000) / 86400.0 / 36525.0;
    let t2 = t1 * t1;
    let t3 = t2 * t1;
    let gmst0 = 24_110.54841 + 8_640_184.812_866 * t1 + 0.093_104 * t2 - 6.2e-6 * t3;
    let gmst = gmst0 + 1.002_737_909_350_795 * ut;

    gmst.rem_euclid(86_400.0) * std::f64::consts::PI / 43_200.0
}

/// Builds the ECI→ECEF rotation at a UTC time point
///
/// Returns the 3×3 column-major transform and the Greenwich mean sidereal
/// time in radians.
#[must_use]
pub fn eci_to_ecef(tutc: Time, erp: &ErpValues) -> ([f64; 9], f64) {
    let t = tt_centuries(tutc);
    let t2 = t * t;
    let t3 = t2 * t;
    let f = ast_args(t);

    /* iau 1976 precession */
    let ze = (2306.2181 * t + 0.30188 * t2 + 0.017_998 * t3) * AS2R;
    let th = (2004.3109 * t - 0.42665 * t2 - 0.041_833 * t3) * AS2R;
    let z = (2306.2181 * t + 1.09468 * t2 + 0.018_203 * t3) * AS2R;
    let eps = (84_381.448 - 46.8150 * t - 0.00059 * t2 + 0.001_813 * t3) * AS2R;
    let p = mul3(&mul3(&rot_z(-z), &rot_y(th)), &rot_z(-ze));

    /* iau 1980 nutation */
    let (dpsi, deps) = nutation_iau1980(t, &f);
    let n = mul3(&mul3(&rot_x(-eps - deps), &rot_z(-dpsi)), &rot_x(eps));

    /* greenwich apparent sidereal time */
    let gmst = utc_to_gmst(tutc, erp.ut1_utc);
    let gast = gmst
        + dpsi * eps.cos()
        + (0.002_64 * f[4].sin() + 0.000_063 * (2.0 * f[4]).sin()) * AS2R;

    /* eci to ecef */
    let w = mul3(&mul3(&rot_y(-erp.xp), &rot_x(-erp.yp)), &rot_z(gast));
    (mul3(&mul3(&w, &n), &p), gmst)
}

/// Computes sun and moon positions in ECI (m)
#[must_use]
pub fn sun_moon_pos_eci(tut: Time) -> ([f64; 3], [f64; 3]) {
    let j2000 = Time::from_epoch(2000, 1, 1, 12, 0, 0.0).unwrap();
    let t = tut.diff(&j2000) / 86400.0 / 36525.0;
    let f = ast_args(t);

    /* mean obliquity */
    let eps = (23.439_291 - 0.013_004_2 * t) * D2R;
    let (sine, cose) = eps.sin_cos();

    /* sun */
    let ms = (357.527_723_3 + 35_999.050_34 * t) * D2R;
    let ls = (280.460
        + 36_000.770 * t
        + 1.914_666_471 * ms.sin()
        + 0.019_994_643 * (2.0 * ms).sin())
        * D2R;
    let rs = AU * (1.000_140_612 - 0.016_708_617 * ms.cos() - 0.000_139_589 * (2.0 * ms).cos());
    let rsun = [rs * ls.cos(), rs * cose * ls.sin(), rs * sine * ls.sin()];

    /* moon */
    let lm = (218.32
        + 481_267.883 * t
        + 6.29 * f[0].sin()
        - 1.27 * (f[0] - 2.0 * f[3]).sin()
        + 0.66 * (2.0 * f[3]).sin()
        + 0.21 * (2.0 * f[0]).sin()
        - 0.19 * f[1].sin()
        - 0.11 * (2.0 * f[2]).sin())
        * D2R;
    let pm = (5.13 * f[2].sin() + 0.28 * (f[0] + f[2]).sin()
        - 0.28 * (f[2] - f[0]).sin()
        - 0.17 * (f[2] - 2.0 * f[3]).sin())
        * D2R;
    let rm = RE_WGS84
        / ((0.9508
            + 0.0518 * f[0].cos()
            + 0.0095 * (f[0] - 2.0 * f[3]).cos()
            + 0.0078 * (2.0 * f[3]).cos()
            + 0.0028 * (2.0 * f[0]).cos())
            * D2R)
            .sin();
    let rmoon = [
        rm * pm.cos() * lm.cos(),
        rm * (cose * pm.cos() * lm.sin() - sine * pm.sin()),
        rm * (sine * pm.cos() * lm.sin() + cose * pm.sin()),
    ];
    (rsun, rmoon)
}

/// Computes sun and moon positions in ECEF (m) and the sidereal time
#[must_use]
pub fn sun_moon_pos(tutc: Time, erp: &ErpValues) -> ([f64; 3], [f64; 3], f64) {
    let tut = tutc.add_seconds(erp.ut1_utc);
    let (rsun_eci, rmoon_eci) = sun_moon_pos_eci(tut);
    let (u, gmst) = eci_to_ecef(tutc, erp);

    let mut rsun = [0.0; 3];
    let mut rmoon = [0.0; 3];
    mat_mul("NN", 3, 1, 3, 1.0, &u, &rsun_eci, 0.0, &mut rsun);
    mat_mul("NN", 3, 1, 3, 1.0, &u, &rmoon_eci, 0.0, &mut rmoon);
    (rsun, rmoon, gmst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::norm;
    use float_eq::assert_float_eq;

    #[test]
    fn gmst_reference_epoch() {
        /* GMST at J2000.0 noon is about 18h 41m 50s */
        let t = Time::from_epoch(2000, 1, 1, 12, 0, 0.0).unwrap();
        let gmst = utc_to_gmst(t, 0.0);
        let hours = gmst / (2.0 * std::f64::consts::PI) * 24.0;
        assert_float_eq!(hours, 18.697, abs <= 0.01);
    }

    #[test]
    fn transform_is_orthonormal() {
        let t = Time::from_epoch(2021, 7, 1, 6, 0, 0.0).unwrap();
        let (u, _) = eci_to_ecef(t, &ErpValues::default());

        /* U·Uᵀ = I */
        let mut prod = [0.0; 9];
        mat_mul("NT", 3, 3, 3, 1.0, &u, &u, 0.0, &mut prod);
        for i in 0..3 {
            for j in 0..3 {
                let expect = if i == j { 1.0 } else { 0.0 };
                assert_float_eq!(prod[i + j * 3], expect, abs <= 1e-12);
            }
        }
    }

    #[test]
    fn sun_distance_plausible() {
        let t = Time::from_epoch(2021, 1, 4, 0, 0, 0.0).unwrap();
        let (rsun, rmoon, _) = sun_moon_pos(t, &ErpValues::default());
        let dsun = norm(&rsun);
        /* perihelion is about 0.983 AU */
        assert!(dsun > 0.97 * AU && dsun < 1.03 * AU, "sun at {} m", dsun);
        let dmoon = norm(&rmoon);
        assert!(
            dmoon > 3.5e8 && dmoon < 4.1e8,
            "moon at {} m",
            dmoon
        );
    }

    #[test]
    fn sun_on_winter_side() {
        /* at the january epoch the sun sits at negative declination */
        let t = Time::from_epoch(2021, 1, 4, 0, 0, 0.0).unwrap();
        let (rsun, _, _) = sun_moon_pos(t, &ErpValues::default());
        let decl = (rsun[2] / norm(&rsun)).asin();
        assert!(decl < -20.0 * D2R && decl > -24.0 * D2R);
    }

    #[test]
    fn erp_interpolation() {
        let table = ErpTable {
            entries: vec![
                ErpEntry {
                    mjd: 59_000.0,
                    xp: 1e-7,
                    yp: 2e-7,
                    ut1_utc: -0.2,
                    lod: 1e-3,
                },
                ErpEntry {
                    mjd: 59_002.0,
                    xp: 3e-7,
                    yp: 4e-7,
                    ut1_utc: -0.4,
                    lod: 3e-3,
                },
            ],
        };
        /* MJD 59001 = 2020-06-01T00:00:00Z */
        let t = Time::from_epoch(2020, 6, 1, 0, 0, 0.0).unwrap();
        let v = table.values(t);
        assert_float_eq!(v.xp, 2e-7, abs <= 1e-12);
        assert_float_eq!(v.ut1_utc, -0.3, abs <= 1e-9);

        /* clamping outside the span */
        let early = Time::from_epoch(2010, 1, 1, 0, 0, 0.0).unwrap();
        assert_float_eq!(table.values(early).xp, 1e-7, abs <= 1e-15);
    }
}
