// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Coordinates and conversions
//!
//! Positions move between three frames:
//!  * ECEF Cartesian (X, Y, Z) in meters
//!  * Geodetic latitude, longitude (radians) and ellipsoidal height (m)
//!    on the WGS-84 ellipsoid
//!  * Local tangent East-North-Up relative to a geodetic reference
//!
//! Cartesian to geodetic uses the Bowring fixed-point iteration with
//! `e² = f(2−f)`; convergence is declared below 10⁻⁴ m in the z update,
//! a few iterations anywhere on or near the surface.

use crate::consts::{CLIGHT, FE_WGS84, OMGE, RE_WGS84};
use crate::matrix::{mat_inv, mat_mul};
use nalgebra::{Matrix3, Vector3};

/// Converts an ECEF position into geodetic (lat, lon, height)
///
/// Latitude and longitude come out in radians, height in meters. Points on
/// the polar axis resolve to ±π/2 latitude and zero longitude.
#[must_use]
pub fn ecef_to_geodetic(r: &[f64; 3]) -> [f64; 3] {
    let e2 = FE_WGS84 * (2.0 - FE_WGS84);
    let r2 = r[0] * r[0] + r[1] * r[1];
    let mut z = r[2];
    let mut zk = 0.0;
    let mut v = RE_WGS84;
    let mut sinp = 0.0;

    while (z - zk).abs() >= 1e-4 {
        zk = z;
        sinp = z / (r2 + z * z).sqrt();
        v = RE_WGS84 / (1.0 - e2 * sinp * sinp).sqrt();
        z = r[2] + v * e2 * sinp;
    }

    let lat = if r2 > 1e-12 {
        (z / r2.sqrt()).atan()
    } else if r[2] > 0.0 {
        std::f64::consts::FRAC_PI_2
    } else {
        -std::f64::consts::FRAC_PI_2
    };
    let lon = if r2 > 1e-12 { r[1].atan2(r[0]) } else { 0.0 };
    let hgt = (r2 + z * z).sqrt() - v;
    [lat, lon, hgt]
}

/// Converts a geodetic position (lat, lon, height) into ECEF
#[must_use]
pub fn geodetic_to_ecef(pos: &[f64; 3]) -> [f64; 3] {
    let (sinp, cosp) = pos[0].sin_cos();
    let (sinl, cosl) = pos[1].sin_cos();
    let e2 = FE_WGS84 * (2.0 - FE_WGS84);
    let v = RE_WGS84 / (1.0 - e2 * sinp * sinp).sqrt();

    [
        (v + pos[2]) * cosp * cosl,
        (v + pos[2]) * cosp * sinl,
        (v * (1.0 - e2) + pos[2]) * sinp,
    ]
}

/// Builds the ECEF→ENU rotation at a geodetic reference, column-major
#[must_use]
pub fn xyz_to_enu(pos: &[f64; 3]) -> [f64; 9] {
    let (sinp, cosp) = pos[0].sin_cos();
    let (sinl, cosl) = pos[1].sin_cos();

    /* rows are the local east, north and up directions */
    let e = Matrix3::new(
        -sinl,
        cosl,
        0.0, //
        -sinp * cosl,
        -sinp * sinl,
        cosp, //
        cosp * cosl,
        cosp * sinl,
        sinp,
    );
    let mut out = [0.0; 9];
    out.copy_from_slice(e.as_slice());
    out
}

/// Rotates an ECEF vector into local ENU at a geodetic reference
#[must_use]
pub fn ecef_to_enu(pos: &[f64; 3], r: &[f64; 3]) -> [f64; 3] {
    let e = xyz_to_enu(pos);
    let mut out = [0.0; 3];
    mat_mul("NN", 3, 1, 3, 1.0, &e, r, 0.0, &mut out);
    out
}

/// Rotates a local ENU vector at a geodetic reference into ECEF
#[must_use]
pub fn enu_to_ecef(pos: &[f64; 3], e_vec: &[f64; 3]) -> [f64; 3] {
    let e = xyz_to_enu(pos);
    let mut out = [0.0; 3];
    mat_mul("TN", 3, 1, 3, 1.0, &e, e_vec, 0.0, &mut out);
    out
}

/// Computes satellite azimuth and elevation seen from a geodetic position
///
/// `e` is the receiver-to-satellite unit vector in ECEF. Azimuth comes out
/// in `[0, 2π)` clockwise from north, elevation in `[−π/2, π/2]`.
#[must_use]
pub fn sat_azel(pos: &[f64; 3], e: &[f64; 3]) -> (f64, f64) {
    if pos[2] <= -RE_WGS84 {
        return (0.0, std::f64::consts::FRAC_PI_2);
    }
    let enu = ecef_to_enu(pos, e);
    let horizontal = enu[0] * enu[0] + enu[1] * enu[1];
    let mut az = if horizontal < 1e-12 {
        0.0
    } else {
        enu[0].atan2(enu[1])
    };
    if az < 0.0 {
        az += 2.0 * std::f64::consts::PI;
    }
    (az, enu[2].asin())
}

/// Computes the geometric range with the Sagnac correction
///
/// `rs` is the satellite ECEF position at transmit, `rr` the receiver ECEF
/// position. Returns the corrected range and the receiver-to-satellite
/// unit vector, or `None` when the satellite position is inside the Earth.
#[must_use]
pub fn geo_dist(rs: &[f64; 3], rr: &[f64; 3]) -> Option<(f64, [f64; 3])> {
    let rs_v = Vector3::from_column_slice(rs);
    if rs_v.norm() < RE_WGS84 {
        return None;
    }
    let d = rs_v - Vector3::from_column_slice(rr);
    let r = d.norm();
    let e = [d[0] / r, d[1] / r, d[2] / r];
    let sagnac = OMGE * (rs[0] * rr[1] - rs[1] * rr[0]) / CLIGHT;
    Some((r + sagnac, e))
}

/// Dilution-of-precision figures computed from satellite geometry
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Dops {
    /// Geometric DOP
    pub gdop: f64,
    /// Position DOP
    pub pdop: f64,
    /// Horizontal DOP
    pub hdop: f64,
    /// Vertical DOP
    pub vdop: f64,
}

/// Computes DOP values from satellite (azimuth, elevation) pairs
///
/// Satellites below `el_min` are excluded; fewer than four usable
/// satellites (or a singular geometry) yields `None`.
#[must_use]
pub fn dops(azels: &[(f64, f64)], el_min: f64) -> Option<Dops> {
    let mut h = Vec::with_capacity(azels.len() * 4);
    let mut ns = 0usize;
    for (az, el) in azels {
        if *el < el_min {
            continue;
        }
        let cosel = el.cos();
        /* one design row per satellite, stored as a column of Hᵀ */
        h.push(cosel * az.sin());
        h.push(cosel * az.cos());
        h.push(el.sin());
        h.push(1.0);
        ns += 1;
    }
    if ns < 4 {
        return None;
    }

    let mut q = [0.0; 16];
    mat_mul("NT", 4, 4, ns, 1.0, &h, &h, 0.0, &mut q);
    mat_inv(&mut q, 4).ok()?;

    let trace3 = q[0] + q[5] + q[10];
    Some(Dops {
        gdop: (trace3 + q[15]).sqrt(),
        pdop: trace3.sqrt(),
        hdop: (q[0] + q[5]).sqrt(),
        vdop: q[10].sqrt(),
    })
}
