// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Broadcast atmosphere models
//!
//! Ionospheric delay follows the 8-parameter Klobuchar model; when no
//! broadcast parameters are available a conservative default set is used.
//! Tropospheric delay follows Saastamoinen with a standard atmosphere at
//! the station altitude; the Niell mapping function provides the
//! elevation dependence with latitude-interpolated coefficients and a
//! seasonal term phase-shifted by half a year on the southern hemisphere.
//!
//! # References
//! * IS-GPS-200, Section 20.3.3.5.2.5 and Figure 20-4
//! * A. Niell, Global mapping functions for the atmosphere delay at radio
//!   wavelengths, JGR 101, 1996

use crate::consts::CLIGHT;
use crate::time::Time;

/// Default Klobuchar parameters, used when the broadcast set is absent
const ION_DEFAULT: [f64; 8] = [
    0.1118e-7, -0.7451e-8, -0.5961e-7, 0.1192e-6, //
    0.1167e6, -0.2294e6, -0.1311e6, 0.1049e7,
];

/// Computes ionospheric delay by the Klobuchar broadcast model
///
/// `t` is on the GPS time scale, `pos` is the geodetic receiver position,
/// `az`/`el` the satellite direction in radians and `ion` the 8 broadcast
/// parameters (alpha then beta); pass `None` to fall back to the default
/// set. The returned delay is for the L1 frequency in meters.
#[must_use]
pub fn klobuchar(t: Time, pos: &[f64; 3], az: f64, el: f64, ion: Option<&[f64; 8]>) -> f64 {
    use std::f64::consts::PI;

    if pos[2] < -1e3 || el <= 0.0 {
        return 0.0;
    }
    let ion = ion.unwrap_or(&ION_DEFAULT);

    /* earth-centered angle to the ionospheric pierce point (semi-circle) */
    let psi = 0.0137 / (el / PI + 0.11) - 0.022;

    /* pierce point latitude and longitude (semi-circle) */
    let mut phi = pos[0] / PI + psi * az.cos();
    phi = phi.clamp(-0.416, 0.416);
    let lam = pos[1] / PI + psi * az.sin() / (phi * PI).cos();

    /* geomagnetic latitude (semi-circle) */
    let phi = phi + 0.064 * ((lam - 1.617) * PI).cos();

    /* local time (s) */
    let (_, tow) = t.to_gps();
    let mut tt = 43200.0 * lam + tow;
    tt -= (tt / 86400.0).floor() * 86400.0;

    /* slant factor */
    let f = 1.0 + 16.0 * (0.53 - el / PI).powi(3);

    let amp = ion[0] + phi * (ion[1] + phi * (ion[2] + phi * ion[3]));
    let per = ion[4] + phi * (ion[5] + phi * (ion[6] + phi * ion[7]));
    let amp = amp.max(0.0);
    let per = per.max(72_000.0);
    let x = 2.0 * PI * (tt - 50_400.0) / per;

    let delay = if x.abs() < 1.57 {
        5e-9 + amp * (1.0 + x * x * (-0.5 + x * x / 24.0))
    } else {
        5e-9
    };
    CLIGHT * f * delay
}

/// Computes tropospheric zenith-mapped delay by the Saastamoinen model
///
/// `pos` is the geodetic receiver position, `el` the satellite elevation
/// in radians and `humidity` the relative humidity in `[0, 1]`. Pressure
/// and temperature come from the standard atmosphere at the station
/// altitude. The returned delay is in meters.
#[must_use]
pub fn saastamoinen(pos: &[f64; 3], el: f64, humidity: f64) -> f64 {
    const TEMP0_C: f64 = 15.0;

    if pos[2] < -100.0 || pos[2] > 1e4 || el <= 0.0 {
        return 0.0;
    }

    /* standard atmosphere */
    let hgt = pos[2].max(0.0);
    let pres = 1013.25 * (1.0 - 2.2557e-5 * hgt).powf(5.2568);
    let temp = TEMP0_C - 6.5e-3 * hgt + 273.16;
    let e = 6.108 * humidity * ((17.15 * temp - 4684.0) / (temp - 38.45)).exp();

    /* hydrostatic and wet zenith delays mapped with 1/cos(z) */
    let z = std::f64::consts::FRAC_PI_2 - el;
    let trop_h =
        0.0022768 * pres / (1.0 - 0.00266 * (2.0 * pos[0]).cos() - 0.00028 * hgt / 1e3) / z.cos();
    let trop_w = 0.002277 * (1255.0 / temp + 0.05) * e / z.cos();
    trop_h + trop_w
}

/// Niell mapping function coefficient tables, latitude grid 15°..75°
const NMF_COEF: [[f64; 5]; 9] = [
    /* hydrostatic average */
    [1.2769934e-3, 1.2683230e-3, 1.2465397e-3, 1.2196049e-3, 1.2045996e-3],
    [2.9153695e-3, 2.9152299e-3, 2.9288445e-3, 2.9022565e-3, 2.9024912e-3],
    [62.610505e-3, 62.837393e-3, 63.721774e-3, 63.824265e-3, 64.258455e-3],
    /* hydrostatic amplitude */
    [0.0, 1.2709626e-5, 2.6523662e-5, 3.4000452e-5, 4.1202191e-5],
    [0.0, 2.1414979e-5, 3.0160779e-5, 7.2562722e-5, 11.723375e-5],
    [0.0, 9.0128400e-5, 4.3497037e-5, 84.795348e-5, 170.37206e-5],
    /* wet average */
    [5.8021897e-4, 5.6794847e-4, 5.8118019e-4, 5.9727542e-4, 6.1641693e-4],
    [1.4275268e-3, 1.5138625e-3, 1.4572752e-3, 1.5007428e-3, 1.7599082e-3],
    [4.3472961e-2, 4.6729510e-2, 4.3908931e-2, 4.4626982e-2, 5.4736038e-2],
];

/// Height correction coefficients of the hydrostatic mapping function
const NMF_HEIGHT: [f64; 3] = [2.53e-5, 5.49e-3, 1.14e-3];

/// Continued-fraction mapping function form
fn mapf(el: f64, a: f64, b: f64, c: f64) -> f64 {
    let sinel = el.sin();
    (1.0 + a / (1.0 + b / (1.0 + c))) / (sinel + (a / (sinel + b / (sinel + c))))
}

/// Interpolates a coefficient row over the 15° latitude grid
fn interp_coef(coef: &[f64; 5], lat_deg: f64) -> f64 {
    let i = (lat_deg / 15.0) as i32;
    if i < 1 {
        coef[0]
    } else if i > 4 {
        coef[4]
    } else {
        let frac = lat_deg / 15.0 - i as f64;
        coef[i as usize - 1] * (1.0 - frac) + coef[i as usize] * frac
    }
}

/// Computes the Niell hydrostatic and wet mapping functions
///
/// `t` tags the epoch for the seasonal term (day-of-year, phase shifted
/// half a year for southern-hemisphere stations). Returns
/// `(hydrostatic, wet)` mapping factors; below 1 milliradian of elevation
/// both collapse to 0.
#[must_use]
pub fn niell_mapping(t: Time, pos: &[f64; 3], el: f64) -> (f64, f64) {
    if el <= 0.001 {
        return (0.0, 0.0);
    }
    let lat_deg = pos[0].to_degrees();
    let hgt = pos[2];

    /* seasonal term anchored on day 28, southern hemisphere offset half
     * a year */
    let mut y = (t.day_of_year() - 28.0) / 365.25;
    if lat_deg < 0.0 {
        y += 0.5;
    }
    let cosy = (2.0 * std::f64::consts::PI * y).cos();
    let lat = lat_deg.abs();

    let mut ah = [0.0; 3];
    let mut aw = [0.0; 3];
    for i in 0..3 {
        ah[i] = interp_coef(&NMF_COEF[i], lat) - interp_coef(&NMF_COEF[i + 3], lat) * cosy;
        aw[i] = interp_coef(&NMF_COEF[i + 6], lat);
    }

    /* ellipsoidal height correction of the hydrostatic factor */
    let dm = (1.0 / el.sin() - mapf(el, NMF_HEIGHT[0], NMF_HEIGHT[1], NMF_HEIGHT[2])) * hgt / 1e3;

    (mapf(el, ah[0], ah[1], ah[2]) + dm, mapf(el, aw[0], aw[1], aw[2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::D2R;
    use crate::time::Time;

    #[test]
    fn klobuchar_broadcast_set() {
        /* broadcast parameters and geometry with a known delay of a few
         * meters at L1 */
        let t = Time::from_gps(1042, 593_100.0);
        let ion = [
            0.3820e-7, 0.1490e-7, -0.1790e-6, 0.0, //
            0.1430e6, 0.0, -0.3280e6, 0.1130e6,
        ];
        let pos = [40.0 * D2R, 260.0 * D2R, 0.0];
        let d = klobuchar(t, &pos, 210.0 * D2R, 20.0 * D2R, Some(&ion));
        assert!(d > 1.0 && d < 50.0, "implausible iono delay {}", d);

        /* higher elevation shrinks the slant factor */
        let d_high = klobuchar(t, &pos, 210.0 * D2R, 75.0 * D2R, Some(&ion));
        assert!(d_high < d);

        /* default parameters engage when the broadcast is absent */
        let d_def = klobuchar(t, &pos, 210.0 * D2R, 20.0 * D2R, None);
        assert!(d_def > 0.0);

        /* satellite below the horizon */
        assert_eq!(klobuchar(t, &pos, 0.0, -0.1, Some(&ion)), 0.0);
    }

    #[test]
    fn saastamoinen_plausibility() {
        let pos = [45.0 * D2R, 10.0 * D2R, 200.0];
        let d_zenith = saastamoinen(&pos, 90.0 * D2R, 0.7);
        /* about 2.3 m of zenith delay at sea level */
        assert!(d_zenith > 2.0 && d_zenith < 3.0, "zenith delay {}", d_zenith);

        let d_low = saastamoinen(&pos, 15.0 * D2R, 0.7);
        assert!(d_low > d_zenith * 3.0);

        /* model limits */
        assert_eq!(saastamoinen(&[0.0, 0.0, -500.0], 1.0, 0.7), 0.0);
        assert_eq!(saastamoinen(&[0.0, 0.0, 20_000.0], 1.0, 0.7), 0.0);
        assert_eq!(saastamoinen(&pos, 0.0, 0.7), 0.0);
    }

    #[test]
    fn niell_mapping_behaviour() {
        let t = Time::from_epoch(2021, 2, 1, 0, 0, 0.0).unwrap();
        let pos = [40.0 * D2R, 0.0, 1300.0];

        /* zenith maps to roughly 1 */
        let (mh, mw) = niell_mapping(t, &pos, 90.0 * D2R);
        float_eq::assert_float_eq!(mh, 1.0, abs <= 0.05);
        float_eq::assert_float_eq!(mw, 1.0, abs <= 0.05);

        /* 5 degrees maps to roughly 1/sin(el) ≈ 10 */
        let (mh, mw) = niell_mapping(t, &pos, 5.0 * D2R);
        assert!(mh > 9.0 && mh < 12.0, "hydrostatic mapping {}", mh);
        assert!(mw > 9.0 && mw < 12.0, "wet mapping {}", mw);

        /* southern hemisphere station uses the shifted season */
        let south = [-40.0 * D2R, 0.0, 1300.0];
        let (mh_s, _) = niell_mapping(t, &south, 5.0 * D2R);
        assert!((mh_s - mh).abs() > 1e-6);

        assert_eq!(niell_mapping(t, &pos, 0.0), (0.0, 0.0));
    }
}
