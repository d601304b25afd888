// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Time points and time scale conversions
//!
//! A [`Time`] is a pair of integer seconds since the Unix epoch and a
//! fractional part normalized into `[0, 1)`; arithmetic is exact on the
//! integer part. Conversions exist for GPS, Galileo and BeiDou week/
//! time-of-week scales, calendar epochs (1970–2099), UTC with a
//! replaceable leap-second table, and the BDT constant shift.
//!
//! The wall clock is reached through the [`Clock`] capability so decoders
//! can be driven by a deterministic clock in tests and by a replayable
//! offset clock in post-processing.

mod clock;
pub mod consts;
mod leap;

pub use clock::*;
pub use leap::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Error type for calendar epochs outside the supported 1970–2099 span
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq, thiserror::Error)]
pub enum InvalidEpoch {
    #[error("Year out of the 1970-2099 range: {0}")]
    /// The year is outside the supported span
    InvalidYear(u16),
    #[error("Invalid month: {0}")]
    /// The month is not in 1..=12
    InvalidMonth(u8),
    #[error("Invalid day of month: {0}")]
    /// The day is not in 1..=31
    InvalidDay(u8),
}

/// Days from new year to the start of each month (non-leap year)
const DAY_OF_YEAR: [u64; 12] = [1, 32, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335];

/// Month lengths across one 4-year block starting 1970; the third year of
/// the block (1972) is the leap year
const MONTH_DAYS: [u64; 48] = [
    31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31, //
    31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31, //
    31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31, //
    31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31,
];

/// A point in time: integer Unix seconds plus a fraction in `[0, 1)`
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
pub struct Time {
    sec: u64,
    frac: f64,
}

impl Time {
    /// Makes a time point, normalizing the fractional part into `[0, 1)`
    #[must_use]
    pub fn new(sec: u64, frac: f64) -> Time {
        let mut t = Time { sec, frac };
        t.normalize();
        t
    }

    /// Makes a time point from a calendar epoch
    ///
    /// Supported span is 1970–2099: within it the `year % 4 == 0` leap rule
    /// holds, so day arithmetic walks a fixed 4-year block.
    pub fn from_epoch(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        seconds: f64,
    ) -> Result<Time, InvalidEpoch> {
        if !(1970..=2099).contains(&year) {
            return Err(InvalidEpoch::InvalidYear(year));
        }
        if !(1..=12).contains(&month) {
            return Err(InvalidEpoch::InvalidMonth(month));
        }
        if !(1..=31).contains(&day) {
            return Err(InvalidEpoch::InvalidDay(day));
        }

        let leap_day = if year % 4 == 0 && month >= 3 { 1 } else { 0 };
        let days = (year as u64 - 1970) * 365
            + (year as u64 - 1969) / 4
            + DAY_OF_YEAR[month as usize - 1]
            + day as u64
            - 2
            + leap_day;
        let whole = seconds.floor();
        let sec =
            days * consts::DAY_SECS + hour as u64 * 3600 + minute as u64 * 60 + whole as u64;
        Ok(Time {
            sec,
            frac: seconds - whole,
        })
    }

    /// Breaks the time point into (year, month, day, hour, minute, seconds)
    #[must_use]
    pub fn to_epoch(&self) -> (u16, u8, u8, u8, u8, f64) {
        let days = self.sec / consts::DAY_SECS;
        let secs = self.sec - days * consts::DAY_SECS;

        let mut day = days % 1461;
        let mut month = 0usize;
        while month < 48 {
            if day >= MONTH_DAYS[month] {
                day -= MONTH_DAYS[month];
            } else {
                break;
            }
            month += 1;
        }

        let year = (1970 + days / 1461 * 4 + month as u64 / 12) as u16;
        (
            year,
            (month % 12 + 1) as u8,
            (day + 1) as u8,
            (secs / 3600) as u8,
            (secs % 3600 / 60) as u8,
            (secs % 60) as f64 + self.frac,
        )
    }

    /// Gets the integer seconds since the Unix epoch
    #[must_use]
    pub fn sec(&self) -> u64 {
        self.sec
    }

    /// Gets the fractional seconds in `[0, 1)`
    #[must_use]
    pub fn frac(&self) -> f64 {
        self.frac
    }

    /// Gets the difference `self − other` in seconds
    #[must_use]
    pub fn diff(&self, other: &Time) -> f64 {
        (self.sec as i64 - other.sec as i64) as f64 + (self.frac - other.frac)
    }

    /// Adds a (possibly negative) number of seconds
    #[must_use]
    pub fn add_seconds(mut self, seconds: f64) -> Time {
        self.frac += seconds;
        self.normalize();
        self
    }

    fn normalize(&mut self) {
        let whole = self.frac.floor();
        let sec = self.sec as i64 + whole as i64;
        /* supported span starts at the Unix epoch */
        self.sec = sec.max(0) as u64;
        self.frac -= whole;
        if !(0.0..1.0).contains(&self.frac) {
            /* floating point residue from a very large step */
            self.frac = 0.0;
        }
    }

    /// Makes a time point from a GPS week number and time of week
    ///
    /// `tow` is clamped into `±MAX_TOW`.
    #[must_use]
    pub fn from_gps(week: i64, tow: f64) -> Time {
        let tow = if tow.abs() > consts::MAX_TOW { 0.0 } else { tow };
        Time::new(
            (consts::GPS_EPOCH_UNIX as i64 + week * consts::WEEK_SECS as i64).max(0) as u64,
            0.0,
        )
        .add_seconds(tow)
    }

    /// Breaks the time point into GPS week number and time of week
    #[must_use]
    pub fn to_gps(&self) -> (i64, f64) {
        let sec = self.sec as i64 - consts::GPS_EPOCH_UNIX as i64;
        let week = sec.div_euclid(consts::WEEK_SECS as i64);
        let tow = sec.rem_euclid(consts::WEEK_SECS as i64) as f64 + self.frac;
        (week, tow)
    }

    /// Makes a time point from a Galileo week number and time of week
    #[must_use]
    pub fn from_gal(week: i64, tow: f64) -> Time {
        let tow = if tow.abs() > consts::MAX_TOW { 0.0 } else { tow };
        Time::new(
            (consts::GAL_EPOCH_UNIX as i64 + week * consts::WEEK_SECS as i64).max(0) as u64,
            0.0,
        )
        .add_seconds(tow)
    }

    /// Breaks the time point into Galileo week number and time of week
    #[must_use]
    pub fn to_gal(&self) -> (i64, f64) {
        let sec = self.sec as i64 - consts::GAL_EPOCH_UNIX as i64;
        let week = sec.div_euclid(consts::WEEK_SECS as i64);
        let tow = sec.rem_euclid(consts::WEEK_SECS as i64) as f64 + self.frac;
        (week, tow)
    }

    /// Makes a time point from a BeiDou week number and time of week
    ///
    /// The result stays in the BDT scale; apply [`bdt_to_gpst`] to move it
    /// onto the GPS time scale.
    #[must_use]
    pub fn from_bds(week: i64, tow: f64) -> Time {
        let tow = if tow.abs() > consts::MAX_TOW { 0.0 } else { tow };
        Time::new(
            (consts::BDS_EPOCH_UNIX as i64 + week * consts::WEEK_SECS as i64).max(0) as u64,
            0.0,
        )
        .add_seconds(tow)
    }

    /// Breaks the time point into BeiDou week number and time of week
    #[must_use]
    pub fn to_bds(&self) -> (i64, f64) {
        let sec = self.sec as i64 - consts::BDS_EPOCH_UNIX as i64;
        let week = sec.div_euclid(consts::WEEK_SECS as i64);
        let tow = sec.rem_euclid(consts::WEEK_SECS as i64) as f64 + self.frac;
        (week, tow)
    }

    /// Gets the seconds elapsed since midnight of the time point's day
    #[must_use]
    pub fn sec_of_day(&self) -> f64 {
        (self.sec % consts::DAY_SECS) as f64 + self.frac
    }

    /// Gets the day of year, counting from 1.0 at new year midnight
    #[must_use]
    pub fn day_of_year(&self) -> f64 {
        let (year, _, _, _, _, _) = self.to_epoch();
        /* unwrap is fine: `year` came out of a valid time point */
        let new_year = Time::from_epoch(year, 1, 1, 0, 0, 0.0).unwrap();
        self.diff(&new_year) / consts::DAY_SECS as f64 + 1.0
    }
}

impl PartialEq for Time {
    fn eq(&self, other: &Self) -> bool {
        self.sec == other.sec && (self.frac - other.frac).abs() < 1e-9
    }
}

impl PartialOrd for Time {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        let diff = self.diff(other);
        if diff.abs() < 1e-9 {
            Some(std::cmp::Ordering::Equal)
        } else if diff > 0.0 {
            Some(std::cmp::Ordering::Greater)
        } else {
            Some(std::cmp::Ordering::Less)
        }
    }
}

impl Add<f64> for Time {
    type Output = Time;
    fn add(self, rhs: f64) -> Time {
        self.add_seconds(rhs)
    }
}

impl AddAssign<f64> for Time {
    fn add_assign(&mut self, rhs: f64) {
        *self = self.add_seconds(rhs);
    }
}

impl Sub<f64> for Time {
    type Output = Time;
    fn sub(self, rhs: f64) -> Time {
        self.add_seconds(-rhs)
    }
}

impl SubAssign<f64> for Time {
    fn sub_assign(&mut self, rhs: f64) {
        *self = self.add_seconds(-rhs);
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (y, mo, d, h, mi, s) = self.to_epoch();
        write!(f, "{:04}/{:02}/{:02} {:02}:{:02}:{:06.3}", y, mo, d, h, mi, s)
    }
}

/// Resolves a broadcast time-of-week against a nearby reference time
///
/// The returned time point keeps the reference week but carries `tow`,
/// shifted by one week when the raw value is more than half a week away.
#[must_use]
pub fn adjust_week(reference: Time, tow: f64) -> Time {
    let (week, tow_ref) = reference.to_gps();
    let tow = if tow < tow_ref - consts::HALF_WEEK_SECS {
        tow + consts::WEEK_SECS as f64
    } else if tow > tow_ref + consts::HALF_WEEK_SECS {
        tow - consts::WEEK_SECS as f64
    } else {
        tow
    };
    Time::from_gps(week, tow)
}

/// Resolves a broadcast time-of-day against a nearby reference time
#[must_use]
pub fn adjust_day(reference: Time, tod: f64) -> Time {
    let tod_ref = reference.sec_of_day();
    let tod = if tod < tod_ref - consts::HALF_DAY_SECS {
        tod + consts::DAY_SECS as f64
    } else if tod > tod_ref + consts::HALF_DAY_SECS {
        tod - consts::DAY_SECS as f64
    } else {
        tod
    };
    reference.add_seconds(tod - tod_ref)
}

/// Maps a 10-bit broadcast GPS week onto the nearest absolute week
///
/// `now_utc` anchors the search; when the clock predates GPS week
/// [`consts::GPS_WEEK_MIN`] that week is used as the anchor instead.
#[must_use]
pub fn adj_gps_week(week: i64, now_utc: Time) -> i64 {
    let (mut now_week, _) = utc_to_gpst(now_utc).to_gps();
    if now_week < consts::GPS_WEEK_MIN {
        now_week = consts::GPS_WEEK_MIN;
    }
    week + (now_week - week + consts::GPS_WEEK_MODULUS / 2) / consts::GPS_WEEK_MODULUS
        * consts::GPS_WEEK_MODULUS
}

/// Maps a 13-bit broadcast BeiDou week onto the nearest absolute week
#[must_use]
pub fn adj_bds_week(week: i64, now_utc: Time) -> i64 {
    let bdt_now = gpst_to_bdt(utc_to_gpst(now_utc));
    let (mut now_week, _) = bdt_now.to_bds();
    if now_week < 1 {
        /* clock earlier than the BDT origin */
        now_week = 1;
    }
    week + (now_week - week + consts::BDS_WEEK_MODULUS / 2) / consts::BDS_WEEK_MODULUS
        * consts::BDS_WEEK_MODULUS
}

/// Shifts a GPS time point onto the BDT scale
#[must_use]
pub fn gpst_to_bdt(t: Time) -> Time {
    t.add_seconds(-consts::BDS_SECOND_TO_GPS_SECOND)
}

/// Shifts a BDT time point onto the GPS time scale
#[must_use]
pub fn bdt_to_gpst(t: Time) -> Time {
    t.add_seconds(consts::BDS_SECOND_TO_GPS_SECOND)
}
