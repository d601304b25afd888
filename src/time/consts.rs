// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Time scale constants

/// Seconds in a week
pub const WEEK_SECS: u64 = 604_800;
/// Seconds in a day
pub const DAY_SECS: u64 = 86_400;
/// Half a week in seconds, the wrap threshold for time-of-week fields
pub const HALF_WEEK_SECS: f64 = 302_400.0;
/// Half a day in seconds, the wrap threshold for time-of-day fields
pub const HALF_DAY_SECS: f64 = 43_200.0;

/// Unix timestamp of the GPS time origin, 1980-01-06 00:00:00 UTC
pub const GPS_EPOCH_UNIX: u64 = 315_964_800;
/// Unix timestamp of the Galileo time origin, 1999-08-22 00:00:00 UTC
pub const GAL_EPOCH_UNIX: u64 = 935_280_000;
/// Unix timestamp of the BeiDou time origin, 2006-01-01 00:00:00 UTC
pub const BDS_EPOCH_UNIX: u64 = 1_136_073_600;

/// Fixed BDT→GPST shift in seconds (BDT carries no leap seconds)
pub const BDS_SECOND_TO_GPS_SECOND: f64 = 14.0;

/// Earliest absolute GPS week accepted when resolving 10-bit broadcast weeks
/// against a clock that has not been set (GPS week 1560, 2009-11-29)
pub const GPS_WEEK_MIN: i64 = 1560;

/// Width of the broadcast GPS week field
pub const GPS_WEEK_MODULUS: i64 = 1024;
/// Width of the broadcast BeiDou week field
pub const BDS_WEEK_MODULUS: i64 = 8192;

/// Maximum accepted magnitude of a time-of-week argument
pub const MAX_TOW: f64 = 1e9;

/// Built-in leap second table: (year, month, day, GPST−UTC offset negated)
///
/// Descending by date. The offset column is UTC−GPST in seconds.
pub const BUILTIN_LEAPS: [(u16, u8, u8, f64); 18] = [
    (2017, 1, 1, -18.0),
    (2015, 7, 1, -17.0),
    (2012, 7, 1, -16.0),
    (2009, 1, 1, -15.0),
    (2006, 1, 1, -14.0),
    (1999, 1, 1, -13.0),
    (1997, 7, 1, -12.0),
    (1996, 1, 1, -11.0),
    (1994, 7, 1, -10.0),
    (1993, 7, 1, -9.0),
    (1992, 7, 1, -8.0),
    (1991, 1, 1, -7.0),
    (1990, 1, 1, -6.0),
    (1988, 1, 1, -5.0),
    (1985, 7, 1, -4.0),
    (1983, 7, 1, -3.0),
    (1982, 7, 1, -2.0),
    (1981, 7, 1, -1.0),
];
