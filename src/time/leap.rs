// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Leap seconds and the UTC↔GPST conversion
//!
//! The process carries one leap-second table. It starts out as the built-in
//! list and can be replaced once from a file with [`read_leaps`]; decoding
//! paths only ever read it. Both the USNO `tai-utc.dat` format and a plain
//! `YYYY MM DD hh mm ss OFFSET` text form are accepted.

use super::{consts, Time};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Mutex;

/// One leap second step: the UTC epoch it takes effect and UTC−GPST after it
#[derive(Debug, Copy, Clone, PartialEq)]
struct LeapEntry {
    epoch: (u16, u8, u8),
    offset: f64,
}

/// Replacement table loaded by [`read_leaps`]; empty means "use built-in"
static LOADED_LEAPS: Mutex<Vec<LeapEntry>> = Mutex::new(Vec::new());

/// Errors raised while loading a leap second file
#[derive(Debug, thiserror::Error)]
pub enum LeapFileError {
    #[error("leap second file unreadable: {0}")]
    /// The file could not be opened or read
    Io(#[from] std::io::Error),
    #[error("no leap second entries found in file")]
    /// The file parsed but contained no usable entries
    Empty,
}

fn builtin(index: usize) -> LeapEntry {
    let (y, m, d, offset) = consts::BUILTIN_LEAPS[index];
    LeapEntry {
        epoch: (y, m, d),
        offset,
    }
}

fn with_table<R>(f: impl FnOnce(&[LeapEntry]) -> R) -> R {
    let guard = LOADED_LEAPS.lock().unwrap();
    if guard.is_empty() {
        let table: Vec<LeapEntry> = (0..consts::BUILTIN_LEAPS.len()).map(builtin).collect();
        f(&table)
    } else {
        f(&guard)
    }
}

/// Converts a GPS time point into UTC
///
/// Walks the leap table from the most recent entry and returns the first
/// shifted time that still falls at or after the entry's effect epoch.
#[must_use]
pub fn gpst_to_utc(t: Time) -> Time {
    with_table(|table| {
        for entry in table {
            let tu = t.add_seconds(entry.offset);
            let (y, m, d) = entry.epoch;
            /* entry epochs are well-formed by construction */
            let effect = Time::from_epoch(y, m, d, 0, 0, 0.0).unwrap();
            if tu.diff(&effect) >= 0.0 {
                return tu;
            }
        }
        t
    })
}

/// Converts a UTC time point onto the GPS time scale
#[must_use]
pub fn utc_to_gpst(t: Time) -> Time {
    with_table(|table| {
        for entry in table {
            let (y, m, d) = entry.epoch;
            let effect = Time::from_epoch(y, m, d, 0, 0, 0.0).unwrap();
            if t.diff(&effect) >= 0.0 {
                return t.add_seconds(-entry.offset);
            }
        }
        t
    })
}

/// Gets the current UTC−GPST offset in seconds at a UTC time point
#[must_use]
pub fn leap_seconds_utc(t: Time) -> f64 {
    with_table(|table| {
        for entry in table {
            let (y, m, d) = entry.epoch;
            let effect = Time::from_epoch(y, m, d, 0, 0, 0.0).unwrap();
            if t.diff(&effect) >= 0.0 {
                return entry.offset;
            }
        }
        0.0
    })
}

/// Replaces the process leap-second table from a file
///
/// Returns the number of entries loaded. Lines may be either the USNO
/// `tai-utc.dat` form (`1 Jan 2017 =JD 2457754.5  TAI-UTC= 37.0 ...`) or the
/// plain form `YYYY MM DD hh mm ss OFFSET` with `#` comments.
pub fn read_leaps<P: AsRef<Path>>(path: P) -> Result<usize, LeapFileError> {
    let file = File::open(path)?;
    let mut entries = Vec::new();

    for line in BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(entry) = parse_usno_line(line).or_else(|| parse_plain_line(line)) {
            entries.push(entry);
        }
    }

    if entries.is_empty() {
        return Err(LeapFileError::Empty);
    }

    /* most recent first */
    entries.sort_by(|a, b| b.epoch.cmp(&a.epoch));
    log::info!("leap second table replaced, {} entries", entries.len());

    let mut guard = LOADED_LEAPS.lock().unwrap();
    *guard = entries;
    Ok(guard.len())
}

/// Restores the built-in leap-second table (test support)
pub fn reset_leaps() {
    LOADED_LEAPS.lock().unwrap().clear();
}

fn parse_usno_line(line: &str) -> Option<LeapEntry> {
    const MONTHS: [&str; 12] = [
        "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
    ];
    /* "1 Jan 2017 =JD 2457754.5  TAI-UTC=  37.0" */
    let mut it = line.split_whitespace();
    let day: u8 = it.next()?.parse().ok()?;
    let mon_name = it.next()?.to_ascii_uppercase();
    let month = MONTHS.iter().position(|m| mon_name.starts_with(m))? as u8 + 1;
    let year: u16 = it.next()?.parse().ok()?;
    let tai_utc: f64 = line
        .split("TAI-UTC=")
        .nth(1)?
        .split_whitespace()
        .next()?
        .parse()
        .ok()?;
    if !(1970..=2099).contains(&year) {
        return None;
    }
    Some(LeapEntry {
        epoch: (year, month, day),
        /* GPST runs 19 s ahead of TAI−UTC at the GPS origin */
        offset: 19.0 - tai_utc,
    })
}

fn parse_plain_line(line: &str) -> Option<LeapEntry> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 7 {
        return None;
    }
    let year: u16 = fields[0].parse().ok()?;
    let month: u8 = fields[1].parse().ok()?;
    let day: u8 = fields[2].parse().ok()?;
    let offset: f64 = fields[6].parse().ok()?;
    if !(1970..=2099).contains(&year) || !(1..=12).contains(&month) {
        return None;
    }
    Some(LeapEntry {
        epoch: (year, month, day),
        offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /* tests below read or replace the process table; keep them serialized */
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn utc_gpst_roundtrip() {
        let _guard = TEST_LOCK.lock().unwrap();
        let t = Time::from_epoch(2021, 6, 1, 12, 0, 0.0).unwrap();
        let gps = utc_to_gpst(t);
        /* 18 leap seconds since 2017 */
        float_eq::assert_float_eq!(gps.diff(&t), 18.0, abs <= 1e-9);
        let back = gpst_to_utc(gps);
        float_eq::assert_float_eq!(back.diff(&t), 0.0, abs <= 1e-9);
    }

    #[test]
    fn offsets_across_history() {
        let _guard = TEST_LOCK.lock().unwrap();
        let t_2010 = Time::from_epoch(2010, 1, 1, 0, 0, 0.0).unwrap();
        assert_eq!(leap_seconds_utc(t_2010), -15.0);
        let t_1982 = Time::from_epoch(1982, 1, 1, 0, 0, 0.0).unwrap();
        assert_eq!(leap_seconds_utc(t_1982), -1.0);
        /* before the first entry no correction applies */
        let t_1980 = Time::from_epoch(1980, 6, 1, 0, 0, 0.0).unwrap();
        assert_eq!(leap_seconds_utc(t_1980), 0.0);
    }

    #[test]
    fn plain_file_parsing() {
        let _guard = TEST_LOCK.lock().unwrap();
        let dir = std::env::temp_dir().join("gnss_core_leap_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("leaps.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "# comment line").unwrap();
        writeln!(f, "2017 1 1 0 0 0 -18").unwrap();
        writeln!(f, "2015 7 1 0 0 0 -17").unwrap();
        drop(f);

        assert_eq!(read_leaps(&path).unwrap(), 2);
        let t = Time::from_epoch(2021, 6, 1, 0, 0, 0.0).unwrap();
        assert_eq!(leap_seconds_utc(t), -18.0);
        reset_leaps();
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn usno_line() {
        let entry = parse_usno_line("1 Jan 2017 =JD 2457754.5  TAI-UTC=  37.0").unwrap();
        assert_eq!(entry.epoch, (2017, 1, 1));
        float_eq::assert_float_eq!(entry.offset, -18.0, abs <= 1e-12);
    }
}
