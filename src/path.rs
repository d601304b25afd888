// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Keyword replacement in file paths
//!
//! Log and product paths carry substitution tokens that expand against a
//! time point and station names:
//!
//! | token | replacement |
//! |-------|-------------|
//! | `%Y` `%y` | 4- and 2-digit year |
//! | `%m` `%d` | month, day of month |
//! | `%h` `%M` `%S` | hour, minute, second |
//! | `%ha` `%hb` `%hc` | hour floored to 3/6/12 h blocks |
//! | `%t` | minute floored to 15 min blocks |
//! | `%n` | day of year |
//! | `%W` `%D` | GPS week, day of week |
//! | `%H` | hour as a letter `a`..`x` |
//! | `%r` `%b` | rover and base station names |
//!
//! Expansion over a span steps by the finest token present, so one
//! pattern enumerates every distinct file it can name.

use crate::time::Time;

/// Expands the substitution tokens of a path at one time point
///
/// Station tokens expand only when a non-empty name is supplied. The
/// multi-character hour tokens are replaced before the plain `%h` so the
/// prefix cannot shadow them.
#[must_use]
pub fn expand(path: &str, time: Time, rover: &str, base: &str) -> String {
    let mut out = path.to_string();
    if !out.contains('%') {
        return out;
    }
    if !rover.is_empty() {
        out = out.replace("%r", rover);
    }
    if !base.is_empty() {
        out = out.replace("%b", base);
    }
    if time.sec() == 0 {
        return out;
    }

    let (year, month, day, hour, minute, seconds) = time.to_epoch();
    let (week, tow) = time.to_gps();
    let dow = (tow / 86_400.0).floor() as i64;
    let doy = time.day_of_year().floor() as u32;

    out = out.replace("%ha", &format!("{:02}", hour / 3 * 3));
    out = out.replace("%hb", &format!("{:02}", hour / 6 * 6));
    out = out.replace("%hc", &format!("{:02}", hour / 12 * 12));
    out = out.replace("%Y", &format!("{:04}", year));
    out = out.replace("%y", &format!("{:02}", year % 100));
    out = out.replace("%m", &format!("{:02}", month));
    out = out.replace("%d", &format!("{:02}", day));
    out = out.replace("%h", &format!("{:02}", hour));
    out = out.replace("%M", &format!("{:02}", minute));
    out = out.replace("%S", &format!("{:02}", seconds.floor() as u32));
    out = out.replace("%n", &format!("{:03}", doy));
    out = out.replace("%W", &format!("{:04}", week));
    out = out.replace("%D", &format!("{}", dow));
    out = out.replace("%t", &format!("{:02}", minute / 15 * 15));
    out = out.replace("%H", &((b'a' + hour) as char).to_string());
    out
}

/// The time quantum implied by the finest token in a path (s)
#[must_use]
pub fn finest_interval(path: &str) -> f64 {
    if path.contains("%S") || path.contains("%M") || path.contains("%t") {
        900.0
    } else if path.contains("%h") || path.contains("%H") {
        3600.0
    } else {
        86_400.0
    }
}

/// Expands a path over a time span, one entry per distinct expansion
///
/// The span is walked from `start` to `end` in steps of the finest
/// token's quantum, starting on a quantum boundary.
#[must_use]
pub fn expand_span(path: &str, start: Time, end: Time, rover: &str, base: &str) -> Vec<String> {
    let step = finest_interval(path);
    let (week, tow) = start.to_gps();
    let mut time = Time::from_gps(week, (tow / step).floor() * step);

    let mut out: Vec<String> = Vec::new();
    while time.diff(&end) <= 0.0 {
        let expanded = expand(path, time, rover, base);
        if out.last().map_or(true, |prev| prev != &expanded) {
            out.push(expanded);
        }
        time = time.add_seconds(step);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens() {
        let t = Time::from_epoch(2021, 6, 1, 13, 47, 5.0).unwrap();
        let path = "%Y/%n/brdc%n0.%yn_%W%D_%ha%t%H";
        let out = expand(path, t, "", "");
        let (week, tow) = t.to_gps();
        let dow = (tow / 86_400.0).floor() as i64;
        assert_eq!(
            out,
            format!("2021/152/brdc1520.21n_{:04}{}_1245n", week, dow)
        );
        /* 2021-06-01 is day 152, hour 13 → 3h block 12, quarter 45,
         * letter n */
    }

    #[test]
    fn station_names() {
        let t = Time::from_epoch(2021, 1, 1, 0, 0, 0.0).unwrap();
        assert_eq!(expand("%r_%b.obs", t, "rov1", "base"), "rov1_base.obs");
        /* empty names leave the tokens in place */
        assert_eq!(expand("%r.obs", t, "", ""), "%r.obs");
        /* no tokens, no work */
        assert_eq!(expand("plain.obs", t, "x", "y"), "plain.obs");
    }

    #[test]
    fn span_enumeration() {
        let start = Time::from_epoch(2021, 6, 1, 0, 10, 0.0).unwrap();
        let end = Time::from_epoch(2021, 6, 1, 3, 0, 0.0).unwrap();
        /* hourly pattern steps by 3600 s */
        let hourly = expand_span("log_%h.bin", start, end, "", "");
        assert_eq!(hourly, vec!["log_00.bin", "log_01.bin", "log_02.bin", "log_03.bin"]);

        /* daily pattern collapses to one file */
        let daily = expand_span("log_%d.bin", start, end, "", "");
        assert_eq!(daily.len(), 1);
        assert_eq!(finest_interval("x%S"), 900.0);
        assert_eq!(finest_interval("x%h"), 3600.0);
        assert_eq!(finest_interval("x%d"), 86_400.0);
    }
}
