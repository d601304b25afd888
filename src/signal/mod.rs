// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Satellite and signal identity
//!
//! A satellite is identified either by a compact number in `1..=MAX_SAT`
//! that is unique across all constellations, or by a
//! ([`System`], PRN) pair. The mapping between the two forms is a fixed
//! bijection over contiguous per-system ranges; both forms appear on the
//! wire so the range tables are part of the protocol contract.
//!
//! This module provides:
//! - [`System`] - the supported GNSS constellations
//! - [`Sat`] - a satellite identity valid in every constellation
//! - [`Code`] - the observation-code table and code → frequency mapping
//! - [`CodePriorities`] - selection of the preferred code per frequency slot

mod code;
pub mod consts;
mod priority;

pub use code::*;
pub use priority::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// GNSS constellation identifiers
///
/// The enum order defines the satellite numbering order and must not change.
#[derive(
    Debug,
    Copy,
    Clone,
    Ord,
    PartialOrd,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
)]
pub enum System {
    /// Global Positioning System (USA)
    #[strum(to_string = "GPS")]
    Gps,
    /// GLONASS (Russia)
    #[strum(to_string = "GLO")]
    Glo,
    /// Galileo (EU)
    #[strum(to_string = "GAL")]
    Gal,
    /// Quasi-Zenith Satellite System (Japan)
    #[strum(to_string = "QZS")]
    Qzs,
    /// BeiDou (China)
    #[strum(to_string = "BDS")]
    Bds,
    /// IRNSS / NavIC (India)
    #[strum(to_string = "IRN")]
    Irn,
    /// LEO augmentation range
    #[strum(to_string = "LEO")]
    Leo,
    /// Satellite Based Augmentation Systems
    #[strum(to_string = "SBS")]
    Sbs,
}

impl System {
    /// All systems in satellite-numbering order
    pub(crate) const ALL: [System; 8] = [
        System::Gps,
        System::Glo,
        System::Gal,
        System::Qzs,
        System::Bds,
        System::Irn,
        System::Leo,
        System::Sbs,
    ];

    /// Gets the first valid PRN of the system
    #[must_use]
    pub fn first_prn(self) -> u8 {
        match self {
            System::Gps => consts::GPS_FIRST_PRN,
            System::Glo => consts::GLO_FIRST_PRN,
            System::Gal => consts::GAL_FIRST_PRN,
            System::Qzs => consts::QZS_FIRST_PRN,
            System::Bds => consts::BDS_FIRST_PRN,
            System::Irn => consts::IRN_FIRST_PRN,
            System::Leo => consts::LEO_FIRST_PRN,
            System::Sbs => consts::SBAS_FIRST_PRN,
        }
    }

    /// Gets the number of satellites in the system
    #[must_use]
    pub fn sat_count(self) -> u8 {
        match self {
            System::Gps => consts::NUM_SATS_GPS,
            System::Glo => consts::NUM_SATS_GLO,
            System::Gal => consts::NUM_SATS_GAL,
            System::Qzs => consts::NUM_SATS_QZS,
            System::Bds => consts::NUM_SATS_BDS,
            System::Irn => consts::NUM_SATS_IRN,
            System::Leo => consts::NUM_SATS_LEO,
            System::Sbs => consts::NUM_SATS_SBAS,
        }
    }

    /// Gets the single-letter identifier used in string satellite forms
    #[must_use]
    pub fn letter(self) -> char {
        match self {
            System::Gps => 'G',
            System::Glo => 'R',
            System::Gal => 'E',
            System::Qzs => 'J',
            System::Bds => 'C',
            System::Irn => 'I',
            System::Leo => 'L',
            System::Sbs => 'S',
        }
    }

    /// Looks a system up by its single-letter identifier, case-insensitively
    #[must_use]
    pub fn from_letter(letter: char) -> Option<System> {
        let letter = letter.to_ascii_uppercase();
        System::ALL.iter().copied().find(|s| s.letter() == letter)
    }

    /// Offset of the system's first satellite within the compact numbering
    fn sat_offset(self) -> u16 {
        let mut offset = 0u16;
        let mut i = 0;
        while i < System::ALL.len() {
            if (System::ALL[i] as u8) == (self as u8) {
                break;
            }
            offset += System::ALL[i].sat_count() as u16;
            i += 1;
        }
        offset
    }
}

/// An error raised when a (system, PRN) pair or satellite number is outside
/// the valid ranges
#[derive(thiserror::Error, Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[error("The satellite number is not valid for the associated system ({0})")]
pub struct InvalidSatellite(pub u16);

/// An error raised when a satellite string form cannot be parsed
#[derive(thiserror::Error, Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[error("Unparseable satellite identifier \"{0}\"")]
pub struct InvalidSatString(String);

/// Compact satellite identity, unique across all constellations
///
/// The inner number is in `1..=MAX_SAT`. The string form is `Gnn`, `Rnn`,
/// `Enn`, `Jnn`, `Cnn` or `Inn` with the system PRN, or the bare PRN for
/// SBAS satellites.
#[derive(
    Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize,
)]
pub struct Sat(u16);

impl Sat {
    /// Makes a satellite identity from a system and PRN, checking the range
    pub fn new(system: System, prn: u8) -> Result<Sat, InvalidSatellite> {
        let first = system.first_prn();
        if prn < first || prn >= first + system.sat_count() {
            return Err(InvalidSatellite(prn as u16));
        }
        Ok(Sat(
            system.sat_offset() + (prn - first) as u16 + 1,
        ))
    }

    /// Makes a satellite identity from its compact number in `1..=MAX_SAT`
    pub fn from_number(no: u16) -> Result<Sat, InvalidSatellite> {
        if no == 0 || no > consts::MAX_SAT {
            return Err(InvalidSatellite(no));
        }
        Ok(Sat(no))
    }

    /// Gets the compact satellite number in `1..=MAX_SAT`
    #[must_use]
    pub fn number(self) -> u16 {
        self.0
    }

    /// Gets the zero-based index used to address per-satellite tables
    #[must_use]
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Gets the satellite's system
    #[must_use]
    pub fn system(self) -> System {
        let mut rem = self.0 - 1;
        for sys in System::ALL.iter() {
            if rem < sys.sat_count() as u16 {
                return *sys;
            }
            rem -= sys.sat_count() as u16;
        }
        /* from_number() bounds the value to the table */
        unreachable!()
    }

    /// Gets the satellite's PRN within its system
    #[must_use]
    pub fn prn(self) -> u8 {
        let mut rem = self.0 - 1;
        for sys in System::ALL.iter() {
            if rem < sys.sat_count() as u16 {
                return sys.first_prn() + rem as u8;
            }
            rem -= sys.sat_count() as u16;
        }
        unreachable!()
    }
}

impl fmt::Display for Sat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sys = self.system();
        match sys {
            System::Sbs => write!(f, "{:03}", self.prn()),
            /* QZSS string PRNs count from 1, not 193 */
            System::Qzs => write!(f, "J{:02}", self.prn() - consts::QZS_FIRST_PRN + 1),
            _ => write!(f, "{}{:02}", sys.letter(), self.prn()),
        }
    }
}

impl FromStr for Sat {
    type Err = InvalidSatString;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let first = chars.next().ok_or_else(|| InvalidSatString(s.to_string()))?;

        if first.is_ascii_digit() {
            /* bare PRN form, SBAS range */
            let prn: u8 = s.parse().map_err(|_| InvalidSatString(s.to_string()))?;
            return Sat::new(System::Sbs, prn).map_err(|_| InvalidSatString(s.to_string()));
        }

        let sys = System::from_letter(first).ok_or_else(|| InvalidSatString(s.to_string()))?;
        let mut prn: u8 = chars
            .as_str()
            .parse()
            .map_err(|_| InvalidSatString(s.to_string()))?;
        if sys == System::Qzs && prn < consts::QZS_FIRST_PRN {
            prn = prn
                .checked_add(consts::QZS_FIRST_PRN - 1)
                .ok_or_else(|| InvalidSatString(s.to_string()))?;
        }
        Sat::new(sys, prn).map_err(|_| InvalidSatString(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn numbering_is_a_bijection() {
        let mut next = 1u16;
        for sys in System::ALL.iter() {
            for prn in sys.first_prn()..(sys.first_prn() + sys.sat_count()) {
                let sat = Sat::new(*sys, prn).unwrap();
                assert_eq!(sat.number(), next);
                assert_eq!(sat.system(), *sys);
                assert_eq!(sat.prn(), prn);
                next += 1;
            }
        }
        assert_eq!(next - 1, consts::MAX_SAT);
    }

    #[test]
    fn out_of_range_prns() {
        assert!(Sat::new(System::Gps, 0).is_err());
        assert!(Sat::new(System::Gps, 33).is_err());
        assert!(Sat::new(System::Qzs, 192).is_err());
        assert!(Sat::new(System::Qzs, 203).is_err());
        assert!(Sat::new(System::Sbs, 119).is_err());
        assert!(Sat::new(System::Sbs, 159).is_err());
        assert!(Sat::from_number(0).is_err());
        assert!(Sat::from_number(consts::MAX_SAT + 1).is_err());
    }

    #[test]
    fn string_forms() {
        assert_eq!(Sat::new(System::Gps, 5).unwrap().to_string(), "G05");
        assert_eq!(Sat::new(System::Glo, 11).unwrap().to_string(), "R11");
        assert_eq!(Sat::new(System::Gal, 36).unwrap().to_string(), "E36");
        assert_eq!(Sat::new(System::Qzs, 193).unwrap().to_string(), "J01");
        assert_eq!("J02".parse::<Sat>().unwrap(), Sat::new(System::Qzs, 194).unwrap());
        assert_eq!(Sat::new(System::Sbs, 129).unwrap().to_string(), "129");

        assert_eq!("G05".parse::<Sat>().unwrap(), Sat::new(System::Gps, 5).unwrap());
        assert_eq!("r07".parse::<Sat>().unwrap(), Sat::new(System::Glo, 7).unwrap());
        assert_eq!("133".parse::<Sat>().unwrap(), Sat::new(System::Sbs, 133).unwrap());
        assert!("X01".parse::<Sat>().is_err());
        assert!("G99".parse::<Sat>().is_err());
        assert!("".parse::<Sat>().is_err());
    }

    proptest! {
        #[test]
        fn roundtrip_number(no in 1u16..=consts::MAX_SAT) {
            let sat = Sat::from_number(no).unwrap();
            let again = Sat::new(sat.system(), sat.prn()).unwrap();
            prop_assert_eq!(again.number(), no);
        }
    }
}
