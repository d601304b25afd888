// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.

use super::{consts, System};
use serde::{Deserialize, Serialize};

/// Observation code identifiers
///
/// The numeric value of each variant is the on-wire code number; the table
/// order is a protocol contract and must not be rearranged. The string form
/// is the two-character band/attribute designator ("1C", "2W", ...).
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
    strum::FromRepr,
    strum::IntoStaticStr,
)]
#[repr(u8)]
pub enum Code {
    /// Code absent
    #[strum(to_string = "")]
    None = 0,
    /// L1 C/A, G1 C/A, E1 C, B1C pilot+data
    #[strum(to_string = "1C")]
    L1C,
    /// L1 P, G1 P
    #[strum(to_string = "1P")]
    L1P,
    /// L1 Z-tracking
    #[strum(to_string = "1W")]
    L1W,
    /// L1 Y
    #[strum(to_string = "1Y")]
    L1Y,
    /// L1 M
    #[strum(to_string = "1M")]
    L1M,
    /// L1 codeless
    #[strum(to_string = "1N")]
    L1N,
    /// L1C data
    #[strum(to_string = "1S")]
    L1S,
    /// L1C pilot
    #[strum(to_string = "1L")]
    L1L,
    /// L1C data+pilot (legacy designator)
    #[strum(to_string = "1E")]
    L1E,
    /// E1 A, B1A data
    #[strum(to_string = "1A")]
    L1A,
    /// E1 B
    #[strum(to_string = "1B")]
    L1B,
    /// L1C(D+P), E1 B+C, B1C data+pilot
    #[strum(to_string = "1X")]
    L1X,
    /// E1 A+B+C
    #[strum(to_string = "1Z")]
    L1Z,
    /// L2 C/A, G2 C/A
    #[strum(to_string = "2C")]
    L2C,
    /// L2 semi-codeless
    #[strum(to_string = "2D")]
    L2D,
    /// L2C(M)
    #[strum(to_string = "2S")]
    L2S,
    /// L2C(L)
    #[strum(to_string = "2L")]
    L2L,
    /// L2C(M+L)
    #[strum(to_string = "2X")]
    L2X,
    /// L2 P, G2 P
    #[strum(to_string = "2P")]
    L2P,
    /// L2 Z-tracking
    #[strum(to_string = "2W")]
    L2W,
    /// L2 Y
    #[strum(to_string = "2Y")]
    L2Y,
    /// L2 M
    #[strum(to_string = "2M")]
    L2M,
    /// L2 codeless
    #[strum(to_string = "2N")]
    L2N,
    /// L5/E5a/B2a data
    #[strum(to_string = "5I")]
    L5I,
    /// L5/E5a/B2a pilot
    #[strum(to_string = "5Q")]
    L5Q,
    /// L5/E5a/B2a data+pilot
    #[strum(to_string = "5X")]
    L5X,
    /// E5b/B2I/B2b data
    #[strum(to_string = "7I")]
    L7I,
    /// E5b/B2I/B2b pilot
    #[strum(to_string = "7Q")]
    L7Q,
    /// E5b/B2I/B2b data+pilot
    #[strum(to_string = "7X")]
    L7X,
    /// E6 A, B3A
    #[strum(to_string = "6A")]
    L6A,
    /// E6 B
    #[strum(to_string = "6B")]
    L6B,
    /// E6 C
    #[strum(to_string = "6C")]
    L6C,
    /// E6 B+C, LEX(S+L), B3I+Q
    #[strum(to_string = "6X")]
    L6X,
    /// E6 A+B+C
    #[strum(to_string = "6Z")]
    L6Z,
    /// LEX S
    #[strum(to_string = "6S")]
    L6S,
    /// LEX L
    #[strum(to_string = "6L")]
    L6L,
    /// E5a+b pilot
    #[strum(to_string = "8L")]
    L8L,
    /// E5a+b Q
    #[strum(to_string = "8Q")]
    L8Q,
    /// E5a+b data+pilot
    #[strum(to_string = "8X")]
    L8X,
    /// B1I data
    #[strum(to_string = "2I")]
    L2I,
    /// B1I pilot
    #[strum(to_string = "2Q")]
    L2Q,
    /// B3I data
    #[strum(to_string = "6I")]
    L6I,
    /// B3I pilot
    #[strum(to_string = "6Q")]
    L6Q,
    /// G3 data
    #[strum(to_string = "3I")]
    L3I,
    /// G3 pilot
    #[strum(to_string = "3Q")]
    L3Q,
    /// G3 data+pilot
    #[strum(to_string = "3X")]
    L3X,
    /// B1I (RINEX 3.02 designator)
    #[strum(to_string = "1I")]
    L1I,
    /// B1Q (RINEX 3.02 designator)
    #[strum(to_string = "1Q")]
    L1Q,
    /// L5 A (IRNSS SPS)
    #[strum(to_string = "5A")]
    L5A,
    /// L5 B (IRNSS RS data)
    #[strum(to_string = "5B")]
    L5B,
    /// L5 C (IRNSS RS pilot)
    #[strum(to_string = "5C")]
    L5C,
    /// S-band A (IRNSS SPS)
    #[strum(to_string = "9A")]
    L9A,
    /// S-band B (IRNSS RS data)
    #[strum(to_string = "9B")]
    L9B,
    /// S-band C (IRNSS RS pilot)
    #[strum(to_string = "9C")]
    L9C,
    /// S-band B+C
    #[strum(to_string = "9X")]
    L9X,
    /// L1C/B1C data
    #[strum(to_string = "1D")]
    L1D,
    /// L5/B2a data
    #[strum(to_string = "5D")]
    L5D,
    /// L5/B2a pilot
    #[strum(to_string = "5P")]
    L5P,
    /// L5 data+pilot (QZSS block II)
    #[strum(to_string = "5Z")]
    L5Z,
    /// L6E (QZSS CLAS)
    #[strum(to_string = "6E")]
    L6E,
    /// B2b data
    #[strum(to_string = "7D")]
    L7D,
    /// B2b pilot
    #[strum(to_string = "7P")]
    L7P,
    /// B2b data+pilot
    #[strum(to_string = "7Z")]
    L7Z,
    /// B2a+b data
    #[strum(to_string = "8D")]
    L8D,
    /// B2a+b pilot
    #[strum(to_string = "8P")]
    L8P,
    /// G1a data
    #[strum(to_string = "4A")]
    L4A,
    /// G1a pilot
    #[strum(to_string = "4B")]
    L4B,
    /// B3A data
    #[strum(to_string = "6D")]
    L6D,
}

impl Code {
    /// Looks an observation code up by its two-character designator
    ///
    /// Unknown designators yield [`Code::None`], matching the wire contract
    /// that unknown signals decode to the absent code.
    #[must_use]
    pub fn from_obs_str(obs: &str) -> Code {
        obs.parse().unwrap_or(Code::None)
    }

    /// Gets the two-character designator of the code
    #[must_use]
    pub fn obs_str(self) -> &'static str {
        self.into()
    }

    /// Gets the numeric wire value of the code
    #[must_use]
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Looks an observation code up by its numeric wire value
    #[must_use]
    pub fn from_number(num: u8) -> Option<Code> {
        Code::from_repr(num)
    }

    /// Gets the frequency band character (the first designator character)
    #[must_use]
    pub fn band(self) -> Option<char> {
        self.obs_str().chars().next()
    }

    /// Gets the attribute character (the second designator character)
    #[must_use]
    pub fn attribute(self) -> Option<char> {
        self.obs_str().chars().nth(1)
    }

    /// Gets the frequency slot index of the code for the given system
    ///
    /// Returns `None` when the band is not used by the system.
    #[must_use]
    pub fn freq_index(self, system: System) -> Option<usize> {
        let band = self.band()?;
        match system {
            System::Gps => match band {
                '1' => Some(0),
                '2' => Some(1),
                '5' => Some(2),
                _ => None,
            },
            System::Glo => match band {
                '1' => Some(0),
                '2' => Some(1),
                '3' => Some(2),
                '4' => Some(3),
                '6' => Some(4),
                _ => None,
            },
            System::Gal => match band {
                '1' => Some(0),
                '7' => Some(1),
                '5' => Some(2),
                '6' => Some(3),
                '8' => Some(4),
                _ => None,
            },
            System::Qzs => match band {
                '1' => Some(0),
                '2' => Some(1),
                '5' => Some(2),
                '6' => Some(3),
                _ => None,
            },
            System::Bds => match band {
                '2' => Some(0),
                '7' => Some(1),
                '6' => Some(2),
                '1' => Some(3),
                '5' => Some(4),
                _ => None,
            },
            System::Irn => match band {
                '5' => Some(0),
                '9' => Some(1),
                _ => None,
            },
            System::Leo => match band {
                '1' => Some(0),
                _ => None,
            },
            System::Sbs => match band {
                '1' => Some(0),
                '5' => Some(2),
                _ => None,
            },
        }
    }

    /// Gets the carrier frequency of the code for the given system in Hz
    ///
    /// GLONASS FDMA bands require the satellite frequency channel number
    /// in `-7..=6`; it is ignored for every other band and system.
    /// Returns `None` when the band is not used by the system.
    #[must_use]
    pub fn carrier_frequency(self, system: System, fcn: i8) -> Option<f64> {
        let band = self.band()?;
        match system {
            System::Gps | System::Leo => match band {
                '1' => Some(consts::FREQ_L1),
                '2' => Some(consts::FREQ_L2),
                '5' => Some(consts::FREQ_L5),
                _ => None,
            },
            System::Glo => match band {
                '1' => Some(consts::FREQ1_GLO + consts::DFRQ1_GLO * f64::from(fcn)),
                '2' => Some(consts::FREQ2_GLO + consts::DFRQ2_GLO * f64::from(fcn)),
                '3' => Some(consts::FREQ3_GLO),
                '4' => Some(consts::FREQ1A_GLO),
                '6' => Some(consts::FREQ2A_GLO),
                _ => None,
            },
            System::Gal => match band {
                '1' => Some(consts::FREQ_L1),
                '7' => Some(consts::FREQ_E5B),
                '5' => Some(consts::FREQ_L5),
                '6' => Some(consts::FREQ_E6),
                '8' => Some(consts::FREQ_E5AB),
                _ => None,
            },
            System::Qzs => match band {
                '1' => Some(consts::FREQ_L1),
                '2' => Some(consts::FREQ_L2),
                '5' => Some(consts::FREQ_L5),
                '6' => Some(consts::FREQ_E6),
                _ => None,
            },
            System::Bds => match band {
                '1' => Some(consts::FREQ_L1),
                '2' => Some(consts::FREQ1_BDS),
                '5' => Some(consts::FREQ_L5),
                '6' => Some(consts::FREQ3_BDS),
                '7' => Some(consts::FREQ2_BDS),
                '8' => Some(consts::FREQ_E5AB),
                _ => None,
            },
            System::Irn => match band {
                '5' => Some(consts::FREQ_L5),
                '9' => Some(consts::FREQ_S),
                _ => None,
            },
            System::Sbs => match band {
                '1' => Some(consts::FREQ_L1),
                '5' => Some(consts::FREQ_L5),
                _ => None,
            },
        }
    }
}

impl Default for Code {
    fn default() -> Self {
        Code::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn table_roundtrip() {
        for num in 1..=consts::MAX_CODE {
            let code = Code::from_number(num).unwrap();
            assert_eq!(Code::from_obs_str(code.obs_str()), code);
            assert_eq!(code.number(), num);
            assert_eq!(code.obs_str().len(), 2);
        }
        assert_eq!(Code::iter().count() as u8, consts::MAX_CODE + 1);
    }

    #[test]
    fn unknown_designators() {
        assert_eq!(Code::from_obs_str("0Z"), Code::None);
        assert_eq!(Code::from_obs_str("zz"), Code::None);
        assert_eq!(Code::from_obs_str(""), Code::None);
        assert!(Code::from_number(consts::MAX_CODE + 1).is_none());
    }

    #[test]
    fn known_values() {
        assert_eq!(Code::L1C.number(), 1);
        assert_eq!(Code::L2W.number(), 20);
        assert_eq!(Code::L5I.number(), 24);
        assert_eq!(Code::L6D.number(), 68);
        assert_eq!(Code::from_obs_str("2W"), Code::L2W);
    }

    #[test]
    fn frequencies() {
        assert_eq!(
            Code::L1C.carrier_frequency(System::Gps, 0).unwrap(),
            1.575_42e9
        );
        assert_eq!(
            Code::L2W.carrier_frequency(System::Gps, 0).unwrap(),
            1.227_60e9
        );
        /* GLONASS FDMA channels move by the channel spacing */
        let f_plus = Code::L1C.carrier_frequency(System::Glo, 3).unwrap();
        let f_zero = Code::L1C.carrier_frequency(System::Glo, 0).unwrap();
        float_eq::assert_float_eq!(f_plus - f_zero, 3.0 * 0.562_50e6, abs <= 1e-3);
        let f2 = Code::L2C.carrier_frequency(System::Glo, -7).unwrap();
        float_eq::assert_float_eq!(f2, 1.246_00e9 - 7.0 * 0.437_50e6, abs <= 1e-3);
        /* Galileo E5b sits in slot 1, E5a in slot 2 */
        assert_eq!(Code::L7Q.freq_index(System::Gal).unwrap(), 1);
        assert_eq!(Code::L5Q.freq_index(System::Gal).unwrap(), 2);
        /* BeiDou B1I is the primary slot */
        assert_eq!(Code::L2I.freq_index(System::Bds).unwrap(), 0);
        assert_eq!(
            Code::L2I.carrier_frequency(System::Bds, 0).unwrap(),
            1.561_098e9
        );
        /* band not used by the system */
        assert!(Code::L9A.freq_index(System::Gps).is_none());
        assert!(Code::L9A.carrier_frequency(System::Gps, 0).is_none());
    }
}
