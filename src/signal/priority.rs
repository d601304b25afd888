// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.

use super::{consts, Code, System};

/// The highest priority, reserved for codes forced by a decode option
pub const FORCED_PRIORITY: u8 = 15;

/// Default priority strings per system and frequency slot
///
/// Within one string, earlier attribute characters outrank later ones.
const DEFAULT_PRIORITIES: [[&str; consts::NUM_FREQ]; 8] = [
    /* GPS */
    ["CPYWMNSL", "PYWCMNDLSX", "IQX", "", ""],
    /* GLO */
    ["CPABX", "CPABX", "IQX", "ABX", "ABX"],
    /* GAL */
    ["CABXZ", "IQX", "IQX", "ABCXZ", "IQX"],
    /* QZS */
    ["CLSXZ", "LSX", "IQXDPZ", "LSXEZ", ""],
    /* BDS */
    ["IQX", "IQXDPZ", "IQXA", "DPXA", "DPX"],
    /* IRN */
    ["ABCX", "ABCX", "", "", ""],
    /* LEO */
    ["CPYWMNSL", "", "", "", ""],
    /* SBS */
    ["C", "", "IQX", "", ""],
];

/// Per-system, per-frequency-slot observation code priorities
///
/// When several physical codes of the same band are present in one message
/// the priorities decide which one fills the frequency slot of the output
/// observation record. The tables are set up once before decoding starts.
#[derive(Debug, Clone)]
pub struct CodePriorities {
    tables: [[String; consts::NUM_FREQ]; 8],
}

impl Default for CodePriorities {
    fn default() -> Self {
        let mut tables: [[String; consts::NUM_FREQ]; 8] = Default::default();
        for (sys_idx, row) in DEFAULT_PRIORITIES.iter().enumerate() {
            for (freq_idx, pri) in row.iter().enumerate() {
                tables[sys_idx][freq_idx] = (*pri).to_string();
            }
        }
        CodePriorities { tables }
    }
}

impl CodePriorities {
    /// Replaces the priority string of one system/frequency-slot pair
    pub fn set(&mut self, system: System, freq_index: usize, priorities: &str) {
        if freq_index < consts::NUM_FREQ {
            self.tables[system as usize][freq_index] = priorities.to_string();
        }
    }

    /// Gets the priority of a code, honoring forced-code decode options
    ///
    /// The option string may carry markers of the form `-GL1X` (a dash, a
    /// system letter, `L` and a two-character code designator); a marker
    /// matching this code forces [`FORCED_PRIORITY`]. The system letter is
    /// matched case-insensitively, the designator case-sensitively.
    /// Codes absent from the priority table get priority 0.
    #[must_use]
    pub fn priority(&self, system: System, code: Code, opt: &str) -> u8 {
        let obs = code.obs_str();
        if obs.is_empty() {
            return 0;
        }

        if Self::forced_by_option(system, obs, opt) {
            return FORCED_PRIORITY;
        }

        let freq_index = match code.freq_index(system) {
            Some(idx) if idx < consts::NUM_FREQ => idx,
            _ => return 0,
        };

        let attribute = match code.attribute() {
            Some(c) => c,
            None => return 0,
        };

        match self.tables[system as usize][freq_index].find(attribute) {
            Some(pos) => 14 - pos as u8,
            None => 0,
        }
    }

    fn forced_by_option(system: System, obs: &str, opt: &str) -> bool {
        let bytes = opt.as_bytes();
        let tail = obs.as_bytes();
        for i in 0..bytes.len() {
            if bytes[i] != b'-' || i + 3 + tail.len() > bytes.len() {
                continue;
            }
            let sys_char = (bytes[i + 1] as char).to_ascii_uppercase();
            if sys_char == system.letter()
                && bytes[i + 2] == b'L'
                && &bytes[i + 3..i + 3 + tail.len()] == tail
            {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let pri = CodePriorities::default();
        /* GPS L1: C outranks P outranks W */
        assert_eq!(pri.priority(System::Gps, Code::L1C, ""), 14);
        assert_eq!(pri.priority(System::Gps, Code::L1P, ""), 13);
        assert_eq!(pri.priority(System::Gps, Code::L1W, ""), 11);
        /* absent attribute */
        assert_eq!(pri.priority(System::Gps, Code::L1I, ""), 0);
        assert_eq!(pri.priority(System::Gps, Code::None, ""), 0);
        /* band unused by the system */
        assert_eq!(pri.priority(System::Gps, Code::L9A, ""), 0);
    }

    #[test]
    fn set_get_roundtrip() {
        let mut pri = CodePriorities::default();
        pri.set(System::Gal, 2, "XQI");
        assert_eq!(pri.priority(System::Gal, Code::L5X, ""), 14);
        assert_eq!(pri.priority(System::Gal, Code::L5Q, ""), 13);
        assert_eq!(pri.priority(System::Gal, Code::L5I, ""), 12);
    }

    #[test]
    fn forced_option() {
        let pri = CodePriorities::default();
        assert_eq!(pri.priority(System::Gps, Code::L2S, "-GL2S"), FORCED_PRIORITY);
        /* system letter is case-insensitive */
        assert_eq!(pri.priority(System::Gps, Code::L2S, "-gL2S"), FORCED_PRIORITY);
        /* code characters are case-sensitive */
        assert_ne!(pri.priority(System::Gps, Code::L2S, "-GL2s"), FORCED_PRIORITY);
        /* marker for another system leaves the priority untouched */
        assert_eq!(pri.priority(System::Gps, Code::L2S, "-EL2S"), 6);
        /* marker embedded in a longer option string */
        assert_eq!(
            pri.priority(System::Glo, Code::L2C, "-TADJ=0.1 -RL2C"),
            FORCED_PRIORITY
        );
    }
}
