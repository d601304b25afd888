// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Satellite capacity, PRN ranges and carrier frequencies
//!
//! The per-system PRN ranges are a wire-compatibility constant: satellite
//! numbers are assigned contiguously in the order GPS, GLONASS, Galileo,
//! QZSS, BeiDou, IRNSS, LEO, SBAS.

/// First PRN of the GPS constellation
pub const GPS_FIRST_PRN: u8 = 1;
/// Number of satellites in the GPS constellation
pub const NUM_SATS_GPS: u8 = 32;
/// First PRN of the GLONASS constellation
pub const GLO_FIRST_PRN: u8 = 1;
/// Number of satellites in the GLONASS constellation
pub const NUM_SATS_GLO: u8 = 27;
/// First PRN of the Galileo constellation
pub const GAL_FIRST_PRN: u8 = 1;
/// Number of satellites in the Galileo constellation
pub const NUM_SATS_GAL: u8 = 36;
/// First PRN of the QZSS constellation
pub const QZS_FIRST_PRN: u8 = 193;
/// Number of satellites in the QZSS constellation
pub const NUM_SATS_QZS: u8 = 10;
/// First PRN of the BeiDou constellation
pub const BDS_FIRST_PRN: u8 = 1;
/// Number of satellites in the BeiDou constellation
pub const NUM_SATS_BDS: u8 = 63;
/// First PRN of the IRNSS/NavIC constellation
pub const IRN_FIRST_PRN: u8 = 1;
/// Number of satellites in the IRNSS/NavIC constellation
pub const NUM_SATS_IRN: u8 = 14;
/// First PRN of the LEO augmentation range
pub const LEO_FIRST_PRN: u8 = 1;
/// Number of satellites in the LEO augmentation range
pub const NUM_SATS_LEO: u8 = 10;
/// First PRN of the SBAS range
pub const SBAS_FIRST_PRN: u8 = 120;
/// Number of satellites in the SBAS range
pub const NUM_SATS_SBAS: u8 = 39;

/// Total number of satellites across all supported constellations
pub const MAX_SAT: u16 = NUM_SATS_GPS as u16
    + NUM_SATS_GLO as u16
    + NUM_SATS_GAL as u16
    + NUM_SATS_QZS as u16
    + NUM_SATS_BDS as u16
    + NUM_SATS_IRN as u16
    + NUM_SATS_LEO as u16
    + NUM_SATS_SBAS as u16;

/// Number of carrier frequency slots in an observation record
pub const NUM_FREQ: usize = 5;
/// Number of extended observation slots for codes without a primary slot
pub const NUM_EX_OBS: usize = 2;
/// Total per-frequency array length of an observation record
pub const NUM_OBS_SLOTS: usize = NUM_FREQ + NUM_EX_OBS;

/// L1/E1/B1C carrier frequency (Hz)
pub const FREQ_L1: f64 = 1.575_42e9;
/// L2 carrier frequency (Hz)
pub const FREQ_L2: f64 = 1.227_60e9;
/// L5/E5a/B2a carrier frequency (Hz)
pub const FREQ_L5: f64 = 1.176_45e9;
/// E6/LEX carrier frequency (Hz)
pub const FREQ_E6: f64 = 1.278_75e9;
/// E5b/B2I/B2b carrier frequency (Hz)
pub const FREQ_E5B: f64 = 1.207_14e9;
/// E5a+b/B2ab carrier frequency (Hz)
pub const FREQ_E5AB: f64 = 1.191_795e9;
/// IRNSS S-band carrier frequency (Hz)
pub const FREQ_S: f64 = 2.492_028e9;

/// GLONASS G1 center frequency (Hz)
pub const FREQ1_GLO: f64 = 1.602_00e9;
/// GLONASS G1 FDMA channel spacing (Hz)
pub const DFRQ1_GLO: f64 = 0.562_50e6;
/// GLONASS G2 center frequency (Hz)
pub const FREQ2_GLO: f64 = 1.246_00e9;
/// GLONASS G2 FDMA channel spacing (Hz)
pub const DFRQ2_GLO: f64 = 0.437_50e6;
/// GLONASS G3 (CDMA) carrier frequency (Hz)
pub const FREQ3_GLO: f64 = 1.202_025e9;
/// GLONASS G1a (CDMA) carrier frequency (Hz)
pub const FREQ1A_GLO: f64 = 1.600_995e9;
/// GLONASS G2a (CDMA) carrier frequency (Hz)
pub const FREQ2A_GLO: f64 = 1.248_06e9;

/// BeiDou B1I carrier frequency (Hz)
pub const FREQ1_BDS: f64 = 1.561_098e9;
/// BeiDou B2I/B2b carrier frequency (Hz)
pub const FREQ2_BDS: f64 = 1.207_14e9;
/// BeiDou B3I carrier frequency (Hz)
pub const FREQ3_BDS: f64 = 1.268_52e9;

/// Minimum GLONASS frequency channel number
pub const GLO_MIN_FCN: i8 = -7;
/// Maximum GLONASS frequency channel number
pub const GLO_MAX_FCN: i8 = 6;

/// Highest valid numeric observation code
pub const MAX_CODE: u8 = 68;
