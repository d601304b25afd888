// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Reference station parameters

use serde::{Deserialize, Serialize};

/// Antenna delta reference: local east-north-up offsets
pub const DEL_TYPE_ENU: u8 = 0;
/// Antenna delta reference: ECEF offsets
pub const DEL_TYPE_XYZ: u8 = 1;

/// Reference station and antenna parameters
///
/// Carried by RTCM station description messages (1005/1006/1007/1008/1033
/// and the RTCM 2 types 3/22); consumed by the baseline processor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationInfo {
    /// Station name or marker number
    pub name: String,
    /// Antenna descriptor
    pub antenna_descriptor: String,
    /// Antenna serial number
    pub antenna_serial: String,
    /// Receiver type descriptor
    pub receiver_descriptor: String,
    /// Receiver firmware version
    pub receiver_version: String,
    /// Receiver serial number
    pub receiver_serial: String,
    /// Antenna setup id
    pub antenna_setup: i32,
    /// ITRF realization year
    pub itrf: i32,
    /// Antenna delta reference, [`DEL_TYPE_ENU`] or [`DEL_TYPE_XYZ`]
    pub del_type: u8,
    /// Antenna reference point position, ECEF (m)
    pub pos: [f64; 3],
    /// Antenna position delta (m), interpreted per `del_type`
    pub del: [f64; 3],
    /// Antenna height above the marker (m)
    pub hgt: f64,
    /// Glonass code-phase alignment flag
    pub glo_align: bool,
}
