// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Stream decoder events
//!
//! Every wire protocol decoder is a single-byte feeder: bytes go in, the
//! framing state machine advances (hunt → accumulate → checksum →
//! dispatch) and each call reports what, if anything, completed. All
//! decoders share this [`Event`] family so a consumer can multiplex
//! streams without caring which protocol produced an update.

use crate::eph::EphSet;
use crate::obs::ObsEpoch;
use crate::sbas::SbasMessage;
use crate::signal::Sat;

/// Outcome of feeding one byte into a protocol decoder
#[derive(Debug, Clone)]
pub enum Event {
    /// Nothing completed; keep feeding bytes
    None,
    /// A full observation epoch was assembled (sync bit cleared or the
    /// epoch time advanced); handed out by value
    Observations(ObsEpoch),
    /// An ephemeris was decoded into the decoder's navigation store;
    /// carries the satellite and the message set it belongs to
    Ephemeris(Sat, EphSet),
    /// A raw SBAS message frame was decoded
    SbasMessage(SbasMessage),
    /// Broadcast ionosphere or UTC parameters were updated
    IonUtcParams,
    /// Station coordinates were updated
    StationParams,
    /// Antenna or receiver descriptors were updated
    AntennaParams,
    /// A state-space correction record was updated
    SsrCorrection,
    /// A framing, length or checksum failure; the framer resynchronized
    /// and no decoded state changed
    Error,
}

impl Event {
    /// Checks whether the event carries a completed decode
    #[must_use]
    pub fn is_some(&self) -> bool {
        !matches!(self, Event::None | Event::Error)
    }
}
