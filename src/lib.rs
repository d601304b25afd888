// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! `gnss-core` decodes GNSS observation and correction streams and
//! provides the geodetic, temporal and numerical building blocks a
//! positioning engine consumes. Binary frames from RTCM 2, RTCM 3
//! (including Multiple Signal Messages and State-Space Representation
//! corrections), SBAS and the NVS BINR receiver protocol feed through
//! per-stream state machines into a shared observation / ephemeris /
//! correction data model. `gnss-core` is a "bring your own solver"
//! library: it does not run a positioning loop itself.
//!
//! ## [Signal](`signal`)
//! Satellite identity across all constellations, the observation-code
//! table, carrier frequencies and code priority selection.
//!
//! ## [Time](`time`)
//! The time point type, calendar and week/time-of-week conversions, the
//! leap-second table and the injectable clock capability.
//!
//! ## [Bits](`bits`) and [Checksums](`edc`)
//! Big-endian bit field access and the CRC flavors of the wire formats.
//!
//! ## [Matrix](`matrix`)
//! The column-major numeric kernel: matrix multiply, LU inverse, least
//! squares, Kalman filter update and RTS smoother.
//!
//! ## [Coordinates](`coords`), [Atmosphere](`atmosphere`) and
//! [Celestial](`celestial`)
//! Frame conversions, satellite geometry, DOP figures, broadcast
//! atmosphere models and the ECI↔ECEF transform with sun/moon positions.
//!
//! ## Decoders
//! [`rtcm2`], [`rtcm3`], [`sbas`] and [`binr`] each feed one byte at a
//! time and report completed decodes through the shared
//! [`decoder::Event`] family. Decoded data accumulates in
//! [`eph::NavData`], [`obs::ObsEpoch`] snapshots, [`ssr::SsrCorrection`]
//! records and the [`sbas::SbasEngine`] correction state.

pub mod atmosphere;
pub mod binr;
pub mod bits;
pub mod celestial;
pub mod consts;
pub mod coords;
pub mod decoder;
pub mod edc;
pub mod eph;
pub mod matrix;
pub mod obs;
pub mod path;
pub mod rtcm2;
pub mod rtcm3;
pub mod sbas;
pub mod signal;
pub mod ssr;
pub mod station;
pub mod time;
