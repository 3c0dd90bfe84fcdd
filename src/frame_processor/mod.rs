// SPDX-License-Identifier: MPL-2.0

//! Frame processor module
//!
//! Turns captured frames into decoded payload text. The capture loop only
//! knows the [`PayloadDecoder`] trait, so sessions can be driven by a fake
//! decoder in tests.

pub mod qr_detector;

pub use qr_detector::QrDetector;

use crate::backends::camera::types::CameraFrame;

/// Extracts zero or more text payloads from a frame
///
/// Implementations must treat "nothing found" as an empty result, never as
/// an error.
pub trait PayloadDecoder: Send + Sync {
    fn decode(&self, frame: &CameraFrame) -> Vec<String>;
}
