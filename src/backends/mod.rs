// SPDX-License-Identifier: MPL-2.0

//! Hardware access layer
//!
//! - [`camera`]: device enumeration and the capture+decode loop
//!
//! Everything above this layer talks to cameras through the
//! [`camera::CameraBackend`] trait, so a kiosk without a webcam (or a test)
//! can swap in the image-directory backend.

pub mod camera;
