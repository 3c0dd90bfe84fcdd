// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CameraBackendType {
    /// Native Linux video devices (/dev/video*)
    #[default]
    V4l2,
    /// Virtual camera replaying still images from a directory
    Files,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::V4l2 => write!(f, "V4L2"),
            CameraBackendType::Files => write!(f, "image files"),
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Stable identifier used to select the device (device node or file path)
    pub id: String,
    /// Human readable label; may be empty when the platform reports none
    pub label: String,
    /// Backend that enumerated the device
    pub backend: CameraBackendType,
}

impl CameraDevice {
    /// Label for display, falling back to the id like `Camera /dev/video0`
    pub fn display_name(&self) -> String {
        if self.label.trim().is_empty() {
            format!("Camera {}", self.id)
        } else {
            self.label.clone()
        }
    }
}

/// Pixel layout of frame data handed to decoders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit luma, one byte per pixel
    Gray8,
    /// 8-bit RGBA, four bytes per pixel
    Rgba,
}

impl PixelFormat {
    /// Bytes per pixel of the packed layout
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgba => 4,
        }
    }
}

/// A single captured frame
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    /// Bytes per row, including any padding
    pub stride: u32,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed greyscale frame
    pub fn gray(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            format: PixelFormat::Gray8,
            stride: width,
            captured_at: Instant::now(),
        }
    }

    /// Luma value at a pixel, 0 for out-of-range reads
    ///
    /// RGBA pixels are converted with integer BT.601 weights.
    pub fn luma_at(&self, x: u32, y: u32) -> u8 {
        let bpp = self.format.bytes_per_pixel();
        let offset = y as usize * self.stride as usize + x as usize * bpp;
        match self.format {
            PixelFormat::Gray8 => self.data.get(offset).copied().unwrap_or(0),
            PixelFormat::Rgba => match self.data.get(offset..offset + 3) {
                Some(px) => {
                    let (r, g, b) = (px[0] as u32, px[1] as u32, px[2] as u32);
                    ((r * 299 + g * 587 + b * 114) / 1000) as u8
                }
                None => 0,
            },
        }
    }
}

/// Configuration for a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Frames sampled per second
    pub fps: u32,
    /// Centred square detection window (pixels); frames smaller than the
    /// window are decoded whole
    pub window: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            fps: crate::constants::scan::DEFAULT_FPS,
            window: crate::constants::scan::DEFAULT_WINDOW_SIZE,
        }
    }
}

impl CaptureSettings {
    /// Time budget for one loop iteration
    pub fn frame_interval(&self) -> std::time::Duration {
        let fps = self.fps.clamp(1, crate::constants::scan::MAX_FPS);
        std::time::Duration::from_millis(1000 / fps as u64)
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Enumeration found no devices
    NoCameraFound,
    /// The platform denied access to a device
    PermissionDenied(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// Device went away while capturing
    Disconnected(String),
    /// Device produced a format we cannot convert
    FormatNotSupported(String),
    /// General I/O error
    Io(String),
    /// Other errors
    Other(String),
}

impl BackendError {
    /// Whether the error ends a capture session
    ///
    /// Everything else is treated as a transient per-frame condition.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BackendError::NotAvailable(_)
                | BackendError::NoCameraFound
                | BackendError::PermissionDenied(_)
                | BackendError::DeviceNotFound(_)
                | BackendError::Disconnected(_)
        )
    }

    /// Classify an I/O error raised while touching `path`
    pub fn from_io(path: &str, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                BackendError::PermissionDenied(format!("{}: {}", path, err))
            }
            std::io::ErrorKind::NotFound => BackendError::DeviceNotFound(path.to_string()),
            _ if err.raw_os_error() == Some(libc::ENODEV) => {
                BackendError::Disconnected(path.to_string())
            }
            _ => BackendError::Io(format!("{}: {}", path, err)),
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::NoCameraFound => write!(f, "No cameras found"),
            BackendError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::Disconnected(msg) => write!(f, "Device disconnected: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::Io(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_luma_conversion() {
        let frame = CameraFrame {
            width: 2,
            height: 1,
            data: Arc::from(vec![255, 255, 255, 255, 0, 0, 0, 255].into_boxed_slice()),
            format: PixelFormat::Rgba,
            stride: 8,
            captured_at: Instant::now(),
        };
        assert_eq!(frame.luma_at(0, 0), 255);
        assert_eq!(frame.luma_at(1, 0), 0);
        // Out of range reads are black instead of panicking
        assert_eq!(frame.luma_at(5, 5), 0);
    }

    #[test]
    fn test_fatal_classification() {
        assert!(BackendError::PermissionDenied("x".into()).is_fatal());
        assert!(BackendError::Disconnected("x".into()).is_fatal());
        assert!(!BackendError::Io("timeout".into()).is_fatal());
        assert!(!BackendError::FormatNotSupported("H264".into()).is_fatal());
    }

    #[test]
    fn test_io_permission_denied_is_classified() {
        let err = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(
            BackendError::from_io("/dev/video0", &err),
            BackendError::PermissionDenied(_)
        ));
    }

    #[test]
    fn test_frame_interval_clamped() {
        let settings = CaptureSettings { fps: 0, window: 250 };
        assert_eq!(settings.frame_interval().as_millis(), 1000);
        assert_eq!(CaptureSettings::default().frame_interval().as_millis(), 100);
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let device = CameraDevice {
            id: "/dev/video2".into(),
            label: "  ".into(),
            backend: CameraBackendType::V4l2,
        };
        assert_eq!(device.display_name(), "Camera /dev/video2");
    }
}
