// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │   Check-in verifier  │
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │ CameraSessionManager │  ← one capture+decode loop at a time
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │  CameraBackend trait │  ← enumeration, opening frame sources
//! └──────────┬───────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!   ┌──────┐  ┌─────────┐
//!   │ V4L2 │  │  Files  │
//!   └──────┘  └─────────┘
//! ```

pub mod file_source;
pub mod frame_loop;
pub mod manager;
pub mod types;
#[cfg(feature = "v4l2")]
pub mod v4l2;

pub use manager::CameraSessionManager;
pub use types::*;

use std::path::PathBuf;

/// Camera backend trait
///
/// A backend knows how to list devices and open a frame source for one of
/// them. It holds no per-session state; that lives in the returned source.
pub trait CameraBackend: Send + Sync {
    /// Enumerate available cameras, in a stable order
    ///
    /// An empty list is a valid answer; the manager turns it into
    /// `NoCameraFound`. Access problems are reported as
    /// `BackendError::PermissionDenied`.
    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>>;

    /// Open a device for continuous capture
    fn open(&self, device: &CameraDevice) -> BackendResult<Box<dyn FrameSource>>;

    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;
}

/// An open capture stream
pub trait FrameSource: Send {
    /// Fetch the next frame
    ///
    /// `Ok(None)` means no frame was ready yet. Fatal errors (see
    /// [`BackendError::is_fatal`]) end the session; anything else is retried.
    fn next_frame(&mut self) -> BackendResult<Option<CameraFrame>>;

    /// Release the device
    fn close(&mut self) -> BackendResult<()>;
}

/// Get a concrete backend instance
///
/// `image_dir` is only used by the image-file backend.
pub fn get_backend_for_type(
    backend_type: CameraBackendType,
    image_dir: Option<PathBuf>,
) -> Box<dyn CameraBackend> {
    match backend_type {
        #[cfg(feature = "v4l2")]
        CameraBackendType::V4l2 => Box::new(v4l2::V4l2Backend::new()),
        #[cfg(not(feature = "v4l2"))]
        CameraBackendType::V4l2 => {
            tracing::warn!("Built without V4L2 support, falling back to image files");
            Box::new(file_source::ImageDirBackend::new(image_dir.unwrap_or_default()))
        }
        CameraBackendType::Files => {
            Box::new(file_source::ImageDirBackend::new(image_dir.unwrap_or_default()))
        }
    }
}
