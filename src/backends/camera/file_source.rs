// SPDX-License-Identifier: GPL-3.0-only

//! Image-directory virtual camera
//!
//! Every supported image file in a directory shows up as one camera. Opening
//! it replays the still image as a continuous stream, which lets a kiosk
//! without a physical camera (or a test) drive the normal scan flow.

use super::types::{BackendError, BackendResult, CameraBackendType, CameraDevice, CameraFrame};
use super::{CameraBackend, FrameSource};
use crate::constants::file_formats;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Backend listing image files as cameras
#[derive(Debug, Clone)]
pub struct ImageDirBackend {
    dir: PathBuf,
}

impl ImageDirBackend {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl CameraBackend for ImageDirBackend {
    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        let dir_str = self.dir.display().to_string();
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %dir_str, "Image directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(BackendError::from_io(&dir_str, &e)),
        };

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_image_extension(path))
            .collect();
        paths.sort();

        let devices: Vec<CameraDevice> = paths
            .into_iter()
            .map(|path| CameraDevice {
                id: path.display().to_string(),
                label: path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                backend: CameraBackendType::Files,
            })
            .collect();

        debug!(dir = %dir_str, count = devices.len(), "Enumerated image cameras");
        Ok(devices)
    }

    fn open(&self, device: &CameraDevice) -> BackendResult<Box<dyn FrameSource>> {
        let frame = load_image_as_frame(Path::new(&device.id))?;
        Ok(Box::new(StillImageSource { frame }))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Files
    }
}

/// Frame source replaying one decoded image
struct StillImageSource {
    frame: CameraFrame,
}

impl FrameSource for StillImageSource {
    fn next_frame(&mut self) -> BackendResult<Option<CameraFrame>> {
        let mut frame = self.frame.clone();
        frame.captured_at = Instant::now();
        Ok(Some(frame))
    }

    fn close(&mut self) -> BackendResult<()> {
        Ok(())
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| file_formats::is_image_extension(&e.to_lowercase()))
        .unwrap_or(false)
}

/// Load an image file as a greyscale frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    let path_str = path.display().to_string();
    if !path.exists() {
        return Err(BackendError::DeviceNotFound(path_str));
    }

    info!(path = %path_str, "Loading image file");

    let img = image::open(path).map_err(|e| {
        BackendError::FormatNotSupported(format!("Failed to load image '{}': {}", path_str, e))
    })?;

    let luma = img.to_luma8();
    let (width, height) = luma.dimensions();
    debug!(width, height, "Image loaded successfully");

    Ok(CameraFrame::gray(width, height, luma.into_raw()))
}
