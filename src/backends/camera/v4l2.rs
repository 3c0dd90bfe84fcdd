// SPDX-License-Identifier: GPL-3.0-only

//! Native V4L2 camera backend
//!
//! Captures from `/dev/video*` nodes with memory-mapped buffers and converts
//! each frame to greyscale for the QR decoder. YUYV and GREY are converted
//! in place; MJPG frames are decoded with the `image` crate.

use super::types::{BackendError, BackendResult, CameraBackendType, CameraDevice, CameraFrame};
use super::{CameraBackend, FrameSource};
use crate::constants::scan;
use std::io;
use std::time::Instant;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::capability::Flags;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::{CaptureStream, Stream};
use v4l::prelude::*;
use v4l::video::Capture;

/// Pixel layouts we can turn into greyscale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Yuyv,
    Grey,
    Mjpeg,
}

impl SourceFormat {
    fn from_fourcc(fourcc: &v4l::FourCC) -> Option<Self> {
        match &fourcc.repr {
            b"YUYV" => Some(Self::Yuyv),
            b"GREY" => Some(Self::Grey),
            b"MJPG" => Some(Self::Mjpeg),
            _ => None,
        }
    }
}

/// Backend for native Linux video devices
#[derive(Debug, Default)]
pub struct V4l2Backend;

impl V4l2Backend {
    pub fn new() -> Self {
        Self
    }
}

impl CameraBackend for V4l2Backend {
    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        let mut nodes = v4l::context::enum_devices();
        nodes.sort_by_key(|node| node.index());

        let mut devices = Vec::new();
        let mut denied = Vec::new();

        for node in nodes {
            let path = node.path().display().to_string();

            let dev = match Device::with_path(node.path()) {
                Ok(dev) => dev,
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    debug!(path = %path, "Permission denied opening video node");
                    denied.push(path);
                    continue;
                }
                Err(e) => {
                    debug!(path = %path, error = %e, "Skipping unopenable video node");
                    continue;
                }
            };

            let caps = match dev.query_caps() {
                Ok(caps) => caps,
                Err(e) => {
                    debug!(path = %path, error = %e, "Failed to query capabilities");
                    continue;
                }
            };

            // Metadata nodes share the driver but cannot capture frames
            if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
                continue;
            }

            let label = node.name().unwrap_or_else(|| caps.card.clone());
            devices.push(CameraDevice {
                id: path,
                label,
                backend: CameraBackendType::V4l2,
            });
        }

        if devices.is_empty() && !denied.is_empty() {
            return Err(BackendError::PermissionDenied(format!(
                "cannot open {}",
                denied.join(", ")
            )));
        }

        info!(count = devices.len(), "Enumerated V4L2 cameras");
        Ok(devices)
    }

    fn open(&self, device: &CameraDevice) -> BackendResult<Box<dyn FrameSource>> {
        Ok(Box::new(V4l2Source::open(&device.id)?))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }
}

/// Open V4L2 capture stream
struct V4l2Source {
    path: String,
    stream: MmapStream<'static>,
    format: SourceFormat,
    width: u32,
    height: u32,
    stride: u32,
    // Keeps the device handle alive for the lifetime of the stream
    _device: Device,
}

impl V4l2Source {
    fn open(path: &str) -> BackendResult<Self> {
        info!(path, "Opening V4L2 device");

        let device = Device::with_path(path).map_err(|e| BackendError::from_io(path, &e))?;

        let mut format = device
            .format()
            .map_err(|e| BackendError::from_io(path, &e))?;
        format.width = scan::CAPTURE_WIDTH;
        format.height = scan::CAPTURE_HEIGHT;
        format.fourcc = v4l::FourCC::new(b"YUYV");

        let format = match device.set_format(&format) {
            Ok(applied) => applied,
            Err(e) => {
                warn!(path, error = %e, "Could not set YUYV format, using current device format");
                device
                    .format()
                    .map_err(|e| BackendError::from_io(path, &e))?
            }
        };

        let source_format = SourceFormat::from_fourcc(&format.fourcc).ok_or_else(|| {
            BackendError::FormatNotSupported(format!("{} delivers {}", path, format.fourcc))
        })?;

        info!(
            path,
            width = format.width,
            height = format.height,
            fourcc = %format.fourcc,
            "Negotiated capture format"
        );

        let stream = MmapStream::with_buffers(&device, Type::VideoCapture, scan::V4L2_BUFFER_COUNT)
            .map_err(|e| BackendError::from_io(path, &e))?;

        Ok(Self {
            path: path.to_string(),
            stream,
            format: source_format,
            width: format.width,
            height: format.height,
            stride: format.stride,
            _device: device,
        })
    }
}

impl FrameSource for V4l2Source {
    fn next_frame(&mut self) -> BackendResult<Option<CameraFrame>> {
        let captured_at = Instant::now();
        let (buf, meta) = self
            .stream
            .next()
            .map_err(|e| BackendError::from_io(&self.path, &e))?;

        if meta.bytesused == 0 {
            return Ok(None);
        }
        let used = (meta.bytesused as usize).min(buf.len());
        let bytes = &buf[..used];

        let mut frame = match self.format {
            SourceFormat::Yuyv => CameraFrame::gray(
                self.width,
                self.height,
                yuyv_to_gray(bytes, self.width, self.height, self.stride),
            ),
            SourceFormat::Grey => CameraFrame::gray(
                self.width,
                self.height,
                pack_gray(bytes, self.width, self.height, self.stride),
            ),
            SourceFormat::Mjpeg => {
                // Corrupt MJPG frames happen during exposure changes; skip them
                match image::load_from_memory_with_format(bytes, image::ImageFormat::Jpeg) {
                    Ok(img) => {
                        let luma = img.to_luma8();
                        let (w, h) = luma.dimensions();
                        CameraFrame::gray(w, h, luma.into_raw())
                    }
                    Err(e) => {
                        debug!(error = %e, "Dropping undecodable MJPG frame");
                        return Ok(None);
                    }
                }
            }
        };

        frame.captured_at = captured_at;
        Ok(Some(frame))
    }

    fn close(&mut self) -> BackendResult<()> {
        debug!(path = %self.path, "Stopping V4L2 stream");
        self.stream
            .stop()
            .map_err(|e| BackendError::from_io(&self.path, &e))
    }
}

/// Extract the luma plane from packed YUYV (Y0 U Y1 V)
fn yuyv_to_gray(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let width = width as usize;
    let stride = (stride as usize).max(width * 2);
    let mut gray = Vec::with_capacity(width * height as usize);

    for row in 0..height as usize {
        let start = row * stride;
        for x in 0..width {
            gray.push(data.get(start + x * 2).copied().unwrap_or(0));
        }
    }

    gray
}

/// Copy greyscale rows without stride padding
fn pack_gray(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let width = width as usize;
    let stride = (stride as usize).max(width);
    let mut gray = Vec::with_capacity(width * height as usize);

    for row in 0..height as usize {
        let start = row * stride;
        for x in 0..width {
            gray.push(data.get(start + x).copied().unwrap_or(0));
        }
    }

    gray
}
