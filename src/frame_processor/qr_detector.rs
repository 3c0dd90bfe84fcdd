// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection task
//!
//! Frames are sampled as greyscale inside a centred detection window and
//! handed to rqrr. Only the decoded text is reported; frames without a
//! readable code simply yield nothing.

use super::PayloadDecoder;
use crate::backends::camera::types::CameraFrame;
use tracing::{debug, trace};

/// QR code detector
#[derive(Debug, Clone)]
pub struct QrDetector {
    /// Side of the centred square that is searched, `None` for the whole frame
    window: Option<u32>,
}

impl QrDetector {
    /// Create a detector searching a centred `window`×`window` square
    pub fn with_window(window: u32) -> Self {
        Self {
            window: Some(window).filter(|w| *w > 0),
        }
    }

    /// Create a detector searching the entire frame
    pub fn full_frame() -> Self {
        Self { window: None }
    }
}

impl PayloadDecoder for QrDetector {
    fn decode(&self, frame: &CameraFrame) -> Vec<String> {
        detect_sync(frame, self.window)
    }
}

/// Region `(x, y, width, height)` searched within a frame
///
/// The window is centred and clamped to the frame, so small frames are
/// searched whole.
pub fn window_bounds(width: u32, height: u32, window: Option<u32>) -> (u32, u32, u32, u32) {
    match window {
        Some(side) => {
            let w = side.min(width);
            let h = side.min(height);
            ((width - w) / 2, (height - h) / 2, w, h)
        }
        None => (0, 0, width, height),
    }
}

fn detect_sync(frame: &CameraFrame, window: Option<u32>) -> Vec<String> {
    let start = std::time::Instant::now();
    let (x0, y0, w, h) = window_bounds(frame.width, frame.height, window);

    if w == 0 || h == 0 {
        return Vec::new();
    }

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        w as usize,
        h as usize,
        |x, y| frame.luma_at(x0 + x as u32, y0 + y as u32),
    );

    let grids = prepared.detect_grids();
    trace!(
        grids = grids.len(),
        window_w = w,
        window_h = h,
        elapsed_ms = start.elapsed().as_millis(),
        "QR grid detection complete"
    );

    let mut payloads = Vec::with_capacity(grids.len());
    for grid in grids {
        match grid.decode() {
            Ok((_meta, content)) => {
                debug!(len = content.len(), "Decoded QR code");
                payloads.push(content);
            }
            Err(e) => {
                // Partial or blurred codes are expected while the operator aims
                trace!(error = ?e, "Failed to decode QR grid");
            }
        }
    }

    payloads
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_centred() {
        assert_eq!(window_bounds(640, 480, Some(250)), (195, 115, 250, 250));
    }

    #[test]
    fn test_window_clamped_to_small_frames() {
        assert_eq!(window_bounds(200, 100, Some(250)), (0, 0, 200, 100));
        assert_eq!(window_bounds(200, 100, None), (0, 0, 200, 100));
    }

    #[test]
    fn test_zero_window_means_full_frame() {
        let detector = QrDetector::with_window(0);
        assert!(detector.window.is_none());
    }

    #[test]
    fn test_blank_frame_yields_nothing() {
        let frame = CameraFrame::gray(320, 240, vec![255; 320 * 240]);
        assert!(QrDetector::with_window(250).decode(&frame).is_empty());
    }

    #[test]
    fn test_empty_frame_yields_nothing() {
        let frame = CameraFrame::gray(0, 0, Vec::new());
        assert!(QrDetector::full_frame().decode(&frame).is_empty());
    }
}
