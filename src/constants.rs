// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Default REST API root (all endpoint paths are appended to this)
pub const DEFAULT_API_BASE_URL: &str = "https://event-backend-ko3x.onrender.com/api";

/// Environment variable overriding the API root
pub const API_URL_ENV: &str = "CHECKIN_API_URL";

/// Environment variable carrying a bearer token for staff endpoints
pub const TOKEN_ENV: &str = "CHECKIN_TOKEN";

/// Directory name below the platform config dir
pub const CONFIG_DIR_NAME: &str = "checkin-scanner";

/// Config file name inside [`CONFIG_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Scanner timing and geometry
pub mod scan {
    use super::Duration;

    /// Frames sampled per second by the capture loop
    pub const DEFAULT_FPS: u32 = 10;

    /// Upper bound accepted from configuration
    pub const MAX_FPS: u32 = 60;

    /// Side of the square detection window, centred in the frame (pixels)
    pub const DEFAULT_WINDOW_SIZE: u32 = 250;

    /// Requested capture resolution for native devices
    pub const CAPTURE_WIDTH: u32 = 640;
    pub const CAPTURE_HEIGHT: u32 = 480;

    /// Number of mmap buffers requested from V4L2
    pub const V4L2_BUFFER_COUNT: u32 = 4;

    /// Pause after a transient capture failure before retrying
    pub const TRANSIENT_RETRY_DELAY: Duration = Duration::from_millis(10);
}

/// HTTP client settings
pub mod http {
    /// Default per-request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
}

/// Image file extensions served by the virtual camera
pub mod file_formats {
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp"];

    /// Check if an extension (lowercase, no dot) is a supported image
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext)
    }
}

/// Operator-facing messages
pub mod messages {
    pub const NOTHING_SELECTED: &str = "Select an event to start scanning";
    pub const READY: &str = "Ready. Open the scanner to check in a ticket";
    pub const SCANNING: &str = "Scanning... point the camera at the barcode";
    pub const PROCESSING: &str = "Processing barcode... please wait";
    pub const SUCCESS_FALLBACK: &str = "Verification succeeded!";
    pub const FAILED_FALLBACK: &str = "Verification failed!";
    pub const ERROR_FALLBACK: &str = "Something went wrong";
    pub const NETWORK_UNREACHABLE: &str =
        "Unable to reach the server. Check your connection or the server status.";
    pub const MISSING_SELECTION: &str = "Select an event and make sure a camera is available";
    pub const NO_CAMERA_FOUND: &str = "No cameras found on this device";
}
