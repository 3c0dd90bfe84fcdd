// SPDX-License-Identifier: GPL-3.0-only

//! Camera session manager
//!
//! The manager provides:
//! - Device enumeration with empty lists reported as `NoCameraFound`
//! - A single capture+decode loop per instance
//! - Idempotent stop that never fails, even when teardown does

use super::frame_loop::{CaptureLoopController, LoopAction};
use super::types::*;
use super::{CameraBackend, FrameSource};
use crate::frame_processor::{PayloadDecoder, QrDetector};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// Manages the capture loop for one scanner screen
pub struct CameraSessionManager {
    backend: Box<dyn CameraBackend>,
    decoder: Arc<dyn PayloadDecoder>,
    settings: CaptureSettings,
    active: Option<ActiveSession>,
}

struct ActiveSession {
    camera_id: String,
    controller: CaptureLoopController,
}

/// State moved into the capture thread
struct LoopState<D, E> {
    source: Box<dyn FrameSource>,
    on_decode: D,
    on_fatal_error: E,
    next_tick: Instant,
}

impl CameraSessionManager {
    /// Create a manager decoding QR codes inside the configured window
    pub fn new(backend: Box<dyn CameraBackend>, settings: CaptureSettings) -> Self {
        info!(backend = %backend.backend_type(), fps = settings.fps, window = settings.window, "Creating camera session manager");

        Self {
            backend,
            decoder: Arc::new(QrDetector::with_window(settings.window)),
            settings,
            active: None,
        }
    }

    /// Replace the payload decoder
    pub fn with_decoder(mut self, decoder: Arc<dyn PayloadDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Get the backend type
    pub fn backend_type(&self) -> CameraBackendType {
        self.backend.backend_type()
    }

    /// Enumerate available cameras
    pub fn list_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        let cameras = self.backend.enumerate_cameras()?;
        if cameras.is_empty() {
            Err(BackendError::NoCameraFound)
        } else {
            Ok(cameras)
        }
    }

    /// Start continuous capture and decoding on `camera_id`
    ///
    /// `on_decode` fires for every decoded payload until the loop is
    /// stopped, possibly several times for the same code. `on_fatal_error`
    /// fires at most once, for conditions that end the session. Any running
    /// loop is fully stopped first.
    pub fn start<D, E>(
        &mut self,
        camera_id: &str,
        on_decode: D,
        on_fatal_error: E,
    ) -> BackendResult<()>
    where
        D: FnMut(String) + Send + 'static,
        E: FnOnce(BackendError) + Send + 'static,
    {
        self.stop();

        let cameras = self.list_cameras()?;
        let device = cameras
            .into_iter()
            .find(|c| c.id == camera_id)
            .ok_or_else(|| BackendError::DeviceNotFound(camera_id.to_string()))?;

        let source = self.backend.open(&device)?;
        info!(camera = %device.display_name(), "Camera opened, starting scan loop");

        let decoder = Arc::clone(&self.decoder);
        let interval = self.settings.frame_interval();
        let state = LoopState {
            source,
            on_decode,
            on_fatal_error: Some(on_fatal_error),
            next_tick: Instant::now(),
        };

        let controller = CaptureLoopController::spawn(
            "scanner",
            state,
            move |state| scan_iteration(state, decoder.as_ref(), interval),
            |mut state| {
                if let Err(e) = state.source.close() {
                    warn!(error = %e, "Error while closing camera, ignoring");
                }
            },
        );

        self.active = Some(ActiveSession {
            camera_id: device.id,
            controller,
        });
        Ok(())
    }

    /// Stop the capture loop
    ///
    /// Safe to call when nothing is running. Blocks until the capture
    /// thread has exited, after which no further callbacks fire.
    pub fn stop(&mut self) {
        match self.active.take() {
            Some(mut session) => {
                info!(camera = %session.camera_id, "Stopping scan loop");
                session.controller.stop();
            }
            None => debug!("Stop requested with no active scan loop"),
        }
    }

    /// Whether a capture loop is currently running
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .map(|s| s.controller.is_running())
            .unwrap_or(false)
    }

    /// Camera used by the running loop
    pub fn active_camera(&self) -> Option<&str> {
        self.active.as_ref().map(|s| s.camera_id.as_str())
    }
}

impl Drop for CameraSessionManager {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CameraSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSessionManager")
            .field("backend_type", &self.backend.backend_type())
            .field("settings", &self.settings)
            .field("active_camera", &self.active_camera())
            .finish()
    }
}

/// One paced capture+decode step
fn scan_iteration<D, E>(
    state: &mut LoopState<D, Option<E>>,
    decoder: &dyn PayloadDecoder,
    interval: std::time::Duration,
) -> LoopAction
where
    D: FnMut(String),
    E: FnOnce(BackendError),
{
    let now = Instant::now();
    if now < state.next_tick {
        std::thread::sleep(state.next_tick - now);
    }
    state.next_tick = Instant::now() + interval;

    match state.source.next_frame() {
        Ok(Some(frame)) => {
            for payload in decoder.decode(&frame) {
                (state.on_decode)(payload);
            }
            LoopAction::Continue
        }
        Ok(None) => {
            trace!("No frame ready");
            LoopAction::Continue
        }
        Err(e) if e.is_fatal() => {
            warn!(error = %e, "Fatal camera error, ending scan loop");
            if let Some(on_fatal_error) = state.on_fatal_error.take() {
                on_fatal_error(e);
            }
            LoopAction::Stop
        }
        Err(e) => {
            trace!(error = %e, "Transient capture error");
            std::thread::sleep(crate::constants::scan::TRANSIENT_RETRY_DELAY);
            LoopAction::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Backend whose frames carry their payload as raw bytes
    struct ScriptedBackend {
        cameras: Vec<CameraDevice>,
        frames: Arc<Mutex<Vec<BackendResult<Option<CameraFrame>>>>>,
        closes: Arc<AtomicUsize>,
        fail_close: bool,
    }

    struct ScriptedSource {
        frames: Arc<Mutex<Vec<BackendResult<Option<CameraFrame>>>>>,
        closes: Arc<AtomicUsize>,
        fail_close: bool,
    }

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> BackendResult<Option<CameraFrame>> {
            let mut frames = self.frames.lock().unwrap();
            if frames.is_empty() {
                Ok(None)
            } else {
                frames.remove(0)
            }
        }

        fn close(&mut self) -> BackendResult<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                Err(BackendError::Io("device busy during teardown".into()))
            } else {
                Ok(())
            }
        }
    }

    impl CameraBackend for ScriptedBackend {
        fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
            Ok(self.cameras.clone())
        }

        fn open(&self, _device: &CameraDevice) -> BackendResult<Box<dyn FrameSource>> {
            Ok(Box::new(ScriptedSource {
                frames: Arc::clone(&self.frames),
                closes: Arc::clone(&self.closes),
                fail_close: self.fail_close,
            }))
        }

        fn backend_type(&self) -> CameraBackendType {
            CameraBackendType::Files
        }
    }

    struct TextDecoder;

    impl PayloadDecoder for TextDecoder {
        fn decode(&self, frame: &CameraFrame) -> Vec<String> {
            vec![String::from_utf8_lossy(&frame.data).to_string()]
        }
    }

    fn camera(id: &str) -> CameraDevice {
        CameraDevice {
            id: id.to_string(),
            label: format!("Test {}", id),
            backend: CameraBackendType::Files,
        }
    }

    fn text_frame(text: &str) -> BackendResult<Option<CameraFrame>> {
        Ok(Some(CameraFrame::gray(
            text.len() as u32,
            1,
            text.as_bytes().to_vec(),
        )))
    }

    fn manager(
        cameras: Vec<CameraDevice>,
        frames: Vec<BackendResult<Option<CameraFrame>>>,
        fail_close: bool,
    ) -> (CameraSessionManager, Arc<AtomicUsize>) {
        let closes = Arc::new(AtomicUsize::new(0));
        let backend = ScriptedBackend {
            cameras,
            frames: Arc::new(Mutex::new(frames)),
            closes: Arc::clone(&closes),
            fail_close,
        };
        let settings = CaptureSettings {
            fps: 60,
            window: 250,
        };
        let manager = CameraSessionManager::new(Box::new(backend), settings)
            .with_decoder(Arc::new(TextDecoder));
        (manager, closes)
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !condition() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_empty_list_is_no_camera_found() {
        let (manager, _) = manager(Vec::new(), Vec::new(), false);
        assert_eq!(manager.list_cameras(), Err(BackendError::NoCameraFound));
    }

    #[test]
    fn test_start_without_cameras_never_opens() {
        let (mut manager, closes) = manager(Vec::new(), Vec::new(), false);
        let result = manager.start("/dev/video0", |_| {}, |_| {});
        assert_eq!(result, Err(BackendError::NoCameraFound));
        assert!(!manager.is_running());
        assert_eq!(closes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_camera_is_device_not_found() {
        let (mut manager, _) = manager(vec![camera("cam0")], Vec::new(), false);
        let result = manager.start("cam9", |_| {}, |_| {});
        assert!(matches!(result, Err(BackendError::DeviceNotFound(_))));
    }

    #[test]
    fn test_decodes_are_reported_and_transients_hidden() {
        let frames = vec![
            Ok(None),
            Err(BackendError::Io("timeout".into())),
            text_frame("first"),
            text_frame("second"),
        ];
        let (mut manager, _) = manager(vec![camera("cam0")], frames, false);

        let decoded = Arc::new(Mutex::new(Vec::new()));
        let fatal = Arc::new(AtomicUsize::new(0));
        let decoded_clone = Arc::clone(&decoded);
        let fatal_clone = Arc::clone(&fatal);

        manager
            .start(
                "cam0",
                move |text| decoded_clone.lock().unwrap().push(text),
                move |_| {
                    fatal_clone.fetch_add(1, Ordering::SeqCst);
                },
            )
            .unwrap();

        wait_until(|| decoded.lock().unwrap().len() >= 2);
        manager.stop();

        assert_eq!(*decoded.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(fatal.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fatal_error_ends_loop() {
        let frames = vec![Err(BackendError::Disconnected("cam0".into()))];
        let (mut manager, closes) = manager(vec![camera("cam0")], frames, false);

        let fatal = Arc::new(Mutex::new(None));
        let fatal_clone = Arc::clone(&fatal);
        manager
            .start("cam0", |_| {}, move |e| *fatal_clone.lock().unwrap() = Some(e))
            .unwrap();

        wait_until(|| !manager.is_running());
        assert_eq!(
            *fatal.lock().unwrap(),
            Some(BackendError::Disconnected("cam0".into()))
        );
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_is_idempotent_and_swallows_teardown_errors() {
        let (mut manager, closes) = manager(vec![camera("cam0")], Vec::new(), true);
        manager.start("cam0", |_| {}, |_| {}).unwrap();
        assert_eq!(manager.active_camera(), Some("cam0"));

        manager.stop();
        assert!(!manager.is_running());
        manager.stop();
        assert!(!manager.is_running());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_restart_stops_previous_loop_first() {
        let (mut manager, closes) =
            manager(vec![camera("cam0"), camera("cam1")], Vec::new(), false);
        manager.start("cam0", |_| {}, |_| {}).unwrap();
        manager.start("cam1", |_| {}, |_| {}).unwrap();

        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(manager.active_camera(), Some("cam1"));
        manager.stop();
        assert_eq!(closes.load(Ordering::SeqCst), 2);
    }
}
