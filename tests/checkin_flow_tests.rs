// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end check-in flow against a fake camera and a fake server

use checkin_scanner::api::{CustomerInfo, VerificationResult};
use checkin_scanner::backends::camera::{
    BackendError, BackendResult, CameraBackend, CameraBackendType, CameraDevice, CameraFrame,
    CameraSessionManager, CaptureSettings, FrameSource,
};
use checkin_scanner::checkin::{CheckInVerifier, ScanControl, VerificationClient};
use checkin_scanner::frame_processor::PayloadDecoder;
use checkin_scanner::{ScanError, ScanStatus};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Camera that shows the same payload in every frame
struct TicketCamera {
    cameras: Vec<CameraDevice>,
    payload: String,
    opens: Arc<AtomicUsize>,
}

struct TicketSource {
    payload: String,
}

impl FrameSource for TicketSource {
    fn next_frame(&mut self) -> BackendResult<Option<CameraFrame>> {
        let bytes = self.payload.as_bytes().to_vec();
        Ok(Some(CameraFrame::gray(bytes.len() as u32, 1, bytes)))
    }

    fn close(&mut self) -> BackendResult<()> {
        Ok(())
    }
}

impl CameraBackend for TicketCamera {
    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        Ok(self.cameras.clone())
    }

    fn open(&self, _device: &CameraDevice) -> BackendResult<Box<dyn FrameSource>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TicketSource {
            payload: self.payload.clone(),
        }))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Files
    }
}

/// Reads frame bytes as text, reporting each payload `copies` times
struct TextDecoder {
    copies: usize,
}

impl PayloadDecoder for TextDecoder {
    fn decode(&self, frame: &CameraFrame) -> Vec<String> {
        let text = String::from_utf8_lossy(&frame.data).to_string();
        vec![text; self.copies]
    }
}

/// Server stand-in counting calls
struct FakeServer {
    calls: Arc<AtomicUsize>,
    answer: Result<VerificationResult, ScanError>,
}

impl VerificationClient for FakeServer {
    async fn verify(
        &self,
        customer_id: &str,
        _event_id: &str,
    ) -> Result<VerificationResult, ScanError> {
        assert_eq!(customer_id, "abc123");
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.answer.clone()
    }
}

struct Harness {
    verifier: CheckInVerifier<FakeServer>,
    opens: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

fn harness(
    camera_count: usize,
    payload: &str,
    copies: usize,
    answer: Result<VerificationResult, ScanError>,
) -> Harness {
    let opens = Arc::new(AtomicUsize::new(0));
    let calls = Arc::new(AtomicUsize::new(0));
    let cameras = (0..camera_count)
        .map(|i| CameraDevice {
            id: format!("cam{}", i),
            label: format!("Gate camera {}", i),
            backend: CameraBackendType::Files,
        })
        .collect();

    let backend = TicketCamera {
        cameras,
        payload: payload.to_string(),
        opens: Arc::clone(&opens),
    };
    let settings = CaptureSettings {
        fps: 60,
        window: 250,
    };
    let manager = CameraSessionManager::new(Box::new(backend), settings)
        .with_decoder(Arc::new(TextDecoder { copies }));
    let server = FakeServer {
        calls: Arc::clone(&calls),
        answer,
    };

    let mut verifier = CheckInVerifier::new(manager, server);
    verifier.refresh_cameras();
    verifier.select_event(Some("e1".to_string()));

    Harness {
        verifier,
        opens,
        calls,
    }
}

async fn run_until_settled(verifier: &mut CheckInVerifier<FakeServer>) -> ScanStatus {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let status = verifier.next().await;
            if status.is_terminal() {
                return status;
            }
        }
    })
    .await
    .expect("scan did not settle")
}

fn accepted() -> VerificationResult {
    VerificationResult {
        success: true,
        message: "Check-in successful".to_string(),
        customer: Some(CustomerInfo {
            nama: "Budi Santoso".to_string(),
            email: "budi@example.com".to_string(),
            no_hp: "081234567890".to_string(),
            verified_at: None,
        }),
    }
}

const TICKET: &str = r#"{"customerId":"abc123","event":"e1"}"#;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_zero_cameras_never_reaches_backend() {
    let mut h = harness(0, TICKET, 1, Ok(accepted()));
    h.verifier.start();

    assert_eq!(h.verifier.status(), ScanStatus::Error);
    assert_eq!(h.verifier.session().last_error, Some(ScanError::NoCameraFound));
    assert_eq!(h.opens.load(Ordering::SeqCst), 0);

    let view = h.verifier.view();
    assert!(view.message.contains("No cameras found"));
    assert_ne!(view.scan_control, ScanControl::Start);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_malformed_payload_stops_camera() {
    let mut h = harness(1, "WELCOME-TO-THE-EVENT", 1, Ok(accepted()));
    h.verifier.start();
    assert_eq!(h.verifier.status(), ScanStatus::Scanning);

    let status = run_until_settled(&mut h.verifier).await;
    assert_eq!(status, ScanStatus::Error);
    assert!(matches!(
        h.verifier.session().last_error,
        Some(ScanError::MalformedPayload(_))
    ));
    assert!(!h.verifier.is_camera_running());

    // Decodes queued before the stop landed change nothing
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.verifier.pump();
    assert_eq!(h.verifier.status(), ScanStatus::Error);
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rapid_decodes_verify_once() {
    let mut h = harness(1, TICKET, 2, Ok(accepted()));
    h.verifier.start();

    let status = run_until_settled(&mut h.verifier).await;
    assert_eq!(status, ScanStatus::Success);

    tokio::time::sleep(Duration::from_millis(50)).await;
    h.verifier.pump();
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_success_shows_returned_customer() {
    let mut h = harness(1, TICKET, 1, Ok(accepted()));
    h.verifier.start();
    run_until_settled(&mut h.verifier).await;

    let view = h.verifier.view();
    assert_eq!(view.customer, accepted().customer);
    assert_eq!(view.message, "Check-in successful");
    assert_eq!(view.scan_control, ScanControl::ScanAnother);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_server_refusal_is_failed_with_message() {
    let refusal = VerificationResult {
        success: false,
        message: "Already checked in".to_string(),
        customer: None,
    };
    let mut h = harness(1, TICKET, 1, Ok(refusal));
    h.verifier.start();

    let status = run_until_settled(&mut h.verifier).await;
    assert_eq!(status, ScanStatus::Failed);
    assert_eq!(h.verifier.view().message, "Already checked in");
    assert!(!h.verifier.is_camera_running());
    assert_eq!(h.opens.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_network_failure_is_error_not_failed() {
    let mut h = harness(1, TICKET, 1, Err(ScanError::NetworkUnreachable));
    h.verifier.start();

    let status = run_until_settled(&mut h.verifier).await;
    assert_eq!(status, ScanStatus::Error);
    assert!(h.verifier.view().message.contains("Unable to reach the server"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_twice() {
    let mut h = harness(1, "no code here", 0, Ok(accepted()));
    h.verifier.start();
    assert!(h.verifier.is_camera_running());

    h.verifier.stop();
    assert_ne!(h.verifier.status(), ScanStatus::Scanning);
    assert!(!h.verifier.is_camera_running());

    h.verifier.stop();
    assert_ne!(h.verifier.status(), ScanStatus::Scanning);
    assert_eq!(h.verifier.view().scan_control, ScanControl::Start);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dismiss_then_scan_again() {
    let mut h = harness(1, TICKET, 1, Ok(accepted()));
    h.verifier.start();
    run_until_settled(&mut h.verifier).await;

    h.verifier.dismiss();
    assert_eq!(h.verifier.status(), ScanStatus::Idle);
    assert!(!h.verifier.is_camera_running());

    h.verifier.start();
    run_until_settled(&mut h.verifier).await;
    assert_eq!(h.opens.load(Ordering::SeqCst), 2);
    assert_eq!(h.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_camera_permission_error_surfaces() {
    struct DeniedCamera;

    impl CameraBackend for DeniedCamera {
        fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
            Err(BackendError::PermissionDenied("/dev/video0".into()))
        }

        fn open(&self, _device: &CameraDevice) -> BackendResult<Box<dyn FrameSource>> {
            Err(BackendError::PermissionDenied("/dev/video0".into()))
        }

        fn backend_type(&self) -> CameraBackendType {
            CameraBackendType::V4l2
        }
    }

    let manager = CameraSessionManager::new(Box::new(DeniedCamera), CaptureSettings::default());
    let server = FakeServer {
        calls: Arc::new(AtomicUsize::new(0)),
        answer: Ok(accepted()),
    };
    let mut verifier = CheckInVerifier::new(manager, server);
    verifier.select_event(Some("e1".into()));
    verifier.refresh_cameras();

    assert_eq!(verifier.status(), ScanStatus::Error);
    assert!(verifier.view().message.starts_with("Unable to access camera"));
}
