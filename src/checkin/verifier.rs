// SPDX-License-Identifier: GPL-3.0-only

//! Check-in verifier
//!
//! Owns the camera session and a [`ScanSession`] and carries out the
//! commands the state machine issues. Camera callbacks and verification
//! results are posted onto one channel and applied back on the caller's
//! thread through [`CheckInVerifier::pump`] or [`CheckInVerifier::next`],
//! so the session is only ever mutated from one place.
//!
//! Must be driven from inside a tokio runtime; verification calls are
//! spawned onto it.

use super::state::{ScanCommand, ScanEvent, ScanSession, ScanStatus};
use super::status::{StatusView, project};
use crate::api::VerificationResult;
use crate::backends::camera::{CameraDevice, CameraSessionManager};
use crate::errors::ScanError;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Server-side ticket check
pub trait VerificationClient: Send + Sync + 'static {
    /// Verify a customer's ticket for an event
    ///
    /// Called at most once per decoded ticket; implementations must not
    /// retry on their own.
    fn verify(
        &self,
        customer_id: &str,
        event_id: &str,
    ) -> impl Future<Output = Result<VerificationResult, ScanError>> + Send;
}

/// Drives one scanner screen
pub struct CheckInVerifier<V: VerificationClient> {
    session: ScanSession,
    camera: CameraSessionManager,
    client: Arc<V>,
    cameras: Vec<CameraDevice>,
    events_tx: mpsc::UnboundedSender<ScanEvent>,
    events_rx: mpsc::UnboundedReceiver<ScanEvent>,
}

impl<V: VerificationClient> CheckInVerifier<V> {
    pub fn new(camera: CameraSessionManager, client: V) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            session: ScanSession::new(),
            camera,
            client: Arc::new(client),
            cameras: Vec::new(),
            events_tx,
            events_rx,
        }
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn status(&self) -> ScanStatus {
        self.session.status
    }

    /// Cameras found by the last [`Self::refresh_cameras`]
    pub fn cameras(&self) -> &[CameraDevice] {
        &self.cameras
    }

    pub fn view(&self) -> StatusView {
        project(&self.session, !self.cameras.is_empty())
    }

    /// Whether the capture loop is currently running
    pub fn is_camera_running(&self) -> bool {
        self.camera.is_running()
    }

    /// Re-enumerate cameras
    pub fn refresh_cameras(&mut self) -> &[CameraDevice] {
        let listing = self.camera.list_cameras().map_err(ScanError::from);
        self.cameras = listing.as_ref().cloned().unwrap_or_default();
        self.apply(ScanEvent::CamerasListed(listing));
        &self.cameras
    }

    pub fn select_event(&mut self, event_id: Option<String>) {
        self.apply(ScanEvent::EventSelected(event_id));
    }

    pub fn select_camera(&mut self, camera_id: impl Into<String>) {
        self.apply(ScanEvent::CameraSelected(camera_id.into()));
    }

    pub fn start(&mut self) {
        self.apply(ScanEvent::StartRequested);
    }

    pub fn stop(&mut self) {
        self.apply(ScanEvent::StopRequested);
    }

    /// Clear the last result and return to idle, ready for another ticket
    pub fn dismiss(&mut self) {
        self.apply(ScanEvent::Dismissed);
    }

    pub fn shutdown(&mut self) {
        self.apply(ScanEvent::Shutdown);
    }

    /// Apply every queued event without waiting; returns how many were applied
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the next queued event and apply it
    pub async fn next(&mut self) -> ScanStatus {
        // The sender half lives in `self`, so the channel never closes here
        if let Some(event) = self.events_rx.recv().await {
            self.apply(event);
        }
        self.session.status
    }

    fn apply(&mut self, event: ScanEvent) {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            for command in self.session.handle(event) {
                if let Some(follow_up) = self.execute(command) {
                    pending.push_back(follow_up);
                }
            }
        }
    }

    fn execute(&mut self, command: ScanCommand) -> Option<ScanEvent> {
        match command {
            ScanCommand::StartCamera {
                camera_id,
                generation,
            } => {
                let decode_tx = self.events_tx.clone();
                let fault_tx = self.events_tx.clone();
                let started = self.camera.start(
                    &camera_id,
                    move |text| {
                        let _ = decode_tx.send(ScanEvent::Decoded { generation, text });
                    },
                    move |error| {
                        let _ = fault_tx.send(ScanEvent::CameraFault {
                            generation,
                            error: error.into(),
                        });
                    },
                );
                match started {
                    Ok(()) => None,
                    Err(error) => Some(ScanEvent::CameraStartFailed {
                        generation,
                        error: error.into(),
                    }),
                }
            }
            ScanCommand::StopCamera => {
                self.camera.stop();
                None
            }
            ScanCommand::Verify {
                ticket,
                event_id,
                generation,
            } => {
                info!(customer_id = %ticket.customer_id, event_id = %event_id, generation, "Submitting verification");
                let client = Arc::clone(&self.client);
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let outcome = client.verify(&ticket.customer_id, &event_id).await;
                    if tx.send(ScanEvent::Verified { generation, outcome }).is_err() {
                        debug!(generation, "Verifier gone, dropping verification result");
                    }
                });
                None
            }
        }
    }
}

impl<V: VerificationClient> Drop for CheckInVerifier<V> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<V: VerificationClient> std::fmt::Debug for CheckInVerifier<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckInVerifier")
            .field("session", &self.session)
            .field("camera", &self.camera)
            .field("cameras", &self.cameras.len())
            .finish_non_exhaustive()
    }
}
