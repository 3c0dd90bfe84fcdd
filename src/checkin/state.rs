// SPDX-License-Identifier: GPL-3.0-only

//! Check-in scan state machine
//!
//! All session transitions live here and nothing in this module touches a
//! camera or the network. [`ScanSession::handle`] applies one event and
//! returns the side effects the caller must carry out, in order.
//!
//! Every camera start bumps the session generation. Events produced by the
//! capture loop or by a verification call carry the generation they were
//! started under, and anything from an older generation is dropped.

use super::payload::DecodedTicket;
use crate::api::VerificationResult;
use crate::backends::camera::CameraDevice;
use crate::errors::ScanError;
use tracing::{debug, info, warn};

/// Where the scanner is in the check-in flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanStatus {
    #[default]
    Idle,
    Scanning,
    Processing,
    Success,
    Failed,
    Error,
}

impl ScanStatus {
    /// Whether the flow has reached a result the operator must dismiss
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Success | ScanStatus::Failed | ScanStatus::Error)
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScanStatus::Idle => "idle",
            ScanStatus::Scanning => "scanning",
            ScanStatus::Processing => "processing",
            ScanStatus::Success => "success",
            ScanStatus::Failed => "failed",
            ScanStatus::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// Result of enumerating cameras
    CamerasListed(Result<Vec<CameraDevice>, ScanError>),
    /// Operator picked an event (or cleared the selection)
    EventSelected(Option<String>),
    /// Operator picked a camera
    CameraSelected(String),
    /// Operator pressed start
    StartRequested,
    /// The camera could not be opened
    CameraStartFailed { generation: u64, error: ScanError },
    /// The capture loop decoded a code
    Decoded { generation: u64, text: String },
    /// A verification call finished
    Verified {
        generation: u64,
        outcome: Result<VerificationResult, ScanError>,
    },
    /// The capture loop ended on an unrecoverable camera error
    CameraFault { generation: u64, error: ScanError },
    /// Operator pressed stop
    StopRequested,
    /// Operator asked to scan another ticket
    Dismissed,
    /// The scanner screen is closing
    Shutdown,
}

/// Side effects requested by the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanCommand {
    StartCamera { camera_id: String, generation: u64 },
    StopCamera,
    Verify {
        ticket: DecodedTicket,
        event_id: String,
        generation: u64,
    },
}

/// State of one scanner screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanSession {
    pub selected_event_id: Option<String>,
    pub camera_id: Option<String>,
    pub status: ScanStatus,
    pub last_error: Option<ScanError>,
    pub last_result: Option<VerificationResult>,
    generation: u64,
    no_cameras: bool,
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the most recent camera start
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply one event and return the commands to execute
    pub fn handle(&mut self, event: ScanEvent) -> Vec<ScanCommand> {
        match event {
            ScanEvent::CamerasListed(listing) => self.on_cameras_listed(listing),
            ScanEvent::EventSelected(event_id) => {
                let commands = self.reset_selection();
                self.selected_event_id = event_id.filter(|id| !id.trim().is_empty());
                commands
            }
            ScanEvent::CameraSelected(camera_id) => {
                let commands = self.reset_selection();
                self.camera_id = Some(camera_id);
                commands
            }
            ScanEvent::StartRequested => self.on_start(),
            ScanEvent::CameraStartFailed { generation, error } => {
                if self.is_current(generation, ScanStatus::Scanning) {
                    warn!(error = %error, "Camera failed to start");
                    self.fail(error);
                }
                Vec::new()
            }
            ScanEvent::Decoded { generation, text } => self.on_decoded(generation, text),
            ScanEvent::Verified {
                generation,
                outcome,
            } => {
                self.on_verified(generation, outcome);
                Vec::new()
            }
            ScanEvent::CameraFault { generation, error } => {
                if self.is_current(generation, ScanStatus::Scanning) {
                    warn!(error = %error, "Camera fault during scan");
                    self.fail(error);
                    vec![ScanCommand::StopCamera]
                } else {
                    Vec::new()
                }
            }
            ScanEvent::StopRequested => {
                if self.status == ScanStatus::Scanning {
                    self.status = ScanStatus::Idle;
                }
                vec![ScanCommand::StopCamera]
            }
            ScanEvent::Dismissed => {
                self.last_result = None;
                self.last_error = None;
                if self.status != ScanStatus::Scanning {
                    self.status = ScanStatus::Idle;
                }
                Vec::new()
            }
            ScanEvent::Shutdown => {
                if self.status == ScanStatus::Scanning {
                    self.status = ScanStatus::Idle;
                }
                vec![ScanCommand::StopCamera]
            }
        }
    }

    fn is_current(&self, generation: u64, status: ScanStatus) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Dropping stale event");
            return false;
        }
        self.status == status
    }

    fn fail(&mut self, error: ScanError) {
        self.status = ScanStatus::Error;
        self.last_error = Some(error);
    }

    // New event or camera: the running scan and any pending result belong
    // to the old selection
    fn reset_selection(&mut self) -> Vec<ScanCommand> {
        let was_scanning = self.status == ScanStatus::Scanning;
        if self.status == ScanStatus::Processing {
            self.generation += 1;
        }
        self.status = ScanStatus::Idle;
        self.last_result = None;
        self.last_error = None;

        if was_scanning {
            vec![ScanCommand::StopCamera]
        } else {
            Vec::new()
        }
    }

    fn on_cameras_listed(&mut self, listing: Result<Vec<CameraDevice>, ScanError>) -> Vec<ScanCommand> {
        match listing {
            Ok(cameras) if !cameras.is_empty() => {
                self.no_cameras = false;
                let still_present = self
                    .camera_id
                    .as_ref()
                    .is_some_and(|id| cameras.iter().any(|c| &c.id == id));

                if matches!(
                    self.last_error,
                    Some(ScanError::NoCameraFound | ScanError::PermissionDenied(_))
                ) {
                    self.last_error = None;
                    self.status = ScanStatus::Idle;
                }

                if still_present {
                    return Vec::new();
                }

                let first = cameras[0].id.clone();
                info!(camera = %first, "Selecting camera");
                let commands = if self.status == ScanStatus::Scanning {
                    self.status = ScanStatus::Idle;
                    vec![ScanCommand::StopCamera]
                } else {
                    Vec::new()
                };
                self.camera_id = Some(first);
                commands
            }
            Ok(_) => self.on_cameras_unavailable(ScanError::NoCameraFound),
            Err(error) => self.on_cameras_unavailable(error),
        }
    }

    fn on_cameras_unavailable(&mut self, error: ScanError) -> Vec<ScanCommand> {
        warn!(error = %error, "No usable camera");
        self.no_cameras = matches!(error, ScanError::NoCameraFound);
        let was_scanning = self.status == ScanStatus::Scanning;
        self.camera_id = None;

        if self.status == ScanStatus::Processing {
            // Let the in-flight verification land; the camera is already stopped
            return Vec::new();
        }
        self.fail(error);
        if was_scanning {
            vec![ScanCommand::StopCamera]
        } else {
            Vec::new()
        }
    }

    fn on_start(&mut self) -> Vec<ScanCommand> {
        if matches!(self.status, ScanStatus::Scanning | ScanStatus::Processing) {
            debug!(status = %self.status, "Start ignored");
            return Vec::new();
        }

        let camera_id = match (&self.selected_event_id, &self.camera_id) {
            (Some(_), Some(camera_id)) => camera_id.clone(),
            (_, None) if self.no_cameras => {
                self.last_result = None;
                self.fail(ScanError::NoCameraFound);
                return Vec::new();
            }
            _ => {
                self.last_result = None;
                self.fail(ScanError::MissingSelection);
                return Vec::new();
            }
        };

        self.last_result = None;
        self.last_error = None;
        self.generation += 1;
        self.status = ScanStatus::Scanning;
        info!(camera = %camera_id, generation = self.generation, "Starting scan");

        vec![ScanCommand::StartCamera {
            camera_id,
            generation: self.generation,
        }]
    }

    fn on_decoded(&mut self, generation: u64, text: String) -> Vec<ScanCommand> {
        if !self.is_current(generation, ScanStatus::Scanning) {
            return Vec::new();
        }

        self.status = ScanStatus::Processing;
        let mut commands = vec![ScanCommand::StopCamera];

        match DecodedTicket::parse(&text) {
            Ok(ticket) => match self.selected_event_id.clone() {
                Some(event_id) => {
                    info!(customer_id = %ticket.customer_id, event_id = %event_id, "Ticket decoded");
                    commands.push(ScanCommand::Verify {
                        ticket,
                        event_id,
                        generation,
                    });
                }
                None => self.fail(ScanError::MissingSelection),
            },
            Err(error) => {
                warn!(error = %error, "Rejected scanned payload");
                self.fail(error);
            }
        }

        commands
    }

    fn on_verified(&mut self, generation: u64, outcome: Result<VerificationResult, ScanError>) {
        if !self.is_current(generation, ScanStatus::Processing) {
            return;
        }

        match outcome {
            Ok(result) if result.success => {
                info!(message = %result.message, "Check-in accepted");
                self.status = ScanStatus::Success;
                self.last_result = Some(result);
            }
            Ok(result) => {
                info!(message = %result.message, "Check-in refused");
                self.status = ScanStatus::Failed;
                self.last_result = Some(result);
            }
            Err(ScanError::ServerRejected { status, message }) => {
                info!(status = ?status, message = %message, "Check-in rejected by server");
                self.status = ScanStatus::Failed;
                self.last_result = Some(VerificationResult::rejected(message));
            }
            Err(error) => {
                warn!(error = %error, "Verification failed");
                self.fail(error);
            }
        }
    }
}
