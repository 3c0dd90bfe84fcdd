// SPDX-License-Identifier: GPL-3.0-only

//! Status projection for the scanner screen

use super::state::{ScanSession, ScanStatus};
use crate::api::CustomerInfo;
use crate::constants::messages;

/// Colour family of the status banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Info,
    Success,
    Warning,
    Danger,
}

impl Tone {
    pub fn class_name(&self) -> &'static str {
        match self {
            Tone::Neutral => "status-neutral",
            Tone::Info => "status-info",
            Tone::Success => "status-success",
            Tone::Warning => "status-warning",
            Tone::Danger => "status-danger",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIcon {
    Hint,
    Camera,
    Spinner,
    Check,
    Cross,
    Alert,
}

impl StatusIcon {
    /// Glyph used by the terminal console
    pub fn glyph(&self) -> &'static str {
        match self {
            StatusIcon::Hint => "i",
            StatusIcon::Camera => "◉",
            StatusIcon::Spinner => "…",
            StatusIcon::Check => "✔",
            StatusIcon::Cross => "✘",
            StatusIcon::Alert => "!",
        }
    }
}

/// Which scan button the screen offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    Hidden,
    Start,
    Stop,
    ScanAnother,
}

/// Everything the operator sees about the current scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub tone: Tone,
    pub icon: StatusIcon,
    pub message: String,
    pub customer: Option<CustomerInfo>,
    pub scan_control: ScanControl,
}

impl StatusView {
    fn new(tone: Tone, icon: StatusIcon, message: impl Into<String>, scan_control: ScanControl) -> Self {
        Self {
            tone,
            icon,
            message: message.into(),
            customer: None,
            scan_control,
        }
    }
}

/// Derive the status banner from the session
pub fn project(session: &ScanSession, cameras_available: bool) -> StatusView {
    let can_start =
        cameras_available && session.selected_event_id.is_some() && session.camera_id.is_some();

    if session.selected_event_id.is_none() && session.last_error.is_none() {
        return StatusView::new(
            Tone::Neutral,
            StatusIcon::Hint,
            messages::NOTHING_SELECTED,
            ScanControl::Hidden,
        );
    }

    let result_message = |fallback: &str| {
        session
            .last_result
            .as_ref()
            .map(|r| r.message.trim())
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_string()
    };

    match session.status {
        ScanStatus::Idle => {
            let (message, control) = if can_start {
                (messages::READY, ScanControl::Start)
            } else if !cameras_available || session.camera_id.is_none() {
                (messages::NO_CAMERA_FOUND, ScanControl::Hidden)
            } else {
                (messages::NOTHING_SELECTED, ScanControl::Hidden)
            };
            StatusView::new(Tone::Neutral, StatusIcon::Hint, message, control)
        }
        ScanStatus::Scanning => StatusView::new(
            Tone::Info,
            StatusIcon::Camera,
            messages::SCANNING,
            ScanControl::Stop,
        ),
        ScanStatus::Processing => StatusView::new(
            Tone::Info,
            StatusIcon::Spinner,
            messages::PROCESSING,
            ScanControl::Hidden,
        ),
        ScanStatus::Success => {
            let mut view = StatusView::new(
                Tone::Success,
                StatusIcon::Check,
                result_message(messages::SUCCESS_FALLBACK),
                ScanControl::ScanAnother,
            );
            view.customer = session.last_result.as_ref().and_then(|r| r.customer.clone());
            view
        }
        ScanStatus::Failed => StatusView::new(
            Tone::Warning,
            StatusIcon::Cross,
            result_message(messages::FAILED_FALLBACK),
            ScanControl::ScanAnother,
        ),
        ScanStatus::Error => {
            let message = session
                .last_error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| messages::ERROR_FALLBACK.to_string());
            // Nothing to scan again with
            let control = if cameras_available {
                ScanControl::ScanAnother
            } else {
                ScanControl::Hidden
            };
            StatusView::new(Tone::Danger, StatusIcon::Alert, message, control)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::VerificationResult;
    use crate::errors::ScanError;

    fn session(status: ScanStatus) -> ScanSession {
        let mut session = ScanSession::new();
        session.selected_event_id = Some("e1".into());
        session.camera_id = Some("cam0".into());
        session.status = status;
        session
    }

    #[test]
    fn test_nothing_selected() {
        let view = project(&ScanSession::default(), true);
        assert_eq!(view.message, messages::NOTHING_SELECTED);
        assert_eq!(view.scan_control, ScanControl::Hidden);
    }

    #[test]
    fn test_idle_offers_start_only_with_camera() {
        assert_eq!(project(&session(ScanStatus::Idle), true).scan_control, ScanControl::Start);

        let mut no_camera = session(ScanStatus::Idle);
        no_camera.camera_id = None;
        assert_eq!(project(&no_camera, true).scan_control, ScanControl::Hidden);
        assert_eq!(project(&session(ScanStatus::Idle), false).scan_control, ScanControl::Hidden);
    }

    #[test]
    fn test_scanning_and_processing() {
        let scanning = project(&session(ScanStatus::Scanning), true);
        assert_eq!(scanning.scan_control, ScanControl::Stop);
        assert_eq!(scanning.tone, Tone::Info);

        let processing = project(&session(ScanStatus::Processing), true);
        assert_eq!(processing.icon, StatusIcon::Spinner);
        assert_eq!(processing.scan_control, ScanControl::Hidden);
    }

    #[test]
    fn test_failed_shows_server_message() {
        let mut failed = session(ScanStatus::Failed);
        failed.last_result = Some(VerificationResult::rejected("Already checked in"));
        let view = project(&failed, true);
        assert_eq!(view.message, "Already checked in");
        assert_eq!(view.tone.class_name(), "status-warning");
    }

    #[test]
    fn test_success_fallback_message() {
        let mut ok = session(ScanStatus::Success);
        ok.last_result = Some(VerificationResult {
            success: true,
            message: String::new(),
            customer: None,
        });
        assert_eq!(project(&ok, true).message, messages::SUCCESS_FALLBACK);
    }

    #[test]
    fn test_error_without_cameras_hides_control() {
        let mut err = ScanSession::new();
        err.status = ScanStatus::Error;
        err.last_error = Some(ScanError::NoCameraFound);
        let view = project(&err, false);
        assert_eq!(view.message, messages::NO_CAMERA_FOUND);
        assert_eq!(view.scan_control, ScanControl::Hidden);
        assert_eq!(view.icon.glyph(), "!");
    }
}
