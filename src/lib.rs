// SPDX-License-Identifier: MPL-2.0

//! Check-in scanner - ticket verification for event entrances
//!
//! This library provides the pieces behind the `checkin-scanner` console:
//! camera capture with QR decoding, the check-in state machine, and a client
//! for the event backend.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Camera backend abstraction (V4L2, image directory)
//! - [`frame_processor`]: QR decoding of captured frames
//! - [`checkin`]: Scan session state machine, verifier and status view
//! - [`api`]: REST client for events, customers and staff accounts
//! - [`registration`]: Custom registration fields and form validation
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! // Scan tickets for an event from the terminal:
//! // checkin-scanner scan --event <event-id>
//! ```

pub mod api;
pub mod backends;
pub mod checkin;
pub mod config;
pub mod constants;
pub mod errors;
pub mod frame_processor;
pub mod registration;
pub mod terminal;

// Re-export commonly used types
pub use checkin::{CheckInVerifier, ScanSession, ScanStatus, StatusView};
pub use config::Config;
pub use errors::{AppError, AppResult, ScanError};
