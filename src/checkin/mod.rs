// SPDX-License-Identifier: GPL-3.0-only

//! Ticket check-in flow
//!
//! ```text
//! camera ──decode──▶ ScanSession ──Verify──▶ VerificationClient
//!    ▲                   │  ▲                       │
//!    └──Start/StopCamera─┘  └──────Verified─────────┘
//! ```
//!
//! [`ScanSession`] is the pure state machine, [`CheckInVerifier`] runs its
//! commands against a camera and a server, and [`project`] renders the
//! session into what the operator sees.

mod payload;
mod state;
mod status;
mod verifier;

pub use payload::DecodedTicket;
pub use state::{ScanCommand, ScanEvent, ScanSession, ScanStatus};
pub use status::{ScanControl, StatusIcon, StatusView, Tone, project};
pub use verifier::{CheckInVerifier, VerificationClient};
