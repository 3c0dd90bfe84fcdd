// SPDX-License-Identifier: MPL-2.0

//! REST client for the event backend
//!
//! Covers the endpoints the scanner and its admin commands use: events,
//! customer registration and verification, and staff authentication.

mod client;
mod error;
mod session;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use session::Session;
pub use types::{CustomerInfo, Event, EventCount, Role, VerificationResult};
