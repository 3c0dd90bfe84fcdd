// SPDX-License-Identifier: MPL-2.0

//! Wire types for the event REST API
//!
//! Field names follow the server's JSON (Indonesian names such as `nama`,
//! `tanggal`, `noHp` are kept as-is on the wire).

use crate::registration::{CustomField, FieldValue};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An event participants register for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: String,
    pub nama: String,
    pub tanggal: DateTime<Utc>,
    #[serde(default)]
    pub lokasi: Option<String>,
    #[serde(default)]
    pub deskripsi: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub registration_slug: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl Event {
    /// Registration closes once the event date is reached
    pub fn registration_open(&self, now: DateTime<Utc>) -> bool {
        self.tanggal > now
    }

    /// Public registration path for this event, if it has a slug
    pub fn registration_path(&self) -> Option<String> {
        self.registration_slug
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|slug| format!("/register/{}", slug))
    }
}

/// Payload for `POST /events`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub nama: String,
    pub tanggal: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lokasi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deskripsi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<CustomField>,
}

impl NewEvent {
    /// Event date from `YYYY-MM-DD` (midnight UTC) or RFC 3339
    pub fn parse_date(raw: &str) -> Result<DateTime<Utc>, String> {
        let raw = raw.trim();
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Ok(at.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|day| day.and_time(NaiveTime::MIN).and_utc())
            .map_err(|_| format!("expected YYYY-MM-DD or an RFC 3339 date, got '{}'", raw))
    }
}

/// Registration count for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCount {
    #[serde(alias = "total")]
    pub count: u64,
}

/// Customer details returned with a verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[serde(default)]
    pub nama: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub no_hp: String,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
}

/// Answer of `POST /customers/verify`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub customer: Option<CustomerInfo>,
}

impl VerificationResult {
    /// A rejection carrying only the server's reason
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            customer: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerifyRequest<'a> {
    pub customer_id: &'a str,
    pub event_id: &'a str,
}

/// Payload for `POST /customers`
///
/// Custom field answers are sent flattened next to the fixed fields, keyed
/// by field id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub event: String,
    pub nama: String,
    pub email: String,
    pub no_hp: String,
    pub alamat: String,
    #[serde(flatten)]
    pub registration_data: BTreeMap<String, FieldValue>,
}

/// A registered participant
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(rename = "_id")]
    pub id: String,
    pub nama: String,
    pub email: String,
    #[serde(default)]
    pub no_hp: String,
    #[serde(default)]
    pub alamat: Option<String>,
    #[serde(default, rename = "isVerified")]
    pub verified: bool,
    #[serde(default)]
    pub registration_data: BTreeMap<String, FieldValue>,
}

/// Staff role as issued by the auth service
///
/// Names the server may add later read as `petugas`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Viewer,
    /// Check-in officer
    #[default]
    #[serde(other)]
    Petugas,
}

/// `deserialize_with` helper: a `null` role is the default role
pub(crate) fn role_or_default<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Role>::deserialize(deserializer)?.unwrap_or_default())
}

impl Role {
    pub fn can_manage_events(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_manage_users(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_scan(&self) -> bool {
        matches!(self, Role::Admin | Role::Petugas)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "petugas" => Ok(Role::Petugas),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("unknown role '{}' (admin, petugas, viewer)", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Petugas => write!(f, "petugas"),
            Role::Viewer => write!(f, "viewer"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Answer of `POST /auth/login`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "role_or_default")]
    pub role: Role,
}

/// Payload for `POST /auth/register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nama: Option<String>,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Error body shape used by the server
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}
