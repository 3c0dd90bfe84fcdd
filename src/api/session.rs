// SPDX-License-Identifier: MPL-2.0

//! Authenticated staff session
//!
//! The auth service issues a JWT. Only the payload is read here, to learn
//! who is logged in and which features to offer; the server stays the one
//! that validates the signature.

use super::error::ApiError;
use super::types::{Role, role_or_default};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default, alias = "_id")]
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, deserialize_with = "role_or_default")]
    role: Role,
    #[serde(default)]
    exp: Option<i64>,
}

/// Bearer token plus the identity decoded from it
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Role,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Build a session from a stored token
    pub fn from_token(token: impl Into<String>) -> Result<Self, ApiError> {
        let token = token.into();
        let token = token.trim().to_string();

        let mut parts = token.split('.');
        let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => {
                return Err(ApiError::InvalidSession(
                    "expected three dot-separated parts".to_string(),
                ));
            }
        };

        // Some issuers pad the segments even though JWT forbids it
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| ApiError::InvalidSession(e.to_string()))?;
        let claims: Claims =
            serde_json::from_slice(&bytes).map_err(|e| ApiError::InvalidSession(e.to_string()))?;

        let expires_at = claims
            .exp
            .and_then(|exp| Utc.timestamp_opt(exp, 0).single());

        Ok(Self {
            token,
            user_id: claims.id,
            email: claims.email,
            role: claims.role,
            expires_at,
        })
    }

    /// Session for a token whose claims are already known (e.g. a login answer)
    pub fn with_role(token: impl Into<String>, user_id: impl Into<String>, role: Role) -> Self {
        let token = token.into();
        match Self::from_token(token.clone()) {
            Ok(session) => session,
            Err(_) => Self {
                token,
                user_id: user_id.into(),
                email: None,
                role,
                expires_at: None,
            },
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

// Keep the token out of logs
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
