// SPDX-License-Identifier: MPL-2.0

//! HTTP client for the event backend

use super::error::ApiError;
use super::session::Session;
use super::types::{
    Customer, ErrorBody, Event, EventCount, LoginRequest, LoginResponse, NewCustomer, NewEvent,
    NewUser, Role, VerificationResult, VerifyRequest,
};
use crate::checkin::VerificationClient;
use crate::errors::ScanError;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Event backend client
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    session: Option<Session>,
}

impl ApiClient {
    /// Create a client for `base_url` with the given request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url =
            Url::parse(trimmed).map_err(|e| ApiError::InvalidUrl(format!("{trimmed}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!("{trimmed}: not a base URL")));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("checkin-scanner/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            session: None,
        })
    }

    /// A copy of this client that authenticates as `session`
    pub fn with_session(&self, session: Session) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            session: Some(session),
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Endpoint URL below the API root; each segment is percent-encoded
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.trim().is_empty() || **s == "." || **s == "..")
        {
            return Err(ApiError::InvalidUrl(format!("invalid path segment '{}'", bad)));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let builder = self.client.request(method, self.url(segments)?);
        Ok(match &self.session {
            Some(session) => builder.bearer_auth(session.token()),
            None => builder,
        })
    }

    /// Request for an endpoint that needs a session whose role passes `allowed`
    fn authed(
        &self,
        method: Method,
        segments: &[&str],
        allowed: fn(&Role) -> bool,
    ) -> Result<RequestBuilder, ApiError> {
        match &self.session {
            None => Err(ApiError::Unauthorized),
            Some(session) if !allowed(&session.role) => {
                warn!(role = %session.role, "Staff endpoint refused locally");
                Err(ApiError::Status {
                    status: 403,
                    message: Some(format!("Role '{}' may not do this", session.role)),
                })
            }
            Some(_) => self.request(method, segments),
        }
    }

    async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(ApiError::from_reqwest)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());
        debug!(status = status.as_u16(), message = ?message, "Request rejected");
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::send(builder).await?;
        let bytes = response.bytes().await.map_err(ApiError::from_reqwest)?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        builder: RequestBuilder,
        body: &B,
    ) -> Result<T, ApiError> {
        Self::json(builder.json(body)).await
    }

    /// `GET /events`
    pub async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        Self::json(self.request(Method::GET, &["events"])?).await
    }

    /// `GET /events/:id/count`
    pub async fn event_count(&self, event_id: &str) -> Result<EventCount, ApiError> {
        Self::json(self.request(Method::GET, &["events", event_id, "count"])?).await
    }

    /// `GET /events/slug/:slug`
    pub async fn event_by_slug(&self, slug: &str) -> Result<Event, ApiError> {
        Self::json(self.request(Method::GET, &["events", "slug", slug])?).await
    }

    /// `POST /events`
    pub async fn create_event(&self, event: &NewEvent) -> Result<Event, ApiError> {
        let builder = self.authed(Method::POST, &["events"], Role::can_manage_events)?;
        let created: Event = Self::post_json(builder, event).await?;
        info!(event_id = %created.id, event = %created.nama, "Created event");
        Ok(created)
    }

    /// `DELETE /events/:id`
    pub async fn delete_event(&self, event_id: &str) -> Result<(), ApiError> {
        let builder = self.authed(Method::DELETE, &["events", event_id], Role::can_manage_events)?;
        Self::send(builder).await?;
        info!(event_id, "Deleted event");
        Ok(())
    }

    /// `POST /customers`
    pub async fn register_customer(&self, customer: &NewCustomer) -> Result<Customer, ApiError> {
        Self::post_json(self.request(Method::POST, &["customers"])?, customer).await
    }

    /// `DELETE /customers/:id`
    pub async fn delete_customer(&self, customer_id: &str) -> Result<(), ApiError> {
        let builder = self.authed(
            Method::DELETE,
            &["customers", customer_id],
            Role::can_manage_events,
        )?;
        Self::send(builder).await?;
        info!(customer_id, "Deleted customer");
        Ok(())
    }

    /// `POST /customers/verify`
    ///
    /// Issued once per call; never retried.
    pub async fn verify_ticket(
        &self,
        customer_id: &str,
        event_id: &str,
    ) -> Result<VerificationResult, ApiError> {
        info!(customer_id, event_id, "Verifying ticket");
        let body = VerifyRequest {
            customer_id,
            event_id,
        };
        Self::post_json(self.request(Method::POST, &["customers", "verify"])?, &body).await
    }

    /// `POST /auth/login`
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest { email, password };
        let response: LoginResponse =
            Self::post_json(self.request(Method::POST, &["auth", "login"])?, &body).await?;
        info!(email, role = %response.role, "Logged in");
        Ok(response)
    }

    /// `POST /auth/register`
    pub async fn register_user(&self, user: &NewUser) -> Result<(), ApiError> {
        let builder = self.authed(Method::POST, &["auth", "register"], Role::can_manage_users)?;
        Self::send(builder.json(user)).await?;
        info!(email = %user.email, role = %user.role, "Created staff account");
        Ok(())
    }

    /// `DELETE /users/:id`
    pub async fn delete_user(&self, user_id: &str) -> Result<(), ApiError> {
        let builder = self.authed(Method::DELETE, &["users", user_id], Role::can_manage_users)?;
        Self::send(builder).await?;
        info!(user_id, "Deleted staff account");
        Ok(())
    }
}

impl VerificationClient for ApiClient {
    async fn verify(
        &self,
        customer_id: &str,
        event_id: &str,
    ) -> Result<VerificationResult, ScanError> {
        self.verify_ticket(customer_id, event_id)
            .await
            .map_err(ScanError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:5000/api", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:5000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url", Duration::from_secs(1)),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            ApiClient::new("mailto:ops@example.com", Duration::from_secs(1)),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_ids_stay_inside_their_segment() {
        let url = client().url(&["events", "slug", "a?x=1"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/events/slug/a%3Fx=1");

        let url = client().url(&["events", "../customers"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/events/..%2Fcustomers");

        assert!(matches!(
            client().url(&["events", ".."]),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(client().url(&["users", ""]), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_root_base_url() {
        let client = ApiClient::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        let url = client.url(&["events"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/events");
    }

    #[test]
    fn test_with_session_does_not_touch_original() {
        let client = client();
        let scoped = client.with_session(Session::with_role("opaque", "u1", Role::Admin));
        assert!(client.session().is_none());
        assert_eq!(scoped.session().map(|s| s.role), Some(Role::Admin));
    }

    #[tokio::test]
    async fn test_staff_endpoints_need_role() {
        let client = client();
        assert_eq!(client.delete_event("e1").await, Err(ApiError::Unauthorized));

        let officer = client.with_session(Session::with_role("opaque", "u2", Role::Petugas));
        assert!(matches!(
            officer.delete_user("u3").await,
            Err(ApiError::Status { status: 403, .. })
        ));
        assert!(matches!(
            officer.delete_customer("c1").await,
            Err(ApiError::Status { status: 403, .. })
        ));
    }
}
