//! Hosted collaborator over HTTP.
//!
//! Plugin HTTP requests are fire-and-forget: the host performs them and later
//! delivers the result as an event. This module therefore splits each
//! capability call in two halves instead of implementing
//! [`Backend`](super::Backend):
//!
//! - [`RemoteClient::prepare`] turns a [`BackendRequest`] into an [`HttpCall`]
//!   plus a [`PendingCall`] that travels in the request's context map
//! - [`RemoteClient::interpret`] turns the status and body delivered with the
//!   result event back into a [`BackendResponse`]
//!
//! Calls that need no round trip (`public_url`, or `current_session` without a
//! stored token) resolve immediately.

use super::capability::{Order, Query};
use super::request::{BackendOp, BackendOutput, BackendRequest, BackendResponse, Purpose};
use crate::domain::error::{MascotasError, Result};
use crate::domain::Identity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

/// Context-map key carrying the serialized [`PendingCall`].
const CONTEXT_KEY: &str = "mascotas_pending";

/// Base URL and public API key of the hosted service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    base: Url,
    anon_key: String,
}

impl RemoteEndpoint {
    /// Validates the service URL.
    ///
    /// # Errors
    ///
    /// Returns [`MascotasError::Config`] if the URL does not parse, is not
    /// `http`/`https`, or the key is blank.
    pub fn new(url: &str, anon_key: &str) -> Result<Self> {
        let base = Url::parse(url.trim())
            .map_err(|e| MascotasError::Config(format!("invalid backend_url '{url}': {e}")))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(MascotasError::Config(format!(
                "backend_url must be an http(s) URL, got '{url}'"
            )));
        }
        if anon_key.trim().is_empty() {
            return Err(MascotasError::Config("backend_anon_key is empty".to_string()));
        }
        Ok(Self {
            base,
            anon_key: anon_key.trim().to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.extend(segment.split('/').filter(|s| !s.is_empty()));
            }
        }
        url
    }
}

/// HTTP verbs the hosted API needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A fully composed HTTP request ready for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpCall {
    pub url: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

/// How to read the response of an in-flight call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum Expect {
    /// Sign-up or sign-in: a user, possibly wrapped in a session.
    Identity,
    SignedOut,
    /// Current user lookup made with the stored token.
    CurrentUser,
    Uploaded { path: String },
    Rows,
}

/// State of an in-flight call, round-tripped through the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCall {
    purpose: Purpose,
    expect: Expect,
}

impl PendingCall {
    #[must_use]
    pub const fn purpose(&self) -> Purpose {
        self.purpose
    }

    /// Encodes the call into a request context map.
    #[must_use]
    pub fn to_context(&self) -> BTreeMap<String, String> {
        let mut context = BTreeMap::new();
        if let Ok(encoded) = serde_json::to_string(self) {
            context.insert(CONTEXT_KEY.to_string(), encoded);
        }
        context
    }

    /// Decodes a call from a result event's context map. Returns `None` for
    /// requests this plugin did not issue.
    #[must_use]
    pub fn from_context(context: &BTreeMap<String, String>) -> Option<Self> {
        let encoded = context.get(CONTEXT_KEY)?;
        match serde_json::from_str(encoded) {
            Ok(call) => Some(call),
            Err(e) => {
                tracing::warn!(error = %e, "undecodable request context");
                None
            }
        }
    }
}

/// Result of [`RemoteClient::prepare`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prepared {
    /// Resolved locally; no request needed.
    Immediate(BackendResponse),
    /// Send `call` and hand `pending` back to [`RemoteClient::interpret`].
    Http { call: HttpCall, pending: PendingCall },
}

/// Change to the stored access token caused by a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenChange {
    Unchanged,
    Set(String),
    Cleared,
}

/// Translates capability calls for the hosted service and keeps the access
/// token of the signed-in identity.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    endpoint: RemoteEndpoint,
    token: Option<String>,
}

impl RemoteClient {
    #[must_use]
    pub const fn new(endpoint: RemoteEndpoint, token: Option<String>) -> Self {
        Self { endpoint, token }
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Composes the HTTP request for `request`.
    ///
    /// `traceparent` is forwarded as the W3C header when present.
    pub fn prepare(&self, request: &BackendRequest, traceparent: Option<String>) -> Prepared {
        let _span = tracing::debug_span!("remote_prepare",
            purpose = ?request.purpose,
            op = request.op.name()
        )
        .entered();

        let purpose = request.purpose;
        let pending = |expect| PendingCall { purpose, expect };

        let (call, expect) = match &request.op {
            BackendOp::SignUp { email, password } => (
                self.json_call(
                    self.endpoint.endpoint(["auth/v1/signup"]),
                    &serde_json::json!({ "email": email, "password": password }),
                ),
                Expect::Identity,
            ),
            BackendOp::SignIn { email, password } => {
                let mut url = self.endpoint.endpoint(["auth/v1/token"]);
                url.query_pairs_mut().append_pair("grant_type", "password");
                (
                    self.json_call(url, &serde_json::json!({ "email": email, "password": password })),
                    Expect::Identity,
                )
            }
            BackendOp::SignOut => {
                if self.token.is_none() {
                    return Prepared::Immediate(BackendResponse::ok(
                        purpose,
                        BackendOutput::Session(None),
                    ));
                }
                (
                    self.call(HttpMethod::Post, self.endpoint.endpoint(["auth/v1/logout"]), Vec::new()),
                    Expect::SignedOut,
                )
            }
            BackendOp::CurrentSession => {
                if self.token.is_none() {
                    return Prepared::Immediate(BackendResponse::ok(
                        purpose,
                        BackendOutput::Session(None),
                    ));
                }
                (
                    self.call(HttpMethod::Get, self.endpoint.endpoint(["auth/v1/user"]), Vec::new()),
                    Expect::CurrentUser,
                )
            }
            BackendOp::Upload {
                bucket,
                path,
                content_type,
                bytes,
            } => {
                let mut call = self.call(
                    HttpMethod::Post,
                    self.endpoint.endpoint(["storage/v1/object", bucket.as_str(), path.as_str()]),
                    bytes.clone(),
                );
                call.headers.insert("Content-Type".to_string(), content_type.clone());
                call.headers.insert("x-upsert".to_string(), "false".to_string());
                (call, Expect::Uploaded { path: path.clone() })
            }
            BackendOp::PublicUrl { bucket, path } => {
                return Prepared::Immediate(BackendResponse::ok(
                    purpose,
                    BackendOutput::PublicUrl(self.public_url(bucket, path)),
                ));
            }
            BackendOp::Insert { table, row } => {
                let mut call = self.json_call(self.endpoint.endpoint(["rest/v1", table.as_str()]), row);
                call.headers.insert("Prefer".to_string(), "return=representation".to_string());
                (call, Expect::Rows)
            }
            BackendOp::Select { table, query } => (
                self.call(HttpMethod::Get, self.select_url(table, query), Vec::new()),
                Expect::Rows,
            ),
            BackendOp::Upsert { table, row } => {
                let mut call = self.json_call(self.endpoint.endpoint(["rest/v1", table.as_str()]), row);
                call.headers.insert(
                    "Prefer".to_string(),
                    "resolution=merge-duplicates,return=representation".to_string(),
                );
                (call, Expect::Rows)
            }
        };

        let mut call = call;
        if let Some(traceparent) = traceparent {
            call.headers.insert("traceparent".to_string(), traceparent);
        }

        tracing::debug!(url = %call.url, method = ?call.method, "request prepared");
        Prepared::Http {
            call,
            pending: pending(expect),
        }
    }

    /// Reads a delivered response.
    pub fn interpret(&mut self, pending: &PendingCall, status: u16, body: &[u8]) -> (BackendResponse, TokenChange) {
        let _span = tracing::debug_span!("remote_interpret",
            purpose = ?pending.purpose,
            status = status
        )
        .entered();

        let purpose = pending.purpose;

        if !(200..300).contains(&status) {
            if pending.expect == Expect::CurrentUser && status == 401 {
                tracing::debug!("stored token rejected, treating as signed out");
                self.token = None;
                return (
                    BackendResponse::ok(purpose, BackendOutput::Session(None)),
                    TokenChange::Cleared,
                );
            }
            if pending.expect == Expect::SignedOut {
                self.token = None;
                return (
                    BackendResponse::ok(purpose, BackendOutput::Session(None)),
                    TokenChange::Cleared,
                );
            }
            let message = error_message(status, body);
            tracing::debug!(message = %message, "request rejected");
            return (BackendResponse::err(purpose, message), TokenChange::Unchanged);
        }

        let parsed = if body.is_empty() {
            Ok(Value::Null)
        } else {
            serde_json::from_slice::<Value>(body)
        };
        let value = match parsed {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "response body is not JSON");
                return (
                    BackendResponse::err(purpose, format!("Respuesta inválida del servidor: {e}")),
                    TokenChange::Unchanged,
                );
            }
        };

        match &pending.expect {
            Expect::Identity => match parse_identity(&value) {
                Some(identity) => {
                    let change = match &identity.access_token {
                        Some(token) => {
                            self.token = Some(token.clone());
                            TokenChange::Set(token.clone())
                        }
                        None => TokenChange::Unchanged,
                    };
                    (BackendResponse::ok(purpose, BackendOutput::Session(Some(identity))), change)
                }
                None => (
                    BackendResponse::err(purpose, "Respuesta de autenticación incompleta"),
                    TokenChange::Unchanged,
                ),
            },
            Expect::SignedOut => {
                self.token = None;
                (
                    BackendResponse::ok(purpose, BackendOutput::Session(None)),
                    TokenChange::Cleared,
                )
            }
            Expect::CurrentUser => {
                let identity = parse_identity(&value).map(|identity| match &self.token {
                    Some(token) => identity.with_token(token.clone()),
                    None => identity,
                });
                (BackendResponse::ok(purpose, BackendOutput::Session(identity)), TokenChange::Unchanged)
            }
            Expect::Uploaded { path } => (
                BackendResponse::ok(purpose, BackendOutput::Uploaded { path: path.clone() }),
                TokenChange::Unchanged,
            ),
            Expect::Rows => {
                let rows = match value {
                    Value::Array(rows) => rows,
                    Value::Null => Vec::new(),
                    other => vec![other],
                };
                (BackendResponse::ok(purpose, BackendOutput::Rows(rows)), TokenChange::Unchanged)
            }
        }
    }

    /// Public URL of a stored object. Computed, never requested.
    #[must_use]
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        self.endpoint
            .endpoint(["storage/v1/object/public", bucket, path])
            .to_string()
    }

    fn select_url(&self, table: &str, query: &Query) -> Url {
        let mut url = self.endpoint.endpoint(["rest/v1", table]);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");
            for filter in &query.filters {
                let value = match &filter.value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                pairs.append_pair(&filter.column, &format!("eq.{value}"));
            }
            if let Some(Order { column, descending }) = &query.order {
                let direction = if *descending { "desc" } else { "asc" };
                pairs.append_pair("order", &format!("{column}.{direction}"));
            }
        }
        url
    }

    fn call(&self, method: HttpMethod, url: Url, body: Vec<u8>) -> HttpCall {
        let bearer = self.token.as_deref().unwrap_or(&self.endpoint.anon_key);
        let mut headers = BTreeMap::new();
        headers.insert("apikey".to_string(), self.endpoint.anon_key.clone());
        headers.insert("Authorization".to_string(), format!("Bearer {bearer}"));
        HttpCall {
            url: url.to_string(),
            method,
            headers,
            body,
        }
    }

    fn json_call(&self, url: Url, payload: &Value) -> HttpCall {
        let body = serde_json::to_vec(payload).unwrap_or_default();
        let mut call = self.call(HttpMethod::Post, url, body);
        call.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        call
    }
}

/// Extracts an identity from a user object or a session wrapping one.
fn parse_identity(value: &Value) -> Option<Identity> {
    let user = value.get("user").unwrap_or(value);
    let id = user.get("id")?.as_str()?;
    let email = user.get("email").and_then(Value::as_str).unwrap_or_default();
    let identity = Identity::new(id, email);
    Some(match value.get("access_token").and_then(Value::as_str) {
        Some(token) => identity.with_token(token),
        None => identity,
    })
}

/// Reduces an error body to its human-readable message.
fn error_message(status: u16, body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| {
            ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| format!("HTTP {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(token: Option<&str>) -> RemoteClient {
        let endpoint = RemoteEndpoint::new("https://demo.example.co/", "anon-key").unwrap();
        RemoteClient::new(endpoint, token.map(str::to_string))
    }

    fn http(prepared: Prepared) -> (HttpCall, PendingCall) {
        match prepared {
            Prepared::Http { call, pending } => (call, pending),
            Prepared::Immediate(response) => panic!("expected HTTP call, got {response:?}"),
        }
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(RemoteEndpoint::new("ftp://x", "k").is_err());
        assert!(RemoteEndpoint::new("https://x", " ").is_err());
    }

    #[test]
    fn select_encodes_filter_and_order() {
        let request = BackendRequest::new(
            Purpose::ProfileStats,
            BackendOp::Select {
                table: "reports".into(),
                query: Query::all().eq("user_id", "u1").order_by_desc("published_at"),
            },
        );
        let (call, _) = http(client(Some("jwt")).prepare(&request, None));
        assert_eq!(
            call.url,
            "https://demo.example.co/rest/v1/reports?select=*&user_id=eq.u1&order=published_at.desc"
        );
        assert_eq!(call.method, HttpMethod::Get);
        assert_eq!(call.headers["Authorization"], "Bearer jwt");
        assert_eq!(call.headers["apikey"], "anon-key");
    }

    #[test]
    fn anonymous_calls_use_the_anon_key_as_bearer() {
        let request = BackendRequest::new(
            Purpose::SubmitInsert,
            BackendOp::Insert {
                table: "reports".into(),
                row: json!({"name": "Firulais"}),
            },
        );
        let (call, _) = http(client(None).prepare(&request, Some("00-abc-def-01".into())));
        assert_eq!(call.headers["Authorization"], "Bearer anon-key");
        assert_eq!(call.headers["Prefer"], "return=representation");
        assert_eq!(call.headers["traceparent"], "00-abc-def-01");
    }

    #[test]
    fn sign_in_sets_the_token() {
        let mut client = client(None);
        let request = BackendRequest::new(
            Purpose::Login,
            BackendOp::SignIn {
                email: "ana@example.org".into(),
                password: "secreto".into(),
            },
        );
        let (call, pending) = http(client.prepare(&request, None));
        assert!(call.url.ends_with("/auth/v1/token?grant_type=password"));

        let body = json!({"access_token": "jwt", "user": {"id": "u1", "email": "ana@example.org"}});
        let (response, change) = client.interpret(&pending, 200, body.to_string().as_bytes());
        let identity = response.into_session().unwrap().unwrap();
        assert_eq!(identity.id, "u1");
        assert_eq!(change, TokenChange::Set("jwt".into()));
        assert_eq!(client.token(), Some("jwt"));
    }

    #[test]
    fn current_session_without_token_needs_no_request() {
        let request = BackendRequest::new(Purpose::RestoreSession, BackendOp::CurrentSession);
        match client(None).prepare(&request, None) {
            Prepared::Immediate(response) => assert_eq!(response.into_session(), Ok(None)),
            Prepared::Http { .. } => panic!("unexpected request"),
        }
    }

    #[test]
    fn expired_token_reads_as_signed_out() {
        let mut client = client(Some("old"));
        let request = BackendRequest::new(Purpose::RestoreSession, BackendOp::CurrentSession);
        let (_, pending) = http(client.prepare(&request, None));
        let (response, change) = client.interpret(&pending, 401, br#"{"msg":"JWT expired"}"#);
        assert_eq!(response.into_session(), Ok(None));
        assert_eq!(change, TokenChange::Cleared);
    }

    #[test]
    fn error_bodies_reduce_to_their_message() {
        assert_eq!(error_message(400, br#"{"error_description":"Invalid login credentials"}"#), "Invalid login credentials");
        assert_eq!(error_message(409, br#"{"message":"duplicate key"}"#), "duplicate key");
        assert_eq!(error_message(502, b"<html>bad gateway</html>"), "HTTP 502");
    }

    #[test]
    fn public_url_is_computed() {
        assert_eq!(
            client(None).public_url("pet-photos", "a b.png"),
            "https://demo.example.co/storage/v1/object/public/pet-photos/a%20b.png"
        );
    }

    #[test]
    fn pending_call_round_trips_through_context() {
        let pending = PendingCall {
            purpose: Purpose::SubmitUpload,
            expect: Expect::Uploaded { path: "x.png".into() },
        };
        assert_eq!(PendingCall::from_context(&pending.to_context()), Some(pending));
        assert_eq!(PendingCall::from_context(&BTreeMap::new()), None);
    }
}
