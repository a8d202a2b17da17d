//! Typed access to the hosting backend.
//!
//! Every resource API goes through [`ApiClient::execute`], which owns the
//! whole failure taxonomy: a missing session token, a cancelled page, a
//! transport failure, or an error reported by the backend itself.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub mod articles;
pub mod auth;
pub mod orders;
pub mod plans;
pub mod users;
pub mod vps;

pub use articles::ArticleApi;
pub use auth::AuthApi;
pub use orders::OrderApi;
pub use plans::PlanApi;
pub use users::UserApi;
pub use vps::VpsApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Timeout,
    Connect,
    Encode,
    Decode,
    Other,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportKind::Timeout => "timeout",
            TransportKind::Connect => "connect",
            TransportKind::Encode => "encode",
            TransportKind::Decode => "decode",
            TransportKind::Other => "other",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("No session token")]
    MissingCredential,
    #[error("Request cancelled")]
    Cancelled,
    #[error("Transport error ({kind}): {message}")]
    Transport { kind: TransportKind, message: String },
    #[error("{detail}")]
    Server { status: u16, detail: String },
}

impl ApiError {
    /// Stable code used in JSON envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingCredential => "NO_TOKEN",
            ApiError::Cancelled => "CANCELLED",
            ApiError::Transport { .. } => "TRANSPORT",
            ApiError::Server { .. } => "SERVER",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }

    /// A stale or rejected token is handled like a missing one.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ApiError::MissingCredential | ApiError::Server { status: 401, .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Server { status: 404, .. })
    }

    /// Status this failure is answered with by our own endpoints.
    pub fn http_status(&self) -> StatusCode {
        match self {
            ApiError::MissingCredential => StatusCode::UNAUTHORIZED,
            ApiError::Server { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Transport { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn from_transport(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportKind::Timeout
        } else if err.is_connect() {
            TransportKind::Connect
        } else if err.is_decode() || err.is_body() {
            TransportKind::Decode
        } else {
            TransportKind::Other
        };
        ApiError::Transport {
            kind,
            message: err.to_string(),
        }
    }

    fn from_error_body(status: StatusCode, body: &[u8]) -> Self {
        ApiError::Server {
            status: status.as_u16(),
            detail: extract_detail(status, body),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
    message: Option<String>,
}

/// Pulls the human readable message out of an error body. The backend sends
/// `{"detail": "..."}`, or a list of `{"msg": ...}` objects for validation
/// failures.
fn extract_detail(status: StatusCode, body: &[u8]) -> String {
    let parsed: Option<ErrorBody> = serde_json::from_slice(body).ok();
    let from_body = parsed.and_then(|body| match body.detail {
        Some(serde_json::Value::String(detail)) => Some(detail),
        Some(serde_json::Value::Array(items)) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .map(str::to_string)
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        Some(serde_json::Value::Null) | None => body.message,
        Some(other) => Some(other.to_string()),
    });

    from_body.unwrap_or_else(|| match status.canonical_reason() {
        Some(reason) => reason.to_string(),
        None => format!("HTTP {}", status.as_u16()),
    })
}

/// Error half of an [`Envelope`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EnvelopeError {
    pub code: &'static str,
    pub detail: String,
}

/// Uniform `{ message, data, error }` shape served by the JSON endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeError>,
}

impl<T> Envelope<T> {
    pub fn from_result(success_message: impl Into<String>, result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => Envelope {
                message: success_message.into(),
                data: Some(data),
                error: None,
            },
            Err(err) => Envelope {
                message: err.to_string(),
                data: None,
                error: Some(EnvelopeError {
                    code: err.code(),
                    detail: err.to_string(),
                }),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// One backend call, described before it is executed.
#[derive(Debug)]
pub struct Call {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Result<serde_json::Value, String>>,
    token: Option<String>,
    requires_auth: bool,
}

impl Call {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            token: None,
            requires_auth: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Self {
        self.body = Some(serde_json::to_value(body).map_err(|e| e.to_string()));
        self
    }

    /// Marks the call as authenticated. A `None` token fails the call with
    /// [`ApiError::MissingCredential`] before anything is sent.
    pub fn bearer(mut self, token: Option<&str>) -> Self {
        self.token = token.map(str::to_string);
        self.requires_auth = true;
        self
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::from_transport)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Executes `call` and decodes the JSON response into `T`.
    ///
    /// Resolves to [`ApiError::Cancelled`] as soon as `cancel` fires,
    /// including when it was already cancelled before the call.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        call: Call,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError> {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        if call.requires_auth && call.token.is_none() {
            return Err(ApiError::MissingCredential);
        }

        let Call {
            method,
            path,
            query,
            body,
            token,
            ..
        } = call;

        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            let body = body.map_err(|message| ApiError::Transport {
                kind: TransportKind::Encode,
                message,
            })?;
            builder = builder.json(&body);
        }

        let exchange = async {
            let response = builder.send().await.map_err(ApiError::from_transport)?;
            let status = response.status();
            let bytes = response.bytes().await.map_err(ApiError::from_transport)?;

            if !status.is_success() {
                let err = ApiError::from_error_body(status, &bytes);
                debug!(%method, path = %path, status = status.as_u16(), error = %err, "Backend reported an error.");
                return Err(err);
            }

            // Empty bodies (204) decode as JSON null so `()` and `Option<_>` work.
            let payload: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
            serde_json::from_slice(payload).map_err(|e| {
                warn!(%method, path = %path, error = %e, "Failed to decode backend response.");
                ApiError::Transport {
                    kind: TransportKind::Decode,
                    message: e.to_string(),
                }
            })
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%method, path = %path, "Backend request cancelled.");
                Err(ApiError::Cancelled)
            }
            result = exchange => result,
        }
    }
}

/// Generic acknowledgement returned by action endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAck {
    #[serde(default)]
    pub message: String,
}
