//! OpenStack provider error types

use stackform_cloud::WaitError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpenStackError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// HTTP 404 from the control plane.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// HTTP 409: the parent aggregate has another mutation in flight.
    /// The only retryable class, see [`is_retryable`].
    #[error("Conflicting operation in progress: {0}")]
    Conflict(String),

    /// Contradictory or malformed desired state. Reported before any
    /// network call is made.
    #[error("Invalid configuration: {0}")]
    Validation(String),

    /// A sub-resource whose owning load balancer cannot be determined from
    /// the API response.
    #[error("Unable to resolve parent load balancer: {0}")]
    ParentUnresolved(String),

    #[error("{kind} {id} is in status {status}")]
    UnexpectedStatus {
        kind: &'static str,
        id: String,
        status: String,
    },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OpenStackError>;

/// Retry predicate for mutating calls: only the remote's "another change is
/// in flight on this aggregate" rejection is transient. Everything else,
/// including quota and validation rejections, is fatal.
pub fn is_retryable(err: &OpenStackError) -> bool {
    matches!(err, OpenStackError::Conflict(_))
}

impl From<OpenStackError> for stackform_cloud::CloudError {
    fn from(err: OpenStackError) -> Self {
        use stackform_cloud::CloudError;
        match err {
            OpenStackError::AuthenticationFailed(msg) => CloudError::AuthenticationFailed(msg),
            OpenStackError::NotFound { kind, id } => {
                CloudError::ResourceNotFound(format!("{kind} {id}"))
            }
            OpenStackError::Conflict(msg) => CloudError::Conflict(msg),
            OpenStackError::Validation(msg) | OpenStackError::MissingEnvVar(msg) => {
                CloudError::InvalidConfig(msg)
            }
            OpenStackError::UnexpectedStatus { kind, id, status } => {
                CloudError::UnexpectedStatus {
                    id: format!("{kind} {id}"),
                    status,
                }
            }
            OpenStackError::Timeout(msg) => CloudError::Timeout(msg),
            OpenStackError::Json(e) => CloudError::Json(e),
            other => CloudError::ApiError(other.to_string()),
        }
    }
}

impl From<WaitError<OpenStackError>> for OpenStackError {
    fn from(err: WaitError<OpenStackError>) -> Self {
        match err {
            WaitError::NotFound { kind, id, .. } => OpenStackError::NotFound { kind, id },
            WaitError::UnexpectedStatus { kind, id, status, .. } => {
                OpenStackError::UnexpectedStatus { kind, id, status }
            }
            WaitError::Timeout { .. } => OpenStackError::Timeout(err.to_string()),
            WaitError::Fetch(inner) => inner,
        }
    }
}
