//! Error types for catalog calls.
//!
//! [`ValidationError`] is raised before any network traffic; [`ApiError`]
//! covers everything from a bad credential to an undecodable upstream body.

use thiserror::Error;

use crate::http::StatusCode;

/// Caller input rejected before any upstream call is made.
///
/// The messages are what inbound callers see in the `error` field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid time_window parameter")]
    TimeWindow { value: String },

    #[error("invalid media type")]
    MediaKind { value: String },

    #[error("invalid page parameter")]
    Page { value: String },

    #[error("invalid id")]
    Id { value: String },

    #[error("invalid genre ID")]
    Genre { value: String },

    #[error("query parameter is required")]
    MissingQuery,
}

/// Everything that can go wrong between an accessor call and a typed result.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("upstream credential is empty")]
    MissingToken,

    #[error("upstream credential is not a valid header value")]
    InvalidToken,

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("upstream request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("upstream request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("upstream returned {status} for {endpoint}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode upstream response for {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// The caller sent something unusable; nothing went upstream.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// The call went upstream (or tried to) and failed there.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Transport { .. } | Self::Status { .. } | Self::Decode { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Status an inbound caller should see for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BadRequest,
            Self::Timeout { .. } => StatusCode::GatewayTimeout,
            _ => StatusCode::InternalServerError,
        }
    }

    pub(crate) fn from_transport(endpoint: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                endpoint: endpoint.to_owned(),
            }
        } else {
            Self::Transport {
                endpoint: endpoint.to_owned(),
                source,
            }
        }
    }
}
