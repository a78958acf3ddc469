// Client error taxonomy
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error";
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error occurred";

/// Structured failure body, `{success: false, message, details?, ...}`.
/// Fields beyond the known three are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            details: None,
            extra: Map::new(),
        }
    }

    /// Whether a decoded JSON body is one of the API's own failure
    /// envelopes rather than something a proxy or gateway produced
    pub fn is_envelope(value: &Value) -> bool {
        value.get("success") == Some(&Value::Bool(false))
            || value.get("message").is_some_and(Value::is_string)
    }
}

/// Every failure of an API call surfaces as one of these
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server answered with a structured body; kept verbatim
    #[error("{}", body.message)]
    Api { status: u16, body: ErrorBody },

    /// No response was received
    #[error("Network error")]
    Network { detail: String },

    #[error("Unknown error occurred")]
    Unknown { status: Option<u16>, detail: String },
}

impl ApiError {
    pub fn network(detail: impl Into<String>) -> Self {
        ApiError::Network {
            detail: detail.into(),
        }
    }

    pub fn unknown(status: Option<u16>, detail: impl Into<String>) -> Self {
        ApiError::Unknown {
            status,
            detail: detail.into(),
        }
    }

    /// HTTP status when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Network { .. } => None,
            ApiError::Unknown { status, .. } => *status,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Api { body, .. } => &body.message,
            ApiError::Network { .. } => NETWORK_ERROR_MESSAGE,
            ApiError::Unknown { .. } => UNKNOWN_ERROR_MESSAGE,
        }
    }

    /// Consistent error shape regardless of where the call failed
    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Api { body, .. } => body.clone(),
            ApiError::Network { .. } => ErrorBody::new(NETWORK_ERROR_MESSAGE),
            ApiError::Unknown { .. } => ErrorBody::new(UNKNOWN_ERROR_MESSAGE),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Api { status: 400, .. } => "BAD_REQUEST",
            ApiError::Api { status: 401, .. } => "UNAUTHORIZED",
            ApiError::Api { status: 403, .. } => "FORBIDDEN",
            ApiError::Api { status: 404, .. } => "NOT_FOUND",
            ApiError::Api { status: 409, .. } => "CONFLICT",
            ApiError::Api { status: 422, .. } => "UNPROCESSABLE_ENTITY",
            ApiError::Api { status, .. } if *status >= 500 => "SERVER_ERROR",
            ApiError::Api { .. } => "API_ERROR",
            ApiError::Network { .. } => "NETWORK_ERROR",
            ApiError::Unknown { .. } => "UNKNOWN_ERROR",
        }
    }
}
