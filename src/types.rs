//! Wire envelope shared by every endpoint of the admin API

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ErrorBody};

/// `{success, message?, data?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    // `default` here would add a `T: Default` bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Unwrap `data` from a successful envelope; an unsuccessful or empty one
    /// becomes a structured API error carrying the server's message
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(self.failure());
        }
        match self.data {
            Some(data) => Ok(data),
            None => Err(ApiError::Api {
                status: 200,
                body: ErrorBody::new(
                    self.message
                        .unwrap_or_else(|| "Response contained no data".to_string()),
                ),
            }),
        }
    }

    /// Check the success flag only, for endpoints that return no data
    pub fn into_ack(self) -> Result<Option<String>, ApiError> {
        if self.success {
            Ok(self.message)
        } else {
            Err(self.failure())
        }
    }

    /// Several lifecycle endpoints answer `{success: true}` with no payload
    pub fn into_optional_data(self) -> Result<Option<T>, ApiError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(self.failure())
        }
    }

    fn failure(self) -> ApiError {
        ApiError::Api {
            status: 200,
            body: ErrorBody::new(self.message.unwrap_or_else(|| "Request failed".to_string())),
        }
    }
}
