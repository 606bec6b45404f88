//! Result type aliases and the uniform API response shape

use serde::{Deserialize, Serialize};

use crate::error::CmError;

/// Standard Result type for Construct operations
pub type CmResult<T> = Result<T, CmError>;

/// Uniform result of one API call: exactly one of `data` / `error` is set.
///
/// Non-2xx responses land here as `error`; transport failures never do,
/// they surface as `Err(CmError)` from the client call itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub error: Option<String>,
    /// HTTP status of a rejected request, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: None,
        }
    }

    /// Create a failed response with an error message
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
            status: None,
        }
    }

    /// Failed response for a non-2xx HTTP status
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::failure(message)
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.data.is_some()
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Map the data value
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ApiResponse<U> {
        ApiResponse {
            data: self.data.map(f),
            error: self.error,
            status: self.status,
        }
    }

    /// Chain a dependent step on success
    pub fn and_then<U, F: FnOnce(T) -> ApiResponse<U>>(self, f: F) -> ApiResponse<U> {
        match (self.data, self.error) {
            (Some(data), None) => f(data),
            (_, error) => ApiResponse {
                data: None,
                error: Some(error.unwrap_or_else(|| "Empty response".to_string())),
                status: self.status,
            },
        }
    }

    /// Convert to a standard Result, keeping the HTTP status of a rejection
    pub fn into_result(self) -> CmResult<T> {
        match (self.data, self.error) {
            (Some(data), None) => Ok(data),
            (_, Some(message)) => Err(CmError::Api {
                status: self.status,
                message,
            }),
            (None, None) => Err(CmError::Internal(
                "ApiResponse has neither data nor error".into(),
            )),
        }
    }
}

impl<T> From<CmResult<T>> for ApiResponse<T> {
    fn from(result: CmResult<T>) -> Self {
        match result {
            Ok(value) => ApiResponse::success(value),
            Err(CmError::Api { status, message }) => ApiResponse {
                status,
                ..ApiResponse::failure(message)
            },
            Err(e) => ApiResponse::failure(e.user_message()),
        }
    }
}
