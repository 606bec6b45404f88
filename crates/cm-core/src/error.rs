//! Core error types for Construct RS

use std::collections::HashMap;
use thiserror::Error;

/// Message shown when the server answers non-2xx with an empty body
pub const FALLBACK_ERROR_MESSAGE: &str = "An error occurred";

/// Core error type for all Construct operations
#[derive(Error, Debug, Clone)]
pub enum CmError {
    /// The request never produced an HTTP response (network unreachable, DNS, TLS)
    #[error("Transport error: {0}")]
    Transport(String),

    /// A 2xx response whose body could not be parsed as the declared type
    #[error("Decode error: {0}")]
    Decode(String),

    /// Non-2xx response from the backend; `status` is `None` when the
    /// rejection reached us without its HTTP status
    #[error("API error: {message}")]
    Api { status: Option<u16>, message: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Not authenticated: no session present")]
    Unauthenticated,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Validation errors collection
#[derive(Error, Debug, Default, Clone, PartialEq)]
#[error("Validation errors: {}", self.full_messages().join(", "))]
pub struct ValidationErrors {
    /// Field-specific errors: field_name -> Vec<error_messages>
    pub errors: HashMap<String, Vec<String>>,
    /// Base errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    /// Check if there are errors for a specific field
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Get errors for a specific field
    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
    }

    /// Messages sorted by field so output is stable
    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        let mut fields: Vec<_> = self.errors.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        for (field, field_messages) in fields {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }

    /// Convert into `Ok(())` when empty
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl CmError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        CmError::Api {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Transport-level failures are fatal for the request that triggered them
    pub fn is_transport(&self) -> bool {
        matches!(self, CmError::Transport(_) | CmError::Decode(_))
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            CmError::Api { status, .. } => *status,
            CmError::Validation(_) => Some(422),
            CmError::Unauthenticated => Some(401),
            _ => None,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            CmError::Transport(_) => "transport_error",
            CmError::Decode(_) => "decode_error",
            CmError::Api { .. } => "api_error",
            CmError::Validation(_) => "validation_failed",
            CmError::Unauthenticated => "unauthenticated",
            CmError::Config(_) => "configuration_error",
            CmError::Internal(_) => "internal_error",
        }
    }

    /// Message suitable for an error indicator in a view.
    ///
    /// Transport failures collapse to a generic message; application
    /// failures keep the server-provided text.
    pub fn user_message(&self) -> String {
        match self {
            CmError::Transport(_) | CmError::Decode(_) => {
                "Unable to reach the server. Please try again later.".to_string()
            }
            CmError::Api { message, .. } => message.clone(),
            CmError::Validation(errors) => errors.full_messages().join(", "),
            CmError::Unauthenticated => "Please sign in to continue.".to_string(),
            CmError::Config(msg) | CmError::Internal(msg) => msg.clone(),
        }
    }
}

impl From<serde_json::Error> for CmError {
    fn from(err: serde_json::Error) -> Self {
        CmError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_merge() {
        let mut a = ValidationErrors::new();
        a.add("name", "can't be blank");
        let mut b = ValidationErrors::new();
        b.add("name", "is too long");
        b.add_base("something went wrong");

        a.merge(b);
        assert_eq!(a.get("name").map(Vec::len), Some(2));
        assert_eq!(a.base_errors.len(), 1);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_full_messages_sorted() {
        let mut errors = ValidationErrors::new();
        errors.add("zeta", "is invalid");
        errors.add("alpha", "is invalid");
        assert_eq!(
            errors.full_messages(),
            vec!["alpha is invalid".to_string(), "zeta is invalid".to_string()]
        );
    }

    #[test]
    fn test_transport_classification() {
        assert!(CmError::Transport("refused".into()).is_transport());
        assert!(CmError::Decode("eof".into()).is_transport());
        assert!(!CmError::api(404, "Employee not found").is_transport());
    }

    #[test]
    fn test_user_message() {
        let err = CmError::api(404, "Employee not found");
        assert_eq!(err.user_message(), "Employee not found");
        assert_eq!(err.status_code(), Some(404));

        let err = CmError::Transport("connection refused".into());
        assert!(err.user_message().contains("Unable to reach"));
    }
}
