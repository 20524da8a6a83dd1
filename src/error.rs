//! Error types for the DevCycle provider.

use thiserror::Error;

use crate::schema::Diagnostic;

/// Summary used for every failure reported by the management API.
pub const CLIENT_ERROR: &str = "Client Error";

/// Errors that can occur while handling a lifecycle operation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The management API call failed at transport level or returned a non-200 status.
    #[error("Client error: {0}")]
    Client(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource or data source type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProviderError {
    /// Get the error message as a string.
    ///
    /// Returns a reference to the error message for any variant.
    pub fn message(&self) -> &str {
        match self {
            Self::Client(msg) => msg,
            Self::Validation(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
        }
    }

    /// Short category label surfaced as the diagnostic summary.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Client(_) => CLIENT_ERROR,
            Self::Validation(_) => "Validation Error",
            Self::Configuration(_) => "Provider Configuration Error",
            Self::UnknownResource(_) => "Unknown Resource Type",
            Self::Serialization(_) => "Serialization Error",
        }
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        let detail = match &err {
            ProviderError::Serialization(inner) => inner.to_string(),
            other => other.message().to_string(),
        };
        Diagnostic::error(err.summary()).with_detail(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DiagnosticSeverity;

    #[test]
    fn test_error_display() {
        let err = ProviderError::Client("boom".to_string());
        assert_eq!(format!("{}", err), "Client error: boom");

        let err = ProviderError::Validation("invalid input".to_string());
        assert_eq!(format!("{}", err), "Validation error: invalid input");

        let err = ProviderError::UnknownResource("devcycle_project".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: devcycle_project");
    }

    #[test]
    fn test_client_error_to_diagnostic() {
        let err = ProviderError::Client(
            "Unable to read environment, got error: 404 Not Found".to_string(),
        );
        let diag: Diagnostic = err.into();
        assert_eq!(diag.severity, DiagnosticSeverity::Error);
        assert_eq!(diag.summary, "Client Error");
        assert_eq!(
            diag.detail.as_deref(),
            Some("Unable to read environment, got error: 404 Not Found")
        );
    }

    #[test]
    fn test_serialization_error_keeps_inner_text() {
        let inner = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let text = inner.to_string();
        let diag: Diagnostic = ProviderError::from(inner).into();
        assert_eq!(diag.summary, "Serialization Error");
        assert_eq!(diag.detail, Some(text));
    }

    #[test]
    fn test_message_method() {
        let err = ProviderError::Configuration("missing client_id".to_string());
        assert_eq!(err.message(), "missing client_id");

        let err = ProviderError::UnknownResource("devcycle_project".to_string());
        assert_eq!(err.message(), "devcycle_project");
    }
}
