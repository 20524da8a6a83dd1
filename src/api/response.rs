//! Transport results and the translation of failed calls into provider errors.

use thiserror::Error;

use crate::error::ProviderError;

/// Status code the management API returns for every successful call.
pub const STATUS_OK: u16 = 200;

/// Errors raised before a response status is available.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A successful response carried a body that does not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured API URL cannot be used as a base for endpoint paths.
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
}

/// The outcome of a call that reached the API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    /// HTTP status code.
    pub status: u16,
    /// Decoded body, present only for successful calls.
    pub body: Option<T>,
    /// Raw response body of a failed call.
    pub message: String,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `body`.
    pub fn ok(body: T) -> Self {
        Self {
            status: STATUS_OK,
            body: Some(body),
            message: String::new(),
        }
    }

    /// A response with a non-success status and the endpoint's error text.
    pub fn failed(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: None,
            message: message.into(),
        }
    }

    /// Whether the status is the one success status the provider accepts.
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Error text surfaced to the operator for a failed call.
    pub fn error_text(&self) -> String {
        if self.message.is_empty() {
            format!("HTTP status {}", self.status)
        } else {
            format!("HTTP status {}: {}", self.status, self.message)
        }
    }
}

/// Result of one management API call.
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Collapse a management API result into the decoded body or a client error.
///
/// A transport error and any status other than 200 are treated the same way:
/// the call fails with `Unable to <action> <kind>, got error: <text>`.
/// There is no classification beyond that and nothing is retried.
pub fn check_response<T>(result: ApiResult<T>, action: &str, kind: &str) -> Result<T, ProviderError> {
    let failure =
        |text: String| ProviderError::Client(format!("Unable to {} {}, got error: {}", action, kind, text));

    match result {
        Err(err) => Err(failure(err.to_string())),
        Ok(response) if !response.is_ok() => Err(failure(response.error_text())),
        Ok(response) => response
            .body
            .ok_or_else(|| failure("response body was empty".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_response_passes_body_through() {
        let result: ApiResult<&str> = Ok(ApiResponse::ok("environment"));
        assert_eq!(check_response(result, "read", "environment").unwrap(), "environment");
    }

    #[test]
    fn test_non_200_status_is_client_error() {
        let result: ApiResult<()> = Ok(ApiResponse::failed(
            404,
            r#"{"statusCode":404,"message":"Environment not found"}"#,
        ));
        let err = check_response(result, "read", "environment").unwrap_err();
        assert!(matches!(err, ProviderError::Client(_)));
        assert_eq!(
            err.message(),
            r#"Unable to read environment, got error: HTTP status 404: {"statusCode":404,"message":"Environment not found"}"#
        );
    }

    #[test]
    fn test_other_success_codes_are_not_accepted() {
        let mut response = ApiResponse::ok(());
        response.status = 201;
        let err = check_response(Ok(response), "create", "feature").unwrap_err();
        assert_eq!(err.message(), "Unable to create feature, got error: HTTP status 201");
    }

    #[test]
    fn test_transport_error_is_client_error() {
        let decode = serde_json::from_str::<u32>("nope").unwrap_err();
        let result: ApiResult<u32> = Err(ApiError::from(decode));
        let err = check_response(result, "update", "feature").unwrap_err();
        assert!(err
            .message()
            .starts_with("Unable to update feature, got error: failed to decode response"));
    }

    #[test]
    fn test_missing_body_on_200_is_client_error() {
        let result: ApiResult<String> = Ok(ApiResponse {
            status: 200,
            body: None,
            message: String::new(),
        });
        let err = check_response(result, "read", "feature").unwrap_err();
        assert!(err.message().ends_with("response body was empty"));
    }
}
