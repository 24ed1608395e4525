//! Framework-agnostic `/api/send-email` handler.
//!
//! Hosting adapters (the axum router in [`crate::server`], a serverless
//! runtime, ...) convert their request into an [`ApiRequest`], call
//! [`handle`], and write the [`ApiResponse`] back out.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::RelayError;
use crate::relay::MailRelay;
use crate::submission::validate;

/// CORS headers attached to every response, preflight included.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

/// Inbound request, reduced to what the handler reads.
#[derive(Debug, Clone, Default)]
pub struct ApiRequest {
    pub method: String,
    /// Header names are matched case-insensitively.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl ApiRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Shortcut for a JSON POST.
    pub fn json(body: &Value) -> Self {
        Self::new("POST")
            .header("Content-Type", "application/json")
            .body(body.to_string())
    }

    fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decode the body the way a JSON body parser would.
    ///
    /// Non-JSON content types, empty bodies and malformed JSON all decode to
    /// an empty object, which then fails validation as missing fields.
    fn json_body(&self) -> Value {
        let declared_json = self
            .header_value("Content-Type")
            .map_or(true, |ct| ct.to_ascii_lowercase().contains("json"));
        if !declared_json || self.body.is_empty() {
            return Value::Object(Default::default());
        }
        match serde_json::from_slice(&self.body) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "Request body is not valid JSON");
                Value::Object(Default::default())
            }
        }
    }
}

/// JSON body of every non-preflight response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiBody {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiBody {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            details: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            details: None,
        }
    }
}

impl From<&RelayError> for ApiBody {
    fn from(err: &RelayError) -> Self {
        Self {
            details: err.details().map(str::to_owned),
            ..Self::error(err.public_message())
        }
    }
}

/// Outbound response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: Vec<(&'static str, &'static str)>,
    /// `None` for an empty body.
    pub body: Option<ApiBody>,
}

impl ApiResponse {
    fn new(status_code: u16, body: Option<ApiBody>) -> Self {
        Self {
            status_code,
            headers: CORS_HEADERS.to_vec(),
            body,
        }
    }

    /// Body serialized as JSON, if any.
    pub fn body_json(&self) -> Option<String> {
        self.body
            .as_ref()
            .and_then(|body| serde_json::to_string(body).ok())
    }
}

impl From<RelayError> for ApiResponse {
    fn from(err: RelayError) -> Self {
        Self::new(err.status_code(), Some(ApiBody::from(&err)))
    }
}

/// Handle one request to the send-email endpoint.
pub async fn handle(relay: &MailRelay, request: ApiRequest) -> ApiResponse {
    match request.method.to_ascii_uppercase().as_str() {
        "OPTIONS" => ApiResponse::new(200, None),
        "POST" => match relay_submission(relay, &request).await {
            Ok(()) => ApiResponse::new(200, Some(ApiBody::ok("Email sent successfully"))),
            Err(e) => {
                if e.is_client_error() {
                    tracing::debug!(error = %e, "Rejected contact submission");
                }
                ApiResponse::from(e)
            }
        },
        _ => ApiResponse::new(405, Some(ApiBody::error("Method not allowed"))),
    }
}

async fn relay_submission(relay: &MailRelay, request: &ApiRequest) -> Result<(), RelayError> {
    let submission = validate(&request.json_body())?;
    relay.send(&submission).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RelayConfig, TransportConfig};
    use crate::providers::LocalMailer;
    use serde_json::json;

    fn relay(mailer: &LocalMailer) -> MailRelay {
        let config = RelayConfig::new(TransportConfig::new("smtp.example.com", 587));
        MailRelay::with_mailer(config, mailer.clone())
    }

    fn jane() -> Value {
        json!({
            "name": "Jane Doe",
            "email": "jane@example.com",
            "subject": "Hello",
            "message": "Hi there",
        })
    }

    #[tokio::test]
    async fn test_options_is_empty_200_with_cors() {
        let mailer = LocalMailer::new();
        let response = handle(&relay(&mailer), ApiRequest::new("OPTIONS")).await;
        assert_eq!(response.status_code, 200);
        assert!(response.body.is_none());
        assert_eq!(response.headers, CORS_HEADERS.to_vec());
        assert_eq!(mailer.connection_attempts(), 0);
    }

    #[tokio::test]
    async fn test_other_methods_are_405() {
        let mailer = LocalMailer::new();
        let response = handle(&relay(&mailer), ApiRequest::new("GET")).await;
        assert_eq!(response.status_code, 405);
        assert_eq!(response.body.unwrap().error.as_deref(), Some("Method not allowed"));
    }

    #[tokio::test]
    async fn test_success_body() {
        let mailer = LocalMailer::new();
        let response = handle(&relay(&mailer), ApiRequest::json(&jane())).await;
        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.body_json().unwrap(),
            r#"{"success":true,"message":"Email sent successfully"}"#
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_missing_fields() {
        let mailer = LocalMailer::new();
        let request = ApiRequest::new("POST")
            .header("content-type", "application/json")
            .body("{not json");
        let response = handle(&relay(&mailer), request).await;
        assert_eq!(response.status_code, 400);
        assert_eq!(
            response.body.unwrap().error.as_deref(),
            Some("Missing required fields")
        );
    }

    #[tokio::test]
    async fn test_non_json_content_type_is_not_decoded() {
        let mailer = LocalMailer::new();
        let request = ApiRequest::new("POST")
            .header("Content-Type", "text/plain")
            .body(jane().to_string());
        let response = handle(&relay(&mailer), request).await;
        assert_eq!(response.status_code, 400);
        assert_eq!(mailer.connection_attempts(), 0);
    }

    #[tokio::test]
    async fn test_verification_failure_includes_details() {
        let mailer = LocalMailer::new();
        mailer.set_verify_failure("connect ECONNREFUSED 127.0.0.1:587");
        let response = handle(&relay(&mailer), ApiRequest::json(&jane())).await;

        assert_eq!(response.status_code, 502);
        let body = response.body.unwrap();
        assert!(!body.success);
        assert_eq!(
            body.error.as_deref(),
            Some("Unable to connect to SMTP server. Please check SMTP configuration.")
        );
        assert_eq!(body.details.as_deref(), Some("connect ECONNREFUSED 127.0.0.1:587"));
    }

    #[tokio::test]
    async fn test_error_body_omits_absent_fields() {
        let body = ApiBody::from(&RelayError::InvalidEmail("foo".into()));
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"success":false,"error":"Invalid email format"}"#
        );
    }
}
