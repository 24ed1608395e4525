//! Contact-form submission and its validation.
//!
//! Validation runs before any network resource is touched. Fields are passed
//! through exactly as submitted; escaping is the renderer's job (see
//! [`crate::message`]).

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::RelayError;

/// One validated contact-form entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
    })
}

/// Check whether `email` has the `local@domain.tld` shape.
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

fn required(raw: &Value, key: &'static str) -> Result<String, RelayError> {
    raw.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_owned)
        .ok_or(RelayError::MissingField(key))
}

/// Validate a decoded request body.
///
/// Absent, non-string, empty and whitespace-only fields all count as
/// missing. A body that is not a JSON object is missing every field.
///
/// ```
/// use contact_relay::validate;
/// use serde_json::json;
///
/// let submission = validate(&json!({
///     "name": "Jane Doe",
///     "email": "jane@example.com",
///     "subject": "Hello",
///     "message": "Hi there",
/// }))
/// .unwrap();
/// assert_eq!(submission.email, "jane@example.com");
///
/// assert!(validate(&json!({"name": "Jane"})).is_err());
/// ```
pub fn validate(raw: &Value) -> Result<ContactSubmission, RelayError> {
    let name = required(raw, "name")?;
    let email = required(raw, "email")?;
    let subject = required(raw, "subject")?;
    let message = required(raw, "message")?;

    if !is_valid_email(&email) {
        return Err(RelayError::InvalidEmail(email));
    }

    Ok(ContactSubmission {
        name,
        email,
        subject,
        message,
    })
}
