//! Error types for contact-relay.

use thiserror::Error;

/// Errors that can occur while relaying a contact submission.
///
/// Every variant maps to exactly one HTTP status and one public message, see
/// [`RelayError::status_code`] and [`RelayError::public_message`].
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    /// Required submission field is absent, empty, or whitespace-only.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Submitter email does not look like `local@domain.tld`.
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    /// SMTP host or port is not configured.
    #[error("Email service not configured: {0}")]
    NotConfigured(String),

    /// Connection verification (connect, greeting, auth) failed.
    #[error("SMTP verification failed: {0}")]
    Verification(String),

    /// Message dispatch failed after a successful verification.
    #[error("Send error: {0}")]
    Send(String),

    /// Configured sender/recipient address is not usable.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Error building the outbound message.
    #[error("Build error: {0}")]
    Build(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(String),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// HTTP status this error is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingField(_) | Self::InvalidEmail(_) => 400,
            Self::Verification(_) | Self::Send(_) => 502,
            Self::NotConfigured(_)
            | Self::InvalidAddress(_)
            | Self::Build(_)
            | Self::Template(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Message that is safe to show to the person who submitted the form.
    ///
    /// Configuration details never leave the server; they are logged instead.
    pub fn public_message(&self) -> String {
        match self {
            Self::MissingField(_) => "Missing required fields".to_string(),
            Self::InvalidEmail(_) => "Invalid email format".to_string(),
            Self::NotConfigured(_) => {
                "Email service is not configured. Please contact the administrator.".to_string()
            }
            Self::Verification(_) => {
                "Unable to connect to SMTP server. Please check SMTP configuration.".to_string()
            }
            Self::Send(_) => "Failed to send email via SMTP. Please try again later.".to_string(),
            other => other.to_string(),
        }
    }

    /// Underlying transport message, exposed as `details` for diagnostics.
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Verification(msg) | Self::Send(msg) if !msg.is_empty() => Some(msg),
            _ => None,
        }
    }

    /// Whether the submitter caused this error (as opposed to config or transport).
    pub fn is_client_error(&self) -> bool {
        self.status_code() == 400
    }
}

#[cfg(feature = "smtp")]
impl From<lettre::error::Error> for RelayError {
    fn from(err: lettre::error::Error) -> Self {
        Self::Build(err.to_string())
    }
}

#[cfg(feature = "smtp")]
impl From<lettre::transport::smtp::Error> for RelayError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Self::Send(err.to_string())
    }
}

#[cfg(feature = "smtp")]
impl From<lettre::address::AddressError> for RelayError {
    fn from(err: lettre::address::AddressError) -> Self {
        Self::InvalidAddress(err.to_string())
    }
}

impl From<askama::Error> for RelayError {
    fn from(err: askama::Error) -> Self {
        Self::Template(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_400() {
        assert_eq!(RelayError::MissingField("name").status_code(), 400);
        assert_eq!(RelayError::InvalidEmail("foo".into()).status_code(), 400);
        assert!(RelayError::MissingField("email").is_client_error());
    }

    #[test]
    fn transport_errors_map_to_502_with_details() {
        let verify = RelayError::Verification("connection refused".into());
        assert_eq!(verify.status_code(), 502);
        assert_eq!(verify.details(), Some("connection refused"));

        let send = RelayError::Send("550 mailbox unavailable".into());
        assert_eq!(send.status_code(), 502);
        assert_eq!(send.details(), Some("550 mailbox unavailable"));
        assert_ne!(verify.public_message(), send.public_message());
    }

    #[test]
    fn not_configured_hides_detail() {
        let err = RelayError::NotConfigured("SMTP_HOST not set".into());
        assert_eq!(err.status_code(), 500);
        assert!(!err.public_message().contains("SMTP_HOST"));
        assert_eq!(err.details(), None);
    }

    #[test]
    fn unexpected_errors_use_their_message() {
        let err = RelayError::Internal("boom".into());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.public_message(), "Internal error: boom");
    }
}
