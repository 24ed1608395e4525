//! Mailbox address with optional display name.

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RelayError;

/// An email address with an optional display name.
///
/// ```
/// use contact_relay::Address;
///
/// let addr = Address::parse_mailbox("Website Contact <noreply@example.com>").unwrap();
/// assert_eq!(addr.name.as_deref(), Some("Website Contact"));
/// assert_eq!(addr.email, "noreply@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Optional display name (e.g., "Website Contact")
    pub name: Option<String>,
    /// Email address (e.g., "noreply@example.com")
    pub email: String,
}

impl Address {
    /// Create an address without checking it.
    ///
    /// Used for submitter addresses, which the validator has already
    /// checked against the contact-form shape.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    /// Create an address with a display name, without checking it.
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name: if name.is_empty() { None } else { Some(name) },
            email: email.into(),
        }
    }

    /// Parse and validate a bare email address (RFC 5321/5322).
    pub fn parse(email: &str) -> Result<Self, RelayError> {
        if !EmailAddress::is_valid(email) {
            return Err(RelayError::InvalidAddress(format!(
                "'{}' is not a valid email address",
                email
            )));
        }
        Ok(Self::new(email))
    }

    /// Parse either `addr` or `Display Name <addr>`.
    ///
    /// This is the format accepted by `SENDER_EMAIL` and `RECIPIENT_EMAIL`.
    pub fn parse_mailbox(input: &str) -> Result<Self, RelayError> {
        let input = input.trim();

        let Some(open) = input.rfind('<') else {
            return Self::parse(input);
        };
        let Some(email) = input[open + 1..].strip_suffix('>') else {
            return Err(RelayError::InvalidAddress(format!(
                "'{}' has an unterminated '<'",
                input
            )));
        };

        let name = input[..open].trim().trim_matches('"').trim();
        let mut addr = Self::parse(email.trim())?;
        if !name.is_empty() {
            addr.name = Some(name.to_string());
        }
        Ok(addr)
    }

    /// Convert the domain part to ASCII (Punycode) for SMTP.
    ///
    /// The local part is preserved as-is.
    pub fn to_ascii(&self) -> Result<String, RelayError> {
        let Some((local, domain)) = self.email.split_once('@') else {
            return Err(RelayError::InvalidAddress(format!(
                "'{}' is missing @ symbol",
                self.email
            )));
        };

        let ascii_domain = idna::domain_to_ascii(domain).map_err(|e| {
            RelayError::InvalidAddress(format!(
                "Failed to convert domain '{}' to ASCII: {:?}",
                domain, e
            ))
        })?;

        Ok(format!("{}@{}", local, ascii_domain))
    }

    /// Format as "Name <email>" or just "email" if no name.
    pub fn formatted(&self) -> String {
        match &self.name {
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted())
    }
}

impl From<&str> for Address {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

impl From<String> for Address {
    fn from(email: String) -> Self {
        Self::new(email)
    }
}
