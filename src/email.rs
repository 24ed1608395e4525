//! Outbound email with builder pattern.

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// An outbound email message, independent of the transport that sends it.
///
/// ```
/// use contact_relay::{Address, Email};
///
/// let email = Email::new()
///     .from(Address::with_name("Website Contact", "noreply@example.com"))
///     .to("contact@example.com")
///     .reply_to("jane@example.com")
///     .subject("Hello")
///     .html_body("<p>Hi there</p>");
///
/// assert_eq!(email.reply_to[0].email, "jane@example.com");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    /// Sender address
    pub from: Option<Address>,
    /// Primary recipients
    pub to: Vec<Address>,
    /// Reply-to addresses
    pub reply_to: Vec<Address>,
    /// Email subject line
    pub subject: String,
    /// HTML body
    pub html_body: Option<String>,
}

impl Email {
    /// Create a new empty email.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sender address.
    pub fn from(mut self, addr: impl Into<Address>) -> Self {
        self.from = Some(addr.into());
        self
    }

    /// Add a recipient.
    pub fn to(mut self, addr: impl Into<Address>) -> Self {
        self.to.push(addr.into());
        self
    }

    /// Add a reply-to address.
    pub fn reply_to(mut self, addr: impl Into<Address>) -> Self {
        self.reply_to.push(addr.into());
        self
    }

    /// Set the subject line.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set the HTML body.
    pub fn html_body(mut self, body: impl Into<String>) -> Self {
        self.html_body = Some(body.into());
        self
    }
}
