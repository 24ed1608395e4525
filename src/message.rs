//! Rendering a contact submission into an outbound email.
//!
//! The HTML body comes from `templates/contact_email.html`. Askama escapes
//! every interpolated value, so submitted text shows up literally in the
//! mail client and cannot inject markup.

use askama::Template;

use crate::address::Address;
use crate::email::Email;
use crate::error::RelayError;
use crate::submission::ContactSubmission;

/// Trait for email templates.
///
/// Implement this on an Askama template to turn it into an [`Email`].
pub trait EmailTemplate: Template {
    /// The email subject line.
    fn subject(&self) -> String;

    /// The primary recipient.
    fn to(&self) -> Address;

    /// Sender address.
    fn from(&self) -> Address;

    /// Optional reply-to address.
    fn reply_to(&self) -> Option<Address> {
        None
    }

    /// Convert this template into an `Email`, rendered as the HTML body.
    fn into_email(self) -> Result<Email, RelayError>
    where
        Self: Sized,
    {
        let html = self.render()?;

        let mut email = Email::new()
            .from(self.from())
            .to(self.to())
            .subject(self.subject())
            .html_body(html);

        if let Some(reply_to) = self.reply_to() {
            email = email.reply_to(reply_to);
        }

        Ok(email)
    }
}

/// The notification sent to the site owner for one submission.
#[derive(Template)]
#[template(path = "contact_email.html")]
pub struct ContactEmail<'a> {
    pub submission: &'a ContactSubmission,
    pub sender: &'a Address,
    pub recipient: &'a Address,
}

impl<'a> ContactEmail<'a> {
    pub fn new(
        submission: &'a ContactSubmission,
        sender: &'a Address,
        recipient: &'a Address,
    ) -> Self {
        Self {
            submission,
            sender,
            recipient,
        }
    }
}

impl EmailTemplate for ContactEmail<'_> {
    fn subject(&self) -> String {
        subject_line(self.submission)
    }

    fn to(&self) -> Address {
        self.recipient.clone()
    }

    fn from(&self) -> Address {
        self.sender.clone()
    }

    /// Replies go to the person who filled in the form, not to the relay.
    fn reply_to(&self) -> Option<Address> {
        Some(Address::new(self.submission.email.clone()))
    }
}

/// `📩 {subject} — from {name}`
pub fn subject_line(submission: &ContactSubmission) -> String {
    format!("📩 {} — from {}", submission.subject, submission.name)
}
