//! Assertion helpers for tests that relay through a [`LocalMailer`].
//!
//! ```rust,ignore
//! use contact_relay::providers::LocalMailer;
//! use contact_relay::testing::*;
//!
//! #[tokio::test]
//! async fn test_contact_flow() {
//!     let mailer = LocalMailer::new();
//!
//!     // ... submit the form ...
//!
//!     assert_email_sent(&mailer);
//!     assert_email_reply_to(&mailer, "jane@example.com");
//!     assert_email_html_matches(&mailer, r"<strong>Name:</strong> Jane");
//! }
//! ```

use regex::Regex;

use crate::providers::LocalMailer;
use crate::storage::StoredEmail;

/// Format a list of emails for error messages.
fn format_email_summary(emails: &[StoredEmail]) -> String {
    if emails.is_empty() {
        return "  (no emails sent)".to_string();
    }

    emails
        .iter()
        .enumerate()
        .map(|(i, stored)| {
            let e = &stored.email;
            let to = e
                .to
                .iter()
                .map(|a| a.email.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let reply_to = e
                .reply_to
                .first()
                .map(|a| a.email.as_str())
                .unwrap_or("<none>");
            format!(
                "  {}. To: [{}], Reply-To: {}, Subject: \"{}\"",
                i + 1,
                to,
                reply_to,
                e.subject
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn last_or_panic(mailer: &LocalMailer) -> StoredEmail {
    match mailer.last_email() {
        Some(email) => email,
        None => panic!("Expected at least one email to be sent, but none were sent"),
    }
}

/// Assert that at least one email was sent.
pub fn assert_email_sent(mailer: &LocalMailer) {
    assert!(
        mailer.has_emails(),
        "Expected at least one email to be sent, but none were sent"
    );
}

/// Assert that no emails were sent.
pub fn assert_no_emails_sent(mailer: &LocalMailer) {
    let emails = mailer.emails();
    assert!(
        emails.is_empty(),
        "Expected no emails to be sent, but {} were sent.\n\nEmails sent:\n{}",
        emails.len(),
        format_email_summary(&emails)
    );
}

/// Assert that exactly N emails were sent.
pub fn assert_email_count(mailer: &LocalMailer, expected: usize) {
    let actual = mailer.email_count();
    assert!(
        actual == expected,
        "Expected {} email(s) to be sent, but {} were sent.\n\nEmails sent:\n{}",
        expected,
        actual,
        format_email_summary(&mailer.emails())
    );
}

/// Assert that the transport was never contacted (no verify, no deliver).
pub fn assert_no_connection_attempts(mailer: &LocalMailer) {
    assert!(
        mailer.connection_attempts() == 0,
        "Expected no connection attempts, but saw {} verify and {} deliver call(s)",
        mailer.verify_count(),
        mailer.deliver_count()
    );
}

/// Assert the number of verification attempts.
pub fn assert_verify_count(mailer: &LocalMailer, expected: usize) {
    let actual = mailer.verify_count();
    assert!(
        actual == expected,
        "Expected {} verification attempt(s), but saw {}",
        expected,
        actual
    );
}

/// Assert the number of delivery attempts, failed ones included.
pub fn assert_deliver_count(mailer: &LocalMailer, expected: usize) {
    let actual = mailer.deliver_count();
    assert!(
        actual == expected,
        "Expected {} delivery attempt(s), but saw {}",
        expected,
        actual
    );
}

/// Assert that an email was sent to a specific address.
pub fn assert_email_to(mailer: &LocalMailer, email: &str) {
    let emails = mailer.emails();
    let found = emails
        .iter()
        .any(|stored| stored.email.to.iter().any(|a| a.email.eq_ignore_ascii_case(email)));

    assert!(
        found,
        "Expected an email to be sent to '{}'.\n\nEmails sent:\n{}",
        email,
        format_email_summary(&emails)
    );
}

/// Assert the last email replies to a specific address.
pub fn assert_email_reply_to(mailer: &LocalMailer, email: &str) {
    let last = last_or_panic(mailer);
    let actual = last.email.reply_to.first().map(|a| a.email.as_str());

    assert!(
        actual.is_some_and(|a| a.eq_ignore_ascii_case(email)),
        "Expected last email to reply to '{}', but Reply-To was {:?}.\n\nEmails sent:\n{}",
        email,
        actual,
        format_email_summary(&mailer.emails())
    );
}

/// Assert the last email was sent from a specific address.
pub fn assert_email_from(mailer: &LocalMailer, from_email: &str) {
    let last = last_or_panic(mailer);
    let actual = last
        .email
        .from
        .as_ref()
        .map(|a| a.email.as_str())
        .unwrap_or("<none>");

    assert!(
        actual.eq_ignore_ascii_case(from_email),
        "Expected last email from '{}', but was from '{}'.\n\nEmails sent:\n{}",
        from_email,
        actual,
        format_email_summary(&mailer.emails())
    );
}

/// Assert the last email has the exact subject.
pub fn assert_email_subject(mailer: &LocalMailer, subject: &str) {
    let last = last_or_panic(mailer);
    assert!(
        last.email.subject == subject,
        "Expected last email subject '{}', but was '{}'",
        subject,
        last.email.subject
    );
}

/// Assert the last email has HTML body containing text.
pub fn assert_email_html_contains(mailer: &LocalMailer, text: &str) {
    let last = last_or_panic(mailer);
    let html = last.email.html_body.as_deref().unwrap_or("");

    assert!(
        html.contains(text),
        "Expected HTML body to contain '{}', but it didn't.\n\nHTML body (first 500 chars):\n{}",
        text,
        html.chars().take(500).collect::<String>()
    );
}

/// Assert the last email has HTML body matching a regex pattern.
///
/// # Panics
///
/// Panics on an invalid pattern, or if the body does not match.
pub fn assert_email_html_matches(mailer: &LocalMailer, pattern: &str) {
    let re = match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => panic!("Invalid regex pattern '{}': {}", pattern, e),
    };
    let last = last_or_panic(mailer);
    let html = last.email.html_body.as_deref().unwrap_or("");

    assert!(
        re.is_match(html),
        "Expected HTML body to match /{}/, but it didn't.\n\nHTML body (first 500 chars):\n{}",
        pattern,
        html.chars().take(500).collect::<String>()
    );
}
