//! The mail relay: verify the transport, then send one notification per
//! submission.
//!
//! Every call walks the same path and stops at the first failure:
//!
//! ```text
//! UNVERIFIED --verify ok--> VERIFIED --send ok--> SENT
//!      |                        |
//!      +--verify fails--> FAILED_VERIFY
//!                               +--send fails--> FAILED_SEND
//! ```
//!
//! There is no retry and no deduplication: sending the same submission twice
//! delivers two emails.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Once};
use tracing::Instrument;

#[cfg(feature = "metrics")]
use std::time::Instant;

use crate::address::Address;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::mailer::Mailer;
use crate::message::{ContactEmail, EmailTemplate};
use crate::submission::ContactSubmission;

static DEFAULT_SENDER_WARNING: Once = Once::new();

/// Outcome of a successful relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResult {
    pub success: bool,
    pub message_id: String,
}

/// Relays validated contact submissions through a [`Mailer`].
///
/// Holds only immutable configuration and a shared transport handle, so one
/// instance can serve concurrent requests behind an `Arc`.
pub struct MailRelay {
    config: RelayConfig,
    mailer: Option<Arc<dyn Mailer>>,
    sender: Address,
    recipient: Address,
}

impl MailRelay {
    /// Create a relay that speaks SMTP to the configured endpoint.
    ///
    /// An unconfigured transport is not an error here; the relay is built
    /// and refuses every send with [`RelayError::NotConfigured`].
    #[cfg(feature = "smtp")]
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        let mailer: Option<Arc<dyn Mailer>> = if config.transport.is_configured() {
            Some(Arc::new(crate::providers::SmtpMailer::from_config(
                &config.transport,
            )?))
        } else {
            tracing::error!("SMTP is not configured (SMTP_HOST/SMTP_PORT missing)");
            None
        };
        Ok(Self::build(config, mailer))
    }

    /// Create a relay over a specific mailer.
    ///
    /// The configuration check still applies: with no host/port the mailer
    /// is never called.
    pub fn with_mailer<M: Mailer + 'static>(config: RelayConfig, mailer: M) -> Self {
        Self::build(config, Some(Arc::new(mailer)))
    }

    fn build(config: RelayConfig, mailer: Option<Arc<dyn Mailer>>) -> Self {
        if config.sender.is_none() {
            DEFAULT_SENDER_WARNING.call_once(|| {
                tracing::warn!(
                    sender = %config.sender_or_default(),
                    "SENDER_EMAIL not set. Using default verified domain sender. Set SENDER_EMAIL to customize."
                );
            });
        }

        Self {
            sender: config.sender_or_default(),
            recipient: config.recipient_or_default(),
            config,
            mailer,
        }
    }

    /// Host and port are configured.
    pub fn is_configured(&self) -> bool {
        self.config.transport.is_configured()
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }

    pub fn recipient(&self) -> &Address {
        &self.recipient
    }

    /// Verify the transport, then deliver one notification for `submission`.
    pub async fn send(&self, submission: &ContactSubmission) -> Result<SendResult, RelayError> {
        if let Err(e) = self.config.transport.endpoint() {
            tracing::error!(error = %e, "Refusing to send: SMTP is not configured");
            return Err(e);
        }
        let mailer = self.mailer.as_ref().ok_or_else(|| {
            RelayError::NotConfigured("no transport attached to relay".into())
        })?;

        let span = tracing::info_span!(
            "relay.send",
            provider = mailer.provider_name(),
            reply_to = %submission.email,
        );

        self.send_with(mailer.as_ref(), submission)
            .instrument(span)
            .await
    }

    async fn send_with(
        &self,
        mailer: &dyn Mailer,
        submission: &ContactSubmission,
    ) -> Result<SendResult, RelayError> {
        let provider = mailer.provider_name();

        if let Err(e) = mailer.verify().await {
            tracing::error!(error = %e, "SMTP verification failed");
            record(provider, "verify_failed");
            return Err(e);
        }
        tracing::info!("SMTP transport verified");

        let email = ContactEmail::new(submission, &self.sender, &self.recipient).into_email()?;

        #[cfg(feature = "metrics")]
        let start = Instant::now();

        let result = mailer.deliver(&email).await;

        #[cfg(feature = "metrics")]
        metrics::histogram!("contact_relay_delivery_duration_seconds", "provider" => provider)
            .record(start.elapsed().as_secs_f64());

        match result {
            Ok(delivery) => {
                tracing::info!(message_id = %delivery.message_id, "Email sent successfully");
                record(provider, "success");
                Ok(SendResult {
                    success: true,
                    message_id: delivery.message_id,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "SMTP send failed");
                record(provider, "send_failed");
                Err(e)
            }
        }
    }
}

#[cfg(feature = "metrics")]
fn record(provider: &'static str, status: &'static str) {
    metrics::counter!("contact_relay_emails_total", "provider" => provider, "status" => status)
        .increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record(_provider: &'static str, _status: &'static str) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportConfig;
    use crate::providers::LocalMailer;

    fn submission() -> ContactSubmission {
        ContactSubmission {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            subject: "Hello".into(),
            message: "Hi there".into(),
        }
    }

    fn configured() -> RelayConfig {
        RelayConfig::new(TransportConfig::new("smtp.example.com", 587))
    }

    #[tokio::test]
    async fn test_send_verifies_then_delivers() {
        let mailer = LocalMailer::new();
        let relay = MailRelay::with_mailer(configured(), mailer.clone());

        let result = relay.send(&submission()).await.unwrap();
        assert!(result.success);
        assert_eq!(mailer.verify_count(), 1);
        assert_eq!(mailer.deliver_count(), 1);

        let stored = mailer.last_email().unwrap();
        assert_eq!(stored.id, result.message_id);
        assert_eq!(stored.email.reply_to[0].email, "jane@example.com");
    }

    #[tokio::test]
    async fn test_defaults_for_sender_and_recipient() {
        let relay = MailRelay::with_mailer(configured(), LocalMailer::new());
        assert_eq!(relay.sender().email, crate::config::DEFAULT_SENDER_EMAIL);
        assert_eq!(relay.recipient().email, crate::config::DEFAULT_RECIPIENT);
    }

    #[tokio::test]
    async fn test_configured_addresses_are_used() {
        let mailer = LocalMailer::new();
        let config = configured()
            .sender(Address::with_name("Site", "site@example.org"))
            .recipient(Address::new("owner@example.org"));
        let relay = MailRelay::with_mailer(config, mailer.clone());

        relay.send(&submission()).await.unwrap();

        let email = mailer.last_email().unwrap().email;
        assert_eq!(email.from.unwrap().email, "site@example.org");
        assert_eq!(email.to[0].email, "owner@example.org");
    }

    #[tokio::test]
    async fn test_unconfigured_never_touches_transport() {
        let mailer = LocalMailer::new();
        let relay = MailRelay::with_mailer(RelayConfig::default(), mailer.clone());

        assert!(!relay.is_configured());
        let err = relay.send(&submission()).await.unwrap_err();
        assert!(matches!(err, RelayError::NotConfigured(_)));
        assert_eq!(mailer.connection_attempts(), 0);
    }

    #[cfg(feature = "smtp")]
    #[tokio::test]
    async fn test_new_without_endpoint_refuses() {
        let relay = MailRelay::new(RelayConfig::default()).unwrap();
        let err = relay.send(&submission()).await.unwrap_err();
        assert!(matches!(err, RelayError::NotConfigured(_)));
        assert_eq!(err.status_code(), 500);
    }
}
