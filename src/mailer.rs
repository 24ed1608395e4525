//! Mailer trait and delivery result types.
//!
//! The relay talks to its transport only through [`Mailer`], held as
//! `Arc<dyn Mailer>`. `#[async_trait]` is used instead of native async trait
//! methods because those are not object safe.
//!
//! A mailer exposes the two network steps of a relay call separately so the
//! caller can tell a failed handshake from a failed dispatch:
//!
//! 1. [`Mailer::verify`] opens a session and checks the server accepts it.
//! 2. [`Mailer::deliver`] transmits one message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::email::Email;
use crate::error::RelayError;

/// Result of a successful email delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
    /// Message ID assigned by the server (or generated when it gives none)
    pub message_id: String,
}

impl DeliveryResult {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
        }
    }
}

/// A transport able to verify a session and deliver a message.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Check that the server is reachable and accepts a session.
    ///
    /// Implementations must give up after their configured connect/greeting
    /// timeouts and report that as [`RelayError::Verification`].
    async fn verify(&self) -> Result<(), RelayError>;

    /// Send a single email.
    ///
    /// Failures, including socket timeouts, are [`RelayError::Send`].
    async fn deliver(&self, email: &Email) -> Result<DeliveryResult, RelayError>;

    /// Get the provider name (for logging/debugging).
    fn provider_name(&self) -> &'static str {
        "unknown"
    }
}
