//! Local mailer for development and testing.
//!
//! Never opens a socket. Every `verify()` and `deliver()` call is counted so
//! tests can assert that a request was rejected before any connection was
//! attempted, and either step can be told to fail.
//!
//! ```rust,ignore
//! use contact_relay::providers::LocalMailer;
//! use contact_relay::testing::*;
//!
//! #[tokio::test]
//! async fn relays_submission() {
//!     let mailer = LocalMailer::new();
//!     let relay = MailRelay::with_mailer(config, mailer.clone());
//!
//!     relay.send(&submission).await.unwrap();
//!
//!     assert_email_sent(&mailer);
//!     assert_email_reply_to(&mailer, "jane@example.com");
//! }
//! ```

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::email::Email;
use crate::error::RelayError;
use crate::mailer::{DeliveryResult, Mailer};
use crate::storage::{MemoryStorage, StoredEmail};

#[derive(Debug, Default)]
struct Counters {
    verify: AtomicUsize,
    deliver: AtomicUsize,
}

/// Local mailer that stores emails in memory.
///
/// Clones share storage, counters and failure settings.
#[derive(Debug, Clone)]
pub struct LocalMailer {
    storage: Arc<MemoryStorage>,
    counters: Arc<Counters>,
    fail_verify: Arc<RwLock<Option<String>>>,
    fail_deliver: Arc<RwLock<Option<String>>>,
}

impl LocalMailer {
    /// Create a new local mailer with fresh storage.
    pub fn new() -> Self {
        Self::with_storage(MemoryStorage::shared())
    }

    /// Create a local mailer with existing storage.
    pub fn with_storage(storage: Arc<MemoryStorage>) -> Self {
        Self {
            storage,
            counters: Arc::default(),
            fail_verify: Arc::default(),
            fail_deliver: Arc::default(),
        }
    }

    pub fn storage(&self) -> Arc<MemoryStorage> {
        Arc::clone(&self.storage)
    }

    // =========================================================================
    // Failure Simulation
    // =========================================================================

    /// Make `verify()` fail, as a refused connection or rejected login would.
    pub fn set_verify_failure(&self, message: impl Into<String>) {
        *self.fail_verify.write() = Some(message.into());
    }

    /// Make `deliver()` fail after a successful verification.
    pub fn set_send_failure(&self, message: impl Into<String>) {
        *self.fail_deliver.write() = Some(message.into());
    }

    /// Clear both failure settings.
    pub fn clear_failures(&self) {
        *self.fail_verify.write() = None;
        *self.fail_deliver.write() = None;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Number of `verify()` calls, failed ones included.
    pub fn verify_count(&self) -> usize {
        self.counters.verify.load(Ordering::SeqCst)
    }

    /// Number of `deliver()` calls, failed ones included.
    pub fn deliver_count(&self) -> usize {
        self.counters.deliver.load(Ordering::SeqCst)
    }

    /// Total simulated connection attempts.
    pub fn connection_attempts(&self) -> usize {
        self.verify_count() + self.deliver_count()
    }

    /// Get all delivered emails (newest first).
    pub fn emails(&self) -> Vec<StoredEmail> {
        self.storage.all()
    }

    /// Get the most recently delivered email.
    pub fn last_email(&self) -> Option<StoredEmail> {
        self.storage.all().into_iter().next()
    }

    pub fn email_count(&self) -> usize {
        self.storage.count()
    }

    pub fn has_emails(&self) -> bool {
        self.storage.count() > 0
    }

    /// Clear delivered emails and reset the counters.
    pub fn clear(&self) {
        self.storage.clear();
        self.counters.verify.store(0, Ordering::SeqCst);
        self.counters.deliver.store(0, Ordering::SeqCst);
    }
}

impl Default for LocalMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mailer for LocalMailer {
    async fn verify(&self) -> Result<(), RelayError> {
        self.counters.verify.fetch_add(1, Ordering::SeqCst);
        match self.fail_verify.read().clone() {
            Some(message) => Err(RelayError::Verification(message)),
            None => Ok(()),
        }
    }

    async fn deliver(&self, email: &Email) -> Result<DeliveryResult, RelayError> {
        self.counters.deliver.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_deliver.read().clone() {
            return Err(RelayError::Send(message));
        }

        let message_id = self.storage.push(email.clone());
        Ok(DeliveryResult::new(message_id))
    }

    fn provider_name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::new()
            .from("noreply@example.com")
            .to("contact@example.com")
            .subject("Test Email")
            .html_body("<p>Hello!</p>")
    }

    #[tokio::test]
    async fn test_local_mailer() {
        let mailer = LocalMailer::new();

        mailer.verify().await.unwrap();
        let result = mailer.deliver(&email()).await.unwrap();
        assert!(!result.message_id.is_empty());

        let stored = mailer.storage().get(&result.message_id).unwrap();
        assert_eq!(stored.email.subject, "Test Email");
        assert_eq!(mailer.verify_count(), 1);
        assert_eq!(mailer.deliver_count(), 1);
    }

    #[tokio::test]
    async fn test_verify_failure() {
        let mailer = LocalMailer::new();
        mailer.set_verify_failure("connect ECONNREFUSED");

        let err = mailer.verify().await.unwrap_err();
        assert!(matches!(err, RelayError::Verification(msg) if msg == "connect ECONNREFUSED"));
        assert_eq!(mailer.verify_count(), 1);
    }

    #[tokio::test]
    async fn test_send_failure() {
        let mailer = LocalMailer::new();
        mailer.set_send_failure("550 rejected");

        let err = mailer.deliver(&email()).await.unwrap_err();
        assert!(matches!(err, RelayError::Send(msg) if msg == "550 rejected"));
        assert!(!mailer.has_emails());

        mailer.clear_failures();
        assert!(mailer.deliver(&email()).await.is_ok());
        assert_eq!(mailer.email_count(), 1);
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let mailer = LocalMailer::new();
        let cloned = mailer.clone();

        cloned.deliver(&email()).await.unwrap();
        assert_eq!(mailer.email_count(), 1);
        assert_eq!(mailer.deliver_count(), 1);

        mailer.set_send_failure("down");
        assert!(cloned.deliver(&email()).await.is_err());
    }

    #[tokio::test]
    async fn test_clear_resets_counters() {
        let mailer = LocalMailer::new();
        mailer.verify().await.unwrap();
        mailer.deliver(&email()).await.unwrap();

        mailer.clear();
        assert_eq!(mailer.connection_attempts(), 0);
        assert!(!mailer.has_emails());
    }
}
