//! In-memory record of what a [`LocalMailer`](crate::providers::LocalMailer) delivered.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::email::Email;

/// A delivered email with metadata.
#[derive(Debug, Clone)]
pub struct StoredEmail {
    /// Message id handed back to the caller.
    pub id: String,
    pub email: Email,
}

/// Thread-safe in-memory storage for emails, in delivery order.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    emails: RwLock<Vec<StoredEmail>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage wrapped in an Arc for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Store an email and return its fresh id.
    pub fn push(&self, email: Email) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.emails.write().push(StoredEmail {
            id: id.clone(),
            email,
        });
        id
    }

    pub fn get(&self, id: &str) -> Option<StoredEmail> {
        self.emails.read().iter().find(|e| e.id == id).cloned()
    }

    /// All stored emails, newest first.
    pub fn all(&self) -> Vec<StoredEmail> {
        self.emails.read().iter().rev().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.emails.read().len()
    }

    pub fn clear(&self) {
        self.emails.write().clear();
    }
}
