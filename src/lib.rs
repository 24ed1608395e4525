//! # contact-relay
//!
//! Relays contact-form submissions to an inbox over SMTP.
//!
//! A submission is validated before any network I/O, the SMTP server is
//! verified before anything is sent, and every failure maps to its own HTTP
//! status and user-safe message.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use contact_relay::{handle, ApiRequest, MailRelay, RelayConfig};
//!
//! let relay = MailRelay::new(RelayConfig::from_env()?)?;
//!
//! let response = handle(&relay, ApiRequest::json(&body)).await;
//! assert_eq!(response.status_code, 200);
//! ```
//!
//! Or run the bundled server:
//!
//! ```bash
//! SMTP_HOST=smtp.example.com SMTP_PORT=465 contact-relay serve
//! ```
//!
//! ## HTTP Contract
//!
//! | Request | Status | `error` |
//! |---------|--------|---------|
//! | `OPTIONS /api/send-email` | 200 | (empty body) |
//! | `POST` missing a field | 400 | `Missing required fields` |
//! | `POST` with a malformed email | 400 | `Invalid email format` |
//! | SMTP host/port unset | 500 | `Email service is not configured...` |
//! | Verification failed | 502 | `Unable to connect to SMTP server...` |
//! | Dispatch failed | 502 | `Failed to send email via SMTP...` |
//! | Sent | 200 | (`message: "Email sent successfully"`) |
//!
//! ## Feature Flags
//!
//! - `smtp` - SMTP transport via lettre (default)
//! - `server` - axum router and the `contact-relay` binary (default)
//! - `metrics` - Prometheus-style metrics (counters/histograms)
//!
//! ## Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `contact_relay_emails_total` | Counter | provider, status | Relay outcomes |
//! | `contact_relay_delivery_duration_seconds` | Histogram | provider | Dispatch duration |

/// The version of the contact-relay crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod address;
mod config;
mod email;
mod error;
mod handler;
mod mailer;
mod message;
mod relay;
mod storage;
mod submission;

pub mod providers;
pub mod sitemap;
pub mod testing;

#[cfg(feature = "server")]
pub mod server;

// Re-exports
pub use address::Address;
pub use config::{
    Credentials, RelayConfig, TransportConfig, DEFAULT_RECIPIENT, DEFAULT_SENDER_EMAIL,
    DEFAULT_SENDER_NAME,
};
pub use email::Email;
pub use error::RelayError;
pub use handler::{handle, ApiBody, ApiRequest, ApiResponse, CORS_HEADERS};
pub use mailer::{DeliveryResult, Mailer};
pub use message::{subject_line, ContactEmail, EmailTemplate};
pub use relay::{MailRelay, SendResult};
pub use sitemap::Sitemap;
pub use storage::{MemoryStorage, StoredEmail};
pub use submission::{is_valid_email, validate, ContactSubmission};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        handle, validate, Address, ApiRequest, ApiResponse, ContactSubmission, Email, MailRelay,
        Mailer, RelayConfig, RelayError, SendResult, TransportConfig,
    };
}
