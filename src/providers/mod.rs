//! Transport implementations.
//!
//! Each provider implements the [`Mailer`](crate::Mailer) trait.
//!
//! | Provider | Feature Flag | Description |
//! |----------|-------------|-------------|
//! | [`SmtpMailer`] | `smtp` | SMTP via lettre |
//! | [`LocalMailer`] | (none) | In-memory, for development and tests |

#[cfg(feature = "smtp")]
mod smtp;
#[cfg(feature = "smtp")]
pub use smtp::{SmtpMailer, TlsMode};

mod local;
pub use local::LocalMailer;
