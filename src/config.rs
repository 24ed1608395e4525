//! Transport and relay configuration.
//!
//! Configuration is resolved once, at process start, into plain values that
//! are passed into [`MailRelay::new`](crate::MailRelay::new). Nothing below
//! the binary reads the environment on its own.
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `SMTP_HOST` | SMTP server host |
//! | `SMTP_PORT` | SMTP server port |
//! | `SMTP_SECURE` | `true` for implicit TLS; unset means "only on port 465" |
//! | `SMTP_USER` | SMTP username |
//! | `SMTP_PASS` | SMTP password |
//! | `SENDER_EMAIL` | Sender mailbox, `addr` or `Name <addr>` |
//! | `RECIPIENT_EMAIL` | Where submissions are delivered |

use std::env;
use std::fmt;
use std::time::Duration;

use crate::address::Address;
use crate::error::RelayError;

/// Sender used when `SENDER_EMAIL` is unset.
pub const DEFAULT_SENDER_NAME: &str = "Website Contact";
pub const DEFAULT_SENDER_EMAIL: &str = "noreply@sydsolutiontech.com";

/// Recipient used when `RECIPIENT_EMAIL` is unset.
pub const DEFAULT_RECIPIENT: &str = "zamoranossydney@gmail.com";

/// Implicit-TLS submission port.
pub const SUBMISSIONS_PORT: u16 = 465;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const DEFAULT_GREETING_TIMEOUT: Duration = Duration::from_millis(5_000);
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_millis(30_000);

/// SMTP login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub pass: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .finish()
    }
}

/// SMTP endpoint settings, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Implicit TLS from the first byte (as opposed to STARTTLS).
    pub secure: bool,
    /// Present only if user or pass is non-empty.
    pub credentials: Option<Credentials>,
    pub connect_timeout: Duration,
    pub greeting_timeout: Duration,
    pub socket_timeout: Duration,
}

impl TransportConfig {
    /// Configure an endpoint. `secure` defaults to `port == 465`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: Some(host.into()),
            port: Some(port),
            secure: port == SUBMISSIONS_PORT,
            ..Self::unconfigured()
        }
    }

    /// A config with no endpoint; every send will be refused.
    pub fn unconfigured() -> Self {
        Self {
            host: None,
            port: None,
            secure: false,
            credentials: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            greeting_timeout: DEFAULT_GREETING_TIMEOUT,
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
        }
    }

    /// Override the implicit-TLS default.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set credentials. Ignored when both are empty.
    pub fn credentials(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        let (user, pass) = (user.into(), pass.into());
        self.credentials = if user.is_empty() && pass.is_empty() {
            None
        } else {
            Some(Credentials { user, pass })
        };
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn greeting_timeout(mut self, timeout: Duration) -> Self {
        self.greeting_timeout = timeout;
        self
    }

    pub fn socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }

    /// Host and port are both set.
    pub fn is_configured(&self) -> bool {
        self.host.is_some() && self.port.is_some()
    }

    /// Host and port, or `NotConfigured` naming what is missing.
    pub fn endpoint(&self) -> Result<(&str, u16), RelayError> {
        match (self.host.as_deref(), self.port) {
            (Some(host), Some(port)) => Ok((host, port)),
            (None, Some(_)) => Err(RelayError::NotConfigured("SMTP_HOST missing".into())),
            (Some(_), None) => Err(RelayError::NotConfigured("SMTP_PORT missing".into())),
            (None, None) => Err(RelayError::NotConfigured(
                "SMTP_HOST/SMTP_PORT missing".into(),
            )),
        }
    }

    /// Time allowed for verification: TCP connect plus server greeting.
    pub fn verify_timeout(&self) -> Duration {
        self.connect_timeout + self.greeting_timeout
    }

    /// Read `SMTP_*` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read `SMTP_*` through `lookup`. Values are trimmed; empty means unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = get("SMTP_HOST");
        let port = get("SMTP_PORT").and_then(|p| match p.parse::<u16>() {
            Ok(port) => Some(port),
            Err(e) => {
                tracing::warn!(value = %p, error = %e, "Ignoring unparseable SMTP_PORT");
                None
            }
        });
        let secure = match get("SMTP_SECURE") {
            Some(flag) => flag == "true",
            None => port == Some(SUBMISSIONS_PORT),
        };

        Self {
            host,
            port,
            secure,
            ..Self::unconfigured()
        }
        .credentials(
            get("SMTP_USER").unwrap_or_default(),
            get("SMTP_PASS").unwrap_or_default(),
        )
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::unconfigured()
    }
}

/// Everything the relay needs: the transport plus addressing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayConfig {
    pub transport: TransportConfig,
    /// `None` falls back to [`DEFAULT_SENDER_EMAIL`].
    pub sender: Option<Address>,
    /// `None` falls back to [`DEFAULT_RECIPIENT`].
    pub recipient: Option<Address>,
}

impl RelayConfig {
    pub fn new(transport: TransportConfig) -> Self {
        Self {
            transport,
            sender: None,
            recipient: None,
        }
    }

    /// Configured sender, or the default verified-domain sender.
    pub fn sender_or_default(&self) -> Address {
        self.sender
            .clone()
            .unwrap_or_else(|| Address::with_name(DEFAULT_SENDER_NAME, DEFAULT_SENDER_EMAIL))
    }

    /// Configured recipient, or the default inbox.
    pub fn recipient_or_default(&self) -> Address {
        self.recipient
            .clone()
            .unwrap_or_else(|| Address::new(DEFAULT_RECIPIENT))
    }

    pub fn sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn recipient(mut self, recipient: Address) -> Self {
        self.recipient = Some(recipient);
        self
    }

    /// Read the full relay configuration from the process environment.
    pub fn from_env() -> Result<Self, RelayError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the full relay configuration through `lookup`.
    ///
    /// A malformed `SENDER_EMAIL`/`RECIPIENT_EMAIL` is an error; an absent
    /// one is not.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mailbox = |key: &str| -> Result<Option<Address>, RelayError> {
            match lookup(key).filter(|v| !v.trim().is_empty()) {
                Some(value) => Address::parse_mailbox(&value)
                    .map(Some)
                    .map_err(|e| RelayError::InvalidAddress(format!("{}: {}", key, e))),
                None => Ok(None),
            }
        };

        Ok(Self {
            sender: mailbox("SENDER_EMAIL")?,
            recipient: mailbox("RECIPIENT_EMAIL")?,
            transport: TransportConfig::from_lookup(&lookup),
        })
    }
}
