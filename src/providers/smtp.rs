//! SMTP provider using lettre.
//!
//! # Example
//!
//! ```rust,ignore
//! use contact_relay::{providers::SmtpMailer, TransportConfig};
//!
//! let config = TransportConfig::new("smtp.example.com", 465).credentials("user", "pass");
//! let mailer = SmtpMailer::from_config(&config)?;
//!
//! mailer.verify().await?;
//! mailer.deliver(&email).await?;
//! ```

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;

use crate::address::Address;
use crate::config::TransportConfig;
use crate::email::Email;
use crate::error::RelayError;
use crate::mailer::{DeliveryResult, Mailer};

/// TLS mode for SMTP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// No TLS (dangerous, only for localhost)
    None,
    /// Upgrade with STARTTLS when the server offers it, plaintext otherwise
    Opportunistic,
    /// Implicit TLS - connect with TLS from start (port 465)
    Tls,
}

impl TlsMode {
    /// Mode implied by a transport config: implicit TLS when `secure`,
    /// opportunistic STARTTLS otherwise.
    pub fn for_config(config: &TransportConfig) -> Self {
        if config.secure {
            Self::Tls
        } else {
            Self::Opportunistic
        }
    }
}

/// SMTP email provider.
///
/// Each `verify()` and `deliver()` opens its own session; nothing is pooled.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    tls: TlsMode,
    verify_timeout: Duration,
    socket_timeout: Duration,
}

impl SmtpMailer {
    /// Build a mailer for the configured endpoint.
    ///
    /// Fails with `NotConfigured` when host or port is missing.
    pub fn from_config(config: &TransportConfig) -> Result<Self, RelayError> {
        Self::with_tls(config, TlsMode::for_config(config))
    }

    /// Build a mailer with an explicit TLS mode.
    pub fn with_tls(config: &TransportConfig, tls: TlsMode) -> Result<Self, RelayError> {
        let (host, port) = config.endpoint()?;

        let tls_parameters = || {
            TlsParameters::new(host.to_string()).map_err(|e| RelayError::Build(e.to_string()))
        };
        let lettre_tls = match tls {
            TlsMode::None => Tls::None,
            TlsMode::Opportunistic => Tls::Opportunistic(tls_parameters()?),
            TlsMode::Tls => Tls::Wrapper(tls_parameters()?),
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .tls(lettre_tls)
            .timeout(Some(config.socket_timeout));
        if let Some(creds) = &config.credentials {
            builder = builder.credentials(Credentials::new(creds.user.clone(), creds.pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            tls,
            verify_timeout: config.verify_timeout(),
            socket_timeout: config.socket_timeout,
        })
    }

    pub fn tls_mode(&self) -> TlsMode {
        self.tls
    }

    /// Build a lettre Message from our Email struct.
    ///
    /// Returns the message together with the Message-ID it carries.
    fn build_message(&self, email: &Email) -> Result<(Message, String), RelayError> {
        let from = email
            .from
            .as_ref()
            .ok_or_else(|| RelayError::Build("missing from address".into()))?;

        if email.to.is_empty() {
            return Err(RelayError::Build("missing recipient".into()));
        }

        let message_id = new_message_id(from);
        let mut builder = Message::builder()
            .from(address_to_mailbox(from)?)
            .subject(&email.subject)
            .message_id(Some(message_id.clone()));

        for to in &email.to {
            builder = builder.to(address_to_mailbox(to)?);
        }

        // lettre takes a single Reply-To; the contact form only ever sets one.
        if let Some(reply_to) = email.reply_to.first() {
            builder = builder.reply_to(address_to_mailbox(reply_to)?);
        }

        let body = email.html_body.clone().unwrap_or_default();
        let message = builder.header(ContentType::TEXT_HTML).body(body)?;

        Ok((message, message_id))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn verify(&self) -> Result<(), RelayError> {
        let check = tokio::time::timeout(self.verify_timeout, self.transport.test_connection());

        match check.await {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => Err(RelayError::Verification(
                "server did not accept the session".into(),
            )),
            Ok(Err(e)) => Err(RelayError::Verification(e.to_string())),
            Err(_) => Err(RelayError::Verification(format!(
                "Connection timeout after {}ms",
                self.verify_timeout.as_millis()
            ))),
        }
    }

    async fn deliver(&self, email: &Email) -> Result<DeliveryResult, RelayError> {
        // Reached after verification, so a message lettre refuses to build
        // (e.g. a reply-to the form pattern let through) is a dispatch failure.
        let (message, message_id) = self
            .build_message(email)
            .map_err(|e| RelayError::Send(e.to_string()))?;

        let response = tokio::time::timeout(self.socket_timeout, self.transport.send(message))
            .await
            .map_err(|_| {
                RelayError::Send(format!(
                    "Socket timeout after {}ms",
                    self.socket_timeout.as_millis()
                ))
            })?
            .map_err(|e| RelayError::Send(e.to_string()))?;

        if let Some(line) = response.message().next() {
            tracing::debug!(response = %line, "SMTP server accepted message");
        }

        Ok(DeliveryResult::new(message_id))
    }

    fn provider_name(&self) -> &'static str {
        "smtp"
    }
}

/// `<uuid@sender-domain>`, unique per message.
fn new_message_id(from: &Address) -> String {
    let domain = from
        .email
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .unwrap_or("localhost");
    format!("<{}@{}>", uuid::Uuid::new_v4(), domain)
}

/// Convert our Address to lettre's Mailbox.
fn address_to_mailbox(addr: &Address) -> Result<Mailbox, RelayError> {
    let email = addr.to_ascii()?.parse()?;
    Ok(Mailbox::new(addr.name.clone(), email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ContactEmail, EmailTemplate};
    use crate::submission::validate;
    use serde_json::json;
    use std::time::Instant;

    fn email() -> Email {
        Email::new()
            .from(Address::with_name("Website Contact", "noreply@example.com"))
            .to("contact@example.com")
            .reply_to("jane@example.com")
            .subject("📩 Hello — from Jane Doe")
            .html_body("<p>Hi there</p>")
    }

    #[test]
    fn test_unconfigured_is_rejected() {
        let result = SmtpMailer::from_config(&TransportConfig::unconfigured());
        assert!(matches!(result, Err(RelayError::NotConfigured(_))));
    }

    #[test]
    fn test_tls_mode_follows_secure_flag() {
        let implicit = TransportConfig::new("smtp.example.com", 465);
        assert_eq!(TlsMode::for_config(&implicit), TlsMode::Tls);

        let starttls = TransportConfig::new("smtp.example.com", 587);
        assert_eq!(TlsMode::for_config(&starttls), TlsMode::Opportunistic);

        let forced = TransportConfig::new("smtp.example.com", 2525).secure(true);
        assert_eq!(TlsMode::for_config(&forced), TlsMode::Tls);
    }

    #[test]
    fn test_build_message_headers() {
        let mailer = SmtpMailer::with_tls(&TransportConfig::new("localhost", 2525), TlsMode::None)
            .unwrap();
        let (message, message_id) = mailer.build_message(&email()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Reply-To: jane@example.com"));
        assert!(raw.contains("To: contact@example.com"));
        assert!(raw.contains("Content-Type: text/html"));
        assert!(raw.contains(&message_id));
        assert!(message_id.ends_with("@example.com>"));
    }

    #[test]
    fn test_build_message_requires_from() {
        let mailer = SmtpMailer::with_tls(&TransportConfig::new("localhost", 2525), TlsMode::None)
            .unwrap();
        let mut email = email();
        email.from = None;
        assert!(matches!(
            mailer.build_message(&email),
            Err(RelayError::Build(_))
        ));
    }

    #[test]
    fn test_message_ids_are_unique() {
        let from = Address::new("noreply@example.com");
        assert_ne!(new_message_id(&from), new_message_id(&from));
    }

    /// Accepts connections and never writes a greeting.
    async fn silent_server() -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        port
    }

    fn silent_config(port: u16) -> TransportConfig {
        TransportConfig::new("127.0.0.1", port)
            .connect_timeout(Duration::from_millis(200))
            .greeting_timeout(Duration::from_millis(200))
            .socket_timeout(Duration::from_millis(300))
    }

    #[tokio::test]
    async fn test_verify_times_out_on_silent_server() {
        let port = silent_server().await;
        let mailer = SmtpMailer::with_tls(&silent_config(port), TlsMode::None).unwrap();

        let started = Instant::now();
        let err = mailer.verify().await.unwrap_err();

        assert!(
            matches!(&err, RelayError::Verification(msg) if msg.starts_with("Connection timeout")),
            "unexpected error: {err:?}"
        );
        assert_eq!(err.status_code(), 502);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_deliver_times_out_on_silent_server() {
        let port = silent_server().await;
        let mailer = SmtpMailer::with_tls(&silent_config(port), TlsMode::None).unwrap();

        let started = Instant::now();
        let err = mailer.deliver(&email()).await.unwrap_err();

        assert!(
            matches!(&err, RelayError::Send(msg) if msg.starts_with("Socket timeout")),
            "unexpected error: {err:?}"
        );
        assert_eq!(err.status_code(), 502);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_unsendable_reply_to_is_send_error() {
        // Nothing listens here; the message is refused before any connection.
        let mailer = SmtpMailer::with_tls(&TransportConfig::new("127.0.0.1", 1), TlsMode::None)
            .unwrap();
        let sender = Address::with_name("Website Contact", "noreply@example.com");
        let recipient = Address::new("contact@example.com");

        for submitted in ["jane,doe@example.com", "jane(x)@example.com", "a\"b@example.com"] {
            let submission = validate(&json!({
                "name": "Jane Doe",
                "email": submitted,
                "subject": "Hello",
                "message": "Hi there",
            }))
            .unwrap();
            let email = ContactEmail::new(&submission, &sender, &recipient)
                .into_email()
                .unwrap();

            let err = mailer.deliver(&email).await.unwrap_err();
            assert!(matches!(err, RelayError::Send(_)), "{submitted}: {err:?}");
            assert_eq!(err.status_code(), 502);
            assert_eq!(
                err.public_message(),
                "Failed to send email via SMTP. Please try again later."
            );
        }
    }

    #[tokio::test]
    async fn test_verify_unreachable_server_fails() {
        // Port 1 on loopback is closed; connection is refused immediately.
        let config = TransportConfig::new("127.0.0.1", 1)
            .connect_timeout(Duration::from_millis(500))
            .greeting_timeout(Duration::from_millis(500));
        let mailer = SmtpMailer::with_tls(&config, TlsMode::None).unwrap();

        let err = mailer.verify().await.unwrap_err();
        assert!(matches!(err, RelayError::Verification(_)));
    }
}
