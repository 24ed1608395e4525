//! `contact-relay` binary: serve the contact API or generate the sitemap.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use contact_relay::{server, sitemap, MailRelay, RelayConfig, Sitemap};

#[derive(Debug, Parser)]
#[command(name = "contact-relay", version, about = "Contact-form mail relay")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve /api/send-email, /health
    Serve {
        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = 3001)]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },
    /// Write sitemap.xml for the site's routes
    Sitemap {
        /// Site origin, e.g. https://www.example.com
        #[arg(long, env = "SITE_URL", default_value = sitemap::DEFAULT_HOSTNAME)]
        hostname: String,

        /// Output file
        #[arg(long, short, default_value = sitemap::DEFAULT_OUTPUT)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set RUST_LOG=debug for verbose logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Serve { port, bind } => serve(&bind, port).await,
        Command::Sitemap { hostname, output } => Sitemap::new(hostname)
            .write_to(&output)
            .with_context(|| format!("writing {}", output.display())),
    }
}

async fn serve(bind: &str, port: u16) -> anyhow::Result<()> {
    let config = RelayConfig::from_env().context("reading relay configuration")?;
    let relay = MailRelay::new(config).context("building SMTP transport")?;
    if !relay.is_configured() {
        tracing::warn!("Make sure SMTP_HOST and SMTP_PORT are set; sends will fail until then");
    }

    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", bind, port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    tracing::info!(
        "API server running on http://{}, email API at {}",
        addr,
        server::SEND_EMAIL_PATH
    );

    axum::serve(listener, server::router(Arc::new(relay)))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await
        .context("server error")
}
