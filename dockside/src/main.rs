use std::net::Ipv4Addr;

use anyhow::Context as _;
use dockside::mail::MailerConfig;
use dockside::{AppConfig, AppState, EnvConfig, Mode, Relay};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env().context("invalid application configuration")?;
    let mailer_config = MailerConfig::from_env().context("invalid SMTP configuration")?;
    tracing::debug!(?mailer_config, mode = ?config.mode, "loaded configuration");

    let relay = Relay::from_config(&mailer_config, config.mode)
        .context("could not set up SMTP transport")?;
    if !relay.is_configured() {
        match config.mode {
            Mode::Development => tracing::warn!(
                "SMTP credentials not configured, submissions will be logged instead of sent"
            ),
            Mode::Production => tracing::warn!(
                "SMTP credentials not configured, submissions will be refused"
            ),
        }
    }

    let app = dockside::router(AppState::new(relay, config.routing()));
    dockside::serve((Ipv4Addr::UNSPECIFIED, config.port), app)
        .await
        .context("error running HTTP server")?;
    Ok(())
}
