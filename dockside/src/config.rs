//! Environment-driven configuration.
//!
//! Any `Deserialize` type can be loaded from the process environment through
//! [`EnvConfig`]. Keys are matched case-insensitively, so `CAREERS_EMAIL`
//! fills a `careers_email` field.

use serde::de::DeserializeOwned;
use serde::Deserialize;

pub use ::config::ConfigError;

use crate::forms::MailRouting;

pub trait EnvConfig: Sized {
    fn from_env() -> Result<Self, ConfigError>;
    fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError>;
}

impl<D> EnvConfig for D
where
    D: DeserializeOwned,
{
    fn from_env() -> Result<Self, ConfigError> {
        load(::config::Environment::default())
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        load(::config::Environment::with_prefix(prefix))
    }
}

fn load<D: DeserializeOwned>(source: ::config::Environment) -> Result<D, ConfigError> {
    ::config::Config::builder()
        .add_source(source)
        .build()?
        .try_deserialize()
}

/// Controls what happens when mail credentials are missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Log the would-be message and acknowledge the submission.
    #[serde(alias = "dev")]
    Development,
    /// Refuse the submission with a server error.
    #[default]
    #[serde(alias = "prod")]
    Production,
}

/// Server and mail routing settings.
///
/// SMTP connection settings live in [`MailerConfig`](crate::mail::MailerConfig)
/// and are loaded separately from the same environment.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen port (default: 3000).
    #[serde(default = "default_port")]
    pub port: u16,

    /// `development` or `production` (default).
    #[serde(rename = "app_env", default)]
    pub mode: Mode,

    /// Sender address on every relayed message.
    pub mail_from: String,

    /// Recipient of consultation requests.
    pub consultation_email: String,

    /// Recipient of career applications.
    pub careers_email: String,
}

fn default_port() -> u16 {
    3000
}

impl AppConfig {
    pub fn routing(&self) -> MailRouting {
        MailRouting {
            from: self.mail_from.clone(),
            consultation: self.consultation_email.clone(),
            careers: self.careers_email.clone(),
        }
    }
}
