//! Hands composed messages to the mailer, or explains why it could not.

use std::sync::Arc;

use crate::config::Mode;
use crate::mail::{Email, MailError, Mailer, MailerConfig, SmtpMailer};

/// What happened to one message.
#[derive(Debug)]
pub enum RelayOutcome {
    /// Accepted by the mail server.
    Sent,
    /// No credentials in development mode; the message was only logged.
    Logged,
    /// No credentials in production mode; nothing was attempted.
    NotConfigured,
    /// The mailer tried and failed. Not retried.
    Failed(MailError),
}

#[derive(Clone)]
pub struct Relay {
    mailer: Option<Arc<dyn Mailer>>,
    mode: Mode,
}

impl Relay {
    /// A relay over any mailer. `None` behaves as missing credentials.
    pub fn new(mailer: Option<Arc<dyn Mailer>>, mode: Mode) -> Self {
        Self { mailer, mode }
    }

    /// An SMTP relay, or an unconfigured one when credentials are absent.
    pub fn from_config(config: &MailerConfig, mode: Mode) -> Result<Self, MailError> {
        let mailer = match config.credentials() {
            Some(_) => Some(Arc::new(SmtpMailer::from_config(config)?) as Arc<dyn Mailer>),
            None => None,
        };
        Ok(Self::new(mailer, mode))
    }

    pub fn is_configured(&self) -> bool {
        self.mailer.is_some()
    }

    pub async fn deliver(&self, email: &Email) -> RelayOutcome {
        let Some(mailer) = &self.mailer else {
            return match self.mode {
                Mode::Development => {
                    log_unsent(email);
                    RelayOutcome::Logged
                }
                Mode::Production => {
                    tracing::error!(
                        to = ?email.to,
                        subject = %email.subject,
                        "SMTP credentials not configured, message not sent"
                    );
                    RelayOutcome::NotConfigured
                }
            };
        };

        match mailer.send(email).await {
            Ok(()) => {
                tracing::info!(to = ?email.to, subject = %email.subject, "message sent");
                RelayOutcome::Sent
            }
            Err(err) => {
                tracing::error!(
                    to = ?email.to,
                    subject = %email.subject,
                    kind = ?err.kind(),
                    "message delivery failed: {err}"
                );
                RelayOutcome::Failed(err)
            }
        }
    }
}

fn log_unsent(email: &Email) {
    tracing::warn!("SMTP credentials not configured, logging message instead of sending");
    tracing::info!(
        from = %email.from,
        to = ?email.to,
        reply_to = ?email.reply_to,
        subject = %email.subject,
        "email would be sent"
    );
    tracing::info!("email content:\n{}", email.body.text().unwrap_or(email.body.html()));
    for attachment in &email.attachments {
        tracing::info!(
            filename = %attachment.filename,
            content_type = %attachment.content_type,
            "attachment: {:.2} MB",
            attachment.size_mb()
        );
    }
}
