//! Email composition and delivery.
//!
//! A thin layer over [lettre](https://lettre.rs): [`Email`] describes a message,
//! [`Mailer`] sends it. [`SmtpMailer`] is the production implementation and is
//! configured from the environment through [`MailerConfig`].
//!
//! # Environment Variables
//!
//! | Variable | Required | Description |
//! |----------|----------|-------------|
//! | `SMTP_HOST` | Yes | SMTP server hostname |
//! | `SMTP_PORT` | No | Port (default: 587) |
//! | `SMTP_USERNAME` | No | Account identity; sending is disabled without it |
//! | `SMTP_PASSWORD` | No | Account secret; sending is disabled without it |
//! | `SMTP_TLS` | No | `starttls` (default), `tls` or `none` |
//! | `SMTP_TIMEOUT` | No | Seconds; lettre's default when unset |

mod mailer;
mod message;

pub use mailer::{Mailer, MailerConfig, SmtpMailer, SmtpTls};
pub use message::{Attachment, Email, EmailBody, EmailBuilder};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("missing required config: {0}")]
    MissingConfig(String),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP authentication failed: {0}")]
    Authentication(String),

    #[error("message rejected by SMTP server: {0}")]
    Rejected(String),

    #[error("SMTP error: {0}")]
    Smtp(String),
}

/// Coarse cause of a delivery failure, for operators and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Credentials were refused or no auth mechanism matched.
    Authentication,
    /// The message could not be built or the server refused it (usually size).
    Message,
    Unknown,
}

impl MailError {
    pub fn kind(&self) -> FailureKind {
        match self {
            MailError::Authentication(_) => FailureKind::Authentication,
            MailError::InvalidAddress(_) | MailError::Build(_) | MailError::Rejected(_) => {
                FailureKind::Message
            }
            MailError::MissingConfig(_) | MailError::Smtp(_) => FailureKind::Unknown,
        }
    }
}
