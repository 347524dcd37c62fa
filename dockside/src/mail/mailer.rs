//! Mailer trait and SMTP implementation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::Error as SmtpError;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;

use super::{Email, EmailBody, MailError};

/// Async email sending trait.
///
/// Implement this trait to provide alternative email backends (e.g., SES, Mailgun).
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Send an email.
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    /// Plain connection upgraded in-band.
    #[default]
    Starttls,
    /// Encrypted from the first byte (usually port 465).
    Tls,
    /// No encryption. Local relays and test servers only.
    None,
}

/// Configuration for SMTP mailer.
#[derive(Clone, Deserialize)]
pub struct MailerConfig {
    /// SMTP server hostname.
    #[serde(rename = "smtp_host")]
    pub host: String,

    /// SMTP server port (default: 587).
    #[serde(rename = "smtp_port", default = "default_port")]
    pub port: u16,

    /// SMTP username for authentication.
    #[serde(rename = "smtp_username")]
    pub username: Option<String>,

    /// SMTP password for authentication.
    #[serde(rename = "smtp_password")]
    pub password: Option<String>,

    #[serde(rename = "smtp_tls", default)]
    pub tls: SmtpTls,

    /// Connection timeout in seconds.
    #[serde(rename = "smtp_timeout")]
    pub timeout: Option<u64>,
}

fn default_port() -> u16 {
    587
}

impl MailerConfig {
    /// Username and password, when both are set and non-empty.
    pub fn credentials(&self) -> Option<Credentials> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Some(Credentials::new(user.to_owned(), pass.to_owned()))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for MailerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("tls", &self.tls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// SMTP-based mailer using lettre.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpMailer {
    /// Create a mailer from explicit configuration.
    ///
    /// Fails with [`MailError::MissingConfig`] when credentials are absent.
    pub fn from_config(config: &MailerConfig) -> Result<Self, MailError> {
        let credentials = config.credentials().ok_or_else(|| {
            MailError::MissingConfig("smtp_username and smtp_password".into())
        })?;

        let mut builder = match config.tls {
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::Smtp(e.to_string()))?,
            SmtpTls::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| MailError::Smtp(e.to_string()))?,
        };

        builder = builder.port(config.port).credentials(credentials);

        if let Some(secs) = config.timeout {
            builder = builder.timeout(Some(Duration::from_secs(secs)));
        }

        Ok(Self {
            transport: Arc::new(builder.build()),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let message = build_message(email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| classify_smtp_error(&e))?;

        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse()
        .map_err(|_| MailError::InvalidAddress(address.to_owned()))
}

/// Build a lettre Message from our Email type.
///
/// Attachments wrap the body in `multipart/mixed`.
pub(crate) fn build_message(email: &Email) -> Result<Message, MailError> {
    let mut builder = Message::builder()
        .from(parse_mailbox(&email.from)?)
        .subject(&email.subject);

    for to in &email.to {
        builder = builder.to(parse_mailbox(to)?);
    }

    if let Some(reply_to) = &email.reply_to {
        builder = builder.reply_to(parse_mailbox(reply_to)?);
    }

    let message = if email.attachments.is_empty() {
        match &email.body {
            EmailBody::Html(html) => builder.singlepart(SinglePart::html(html.clone())),
            EmailBody::Alternative { text, html } => builder.multipart(
                MultiPart::alternative_plain_html(text.clone(), html.clone()),
            ),
        }
    } else {
        let mut mixed = match &email.body {
            EmailBody::Html(html) => MultiPart::mixed().singlepart(SinglePart::html(html.clone())),
            EmailBody::Alternative { text, html } => MultiPart::mixed().multipart(
                MultiPart::alternative_plain_html(text.clone(), html.clone()),
            ),
        };
        for attachment in &email.attachments {
            let content_type = ContentType::parse(&attachment.content_type).map_err(|_| {
                MailError::Build(format!(
                    "invalid content type '{}' for {}",
                    attachment.content_type, attachment.filename
                ))
            })?;
            mixed = mixed.singlepart(
                MimeAttachment::new(attachment.filename.clone())
                    .body(attachment.data.clone(), content_type),
            );
        }
        builder.multipart(mixed)
    };

    message.map_err(|e| MailError::Build(e.to_string()))
}

fn classify_smtp_error(err: &SmtpError) -> MailError {
    let code = err
        .status()
        .and_then(|code| code.to_string().parse::<u16>().ok());
    classify(code, err.to_string())
}

/// Sort a transport failure into authentication, message or other causes.
pub(crate) fn classify(code: Option<u16>, reason: String) -> MailError {
    match code {
        Some(530 | 534 | 535 | 538) => MailError::Authentication(reason),
        Some(523 | 552 | 554) => MailError::Rejected(reason),
        _ => {
            let lower = reason.to_ascii_lowercase();
            if lower.contains("authentication") || lower.contains("credentials") {
                MailError::Authentication(reason)
            } else if lower.contains("5.3.4") || lower.contains("too large") || lower.contains("size limit") {
                MailError::Rejected(reason)
            } else {
                MailError::Smtp(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::{Attachment, FailureKind};

    fn sample_email() -> Email {
        Email::builder()
            .from("noreply@example.com")
            .to("info@example.com")
            .reply_to("jane@example.com")
            .subject("New Consultation Request from Jane Doe")
            .text("Hello")
            .html("<p>Hello</p>")
            .build()
            .unwrap()
    }

    fn sample_config() -> MailerConfig {
        MailerConfig {
            host: "smtp.example.com".into(),
            port: 587,
            username: Some("user".into()),
            password: Some("secret".into()),
            tls: SmtpTls::Starttls,
            timeout: None,
        }
    }

    #[test]
    fn message_carries_headers() {
        let msg = build_message(&sample_email()).unwrap();
        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(raw.contains("From: noreply@example.com"));
        assert!(raw.contains("To: info@example.com"));
        assert!(raw.contains("Reply-To: jane@example.com"));
        assert!(raw.contains("Subject: New Consultation Request from Jane Doe"));
        assert!(raw.contains("multipart/alternative"));
        assert!(!raw.contains("multipart/mixed"));
    }

    #[test]
    fn message_with_attachment_is_mixed() {
        let mut email = sample_email();
        email.attachments.push(Attachment {
            filename: "my_cv.pdf".into(),
            content_type: "application/pdf".into(),
            data: b"%PDF-1.4".to_vec(),
        });
        let raw = String::from_utf8(build_message(&email).unwrap().formatted()).unwrap();
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("application/pdf"));
        assert!(raw.contains("my_cv.pdf"));
    }

    #[test]
    fn bad_content_type_is_a_message_failure() {
        let mut email = sample_email();
        email.attachments.push(Attachment {
            filename: "cv.pdf".into(),
            content_type: "not a mime type".into(),
            data: vec![1, 2, 3],
        });
        let err = build_message(&email).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Message);
    }

    #[test]
    fn bad_recipient_is_a_message_failure() {
        let mut email = sample_email();
        email.to = vec!["nobody".into()];
        let err = build_message(&email).unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress(ref a) if a == "nobody"));
        assert_eq!(err.kind(), FailureKind::Message);
    }

    #[test]
    fn classify_by_status_code() {
        let auth = classify(Some(535), "535 5.7.8 Username and Password not accepted".into());
        assert_eq!(auth.kind(), FailureKind::Authentication);

        let size = classify(Some(552), "552 5.3.4 Message size exceeds fixed limit".into());
        assert_eq!(size.kind(), FailureKind::Message);

        let busy = classify(Some(421), "421 service not available".into());
        assert_eq!(busy.kind(), FailureKind::Unknown);
    }

    #[test]
    fn classify_by_reason_without_code() {
        let auth = classify(None, "No compatible authentication mechanism was found".into());
        assert_eq!(auth.kind(), FailureKind::Authentication);

        let size = classify(None, "message too large".into());
        assert_eq!(size.kind(), FailureKind::Message);

        let io = classify(None, "Connection refused (os error 111)".into());
        assert!(matches!(io, MailError::Smtp(_)));
    }

    #[test]
    fn credentials_need_both_parts() {
        let config = sample_config();
        assert!(config.credentials().is_some());

        let mut missing = sample_config();
        missing.password = None;
        assert!(missing.credentials().is_none());

        let mut empty = sample_config();
        empty.username = Some(String::new());
        assert!(empty.credentials().is_none());
    }

    #[test]
    fn mailer_requires_credentials() {
        let mut config = sample_config();
        config.username = None;
        assert!(matches!(
            SmtpMailer::from_config(&config),
            Err(MailError::MissingConfig(_))
        ));
    }

    #[tokio::test]
    async fn mailer_builds_without_connecting() {
        let config = MailerConfig {
            host: "localhost".into(),
            port: 2525,
            tls: SmtpTls::None,
            ..sample_config()
        };
        assert!(SmtpMailer::from_config(&config).is_ok());
    }

    #[test]
    fn debug_redacts_password() {
        let debug = format!("{:?}", sample_config());
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }
}
