//! The two public submission forms and their shared pipeline tail.

pub mod application;
pub mod consultation;

use std::fmt;

use axum::Json;
use serde::Serialize;

use crate::error::ApiError;
use crate::mail::Email;
use crate::relay::{Relay, RelayOutcome};

/// Fixed addresses a submission is relayed between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailRouting {
    /// Sender of every relayed message.
    pub from: String,
    pub consultation: String,
    pub careers: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Consultation,
    Application,
}

impl FormKind {
    fn sent_message(self) -> &'static str {
        match self {
            FormKind::Consultation => "Consultation request submitted successfully",
            FormKind::Application => "Application submitted successfully",
        }
    }

    fn logged_message(self) -> &'static str {
        match self {
            FormKind::Consultation => "Consultation request received (email not configured)",
            FormKind::Application => "Application received (email not configured)",
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormKind::Consultation => f.write_str("consultation request"),
            FormKind::Application => f.write_str("application"),
        }
    }
}

/// Success body.
#[derive(Debug, Serialize)]
pub struct Acknowledgement {
    pub message: &'static str,
}

/// Relay a composed submission and turn the outcome into a response.
pub(crate) async fn relay(
    relay: &Relay,
    form: FormKind,
    email: &Email,
) -> Result<Json<Acknowledgement>, ApiError> {
    match relay.deliver(email).await {
        RelayOutcome::Sent => Ok(Json(Acknowledgement {
            message: form.sent_message(),
        })),
        RelayOutcome::Logged => Ok(Json(Acknowledgement {
            message: form.logged_message(),
        })),
        RelayOutcome::NotConfigured => Err(ApiError::NotConfigured),
        RelayOutcome::Failed(source) => Err(ApiError::delivery(form, source)),
    }
}

/// Free text split on line breaks, for `<br>` rendering.
pub(crate) fn lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}
