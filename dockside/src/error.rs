//! Everything a submission handler can answer with besides success.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::forms::FormKind;
use crate::mail::{FailureKind, MailError};
use crate::validate::ValidationErrors;
use crate::HttpError;

#[derive(Debug, thiserror::Error, HttpError)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    #[http_error(BAD_REQUEST, "Validation error")]
    Validation(#[from] ValidationErrors),

    #[error("malformed request body: {0}")]
    #[http_error(BAD_REQUEST, "Invalid request body")]
    MalformedBody(String),

    #[error("CV file is required")]
    #[http_error(BAD_REQUEST)]
    AttachmentMissing,

    #[error("File size exceeds 10MB limit")]
    #[http_error(BAD_REQUEST)]
    AttachmentTooLarge,

    #[error("SMTP credentials not configured")]
    #[http_error(INTERNAL_SERVER_ERROR, "Email service not configured")]
    NotConfigured,

    #[error("{form}: {source}")]
    #[http_error(
        INTERNAL_SERVER_ERROR,
        "Email authentication failed. Please contact the site administrator."
    )]
    AuthenticationFailed { form: FormKind, source: MailError },

    #[error("{form}: {source}")]
    #[http_error(
        INTERNAL_SERVER_ERROR,
        "Email could not be composed or was too large to send"
    )]
    MessageRejected { form: FormKind, source: MailError },

    #[error("{form}: {source}")]
    #[http_error(INTERNAL_SERVER_ERROR, "Failed to submit {form}")]
    DeliveryFailed { form: FormKind, source: MailError },
}

impl ApiError {
    /// Pick the variant matching the cause of a mail failure.
    pub fn delivery(form: FormKind, source: MailError) -> Self {
        match source.kind() {
            FailureKind::Authentication => ApiError::AuthenticationFailed { form, source },
            FailureKind::Message => ApiError::MessageRejected { form, source },
            FailureKind::Unknown => ApiError::DeliveryFailed { form, source },
        }
    }
}

/// `{ "error": ..., "details": [...] }`, details only for validation failures.
#[derive(Debug, Serialize)]
pub struct ErrorResponse<'a> {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<&'a ValidationErrors>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.http_code();
        if status.is_server_error() {
            tracing::error!("Error Status {}: {}", status, self);
        } else {
            tracing::warn!("Rejected submission ({}): {}", status, self);
        }

        let details = match &self {
            ApiError::Validation(errors) => Some(errors),
            _ => None,
        };
        let body = Json(ErrorResponse {
            error: self.http_message(),
            details,
        });
        (status, body).into_response()
    }
}
