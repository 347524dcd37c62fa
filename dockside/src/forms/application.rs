//! `POST /submit-application`: a career application with a CV upload.

use std::sync::Arc;

use askama::Template;
use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::Json;
use http::StatusCode;

use super::{Acknowledgement, FormKind, MailRouting};
use crate::error::ApiError;
use crate::mail::{Attachment, Email, MailError};
use crate::relay::Relay;
use crate::validate::{sanitize_filename, Checker, ContactDetails};

/// Largest accepted CV, inclusive.
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Request body limit for the route: the CV plus room for the other parts.
pub const BODY_LIMIT_BYTES: usize = MAX_ATTACHMENT_BYTES + 1024 * 1024;

/// Used when the client declares no media type for the CV.
pub const DEFAULT_CONTENT_TYPE: &str = "application/pdf";

const FALLBACK_FILENAME: &str = "cv";

/// A file part as received.
#[derive(Clone, Default)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
    /// Bytes seen on the wire. Above the limit, `data` stops growing but this keeps counting.
    pub size: usize,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content_type: Option<&str>, data: Vec<u8>) -> Self {
        let size = data.len();
        Self {
            filename: filename.into(),
            content_type: content_type.map(str::to_owned),
            data,
            size,
        }
    }

    /// What browsers send for a file input left empty.
    fn is_blank(&self) -> bool {
        self.filename.is_empty() && self.size == 0
    }
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .finish()
    }
}

/// Multipart parts as received.
#[derive(Debug, Default)]
pub struct ApplicationRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub cv: Option<UploadedFile>,
}

/// An application that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub contact: ContactDetails,
    /// Sanitized filename and declared (or default) media type.
    pub cv: Attachment,
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::AttachmentTooLarge
    } else {
        ApiError::MalformedBody(err.body_text())
    }
}

/// Read a file part, keeping at most one byte past the limit in memory.
///
/// An oversized part is still drained so the client gets to read the response.
async fn read_file(mut field: Field<'_>) -> Result<UploadedFile, ApiError> {
    let mut file = UploadedFile {
        filename: field.file_name().unwrap_or_default().to_owned(),
        content_type: field.content_type().map(str::to_owned),
        ..UploadedFile::default()
    };

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        file.size += chunk.len();
        if file.size <= MAX_ATTACHMENT_BYTES {
            file.data.extend_from_slice(&chunk);
        } else if !file.data.is_empty() {
            file.data = Vec::new();
        }
    }

    Ok(file)
}

impl ApplicationRequest {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut request = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("fullName") => {
                    request.full_name = Some(field.text().await.map_err(multipart_error)?)
                }
                Some("email") => request.email = Some(field.text().await.map_err(multipart_error)?),
                Some("phone") => request.phone = Some(field.text().await.map_err(multipart_error)?),
                Some("cv") => request.cv = Some(read_file(field).await?),
                _ => {}
            }
        }

        Ok(request)
    }

    /// Attachment presence and size are checked before the text fields.
    pub fn validate(self) -> Result<Application, ApiError> {
        let cv = self
            .cv
            .filter(|cv| !cv.is_blank())
            .ok_or(ApiError::AttachmentMissing)?;

        if cv.size > MAX_ATTACHMENT_BYTES {
            return Err(ApiError::AttachmentTooLarge);
        }

        let mut checker = Checker::new();
        let contact = ContactDetails::check(
            &mut checker,
            self.full_name.as_deref(),
            self.email.as_deref(),
            self.phone.as_deref(),
        )
        .ok_or_else(|| ApiError::Validation(checker.into_errors()))?;

        let filename = match sanitize_filename(&cv.filename) {
            name if name.is_empty() => FALLBACK_FILENAME.to_owned(),
            name => name,
        };
        let content_type = cv
            .content_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned());

        Ok(Application {
            contact,
            cv: Attachment {
                filename,
                content_type,
                data: cv.data,
            },
        })
    }
}

#[derive(Template)]
#[template(path = "application.html")]
struct ApplicationHtml<'a> {
    full_name: &'a str,
    email: &'a str,
    phone: &'a str,
    cv_name: &'a str,
    cv_size_mb: String,
}

#[derive(Template)]
#[template(path = "application.txt")]
struct ApplicationText<'a> {
    full_name: &'a str,
    email: &'a str,
    phone: &'a str,
    cv_name: &'a str,
    cv_size_mb: String,
}

impl Application {
    pub fn subject(&self) -> String {
        format!("New Career Application from {}", self.contact.full_name)
    }

    /// The message sent to the careers inbox with the CV attached.
    pub fn compose(&self, routing: &MailRouting) -> Result<Email, MailError> {
        let cv_size_mb = format!("{:.2}", self.cv.size_mb());

        let html = ApplicationHtml {
            full_name: &self.contact.full_name,
            email: &self.contact.email,
            phone: &self.contact.phone,
            cv_name: &self.cv.filename,
            cv_size_mb: cv_size_mb.clone(),
        }
        .render()
        .map_err(|e| MailError::Build(e.to_string()))?;

        let text = ApplicationText {
            full_name: &self.contact.full_name,
            email: &self.contact.email,
            phone: &self.contact.phone,
            cv_name: &self.cv.filename,
            cv_size_mb,
        }
        .render()
        .map_err(|e| MailError::Build(e.to_string()))?;

        Email::builder()
            .from(&routing.from)
            .to(&routing.careers)
            .reply_to(&self.contact.email)
            .subject(self.subject())
            .text(text)
            .html(html)
            .attach(self.cv.clone())
            .build()
    }
}

pub async fn submit(
    State(relay): State<Relay>,
    State(routing): State<Arc<MailRouting>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Acknowledgement>, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::MalformedBody(e.body_text()))?;
    let application = ApplicationRequest::from_multipart(multipart)
        .await?
        .validate()?;

    tracing::info!(
        cv = %application.cv.filename,
        bytes = application.cv.data.len(),
        "career application from {}",
        application.contact.email
    );

    let email = application
        .compose(&routing)
        .map_err(|e| ApiError::delivery(FormKind::Application, e))?;
    super::relay(&relay, FormKind::Application, &email).await
}
