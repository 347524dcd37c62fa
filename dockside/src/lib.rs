//! Relay for a marine-services website: two public forms in, one email each out.
//!
//! `POST /submit-consultation` takes a JSON consultation request and
//! `POST /submit-application` a multipart career application with a CV.
//! Each is validated, rendered into an HTML and plain-text email, and handed
//! to an SMTP server.

pub use dockside_macros::HttpError;

pub mod config;
pub mod error;
pub mod forms;
pub mod mail;
pub mod relay;
mod routes;
mod serve;
pub mod validate;

pub use crate::config::{AppConfig, EnvConfig, Mode};
pub use crate::error::ApiError;
pub use crate::relay::{Relay, RelayOutcome};
pub use crate::routes::{router, AppState};
pub use crate::serve::{serve, shutdown_signal};
