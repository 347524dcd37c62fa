//! `POST /submit-consultation`: a JSON request for a service consultation.

use std::fmt;
use std::sync::Arc;

use askama::Template;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::{lines, Acknowledgement, FormKind, MailRouting};
use crate::error::ApiError;
use crate::mail::{Email, MailError};
use crate::relay::Relay;
use crate::validate::{self, Checker, ContactDetails, Rule, ValidationErrors};

pub const VESSEL_TYPE: &str = "vesselType";
pub const SERVICE_CATEGORY: &str = "serviceCategory";
pub const REQUIREMENTS: &str = "requirements";

pub const MIN_REQUIREMENTS_CHARS: usize = 10;

/// The services a consultation can be about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCategory {
    ShipMaintenance,
    MarineEquipment,
    NavigationSystems,
    HullEngineering,
    GeneralConsultation,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 5] = [
        ServiceCategory::ShipMaintenance,
        ServiceCategory::MarineEquipment,
        ServiceCategory::NavigationSystems,
        ServiceCategory::HullEngineering,
        ServiceCategory::GeneralConsultation,
    ];

    /// Wire value sent by the site.
    pub fn slug(self) -> &'static str {
        match self {
            ServiceCategory::ShipMaintenance => "ship-maintenance",
            ServiceCategory::MarineEquipment => "marine-equipment",
            ServiceCategory::NavigationSystems => "navigation-systems",
            ServiceCategory::HullEngineering => "hull-engineering",
            ServiceCategory::GeneralConsultation => "consultation",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ServiceCategory::ShipMaintenance => "Ship Maintenance",
            ServiceCategory::MarineEquipment => "Marine Equipment",
            ServiceCategory::NavigationSystems => "Navigation Systems",
            ServiceCategory::HullEngineering => "Hull Engineering",
            ServiceCategory::GeneralConsultation => "General Consultation",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.slug() == slug)
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Request body as received. Missing keys become field errors, not parse errors.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub vessel_type: Option<String>,
    #[serde(default)]
    pub service_category: Option<String>,
    #[serde(default)]
    pub requirements: Option<String>,
}

/// A consultation request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consultation {
    pub contact: ContactDetails,
    pub vessel_type: String,
    pub service_category: ServiceCategory,
    pub requirements: String,
}

fn vessel_type(value: Option<&str>) -> Rule<String> {
    validate::required(value, "Vessel Type is required").map(str::to_owned)
}

fn service_category(value: Option<&str>) -> Rule<ServiceCategory> {
    let value = validate::required(value, "Service Category is required")?;
    ServiceCategory::from_slug(value).ok_or("Invalid service category")
}

fn requirements(value: Option<&str>) -> Rule<String> {
    let value = validate::required(value, "Requirements is required")?;
    validate::min_chars(
        value,
        MIN_REQUIREMENTS_CHARS,
        "Please provide detailed requirements (at least 10 characters)",
    )
    .map(str::to_owned)
}

impl ConsultationRequest {
    pub fn validate(&self) -> Result<Consultation, ValidationErrors> {
        let mut checker = Checker::new();
        let contact = ContactDetails::check(
            &mut checker,
            self.full_name.as_deref(),
            self.email.as_deref(),
            self.phone.as_deref(),
        );
        let vessel_type = checker.check(VESSEL_TYPE, vessel_type(self.vessel_type.as_deref()));
        let service_category = checker.check(
            SERVICE_CATEGORY,
            service_category(self.service_category.as_deref()),
        );
        let requirements = checker.check(REQUIREMENTS, requirements(self.requirements.as_deref()));

        match (contact, vessel_type, service_category, requirements) {
            (Some(contact), Some(vessel_type), Some(service_category), Some(requirements)) => {
                Ok(Consultation {
                    contact,
                    vessel_type,
                    service_category,
                    requirements,
                })
            }
            _ => Err(checker.into_errors()),
        }
    }
}

#[derive(Template)]
#[template(path = "consultation.html")]
struct ConsultationHtml<'a> {
    full_name: &'a str,
    email: &'a str,
    phone: &'a str,
    vessel_type: &'a str,
    service_category: &'a str,
    requirement_lines: Vec<&'a str>,
}

#[derive(Template)]
#[template(path = "consultation.txt")]
struct ConsultationText<'a> {
    full_name: &'a str,
    email: &'a str,
    phone: &'a str,
    vessel_type: &'a str,
    service_category: &'a str,
    requirements: &'a str,
}

impl Consultation {
    pub fn subject(&self) -> String {
        format!("New Consultation Request from {}", self.contact.full_name)
    }

    /// The message sent to the consultation inbox, replying to the submitter.
    pub fn compose(&self, routing: &MailRouting) -> Result<Email, MailError> {
        let html = ConsultationHtml {
            full_name: &self.contact.full_name,
            email: &self.contact.email,
            phone: &self.contact.phone,
            vessel_type: &self.vessel_type,
            service_category: self.service_category.label(),
            requirement_lines: lines(&self.requirements),
        }
        .render()
        .map_err(|e| MailError::Build(e.to_string()))?;

        let text = ConsultationText {
            full_name: &self.contact.full_name,
            email: &self.contact.email,
            phone: &self.contact.phone,
            vessel_type: &self.vessel_type,
            service_category: self.service_category.label(),
            requirements: &self.requirements,
        }
        .render()
        .map_err(|e| MailError::Build(e.to_string()))?;

        Email::builder()
            .from(&routing.from)
            .to(&routing.consultation)
            .reply_to(&self.contact.email)
            .subject(self.subject())
            .text(text)
            .html(html)
            .build()
    }
}

pub async fn submit(
    State(relay): State<Relay>,
    State(routing): State<Arc<MailRouting>>,
    payload: Result<Json<ConsultationRequest>, JsonRejection>,
) -> Result<Json<Acknowledgement>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::MalformedBody(e.body_text()))?;
    let consultation = request.validate()?;

    tracing::info!(
        service = consultation.service_category.slug(),
        "consultation request from {}",
        consultation.contact.email
    );

    let email = consultation
        .compose(&routing)
        .map_err(|e| ApiError::delivery(FormKind::Consultation, e))?;
    super::relay(&relay, FormKind::Consultation, &email).await
}
