use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dockside::forms::application::MAX_ATTACHMENT_BYTES;
use dockside::forms::MailRouting;
use dockside::mail::{Email, MailError, Mailer};
use dockside::{router, AppState, Mode, Relay};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
}

impl RecordingMailer {
    fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

struct FailingMailer(fn() -> MailError);

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: &Email) -> Result<(), MailError> {
        Err((self.0)())
    }
}

fn routing() -> MailRouting {
    MailRouting {
        from: "noreply@example.com".into(),
        consultation: "info@example.com".into(),
        careers: "careers@example.com".into(),
    }
}

async fn spawn(relay: Relay) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(AppState::new(relay, routing()));
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

async fn spawn_recording() -> (String, Arc<RecordingMailer>) {
    let mailer = Arc::new(RecordingMailer::default());
    let relay = Relay::new(Some(mailer.clone() as Arc<dyn Mailer>), Mode::Production);
    (spawn(relay).await, mailer)
}

fn jane() -> Value {
    json!({
        "fullName": "Jane Doe",
        "email": "jane@example.com",
        "phone": "1234567890",
        "vesselType": "Tanker",
        "serviceCategory": "hull-engineering",
        "requirements": "Need hull inspection"
    })
}

async fn post_json(base: &str, body: &Value) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(format!("{base}/submit-consultation"))
        .json(body)
        .send()
        .await
        .unwrap();
    (response.status(), response.json().await.unwrap())
}

fn application_form(cv: Option<Part>) -> Form {
    let form = Form::new()
        .text("fullName", "Sam Carter")
        .text("email", "sam@example.com")
        .text("phone", "0123456789");
    match cv {
        Some(part) => form.part("cv", part),
        None => form,
    }
}

fn pdf(name: &str, len: usize) -> Part {
    Part::bytes(vec![b'%'; len])
        .file_name(name.to_owned())
        .mime_str("application/pdf")
        .unwrap()
}

async fn post_form(base: &str, form: Form) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(format!("{base}/submit-application"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    (response.status(), response.json().await.unwrap())
}

#[tokio::test]
async fn health_check() {
    let (base, _) = spawn_recording().await;
    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"ok": true}));
}

#[tokio::test]
async fn consultation_is_relayed() {
    let (base, mailer) = spawn_recording().await;

    let (status, body) = post_json(&base, &jane()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"message": "Consultation request submitted successfully"})
    );

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["info@example.com"]);
    assert_eq!(sent[0].reply_to.as_deref(), Some("jane@example.com"));
    assert_eq!(sent[0].subject, "New Consultation Request from Jane Doe");
    assert!(sent[0].body.html().contains("Hull Engineering"));
}

#[tokio::test]
async fn invalid_email_is_reported() {
    let (base, mailer) = spawn_recording().await;
    let mut request = jane();
    request["email"] = json!("not-an-email");

    let (status, body) = post_json(&base, &request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "error": "Validation error",
            "details": [{"field": "email", "message": "Invalid email address"}]
        })
    );
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn empty_consultation_lists_every_field() {
    let (base, _) = spawn_recording().await;

    let (status, body) = post_json(&base, &json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(
        fields,
        vec![
            "fullName",
            "email",
            "phone",
            "vesselType",
            "serviceCategory",
            "requirements"
        ]
    );
}

#[tokio::test]
async fn phone_needs_ten_characters() {
    let (base, _) = spawn_recording().await;

    let mut request = jane();
    request["phone"] = json!("123456789");
    let (status, body) = post_json(&base, &request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["details"],
        json!([{"field": "phone", "message": "Phone number must be at least 10 digits"}])
    );

    request["phone"] = json!("+1 555 010");
    let (status, _) = post_json(&base, &request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let (base, _) = spawn_recording().await;
    let response = reqwest::Client::new()
        .post(format!("{base}/submit-consultation"))
        .header("content-type", "application/json")
        .body("{\"fullName\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid request body");
}

#[tokio::test]
async fn wrong_method_is_not_allowed() {
    let (base, _) = spawn_recording().await;
    let response = reqwest::get(format!("{base}/submit-consultation"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn unconfigured_production_refuses() {
    let base = spawn(Relay::new(None, Mode::Production)).await;
    let (status, body) = post_json(&base, &jane()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Email service not configured"}));
}

#[tokio::test]
async fn unconfigured_development_acknowledges() {
    let base = spawn(Relay::new(None, Mode::Development)).await;

    let (status, body) = post_json(&base, &jane()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"message": "Consultation request received (email not configured)"})
    );

    let (status, body) = post_form(&base, application_form(Some(pdf("cv.pdf", 64)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"message": "Application received (email not configured)"})
    );
}

#[tokio::test]
async fn authentication_failure_has_its_own_message() {
    let mailer = FailingMailer(|| MailError::Authentication("535 5.7.8 bad credentials".into()));
    let base = spawn(Relay::new(
        Some(Arc::new(mailer) as Arc<dyn Mailer>),
        Mode::Production,
    ))
    .await;

    let (status, body) = post_json(&base, &jane()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": "Email authentication failed. Please contact the site administrator."})
    );
}

#[tokio::test]
async fn other_failures_name_the_form() {
    let mailer = FailingMailer(|| MailError::Smtp("connection refused".into()));
    let base = spawn(Relay::new(
        Some(Arc::new(mailer) as Arc<dyn Mailer>),
        Mode::Production,
    ))
    .await;

    let (status, body) = post_json(&base, &jane()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to submit consultation request"}));

    let (status, body) = post_form(&base, application_form(Some(pdf("cv.pdf", 64)))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to submit application"}));
}

#[tokio::test]
async fn application_is_relayed_with_cv() {
    let (base, mailer) = spawn_recording().await;

    let (status, body) = post_form(
        &base,
        application_form(Some(pdf("my cv (2024).pdf", 2048))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Application submitted successfully"}));

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    let email = &sent[0];
    assert_eq!(email.to, vec!["careers@example.com"]);
    assert_eq!(email.reply_to.as_deref(), Some("sam@example.com"));
    assert_eq!(email.subject, "New Career Application from Sam Carter");
    assert_eq!(email.attachments.len(), 1);
    assert_eq!(email.attachments[0].filename, "my_cv__2024_.pdf");
    assert_eq!(email.attachments[0].content_type, "application/pdf");
    assert_eq!(email.attachments[0].data.len(), 2048);
}

#[tokio::test]
async fn application_without_cv_is_rejected() {
    let (base, mailer) = spawn_recording().await;
    let (status, body) = post_form(&base, application_form(None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "CV file is required"}));
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn cv_size_limit_is_inclusive() {
    let (base, mailer) = spawn_recording().await;

    let (status, _) = post_form(
        &base,
        application_form(Some(pdf("cv.pdf", MAX_ATTACHMENT_BYTES))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_form(
        &base,
        application_form(Some(pdf("cv.pdf", MAX_ATTACHMENT_BYTES + 1))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "File size exceeds 10MB limit"}));

    assert_eq!(mailer.sent().len(), 1);
}

#[tokio::test]
async fn application_fields_are_validated() {
    let (base, _) = spawn_recording().await;
    let form = Form::new()
        .text("fullName", "")
        .text("email", "sam@")
        .text("phone", "12345")
        .part("cv", pdf("cv.pdf", 16));

    let (status, body) = post_form(&base, form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation error");
    assert_eq!(
        body["details"],
        json!([
            {"field": "fullName", "message": "Full Name is required"},
            {"field": "email", "message": "Invalid email address"},
            {"field": "phone", "message": "Phone number must be at least 10 digits"}
        ])
    );
}
