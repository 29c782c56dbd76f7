//! Axum HTTP surface for Formgate: the webhook endpoint plus health, debug
//! and smoke-test routes.
//!
//! The form service retries webhooks on non-2xx responses, so once a payload
//! passes basic validation the endpoint always answers 200 and reports
//! per-step success flags in the body instead of failing the request.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use formgate_core::{
    Category, CrmOutcome, EducationDetail, ExtractedSubmission, LegalDetail, ProgramTag,
    SectorTag, ServiceTag,
};
use formgate_crm::{CrmClient, CrmConfig, CrmSink};
use formgate_forms::FormProcessor;
use formgate_notify::{LogTransport, Notifier, NotifyConfig};
use serde_json::{json, Value as JsonValue};
use tokio::net::TcpListener;
use tracing::{info, warn};

pub const CRATE_NAME: &str = "formgate-web";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub crm_api_key: String,
    pub admin_email: String,
    pub education_partner_email: String,
    pub legal_partner_email: String,
    pub meeting_link: String,
    pub from_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            crm_api_key: String::new(),
            admin_email: String::new(),
            education_partner_email: String::new(),
            legal_partner_email: String::new(),
            meeting_link: String::new(),
            from_name: "Formgate".to_string(),
        }
    }
}

impl AppConfig {
    /// Environment-derived config. Absent variables fall back to defaults so
    /// the service always starts; missing integrations surface per-request
    /// and on `/config`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: std::env::var("FORMGATE_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            crm_api_key: env_or_default("FORMGATE_CRM_API_KEY", &defaults.crm_api_key),
            admin_email: env_or_default("FORMGATE_ADMIN_EMAIL", &defaults.admin_email),
            education_partner_email: env_or_default(
                "FORMGATE_EDUCATION_PARTNER_EMAIL",
                &defaults.education_partner_email,
            ),
            legal_partner_email: env_or_default(
                "FORMGATE_LEGAL_PARTNER_EMAIL",
                &defaults.legal_partner_email,
            ),
            meeting_link: env_or_default("FORMGATE_MEETING_LINK", &defaults.meeting_link),
            from_name: env_or_default("FORMGATE_FROM_NAME", &defaults.from_name),
        }
    }

    fn notify_config(&self) -> NotifyConfig {
        NotifyConfig {
            from_name: self.from_name.clone(),
            admin_email: self.admin_email.clone(),
            education_partner_email: self.education_partner_email.clone(),
            legal_partner_email: self.legal_partner_email.clone(),
            meeting_link: self.meeting_link.clone(),
        }
    }

    fn crm_config(&self) -> CrmConfig {
        CrmConfig {
            api_key: self.crm_api_key.clone(),
            meeting_link: self.meeting_link.clone(),
            ..CrmConfig::default()
        }
    }
}

fn env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

pub struct AppState {
    pub config: AppConfig,
    pub processor: FormProcessor,
    pub crm: Arc<dyn CrmSink>,
    pub notifier: Arc<Notifier>,
    /// Submission ids already processed in this process. Best-effort only;
    /// reset on restart.
    processed: Mutex<HashSet<String>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let crm = Arc::new(CrmClient::new(config.crm_config())?);
        let notifier = Arc::new(Notifier::new(config.notify_config(), Arc::new(LogTransport)));
        Ok(Self::with_parts(config, crm, notifier))
    }

    pub fn with_parts(config: AppConfig, crm: Arc<dyn CrmSink>, notifier: Arc<Notifier>) -> Self {
        Self {
            config,
            processor: FormProcessor::new(),
            crm,
            notifier,
            processed: Mutex::new(HashSet::new()),
        }
    }

    fn already_processed(&self, submission_id: &str) -> bool {
        !submission_id.is_empty()
            && self
                .processed
                .lock()
                .expect("processed-set poisoned")
                .contains(submission_id)
    }

    fn mark_processed(&self, submission_id: &str) {
        if !submission_id.is_empty() {
            self.processed
                .lock()
                .expect("processed-set poisoned")
                .insert(submission_id.to_string());
        }
    }

    fn processed_count(&self) -> usize {
        self.processed.lock().expect("processed-set poisoned").len()
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/tally", post(tally_handler))
        .route("/debug", post(debug_handler))
        .route("/config", get(config_handler))
        .route("/health/crm", get(crm_health_handler))
        .route("/test/{category}", post(test_category_handler))
        .with_state(Arc::new(state))
}

pub async fn serve_from_env() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let port = config.port;
    let state = AppState::new(config)?;
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "formgate webhook listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

async fn tally_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let Ok(payload) = serde_json::from_slice::<JsonValue>(&body) else {
        warn!("webhook body is not valid JSON");
        return bad_request("Body must be valid JSON");
    };

    let extracted = state.processor.extract_form_data(&payload);
    if extracted.is_empty() {
        warn!("could not extract form data from webhook payload");
        return bad_request("Could not extract form data");
    }

    let category = state.processor.determine_category(&extracted);
    let contact = state.processor.get_contact_info(&extracted);
    info!(
        category = %category,
        submission_id = %extracted.submission_id,
        email = %contact.email,
        "webhook received"
    );

    if contact.email.is_empty() {
        warn!(submission_id = %extracted.submission_id, "submission has no email");
        return bad_request("Email address required");
    }

    // Duplicate check happens before any side effect.
    if state.already_processed(&extracted.submission_id) {
        info!(submission_id = %extracted.submission_id, "duplicate submission ignored");
        return Json(json!({
            "success": true,
            "message": "Duplicate submission ignored",
            "submission_id": extracted.submission_id,
        }))
        .into_response();
    }

    let details = state.processor.get_category_specific_data(&extracted, category);

    let crm_outcome = state
        .crm
        .save_contact(&contact, category, &extracted, &details)
        .await;
    let notification = state
        .notifier
        .send_notification(&contact, category, &extracted, &details, &crm_outcome)
        .await;
    let confirmation = state
        .notifier
        .send_confirmation(&contact, category, &extracted, &details)
        .await;

    state.mark_processed(&extracted.submission_id);
    info!(
        submission_id = %extracted.submission_id,
        crm = crm_outcome.success,
        email = notification.success,
        confirmation = confirmation.success,
        "webhook processed"
    );

    Json(json!({
        "success": true,
        "message": "Webhook processed successfully",
        "submission_id": extracted.submission_id,
        "category": category,
        "results": {
            "crm": crm_outcome.success,
            "email": notification.success,
            "confirmation": confirmation.success,
        },
        "timestamp": Utc::now().to_rfc3339(),
    }))
    .into_response()
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    let config = &state.config;
    Json(json!({
        "status": "OK",
        "service": "Formgate Webhook",
        "services": {
            "crm": !config.crm_api_key.is_empty(),
            "admin_email": !config.admin_email.is_empty(),
            "education_partner": !config.education_partner_email.is_empty(),
            "legal_partner": !config.legal_partner_email.is_empty(),
        },
        "processed_submissions": state.processed_count(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
    .into_response()
}

/// Extraction and classification analysis without side effects.
async fn debug_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let Ok(payload) = serde_json::from_slice::<JsonValue>(&body) else {
        return bad_request("Body must be valid JSON");
    };

    let extracted = state.processor.extract_form_data(&payload);
    let category = state.processor.determine_category(&extracted);
    let contact = state.processor.get_contact_info(&extracted);
    let validation = state.processor.validate_submission(&extracted);

    Json(json!({
        "request_analysis": {
            "payload_keys": payload
                .as_object()
                .map(|o| o.keys().cloned().collect::<Vec<_>>())
                .unwrap_or_default(),
            "has_data_section": payload.get("data").is_some(),
        },
        "form_analysis": {
            "category": category,
            "has_email": !contact.email.is_empty(),
            "has_name": !contact.firstname.is_empty(),
            "contact_valid": contact.valid,
            "validation": validation,
        },
        "extracted": extracted,
        "contact": contact,
        "timestamp": Utc::now().to_rfc3339(),
    }))
    .into_response()
}

/// Which integrations are configured, without echoing any secret.
async fn config_handler(State(state): State<Arc<AppState>>) -> Response {
    let config = &state.config;
    Json(json!({
        "crm_configured": !config.crm_api_key.is_empty(),
        "admin_email_configured": !config.admin_email.is_empty(),
        "education_partner_configured": !config.education_partner_email.is_empty(),
        "legal_partner_configured": !config.legal_partner_email.is_empty(),
        "meeting_link_configured": !config.meeting_link.is_empty(),
        "port": config.port,
    }))
    .into_response()
}

async fn crm_health_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.crm.test_connection().await {
        Ok(()) => Json(json!({
            "service": "crm",
            "status": "OK",
            "timestamp": Utc::now().to_rfc3339(),
        }))
        .into_response(),
        Err(err) => Json(json!({
            "service": "crm",
            "status": "FAILED",
            "error": err.to_string(),
            "timestamp": Utc::now().to_rfc3339(),
        }))
        .into_response(),
    }
}

/// Send a canned notification through a category's email path.
async fn test_category_handler(
    State(state): State<Arc<AppState>>,
    AxumPath(category): AxumPath<String>,
) -> Response {
    let category = match category.as_str() {
        "education" => Category::Education,
        "legal" => Category::Legal,
        "business" => Category::Business,
        other => {
            return bad_request(&format!(
                "Invalid category '{other}'. Available: education, legal, business"
            ));
        }
    };

    let extracted = canned_submission(category);
    let contact = state.processor.get_contact_info(&extracted);
    let details = state.processor.get_category_specific_data(&extracted, category);
    let crm_outcome = CrmOutcome {
        success: true,
        contact_id: Some("test123".to_string()),
        deal_id: None,
        error: None,
    };

    let result = state
        .notifier
        .send_notification(&contact, category, &extracted, &details, &crm_outcome)
        .await;

    Json(json!({
        "status": if result.success { "SUCCESS" } else { "FAILED" },
        "category": category,
        "result": result,
        "timestamp": Utc::now().to_rfc3339(),
    }))
    .into_response()
}

fn canned_submission(category: Category) -> ExtractedSubmission {
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let mut extracted = ExtractedSubmission {
        submission_id: format!("test_{}_{stamp}", category.as_str()),
        submitted_at: Utc::now().to_rfc3339(),
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        phone: "+90 555 123 4567".to_string(),
        ..ExtractedSubmission::default()
    };

    match category {
        Category::Education => {
            extracted.category_flags.education = true;
            extracted.education = EducationDetail {
                gpa: "3.2".to_string(),
                budget: "25000".to_string(),
                notes: String::new(),
                selected_programs: vec![ProgramTag::Master, ProgramTag::LanguageSchool],
            };
        }
        Category::Legal => {
            extracted.category_flags.legal = true;
            extracted.legal = LegalDetail {
                topic: "Üniversite başvurusu için vize gerekli".to_string(),
                notes: String::new(),
                selected_services: vec![ServiceTag::StudentVisa, ServiceTag::TouristVisa],
            };
        }
        Category::Business => {
            extracted.category_flags.commercial = true;
            extracted.business.company_name = "Test Tekstil Ltd".to_string();
            extracted.business.sector_freetext = "Tekstil".to_string();
            extracted.business.selected_sectors = vec![SectorTag::Textile, SectorTag::Footwear];
        }
        Category::General => {}
    }

    extracted
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": message })),
    )
        .into_response()
}
