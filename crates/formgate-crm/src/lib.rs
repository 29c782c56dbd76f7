//! CRM client for Formgate: contact upsert, note attachment and deal creation
//! against a HubSpot-style REST API.
//!
//! The webhook pipeline must answer the form service even when the CRM is
//! down, so `save_contact` never surfaces a transport error: every failure is
//! folded into a `CrmOutcome` with `success: false` and the request carries on.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use formgate_core::{Category, CategoryDetails, ContactInfo, CrmOutcome, ExtractedSubmission};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use thiserror::Error;
use tracing::{error, info, warn};

pub const CRATE_NAME: &str = "formgate-crm";

/// HubSpot association type ids for the objects we create.
const NOTE_TO_CONTACT_ASSOCIATION: u32 = 202;
const DEAL_TO_CONTACT_ASSOCIATION: u32 = 3;

const DEAL_CLOSE_HORIZON_DAYS: i64 = 90;

#[derive(Debug, Clone)]
pub struct CrmConfig {
    pub api_key: String,
    /// API origin, overridable so tests can point at a local server.
    pub base_url: String,
    pub timeout: Duration,
    pub meeting_link: String,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.hubapi.com".to_string(),
            timeout: Duration::from_secs(30),
            meeting_link: String::new(),
        }
    }
}

impl CrmConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("CRM API key not configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {status} for {operation}: {body}")]
    HttpStatus {
        status: u16,
        operation: &'static str,
        body: String,
    },
    #[error("contact not found for update: {email}")]
    ContactNotFound { email: String },
}

/// Sink abstraction the webhook endpoint talks to, so request handling can be
/// tested without a live CRM.
#[async_trait]
pub trait CrmSink: Send + Sync {
    async fn save_contact(
        &self,
        contact: &ContactInfo,
        category: Category,
        extracted: &ExtractedSubmission,
        details: &CategoryDetails,
    ) -> CrmOutcome;

    async fn test_connection(&self) -> Result<(), CrmError>;
}

#[derive(Debug, Clone)]
pub struct CrmClient {
    client: reqwest::Client,
    config: CrmConfig,
}

#[derive(Debug, Deserialize)]
struct ObjectEnvelope {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    results: Vec<ObjectEnvelope>,
}

impl CrmClient {
    pub fn new(config: CrmConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("building CRM http client")?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CrmConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(&self.config.api_key)
    }

    /// Create the contact, falling back to search-and-patch when the CRM
    /// reports the email already exists.
    async fn create_or_update_contact(
        &self,
        properties: &BTreeMap<String, String>,
    ) -> Result<String, CrmError> {
        let response = self
            .authorized(self.client.post(self.url("/crm/v3/objects/contacts")))
            .json(&json!({ "properties": properties }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let envelope: ObjectEnvelope = response.json().await?;
            info!(contact_id = %envelope.id, "contact created");
            return Ok(envelope.id);
        }

        if status == StatusCode::CONFLICT {
            info!("contact exists, updating by email search");
            return self.update_existing_contact(properties).await;
        }

        Err(CrmError::HttpStatus {
            status: status.as_u16(),
            operation: "create contact",
            body: response.text().await.unwrap_or_default(),
        })
    }

    async fn update_existing_contact(
        &self,
        properties: &BTreeMap<String, String>,
    ) -> Result<String, CrmError> {
        let email = properties.get("email").cloned().unwrap_or_default();
        let search_body = json!({
            "filterGroups": [{
                "filters": [{
                    "propertyName": "email",
                    "operator": "EQ",
                    "value": email,
                }]
            }]
        });

        let response = self
            .authorized(self.client.post(self.url("/crm/v3/objects/contacts/search")))
            .json(&search_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrmError::HttpStatus {
                status: status.as_u16(),
                operation: "search contact",
                body: response.text().await.unwrap_or_default(),
            });
        }

        let search: SearchEnvelope = response.json().await?;
        let Some(existing) = search.results.first() else {
            return Err(CrmError::ContactNotFound { email });
        };

        let update_url = self.url(&format!("/crm/v3/objects/contacts/{}", existing.id));
        let response = self
            .authorized(self.client.patch(update_url))
            .json(&json!({ "properties": properties }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrmError::HttpStatus {
                status: status.as_u16(),
                operation: "update contact",
                body: response.text().await.unwrap_or_default(),
            });
        }

        info!(contact_id = %existing.id, "contact updated");
        Ok(existing.id.clone())
    }

    async fn create_contact_note(
        &self,
        contact_id: &str,
        category: Category,
        extracted: &ExtractedSubmission,
        details: &CategoryDetails,
    ) -> Result<String, CrmError> {
        let body = json!({
            "properties": {
                "hs_note_body": build_note_body(category, extracted, details, &self.config.meeting_link),
                "hs_timestamp": Utc::now().to_rfc3339(),
            },
            "associations": [{
                "to": { "id": contact_id },
                "types": [{
                    "associationCategory": "HUBSPOT_DEFINED",
                    "associationTypeId": NOTE_TO_CONTACT_ASSOCIATION,
                }]
            }]
        });

        let response = self
            .authorized(self.client.post(self.url("/crm/v3/objects/notes")))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrmError::HttpStatus {
                status: status.as_u16(),
                operation: "create note",
                body: response.text().await.unwrap_or_default(),
            });
        }

        let envelope: ObjectEnvelope = response.json().await?;
        Ok(envelope.id)
    }

    async fn create_business_deal(
        &self,
        contact_id: &str,
        details: &CategoryDetails,
    ) -> Result<String, CrmError> {
        let company = details
            .as_business()
            .map(|b| b.company_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("Unnamed Company");

        let properties = deal_properties(company);
        let response = self
            .authorized(self.client.post(self.url("/crm/v3/objects/deals")))
            .json(&json!({ "properties": properties }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrmError::HttpStatus {
                status: status.as_u16(),
                operation: "create deal",
                body: response.text().await.unwrap_or_default(),
            });
        }

        let envelope: ObjectEnvelope = response.json().await?;

        let association_url = self.url(&format!(
            "/crm/v3/objects/deals/{}/associations/contacts/{contact_id}/{DEAL_TO_CONTACT_ASSOCIATION}",
            envelope.id
        ));
        let response = self.authorized(self.client.put(association_url)).send().await?;
        if !response.status().is_success() {
            warn!(deal_id = %envelope.id, "deal created but association failed");
        }

        info!(deal_id = %envelope.id, "business deal created");
        Ok(envelope.id)
    }
}

#[async_trait]
impl CrmSink for CrmClient {
    async fn save_contact(
        &self,
        contact: &ContactInfo,
        category: Category,
        extracted: &ExtractedSubmission,
        details: &CategoryDetails,
    ) -> CrmOutcome {
        if !self.config.is_configured() {
            return CrmOutcome::failure(CrmError::NotConfigured.to_string());
        }

        let properties = build_contact_properties(contact, category, details);
        let contact_id = match self.create_or_update_contact(&properties).await {
            Ok(id) => id,
            Err(err) => {
                error!(error = %err, "contact upsert failed");
                return CrmOutcome::failure(err.to_string());
            }
        };

        // The contact is the record that matters; a lost note or deal is
        // logged but does not fail the outcome.
        if let Err(err) = self
            .create_contact_note(&contact_id, category, extracted, details)
            .await
        {
            warn!(error = %err, %contact_id, "note attachment failed");
        }

        let mut deal_id = None;
        if category == Category::Business {
            match self.create_business_deal(&contact_id, details).await {
                Ok(id) => deal_id = Some(id),
                Err(err) => warn!(error = %err, %contact_id, "deal creation failed"),
            }
        }

        CrmOutcome {
            success: true,
            contact_id: Some(contact_id),
            deal_id,
            error: None,
        }
    }

    async fn test_connection(&self) -> Result<(), CrmError> {
        if !self.config.is_configured() {
            return Err(CrmError::NotConfigured);
        }

        let url = self.url(&format!(
            "/oauth/v1/access-tokens/{}",
            self.config.api_key
        ));
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(CrmError::HttpStatus {
                status: status.as_u16(),
                operation: "test connection",
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}

/// Flat lead-property map sent to the CRM. Empty values are dropped so the
/// upsert never blanks out fields set by an earlier submission.
pub fn build_contact_properties(
    contact: &ContactInfo,
    category: Category,
    details: &CategoryDetails,
) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    properties.insert("email".to_string(), contact.email.clone());
    properties.insert("firstname".to_string(), contact.firstname.clone());
    properties.insert("lastname".to_string(), contact.lastname.clone());
    properties.insert("phone".to_string(), contact.phone.clone());
    properties.insert("lifecyclestage".to_string(), "lead".to_string());
    properties.insert("hs_lead_status".to_string(), "NEW".to_string());
    properties.insert("lead_source".to_string(), "Website Form".to_string());
    properties.insert("original_source".to_string(), "Tally Form".to_string());

    match (category, details) {
        (Category::Education, CategoryDetails::Education(education)) => {
            // Numeric GPA/budget go into number properties; unparseable
            // answers keep the raw text under a separate key.
            match education.gpa.parse::<f64>() {
                Ok(gpa) => {
                    properties.insert("gpa".to_string(), gpa.to_string());
                }
                Err(_) => {
                    properties.insert("gpa_text".to_string(), education.gpa.clone());
                }
            }
            match education.budget.parse::<f64>() {
                Ok(budget) => {
                    properties.insert("education_budget".to_string(), budget.to_string());
                }
                Err(_) => {
                    properties.insert("education_budget_text".to_string(), education.budget.clone());
                }
            }
            properties.insert("education_level".to_string(), education.programs_text.clone());
            properties.insert("hs_lead_status".to_string(), "EDUCATION_INQUIRY".to_string());
        }
        (Category::Legal, CategoryDetails::Legal(legal)) => {
            properties.insert("legal_service_type".to_string(), legal.services_text.clone());
            properties.insert("legal_notes".to_string(), legal.topic.clone());
            properties.insert(
                "priority".to_string(),
                legal.urgency_level.as_str().to_uppercase(),
            );
            properties.insert("hs_lead_status".to_string(), "LEGAL_INQUIRY".to_string());
        }
        (Category::Business, CategoryDetails::Business(business)) => {
            properties.insert("company".to_string(), business.company_name.clone());
            properties.insert("industry".to_string(), business.sectors_text.clone());
            properties.insert(
                "business_type".to_string(),
                business.business_type.to_string(),
            );
            properties.insert("hs_lead_status".to_string(), "BUSINESS_INQUIRY".to_string());
            properties.insert("meeting_required".to_string(), "true".to_string());
        }
        _ => {}
    }

    properties.retain(|_, value| !value.trim().is_empty());
    properties
}

pub fn deal_properties(company_name: &str) -> JsonValue {
    json!({
        "dealname": format!("UK Market Entry - {company_name}"),
        "dealstage": "appointmentscheduled",
        "pipeline": "default",
        "amount": "0",
        "closedate": expected_close_date(),
        "deal_source": "Website Form",
        "deal_type": "UK Market Entry",
    })
}

/// Expected close date, 90 days out.
pub fn expected_close_date() -> String {
    (Utc::now() + ChronoDuration::days(DEAL_CLOSE_HORIZON_DAYS))
        .format("%Y-%m-%d")
        .to_string()
}

/// Plain-text note summarizing the submission for the CRM timeline.
pub fn build_note_body(
    category: Category,
    extracted: &ExtractedSubmission,
    details: &CategoryDetails,
    meeting_link: &str,
) -> String {
    let mut body = format!("FORMGATE INTAKE - {}\n", category.as_str().to_uppercase());
    body.push_str(&format!("Submission ID: {}\n", extracted.submission_id));
    body.push_str(&format!("Submitted at: {}\n\n", extracted.submitted_at));

    match details {
        CategoryDetails::Education(education) => {
            if !education.programs.is_empty() {
                body.push_str("Programs of interest:\n");
                for program in &education.programs {
                    body.push_str(&format!("  - {program}\n"));
                }
            }
            if !education.gpa.is_empty() {
                body.push_str(&format!("GPA: {}\n", education.gpa));
            }
            if !education.budget.is_empty() {
                let budget = education
                    .budget_formatted
                    .as_deref()
                    .unwrap_or(&education.budget);
                body.push_str(&format!("Budget: {budget}\n"));
            }
            body.push_str(&format!(
                "Priority: {}\n",
                education.priority_level.as_str().to_uppercase()
            ));
        }
        CategoryDetails::Legal(legal) => {
            if !legal.services.is_empty() {
                body.push_str("Requested services:\n");
                for service in &legal.services {
                    body.push_str(&format!("  - {service}\n"));
                }
            }
            if !legal.topic.is_empty() {
                body.push_str(&format!("Topic: {}\n", legal.topic));
            }
            body.push_str(&format!(
                "Urgency: {}\n",
                legal.urgency_level.as_str().to_uppercase()
            ));
            if legal.urgency_level == formgate_core::PriorityLevel::Urgent {
                body.push_str("URGENT - immediate contact required\n");
            }
        }
        CategoryDetails::Business(business) => {
            if !business.company_name.is_empty() {
                body.push_str(&format!("Company: {}\n", business.company_name));
            }
            if !business.sector_freetext.is_empty() {
                body.push_str(&format!("Main sector: {}\n", business.sector_freetext));
            }
            if !business.sectors.is_empty() {
                body.push_str("Sectors:\n");
                for sector in &business.sectors {
                    body.push_str(&format!("  - {sector}\n"));
                }
            }
            body.push_str(&format!("Business type: {}\n", business.business_type));
            body.push_str("Meeting required: YES\n");
            if !meeting_link.is_empty() {
                body.push_str(&format!("Meeting link: {meeting_link}\n"));
            }
        }
        CategoryDetails::None => {
            body.push_str("General inquiry, no category details\n");
        }
    }

    body.push_str(&format!("\nEmail: {}\n", extracted.email));
    body.push_str(&format!("Phone: {}\n", extracted.phone));
    body.push_str("\nAutomatic webhook record");
    body
}
