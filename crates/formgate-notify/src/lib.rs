//! Notification dispatch for Formgate: category recipient routing, Askama
//! HTML email bodies and a sent-email duplicate cache.
//!
//! Actual wire delivery happens behind the `MailTransport` trait. The form
//! service retries webhooks aggressively, so the cache suppresses re-sends of
//! an identical message within the process lifetime.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use askama::Template;
use async_trait::async_trait;
use formgate_core::{
    Category, CategoryDetails, ContactInfo, CrmOutcome, DeliveryOutcome, ExtractedSubmission,
    PriorityLevel,
};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

pub const CRATE_NAME: &str = "formgate-notify";

const URGENT_RESPONSE_HOURS: u32 = 4;
const NORMAL_RESPONSE_HOURS: u32 = 24;

#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Sender display name, also shown as the brand in email bodies.
    pub from_name: String,
    pub admin_email: String,
    pub education_partner_email: String,
    pub legal_partner_email: String,
    pub meeting_link: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            from_name: "Formgate".to_string(),
            admin_email: String::new(),
            education_partner_email: String::new(),
            legal_partner_email: String::new(),
            meeting_link: String::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
    #[error("no recipients configured")]
    NoRecipients,
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// One rendered email, ready for a transport to put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub recipients: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub submission_id: String,
}

/// Wire-delivery boundary. The SMTP client lives outside this service; the
/// default transport only logs what would have been sent.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, email: &OutboundEmail) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn deliver(&self, email: &OutboundEmail) -> Result<(), NotifyError> {
        info!(
            recipients = email.recipients.len(),
            subject = %email.subject,
            submission_id = %email.submission_id,
            "outbound email (log transport)"
        );
        Ok(())
    }
}

#[derive(Template)]
#[template(path = "notification.html")]
struct NotificationTemplate {
    brand: String,
    accent_color: String,
    category_name: String,
    fullname: String,
    email: String,
    phone: String,
    submitted_at: String,
    submission_id: String,
    urgency_banner: String,
    detail_rows: Vec<DetailRow>,
    list_title: String,
    list_items: Vec<String>,
    partner_note: String,
    meeting_link: String,
    crm_line: String,
}

struct DetailRow {
    label: String,
    value: String,
}

#[derive(Template)]
#[template(path = "confirmation_education.html")]
struct EducationConfirmationTemplate {
    brand: String,
    firstname: String,
    response_hours: u32,
    programs_text: String,
}

#[derive(Template)]
#[template(path = "confirmation_legal.html")]
struct LegalConfirmationTemplate {
    brand: String,
    firstname: String,
    response_hours: u32,
    urgent: bool,
    services_text: String,
}

#[derive(Template)]
#[template(path = "confirmation_business.html")]
struct BusinessConfirmationTemplate {
    brand: String,
    firstname: String,
    response_hours: u32,
    company_name: String,
    meeting_link: String,
}

#[derive(Template)]
#[template(path = "confirmation_general.html")]
struct GeneralConfirmationTemplate {
    brand: String,
    firstname: String,
    response_hours: u32,
}

pub struct Notifier {
    config: NotifyConfig,
    transport: Arc<dyn MailTransport>,
    sent: Mutex<HashSet<String>>,
}

impl Notifier {
    pub fn new(config: NotifyConfig, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            config,
            transport,
            sent: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }

    /// Internal-notification recipients per category. Admin always gets a
    /// copy; education and legal each add their partner; business stays
    /// admin-only.
    pub fn recipients(&self, category: Category) -> Vec<String> {
        let mut recipients = Vec::new();
        if !self.config.admin_email.is_empty() {
            recipients.push(self.config.admin_email.clone());
        }
        match category {
            Category::Education if !self.config.education_partner_email.is_empty() => {
                recipients.push(self.config.education_partner_email.clone());
            }
            Category::Legal if !self.config.legal_partner_email.is_empty() => {
                recipients.push(self.config.legal_partner_email.clone());
            }
            _ => {}
        }
        recipients
    }

    /// Send the internal notification for one processed submission.
    pub async fn send_notification(
        &self,
        contact: &ContactInfo,
        category: Category,
        extracted: &ExtractedSubmission,
        details: &CategoryDetails,
        crm: &CrmOutcome,
    ) -> DeliveryOutcome {
        let recipients = self.recipients(category);
        let subject = notification_subject(contact, details);
        let template = self.build_notification(contact, category, extracted, details, crm);
        let body = match template.render() {
            Ok(body) => body,
            Err(err) => return DeliveryOutcome::failure(NotifyError::from(err).to_string()),
        };
        self.dispatch(recipients, subject, body, &extracted.submission_id)
            .await
    }

    /// Send the applicant-facing confirmation email.
    pub async fn send_confirmation(
        &self,
        contact: &ContactInfo,
        category: Category,
        extracted: &ExtractedSubmission,
        details: &CategoryDetails,
    ) -> DeliveryOutcome {
        if contact.email.is_empty() {
            return DeliveryOutcome::failure("applicant email missing");
        }

        let subject = format!("Başvurunuz Alındı - {}", self.config.from_name);
        let hours = response_hours(category, details);
        let brand = self.config.from_name.clone();
        let firstname = if contact.firstname.is_empty() {
            "Değerli Başvuru Sahibi".to_string()
        } else {
            contact.firstname.clone()
        };

        let rendered = match (category, details) {
            (Category::Education, CategoryDetails::Education(education)) => {
                EducationConfirmationTemplate {
                    brand,
                    firstname,
                    response_hours: hours,
                    programs_text: education.programs_text.clone(),
                }
                .render()
            }
            (Category::Legal, CategoryDetails::Legal(legal)) => LegalConfirmationTemplate {
                brand,
                firstname,
                response_hours: hours,
                urgent: legal.urgency_level == PriorityLevel::Urgent,
                services_text: legal.services_text.clone(),
            }
            .render(),
            (Category::Business, CategoryDetails::Business(business)) => {
                BusinessConfirmationTemplate {
                    brand,
                    firstname,
                    response_hours: hours,
                    company_name: business.company_name.clone(),
                    meeting_link: self.config.meeting_link.clone(),
                }
                .render()
            }
            _ => GeneralConfirmationTemplate {
                brand,
                firstname,
                response_hours: hours,
            }
            .render(),
        };

        let body = match rendered {
            Ok(body) => body,
            Err(err) => return DeliveryOutcome::failure(NotifyError::from(err).to_string()),
        };

        self.dispatch(
            vec![contact.email.clone()],
            subject,
            body,
            &extracted.submission_id,
        )
        .await
    }

    async fn dispatch(
        &self,
        recipients: Vec<String>,
        subject: String,
        html_body: String,
        submission_id: &str,
    ) -> DeliveryOutcome {
        if recipients.is_empty() {
            return DeliveryOutcome::failure(NotifyError::NoRecipients.to_string());
        }

        let cache_key = email_cache_key(submission_id, &subject, &recipients);
        {
            let sent = self.sent.lock().expect("sent-email cache poisoned");
            if sent.contains(&cache_key) {
                info!(%subject, submission_id, "duplicate email suppressed");
                return DeliveryOutcome {
                    success: true,
                    recipients: recipients.len(),
                    error: None,
                };
            }
        }

        let email = OutboundEmail {
            recipients,
            subject,
            html_body,
            submission_id: submission_id.to_string(),
        };

        match self.transport.deliver(&email).await {
            Ok(()) => {
                self.sent
                    .lock()
                    .expect("sent-email cache poisoned")
                    .insert(cache_key);
                DeliveryOutcome {
                    success: true,
                    recipients: email.recipients.len(),
                    error: None,
                }
            }
            Err(err) => {
                warn!(error = %err, submission_id, "email delivery failed");
                DeliveryOutcome::failure(err.to_string())
            }
        }
    }

    fn build_notification(
        &self,
        contact: &ContactInfo,
        category: Category,
        extracted: &ExtractedSubmission,
        details: &CategoryDetails,
        crm: &CrmOutcome,
    ) -> NotificationTemplate {
        let mut template = NotificationTemplate {
            brand: self.config.from_name.clone(),
            accent_color: category_accent(category).to_string(),
            category_name: category_display_name(category).to_string(),
            fullname: fallback(&contact.fullname, "Belirtilmemiş"),
            email: fallback(&contact.email, "Belirtilmemiş"),
            phone: fallback(&contact.phone, "Belirtilmemiş"),
            submitted_at: fallback(&extracted.submitted_at, "Belirtilmemiş"),
            submission_id: extracted.submission_id.clone(),
            urgency_banner: String::new(),
            detail_rows: Vec::new(),
            list_title: String::new(),
            list_items: Vec::new(),
            partner_note: String::new(),
            meeting_link: String::new(),
            crm_line: crm_line(crm),
        };

        match details {
            CategoryDetails::Education(education) => {
                if education.priority_level == PriorityLevel::Urgent {
                    template.urgency_banner = "ACİL - Hemen İletişim Gerekli".to_string();
                }
                if !education.gpa.is_empty() {
                    template.push_row("Not Ortalaması", &education.gpa);
                }
                if !education.budget.is_empty() {
                    let budget = education
                        .budget_formatted
                        .as_deref()
                        .unwrap_or(&education.budget);
                    template.push_row("Bütçe (Eğitim + Konaklama)", budget);
                }
                template.push_row(
                    "Öncelik",
                    &education.priority_level.as_str().to_uppercase(),
                );
                template.list_title = "Seçilen Programlar".to_string();
                template.list_items = education.programs.clone();
                if !self.config.education_partner_email.is_empty() {
                    template.partner_note = format!(
                        "Bu başvuru eğitim partnerimize de gönderilmiştir: {}. \
                         Koordinasyon için lütfen partnerimizle iletişime geçin.",
                        self.config.education_partner_email
                    );
                }
            }
            CategoryDetails::Legal(legal) => {
                if legal.urgency_level == PriorityLevel::Urgent {
                    template.urgency_banner = "ACİL - Hemen İletişim Gerekli".to_string();
                }
                if !legal.topic.is_empty() {
                    template.push_row("Ek Açıklama", &legal.topic);
                }
                template.push_row("Aciliyet", &legal.urgency_level.as_str().to_uppercase());
                template.list_title = "Talep Edilen Hizmetler".to_string();
                template.list_items = legal.services.clone();
                if !self.config.legal_partner_email.is_empty() {
                    template.partner_note = format!(
                        "Bu başvuru hukuk partnerimize de gönderilmiştir: {}. \
                         Koordinasyon için lütfen partnerimizle iletişime geçin.",
                        self.config.legal_partner_email
                    );
                }
            }
            CategoryDetails::Business(business) => {
                if !business.company_name.is_empty() {
                    template.push_row("Şirket Adı", &business.company_name);
                }
                if !business.sector_freetext.is_empty() {
                    template.push_row("Genel Sektör", &business.sector_freetext);
                }
                template.push_row("İş Tipi", business.business_type.as_str());
                template.push_row("Toplantı Gerekli", "EVET");
                template.list_title = "Faaliyet Alanları".to_string();
                template.list_items = business.sectors.clone();
                template.meeting_link = self.config.meeting_link.clone();
            }
            CategoryDetails::None => {
                if !extracted.notes.is_empty() {
                    template.push_row("Notlar", &extracted.notes);
                }
            }
        }

        template
    }
}

impl NotificationTemplate {
    fn push_row(&mut self, label: &str, value: &str) {
        self.detail_rows.push(DetailRow {
            label: label.to_string(),
            value: value.to_string(),
        });
    }
}

fn fallback(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

fn crm_line(crm: &CrmOutcome) -> String {
    if crm.success {
        match &crm.contact_id {
            Some(id) => format!("CRM: contact kaydedildi (ID: {id})"),
            None => "CRM: contact kaydedildi".to_string(),
        }
    } else {
        format!(
            "CRM: kayıt başarısız ({})",
            crm.error.as_deref().unwrap_or("bilinmeyen hata")
        )
    }
}

fn category_accent(category: Category) -> &'static str {
    match category {
        Category::Education => "#10b981",
        Category::Legal => "#ef4444",
        Category::Business => "#f59e0b",
        Category::General => "#667eea",
    }
}

fn category_display_name(category: Category) -> &'static str {
    match category {
        Category::Education => "Eğitim Danışmanlığı",
        Category::Legal => "Hukuk Danışmanlığı",
        Category::Business => "Ticari Danışmanlık",
        Category::General => "Genel Danışmanlık",
    }
}

/// Internal-notification subject line, with urgency prefixes for cases that
/// must jump the inbox.
pub fn notification_subject(contact: &ContactInfo, details: &CategoryDetails) -> String {
    let fullname = if contact.fullname.is_empty() {
        "İsimsiz"
    } else {
        &contact.fullname
    };

    match details {
        CategoryDetails::Education(education) => {
            let main_program = education
                .programs
                .first()
                .map(String::as_str)
                .unwrap_or("Genel Eğitim");
            let subject = format!("Yeni Eğitim Başvurusu - {main_program} - {fullname}");
            if education.priority_level == PriorityLevel::Urgent {
                format!("ACİL - {subject}")
            } else {
                subject
            }
        }
        CategoryDetails::Legal(legal) => {
            let main_service = legal
                .services
                .first()
                .map(String::as_str)
                .unwrap_or("Genel Hukuki");
            let subject = format!("Yeni Hukuk Başvurusu - {main_service} - {fullname}");
            if legal.urgency_level == PriorityLevel::Urgent {
                format!("ACİL HUKUK - {subject}")
            } else {
                subject
            }
        }
        CategoryDetails::Business(business) => {
            let company = if business.company_name.is_empty() {
                "Şirket İsmi Belirtilmemiş"
            } else {
                &business.company_name
            };
            format!("Yeni Ticari Danışmanlık - {company} - {fullname}")
        }
        CategoryDetails::None => format!("Yeni Danışmanlık Başvurusu - {fullname}"),
    }
}

/// Committed first-response window in hours: urgent legal cases get the
/// 4-hour track, everything else 24 hours.
pub fn response_hours(category: Category, details: &CategoryDetails) -> u32 {
    match (category, details) {
        (Category::Legal, CategoryDetails::Legal(legal))
            if legal.urgency_level == PriorityLevel::Urgent =>
        {
            URGENT_RESPONSE_HOURS
        }
        _ => NORMAL_RESPONSE_HOURS,
    }
}

/// Cache key over everything that identifies one logical send.
pub fn email_cache_key(submission_id: &str, subject: &str, recipients: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(submission_id.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(subject.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(recipients.join(",").as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use formgate_core::{EducationSummary, LegalSummary, ServiceTag};
    use tokio::sync::Mutex as AsyncMutex;

    struct RecordingTransport {
        delivered: AsyncMutex<Vec<OutboundEmail>>,
    }

    impl RecordingTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                delivered: AsyncMutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn deliver(&self, email: &OutboundEmail) -> Result<(), NotifyError> {
            self.delivered.lock().await.push(email.clone());
            Ok(())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl MailTransport for FailingTransport {
        async fn deliver(&self, _email: &OutboundEmail) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery("smtp refused".into()))
        }
    }

    fn config() -> NotifyConfig {
        NotifyConfig {
            from_name: "Formgate".into(),
            admin_email: "admin@example.com".into(),
            education_partner_email: "edu-partner@example.com".into(),
            legal_partner_email: "legal-partner@example.com".into(),
            meeting_link: "https://cal.example.com/uk-entry".into(),
        }
    }

    fn contact() -> ContactInfo {
        ContactInfo {
            firstname: "Ahmet".into(),
            lastname: "Yılmaz".into(),
            fullname: "Ahmet Yılmaz".into(),
            email: "ahmet@example.com".into(),
            phone: "+90 555".into(),
            valid: true,
        }
    }

    fn urgent_legal_details() -> CategoryDetails {
        CategoryDetails::Legal(LegalSummary {
            services: vec!["Vize Red İtiraz (Appeal)".into()],
            services_text: "Vize Red İtiraz (Appeal)".into(),
            topic: "red kararı".into(),
            notes: String::new(),
            urgency_level: PriorityLevel::Urgent,
            selected_services: vec![ServiceTag::VisaRefusalAppeal],
        })
    }

    fn education_details(priority: PriorityLevel) -> CategoryDetails {
        CategoryDetails::Education(EducationSummary {
            programs: vec!["Yaz Kampı (12-18 yaş)".into()],
            programs_text: "Yaz Kampı (12-18 yaş)".into(),
            gpa: "3.0".into(),
            budget: String::new(),
            budget_formatted: None,
            notes: String::new(),
            priority_level: priority,
        })
    }

    #[test]
    fn recipients_route_per_category() {
        let notifier = Notifier::new(config(), Arc::new(LogTransport));
        assert_eq!(
            notifier.recipients(Category::Education),
            vec!["admin@example.com", "edu-partner@example.com"]
        );
        assert_eq!(
            notifier.recipients(Category::Legal),
            vec!["admin@example.com", "legal-partner@example.com"]
        );
        assert_eq!(
            notifier.recipients(Category::Business),
            vec!["admin@example.com"]
        );
        assert_eq!(
            notifier.recipients(Category::General),
            vec!["admin@example.com"]
        );
    }

    #[test]
    fn unset_partner_falls_back_to_admin_only() {
        let mut cfg = config();
        cfg.education_partner_email.clear();
        let notifier = Notifier::new(cfg, Arc::new(LogTransport));
        assert_eq!(
            notifier.recipients(Category::Education),
            vec!["admin@example.com"]
        );
    }

    #[test]
    fn urgent_legal_subject_is_prefixed() {
        let subject = notification_subject(&contact(), &urgent_legal_details());
        assert!(subject.starts_with("ACİL HUKUK - "));
        assert!(subject.contains("Vize Red İtiraz (Appeal)"));
        assert!(subject.contains("Ahmet Yılmaz"));
    }

    #[test]
    fn urgent_education_subject_is_prefixed() {
        let subject =
            notification_subject(&contact(), &education_details(PriorityLevel::Urgent));
        assert!(subject.starts_with("ACİL - "));

        let calm = notification_subject(&contact(), &education_details(PriorityLevel::Medium));
        assert!(!calm.starts_with("ACİL"));
    }

    #[test]
    fn urgent_legal_gets_four_hour_commitment() {
        assert_eq!(
            response_hours(Category::Legal, &urgent_legal_details()),
            4
        );
        assert_eq!(
            response_hours(Category::Education, &education_details(PriorityLevel::Urgent)),
            24
        );
        assert_eq!(response_hours(Category::General, &CategoryDetails::None), 24);
    }

    #[test]
    fn cache_key_tracks_all_inputs() {
        let recipients = vec!["a@example.com".to_string()];
        let base = email_cache_key("resp_1", "subject", &recipients);
        assert_eq!(base, email_cache_key("resp_1", "subject", &recipients));
        assert_ne!(base, email_cache_key("resp_2", "subject", &recipients));
        assert_ne!(base, email_cache_key("resp_1", "other", &recipients));
        assert_ne!(
            base,
            email_cache_key("resp_1", "subject", &["b@example.com".to_string()])
        );
    }

    #[tokio::test]
    async fn duplicate_notification_is_sent_once() {
        let transport = RecordingTransport::new();
        let notifier = Notifier::new(config(), transport.clone());
        let mut extracted = ExtractedSubmission::default();
        extracted.submission_id = "resp_dup".into();

        let crm = CrmOutcome::default();
        let details = urgent_legal_details();
        let first = notifier
            .send_notification(&contact(), Category::Legal, &extracted, &details, &crm)
            .await;
        let second = notifier
            .send_notification(&contact(), Category::Legal, &extracted, &details, &crm)
            .await;

        assert!(first.success);
        assert!(second.success);
        assert_eq!(first.recipients, 2);
        assert_eq!(transport.delivered.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn transport_failure_is_captured_not_cached() {
        let notifier = Notifier::new(config(), Arc::new(FailingTransport));
        let mut extracted = ExtractedSubmission::default();
        extracted.submission_id = "resp_fail".into();

        let outcome = notifier
            .send_notification(
                &contact(),
                Category::Legal,
                &extracted,
                &urgent_legal_details(),
                &CrmOutcome::default(),
            )
            .await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("smtp refused"));
    }

    #[tokio::test]
    async fn notification_body_carries_urgency_and_partner_note() {
        let transport = RecordingTransport::new();
        let notifier = Notifier::new(config(), transport.clone());
        let mut extracted = ExtractedSubmission::default();
        extracted.submission_id = "resp_body".into();

        notifier
            .send_notification(
                &contact(),
                Category::Legal,
                &extracted,
                &urgent_legal_details(),
                &CrmOutcome {
                    success: true,
                    contact_id: Some("crm-42".into()),
                    deal_id: None,
                    error: None,
                },
            )
            .await;

        let delivered = transport.delivered.lock().await;
        let body = &delivered[0].html_body;
        assert!(body.contains("ACİL - Hemen İletişim Gerekli"));
        assert!(body.contains("legal-partner@example.com"));
        assert!(body.contains("crm-42"));
        assert!(body.contains("Vize Red İtiraz (Appeal)"));
    }

    #[tokio::test]
    async fn business_confirmation_carries_meeting_link() {
        let transport = RecordingTransport::new();
        let notifier = Notifier::new(config(), transport.clone());
        let mut extracted = ExtractedSubmission::default();
        extracted.submission_id = "resp_biz".into();

        let details = CategoryDetails::Business(formgate_core::BusinessSummary {
            company_name: "Acme Ltd".into(),
            sector_freetext: String::new(),
            sectors: vec![],
            sectors_text: String::new(),
            notes: String::new(),
            requires_meeting: true,
            business_type: formgate_core::BusinessType::General,
            selected_sectors: vec![],
        });

        let outcome = notifier
            .send_confirmation(&contact(), Category::Business, &extracted, &details)
            .await;
        assert!(outcome.success);

        let delivered = transport.delivered.lock().await;
        assert_eq!(delivered[0].recipients, vec!["ahmet@example.com"]);
        assert!(delivered[0].html_body.contains("https://cal.example.com/uk-entry"));
        assert!(delivered[0].html_body.contains("Acme Ltd"));
        assert!(delivered[0].html_body.contains("24 saat içinde"));
    }

    #[tokio::test]
    async fn urgent_legal_confirmation_promises_four_hours() {
        let transport = RecordingTransport::new();
        let notifier = Notifier::new(config(), transport.clone());
        let mut extracted = ExtractedSubmission::default();
        extracted.submission_id = "resp_urgent".into();

        notifier
            .send_confirmation(
                &contact(),
                Category::Legal,
                &extracted,
                &urgent_legal_details(),
            )
            .await;

        let delivered = transport.delivered.lock().await;
        assert!(delivered[0].html_body.contains("4 saat içinde"));
        assert!(delivered[0].html_body.contains("acil olarak işaretlendi"));
    }

    #[tokio::test]
    async fn confirmation_without_email_fails_fast() {
        let notifier = Notifier::new(config(), Arc::new(LogTransport));
        let mut c = contact();
        c.email.clear();

        let outcome = notifier
            .send_confirmation(
                &c,
                Category::General,
                &ExtractedSubmission::default(),
                &CategoryDetails::None,
            )
            .await;
        assert!(!outcome.success);
    }

    #[test]
    fn education_summary_subject_uses_first_program() {
        let details = CategoryDetails::Education(EducationSummary {
            programs: vec!["Doktora (PhD)".into(), "Dil Okulu".into()],
            programs_text: "Doktora (PhD), Dil Okulu".into(),
            gpa: String::new(),
            budget: String::new(),
            budget_formatted: None,
            notes: String::new(),
            priority_level: PriorityLevel::High,
        });
        let subject = notification_subject(&contact(), &details);
        assert!(subject.contains("Doktora (PhD)"));
        assert!(!subject.contains("Dil Okulu"));
    }
}
