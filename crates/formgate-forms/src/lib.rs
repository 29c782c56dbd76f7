//! Form-field extraction, categorization and formatting for inbound webhooks.
//!
//! Form payloads key every answer by the literal question text shown to the
//! applicant, and those labels drift across form revisions and languages.
//! Everything label-related lives in the declarative tables at the top of
//! this file; adding a label variant is a data change, not a code change.

use std::collections::BTreeMap;

use formgate_core::{
    BusinessDetail, BusinessSummary, BusinessType, Category, CategoryDetails, CategoryFlags,
    ContactInfo, EducationDetail, EducationSummary, ExtractedSubmission, LegalDetail, LegalSummary,
    PriorityLevel, ProgramTag, SectorTag, ServiceTag,
};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

pub const CRATE_NAME: &str = "formgate-forms";

/// Label → value map built from the payload's `fields` array. Entries with
/// null or whitespace-only values are dropped; duplicate labels are
/// last-write-wins.
pub type FieldMap = BTreeMap<String, JsonValue>;

// Candidate labels per logical attribute, highest priority first.
const NAME_LABELS: &[&str] = &["Adınız Soyadınız", "Full Name", "Ad Soyad"];
const EMAIL_LABELS: &[&str] = &["Mail Adresiniz", "E-mail Adresiniz", "Email Address"];
const PHONE_LABELS: &[&str] = &["Telefon Numaranız", "Phone Number", "Telefon"];
const NOTES_LABELS: &[&str] = &["Not", "Notlar", "Ek Notlarınız", "Additional Notes", "Açıklama"];
const GPA_LABELS: &[&str] = &["Not Ortalamanız", "Your GPA"];
const BUDGET_LABELS: &[&str] = &[
    "Eğitim ve Konaklama için Düşündüğünüz Bütçe Nedir? (£)",
    "Budget for Education and Accommodation (£)",
];
const LEGAL_TOPIC_LABELS: &[&str] = &[
    "Hangi konularda hukuki destek almak istiyorsunuz?",
    "What legal services do you need?",
];
const COMPANY_NAME_LABELS: &[&str] = &["Şirketinizin Adı", "Company Name"];
const SECTOR_FREETEXT_LABELS: &[&str] = &["Sektörünüz", "Your Industry"];

const COMMERCIAL_FLAG_LABEL: &str =
    "Hangi Konuda Danışmanlık Almak İstiyorsunuz? (Ticari Danışmanlık)";
const EDUCATION_FLAG_LABEL: &str =
    "Hangi Konuda Danışmanlık Almak İstiyorsunuz? (Eğitim Danışmanlığı)";
const LEGAL_FLAG_LABEL: &str =
    "Hangi Konuda Danışmanlık Almak İstiyorsunuz? (Vize ve Hukuki Danışmanlık)";

const PROGRAM_LABELS: &[(ProgramTag, &str)] = &[
    (
        ProgramTag::HighSchool,
        "İlgilendiğiniz Eğitim Seviyesi (Lise (İngiltere'de lise eğitimi almak isteyenler için))",
    ),
    (
        ProgramTag::Bachelor,
        "İlgilendiğiniz Eğitim Seviyesi (Lisans (Üniversite eğitimi))",
    ),
    (
        ProgramTag::Master,
        "İlgilendiğiniz Eğitim Seviyesi (Yüksek Lisans (Master programları))",
    ),
    (
        ProgramTag::Phd,
        "İlgilendiğiniz Eğitim Seviyesi (Doktora (Phd programları))",
    ),
    (
        ProgramTag::LanguageSchool,
        "İlgilendiğiniz Eğitim Seviyesi (Dil Okulları (Yetişkinler için genel, IELTS veya mesleki İngilizce))",
    ),
    (
        ProgramTag::SummerCamp,
        "İlgilendiğiniz Eğitim Seviyesi (Yaz Kampı (12-18 yaş grubu))",
    ),
];

const SERVICE_LABELS: &[(ServiceTag, &str)] = &[
    (
        ServiceTag::TouristVisa,
        "Hangi konularda hukuki destek almak istiyorsunuz? (İngiltere Turistik Vize (Visitor Visa))",
    ),
    (
        ServiceTag::StudentVisa,
        "Hangi konularda hukuki destek almak istiyorsunuz? (İngiltere Öğrenci Vizesi (Tier 4 / Graduate Route))",
    ),
    (
        ServiceTag::WorkVisa,
        "Hangi konularda hukuki destek almak istiyorsunuz? (İngiltere Çalışma Vizesi (Skilled Worker, Health and Care vb.))",
    ),
    (
        ServiceTag::FamilyVisa,
        "Hangi konularda hukuki destek almak istiyorsunuz? (İngiltere Aile Birleşimi / Partner Vizesi)",
    ),
    (
        ServiceTag::Ilr,
        "Hangi konularda hukuki destek almak istiyorsunuz? (İngiltere'de Süresiz Oturum (ILR) Başvurusu)",
    ),
    (
        ServiceTag::Citizenship,
        "Hangi konularda hukuki destek almak istiyorsunuz? (İngiltere Vatandaşlık Başvurusu)",
    ),
    (
        ServiceTag::VisaRefusalAppeal,
        "Hangi konularda hukuki destek almak istiyorsunuz? (Vize Reddi İtiraz ve Yeniden Başvuru Danışmanlığı)",
    ),
];

const SECTOR_LABELS: &[(SectorTag, &str)] = &[
    (SectorTag::Packaging, "Sektörünüz (Ambalaj ve Baskı Ürünleri)"),
    (SectorTag::Textile, "Sektörünüz (Tekstil ve Giyim)"),
    (SectorTag::Footwear, "Sektörünüz (Ayakkabı ve Deri Ürünleri)"),
    (SectorTag::Furniture, "Sektörünüz (Mobilya ve Ev Dekorasyonu)"),
    (SectorTag::Food, "Sektörünüz (Gıda Ürünleri / Yiyecek-İçecek)"),
    (SectorTag::Jewelry, "Sektörünüz (Takı, Bijuteri ve Aksesuar)"),
    (SectorTag::Gifts, "Sektörünüz (Hediyelik Eşya)"),
    (SectorTag::Cosmetics, "Sektörünüz (Kozmetik ve Kişisel Bakım)"),
    (SectorTag::Toys, "Sektörünüz (Oyuncak ve Kırtasiye)"),
    (SectorTag::Cleaning, "Sektörünüz (Temizlik ve Hijyen Ürünleri)"),
    (SectorTag::Homeware, "Sektörünüz (Ev Gereçleri ve Mutfak Ürünleri)"),
    (SectorTag::Hardware, "Sektörünüz (Hırdavat / Yapı Malzemeleri)"),
    (SectorTag::Automotive, "Sektörünüz (Otomotiv Yan Sanayi)"),
    (SectorTag::Garden, "Sektörünüz (Bahçe ve Outdoor Ürünleri)"),
    (SectorTag::Other, "Sektörünüz (Diğer)"),
];

pub fn program_display_name(tag: ProgramTag) -> &'static str {
    match tag {
        ProgramTag::HighSchool => "Lise (İngiltere)",
        ProgramTag::Bachelor => "Lisans (Üniversite)",
        ProgramTag::Master => "Yüksek Lisans (Master)",
        ProgramTag::Phd => "Doktora (PhD)",
        ProgramTag::LanguageSchool => "Dil Okulu",
        ProgramTag::SummerCamp => "Yaz Kampı (12-18 yaş)",
    }
}

pub fn service_display_name(tag: ServiceTag) -> &'static str {
    match tag {
        ServiceTag::TouristVisa => "Turistik Vize (Visitor)",
        ServiceTag::StudentVisa => "Öğrenci Vizesi (Student)",
        ServiceTag::WorkVisa => "Çalışma Vizesi (Work)",
        ServiceTag::FamilyVisa => "Aile Birleşimi (Family)",
        ServiceTag::Ilr => "Süresiz Oturum (ILR)",
        ServiceTag::Citizenship => "Vatandaşlık (Citizenship)",
        ServiceTag::VisaRefusalAppeal => "Vize Red İtiraz (Appeal)",
    }
}

pub fn sector_display_name(tag: SectorTag) -> &'static str {
    match tag {
        SectorTag::Packaging => "Ambalaj ve Baskı",
        SectorTag::Textile => "Tekstil ve Giyim",
        SectorTag::Footwear => "Ayakkabı ve Deri",
        SectorTag::Furniture => "Mobilya ve Dekorasyon",
        SectorTag::Food => "Gıda ve İçecek",
        SectorTag::Jewelry => "Takı ve Aksesuar",
        SectorTag::Gifts => "Hediyelik Eşya",
        SectorTag::Cosmetics => "Kozmetik ve Bakım",
        SectorTag::Toys => "Oyuncak ve Kırtasiye",
        SectorTag::Cleaning => "Temizlik Ürünleri",
        SectorTag::Homeware => "Ev Gereçleri",
        SectorTag::Hardware => "Hırdavat",
        SectorTag::Automotive => "Otomotiv",
        SectorTag::Garden => "Bahçe Ürünleri",
        SectorTag::Other => "Diğer Sektör",
    }
}

/// Stateless processor turning one raw webhook payload into the typed record
/// the CRM and notification layers consume.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormProcessor;

impl FormProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Build an `ExtractedSubmission` from an arbitrary JSON payload.
    ///
    /// Fails softly: any unrecognized top-level shape yields the default
    /// (empty) submission instead of an error. Callers must treat an empty
    /// result as extraction failure and abort the request pipeline.
    pub fn extract_form_data(&self, raw: &JsonValue) -> ExtractedSubmission {
        let Some(payload) = raw.as_object() else {
            warn!("webhook payload is not a JSON object");
            return ExtractedSubmission::default();
        };

        let Some(data) = payload.get("data").and_then(JsonValue::as_object) else {
            warn!("webhook payload has no data object");
            return ExtractedSubmission::default();
        };

        let Some(fields) = data.get("fields").and_then(JsonValue::as_array) else {
            warn!("webhook data section has no fields array");
            return ExtractedSubmission::default();
        };

        let field_map = build_field_map(fields);
        debug!(
            usable = field_map.len(),
            total = fields.len(),
            "extracted form fields"
        );

        ExtractedSubmission {
            submission_id: text_at(data, "responseId"),
            submitted_at: text_at(data, "createdAt"),
            name: resolve_text(&field_map, NAME_LABELS),
            email: resolve_text(&field_map, EMAIL_LABELS),
            phone: resolve_text(&field_map, PHONE_LABELS),
            notes: resolve_text(&field_map, NOTES_LABELS),
            category_flags: CategoryFlags {
                commercial: resolve_flag(&field_map, COMMERCIAL_FLAG_LABEL),
                education: resolve_flag(&field_map, EDUCATION_FLAG_LABEL),
                legal: resolve_flag(&field_map, LEGAL_FLAG_LABEL),
            },
            education: extract_education(&field_map),
            legal: extract_legal(&field_map),
            business: extract_business(&field_map),
        }
    }

    /// Map a submission to exactly one category.
    ///
    /// Explicit checkbox intent always outranks content inference. Among the
    /// inferred signals the order is business > education > legal; that order
    /// is preserved for compatibility with historical form revisions rather
    /// than derived from any documented business rule.
    pub fn determine_category(&self, extracted: &ExtractedSubmission) -> Category {
        if extracted.category_flags.commercial {
            return Category::Business;
        }
        if extracted.category_flags.education {
            return Category::Education;
        }
        if extracted.category_flags.legal {
            return Category::Legal;
        }

        if !extracted.business.company_name.is_empty()
            || !extracted.business.sector_freetext.is_empty()
        {
            return Category::Business;
        }
        if !extracted.education.selected_programs.is_empty() || !extracted.education.gpa.is_empty() {
            return Category::Education;
        }
        if !extracted.legal.selected_services.is_empty() || !extracted.legal.topic.is_empty() {
            return Category::Legal;
        }

        Category::General
    }

    /// Split the free-text name on the first whitespace run; everything after
    /// it is the last name verbatim.
    pub fn get_contact_info(&self, extracted: &ExtractedSubmission) -> ContactInfo {
        let name = extracted.name.trim();
        let email = extracted.email.trim().to_string();
        let phone = extracted.phone.trim().to_string();

        let (firstname, lastname) = match name.split_once(char::is_whitespace) {
            Some((first, rest)) => (first.to_string(), rest.trim_start().to_string()),
            None => (name.to_string(), String::new()),
        };

        let valid = !email.is_empty() && !firstname.is_empty();
        ContactInfo {
            firstname,
            lastname,
            fullname: name.to_string(),
            email,
            phone,
            valid,
        }
    }

    /// Format the category-specific detail view used by CRM notes and email
    /// bodies. Never fails; the general category yields `None`.
    pub fn get_category_specific_data(
        &self,
        extracted: &ExtractedSubmission,
        category: Category,
    ) -> CategoryDetails {
        match category {
            Category::Education => CategoryDetails::Education(format_education(&extracted.education)),
            Category::Legal => CategoryDetails::Legal(format_legal(&extracted.legal)),
            Category::Business => CategoryDetails::Business(format_business(&extracted.business)),
            Category::General => CategoryDetails::None,
        }
    }

    /// Minimum admissibility checks surfaced to operators via the debug route.
    pub fn validate_submission(&self, extracted: &ExtractedSubmission) -> ValidationReport {
        let mut report = ValidationReport {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        };

        if extracted.email.is_empty() || !extracted.email.contains('@') {
            report.is_valid = false;
            report
                .errors
                .push("invalid or missing email address".to_string());
        }

        if extracted.name.split_whitespace().count() < 2 {
            report.warnings.push("name seems incomplete".to_string());
        }

        if !extracted.category_flags.any() {
            report.warnings.push("no category selected".to_string());
        }

        report
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Collapse the `fields` array into a label → value map. Entries that are
/// not objects are skipped; null and whitespace-only values are dropped.
pub fn build_field_map(fields: &[JsonValue]) -> FieldMap {
    let mut map = FieldMap::new();
    for field in fields {
        let Some(obj) = field.as_object() else {
            continue;
        };
        let label = obj
            .get("label")
            .and_then(JsonValue::as_str)
            .unwrap_or_default();
        let Some(value) = obj.get("value") else {
            continue;
        };
        if value_is_blank(value) {
            continue;
        }
        map.insert(label.to_string(), value.clone());
    }
    map
}

fn value_is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// First candidate label present with a usable value wins; no merging.
pub fn resolve_text(field_map: &FieldMap, candidates: &[&str]) -> String {
    for label in candidates {
        if let Some(value) = field_map.get(*label) {
            let text = match value {
                JsonValue::String(s) => s.trim().to_string(),
                other => other.to_string(),
            };
            if !text.is_empty() {
                return text;
            }
        }
    }
    String::new()
}

/// Checkbox-style fields count as set only for boolean `true` or the string
/// `"true"`; every other value, including `"false"`, resolves to false.
pub fn resolve_flag(field_map: &FieldMap, label: &str) -> bool {
    match field_map.get(label) {
        Some(JsonValue::Bool(b)) => *b,
        Some(JsonValue::String(s)) => s == "true",
        _ => false,
    }
}

fn text_at(data: &serde_json::Map<String, JsonValue>, key: &str) -> String {
    data.get(key)
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string()
}

fn extract_education(field_map: &FieldMap) -> EducationDetail {
    EducationDetail {
        gpa: resolve_text(field_map, GPA_LABELS),
        budget: resolve_text(field_map, BUDGET_LABELS),
        notes: resolve_text(field_map, NOTES_LABELS),
        selected_programs: PROGRAM_LABELS
            .iter()
            .filter(|(_, label)| resolve_flag(field_map, label))
            .map(|(tag, _)| *tag)
            .collect(),
    }
}

fn extract_legal(field_map: &FieldMap) -> LegalDetail {
    LegalDetail {
        topic: resolve_text(field_map, LEGAL_TOPIC_LABELS),
        notes: resolve_text(field_map, NOTES_LABELS),
        selected_services: SERVICE_LABELS
            .iter()
            .filter(|(_, label)| resolve_flag(field_map, label))
            .map(|(tag, _)| *tag)
            .collect(),
    }
}

fn extract_business(field_map: &FieldMap) -> BusinessDetail {
    BusinessDetail {
        company_name: resolve_text(field_map, COMPANY_NAME_LABELS),
        sector_freetext: resolve_text(field_map, SECTOR_FREETEXT_LABELS),
        notes: resolve_text(field_map, NOTES_LABELS),
        selected_sectors: SECTOR_LABELS
            .iter()
            .filter(|(_, label)| resolve_flag(field_map, label))
            .map(|(tag, _)| *tag)
            .collect(),
    }
}

pub fn format_education(raw: &EducationDetail) -> EducationSummary {
    let programs: Vec<String> = raw
        .selected_programs
        .iter()
        .map(|tag| program_display_name(*tag).to_string())
        .collect();

    let budget_formatted = parse_budget(&raw.budget).map(|n| format!("£{}", format_thousands(n)));

    EducationSummary {
        programs_text: programs.join(", "),
        programs,
        gpa: raw.gpa.clone(),
        budget: raw.budget.clone(),
        budget_formatted,
        notes: raw.notes.clone(),
        priority_level: education_priority(raw),
    }
}

pub fn format_legal(raw: &LegalDetail) -> LegalSummary {
    let services: Vec<String> = raw
        .selected_services
        .iter()
        .map(|tag| service_display_name(*tag).to_string())
        .collect();

    LegalSummary {
        services_text: services.join(", "),
        services,
        topic: raw.topic.clone(),
        notes: raw.notes.clone(),
        urgency_level: legal_urgency(raw),
        selected_services: raw.selected_services.clone(),
    }
}

pub fn format_business(raw: &BusinessDetail) -> BusinessSummary {
    let sectors: Vec<String> = raw
        .selected_sectors
        .iter()
        .map(|tag| sector_display_name(*tag).to_string())
        .collect();

    BusinessSummary {
        company_name: raw.company_name.clone(),
        sector_freetext: raw.sector_freetext.clone(),
        sectors_text: sectors.join(", "),
        sectors,
        notes: raw.notes.clone(),
        requires_meeting: true,
        business_type: business_type(raw),
        selected_sectors: raw.selected_sectors.clone(),
    }
}

/// Parse a budget answer as a decimal number, tolerating currency symbols and
/// thousands separators. Returns `None` when the remainder is not numeric;
/// the caller keeps the original string in that case.
pub fn parse_budget(budget: &str) -> Option<f64> {
    let cleaned: String = budget
        .chars()
        .filter(|c| !matches!(c, '£' | '$' | '€' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

fn format_thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.abs().to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0 {
        format!("-{out}")
    } else {
        out
    }
}

/// PhD and master applications are the most involved; summer camps are
/// seasonal and time-boxed, so they jump the queue when nothing heavier is
/// selected.
pub fn education_priority(raw: &EducationDetail) -> PriorityLevel {
    let programs = &raw.selected_programs;
    if programs.contains(&ProgramTag::Phd) || programs.contains(&ProgramTag::Master) {
        PriorityLevel::High
    } else if programs.contains(&ProgramTag::SummerCamp) {
        PriorityLevel::Urgent
    } else {
        PriorityLevel::Medium
    }
}

/// A refused visa dominates everything else; tourist, work and student visas
/// usually come with travel plans or application deadlines.
pub fn legal_urgency(raw: &LegalDetail) -> PriorityLevel {
    let services = &raw.selected_services;
    if services.contains(&ServiceTag::VisaRefusalAppeal) {
        PriorityLevel::Urgent
    } else if services.contains(&ServiceTag::TouristVisa)
        || services.contains(&ServiceTag::WorkVisa)
        || services.contains(&ServiceTag::StudentVisa)
    {
        PriorityLevel::High
    } else {
        PriorityLevel::Medium
    }
}

pub fn business_type(raw: &BusinessDetail) -> BusinessType {
    let sectors = &raw.selected_sectors;
    if sectors.len() > 3 {
        BusinessType::MultiSector
    } else if sectors.contains(&SectorTag::Food)
        || sectors.contains(&SectorTag::Cosmetics)
        || sectors.contains(&SectorTag::Textile)
    {
        BusinessType::ConsumerGoods
    } else if sectors.contains(&SectorTag::Hardware) || sectors.contains(&SectorTag::Automotive) {
        BusinessType::Industrial
    } else {
        BusinessType::General
    }
}
