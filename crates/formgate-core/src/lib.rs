//! Core domain model for Formgate submissions.

use serde::{Deserialize, Serialize};

pub const CRATE_NAME: &str = "formgate-core";

/// Top-level routing category for a submission. Exactly one per submission;
/// `General` is the fallback when no signal matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Business,
    Education,
    Legal,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Business => "business",
            Category::Education => "education",
            Category::Legal => "legal",
            Category::General => "general",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Education-level checkboxes offered on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramTag {
    HighSchool,
    Bachelor,
    Master,
    Phd,
    LanguageSchool,
    SummerCamp,
}

/// Legal-service checkboxes offered on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceTag {
    TouristVisa,
    StudentVisa,
    WorkVisa,
    FamilyVisa,
    Ilr,
    Citizenship,
    VisaRefusalAppeal,
}

/// Sector checkboxes offered on the business form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectorTag {
    Packaging,
    Textile,
    Footwear,
    Furniture,
    Food,
    Jewelry,
    Gifts,
    Cosmetics,
    Toys,
    Cleaning,
    Homeware,
    Hardware,
    Automotive,
    Garden,
    Other,
}

/// The three top-level category checkboxes. At most one should be true in a
/// well-formed submission, but nothing enforces exclusivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryFlags {
    pub commercial: bool,
    pub education: bool,
    pub legal: bool,
}

impl CategoryFlags {
    pub fn any(&self) -> bool {
        self.commercial || self.education || self.legal
    }
}

/// Raw education answers lifted out of the field map.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EducationDetail {
    pub gpa: String,
    pub budget: String,
    pub notes: String,
    pub selected_programs: Vec<ProgramTag>,
}

/// Raw legal answers lifted out of the field map.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LegalDetail {
    pub topic: String,
    pub notes: String,
    pub selected_services: Vec<ServiceTag>,
}

/// Raw business answers lifted out of the field map.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BusinessDetail {
    pub company_name: String,
    pub sector_freetext: String,
    pub notes: String,
    pub selected_sectors: Vec<SectorTag>,
}

/// Normalized intermediate record built once per inbound webhook request.
/// Immutable after extraction; downstream stages only read it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractedSubmission {
    pub submission_id: String,
    pub submitted_at: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub notes: String,
    pub category_flags: CategoryFlags,
    pub education: EducationDetail,
    pub legal: LegalDetail,
    pub business: BusinessDetail,
}

impl ExtractedSubmission {
    /// An empty submission is how extraction signals "no usable data";
    /// callers must reject it before invoking side effects.
    pub fn is_empty(&self) -> bool {
        *self == ExtractedSubmission::default()
    }
}

/// Derived contact view. `valid` is a minimum admissibility check, not an
/// email-format validator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub firstname: String,
    pub lastname: String,
    pub fullname: String,
    pub email: String,
    pub phone: String,
    pub valid: bool,
}

/// Follow-up priority derived from tag sets. Serialized lowercase so it can
/// flow straight into CRM properties and email copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    Urgent,
    High,
    Medium,
}

impl PriorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLevel::Urgent => "urgent",
            PriorityLevel::High => "high",
            PriorityLevel::Medium => "medium",
        }
    }
}

impl std::fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse business shape derived from the selected sector tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    MultiSector,
    ConsumerGoods,
    Industrial,
    General,
}

impl BusinessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessType::MultiSector => "multi_sector",
            BusinessType::ConsumerGoods => "consumer_goods",
            BusinessType::Industrial => "industrial",
            BusinessType::General => "general",
        }
    }
}

impl std::fmt::Display for BusinessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation-ready education details for CRM notes and email bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationSummary {
    pub programs: Vec<String>,
    pub programs_text: String,
    pub gpa: String,
    pub budget: String,
    /// Present only when the budget parsed as a number.
    pub budget_formatted: Option<String>,
    pub notes: String,
    pub priority_level: PriorityLevel,
}

/// Presentation-ready legal details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegalSummary {
    pub services: Vec<String>,
    pub services_text: String,
    pub topic: String,
    pub notes: String,
    pub urgency_level: PriorityLevel,
    pub selected_services: Vec<ServiceTag>,
}

/// Presentation-ready business details. Business inquiries always require a
/// follow-up meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessSummary {
    pub company_name: String,
    pub sector_freetext: String,
    pub sectors: Vec<String>,
    pub sectors_text: String,
    pub notes: String,
    pub requires_meeting: bool,
    pub business_type: BusinessType,
    pub selected_sectors: Vec<SectorTag>,
}

/// Category-specific formatted view of one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CategoryDetails {
    Education(EducationSummary),
    Legal(LegalSummary),
    Business(BusinessSummary),
    None,
}

impl CategoryDetails {
    pub fn as_education(&self) -> Option<&EducationSummary> {
        match self {
            CategoryDetails::Education(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_legal(&self) -> Option<&LegalSummary> {
        match self {
            CategoryDetails::Legal(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_business(&self) -> Option<&BusinessSummary> {
        match self {
            CategoryDetails::Business(b) => Some(b),
            _ => None,
        }
    }
}

/// Result of a CRM upsert attempt, as reported back to the webhook response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CrmOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CrmOutcome {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            contact_id: None,
            deal_id: None,
            error: Some(error.into()),
        }
    }
}

/// Result of one email dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub success: bool,
    pub recipients: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            recipients: 0,
            error: Some(error.into()),
        }
    }
}
