use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validate;
use super::{AdminError, ContentModel, EDUCATION};
use crate::ordered::Ordered;

/// A stored education entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub gpa: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Ordered for Education {
    fn order(&self) -> Option<u64> {
        self.order
    }
}

impl ContentModel for Education {
    const COLLECTION: &'static str = EDUCATION;
    const KIND: &'static str = "Education entry";
}

/// Admin form input for an education entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationDraft {
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub gpa: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub year: String,
}

impl EducationDraft {
    pub fn into_education(self) -> Result<Education, AdminError> {
        validate::require("degree", &self.degree)?;
        validate::require("institution", &self.institution)?;
        Ok(Education {
            degree: self.degree.trim().to_string(),
            institution: self.institution.trim().to_string(),
            location: self.location.trim().to_string(),
            gpa: normalize_gpa(&self.gpa),
            field: normalize_field(&self.field),
            status: self.status.trim().to_string(),
            year: self.year.trim().to_string(),
            ..Education::default()
        })
    }
}

/// `"3.87 / 4.00"` becomes `"GPA: 3.87 / 4.00"`; values already labelled
/// `GPA:` or `CGPA:` are kept.
pub fn normalize_gpa(gpa: &str) -> String {
    let gpa = gpa.trim();
    if gpa.is_empty() {
        return String::new();
    }
    let upper = gpa.to_ascii_uppercase();
    if upper.starts_with("GPA:") || upper.starts_with("CGPA:") {
        return gpa.to_string();
    }
    format!("GPA: {}", gpa)
}

/// `"Science"` becomes `"Group: Science"`.
pub fn normalize_field(field: &str) -> String {
    let field = field.trim();
    if field.is_empty() {
        return String::new();
    }
    if field.to_ascii_lowercase().starts_with("group:") {
        return field.to_string();
    }
    format!("Group: {}", field)
}
