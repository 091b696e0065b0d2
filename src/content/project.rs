//! Project - a portfolio entry with its detail page content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validate::{self, PLACEHOLDER_LINK};
use super::{AdminError, ContentModel, PROJECTS};
use crate::ordered::Ordered;

fn placeholder_link() -> String {
    PLACEHOLDER_LINK.to_string()
}

/// A stored project document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub full_description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default = "placeholder_link")]
    pub github: String,
    #[serde(default = "placeholder_link")]
    pub demo: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Ordered for Project {
    fn order(&self) -> Option<u64> {
        self.order
    }
}

impl ContentModel for Project {
    const COLLECTION: &'static str = PROJECTS;
    const KIND: &'static str = "Project";
}

/// Admin form input for creating or editing a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub full_description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub demo: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl ProjectDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Validate and normalise the draft into a project without order or
    /// timestamps.
    pub fn into_project(self) -> Result<Project, AdminError> {
        validate::require("project title", &self.title)?;
        let github = validate::optional_link("GitHub URL", self.github.as_deref())?;
        let demo = validate::optional_link("demo URL", self.demo.as_deref())?;
        let image_urls = validate::image_urls(&self.image_urls)?;

        Ok(Project {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            full_description: self.full_description.trim().to_string(),
            technologies: validate::clean_list(self.technologies),
            features: validate::clean_list(self.features),
            challenges: validate::clean_list(self.challenges),
            github,
            demo,
            image_urls,
            order: None,
            created_at: None,
            updated_at: None,
        })
    }
}
