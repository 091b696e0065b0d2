//! Default content applied to empty collections at startup.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::admin::ContentAdmin;
use super::skill::reindex;
use super::validate;
use super::{
    AdminError, ContentKind, EducationDraft, ProjectDraft, SkillCategory, SkillEntry,
};
use crate::store::{to_fields, DocumentStore, Fields, ORDER_FIELD};

/// One seeded skill category: a name and its skills in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedCategory {
    pub category_name: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Seed file contents. Each list is written in order, only into a collection
/// that is still empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub projects: Vec<ProjectDraft>,
    #[serde(default)]
    pub skills: Vec<SeedCategory>,
    #[serde(default)]
    pub education: Vec<EducationDraft>,
}

/// How many records each collection received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub projects: usize,
    pub skills: usize,
    pub education: usize,
}

impl SeedReport {
    pub fn total(&self) -> usize {
        self.projects + self.skills + self.education
    }
}

impl SeedData {
    pub async fn from_file(path: &Path) -> Result<Self, AdminError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AdminError::Io(format!("{}: {}", path.display(), e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AdminError::Io(format!("{}: invalid seed file: {}", path.display(), e)))
    }

    /// Validate every entry up front so a bad seed writes nothing.
    fn prepare(&self) -> Result<Prepared, AdminError> {
        let projects = self
            .projects
            .iter()
            .cloned()
            .map(|draft| -> Result<Fields, AdminError> {
                Ok(to_fields(&draft.into_project()?)?)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let education = self
            .education
            .iter()
            .cloned()
            .map(|draft| -> Result<Fields, AdminError> {
                Ok(to_fields(&draft.into_education()?)?)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let skills = self
            .skills
            .iter()
            .map(|seed| -> Result<Fields, AdminError> {
                validate::require("category name", &seed.category_name)?;
                let category = SkillCategory {
                    category_name: seed.category_name.trim().to_string(),
                    skills: reindex(
                        validate::unique_list(validate::clean_list(seed.skills.clone()))
                            .into_iter()
                            .map(|name| SkillEntry::new(name, 0)),
                    ),
                    ..SkillCategory::default()
                };
                Ok(to_fields(&category)?)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Prepared {
            projects,
            skills,
            education,
        })
    }
}

struct Prepared {
    projects: Vec<Fields>,
    skills: Vec<Fields>,
    education: Vec<Fields>,
}

impl<S: DocumentStore> ContentAdmin<S> {
    /// Insert `seed` into every collection that has no documents yet.
    /// Collections that already hold content are left alone.
    pub async fn seed_if_empty(&self, seed: &SeedData) -> Result<SeedReport, AdminError> {
        let prepared = seed.prepare()?;
        let report = SeedReport {
            projects: self
                .seed_collection(ContentKind::Projects, prepared.projects)
                .await?,
            skills: self
                .seed_collection(ContentKind::Skills, prepared.skills)
                .await?,
            education: self
                .seed_collection(ContentKind::Education, prepared.education)
                .await?,
        };
        info!(
            projects = report.projects,
            skills = report.skills,
            education = report.education,
            "seed applied"
        );
        Ok(report)
    }

    async fn seed_collection(
        &self,
        kind: ContentKind,
        records: Vec<Fields>,
    ) -> Result<usize, AdminError> {
        let collection = kind.collection();
        if records.is_empty() || self.store().count(collection).await? > 0 {
            return Ok(0);
        }
        let now = Utc::now();
        let inserted = records.len();
        for (position, mut fields) in records.into_iter().enumerate() {
            fields.insert(ORDER_FIELD.to_string(), json!(position));
            fields.insert("createdAt".to_string(), json!(now));
            fields.insert("updatedAt".to_string(), json!(now));
            self.store().create(collection, fields).await?;
        }
        Ok(inserted)
    }
}
