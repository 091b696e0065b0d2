//! Site content - typed schemas for every collection and the admin operations
//! that edit them.
//!
//! Each collection has one fixed schema:
//!
//! | collection  | record          | ordered by                       |
//! |-------------|-----------------|----------------------------------|
//! | `projects`  | `Project`       | document `order`                 |
//! | `skills`    | `SkillCategory` | document `order`                 |
//! | `skills`    | `SkillEntry`    | `order` inside `skills` array    |
//! | `education` | `Education`     | document `order`                 |
//!
//! `ContentAdmin` validates input before anything reaches the store, appends
//! new records at the end of their collection and stamps `createdAt` /
//! `updatedAt`.

mod admin;
mod education;
mod error;
mod project;
mod seed;
mod skill;
pub mod validate;

use serde::Serialize;

use crate::ordered::SnapshotItem;

pub use admin::{AddedSkills, ContentAdmin};
pub use education::{normalize_field, normalize_gpa, Education, EducationDraft};
pub use error::AdminError;
pub use project::{Project, ProjectDraft};
pub use seed::{SeedCategory, SeedData, SeedReport};
pub use skill::{reindex, SkillCategory, SkillEntry};

pub const PROJECTS: &str = "projects";
pub const SKILLS: &str = "skills";
pub const EDUCATION: &str = "education";
/// Array field of a skill category holding its skills.
pub const SKILLS_FIELD: &str = "skills";

/// A schema stored as one document per record in a fixed collection.
pub trait ContentModel: SnapshotItem + Serialize {
    const COLLECTION: &'static str;
    /// Human-readable name used in error messages.
    const KIND: &'static str;
}

/// The top-level content collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Projects,
    Skills,
    Education,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [
        ContentKind::Projects,
        ContentKind::Skills,
        ContentKind::Education,
    ];

    pub fn collection(self) -> &'static str {
        match self {
            ContentKind::Projects => PROJECTS,
            ContentKind::Skills => SKILLS,
            ContentKind::Education => EDUCATION,
        }
    }

    /// Resolve a collection name, failing with `NotFound` for anything else.
    pub fn from_collection(name: &str) -> Result<Self, AdminError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.collection() == name)
            .ok_or_else(|| AdminError::NotFound(format!("unknown collection `{}`", name)))
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.collection())
    }
}
