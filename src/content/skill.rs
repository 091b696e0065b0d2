//! Skill categories and the ordered skill list embedded in each one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{ContentModel, SKILLS};
use crate::ordered::Ordered;

/// One skill inside a category. Identified by its name within the category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u64>,
}

impl SkillEntry {
    pub fn new(name: impl Into<String>, order: u64) -> Self {
        Self {
            name: name.into(),
            order: Some(order),
        }
    }
}

impl Ordered for SkillEntry {
    fn order(&self) -> Option<u64> {
        self.order
    }
}

/// A stored skill category document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillCategory {
    #[serde(default)]
    pub category_name: String,
    #[serde(default, deserialize_with = "skill_entries")]
    pub skills: Vec<SkillEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SkillCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            category_name: name.into(),
            ..Self::default()
        }
    }

    /// Skills in presentation order (missing orders last, ties by name).
    pub fn ordered_skills(&self) -> Vec<SkillEntry> {
        let mut skills = self.skills.clone();
        skills.sort_by(|a, b| {
            a.sort_key()
                .cmp(&b.sort_key())
                .then_with(|| a.name.cmp(&b.name))
        });
        skills
    }

    pub fn contains(&self, name: &str) -> bool {
        self.skills.iter().any(|s| s.name == name)
    }
}

impl Ordered for SkillCategory {
    fn order(&self) -> Option<u64> {
        self.order
    }
}

impl ContentModel for SkillCategory {
    const COLLECTION: &'static str = SKILLS;
    const KIND: &'static str = "Skill category";
}

/// Renumber `skills` as `0..len` in the given sequence.
pub fn reindex(skills: impl IntoIterator<Item = SkillEntry>) -> Vec<SkillEntry> {
    skills
        .into_iter()
        .enumerate()
        .map(|(i, entry)| SkillEntry {
            order: Some(i as u64),
            ..entry
        })
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Name(String),
    Entry(SkillEntry),
}

/// Older category documents store skills as bare names; their array position
/// is the order.
fn skill_entries<'de, D>(deserializer: D) -> Result<Vec<SkillEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<RawEntry>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            RawEntry::Name(name) => SkillEntry::new(name, index as u64),
            RawEntry::Entry(entry) => entry,
        })
        .collect())
}
