//! ContentAdmin - validated CRUD over the content collections.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::skill::reindex;
use super::validate::{self, split_list};
use super::{
    AdminError, ContentKind, ContentModel, Education, EducationDraft, Project, ProjectDraft,
    SkillCategory, SkillEntry, SKILLS, SKILLS_FIELD,
};
use crate::ordered::{
    CollectionRef, OrderedCollectionSync, Record, ReorderPolicy, ReorderReport, Snapshot,
};
use crate::store::{
    to_fields, Direction, Document, DocumentStore, Fields, Query, StoreError, ORDER_FIELD,
};

const CREATED_AT: &str = "createdAt";
const UPDATED_AT: &str = "updatedAt";

/// Result of `add_skills`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddedSkills {
    /// Names appended to the category, in input order.
    pub added: Vec<String>,
    /// Names that were already present (or repeated in the input).
    pub skipped: Vec<String>,
}

/// Admin operations on the portfolio content.
///
/// New records are appended with `order` equal to the current collection
/// size. Deletes leave gaps; the next reorder or an explicit `compact`
/// restores a dense `0..N-1` sequence.
pub struct ContentAdmin<S> {
    store: Arc<S>,
    policy: ReorderPolicy,
}

impl<S> Clone for ContentAdmin<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
        }
    }
}

impl<S: DocumentStore> ContentAdmin<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            policy: ReorderPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReorderPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn policy(&self) -> ReorderPolicy {
        self.policy
    }

    /// Reorder/subscribe handle for a top-level collection.
    pub fn sync(&self, kind: ContentKind) -> OrderedCollectionSync<S> {
        OrderedCollectionSync::new(
            Arc::clone(&self.store),
            CollectionRef::documents(kind.collection()),
        )
        .with_policy(self.policy)
    }

    /// Reorder/subscribe handle for the skills of one category.
    pub fn skills_sync(&self, category_id: &str) -> OrderedCollectionSync<S> {
        OrderedCollectionSync::new(
            Arc::clone(&self.store),
            CollectionRef::embedded(SKILLS, category_id, SKILLS_FIELD),
        )
        .with_policy(self.policy)
    }

    // ---- generic record access ----

    /// Every record of `T`'s collection in presentation order.
    pub async fn list<T: ContentModel>(&self) -> Result<Vec<Record<T>>, AdminError> {
        self.preview::<T>(None).await
    }

    /// The first `limit` records in presentation order, or all of them.
    pub async fn preview<T: ContentModel>(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<Record<T>>, AdminError> {
        let mut query = Query::new().order_by(ORDER_FIELD, Direction::Asc);
        if let Some(limit) = limit {
            if limit == 0 {
                return Err(AdminError::Validation("limit must be at least 1".into()));
            }
            query = query.limit(limit);
        }
        let docs = self.store.query(T::COLLECTION, &query).await?;
        let entries = docs
            .into_iter()
            .map(|doc| (doc.id, Value::Object(doc.fields)))
            .collect();
        Ok(Snapshot::<T>::from_entries(entries, 0).into_records())
    }

    pub async fn get<T: ContentModel>(&self, id: &str) -> Result<Record<T>, AdminError> {
        let doc = self
            .store
            .get(T::COLLECTION, id)
            .await
            .map_err(missing::<T>)?;
        decode(doc)
    }

    /// Delete a record, returning what was deleted.
    pub async fn remove<T: ContentModel>(&self, id: &str) -> Result<Record<T>, AdminError> {
        let record = self.get::<T>(id).await?;
        self.store
            .delete(T::COLLECTION, id)
            .await
            .map_err(missing::<T>)?;
        info!(collection = T::COLLECTION, id, "content deleted");
        Ok(record)
    }

    async fn append(&self, collection: &str, mut fields: Fields) -> Result<String, AdminError> {
        let position = self.store.count(collection).await?;
        let now = Utc::now();
        fields.insert(ORDER_FIELD.to_string(), json!(position));
        fields.insert(CREATED_AT.to_string(), json!(now));
        fields.insert(UPDATED_AT.to_string(), json!(now));
        let id = self.store.create(collection, fields).await?;
        info!(collection, id = %id, order = position, "content created");
        Ok(id)
    }

    async fn patch<T: ContentModel>(&self, id: &str, mut fields: Fields) -> Result<(), AdminError> {
        fields.remove(ORDER_FIELD);
        fields.remove(CREATED_AT);
        fields.insert(UPDATED_AT.to_string(), json!(Utc::now()));
        self.store
            .update(T::COLLECTION, id, fields)
            .await
            .map_err(missing::<T>)?;
        info!(collection = T::COLLECTION, id, "content updated");
        Ok(())
    }

    // ---- projects ----

    pub async fn create_project(&self, draft: ProjectDraft) -> Result<String, AdminError> {
        let project = draft.into_project()?;
        self.append(Project::COLLECTION, to_fields(&project)?).await
    }

    pub async fn get_project(&self, id: &str) -> Result<Record<Project>, AdminError> {
        self.get(id).await
    }

    /// Replace a project's content. An empty image list keeps the stored images.
    pub async fn update_project(&self, id: &str, draft: ProjectDraft) -> Result<(), AdminError> {
        let project = draft.into_project()?;
        let mut fields = to_fields(&project)?;
        if project.image_urls.is_empty() {
            fields.remove("imageUrls");
        }
        self.patch::<Project>(id, fields).await
    }

    pub async fn delete_project(&self, id: &str) -> Result<Project, AdminError> {
        Ok(self.remove::<Project>(id).await?.data)
    }

    // ---- education ----

    pub async fn create_education(&self, draft: EducationDraft) -> Result<String, AdminError> {
        let education = draft.into_education()?;
        self.append(Education::COLLECTION, to_fields(&education)?)
            .await
    }

    pub async fn get_education(&self, id: &str) -> Result<Record<Education>, AdminError> {
        self.get(id).await
    }

    pub async fn update_education(
        &self,
        id: &str,
        draft: EducationDraft,
    ) -> Result<(), AdminError> {
        let education = draft.into_education()?;
        self.patch::<Education>(id, to_fields(&education)?).await
    }

    pub async fn delete_education(&self, id: &str) -> Result<Education, AdminError> {
        Ok(self.remove::<Education>(id).await?.data)
    }

    // ---- skills ----

    /// Create an empty skill category at the end of the list.
    pub async fn add_category(&self, name: &str) -> Result<String, AdminError> {
        let name = name.trim();
        validate::require("category name", name)?;
        let existing = self
            .store
            .query(SKILLS, &Query::new().filter_eq("categoryName", name).limit(1))
            .await?;
        if !existing.is_empty() {
            return Err(AdminError::Duplicate(format!(
                "category \"{}\" already exists",
                name
            )));
        }
        self.append(SKILLS, to_fields(&SkillCategory::new(name))?)
            .await
    }

    pub async fn get_category(&self, id: &str) -> Result<Record<SkillCategory>, AdminError> {
        self.get(id).await
    }

    /// Rename a category. The new name must not belong to another category.
    pub async fn rename_category(&self, id: &str, name: &str) -> Result<(), AdminError> {
        let name = name.trim();
        validate::require("category name", name)?;
        let clash = self
            .store
            .query(SKILLS, &Query::new().filter_eq("categoryName", name))
            .await?;
        if clash.iter().any(|doc| doc.id != id) {
            return Err(AdminError::Duplicate(format!(
                "category \"{}\" already exists",
                name
            )));
        }
        let mut fields = Fields::new();
        fields.insert("categoryName".to_string(), json!(name));
        self.patch::<SkillCategory>(id, fields).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<SkillCategory, AdminError> {
        Ok(self.remove::<SkillCategory>(id).await?.data)
    }

    /// Skills of one category in presentation order.
    pub async fn skill_entries(&self, category_id: &str) -> Result<Vec<SkillEntry>, AdminError> {
        Ok(self.get_category(category_id).await?.data.ordered_skills())
    }

    /// Append comma-separated skill names to a category.
    ///
    /// Names already in the category are skipped. If every name is a
    /// duplicate nothing is written and `Duplicate` is returned. The stored
    /// list is renumbered `0..N-1` in the same update.
    pub async fn add_skills(
        &self,
        category_id: &str,
        input: &str,
    ) -> Result<AddedSkills, AdminError> {
        let names = split_list(input, ',');
        if names.is_empty() {
            return Err(AdminError::Validation(
                "enter at least one skill name".into(),
            ));
        }

        let category = self.get_category(category_id).await?.data;
        let mut known: HashSet<String> = category.skills.iter().map(|s| s.name.clone()).collect();
        let mut outcome = AddedSkills::default();
        for name in names {
            if known.insert(name.clone()) {
                outcome.added.push(name);
            } else {
                outcome.skipped.push(name);
            }
        }

        if outcome.added.is_empty() {
            return Err(AdminError::Duplicate(format!(
                "all skills already exist in the {} category",
                category.category_name
            )));
        }
        if !outcome.skipped.is_empty() {
            warn!(
                category = %category.category_name,
                skipped = ?outcome.skipped,
                "skipping duplicate skills"
            );
        }

        let mut skills = category.ordered_skills();
        let base = skills.len() as u64;
        skills.extend(
            outcome
                .added
                .iter()
                .enumerate()
                .map(|(i, name)| SkillEntry::new(name.clone(), base + i as u64)),
        );
        self.write_skills(category_id, skills).await?;
        Ok(outcome)
    }

    /// Remove one skill and renumber the remaining ones.
    pub async fn delete_skill(&self, category_id: &str, name: &str) -> Result<(), AdminError> {
        let category = self.get_category(category_id).await?.data;
        if !category.contains(name) {
            return Err(AdminError::NotFound(format!(
                "skill \"{}\" not found in the {} category",
                name, category.category_name
            )));
        }
        let remaining = category
            .ordered_skills()
            .into_iter()
            .filter(|s| s.name != name);
        self.write_skills(category_id, remaining).await
    }

    async fn write_skills(
        &self,
        category_id: &str,
        skills: impl IntoIterator<Item = SkillEntry>,
    ) -> Result<(), AdminError> {
        let skills = reindex(skills);
        let mut fields = Fields::new();
        let skills = serde_json::to_value(&skills).map_err(StoreError::from)?;
        fields.insert(SKILLS_FIELD.to_string(), skills);
        self.patch::<SkillCategory>(category_id, fields).await
    }

    // ---- ordering ----

    pub async fn reorder(
        &self,
        kind: ContentKind,
        ids: &[String],
    ) -> Result<ReorderReport, AdminError> {
        Ok(self.sync(kind).reorder(ids).await?)
    }

    pub async fn reorder_skills(
        &self,
        category_id: &str,
        names: &[String],
    ) -> Result<ReorderReport, AdminError> {
        Ok(self.skills_sync(category_id).reorder(names).await?)
    }

    /// Rewrite `order` as `0..N-1` in the current presentation order.
    pub async fn compact(&self, kind: ContentKind) -> Result<ReorderReport, AdminError> {
        let mut docs = self.store.query(kind.collection(), &Query::new()).await?;
        if docs.is_empty() {
            return Ok(ReorderReport {
                assignments: Vec::new(),
                writes: 0,
            });
        }
        docs.sort_by(|a, b| {
            presentation_key(a)
                .cmp(&presentation_key(b))
                .then_with(|| a.id.cmp(&b.id))
        });
        let ids: Vec<String> = docs.into_iter().map(|d| d.id).collect();
        info!(collection = kind.collection(), records = ids.len(), "compacting order");
        self.reorder(kind, &ids).await
    }
}

fn presentation_key(doc: &Document) -> u64 {
    doc.order().unwrap_or(u64::MAX)
}

fn decode<T: ContentModel>(doc: Document) -> Result<Record<T>, AdminError> {
    let data = serde_json::from_value::<T>(Value::Object(doc.fields)).map_err(StoreError::from)?;
    Ok(Record { id: doc.id, data })
}

/// Turn a store `NotFound` into a user-facing message naming the record kind.
fn missing<T: ContentModel>(err: StoreError) -> AdminError {
    match err {
        StoreError::NotFound { .. } => AdminError::NotFound(format!(
            "{} not found. It may have been deleted already.",
            T::KIND
        )),
        other => other.into(),
    }
}
