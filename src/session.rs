//! AdminSession - one admin panel's live views of the content collections.

use std::sync::Arc;

use tracing::info;

use crate::content::{
    AdminError, ContentAdmin, ContentKind, Education, Project, SkillCategory, SkillEntry,
};
use crate::ordered::{
    CollectionRef, LiveSnapshot, ReorderReport, Snapshot, SubscriptionManager, SubscriptionState,
};
use crate::store::DocumentStore;

/// Owns the subscriptions of one signed-in admin.
///
/// Opening a view that is already open replaces its render callback instead of
/// adding a second one. `close` (or dropping the session) detaches every feed.
pub struct AdminSession<S> {
    admin: ContentAdmin<S>,
    subscriptions: SubscriptionManager<S>,
}

impl<S: DocumentStore> AdminSession<S> {
    pub fn new(admin: ContentAdmin<S>) -> Self {
        let subscriptions = SubscriptionManager::new(Arc::clone(admin.store()));
        Self {
            admin,
            subscriptions,
        }
    }

    pub fn admin(&self) -> &ContentAdmin<S> {
        &self.admin
    }

    pub fn subscriptions(&self) -> &SubscriptionManager<S> {
        &self.subscriptions
    }

    pub async fn open_projects<F>(&mut self, render: F) -> Result<LiveSnapshot<Project>, AdminError>
    where
        F: FnMut(&Snapshot<Project>) + Send + 'static,
    {
        let sync = self.admin.sync(ContentKind::Projects);
        Ok(sync.subscribe(&mut self.subscriptions, render).await?)
    }

    pub async fn open_skill_categories<F>(
        &mut self,
        render: F,
    ) -> Result<LiveSnapshot<SkillCategory>, AdminError>
    where
        F: FnMut(&Snapshot<SkillCategory>) + Send + 'static,
    {
        let sync = self.admin.sync(ContentKind::Skills);
        Ok(sync.subscribe(&mut self.subscriptions, render).await?)
    }

    /// Live view of the skills embedded in one category.
    pub async fn open_skills<F>(
        &mut self,
        category_id: &str,
        render: F,
    ) -> Result<LiveSnapshot<SkillEntry>, AdminError>
    where
        F: FnMut(&Snapshot<SkillEntry>) + Send + 'static,
    {
        let sync = self.admin.skills_sync(category_id);
        Ok(sync.subscribe(&mut self.subscriptions, render).await?)
    }

    pub async fn open_education<F>(
        &mut self,
        render: F,
    ) -> Result<LiveSnapshot<Education>, AdminError>
    where
        F: FnMut(&Snapshot<Education>) + Send + 'static,
    {
        let sync = self.admin.sync(ContentKind::Education);
        Ok(sync.subscribe(&mut self.subscriptions, render).await?)
    }

    pub async fn reorder_projects(&self, ids: &[String]) -> Result<ReorderReport, AdminError> {
        self.admin.reorder(ContentKind::Projects, ids).await
    }

    pub async fn reorder_skill_categories(
        &self,
        ids: &[String],
    ) -> Result<ReorderReport, AdminError> {
        self.admin.reorder(ContentKind::Skills, ids).await
    }

    pub async fn reorder_skills(
        &self,
        category_id: &str,
        names: &[String],
    ) -> Result<ReorderReport, AdminError> {
        self.admin.reorder_skills(category_id, names).await
    }

    pub async fn reorder_education(&self, ids: &[String]) -> Result<ReorderReport, AdminError> {
        self.admin.reorder(ContentKind::Education, ids).await
    }

    /// Stop watching one view.
    pub fn close_view(&mut self, collection: &CollectionRef) -> bool {
        self.subscriptions.unsubscribe(collection)
    }

    pub fn state(&self, collection: &CollectionRef) -> SubscriptionState {
        self.subscriptions.state(collection)
    }

    /// End the session. Returns the number of views that were open.
    pub fn close(&mut self) -> usize {
        let closed = self.subscriptions.unsubscribe_all();
        info!(views = closed, "admin session closed");
        closed
    }
}
