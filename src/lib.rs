//! Content service for a portfolio website.
//!
//! The site's user-reorderable lists (projects, skill categories, the skills
//! inside a category, education entries) live in a document store. This crate
//! keeps a live, sorted view of each list, persists drag-and-drop reorders as
//! dense `order` values, offers validated admin CRUD over the content and,
//! with the `http` feature, serves the static site plus a JSON API.

pub mod config;
pub mod content;
pub mod ordered;
pub mod session;
pub mod store;

#[cfg(feature = "http")]
pub mod http;

pub use config::{ConfigError, ServerConfig};
pub use content::{
    AdminError, ContentAdmin, ContentKind, Education, EducationDraft, Project, ProjectDraft,
    SeedData, SkillCategory, SkillEntry,
};
pub use ordered::{
    CollectionRef, LiveSnapshot, OrderedCollectionSync, Record, ReorderPolicy, ReorderReport,
    Snapshot, SubscriptionManager, SubscriptionState, SyncError,
};
pub use session::AdminSession;
pub use store::{DocumentStore, InMemoryDocumentStore, StoreError};
