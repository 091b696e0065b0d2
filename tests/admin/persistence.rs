//! Content survives a restart through the data file.

use std::sync::Arc;

use portfolio_sync::content::{ContentAdmin, Education, Project, SeedData, SkillCategory};
use portfolio_sync::store::InMemoryDocumentStore;

use crate::support::{education, project};

#[tokio::test]
async fn autosaved_content_reloads_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let store = InMemoryDocumentStore::load_from_file(&path)
        .await
        .unwrap()
        .with_autosave(path.clone());
    let admin = ContentAdmin::new(Arc::new(store));
    let a = admin.create_project(project("Atlas")).await.unwrap();
    let b = admin.create_project(project("Beacon")).await.unwrap();
    admin
        .reorder(
            portfolio_sync::ContentKind::Projects,
            &[b.clone(), a.clone()],
        )
        .await
        .unwrap();
    admin.create_education(education("HSC")).await.unwrap();
    drop(admin);

    let reloaded = InMemoryDocumentStore::load_from_file(&path).await.unwrap();
    let admin = ContentAdmin::new(Arc::new(reloaded));
    let ids: Vec<String> = admin
        .list::<Project>()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![b, a]);
    assert_eq!(admin.list::<Education>().await.unwrap().len(), 1);
}

#[tokio::test]
async fn seed_file_fills_a_fresh_store_once() {
    let dir = tempfile::tempdir().unwrap();
    let seed_path = dir.path().join("seed.json");
    std::fs::write(
        &seed_path,
        r#"{
            "projects": [{ "title": "Chatbot", "technologies": ["Python"] }],
            "skills": [
                { "categoryName": "Languages", "skills": ["Rust", "Go"] },
                { "categoryName": "Tools", "skills": ["Git"] }
            ]
        }"#,
    )
    .unwrap();

    let admin = ContentAdmin::new(Arc::new(InMemoryDocumentStore::new()));
    let seed = SeedData::from_file(&seed_path).await.unwrap();

    let first = admin.seed_if_empty(&seed).await.unwrap();
    assert_eq!((first.projects, first.skills, first.education), (1, 2, 0));
    let second = admin.seed_if_empty(&seed).await.unwrap();
    assert_eq!(second.total(), 0);

    let categories = admin.list::<SkillCategory>().await.unwrap();
    let names: Vec<&str> = categories
        .iter()
        .map(|c| c.data.category_name.as_str())
        .collect();
    assert_eq!(names, vec!["Languages", "Tools"]);
}
