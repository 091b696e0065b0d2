//! JSON content API.

use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::support::{site, start_server, TestServer, TOKEN};

async fn create(server: &TestServer, collection: &str, body: Value) -> String {
    let resp = server
        .client
        .post(server.url(&format!("/api/{collection}")))
        .bearer_auth(TOKEN)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

async fn list_titles(server: &TestServer) -> Vec<String> {
    let list: Vec<Value> = server
        .client
        .get(server.url("/api/projects"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    list.iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn health_check() {
    let dir = site();
    let server = start_server(dir.path()).await;

    let resp = server
        .client
        .get(server.url("/api/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn writes_need_the_admin_token() {
    let dir = site();
    let server = start_server(dir.path()).await;
    let url = server.url("/api/projects");

    let resp = server
        .client
        .post(&url)
        .json(&json!({ "title": "Sneaky" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = server
        .client
        .post(&url)
        .bearer_auth("wrong-token")
        .json(&json!({ "title": "Sneaky" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("invalid admin token"));

    assert!(server.store.writes().is_empty());
}

#[tokio::test]
async fn projects_crud_and_reorder() {
    let dir = site();
    let server = start_server(dir.path()).await;

    let a = create(&server, "projects", json!({ "title": "Atlas" })).await;
    let b = create(&server, "projects", json!({ "title": "Beacon" })).await;
    let c = create(
        &server,
        "projects",
        json!({ "title": "Comet", "demo": "https://comet.example.com" }),
    )
    .await;
    assert_eq!(list_titles(&server).await, vec!["Atlas", "Beacon", "Comet"]);

    let resp = server
        .client
        .put(server.url("/api/projects/order"))
        .bearer_auth(TOKEN)
        .json(&json!({ "ids": [c, a, b] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let report: Value = resp.json().await.unwrap();
    assert_eq!(report["writes"], 3);
    assert_eq!(report["assignments"][0], json!({ "id": c, "order": 0 }));
    assert_eq!(list_titles(&server).await, vec!["Comet", "Atlas", "Beacon"]);

    let one: Value = server
        .client
        .get(server.url(&format!("/api/projects/{c}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(one["id"], json!(c));
    assert_eq!(one["demo"], "https://comet.example.com");
    assert_eq!(one["github"], "#");
    assert_eq!(one["order"], 0);

    let resp = server
        .client
        .put(server.url(&format!("/api/projects/{a}")))
        .bearer_auth(TOKEN)
        .json(&json!({ "title": "Atlas 2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = server
        .client
        .delete(server.url(&format!("/api/projects/{b}")))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["deleted"]["title"], "Beacon");
    assert_eq!(list_titles(&server).await, vec!["Comet", "Atlas 2"]);
}

#[tokio::test]
async fn list_limit_returns_a_preview() {
    let dir = site();
    let server = start_server(dir.path()).await;
    for title in ["Atlas", "Beacon", "Comet"] {
        create(&server, "projects", json!({ "title": title })).await;
    }

    let preview: Vec<Value> = server
        .client
        .get(server.url("/api/projects?limit=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let titles: Vec<&str> = preview.iter().map(|p| p["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Atlas", "Beacon"]);

    let resp = server
        .client
        .get(server.url("/api/projects?limit=0"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bad_requests_map_to_status_codes() {
    let dir = site();
    let server = start_server(dir.path()).await;
    let a = create(&server, "projects", json!({ "title": "Atlas" })).await;

    let resp = server
        .client
        .put(server.url("/api/projects/order"))
        .bearer_auth(TOKEN)
        .json(&json!({ "ids": [a, "ghost"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("unknown ids [ghost]"));

    let resp = server
        .client
        .post(server.url("/api/projects"))
        .bearer_auth(TOKEN)
        .json(&json!({ "title": "Broken", "github": "not a url" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = server
        .client
        .get(server.url("/api/projects/ghost"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = server
        .client
        .get(server.url("/api/contacts"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = server
        .client
        .get(server.url(&format!("/api/projects/{a}/entries")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn skill_entries_round_trip() {
    let dir = site();
    let server = start_server(dir.path()).await;
    let id = create(&server, "skills", json!({ "categoryName": "Languages" })).await;

    let resp = server
        .client
        .post(server.url("/api/skills"))
        .bearer_auth(TOKEN)
        .json(&json!({ "categoryName": "Languages" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let entries_url = server.url(&format!("/api/skills/{id}/entries"));
    let resp = server
        .client
        .post(&entries_url)
        .bearer_auth(TOKEN)
        .json(&json!({ "names": "Rust, Go, Zig" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["added"], json!(["Rust", "Go", "Zig"]));

    let resp = server
        .client
        .put(server.url(&format!("/api/skills/{id}/order")))
        .bearer_auth(TOKEN)
        .json(&json!({ "names": ["Zig", "Rust", "Go"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(server.store.update_count("skills", &id), 2);

    let resp = server
        .client
        .delete(server.url(&format!("/api/skills/{id}/entries/Rust")))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let entries: Value = server
        .client
        .get(&entries_url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        entries,
        json!([{ "name": "Zig", "order": 0 }, { "name": "Go", "order": 1 }])
    );
}

#[tokio::test]
async fn compact_restores_dense_order() {
    let dir = site();
    let server = start_server(dir.path()).await;
    let a = create(
        &server,
        "education",
        json!({ "degree": "HSC", "institution": "College" }),
    )
    .await;
    let b = create(
        &server,
        "education",
        json!({ "degree": "SSC", "institution": "School" }),
    )
    .await;
    let c = create(
        &server,
        "education",
        json!({ "degree": "B.Sc.", "institution": "Uni" }),
    )
    .await;

    server
        .client
        .delete(server.url(&format!("/api/education/{a}")))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();

    let resp = server
        .client
        .post(server.url("/api/education/compact"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let report: Value = resp.json().await.unwrap();
    assert_eq!(
        report["assignments"],
        json!([{ "id": b, "order": 0 }, { "id": c, "order": 1 }])
    );
}
