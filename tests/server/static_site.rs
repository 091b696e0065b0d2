//! Static file serving and CORS behaviour.

use reqwest::{header, Method, StatusCode};

use crate::support::{site, start_server};

#[tokio::test]
async fn root_serves_index_html() {
    let dir = site();
    let server = start_server(dir.path()).await;

    let resp = server.client.get(server.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/html");
    assert_eq!(resp.text().await.unwrap(), "<h1>Portfolio</h1>");
}

#[tokio::test]
async fn query_strings_are_ignored() {
    let dir = site();
    let server = start_server(dir.path()).await;

    let resp = server
        .client
        .get(server.url("/css/style.css?v=42"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/css");
}

#[tokio::test]
async fn unknown_extensions_are_plain_text() {
    let dir = site();
    let server = start_server(dir.path()).await;

    let resp = server
        .client
        .get(server.url("/notes.unknownext"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/plain");
}

#[tokio::test]
async fn encoded_names_are_decoded() {
    let dir = site();
    let server = start_server(dir.path()).await;

    let resp = server
        .client
        .get(server.url("/my%20photo.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "spaced");
}

#[tokio::test]
async fn missing_files_are_404_text() {
    let dir = site();
    let server = start_server(dir.path()).await;

    let resp = server
        .client
        .get(server.url("/nope.html"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/plain");
    assert_eq!(resp.text().await.unwrap(), "File not found");
}

#[tokio::test]
async fn traversal_is_rejected() {
    let dir = site();
    let server = start_server(dir.path()).await;

    for path in ["/css/..%2f..%2fetc%2fpasswd", "/css/..%5cindex.html"] {
        let resp = server.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn unreadable_paths_are_500() {
    let dir = site();
    let server = start_server(dir.path()).await;

    let resp = server.client.get(server.url("/css")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.text().await.unwrap(), "Internal server error");
}

#[tokio::test]
async fn every_response_carries_cors_headers() {
    let dir = site();
    let server = start_server(dir.path()).await;

    for path in ["/", "/nope.html", "/api/health"] {
        let resp = server.client.get(server.url(path)).send().await.unwrap();
        let headers = resp.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*", "{path}");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, PUT, DELETE, OPTIONS"
        );
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization"
        );
    }
}

#[tokio::test]
async fn options_preflight_is_200() {
    let dir = site();
    let server = start_server(dir.path()).await;

    for path in ["/index.html", "/api/projects/order"] {
        let resp = server
            .client
            .request(Method::OPTIONS, server.url(path))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
