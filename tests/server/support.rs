use std::path::Path;
use std::sync::Arc;

use portfolio_sync::content::ContentAdmin;
use portfolio_sync::http::{self, AppState};
use portfolio_sync::store::InMemoryDocumentStore;

pub const TOKEN: &str = "test-admin-token";

pub struct TestServer {
    pub base: String,
    pub store: Arc<InMemoryDocumentStore>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

/// Bind to port 0 and serve `static_root` plus the API.
pub async fn start_server(static_root: &Path) -> TestServer {
    let store = Arc::new(InMemoryDocumentStore::new());
    let admin = ContentAdmin::new(Arc::clone(&store));
    let state = AppState::new(admin, static_root).with_admin_token(TOKEN);
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://{addr}"),
        store,
        client: reqwest::Client::new(),
    }
}

/// A static root with an index page, a stylesheet and an unknown file type.
pub fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>Portfolio</h1>").unwrap();
    std::fs::create_dir(dir.path().join("css")).unwrap();
    std::fs::write(dir.path().join("css/style.css"), "body { margin: 0 }").unwrap();
    std::fs::write(dir.path().join("notes.unknownext"), "plain notes").unwrap();
    std::fs::write(dir.path().join("my photo.txt"), "spaced").unwrap();
    dir
}
