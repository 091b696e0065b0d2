//! HTTP surface: the static site plus a JSON content API.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! - `GET /api/health` returns `{ "ok": true }`.
//! - `GET /api/:collection` lists `projects`, `skills` or `education` in order.
//! - `GET /api/:collection/:id` returns one record.
//! - `GET /api/skills/:id/entries` lists the skills of one category.
//! - Admin writes (bearer token): `POST /api/:collection`,
//!   `PUT|DELETE /api/:collection/:id`, `PUT /api/:collection/order`,
//!   `POST /api/:collection/compact`, `PUT /api/skills/:id/order`,
//!   `POST /api/skills/:id/entries`, `DELETE /api/skills/:id/entries/:name`.
//! - Anything else is served from the static root.
//!
//! Every response carries permissive CORS headers and `OPTIONS` always
//! answers 200.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use portfolio_sync::{http, ContentAdmin, InMemoryDocumentStore};
//!
//! let admin = ContentAdmin::new(Arc::new(InMemoryDocumentStore::new()));
//! let state = http::AppState::new(admin, "public").with_admin_token("s3cret");
//! let app = http::router(state);
//! ```

mod api;
mod auth;
mod static_files;

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::json;
use tracing::{error, info};

use crate::content::{AdminError, ContentAdmin};
use crate::store::DocumentStore;

pub use auth::constant_time_eq;

/// Shared state of every handler.
pub struct AppState<S> {
    admin: ContentAdmin<S>,
    static_root: Arc<PathBuf>,
    admin_token: Option<Arc<str>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            admin: self.admin.clone(),
            static_root: Arc::clone(&self.static_root),
            admin_token: self.admin_token.clone(),
        }
    }
}

impl<S: DocumentStore> AppState<S> {
    pub fn new(admin: ContentAdmin<S>, static_root: impl Into<PathBuf>) -> Self {
        Self {
            admin,
            static_root: Arc::new(static_root.into()),
            admin_token: None,
        }
    }

    /// Accept admin writes carrying this bearer token. Without one every
    /// admin write is rejected.
    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(Arc::from(token.into()));
        self
    }

    pub fn admin(&self) -> &ContentAdmin<S> {
        &self.admin
    }
}

/// Build the axum `Router` for the whole site.
pub fn router<S: DocumentStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/:collection", get(api::list::<S>).post(api::create::<S>))
        .route("/api/:collection/order", put(api::reorder::<S>))
        .route("/api/:collection/compact", post(api::compact::<S>))
        .route(
            "/api/:collection/:id",
            get(api::get_one::<S>)
                .put(api::update::<S>)
                .delete(api::remove::<S>),
        )
        .route("/api/:collection/:id/order", put(api::reorder_entries::<S>))
        .route(
            "/api/:collection/:id/entries",
            get(api::list_entries::<S>).post(api::add_entries::<S>),
        )
        .route(
            "/api/:collection/:id/entries/:name",
            delete(api::delete_entry::<S>),
        )
        .fallback(static_files::serve_static::<S>)
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Serve the site on `addr` until `shutdown` completes.
pub async fn serve<S, F>(state: AppState<S>, addr: SocketAddr, shutdown: F) -> std::io::Result<()>
where
    S: DocumentStore,
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "portfolio server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Answer preflight requests and stamp CORS headers on every response.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}

/// An `AdminError` rendered as `{ "error": message }` with its status code.
pub struct ApiError(AdminError);

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
