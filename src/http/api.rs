//! JSON content API handlers.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::auth::require_admin;
use super::{ApiError, AppState};
use crate::content::{
    AdminError, ContentKind, Education, EducationDraft, Project, ProjectDraft, SkillCategory,
};
use crate::ordered::ReorderReport;
use crate::store::DocumentStore;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub(super) struct ReorderBody {
    ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ReorderEntriesBody {
    names: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AddEntriesBody {
    names: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListParams {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryBody {
    category_name: String,
}

fn parse<T: DeserializeOwned>(body: Value) -> Result<T, AdminError> {
    serde_json::from_value(body).map_err(|e| AdminError::Validation(e.to_string()))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, AdminError> {
    serde_json::to_value(value).map_err(|e| AdminError::Io(e.to_string()))
}

fn report_json(report: &ReorderReport) -> Value {
    let assignments: Vec<Value> = report
        .assignments
        .iter()
        .map(|(id, order)| json!({ "id": id, "order": order }))
        .collect();
    json!({ "assignments": assignments, "writes": report.writes })
}

/// Only skill categories embed an ordered list.
fn skills_only(collection: &str) -> Result<(), AdminError> {
    match ContentKind::from_collection(collection)? {
        ContentKind::Skills => Ok(()),
        kind => Err(AdminError::NotFound(format!(
            "{} records have no entries",
            kind
        ))),
    }
}

/// `GET /api/health`
pub(super) async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

/// `GET /api/:collection`, optionally `?limit=n` for the first `n` records.
pub(super) async fn list<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(collection): Path<String>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    let admin = state.admin();
    let limit = params.limit;
    let body = match ContentKind::from_collection(&collection)? {
        ContentKind::Projects => to_json(&admin.preview::<Project>(limit).await?)?,
        ContentKind::Skills => to_json(&admin.preview::<SkillCategory>(limit).await?)?,
        ContentKind::Education => to_json(&admin.preview::<Education>(limit).await?)?,
    };
    Ok(Json(body))
}

/// `GET /api/:collection/:id`
pub(super) async fn get_one<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path((collection, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let admin = state.admin();
    let body = match ContentKind::from_collection(&collection)? {
        ContentKind::Projects => to_json(&admin.get_project(&id).await?)?,
        ContentKind::Skills => to_json(&admin.get_category(&id).await?)?,
        ContentKind::Education => to_json(&admin.get_education(&id).await?)?,
    };
    Ok(Json(body))
}

/// `POST /api/:collection`
pub(super) async fn create<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&state, &headers)?;
    let admin = state.admin();
    let id = match ContentKind::from_collection(&collection)? {
        ContentKind::Projects => admin.create_project(parse::<ProjectDraft>(body)?).await?,
        ContentKind::Skills => {
            let body = parse::<CategoryBody>(body)?;
            admin.add_category(&body.category_name).await?
        }
        ContentKind::Education => {
            admin
                .create_education(parse::<EducationDraft>(body)?)
                .await?
        }
    };
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// `PUT /api/:collection/:id`
pub(super) async fn update<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &headers)?;
    let admin = state.admin();
    match ContentKind::from_collection(&collection)? {
        ContentKind::Projects => admin.update_project(&id, parse(body)?).await?,
        ContentKind::Skills => {
            let body = parse::<CategoryBody>(body)?;
            admin.rename_category(&id, &body.category_name).await?
        }
        ContentKind::Education => admin.update_education(&id, parse(body)?).await?,
    }
    Ok(Json(json!({ "id": id })))
}

/// `DELETE /api/:collection/:id` - responds with the deleted record.
pub(super) async fn remove<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &headers)?;
    let admin = state.admin();
    let deleted = match ContentKind::from_collection(&collection)? {
        ContentKind::Projects => to_json(&admin.delete_project(&id).await?)?,
        ContentKind::Skills => to_json(&admin.delete_category(&id).await?)?,
        ContentKind::Education => to_json(&admin.delete_education(&id).await?)?,
    };
    Ok(Json(json!({ "id": id, "deleted": deleted })))
}

/// `PUT /api/:collection/order` with `{ "ids": [...] }`
pub(super) async fn reorder<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ReorderBody>,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &headers)?;
    let kind = ContentKind::from_collection(&collection)?;
    let report = state.admin().reorder(kind, &body.ids).await?;
    Ok(Json(report_json(&report)))
}

/// `POST /api/:collection/compact`
pub(super) async fn compact<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(collection): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &headers)?;
    let kind = ContentKind::from_collection(&collection)?;
    let report = state.admin().compact(kind).await?;
    Ok(Json(report_json(&report)))
}

/// `GET /api/skills/:id/entries`
pub(super) async fn list_entries<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path((collection, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    skills_only(&collection)?;
    let entries = state.admin().skill_entries(&id).await?;
    Ok(Json(to_json(&entries)?))
}

/// `POST /api/skills/:id/entries` with `{ "names": "a, b" }`
pub(super) async fn add_entries<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<AddEntriesBody>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&state, &headers)?;
    skills_only(&collection)?;
    let outcome = state.admin().add_skills(&id, &body.names).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "added": outcome.added, "skipped": outcome.skipped })),
    ))
}

/// `PUT /api/skills/:id/order` with `{ "names": [...] }`
pub(super) async fn reorder_entries<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<ReorderEntriesBody>,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &headers)?;
    skills_only(&collection)?;
    let report = state.admin().reorder_skills(&id, &body.names).await?;
    Ok(Json(report_json(&report)))
}

/// `DELETE /api/skills/:id/entries/:name`
pub(super) async fn delete_entry<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path((collection, id, name)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &headers)?;
    skills_only(&collection)?;
    state.admin().delete_skill(&id, &name).await?;
    Ok(Json(json!({ "id": id, "deleted": name })))
}
