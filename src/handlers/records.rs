use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::{NewRecord, Repository};
use crate::error::ApiError;
use crate::gate::Action;
use crate::middleware::{ApiResponse, ApiResult};
use crate::resource::{FieldSelection, ResourceDef};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ReadQuery {
    /// Restrict emitted attributes: ?fields=title,content
    pub fields: Option<String>,
}

fn field_selection(
    resource: &ResourceDef,
    raw: Option<&str>,
) -> Result<Option<FieldSelection>, ApiError> {
    match raw {
        None => Ok(None),
        Some(raw) => {
            let selection = FieldSelection::parse(raw, resource.name, &resource.schema)?;
            Ok(Some(selection))
        }
    }
}

/// GET /:resource/ - list all records of the collection
pub async fn list(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(query): Query<ReadQuery>,
) -> ApiResult<Value> {
    let resource = state.resource(&resource)?;
    let selection = field_selection(resource, query.fields.as_deref())?;

    let repository = Repository::new(resource, state.db.pool());
    let records = repository.select_all().await?;

    Ok(ApiResponse::success(resource.schema.project_all(&records, selection.as_ref())))
}

/// GET /:resource/:id - show a single record by primary key
pub async fn show(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, i64)>,
    Query(query): Query<ReadQuery>,
) -> ApiResult<Value> {
    let resource = state.resource(&resource)?;
    let selection = field_selection(resource, query.fields.as_deref())?;

    let repository = Repository::new(resource, state.db.pool());
    let record = repository
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} {} not found", resource.name, id)))?;

    Ok(ApiResponse::success(resource.schema.project(&record, selection.as_ref())))
}

/// POST /:resource/ - create a record from a flat JSON body
pub async fn create(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Value> {
    let resource = state.resource(&resource)?;
    state.authorize(&headers, resource, Action::Create).await?;

    // Parse the body by hand so malformed JSON surfaces as a structured
    // error instead of the extractor's plain-text rejection.
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::invalid_json(format!("Invalid JSON body: {}", e)))?;
    let record = NewRecord::from_json(resource, payload)?;

    let repository = Repository::new(resource, state.db.pool());
    let created = repository.insert(record).await?;

    Ok(ApiResponse::created(resource.schema.project(&created, None)))
}

/// PUT /:resource/:id - declared but not implemented
pub async fn update(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> ApiResult<Value> {
    let resource = state.resource(&resource)?;
    state.authorize(&headers, resource, Action::Update).await?;

    Err(ApiError::not_implemented(format!("PUT /{}/{} not implemented", resource.path, id)))
}

/// DELETE /:resource/:id - remove a record by primary key
pub async fn destroy(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> ApiResult<Value> {
    let resource = state.resource(&resource)?;
    state.authorize(&headers, resource, Action::Delete).await?;

    let repository = Repository::new(resource, state.db.pool());
    let deleted = repository.delete_by_id(id).await?;
    if !deleted {
        return Err(ApiError::not_found(format!("{} {} not found", resource.name, id)));
    }

    Ok(ApiResponse::success(json!({ "status": "deleted", "id": id })))
}
