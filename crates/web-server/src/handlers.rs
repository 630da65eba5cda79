use crate::{
    error::AppError,
    extract::{AppJson, AppPath},
    AppState,
};
use axum::{extract::State, http::StatusCode, Json};
use core_types::{Item, ItemId, NewItem};
use database::DbError;
use serde_json::{json, Value};
use std::sync::Arc;

/// Any integer is a well-formed id. One outside the `SERIAL` range can never
/// name a row, so it is reported as not found rather than as a bad request.
fn item_id(raw: i64) -> Result<ItemId, AppError> {
    ItemId::try_from(raw).map_err(|_| AppError::Database(DbError::NotFound))
}

/// # GET /health
/// Liveness only; the database is not consulted.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// # GET /items
pub async fn list_items(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Item>>, AppError> {
    let items = state.items.list_items().await?;
    tracing::debug!(count = items.len(), "Listed items.");
    Ok(Json(items))
}

/// # GET /items/:id
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Item>, AppError> {
    let item = state.items.get_item(item_id(id)?).await?;
    Ok(Json(item))
}

/// # POST /items
/// Responds `201` with the stored item, including its new id.
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<NewItem>,
) -> Result<(StatusCode, Json<Item>), AppError> {
    payload.validate()?;
    let item = state.items.create_item(payload).await?;
    tracing::debug!(id = item.id, "Created item.");
    Ok((StatusCode::CREATED, Json(item)))
}

/// # PUT /items/:id
/// Overwrites name and price. The response echoes the request, it is not re-read.
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<NewItem>,
) -> Result<Json<Item>, AppError> {
    let id = item_id(id)?;
    payload.validate()?;
    let item = state.items.update_item(id, payload).await?;
    tracing::debug!(id, "Updated item.");
    Ok(Json(item))
}

/// # DELETE /items/:id
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode, AppError> {
    let id = item_id(id)?;
    state.items.delete_item(id).await?;
    tracing::debug!(id, "Deleted item.");
    Ok(StatusCode::NO_CONTENT)
}
