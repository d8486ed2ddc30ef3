//! Item CRUD handlers
//!
//! Each handler resolves to a status code the request interceptor uses as
//! the `status` label: 200 on success, 404 for unknown ids.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::handlers::extractor::{ItemJson, ItemPath};
use crate::store::ItemId;

/// Request body for create and update
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ItemRequest {
    pub name: String,
}

/// Response body for every item operation
///
/// `name` is absent on delete; `status` is absent on read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ItemResponse {
    pub item_id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ItemResponse {
    fn new(item_id: ItemId, name: Option<String>, status: Option<&str>) -> Self {
        Self {
            item_id,
            name,
            status: status.map(str::to_string),
        }
    }
}

/// `POST /items`
pub async fn create(
    State(state): State<AppState>,
    ItemJson(request): ItemJson<ItemRequest>,
) -> Json<ItemResponse> {
    let item_id = state.store().create(request.name.clone()).await;
    Json(ItemResponse::new(item_id, Some(request.name), Some("created")))
}

/// `GET /items/{id}`
pub async fn read(
    State(state): State<AppState>,
    ItemPath(item_id): ItemPath,
) -> AppResult<Json<ItemResponse>> {
    let name = state
        .store()
        .read(item_id)
        .await
        .ok_or_else(AppError::item_not_found)?;
    Ok(Json(ItemResponse::new(item_id, Some(name), None)))
}

/// `PUT /items/{id}`
///
/// Unknown ids return 404 and are not created.
pub async fn update(
    State(state): State<AppState>,
    ItemPath(item_id): ItemPath,
    ItemJson(request): ItemJson<ItemRequest>,
) -> AppResult<Json<ItemResponse>> {
    if !state.store().update(item_id, request.name.clone()).await {
        return Err(AppError::item_not_found());
    }
    Ok(Json(ItemResponse::new(
        item_id,
        Some(request.name),
        Some("updated"),
    )))
}

/// `DELETE /items/{id}`
pub async fn delete(
    State(state): State<AppState>,
    ItemPath(item_id): ItemPath,
) -> AppResult<Json<ItemResponse>> {
    if !state.store().delete(item_id).await {
        return Err(AppError::item_not_found());
    }
    Ok(Json(ItemResponse::new(item_id, None, Some("deleted"))))
}
