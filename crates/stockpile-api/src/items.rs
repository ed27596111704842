use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use stockpile_db::models::ItemRow;
use stockpile_types::api::{
    BulkDeleteResponse, CreateItemRequest, FieldValue, IdBatch, ItemResponse, UpdateItemRequest,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::policy;
use crate::{parse_timestamp, parse_uuid};

fn item_response(row: ItemRow, values: Vec<FieldValue>) -> ItemResponse {
    ItemResponse {
        id: parse_uuid(&row.id, "item id"),
        inventory_id: parse_uuid(&row.inventory_id, "inventory id"),
        custom_id: row.custom_id,
        created_by: parse_uuid(&row.created_by, "creator id"),
        created_by_name: row.created_by_name,
        created_at: parse_timestamp(&row.created_at, "item"),
        values,
    }
}

fn to_value_pairs(values: &[FieldValue]) -> Vec<(Uuid, String)> {
    values
        .iter()
        .map(|v| (v.field_id, v.value.clone()))
        .collect()
}

/// Item listings are unconditionally public-readable, independent of the
/// inventory's own visibility settings. This mirrors the system's documented
/// behavior; tightening it is an open design choice.
pub async fn list_items(
    State(state): State<AppState>,
    Path(inventory_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_items(&inventory_id.to_string())?;

    let item_ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let value_rows = state.db.list_item_values(&item_ids)?;

    // Group values by item_id (cheap in-memory work)
    let mut value_map: HashMap<String, Vec<FieldValue>> = HashMap::new();
    for v in value_rows {
        value_map
            .entry(v.item_id.clone())
            .or_default()
            .push(FieldValue {
                field_id: parse_uuid(&v.field_id, "field id"),
                value: v.value,
            });
    }

    let out: Vec<ItemResponse> = rows
        .into_iter()
        .map(|row| {
            let values = value_map.remove(&row.id).unwrap_or_default();
            item_response(row, values)
        })
        .collect();

    Ok(Json(out))
}

pub async fn add_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let inventory = state
        .db
        .get_inventory(&req.inventory_id.to_string())?
        .ok_or(ApiError::NotFound("inventory"))?;

    let has_grant = state.db.has_grant(&inventory.id, &user.id.to_string())?;
    if !policy::capabilities(Some(&user), &inventory, has_grant).write {
        return Err(ApiError::Forbidden);
    }

    // Blank custom id: mint a fresh unique token.
    let custom_id = match req.custom_id.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => Uuid::new_v4().simple().to_string(),
    };

    let id = Uuid::new_v4();
    state.db.insert_item(
        &id.to_string(),
        &inventory.id,
        &custom_id,
        &user.id.to_string(),
        &to_value_pairs(&req.values),
    )?;

    let row = state
        .db
        .get_item(&id.to_string())?
        .ok_or(ApiError::NotFound("item"))?;
    Ok((StatusCode::CREATED, Json(item_response(row, req.values))))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state
        .db
        .get_item(&id.to_string())?
        .ok_or(ApiError::NotFound("item"))?;

    let inventory = state
        .db
        .get_inventory(&item.inventory_id)?
        .ok_or(ApiError::NotFound("inventory"))?;
    let has_grant = state.db.has_grant(&inventory.id, &user.id.to_string())?;
    if !policy::capabilities(Some(&user), &inventory, has_grant).write {
        return Err(ApiError::Forbidden);
    }

    // A blank custom id keeps the existing one.
    let custom_id = req
        .custom_id
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    state
        .db
        .update_item(&id.to_string(), custom_id, &to_value_pairs(&req.values))?;

    let row = state
        .db
        .get_item(&id.to_string())?
        .ok_or(ApiError::NotFound("item"))?;
    let value_rows = state.db.list_item_values(&[row.id.clone()])?;
    let values = value_rows
        .into_iter()
        .map(|v| FieldValue {
            field_id: parse_uuid(&v.field_id, "field id"),
            value: v.value,
        })
        .collect();

    Ok(Json(item_response(row, values)))
}

/// All-or-nothing: the entire batch is validated before anything is deleted.
/// An admin may delete any subset; everyone else only items they created or
/// items in inventories they own.
pub async fn delete_items(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<IdBatch>,
) -> Result<impl IntoResponse, ApiError> {
    if req.ids.is_empty() {
        return Err(ApiError::BadRequest("empty id batch".into()));
    }

    let ids: Vec<String> = req.ids.iter().map(|id| id.to_string()).collect();

    if user.is_admin {
        let deleted = state.db.delete_items(&ids)?;
        return Ok(Json(BulkDeleteResponse { deleted }));
    }

    let ownership = state.db.items_ownership(&ids)?;
    if ownership.len() != ids.len() {
        return Err(ApiError::NotFound("item"));
    }

    let actor_id = user.id.to_string();
    let allowed = ownership
        .iter()
        .all(|item| item.created_by == actor_id || item.inventory_owner_id == actor_id);
    if !allowed {
        return Err(ApiError::Forbidden);
    }

    let deleted = state.db.delete_items(&ids)?;
    Ok(Json(BulkDeleteResponse { deleted }))
}
