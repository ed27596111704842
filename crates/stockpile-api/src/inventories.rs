use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use stockpile_db::InventoryPatch;
use stockpile_db::models::InventorySummaryRow;
use stockpile_types::api::{
    BulkDeleteResponse, CreateInventoryRequest, IdBatch, InventoryDetail, InventorySummary,
    LikeResponse, SearchQuery, UpdateInventoryRequest,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::{CurrentUser, MaybeUser};
use crate::parse_uuid;
use crate::policy::{self, Capabilities};

/// Anonymous viewers query with an empty id, which matches no stored rows.
fn viewer_id(user: &MaybeUser) -> String {
    user.0
        .as_ref()
        .map(|u| u.id.to_string())
        .unwrap_or_default()
}

fn summary_response(row: InventorySummaryRow, caps: Capabilities) -> InventorySummary {
    InventorySummary {
        id: parse_uuid(&row.id, "inventory id"),
        title: row.title,
        description: row.description,
        category: row.category,
        is_public_writable: row.is_public_writable,
        version: row.version,
        owner_id: parse_uuid(&row.owner_id, "owner id"),
        owner_name: row.owner_name,
        items_count: row.items_count,
        likes_count: row.likes_count,
        user_has_liked: row.viewer_has_liked,
        can_edit: caps.write,
        can_delete: caps.delete,
    }
}

fn detail_response(row: InventorySummaryRow, caps: Capabilities) -> InventoryDetail {
    InventoryDetail {
        id: parse_uuid(&row.id, "inventory id"),
        title: row.title,
        description: row.description,
        category: row.category,
        is_public_writable: row.is_public_writable,
        version: row.version,
        owner_id: parse_uuid(&row.owner_id, "owner id"),
        owner_name: row.owner_name,
        likes_count: row.likes_count,
        user_has_liked: row.viewer_has_liked,
        can_edit: caps.write,
        can_manage: caps.manage,
        can_delete: caps.delete,
    }
}

pub async fn list_inventories(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_inventories(&viewer_id(&user))?;
    let out: Vec<InventorySummary> = rows
        .into_iter()
        .map(|row| {
            let caps = policy::summary_capabilities(user.0.as_ref(), &row);
            summary_response(row, caps)
        })
        .collect();
    Ok(Json(out))
}

pub async fn get_inventory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<MaybeUser>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_inventory_summary(&id.to_string(), &viewer_id(&user))?
        .ok_or(ApiError::NotFound("inventory"))?;
    let caps = policy::summary_capabilities(user.0.as_ref(), &row);
    Ok(Json(detail_response(row, caps)))
}

pub async fn list_mine(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_owned_inventories(&user.id.to_string())?;
    let out: Vec<InventorySummary> = rows
        .into_iter()
        .map(|row| {
            let caps = policy::summary_capabilities(Some(&user), &row);
            summary_response(row, caps)
        })
        .collect();
    Ok(Json(out))
}

pub async fn list_writable(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_writable_inventories(&user.id.to_string())?;
    let out: Vec<InventorySummary> = rows
        .into_iter()
        .map(|row| {
            let caps = policy::summary_capabilities(Some(&user), &row);
            summary_response(row, caps)
        })
        .collect();
    Ok(Json(out))
}

pub async fn search_inventories(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    Extension(user): Extension<MaybeUser>,
) -> Result<impl IntoResponse, ApiError> {
    if query.query.is_empty() {
        return Ok(Json(Vec::<InventorySummary>::new()));
    }
    let rows = state
        .db
        .search_inventories(&query.query, &viewer_id(&user))?;
    let out: Vec<InventorySummary> = rows
        .into_iter()
        .map(|row| {
            let caps = policy::summary_capabilities(user.0.as_ref(), &row);
            summary_response(row, caps)
        })
        .collect();
    Ok(Json(out))
}

pub async fn create_inventory(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateInventoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".into()));
    }

    let id = Uuid::new_v4();
    state.db.insert_inventory(
        &id.to_string(),
        &user.id.to_string(),
        &req.title,
        req.description.as_deref(),
        req.category.as_deref(),
        req.is_public_writable,
    )?;

    let row = state
        .db
        .get_inventory_summary(&id.to_string(), &user.id.to_string())?
        .ok_or(ApiError::NotFound("inventory"))?;
    let caps = policy::summary_capabilities(Some(&user), &row);
    Ok((StatusCode::CREATED, Json(detail_response(row, caps))))
}

/// Optimistic-concurrency update: the policy check runs before the version
/// check, and a stale `expected_version` aborts with nothing applied.
pub async fn update_inventory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateInventoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let inventory = state
        .db
        .get_inventory(&id.to_string())?
        .ok_or(ApiError::NotFound("inventory"))?;

    let has_grant = state
        .db
        .has_grant(&inventory.id, &user.id.to_string())?;
    if !policy::capabilities(Some(&user), &inventory, has_grant).write {
        return Err(ApiError::Forbidden);
    }

    let patch = InventoryPatch {
        title: req.title,
        description: req.description,
        category: req.category,
        is_public_writable: req.is_public_writable,
    };
    state
        .db
        .update_inventory(&id.to_string(), &patch, req.expected_version)?;

    let row = state
        .db
        .get_inventory_summary(&id.to_string(), &user.id.to_string())?
        .ok_or(ApiError::NotFound("inventory"))?;
    let caps = policy::summary_capabilities(Some(&user), &row);
    Ok(Json(detail_response(row, caps)))
}

/// Partial success is the contract here: delete exactly the subset the actor
/// may delete and report the count, unlike item bulk deletion which is
/// all-or-nothing.
pub async fn bulk_delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<IdBatch>,
) -> Result<impl IntoResponse, ApiError> {
    if req.ids.is_empty() {
        return Err(ApiError::BadRequest("empty id batch".into()));
    }

    let ids: Vec<String> = req.ids.iter().map(|id| id.to_string()).collect();
    let inventories = state.db.inventories_by_ids(&ids)?;
    if inventories.is_empty() {
        return Err(ApiError::NotFound("inventory"));
    }

    // Grants never confer delete, so the policy check needs no grant lookup.
    let deletable: Vec<String> = inventories
        .into_iter()
        .filter(|inv| policy::capabilities(Some(&user), inv, false).delete)
        .map(|inv| inv.id)
        .collect();

    if deletable.is_empty() {
        return Err(ApiError::Forbidden);
    }

    let deleted = state.db.delete_inventories(&deletable)?;
    Ok(Json(BulkDeleteResponse { deleted }))
}

pub async fn toggle_like(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .get_inventory(&id.to_string())?
        .ok_or(ApiError::NotFound("inventory"))?;

    let (liked, likes_count) = state.db.toggle_like(
        &Uuid::new_v4().to_string(),
        &id.to_string(),
        &user.id.to_string(),
    )?;

    Ok(Json(LikeResponse { liked, likes_count }))
}
