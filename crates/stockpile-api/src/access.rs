use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use stockpile_types::api::{GrantAccessRequest, GrantEntry};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::parse_uuid;
use crate::policy;

/// Load the inventory and require the `manage` capability — viewing or
/// editing the access list is owner-or-admin only.
fn require_manage(
    state: &AppState,
    inventory_id: Uuid,
    user: &CurrentUser,
) -> Result<String, ApiError> {
    let inventory = state
        .db
        .get_inventory(&inventory_id.to_string())?
        .ok_or(ApiError::NotFound("inventory"))?;
    if !policy::capabilities(Some(user), &inventory, false).manage {
        return Err(ApiError::Forbidden);
    }
    Ok(inventory.id)
}

pub async fn list_access(
    State(state): State<AppState>,
    Path(inventory_id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let inventory_id = require_manage(&state, inventory_id, &user)?;

    let rows = state.db.list_grants(&inventory_id)?;
    let out: Vec<GrantEntry> = rows
        .into_iter()
        .map(|row| GrantEntry {
            user_id: parse_uuid(&row.user_id, "user id"),
            username: row.username,
            email: row.email,
        })
        .collect();
    Ok(Json(out))
}

pub async fn grant_access(
    State(state): State<AppState>,
    Path(inventory_id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<GrantAccessRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let inventory_id = require_manage(&state, inventory_id, &user)?;

    let target = state
        .db
        .user_by_id(&req.user_id.to_string())?
        .ok_or(ApiError::NotFound("user"))?;
    if target.is_deleted {
        return Err(ApiError::NotFound("user"));
    }

    state.db.insert_grant(
        &Uuid::new_v4().to_string(),
        &inventory_id,
        &req.user_id.to_string(),
    )?;

    Ok(StatusCode::CREATED)
}

pub async fn revoke_access(
    State(state): State<AppState>,
    Path((inventory_id, target_user_id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let inventory_id = require_manage(&state, inventory_id, &user)?;

    state
        .db
        .delete_grant(&inventory_id, &target_user_id.to_string())?;

    Ok(StatusCode::NO_CONTENT)
}
