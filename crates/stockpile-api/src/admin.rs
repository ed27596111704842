use axum::{Extension, Json, extract::State, response::IntoResponse};

use stockpile_types::api::{AdminBatchResponse, AdminUserEntry, IdBatch};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::parse_uuid;

fn ensure_admin(user: &CurrentUser) -> Result<(), ApiError> {
    if user.is_admin { Ok(()) } else { Err(ApiError::Forbidden) }
}

fn batch_ids(req: &IdBatch) -> Result<Vec<String>, ApiError> {
    if req.ids.is_empty() {
        return Err(ApiError::BadRequest("empty id batch".into()));
    }
    Ok(req.ids.iter().map(|id| id.to_string()).collect())
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&user)?;

    let rows = state.db.list_users()?;
    let out: Vec<AdminUserEntry> = rows
        .into_iter()
        .map(|row| AdminUserEntry {
            id: parse_uuid(&row.id, "user id"),
            username: row.username,
            email: row.email,
            is_admin: row.is_admin,
            is_blocked: row.is_blocked,
        })
        .collect();
    Ok(Json(out))
}

/// Blocking a batch that includes the acting admin still succeeds, but the
/// response flags that the session's own authority just changed.
pub async fn block(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<IdBatch>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&user)?;
    let ids = batch_ids(&req)?;

    let updated = state.db.set_blocked(&ids, true)?;
    if updated == 0 {
        return Err(ApiError::NotFound("user"));
    }

    let force_reauth = req.ids.contains(&user.id);
    Ok(Json(AdminBatchResponse {
        updated,
        force_reauth,
    }))
}

pub async fn unblock(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<IdBatch>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&user)?;
    let ids = batch_ids(&req)?;

    let updated = state.db.set_blocked(&ids, false)?;
    if updated == 0 {
        return Err(ApiError::NotFound("user"));
    }

    Ok(Json(AdminBatchResponse {
        updated,
        force_reauth: false,
    }))
}

pub async fn promote(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<IdBatch>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&user)?;
    let ids = batch_ids(&req)?;

    let updated = state.db.set_admin(&ids, true)?;
    if updated == 0 {
        return Err(ApiError::NotFound("user"));
    }

    Ok(Json(AdminBatchResponse {
        updated,
        force_reauth: false,
    }))
}

/// Demoting a batch that includes the acting admin revokes their own
/// privilege mid-session; the response flags it so the client re-auths.
pub async fn demote(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<IdBatch>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&user)?;
    let ids = batch_ids(&req)?;

    let updated = state.db.set_admin(&ids, false)?;
    if updated == 0 {
        return Err(ApiError::NotFound("user"));
    }

    let force_reauth = req.ids.contains(&user.id);
    Ok(Json(AdminBatchResponse {
        updated,
        force_reauth,
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<IdBatch>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&user)?;
    let ids = batch_ids(&req)?;

    let updated = state.db.soft_delete_users(&ids)?;
    if updated == 0 {
        return Err(ApiError::NotFound("user"));
    }

    Ok(Json(AdminBatchResponse {
        updated,
        force_reauth: false,
    }))
}
