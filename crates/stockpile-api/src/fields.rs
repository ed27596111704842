use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;
use uuid::Uuid;

use stockpile_db::models::FieldRow;
use stockpile_types::api::{CreateFieldRequest, FieldResponse};
use stockpile_types::fields::FieldType;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::parse_uuid;
use crate::policy;

fn field_response(row: FieldRow) -> FieldResponse {
    let field_type = FieldType::parse(&row.field_type).unwrap_or_else(|| {
        warn!("Corrupt field type '{}' on field '{}'", row.field_type, row.id);
        FieldType::SingleLineText
    });
    FieldResponse {
        id: parse_uuid(&row.id, "field id"),
        inventory_id: parse_uuid(&row.inventory_id, "inventory id"),
        title: row.title,
        description: row.description,
        field_type,
        show_in_table: row.show_in_table,
        sort_order: row.sort_order,
    }
}

/// Field listings are public-readable, like item listings.
pub async fn list_fields(
    State(state): State<AppState>,
    Path(inventory_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .get_inventory(&inventory_id.to_string())?
        .ok_or(ApiError::NotFound("inventory"))?;

    let rows = state.db.list_fields(&inventory_id.to_string())?;
    let out: Vec<FieldResponse> = rows.into_iter().map(field_response).collect();
    Ok(Json(out))
}

pub async fn create_field(
    State(state): State<AppState>,
    Path(inventory_id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateFieldRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let inventory = state
        .db
        .get_inventory(&inventory_id.to_string())?
        .ok_or(ApiError::NotFound("inventory"))?;

    let has_grant = state.db.has_grant(&inventory.id, &user.id.to_string())?;
    if !policy::capabilities(Some(&user), &inventory, has_grant).write {
        return Err(ApiError::Forbidden);
    }

    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".into()));
    }

    let id = Uuid::new_v4();
    state.db.insert_field(
        &id.to_string(),
        &inventory.id,
        &req.title,
        req.description.as_deref(),
        req.field_type.as_str(),
        req.show_in_table,
        req.sort_order,
    )?;

    let row = state
        .db
        .get_field(&id.to_string())?
        .ok_or(ApiError::NotFound("field"))?;
    Ok((StatusCode::CREATED, Json(field_response(row))))
}

/// Deleting a field cascades deletion of every item value referencing it.
pub async fn delete_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let field = state
        .db
        .get_field(&id.to_string())?
        .ok_or(ApiError::NotFound("field"))?;

    let inventory = state
        .db
        .get_inventory(&field.inventory_id)?
        .ok_or(ApiError::NotFound("inventory"))?;
    if !policy::capabilities(Some(&user), &inventory, false).manage {
        return Err(ApiError::Forbidden);
    }

    state.db.delete_field(&id.to_string())?;
    Ok(StatusCode::NO_CONTENT)
}
