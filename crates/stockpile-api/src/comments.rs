use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use stockpile_types::api::{CommentResponse, CreateCommentRequest};
use stockpile_types::events::GatewayEvent;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::{parse_timestamp, parse_uuid};

pub async fn list_comments(
    State(state): State<AppState>,
    Path(inventory_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_comments(&inventory_id.to_string())?;
    let out: Vec<CommentResponse> = rows
        .into_iter()
        .map(|row| CommentResponse {
            id: parse_uuid(&row.id, "comment id"),
            inventory_id: parse_uuid(&row.inventory_id, "inventory id"),
            user_id: parse_uuid(&row.user_id, "user id"),
            username: row.username,
            text: row.text,
            created_at: parse_timestamp(&row.created_at, "comment"),
        })
        .collect();
    Ok(Json(out))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(inventory_id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .get_inventory(&inventory_id.to_string())?
        .ok_or(ApiError::NotFound("inventory"))?;

    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("comment text must not be empty".into()));
    }

    let id = Uuid::new_v4();
    state.db.insert_comment(
        &id.to_string(),
        &inventory_id.to_string(),
        &user.id.to_string(),
        &req.text,
    )?;

    let now = chrono::Utc::now();

    // Fan out to gateway subscribers of this inventory
    state.dispatcher.publish(GatewayEvent::CommentCreate {
        id,
        inventory_id,
        user_id: user.id,
        username: user.username.clone(),
        text: req.text.clone(),
        created_at: now,
    });

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            id,
            inventory_id,
            user_id: user.id,
            username: user.username,
            text: req.text,
            created_at: now,
        }),
    ))
}
