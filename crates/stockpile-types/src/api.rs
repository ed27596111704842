use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fields::FieldType;

// -- JWT Claims --

/// JWT claims shared between stockpile-api (REST middleware) and
/// stockpile-gateway (WebSocket identify handshake). Canonical definition
/// lives here to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub is_admin: bool,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub username: String,
    pub email: String,
}

// -- Inventories --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateInventoryRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_public_writable: bool,
}

/// Partial update: absent fields preserve the stored values. The optional
/// `expected_version` enables optimistic concurrency — a stale value makes
/// the whole update fail with a version conflict.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateInventoryRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_public_writable: Option<bool>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct InventorySummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_public_writable: bool,
    pub version: i64,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub items_count: i64,
    pub likes_count: i64,
    pub user_has_liked: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

#[derive(Debug, Serialize)]
pub struct InventoryDetail {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_public_writable: bool,
    pub version: i64,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub likes_count: i64,
    pub user_has_liked: bool,
    pub can_edit: bool,
    pub can_manage: bool,
    pub can_delete: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchQuery {
    pub query: String,
}

// -- Batches --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdBatch {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub deleted: usize,
}

// -- Likes --

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub likes_count: i64,
}

// -- Access grants --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrantAccessRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct GrantEntry {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

// -- Custom fields --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateFieldRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub field_type: FieldType,
    #[serde(default)]
    pub show_in_table: bool,
    #[serde(default)]
    pub sort_order: i64,
}

#[derive(Debug, Serialize)]
pub struct FieldResponse {
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub field_type: FieldType,
    pub show_in_table: bool,
    pub sort_order: i64,
}

// -- Items --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldValue {
    pub field_id: Uuid,
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateItemRequest {
    pub inventory_id: Uuid,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub values: Vec<FieldValue>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub values: Vec<FieldValue>,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub custom_id: String,
    pub created_by: Uuid,
    pub created_by_name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub values: Vec<FieldValue>,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub text: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// -- Admin --

#[derive(Debug, Serialize)]
pub struct AdminUserEntry {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub is_blocked: bool,
}

/// `force_reauth` is set when a block or demote batch included the acting
/// admin's own id — the session just revoked its own authority and the
/// client must re-authenticate.
#[derive(Debug, Serialize)]
pub struct AdminBatchResponse {
    pub updated: usize,
    pub force_reauth: bool,
}
