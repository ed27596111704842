//! Database row types, mapping directly to SQLite rows. Distinct from the
//! stockpile-types API models to keep the storage layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_admin: bool,
    pub is_blocked: bool,
    pub is_deleted: bool,
}

#[derive(Debug)]
pub struct InventoryRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_public_writable: bool,
    pub version: i64,
}

/// Listing row: an inventory joined with its owner name and the aggregate
/// counts the presentation layer shows, plus viewer-relative flags.
pub struct InventorySummaryRow {
    pub id: String,
    pub owner_id: String,
    pub owner_name: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_public_writable: bool,
    pub version: i64,
    pub items_count: i64,
    pub likes_count: i64,
    pub viewer_has_liked: bool,
    pub viewer_has_grant: bool,
}

pub struct GrantRow {
    pub user_id: String,
    pub username: String,
    pub email: String,
}

pub struct FieldRow {
    pub id: String,
    pub inventory_id: String,
    pub title: String,
    pub description: Option<String>,
    pub field_type: String,
    pub show_in_table: bool,
    pub sort_order: i64,
}

pub struct ItemRow {
    pub id: String,
    pub inventory_id: String,
    pub custom_id: String,
    pub created_by: String,
    pub created_by_name: String,
    pub created_at: String,
}

pub struct ItemValueRow {
    pub item_id: String,
    pub field_id: String,
    pub value: String,
}

/// Ownership facts needed to authorize an item deletion.
pub struct ItemOwnershipRow {
    pub id: String,
    pub created_by: String,
    pub inventory_owner_id: String,
}

pub struct CommentRow {
    pub id: String,
    pub inventory_id: String,
    pub user_id: String,
    pub username: String,
    pub text: String,
    pub created_at: String,
}
