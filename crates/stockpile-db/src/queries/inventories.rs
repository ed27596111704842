use rusqlite::{Connection, OptionalExtension, params};

use crate::Database;
use crate::error::StoreError;
use crate::models::{InventoryRow, InventorySummaryRow};

/// Applied by `update_inventory`; `None` fields preserve stored values.
#[derive(Debug, Default)]
pub struct InventoryPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_public_writable: Option<bool>,
}

const SUMMARY_SQL: &str = "
    SELECT i.id, i.owner_id, u.username, i.title, i.description, i.category,
           i.is_public_writable, i.version,
           (SELECT COUNT(*) FROM items it WHERE it.inventory_id = i.id),
           (SELECT COUNT(*) FROM inventory_likes l WHERE l.inventory_id = i.id),
           EXISTS(SELECT 1 FROM inventory_likes l
                  WHERE l.inventory_id = i.id AND l.user_id = ?1),
           EXISTS(SELECT 1 FROM inventory_access a
                  WHERE a.inventory_id = i.id AND a.user_id = ?1)
    FROM inventories i
    JOIN users u ON u.id = i.owner_id";

impl Database {
    pub fn insert_inventory(
        &self,
        id: &str,
        owner_id: &str,
        title: &str,
        description: Option<&str>,
        category: Option<&str>,
        is_public_writable: bool,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO inventories (id, owner_id, title, description, category, is_public_writable)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, owner_id, title, description, category, is_public_writable],
            )?;
            Ok(())
        })
    }

    pub fn get_inventory(&self, id: &str) -> Result<Option<InventoryRow>, StoreError> {
        self.with_conn(|conn| query_inventory(conn, id))
    }

    /// Full listing with owner names, aggregate counts, and viewer-relative
    /// flags. `viewer` is the current actor id, or empty for anonymous —
    /// the empty string never matches a stored user id.
    pub fn list_inventories(&self, viewer: &str) -> Result<Vec<InventorySummaryRow>, StoreError> {
        self.with_conn(|conn| {
            let sql = format!("{SUMMARY_SQL} ORDER BY i.created_at DESC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([viewer], summary_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_inventory_summary(
        &self,
        id: &str,
        viewer: &str,
    ) -> Result<Option<InventorySummaryRow>, StoreError> {
        self.with_conn(|conn| {
            let sql = format!("{SUMMARY_SQL} WHERE i.id = ?2");
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt
                .query_row(params![viewer, id], summary_from_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_owned_inventories(
        &self,
        owner_id: &str,
    ) -> Result<Vec<InventorySummaryRow>, StoreError> {
        self.with_conn(|conn| {
            let sql = format!("{SUMMARY_SQL} WHERE i.owner_id = ?2 ORDER BY i.created_at DESC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![owner_id, owner_id], summary_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Inventories the user can write to without owning them: public-writable
    /// ones plus those with an explicit access grant.
    pub fn list_writable_inventories(
        &self,
        user_id: &str,
    ) -> Result<Vec<InventorySummaryRow>, StoreError> {
        self.with_conn(|conn| {
            let sql = format!(
                "{SUMMARY_SQL}
                 WHERE i.is_public_writable = 1
                    OR EXISTS(SELECT 1 FROM inventory_access a
                              WHERE a.inventory_id = i.id AND a.user_id = ?1)
                 ORDER BY i.created_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], summary_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Case-insensitive title substring match. Plain filtering, no ranking.
    pub fn search_inventories(
        &self,
        query: &str,
        viewer: &str,
    ) -> Result<Vec<InventorySummaryRow>, StoreError> {
        self.with_conn(|conn| {
            let sql = format!("{SUMMARY_SQL} WHERE i.title LIKE ?2 ORDER BY i.title");
            let mut stmt = conn.prepare(&sql)?;
            let pattern = format!("%{query}%");
            let rows = stmt
                .query_map(params![viewer, pattern], summary_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Optimistic-concurrency update. The caller passes the version it last
    /// read; a mismatch aborts without applying anything. The version guard
    /// is repeated in the UPDATE's WHERE clause so the check and the write
    /// commit atomically, and the counter advances with the field changes.
    pub fn update_inventory(
        &self,
        id: &str,
        patch: &InventoryPatch,
        expected_version: Option<i64>,
    ) -> Result<InventoryRow, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let current =
                query_inventory(&tx, id)?.ok_or(StoreError::NotFound("inventory"))?;

            if let Some(expected) = expected_version {
                if expected != current.version {
                    return Err(StoreError::VersionConflict);
                }
            }

            let title = patch.title.as_deref().unwrap_or(&current.title);
            let description = patch
                .description
                .as_deref()
                .or(current.description.as_deref());
            let category = patch.category.as_deref().or(current.category.as_deref());
            let is_public_writable = patch
                .is_public_writable
                .unwrap_or(current.is_public_writable);

            let n = tx.execute(
                "UPDATE inventories
                 SET title = ?2, description = ?3, category = ?4,
                     is_public_writable = ?5, version = version + 1
                 WHERE id = ?1 AND version = ?6",
                params![id, title, description, category, is_public_writable, current.version],
            )?;
            if n == 0 {
                return Err(StoreError::VersionConflict);
            }

            let updated =
                query_inventory(&tx, id)?.ok_or(StoreError::NotFound("inventory"))?;
            tx.commit()?;
            Ok(updated)
        })
    }

    /// Fetch the subset of `ids` that exist, with enough state for the
    /// caller to run its per-inventory delete policy.
    pub fn inventories_by_ids(&self, ids: &[String]) -> Result<Vec<InventoryRow>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
            let sql = format!(
                "SELECT id, owner_id, title, description, category, is_public_writable, version
                 FROM inventories WHERE id IN ({})",
                placeholders.join(", ")
            );
            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();
            let rows = stmt
                .query_map(params.as_slice(), inventory_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Delete the given inventories in one transaction. Items, item values,
    /// fields, grants, likes, and comments go with them via FK cascade.
    pub fn delete_inventories(&self, ids: &[String]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
            let sql = format!(
                "DELETE FROM inventories WHERE id IN ({})",
                placeholders.join(", ")
            );
            let params: Vec<&dyn rusqlite::types::ToSql> = ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();
            let n = tx.execute(&sql, params.as_slice())?;
            tx.commit()?;
            Ok(n)
        })
    }
}

fn query_inventory(conn: &Connection, id: &str) -> Result<Option<InventoryRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, title, description, category, is_public_writable, version
         FROM inventories WHERE id = ?1",
    )?;
    let row = stmt.query_row([id], inventory_from_row).optional()?;
    Ok(row)
}

fn inventory_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InventoryRow> {
    Ok(InventoryRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        is_public_writable: row.get(5)?,
        version: row.get(6)?,
    })
}

fn summary_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InventorySummaryRow> {
    Ok(InventorySummaryRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        owner_name: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        category: row.get(5)?,
        is_public_writable: row.get(6)?,
        version: row.get(7)?,
        items_count: row.get(8)?,
        likes_count: row.get(9)?,
        viewer_has_liked: row.get(10)?,
        viewer_has_grant: row.get(11)?,
    })
}
