use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::Database;
use crate::error::StoreError;
use crate::models::{ItemOwnershipRow, ItemRow, ItemValueRow};

impl Database {
    /// Insert an item plus one value row per supplied (field, value) pair in
    /// a single transaction. Every referenced field must belong to the item's
    /// inventory. A duplicate custom_id within the inventory — whether caught
    /// here or by the unique index under a concurrent insert — reports as
    /// `Duplicate("custom id")`; the same field supplied twice reports as
    /// `Duplicate("field value")`.
    pub fn insert_item(
        &self,
        id: &str,
        inventory_id: &str,
        custom_id: &str,
        created_by: &str,
        values: &[(Uuid, String)],
    ) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            check_fields_belong(&tx, inventory_id, values)?;

            tx.execute(
                "INSERT INTO items (id, inventory_id, custom_id, created_by)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, inventory_id, custom_id, created_by],
            )
            .map_err(|e| StoreError::duplicate_on_constraint(e, "custom id"))?;

            for (field_id, value) in values {
                tx.execute(
                    "INSERT INTO item_values (id, item_id, field_id, value)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![Uuid::new_v4().to_string(), id, field_id.to_string(), value],
                )
                .map_err(|e| StoreError::duplicate_on_constraint(e, "field value"))?;
            }

            tx.commit()?;
            Ok(())
        })
    }

    /// Upsert the supplied values and optionally replace the custom_id, in
    /// one transaction. Values for fields the item already carries are
    /// overwritten; new fields are inserted.
    pub fn update_item(
        &self,
        id: &str,
        custom_id: Option<&str>,
        values: &[(Uuid, String)],
    ) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let inventory_id: String = tx
                .query_row("SELECT inventory_id FROM items WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?
                .ok_or(StoreError::NotFound("item"))?;

            check_fields_belong(&tx, &inventory_id, values)?;

            if let Some(custom_id) = custom_id {
                tx.execute(
                    "UPDATE items SET custom_id = ?2 WHERE id = ?1",
                    params![id, custom_id],
                )
                .map_err(|e| StoreError::duplicate_on_constraint(e, "custom id"))?;
            }

            for (field_id, value) in values {
                tx.execute(
                    "INSERT INTO item_values (id, item_id, field_id, value)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(item_id, field_id) DO UPDATE SET value = excluded.value",
                    params![Uuid::new_v4().to_string(), id, field_id.to_string(), value],
                )?;
            }

            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_item(&self, id: &str) -> Result<Option<ItemRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT i.id, i.inventory_id, i.custom_id, i.created_by, u.username, i.created_at
                 FROM items i
                 LEFT JOIN users u ON u.id = i.created_by
                 WHERE i.id = ?1",
            )?;
            let row = stmt.query_row([id], item_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn list_items(&self, inventory_id: &str) -> Result<Vec<ItemRow>, StoreError> {
        // JOIN users to fetch the creator name in a single query (no N+1)
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT i.id, i.inventory_id, i.custom_id, i.created_by, u.username, i.created_at
                 FROM items i
                 LEFT JOIN users u ON u.id = i.created_by
                 WHERE i.inventory_id = ?1
                 ORDER BY i.created_at ASC",
            )?;
            let rows = stmt
                .query_map([inventory_id], item_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Batch-fetch values for a set of item ids.
    pub fn list_item_values(&self, item_ids: &[String]) -> Result<Vec<ItemValueRow>, StoreError> {
        if item_ids.is_empty() {
            return Ok(vec![]);
        }
        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=item_ids.len()).map(|i| format!("?{i}")).collect();
            let sql = format!(
                "SELECT item_id, field_id, value FROM item_values WHERE item_id IN ({})",
                placeholders.join(", ")
            );
            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = item_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();
            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(ItemValueRow {
                        item_id: row.get(0)?,
                        field_id: row.get(1)?,
                        value: row.get(2)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Ownership facts for a batch of item ids, for the caller's
    /// validate-everything-before-deleting pass.
    pub fn items_ownership(&self, ids: &[String]) -> Result<Vec<ItemOwnershipRow>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
            let sql = format!(
                "SELECT i.id, i.created_by, inv.owner_id
                 FROM items i
                 JOIN inventories inv ON inv.id = i.inventory_id
                 WHERE i.id IN ({})",
                placeholders.join(", ")
            );
            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();
            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(ItemOwnershipRow {
                        id: row.get(0)?,
                        created_by: row.get(1)?,
                        inventory_owner_id: row.get(2)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Delete the given items in one transaction; values cascade.
    pub fn delete_items(&self, ids: &[String]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
            let sql = format!("DELETE FROM items WHERE id IN ({})", placeholders.join(", "));
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

/// Every referenced field must belong to `inventory_id`; a field from another
/// inventory would let one collection's schema leak into another's items.
fn check_fields_belong(
    conn: &Connection,
    inventory_id: &str,
    values: &[(Uuid, String)],
) -> Result<(), StoreError> {
    for (field_id, _) in values {
        let owner: Option<String> = conn
            .query_row(
                "SELECT inventory_id FROM custom_fields WHERE id = ?1",
                [field_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match owner {
            None => return Err(StoreError::NotFound("field")),
            Some(owner) if owner != inventory_id => {
                return Err(StoreError::ForeignField {
                    field_id: field_id.to_string(),
                    inventory_id: inventory_id.to_string(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn item_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemRow> {
    Ok(ItemRow {
        id: row.get(0)?,
        inventory_id: row.get(1)?,
        custom_id: row.get(2)?,
        created_by: row.get(3)?,
        created_by_name: row
            .get::<_, Option<String>>(4)?
            .unwrap_or_else(|| "unknown".to_string()),
        created_at: row.get(5)?,
    })
}
