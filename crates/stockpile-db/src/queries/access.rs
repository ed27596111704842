use rusqlite::{OptionalExtension, params};

use crate::Database;
use crate::error::StoreError;
use crate::models::GrantRow;

impl Database {
    /// Insert an explicit write grant. The (inventory, user) pair is unique;
    /// a concurrent duplicate insert surfaces as the same `Duplicate` the
    /// pre-check would have produced.
    pub fn insert_grant(
        &self,
        id: &str,
        inventory_id: &str,
        user_id: &str,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM inventory_access WHERE inventory_id = ?1 AND user_id = ?2",
                    params![inventory_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Err(StoreError::Duplicate("access grant"));
            }

            conn.execute(
                "INSERT INTO inventory_access (id, inventory_id, user_id) VALUES (?1, ?2, ?3)",
                params![id, inventory_id, user_id],
            )
            .map_err(|e| StoreError::duplicate_on_constraint(e, "access grant"))?;
            Ok(())
        })
    }

    pub fn delete_grant(&self, inventory_id: &str, user_id: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM inventory_access WHERE inventory_id = ?1 AND user_id = ?2",
                params![inventory_id, user_id],
            )?;
            if n == 0 {
                return Err(StoreError::NotFound("access grant"));
            }
            Ok(())
        })
    }

    pub fn list_grants(&self, inventory_id: &str) -> Result<Vec<GrantRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT a.user_id, u.username, u.email
                 FROM inventory_access a
                 JOIN users u ON u.id = a.user_id
                 WHERE a.inventory_id = ?1
                 ORDER BY u.username",
            )?;
            let rows = stmt
                .query_map([inventory_id], |row| {
                    Ok(GrantRow {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn has_grant(&self, inventory_id: &str, user_id: &str) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let found: Option<String> = conn
                .query_row(
                    "SELECT id FROM inventory_access WHERE inventory_id = ?1 AND user_id = ?2",
                    params![inventory_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }
}
