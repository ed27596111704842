use rusqlite::{OptionalExtension, params};

use crate::Database;
use crate::error::StoreError;

impl Database {
    /// Toggle a like: removes if it exists, inserts if not. Returns the new
    /// liked state and the aggregate count read inside the same transaction.
    pub fn toggle_like(
        &self,
        id: &str,
        inventory_id: &str,
        user_id: &str,
    ) -> Result<(bool, i64), StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM inventory_likes WHERE inventory_id = ?1 AND user_id = ?2",
                    params![inventory_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;

            let liked = match existing {
                Some(existing_id) => {
                    tx.execute("DELETE FROM inventory_likes WHERE id = ?1", [&existing_id])?;
                    false
                }
                None => {
                    tx.execute(
                        "INSERT INTO inventory_likes (id, inventory_id, user_id) VALUES (?1, ?2, ?3)",
                        params![id, inventory_id, user_id],
                    )
                    .map_err(|e| StoreError::duplicate_on_constraint(e, "like"))?;
                    true
                }
            };

            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM inventory_likes WHERE inventory_id = ?1",
                [inventory_id],
                |row| row.get(0),
            )?;

            tx.commit()?;
            Ok((liked, count))
        })
    }
}
