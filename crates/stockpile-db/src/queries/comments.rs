use rusqlite::params;

use crate::Database;
use crate::error::StoreError;
use crate::models::CommentRow;

impl Database {
    pub fn insert_comment(
        &self,
        id: &str,
        inventory_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, inventory_id, user_id, text) VALUES (?1, ?2, ?3, ?4)",
                params![id, inventory_id, user_id, text],
            )?;
            Ok(())
        })
    }

    pub fn list_comments(&self, inventory_id: &str) -> Result<Vec<CommentRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.inventory_id, c.user_id, u.username, c.text, c.created_at
                 FROM comments c
                 LEFT JOIN users u ON u.id = c.user_id
                 WHERE c.inventory_id = ?1
                 ORDER BY c.created_at DESC",
            )?;
            let rows = stmt
                .query_map([inventory_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        inventory_id: row.get(1)?,
                        user_id: row.get(2)?,
                        username: row
                            .get::<_, Option<String>>(3)?
                            .unwrap_or_else(|| "unknown".to_string()),
                        text: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
