use rusqlite::{Connection, OptionalExtension, params};

use crate::Database;
use crate::error::StoreError;
use crate::models::FieldRow;

/// Per-inventory cap on fields sharing one type.
const FIELDS_PER_TYPE: i64 = 3;

impl Database {
    /// Create a custom field definition. The count check and the insert run
    /// in one transaction so a concurrent create cannot push an inventory
    /// past the per-type cap.
    pub fn insert_field(
        &self,
        id: &str,
        inventory_id: &str,
        title: &str,
        description: Option<&str>,
        field_type: &str,
        show_in_table: bool,
        sort_order: i64,
    ) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM custom_fields WHERE inventory_id = ?1 AND field_type = ?2",
                params![inventory_id, field_type],
                |row| row.get(0),
            )?;
            if count >= FIELDS_PER_TYPE {
                return Err(StoreError::FieldTypeCap);
            }

            tx.execute(
                "INSERT INTO custom_fields
                     (id, inventory_id, title, description, field_type, show_in_table, sort_order)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![id, inventory_id, title, description, field_type, show_in_table, sort_order],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_field(&self, id: &str) -> Result<Option<FieldRow>, StoreError> {
        self.with_conn(|conn| query_field(conn, id))
    }

    pub fn list_fields(&self, inventory_id: &str) -> Result<Vec<FieldRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, inventory_id, title, description, field_type, show_in_table, sort_order
                 FROM custom_fields
                 WHERE inventory_id = ?1
                 ORDER BY sort_order ASC",
            )?;
            let rows = stmt
                .query_map([inventory_id], field_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Delete a field definition; its item values go with it via FK cascade.
    pub fn delete_field(&self, id: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM custom_fields WHERE id = ?1", [id])?;
            if n == 0 {
                return Err(StoreError::NotFound("field"));
            }
            Ok(())
        })
    }
}

fn query_field(conn: &Connection, id: &str) -> Result<Option<FieldRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, inventory_id, title, description, field_type, show_in_table, sort_order
         FROM custom_fields WHERE id = ?1",
    )?;
    let row = stmt.query_row([id], field_from_row).optional()?;
    Ok(row)
}

fn field_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FieldRow> {
    Ok(FieldRow {
        id: row.get(0)?,
        inventory_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        field_type: row.get(4)?,
        show_in_table: row.get(5)?,
        sort_order: row.get(6)?,
    })
}
