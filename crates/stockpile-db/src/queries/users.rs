use rusqlite::{Connection, OptionalExtension};

use crate::Database;
use crate::error::StoreError;
use crate::models::UserRow;

impl Database {
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password) VALUES (?1, ?2, ?3, ?4)",
                (id, username, email, password_hash),
            )
            .map_err(|e| StoreError::duplicate_on_constraint(e, "user"))?;
            Ok(())
        })
    }

    pub fn user_by_email(&self, email: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn user_by_id(&self, id: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn update_profile(
        &self,
        id: &str,
        username: &str,
        email: &str,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let n = conn
                .execute(
                    "UPDATE users SET username = ?2, email = ?3 WHERE id = ?1 AND is_deleted = 0",
                    (id, username, email),
                )
                .map_err(|e| StoreError::duplicate_on_constraint(e, "user"))?;
            if n == 0 {
                return Err(StoreError::NotFound("user"));
            }
            Ok(())
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, email, password, is_admin, is_blocked, is_deleted
                 FROM users WHERE is_deleted = 0 ORDER BY username",
            )?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Set the blocked flag on every matching user. Returns how many ids
    /// matched a stored user.
    pub fn set_blocked(&self, ids: &[String], blocked: bool) -> Result<usize, StoreError> {
        self.update_flag(ids, "is_blocked", blocked)
    }

    /// Set or clear the admin role on every matching user.
    pub fn set_admin(&self, ids: &[String], admin: bool) -> Result<usize, StoreError> {
        self.update_flag(ids, "is_admin", admin)
    }

    /// Soft-delete: deleted users disappear from listings and can no longer
    /// authenticate, but their authored rows stay referentially intact.
    pub fn soft_delete_users(&self, ids: &[String]) -> Result<usize, StoreError> {
        self.update_flag(ids, "is_deleted", true)
    }

    fn update_flag(
        &self,
        ids: &[String],
        column: &'static str,
        value: bool,
    ) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.with_conn(|conn| {
            let placeholders: Vec<String> = (2..=ids.len() + 1).map(|i| format!("?{i}")).collect();
            let sql = format!(
                "UPDATE users SET {column} = ?1 WHERE id IN ({})",
                placeholders.join(", ")
            );
            let mut params: Vec<&dyn rusqlite::types::ToSql> = vec![&value];
            params.extend(ids.iter().map(|id| id as &dyn rusqlite::types::ToSql));
            let n = conn.execute(&sql, params.as_slice())?;
            Ok(n)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>, StoreError> {
    let sql = format!(
        "SELECT id, username, email, password, is_admin, is_blocked, is_deleted
         FROM users WHERE {column} = ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], user_from_row).optional()?;
    Ok(row)
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        is_admin: row.get(4)?,
        is_blocked: row.get(5)?,
        is_deleted: row.get(6)?,
    })
}
