use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            is_admin    INTEGER NOT NULL DEFAULT 0,
            is_blocked  INTEGER NOT NULL DEFAULT 0,
            is_deleted  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS inventories (
            id                  TEXT PRIMARY KEY,
            owner_id            TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title               TEXT NOT NULL,
            description         TEXT,
            category            TEXT,
            is_public_writable  INTEGER NOT NULL DEFAULT 0,
            version             INTEGER NOT NULL DEFAULT 1,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_inventories_owner
            ON inventories(owner_id);

        CREATE TABLE IF NOT EXISTS inventory_access (
            id            TEXT PRIMARY KEY,
            inventory_id  TEXT NOT NULL REFERENCES inventories(id) ON DELETE CASCADE,
            user_id       TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            UNIQUE(inventory_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS custom_fields (
            id             TEXT PRIMARY KEY,
            inventory_id   TEXT NOT NULL REFERENCES inventories(id) ON DELETE CASCADE,
            title          TEXT NOT NULL,
            description    TEXT,
            field_type     TEXT NOT NULL,
            show_in_table  INTEGER NOT NULL DEFAULT 0,
            sort_order     INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_custom_fields_inventory
            ON custom_fields(inventory_id);

        CREATE TABLE IF NOT EXISTS items (
            id            TEXT PRIMARY KEY,
            inventory_id  TEXT NOT NULL REFERENCES inventories(id) ON DELETE CASCADE,
            custom_id     TEXT NOT NULL,
            created_by    TEXT NOT NULL REFERENCES users(id),
            created_at    TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(inventory_id, custom_id)
        );

        CREATE INDEX IF NOT EXISTS idx_items_inventory
            ON items(inventory_id);

        CREATE TABLE IF NOT EXISTS item_values (
            id        TEXT PRIMARY KEY,
            item_id   TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
            field_id  TEXT NOT NULL REFERENCES custom_fields(id) ON DELETE CASCADE,
            value     TEXT NOT NULL DEFAULT '',
            UNIQUE(item_id, field_id)
        );

        CREATE TABLE IF NOT EXISTS inventory_likes (
            id            TEXT PRIMARY KEY,
            inventory_id  TEXT NOT NULL REFERENCES inventories(id) ON DELETE CASCADE,
            user_id       TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            UNIQUE(inventory_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS comments (
            id            TEXT PRIMARY KEY,
            inventory_id  TEXT NOT NULL REFERENCES inventories(id) ON DELETE CASCADE,
            user_id       TEXT NOT NULL REFERENCES users(id),
            text          TEXT NOT NULL,
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_inventory
            ON comments(inventory_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
