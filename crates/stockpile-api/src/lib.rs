pub mod access;
pub mod admin;
pub mod auth;
pub mod comments;
pub mod error;
pub mod fields;
pub mod inventories;
pub mod items;
pub mod middleware;
pub mod policy;

use tracing::warn;
use uuid::Uuid;

/// Parse a stored id, logging instead of failing on corruption.
pub(crate) fn parse_uuid(value: &str, what: &str) -> Uuid {
    value.parse().unwrap_or_else(|e| {
        warn!("Corrupt {what} '{value}': {e}");
        Uuid::default()
    })
}

/// Parse a stored timestamp. SQLite writes "YYYY-MM-DD HH:MM:SS" without a
/// timezone, so fall back to naive-as-UTC.
pub(crate) fn parse_timestamp(value: &str, what: &str) -> chrono::DateTime<chrono::Utc> {
    value
        .parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt {what} timestamp '{value}': {e}");
            chrono::DateTime::default()
        })
}
