use thiserror::Error;

/// Typed storage failures. Domain checks that race with a storage-layer
/// uniqueness constraint report the constraint violation as the same variant
/// as the pre-check, so callers see one failure mode either way.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} already exists")]
    Duplicate(&'static str),

    #[error("at most 3 fields of the same type per inventory")]
    FieldTypeCap,

    #[error("field {field_id} does not belong to inventory {inventory_id}")]
    ForeignField {
        field_id: String,
        inventory_id: String,
    },

    #[error("inventory was modified by another user, reload and retry")]
    VersionConflict,

    #[error("database lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// Map a rusqlite error to `Duplicate(what)` when it is a constraint
    /// violation, keeping commit-time races indistinguishable from the
    /// pre-check failure.
    pub fn duplicate_on_constraint(err: rusqlite::Error, what: &'static str) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Duplicate(what)
            }
            other => Self::Sqlite(other),
        }
    }
}
