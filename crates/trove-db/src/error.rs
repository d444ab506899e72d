use rusqlite::ErrorCode;
use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    /// Unique-field collision or a stale expected version.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == ErrorCode::ConstraintViolation
                    && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                DbError::Conflict(
                    msg.clone()
                        .unwrap_or_else(|| "unique constraint failed".to_string()),
                )
            }
            _ => DbError::Internal(err.into()),
        }
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Internal(err.into())
    }
}

/// Parse a caller-supplied identifier, rejecting anything that is not a UUID.
pub fn parse_id(raw: &str) -> DbResult<uuid::Uuid> {
    raw.parse()
        .map_err(|_| DbError::InvalidArgument("Specified id is not valid".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_rejects_malformed() {
        assert!(matches!(parse_id("not-an-id"), Err(DbError::InvalidArgument(_))));
        assert!(parse_id("67e55044-10b1-426f-9247-bb680e5fe0c8").is_ok());
    }

    #[test]
    fn unique_violation_maps_to_conflict() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err: DbError = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[test]
    fn other_failures_are_internal() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err: DbError = conn
            .execute("INSERT INTO missing VALUES (1)", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, DbError::Internal(_)));
    }
}
