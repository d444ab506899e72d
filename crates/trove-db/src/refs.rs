//! Reference arrays and id columns.
//!
//! A reference array is stored as a JSON array of ids. It behaves like a
//! document array: order is kept and duplicates are allowed.

use rusqlite::Row;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Refs(pub Vec<Uuid>);

impl Refs {
    /// Append without de-duplication.
    pub fn push(&mut self, id: Uuid) {
        self.0.push(id);
    }

    /// Remove every occurrence of `id`. Returns how many were removed.
    pub fn remove_all(&mut self, id: Uuid) -> usize {
        let before = self.0.len();
        self.0.retain(|r| *r != id);
        before - self.0.len()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.0.contains(&id)
    }

    pub fn into_inner(self) -> Vec<Uuid> {
        self.0
    }
}

impl From<Vec<Uuid>> for Refs {
    fn from(ids: Vec<Uuid>) -> Self {
        Self(ids)
    }
}

impl ToSql for Refs {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let json = serde_json::to_string(&self.0)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        Ok(ToSqlOutput::from(json))
    }
}

impl FromSql for Refs {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        serde_json::from_str(text)
            .map(Refs)
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Read a TEXT id column as a `Uuid`.
pub fn get_id(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a nullable TEXT id column.
pub fn get_opt_id(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        s.parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}
