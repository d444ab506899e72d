//! Primitives for the collection ownership migration.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use crate::queries::query_user_by_id;
use crate::refs::get_id;
use crate::{Database, DbError, DbResult};

impl Database {
    pub fn all_user_ids(&self) -> DbResult<Vec<Uuid>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM users ORDER BY created_at, rowid")?;
            let ids = stmt
                .query_map([], |row| get_id(row, 0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    /// Collection ids, optionally limited to those with no `created_by` yet.
    pub fn all_collection_ids(&self, unowned_only: bool) -> DbResult<Vec<Uuid>> {
        self.with_conn(|conn| {
            let sql = if unowned_only {
                "SELECT id FROM collections WHERE created_by IS NULL ORDER BY created_at, rowid"
            } else {
                "SELECT id FROM collections ORDER BY created_at, rowid"
            };
            let mut stmt = conn.prepare(sql)?;
            let ids = stmt
                .query_map([], |row| get_id(row, 0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    /// Set `created_by` on the collection and append the collection to the
    /// user's `collections`. Both writes commit together.
    ///
    /// The append does not de-duplicate, so assigning the same pair twice
    /// records the collection twice on the user.
    pub fn assign_collection_owner(&self, collection_id: Uuid, user_id: Uuid) -> DbResult<()> {
        let now = Utc::now();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut user = query_user_by_id(&tx, &user_id.to_string())?
                .ok_or_else(|| DbError::NotFound(format!("User {} not found", user_id)))?;

            let updated = tx.execute(
                "UPDATE collections SET created_by = ?1, updated_at = ?2 WHERE id = ?3",
                params![user_id.to_string(), now, collection_id.to_string()],
            )?;
            if updated == 0 {
                return Err(DbError::NotFound(format!(
                    "Collection {} not found",
                    collection_id
                )));
            }

            user.collections.push(collection_id);
            tx.execute(
                "UPDATE users SET collections = ?1, version = version + 1, updated_at = ?2
                 WHERE id = ?3",
                params![user.collections, now, user_id.to_string()],
            )?;

            tx.commit()?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::NewUser;

    #[test]
    fn reassignment_moves_owner_and_appends() {
        let db = Database::open_in_memory().unwrap();
        let ana = db
            .create_user(&NewUser {
                username: "ana",
                email: "ana@example.com",
                password_hash: "hash",
            })
            .unwrap();
        let ben = db
            .create_user(&NewUser {
                username: "ben",
                email: "ben@example.com",
                password_hash: "hash",
            })
            .unwrap();
        let col = db.create_collection(ana.id, "Stamps", None).unwrap();

        db.assign_collection_owner(col.id, ben.id).unwrap();
        db.assign_collection_owner(col.id, ben.id).unwrap();

        let col = db.get_collection_by_id(&col.id.to_string()).unwrap().unwrap();
        assert_eq!(col.created_by, Some(ben.id));
        let ben = db.get_user_by_id(&ben.id.to_string()).unwrap().unwrap();
        assert_eq!(ben.collections.0, vec![col.id, col.id]);
        assert_eq!(db.all_user_ids().unwrap(), vec![ana.id, ben.id]);
    }

    #[test]
    fn unknown_collection_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        let ana = db
            .create_user(&NewUser {
                username: "ana",
                email: "ana@example.com",
                password_hash: "hash",
            })
            .unwrap();

        let err = db.assign_collection_owner(Uuid::new_v4(), ana.id).unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
        let ana = db.get_user_by_id(&ana.id.to_string()).unwrap().unwrap();
        assert!(ana.collections.0.is_empty());
    }

    #[test]
    fn unowned_filter() {
        let db = Database::open_in_memory().unwrap();
        let ana = db
            .create_user(&NewUser {
                username: "ana",
                email: "ana@example.com",
                password_hash: "hash",
            })
            .unwrap();
        let owned = db.create_collection(ana.id, "Owned", None).unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO collections (id, name, created_at, updated_at)
                 VALUES (?1, 'Loose', ?2, ?2)",
                params![Uuid::new_v4().to_string(), Utc::now()],
            )?;
            Ok(())
        })
        .unwrap();

        assert_eq!(db.all_collection_ids(false).unwrap().len(), 2);
        let unowned = db.all_collection_ids(true).unwrap();
        assert_eq!(unowned.len(), 1);
        assert_ne!(unowned[0], owned.id);
    }
}
