use chrono::Utc;
use rusqlite::params;
use tracing::{debug, info};

use crate::error::parse_id;
use crate::models::UserRow;
use crate::queries::{query_categories_by_labels, query_user_by_id};
use crate::{Database, DbError, DbResult};

pub const UNIQUE_PROFILE_MESSAGE: &str =
    "Username and email need to be unique. Either username or email is already used.";

/// Partial profile update. `None` leaves the stored value untouched.
#[derive(Debug, Default, Clone)]
pub struct UserPatch {
    pub email: Option<String>,
    /// Written as given; hashing happens before the patch is built.
    pub password: Option<String>,
    pub username: Option<String>,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub userbio: Option<String>,
    pub pronouns: Option<String>,
    /// Category labels. Replaces the whole set; unknown labels are dropped.
    pub categories: Option<Vec<String>>,
    /// When set, the write is rejected unless it matches the stored version.
    pub expected_version: Option<i64>,
}

impl Database {
    pub fn update_user(&self, id: &str, patch: UserPatch) -> DbResult<UserRow> {
        parse_id(id)?;

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut user = query_user_by_id(&tx, id)?
                .ok_or_else(|| DbError::NotFound("User not found".to_string()))?;

            if let Some(expected) = patch.expected_version {
                if expected != user.version {
                    return Err(DbError::Conflict(format!(
                        "User was modified concurrently (expected version {}, found {})",
                        expected, user.version
                    )));
                }
            }

            if let Some(labels) = &patch.categories {
                user.categories = query_categories_by_labels(&tx, labels)?
                    .into_iter()
                    .map(|c| c.id)
                    .collect::<Vec<_>>()
                    .into();
            }

            let UserPatch {
                email,
                password,
                username,
                image_url,
                header_image_url,
                userbio,
                pronouns,
                ..
            } = patch;
            replace(&mut user.email, email);
            replace(&mut user.password, password);
            replace(&mut user.username, username);
            replace_opt(&mut user.image_url, image_url);
            replace_opt(&mut user.header_image_url, header_image_url);
            replace_opt(&mut user.userbio, userbio);
            replace_opt(&mut user.pronouns, pronouns);

            write_profile(&tx, &user).map_err(|e| match e {
                DbError::Conflict(_) => DbError::Conflict(UNIQUE_PROFILE_MESSAGE.to_string()),
                other => other,
            })?;

            let updated = query_user_by_id(&tx, id)?
                .ok_or_else(|| anyhow::anyhow!("user {} vanished during update", id))?;
            tx.commit()?;

            debug!("Updated profile of {} (version {})", updated.username, updated.version);
            Ok(updated)
        })
    }

    /// Hard delete. References to this user held by other documents are left
    /// in place. Returns whether a row was removed.
    pub fn delete_user(&self, id: &str) -> DbResult<bool> {
        let id = parse_id(id)?;

        self.with_conn_mut(|conn| {
            let removed = conn.execute("DELETE FROM users WHERE id = ?1", [id.to_string()])? > 0;
            if removed {
                info!("Deleted user {}", id);
            }
            Ok(removed)
        })
    }
}

fn write_profile(conn: &rusqlite::Connection, user: &UserRow) -> DbResult<()> {
    conn.execute(
        "UPDATE users SET
             username = ?1, email = ?2, password = ?3, image_url = ?4, header_image_url = ?5,
             userbio = ?6, pronouns = ?7, categories = ?8,
             version = version + 1, updated_at = ?9
         WHERE id = ?10",
        params![
            user.username,
            user.email,
            user.password,
            user.image_url,
            user.header_image_url,
            user.userbio,
            user.pronouns,
            user.categories,
            Utc::now(),
            user.id.to_string()
        ],
    )?;
    Ok(())
}

fn replace(slot: &mut String, value: Option<String>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn replace_opt(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::NewUser;

    fn setup() -> (Database, UserRow, UserRow) {
        let db = Database::open_in_memory().unwrap();
        let a = db
            .create_user(&NewUser {
                username: "ana",
                email: "ana@example.com",
                password_hash: "hash-a",
            })
            .unwrap();
        let b = db
            .create_user(&NewUser {
                username: "ben",
                email: "ben@example.com",
                password_hash: "hash-b",
            })
            .unwrap();
        (db, a, b)
    }

    #[test]
    fn updates_only_supplied_fields() {
        let (db, a, _) = setup();

        let updated = db
            .update_user(
                &a.id.to_string(),
                UserPatch {
                    userbio: Some("collector of odd things".to_string()),
                    pronouns: Some("they/them".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.username, "ana");
        assert_eq!(updated.email, "ana@example.com");
        assert_eq!(updated.password, "hash-a");
        assert_eq!(updated.userbio.as_deref(), Some("collector of odd things"));
        assert_eq!(updated.pronouns.as_deref(), Some("they/them"));
        assert_eq!(updated.version, a.version + 1);
    }

    #[test]
    fn username_collision_is_conflict_and_leaves_user_untouched() {
        let (db, a, _) = setup();

        let err = db
            .update_user(
                &a.id.to_string(),
                UserPatch {
                    username: Some("ben".to_string()),
                    userbio: Some("should not stick".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        match err {
            DbError::Conflict(msg) => assert_eq!(msg, UNIQUE_PROFILE_MESSAGE),
            other => panic!("expected conflict, got {other:?}"),
        }

        let stored = db.get_user_by_id(&a.id.to_string()).unwrap().unwrap();
        assert_eq!(stored.username, "ana");
        assert!(stored.userbio.is_none());
    }

    #[test]
    fn email_collision_is_conflict() {
        let (db, a, _) = setup();
        let err = db
            .update_user(
                &a.id.to_string(),
                UserPatch {
                    email: Some("ben@example.com".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
        let stored = db.get_user_by_id(&a.id.to_string()).unwrap().unwrap();
        assert_eq!(stored.email, "ana@example.com");
    }

    #[test]
    fn categories_replace_and_drop_unknown_labels() {
        let (db, a, _) = setup();
        let books = db.create_category("books").unwrap();
        let games = db.create_category("games").unwrap();

        let first = db
            .update_user(
                &a.id.to_string(),
                UserPatch {
                    categories: Some(vec!["books".to_string(), "games".to_string()]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(first.categories.0.len(), 2);
        assert!(first.categories.contains(books.id));
        assert!(first.categories.contains(games.id));

        let second = db
            .update_user(
                &a.id.to_string(),
                UserPatch {
                    categories: Some(vec!["games".to_string(), "no-such-label".to_string()]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(second.categories.0, vec![games.id]);
    }

    #[test]
    fn stale_version_is_rejected() {
        let (db, a, _) = setup();
        let id = a.id.to_string();

        db.update_user(
            &id,
            UserPatch {
                userbio: Some("first".to_string()),
                expected_version: Some(a.version),
                ..Default::default()
            },
        )
        .unwrap();

        let err = db
            .update_user(
                &id,
                UserPatch {
                    userbio: Some("second".to_string()),
                    expected_version: Some(a.version),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
        let stored = db.get_user_by_id(&id).unwrap().unwrap();
        assert_eq!(stored.userbio.as_deref(), Some("first"));
    }

    #[test]
    fn invalid_and_unknown_ids() {
        let (db, _, _) = setup();
        assert!(matches!(
            db.update_user("nope", UserPatch::default()),
            Err(DbError::InvalidArgument(_))
        ));
        assert!(matches!(
            db.update_user(&uuid::Uuid::new_v4().to_string(), UserPatch::default()),
            Err(DbError::NotFound(_))
        ));
        assert!(matches!(db.delete_user("nope"), Err(DbError::InvalidArgument(_))));
    }

    #[test]
    fn non_canonical_ids_reach_the_stored_user() {
        let (db, a, b) = setup();

        let updated = db
            .update_user(
                &a.id.to_string().to_uppercase(),
                UserPatch {
                    pronouns: Some("she/her".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.id, a.id);
        assert_eq!(updated.pronouns.as_deref(), Some("she/her"));

        assert!(db.delete_user(&b.id.simple().to_string()).unwrap());
        assert!(db.get_user_by_id(&b.id.to_string()).unwrap().is_none());
    }

    #[test]
    fn delete_leaves_dangling_follow_references() {
        let (db, a, b) = setup();
        db.follow(&a.id.to_string(), &b.id.to_string()).unwrap();

        assert!(db.delete_user(&b.id.to_string()).unwrap());
        assert!(!db.delete_user(&b.id.to_string()).unwrap());

        let a2 = db.get_user_by_id(&a.id.to_string()).unwrap().unwrap();
        assert_eq!(a2.following.0, vec![b.id]);
    }
}
