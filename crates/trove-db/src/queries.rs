use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use tracing::debug;
use uuid::Uuid;

use trove_types::models::{DEFAULT_ITEM_IMAGE, UserProfile};

use crate::models::{
    COLLECTION_COLUMNS, CategoryRow, CollectionRow, ITEM_COLUMNS, ItemRow, REVIEW_COLUMNS,
    ReviewRow, USER_COLUMNS, UserRow,
};
use crate::refs::Refs;
use crate::{Database, DbError, DbResult};

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

pub struct NewItem<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub image: Option<&'a str>,
    /// Category labels; unknown labels are dropped.
    pub categories: &'a [String],
}

impl Database {
    // -- Users --

    pub fn create_user(&self, new: &NewUser<'_>) -> DbResult<UserRow> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![id.to_string(), new.username, new.email, new.password_hash, now],
            )?;
            query_user_by_id(conn, &id.to_string())?
                .ok_or_else(|| anyhow::anyhow!("user {} vanished after insert", id).into())
        })
    }

    pub fn list_users(&self) -> DbResult<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, rowid"))?;
            let rows = stmt
                .query_map([], UserRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> DbResult<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    /// Lookup by raw id text. A malformed id simply matches nothing.
    pub fn get_user_by_id(&self, id: &str) -> DbResult<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    /// Load a user by username with collections and categories resolved.
    /// Dangling references are skipped.
    pub fn get_user_profile(&self, username: &str) -> DbResult<Option<UserProfile>> {
        self.with_conn(|conn| {
            let Some(user) = query_user_by_username(conn, username)? else {
                return Ok(None);
            };

            let collections = resolve(
                &user.collections,
                query_collections_by_ids(conn, &user.collections.0)?,
                |c| c.id,
            );
            let categories = resolve(
                &user.categories,
                query_categories_by_ids(conn, &user.categories.0)?,
                |c| c.id,
            );

            Ok(Some(UserProfile {
                id: user.id,
                username: user.username,
                email: user.email,
                image_url: user.image_url,
                header_image_url: user.header_image_url,
                userbio: user.userbio,
                pronouns: user.pronouns,
                categories: categories.into_iter().map(Into::into).collect(),
                collections: collections.into_iter().map(Into::into).collect(),
                followers: user.followers.into_inner(),
                following: user.following.into_inner(),
                created_at: user.created_at,
                updated_at: user.updated_at,
            }))
        })
    }

    // -- Categories --

    pub fn create_category(&self, label: &str) -> DbResult<CategoryRow> {
        let id = Uuid::new_v4();
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO categories (id, category) VALUES (?1, ?2)",
                params![id.to_string(), label],
            )?;
            Ok(CategoryRow {
                id,
                category: label.to_string(),
            })
        })
    }

    pub fn list_categories(&self) -> DbResult<Vec<CategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, category FROM categories ORDER BY category")?;
            let rows = stmt
                .query_map([], CategoryRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn find_categories_by_labels(&self, labels: &[String]) -> DbResult<Vec<CategoryRow>> {
        self.with_conn(|conn| query_categories_by_labels(conn, labels))
    }

    // -- Collections --

    /// Create a collection owned by `owner` and append it to the owner's
    /// `collections`, in one transaction.
    pub fn create_collection(
        &self,
        owner: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> DbResult<CollectionRow> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut user = query_user_by_id(&tx, &owner.to_string())?
                .ok_or_else(|| DbError::NotFound("User not found".to_string()))?;

            tx.execute(
                "INSERT INTO collections (id, name, description, created_by, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![id.to_string(), name, description, owner.to_string(), now],
            )?;

            user.collections.push(id);
            tx.execute(
                "UPDATE users SET collections = ?1, version = version + 1, updated_at = ?2
                 WHERE id = ?3",
                params![user.collections, now, owner.to_string()],
            )?;

            let row = query_collection_by_id(&tx, &id.to_string())?
                .ok_or_else(|| anyhow::anyhow!("collection {} vanished after insert", id))?;
            tx.commit()?;
            Ok(row)
        })
    }

    pub fn list_collections(&self) -> DbResult<Vec<CollectionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLLECTION_COLUMNS} FROM collections ORDER BY created_at, rowid"
            ))?;
            let rows = stmt
                .query_map([], CollectionRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_collection_by_id(&self, id: &str) -> DbResult<Option<CollectionRow>> {
        self.with_conn(|conn| query_collection_by_id(conn, id))
    }

    // -- Items --

    pub fn create_item(&self, new: &NewItem<'_>) -> DbResult<ItemRow> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let categories: Refs = query_categories_by_labels(&tx, new.categories)?
                .into_iter()
                .map(|c| c.id)
                .collect::<Vec<_>>()
                .into();

            tx.execute(
                "INSERT INTO items (id, name, description, image, categories, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    id.to_string(),
                    new.name,
                    new.description,
                    new.image.unwrap_or(DEFAULT_ITEM_IMAGE),
                    categories,
                    now
                ],
            )?;

            let row = query_item_by_id(&tx, &id.to_string())?
                .ok_or_else(|| anyhow::anyhow!("item {} vanished after insert", id))?;
            tx.commit()?;
            Ok(row)
        })
    }

    pub fn list_items(&self) -> DbResult<Vec<ItemRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY created_at, rowid"))?;
            let rows = stmt
                .query_map([], ItemRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_item_by_id(&self, id: &str) -> DbResult<Option<ItemRow>> {
        self.with_conn(|conn| query_item_by_id(conn, id))
    }

    // -- Reviews --

    /// Insert a review and append its id to the item's `reviews`.
    pub fn create_review(
        &self,
        item_id: Uuid,
        author_id: Uuid,
        rating: u8,
        comment: Option<&str>,
    ) -> DbResult<ReviewRow> {
        if !(1..=5).contains(&rating) {
            return Err(DbError::InvalidArgument(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut item = query_item_by_id(&tx, &item_id.to_string())?
                .ok_or_else(|| DbError::NotFound("Item not found".to_string()))?;

            tx.execute(
                "INSERT INTO reviews (id, item_id, author_id, rating, comment, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id.to_string(),
                    item_id.to_string(),
                    author_id.to_string(),
                    rating,
                    comment,
                    now
                ],
            )?;

            item.reviews.push(id);
            tx.execute(
                "UPDATE items SET reviews = ?1, updated_at = ?2 WHERE id = ?3",
                params![item.reviews, now, item_id.to_string()],
            )?;

            let row = tx.query_row(
                &format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1"),
                [id.to_string()],
                ReviewRow::from_row,
            )?;
            tx.commit()?;
            debug!("Review {} added to item {}", id, item_id);
            Ok(row)
        })
    }
}

/// Ids are stored lowercase and hyphenated. Any other spelling `Uuid` accepts
/// (uppercase, simple, braced, urn) is rewritten to that form; text that is
/// not an id at all matches nothing.
pub(crate) fn stored_id(raw: &str) -> Option<String> {
    raw.parse::<Uuid>().ok().map(|id| id.to_string())
}

pub(crate) fn query_user_by_id(conn: &Connection, id: &str) -> DbResult<Option<UserRow>> {
    let Some(id) = stored_id(id) else {
        return Ok(None);
    };
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            [id],
            UserRow::from_row,
        )
        .optional()?;
    Ok(row)
}

fn query_user_by_username(conn: &Connection, username: &str) -> DbResult<Option<UserRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            [username],
            UserRow::from_row,
        )
        .optional()?;
    Ok(row)
}

fn query_collection_by_id(conn: &Connection, id: &str) -> DbResult<Option<CollectionRow>> {
    let Some(id) = stored_id(id) else {
        return Ok(None);
    };
    let row = conn
        .query_row(
            &format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE id = ?1"),
            [id],
            CollectionRow::from_row,
        )
        .optional()?;
    Ok(row)
}

fn query_item_by_id(conn: &Connection, id: &str) -> DbResult<Option<ItemRow>> {
    let Some(id) = stored_id(id) else {
        return Ok(None);
    };
    let row = conn
        .query_row(
            &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
            [id],
            ItemRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Membership lookup: categories whose label is one of `labels`.
pub(crate) fn query_categories_by_labels(
    conn: &Connection,
    labels: &[String],
) -> DbResult<Vec<CategoryRow>> {
    query_in(
        conn,
        "SELECT id, category FROM categories WHERE category",
        labels,
        CategoryRow::from_row,
    )
}

fn query_categories_by_ids(conn: &Connection, ids: &[Uuid]) -> DbResult<Vec<CategoryRow>> {
    let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
    query_in(
        conn,
        "SELECT id, category FROM categories WHERE id",
        &ids,
        CategoryRow::from_row,
    )
}

fn query_collections_by_ids(conn: &Connection, ids: &[Uuid]) -> DbResult<Vec<CollectionRow>> {
    let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
    query_in(
        conn,
        &format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE id"),
        &ids,
        CollectionRow::from_row,
    )
}

/// Run `{select} IN (?1, ?2, ...)` over `values`. Empty input short-circuits.
fn query_in<T>(
    conn: &Connection,
    select: &str,
    values: &[String],
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> DbResult<Vec<T>> {
    if values.is_empty() {
        return Ok(vec![]);
    }

    let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!("{} IN ({})", select, placeholders.join(", "));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), map)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Order fetched documents by their position in `refs`, skipping ids that
/// did not resolve.
fn resolve<T: Clone>(refs: &Refs, fetched: Vec<T>, id_of: fn(&T) -> Uuid) -> Vec<T> {
    let by_id: HashMap<Uuid, T> = fetched.into_iter().map(|t| (id_of(&t), t)).collect();
    refs.0.iter().filter_map(|id| by_id.get(id).cloned()).collect()
}
