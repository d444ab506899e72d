//! Row types. These map directly to SQLite rows and stay distinct from the
//! trove-types API models so the password hash and raw columns never leak.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use uuid::Uuid;

use trove_types::models::{Category, Collection, Item, Review, User};

use crate::refs::{Refs, get_id, get_opt_id};

pub(crate) const USER_COLUMNS: &str = "id, username, email, password, image_url, header_image_url, \
     userbio, pronouns, categories, collections, followers, following, version, created_at, updated_at";

pub(crate) const COLLECTION_COLUMNS: &str =
    "id, name, description, created_by, items, created_at, updated_at";

pub(crate) const ITEM_COLUMNS: &str = "id, name, description, image, categories, collections, \
     users, likes, reviews, created_at, updated_at";

pub(crate) const REVIEW_COLUMNS: &str = "id, item_id, author_id, rating, comment, created_at";

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password: String,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub userbio: Option<String>,
    pub pronouns: Option<String>,
    pub categories: Refs,
    pub collections: Refs,
    pub followers: Refs,
    pub following: Refs,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: get_id(row, 0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password: row.get(3)?,
            image_url: row.get(4)?,
            header_image_url: row.get(5)?,
            userbio: row.get(6)?,
            pronouns: row.get(7)?,
            categories: row.get(8)?,
            collections: row.get(9)?,
            followers: row.get(10)?,
            following: row.get(11)?,
            version: row.get(12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            image_url: row.image_url,
            header_image_url: row.header_image_url,
            userbio: row.userbio,
            pronouns: row.pronouns,
            categories: row.categories.into_inner(),
            collections: row.collections.into_inner(),
            followers: row.followers.into_inner(),
            following: row.following.into_inner(),
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: Uuid,
    pub category: String,
}

impl CategoryRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: get_id(row, 0)?,
            category: row.get(1)?,
        })
    }
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            category: row.category,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectionRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<Uuid>,
    pub items: Refs,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CollectionRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: get_id(row, 0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            created_by: get_opt_id(row, 3)?,
            items: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

impl From<CollectionRow> for Collection {
    fn from(row: CollectionRow) -> Self {
        Collection {
            id: row.id,
            name: row.name,
            description: row.description,
            created_by: row.created_by,
            items: row.items.into_inner(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ItemRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image: String,
    pub categories: Refs,
    pub collections: Refs,
    pub users: Refs,
    pub likes: Refs,
    pub reviews: Refs,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: get_id(row, 0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            image: row.get(3)?,
            categories: row.get(4)?,
            collections: row.get(5)?,
            users: row.get(6)?,
            likes: row.get(7)?,
            reviews: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            name: row.name,
            description: row.description,
            image: row.image,
            categories: row.categories.into_inner(),
            collections: row.collections.into_inner(),
            users: row.users.into_inner(),
            likes: row.likes.into_inner(),
            reviews: row.reviews.into_inner(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReviewRow {
    pub id: Uuid,
    pub item_id: Uuid,
    pub author_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReviewRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: get_id(row, 0)?,
            item_id: get_id(row, 1)?,
            author_id: get_id(row, 2)?,
            rating: row.get(3)?,
            comment: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            item: row.item_id,
            author: row.author_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}
