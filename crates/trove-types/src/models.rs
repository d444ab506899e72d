use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder stored on items created without an image.
pub const DEFAULT_ITEM_IMAGE: &str = "No image";

/// Public view of a user document. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub userbio: Option<String>,
    pub pronouns: Option<String>,
    pub categories: Vec<Uuid>,
    pub collections: Vec<Uuid>,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user with `collections` and `categories` resolved to full documents.
/// References that no longer resolve are left out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub userbio: Option<String>,
    pub pronouns: Option<String>,
    pub categories: Vec<Category>,
    pub collections: Vec<Collection>,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// At most one owning user.
    pub created_by: Option<Uuid>,
    pub items: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image: String,
    pub categories: Vec<Uuid>,
    pub collections: Vec<Uuid>,
    pub users: Vec<Uuid>,
    pub likes: Vec<Uuid>,
    pub reviews: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub item: Uuid,
    pub author: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
