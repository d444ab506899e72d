//! Follower/following graph.
//!
//! Both sides of an edge are written in one transaction, so a failure never
//! leaves one user following another without the matching follower entry.

use chrono::Utc;
use rusqlite::{Transaction, params};
use tracing::debug;
use uuid::Uuid;

use crate::models::UserRow;
use crate::queries::query_user_by_id;
use crate::{Database, DbError, DbResult};

impl Database {
    /// `user_id` starts following `target_id`.
    ///
    /// Appends without de-duplication: following twice records the edge twice.
    /// Returns the target's username.
    pub fn follow(&self, user_id: &str, target_id: &str) -> DbResult<String> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let (mut user, mut target) = load_pair(&tx, user_id, target_id)?;

            user.following.push(target.id);
            target.followers.push(user.id);

            save_edges(&tx, &user, &target)?;
            tx.commit()?;

            debug!("{} now follows {}", user.username, target.username);
            Ok(target.username)
        })
    }

    /// `user_id` stops following `target_id`. Every occurrence is removed on
    /// both sides; unfollowing an absent edge is a no-op.
    pub fn unfollow(&self, user_id: &str, target_id: &str) -> DbResult<String> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let (mut user, mut target) = load_pair(&tx, user_id, target_id)?;

            let removed = user.following.remove_all(target.id);
            target.followers.remove_all(user.id);

            save_edges(&tx, &user, &target)?;
            tx.commit()?;

            debug!(
                "{} unfollowed {} ({} edge(s) removed)",
                user.username, target.username, removed
            );
            Ok(target.username)
        })
    }
}

fn load_pair(tx: &Transaction<'_>, user_id: &str, target_id: &str) -> DbResult<(UserRow, UserRow)> {
    let same = match (user_id.parse::<Uuid>(), target_id.parse::<Uuid>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => user_id == target_id,
    };
    if same {
        return Err(DbError::InvalidArgument(
            "Users cannot follow themselves".to_string(),
        ));
    }

    let target = query_user_by_id(tx, target_id)?
        .ok_or_else(|| DbError::NotFound("User not found".to_string()))?;
    let user = query_user_by_id(tx, user_id)?
        .ok_or_else(|| anyhow::anyhow!("acting user {} does not exist", user_id))?;

    Ok((user, target))
}

fn save_edges(tx: &Transaction<'_>, user: &UserRow, target: &UserRow) -> DbResult<()> {
    let now = Utc::now();
    tx.execute(
        "UPDATE users SET following = ?1, version = version + 1, updated_at = ?2 WHERE id = ?3",
        params![user.following, now, user.id.to_string()],
    )?;
    tx.execute(
        "UPDATE users SET followers = ?1, version = version + 1, updated_at = ?2 WHERE id = ?3",
        params![target.followers, now, target.id.to_string()],
    )?;
    Ok(())
}
