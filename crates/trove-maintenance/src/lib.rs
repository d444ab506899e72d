//! Collection ownership migration.
//!
//! Gives every collection a randomly chosen owner and records the collection
//! on that owner. Each collection is committed on its own, so a failure
//! part-way through leaves earlier assignments in place; rerun with
//! `resume` to pick up only the collections that still have no owner.

use std::collections::HashMap;

use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use trove_db::{Database, DbError, DbResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct AssignOptions {
    /// Skip collections that already have a `created_by`.
    pub resume: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct AssignmentReport {
    pub assigned: usize,
    /// Number of collections assigned to each user.
    pub per_user: HashMap<Uuid, usize>,
}

pub fn assign_collection_owners<R: Rng>(
    db: &Database,
    rng: &mut R,
    options: AssignOptions,
) -> DbResult<AssignmentReport> {
    let users = db.all_user_ids()?;
    let collections = db.all_collection_ids(options.resume)?;

    info!(
        "Assigning {} collection(s) across {} user(s)",
        collections.len(),
        users.len()
    );

    let mut report = AssignmentReport::default();
    if collections.is_empty() {
        return Ok(report);
    }
    if users.is_empty() {
        return Err(DbError::InvalidArgument(
            "no users to assign collections to".to_string(),
        ));
    }

    for collection_id in collections {
        let owner = users[rng.random_range(0..users.len())];
        db.assign_collection_owner(collection_id, owner)?;
        debug!("Collection {} -> user {}", collection_id, owner);

        report.assigned += 1;
        *report.per_user.entry(owner).or_default() += 1;
    }

    Ok(report)
}
