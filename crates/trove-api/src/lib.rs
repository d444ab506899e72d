pub mod auth;
pub mod catalog;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod social;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use routes::router;

use tracing::error;
use trove_db::{Database, DbResult};

/// Run a blocking store call off the async runtime.
pub(crate) async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> DbResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal()
        })?
        .map_err(ApiError::from)
}
