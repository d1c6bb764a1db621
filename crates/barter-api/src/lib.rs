pub mod ads;
pub mod auth;
pub mod error;
pub mod guard;
pub mod middleware;
pub mod paths;
pub mod proposals;
pub mod routes;

pub use auth::{AppState, AppStateInner};
pub use error::{ApiError, FlashRedirect};
pub use routes::router;

use barter_db::Database;
use tracing::error;

/// Run a blocking store call off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed: {}", e))
        })?
        .map_err(ApiError::from)
}
