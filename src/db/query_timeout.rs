// Bounds a single store call so a hung query cannot stall a polling subject
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::service::error::ResolutionError;

pub struct QueryTimeout;

impl QueryTimeout {
    /// Run a store future, turning both its error and an elapsed timeout into a
    /// connection error.
    pub async fn execute_with_timeout<F, T>(
        query_fn: F,
        timeout_duration: Duration,
    ) -> Result<T, ResolutionError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match timeout(timeout_duration, query_fn).await {
            Ok(result) => result.map_err(ResolutionError::from),
            Err(_) => Err(ResolutionError::Connection(format!(
                "Query timed out after {:?}",
                timeout_duration
            ))),
        }
    }

    /// Default timeout for ticket lookups (5 seconds)
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
}
