//! Periodic cleanup of the allocation idempotency ledger.
//!
//! Spawns a background task that deletes `allocation_attempts` rows older
//! than the configured retention window. Runs on a fixed interval using
//! `tokio::time::interval`. Idempotent replay is only guaranteed within
//! the retention window.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use flashmart_db::repositories::AllocationAttemptRepo;

/// How often the cleanup job runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the attempt retention cleanup loop.
///
/// Deletes ledger rows older than `retention_hours`. Runs until `cancel`
/// is triggered.
pub async fn run(pool: PgPool, retention_hours: i64, cancel: CancellationToken) {
    tracing::info!(
        retention_hours,
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Attempt retention job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Attempt retention job stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = Utc::now() - chrono::Duration::hours(retention_hours);
                match AllocationAttemptRepo::purge_older_than(&pool, cutoff).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Attempt retention: purged old rows");
                        } else {
                            tracing::debug!("Attempt retention: no rows to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Attempt retention: cleanup failed");
                    }
                }
            }
        }
    }
}
