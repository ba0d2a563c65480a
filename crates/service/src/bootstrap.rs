//! Idempotent guard for process-wide one-shot startup jobs.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info, warn};

use atelier_core::error::AssetError;
use atelier_store::DistributedLock;

/// How often the lock is re-polled while waiting.
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Run a startup job under cross-process mutual exclusion.
///
/// Polls the distributed lock for at most `wait`; failure to acquire
/// means another instance is handling the job and is an info-level
/// no-op. Job errors are logged and swallowed — startup must not fail
/// because one maintenance job did — and the lease is always released.
///
/// Returns `true` iff the job ran to completion without error.
pub async fn run_exclusive<F, Fut>(
    lock: &dyn DistributedLock,
    key: &str,
    wait: Duration,
    job: F,
) -> bool
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), AssetError>>,
{
    let deadline = Instant::now() + wait;
    let lease = loop {
        match lock.try_acquire(key).await {
            Ok(Some(lease)) => break lease,
            Ok(None) => {
                if Instant::now() >= deadline {
                    info!(key, "startup job lock held elsewhere, another instance is handling it");
                    return false;
                }
                tokio::time::sleep(LOCK_POLL_INTERVAL).await;
            }
            Err(err) => {
                error!(key, %err, "failed to probe startup job lock");
                return false;
            }
        }
    };

    let ran = match job().await {
        Ok(()) => true,
        Err(err) => {
            error!(key, %err, "startup job failed");
            false
        }
    };

    if let Err(err) = lock.release(lease).await {
        warn!(key, %err, "failed to release startup job lock");
    }
    ran
}
