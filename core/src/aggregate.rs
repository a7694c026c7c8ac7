//! Aggregator
//!
//! Polls every platform concurrently and merges the outcomes. The batch as a
//! whole never fails: transport problems are already DOWN reports by the
//! time they get here, and the remaining error cases (unknown tag, broken
//! response shape) cost only their own platform.

use std::sync::Arc;

use futures_util::future;

use crate::error::FetchError;
use crate::fetcher::Registry;
use crate::report::{Platform, PlatformStatus, StatusReport};

/// Fans a poll cycle out over all platforms and folds the settled outcomes
/// back into one list.
pub struct Aggregator {
    registry: Arc<Registry>,
}

impl Aggregator {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Poll all platforms once.
    ///
    /// One task per platform, all settled before anything is folded, so a
    /// slow endpoint only costs its own timeout. Output preserves input
    /// order; platforms whose task failed (rather than reporting DOWN) are
    /// excluded, so the result length is at most the input length.
    pub async fn poll_all(&self, platforms: &[Platform]) -> Vec<PlatformStatus> {
        let tasks = platforms.iter().map(|platform| async move {
            (platform, self.poll_one(platform).await)
        });
        let settled = future::join_all(tasks).await;

        settled
            .into_iter()
            .filter_map(|(platform, outcome)| match outcome {
                Ok(report) => Some(PlatformStatus::new(platform, report)),
                Err(err) => {
                    tracing::warn!(
                        platform = %platform.name,
                        error = %err,
                        "excluding platform from status batch"
                    );
                    None
                }
            })
            .collect()
    }

    async fn poll_one(&self, platform: &Platform) -> Result<StatusReport, FetchError> {
        self.registry
            .resolve_kind(platform.kind)?
            .fetch(&platform.url)
            .await
    }
}
