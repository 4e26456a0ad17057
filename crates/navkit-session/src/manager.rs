use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use navkit_driver::Driver;
use navkit_snapshot::{shared_default_builder, Snapshot, SnapshotBuilder};

use crate::errors::SessionError;
use crate::model::{RouteChangeEvent, RouteChangeKind, SessionState};
use crate::page_state::page_state_hash;

/// SPA delta threshold: resolves the open question of 0.3 vs 0.5 in
/// favor of freshness.
pub const DEFAULT_THETA_REINDEX: f64 = 0.3;

/// Minimum interval between snapshots; within it the last snapshot is
/// returned instead of re-capturing.
pub const DEFAULT_MIN_SNAPSHOT_INTERVAL: Duration = Duration::from_millis(100);

/// Default `wait_for_stable_dom` poll interval and required consecutive
/// unchanged polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);
pub const STABLE_CONSECUTIVE_POLLS: u32 = 3;

/// Returned when a route change crosses the reindex threshold: the caller
/// (typically the pipeline) runs the Delta Embedder on the new snapshot and
/// may invalidate only selectors whose `frame_hash` changed.
#[derive(Clone, Debug)]
pub struct ReindexSignal {
    pub new_snapshot: Arc<Snapshot>,
    pub changed_frame_hashes: Vec<String>,
    pub dom_delta: f64,
}

#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Rate-limited capture: within `min_interval` of the previous call the
    /// cached snapshot is returned and `cache_hits` increments.
    async fn snapshot(&self, driver: &dyn Driver) -> Result<Arc<Snapshot>, SessionError>;

    /// Records a route-change event, takes a fresh snapshot, and signals a
    /// reindex when `dom_delta` exceeds `theta_reindex`.
    async fn on_route_change(
        &self,
        driver: &dyn Driver,
        kind: RouteChangeKind,
        new_url: String,
    ) -> Result<Option<ReindexSignal>, SessionError>;

    /// Polls `page_state_hash` until unchanged for `STABLE_CONSECUTIVE_POLLS`
    /// consecutive polls, or `timeout` elapses.
    async fn wait_for_stable_dom(&self, driver: &dyn Driver, timeout: Duration) -> Result<(), SessionError>;

    fn state(&self) -> SessionState;
}

struct Inner {
    state: SessionState,
    last_snapshot_at: Option<Instant>,
}

pub struct DefaultSessionManager {
    builder: Arc<dyn SnapshotBuilder>,
    theta_reindex: f64,
    min_interval: Duration,
    poll_interval: Duration,
    inner: Mutex<Inner>,
}

impl DefaultSessionManager {
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self::with_config(
            initial_url,
            shared_default_builder(),
            DEFAULT_THETA_REINDEX,
            DEFAULT_MIN_SNAPSHOT_INTERVAL,
            DEFAULT_POLL_INTERVAL,
        )
    }

    pub fn with_config(
        initial_url: impl Into<String>,
        builder: Arc<dyn SnapshotBuilder>,
        theta_reindex: f64,
        min_interval: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            builder,
            theta_reindex,
            min_interval,
            poll_interval,
            inner: Mutex::new(Inner {
                state: SessionState::new(initial_url),
                last_snapshot_at: None,
            }),
        }
    }

    async fn capture(&self, driver: &dyn Driver) -> Result<Arc<Snapshot>, SessionError> {
        let snapshot = Arc::new(self.builder.build(driver, false).await?);
        let mut guard = self.inner.lock();
        guard.state.last_snapshot = Some(snapshot.clone());
        guard.state.total_snapshots += 1;
        guard.last_snapshot_at = Some(Instant::now());
        Ok(snapshot)
    }
}

#[async_trait]
impl SessionManager for DefaultSessionManager {
    async fn snapshot(&self, driver: &dyn Driver) -> Result<Arc<Snapshot>, SessionError> {
        {
            let mut guard = self.inner.lock();
            if let (Some(last_at), Some(existing)) =
                (guard.last_snapshot_at, guard.state.last_snapshot.clone())
            {
                if last_at.elapsed() < self.min_interval {
                    guard.state.cache_hits += 1;
                    return Ok(existing);
                }
            }
        }
        self.capture(driver).await
    }

    async fn on_route_change(
        &self,
        driver: &dyn Driver,
        kind: RouteChangeKind,
        new_url: String,
    ) -> Result<Option<ReindexSignal>, SessionError> {
        let old_url = {
            let guard = self.inner.lock();
            guard.state.current_url.clone()
        };
        let previous_snapshot = {
            let guard = self.inner.lock();
            guard.state.last_snapshot.clone()
        };

        let new_snapshot = self.capture(driver).await?;

        let dom_delta = previous_snapshot
            .as_ref()
            .map(|prev| prev.dom_delta(&new_snapshot))
            .unwrap_or(1.0);

        let event = RouteChangeEvent {
            timestamp: chrono::Utc::now(),
            old_url: old_url.clone(),
            new_url: new_url.clone(),
            kind,
            dom_delta,
        };

        let mut guard = self.inner.lock();
        guard.state.current_url = new_url;
        guard.state.push_route_change(event);
        debug!(dom_delta, theta = self.theta_reindex, "route change recorded");

        if dom_delta > self.theta_reindex {
            guard.state.reindexes += 1;
            drop(guard);
            let changed_frame_hashes = previous_snapshot
                .map(|prev| changed_frames(&prev, &new_snapshot))
                .unwrap_or_else(|| new_snapshot.frame_hashes.values().cloned().collect());
            info!(dom_delta, "SPA reindex triggered");
            Ok(Some(ReindexSignal {
                new_snapshot,
                changed_frame_hashes,
                dom_delta,
            }))
        } else {
            Ok(None)
        }
    }

    async fn wait_for_stable_dom(&self, driver: &dyn Driver, timeout: Duration) -> Result<(), SessionError> {
        let deadline = Instant::now() + timeout;
        let mut last_hash: Option<String> = None;
        let mut consecutive = 0u32;

        loop {
            let hash = page_state_hash(driver)
                .await
                .map_err(|err| navkit_snapshot::SnapshotError::Driver(err.to_string()))?;
            match &last_hash {
                Some(prev) if *prev == hash => {
                    consecutive += 1;
                    if consecutive >= STABLE_CONSECUTIVE_POLLS {
                        return Ok(());
                    }
                }
                _ => {
                    consecutive = 1;
                }
            }
            last_hash = Some(hash);

            if Instant::now() >= deadline {
                return Err(SessionError::StableDomTimeout(timeout));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn state(&self) -> SessionState {
        self.inner.lock().state.clone()
    }
}

/// frame_hash values present in `new` that differ from (or are absent in)
/// `prev` — the set a reindex should invalidate selectors for.
fn changed_frames(prev: &Snapshot, new: &Snapshot) -> Vec<String> {
    new.frame_hashes
        .iter()
        .filter(|(frame_key, hash)| prev.frame_hashes.get(*frame_key) != Some(hash))
        .map(|(_, hash)| hash.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use navkit_driver::{DriverError, FrameNode, Locator, LocatorStrategy, Rect};

    struct EmptyDriver;

    #[async_trait]
    impl Driver for EmptyDriver {
        async fn get_flattened_document(&self, _pierce: bool) -> Result<serde_json::Value, DriverError> {
            Ok(serde_json::json!([]))
        }
        async fn get_full_accessibility_tree(&self) -> Result<serde_json::Value, DriverError> {
            Ok(serde_json::json!([]))
        }
        async fn get_frame_tree(&self) -> Result<FrameNode, DriverError> {
            Ok(FrameNode::default())
        }
        async fn get_box_model(&self, _id: u64) -> Result<Option<Rect>, DriverError> {
            Ok(None)
        }
        async fn evaluate(&self, _js: &str, _args: &[serde_json::Value]) -> Result<serde_json::Value, DriverError> {
            Ok(serde_json::json!({
                "title": "Home", "body_class": "", "main_html_prefix": "", "form_count": 0, "input_count": 0
            }))
        }
        async fn expose_callback(&self, _name: &str) -> Result<(), DriverError> {
            Ok(())
        }
        async fn current_url(&self) -> Result<String, DriverError> {
            Ok("https://example.com".to_string())
        }
        async fn locator(
            &self,
            _frame_path: &[String],
            _strategy: LocatorStrategy,
            _selector: &str,
        ) -> Result<Box<dyn Locator>, DriverError> {
            Err(DriverError::TargetNotFound("n/a".into()))
        }
    }

    #[tokio::test]
    async fn snapshot_is_rate_limited() {
        let manager = DefaultSessionManager::new("https://example.com");
        let driver = EmptyDriver;
        let first = manager.snapshot(&driver).await.unwrap();
        let second = manager.snapshot(&driver).await.unwrap();
        assert_eq!(first.snapshot_id, second.snapshot_id);
        assert_eq!(manager.state().cache_hits, 1);
    }

    #[tokio::test]
    async fn wait_for_stable_dom_succeeds_on_unchanging_page() {
        let manager = DefaultSessionManager::with_config(
            "https://example.com",
            shared_default_builder(),
            DEFAULT_THETA_REINDEX,
            DEFAULT_MIN_SNAPSHOT_INTERVAL,
            Duration::from_millis(1),
        );
        let driver = EmptyDriver;
        manager
            .wait_for_stable_dom(&driver, Duration::from_millis(50))
            .await
            .unwrap();
    }
}
