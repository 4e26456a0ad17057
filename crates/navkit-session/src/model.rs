use std::collections::VecDeque;
use std::sync::Arc;

use navkit_snapshot::Snapshot;

/// How a route change was observed on the page.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteChangeKind {
    PushState,
    ReplaceState,
    PopState,
    HashChange,
}

/// One recorded route-change event.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RouteChangeEvent {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub old_url: String,
    pub new_url: String,
    pub kind: RouteChangeKind,
    pub dom_delta: f64,
}

/// Bound on the ring buffer of recent route-change events.
pub const ROUTE_HISTORY_CAPACITY: usize = 64;

/// Mutated only by the Session Manager; callers hold read-only snapshots
/// of it via [`crate::manager::SessionManager::state`].
#[derive(Clone, Debug)]
pub struct SessionState {
    pub current_url: String,
    pub last_snapshot: Option<Arc<Snapshot>>,
    pub recent_changes: VecDeque<RouteChangeEvent>,
    pub total_snapshots: u64,
    pub cache_hits: u64,
    pub reindexes: u64,
}

impl SessionState {
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self {
            current_url: initial_url.into(),
            last_snapshot: None,
            recent_changes: VecDeque::with_capacity(ROUTE_HISTORY_CAPACITY),
            total_snapshots: 0,
            cache_hits: 0,
            reindexes: 0,
        }
    }

    pub(crate) fn push_route_change(&mut self, event: RouteChangeEvent) {
        if self.recent_changes.len() == ROUTE_HISTORY_CAPACITY {
            self.recent_changes.pop_front();
        }
        self.recent_changes.push_back(event);
    }
}
