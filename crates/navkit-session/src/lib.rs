//! Session Manager: tracks URL, DOM fingerprint, and SPA route changes.
//! Runs concurrently with the retrieval pipeline, invalidating caches on
//! route change and rate-limiting snapshot captures.

pub mod errors;
pub mod manager;
pub mod model;
pub mod page_state;

pub use errors::SessionError;
pub use manager::{
    DefaultSessionManager, ReindexSignal, SessionManager, DEFAULT_MIN_SNAPSHOT_INTERVAL,
    DEFAULT_POLL_INTERVAL, DEFAULT_THETA_REINDEX, STABLE_CONSECUTIVE_POLLS,
};
pub use model::{RouteChangeEvent, RouteChangeKind, SessionState, ROUTE_HISTORY_CAPACITY};
pub use page_state::page_state_hash;
