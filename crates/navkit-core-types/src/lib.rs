//! Shared identifiers and the execution route threaded through every
//! pipeline crate (snapshot, embedder, fusion, selector, verifier,
//! promotion, healer, session).
//!
//! `RoutingHint`/`RoutePrefer`/`CoreError` are ambient scaffolding for
//! multi-page/multi-frame route disambiguation; `navkit-pipeline` only
//! drives a single frame today and doesn't construct them yet.
#![allow(dead_code)]

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Shared error type for conditions that do not belong to any single
/// component (invariant violations surfaced across crate boundaries).
#[derive(Debug, Error, Clone)]
pub enum CoreError {
    #[error("{message}")]
    Message { message: String },
}

impl CoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

macro_rules! uuid_id {
    ($name:ident) => {
        #[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
        #[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub struct $name(pub String);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(SessionId);
uuid_id!(PageId);
uuid_id!(FrameId);
uuid_id!(ActionId);

/// Which frame/page a resolution should prefer when a route is ambiguous.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RoutePrefer {
    Focused,
    RecentNav,
    MainFrame,
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RoutingHint {
    pub session: Option<SessionId>,
    pub page: Option<PageId>,
    pub frame: Option<FrameId>,
    pub prefer: Option<RoutePrefer>,
}

/// Identifies the session/page/frame a pipeline step targets.
///
/// `frame_path` is the ordered list of frame names/urls from the main
/// frame down to `frame`, used by the Verifier to walk into iframes and
/// by ElementDescriptor identity (`frame_path`, `backend_node_id`).
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExecRoute {
    pub session: SessionId,
    pub page: PageId,
    pub frame: FrameId,
    pub frame_path: Vec<String>,
    pub mutex_key: String,
}

impl ExecRoute {
    pub fn new(session: SessionId, page: PageId, frame: FrameId, frame_path: Vec<String>) -> Self {
        let mutex_key = format!("frame:{}", frame.0);
        Self {
            session,
            page,
            frame,
            frame_path,
            mutex_key,
        }
    }

    pub fn main_frame(session: SessionId, page: PageId, frame: FrameId) -> Self {
        Self::new(session, page, frame, Vec::new())
    }
}

impl fmt::Display for ExecRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "session={} page={} frame={} mutex={}",
            self.session.0, self.page.0, self.frame.0, self.mutex_key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_route_mutex_key_is_derived_from_frame() {
        let route = ExecRoute::main_frame(SessionId::new(), PageId::new(), FrameId("f1".into()));
        assert_eq!(route.mutex_key, "frame:f1");
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
