//! Driver contract the retrieval pipeline consumes.
//!
//! This crate specifies the interface only: a CDP-style document/AX/frame
//! capture surface plus a locator handle for live-page verification and
//! action execution. Any CDP-capable driver (a real browser binding, a
//! recorded-fixture driver for tests, ...) implements [`Driver`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Axis-aligned bounding box in viewport coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn area(&self) -> f64 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// One node of the frame tree, as exposed by `get_frame_tree`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FrameNode {
    pub name: Option<String>,
    pub url: String,
    pub children: Vec<FrameNode>,
}

/// Selector notation understood by [`Driver::locator`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum LocatorStrategy {
    Xpath,
    Css,
    Text,
    Role,
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LocatorStrategy::Xpath => "xpath",
            LocatorStrategy::Css => "css",
            LocatorStrategy::Text => "text",
            LocatorStrategy::Role => "role",
        };
        write!(f, "{s}")
    }
}

/// Errors a driver implementation can surface. Kept small and closed so
/// callers can match exhaustively; anything driver-specific collapses to
/// `Internal`.
#[derive(Debug, Error, Clone)]
pub enum DriverError {
    #[error("capture denied: {0}")]
    CaptureDenied(String),

    #[error("driver timeout: {0}")]
    Timeout(String),

    #[error("evaluate failed: {0}")]
    EvalFailed(String),

    #[error("target not found: {0}")]
    TargetNotFound(String),

    #[error("option not found: {0}")]
    OptionNotFound(String),

    #[error("driver disconnected")]
    Disconnected,

    #[error("internal driver error: {0}")]
    Internal(String),
}

impl DriverError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, DriverError::Timeout(_) | DriverError::Disconnected)
    }

    pub fn severity(&self) -> u8 {
        match self {
            DriverError::Disconnected => 3,
            DriverError::CaptureDenied(_) | DriverError::Internal(_) => 2,
            DriverError::Timeout(_) | DriverError::EvalFailed(_) => 1,
            _ => 0,
        }
    }
}

/// A live handle to an element (or element set) resolved on the page.
///
/// Mirrors the operations a Playwright/CDP-style locator exposes; the
/// Verifier and the action layer use exactly this surface.
#[async_trait]
pub trait Locator: Send + Sync {
    async fn count(&self) -> Result<usize, DriverError>;
    async fn is_visible(&self) -> Result<bool, DriverError>;
    async fn is_disabled(&self) -> Result<bool, DriverError>;
    async fn bounding_box(&self) -> Result<Option<Rect>, DriverError>;

    /// True when `elementFromPoint` at the element's center resolves to the
    /// element itself or one of its descendants (i.e. not occluded).
    async fn hit_tests_self(&self) -> Result<bool, DriverError>;

    async fn click(&self) -> Result<(), DriverError>;
    async fn fill(&self, value: &str) -> Result<(), DriverError>;
    async fn select_option(&self, value: &str) -> Result<(), DriverError>;
    async fn check(&self) -> Result<(), DriverError>;
    async fn uncheck(&self) -> Result<(), DriverError>;
    async fn hover(&self) -> Result<(), DriverError>;
    async fn focus(&self) -> Result<(), DriverError>;
    async fn press(&self, key: &str) -> Result<(), DriverError>;
    async fn set_input_files(&self, paths: &[String]) -> Result<(), DriverError>;
    async fn scroll_into_view_if_needed(&self) -> Result<(), DriverError>;
}

/// The browser driver contract. Out of scope to implement here: only the
/// interface is specified, any CDP-capable backend qualifies.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Raw flattened DOM document, CDP `DOM.getFlattenedDocument`-shaped.
    async fn get_flattened_document(&self, pierce: bool) -> Result<serde_json::Value, DriverError>;

    /// Raw accessibility tree, CDP `Accessibility.getFullAXTree`-shaped.
    async fn get_full_accessibility_tree(&self) -> Result<serde_json::Value, DriverError>;

    async fn get_frame_tree(&self) -> Result<FrameNode, DriverError>;

    async fn get_box_model(&self, backend_node_id: u64) -> Result<Option<Rect>, DriverError>;

    async fn evaluate(
        &self,
        js_expr: &str,
        args: &[serde_json::Value],
    ) -> Result<serde_json::Value, DriverError>;

    /// Registers a page-side callback name; the Session Manager uses this
    /// to be called back on `pushState`/`replaceState`/`popstate`/`hashchange`.
    async fn expose_callback(&self, name: &str) -> Result<(), DriverError>;

    /// Current page URL, used for page_signature derivation.
    async fn current_url(&self) -> Result<String, DriverError>;

    /// Resolve a selector against a frame path into a live locator handle.
    async fn locator(
        &self,
        frame_path: &[String],
        strategy: LocatorStrategy,
        selector: &str,
    ) -> Result<Box<dyn Locator>, DriverError>;
}
