//! Recorded-fixture driver: replays a captured document/AX tree plus a
//! table of known-resolvable selectors, instead of a live browser.
//!
//! This is the same pattern `navkit-healer`'s and `navkit-pipeline`'s own
//! test suites use for a fake driver, promoted to a real (if offline-only)
//! `Driver` implementation so the CLI is runnable without a CDP backend.
//! Wiring a live Chromium driver is tracked separately (see DESIGN.md).

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use navkit_driver::{Driver, DriverError, FrameNode, Locator, LocatorStrategy, Rect};
use navkit_snapshot::dom::{RawAxNode, RawDocument};

/// On-disk shape of a recorded fixture: one frame's document, its AX tree,
/// and the set of selectors known to resolve against it (with visibility).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordedFixture {
    pub frame_url: String,
    pub document: RawDocument,
    #[serde(default)]
    pub ax_nodes: Vec<RawAxNode>,
    #[serde(default)]
    pub resolvable_selectors: BTreeMap<String, bool>,
}

pub fn load(path: &Path) -> anyhow::Result<RecordedFixture> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading fixture {}", path.display()))?;
    let fixture = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str(&raw).context("parsing fixture as JSON")?
    } else {
        serde_yaml::from_str(&raw).context("parsing fixture as YAML")?
    };
    Ok(fixture)
}

struct FixtureLocator {
    visible: bool,
}

#[async_trait]
impl Locator for FixtureLocator {
    async fn count(&self) -> Result<usize, DriverError> {
        Ok(1)
    }
    async fn is_visible(&self) -> Result<bool, DriverError> {
        Ok(self.visible)
    }
    async fn is_disabled(&self) -> Result<bool, DriverError> {
        Ok(false)
    }
    async fn bounding_box(&self) -> Result<Option<Rect>, DriverError> {
        Ok(Some(Rect { x: 0.0, y: 0.0, w: 10.0, h: 10.0 }))
    }
    async fn hit_tests_self(&self) -> Result<bool, DriverError> {
        Ok(true)
    }
    async fn click(&self) -> Result<(), DriverError> {
        Ok(())
    }
    async fn fill(&self, _value: &str) -> Result<(), DriverError> {
        Ok(())
    }
    async fn select_option(&self, _value: &str) -> Result<(), DriverError> {
        Ok(())
    }
    async fn check(&self) -> Result<(), DriverError> {
        Ok(())
    }
    async fn uncheck(&self) -> Result<(), DriverError> {
        Ok(())
    }
    async fn hover(&self) -> Result<(), DriverError> {
        Ok(())
    }
    async fn focus(&self) -> Result<(), DriverError> {
        Ok(())
    }
    async fn press(&self, _key: &str) -> Result<(), DriverError> {
        Ok(())
    }
    async fn set_input_files(&self, _paths: &[String]) -> Result<(), DriverError> {
        Ok(())
    }
    async fn scroll_into_view_if_needed(&self) -> Result<(), DriverError> {
        Ok(())
    }
}

pub struct ReplayDriver {
    frame_url: String,
    document: RawDocument,
    ax_nodes: Vec<RawAxNode>,
    url: Mutex<String>,
    resolvable: BTreeMap<String, bool>,
}

impl ReplayDriver {
    pub fn new(fixture: RecordedFixture) -> Self {
        Self {
            frame_url: fixture.frame_url.clone(),
            url: Mutex::new(fixture.frame_url),
            document: fixture.document,
            ax_nodes: fixture.ax_nodes,
            resolvable: fixture.resolvable_selectors,
        }
    }
}

#[async_trait]
impl Driver for ReplayDriver {
    async fn get_flattened_document(&self, _pierce: bool) -> Result<serde_json::Value, DriverError> {
        serde_json::to_value(std::slice::from_ref(&self.document))
            .map_err(|e| DriverError::Internal(e.to_string()))
    }

    async fn get_full_accessibility_tree(&self) -> Result<serde_json::Value, DriverError> {
        serde_json::to_value(&self.ax_nodes).map_err(|e| DriverError::Internal(e.to_string()))
    }

    async fn get_frame_tree(&self) -> Result<FrameNode, DriverError> {
        Ok(FrameNode { name: None, url: self.frame_url.clone(), children: vec![] })
    }

    async fn get_box_model(&self, _backend_node_id: u64) -> Result<Option<Rect>, DriverError> {
        Ok(Some(Rect { x: 0.0, y: 0.0, w: 20.0, h: 20.0 }))
    }

    async fn evaluate(&self, _js_expr: &str, _args: &[serde_json::Value]) -> Result<serde_json::Value, DriverError> {
        Ok(serde_json::Value::Null)
    }

    async fn expose_callback(&self, _name: &str) -> Result<(), DriverError> {
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.url.lock().clone())
    }

    async fn locator(
        &self,
        _frame_path: &[String],
        _strategy: LocatorStrategy,
        selector: &str,
    ) -> Result<Box<dyn Locator>, DriverError> {
        match self.resolvable.get(selector) {
            Some(&visible) => Ok(Box::new(FixtureLocator { visible })),
            None => Err(DriverError::TargetNotFound(selector.to_string())),
        }
    }
}
