//! Self-Healer state machine: `Start -> TrySynthesis -> Relax ->
//! Partial -> Failed`, with an early exit to `Healed` at any state that
//! verifies. Every `Healed` path writes a success to the Promotion Store
//! under the current `label_key`; `Failed` writes a failure for the
//! original selector.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use navkit_driver::Driver;
use navkit_fusion::ScoredElement;
use navkit_promotion::PromotionStore;
use navkit_selector::SelectorSynthesizer;
use navkit_snapshot::Snapshot;
use navkit_verifier::Verifier;

use crate::errors::HealerError;
use crate::model::{HealOutcome, HealRequest, HealSource};
use crate::relax::{partial_selector, relax_selector};

/// Number of top-ranked descriptors the `TrySynthesis` state resynthesizes
/// and verifies candidates for.
pub const TOP_K: usize = 5;

#[async_trait]
pub trait SelfHealer: Send + Sync {
    async fn heal(
        &self,
        driver: &dyn Driver,
        request: HealRequest,
        ranked: &[ScoredElement],
        snapshot: &Snapshot,
    ) -> HealOutcome;
}

/// Default self-healer. Maintains an in-process `failed -> winning` map so
/// repeat failures of the same selector within a session short-circuit
/// straight to the last winner without re-running the state machine.
pub struct DefaultSelfHealer {
    synthesizer: Arc<dyn SelectorSynthesizer>,
    verifier: Arc<dyn Verifier>,
    promotion: Arc<dyn PromotionStore>,
    short_circuit: Mutex<std::collections::HashMap<String, String>>,
    attempted_this_session: Mutex<HashSet<String>>,
}

impl DefaultSelfHealer {
    pub fn new(
        synthesizer: Arc<dyn SelectorSynthesizer>,
        verifier: Arc<dyn Verifier>,
        promotion: Arc<dyn PromotionStore>,
    ) -> Self {
        Self {
            synthesizer,
            verifier,
            promotion,
            short_circuit: Mutex::new(std::collections::HashMap::new()),
            attempted_this_session: Mutex::new(HashSet::new()),
        }
    }

    fn short_circuited(&self, failed_selector: &str) -> Option<String> {
        self.short_circuit.lock().get(failed_selector).cloned()
    }

    fn remember(&self, failed_selector: &str, winner: &str) {
        self.short_circuit
            .lock()
            .insert(failed_selector.to_string(), winner.to_string());
        self.attempted_this_session
            .lock()
            .insert(failed_selector.to_string());
    }

    async fn record_healed(&self, request: &HealRequest, selector: &str) -> Result<(), HealerError> {
        self.promotion
            .record_success(
                &request.page_signature,
                &request.frame_hash,
                &request.label_key,
                selector,
                serde_json::Value::Null,
            )
            .await?;
        Ok(())
    }

    async fn record_failed(&self, request: &HealRequest) -> Result<(), HealerError> {
        self.promotion
            .record_failure(
                &request.page_signature,
                &request.frame_hash,
                &request.label_key,
                &request.failed_selector,
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SelfHealer for DefaultSelfHealer {
    async fn heal(
        &self,
        driver: &dyn Driver,
        request: HealRequest,
        ranked: &[ScoredElement],
        snapshot: &Snapshot,
    ) -> HealOutcome {
        if let Some(winner) = self.short_circuited(&request.failed_selector) {
            debug!(selector = %winner, "heal short-circuited from in-process map");
            let verification = self
                .verifier
                .verify(driver, &request.frame_path, &winner, &[])
                .await;
            if verification.ok {
                return HealOutcome::Healed {
                    source: HealSource::History,
                    selector: winner,
                    verification,
                };
            }
        }

        // Start: consult the Promotion Store for a historical winner.
        match self
            .promotion
            .lookup(&request.page_signature, &request.frame_hash, &request.label_key)
            .await
        {
            Ok(Some(historical)) if historical != request.failed_selector => {
                let verification = self
                    .verifier
                    .verify(driver, &request.frame_path, &historical, &[])
                    .await;
                if verification.ok {
                    info!(selector = %historical, "healed from promotion history");
                    let _ = self.record_healed(&request, &historical).await;
                    self.remember(&request.failed_selector, &historical);
                    return HealOutcome::Healed {
                        source: HealSource::History,
                        selector: historical,
                        verification,
                    };
                }
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "promotion lookup failed during heal"),
        }

        // TrySynthesis: resynthesize candidates for the top-K ranked
        // descriptors, verify in order.
        for scored in ranked.iter().take(TOP_K) {
            let Some(descriptor) = snapshot.elements.get(scored.index) else {
                continue;
            };
            let candidates = match self.synthesizer.synthesize(descriptor, snapshot) {
                Ok(c) => c,
                Err(_) => continue,
            };
            for candidate in candidates {
                let verification = self
                    .verifier
                    .verify(driver, &descriptor.frame_path, &candidate.selector, &[])
                    .await;
                if verification.ok {
                    info!(selector = %candidate.selector, "healed via resynthesis");
                    let _ = self.record_healed(&request, &candidate.selector).await;
                    self.remember(&request.failed_selector, &candidate.selector);
                    return HealOutcome::Healed {
                        source: HealSource::Synthesis,
                        selector: candidate.selector,
                        verification,
                    };
                }
            }
        }

        // Relax: drop one predicate from the failed selector and re-verify.
        let mut current = request.failed_selector.clone();
        while let Some(relaxed) = relax_selector(&current) {
            let verification = self
                .verifier
                .verify(driver, &request.frame_path, &relaxed, &[])
                .await;
            if verification.ok {
                info!(selector = %relaxed, "healed via relaxation");
                let _ = self.record_healed(&request, &relaxed).await;
                self.remember(&request.failed_selector, &relaxed);
                return HealOutcome::Healed {
                    source: HealSource::Relaxation,
                    selector: relaxed,
                    verification,
                };
            }
            current = relaxed;
        }

        // Partial: keep only the most specific single attribute (or
        // tag+first-class), and re-verify.
        if let Some(partial) = partial_selector(&request.failed_selector) {
            let verification = self
                .verifier
                .verify(driver, &request.frame_path, &partial, &[])
                .await;
            if verification.ok {
                info!(selector = %partial, "healed via partial match");
                let _ = self.record_healed(&request, &partial).await;
                self.remember(&request.failed_selector, &partial);
                return HealOutcome::Healed {
                    source: HealSource::Partial,
                    selector: partial,
                    verification,
                };
            }
        }

        warn!(selector = %request.failed_selector, "self-heal exhausted all strategies");
        let _ = self.record_failed(&request).await;
        HealOutcome::Failed {
            explanation: format!(
                "no history, resynthesis, relaxation, or partial match verified for \"{}\"",
                request.failed_selector
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navkit_driver::{DriverError, FrameNode, Locator, LocatorStrategy, Rect};
    use navkit_selector::{SelectorCandidate, Strategy, SynthesizerError};
    use navkit_snapshot::ElementDescriptor;
    use std::collections::BTreeMap;

    struct NoopLocator;
    #[async_trait]
    impl Locator for NoopLocator {
        async fn count(&self) -> Result<usize, DriverError> {
            Ok(1)
        }
        async fn is_visible(&self) -> Result<bool, DriverError> {
            Ok(true)
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
        async fn fill(&self, _v: &str) -> Result<(), DriverError> {
            Ok(())
        }
        async fn select_option(&self, _v: &str) -> Result<(), DriverError> {
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
        async fn press(&self, _k: &str) -> Result<(), DriverError> {
            Ok(())
        }
        async fn set_input_files(&self, _p: &[String]) -> Result<(), DriverError> {
            Ok(())
        }
        async fn scroll_into_view_if_needed(&self) -> Result<(), DriverError> {
            Ok(())
        }
    }

    struct FakeDriver {
        working_selector: String,
    }

    #[async_trait]
    impl Driver for FakeDriver {
        async fn get_flattened_document(&self, _pierce: bool) -> Result<serde_json::Value, DriverError> {
            Ok(serde_json::Value::Null)
        }
        async fn get_full_accessibility_tree(&self) -> Result<serde_json::Value, DriverError> {
            Ok(serde_json::Value::Null)
        }
        async fn get_frame_tree(&self) -> Result<FrameNode, DriverError> {
            Ok(FrameNode::default())
        }
        async fn get_box_model(&self, _id: u64) -> Result<Option<Rect>, DriverError> {
            Ok(None)
        }
        async fn evaluate(&self, _js: &str, _args: &[serde_json::Value]) -> Result<serde_json::Value, DriverError> {
            Ok(serde_json::Value::Null)
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
            selector: &str,
        ) -> Result<Box<dyn Locator>, DriverError> {
            if selector == self.working_selector {
                Ok(Box::new(NoopLocator))
            } else {
                Err(DriverError::TargetNotFound(selector.to_string()))
            }
        }
    }

    struct StubSynthesizer {
        candidate: String,
    }
    impl SelectorSynthesizer for StubSynthesizer {
        fn synthesize(
            &self,
            _descriptor: &ElementDescriptor,
            _snapshot: &Snapshot,
        ) -> Result<Vec<SelectorCandidate>, SynthesizerError> {
            Ok(vec![SelectorCandidate {
                strategy: Strategy::DataTestId,
                selector: self.candidate.clone(),
                estimated_uniqueness: 1,
                confidence: 1.0,
                alternatives: vec![],
            }])
        }
    }

    fn element(backend_node_id: u64) -> ElementDescriptor {
        ElementDescriptor {
            backend_node_id,
            frame_path: vec![],
            tag: "button".into(),
            text: "Submit".into(),
            attributes: BTreeMap::new(),
            role: Some("button".into()),
            aria_name: None,
            bbox: None,
            visible: true,
            interactive: true,
            xpath: "/html[1]/body[1]/button[1]".into(),
            css_path: None,
            is_shadow_host: false,
            hierarchy_path: vec![],
        }
    }

    fn snapshot_with(elements: Vec<ElementDescriptor>) -> Snapshot {
        Snapshot {
            snapshot_id: 1,
            url: "https://example.com".into(),
            page_signature: "example.com".into(),
            frame_hashes: BTreeMap::new(),
            elements,
            captured_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn heals_via_resynthesis_when_history_misses() {
        let dir = tempfile::tempdir().unwrap();
        let promotion = Arc::new(navkit_promotion::DefaultPromotionStore::new(dir.path().to_path_buf()));
        let synthesizer = Arc::new(StubSynthesizer {
            candidate: "//*[@data-testid=\"submit\"]".to_string(),
        });
        let verifier = Arc::new(navkit_verifier::DefaultVerifier);
        let driver = FakeDriver {
            working_selector: "//*[@data-testid=\"submit\"]".to_string(),
        };
        let healer = DefaultSelfHealer::new(synthesizer, verifier, promotion);

        let snapshot = snapshot_with(vec![element(1)]);
        let ranked = vec![ScoredElement {
            index: 0,
            fusion: 0.9,
            breakdown: navkit_fusion::SignalBreakdown {
                s_semantic: 0.9,
                s_heuristic: 0.9,
                promotion_boost: 0.0,
            },
        }];
        let request = HealRequest {
            page_signature: "example.com".into(),
            frame_hash: "f1".into(),
            label_key: "label:click|submit".into(),
            frame_path: vec![],
            failed_selector: "//*[@id=\"submit-btn-2023\"]".into(),
        };

        let outcome = healer.heal(&driver, request, &ranked, &snapshot).await;
        assert!(outcome.is_healed());
        assert_eq!(outcome.selector(), Some("//*[@data-testid=\"submit\"]"));
    }

    #[tokio::test]
    async fn failed_when_nothing_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let promotion = Arc::new(navkit_promotion::DefaultPromotionStore::new(dir.path().to_path_buf()));
        let synthesizer = Arc::new(StubSynthesizer {
            candidate: "//*[@data-testid=\"nope\"]".to_string(),
        });
        let verifier = Arc::new(navkit_verifier::DefaultVerifier);
        let driver = FakeDriver {
            working_selector: "//*[@data-testid=\"only-this-works\"]".to_string(),
        };
        let healer = DefaultSelfHealer::new(synthesizer, verifier, promotion);

        let snapshot = snapshot_with(vec![element(1)]);
        let ranked = vec![];
        let request = HealRequest {
            page_signature: "example.com".into(),
            frame_hash: "f1".into(),
            label_key: "label:click|submit".into(),
            frame_path: vec![],
            failed_selector: "//*[@id=\"stale\" and normalize-space()=\"Submit\"]".into(),
        };

        let outcome = healer.heal(&driver, request, &ranked, &snapshot).await;
        assert!(!outcome.is_healed());
    }
}
