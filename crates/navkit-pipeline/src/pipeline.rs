use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use navkit_core_types::{ExecRoute, FrameId, PageId, SessionId};
use navkit_driver::{Driver, LocatorStrategy};
use navkit_embedder::DeltaEmbedder;
use navkit_fusion::{FusionScorer, PromotionBoostSource, ScoredElement};
use navkit_healer::{HealOutcome, HealRequest, SelfHealer};
use navkit_intent::{parse, Action, ParsedIntent};
use navkit_promotion::PromotionStore;
use navkit_selector::{SelectorCandidate, SelectorSynthesizer};
use navkit_session::{RouteChangeKind, SessionManager};
use navkit_snapshot::Snapshot;
use navkit_vector_cache::VectorCache;
use navkit_verifier::{VerificationResult, Verifier};

use crate::api::{
    ActionResult, Alternative, CacheStats, EmbedderStats, HealingStats, PipelineStats,
    PostActionState, PromotionStats, QueryResult, SessionStats, Timing,
};
use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::overlay::try_dismiss_overlay;

/// Up to 3 runner-up candidates are carried alongside the winner.
const MAX_ALTERNATIVES: usize = 3;

#[derive(Default)]
struct Counters {
    cache_hits_seen: AtomicU64,
    embed_reused: AtomicU64,
    embed_degraded: AtomicU64,
    embed_computed: AtomicU64,
    heal_attempts: AtomicU64,
    heal_healed: AtomicU64,
    heal_failed: AtomicU64,
    promotion_successes: AtomicU64,
    promotion_failures: AtomicU64,
}

/// Precomputes one promotion-confidence lookup per distinct frame present
/// in a snapshot, so the (sync) Fusion Scorer can read it without blocking
/// on the (async) Promotion Store inside its scoring loop.
struct PrecomputedBoost(HashMap<String, f64>);

impl PromotionBoostSource for PrecomputedBoost {
    fn boost(&self, _page_signature: &str, frame_hash: &str, _label_key: &str) -> f64 {
        self.0.get(frame_hash).copied().unwrap_or(0.0)
    }
}

/// The resolved element/selector/verification for one step, shared by
/// `query` and `act` (both resolve identically; only `act`
/// goes on to execute the action).
struct Resolution {
    intent: ParsedIntent,
    snapshot: Arc<Snapshot>,
    primary: SelectorCandidate,
    alternatives: Vec<Alternative>,
    verification: VerificationResult,
    heal_source: Option<&'static str>,
    degraded: bool,
    page_signature: String,
    frame_hash: String,
    frame_path: Vec<String>,
    timing: Timing,
}

/// Caller-facing entry point: composes the Intent Parser, Snapshot
/// Builder, Delta Embedder, Fusion Scorer, Selector Synthesizer, Verifier,
/// Self-Healer, and Session Manager into `query`/`act`/`stats`.
pub struct NavPipeline {
    config: PipelineConfig,
    session: Arc<dyn SessionManager>,
    vector_cache: Arc<dyn VectorCache>,
    embedder: Arc<dyn DeltaEmbedder>,
    fusion: Arc<dyn FusionScorer>,
    synthesizer: Arc<dyn SelectorSynthesizer>,
    verifier: Arc<dyn Verifier>,
    promotion: Arc<dyn PromotionStore>,
    healer: Arc<dyn SelfHealer>,
    counters: Counters,
    /// Identifies this pipeline instance's session/page/frame for tracing
    /// and diagnostics; one `NavPipeline` currently drives one main frame,
    /// so `route` is fixed at construction rather than threaded per call.
    route: ExecRoute,
}

impl NavPipeline {
    /// Wires every component from its default implementation under one
    /// on-disk root, per the component-by-value construction pattern.
    /// `model` is the embedding backend; this crate only specifies the
    /// [`navkit_embedder::EmbeddingModel`] contract, not a concrete model.
    pub fn bootstrap<M>(
        root: std::path::PathBuf,
        model: M,
        initial_url: impl Into<String>,
        config: PipelineConfig,
    ) -> Result<Self, navkit_fusion::FusionError>
    where
        M: navkit_embedder::EmbeddingModel + 'static,
    {
        let weights = config.fusion_weights()?;
        let vector_cache: Arc<dyn VectorCache> = Arc::new(navkit_vector_cache::DefaultVectorCache::with_capacity(
            root.join("vectors"),
            config.vector_cache_hot_capacity,
            config.vector_cache_byte_budget,
        ));
        let embedder: Arc<dyn DeltaEmbedder> = Arc::new(navkit_embedder::DefaultDeltaEmbedder::with_batch_size(
            model,
            config.embed_batch_size,
        ));
        let fusion: Arc<dyn FusionScorer> = Arc::new(navkit_fusion::DefaultFusionScorer::new(weights));
        let synthesizer: Arc<dyn SelectorSynthesizer> = Arc::new(navkit_selector::DefaultSelectorSynthesizer);
        let verifier: Arc<dyn Verifier> = Arc::new(navkit_verifier::DefaultVerifier);
        let promotion: Arc<dyn PromotionStore> = Arc::new(navkit_promotion::DefaultPromotionStore::scoped(
            root.join("promotions"),
            config.scope_prefix.clone(),
        ));
        let healer: Arc<dyn SelfHealer> = Arc::new(navkit_healer::DefaultSelfHealer::new(
            synthesizer.clone(),
            verifier.clone(),
            promotion.clone(),
        ));
        let session: Arc<dyn SessionManager> = Arc::new(navkit_session::DefaultSessionManager::with_config(
            initial_url,
            navkit_snapshot::shared_default_builder(),
            config.theta_reindex,
            config.min_snapshot_interval,
            config.stable_dom_poll_interval,
        ));

        Ok(Self::new(
            config, session, vector_cache, embedder, fusion, synthesizer, verifier, promotion, healer,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: PipelineConfig,
        session: Arc<dyn SessionManager>,
        vector_cache: Arc<dyn VectorCache>,
        embedder: Arc<dyn DeltaEmbedder>,
        fusion: Arc<dyn FusionScorer>,
        synthesizer: Arc<dyn SelectorSynthesizer>,
        verifier: Arc<dyn Verifier>,
        promotion: Arc<dyn PromotionStore>,
        healer: Arc<dyn SelfHealer>,
    ) -> Self {
        Self {
            config,
            session,
            vector_cache,
            embedder,
            fusion,
            synthesizer,
            verifier,
            promotion,
            healer,
            counters: Counters::default(),
            route: ExecRoute::main_frame(SessionId::new(), PageId::new(), FrameId::new()),
        }
    }

    pub async fn query(
        &self,
        driver: &dyn Driver,
        step: &str,
        url: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<QueryResult, PipelineError> {
        let start = Instant::now();
        debug!(route = %self.route, step, "query");
        let resolution = self.resolve(driver, step, url, cancel).await?;
        let mut timing = resolution.timing;
        timing.total_ms = start.elapsed().as_millis() as u64;

        let explanation = if resolution.verification.ok {
            match resolution.heal_source {
                Some(source) => format!("resolved via self-heal ({source})"),
                None => "resolved on first pass".to_string(),
            }
        } else {
            format!("verification failed: {}", resolution.verification.explanation)
        };

        Ok(QueryResult {
            selector: resolution.primary.selector,
            strategy: format!("{:?}", resolution.primary.strategy),
            confidence: resolution.primary.confidence,
            alternatives: resolution.alternatives,
            verification: resolution.verification,
            timing,
            degraded: resolution.degraded,
            explanation,
        })
    }

    pub async fn act(
        &self,
        driver: &dyn Driver,
        step: &str,
        url: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<ActionResult, PipelineError> {
        let start = Instant::now();
        debug!(route = %self.route, step, "act");
        let resolution = self.resolve(driver, step, url, cancel).await?;
        let mut timing = resolution.timing;

        if !resolution.verification.ok {
            timing.total_ms = start.elapsed().as_millis() as u64;
            return Err(PipelineError::LocatorVerificationFailed(
                resolution.verification.explanation,
            ));
        }

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let pre_action_url = driver.current_url().await.unwrap_or_default();
        let selector = resolution.verification.used_selector.clone();
        let value = resolution.intent.value.clone();

        let action_result = self
            .execute_action(
                driver,
                &resolution.intent,
                &resolution.frame_path,
                &selector,
                value.as_deref(),
            )
            .await;
        timing.total_ms = start.elapsed().as_millis() as u64;

        match action_result {
            Ok(mut post_action) => {
                let new_url = driver.current_url().await.unwrap_or(pre_action_url.clone());
                post_action.url_changed = new_url != pre_action_url;
                post_action.new_url = post_action.url_changed.then(|| new_url.clone());

                if post_action.url_changed {
                    let _ = self
                        .session
                        .on_route_change(driver, RouteChangeKind::PushState, new_url)
                        .await;
                }

                // RouteChanged: a navigation mid-action is success for a
                // click, failure for anything else.
                let success = if post_action.url_changed {
                    matches!(resolution.intent.action, Action::Click)
                } else {
                    true
                };

                if success {
                    let _ = self
                        .promotion
                        .record_success(
                            &resolution.page_signature,
                            &resolution.frame_hash,
                            &resolution.intent.label_key(),
                            &selector,
                            serde_json::Value::Null,
                        )
                        .await;
                    self.counters.promotion_successes.fetch_add(1, Ordering::Relaxed);
                } else {
                    let _ = self
                        .promotion
                        .record_failure(
                            &resolution.page_signature,
                            &resolution.frame_hash,
                            &resolution.intent.label_key(),
                            &selector,
                        )
                        .await;
                    self.counters.promotion_failures.fetch_add(1, Ordering::Relaxed);
                }

                Ok(ActionResult {
                    success,
                    action: resolution.intent.action.to_string(),
                    selector,
                    value,
                    post_action,
                    timing,
                    error: if success {
                        None
                    } else {
                        Some("page navigated mid-action on a non-click step".to_string())
                    },
                })
            }
            Err(err) => {
                let _ = self
                    .promotion
                    .record_failure(
                        &resolution.page_signature,
                        &resolution.frame_hash,
                        &resolution.intent.label_key(),
                        &selector,
                    )
                    .await;
                self.counters.promotion_failures.fetch_add(1, Ordering::Relaxed);
                Err(PipelineError::ActionFailed(err.to_string()))
            }
        }
    }

    pub fn stats(&self) -> PipelineStats {
        let session_state = self.session.state();
        PipelineStats {
            route: self.route.to_string(),
            session: SessionStats {
                total_snapshots: session_state.total_snapshots,
                cache_hits: session_state.cache_hits,
                reindexes: session_state.reindexes,
            },
            cache: CacheStats {
                hot_entries: self.counters.cache_hits_seen.load(Ordering::Relaxed) as usize,
            },
            embedder: EmbedderStats {
                reused: self.counters.embed_reused.load(Ordering::Relaxed),
                degraded: self.counters.embed_degraded.load(Ordering::Relaxed),
                computed: self.counters.embed_computed.load(Ordering::Relaxed),
            },
            healing: HealingStats {
                attempts: self.counters.heal_attempts.load(Ordering::Relaxed),
                healed: self.counters.heal_healed.load(Ordering::Relaxed),
                failed: self.counters.heal_failed.load(Ordering::Relaxed),
            },
            promotion: PromotionStats {
                successes_recorded: self.counters.promotion_successes.load(Ordering::Relaxed),
                failures_recorded: self.counters.promotion_failures.load(Ordering::Relaxed),
            },
        }
    }

    async fn resolve(
        &self,
        driver: &dyn Driver,
        step: &str,
        url: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<Resolution, PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let intent = parse(step)?;
        debug!(action = %intent.action, target = %intent.target_phrase, "intent parsed");

        try_dismiss_overlay(driver).await;

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let snapshot_start = Instant::now();
        let snapshot = self.acquire_snapshot(driver, url).await?;
        let snapshot_ms = snapshot_start.elapsed().as_millis() as u64;

        if snapshot.elements.is_empty() {
            return Err(PipelineError::NoCandidate);
        }

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let label_key = intent.label_key();

        let embed_start = Instant::now();
        let (matrix, degraded_elements) = match self.embedder.embed(&snapshot, &*self.vector_cache).await {
            Ok(result) => {
                self.counters.embed_reused.fetch_add(result.reused_count as u64, Ordering::Relaxed);
                self.counters
                    .embed_degraded
                    .fetch_add(result.degraded_count as u64, Ordering::Relaxed);
                self.counters.embed_computed.fetch_add(
                    (snapshot.elements.len() - result.reused_count) as u64,
                    Ordering::Relaxed,
                );
                (result.matrix, result.degraded_count > 0)
            }
            Err(err) => {
                warn!(error = %err, "embedder unavailable, continuing with heuristics-only scoring");
                (vec![Vec::new(); snapshot.elements.len()], true)
            }
        };
        let query_embedding = match self.embedder.embed_query(&intent.target_phrase).await {
            Ok(vector) => vector,
            Err(_) => Vec::new(),
        };
        let embedding_ms = embed_start.elapsed().as_millis() as u64;

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let scoring_start = Instant::now();
        let boost = self.precompute_boost(&snapshot, &label_key).await;
        let ranked = self.fusion.score(&intent, &query_embedding, &matrix, &snapshot, &boost);
        let scoring_ms = scoring_start.elapsed().as_millis() as u64;

        let Some(best) = ranked.first() else {
            return Err(PipelineError::NoCandidate);
        };
        if best.fusion < self.config.min_confidence {
            return Err(PipelineError::NoCandidate);
        }

        let descriptor = &snapshot.elements[best.index];
        let frame_hash = snapshot.frame_hash_for(&descriptor.frame_path).unwrap_or("").to_string();
        let page_signature = snapshot.page_signature.clone();
        let frame_path = descriptor.frame_path.clone();

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let synthesis_start = Instant::now();
        let candidates = self.synthesizer.synthesize(descriptor, &snapshot)?;
        let Some(primary) = candidates.first().cloned() else {
            return Err(PipelineError::NoCandidate);
        };
        let alternates = collect_alternates(&candidates);
        let synthesis_ms = synthesis_start.elapsed().as_millis() as u64;

        let alternatives = self.build_alternatives(&ranked, &snapshot);

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let verify_start = Instant::now();
        let mut verification = self
            .verifier
            .verify(driver, &descriptor.frame_path, &primary.selector, &alternates)
            .await;
        let mut heal_source = None;

        if !verification.ok {
            self.counters.heal_attempts.fetch_add(1, Ordering::Relaxed);
            let request = HealRequest {
                page_signature: page_signature.clone(),
                frame_hash: frame_hash.clone(),
                label_key: label_key.clone(),
                frame_path: descriptor.frame_path.clone(),
                failed_selector: primary.selector.clone(),
            };
            match self.healer.heal(driver, request, &ranked, &snapshot).await {
                HealOutcome::Healed { source, selector, verification: heal_verification } => {
                    self.counters.heal_healed.fetch_add(1, Ordering::Relaxed);
                    info!(selector = %selector, "self-heal succeeded");
                    heal_source = Some(heal_source_label(source));
                    verification = heal_verification;
                }
                HealOutcome::Failed { explanation } => {
                    self.counters.heal_failed.fetch_add(1, Ordering::Relaxed);
                    warn!(explanation, "self-heal failed");
                    verification.explanation = explanation;
                }
            }
        }
        let verification_ms = verify_start.elapsed().as_millis() as u64;

        Ok(Resolution {
            intent,
            snapshot,
            primary,
            alternatives,
            verification,
            heal_source,
            degraded: degraded_elements,
            page_signature,
            frame_hash,
            frame_path,
            timing: Timing {
                snapshot_ms,
                embedding_ms,
                scoring_ms,
                synthesis_ms,
                verification_ms,
                healing_ms: 0,
                total_ms: 0,
            },
        })
    }

    async fn acquire_snapshot(
        &self,
        driver: &dyn Driver,
        url: Option<String>,
    ) -> Result<Arc<Snapshot>, PipelineError> {
        if let Some(target) = url {
            let current = self.session.state().current_url;
            if target != current {
                self.session
                    .on_route_change(driver, RouteChangeKind::PushState, target)
                    .await?;
                if let Some(snapshot) = self.session.state().last_snapshot {
                    return Ok(snapshot);
                }
            }
        }
        Ok(self.session.snapshot(driver).await?)
    }

    async fn precompute_boost(&self, snapshot: &Snapshot, label_key: &str) -> PrecomputedBoost {
        let mut boosts = HashMap::new();
        for frame_hash in snapshot.frame_hashes.values() {
            if boosts.contains_key(frame_hash) {
                continue;
            }
            let score = self
                .promotion
                .score(&snapshot.page_signature, frame_hash, label_key)
                .await
                .unwrap_or(0.0);
            boosts.insert(frame_hash.clone(), score);
        }
        PrecomputedBoost(boosts)
    }

    fn build_alternatives(&self, ranked: &[ScoredElement], snapshot: &Snapshot) -> Vec<Alternative> {
        ranked
            .iter()
            .skip(1)
            .take(MAX_ALTERNATIVES)
            .filter_map(|scored| {
                let descriptor = snapshot.elements.get(scored.index)?;
                let candidate = self.synthesizer.synthesize(descriptor, snapshot).ok()?;
                let top = candidate.first()?;
                Some(Alternative {
                    selector: top.selector.clone(),
                    strategy: format!("{:?}", top.strategy),
                    fusion_score: scored.fusion,
                })
            })
            .collect()
    }

    async fn execute_action(
        &self,
        driver: &dyn Driver,
        intent: &ParsedIntent,
        frame_path: &[String],
        selector: &str,
        value: Option<&str>,
    ) -> Result<PostActionState, navkit_driver::DriverError> {
        let locator = driver.locator(frame_path, LocatorStrategy::Xpath, selector).await?;
        let mut post_action = PostActionState::default();

        match intent.action {
            Action::Click => {
                locator.click().await?;
            }
            Action::Type => {
                let value = value.unwrap_or("");
                locator.fill(value).await?;
                post_action.value_changed = true;
                post_action.new_value = Some(value.to_string());
            }
            Action::Select => {
                let value = value.unwrap_or("");
                locator.select_option(value).await?;
                post_action.value_changed = true;
                post_action.new_value = Some(value.to_string());
            }
            Action::Hover => {
                locator.hover().await?;
            }
            Action::Search => {
                locator.click().await?;
            }
            Action::Validate => {
                // Assertion only; no page mutation. Success is whatever
                // resolution already established (element matched and
                // verified), or a URL-landing check for the "landed on" form.
                if let Some(expected) = intent.target_phrase.strip_prefix('/') {
                    let current = driver.current_url().await?;
                    if !current.contains(expected) {
                        return Err(navkit_driver::DriverError::TargetNotFound(format!(
                            "expected to land on /{expected}, current url is {current}"
                        )));
                    }
                }
            }
        }

        Ok(post_action)
    }
}

fn heal_source_label(source: navkit_healer::HealSource) -> &'static str {
    match source {
        navkit_healer::HealSource::History => "history",
        navkit_healer::HealSource::Synthesis => "resynthesis",
        navkit_healer::HealSource::Relaxation => "relaxation",
        navkit_healer::HealSource::Partial => "partial match",
    }
}

/// Non-primary renderings tried as fallbacks during verification: each
/// candidate's own alternate renderings plus the other strategies'
/// selectors, deduplicated, in descending-confidence order.
fn collect_alternates(candidates: &[SelectorCandidate]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for candidate in candidates.iter() {
        for alt in candidate.alternatives.iter() {
            if seen.insert(alt.clone()) {
                out.push(alt.clone());
            }
        }
    }
    for candidate in candidates.iter().skip(1) {
        if seen.insert(candidate.selector.clone()) {
            out.push(candidate.selector.clone());
        }
    }
    out
}
