use serde::{Deserialize, Serialize};

use navkit_verifier::VerificationResult;

/// One runner-up candidate carried alongside the winner, so a caller that
/// rejects the top result (or a human reviewing a failure) sees what else
/// was close.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Alternative {
    pub selector: String,
    pub strategy: String,
    pub fusion_score: f64,
}

/// Timing breakdown for one `query`/`act` call, in milliseconds.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Timing {
    pub snapshot_ms: u64,
    pub embedding_ms: u64,
    pub scoring_ms: u64,
    pub synthesis_ms: u64,
    pub verification_ms: u64,
    pub healing_ms: u64,
    pub total_ms: u64,
}

/// Result of [`crate::pipeline::NavPipeline::query`]: the resolved element
/// and locator, without taking any action on the page.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryResult {
    pub selector: String,
    pub strategy: String,
    pub confidence: f64,
    pub alternatives: Vec<Alternative>,
    pub verification: VerificationResult,
    pub timing: Timing,
    /// Set when the embedder degraded to heuristics-only scoring for this call.
    pub degraded: bool,
    pub explanation: String,
}

/// State of the page right after an action, used to classify whether a
/// navigation mid-action (`RouteChanged`) counts as success.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PostActionState {
    pub url_changed: bool,
    pub new_url: Option<String>,
    pub value_changed: bool,
    pub new_value: Option<String>,
    pub toggle_state: Option<bool>,
}

/// Result of [`crate::pipeline::NavPipeline::act`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub action: String,
    pub selector: String,
    pub value: Option<String>,
    pub post_action: PostActionState,
    pub timing: Timing,
    pub error: Option<String>,
}

impl ActionResult {
    pub fn failed(action: impl Into<String>, selector: impl Into<String>, error: impl Into<String>, timing: Timing) -> Self {
        Self {
            success: false,
            action: action.into(),
            selector: selector.into(),
            value: None,
            post_action: PostActionState::default(),
            timing,
            error: Some(error.into()),
        }
    }
}

/// Session-scoped counters, per `stats()`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_snapshots: u64,
    pub cache_hits: u64,
    pub reindexes: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub hot_entries: usize,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EmbedderStats {
    pub reused: u64,
    pub degraded: u64,
    pub computed: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HealingStats {
    pub attempts: u64,
    pub healed: u64,
    pub failed: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PromotionStats {
    pub successes_recorded: u64,
    pub failures_recorded: u64,
}

/// Aggregate stats surfaced by `stats()`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PipelineStats {
    /// `session=.. page=.. frame=.. mutex=..`, see [`navkit_core_types::ExecRoute`].
    pub route: String,
    pub session: SessionStats,
    pub cache: CacheStats,
    pub embedder: EmbedderStats,
    pub healing: HealingStats,
    pub promotion: PromotionStats,
}
