use std::time::Duration;

use serde::{Deserialize, Serialize};

use navkit_fusion::FusionWeights;
use navkit_promotion::{WARM_CACHE_CAPACITY, WARM_CACHE_THRESHOLD};
use navkit_session::{DEFAULT_MIN_SNAPSHOT_INTERVAL, DEFAULT_POLL_INTERVAL, DEFAULT_THETA_REINDEX, STABLE_CONSECUTIVE_POLLS};
use navkit_vector_cache::{DEFAULT_BYTE_BUDGET, DEFAULT_HOT_CAPACITY};

/// Minimum fusion score for a candidate to be actionable; below it
/// the pipeline surfaces [`crate::errors::PipelineError::NoCandidate`].
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;

/// Every component's tunables in one place, so every component is
/// constructed from an explicit value rather than reading a module-level
/// singleton or global.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Semantic signal weight; `w_s + w_h` must equal 1.0.
    pub w_s: f64,
    /// Heuristic signal weight.
    pub w_h: f64,
    /// Minimum fusion score for a candidate to be actionable.
    pub min_confidence: f64,

    /// Elements per embedding batch call.
    pub embed_batch_size: usize,
    /// Elements per box-model fan-out chunk.
    pub snapshot_chunk_size: usize,

    /// SPA DOM-delta reindex threshold.
    pub theta_reindex: f64,
    /// Minimum interval between snapshot captures.
    #[serde(with = "duration_millis")]
    pub min_snapshot_interval: Duration,
    /// `wait_for_stable_dom` poll interval.
    #[serde(with = "duration_millis")]
    pub stable_dom_poll_interval: Duration,
    /// Consecutive unchanged polls required to call the DOM stable.
    pub stable_dom_consecutive_polls: u32,

    /// Vector Cache persistent-tier byte budget.
    pub vector_cache_byte_budget: u64,
    /// Vector Cache in-memory hot-tier size.
    pub vector_cache_hot_capacity: usize,

    /// Promotion Store warm-cache high-confidence threshold.
    pub promotion_warm_threshold: f64,
    /// Promotion Store warm-cache size.
    pub promotion_warm_capacity: usize,
    /// Max age (days) before `run_maintenance` evicts a stale promotion row.
    pub promotion_max_age_days: i64,
    /// Optional per-user/per-host Promotion Store scope.
    pub scope_prefix: Option<String>,
}

impl PipelineConfig {
    pub fn fusion_weights(&self) -> Result<FusionWeights, navkit_fusion::FusionError> {
        FusionWeights::new(self.w_s, self.w_h)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            w_s: 0.6,
            w_h: 0.4,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            embed_batch_size: navkit_embedder::DEFAULT_BATCH_SIZE,
            snapshot_chunk_size: 500,
            theta_reindex: DEFAULT_THETA_REINDEX,
            min_snapshot_interval: DEFAULT_MIN_SNAPSHOT_INTERVAL,
            stable_dom_poll_interval: DEFAULT_POLL_INTERVAL,
            stable_dom_consecutive_polls: STABLE_CONSECUTIVE_POLLS,
            vector_cache_byte_budget: DEFAULT_BYTE_BUDGET,
            vector_cache_hot_capacity: DEFAULT_HOT_CAPACITY,
            promotion_warm_threshold: WARM_CACHE_THRESHOLD,
            promotion_warm_capacity: WARM_CACHE_CAPACITY,
            promotion_max_age_days: 90,
            scope_prefix: None,
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.fusion_weights().is_ok());
    }

    #[test]
    fn default_round_trips_through_json() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.theta_reindex, config.theta_reindex);
    }
}
