use tracing::warn;

use navkit_intent::ParsedIntent;
use navkit_snapshot::Snapshot;

use crate::signals::{cosine_similarity, s_heuristic};
use crate::weights::FusionWeights;

/// Supplies the Promotion Store's confidence for a matching `label_key` on
/// this page, scaled by 0.1 and added once. Implemented by the Promotion
/// Store; a source that always returns 0.0 is used when none is wired up.
pub trait PromotionBoostSource: Send + Sync {
    fn boost(&self, page_signature: &str, frame_hash: &str, label_key: &str) -> f64;
}

pub struct NoPromotionBoost;

impl PromotionBoostSource for NoPromotionBoost {
    fn boost(&self, _page_signature: &str, _frame_hash: &str, _label_key: &str) -> f64 {
        0.0
    }
}

#[derive(Clone, Debug)]
pub struct SignalBreakdown {
    pub s_semantic: f64,
    pub s_heuristic: f64,
    pub promotion_boost: f64,
}

#[derive(Clone, Debug)]
pub struct ScoredElement {
    pub index: usize,
    pub fusion: f64,
    pub breakdown: SignalBreakdown,
}

pub trait FusionScorer: Send + Sync {
    fn score(
        &self,
        intent: &ParsedIntent,
        query_embedding: &[f32],
        matrix: &[Vec<f32>],
        snapshot: &Snapshot,
        promotion: &dyn PromotionBoostSource,
    ) -> Vec<ScoredElement>;
}

pub struct DefaultFusionScorer {
    pub weights: FusionWeights,
}

impl DefaultFusionScorer {
    pub fn new(weights: FusionWeights) -> Self {
        Self { weights }
    }
}

impl Default for DefaultFusionScorer {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
        }
    }
}

impl FusionScorer for DefaultFusionScorer {
    fn score(
        &self,
        intent: &ParsedIntent,
        query_embedding: &[f32],
        matrix: &[Vec<f32>],
        snapshot: &Snapshot,
        promotion: &dyn PromotionBoostSource,
    ) -> Vec<ScoredElement> {
        let label_key = intent.label_key();
        let mut scored = Vec::with_capacity(snapshot.elements.len());

        for (index, descriptor) in snapshot.elements.iter().enumerate() {
            let Some(vector) = matrix.get(index) else {
                continue;
            };

            let s_semantic = cosine_similarity(query_embedding, vector);
            let heuristic = s_heuristic(intent, descriptor);
            let frame_hash = snapshot.frame_hash_for(&descriptor.frame_path).unwrap_or("");
            let promotion_boost =
                promotion.boost(&snapshot.page_signature, frame_hash, &label_key) * 0.1;

            let fusion =
                self.weights.w_s * s_semantic + self.weights.w_h * heuristic + promotion_boost;

            if !fusion.is_finite() {
                warn!(index, "dropping element with non-finite fusion score");
                continue;
            }

            scored.push(ScoredElement {
                index,
                fusion,
                breakdown: SignalBreakdown {
                    s_semantic,
                    s_heuristic: heuristic,
                    promotion_boost,
                },
            });
        }

        scored.sort_by(|a, b| {
            b.fusion
                .partial_cmp(&a.fusion)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.breakdown
                        .promotion_boost
                        .partial_cmp(&a.breakdown.promotion_boost)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| {
                    let a_interactive = snapshot.elements[a.index].interactive;
                    let b_interactive = snapshot.elements[b.index].interactive;
                    b_interactive.cmp(&a_interactive)
                })
                .then_with(|| {
                    let a_depth = snapshot.elements[a.index].hierarchy_path.len();
                    let b_depth = snapshot.elements[b.index].hierarchy_path.len();
                    a_depth.cmp(&b_depth)
                })
                .then_with(|| a.index.cmp(&b.index))
        });

        scored
    }
}
