//! Fusion Scorer: combines semantic similarity with bounded heuristic
//! signals and an optional promotion boost into a single ranked score.

pub mod errors;
pub mod scorer;
pub mod signals;
pub mod weights;

pub use errors::FusionError;
pub use scorer::{
    DefaultFusionScorer, FusionScorer, NoPromotionBoost, PromotionBoostSource, ScoredElement,
    SignalBreakdown,
};
pub use signals::{cosine_similarity, s_heuristic};
pub use weights::FusionWeights;
