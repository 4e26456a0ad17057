//! Promotion Store: persistent `(page_signature, frame_hash, label_key) ->
//! selector` cache with success/failure counters driving confidence, and a
//! bounded warm cache of high-confidence entries for fast lookup.

pub mod errors;
pub mod fs;
pub mod model;
pub mod store;

pub use errors::PromotionError;
pub use model::{confidence_for, PromotionEntry, PromotionKey};
pub use store::{DefaultPromotionStore, PromotionStore, WARM_CACHE_CAPACITY, WARM_CACHE_THRESHOLD};
