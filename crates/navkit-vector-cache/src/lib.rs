//! Content-addressed embedding cache. An in-memory LRU tier sits over a
//! flat-file persistent tier with a configurable byte budget.

pub mod errors;
pub mod fs;
pub mod hot;
pub mod model;
pub mod store;

pub use errors::VectorCacheError;
pub use model::EmbeddingEntry;
pub use store::{DefaultVectorCache, VectorCache, DEFAULT_BYTE_BUDGET, DEFAULT_HOT_CAPACITY};
