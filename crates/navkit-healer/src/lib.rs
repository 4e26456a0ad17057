//! Self-Healer: invoked when a previously-working selector fails
//! verification at action time. Walks `Start -> TrySynthesis -> Relax ->
//! Partial -> Failed`, recording every outcome into the Promotion Store.

pub mod errors;
pub mod healer;
pub mod model;
pub mod relax;

pub use errors::HealerError;
pub use healer::{DefaultSelfHealer, SelfHealer, TOP_K};
pub use model::{HealOutcome, HealRequest, HealSource};
