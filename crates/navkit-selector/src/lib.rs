//! Selector Synthesizer: emits a ranked list of locator candidates per
//! element in a fixed strategy precedence.

pub mod errors;
pub mod escape;
pub mod generated;
pub mod model;
pub mod synthesizer;

pub use errors::SynthesizerError;
pub use escape::xpath_literal;
pub use generated::{is_generated_class, is_generated_id};
pub use model::{SelectorCandidate, Strategy};
pub use synthesizer::{DefaultSelectorSynthesizer, SelectorSynthesizer};
