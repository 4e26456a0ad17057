use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    DataTestId,
    StableId,
    AriaLabel,
    HrefText,
    IdText,
    ClassText,
    IdClassText,
    RoleName,
    ExactText,
    ContainsText,
}

impl Strategy {
    /// Base confidence before uniqueness scaling: 1.0 for `data-testid`
    /// down to 0.3 for contains-text, per the fixed precedence order.
    pub fn base_confidence(self) -> f64 {
        match self {
            Strategy::DataTestId => 1.0,
            Strategy::StableId => 0.95,
            Strategy::AriaLabel => 0.85,
            Strategy::HrefText => 0.75,
            Strategy::IdText => 0.7,
            Strategy::ClassText => 0.6,
            Strategy::IdClassText => 0.55,
            Strategy::RoleName => 0.5,
            Strategy::ExactText => 0.4,
            Strategy::ContainsText => 0.3,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectorCandidate {
    pub strategy: Strategy,
    pub selector: String,
    pub estimated_uniqueness: usize,
    pub confidence: f64,
    /// Up to 3 alternative non-XPath renderings of the same candidate.
    pub alternatives: Vec<String>,
}
