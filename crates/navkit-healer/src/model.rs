use serde::{Deserialize, Serialize};

use navkit_verifier::VerificationResult;

/// Which state of the heal state machine produced the winning selector.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealSource {
    History,
    Synthesis,
    Relaxation,
    Partial,
}

/// Terminal outcome of a heal attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum HealOutcome {
    Healed {
        source: HealSource,
        selector: String,
        verification: VerificationResult,
    },
    Failed {
        explanation: String,
    },
}

impl HealOutcome {
    pub fn is_healed(&self) -> bool {
        matches!(self, HealOutcome::Healed { .. })
    }

    pub fn selector(&self) -> Option<&str> {
        match self {
            HealOutcome::Healed { selector, .. } => Some(selector),
            HealOutcome::Failed { .. } => None,
        }
    }
}

/// Everything the healer needs about the selector that just failed
/// verification at action time.
#[derive(Clone, Debug)]
pub struct HealRequest {
    pub page_signature: String,
    pub frame_hash: String,
    pub label_key: String,
    pub frame_path: Vec<String>,
    pub failed_selector: String,
}
