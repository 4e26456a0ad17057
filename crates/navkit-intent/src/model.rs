use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Click,
    Type,
    Select,
    Validate,
    Hover,
    Search,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Click => "click",
            Action::Type => "type",
            Action::Select => "select",
            Action::Validate => "validate",
            Action::Hover => "hover",
            Action::Search => "search",
        };
        f.write_str(s)
    }
}

/// Structured result of parsing one natural-language step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedIntent {
    pub action: Action,
    pub target_phrase: String,
    pub value: Option<String>,
}

impl ParsedIntent {
    pub fn new(action: Action, target_phrase: impl Into<String>, value: Option<String>) -> Self {
        Self {
            action,
            target_phrase: target_phrase.into(),
            value,
        }
    }

    /// Order-independent, case-insensitive key used by the Promotion Store.
    /// Canonicalizes the action token together with the target phrase's
    /// tokens so `click submit` and `submit click` collide.
    pub fn label_key(&self) -> String {
        let mut tokens: Vec<String> = self
            .target_phrase
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();
        tokens.push(self.action.to_string());
        tokens.sort();
        tokens.dedup();
        format!("label:{}", tokens.join("|"))
    }
}
