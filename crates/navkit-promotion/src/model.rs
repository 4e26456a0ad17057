use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromotionKey {
    pub page_signature: String,
    pub frame_hash: String,
    pub label_key: String,
}

impl PromotionKey {
    pub fn new(page_signature: impl Into<String>, frame_hash: impl Into<String>, label_key: impl Into<String>) -> Self {
        Self {
            page_signature: page_signature.into(),
            frame_hash: frame_hash.into(),
            label_key: label_key.into(),
        }
    }

    /// Stable filesystem-safe identifier for this key, optionally scoped
    /// (per-user or per-host deployment) by a caller-supplied prefix.
    pub fn content_id(&self, scope_prefix: Option<&str>) -> String {
        let mut buf = String::new();
        if let Some(prefix) = scope_prefix {
            buf.push_str(prefix);
            buf.push('\0');
        }
        buf.push_str(&self.page_signature);
        buf.push('\0');
        buf.push_str(&self.frame_hash);
        buf.push('\0');
        buf.push_str(&self.label_key);
        format!("pe_{}", blake3::hash(buf.as_bytes()).to_hex())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromotionEntry {
    pub key: PromotionKey,
    pub selector: String,
    pub success: u64,
    pub failure: u64,
    #[serde(default)]
    pub last_success: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub last_failure: Option<chrono::DateTime<chrono::Utc>>,
    pub confidence: f64,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created: chrono::DateTime<chrono::Utc>,
    pub updated: chrono::DateTime<chrono::Utc>,
}

impl PromotionEntry {
    pub fn new(key: PromotionKey, selector: String, metadata: serde_json::Value) -> Self {
        let now = chrono::Utc::now();
        Self {
            key,
            selector,
            success: 0,
            failure: 0,
            last_success: None,
            last_failure: None,
            confidence: 0.5,
            metadata,
            created: now,
            updated: now,
        }
    }

    pub fn recompute_confidence(&mut self) {
        self.confidence = confidence_for(self.success, self.failure);
    }
}

/// successes/(successes+failures), damped for small sample sizes so a
/// single early success doesn't immediately read as high-confidence.
pub fn confidence_for(success: u64, failure: u64) -> f64 {
    let total = success + failure;
    if total == 0 {
        return 0.5;
    }
    let raw = success as f64 / total as f64;
    let scale = if total < 5 {
        0.7
    } else if total < 10 {
        0.85
    } else if total < 20 {
        0.95
    } else {
        1.0
    };
    raw * scale
}
