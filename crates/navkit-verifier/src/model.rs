use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationResult {
    pub ok: bool,
    pub unique: bool,
    pub count: usize,
    pub visible: bool,
    pub occluded: bool,
    pub disabled: bool,
    pub used_selector: String,
    pub frame_path: Vec<String>,
    pub alternatives_tried: Vec<String>,
    pub explanation: String,
}

impl VerificationResult {
    pub fn failure(frame_path: Vec<String>, selector: String, explanation: String) -> Self {
        Self {
            ok: false,
            unique: false,
            count: 0,
            visible: false,
            occluded: false,
            disabled: false,
            used_selector: selector,
            frame_path,
            alternatives_tried: Vec::new(),
            explanation,
        }
    }
}
