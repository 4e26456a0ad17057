use navkit_snapshot::ElementDescriptor;

pub const FALLBACK_MODEL_ID: &str = "fallback-hash-v1";

/// Deterministic hash-derived vector used when the embedding model is
/// unavailable for a single element. Broadcasts a blake3 digest of the
/// model input across the configured dimension, then folds in named
/// structural features at fixed weights, and L2-normalizes the result.
pub fn fallback_embed(text_representation: &str, descriptor: &ElementDescriptor, dim: usize) -> Vec<f32> {
    let mut vector = broadcast_digest(text_representation, dim);

    fold_feature(&mut vector, "tag", &descriptor.tag, 0.3);
    if let Some(id) = descriptor.attr("id") {
        fold_feature(&mut vector, "id", id, 0.2);
    }
    if let Some(class) = descriptor.attr("class") {
        fold_feature(&mut vector, "class", class, 0.2);
    }
    if let Some(role) = &descriptor.role {
        fold_feature(&mut vector, "role", role, 0.2);
    }
    fold_feature(&mut vector, "visible", &descriptor.visible.to_string(), 0.1);
    fold_feature(&mut vector, "clickable", &descriptor.interactive.to_string(), 0.1);

    l2_normalize(&mut vector);
    vector
}

/// Deterministic hash-derived vector for free-standing query text (no
/// element to fold structural features from), used to embed the parsed
/// intent's target phrase when the model is unavailable.
pub fn fallback_embed_text(text: &str, dim: usize) -> Vec<f32> {
    let mut vector = broadcast_digest(text, dim);
    l2_normalize(&mut vector);
    vector
}

fn broadcast_digest(text: &str, dim: usize) -> Vec<f32> {
    let digest = blake3::hash(text.as_bytes());
    let bytes = digest.as_bytes();
    let mut out = Vec::with_capacity(dim);
    for i in 0..dim {
        let b = bytes[i % bytes.len()];
        out.push((b as f32 / 255.0) * 2.0 - 1.0);
    }
    out
}

fn fold_feature(vector: &mut [f32], name: &str, value: &str, weight: f32) {
    if vector.is_empty() {
        return;
    }
    let digest = blake3::hash(format!("{name}:{value}").as_bytes());
    let bytes = digest.as_bytes();
    let index = (u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize) % vector.len();
    vector[index] += weight;
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navkit_snapshot::HierarchyStep;
    use std::collections::BTreeMap;

    #[test]
    fn fallback_embed_is_deterministic_and_normalized() {
        let descriptor = ElementDescriptor {
            backend_node_id: 1,
            frame_path: vec![],
            tag: "button".to_string(),
            text: "Submit".to_string(),
            attributes: BTreeMap::new(),
            role: Some("button".to_string()),
            aria_name: None,
            bbox: None,
            visible: true,
            interactive: true,
            xpath: "/html[1]".to_string(),
            css_path: None,
            is_shadow_host: false,
            hierarchy_path: vec![HierarchyStep { tag: "html".to_string(), sibling_index: 0 }],
        };
        let a = fallback_embed("button text=Submit", &descriptor, 64);
        let b = fallback_embed("button text=Submit", &descriptor, 64);
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-3);
    }
}
