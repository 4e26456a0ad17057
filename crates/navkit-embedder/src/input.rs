use navkit_snapshot::ElementDescriptor;

/// Bounded-length serialized form fed to the embedding model:
/// `tag + key attributes + ARIA + normalized text`.
const MAX_TEXT_CHARS: usize = 200;
const KEY_ATTRIBUTES: &[&str] = &["id", "class", "name", "type", "placeholder", "href", "data-testid"];

pub fn model_input(descriptor: &ElementDescriptor) -> String {
    let mut parts = vec![descriptor.tag.clone()];

    for key in KEY_ATTRIBUTES {
        if let Some(value) = descriptor.attr(key) {
            parts.push(format!("{key}={value}"));
        }
    }

    if let Some(role) = &descriptor.role {
        parts.push(format!("role={role}"));
    }
    if let Some(aria_name) = &descriptor.aria_name {
        parts.push(format!("aria-label={aria_name}"));
    }

    let text = truncate(&descriptor.text, MAX_TEXT_CHARS);
    if !text.is_empty() {
        parts.push(format!("text={text}"));
    }

    parts.join(" ")
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use navkit_snapshot::HierarchyStep;
    use std::collections::BTreeMap;

    fn descriptor() -> ElementDescriptor {
        let mut attributes = BTreeMap::new();
        attributes.insert("id".to_string(), "submit-btn".to_string());
        ElementDescriptor {
            backend_node_id: 1,
            frame_path: vec![],
            tag: "button".to_string(),
            text: "Submit".to_string(),
            attributes,
            role: Some("button".to_string()),
            aria_name: None,
            bbox: None,
            visible: true,
            interactive: true,
            xpath: "/html[1]/body[1]/button[1]".to_string(),
            css_path: None,
            is_shadow_host: false,
            hierarchy_path: vec![HierarchyStep {
                tag: "body".to_string(),
                sibling_index: 0,
            }],
        }
    }

    #[test]
    fn input_includes_key_fields() {
        let input = model_input(&descriptor());
        assert!(input.contains("button"));
        assert!(input.contains("id=submit-btn"));
        assert!(input.contains("role=button"));
        assert!(input.contains("text=Submit"));
    }
}
