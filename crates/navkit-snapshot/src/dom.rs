use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// One document (frame) of the flattened document the driver returns.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawDocument {
    pub frame_url: String,
    pub nodes: Vec<RawDomNode>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawNodeType {
    Element,
    Text,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawDomNode {
    pub backend_node_id: u64,
    pub parent_backend_node_id: Option<u64>,
    pub node_type: RawNodeType,
    pub tag_name: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub text_value: Option<String>,
    #[serde(default)]
    pub child_backend_node_ids: Vec<u64>,
    #[serde(default)]
    pub is_shadow_host: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawAxNode {
    pub backend_node_id: u64,
    pub role: Option<String>,
    pub name: Option<String>,
}

/// Per-frame index over a [`RawDocument`], with bottom-up text
/// canonicalization precomputed so the child-echo invariant holds:
/// an element's own direct text is dropped when it duplicates a child's
/// already-computed text (fixes `"Shop Shop"` arising from naive
/// concatenation of `<div>Shop<span>Shop</span></div>`).
pub struct DomIndex<'a> {
    pub by_id: HashMap<u64, &'a RawDomNode>,
    canonical_text: HashMap<u64, String>,
}

impl<'a> DomIndex<'a> {
    pub fn build(document: &'a RawDocument) -> Self {
        let mut by_id = HashMap::with_capacity(document.nodes.len());
        for node in &document.nodes {
            by_id.insert(node.backend_node_id, node);
        }

        let mut canonical_text = HashMap::new();
        let roots: Vec<u64> = document
            .nodes
            .iter()
            .filter(|n| n.parent_backend_node_id.is_none())
            .map(|n| n.backend_node_id)
            .collect();
        for root in roots {
            compute_canonical_text(root, &by_id, &mut canonical_text);
        }

        Self {
            by_id,
            canonical_text,
        }
    }

    pub fn text_of(&self, backend_node_id: u64) -> String {
        self.canonical_text
            .get(&backend_node_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn sibling_index(&self, node: &RawDomNode) -> usize {
        let Some(parent_id) = node.parent_backend_node_id else {
            return 0;
        };
        let Some(parent) = self.by_id.get(&parent_id) else {
            return 0;
        };
        parent
            .child_backend_node_ids
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .filter(|sibling| sibling.tag_name == node.tag_name)
            .position(|sibling| sibling.backend_node_id == node.backend_node_id)
            .unwrap_or(0)
    }
}

fn compute_canonical_text(
    id: u64,
    by_id: &HashMap<u64, &RawDomNode>,
    memo: &mut HashMap<u64, String>,
) -> String {
    if let Some(cached) = memo.get(&id) {
        return cached.clone();
    }
    let Some(node) = by_id.get(&id) else {
        return String::new();
    };

    let text = match node.node_type {
        RawNodeType::Text => node
            .text_value
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_string(),
        RawNodeType::Element => {
            let direct_text = node
                .text_value
                .as_deref()
                .unwrap_or("")
                .trim()
                .to_string();

            let mut child_texts = Vec::new();
            for child_id in &node.child_backend_node_ids {
                let child_text = compute_canonical_text(*child_id, by_id, memo);
                if !child_text.is_empty() {
                    child_texts.push(child_text);
                }
            }

            let direct_is_duplicate =
                !direct_text.is_empty() && child_texts.iter().any(|t| t == &direct_text);

            let mut parts = Vec::new();
            if !direct_text.is_empty() && !direct_is_duplicate {
                parts.push(direct_text);
            }
            parts.extend(child_texts);
            dedupe_adjacent(&parts).join(" ")
        }
    };

    memo.insert(id, text.clone());
    text
}

fn dedupe_adjacent(parts: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(parts.len());
    for part in parts {
        if out.last().map(|last| last == part).unwrap_or(false) {
            continue;
        }
        out.push(part.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elem(id: u64, parent: Option<u64>, tag: &str, text: Option<&str>, children: Vec<u64>) -> RawDomNode {
        RawDomNode {
            backend_node_id: id,
            parent_backend_node_id: parent,
            node_type: RawNodeType::Element,
            tag_name: Some(tag.to_string()),
            attributes: BTreeMap::new(),
            text_value: text.map(|s| s.to_string()),
            child_backend_node_ids: children,
            is_shadow_host: false,
        }
    }

    #[test]
    fn child_echo_is_not_duplicated() {
        // <div id=1>Shop<span id=2>Shop</span></div>
        let doc = RawDocument {
            frame_url: "https://example.com".into(),
            nodes: vec![
                elem(1, None, "div", Some("Shop"), vec![2]),
                elem(2, Some(1), "span", Some("Shop"), vec![]),
            ],
        };
        let index = DomIndex::build(&doc);
        assert_eq!(index.text_of(1), "Shop");
    }

    #[test]
    fn distinct_child_text_is_preserved() {
        let doc = RawDocument {
            frame_url: "https://example.com".into(),
            nodes: vec![
                elem(1, None, "button", None, vec![2]),
                elem(2, Some(1), "span", Some("Submit"), vec![]),
            ],
        };
        let index = DomIndex::build(&doc);
        assert_eq!(index.text_of(1), "Submit");
    }
}
