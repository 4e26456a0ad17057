use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use navkit_driver::Rect;

/// Tags that are interactive regardless of ARIA role.
const INTERACTIVE_TAGS: &[&str] = &["a", "button", "input", "select", "textarea"];

/// Roles that make a non-native element interactive.
const INTERACTIVE_ROLES: &[&str] = &["button", "link", "textbox", "checkbox", "menuitem"];

pub fn is_interactive(tag: &str, role: Option<&str>) -> bool {
    if INTERACTIVE_TAGS.contains(&tag) {
        return true;
    }
    role.map(|r| INTERACTIVE_ROLES.contains(&r)).unwrap_or(false)
}

/// `disabled` (native) or `aria-disabled="true"`. Does not remove the
/// descriptor, only flips `interactive` to false (identity is unaffected).
pub fn is_disabled(attributes: &BTreeMap<String, String>) -> bool {
    attributes.contains_key("disabled")
        || attributes
            .get("aria-disabled")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
}

/// One ancestor step in an element's `hierarchy_path`: tag name plus the
/// element's index among same-tag siblings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HierarchyStep {
    pub tag: String,
    pub sibling_index: usize,
}

/// Normalized per-element record. Identity within a Snapshot is
/// `(frame_path, backend_node_id)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    pub backend_node_id: u64,
    pub frame_path: Vec<String>,
    pub tag: String,
    pub text: String,
    pub attributes: BTreeMap<String, String>,
    pub role: Option<String>,
    pub aria_name: Option<String>,
    pub bbox: Option<Rect>,
    pub visible: bool,
    pub interactive: bool,
    pub xpath: String,
    pub css_path: Option<String>,
    pub is_shadow_host: bool,
    pub hierarchy_path: Vec<HierarchyStep>,
}

impl ElementDescriptor {
    pub fn identity(&self) -> (Vec<String>, u64) {
        (self.frame_path.clone(), self.backend_node_id)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Stable content fingerprint used as the Vector Cache key.
    /// `hash((tag, sorted attributes, normalized text, role))`.
    pub fn fingerprint(&self) -> String {
        let mut buf = String::new();
        buf.push_str(&self.tag);
        buf.push('\0');
        for (k, v) in &self.attributes {
            buf.push_str(k);
            buf.push('=');
            buf.push_str(v);
            buf.push(';');
        }
        buf.push('\0');
        buf.push_str(&self.text);
        buf.push('\0');
        if let Some(role) = &self.role {
            buf.push_str(role);
        }
        crate::hash::hash_bytes("el", buf.as_bytes())
    }
}

/// Ordered, immutable capture of a page's element set at a point in time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub snapshot_id: u64,
    pub url: String,
    pub page_signature: String,
    /// frame_path key (joined with '/') -> frame_hash
    pub frame_hashes: BTreeMap<String, String>,
    pub elements: Vec<ElementDescriptor>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub captured_at: chrono::DateTime<chrono::Utc>,
}

impl Snapshot {
    pub fn frame_key(frame_path: &[String]) -> String {
        frame_path.join("/")
    }

    pub fn frame_hash_for(&self, frame_path: &[String]) -> Option<&str> {
        self.frame_hashes
            .get(&Self::frame_key(frame_path))
            .map(|s| s.as_str())
    }

    /// 1 - Jaccard(frame_hash sets) between this snapshot and `other`.
    pub fn dom_delta(&self, other: &Snapshot) -> f64 {
        use std::collections::HashSet;
        let a: HashSet<&String> = self.frame_hashes.values().collect();
        let b: HashSet<&String> = other.frame_hashes.values().collect();
        if a.is_empty() && b.is_empty() {
            return 0.0;
        }
        let intersection = a.intersection(&b).count();
        let union = a.union(&b).count();
        if union == 0 {
            0.0
        } else {
            1.0 - (intersection as f64 / union as f64)
        }
    }
}

/// URL path pattern with numeric segments wildcarded, used to group
/// equivalent pages for the Promotion Store.
pub fn page_signature(url: &str) -> String {
    let (netloc, path) = split_netloc_path(url);
    let mut pattern = format!("{netloc}{path}");
    if pattern.ends_with('/') && pattern.len() > 1 {
        pattern.pop();
    }
    wildcard_digits(&pattern)
}

fn split_netloc_path(url: &str) -> (String, String) {
    let without_scheme = url.split("://").nth(1).unwrap_or(url);
    let without_query = without_scheme.split(['?', '#']).next().unwrap_or(without_scheme);
    match without_query.find('/') {
        Some(idx) => (
            without_query[..idx].to_string(),
            without_query[idx..].to_string(),
        ),
        None => (without_query.to_string(), String::new()),
    }
}

fn wildcard_digits(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            while chars.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                chars.next();
            }
            out.push('*');
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_signature_wildcards_numeric_segments() {
        assert_eq!(
            page_signature("https://shop.example.com/orders/123/"),
            "shop.example.com/orders/*"
        );
        assert_eq!(
            page_signature("https://shop.example.com/orders/456"),
            "shop.example.com/orders/*"
        );
    }

    #[test]
    fn interactive_detection_covers_tags_and_roles() {
        assert!(is_interactive("button", None));
        assert!(is_interactive("div", Some("button")));
        assert!(!is_interactive("div", Some("presentation")));
    }

    #[test]
    fn disabled_detection_covers_native_and_aria() {
        let mut attrs = BTreeMap::new();
        assert!(!is_disabled(&attrs));

        attrs.insert("disabled".to_string(), String::new());
        assert!(is_disabled(&attrs));

        let mut aria = BTreeMap::new();
        aria.insert("aria-disabled".to_string(), "true".to_string());
        assert!(is_disabled(&aria));

        let mut aria_false = BTreeMap::new();
        aria_false.insert("aria-disabled".to_string(), "false".to_string());
        assert!(!is_disabled(&aria_false));
    }
}
