use std::collections::HashSet;

use navkit_intent::{Action, ParsedIntent};
use navkit_snapshot::ElementDescriptor;

pub fn cosine_similarity(q: &[f32], e: &[f32]) -> f64 {
    if q.len() != e.len() || q.is_empty() {
        return 0.0;
    }
    let dot: f64 = q.iter().zip(e).map(|(a, b)| *a as f64 * *b as f64).sum();
    let norm_q: f64 = q.iter().map(|v| *v as f64 * *v as f64).sum::<f64>().sqrt();
    let norm_e: f64 = e.iter().map(|v| *v as f64 * *v as f64).sum::<f64>().sqrt();
    if norm_q <= f64::EPSILON || norm_e <= f64::EPSILON {
        return 0.0;
    }
    (dot / (norm_q * norm_e)).clamp(0.0, 1.0)
}

fn expected_roles(action: Action) -> &'static [&'static str] {
    match action {
        Action::Click => &["button", "link"],
        Action::Type => &["textbox"],
        Action::Select => &["combobox", "listbox"],
        Action::Hover => &["button", "link", "menuitem"],
        Action::Validate | Action::Search => &[],
    }
}

fn requires_interactivity(action: Action) -> bool {
    matches!(action, Action::Click | Action::Type | Action::Select | Action::Hover)
}

fn is_disabled(descriptor: &ElementDescriptor) -> bool {
    descriptor.attributes.contains_key("disabled")
        || descriptor
            .attr("aria-disabled")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
}

fn token_overlap_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: HashSet<String> = a.split_whitespace().map(|t| t.to_lowercase()).collect();
    let tokens_b: HashSet<String> = b.split_whitespace().map(|t| t.to_lowercase()).collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Sum of bounded heuristic contributions described in the scoring design.
/// No contribution is counted twice: attribute text identical to the
/// element's visible text only scores once, via the text-match term.
pub fn s_heuristic(intent: &ParsedIntent, descriptor: &ElementDescriptor) -> f64 {
    let mut score = 0.0;
    let target = intent.target_phrase.trim();
    let target_lower = target.to_lowercase();
    let text = descriptor.text.trim();
    let text_lower = text.to_lowercase();

    let exact_match = !text.is_empty() && text_lower == target_lower;
    if exact_match {
        score += 0.4;
    } else if !target_lower.is_empty() && text_lower.contains(&target_lower) {
        score += 0.2;
    }

    score += token_overlap_ratio(text, target) * 0.2;

    if expected_roles(intent.action)
        .iter()
        .any(|r| descriptor.role.as_deref() == Some(*r))
    {
        score += 0.1;
    }

    if requires_interactivity(intent.action) && descriptor.interactive {
        score += 0.05;
    }

    let attribute_fields = ["id", "name", "data-testid", "aria-label"];
    let attribute_hit = attribute_fields.iter().any(|field| {
        descriptor
            .attr(field)
            .map(|value| {
                !target_lower.is_empty()
                    && value.to_lowercase().contains(&target_lower)
                    && value != text
            })
            .unwrap_or(false)
    });
    if attribute_hit {
        score += 0.15;
    }

    score += if descriptor.visible { 0.05 } else { -0.3 };

    if is_disabled(descriptor) {
        score -= 0.3;
    }

    if descriptor.bbox.is_none() {
        score -= 0.1;
    }

    score
}
