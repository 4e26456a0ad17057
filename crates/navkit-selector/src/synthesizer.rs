use navkit_snapshot::{ElementDescriptor, Snapshot};

use crate::errors::SynthesizerError;
use crate::escape::xpath_literal;
use crate::generated::{is_generated_class, is_generated_id};
use crate::model::{SelectorCandidate, Strategy};

pub trait SelectorSynthesizer: Send + Sync {
    fn synthesize(
        &self,
        descriptor: &ElementDescriptor,
        snapshot: &Snapshot,
    ) -> Result<Vec<SelectorCandidate>, SynthesizerError>;
}

pub struct DefaultSelectorSynthesizer;

impl Default for DefaultSelectorSynthesizer {
    fn default() -> Self {
        Self
    }
}

impl SelectorSynthesizer for DefaultSelectorSynthesizer {
    fn synthesize(
        &self,
        descriptor: &ElementDescriptor,
        snapshot: &Snapshot,
    ) -> Result<Vec<SelectorCandidate>, SynthesizerError> {
        let same_frame: Vec<&ElementDescriptor> = snapshot
            .elements
            .iter()
            .filter(|e| e.frame_path == descriptor.frame_path)
            .collect();

        let tag = &descriptor.tag;
        let text = xpath_literal(descriptor.text.trim());
        let mut candidates = Vec::new();

        if let Some(testid) = descriptor.attr("data-testid") {
            let selector = format!("//*[@data-testid={}]", xpath_literal(testid));
            push_candidate(
                &mut candidates,
                Strategy::DataTestId,
                selector,
                count_matching(&same_frame, |e| e.attr("data-testid") == Some(testid)),
                descriptor,
            );
        }

        if let Some(id) = descriptor.attr("id") {
            if !is_generated_id(id) {
                let selector = format!("//*[@id={}]", xpath_literal(id));
                push_candidate(
                    &mut candidates,
                    Strategy::StableId,
                    selector,
                    count_matching(&same_frame, |e| e.attr("id") == Some(id)),
                    descriptor,
                );
            }
        }

        if let Some(aria) = descriptor.aria_name.as_deref() {
            let selector = format!("//*[@aria-label={}]", xpath_literal(aria));
            push_candidate(
                &mut candidates,
                Strategy::AriaLabel,
                selector,
                count_matching(&same_frame, |e| e.aria_name.as_deref() == Some(aria)),
                descriptor,
            );
        }

        if tag == "a" {
            if let Some(href) = descriptor.attr("href") {
                let selector = format!(
                    "//a[@href={} and normalize-space()={}]",
                    xpath_literal(href),
                    text
                );
                push_candidate(
                    &mut candidates,
                    Strategy::HrefText,
                    selector,
                    count_matching(&same_frame, |e| {
                        e.tag == "a" && e.attr("href") == Some(href) && e.text.trim() == descriptor.text.trim()
                    }),
                    descriptor,
                );
            }
        }

        if let Some(id) = descriptor.attr("id") {
            if !is_generated_id(id) {
                let selector = format!(
                    "//{tag}[@id={} and normalize-space()={}]",
                    xpath_literal(id),
                    text
                );
                push_candidate(
                    &mut candidates,
                    Strategy::IdText,
                    selector,
                    count_matching(&same_frame, |e| {
                        e.tag == *tag && e.attr("id") == Some(id) && e.text.trim() == descriptor.text.trim()
                    }),
                    descriptor,
                );
            }
        }

        let stable_class = descriptor
            .attr("class")
            .and_then(|c| c.split_whitespace().find(|token| !is_generated_class(token)));

        if let Some(class) = stable_class {
            let selector = format!(
                "//{tag}[contains(@class,{}) and normalize-space()={}]",
                xpath_literal(class),
                text
            );
            push_candidate(
                &mut candidates,
                Strategy::ClassText,
                selector,
                count_matching(&same_frame, |e| {
                    e.tag == *tag
                        && e.attr("class").map(|c| c.split_whitespace().any(|t| t == class)).unwrap_or(false)
                        && e.text.trim() == descriptor.text.trim()
                }),
                descriptor,
            );
        }

        if let (Some(id), Some(class)) = (descriptor.attr("id"), stable_class) {
            if !is_generated_id(id) {
                let selector = format!(
                    "//{tag}[@id={} and contains(@class,{}) and normalize-space()={}]",
                    xpath_literal(id),
                    xpath_literal(class),
                    text
                );
                push_candidate(
                    &mut candidates,
                    Strategy::IdClassText,
                    selector,
                    count_matching(&same_frame, |e| {
                        e.tag == *tag
                            && e.attr("id") == Some(id)
                            && e.attr("class").map(|c| c.split_whitespace().any(|t| t == class)).unwrap_or(false)
                    }),
                    descriptor,
                );
            }
        }

        if let Some(role) = descriptor.role.as_deref() {
            let name = descriptor.aria_name.as_deref().unwrap_or(descriptor.text.trim());
            if !name.is_empty() {
                let selector = format!(
                    "//*[@role={} and (@aria-label={} or normalize-space()={})]",
                    xpath_literal(role),
                    xpath_literal(name),
                    xpath_literal(name)
                );
                push_candidate(
                    &mut candidates,
                    Strategy::RoleName,
                    selector,
                    count_matching(&same_frame, |e| e.role.as_deref() == Some(role)),
                    descriptor,
                );
            }
        }

        if !descriptor.text.trim().is_empty() {
            let selector = format!("//{tag}[normalize-space()={}]", text);
            push_candidate(
                &mut candidates,
                Strategy::ExactText,
                selector,
                count_matching(&same_frame, |e| {
                    e.tag == *tag && e.text.trim() == descriptor.text.trim()
                }),
                descriptor,
            );

            let selector = format!("//{tag}[contains(normalize-space(),{})]", text);
            push_candidate(
                &mut candidates,
                Strategy::ContainsText,
                selector,
                count_matching(&same_frame, |e| {
                    e.tag == *tag && e.text.contains(descriptor.text.trim()) && !descriptor.text.trim().is_empty()
                }),
                descriptor,
            );
        }

        if candidates.is_empty() {
            return Err(SynthesizerError::NoCandidates);
        }

        // Ambiguity scales confidence down independently of precedence, so a
        // highly-ambiguous high-precedence strategy can land below a unique
        // lower-precedence one. `sort_by` is stable, so ties keep the
        // precedence order candidates were pushed in.
        candidates.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());

        Ok(candidates)
    }
}

fn count_matching<'a>(
    elements: &[&'a ElementDescriptor],
    predicate: impl Fn(&ElementDescriptor) -> bool,
) -> usize {
    elements.iter().filter(|e| predicate(e)).count()
}

fn push_candidate(
    candidates: &mut Vec<SelectorCandidate>,
    strategy: Strategy,
    selector: String,
    uniqueness: usize,
    descriptor: &ElementDescriptor,
) {
    let uniqueness = uniqueness.max(1);
    let mut confidence = strategy.base_confidence();
    if uniqueness > 1 {
        confidence = (confidence / uniqueness as f64).max(0.05);
    }
    candidates.push(SelectorCandidate {
        strategy,
        selector,
        estimated_uniqueness: uniqueness,
        confidence,
        alternatives: alternatives_for(descriptor),
    });
}

/// Up to 3 alternative non-XPath renderings, for drivers/selector engines
/// that accept Playwright-style text/aria/role shorthand.
fn alternatives_for(descriptor: &ElementDescriptor) -> Vec<String> {
    let mut alternatives = Vec::new();
    let trimmed = descriptor.text.trim();
    if !trimmed.is_empty() {
        alternatives.push(format!("text={trimmed}"));
    }
    if let Some(aria) = descriptor.aria_name.as_deref() {
        alternatives.push(format!("aria-label={aria}"));
    }
    if let Some(role) = descriptor.role.as_deref() {
        alternatives.push(format!("role={role}"));
    }
    alternatives.truncate(3);
    alternatives
}
