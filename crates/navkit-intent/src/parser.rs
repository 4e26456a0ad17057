use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::IntentError;
use crate::model::{Action, ParsedIntent};

struct StructuredForm {
    pattern: Lazy<Regex>,
    build: fn(&regex::Captures) -> ParsedIntent,
}

macro_rules! form {
    ($pattern:expr, $build:expr) => {
        StructuredForm {
            pattern: Lazy::new(|| Regex::new($pattern).expect("valid intent regex")),
            build: $build,
        }
    };
}

// Order matters: "validate that it landed on" must be tried before the
// plain "validate" form, since both could otherwise match.
static STRUCTURED_FORMS: &[StructuredForm] = &[
    form!(r#"(?i)^click on ['"](.+?)['"](?: button)?$"#, |c| {
        ParsedIntent::new(Action::Click, c[1].to_string(), None)
    }),
    form!(r#"(?i)^enter ['"](.+?)['"] in ['"](.+?)['"]$"#, |c| {
        ParsedIntent::new(Action::Type, c[2].to_string(), Some(c[1].to_string()))
    }),
    form!(r#"(?i)^type ['"](.+?)['"] in ['"](.+?)['"] field$"#, |c| {
        ParsedIntent::new(Action::Type, c[2].to_string(), Some(c[1].to_string()))
    }),
    form!(r#"(?i)^select ['"](.+?)['"] from ['"](.+?)['"]$"#, |c| {
        ParsedIntent::new(Action::Select, c[2].to_string(), Some(c[1].to_string()))
    }),
    form!(r#"(?i)^validate that it landed on ['"](.+?)['"]$"#, |c| {
        ParsedIntent::new(Action::Validate, c[1].to_string(), None)
    }),
    form!(r#"(?i)^validate ['"](.+?)['"]$"#, |c| {
        ParsedIntent::new(Action::Validate, c[1].to_string(), None)
    }),
    form!(r#"(?i)^hover over ['"](.+?)['"]$"#, |c| {
        ParsedIntent::new(Action::Hover, c[1].to_string(), None)
    }),
];

const ARTICLES: &[&str] = &["a", "an", "the"];

fn verb_to_action(verb: &str) -> Option<Action> {
    match verb {
        "click" | "tap" | "press" => Some(Action::Click),
        "type" | "enter" | "fill" => Some(Action::Type),
        "select" | "choose" => Some(Action::Select),
        "hover" => Some(Action::Hover),
        "search" | "find" | "look" => Some(Action::Search),
        _ => None,
    }
}

pub fn parse(step: &str) -> Result<ParsedIntent, IntentError> {
    let trimmed = step.trim();

    for form in STRUCTURED_FORMS {
        if let Some(captures) = form.pattern.captures(trimmed) {
            return Ok((form.build)(&captures));
        }
    }

    parse_free_form(trimmed)
}

fn parse_free_form(step: &str) -> Result<ParsedIntent, IntentError> {
    let mut words = step.split_whitespace();
    let verb = words
        .next()
        .ok_or_else(|| IntentError::Unparseable(step.to_string()))?
        .to_lowercase();

    let action = verb_to_action(&verb).ok_or_else(|| IntentError::Unparseable(step.to_string()))?;

    let mut remainder: Vec<&str> = words.collect();
    while let Some(first) = remainder.first() {
        if ARTICLES.contains(&first.to_lowercase().as_str()) {
            remainder.remove(0);
        } else {
            break;
        }
    }

    if remainder.is_empty() {
        return Err(IntentError::Unparseable(step.to_string()));
    }

    Ok(ParsedIntent::new(action, remainder.join(" "), None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_click_form() {
        let intent = parse(r#"Click on "Add to cart""#).unwrap();
        assert_eq!(intent.action, Action::Click);
        assert_eq!(intent.target_phrase, "Add to cart");
    }

    #[test]
    fn structured_click_button_suffix() {
        let intent = parse("Click on 'Submit' button").unwrap();
        assert_eq!(intent.action, Action::Click);
        assert_eq!(intent.target_phrase, "Submit");
    }

    #[test]
    fn structured_enter_form() {
        let intent = parse(r#"Enter "jane@example.com" in "Email""#).unwrap();
        assert_eq!(intent.action, Action::Type);
        assert_eq!(intent.value.as_deref(), Some("jane@example.com"));
        assert_eq!(intent.target_phrase, "Email");
    }

    #[test]
    fn structured_type_field_form() {
        let intent = parse(r#"Type "hello" in "Search" field"#).unwrap();
        assert_eq!(intent.action, Action::Type);
        assert_eq!(intent.value.as_deref(), Some("hello"));
    }

    #[test]
    fn structured_select_form() {
        let intent = parse(r#"Select "Blue" from "Color""#).unwrap();
        assert_eq!(intent.action, Action::Select);
        assert_eq!(intent.value.as_deref(), Some("Blue"));
        assert_eq!(intent.target_phrase, "Color");
    }

    #[test]
    fn structured_validate_landed_on_beats_plain_validate() {
        let intent = parse(r#"Validate that it landed on "/checkout/success""#).unwrap();
        assert_eq!(intent.action, Action::Validate);
        assert_eq!(intent.target_phrase, "/checkout/success");
    }

    #[test]
    fn structured_validate_form() {
        let intent = parse(r#"Validate "order total is $42.00""#).unwrap();
        assert_eq!(intent.action, Action::Validate);
        assert_eq!(intent.target_phrase, "order total is $42.00");
    }

    #[test]
    fn structured_hover_form() {
        let intent = parse(r#"Hover over "Account menu""#).unwrap();
        assert_eq!(intent.action, Action::Hover);
    }

    #[test]
    fn free_form_click_strips_article() {
        let intent = parse("tap the checkout button").unwrap();
        assert_eq!(intent.action, Action::Click);
        assert_eq!(intent.target_phrase, "checkout button");
    }

    #[test]
    fn free_form_unknown_verb_fails() {
        assert!(parse("teleport to the moon").is_err());
    }

    #[test]
    fn label_key_is_order_independent_and_case_insensitive() {
        let a = ParsedIntent::new(Action::Click, "Add To Cart", None);
        let b = ParsedIntent::new(Action::Click, "cart to add", None);
        assert_eq!(a.label_key(), b.label_key());
    }
}
