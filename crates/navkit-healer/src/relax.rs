//! Produces progressively looser forms of a failed XPath selector.
//!
//! Both transforms are purely syntactic: they operate on the rendered
//! selector string rather than re-synthesizing from the descriptor, so they
//! apply even when the originating element is no longer in any snapshot.

/// Drops one `and`-joined predicate (a pseudo-class-like qualifier, a
/// position index, or the last attribute test) from a bracketed XPath
/// predicate list. Returns `None` once nothing more can be dropped.
pub fn relax_selector(selector: &str) -> Option<String> {
    let (open, close) = bracket_span(selector)?;
    let predicate = &selector[open + 1..close];
    let parts: Vec<&str> = split_and(predicate);
    if parts.len() <= 1 {
        return None;
    }
    let shortened = parts[..parts.len() - 1].join(" and ");
    Some(format!("{}[{}]{}", &selector[..open], shortened, &selector[close + 1..]))
}

/// Keeps only the single most specific predicate: the first `@id`/
/// `@data-testid`/`@aria-label` test if present, else the first `@class`
/// test, else the first predicate at all. Falls back to the bare tag
/// selector (`//tag`) when nothing qualifies.
pub fn partial_selector(selector: &str) -> Option<String> {
    let (open, close) = bracket_span(selector)?;
    let predicate = &selector[open + 1..close];
    let parts = split_and(predicate);

    let best = parts
        .iter()
        .find(|p| p.contains("@data-testid") || p.contains("@id") || p.contains("@aria-label"))
        .or_else(|| parts.iter().find(|p| p.contains("@class")))
        .or_else(|| parts.first())
        .copied();

    match best {
        Some(p) if parts.len() > 1 || p != predicate => {
            Some(format!("{}[{}]{}", &selector[..open], p, &selector[close + 1..]))
        }
        _ => {
            // Already as partial as it gets; fall back to the bare tag.
            let tag_end = selector[..open].len();
            let bare = &selector[..tag_end];
            if bare.is_empty() || bare == selector {
                None
            } else {
                Some(bare.to_string())
            }
        }
    }
}

fn bracket_span(selector: &str) -> Option<(usize, usize)> {
    let open = selector.find('[')?;
    let close = selector.rfind(']')?;
    if close <= open {
        return None;
    }
    Some((open, close))
}

/// Splits a predicate body on top-level ` and ` (not inside nested
/// brackets or quotes).
fn split_and(predicate: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_quote: Option<char> = None;
    let bytes = predicate.as_bytes();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < predicate.len() {
        let c = bytes[i] as char;
        match in_quote {
            Some(q) if c == q => in_quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => in_quote = Some(c),
                '(' | '[' => depth += 1,
                ')' | ']' => depth -= 1,
                ' ' if depth == 0 && predicate[i..].starts_with(" and ") => {
                    parts.push(predicate[start..i].trim());
                    start = i + 5;
                    i += 5;
                    continue;
                }
                _ => {}
            },
        }
        i += 1;
    }
    parts.push(predicate[start..].trim());
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relax_drops_the_last_predicate() {
        let relaxed = relax_selector(r#"//button[@id="x" and normalize-space()="Submit"]"#).unwrap();
        assert_eq!(relaxed, r#"//button[@id="x"]"#);
    }

    #[test]
    fn relax_returns_none_with_single_predicate() {
        assert!(relax_selector(r#"//button[@id="x"]"#).is_none());
    }

    #[test]
    fn partial_prefers_stable_id_over_text() {
        let partial = partial_selector(r#"//button[@id="x" and normalize-space()="Submit"]"#).unwrap();
        assert_eq!(partial, r#"//button[@id="x"]"#);
    }

    #[test]
    fn partial_falls_back_to_bare_tag() {
        let partial = partial_selector(r#"//button[normalize-space()="Submit"]"#).unwrap();
        assert_eq!(partial, "//button");
    }
}
