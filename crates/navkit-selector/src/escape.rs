/// Renders `value` as an XPath string literal. Wrapped in double quotes
/// unless it contains one; if it contains both quote forms, falls back to
/// a `concat(...)` expression (XPath 1.0 has no literal-escaping syntax).
pub fn xpath_literal(value: &str) -> String {
    let has_double = value.contains('"');
    let has_single = value.contains('\'');

    if !has_double {
        format!("\"{value}\"")
    } else if !has_single {
        format!("'{value}'")
    } else {
        let mut parts = Vec::new();
        let mut current = String::new();
        for ch in value.chars() {
            if ch == '"' {
                if !current.is_empty() {
                    parts.push(format!("\"{current}\""));
                    current.clear();
                }
                parts.push("'\"'".to_string());
            } else {
                current.push(ch);
            }
        }
        if !current.is_empty() {
            parts.push(format!("\"{current}\""));
        }
        format!("concat({})", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_value_uses_double_quotes() {
        assert_eq!(xpath_literal("Add to cart"), "\"Add to cart\"");
    }

    #[test]
    fn value_with_double_quote_uses_single_quotes() {
        assert_eq!(xpath_literal(r#"Say "hi""#), "'Say \"hi\"'");
    }

    #[test]
    fn value_with_both_quote_forms_uses_concat() {
        let rendered = xpath_literal(r#"It's "great""#);
        assert!(rendered.starts_with("concat("));
    }
}
