use navkit_driver::LocatorStrategy;

/// Infers a driver locator strategy from a selector's prefix, matching the
/// conventions the Selector Synthesizer emits: bare `//...`/`/...` is
/// XPath, `text=`/`aria-label=` resolve via the text strategy (the driver
/// contract has no dedicated ARIA-attribute strategy), `role=` via role,
/// anything else is treated as CSS.
pub fn detect_strategy(selector: &str) -> (LocatorStrategy, String) {
    if let Some(value) = selector.strip_prefix("text=") {
        return (LocatorStrategy::Text, value.to_string());
    }
    if let Some(value) = selector.strip_prefix("aria-label=") {
        return (LocatorStrategy::Text, value.to_string());
    }
    if let Some(value) = selector.strip_prefix("role=") {
        return (LocatorStrategy::Role, value.to_string());
    }
    if selector.starts_with('/') {
        return (LocatorStrategy::Xpath, selector.to_string());
    }
    (LocatorStrategy::Css, selector.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_xpath_by_leading_slash() {
        let (strategy, value) = detect_strategy("//button[@id=\"go\"]");
        assert_eq!(strategy, LocatorStrategy::Xpath);
        assert_eq!(value, "//button[@id=\"go\"]");
    }

    #[test]
    fn detects_text_prefix() {
        let (strategy, value) = detect_strategy("text=Submit");
        assert_eq!(strategy, LocatorStrategy::Text);
        assert_eq!(value, "Submit");
    }

    #[test]
    fn falls_back_to_css() {
        let (strategy, _) = detect_strategy(".btn-primary");
        assert_eq!(strategy, LocatorStrategy::Css);
    }
}
