use tracing::{debug, info};

use navkit_driver::{Driver, LocatorStrategy};

/// Selectors tried, in order, to dismiss a cookie banner or modal overlay
/// that would otherwise occlude the target element. Bounded to one pass
/// the first selector that resolves to a single
/// visible element is clicked and the pass stops, success or not.
const OVERLAY_DISMISS_SELECTORS: &[(&str, LocatorStrategy)] = &[
    ("//button[contains(translate(normalize-space(.), 'ACEPT', 'acept'), 'accept')]", LocatorStrategy::Xpath),
    ("//button[contains(translate(normalize-space(.), 'CLOSE', 'close'), 'close')]", LocatorStrategy::Xpath),
    (r#"[aria-label="Close"]"#, LocatorStrategy::Css),
];

/// Tries each known overlay-dismissal selector once, clicking the first
/// one that resolves uniquely and is visible. Never surfaces an error: a
/// driver hiccup here just means the overlay (if any) stays up and the
/// caller's own verification will fail clearly afterward.
pub async fn try_dismiss_overlay(driver: &dyn Driver) {
    for (selector, strategy) in OVERLAY_DISMISS_SELECTORS {
        let locator = match driver.locator(&[], *strategy, selector).await {
            Ok(locator) => locator,
            Err(_) => continue,
        };

        let count = locator.count().await.unwrap_or(0);
        if count != 1 {
            continue;
        }
        let visible = locator.is_visible().await.unwrap_or(false);
        if !visible {
            continue;
        }

        debug!(selector, "dismissing overlay");
        match locator.click().await {
            Ok(()) => {
                info!(selector, "overlay dismissed");
            }
            Err(err) => {
                debug!(selector, error = %err, "overlay dismiss click failed");
            }
        }
        return;
    }
}
