use async_trait::async_trait;
use tracing::debug;

use navkit_driver::Driver;

use crate::model::VerificationResult;
use crate::strategy::detect_strategy;

#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(
        &self,
        driver: &dyn Driver,
        frame_path: &[String],
        primary: &str,
        alternates: &[String],
    ) -> VerificationResult;

    async fn verify_batch(
        &self,
        driver: &dyn Driver,
        targets: &[(Vec<String>, String, Vec<String>)],
    ) -> Vec<VerificationResult> {
        let mut out = Vec::with_capacity(targets.len());
        for (frame_path, primary, alternates) in targets {
            out.push(self.verify(driver, frame_path, primary, alternates).await);
        }
        out
    }
}

pub struct DefaultVerifier;

impl Default for DefaultVerifier {
    fn default() -> Self {
        Self
    }
}

#[async_trait]
impl Verifier for DefaultVerifier {
    async fn verify(
        &self,
        driver: &dyn Driver,
        frame_path: &[String],
        primary: &str,
        alternates: &[String],
    ) -> VerificationResult {
        let mut tried = Vec::new();
        let mut last = try_selector(driver, frame_path, primary).await;
        if last.ok {
            return last;
        }
        tried.push(primary.to_string());

        for alternate in alternates {
            let result = try_selector(driver, frame_path, alternate).await;
            if result.ok {
                let mut result = result;
                result.alternatives_tried = tried;
                return result;
            }
            tried.push(alternate.clone());
            last = result;
        }

        last.alternatives_tried = tried;
        last
    }
}

async fn try_selector(driver: &dyn Driver, frame_path: &[String], selector: &str) -> VerificationResult {
    let (strategy, value) = detect_strategy(selector);

    let locator = match driver.locator(frame_path, strategy, &value).await {
        Ok(locator) => locator,
        Err(err) => {
            debug!(selector, error = %err, "locator resolution failed");
            return VerificationResult::failure(
                frame_path.to_vec(),
                selector.to_string(),
                format!("locator resolution failed: {err}"),
            );
        }
    };

    let count = match locator.count().await {
        Ok(c) => c,
        Err(err) => {
            return VerificationResult::failure(
                frame_path.to_vec(),
                selector.to_string(),
                format!("count failed: {err}"),
            )
        }
    };

    if count == 0 {
        return VerificationResult::failure(
            frame_path.to_vec(),
            selector.to_string(),
            "no elements matched".to_string(),
        );
    }

    let unique = count == 1;
    let visible = locator.is_visible().await.unwrap_or(false);
    let disabled = locator.is_disabled().await.unwrap_or(true);
    let occluded = !locator.hit_tests_self().await.unwrap_or(false);
    let ok = unique && visible && !disabled && !occluded;

    let explanation = if ok {
        "verified".to_string()
    } else {
        format!(
            "unique={unique} visible={visible} disabled={disabled} occluded={occluded} count={count}"
        )
    };

    VerificationResult {
        ok,
        unique,
        count,
        visible,
        occluded,
        disabled,
        used_selector: selector.to_string(),
        frame_path: frame_path.to_vec(),
        alternatives_tried: Vec::new(),
        explanation,
    }
}
