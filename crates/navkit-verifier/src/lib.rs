//! Verifier: checks a locator against a live page for existence,
//! uniqueness, visibility, enabled state, and occlusion. Never raises
//! driver exceptions to callers; failures surface as `ok=false`.

pub mod model;
pub mod strategy;
pub mod verifier;

pub use model::VerificationResult;
pub use strategy::detect_strategy;
pub use verifier::{DefaultVerifier, Verifier};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use navkit_driver::{Driver, DriverError, FrameNode, Locator, LocatorStrategy, Rect};
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeLocator {
        count: usize,
        visible: bool,
        disabled: bool,
        occluded: bool,
    }

    #[async_trait]
    impl Locator for FakeLocator {
        async fn count(&self) -> Result<usize, DriverError> {
            Ok(self.count)
        }
        async fn is_visible(&self) -> Result<bool, DriverError> {
            Ok(self.visible)
        }
        async fn is_disabled(&self) -> Result<bool, DriverError> {
            Ok(self.disabled)
        }
        async fn bounding_box(&self) -> Result<Option<Rect>, DriverError> {
            Ok(Some(Rect { x: 0.0, y: 0.0, w: 10.0, h: 10.0 }))
        }
        async fn hit_tests_self(&self) -> Result<bool, DriverError> {
            Ok(!self.occluded)
        }
        async fn click(&self) -> Result<(), DriverError> {
            Ok(())
        }
        async fn fill(&self, _value: &str) -> Result<(), DriverError> {
            Ok(())
        }
        async fn select_option(&self, _value: &str) -> Result<(), DriverError> {
            Ok(())
        }
        async fn check(&self) -> Result<(), DriverError> {
            Ok(())
        }
        async fn uncheck(&self) -> Result<(), DriverError> {
            Ok(())
        }
        async fn hover(&self) -> Result<(), DriverError> {
            Ok(())
        }
        async fn focus(&self) -> Result<(), DriverError> {
            Ok(())
        }
        async fn press(&self, _key: &str) -> Result<(), DriverError> {
            Ok(())
        }
        async fn set_input_files(&self, _paths: &[String]) -> Result<(), DriverError> {
            Ok(())
        }
        async fn scroll_into_view_if_needed(&self) -> Result<(), DriverError> {
            Ok(())
        }
    }

    struct FakeDriver {
        primary_fails: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Driver for FakeDriver {
        async fn get_flattened_document(&self, _pierce: bool) -> Result<Value, DriverError> {
            unimplemented!()
        }
        async fn get_full_accessibility_tree(&self) -> Result<Value, DriverError> {
            unimplemented!()
        }
        async fn get_frame_tree(&self) -> Result<FrameNode, DriverError> {
            unimplemented!()
        }
        async fn get_box_model(&self, _backend_node_id: u64) -> Result<Option<Rect>, DriverError> {
            unimplemented!()
        }
        async fn evaluate(&self, _js_expr: &str, _args: &[Value]) -> Result<Value, DriverError> {
            unimplemented!()
        }
        async fn expose_callback(&self, _name: &str) -> Result<(), DriverError> {
            unimplemented!()
        }
        async fn current_url(&self) -> Result<String, DriverError> {
            unimplemented!()
        }
        async fn locator(
            &self,
            _frame_path: &[String],
            _strategy: LocatorStrategy,
            _selector: &str,
        ) -> Result<Box<dyn Locator>, DriverError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 && self.primary_fails {
                return Ok(Box::new(FakeLocator {
                    count: 2,
                    visible: true,
                    disabled: false,
                    occluded: false,
                }));
            }
            Ok(Box::new(FakeLocator {
                count: 1,
                visible: true,
                disabled: false,
                occluded: false,
            }))
        }
    }

    #[tokio::test]
    async fn unique_visible_selector_verifies_ok() {
        let driver = FakeDriver { primary_fails: false, calls: AtomicUsize::new(0) };
        let verifier = DefaultVerifier;
        let result = verifier.verify(&driver, &[], "//button[@id=\"go\"]", &[]).await;
        assert!(result.ok);
        assert_eq!(result.count, 1);
    }

    #[tokio::test]
    async fn falls_back_to_alternate_when_primary_ambiguous() {
        let driver = FakeDriver { primary_fails: true, calls: AtomicUsize::new(0) };
        let verifier = DefaultVerifier;
        let result = verifier
            .verify(&driver, &[], "//button[@class=\"btn\"]", &["text=Submit".to_string()])
            .await;
        assert!(result.ok);
        assert_eq!(result.used_selector, "text=Submit");
        assert_eq!(result.alternatives_tried, vec!["//button[@class=\"btn\"]".to_string()]);
    }
}
