//! Delta Embedder: computes embeddings for the elements whose fingerprint
//! misses the Vector Cache, and reuses cached vectors otherwise.

pub mod embedder;
pub mod errors;
pub mod fallback;
pub mod input;

pub use embedder::{DefaultDeltaEmbedder, DeltaEmbedder, EmbedResult, EmbeddingModel, DEFAULT_BATCH_SIZE};
pub use errors::EmbedderError;
pub use fallback::{fallback_embed, fallback_embed_text, FALLBACK_MODEL_ID};
pub use input::model_input;

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use navkit_snapshot::{ElementDescriptor, HierarchyStep, Snapshot};
    use navkit_vector_cache::DefaultVectorCache;
    use std::collections::BTreeMap;

    struct AlwaysFailsModel;

    #[async_trait]
    impl EmbeddingModel for AlwaysFailsModel {
        fn dim(&self) -> usize {
            16
        }

        async fn embed_batch(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
            Err(EmbedderError::ModelUnavailable("offline".to_string()))
        }
    }

    struct EchoModel;

    #[async_trait]
    impl EmbeddingModel for EchoModel {
        fn dim(&self) -> usize {
            16
        }

        async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
            Ok(inputs.iter().map(|_| vec![1.0; 16]).collect())
        }
    }

    fn snapshot_with_one_element() -> Snapshot {
        Snapshot {
            snapshot_id: 1,
            url: "https://example.com".to_string(),
            page_signature: "example.com".to_string(),
            frame_hashes: BTreeMap::new(),
            elements: vec![ElementDescriptor {
                backend_node_id: 1,
                frame_path: vec![],
                tag: "button".to_string(),
                text: "Submit".to_string(),
                attributes: BTreeMap::new(),
                role: Some("button".to_string()),
                aria_name: None,
                bbox: None,
                visible: true,
                interactive: true,
                xpath: "/html[1]".to_string(),
                css_path: None,
                is_shadow_host: false,
                hierarchy_path: vec![HierarchyStep {
                    tag: "html".to_string(),
                    sibling_index: 0,
                }],
            }],
            captured_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn persistent_model_failure_surfaces_as_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DefaultVectorCache::new(dir.path().to_path_buf());
        let embedder = DefaultDeltaEmbedder::new(AlwaysFailsModel);
        let snapshot = snapshot_with_one_element();
        let result = embedder.embed(&snapshot, &cache).await;
        assert!(matches!(result, Err(EmbedderError::ModelUnavailable(_))));
    }

    #[tokio::test]
    async fn successful_embed_populates_cache_and_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DefaultVectorCache::new(dir.path().to_path_buf());
        let embedder = DefaultDeltaEmbedder::new(EchoModel);
        let snapshot = snapshot_with_one_element();
        let result = embedder.embed(&snapshot, &cache).await.unwrap();
        assert_eq!(result.matrix.len(), 1);
        assert_eq!(result.reused_count, 0);
        assert_eq!(result.degraded_count, 0);

        let second = embedder.embed(&snapshot, &cache).await.unwrap();
        assert_eq!(second.reused_count, 1);
    }
}
