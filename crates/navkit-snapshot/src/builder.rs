use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, info, warn};

use navkit_driver::{Driver, FrameNode};

use crate::dom::{DomIndex, RawAxNode, RawDocument};
use crate::errors::SnapshotError;
use crate::hash::hash_bytes;
use crate::model::{page_signature, ElementDescriptor, HierarchyStep, Snapshot};

/// Number of elements box-modeled per fan-out batch; keeps a >10^4 element
/// page from issuing one unbounded round trip to the driver.
const DEFAULT_CHUNK_SIZE: usize = 500;

#[async_trait]
pub trait SnapshotBuilder: Send + Sync {
    async fn build(
        &self,
        driver: &dyn Driver,
        pierce_shadow: bool,
    ) -> Result<Snapshot, SnapshotError>;
}

pub struct DefaultSnapshotBuilder {
    next_id: AtomicU64,
    chunk_size: usize,
}

impl DefaultSnapshotBuilder {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            chunk_size: chunk_size.max(1),
        }
    }
}

impl Default for DefaultSnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotBuilder for DefaultSnapshotBuilder {
    async fn build(
        &self,
        driver: &dyn Driver,
        pierce_shadow: bool,
    ) -> Result<Snapshot, SnapshotError> {
        debug!(pierce_shadow, "building snapshot");

        let documents_raw = driver.get_flattened_document(pierce_shadow).await?;
        let documents: Vec<RawDocument> = serde_json::from_value(documents_raw)
            .map_err(|e| SnapshotError::MalformedDocument(e.to_string()))?;

        let ax_raw = driver.get_full_accessibility_tree().await?;
        let ax_nodes: Vec<RawAxNode> = serde_json::from_value(ax_raw)
            .map_err(|e| SnapshotError::MalformedDocument(e.to_string()))?;
        let ax_by_id: HashMap<u64, &RawAxNode> =
            ax_nodes.iter().map(|n| (n.backend_node_id, n)).collect();

        let frame_tree = driver.get_frame_tree().await?;
        let frame_paths = frame_paths_by_url(&frame_tree);

        let url = driver.current_url().await?;

        let mut all_elements = Vec::new();
        let mut frame_hashes: BTreeMap<String, String> = BTreeMap::new();

        for document in &documents {
            let frame_path = frame_paths
                .get(&document.frame_url)
                .cloned()
                .unwrap_or_default();
            let index = DomIndex::build(document);

            let element_nodes: Vec<_> = document
                .nodes
                .iter()
                .filter(|n| n.tag_name.is_some())
                .collect();

            // Fan bounding-box queries out in bounded chunks.
            let mut boxes = HashMap::with_capacity(element_nodes.len());
            for chunk in element_nodes.chunks(self.chunk_size) {
                let futures = chunk
                    .iter()
                    .map(|node| driver.get_box_model(node.backend_node_id));
                let results = join_all(futures).await;
                for (node, result) in chunk.iter().zip(results) {
                    match result {
                        Ok(bbox) => {
                            boxes.insert(node.backend_node_id, bbox);
                        }
                        Err(err) => {
                            warn!(
                                backend_node_id = node.backend_node_id,
                                error = %err,
                                "box model query failed"
                            );
                            boxes.insert(node.backend_node_id, None);
                        }
                    }
                }
            }

            let mut frame_hash_entries = Vec::new();
            for node in &element_nodes {
                let tag = node.tag_name.clone().unwrap_or_default().to_lowercase();
                let id_attr = node.attributes.get("id").cloned().unwrap_or_default();
                let testid = node
                    .attributes
                    .get("data-testid")
                    .cloned()
                    .unwrap_or_default();
                frame_hash_entries.push(format!("{tag}|{id_attr}|{testid}"));

                let ax = ax_by_id.get(&node.backend_node_id);
                let role = ax.and_then(|n| n.role.clone());
                let aria_name = ax.and_then(|n| n.name.clone());

                let bbox = boxes.get(&node.backend_node_id).cloned().flatten();
                let visible = bbox.as_ref().map(|b| b.area() > 0.0).unwrap_or(false)
                    && node.attributes.get("hidden").is_none()
                    && !node
                        .attributes
                        .get("style")
                        .map(|s| s.contains("display:none") || s.contains("display: none"))
                        .unwrap_or(false);

                let interactive = crate::model::is_interactive(&tag, role.as_deref())
                    && !crate::model::is_disabled(&node.attributes);
                let hierarchy_path = hierarchy_path_of(node, &index, &document.nodes);
                let xpath = xpath_of(&hierarchy_path, &tag, index.sibling_index(node));

                all_elements.push(ElementDescriptor {
                    backend_node_id: node.backend_node_id,
                    frame_path: frame_path.clone(),
                    tag,
                    text: index.text_of(node.backend_node_id),
                    attributes: node.attributes.clone(),
                    role,
                    aria_name,
                    bbox,
                    visible,
                    interactive,
                    xpath,
                    css_path: None,
                    is_shadow_host: node.is_shadow_host,
                    hierarchy_path,
                });
            }

            frame_hash_entries.sort();
            let frame_hash = hash_bytes("frame", frame_hash_entries.join("\n").as_bytes());
            frame_hashes.insert(Snapshot::frame_key(&frame_path), frame_hash);
        }

        assert_unique_identity(&all_elements)?;

        let snapshot_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        info!(
            snapshot_id,
            element_count = all_elements.len(),
            frame_count = frame_hashes.len(),
            "snapshot captured"
        );

        Ok(Snapshot {
            snapshot_id,
            page_signature: page_signature(&url),
            url,
            frame_hashes,
            elements: all_elements,
            captured_at: chrono::Utc::now(),
        })
    }
}

fn assert_unique_identity(elements: &[ElementDescriptor]) -> Result<(), SnapshotError> {
    let mut seen = std::collections::HashSet::new();
    for element in elements {
        if !seen.insert(element.identity()) {
            return Err(SnapshotError::MalformedDocument(format!(
                "duplicate (frame_path, backend_node_id) for node {}",
                element.backend_node_id
            )));
        }
    }
    Ok(())
}

fn frame_paths_by_url(root: &FrameNode) -> HashMap<String, Vec<String>> {
    let mut out = HashMap::new();
    walk_frame_tree(root, &mut Vec::new(), &mut out);
    out
}

fn walk_frame_tree(
    node: &FrameNode,
    path_so_far: &mut Vec<String>,
    out: &mut HashMap<String, Vec<String>>,
) {
    out.insert(node.url.clone(), path_so_far.clone());
    let label = node.name.clone().unwrap_or_else(|| node.url.clone());
    path_so_far.push(label);
    for child in &node.children {
        walk_frame_tree(child, path_so_far, out);
    }
    path_so_far.pop();
}

fn hierarchy_path_of(
    node: &crate::dom::RawDomNode,
    index: &DomIndex,
    _all_nodes: &[crate::dom::RawDomNode],
) -> Vec<HierarchyStep> {
    let mut steps = Vec::new();
    let mut current = Some(node.backend_node_id);
    // Bounded depth: stop after 32 ancestors to keep paths small.
    for _ in 0..32 {
        let Some(id) = current else { break };
        let Some(n) = index.by_id.get(&id) else { break };
        let tag = n.tag_name.clone().unwrap_or_default().to_lowercase();
        steps.push(HierarchyStep {
            tag,
            sibling_index: index.sibling_index(n),
        });
        current = n.parent_backend_node_id;
    }
    steps.reverse();
    steps
}

fn xpath_of(hierarchy_path: &[HierarchyStep], _tag: &str, _sibling_index: usize) -> String {
    let mut xpath = String::new();
    for step in hierarchy_path {
        xpath.push('/');
        xpath.push_str(&step.tag);
        xpath.push('[');
        xpath.push_str(&(step.sibling_index + 1).to_string());
        xpath.push(']');
    }
    if xpath.is_empty() {
        "/".to_string()
    } else {
        xpath
    }
}

pub fn shared_default_builder() -> Arc<dyn SnapshotBuilder> {
    Arc::new(DefaultSnapshotBuilder::new())
}
