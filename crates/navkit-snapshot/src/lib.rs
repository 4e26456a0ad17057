//! Snapshot Builder: turns a driver's raw DOM/AX/frame data into a
//! normalized [`model::Snapshot`] of [`model::ElementDescriptor`]s.

pub mod builder;
pub mod dom;
pub mod errors;
pub mod hash;
pub mod model;

pub use builder::{shared_default_builder, DefaultSnapshotBuilder, SnapshotBuilder};
pub use errors::SnapshotError;
pub use model::{is_interactive, page_signature, ElementDescriptor, HierarchyStep, Snapshot};
