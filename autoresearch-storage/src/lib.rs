//! ABOUTME: Storage coordinator — persists claims/embeddings and enforces a RAM budget via eviction
//! ABOUTME: Owns the in-memory graph, columnar overflow, and RDF quad store behind one re-entrant lock

pub mod columnar;
pub mod coordinator;
pub mod graph;
pub mod rdf;

pub use columnar::ColumnarStore;
pub use coordinator::{RamBudgetConfig, StorageCoordinator, VectorHit};
pub use graph::{EvictionPolicy, GraphNode, InMemoryGraph};
pub use rdf::{Quad, RdfStore};
