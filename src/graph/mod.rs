//! Knowledge-graph engine: picks a backend, derives similarity edges when the
//! graph store is unavailable, and hands back one consistent snapshot.

pub mod backend;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod settings;
pub mod similarity;
pub mod types;

pub use backend::{
	ContentRepository, EmbeddingGraphSource, FullGraphRequest, GraphSource, GraphStoreClient,
	PrimaryGraphSource, SourceKind,
};
pub use error::{GraphError, Result};
pub use memory::{InMemoryContentRepository, InMemoryGraphStore};
pub use orchestrator::{GraphService, resolve_with_fallback};
pub use settings::QuerySettings;
pub use similarity::{VectorSimilarityResolver, cosine_similarity};
pub use types::{
	ContentNode, ContentRecord, ContentType, GraphResult, GraphSnapshot, SimilarityEdge, TagCluster,
};
