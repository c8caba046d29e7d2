//! Collaborator interfaces and the two graph sources built on them.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use super::error::Result;
use super::settings::QuerySettings;
use super::similarity::VectorSimilarityResolver;
use super::types::{ContentRecord, GraphSnapshot, TagCluster};

/// Read access to a user's content and embeddings.
#[async_trait]
pub trait ContentRepository: Send + Sync {
	/// The user's most recently created items, newest first, at most `limit`.
	async fn list_recent_content(&self, user_id: &str, limit: usize)
	-> Result<Vec<ContentRecord>>;
}

/// Client for the primary graph store, where similarity edges, communities
/// and centrality are already materialized.
///
/// Every query may fail on connectivity problems.
#[async_trait]
pub trait GraphStoreClient: Send + Sync {
	/// Whether the store has connection settings at all.
	fn is_configured(&self) -> bool {
		true
	}

	/// Strongest edges at or above `min_similarity`, up to `limit`, plus their endpoints.
	async fn full_graph(
		&self,
		user_id: &str,
		min_similarity: f64,
		limit: usize,
	) -> Result<GraphSnapshot>;

	/// Everything reachable from `node_id` in at most `hops` steps.
	async fn neighborhood(&self, node_id: &str, user_id: &str, hops: u32)
	-> Result<GraphSnapshot>;

	/// One shortest path between two nodes, empty if they are not connected.
	async fn shortest_path(
		&self,
		source_id: &str,
		target_id: &str,
		user_id: &str,
	) -> Result<GraphSnapshot>;

	/// Tags labelling at least `min_count` items, largest first.
	async fn tag_clusters(&self, user_id: &str, min_count: usize) -> Result<Vec<TagCluster>>;
}

/// Which source produced a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
	/// The materialized graph store.
	Primary,
	/// Similarity derived from embeddings.
	Embeddings,
}

impl fmt::Display for SourceKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			SourceKind::Primary => "primary graph store",
			SourceKind::Embeddings => "embedding similarity",
		})
	}
}

/// Parameters of a full-graph request.
#[derive(Clone, Debug, PartialEq)]
pub struct FullGraphRequest {
	/// Authenticated owner.
	pub user_id: String,
	/// Similarity threshold.
	pub min_similarity: f64,
	/// Caller's node budget, before any source-specific scaling.
	pub limit: usize,
}

/// Anything that can answer a full-graph request.
#[async_trait]
pub trait GraphSource: Send + Sync {
	/// Kind of source, for logging and tests.
	fn kind(&self) -> SourceKind;

	/// Builds a snapshot for `request`.
	async fn full_graph(&self, request: &FullGraphRequest) -> Result<GraphSnapshot>;
}

/// Full graph from the primary store. Results are passed through unmodified.
#[derive(Clone)]
pub struct PrimaryGraphSource {
	client: Arc<dyn GraphStoreClient>,
	settings: QuerySettings,
}

impl PrimaryGraphSource {
	/// Wraps a store client.
	pub fn new(client: Arc<dyn GraphStoreClient>, settings: QuerySettings) -> Self {
		Self { client, settings }
	}

	/// The wrapped client, for the primary-only operations.
	pub fn client(&self) -> &dyn GraphStoreClient {
		self.client.as_ref()
	}
}

#[async_trait]
impl GraphSource for PrimaryGraphSource {
	fn kind(&self) -> SourceKind {
		SourceKind::Primary
	}

	async fn full_graph(&self, request: &FullGraphRequest) -> Result<GraphSnapshot> {
		let candidates = self.settings.primary_candidates(request.limit);
		self.client
			.full_graph(&request.user_id, request.min_similarity, candidates)
			.await
	}
}

/// Full graph derived from recent content embeddings.
///
/// Only connected nodes survive, and nodes carry no community or centrality.
#[derive(Clone)]
pub struct EmbeddingGraphSource {
	repository: Arc<dyn ContentRepository>,
	settings: QuerySettings,
}

impl EmbeddingGraphSource {
	/// Wraps a content repository.
	pub fn new(repository: Arc<dyn ContentRepository>, settings: QuerySettings) -> Self {
		Self {
			repository,
			settings,
		}
	}
}

#[async_trait]
impl GraphSource for EmbeddingGraphSource {
	fn kind(&self) -> SourceKind {
		SourceKind::Embeddings
	}

	async fn full_graph(&self, request: &FullGraphRequest) -> Result<GraphSnapshot> {
		let rows = self.settings.fallback_rows(request.limit);
		let records = self
			.repository
			.list_recent_content(&request.user_id, rows)
			.await?;
		if records.is_empty() {
			return Ok(GraphSnapshot::empty());
		}

		let resolver =
			VectorSimilarityResolver::new(request.min_similarity, self.settings.fallback_edge_cap);
		let edges = resolver.resolve(&records);
		debug!(
			"resolved {} similarity edges over {} content rows",
			edges.len(),
			records.len()
		);

		let snapshot = GraphSnapshot {
			nodes: records
				.into_iter()
				.map(|r| {
					let mut node = r.node;
					node.community = None;
					node.centrality_score = None;
					node
				})
				.collect(),
			edges,
		};
		Ok(snapshot.retain_connected())
	}
}
