//! The graph operations exposed to the rest of the application.
//!
//! Every call is request-scoped: the service holds no mutable state, so
//! concurrent callers each build their own snapshot.

use std::sync::Arc;

use log::{debug, error, info, warn};

use super::backend::{
	ContentRepository, EmbeddingGraphSource, FullGraphRequest, GraphSource, GraphStoreClient,
	PrimaryGraphSource, SourceKind,
};
use super::error::{GraphError, Result};
use super::settings::QuerySettings;
use super::types::{GraphResult, GraphSnapshot, TagCluster};

/// Message for callers without an identity.
pub const MSG_UNAUTHORIZED: &str = "Unauthorized";
/// Message for primary-only operations when no primary store is configured.
pub const MSG_NOT_CONFIGURED: &str = "Graph backend not configured";
/// Message for a failed full-graph request.
pub const MSG_GRAPH_FAILED: &str = "Failed to load graph data";
/// Message for a failed neighborhood request.
pub const MSG_NEIGHBORHOOD_FAILED: &str = "Failed to load node neighborhood";
/// Message for a failed shortest-path request.
pub const MSG_PATH_FAILED: &str = "Failed to find path";
/// Message for a failed tag-cluster request.
pub const MSG_CLUSTERS_FAILED: &str = "Failed to load tag clusters";

/// Tries `primary`, then `fallback`.
///
/// The primary answer is used as-is when it has at least one node. A primary
/// error or an empty primary answer is logged and the fallback runs; only a
/// fallback error is returned. The two never run concurrently.
pub async fn resolve_with_fallback(
	primary: Option<&dyn GraphSource>,
	fallback: &dyn GraphSource,
	request: &FullGraphRequest,
) -> Result<(GraphSnapshot, SourceKind)> {
	if let Some(primary) = primary {
		match primary.full_graph(request).await {
			Ok(snapshot) if !snapshot.is_empty() => {
				debug!(
					"{} answered with {} nodes, {} edges",
					primary.kind(),
					snapshot.nodes.len(),
					snapshot.edges.len()
				);
				return Ok((snapshot, primary.kind()));
			}
			Ok(_) => debug!("{} returned no nodes, falling back", primary.kind()),
			Err(err) => warn!("{} failed, falling back: {err}", primary.kind()),
		}
	}
	let snapshot = fallback.full_graph(request).await?;
	Ok((snapshot, fallback.kind()))
}

/// Entry point for graph queries.
#[derive(Clone)]
pub struct GraphService {
	primary: Option<PrimaryGraphSource>,
	fallback: EmbeddingGraphSource,
	settings: QuerySettings,
}

impl GraphService {
	/// Service over a content repository, with no primary store.
	pub fn new(repository: Arc<dyn ContentRepository>, settings: QuerySettings) -> Self {
		Self {
			primary: None,
			fallback: EmbeddingGraphSource::new(repository, settings.clone()),
			settings,
		}
	}

	/// Adds a primary graph store.
	pub fn with_primary(mut self, client: Arc<dyn GraphStoreClient>) -> Self {
		self.primary = Some(PrimaryGraphSource::new(client, self.settings.clone()));
		self
	}

	/// Query defaults in effect.
	pub fn settings(&self) -> &QuerySettings {
		&self.settings
	}

	/// Whether a primary store is present and reports itself configured.
	pub fn is_primary_configured(&self) -> bool {
		self.primary
			.as_ref()
			.is_some_and(|p| p.client().is_configured())
	}

	fn primary_source(&self) -> Option<&PrimaryGraphSource> {
		self.primary
			.as_ref()
			.filter(|p| p.client().is_configured())
	}

	/// Full graph for the caller's dashboard.
	pub async fn get_full_graph(
		&self,
		user_id: Option<&str>,
		min_similarity: f64,
		limit: usize,
	) -> GraphResult {
		let Some(user_id) = user_id else {
			return GraphResult::failure(MSG_UNAUTHORIZED);
		};
		let request = FullGraphRequest {
			user_id: user_id.to_owned(),
			min_similarity,
			limit,
		};
		let primary = self.primary_source().map(|p| p as &dyn GraphSource);
		match resolve_with_fallback(primary, &self.fallback, &request).await {
			Ok((snapshot, kind)) => {
				info!(
					"graph for {user_id}: {} nodes, {} edges via {kind}",
					snapshot.nodes.len(),
					snapshot.edges.len()
				);
				GraphResult::ok(snapshot)
			}
			Err(err) => {
				error!("error getting content graph: {err}");
				GraphResult::failure(MSG_GRAPH_FAILED)
			}
		}
	}

	/// Nodes and edges within `hops` steps of `node_id`. Primary store only.
	pub async fn get_node_neighborhood(
		&self,
		user_id: Option<&str>,
		node_id: &str,
		hops: u32,
	) -> GraphResult {
		let hops = self.settings.hops(hops);
		self.primary_only(user_id, MSG_NEIGHBORHOOD_FAILED, |client, user_id| async move {
			client.neighborhood(node_id, user_id, hops).await
		})
		.await
	}

	/// One shortest path between two nodes. Primary store only.
	pub async fn get_shortest_path(
		&self,
		user_id: Option<&str>,
		source_id: &str,
		target_id: &str,
	) -> GraphResult {
		self.primary_only(user_id, MSG_PATH_FAILED, |client, user_id| async move {
			client.shortest_path(source_id, target_id, user_id).await
		})
		.await
	}

	/// Tags shared by at least `min_count` items. Primary store only.
	pub async fn get_tag_clusters(
		&self,
		user_id: Option<&str>,
		min_count: usize,
	) -> GraphResult<Vec<TagCluster>> {
		self.primary_only(user_id, MSG_CLUSTERS_FAILED, |client, user_id| async move {
			client.tag_clusters(user_id, min_count).await
		})
		.await
	}

	async fn primary_only<'a, T, F, Fut>(
		&'a self,
		user_id: Option<&'a str>,
		failure: &str,
		query: F,
	) -> GraphResult<T>
	where
		F: FnOnce(&'a dyn GraphStoreClient, &'a str) -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let Some(user_id) = user_id else {
			return GraphResult::failure(MSG_UNAUTHORIZED);
		};
		let Some(primary) = self.primary_source() else {
			return GraphResult::failure(MSG_NOT_CONFIGURED);
		};
		match query(primary.client(), user_id).await {
			Ok(data) => GraphResult::ok(data),
			Err(GraphError::NotConfigured) => GraphResult::failure(MSG_NOT_CONFIGURED),
			Err(err) => {
				error!("graph store query failed: {err}");
				GraphResult::failure(failure)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use async_trait::async_trait;

	use super::*;
	use crate::graph::memory::{InMemoryContentRepository, InMemoryGraphStore};
	use crate::graph::types::{ContentNode, ContentRecord, SimilarityEdge};

	/// Repository that counts its calls and can be told to fail.
	#[derive(Default)]
	struct CountingRepository {
		inner: InMemoryContentRepository,
		calls: AtomicUsize,
		last_limit: AtomicUsize,
		fail: bool,
	}

	#[async_trait]
	impl ContentRepository for CountingRepository {
		async fn list_recent_content(
			&self,
			user_id: &str,
			limit: usize,
		) -> Result<Vec<ContentRecord>> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self.last_limit.store(limit, Ordering::SeqCst);
			if self.fail {
				return Err(GraphError::Repository("connection reset by peer".into()));
			}
			self.inner.list_recent_content(user_id, limit).await
		}
	}

	/// Graph store whose every query fails.
	struct BrokenStore {
		configured: bool,
	}

	#[async_trait]
	impl GraphStoreClient for BrokenStore {
		fn is_configured(&self) -> bool {
			self.configured
		}

		async fn full_graph(&self, _: &str, _: f64, _: usize) -> Result<GraphSnapshot> {
			Err(GraphError::Store("ECONNREFUSED 127.0.0.1:7687".into()))
		}

		async fn neighborhood(&self, _: &str, _: &str, _: u32) -> Result<GraphSnapshot> {
			Err(GraphError::Store("ECONNREFUSED 127.0.0.1:7687".into()))
		}

		async fn shortest_path(&self, _: &str, _: &str, _: &str) -> Result<GraphSnapshot> {
			Err(GraphError::Store("ECONNREFUSED 127.0.0.1:7687".into()))
		}

		async fn tag_clusters(&self, _: &str, _: usize) -> Result<Vec<TagCluster>> {
			Err(GraphError::Store("ECONNREFUSED 127.0.0.1:7687".into()))
		}
	}

	fn record(id: &str, embedding: Vec<f32>, created_at: i64) -> ContentRecord {
		ContentRecord {
			user_id: "u".into(),
			node: ContentNode {
				id: id.into(),
				title: id.into(),
				..Default::default()
			},
			embedding: Some(embedding),
			created_at,
		}
	}

	/// c1~c2 (0.85) and c1~c3 (0.72), c4 unrelated to everything.
	fn scenario_records() -> Vec<ContentRecord> {
		let c2_angle = 0.85f32.acos();
		let c3_angle = -(0.72f32.acos());
		vec![
			record("c1", vec![1.0, 0.0, 0.0], 4),
			record("c2", vec![c2_angle.cos(), c2_angle.sin(), 0.0], 3),
			record("c3", vec![c3_angle.cos(), c3_angle.sin(), 0.0], 2),
			record("c4", vec![0.0, 0.0, 1.0], 1),
		]
	}

	fn counting(records: Vec<ContentRecord>) -> Arc<CountingRepository> {
		Arc::new(CountingRepository {
			inner: InMemoryContentRepository::new(records),
			..Default::default()
		})
	}

	fn primary_store() -> InMemoryGraphStore {
		let mut store = InMemoryGraphStore::new();
		for (id, community, rank) in [("p1", 0, 0.5), ("p2", 1, 0.3)] {
			store.insert_node(
				"u",
				ContentNode {
					id: id.into(),
					title: id.into(),
					community: Some(community),
					centrality_score: Some(rank),
					..Default::default()
				},
			);
		}
		store.insert_edge("u", "p1", "p2", 0.9);
		store
	}

	#[tokio::test]
	async fn no_content_is_an_empty_success() {
		let service = GraphService::new(counting(vec![]), QuerySettings::default());
		let result = service.get_full_graph(Some("u"), 0.5, 50).await;
		assert_eq!(result, GraphResult::ok(GraphSnapshot::empty()));
	}

	#[tokio::test]
	async fn missing_identity_is_unauthorized_before_any_work() {
		let repo = counting(scenario_records());
		let service = GraphService::new(repo.clone(), QuerySettings::default());
		let result = service.get_full_graph(None, 0.5, 50).await;
		assert!(!result.success);
		assert_eq!(result.message.as_deref(), Some(MSG_UNAUTHORIZED));
		assert_eq!(repo.calls.load(Ordering::SeqCst), 0);

		let hood = service.get_node_neighborhood(None, "c1", 2).await;
		assert_eq!(hood.message.as_deref(), Some(MSG_UNAUTHORIZED));
	}

	#[tokio::test]
	async fn fallback_drops_unconnected_content() {
		let service = GraphService::new(counting(scenario_records()), QuerySettings::default());
		let result = service.get_full_graph(Some("u"), 0.5, 50).await;
		let data = result.data.unwrap();

		let mut ids: Vec<_> = data.nodes.iter().map(|n| n.id.as_str()).collect();
		ids.sort();
		assert_eq!(ids, ["c1", "c2", "c3"]);

		let pairs: Vec<_> = data
			.edges
			.iter()
			.map(|e| (e.source.as_str(), e.target.as_str()))
			.collect();
		assert_eq!(pairs, [("c1", "c2"), ("c1", "c3")]);
		approx::assert_abs_diff_eq!(data.edges[0].weight, 0.85, epsilon = 1e-5);
		approx::assert_abs_diff_eq!(data.edges[1].weight, 0.72, epsilon = 1e-5);
		assert!(data.nodes.iter().all(|n| n.community.is_none()));
	}

	#[tokio::test]
	async fn fallback_reads_a_clamped_row_count() {
		let repo = counting(scenario_records());
		let service = GraphService::new(repo.clone(), QuerySettings::default());

		service.get_full_graph(Some("u"), 0.5, 1).await;
		assert_eq!(repo.last_limit.load(Ordering::SeqCst), 5);
		service.get_full_graph(Some("u"), 0.5, 500).await;
		assert_eq!(repo.last_limit.load(Ordering::SeqCst), 100);
	}

	#[tokio::test]
	async fn primary_result_is_returned_unmodified() {
		let repo = counting(scenario_records());
		let store = primary_store();
		let expected = store.full_graph("u", 0.5, 200).await.unwrap();
		let service =
			GraphService::new(repo.clone(), QuerySettings::default()).with_primary(Arc::new(store));

		let result = service.get_full_graph(Some("u"), 0.5, 50).await;
		assert_eq!(result.data, Some(expected));
		assert_eq!(repo.calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn failing_primary_falls_back_silently() {
		let repo = counting(scenario_records());
		let service = GraphService::new(repo.clone(), QuerySettings::default())
			.with_primary(Arc::new(BrokenStore { configured: true }));

		let result = service.get_full_graph(Some("u"), 0.5, 50).await;
		assert!(result.success);
		assert_eq!(result.data.unwrap().nodes.len(), 3);
		assert_eq!(repo.calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn empty_primary_falls_back() {
		let repo = counting(scenario_records());
		let service = GraphService::new(repo.clone(), QuerySettings::default())
			.with_primary(Arc::new(InMemoryGraphStore::new()));

		let result = service.get_full_graph(Some("u"), 0.5, 50).await;
		assert_eq!(result.data.unwrap().edges.len(), 2);
		assert_eq!(repo.calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn fallback_failure_is_generic() {
		let repo = Arc::new(CountingRepository {
			fail: true,
			..Default::default()
		});
		let service = GraphService::new(repo, QuerySettings::default())
			.with_primary(Arc::new(BrokenStore { configured: true }));

		let result = service.get_full_graph(Some("u"), 0.5, 50).await;
		assert!(!result.success);
		assert_eq!(result.message.as_deref(), Some(MSG_GRAPH_FAILED));
		assert!(result.data.is_none());
	}

	#[tokio::test]
	async fn primary_only_operations_need_a_configured_store() {
		let without = GraphService::new(counting(vec![]), QuerySettings::default());
		let unconfigured = GraphService::new(counting(vec![]), QuerySettings::default())
			.with_primary(Arc::new(BrokenStore { configured: false }));

		for service in [&without, &unconfigured] {
			assert!(!service.is_primary_configured());
			let hood = service.get_node_neighborhood(Some("u"), "c1", 2).await;
			assert_eq!(hood.message.as_deref(), Some(MSG_NOT_CONFIGURED));
			let path = service.get_shortest_path(Some("u"), "c1", "c2").await;
			assert_eq!(path.message.as_deref(), Some(MSG_NOT_CONFIGURED));
			let tags = service.get_tag_clusters(Some("u"), 2).await;
			assert_eq!(tags.message.as_deref(), Some(MSG_NOT_CONFIGURED));
		}
	}

	#[tokio::test]
	async fn unconfigured_primary_is_skipped_for_full_graph() {
		let repo = counting(scenario_records());
		let service = GraphService::new(repo.clone(), QuerySettings::default())
			.with_primary(Arc::new(BrokenStore { configured: false }));
		let result = service.get_full_graph(Some("u"), 0.5, 50).await;
		assert!(result.success);
		assert_eq!(repo.calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn primary_failures_do_not_leak_details() {
		let service = GraphService::new(counting(vec![]), QuerySettings::default())
			.with_primary(Arc::new(BrokenStore { configured: true }));

		let hood = service.get_node_neighborhood(Some("u"), "c1", 2).await;
		assert_eq!(hood.message.as_deref(), Some(MSG_NEIGHBORHOOD_FAILED));
		let path = service.get_shortest_path(Some("u"), "c1", "c2").await;
		assert_eq!(path.message.as_deref(), Some(MSG_PATH_FAILED));
		let tags = service.get_tag_clusters(Some("u"), 2).await;
		assert_eq!(tags.message.as_deref(), Some(MSG_CLUSTERS_FAILED));
	}

	#[tokio::test]
	async fn primary_only_operations_delegate() {
		let service = GraphService::new(counting(vec![]), QuerySettings::default())
			.with_primary(Arc::new(primary_store()));

		let hood = service.get_node_neighborhood(Some("u"), "p1", 0).await;
		assert_eq!(hood.data.unwrap().edges, [SimilarityEdge::ordered("p1", "p2", 0.9)]);

		let path = service.get_shortest_path(Some("u"), "p2", "p1").await;
		assert_eq!(path.data.unwrap().nodes.len(), 2);
	}
}
