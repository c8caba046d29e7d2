//! In-memory collaborators: a content repository and a materialized graph
//! store. The demo page runs on these, and so do the engine tests.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use async_trait::async_trait;

use super::backend::{ContentRepository, GraphStoreClient};
use super::error::Result;
use super::types::{ContentNode, ContentRecord, GraphSnapshot, SimilarityEdge, TagCluster};

/// Content rows held in a `Vec`.
#[derive(Clone, Debug, Default)]
pub struct InMemoryContentRepository {
	records: Vec<ContentRecord>,
}

impl InMemoryContentRepository {
	/// Repository over `records`.
	pub fn new(records: Vec<ContentRecord>) -> Self {
		Self { records }
	}

	/// Adds one row.
	pub fn insert(&mut self, record: ContentRecord) {
		self.records.push(record);
	}
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
	async fn list_recent_content(
		&self,
		user_id: &str,
		limit: usize,
	) -> Result<Vec<ContentRecord>> {
		let mut rows: Vec<_> = self
			.records
			.iter()
			.filter(|r| r.user_id == user_id)
			.cloned()
			.collect();
		rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		rows.truncate(limit);
		Ok(rows)
	}
}

#[derive(Clone, Debug, Default)]
struct UserGraph {
	nodes: BTreeMap<String, ContentNode>,
	edges: Vec<SimilarityEdge>,
}

impl UserGraph {
	fn adjacency(&self) -> HashMap<&str, Vec<&str>> {
		let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
		for e in &self.edges {
			adj.entry(&e.source).or_default().push(&e.target);
			adj.entry(&e.target).or_default().push(&e.source);
		}
		adj
	}

	/// Hop distance from `start` to everything within `max` hops.
	fn distances(&self, start: &str, max: u32) -> HashMap<String, u32> {
		let adj = self.adjacency();
		let mut dist = HashMap::from([(start.to_owned(), 0)]);
		let mut queue = VecDeque::from([start]);
		while let Some(id) = queue.pop_front() {
			let d = dist[id];
			if d == max {
				continue;
			}
			for &next in adj.get(id).into_iter().flatten() {
				if !dist.contains_key(next) {
					dist.insert(next.to_owned(), d + 1);
					queue.push_back(next);
				}
			}
		}
		dist
	}

	fn snapshot_of(&self, edges: Vec<SimilarityEdge>, ids: impl IntoIterator<Item = String>) -> GraphSnapshot {
		let ids: HashSet<String> = ids.into_iter().collect();
		GraphSnapshot {
			nodes: self
				.nodes
				.values()
				.filter(|n| ids.contains(&n.id))
				.cloned()
				.collect(),
			edges,
		}
	}
}

/// A materialized similarity graph with community and centrality already
/// assigned, partitioned by user.
#[derive(Clone, Debug, Default)]
pub struct InMemoryGraphStore {
	users: HashMap<String, UserGraph>,
}

impl InMemoryGraphStore {
	/// Empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces a node for `user_id`.
	pub fn insert_node(&mut self, user_id: &str, node: ContentNode) {
		self.users
			.entry(user_id.to_owned())
			.or_default()
			.nodes
			.insert(node.id.clone(), node);
	}

	/// Adds or replaces the similarity relation between `a` and `b`. Self-loops are ignored.
	pub fn insert_edge(&mut self, user_id: &str, a: &str, b: &str, score: f64) {
		if a == b {
			return;
		}
		let edge = SimilarityEdge::ordered(a, b, score);
		let graph = self.users.entry(user_id.to_owned()).or_default();
		graph
			.edges
			.retain(|e| !(e.source == edge.source && e.target == edge.target));
		graph.edges.push(edge);
	}

	fn user(&self, user_id: &str) -> Option<&UserGraph> {
		self.users.get(user_id)
	}
}

#[async_trait]
impl GraphStoreClient for InMemoryGraphStore {
	async fn full_graph(
		&self,
		user_id: &str,
		min_similarity: f64,
		limit: usize,
	) -> Result<GraphSnapshot> {
		let Some(graph) = self.user(user_id) else {
			return Ok(GraphSnapshot::empty());
		};
		let mut edges: Vec<_> = graph
			.edges
			.iter()
			.filter(|e| e.weight >= min_similarity)
			.cloned()
			.collect();
		edges.sort_by(|x, y| {
			y.weight
				.partial_cmp(&x.weight)
				.unwrap_or(Ordering::Equal)
				.then_with(|| x.source.cmp(&y.source))
				.then_with(|| x.target.cmp(&y.target))
		});
		edges.truncate(limit);
		let ids: Vec<String> = edges
			.iter()
			.flat_map(|e| [e.source.clone(), e.target.clone()])
			.collect();
		Ok(graph.snapshot_of(edges, ids))
	}

	async fn neighborhood(
		&self,
		node_id: &str,
		user_id: &str,
		hops: u32,
	) -> Result<GraphSnapshot> {
		let Some(graph) = self.user(user_id) else {
			return Ok(GraphSnapshot::empty());
		};
		if !graph.nodes.contains_key(node_id) {
			return Ok(GraphSnapshot::empty());
		}
		let dist = graph.distances(node_id, hops);
		// An edge lies on a walk of at most `hops` steps when its nearer end is short of the limit.
		let edges: Vec<_> = graph
			.edges
			.iter()
			.filter(|e| {
				match (dist.get(&e.source), dist.get(&e.target)) {
					(Some(&a), Some(&b)) => a.min(b) < hops,
					_ => false,
				}
			})
			.cloned()
			.collect();
		let ids: Vec<String> = edges
			.iter()
			.flat_map(|e| [e.source.clone(), e.target.clone()])
			.collect();
		Ok(graph.snapshot_of(edges, ids))
	}

	async fn shortest_path(
		&self,
		source_id: &str,
		target_id: &str,
		user_id: &str,
	) -> Result<GraphSnapshot> {
		let Some(graph) = self.user(user_id) else {
			return Ok(GraphSnapshot::empty());
		};
		if !graph.nodes.contains_key(source_id) || !graph.nodes.contains_key(target_id) {
			return Ok(GraphSnapshot::empty());
		}

		let adj = graph.adjacency();
		let mut parent: HashMap<&str, &str> = HashMap::new();
		let mut seen = HashSet::from([source_id]);
		let mut queue = VecDeque::from([source_id]);
		while let Some(id) = queue.pop_front() {
			if id == target_id {
				break;
			}
			for &next in adj.get(id).into_iter().flatten() {
				if seen.insert(next) {
					parent.insert(next, id);
					queue.push_back(next);
				}
			}
		}
		if !seen.contains(target_id) {
			return Ok(GraphSnapshot::empty());
		}

		let mut path = vec![target_id];
		while let Some(&prev) = parent.get(path[path.len() - 1]) {
			path.push(prev);
		}
		path.reverse();

		let edges = path
			.windows(2)
			.filter_map(|pair| {
				let probe = SimilarityEdge::ordered(pair[0], pair[1], 0.0);
				graph
					.edges
					.iter()
					.find(|e| e.source == probe.source && e.target == probe.target)
					.cloned()
			})
			.collect();
		Ok(graph.snapshot_of(edges, path.into_iter().map(str::to_owned)))
	}

	async fn tag_clusters(&self, user_id: &str, min_count: usize) -> Result<Vec<TagCluster>> {
		let Some(graph) = self.user(user_id) else {
			return Ok(Vec::new());
		};
		let mut by_tag: BTreeMap<&str, Vec<String>> = BTreeMap::new();
		for node in graph.nodes.values() {
			let unique: HashSet<&str> = node.tags.iter().map(String::as_str).collect();
			for tag in unique {
				by_tag.entry(tag).or_default().push(node.id.clone());
			}
		}
		let mut clusters: Vec<_> = by_tag
			.into_iter()
			.filter(|(_, ids)| ids.len() >= min_count)
			.map(|(tag, content_ids)| TagCluster {
				tag: tag.to_owned(),
				count: content_ids.len(),
				content_ids,
			})
			.collect();
		clusters.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
		Ok(clusters)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::types::ContentType;

	fn node(id: &str, tags: &[&str]) -> ContentNode {
		ContentNode {
			id: id.into(),
			title: format!("Title {id}"),
			content_type: ContentType::Note,
			tags: tags.iter().map(|t| t.to_string()).collect(),
			community: Some(1),
			centrality_score: Some(0.1),
		}
	}

	/// a - b - c - d chain plus e - f, all for user "u".
	fn chain_store() -> InMemoryGraphStore {
		let mut store = InMemoryGraphStore::new();
		for id in ["a", "b", "c", "d", "e", "f"] {
			store.insert_node("u", node(id, &["rust"]));
		}
		store.insert_edge("u", "a", "b", 0.9);
		store.insert_edge("u", "c", "b", 0.8);
		store.insert_edge("u", "c", "d", 0.7);
		store.insert_edge("u", "e", "f", 0.4);
		store
	}

	fn ids(snapshot: &GraphSnapshot) -> Vec<&str> {
		snapshot.nodes.iter().map(|n| n.id.as_str()).collect()
	}

	#[tokio::test]
	async fn recent_content_is_scoped_ordered_and_limited() {
		let mut repo = InMemoryContentRepository::default();
		for (user, id, at) in [("u", "old", 1), ("u", "new", 3), ("v", "other", 5), ("u", "mid", 2)] {
			repo.insert(ContentRecord {
				user_id: user.into(),
				node: node(id, &[]),
				embedding: None,
				created_at: at,
			});
		}
		let rows = repo.list_recent_content("u", 2).await.unwrap();
		let got: Vec<_> = rows.iter().map(|r| r.node.id.as_str()).collect();
		assert_eq!(got, ["new", "mid"]);
	}

	#[tokio::test]
	async fn full_graph_thresholds_and_limits() {
		let store = chain_store();
		let g = store.full_graph("u", 0.5, 2).await.unwrap();
		assert_eq!(g.edges.len(), 2);
		assert_eq!(g.edges[0].weight, 0.9);
		assert_eq!(ids(&g), ["a", "b", "c"]);
		assert!(store.full_graph("nobody", 0.0, 10).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn neighborhood_follows_hops() {
		let store = chain_store();
		let one = store.neighborhood("b", "u", 1).await.unwrap();
		assert_eq!(ids(&one), ["a", "b", "c"]);
		assert_eq!(one.edges.len(), 2);

		let two = store.neighborhood("b", "u", 2).await.unwrap();
		assert_eq!(ids(&two), ["a", "b", "c", "d"]);
		assert_eq!(two.edges.len(), 3);

		assert!(store.neighborhood("zzz", "u", 2).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn shortest_path_walks_the_chain() {
		let store = chain_store();
		let path = store.shortest_path("a", "d", "u").await.unwrap();
		assert_eq!(ids(&path), ["a", "b", "c", "d"]);
		assert_eq!(path.edges.len(), 3);
		assert!(path.edges.iter().all(|e| e.source < e.target));

		let none = store.shortest_path("a", "f", "u").await.unwrap();
		assert!(none.is_empty() && none.edges.is_empty());
	}

	#[tokio::test]
	async fn tag_clusters_respect_min_count() {
		let mut store = chain_store();
		store.insert_node("u", node("g", &["solo", "rust", "rust"]));
		let clusters = store.tag_clusters("u", 2).await.unwrap();
		assert_eq!(clusters.len(), 1);
		assert_eq!(clusters[0].tag, "rust");
		assert_eq!(clusters[0].count, 7);
	}
}
