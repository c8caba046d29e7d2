use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of library item a node stands for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
	/// Free-form note.
	#[default]
	Note,
	/// Saved web link.
	Link,
	/// Uploaded file.
	File,
}

impl ContentType {
	/// All content types, in legend order.
	pub const ALL: [ContentType; 3] = [ContentType::Note, ContentType::Link, ContentType::File];

	/// Lowercase name used on the wire and in the legend.
	pub fn as_str(self) -> &'static str {
		match self {
			ContentType::Note => "note",
			ContentType::Link => "link",
			ContentType::File => "file",
		}
	}
}

impl fmt::Display for ContentType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A library item as seen by the graph engine. Read-only.
///
/// `community` and `centrality_score` are only filled in by the primary
/// graph store; snapshots built from embeddings leave them empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentNode {
	/// Content id.
	pub id: String,
	/// Display title.
	pub title: String,
	/// Item kind.
	#[serde(rename = "type")]
	pub content_type: ContentType,
	/// User and auto tags.
	#[serde(default)]
	pub tags: Vec<String>,
	/// Community label from the graph store.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub community: Option<u32>,
	/// Precomputed importance score (PageRank-like), never negative.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub centrality_score: Option<f64>,
}

/// An undirected similarity relation between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEdge {
	/// Lower id of the pair.
	pub source: String,
	/// Higher id of the pair.
	pub target: String,
	/// Similarity in `[0, 1]`; higher is more related.
	pub weight: f64,
}

impl SimilarityEdge {
	/// Builds an edge with its endpoints ordered so that `source < target`.
	pub fn ordered(a: impl Into<String>, b: impl Into<String>, weight: f64) -> Self {
		let (a, b) = (a.into(), b.into());
		let (source, target) = if a <= b { (a, b) } else { (b, a) };
		Self {
			source,
			target,
			weight,
		}
	}

	/// Whether `id` is one of the endpoints.
	pub fn touches(&self, id: &str) -> bool {
		self.source == id || self.target == id
	}
}

/// One complete node/edge result of a graph query.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
	/// Nodes referenced by `edges` (plus, for primary results, whatever the store returned).
	pub nodes: Vec<ContentNode>,
	/// Relations between `nodes`.
	pub edges: Vec<SimilarityEdge>,
}

impl GraphSnapshot {
	/// Snapshot with no nodes and no edges.
	pub fn empty() -> Self {
		Self::default()
	}

	/// True when there are no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Ids that appear as an endpoint of at least one edge.
	pub fn connected_ids(&self) -> HashSet<&str> {
		self.edges
			.iter()
			.flat_map(|e| [e.source.as_str(), e.target.as_str()])
			.collect()
	}

	/// Drops every node that no edge references, and repeated node ids.
	pub fn retain_connected(mut self) -> Self {
		let connected: HashSet<String> = self
			.connected_ids()
			.into_iter()
			.map(str::to_owned)
			.collect();
		let mut kept = HashSet::new();
		self.nodes
			.retain(|n| connected.contains(&n.id) && kept.insert(n.id.clone()));
		self
	}

	/// Number of distinct communities among the nodes (unlabelled nodes count as community 0).
	pub fn community_count(&self) -> usize {
		self.nodes
			.iter()
			.map(|n| n.community.unwrap_or(0))
			.collect::<HashSet<_>>()
			.len()
	}
}

/// A content row handed over by the content repository: the node plus its embedding.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContentRecord {
	/// Owner of the item.
	pub user_id: String,
	/// Node fields.
	pub node: ContentNode,
	/// Embedding vector, if one has been generated yet.
	pub embedding: Option<Vec<f32>>,
	/// Creation time in milliseconds since the epoch; used for recency ordering.
	pub created_at: i64,
}

/// A tag together with the content it labels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCluster {
	/// Tag name.
	pub tag: String,
	/// Ids of the tagged content.
	pub content_ids: Vec<String>,
	/// `content_ids.len()`.
	pub count: usize,
}

/// Response envelope shared by every graph operation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphResult<T = GraphSnapshot> {
	/// Whether `data` is valid.
	pub success: bool,
	/// Payload on success.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	/// Caller-safe explanation on failure.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

impl<T> GraphResult<T> {
	/// Successful result carrying `data`.
	pub fn ok(data: T) -> Self {
		Self {
			success: true,
			data: Some(data),
			message: None,
		}
	}

	/// Failed result with a message safe to show to the caller.
	pub fn failure(message: impl Into<String>) -> Self {
		Self {
			success: false,
			data: None,
			message: Some(message.into()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node(id: &str) -> ContentNode {
		ContentNode {
			id: id.into(),
			title: id.to_uppercase(),
			..Default::default()
		}
	}

	#[test]
	fn ordered_edge_sorts_endpoints() {
		let e = SimilarityEdge::ordered("b", "a", 0.7);
		assert_eq!((e.source.as_str(), e.target.as_str()), ("a", "b"));
		assert!(e.touches("a") && e.touches("b") && !e.touches("c"));
	}

	#[test]
	fn retain_connected_drops_isolated_nodes() {
		let snapshot = GraphSnapshot {
			nodes: vec![node("c1"), node("c2"), node("c3"), node("c4")],
			edges: vec![
				SimilarityEdge::ordered("c1", "c2", 0.85),
				SimilarityEdge::ordered("c1", "c3", 0.72),
			],
		}
		.retain_connected();

		let ids: Vec<_> = snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, ["c1", "c2", "c3"]);
		assert_eq!(snapshot.edges.len(), 2);
	}

	#[test]
	fn result_serializes_like_the_wire_format() {
		let ok = GraphResult::ok(GraphSnapshot::empty());
		assert_eq!(
			serde_json::to_value(&ok).unwrap(),
			serde_json::json!({ "success": true, "data": { "nodes": [], "edges": [] } })
		);

		let failed: GraphResult = GraphResult::failure("Unauthorized");
		assert_eq!(
			serde_json::to_value(&failed).unwrap(),
			serde_json::json!({ "success": false, "message": "Unauthorized" })
		);
	}

	#[test]
	fn node_uses_camel_case_fields() {
		let n = ContentNode {
			community: Some(3),
			centrality_score: Some(0.25),
			content_type: ContentType::Link,
			..node("x")
		};
		let v = serde_json::to_value(&n).unwrap();
		assert_eq!(v["type"], "link");
		assert_eq!(v["centralityScore"], 0.25);
		assert_eq!(v["community"], 3);
	}

	#[test]
	fn unlabelled_nodes_share_community_zero() {
		let mut a = node("a");
		a.community = Some(0);
		let mut b = node("b");
		b.community = Some(2);
		let snapshot = GraphSnapshot {
			nodes: vec![a, b, node("c")],
			edges: vec![],
		};
		assert_eq!(snapshot.community_count(), 2);
	}
}
