use serde::{Deserialize, Serialize};

use crate::graph::{ContentNode, ContentType, GraphSnapshot};

/// One hue per community, cycled.
pub const COMMUNITY_COLORS: &[&str] = &[
	"#6366f1", "#ec4899", "#14b8a6", "#f97316", "#8b5cf6", "#22c55e", "#ef4444", "#06b6d4",
	"#eab308", "#64748b",
];

/// Replaces the color of nodes outside the hovered neighborhood.
pub const DIMMED_COLOR: &str = "rgba(100, 100, 120, 0.15)";

/// Smallest node size.
pub const MIN_NODE_SIZE: f64 = 6.0;
/// Size added for the most central node.
pub const NODE_SIZE_RANGE: f64 = 18.0;

/// Normalized centrality used when a node has no score.
const DEFAULT_RANK: f64 = 0.5;

/// How node colors are chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
	/// By community label.
	#[default]
	Community,
	/// By content type.
	Type,
}

/// Fill for a content type.
pub fn type_color(content_type: ContentType) -> &'static str {
	match content_type {
		ContentType::Note => "#3b82f6",
		ContentType::Link => "#22c55e",
		ContentType::File => "#f97316",
	}
}

/// Fill for a community label.
pub fn community_color(community: u32) -> &'static str {
	COMMUNITY_COLORS[community as usize % COMMUNITY_COLORS.len()]
}

/// Fill for a node under `mode`. Unlabelled nodes fall in community 0.
pub fn node_color(node: &ContentNode, mode: ColorMode) -> &'static str {
	match mode {
		ColorMode::Community => community_color(node.community.unwrap_or(0)),
		ColorMode::Type => type_color(node.content_type),
	}
}

/// Size and fill of one node.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualAttributes {
	/// Radius in graph units, within `[6, 24]`.
	pub size: f64,
	/// CSS color.
	pub color: String,
}

fn usable(score: Option<f64>) -> Option<f64> {
	score.filter(|s| s.is_finite())
}

/// Size from min-max normalized centrality and color from `mode`, in node order.
///
/// Nodes without a score sit at the midpoint of the size range. When every
/// scored node has the same score, they all get the minimum size.
pub fn compute_visual_attributes(snapshot: &GraphSnapshot, mode: ColorMode) -> Vec<VisualAttributes> {
	let (min, max) = snapshot
		.nodes
		.iter()
		.filter_map(|n| usable(n.centrality_score))
		.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
			(lo.min(s), hi.max(s))
		});
	let range = if max > min { max - min } else { 1.0 };

	snapshot
		.nodes
		.iter()
		.map(|node| {
			let rank = usable(node.centrality_score)
				.map(|s| (s - min) / range)
				.unwrap_or(DEFAULT_RANK);
			VisualAttributes {
				size: MIN_NODE_SIZE + rank * NODE_SIZE_RANGE,
				color: node_color(node, mode).to_owned(),
			}
		})
		.collect()
}

/// Stroke width of an edge.
pub fn edge_size(weight: f64) -> f64 {
	0.5 + weight * 2.5
}

/// Stroke color of an edge; stronger edges are more opaque.
pub fn edge_color(weight: f64) -> String {
	format!("rgba(100, 100, 130, {:.3})", 0.2 + weight * 0.5)
}
