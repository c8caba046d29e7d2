use std::collections::HashMap;

use crate::graph::{ContentNode, GraphSnapshot};

use super::layout::{LayoutSettings, force_atlas2};
use super::visual::{ColorMode, compute_visual_attributes, edge_color, edge_size};

/// A content node placed on the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutNode {
	/// The node as returned by the engine.
	pub content: ContentNode,
	pub x: f64,
	pub y: f64,
	/// Radius in graph units.
	pub size: f64,
	/// Base fill, before any highlight.
	pub color: String,
}

/// An edge between two [`LayoutNode`]s, by index.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutEdge {
	pub source: usize,
	pub target: usize,
	pub weight: f64,
	/// Stroke width.
	pub size: f64,
	/// Stroke color.
	pub color: String,
}

/// A positioned graph plus the adjacency the view needs for hover.
///
/// Built once per snapshot and never changed by highlighting; only dragging
/// moves node positions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutGraph {
	pub nodes: Vec<LayoutNode>,
	pub edges: Vec<LayoutEdge>,
	index: HashMap<String, usize>,
	neighbors: Vec<Vec<usize>>,
	incident: Vec<Vec<usize>>,
}

impl LayoutGraph {
	/// Lays out `snapshot` and derives node sizes and colors.
	pub fn build(snapshot: &GraphSnapshot, settings: &LayoutSettings, mode: ColorMode) -> Self {
		let positions = force_atlas2(snapshot, settings);
		Self::from_positions(snapshot, &positions, mode)
	}

	/// Combines `snapshot` with precomputed `positions` (in node order).
	/// Missing positions default to the origin.
	pub fn from_positions(snapshot: &GraphSnapshot, positions: &[(f64, f64)], mode: ColorMode) -> Self {
		let attrs = compute_visual_attributes(snapshot, mode);
		let mut graph = LayoutGraph::default();

		for (i, (node, attr)) in snapshot.nodes.iter().zip(attrs).enumerate() {
			if graph.index.contains_key(&node.id) {
				continue;
			}
			let (x, y) = positions.get(i).copied().unwrap_or((0.0, 0.0));
			graph.index.insert(node.id.clone(), graph.nodes.len());
			graph.nodes.push(LayoutNode {
				content: node.clone(),
				x,
				y,
				size: attr.size,
				color: attr.color,
			});
		}
		graph.neighbors = vec![Vec::new(); graph.nodes.len()];
		graph.incident = vec![Vec::new(); graph.nodes.len()];

		for edge in &snapshot.edges {
			let (Some(&source), Some(&target)) =
				(graph.index.get(&edge.source), graph.index.get(&edge.target))
			else {
				continue;
			};
			if source == target || graph.neighbors[source].contains(&target) {
				continue;
			}
			let e = graph.edges.len();
			graph.edges.push(LayoutEdge {
				source,
				target,
				weight: edge.weight,
				size: edge_size(edge.weight),
				color: edge_color(edge.weight),
			});
			graph.neighbors[source].push(target);
			graph.neighbors[target].push(source);
			graph.incident[source].push(e);
			graph.incident[target].push(e);
		}
		graph
	}

	/// Recolors every node for `mode`, keeping positions.
	pub fn recolor(&mut self, mode: ColorMode) {
		for node in &mut self.nodes {
			node.color = super::visual::node_color(&node.content, mode).to_owned();
		}
	}

	/// Index of the node with `id`.
	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	/// Nodes directly connected to `idx`.
	pub fn neighbors(&self, idx: usize) -> &[usize] {
		self.neighbors.get(idx).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Edges touching `idx`.
	pub fn incident_edges(&self, idx: usize) -> &[usize] {
		self.incident.get(idx).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Bounding box `(min_x, min_y, max_x, max_y)` including node radii.
	pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
		self.nodes.iter().fold(None, |acc, n| {
			let (lo_x, lo_y, hi_x, hi_y) = (n.x - n.size, n.y - n.size, n.x + n.size, n.y + n.size);
			Some(match acc {
				None => (lo_x, lo_y, hi_x, hi_y),
				Some((a, b, c, d)) => (a.min(lo_x), b.min(lo_y), c.max(hi_x), d.max(hi_y)),
			})
		})
	}

	/// Number of distinct communities on the canvas.
	pub fn community_count(&self) -> usize {
		let mut seen: Vec<u32> = self
			.nodes
			.iter()
			.map(|n| n.content.community.unwrap_or(0))
			.collect();
		seen.sort_unstable();
		seen.dedup();
		seen.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::SimilarityEdge;

	fn snapshot() -> GraphSnapshot {
		GraphSnapshot {
			nodes: ["a", "b", "c", "a"]
				.iter()
				.map(|id| ContentNode {
					id: id.to_string(),
					title: id.to_string(),
					..Default::default()
				})
				.collect(),
			edges: vec![
				SimilarityEdge::ordered("a", "b", 0.9),
				SimilarityEdge::ordered("b", "a", 0.9),
				SimilarityEdge::ordered("b", "c", 0.6),
				SimilarityEdge::ordered("c", "ghost", 0.6),
			],
		}
	}

	#[test]
	fn from_positions_dedups_and_indexes() {
		let g = LayoutGraph::from_positions(
			&snapshot(),
			&[(1.0, 2.0), (3.0, 4.0), (5.0, 6.0)],
			ColorMode::Community,
		);
		assert_eq!(g.nodes.len(), 3);
		assert_eq!(g.edges.len(), 2);
		let b = g.index_of("b").unwrap();
		assert_eq!(g.neighbors(b).len(), 2);
		assert_eq!(g.incident_edges(b).len(), 2);
		assert_eq!((g.nodes[b].x, g.nodes[b].y), (3.0, 4.0));
		assert!(g.index_of("ghost").is_none());
	}

	#[test]
	fn bounds_include_node_radius() {
		let g = LayoutGraph::from_positions(&snapshot(), &[(0.0, 0.0), (10.0, -10.0)], ColorMode::Type);
		let (min_x, min_y, max_x, max_y) = g.bounds().unwrap();
		assert_eq!((min_x, max_y), (-15.0, 15.0));
		assert_eq!((max_x, min_y), (25.0, -25.0));
		assert!(LayoutGraph::default().bounds().is_none());
	}

	#[test]
	fn build_places_every_node() {
		let settings = LayoutSettings {
			iterations: 10,
			seed: Some(1),
			..Default::default()
		};
		let g = LayoutGraph::build(&snapshot(), &settings, ColorMode::Community);
		assert!(g.nodes.iter().all(|n| n.x.is_finite() && n.y.is_finite()));
	}
}
