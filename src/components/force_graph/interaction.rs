//! Hover highlighting, filtering and tooltips over a [`LayoutGraph`].
//!
//! Visual state is never written onto the graph. Each frame derives a fresh
//! [`RenderAttributes`] from the base graph, the current [`HighlightState`]
//! and the [`NodeFilter`], so ending a hover is a full reset by construction.

use std::collections::HashSet;

use crate::graph::{ContentNode, ContentType};

use super::types::LayoutGraph;
use super::visual::DIMMED_COLOR;

/// Tags shown in a tooltip.
const TOOLTIP_TAGS: usize = 8;

/// The hovered node and everything one edge away from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlightState {
	pub hovered: usize,
	/// Includes `hovered`.
	pub neighborhood: HashSet<usize>,
}

impl HighlightState {
	/// Highlight around `hovered`. Costs O(degree).
	pub fn new(graph: &LayoutGraph, hovered: usize) -> Self {
		let mut neighborhood: HashSet<usize> = graph.neighbors(hovered).iter().copied().collect();
		neighborhood.insert(hovered);
		Self {
			hovered,
			neighborhood,
		}
	}

	pub fn contains(&self, idx: usize) -> bool {
		self.neighborhood.contains(&idx)
	}
}

/// Search and type filter. Hidden nodes take their edges with them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeFilter {
	/// Case-insensitive match against title and tags; empty matches everything.
	pub query: String,
	pub content_type: Option<ContentType>,
}

impl NodeFilter {
	pub fn is_active(&self) -> bool {
		!self.query.trim().is_empty() || self.content_type.is_some()
	}

	pub fn matches(&self, node: &ContentNode) -> bool {
		if self.content_type.is_some_and(|t| t != node.content_type) {
			return false;
		}
		let query = self.query.trim().to_lowercase();
		query.is_empty()
			|| node.title.to_lowercase().contains(&query)
			|| node.tags.iter().any(|t| t.to_lowercase().contains(&query))
	}
}

/// Two-state node appearance while a hover is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeMode {
	Normal,
	Dimmed,
}

/// How one node is drawn this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeOverlay<'a> {
	pub color: &'a str,
	pub mode: NodeMode,
	pub hidden: bool,
}

/// Per-frame appearance of every node and edge, in graph order.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderAttributes<'a> {
	pub nodes: Vec<NodeOverlay<'a>>,
	pub edges_hidden: Vec<bool>,
	/// Whether a hover is shaping this frame.
	pub highlighting: bool,
}

/// Derives the frame's appearance. Pure: same inputs, same output.
pub fn render_attributes<'a>(
	graph: &'a LayoutGraph,
	highlight: Option<&HighlightState>,
	filter: &NodeFilter,
) -> RenderAttributes<'a> {
	let filtering = filter.is_active();
	let nodes: Vec<NodeOverlay<'a>> = graph
		.nodes
		.iter()
		.enumerate()
		.map(|(i, node)| {
			let dimmed = highlight.is_some_and(|h| !h.contains(i));
			NodeOverlay {
				color: if dimmed { DIMMED_COLOR } else { node.color.as_str() },
				mode: if dimmed { NodeMode::Dimmed } else { NodeMode::Normal },
				hidden: filtering && !filter.matches(&node.content),
			}
		})
		.collect();
	let edges_hidden = graph
		.edges
		.iter()
		.map(|e| {
			nodes[e.source].hidden
				|| nodes[e.target].hidden
				|| highlight.is_some_and(|h| !h.contains(e.source) || !h.contains(e.target))
		})
		.collect();
	RenderAttributes {
		nodes,
		edges_hidden,
		highlighting: highlight.is_some(),
	}
}

/// What the hover card shows for a node.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
	pub id: String,
	pub title: String,
	pub content_type: ContentType,
	pub community: u32,
	/// Centrality as a percentage with one decimal; absent without a score.
	pub importance: Option<String>,
	pub connections: usize,
	pub tags: Vec<String>,
	pub color: String,
}

/// Tooltip for node `idx`.
pub fn tooltip(graph: &LayoutGraph, idx: usize) -> Option<Tooltip> {
	let node = graph.nodes.get(idx)?;
	let content = &node.content;
	Some(Tooltip {
		id: content.id.clone(),
		title: content.title.clone(),
		content_type: content.content_type,
		community: content.community.unwrap_or(0),
		importance: content
			.centrality_score
			.filter(|s| s.is_finite())
			.map(|s| format!("{:.1}%", s * 100.0)),
		connections: graph.incident_edges(idx).len(),
		tags: content.tags.iter().take(TOOLTIP_TAGS).cloned().collect(),
		color: node.color.clone(),
	})
}

/// One graph view's interaction state: the base graph, the hover and the filter.
#[derive(Clone, Debug, Default)]
pub struct InteractionLayer {
	graph: LayoutGraph,
	highlight: Option<HighlightState>,
	filter: NodeFilter,
}

impl InteractionLayer {
	pub fn new(graph: LayoutGraph) -> Self {
		Self {
			graph,
			highlight: None,
			filter: NodeFilter::default(),
		}
	}

	pub fn graph(&self) -> &LayoutGraph {
		&self.graph
	}

	/// Mutable graph, for moving dragged nodes.
	pub fn graph_mut(&mut self) -> &mut LayoutGraph {
		&mut self.graph
	}

	pub fn highlight(&self) -> Option<&HighlightState> {
		self.highlight.as_ref()
	}

	/// Highlights `id` and its neighbors. Unknown ids end the hover.
	pub fn on_hover(&mut self, id: &str) -> bool {
		match self.graph.index_of(id) {
			Some(idx) => self.on_hover_index(idx),
			None => self.on_hover_end(),
		}
	}

	/// [`Self::on_hover`] by node index. Returns whether anything changed;
	/// hovering the already hovered node is a no-op.
	pub fn on_hover_index(&mut self, idx: usize) -> bool {
		if idx >= self.graph.nodes.len() {
			return self.on_hover_end();
		}
		if self.highlight.as_ref().is_some_and(|h| h.hovered == idx) {
			return false;
		}
		self.highlight = Some(HighlightState::new(&self.graph, idx));
		true
	}

	/// Drops the hover entirely.
	pub fn on_hover_end(&mut self) -> bool {
		self.highlight.take().is_some()
	}

	pub fn hovered(&self) -> Option<usize> {
		self.highlight.as_ref().map(|h| h.hovered)
	}

	pub fn filter(&self) -> &NodeFilter {
		&self.filter
	}

	pub fn set_filter(&mut self, filter: NodeFilter) {
		self.filter = filter;
	}

	pub fn is_hidden(&self, idx: usize) -> bool {
		self.filter.is_active()
			&& self
				.graph
				.nodes
				.get(idx)
				.is_some_and(|n| !self.filter.matches(&n.content))
	}

	pub fn render_attributes(&self) -> RenderAttributes<'_> {
		render_attributes(&self.graph, self.highlight.as_ref(), &self.filter)
	}

	/// Tooltip for the hovered node.
	pub fn tooltip(&self) -> Option<Tooltip> {
		self.hovered().and_then(|idx| tooltip(&self.graph, idx))
	}
}
