use super::interaction::{InteractionLayer, NodeFilter};
use super::types::LayoutGraph;
use super::visual::ColorMode;

/// Minimum pointer hit radius in screen pixels, so tiny nodes stay hoverable.
pub const MIN_HIT_PX: f64 = 6.0;
/// Screen margin kept around the graph when fitting it to the canvas.
pub const FIT_PADDING: f64 = 40.0;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Everything one canvas needs between frames.
pub struct ForceGraphState {
	pub view: InteractionLayer,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	pub show_labels: bool,
	/// Set whenever the next frame would differ from the last one drawn.
	pub dirty: bool,
}

impl ForceGraphState {
	pub fn new(graph: LayoutGraph, width: f64, height: f64) -> Self {
		let mut state = Self {
			view: InteractionLayer::new(graph),
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			width,
			height,
			show_labels: true,
			dirty: true,
		};
		state.fit_to_view();
		state
	}

	/// Centers the graph and zooms so its bounds fill the canvas.
	pub fn fit_to_view(&mut self) {
		self.transform = ViewTransform {
			x: self.width / 2.0,
			y: self.height / 2.0,
			k: 1.0,
		};
		let Some((min_x, min_y, max_x, max_y)) = self.view.graph().bounds() else {
			return;
		};
		let (gw, gh) = ((max_x - min_x).max(1.0), (max_y - min_y).max(1.0));
		let (aw, ah) = (
			(self.width - 2.0 * FIT_PADDING).max(1.0),
			(self.height - 2.0 * FIT_PADDING).max(1.0),
		);
		let k = (aw / gw).min(ah / gh).clamp(MIN_ZOOM, MAX_ZOOM);
		let (cx, cy) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
		self.transform = ViewTransform {
			x: self.width / 2.0 - cx * k,
			y: self.height / 2.0 - cy * k,
			k,
		};
		self.dirty = true;
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Topmost visible node under the pointer.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let min_radius = MIN_HIT_PX / self.transform.k;
		// Later nodes are drawn on top, so search back to front.
		self.view
			.graph()
			.nodes
			.iter()
			.enumerate()
			.rev()
			.find(|(i, node)| {
				let (dx, dy) = (node.x - gx, node.y - gy);
				!self.view.is_hidden(*i) && (dx * dx + dy * dy).sqrt() < node.size.max(min_radius)
			})
			.map(|(i, _)| i)
	}

	pub fn set_hover(&mut self, node: Option<usize>) {
		let changed = match node {
			Some(idx) => self.view.on_hover_index(idx),
			None => self.view.on_hover_end(),
		};
		self.dirty |= changed;
	}

	pub fn set_filter(&mut self, filter: NodeFilter) {
		if self.view.filter() != &filter {
			self.view.set_filter(filter);
			self.view.on_hover_end();
			self.dirty = true;
		}
	}

	pub fn set_color_mode(&mut self, mode: ColorMode) {
		self.view.graph_mut().recolor(mode);
		self.dirty = true;
	}

	pub fn set_show_labels(&mut self, show: bool) {
		self.dirty |= self.show_labels != show;
		self.show_labels = show;
	}

	pub fn begin_drag(&mut self, sx: f64, sy: f64) {
		if let Some(idx) = self.node_at_position(sx, sy) {
			let node = &self.view.graph().nodes[idx];
			self.drag = DragState {
				active: true,
				node_idx: Some(idx),
				start_x: sx,
				start_y: sy,
				node_start_x: node.x,
				node_start_y: node.y,
			};
		} else {
			self.pan = PanState {
				active: true,
				start_x: sx,
				start_y: sy,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
			};
		}
	}

	pub fn pointer_moved(&mut self, sx: f64, sy: f64) {
		if !self.drag.active {
			let hovered = self.node_at_position(sx, sy);
			self.set_hover(hovered);
		}

		if self.drag.active {
			if let Some(idx) = self.drag.node_idx {
				let (dx, dy) = (
					(sx - self.drag.start_x) / self.transform.k,
					(sy - self.drag.start_y) / self.transform.k,
				);
				if let Some(node) = self.view.graph_mut().nodes.get_mut(idx) {
					node.x = self.drag.node_start_x + dx;
					node.y = self.drag.node_start_y + dy;
					self.dirty = true;
				}
			}
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
			self.dirty = true;
		}
	}

	pub fn end_drag(&mut self) {
		self.drag = DragState::default();
		self.pan.active = false;
	}

	pub fn pointer_left(&mut self) {
		self.end_drag();
		self.set_hover(None);
	}

	/// Zooms by `factor` keeping the graph point under `(sx, sy)` fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
		self.dirty = true;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.dirty = true;
	}
}
