use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::interaction::{NodeMode, RenderAttributes};
use super::state::ForceGraphState;

const BACKGROUND: &str = "#1a1a2e";
const LABEL_COLOR: &str = "rgba(226, 232, 240, 0.9)";
const DIMMED_LABEL_COLOR: &str = "rgba(226, 232, 240, 0.2)";

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	let attrs = state.view.render_attributes();
	draw_edges(state, &attrs, ctx);
	draw_nodes(state, &attrs, ctx);
	ctx.restore();
}

fn draw_edges(state: &ForceGraphState, attrs: &RenderAttributes<'_>, ctx: &CanvasRenderingContext2d) {
	let graph = state.view.graph();
	let k = state.transform.k;

	for (edge, &hidden) in graph.edges.iter().zip(&attrs.edges_hidden) {
		if hidden {
			continue;
		}
		let (a, b) = (&graph.nodes[edge.source], &graph.nodes[edge.target]);
		// Edges inside the hovered neighborhood are drawn a little heavier.
		let width = if attrs.highlighting {
			edge.size * 1.4
		} else {
			edge.size
		};
		ctx.set_stroke_style_str(&edge.color);
		ctx.set_line_width(width / k.max(0.5));
		ctx.begin_path();
		ctx.move_to(a.x, a.y);
		ctx.line_to(b.x, b.y);
		ctx.stroke();
	}
}

fn draw_nodes(state: &ForceGraphState, attrs: &RenderAttributes<'_>, ctx: &CanvasRenderingContext2d) {
	let graph = state.view.graph();
	let k = state.transform.k;
	let hovered = state.view.hovered();
	let font = format!("{}px sans-serif", 12.0 / k.max(0.5));

	// Dimmed nodes first so the highlighted neighborhood sits on top.
	for pass in [NodeMode::Dimmed, NodeMode::Normal] {
		for (idx, (node, overlay)) in graph.nodes.iter().zip(&attrs.nodes).enumerate() {
			if overlay.hidden || overlay.mode != pass {
				continue;
			}
			let is_hovered = hovered == Some(idx);
			let radius = if is_hovered {
				node.size * 1.25
			} else {
				node.size
			};

			if is_hovered {
				if let Ok(gradient) =
					ctx.create_radial_gradient(node.x, node.y, radius * 0.3, node.x, node.y, radius * 2.2)
				{
					let _ = gradient.add_color_stop(0.0, "rgba(255, 255, 255, 0.35)");
					let _ = gradient.add_color_stop(0.6, "rgba(200, 220, 255, 0.1)");
					let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
					ctx.begin_path();
					let _ = ctx.arc(node.x, node.y, radius * 2.2, 0.0, 2.0 * PI);
					#[allow(deprecated)]
					ctx.set_fill_style(&gradient);
					ctx.fill();
				}
			}

			ctx.begin_path();
			let _ = ctx.arc(node.x, node.y, radius, 0.0, 2.0 * PI);
			ctx.set_fill_style_str(overlay.color);
			ctx.fill();

			if is_hovered {
				ctx.begin_path();
				let _ = ctx.arc(node.x, node.y, radius + 2.0 / k, 0.0, 2.0 * PI);
				ctx.set_stroke_style_str("rgba(255, 255, 255, 0.7)");
				ctx.set_line_width(1.5 / k);
				ctx.stroke();
			}

			let show_label = state.show_labels || (attrs.highlighting && pass == NodeMode::Normal);
			if show_label {
				ctx.set_fill_style_str(if pass == NodeMode::Dimmed {
					DIMMED_LABEL_COLOR
				} else {
					LABEL_COLOR
				});
				ctx.set_font(&font);
				let _ = ctx.fill_text(&node.content.title, node.x + radius + 3.0, node.y + 4.0);
			}
		}
	}
}
