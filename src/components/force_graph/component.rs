use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use log::debug;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::interaction::{NodeFilter, Tooltip};
use super::render;
use super::state::ForceGraphState;
use super::types::LayoutGraph;
use super::visual::ColorMode;

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn pointer_position(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// Canvas view of a laid-out graph with hover highlighting, drag, pan and zoom.
///
/// Layout is never re-run here: hover and filter changes only redraw.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] graph: Signal<LayoutGraph>,
	#[prop(into, default = Signal::stored(NodeFilter::default()))] filter: Signal<NodeFilter>,
	#[prop(into, default = Signal::stored(ColorMode::Community))] color_mode: Signal<ColorMode>,
	#[prop(into, default = Signal::stored(true))] show_labels: Signal<bool>,
	/// Receives the hovered node's tooltip, or `None` when nothing is hovered.
	#[prop(optional)]
	on_tooltip: Option<WriteSignal<Option<Tooltip>>>,
	/// Receives the id of a double-clicked node.
	#[prop(optional)]
	on_activate: Option<WriteSignal<Option<String>>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<ForceGraphState>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let alive = Arc::new(AtomicBool::new(true));
	let (state_init, animate_init, resize_cb_init, alive_init) =
		(state.clone(), animate.clone(), resize_cb.clone(), alive.clone());

	on_cleanup(move || alive.store(false, Ordering::Relaxed));

	Effect::new(move |_| {
		let layout = graph.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		debug!(
			"canvas: {} nodes, {} edges at {w}x{h}",
			layout.nodes.len(),
			layout.edges.len()
		);
		let mut fresh = ForceGraphState::new(layout, w, h);
		fresh.set_filter(filter.get_untracked());
		fresh.set_color_mode(color_mode.get_untracked());
		fresh.set_show_labels(show_labels.get_untracked());
		*state_init.borrow_mut() = Some(fresh);
		if let Some(tooltip) = on_tooltip {
			tooltip.set(None);
		}

		// The frame loop and resize listener outlive individual graphs.
		if animate_init.borrow().is_some() {
			return;
		}

		let Ok(Some(ctx)) = canvas.get_context("2d") else {
			return;
		};
		let Ok(ctx) = ctx.dyn_into::<CanvasRenderingContext2d>() else {
			return;
		};

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner, alive_anim) =
			(state_init.clone(), animate_init.clone(), alive_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !alive_anim.load(Ordering::Relaxed) {
				return;
			}
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				if s.dirty {
					render::render(s, &ctx);
					s.dirty = false;
				}
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_filter = state.clone();
	Effect::new(move |_| {
		let filter = filter.get();
		if let Some(ref mut s) = *state_filter.borrow_mut() {
			s.set_filter(filter);
		}
		if let Some(tooltip) = on_tooltip {
			tooltip.set(None);
		}
	});

	let state_style = state.clone();
	Effect::new(move |_| {
		let (mode, labels) = (color_mode.get(), show_labels.get());
		if let Some(ref mut s) = *state_style.borrow_mut() {
			s.set_color_mode(mode);
			s.set_show_labels(labels);
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = pointer_position(&canvas.into(), &ev);
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.begin_drag(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = pointer_position(&canvas.into(), &ev);
		let tip = {
			let mut guard = state_mm.borrow_mut();
			let Some(s) = guard.as_mut() else {
				return;
			};
			let before = s.view.hovered();
			s.pointer_moved(x, y);
			(s.view.hovered() != before).then(|| s.view.tooltip())
		};
		if let (Some(tip), Some(tooltip)) = (tip, on_tooltip) {
			tooltip.set(tip);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.end_drag();
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_left();
		}
		if let Some(tooltip) = on_tooltip {
			tooltip.set(None);
		}
	};

	let state_dbl = state.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = pointer_position(&canvas.into(), &ev);
		let id = state_dbl.borrow().as_ref().and_then(|s| {
			s.node_at_position(x, y)
				.map(|idx| s.view.graph().nodes[idx].content.id.clone())
		});
		if let (Some(id), Some(activate)) = (id, on_activate) {
			activate.set(Some(id));
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = pointer_position(&canvas.into(), &ev);
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.zoom_at(x, y, factor);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:dblclick=on_dblclick
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
