//! The knowledge graph explorer: fetches a snapshot, lays it out, and puts the
//! canvas behind a small control panel.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, info};

use super::force_graph::visual::{community_color, type_color};
use super::force_graph::{ColorMode, ForceGraphCanvas, LayoutGraph, NodeFilter, Tooltip};
use crate::config::AppConfig;
use crate::graph::orchestrator::MSG_GRAPH_FAILED;
use crate::graph::{ContentType, GraphResult, GraphService};

/// Tags each fetch so only the latest one may touch the view.
///
/// Clones share one counter. [`Generation::invalidate`] retires every token
/// handed out so far.
#[derive(Clone, Debug, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
	/// Token for a new fetch; older tokens stop being current.
	pub fn begin(&self) -> u64 {
		self.0.fetch_add(1, Ordering::SeqCst) + 1
	}

	pub fn is_current(&self, token: u64) -> bool {
		self.0.load(Ordering::SeqCst) == token
	}

	pub fn invalidate(&self) {
		self.0.fetch_add(1, Ordering::SeqCst);
	}
}

#[derive(Clone, Debug, PartialEq)]
enum LoadState {
	Loading,
	Ready,
	Failed(String),
}

/// One row of the color legend.
#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
	pub label: String,
	pub color: &'static str,
	pub count: usize,
}

/// Legend rows for the colors currently on screen.
pub fn legend_entries(graph: &LayoutGraph, mode: ColorMode) -> Vec<LegendEntry> {
	match mode {
		ColorMode::Community => {
			let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
			for node in &graph.nodes {
				*counts.entry(node.content.community.unwrap_or(0)).or_default() += 1;
			}
			counts
				.into_iter()
				.map(|(community, count)| LegendEntry {
					label: format!("Community {community}"),
					color: community_color(community),
					count,
				})
				.collect()
		}
		ColorMode::Type => ContentType::ALL
			.iter()
			.filter_map(|&ty| {
				let count = graph
					.nodes
					.iter()
					.filter(|n| n.content.content_type == ty)
					.count();
				(count > 0).then(|| LegendEntry {
					label: ty.as_str().to_owned(),
					color: type_color(ty),
					count,
				})
			})
			.collect(),
	}
}

fn parse_content_type(value: &str) -> Option<ContentType> {
	ContentType::ALL.into_iter().find(|ty| ty.as_str() == value)
}

/// Graph explorer for one user.
///
/// Re-fetches whenever the service, the similarity threshold or the focused
/// node changes. Double-clicking a node focuses its neighborhood.
#[component]
pub fn KnowledgeGraph(
	#[prop(into)] service: Signal<GraphService>,
	user_id: Option<String>,
	#[prop(optional)] config: AppConfig,
) -> impl IntoView {
	let min_similarity = RwSignal::new(config.query.min_similarity);
	let color_mode = RwSignal::new(config.color_mode);
	let show_labels = RwSignal::new(true);
	let query = RwSignal::new(String::new());
	let type_filter = RwSignal::new(None::<ContentType>);
	let (focus, set_focus) = signal(None::<String>);
	let (tooltip, set_tooltip) = signal(None::<Tooltip>);
	let graph = RwSignal::new(LayoutGraph::default());
	let load = RwSignal::new(LoadState::Loading);

	let filter = Signal::derive(move || NodeFilter {
		query: query.get(),
		content_type: type_filter.get(),
	});

	let generation = Generation::default();
	{
		let generation = generation.clone();
		on_cleanup(move || generation.invalidate());
	}

	let layout_settings = config.layout.clone();
	Effect::new(move |_| {
		let service = service.get();
		let threshold = min_similarity.get();
		let focus_id = focus.get();
		let mode = color_mode.get_untracked();
		let token = generation.begin();
		let (generation, user_id, layout_settings) =
			(generation.clone(), user_id.clone(), layout_settings.clone());
		load.set(LoadState::Loading);

		spawn_local(async move {
			let result = match &focus_id {
				Some(id) => {
					let hops = service.settings().default_hops;
					service
						.get_node_neighborhood(user_id.as_deref(), id, hops)
						.await
				}
				None => {
					let limit = service.settings().limit;
					service
						.get_full_graph(user_id.as_deref(), threshold, limit)
						.await
				}
			};
			if !generation.is_current(token) {
				debug!("discarding stale graph response {token}");
				return;
			}
			match result {
				GraphResult {
					success: true,
					data: Some(snapshot),
					..
				} => {
					let layout = LayoutGraph::build(&snapshot, &layout_settings, mode);
					info!(
						"showing {} nodes, {} edges",
						layout.nodes.len(),
						layout.edges.len()
					);
					graph.set(layout);
					load.set(LoadState::Ready);
				}
				failed => {
					let message = failed.message.unwrap_or_else(|| MSG_GRAPH_FAILED.to_owned());
					graph.set(LayoutGraph::default());
					load.set(LoadState::Failed(message));
				}
			}
		});
	});

	let status = move || match load.get() {
		LoadState::Loading => view! { <p class="graph-status">"Loading graph..."</p> }.into_any(),
		LoadState::Failed(message) => view! {
			<p class="graph-status graph-error">{message}</p>
		}
		.into_any(),
		LoadState::Ready if graph.with(|g| g.nodes.is_empty()) => view! {
			<p class="graph-status">
				"No connections yet. Add more content with embeddings to see relationships."
			</p>
		}
		.into_any(),
		LoadState::Ready => ().into_any(),
	};

	let counts = move || {
		graph.with(|g| {
			format!(
				"{} nodes · {} edges · {} communities",
				g.nodes.len(),
				g.edges.len(),
				g.community_count()
			)
		})
	};

	let legend = move || {
		graph.with(|g| legend_entries(g, color_mode.get()))
			.into_iter()
			.map(|entry| {
				view! {
					<li class="legend-entry">
						<span class="legend-swatch" style:background-color=entry.color></span>
						{entry.label}
						" ("
						{entry.count}
						")"
					</li>
				}
			})
			.collect_view()
	};

	let focus_bar = move || {
		focus.get().map(|id| {
			view! {
				<div class="focus-bar">
					<span>"Neighborhood of " {id}</span>
					<button on:click=move |_| set_focus.set(None)>"Show full graph"</button>
				</div>
			}
		})
	};

	let tooltip_card = move || {
		tooltip.get().map(|tip| {
			let tags = tip
				.tags
				.iter()
				.map(|t| view! { <span class="tag">{t.clone()}</span> })
				.collect_view();
			view! {
				<div class="graph-tooltip">
					<h3 style:color=tip.color.clone()>{tip.title.clone()}</h3>
					<p>{tip.content_type.as_str()} " · community " {tip.community}</p>
					{tip.importance.clone().map(|i| view! { <p>"Importance: " {i}</p> })}
					<p>{tip.connections} " connections"</p>
					<div class="tags">{tags}</div>
				</div>
			}
		})
	};

	view! {
		<div class="knowledge-graph">
			<ForceGraphCanvas
				graph=graph
				filter=filter
				color_mode=color_mode
				show_labels=show_labels
				on_tooltip=set_tooltip
				on_activate=set_focus
				fullscreen=true
			/>
			<div class="graph-overlay">
				<h1>"Knowledge Graph"</h1>
				<p class="subtitle">{counts}</p>
				{focus_bar}
				<label>
					"Min similarity "
					{move || format!("{:.2}", min_similarity.get())}
					<input
						type="range"
						min="0.3"
						max="0.95"
						step="0.05"
						prop:value=move || min_similarity.get().to_string()
						on:change=move |ev| {
							if let Ok(v) = event_target_value(&ev).parse::<f64>() {
								min_similarity.set(v);
							}
						}
					/>
				</label>
				<input
					type="search"
					placeholder="Search titles and tags"
					prop:value=move || query.get()
					on:input=move |ev| query.set(event_target_value(&ev))
				/>
				<select on:change=move |ev| type_filter.set(parse_content_type(&event_target_value(&ev)))>
					<option value="all">"All types"</option>
					{ContentType::ALL
						.into_iter()
						.map(|ty| view! { <option value=ty.as_str()>{ty.as_str()}</option> })
						.collect_view()}
				</select>
				<div class="toggles">
					<button on:click=move |_| {
						color_mode
							.update(|m| {
								*m = match m {
									ColorMode::Community => ColorMode::Type,
									ColorMode::Type => ColorMode::Community,
								};
							})
					}>
						{move || match color_mode.get() {
							ColorMode::Community => "Color by type",
							ColorMode::Type => "Color by community",
						}}
					</button>
					<button on:click=move |_| show_labels.update(|s| *s = !*s)>
						{move || if show_labels.get() { "Hide labels" } else { "Show labels" }}
					</button>
				</div>
				<ul class="legend">{legend}</ul>
				{status}
			</div>
			{tooltip_card}
		</div>
	}
}
