use std::sync::Arc;

use leptos::prelude::*;

use crate::components::knowledge_graph::KnowledgeGraph;
use crate::config::AppConfig;
use crate::graph::{
	ContentNode, ContentRecord, ContentType, GraphService, InMemoryContentRepository,
	InMemoryGraphStore, VectorSimilarityResolver,
};

const DEMO_USER: &str = "demo";
const EMBEDDING_DIM: usize = 2 * TOPICS.len();
/// Similarity the demo graph store materializes edges at.
const STORE_THRESHOLD: f64 = 0.3;

const TOPICS: &[(&str, &[&str])] = &[
	(
		"rust",
		&[
			"Ownership and borrowing",
			"Async runtimes compared",
			"Trait objects vs generics",
			"Writing a Leptos component",
			"Error handling with thiserror",
			"Lifetimes cheat sheet",
		],
	),
	(
		"graphs",
		&[
			"ForceAtlas2 explained",
			"Community detection",
			"PageRank intuition",
			"Cosine similarity refresher",
			"Shortest paths",
		],
	),
	(
		"cooking",
		&[
			"Sourdough starter log",
			"Weeknight ramen",
			"Knife sharpening notes",
			"Fermentation basics",
		],
	),
	(
		"travel",
		&["Lisbon itinerary", "Packing checklist", "Rail passes in Europe"],
	),
];

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// Topic direction plus a little per-item noise.
fn embedding(topic: usize, item: usize) -> Vec<f32> {
	(0..EMBEDDING_DIM)
		.map(|k| {
			let noise = rand_simple(item * EMBEDDING_DIM + k) - 0.5;
			let base = if k == 2 * topic {
				1.0
			} else if k == 2 * topic + 1 {
				0.5
			} else {
				0.0
			};
			(base + 0.3 * noise) as f32
		})
		.collect()
}

/// The demo library: content rows for the fallback path and a graph store
/// materialized from the same rows.
pub struct DemoLibrary {
	pub records: Vec<ContentRecord>,
	pub store: InMemoryGraphStore,
}

pub fn demo_library() -> DemoLibrary {
	let mut records = Vec::new();
	let mut community = Vec::new();
	for (topic, (tag, titles)) in TOPICS.iter().enumerate() {
		for title in titles.iter() {
			let item = records.len();
			records.push(ContentRecord {
				user_id: DEMO_USER.to_owned(),
				node: ContentNode {
					id: format!("c{item:02}"),
					title: (*title).to_owned(),
					content_type: ContentType::ALL[item % ContentType::ALL.len()],
					tags: vec![(*tag).to_owned()],
					..Default::default()
				},
				embedding: Some(embedding(topic, item)),
				created_at: 1_700_000_000_000 + item as i64 * 60_000,
			});
			community.push(topic as u32);
		}
	}

	let edges = VectorSimilarityResolver::new(STORE_THRESHOLD, usize::MAX).resolve(&records);
	let degree = |id: &str| edges.iter().filter(|e| e.touches(id)).count();
	let max_degree = records
		.iter()
		.map(|r| degree(&r.node.id))
		.max()
		.unwrap_or(0)
		.max(1);

	let mut store = InMemoryGraphStore::new();
	for (record, community) in records.iter().zip(community) {
		store.insert_node(
			DEMO_USER,
			ContentNode {
				community: Some(community),
				centrality_score: Some(degree(&record.node.id) as f64 / max_degree as f64),
				..record.node.clone()
			},
		);
	}
	for edge in &edges {
		store.insert_edge(DEMO_USER, &edge.source, &edge.target, edge.weight);
	}

	DemoLibrary { records, store }
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let config = AppConfig::load();
	let DemoLibrary { records, store } = demo_library();
	let embeddings_only = GraphService::new(
		Arc::new(InMemoryContentRepository::new(records)),
		config.query.clone(),
	);
	let with_store = embeddings_only.clone().with_primary(Arc::new(store));

	// Toggling off the graph store shows the embedding fallback.
	let use_store = RwSignal::new(true);
	let service = Signal::derive(move || {
		if use_store.get() {
			with_store.clone()
		} else {
			embeddings_only.clone()
		}
	});

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<KnowledgeGraph service=service user_id=Some(DEMO_USER.to_owned()) config=config />
				<label class="backend-toggle">
					<input
						type="checkbox"
						prop:checked=move || use_store.get()
						on:change=move |ev| use_store.set(event_target_checked(&ev))
					/>
					"Use graph store"
				</label>
			</div>
		</ErrorBoundary>
	}
}
