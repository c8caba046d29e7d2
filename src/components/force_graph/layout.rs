//! ForceAtlas2 layout: edge attraction, all-pairs repulsion, weak gravity
//! toward the origin.
//!
//! Runs synchronously to completion. With hundreds of nodes the O(n²)
//! repulsion dominates, so callers inside a UI should not run it on the
//! input-handling path. Unseeded runs are not reproducible: re-laying out an
//! unchanged snapshot gives a different, equally valid arrangement.

use std::collections::HashMap;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::graph::GraphSnapshot;

/// Tunables for [`force_atlas2`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
	/// Simulation steps.
	pub iterations: usize,
	/// Pull toward the origin.
	pub gravity: f64,
	/// Repulsion strength.
	pub scaling_ratio: f64,
	/// Logarithmic attraction, which keeps clusters from collapsing.
	pub lin_log_mode: bool,
	/// Exponent applied to edge weights before attraction.
	pub edge_weight_influence: f64,
	/// Divides every displacement.
	pub slow_down: f64,
	/// Side of the square the initial positions are drawn from.
	pub seed_extent: f64,
	/// Fixed random seed; `None` draws from entropy.
	pub seed: Option<u64>,
}

impl Default for LayoutSettings {
	fn default() -> Self {
		Self {
			iterations: 300,
			gravity: 0.02,
			scaling_ratio: 20.0,
			lin_log_mode: true,
			edge_weight_influence: 1.0,
			slow_down: 1.0,
			seed_extent: 200.0,
			seed: None,
		}
	}
}

/// Positions for every node of `snapshot`, in node order.
pub fn force_atlas2(snapshot: &GraphSnapshot, settings: &LayoutSettings) -> Vec<(f64, f64)> {
	match settings.seed {
		Some(seed) => force_atlas2_with_rng(snapshot, settings, &mut StdRng::seed_from_u64(seed)),
		None => force_atlas2_with_rng(snapshot, settings, &mut StdRng::from_entropy()),
	}
}

/// [`force_atlas2`] drawing its initial placement from `rng`.
pub fn force_atlas2_with_rng<R: Rng>(
	snapshot: &GraphSnapshot,
	settings: &LayoutSettings,
	rng: &mut R,
) -> Vec<(f64, f64)> {
	let n = snapshot.nodes.len();
	match n {
		0 => return Vec::new(),
		1 => return vec![(0.0, 0.0)],
		_ => {}
	}

	let index: HashMap<&str, usize> = snapshot
		.nodes
		.iter()
		.enumerate()
		.map(|(i, node)| (node.id.as_str(), i))
		.collect();
	let edges: Vec<(usize, usize, f64)> = snapshot
		.edges
		.iter()
		.filter_map(|e| {
			let (&a, &b) = (index.get(e.source.as_str())?, index.get(e.target.as_str())?);
			let w = edge_weight(e.weight, settings.edge_weight_influence);
			(a != b && w > 0.0).then_some((a, b, w))
		})
		.collect();

	let mut mass = vec![1.0f64; n];
	for &(a, b, _) in &edges {
		mass[a] += 1.0;
		mass[b] += 1.0;
	}

	let extent = if settings.seed_extent.is_finite() && settings.seed_extent > 0.0 {
		settings.seed_extent
	} else {
		LayoutSettings::default().seed_extent
	};
	let mut pos: Vec<[f64; 2]> = (0..n)
		.map(|_| {
			[
				rng.r#gen::<f64>() * extent - extent / 2.0,
				rng.r#gen::<f64>() * extent - extent / 2.0,
			]
		})
		.collect();

	let slow_down = if settings.slow_down > 0.0 { settings.slow_down } else { 1.0 };
	let mut force = vec![[0.0f64; 2]; n];
	let mut old_force = vec![[0.0f64; 2]; n];

	for _ in 0..settings.iterations {
		std::mem::swap(&mut force, &mut old_force);
		force.iter_mut().for_each(|f| *f = [0.0, 0.0]);

		for i in 0..n {
			for j in i + 1..n {
				let (dx, dy) = (pos[i][0] - pos[j][0], pos[i][1] - pos[j][1]);
				let d2 = dx * dx + dy * dy;
				if d2 > 0.0 {
					let factor = settings.scaling_ratio * mass[i] * mass[j] / d2;
					force[i][0] += dx * factor;
					force[i][1] += dy * factor;
					force[j][0] -= dx * factor;
					force[j][1] -= dy * factor;
				}
			}
		}

		for i in 0..n {
			let d = (pos[i][0] * pos[i][0] + pos[i][1] * pos[i][1]).sqrt();
			if d > 0.0 {
				let factor = mass[i] * settings.gravity / d;
				force[i][0] -= pos[i][0] * factor;
				force[i][1] -= pos[i][1] * factor;
			}
		}

		for &(a, b, w) in &edges {
			let (dx, dy) = (pos[a][0] - pos[b][0], pos[a][1] - pos[b][1]);
			let factor = if settings.lin_log_mode {
				let d = (dx * dx + dy * dy).sqrt();
				if d == 0.0 {
					continue;
				}
				-w * (1.0 + d).ln() / d
			} else {
				-w
			};
			force[a][0] += dx * factor;
			force[a][1] += dy * factor;
			force[b][0] -= dx * factor;
			force[b][1] -= dy * factor;
		}

		for i in 0..n {
			let (fx, fy) = (force[i][0], force[i][1]);
			let swinging = mass[i]
				* ((old_force[i][0] - fx).powi(2) + (old_force[i][1] - fy).powi(2)).sqrt();
			let factor = 1.0 / (1.0 + swinging.sqrt()) / slow_down;
			let (x, y) = (pos[i][0] + fx * factor, pos[i][1] + fy * factor);
			if x.is_finite() && y.is_finite() {
				pos[i] = [x, y];
			}
		}
	}

	debug!(
		"force layout: {n} nodes, {} edges, {} iterations",
		edges.len(),
		settings.iterations
	);
	pos.into_iter().map(|[x, y]| (x, y)).collect()
}

fn edge_weight(weight: f64, influence: f64) -> f64 {
	if !weight.is_finite() {
		return 0.0;
	}
	if influence == 0.0 {
		1.0
	} else if influence == 1.0 {
		weight
	} else {
		weight.max(0.0).powf(influence)
	}
}
