//! Pairwise cosine similarity over content embeddings.
//!
//! Quadratic in the number of records; callers limit the candidate set
//! before resolving.

use std::cmp::Ordering;
use std::collections::HashSet;

use log::debug;

use super::types::{ContentRecord, SimilarityEdge};

/// Default similarity threshold.
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.5;
/// Default edge cap.
pub const DEFAULT_EDGE_CAP: usize = 200;

/// Cosine similarity of two vectors.
///
/// Returns `None` for degenerate comparisons: mismatched or zero length,
/// a zero-magnitude vector, or a non-finite result.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
	if a.is_empty() || a.len() != b.len() {
		return None;
	}
	let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
	for (&x, &y) in a.iter().zip(b) {
		let (x, y) = (x as f64, y as f64);
		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}
	if norm_a == 0.0 || norm_b == 0.0 {
		return None;
	}
	let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
	sim.is_finite().then_some(sim)
}

/// Turns a user's embedded content into thresholded similarity edges.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorSimilarityResolver {
	/// Pairs below this similarity are dropped.
	pub min_similarity: f64,
	/// At most this many edges are returned.
	pub cap: usize,
}

impl Default for VectorSimilarityResolver {
	fn default() -> Self {
		Self {
			min_similarity: DEFAULT_MIN_SIMILARITY,
			cap: DEFAULT_EDGE_CAP,
		}
	}
}

impl VectorSimilarityResolver {
	/// Resolver with the given threshold and cap.
	pub fn new(min_similarity: f64, cap: usize) -> Self {
		Self {
			min_similarity,
			cap,
		}
	}

	/// Edges between every pair of records owned by the same user whose
	/// similarity reaches the threshold, strongest first, truncated to the cap.
	///
	/// Each unordered pair yields at most one edge, with `source < target`.
	pub fn resolve(&self, records: &[ContentRecord]) -> Vec<SimilarityEdge> {
		let embedded: Vec<(&ContentRecord, &[f32])> = records
			.iter()
			.filter_map(|r| r.embedding.as_deref().map(|e| (r, e)))
			.collect();
		if embedded.len() < 2 {
			return Vec::new();
		}

		let mut edges = Vec::new();
		let mut degenerate = 0usize;
		for (i, (a, va)) in embedded.iter().enumerate() {
			for (b, vb) in &embedded[i + 1..] {
				if a.user_id != b.user_id || a.node.id == b.node.id {
					continue;
				}
				let Some(sim) = cosine_similarity(va, vb) else {
					degenerate += 1;
					continue;
				};
				let weight = sim.clamp(0.0, 1.0);
				if weight >= self.min_similarity {
					edges.push(SimilarityEdge::ordered(
						a.node.id.as_str(),
						b.node.id.as_str(),
						weight,
					));
				}
			}
		}
		if degenerate > 0 {
			debug!("skipped {degenerate} degenerate embedding pairs");
		}

		edges.sort_by(|x, y| {
			y.weight
				.partial_cmp(&x.weight)
				.unwrap_or(Ordering::Equal)
				.then_with(|| x.source.cmp(&y.source))
				.then_with(|| x.target.cmp(&y.target))
		});
		// Duplicate ids across records would otherwise emit the same pair twice.
		let mut seen = HashSet::new();
		edges.retain(|e| seen.insert((e.source.clone(), e.target.clone())));
		edges.truncate(self.cap);
		edges
	}
}

#[cfg(test)]
mod tests {
	use approx::assert_relative_eq;
	use proptest::prelude::*;

	use super::*;
	use crate::graph::types::ContentNode;

	fn record(user: &str, id: &str, embedding: Option<Vec<f32>>) -> ContentRecord {
		ContentRecord {
			user_id: user.into(),
			node: ContentNode {
				id: id.into(),
				title: id.into(),
				..Default::default()
			},
			embedding,
			created_at: 0,
		}
	}

	#[test]
	fn cosine_of_known_vectors() {
		assert_relative_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap(), 1.0);
		assert_relative_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 0.0);
		assert_relative_eq!(
			cosine_similarity(&[1.0, 1.0], &[1.0, 0.0]).unwrap(),
			std::f64::consts::FRAC_1_SQRT_2,
			epsilon = 1e-9
		);
	}

	#[test]
	fn degenerate_vectors_have_no_similarity() {
		assert_eq!(cosine_similarity(&[], &[]), None);
		assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), None);
		assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), None);
		assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 2.0]), None);
		assert_eq!(cosine_similarity(&[f32::INFINITY, 1.0], &[1.0, 2.0]), None);
	}

	#[test]
	fn fewer_than_two_embedded_items_yield_nothing() {
		let resolver = VectorSimilarityResolver::default();
		assert!(resolver.resolve(&[]).is_empty());
		assert!(
			resolver
				.resolve(&[
					record("u", "a", Some(vec![1.0, 0.0])),
					record("u", "b", None),
				])
				.is_empty()
		);
	}

	#[test]
	fn degenerate_pair_is_excluded_not_fatal() {
		let edges = VectorSimilarityResolver::default().resolve(&[
			record("u", "a", Some(vec![1.0, 0.0])),
			record("u", "b", Some(vec![0.0, 0.0])),
			record("u", "c", Some(vec![0.9, 0.1])),
		]);
		assert_eq!(edges.len(), 1);
		assert_eq!((edges[0].source.as_str(), edges[0].target.as_str()), ("a", "c"));
	}

	#[test]
	fn other_users_content_is_never_paired() {
		let edges = VectorSimilarityResolver::default().resolve(&[
			record("u1", "a", Some(vec![1.0, 0.0])),
			record("u2", "b", Some(vec![1.0, 0.0])),
		]);
		assert!(edges.is_empty());
	}

	#[test]
	fn threshold_order_and_cap() {
		let records = vec![
			record("u", "d", Some(vec![1.0, 0.0])),
			record("u", "a", Some(vec![0.95, 0.05])),
			record("u", "c", Some(vec![0.6, 0.4])),
			record("u", "b", Some(vec![0.0, 1.0])),
		];
		let all = VectorSimilarityResolver::new(0.5, 200).resolve(&records);
		assert!(all.windows(2).all(|w| w[0].weight >= w[1].weight));
		assert!(all.iter().all(|e| e.weight >= 0.5 && e.source < e.target));
		assert_eq!((all[0].source.as_str(), all[0].target.as_str()), ("a", "d"));

		let capped = VectorSimilarityResolver::new(0.5, 2).resolve(&records);
		assert_eq!(capped, all[..2].to_vec());
	}

	#[test]
	fn negative_similarity_is_clamped_to_zero() {
		let edges = VectorSimilarityResolver::new(0.0, 10).resolve(&[
			record("u", "a", Some(vec![1.0, 0.0])),
			record("u", "b", Some(vec![-1.0, 0.0])),
		]);
		assert_eq!(edges.len(), 1);
		assert_eq!(edges[0].weight, 0.0);
	}

	fn arb_records() -> impl Strategy<Value = Vec<ContentRecord>> {
		prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 4), 0..16).prop_map(|vs| {
			vs.into_iter()
				.enumerate()
				.map(|(i, v)| record("u", &format!("n{i:02}"), Some(v)))
				.collect()
		})
	}

	proptest! {
		#[test]
		fn edges_are_unique_sorted_and_above_threshold(
			records in arb_records(),
			min in 0.0f64..1.0,
			cap in 1usize..64,
		) {
			let edges = VectorSimilarityResolver::new(min, cap).resolve(&records);
			prop_assert!(edges.len() <= cap);

			let mut seen = HashSet::new();
			for e in &edges {
				prop_assert!(e.source < e.target);
				prop_assert!(e.weight >= min && e.weight <= 1.0);
				prop_assert!(seen.insert((e.source.clone(), e.target.clone())));
			}
			prop_assert!(edges.windows(2).all(|w| w[0].weight >= w[1].weight));
		}
	}
}
