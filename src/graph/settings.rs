use serde::{Deserialize, Serialize};

/// Limits and defaults for graph queries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
	/// Similarity threshold used when the caller does not pass one.
	pub min_similarity: f64,
	/// Node budget used when the caller does not pass one.
	pub limit: usize,
	/// Lower clamp on content rows read by the embedding fallback.
	pub min_fallback_rows: usize,
	/// Upper clamp on content rows read by the embedding fallback.
	pub max_fallback_rows: usize,
	/// Maximum number of edges the embedding fallback emits.
	pub fallback_edge_cap: usize,
	/// The primary store is asked for `limit * primary_candidate_factor` edges.
	pub primary_candidate_factor: usize,
	/// Neighborhood depth used when the caller does not pass one.
	pub default_hops: u32,
	/// Neighborhood depth ceiling.
	pub max_hops: u32,
	/// Minimum members for a tag cluster.
	pub min_cluster_size: usize,
}

impl Default for QuerySettings {
	fn default() -> Self {
		Self {
			min_similarity: 0.5,
			limit: 50,
			min_fallback_rows: 5,
			max_fallback_rows: 100,
			fallback_edge_cap: 200,
			primary_candidate_factor: 4,
			default_hops: 2,
			max_hops: 5,
			min_cluster_size: 2,
		}
	}
}

impl QuerySettings {
	/// Number of recent content rows the fallback path reads for `limit`.
	pub fn fallback_rows(&self, limit: usize) -> usize {
		limit.clamp(self.min_fallback_rows, self.max_fallback_rows.max(self.min_fallback_rows))
	}

	/// Edge budget handed to the primary store for `limit`.
	pub fn primary_candidates(&self, limit: usize) -> usize {
		limit.saturating_mul(self.primary_candidate_factor)
	}

	/// Neighborhood depth clamped to `[1, max_hops]`.
	pub fn hops(&self, hops: u32) -> u32 {
		hops.clamp(1, self.max_hops.max(1))
	}
}
