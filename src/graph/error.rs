use thiserror::Error;

/// Errors raised inside the graph engine and by its collaborators.
///
/// None of these texts reach the caller; operations translate them into
/// fixed messages at the boundary.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
	/// No primary graph store is configured or reachable.
	#[error("graph backend not configured")]
	NotConfigured,

	/// The caller has no authenticated identity.
	#[error("unauthorized")]
	Unauthorized,

	/// The primary graph store failed a query.
	#[error("graph store query failed: {0}")]
	Store(String),

	/// The content repository failed a query.
	#[error("content repository query failed: {0}")]
	Repository(String),

	/// A configuration document could not be parsed.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),
}

impl From<toml::de::Error> for GraphError {
	fn from(err: toml::de::Error) -> Self {
		GraphError::InvalidConfig(err.to_string())
	}
}

/// Result alias used across the engine.
pub type Result<T> = std::result::Result<T, GraphError>;
