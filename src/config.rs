//! Application configuration, read from the `graph.toml` bundled into the binary.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::components::force_graph::{ColorMode, LayoutSettings};
use crate::graph::{QuerySettings, Result};

const EMBEDDED: &str = include_str!("../graph.toml");

/// Query limits, layout tunables and the initial coloring mode.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
	/// Limits applied by the graph service.
	pub query: QuerySettings,
	/// ForceAtlas2 tunables.
	pub layout: LayoutSettings,
	/// Coloring the explorer starts with.
	pub color_mode: ColorMode,
}

impl AppConfig {
	/// Parses a TOML document. Missing keys take their defaults.
	pub fn from_toml_str(source: &str) -> Result<Self> {
		Ok(toml::from_str(source)?)
	}

	/// The embedded configuration, or the defaults if it does not parse.
	pub fn load() -> Self {
		Self::from_toml_str(EMBEDDED).unwrap_or_else(|err| {
			warn!("{err}; using default configuration");
			Self::default()
		})
	}
}
