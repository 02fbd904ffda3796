//! Engine configuration, injected rather than global.

use serde::{Deserialize, Serialize};

use super::adapter::ColorTable;
use super::layout::{NodeSize, Spacing};
use super::types::LayoutDirection;

/// Injected engine configuration. Missing JSON fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphConfig {
	/// Size of every node box.
	pub node_size: NodeSize,
	/// Gaps used by the layout.
	pub spacing: Spacing,
	/// Initial layout direction.
	pub direction: LayoutDirection,
	/// `limit` passed to both list calls of the query service.
	pub fetch_limit: usize,
	/// Above this many visible nodes the view reports a warning.
	pub node_soft_cap: usize,
	/// Type colours for the adapter.
	pub colors: ColorTable,
	/// Base URL of the query service; the built-in sample data is used
	/// when unset.
	pub api_base: Option<String>,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			node_size: NodeSize::default(),
			spacing: Spacing::default(),
			direction: LayoutDirection::default(),
			fetch_limit: 500,
			node_soft_cap: 1500,
			colors: ColorTable::default(),
			api_base: None,
		}
	}
}

impl GraphConfig {
	/// Parses a (possibly partial) JSON config.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::types::Color;

	#[test]
	fn partial_json_keeps_defaults() {
		let config = GraphConfig::from_json(
			r##"{"direction":"LeftToRight","fetchLimit":50,"colors":{"types":{"Team":"#010203"}}}"##,
		)
		.unwrap();
		assert_eq!(config.direction, LayoutDirection::LeftToRight);
		assert_eq!(config.fetch_limit, 50);
		assert_eq!(config.node_soft_cap, 1500);
		assert_eq!(config.spacing, Spacing::default());
		assert_eq!(config.colors.resolve("Team"), Color::rgb(1, 2, 3));
		assert_eq!(config.colors.fallback, crate::engine::adapter::FALLBACK_COLOR);
	}

	#[test]
	fn rejects_bad_colors() {
		assert!(GraphConfig::from_json(r#"{"colors":{"fallback":"nope"}}"#).is_err());
	}
}
