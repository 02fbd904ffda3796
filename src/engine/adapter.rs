//! Maps domain records onto render-agnostic nodes and edges.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{Color, Entity, GraphEdge, GraphNode, Position, Relationship};

/// Colour used for any type missing from the table.
pub const FALLBACK_COLOR: Color = Color::rgb(0x7f, 0x7f, 0x7f);

const PALETTE: &[(&str, Color)] = &[
	("Project", Color::rgb(0x1f, 0x77, 0xb4)),
	("Repository", Color::rgb(0xff, 0x7f, 0x0e)),
	("Person", Color::rgb(0x2c, 0xa0, 0x2c)),
	("Team", Color::rgb(0xd6, 0x27, 0x28)),
	("Service", Color::rgb(0x94, 0x67, 0xbd)),
	("Domain", Color::rgb(0x8c, 0x56, 0x4b)),
	("Document", Color::rgb(0xe3, 0x77, 0xc2)),
];

/// Static type -> colour configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorTable {
	/// Exact type name to colour.
	pub types: HashMap<String, Color>,
	/// Colour for unlisted types.
	pub fallback: Color,
}

impl Default for ColorTable {
	fn default() -> Self {
		Self {
			types: PALETTE
				.iter()
				.map(|(name, color)| (name.to_string(), *color))
				.collect(),
			fallback: FALLBACK_COLOR,
		}
	}
}

impl ColorTable {
	/// A table with no type entries; everything resolves to `fallback`.
	pub fn empty(fallback: Color) -> Self {
		Self {
			types: HashMap::new(),
			fallback,
		}
	}

	/// Adds or replaces one entry.
	pub fn with_type(mut self, type_name: impl Into<String>, color: Color) -> Self {
		self.types.insert(type_name.into(), color);
		self
	}

	/// Colour for `type_name`, or the fallback.
	pub fn resolve(&self, type_name: &str) -> Color {
		self.types.get(type_name).copied().unwrap_or(self.fallback)
	}
}

/// Turns `HAS_REPO` / `owned-by` into `HAS REPO` / `owned by`.
pub fn humanize(type_name: &str) -> String {
	type_name
		.split(['_', '-'])
		.filter(|part| !part.is_empty())
		.collect::<Vec<_>>()
		.join(" ")
}

/// Stateless record mapper configured with a colour table.
#[derive(Clone, Debug, Default)]
pub struct GraphAdapter {
	colors: ColorTable,
}

impl GraphAdapter {
	/// Adapter resolving colours from `colors`.
	pub fn new(colors: ColorTable) -> Self {
		Self { colors }
	}

	/// The injected colour table.
	pub fn colors(&self) -> &ColorTable {
		&self.colors
	}

	/// Unpositioned node for `entity`.
	pub fn to_node(&self, entity: &Entity) -> GraphNode {
		GraphNode {
			id: entity.key.clone(),
			label: entity.name.clone(),
			type_tag: entity.entity_type.clone(),
			color: self.colors.resolve(&entity.entity_type),
			position: Position::default(),
		}
	}

	/// Edge for `relationship`, labelled with its humanized type.
	pub fn to_edge(&self, relationship: &Relationship) -> GraphEdge {
		GraphEdge {
			id: relationship.key.clone(),
			source_id: relationship.from_key.clone(),
			target_id: relationship.to_key.clone(),
			label: humanize(&relationship.relationship_type),
		}
	}
}
