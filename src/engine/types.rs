//! Records exchanged with the query service and the render-ready shapes
//! derived from them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Free-form properties attached to entities and relationships.
pub type Properties = BTreeMap<String, serde_json::Value>;

/// A domain record rendered as a node. `key` is unique across a load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
	/// Stable identity; also used as the node id.
	pub key: String,
	/// Type tag, e.g. `Project`.
	#[serde(rename = "type")]
	pub entity_type: String,
	/// Display name.
	pub name: String,
	/// Extra attributes shown in the detail panel.
	#[serde(default)]
	pub properties: Properties,
}

impl Entity {
	/// Entity without properties.
	pub fn new(key: impl Into<String>, entity_type: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			entity_type: entity_type.into(),
			name: name.into(),
			properties: Properties::new(),
		}
	}

	/// Adds or replaces one property.
	pub fn with_property(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.properties.insert(name.into(), value.into());
		self
	}
}

/// A directed, typed link between two entity keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
	/// Stable identity; also used as the edge id.
	pub key: String,
	/// Source entity key.
	pub from_key: String,
	/// Target entity key.
	pub to_key: String,
	/// Type tag, e.g. `HAS_REPO`.
	#[serde(rename = "type")]
	pub relationship_type: String,
	/// Extra attributes.
	#[serde(default)]
	pub properties: Properties,
}

impl Relationship {
	/// Relationship without properties.
	pub fn new(
		key: impl Into<String>,
		from_key: impl Into<String>,
		to_key: impl Into<String>,
		relationship_type: impl Into<String>,
	) -> Self {
		Self {
			key: key.into(),
			from_key: from_key.into(),
			to_key: to_key.into(),
			relationship_type: relationship_type.into(),
			properties: Properties::new(),
		}
	}
}

/// Raw records for one scope, immutable for one render cycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	/// Loaded entities, in service order.
	pub entities: Vec<Entity>,
	/// Loaded relationships, in service order.
	pub relationships: Vec<Relationship>,
}

/// Query dimension restricting which entities are fetched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Scope {
	/// Dimension, e.g. `team`.
	pub scope_type: Option<String>,
	/// Value within the dimension, e.g. `core`.
	pub scope_key: Option<String>,
}

impl Scope {
	/// Fully specified scope.
	pub fn new(scope_type: impl Into<String>, scope_key: impl Into<String>) -> Self {
		Self {
			scope_type: Some(scope_type.into()),
			scope_key: Some(scope_key.into()),
		}
	}

	/// No restriction at all.
	pub fn is_unscoped(&self) -> bool {
		self.scope_type.is_none() && self.scope_key.is_none()
	}
}

/// An sRGB color. Serialized as `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
	/// Red.
	pub r: u8,
	/// Green.
	pub g: u8,
	/// Blue.
	pub b: u8,
}

impl Color {
	/// Color from its channels.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b }
	}

	/// Parse `#rgb` or `#rrggbb` (the leading `#` is optional).
	pub fn from_hex(hex: &str) -> Option<Self> {
		let hex = hex.trim().trim_start_matches('#');
		let digits: Vec<u8> = hex
			.chars()
			.map(|c| c.to_digit(16).map(|d| d as u8))
			.collect::<Option<_>>()?;
		match digits.as_slice() {
			[r, g, b] => Some(Self::rgb(r * 17, g * 17, b * 17)),
			[r1, r2, g1, g2, b1, b2] => Some(Self::rgb(r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2)),
			_ => None,
		}
	}

	/// `#rrggbb`.
	pub fn to_css(self) -> String {
		format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}

	/// `rgba(...)` with the given alpha.
	pub fn to_rgba(self, alpha: f64) -> String {
		format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
	}
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_css())
	}
}

impl TryFrom<String> for Color {
	type Error = String;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::from_hex(&value).ok_or_else(|| format!("invalid color {value:?}"))
	}
}

impl From<Color> for String {
	fn from(color: Color) -> Self {
		color.to_css()
	}
}

/// A point in layout space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
	/// Horizontal, growing right.
	pub x: f64,
	/// Vertical, growing down.
	pub y: f64,
}

impl Position {
	/// Point at `(x, y)`.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Render-ready node. `position` is the top-left corner and is only ever
/// written by the layout engine.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// The entity key.
	pub id: String,
	/// The entity name.
	pub label: String,
	/// The entity type.
	pub type_tag: String,
	/// Fill color resolved from the type.
	pub color: Color,
	/// Top-left corner.
	pub position: Position,
}

/// Render-ready directed edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphEdge {
	/// The relationship key.
	pub id: String,
	/// Node the edge starts at.
	pub source_id: String,
	/// Node the arrow points to.
	pub target_id: String,
	/// Humanized relationship type.
	pub label: String,
}

/// Flow direction of ranks in the layered layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutDirection {
	/// Roots at the top.
	#[default]
	TopToBottom,
	/// Roots at the bottom.
	BottomToTop,
	/// Roots on the left.
	LeftToRight,
	/// Roots on the right.
	RightToLeft,
}

impl LayoutDirection {
	/// Every direction, in picker order.
	pub const ALL: [Self; 4] = [
		Self::TopToBottom,
		Self::BottomToTop,
		Self::LeftToRight,
		Self::RightToLeft,
	];

	/// Ranks advance along X.
	pub fn is_horizontal(self) -> bool {
		matches!(self, Self::LeftToRight | Self::RightToLeft)
	}

	/// Rank axis runs against the screen axis.
	pub fn is_reversed(self) -> bool {
		matches!(self, Self::BottomToTop | Self::RightToLeft)
	}

	/// Short code, as conventionally used by graph layout tools.
	pub fn code(self) -> &'static str {
		match self {
			Self::TopToBottom => "TB",
			Self::BottomToTop => "BT",
			Self::LeftToRight => "LR",
			Self::RightToLeft => "RL",
		}
	}

	/// Inverse of [`code`](Self::code), case-insensitive.
	pub fn from_code(code: &str) -> Option<Self> {
		Self::ALL
			.into_iter()
			.find(|d| d.code().eq_ignore_ascii_case(code))
	}

	/// Human-readable name.
	pub fn label(self) -> &'static str {
		match self {
			Self::TopToBottom => "Top to bottom",
			Self::BottomToTop => "Bottom to top",
			Self::LeftToRight => "Left to right",
			Self::RightToLeft => "Right to left",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_short_and_long_hex() {
		assert_eq!(Color::from_hex("#fff"), Some(Color::rgb(255, 255, 255)));
		assert_eq!(Color::from_hex("1f77b4"), Some(Color::rgb(0x1f, 0x77, 0xb4)));
		assert_eq!(Color::from_hex("#12345"), None);
		assert_eq!(Color::from_hex("#zzzzzz"), None);
		assert_eq!(Color::rgb(0x1f, 0x77, 0xb4).to_css(), "#1f77b4");
	}

	#[test]
	fn entity_uses_wire_field_names() {
		let entity: Entity = serde_json::from_str(
			r#"{"key":"proj-1","type":"Project","name":"Atlas","properties":{"stars":3}}"#,
		)
		.unwrap();
		assert_eq!(entity.entity_type, "Project");
		assert_eq!(entity.properties["stars"], 3);

		let rel: Relationship =
			serde_json::from_str(r#"{"key":"r1","fromKey":"a","toKey":"b","type":"HAS_REPO"}"#)
				.unwrap();
		assert_eq!(rel.from_key, "a");
		assert_eq!(rel.to_key, "b");
		assert!(rel.properties.is_empty());
	}

	#[test]
	fn direction_codes() {
		for d in LayoutDirection::ALL {
			assert_eq!(LayoutDirection::from_code(d.code()), Some(d));
		}
		assert!(LayoutDirection::LeftToRight.is_horizontal());
		assert!(!LayoutDirection::BottomToTop.is_horizontal());
		assert!(LayoutDirection::BottomToTop.is_reversed());
		assert_eq!(LayoutDirection::from_code("xx"), None);
	}
}
