//! `raw -> sanitized -> filtered -> adapted -> laid out`, recomputed in full
//! whenever any input changes.

use std::collections::HashSet;

use log::{debug, warn};

use super::adapter::GraphAdapter;
use super::config::GraphConfig;
use super::filter::{VisibleTypeSet, filter_matching, sanitize};
use super::layout::{LayerAssignment, NodeSize, Spacing, layout_graph};
use super::source::FetchState;
use super::types::{Entity, GraphData, GraphEdge, GraphNode, LayoutDirection};

/// User-controlled inputs of one pipeline run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewSettings {
	/// Types whose entities are drawn.
	pub visible_types: VisibleTypeSet,
	/// Text search; empty matches everything.
	pub search: String,
	/// Rank direction.
	pub direction: LayoutDirection,
}

/// Everything the surface and the controller need for one render cycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphView {
	/// The full, sanitized record set; details resolve against this.
	pub data: GraphData,
	/// Visible, positioned nodes.
	pub nodes: Vec<GraphNode>,
	/// Edges whose endpoints are both in `nodes`.
	pub edges: Vec<GraphEdge>,
	/// Ranks and orders of `nodes`.
	pub assignment: LayerAssignment,
	/// Direction the view was laid out in.
	pub direction: LayoutDirection,
	/// Drawing width.
	pub width: f64,
	/// Drawing height.
	pub height: f64,
	/// Keys of relationships dropped as dangling.
	pub dropped_relationships: Vec<String>,
	/// More visible nodes than the configured soft cap.
	pub over_soft_cap: bool,
}

impl GraphView {
	/// No visible nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Whether node `id` is visible.
	pub fn contains_node(&self, id: &str) -> bool {
		self.nodes.iter().any(|n| n.id == id)
	}

	/// Visible node `id`.
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Looks up a loaded entity whether or not it is currently visible.
	pub fn entity(&self, key: &str) -> Option<&Entity> {
		self.data.entities.iter().find(|e| e.key == key)
	}

	/// Rank of visible node `id`.
	pub fn rank_of(&self, id: &str) -> Option<usize> {
		let idx = self.nodes.iter().position(|n| n.id == id)?;
		self.assignment.ranks.get(idx).copied()
	}
}

/// Sanitize, filter, adapt and lay out, with settings fixed at construction.
#[derive(Clone, Debug)]
pub struct GraphPipeline {
	adapter: GraphAdapter,
	node_size: NodeSize,
	spacing: Spacing,
	node_soft_cap: usize,
}

impl Default for GraphPipeline {
	fn default() -> Self {
		Self::new(&GraphConfig::default())
	}
}

impl GraphPipeline {
	/// Pipeline configured from `config`.
	pub fn new(config: &GraphConfig) -> Self {
		Self {
			adapter: GraphAdapter::new(config.colors.clone()),
			node_size: config.node_size,
			spacing: config.spacing,
			node_soft_cap: config.node_soft_cap,
		}
	}

	/// Adapter used for nodes and edges.
	pub fn adapter(&self) -> &GraphAdapter {
		&self.adapter
	}

	/// Box size every node is laid out with.
	pub fn node_size(&self) -> NodeSize {
		self.node_size
	}

	/// The view for whatever the last fetch produced. Anything but loaded
	/// data yields an empty view, so a failed refetch leaves nothing
	/// selectable.
	pub fn view_for(&self, state: &FetchState, settings: &ViewSettings) -> GraphView {
		state
			.data()
			.map(|data| self.run(data, settings))
			.unwrap_or_default()
	}

	/// Computes the view of `raw` under `settings`.
	pub fn run(&self, raw: &GraphData, settings: &ViewSettings) -> GraphView {
		let clean = sanitize(raw);
		let filtered = filter_matching(
			&clean.data.entities,
			&clean.data.relationships,
			&settings.visible_types,
			&settings.search,
		);

		let nodes: Vec<GraphNode> = filtered.entities.iter().map(|e| self.adapter.to_node(e)).collect();
		let edges: Vec<GraphEdge> = filtered
			.relationships
			.iter()
			.map(|r| self.adapter.to_edge(r))
			.collect();

		let over_soft_cap = nodes.len() > self.node_soft_cap;
		if over_soft_cap {
			warn!(
				"{} visible nodes exceeds the soft cap of {}; layout may be slow",
				nodes.len(),
				self.node_soft_cap
			);
		}

		debug!(
			"pipeline: {}/{} entities, {}/{} relationships visible",
			nodes.len(),
			clean.data.entities.len(),
			edges.len(),
			clean.data.relationships.len()
		);

		let laid_out = layout_graph(
			nodes,
			&edges,
			settings.direction,
			self.node_size,
			self.spacing,
		);

		GraphView {
			data: clean.data,
			nodes: laid_out.nodes,
			edges,
			assignment: laid_out.assignment,
			direction: settings.direction,
			width: laid_out.width,
			height: laid_out.height,
			dropped_relationships: clean.dangling_relationships,
			over_soft_cap,
		}
	}
}

/// True when every edge of `view` joins two of its nodes.
pub fn edges_are_consistent(view: &GraphView) -> bool {
	let ids: HashSet<&str> = view.nodes.iter().map(|n| n.id.as_str()).collect();
	view.edges
		.iter()
		.all(|e| ids.contains(e.source_id.as_str()) && ids.contains(e.target_id.as_str()))
}
