//! Render-agnostic graph engine: records in, positioned nodes and edges out,
//! plus the selection/focus state that drives interaction.

pub mod adapter;
pub mod config;
pub mod filter;
pub mod layout;
pub mod location;
pub mod pipeline;
pub mod selection;
pub mod source;
pub mod types;

pub use adapter::{ColorTable, GraphAdapter};
pub use config::GraphConfig;
pub use filter::{VisibleTypeSet, filter, sanitize, type_counts, type_universe};
pub use layout::{LaidOutGraph, LayerAssignment, NodeSize, Spacing, layout, layout_graph};
pub use pipeline::{GraphPipeline, GraphView, ViewSettings};
pub use selection::{ControllerEvent, GraphController, NodeDetail, SurfaceEvent};
pub use source::{AnySource, FetchError, FetchSequencer, FetchState, GraphSource, load_graph};
pub use types::{
	Color, Entity, GraphData, GraphEdge, GraphNode, LayoutDirection, Position, Relationship, Scope,
};
