use std::collections::{HashMap, HashSet};

use crate::engine::{GraphEdge, GraphNode, NodeSize, SurfaceEvent};

/// Extra world-space margin around a node that still counts as a hit.
pub const HIT_PADDING: f64 = 4.0;
/// Pointer travel (screen pixels) below which a press counts as a click.
pub const CLICK_SLOP: f64 = 4.0;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 4.0;

/// What the surface draws: laid-out nodes and edges plus interaction marks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
	pub width: f64,
	pub height: f64,
	pub node_size: NodeSize,
	pub selected: Option<String>,
	pub focused: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	pub neighbors: HashSet<usize>,
	pub highlight_t: f64,
	pub prev_node: Option<usize>,
	pub prev_neighbors: HashSet<usize>,
	delay_t: f64,
}

pub struct CanvasState {
	pub scene: Scene,
	pub transform: ViewTransform,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
	/// Node index pairs, aligned with `scene.edges`.
	links: Vec<Option<(usize, usize)>>,
}

fn resolve_links(scene: &Scene) -> Vec<Option<(usize, usize)>> {
	let index: HashMap<&str, usize> = scene
		.nodes
		.iter()
		.enumerate()
		.map(|(i, n)| (n.id.as_str(), i))
		.collect();
	scene
		.edges
		.iter()
		.map(|e| Some((*index.get(e.source_id.as_str())?, *index.get(e.target_id.as_str())?)))
		.collect()
}

/// Where the ray from the centre of a `half_w` x `half_h` box towards
/// `(dx, dy)` leaves the box.
pub fn boundary_offset(dx: f64, dy: f64, half_w: f64, half_h: f64) -> (f64, f64) {
	if dx == 0.0 && dy == 0.0 {
		return (0.0, 0.0);
	}
	let tx = if dx == 0.0 { f64::INFINITY } else { half_w / dx.abs() };
	let ty = if dy == 0.0 { f64::INFINITY } else { half_h / dy.abs() };
	let t = tx.min(ty);
	(dx * t, dy * t)
}

impl CanvasState {
	pub fn new(scene: Scene, width: f64, height: f64) -> Self {
		let mut state = Self {
			links: resolve_links(&scene),
			scene,
			transform: ViewTransform {
				x: 0.0,
				y: 0.0,
				k: 1.0,
			},
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			flow_time: 0.0,
		};
		state.fit_to_content();
		state
	}

	/// Swaps in a new scene. A new layout refits the view; a change of
	/// selection or focus alone keeps the user's pan and zoom.
	pub fn set_scene(&mut self, scene: Scene) {
		let relayout = scene.nodes != self.scene.nodes || scene.edges != self.scene.edges;
		self.links = resolve_links(&scene);
		self.scene = scene;
		if relayout {
			self.hover = HoverState::default();
			self.fit_to_content();
		}
	}

	/// Scales (never above 1:1) and centres the drawing in the canvas.
	pub fn fit_to_content(&mut self) {
		let (w, h) = (self.scene.width.max(1.0), self.scene.height.max(1.0));
		let k = (self.width / w).min(self.height / h).min(1.0).max(MIN_ZOOM);
		self.transform = ViewTransform {
			x: (self.width - w * k) / 2.0,
			y: (self.height - h * k) / 2.0,
			k,
		};
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_center(&self, idx: usize) -> (f64, f64) {
		let node = &self.scene.nodes[idx];
		(
			node.position.x + self.scene.node_size.width / 2.0,
			node.position.y + self.scene.node_size.height / 2.0,
		)
	}

	/// Start and end points of edge `i`, clipped to the node boxes. `None`
	/// for self-loops and unresolved endpoints.
	pub fn edge_segment(&self, i: usize) -> Option<((f64, f64), (f64, f64))> {
		let (s, t) = (*self.links.get(i)?)?;
		if s == t {
			return None;
		}
		let ((x1, y1), (x2, y2)) = (self.node_center(s), self.node_center(t));
		let (hw, hh) = (
			self.scene.node_size.width / 2.0,
			self.scene.node_size.height / 2.0,
		);
		let (ox1, oy1) = boundary_offset(x2 - x1, y2 - y1, hw, hh);
		let (ox2, oy2) = boundary_offset(x1 - x2, y1 - y2, hw, hh);
		Some(((x1 + ox1, y1 + oy1), (x2 + ox2, y2 + oy2)))
	}

	pub fn edge_link(&self, i: usize) -> Option<(usize, usize)> {
		self.links.get(i).copied().flatten()
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let size = self.scene.node_size;
		// Last drawn is on top.
		self.scene.nodes.iter().rposition(|node| {
			gx >= node.position.x - HIT_PADDING
				&& gx <= node.position.x + size.width + HIT_PADDING
				&& gy >= node.position.y - HIT_PADDING
				&& gy <= node.position.y + size.height + HIT_PADDING
		})
	}

	pub fn pointer_down(&mut self, x: f64, y: f64) {
		self.pan = PanState {
			active: true,
			moved: false,
			start_x: x,
			start_y: y,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pointer_move(&mut self, x: f64, y: f64) {
		if !self.pan.active {
			let hovered = self.node_at_position(x, y);
			self.set_hover(hovered);
			return;
		}
		let (dx, dy) = (x - self.pan.start_x, y - self.pan.start_y);
		if !self.pan.moved && (dx * dx + dy * dy).sqrt() < CLICK_SLOP {
			return;
		}
		self.pan.moved = true;
		self.transform.x = self.pan.transform_start_x + dx;
		self.transform.y = self.pan.transform_start_y + dy;
	}

	/// Ends a press. A press that did not pan is a click on whatever lies
	/// under the pointer.
	pub fn pointer_up(&mut self, x: f64, y: f64) -> Option<SurfaceEvent> {
		let was_click = self.pan.active && !self.pan.moved;
		self.pan.active = false;
		self.pan.moved = false;
		if !was_click {
			return None;
		}
		Some(match self.node_at_position(x, y) {
			Some(idx) => SurfaceEvent::NodeClick(self.scene.nodes[idx].id.clone()),
			None => SurfaceEvent::BackgroundClick,
		})
	}

	pub fn pointer_leave(&mut self) {
		self.pan.active = false;
		self.pan.moved = false;
		self.set_hover(None);
	}

	/// Zooms around the pointer; `delta_y > 0` zooms out.
	pub fn zoom_at(&mut self, x: f64, y: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn set_hover(&mut self, node: Option<usize>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Keep the previous highlight around while it fades out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			for &(src, tgt) in self.links.iter().flatten() {
				if src == idx {
					self.hover.neighbors.insert(tgt);
				} else if tgt == idx {
					self.hover.neighbors.insert(src);
				}
			}
		}
	}

	pub fn is_highlighted(&self, idx: usize) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: usize) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn is_selected(&self, idx: usize) -> bool {
		self.scene.selected.as_deref() == Some(self.scene.nodes[idx].id.as_str())
	}

	pub fn is_focused(&self, idx: usize) -> bool {
		self.scene.focused.as_deref() == Some(self.scene.nodes[idx].id.as_str())
	}

	pub fn tick(&mut self, dt: f64) {
		self.flow_time += dt;

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	/// Resizes the viewport. Pan and zoom are kept; only a new layout
	/// refits.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::{Color, Position};

	fn node(id: &str, x: f64, y: f64) -> GraphNode {
		GraphNode {
			id: id.to_string(),
			label: id.to_string(),
			type_tag: "T".to_string(),
			color: Color::rgb(0, 0, 0),
			position: Position::new(x, y),
		}
	}

	fn scene() -> Scene {
		Scene {
			nodes: vec![node("a", 0.0, 0.0), node("b", 0.0, 100.0), node("c", 200.0, 100.0)],
			edges: vec![
				GraphEdge {
					id: "ab".into(),
					source_id: "a".into(),
					target_id: "b".into(),
					label: String::new(),
				},
				GraphEdge {
					id: "ac".into(),
					source_id: "a".into(),
					target_id: "c".into(),
					label: String::new(),
				},
			],
			width: 400.0,
			height: 200.0,
			node_size: NodeSize {
				width: 100.0,
				height: 20.0,
			},
			selected: None,
			focused: None,
		}
	}

	#[test]
	fn fits_without_upscaling() {
		let state = CanvasState::new(scene(), 800.0, 400.0);
		assert_eq!(state.transform.k, 1.0);
		assert_eq!((state.transform.x, state.transform.y), (200.0, 100.0));

		let small = CanvasState::new(scene(), 200.0, 400.0);
		assert_eq!(small.transform.k, 0.5);
		assert_eq!(small.transform.x, 0.0);
	}

	#[test]
	fn hit_test_uses_node_boxes() {
		let state = CanvasState::new(scene(), 400.0, 200.0);
		assert_eq!(state.node_at_position(50.0, 10.0), Some(0));
		assert_eq!(state.node_at_position(250.0, 110.0), Some(2));
		assert_eq!(state.node_at_position(150.0, 60.0), None);
	}

	#[test]
	fn press_without_travel_is_a_click() {
		let mut state = CanvasState::new(scene(), 400.0, 200.0);
		state.pointer_down(50.0, 110.0);
		state.pointer_move(52.0, 111.0);
		assert_eq!(
			state.pointer_up(52.0, 111.0),
			Some(SurfaceEvent::NodeClick("b".into()))
		);

		state.pointer_down(150.0, 60.0);
		assert_eq!(state.pointer_up(150.0, 60.0), Some(SurfaceEvent::BackgroundClick));
	}

	#[test]
	fn dragging_pans_instead_of_clicking() {
		let mut state = CanvasState::new(scene(), 400.0, 200.0);
		state.pointer_down(50.0, 10.0);
		state.pointer_move(90.0, 40.0);
		assert_eq!(state.pointer_up(90.0, 40.0), None);
		assert_eq!((state.transform.x, state.transform.y), (40.0, 30.0));
	}

	#[test]
	fn hover_collects_neighbours_both_ways() {
		let mut state = CanvasState::new(scene(), 400.0, 200.0);
		state.set_hover(Some(0));
		assert!(state.is_highlighted(1) && state.is_highlighted(2));
		state.set_hover(Some(2));
		assert!(state.is_highlighted(0));
		assert!(!state.is_highlighted(1));
		state.set_hover(None);
		assert!(state.is_hovered(2));
		assert!(state.has_active_highlight());
	}

	#[test]
	fn edges_are_clipped_to_boxes() {
		let state = CanvasState::new(scene(), 400.0, 200.0);
		let ((x1, y1), (x2, y2)) = state.edge_segment(0).unwrap();
		assert_eq!((x1, y1), (50.0, 20.0));
		assert_eq!((x2, y2), (50.0, 100.0));
		assert_eq!(boundary_offset(0.0, 0.0, 1.0, 1.0), (0.0, 0.0));
		assert_eq!(boundary_offset(10.0, 0.0, 5.0, 2.0), (5.0, 0.0));
	}

	#[test]
	fn selection_change_keeps_the_viewport() {
		let mut state = CanvasState::new(scene(), 400.0, 200.0);
		state.zoom_at(0.0, 0.0, -1.0);
		let k = state.transform.k;
		let mut next = scene();
		next.selected = Some("c".into());
		state.set_scene(next);
		assert_eq!(state.transform.k, k);
		assert!(state.is_selected(2));

		let mut moved = scene();
		moved.nodes[0].position = Position::new(10.0, 0.0);
		state.set_scene(moved);
		assert_eq!(state.transform.k, 1.0);
	}

	#[test]
	fn resize_keeps_pan_and_zoom() {
		let mut state = CanvasState::new(scene(), 400.0, 200.0);
		state.pointer_down(10.0, 10.0);
		state.pointer_move(60.0, 30.0);
		state.pointer_up(60.0, 30.0);
		state.zoom_at(0.0, 0.0, -1.0);
		let (x, y, k) = (state.transform.x, state.transform.y, state.transform.k);

		state.resize(1000.0, 700.0);
		assert_eq!((state.width, state.height), (1000.0, 700.0));
		assert_eq!((state.transform.x, state.transform.y, state.transform.k), (x, y, k));
	}
}
