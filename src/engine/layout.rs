//! Layered (Sugiyama-style) layout.
//!
//! Phases:
//!   1. Cycle breaking: depth-first search marks back edges, which are
//!      reversed for ranking only.
//!   2. Rank assignment: longest path from the roots, then sources are pulled
//!      down next to their nearest successor.
//!   3. Ordering within ranks: alternating barycenter sweeps, keeping the
//!      ordering with the fewest crossings between adjacent ranks.
//!   4. Coordinates: rank and order mapped to the axes chosen by the
//!      direction, each rank centred on the widest one.
//!
//! Every phase breaks ties by input order so the same input always yields
//! the same arrangement. Positions are recomputed from scratch on each call.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};

use log::debug;
use serde::{Deserialize, Serialize};

use super::types::{GraphEdge, GraphNode, LayoutDirection, Position};

/// Upper bound on barycenter sweep pairs (down then up).
const MAX_SWEEPS: usize = 8;

/// Box every node is drawn in.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeSize {
	/// Box width.
	pub width: f64,
	/// Box height.
	pub height: f64,
}

impl Default for NodeSize {
	fn default() -> Self {
		Self {
			width: 172.0,
			height: 36.0,
		}
	}
}

/// Gaps between nodes of one rank, between ranks, and around the drawing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
	/// Between neighbours in one rank.
	pub node: f64,
	/// Between consecutive ranks.
	pub rank: f64,
	/// Around the whole drawing.
	pub margin: f64,
}

impl Default for Spacing {
	fn default() -> Self {
		Self {
			node: 40.0,
			rank: 80.0,
			margin: 24.0,
		}
	}
}

/// Rank and order of every input node, by input index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerAssignment {
	/// Rank of each node.
	pub ranks: Vec<usize>,
	/// `layers[r]` lists the node indices of rank `r`, left to right.
	pub layers: Vec<Vec<usize>>,
	/// Ids of edges that were reversed to break cycles.
	pub reversed_edges: Vec<String>,
}

impl LayerAssignment {
	/// Number of ranks.
	pub fn rank_count(&self) -> usize {
		self.layers.len()
	}

	/// Position of node `idx` inside its rank.
	pub fn order_of(&self, idx: usize) -> Option<usize> {
		let rank = *self.ranks.get(idx)?;
		self.layers.get(rank)?.iter().position(|&n| n == idx)
	}
}

/// Positioned nodes plus the bounding box of the drawing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LaidOutGraph {
	/// The input nodes with positions filled in.
	pub nodes: Vec<GraphNode>,
	/// Ranks and orders behind the positions.
	pub assignment: LayerAssignment,
	/// Drawing width, margins included.
	pub width: f64,
	/// Drawing height, margins included.
	pub height: f64,
}

impl LaidOutGraph {
	fn index_of(&self, id: &str) -> Option<usize> {
		self.nodes.iter().position(|n| n.id == id)
	}

	/// Rank of node `id`.
	pub fn rank_of(&self, id: &str) -> Option<usize> {
		self.index_of(id).and_then(|i| self.assignment.ranks.get(i).copied())
	}

	/// Position of node `id` inside its rank.
	pub fn order_of(&self, id: &str) -> Option<usize> {
		self.index_of(id).and_then(|i| self.assignment.order_of(i))
	}

	/// Positioned node `id`.
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}
}

/// Directed adjacency over node indices, ignoring self-loops and edges
/// with an endpoint outside the node set.
struct Links {
	/// (source, target, edge index)
	pairs: Vec<(usize, usize, usize)>,
	out: Vec<Vec<(usize, usize)>>,
	in_degree: Vec<usize>,
}

impl Links {
	fn new(nodes: &[GraphNode], edges: &[GraphEdge]) -> Self {
		let index: HashMap<&str, usize> = nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.as_str(), i))
			.collect();
		let mut out = vec![Vec::new(); nodes.len()];
		let mut in_degree = vec![0; nodes.len()];
		let mut pairs = Vec::with_capacity(edges.len());
		for (e, edge) in edges.iter().enumerate() {
			let (Some(&s), Some(&t)) = (
				index.get(edge.source_id.as_str()),
				index.get(edge.target_id.as_str()),
			) else {
				continue;
			};
			if s == t {
				continue;
			}
			out[s].push((t, pairs.len()));
			in_degree[t] += 1;
			pairs.push((s, t, e));
		}
		Self {
			pairs,
			out,
			in_degree,
		}
	}
}

/// Marks the links that close a cycle. Search starts from the sources in
/// input order, then any node not yet reached.
fn find_back_links(links: &Links, n: usize) -> Vec<bool> {
	const UNSEEN: u8 = 0;
	const ON_STACK: u8 = 1;
	const DONE: u8 = 2;

	let mut state = vec![UNSEEN; n];
	let mut back = vec![false; links.pairs.len()];
	let roots = (0..n)
		.filter(|&i| links.in_degree[i] == 0)
		.chain(0..n);

	let mut stack: Vec<(usize, usize)> = Vec::new();
	for root in roots {
		if state[root] != UNSEEN {
			continue;
		}
		state[root] = ON_STACK;
		stack.push((root, 0));
		while let Some(top) = stack.last_mut() {
			let u = top.0;
			if let Some(&(v, link)) = links.out[u].get(top.1) {
				top.1 += 1;
				match state[v] {
					UNSEEN => {
						state[v] = ON_STACK;
						stack.push((v, 0));
					}
					ON_STACK => back[link] = true,
					_ => {}
				}
			} else {
				state[u] = DONE;
				stack.pop();
			}
		}
	}
	back
}

/// Acyclic adjacency used by ranking and ordering.
struct Dag {
	succ: Vec<Vec<usize>>,
	pred: Vec<Vec<usize>>,
}

impl Dag {
	fn new(links: &Links, back: &[bool], n: usize) -> Self {
		let mut succ = vec![Vec::new(); n];
		let mut pred = vec![Vec::new(); n];
		for (i, &(s, t, _)) in links.pairs.iter().enumerate() {
			let (s, t) = if back[i] { (t, s) } else { (s, t) };
			succ[s].push(t);
			pred[t].push(s);
		}
		Self { succ, pred }
	}

	fn is_isolated(&self, i: usize) -> bool {
		self.succ[i].is_empty() && self.pred[i].is_empty()
	}

	fn topological_order(&self) -> Vec<usize> {
		let n = self.succ.len();
		let mut remaining: Vec<usize> = self.pred.iter().map(Vec::len).collect();
		let mut queue: VecDeque<usize> = (0..n).filter(|&i| remaining[i] == 0).collect();
		let mut order = Vec::with_capacity(n);
		while let Some(u) = queue.pop_front() {
			order.push(u);
			for &v in &self.succ[u] {
				remaining[v] -= 1;
				if remaining[v] == 0 {
					queue.push_back(v);
				}
			}
		}
		order
	}
}

fn assign_ranks(dag: &Dag) -> Vec<usize> {
	let order = dag.topological_order();
	let mut ranks = vec![0usize; dag.succ.len()];
	for &u in &order {
		for &v in &dag.succ[u] {
			ranks[v] = ranks[v].max(ranks[u] + 1);
		}
	}
	// A source only constrains its successors; sit it one rank above the
	// closest one instead of at the top.
	for &u in &order {
		if !dag.pred[u].is_empty() {
			continue;
		}
		if let Some(closest) = dag.succ[u].iter().map(|&v| ranks[v]).min() {
			ranks[u] = closest - 1;
		}
	}
	ranks
}

fn initial_layers(dag: &Dag, ranks: &[usize]) -> Vec<Vec<usize>> {
	let rank_count = ranks.iter().max().map_or(0, |r| r + 1);
	let mut layers = vec![Vec::new(); rank_count];
	for (i, &r) in ranks.iter().enumerate() {
		if !dag.is_isolated(i) {
			layers[r].push(i);
		}
	}
	for (i, &r) in ranks.iter().enumerate() {
		if dag.is_isolated(i) {
			layers[r].push(i);
		}
	}
	layers
}

fn positions(layers: &[Vec<usize>], n: usize) -> Vec<usize> {
	let mut pos = vec![0; n];
	for layer in layers {
		for (p, &i) in layer.iter().enumerate() {
			pos[i] = p;
		}
	}
	pos
}

/// Reorders one rank by the mean position of each node's neighbours.
/// Nodes without neighbours keep their slot; isolated nodes stay last.
fn sort_by_barycenter(layer: &mut [usize], neighbours: &[Vec<usize>], pos: &[usize], dag: &Dag) {
	let key = |i: usize| -> (bool, f64, usize) {
		let ns = &neighbours[i];
		let bary = if ns.is_empty() {
			pos[i] as f64
		} else {
			ns.iter().map(|&v| pos[v] as f64).sum::<f64>() / ns.len() as f64
		};
		(dag.is_isolated(i), bary, pos[i])
	};
	let mut keyed: Vec<((bool, f64, usize), usize)> = layer.iter().map(|&i| (key(i), i)).collect();
	keyed.sort_by(|(a, _), (b, _)| {
		a.0.cmp(&b.0)
			.then(a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
			.then(a.2.cmp(&b.2))
	});
	for (slot, (_, i)) in layer.iter_mut().zip(keyed) {
		*slot = i;
	}
}

/// Crossings between adjacent ranks. Edges spanning more than one rank
/// have no dummy nodes and are not counted, so a zero here only means the
/// short edges are untangled.
fn count_crossings(layers: &[Vec<usize>], dag: &Dag, ranks: &[usize], n: usize) -> usize {
	let pos = positions(layers, n);
	let mut total = 0;
	for r in 0..layers.len().saturating_sub(1) {
		let mut spans: Vec<(usize, usize)> = Vec::new();
		for &u in &layers[r] {
			for &v in &dag.succ[u] {
				if ranks[v] == r + 1 {
					spans.push((pos[u], pos[v]));
				}
			}
		}
		for (i, a) in spans.iter().enumerate() {
			for b in &spans[i + 1..] {
				if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
					total += 1;
				}
			}
		}
	}
	total
}

fn order_layers(dag: &Dag, ranks: &[usize]) -> Vec<Vec<usize>> {
	let n = ranks.len();
	let mut layers = initial_layers(dag, ranks);
	let mut best = layers.clone();
	let mut best_crossings = count_crossings(&layers, dag, ranks, n);

	for _ in 0..MAX_SWEEPS {
		if best_crossings == 0 {
			break;
		}
		for r in 1..layers.len() {
			let pos = positions(&layers, n);
			sort_by_barycenter(&mut layers[r], &dag.pred, &pos, dag);
		}
		for r in (0..layers.len().saturating_sub(1)).rev() {
			let pos = positions(&layers, n);
			sort_by_barycenter(&mut layers[r], &dag.succ, &pos, dag);
		}
		let crossings = count_crossings(&layers, dag, ranks, n);
		if crossings < best_crossings {
			best_crossings = crossings;
			best = layers.clone();
		} else {
			break;
		}
	}
	best
}

/// Ranks and orders `nodes` without computing coordinates.
pub fn assign_layers(nodes: &[GraphNode], edges: &[GraphEdge]) -> LayerAssignment {
	let n = nodes.len();
	let links = Links::new(nodes, edges);
	let back = find_back_links(&links, n);
	let dag = Dag::new(&links, &back, n);
	let ranks = assign_ranks(&dag);
	let layers = order_layers(&dag, &ranks);
	let reversed_edges = links
		.pairs
		.iter()
		.zip(&back)
		.filter(|(_, b)| **b)
		.map(|(&(_, _, e), _)| edges[e].id.clone())
		.collect();

	LayerAssignment {
		ranks,
		layers,
		reversed_edges,
	}
}

/// Assigns a position to every node. Edges are read, never modified, so
/// arrowheads keep pointing from the true source to the true target.
pub fn layout_graph(
	nodes: Vec<GraphNode>,
	edges: &[GraphEdge],
	direction: LayoutDirection,
	node_size: NodeSize,
	spacing: Spacing,
) -> LaidOutGraph {
	let assignment = assign_layers(&nodes, edges);

	let (rank_extent, order_extent) = if direction.is_horizontal() {
		(node_size.width, node_size.height)
	} else {
		(node_size.height, node_size.width)
	};
	let layer_length = |count: usize| -> f64 {
		if count == 0 {
			0.0
		} else {
			count as f64 * order_extent + (count - 1) as f64 * spacing.node
		}
	};
	let longest = assignment
		.layers
		.iter()
		.map(|l| layer_length(l.len()))
		.fold(0.0, f64::max);
	let last_rank = assignment.rank_count().saturating_sub(1);

	let mut nodes = nodes;
	for (r, layer) in assignment.layers.iter().enumerate() {
		let offset = (longest - layer_length(layer.len())) / 2.0;
		let slot = if direction.is_reversed() { last_rank - r } else { r };
		let along_rank = spacing.margin + slot as f64 * (rank_extent + spacing.rank);
		for (o, &i) in layer.iter().enumerate() {
			let along_order = spacing.margin + offset + o as f64 * (order_extent + spacing.node);
			nodes[i].position = if direction.is_horizontal() {
				Position::new(along_rank, along_order)
			} else {
				Position::new(along_order, along_rank)
			};
		}
	}

	let rank_length = if assignment.rank_count() == 0 {
		0.0
	} else {
		assignment.rank_count() as f64 * rank_extent
			+ (assignment.rank_count() - 1) as f64 * spacing.rank
	};
	let (width, height) = if direction.is_horizontal() {
		(rank_length, longest)
	} else {
		(longest, rank_length)
	};

	debug!(
		"layout {}: {} nodes in {} ranks, {} edges reversed",
		direction.code(),
		nodes.len(),
		assignment.rank_count(),
		assignment.reversed_edges.len()
	);

	LaidOutGraph {
		nodes,
		assignment,
		width: width + 2.0 * spacing.margin,
		height: height + 2.0 * spacing.margin,
	}
}

/// Convenience wrapper returning only the positioned nodes.
pub fn layout(
	nodes: Vec<GraphNode>,
	edges: &[GraphEdge],
	direction: LayoutDirection,
	node_size: NodeSize,
	spacing: Spacing,
) -> Vec<GraphNode> {
	layout_graph(nodes, edges, direction, node_size, spacing).nodes
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::types::Color;

	fn node(id: &str) -> GraphNode {
		GraphNode {
			id: id.to_string(),
			label: id.to_string(),
			type_tag: "T".to_string(),
			color: Color::rgb(0, 0, 0),
			position: Position::default(),
		}
	}

	fn edge(s: &str, t: &str) -> GraphEdge {
		GraphEdge {
			id: format!("{s}->{t}"),
			source_id: s.to_string(),
			target_id: t.to_string(),
			label: String::new(),
		}
	}

	fn run(ids: &[&str], edges: &[(&str, &str)], direction: LayoutDirection) -> LaidOutGraph {
		let nodes = ids.iter().map(|id| node(id)).collect();
		let edges: Vec<GraphEdge> = edges.iter().map(|(s, t)| edge(s, t)).collect();
		layout_graph(nodes, &edges, direction, NodeSize::default(), Spacing::default())
	}

	#[test]
	fn chain_is_a_single_column() {
		let g = run(
			&["A", "B", "C"],
			&[("A", "B"), ("B", "C")],
			LayoutDirection::TopToBottom,
		);
		assert_eq!(g.assignment.rank_count(), 3);
		assert_eq!(g.rank_of("A"), Some(0));
		assert_eq!(g.rank_of("B"), Some(1));
		assert_eq!(g.rank_of("C"), Some(2));
		assert!(g.assignment.layers.iter().all(|l| l.len() == 1));

		let (a, b, c) = (g.node("A").unwrap(), g.node("B").unwrap(), g.node("C").unwrap());
		assert_eq!(a.position.x, b.position.x);
		assert_eq!(b.position.x, c.position.x);
		assert!(a.position.y < b.position.y && b.position.y < c.position.y);
		assert_eq!(a.position, Position::new(24.0, 24.0));
		assert_eq!(b.position.y, 24.0 + 36.0 + 80.0);
	}

	#[test]
	fn left_to_right_swaps_axes_and_keeps_ranks() {
		let ids = ["A", "B", "C", "D"];
		let edges = [("A", "B"), ("A", "C"), ("C", "D")];
		let tb = run(&ids, &edges, LayoutDirection::TopToBottom);
		let lr = run(&ids, &edges, LayoutDirection::LeftToRight);
		assert_eq!(tb.assignment, lr.assignment);

		let (a, d) = (lr.node("A").unwrap(), lr.node("D").unwrap());
		assert!(a.position.x < d.position.x);
		let (b, c) = (lr.node("B").unwrap(), lr.node("C").unwrap());
		assert_eq!(b.position.x, c.position.x);
		assert_ne!(b.position.y, c.position.y);
		assert_eq!(lr.width, tb.height + (172.0 - 36.0) * 3.0);
	}

	#[test]
	fn reversed_directions_mirror_the_rank_axis() {
		let bt = run(&["A", "B"], &[("A", "B")], LayoutDirection::BottomToTop);
		assert!(bt.node("A").unwrap().position.y > bt.node("B").unwrap().position.y);
		let rl = run(&["A", "B"], &[("A", "B")], LayoutDirection::RightToLeft);
		assert!(rl.node("A").unwrap().position.x > rl.node("B").unwrap().position.x);
		assert_eq!(rl.rank_of("A"), Some(0));
	}

	#[test]
	fn cycles_are_broken_for_ranking_only() {
		let ids = ["A", "B", "C"];
		let edges: Vec<GraphEdge> = [("A", "B"), ("B", "C"), ("C", "A")]
			.iter()
			.map(|(s, t)| edge(s, t))
			.collect();
		let nodes: Vec<GraphNode> = ids.iter().map(|id| node(id)).collect();
		let g = layout_graph(
			nodes,
			&edges,
			LayoutDirection::TopToBottom,
			NodeSize::default(),
			Spacing::default(),
		);
		assert_eq!(g.nodes.len(), 3);
		assert_eq!(g.assignment.reversed_edges, vec!["C->A".to_string()]);
		assert_eq!(g.rank_of("A"), Some(0));
		assert_eq!(g.rank_of("C"), Some(2));
		assert_eq!(edges[2].source_id, "C");
	}

	#[test]
	fn isolated_nodes_sit_at_rank_zero_after_connected_ones() {
		let g = run(
			&["Lonely", "A", "B", "Alone"],
			&[("A", "B")],
			LayoutDirection::TopToBottom,
		);
		assert_eq!(g.rank_of("Lonely"), Some(0));
		assert_eq!(g.rank_of("Alone"), Some(0));
		assert_eq!(g.order_of("A"), Some(0));
		assert_eq!(g.order_of("Lonely"), Some(1));
		assert_eq!(g.order_of("Alone"), Some(2));
	}

	#[test]
	fn self_loops_and_unknown_endpoints_are_ignored() {
		let g = run(
			&["A", "B"],
			&[("A", "A"), ("A", "B"), ("B", "ghost")],
			LayoutDirection::TopToBottom,
		);
		assert_eq!(g.rank_of("A"), Some(0));
		assert_eq!(g.rank_of("B"), Some(1));
		assert!(g.assignment.reversed_edges.is_empty());
	}

	#[test]
	fn barycenter_untangles_crossed_pairs() {
		let g = run(
			&["A", "B", "C", "D"],
			&[("A", "D"), ("B", "C")],
			LayoutDirection::TopToBottom,
		);
		assert_eq!(g.order_of("A"), Some(0));
		assert!(g.order_of("D") < g.order_of("C"));
	}

	#[test]
	fn crossings_are_counted_between_adjacent_ranks_only() {
		let nodes: Vec<GraphNode> = ["a", "b", "c", "d", "e"].into_iter().map(node).collect();
		let count = |edges: &[GraphEdge]| {
			let links = Links::new(&nodes, edges);
			let back = find_back_links(&links, nodes.len());
			let dag = Dag::new(&links, &back, nodes.len());
			let ranks = assign_ranks(&dag);
			assert_eq!(ranks, vec![0, 0, 1, 1, 2]);
			count_crossings(&[vec![0, 1], vec![2, 3], vec![4]], &dag, &ranks, nodes.len())
		};

		let short = [edge("a", "d"), edge("b", "c"), edge("c", "e")];
		assert_eq!(count(&short), 1);
		// b -> e spans two ranks and is invisible to the count.
		let mut with_long = short.to_vec();
		with_long.push(edge("b", "e"));
		assert_eq!(count(&with_long), 1);
	}

	#[test]
	fn sources_are_pulled_towards_their_successor() {
		let g = run(
			&["A", "B", "C", "X"],
			&[("A", "B"), ("B", "C"), ("X", "C")],
			LayoutDirection::TopToBottom,
		);
		assert_eq!(g.rank_of("X"), Some(1));
		assert_eq!(g.rank_of("C"), Some(2));
	}

	#[test]
	fn same_input_same_layout() {
		let ids = ["A", "B", "C", "D", "E", "F"];
		let edges = [
			("A", "C"),
			("B", "C"),
			("C", "D"),
			("D", "B"),
			("A", "E"),
			("E", "F"),
			("B", "F"),
		];
		let first = run(&ids, &edges, LayoutDirection::LeftToRight);
		let second = run(&ids, &edges, LayoutDirection::LeftToRight);
		assert_eq!(first, second);
	}

	#[test]
	fn empty_input_is_an_empty_layout() {
		let g = run(&[], &[], LayoutDirection::TopToBottom);
		assert!(g.nodes.is_empty());
		assert_eq!(g.assignment.rank_count(), 0);
		assert_eq!((g.width, g.height), (48.0, 48.0));
	}
}
