//! Selection and focus state.
//!
//! Selection (`Idle` / `NodeSelected`) follows clicks on the surface and is
//! reconciled against every new view. Focus is independent of selection, is
//! mirrored into the `focus` query parameter, and stays inert while the
//! entity it names is not loaded.

use std::collections::BTreeMap;

use log::debug;

use super::adapter::humanize;
use super::location;
use super::pipeline::GraphView;
use super::types::{Entity, GraphData};

/// Which node is selected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
	/// Always a visible node, or `None`.
	pub selected_node_id: Option<String>,
}

/// Which entity is focused; mirrors the `focus` query parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FocusState {
	/// May name an entity that is not loaded.
	pub focused_entity_key: Option<String>,
}

/// Raw pointer events reported by the diagramming surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SurfaceEvent {
	/// A node was clicked.
	NodeClick(String),
	/// Empty canvas was clicked.
	BackgroundClick,
}

/// Notifications for the surrounding application.
#[derive(Clone, Debug, PartialEq)]
pub enum ControllerEvent {
	/// `onEntitySelect`; `None` when the selection was cleared.
	EntitySelected(Option<Entity>),
	/// `onFocusEntity`, with the query string to persist.
	FocusChanged {
		/// New focus key.
		key: Option<String>,
		/// Query string with the focus applied.
		query: String,
	},
}

/// Selection, focus and search state, driven by surface and UI events.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphController {
	selection: SelectionState,
	focus: FocusState,
	search: String,
	/// Set once the current focus has pre-selected its node.
	focus_applied: bool,
}

impl GraphController {
	/// Nothing selected or focused.
	pub fn new() -> Self {
		Self::default()
	}

	/// Seeds focus from a location query string.
	pub fn from_query(query: &str) -> Self {
		Self {
			focus: FocusState {
				focused_entity_key: location::focus_from_query(query),
			},
			..Self::default()
		}
	}

	/// Selected node id.
	pub fn selected(&self) -> Option<&str> {
		self.selection.selected_node_id.as_deref()
	}

	/// Focused entity key.
	pub fn focused(&self) -> Option<&str> {
		self.focus.focused_entity_key.as_deref()
	}

	/// Current text search.
	pub fn search(&self) -> &str {
		&self.search
	}

	/// Selection state.
	pub fn selection(&self) -> &SelectionState {
		&self.selection
	}

	/// Focus state.
	pub fn focus_state(&self) -> &FocusState {
		&self.focus
	}

	/// The focused entity, if it is among the loaded ones.
	pub fn focus_target<'a>(&self, view: &'a GraphView) -> Option<&'a Entity> {
		self.focused().and_then(|key| view.entity(key))
	}

	/// Replaces the text search.
	pub fn set_search(&mut self, search: &str) {
		self.search = search.to_string();
	}

	/// Selects `node_id` if it is currently visible; otherwise nothing
	/// happens.
	pub fn select(&mut self, node_id: &str, view: &GraphView) -> Option<ControllerEvent> {
		if !view.contains_node(node_id) || self.selected() == Some(node_id) {
			return None;
		}
		self.selection.selected_node_id = Some(node_id.to_string());
		Some(ControllerEvent::EntitySelected(view.entity(node_id).cloned()))
	}

	/// Clears the selection.
	pub fn deselect(&mut self) -> Option<ControllerEvent> {
		self.selection.selected_node_id.take()?;
		Some(ControllerEvent::EntitySelected(None))
	}

	/// Applies a surface event: node clicks select, background clicks
	/// deselect.
	pub fn handle(&mut self, event: SurfaceEvent, view: &GraphView) -> Option<ControllerEvent> {
		match event {
			SurfaceEvent::NodeClick(id) => self.select(&id, view),
			SurfaceEvent::BackgroundClick => self.deselect(),
		}
	}

	/// Sets or clears focus and clears any text search. `current_query` is
	/// rewritten so the view can be shared.
	pub fn focus(&mut self, key: Option<&str>, current_query: &str) -> Option<ControllerEvent> {
		let search_cleared = !self.search.is_empty();
		self.search.clear();
		if self.focused() == key && !search_cleared {
			return None;
		}
		self.focus.focused_entity_key = key.map(str::to_string);
		self.focus_applied = false;
		debug!("focus -> {:?}", key);
		Some(ControllerEvent::FocusChanged {
			key: key.map(str::to_string),
			query: location::with_focus(current_query, key),
		})
	}

	/// Follows an externally changed location (reload, history navigation)
	/// without writing it back.
	pub fn adopt_query(&mut self, query: &str) -> bool {
		let key = location::focus_from_query(query);
		if self.focus.focused_entity_key == key {
			return false;
		}
		self.focus.focused_entity_key = key;
		self.focus_applied = false;
		true
	}

	/// Brings selection in line with a freshly computed view: a selection
	/// that left the visible set is cleared, and a focus whose node just
	/// became visible pre-selects it once.
	pub fn reconcile(&mut self, view: &GraphView) -> Option<ControllerEvent> {
		if let Some(id) = self.selected() {
			if !view.contains_node(id) {
				debug!("selected node {id} is no longer visible");
				return self.deselect();
			}
		}
		if self.focus_applied || self.selected().is_some() {
			return None;
		}
		let key = self.focused()?.to_string();
		if !view.contains_node(&key) {
			return None;
		}
		self.focus_applied = true;
		self.select(&key, view)
	}

	/// Detail payload for the current selection.
	pub fn detail(&self, view: &GraphView) -> Option<NodeDetail> {
		node_detail(self.selected()?, &view.data)
	}
}

/// One relationship seen from the selected entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkedEntity {
	/// Relationship record key.
	pub relationship_key: String,
	/// Key of the entity at the other end.
	pub other_key: String,
	/// Display name of the source entity.
	pub from_name: String,
	/// Display name of the target entity.
	pub to_name: String,
}

/// Relationships of one type, in input order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationshipGroup {
	/// Relationship type tag.
	pub relationship_type: String,
	/// Humanized type tag.
	pub label: String,
	/// Members of the group.
	pub links: Vec<LinkedEntity>,
}

/// Detail payload for one entity.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDetail {
	/// The entity with all its properties.
	pub entity: Entity,
	/// Relationships starting at the entity, grouped by type.
	pub outgoing: Vec<RelationshipGroup>,
	/// Relationships ending at the entity, grouped by type.
	pub incoming: Vec<RelationshipGroup>,
}

impl NodeDetail {
	/// Number of outgoing relationships.
	pub fn outgoing_count(&self) -> usize {
		self.outgoing.iter().map(|g| g.links.len()).sum()
	}

	/// Number of incoming relationships.
	pub fn incoming_count(&self) -> usize {
		self.incoming.iter().map(|g| g.links.len()).sum()
	}
}

/// Properties and grouped relationships of `key`, resolved against the
/// full record set rather than the visible one.
pub fn node_detail(key: &str, data: &GraphData) -> Option<NodeDetail> {
	let entity = data.entities.iter().find(|e| e.key == key)?.clone();
	let name_of = |k: &str| -> String {
		data.entities
			.iter()
			.find(|e| e.key == k)
			.map_or_else(|| k.to_string(), |e| e.name.clone())
	};

	let mut outgoing: BTreeMap<&str, Vec<LinkedEntity>> = BTreeMap::new();
	let mut incoming: BTreeMap<&str, Vec<LinkedEntity>> = BTreeMap::new();
	for rel in &data.relationships {
		let link = |other: &str| LinkedEntity {
			relationship_key: rel.key.clone(),
			other_key: other.to_string(),
			from_name: name_of(&rel.from_key),
			to_name: name_of(&rel.to_key),
		};
		if rel.from_key == key {
			outgoing
				.entry(rel.relationship_type.as_str())
				.or_default()
				.push(link(&rel.to_key));
		}
		if rel.to_key == key {
			incoming
				.entry(rel.relationship_type.as_str())
				.or_default()
				.push(link(&rel.from_key));
		}
	}

	let grouped = |groups: BTreeMap<&str, Vec<LinkedEntity>>| -> Vec<RelationshipGroup> {
		groups
			.into_iter()
			.map(|(t, links)| RelationshipGroup {
				relationship_type: t.to_string(),
				label: humanize(t),
				links,
			})
			.collect()
	};

	Some(NodeDetail {
		entity,
		outgoing: grouped(outgoing),
		incoming: grouped(incoming),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::filter::{VisibleTypeSet, type_universe};
	use crate::engine::pipeline::{GraphPipeline, ViewSettings};
	use crate::engine::types::Relationship;

	fn data() -> GraphData {
		GraphData {
			entities: vec![
				Entity::new("proj-1", "Project", "Atlas").with_property("stars", 12),
				Entity::new("repo-1", "Repository", "atlas-core"),
				Entity::new("repo-2", "Repository", "atlas-web"),
				Entity::new("p-1", "Person", "Casey"),
			],
			relationships: vec![
				Relationship::new("r1", "proj-1", "repo-1", "HAS_REPO"),
				Relationship::new("r2", "proj-1", "repo-2", "HAS_REPO"),
				Relationship::new("r3", "repo-1", "p-1", "OWNED_BY"),
				Relationship::new("r4", "p-1", "proj-1", "LEADS"),
			],
		}
	}

	fn view_with(data: &GraphData, visible: VisibleTypeSet) -> GraphView {
		GraphPipeline::default().run(
			data,
			&ViewSettings {
				visible_types: visible,
				..Default::default()
			},
		)
	}

	fn full_view(data: &GraphData) -> GraphView {
		view_with(data, VisibleTypeSet::all(type_universe(&data.entities)))
	}

	#[test]
	fn select_and_deselect() {
		let data = data();
		let view = full_view(&data);
		let mut c = GraphController::new();

		let ev = c.handle(SurfaceEvent::NodeClick("repo-1".into()), &view);
		assert!(matches!(ev, Some(ControllerEvent::EntitySelected(Some(ref e))) if e.key == "repo-1"));
		assert_eq!(c.selected(), Some("repo-1"));
		assert_eq!(c.handle(SurfaceEvent::NodeClick("repo-1".into()), &view), None);

		let ev = c.handle(SurfaceEvent::BackgroundClick, &view);
		assert_eq!(ev, Some(ControllerEvent::EntitySelected(None)));
		assert_eq!(c.selected(), None);
		assert_eq!(c.deselect(), None);
	}

	#[test]
	fn selecting_an_invisible_node_is_a_no_op() {
		let data = data();
		let view = view_with(&data, VisibleTypeSet::all(["Project"]));
		let mut c = GraphController::new();
		assert_eq!(c.select("p-1", &view), None);
		assert_eq!(c.select("nope", &view), None);
		assert_eq!(c.selected(), None);
	}

	#[test]
	fn filtering_out_the_selected_type_clears_selection() {
		let data = data();
		let all = VisibleTypeSet::all(type_universe(&data.entities));
		let mut c = GraphController::new();
		c.select("p-1", &view_with(&data, all.clone()));

		let hidden = view_with(&data, all.without("Person"));
		assert_eq!(c.reconcile(&hidden), Some(ControllerEvent::EntitySelected(None)));
		assert_eq!(c.selection().selected_node_id, None);
	}

	#[test]
	fn failed_refetch_clears_selection() {
		use crate::engine::source::{FetchError, FetchState};

		let data = data();
		let pipeline = GraphPipeline::default();
		let settings = ViewSettings {
			visible_types: VisibleTypeSet::all(type_universe(&data.entities)),
			..Default::default()
		};
		let mut c = GraphController::new();
		let loaded = pipeline.view_for(&FetchState::Loaded(data.clone()), &settings);
		c.select("repo-1", &loaded);

		let failed = FetchState::Failed(FetchError::Status(503));
		assert!(!failed.is_loading());
		let view = pipeline.view_for(&failed, &settings);
		assert!(view.is_empty());
		assert_eq!(c.reconcile(&view), Some(ControllerEvent::EntitySelected(None)));
		assert_eq!(c.selected(), None);
	}

	#[test]
	fn focus_writes_and_removes_the_parameter() {
		let mut c = GraphController::new();
		let ev = c.focus(Some("proj-1"), "scopeType=team&scopeKey=core");
		assert_eq!(
			ev,
			Some(ControllerEvent::FocusChanged {
				key: Some("proj-1".into()),
				query: "scopeType=team&scopeKey=core&focus=proj-1".into(),
			})
		);
		assert_eq!(c.focus(Some("proj-1"), "focus=proj-1"), None);

		let ev = c.focus(None, "focus=proj-1");
		assert_eq!(
			ev,
			Some(ControllerEvent::FocusChanged {
				key: None,
				query: String::new(),
			})
		);
		assert_eq!(c.focus_state().focused_entity_key, None);
	}

	#[test]
	fn focus_clears_search() {
		let mut c = GraphController::new();
		c.set_search("atlas");
		assert!(c.focus(Some("proj-1"), "").is_some());
		assert_eq!(c.search(), "");

		c.set_search("casey");
		// Same focus, but the search still has to go.
		assert!(c.focus(Some("proj-1"), "focus=proj-1").is_some());
		assert_eq!(c.search(), "");
	}

	#[test]
	fn reload_with_focus_preselects_once_loaded() {
		let data = data();
		let mut c = GraphController::from_query("focus=proj-1");
		assert_eq!(c.focused(), Some("proj-1"));

		assert_eq!(c.reconcile(&GraphView::default()), None);
		assert_eq!(c.selected(), None);

		let view = full_view(&data);
		assert!(matches!(
			c.reconcile(&view),
			Some(ControllerEvent::EntitySelected(Some(_)))
		));
		assert_eq!(c.selected(), Some("proj-1"));

		c.deselect();
		assert_eq!(c.reconcile(&view), None);
		assert_eq!(c.selected(), None);
	}

	#[test]
	fn unmatched_focus_is_inert() {
		let data = data();
		let view = full_view(&data);
		let mut c = GraphController::from_query("focus=elsewhere");
		assert_eq!(c.reconcile(&view), None);
		assert_eq!(c.focus_target(&view), None);
		assert_eq!(c.focused(), Some("elsewhere"));
	}

	#[test]
	fn adopt_query_follows_history() {
		let mut c = GraphController::from_query("focus=a");
		assert!(!c.adopt_query("focus=a"));
		assert!(c.adopt_query("x=1"));
		assert_eq!(c.focused(), None);
		assert!(c.adopt_query("focus=b"));
		assert_eq!(c.focused(), Some("b"));
	}

	#[test]
	fn detail_groups_relationships_by_type() {
		let data = data();
		let detail = node_detail("proj-1", &data).unwrap();
		assert_eq!(detail.entity.properties["stars"], 12);
		assert_eq!(detail.outgoing_count(), 2);
		assert_eq!(detail.incoming_count(), 1);
		assert_eq!(detail.outgoing.len(), 1);
		assert_eq!(detail.outgoing[0].label, "HAS REPO");
		let targets: Vec<_> = detail.outgoing[0]
			.links
			.iter()
			.map(|l| l.to_name.as_str())
			.collect();
		assert_eq!(targets, vec!["atlas-core", "atlas-web"]);
		assert_eq!(detail.incoming[0].links[0].from_name, "Casey");
		assert_eq!(detail.incoming[0].links[0].other_key, "p-1");
		assert!(node_detail("missing", &data).is_none());
	}

	#[test]
	fn detail_uses_hidden_neighbours_too() {
		let data = data();
		let view = view_with(&data, VisibleTypeSet::all(["Project"]));
		let mut c = GraphController::new();
		c.select("proj-1", &view);
		let detail = c.detail(&view).unwrap();
		assert_eq!(detail.outgoing_count(), 2);
		assert_eq!(detail.incoming_count(), 1);
	}
}
