use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::{use_location, use_navigate};
use log::warn;

use super::sample_data;
use crate::components::detail_panel::DetailPanel;
use crate::components::graph_canvas::{GraphCanvas, Scene};
use crate::components::toolbar::{Toolbar, TypeEntry};
use crate::engine::adapter::humanize;
use crate::engine::location;
use crate::engine::{
	AnySource, ControllerEvent, Entity, FetchSequencer, FetchState, GraphConfig, GraphController,
	GraphPipeline, GraphView, LayoutDirection, Scope, SurfaceEvent, ViewSettings, VisibleTypeSet, load_graph,
	type_counts, type_universe,
};

/// Applies one controller transition, notifying subscribers only when it
/// produced an event.
fn step(
	controller: RwSignal<GraphController>,
	f: impl FnOnce(&mut GraphController) -> Option<ControllerEvent>,
) -> Option<ControllerEvent> {
	controller
		.try_maybe_update(|c| {
			let event = f(c);
			(event.is_some(), event)
		})
		.flatten()
}

/// Scoped knowledge-graph explorer: type filters, layered canvas and the
/// selection detail panel. Focus is kept in the `focus` query parameter.
#[component]
pub fn Explorer(
	/// Fired with the newly selected entity, or `None` on deselection.
	#[prop(optional)]
	on_entity_select: Option<Callback<Option<Entity>>>,
	/// Fired with the newly focused entity key.
	#[prop(optional)]
	on_focus_entity: Option<Callback<Option<String>>>,
) -> impl IntoView {
	let config = use_context::<GraphConfig>().unwrap_or_default();
	let (pathname, search) = {
		let current = use_location();
		(current.pathname, current.search)
	};
	let navigate = use_navigate();

	let pipeline = StoredValue::new(GraphPipeline::new(&config));
	let source = StoredValue::new(AnySource::from_config(
		config.api_base.as_deref(),
		sample_data::demo_graph(),
	));
	let sequencer = StoredValue::new(FetchSequencer::new());
	let fetch_limit = config.fetch_limit;
	let node_size = config.node_size;

	let fetch_state = RwSignal::new(FetchState::Idle);
	let controller = RwSignal::new(GraphController::from_query(&search.get_untracked()));
	let visible = RwSignal::new(VisibleTypeSet::none());
	let direction = RwSignal::new(config.direction);
	let pending_href = RwSignal::new(None::<String>);

	// Fetch lifecycle
	let load = move |scope: Scope| {
		let ticket = sequencer.with_value(|s| s.issue());
		fetch_state.set(FetchState::Loading(scope.clone()));
		let (source, sequencer) = (source.get_value(), sequencer.get_value());
		spawn_local(async move {
			let result = load_graph(&source, &scope, fetch_limit).await;
			let Some(result) = sequencer.accept(ticket, result) else {
				return;
			};
			match result {
				Ok(data) => fetch_state.set(FetchState::Loaded(data)),
				Err(err) => {
					warn!("loading {:?} failed: {}", scope, err);
					fetch_state.set(FetchState::Failed(err));
				}
			}
		});
	};
	let scope = Memo::new(move |_| location::scope_from_query(&search.get()));
	Effect::new(move |_| load(scope.get()));

	// Types present in the last loaded data; new ones start out visible.
	let universe = Memo::new(move |prev: Option<&Vec<String>>| {
		fetch_state.with(|s| match s.data() {
			Some(data) => type_universe(&data.entities),
			None => prev.cloned().unwrap_or_default(),
		})
	});
	Effect::new(move |prev: Option<Vec<String>>| {
		let next = universe.get();
		let prev = prev.unwrap_or_default();
		if prev != next {
			visible.update(|v| *v = v.extended(&prev, &next));
		}
		next
	});

	let settings = Memo::new(move |_| ViewSettings {
		visible_types: visible.get(),
		search: controller.with(|c| c.search().to_string()),
		direction: direction.get(),
	});
	let graph_view = Memo::new(move |_| {
		let settings = settings.get();
		fetch_state.with(|s| pipeline.with_value(|p| p.view_for(s, &settings)))
	});

	// Controller notifications
	let dispatch = move |event: ControllerEvent| match event {
		ControllerEvent::EntitySelected(entity) => {
			if let Some(cb) = on_entity_select {
				cb.run(entity);
			}
		}
		ControllerEvent::FocusChanged { key, query } => {
			pending_href.set(Some(location::href(&pathname.get_untracked(), &query)));
			if let Some(cb) = on_focus_entity {
				cb.run(key);
			}
		}
	};
	Effect::new(move |_| {
		if let Some(href) = pending_href.get() {
			navigate(&href, Default::default());
		}
	});

	// Reload or history navigation may change focus under us.
	Effect::new(move |_| {
		let query = search.get();
		controller.maybe_update(|c| c.adopt_query(&query));
	});

	let focused = Memo::new(move |_| controller.with(|c| c.focused().map(str::to_string)));
	Effect::new(move |_| {
		focused.track();
		// A failed fetch still reconciles, against an empty view.
		if fetch_state.with(FetchState::is_loading) {
			return;
		}
		let view = graph_view.get();
		if let Some(event) = step(controller, |c| c.reconcile(&view)) {
			dispatch(event);
		}
	});

	let on_surface_event = Callback::new(move |event: SurfaceEvent| {
		let view = graph_view.get_untracked();
		if let Some(event) = step(controller, |c| c.handle(event, &view)) {
			dispatch(event);
		}
	});
	let set_focus = Callback::new(move |key: Option<String>| {
		let query = search.get_untracked();
		if let Some(event) = step(controller, |c| c.focus(key.as_deref(), &query)) {
			dispatch(event);
		}
	});
	let select_key = Callback::new(move |key: String| {
		let view = graph_view.get_untracked();
		if let Some(event) = step(controller, |c| c.select(&key, &view)) {
			dispatch(event);
		}
	});
	let close_detail = Callback::new(move |_: ()| {
		if let Some(event) = step(controller, GraphController::deselect) {
			dispatch(event);
		}
	});

	// Derived view state
	let scene = Memo::new(move |_| {
		let (selected, focused) = controller.with(|c| {
			(
				c.selected().map(str::to_string),
				c.focused().map(str::to_string),
			)
		});
		graph_view.with(|v| Scene {
			nodes: v.nodes.clone(),
			edges: v.edges.clone(),
			width: v.width,
			height: v.height,
			node_size,
			selected,
			focused,
		})
	});
	let type_entries = Memo::new(move |_| {
		let visible = visible.get();
		graph_view.with(|v| {
			type_counts(&v.data.entities)
				.into_iter()
				.map(|(type_name, count)| TypeEntry {
					label: humanize(&type_name),
					color: pipeline.with_value(|p| p.adapter().colors().resolve(&type_name)),
					visible: visible.contains(&type_name),
					type_name,
					count,
				})
				.collect::<Vec<_>>()
		})
	});
	let detail = Memo::new(move |_| graph_view.with(|v| controller.with(|c| c.detail(v))));
	let focus_label = Memo::new(move |_| {
		let key = focused.get()?;
		Some(graph_view.with(|v| v.entity(&key).map_or(key.clone(), |e| e.name.clone())))
	});
	let search_text = Signal::derive(move || controller.with(|c| c.search().to_string()));

	let notice = move || -> Option<AnyView> {
		let state = fetch_state.get();
		match state {
			FetchState::Idle => None,
			FetchState::Loading(_) => Some(view! { <div class="graph-notice">"Loading graph…"</div> }.into_any()),
			FetchState::Failed(err) => Some(
				view! {
					<div class="graph-notice error">
						<p>{format!("Could not load the graph: {err}")}</p>
						<button class="primary-button" on:click=move |_| load(scope.get_untracked())>
							"Retry"
						</button>
					</div>
				}
				.into_any(),
			),
			FetchState::Loaded(data) => graph_view.with(|v: &GraphView| {
				if data.entities.is_empty() {
					Some(view! { <div class="graph-notice">"No entities in this scope."</div> }.into_any())
				} else if v.is_empty() {
					Some(
						view! { <div class="graph-notice">"Every entity is hidden by the current filters."</div> }
							.into_any(),
					)
				} else if v.over_soft_cap {
					Some(
						view! {
							<div class="graph-notice warning">
								{format!(
									"Showing {} nodes; large graphs may be slow. Hide some types to narrow the view.",
									v.nodes.len(),
								)}
							</div>
						}
						.into_any(),
					)
				} else if let Some(key) = focused.get().filter(|k| v.entity(k).is_none()) {
					Some(
						view! {
							<div class="graph-notice warning">
								{format!("Focused entity \"{key}\" is not in the loaded scope.")}
							</div>
						}
						.into_any(),
					)
				} else {
					None
				}
			}),
		}
	};

	view! {
		<div class="explorer">
			<Toolbar
				types=type_entries
				on_toggle=Callback::new(move |type_name: String| {
					visible.update(|v| *v = v.toggled(&type_name));
				})
				on_show_all=Callback::new(move |_: ()| visible.set(VisibleTypeSet::all(universe.get_untracked())))
				on_hide_all=Callback::new(move |_: ()| visible.set(VisibleTypeSet::none()))
				direction=direction
				on_direction=Callback::new(move |d: LayoutDirection| direction.set(d))
				search=search_text
				on_search=Callback::new(move |text: String| controller.update(|c| c.set_search(&text)))
				focus_label=focus_label
				on_clear_focus=Callback::new(move |_: ()| set_focus.run(None))
			/>
			<div class="explorer-body">
				<div class="canvas-host">
					<GraphCanvas scene=scene on_event=on_surface_event />
					{notice}
				</div>
				<DetailPanel
					detail=detail
					focused=focused
					on_focus=Callback::new(move |key: String| set_focus.run(Some(key)))
					on_select=select_key
					on_close=close_detail
				/>
			</div>
		</div>
	}
}
