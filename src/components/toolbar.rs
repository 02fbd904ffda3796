use leptos::prelude::*;

use crate::engine::{Color, LayoutDirection};

/// One row of the type filter: a loaded type, its count and whether it is
/// currently shown.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeEntry {
	pub type_name: String,
	pub label: String,
	pub color: Color,
	pub count: usize,
	pub visible: bool,
}

#[component]
fn TypeToggle(entry: TypeEntry, on_toggle: Callback<String>) -> impl IntoView {
	let TypeEntry {
		type_name,
		label,
		color,
		count,
		visible,
	} = entry;
	let swatch = format!("background-color: {};", color.to_css());
	view! {
		<button
			class=if visible { "type-toggle active" } else { "type-toggle" }
			title=type_name.clone()
			on:click=move |_| on_toggle.run(type_name.clone())
		>
			<span class="swatch" style=swatch></span>
			<span class="type-label">{label}</span>
			<span class="type-count">{count}</span>
		</button>
	}
}

/// Filter and layout controls above the canvas.
#[component]
pub fn Toolbar(
	#[prop(into)] types: Signal<Vec<TypeEntry>>,
	#[prop(into)] on_toggle: Callback<String>,
	#[prop(into)] on_show_all: Callback<()>,
	#[prop(into)] on_hide_all: Callback<()>,
	#[prop(into)] direction: Signal<LayoutDirection>,
	#[prop(into)] on_direction: Callback<LayoutDirection>,
	#[prop(into)] search: Signal<String>,
	#[prop(into)] on_search: Callback<String>,
	/// Name of the focused entity, when focus is set.
	#[prop(into)]
	focus_label: Signal<Option<String>>,
	#[prop(into)] on_clear_focus: Callback<()>,
) -> impl IntoView {
	view! {
		<div class="graph-toolbar">
			<div class="type-filters">
				{move || {
					types
						.get()
						.into_iter()
						.map(|entry| view! { <TypeToggle entry on_toggle /> })
						.collect_view()
				}}
				<button class="link-button" on:click=move |_| on_show_all.run(())>
					"Show all"
				</button>
				<button class="link-button" on:click=move |_| on_hide_all.run(())>
					"Hide all"
				</button>
			</div>

			<label class="direction-picker">
				"Direction "
				<select
					prop:value=move || direction.get().code()
					on:change=move |ev| {
						if let Some(d) = LayoutDirection::from_code(&event_target_value(&ev)) {
							on_direction.run(d);
						}
					}
				>
					{LayoutDirection::ALL
						.iter()
						.map(|d| view! { <option value=d.code()>{d.label()}</option> })
						.collect_view()}
				</select>
			</label>

			// Focus and search are alternative ways of narrowing the view.
			{move || match focus_label.get() {
				Some(name) => {
					view! {
						<div class="focus-chip">
							<span>"Focused on " <strong>{name}</strong></span>
							<button class="link-button" on:click=move |_| on_clear_focus.run(())>
								"Clear focus"
							</button>
						</div>
					}
						.into_any()
				}
				None => {
					view! {
						<input
							class="search-input"
							type="search"
							placeholder="Search by name or key"
							prop:value=move || search.get()
							on:input=move |ev| on_search.run(event_target_value(&ev))
						/>
					}
						.into_any()
				}
			}}
		</div>
	}
}
