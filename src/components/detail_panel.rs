use leptos::prelude::*;

use crate::engine::NodeDetail;
use crate::engine::selection::RelationshipGroup;

fn display_value(value: &serde_json::Value) -> String {
	match value {
		serde_json::Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

#[component]
fn RelationshipList(
	title: &'static str,
	count: usize,
	groups: Vec<RelationshipGroup>,
	on_select: Callback<String>,
) -> impl IntoView {
	view! {
		<section class="detail-relationships">
			<h4>{format!("{} ({})", title, count)}</h4>
			{groups
				.into_iter()
				.map(|group| {
					view! {
						<div class="relationship-group">
							<h5 title=group.relationship_type>
								{format!("{} ({})", group.label, group.links.len())}
							</h5>
							<ul>
								{group
									.links
									.into_iter()
									.map(|link| {
										let other = link.other_key.clone();
										view! {
											<li>
												<button
													class="link-button"
													on:click=move |_| on_select.run(other.clone())
												>
													{format!("{} → {}", link.from_name, link.to_name)}
												</button>
											</li>
										}
									})
									.collect_view()}
							</ul>
						</div>
					}
				})
				.collect_view()}
		</section>
	}
}

/// Side panel describing the selected entity.
#[component]
pub fn DetailPanel(
	#[prop(into)] detail: Signal<Option<NodeDetail>>,
	#[prop(into)] focused: Signal<Option<String>>,
	#[prop(into)] on_focus: Callback<String>,
	#[prop(into)] on_select: Callback<String>,
	#[prop(into)] on_close: Callback<()>,
) -> impl IntoView {
	move || {
		detail.get().map(|detail| {
			let (outgoing_count, incoming_count) = (detail.outgoing_count(), detail.incoming_count());
			let NodeDetail {
				entity,
				outgoing,
				incoming,
			} = detail;
			let key = entity.key.clone();
			let is_focused = focused.get().as_deref() == Some(entity.key.as_str());

			view! {
				<aside class="detail-panel">
					<header>
						<span class="detail-type">{entity.entity_type.clone()}</span>
						<button class="close-button" on:click=move |_| on_close.run(())>
							"×"
						</button>
						<h3>{entity.name.clone()}</h3>
						<code class="detail-key">{entity.key.clone()}</code>
					</header>

					<dl class="detail-properties">
						{entity
							.properties
							.iter()
							.map(|(name, value)| {
								view! {
									<dt>{name.clone()}</dt>
									<dd>{display_value(value)}</dd>
								}
							})
							.collect_view()}
					</dl>

					<RelationshipList title="Outgoing" count=outgoing_count groups=outgoing on_select />
					<RelationshipList title="Incoming" count=incoming_count groups=incoming on_select />

					<footer>
						<button
							class="primary-button"
							disabled=is_focused
							on:click=move |_| on_focus.run(key.clone())
						>
							{if is_focused { "Focused" } else { "Focus" }}
						</button>
					</footer>
				</aside>
			}
		})
	}
}
