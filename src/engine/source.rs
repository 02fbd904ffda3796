//! The external scope/query service and the fetch lifecycle around it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use thiserror::Error;

use super::types::{Entity, GraphData, Relationship, Scope};

/// Why a fetch failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FetchError {
	/// The request never got an answer.
	#[error("request failed: {0}")]
	Transport(String),
	/// Non-success HTTP status.
	#[error("query service answered HTTP {0}")]
	Status(u16),
	/// The body was not the expected JSON.
	#[error("could not decode response: {0}")]
	Decode(String),
}

/// Supplier of entities and relationships for a scope.
#[allow(async_fn_in_trait)]
pub trait GraphSource {
	/// Up to `limit` entities in `scope`.
	async fn list_entities(&self, scope: &Scope, limit: usize) -> Result<Vec<Entity>, FetchError>;

	/// Up to `limit` relationships, unscoped.
	async fn list_relationships(&self, limit: usize) -> Result<Vec<Relationship>, FetchError>;
}

/// Fetches one scope's raw records.
pub async fn load_graph<S: GraphSource>(
	source: &S,
	scope: &Scope,
	limit: usize,
) -> Result<GraphData, FetchError> {
	let entities = source.list_entities(scope, limit).await?;
	let relationships = source.list_relationships(limit).await?;
	debug!(
		"loaded {} entities, {} relationships for {:?}",
		entities.len(),
		relationships.len(),
		scope
	);
	Ok(GraphData {
		entities,
		relationships,
	})
}

/// Outcome of the latest fetch.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FetchState {
	/// Nothing requested yet.
	#[default]
	Idle,
	/// Waiting on the given scope.
	Loading(Scope),
	/// Raw records as fetched.
	Loaded(GraphData),
	/// The fetch failed.
	Failed(FetchError),
}

impl FetchState {
	/// A fetch is in flight.
	pub fn is_loading(&self) -> bool {
		matches!(self, Self::Loading(_))
	}

	/// Loaded data, if any.
	pub fn data(&self) -> Option<&GraphData> {
		match self {
			Self::Loaded(data) => Some(data),
			_ => None,
		}
	}
}

/// Identifies one issued fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Last-issued-wins ordering for overlapping fetches. Issuing a ticket
/// supersedes every earlier one; a response holding a stale ticket is
/// discarded by the caller.
#[derive(Clone, Debug, Default)]
pub struct FetchSequencer {
	latest: Arc<AtomicU64>,
}

impl FetchSequencer {
	/// Sequencer with nothing issued.
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts a fetch, superseding every earlier ticket.
	pub fn issue(&self) -> FetchTicket {
		FetchTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
	}

	/// Whether `ticket` is the latest issued.
	pub fn is_current(&self, ticket: FetchTicket) -> bool {
		self.latest.load(Ordering::SeqCst) == ticket.0
	}

	/// Hands `result` back only when `ticket` is still the latest.
	pub fn accept<T>(&self, ticket: FetchTicket, result: T) -> Option<T> {
		if self.is_current(ticket) {
			Some(result)
		} else {
			debug!("discarding superseded fetch #{}", ticket.0);
			None
		}
	}
}

/// In-memory source. Entities are scoped by a property named after the
/// scope type, e.g. scope `team=core` keeps entities whose `team`
/// property is `"core"`.
#[derive(Clone, Debug, Default)]
pub struct StaticGraphSource {
	data: GraphData,
}

impl StaticGraphSource {
	/// Source serving `data`.
	pub fn new(data: GraphData) -> Self {
		Self { data }
	}

	fn in_scope(entity: &Entity, scope: &Scope) -> bool {
		match (&scope.scope_type, &scope.scope_key) {
			(Some(kind), Some(key)) => entity
				.properties
				.get(kind)
				.and_then(|v| v.as_str())
				.is_some_and(|v| v == key),
			_ => true,
		}
	}
}

impl GraphSource for StaticGraphSource {
	async fn list_entities(&self, scope: &Scope, limit: usize) -> Result<Vec<Entity>, FetchError> {
		Ok(self
			.data
			.entities
			.iter()
			.filter(|e| Self::in_scope(e, scope))
			.take(limit)
			.cloned()
			.collect())
	}

	async fn list_relationships(&self, limit: usize) -> Result<Vec<Relationship>, FetchError> {
		Ok(self.data.relationships.iter().take(limit).cloned().collect())
	}
}

#[cfg(target_arch = "wasm32")]
pub use http::HttpGraphSource;

#[cfg(target_arch = "wasm32")]
mod http {
	use serde::de::DeserializeOwned;
	use url::form_urlencoded;
	use wasm_bindgen::JsCast;
	use wasm_bindgen_futures::JsFuture;
	use web_sys::{Request, RequestInit, RequestMode, Response};

	use super::{Entity, FetchError, GraphSource, Relationship, Scope};

	/// Query service reached over `fetch`.
	#[derive(Clone, Debug)]
	pub struct HttpGraphSource {
		base_url: String,
	}

	impl HttpGraphSource {
		/// Client for the service rooted at `base_url`.
		pub fn new(base_url: &str) -> Self {
			Self {
				base_url: base_url.trim_end_matches('/').to_string(),
			}
		}

		async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
			let url = format!("{}{}", self.base_url, path);

			let opts = RequestInit::new();
			opts.set_method("GET");
			opts.set_mode(RequestMode::Cors);

			let request = Request::new_with_str_and_init(&url, &opts)
				.map_err(|e| FetchError::Transport(format!("{e:?}")))?;
			let window = web_sys::window().ok_or(FetchError::Transport("no window".into()))?;
			let response = JsFuture::from(window.fetch_with_request(&request))
				.await
				.map_err(|e| FetchError::Transport(format!("{e:?}")))?;
			let response: Response = response
				.dyn_into()
				.map_err(|_| FetchError::Transport("not a Response".into()))?;
			if !response.ok() {
				return Err(FetchError::Status(response.status()));
			}

			let text = response
				.text()
				.map_err(|e| FetchError::Decode(format!("{e:?}")))?;
			let text = JsFuture::from(text)
				.await
				.map_err(|e| FetchError::Decode(format!("{e:?}")))?
				.as_string()
				.unwrap_or_default();
			serde_json::from_str(&text).map_err(|e| FetchError::Decode(e.to_string()))
		}
	}

	impl GraphSource for HttpGraphSource {
		async fn list_entities(&self, scope: &Scope, limit: usize) -> Result<Vec<Entity>, FetchError> {
			let mut query = form_urlencoded::Serializer::new(String::new());
			if let Some(kind) = &scope.scope_type {
				query.append_pair("scopeType", kind);
			}
			if let Some(key) = &scope.scope_key {
				query.append_pair("scopeKey", key);
			}
			query.append_pair("limit", &limit.to_string());
			self.get(&format!("/entities?{}", query.finish())).await
		}

		async fn list_relationships(&self, limit: usize) -> Result<Vec<Relationship>, FetchError> {
			self.get(&format!("/relationships?limit={limit}")).await
		}
	}
}

/// The sources the explorer can be wired to.
#[derive(Clone, Debug)]
pub enum AnySource {
	/// In-memory records.
	Static(StaticGraphSource),
	/// The query service.
	#[cfg(target_arch = "wasm32")]
	Http(HttpGraphSource),
}

impl AnySource {
	/// HTTP when a base URL is configured (browser builds only), otherwise
	/// the given fallback data.
	pub fn from_config(api_base: Option<&str>, fallback: GraphData) -> Self {
		match api_base {
			#[cfg(target_arch = "wasm32")]
			Some(base) => Self::Http(HttpGraphSource::new(base)),
			_ => Self::Static(StaticGraphSource::new(fallback)),
		}
	}
}

impl GraphSource for AnySource {
	async fn list_entities(&self, scope: &Scope, limit: usize) -> Result<Vec<Entity>, FetchError> {
		match self {
			Self::Static(s) => s.list_entities(scope, limit).await,
			#[cfg(target_arch = "wasm32")]
			Self::Http(s) => s.list_entities(scope, limit).await,
		}
	}

	async fn list_relationships(&self, limit: usize) -> Result<Vec<Relationship>, FetchError> {
		match self {
			Self::Static(s) => s.list_relationships(limit).await,
			#[cfg(target_arch = "wasm32")]
			Self::Http(s) => s.list_relationships(limit).await,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn data() -> GraphData {
		GraphData {
			entities: vec![
				Entity::new("A", "Project", "Atlas").with_property("team", "core"),
				Entity::new("B", "Repository", "atlas-core").with_property("team", "core"),
				Entity::new("C", "Person", "Casey").with_property("team", "web"),
			],
			relationships: vec![
				Relationship::new("ab", "A", "B", "HAS_REPO"),
				Relationship::new("bc", "B", "C", "OWNED_BY"),
			],
		}
	}

	#[test]
	fn later_ticket_supersedes_earlier() {
		let seq = FetchSequencer::new();
		let first = seq.issue();
		assert!(seq.is_current(first));
		let second = seq.issue();
		assert!(!seq.is_current(first));
		assert_eq!(seq.accept(first, "slow"), None);
		assert_eq!(seq.accept(second, "fresh"), Some("fresh"));
	}

	#[test]
	fn clones_share_the_sequence() {
		let seq = FetchSequencer::new();
		let ticket = seq.issue();
		seq.clone().issue();
		assert!(!seq.is_current(ticket));
	}

	#[test]
	fn static_source_scopes_entities_only() {
		let source = StaticGraphSource::new(data());
		let scope = Scope::new("team", "core");
		let loaded = pollster::block_on(load_graph(&source, &scope, 100)).unwrap();
		let keys: Vec<_> = loaded.entities.iter().map(|e| e.key.as_str()).collect();
		assert_eq!(keys, vec!["A", "B"]);
		assert_eq!(loaded.relationships.len(), 2);
	}

	#[test]
	fn limit_applies_to_both_lists() {
		let source = StaticGraphSource::new(data());
		let loaded = pollster::block_on(load_graph(&source, &Scope::default(), 1)).unwrap();
		assert_eq!(loaded.entities.len(), 1);
		assert_eq!(loaded.relationships.len(), 1);
	}

	/// Answers entities, then fails the relationship call.
	struct Unavailable {
		entities: Result<Vec<Entity>, FetchError>,
	}

	impl GraphSource for Unavailable {
		async fn list_entities(&self, _: &Scope, _: usize) -> Result<Vec<Entity>, FetchError> {
			self.entities.clone()
		}

		async fn list_relationships(&self, _: usize) -> Result<Vec<Relationship>, FetchError> {
			Err(FetchError::Status(503))
		}
	}

	#[test]
	fn source_errors_pass_through_unchanged() {
		let down = Unavailable {
			entities: Err(FetchError::Transport("connection refused".into())),
		};
		assert_eq!(
			pollster::block_on(load_graph(&down, &Scope::default(), 10)),
			Err(FetchError::Transport("connection refused".into()))
		);

		let half = Unavailable {
			entities: Ok(data().entities),
		};
		let result = pollster::block_on(load_graph(&half, &Scope::default(), 10));
		assert_eq!(result, Err(FetchError::Status(503)));
		assert_eq!(
			FetchState::Failed(FetchError::Status(503)).data(),
			None
		);
	}

	#[test]
	fn fetch_state_accessors() {
		assert!(FetchState::Loading(Scope::default()).is_loading());
		assert_eq!(FetchState::Idle.data(), None);
		let loaded = FetchState::Loaded(data());
		assert_eq!(loaded.data().map(|d| d.entities.len()), Some(3));
		assert_eq!(
			FetchError::Status(503).to_string(),
			"query service answered HTTP 503"
		);
	}
}
