//! Visibility filtering over entity/relationship collections.
//!
//! Nodes are filtered first and edges second, against the set of surviving
//! node keys, so an edge is never visible without both of its endpoints.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::warn;

use super::types::{Entity, GraphData, Relationship};

/// The type names currently enabled for display.
///
/// Treated as a value: every toggle returns a new set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibleTypeSet {
	types: BTreeSet<String>,
}

impl VisibleTypeSet {
	/// Every type in `universe` enabled.
	pub fn all<I, S>(universe: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			types: universe.into_iter().map(Into::into).collect(),
		}
	}

	/// Nothing enabled.
	pub fn none() -> Self {
		Self::default()
	}

	/// Whether `type_name` is enabled.
	pub fn contains(&self, type_name: &str) -> bool {
		self.types.contains(type_name)
	}

	/// No type enabled.
	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}

	/// Number of enabled types.
	pub fn len(&self) -> usize {
		self.types.len()
	}

	/// Enabled types in name order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.types.iter().map(String::as_str)
	}

	/// `type_name` flipped.
	#[must_use]
	pub fn toggled(&self, type_name: &str) -> Self {
		if self.contains(type_name) {
			self.without(type_name)
		} else {
			self.with(type_name)
		}
	}

	/// `type_name` enabled.
	#[must_use]
	pub fn with(&self, type_name: &str) -> Self {
		let mut types = self.types.clone();
		types.insert(type_name.to_string());
		Self { types }
	}

	/// `type_name` disabled.
	#[must_use]
	pub fn without(&self, type_name: &str) -> Self {
		let mut types = self.types.clone();
		types.remove(type_name);
		Self { types }
	}

	/// Enables types that were not part of `previous_universe`, leaving the
	/// user's choices for already-known types untouched.
	#[must_use]
	pub fn extended(&self, previous_universe: &[String], universe: &[String]) -> Self {
		let known: HashSet<&str> = previous_universe.iter().map(String::as_str).collect();
		let mut types = self.types.clone();
		types.extend(
			universe
				.iter()
				.filter(|t| !known.contains(t.as_str()))
				.cloned(),
		);
		Self { types }
	}
}

/// Output of [`filter`]; borrows from the input collections.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filtered<'a> {
	/// Entities of enabled types, in input order.
	pub entities: Vec<&'a Entity>,
	/// Relationships whose endpoints both survived.
	pub relationships: Vec<&'a Relationship>,
}

/// Input records with data-quality problems removed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sanitized {
	/// The records that survived.
	pub data: GraphData,
	/// Keys of dropped repeat entities.
	pub duplicate_entities: Vec<String>,
	/// Keys of dropped relationships with an unknown endpoint.
	pub dangling_relationships: Vec<String>,
}

/// Drops repeated entity keys (first wins) and relationships whose endpoint
/// is not a loaded entity.
pub fn sanitize(data: &GraphData) -> Sanitized {
	let mut seen = HashSet::new();
	let mut duplicate_entities = Vec::new();
	let mut entities = Vec::with_capacity(data.entities.len());
	for entity in &data.entities {
		if seen.insert(entity.key.as_str()) {
			entities.push(entity.clone());
		} else {
			duplicate_entities.push(entity.key.clone());
		}
	}

	let mut dangling_relationships = Vec::new();
	let mut relationships = Vec::with_capacity(data.relationships.len());
	for rel in &data.relationships {
		if seen.contains(rel.from_key.as_str()) && seen.contains(rel.to_key.as_str()) {
			relationships.push(rel.clone());
		} else {
			dangling_relationships.push(rel.key.clone());
		}
	}

	if !duplicate_entities.is_empty() {
		warn!(
			"dropped {} entities with duplicate keys: {:?}",
			duplicate_entities.len(),
			duplicate_entities
		);
	}
	if !dangling_relationships.is_empty() {
		warn!(
			"dropped {} relationships with unknown endpoints: {:?}",
			dangling_relationships.len(),
			dangling_relationships
		);
	}

	Sanitized {
		data: GraphData {
			entities,
			relationships,
		},
		duplicate_entities,
		dangling_relationships,
	}
}

/// Reduces entities to enabled types, then keeps only relationships with
/// both endpoints among the surviving entities.
pub fn filter<'a>(
	entities: &'a [Entity],
	relationships: &'a [Relationship],
	visible_types: &VisibleTypeSet,
) -> Filtered<'a> {
	filter_matching(entities, relationships, visible_types, "")
}

/// [`filter`] with an additional free-text narrowing of the node set.
///
/// An entity matches when its name or key contains `search`
/// (case-insensitive). A blank search matches everything.
pub fn filter_matching<'a>(
	entities: &'a [Entity],
	relationships: &'a [Relationship],
	visible_types: &VisibleTypeSet,
	search: &str,
) -> Filtered<'a> {
	let needle = search.trim().to_lowercase();
	let visible_entities: Vec<&Entity> = entities
		.iter()
		.filter(|e| visible_types.contains(&e.entity_type))
		.filter(|e| needle.is_empty() || matches_search(e, &needle))
		.collect();

	let visible_keys: HashSet<&str> = visible_entities.iter().map(|e| e.key.as_str()).collect();
	let visible_relationships = relationships
		.iter()
		.filter(|r| {
			visible_keys.contains(r.from_key.as_str()) && visible_keys.contains(r.to_key.as_str())
		})
		.collect();

	Filtered {
		entities: visible_entities,
		relationships: visible_relationships,
	}
}

fn matches_search(entity: &Entity, needle: &str) -> bool {
	entity.name.to_lowercase().contains(needle) || entity.key.to_lowercase().contains(needle)
}

/// Sorted, de-duplicated type names present in `entities`.
pub fn type_universe(entities: &[Entity]) -> Vec<String> {
	type_counts(entities).into_iter().map(|(t, _)| t).collect()
}

/// Entity count per type, sorted by type name.
pub fn type_counts(entities: &[Entity]) -> Vec<(String, usize)> {
	let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
	for entity in entities {
		*counts.entry(entity.entity_type.as_str()).or_default() += 1;
	}
	counts
		.into_iter()
		.map(|(t, n)| (t.to_string(), n))
		.collect()
}
