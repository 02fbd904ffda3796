//! Built-in graph used when no query service is configured.

use crate::engine::{Entity, GraphData, Relationship};

pub fn demo_graph() -> GraphData {
	let entities = vec![
		Entity::new("proj-1", "Project", "Atlas")
			.with_property("team", "core")
			.with_property("status", "active"),
		Entity::new("proj-2", "Project", "Beacon")
			.with_property("team", "web")
			.with_property("status", "planning"),
		Entity::new("repo-atlas-api", "Repository", "atlas-api")
			.with_property("team", "core")
			.with_property("language", "Rust"),
		Entity::new("repo-atlas-ui", "Repository", "atlas-ui")
			.with_property("team", "web")
			.with_property("language", "TypeScript"),
		Entity::new("repo-beacon", "Repository", "beacon")
			.with_property("team", "web")
			.with_property("language", "Rust"),
		Entity::new("svc-gateway", "Service", "Gateway")
			.with_property("team", "core")
			.with_property("tier", 1),
		Entity::new("svc-search", "Service", "Search")
			.with_property("team", "core")
			.with_property("tier", 2),
		Entity::new("team-core", "Team", "Core Platform").with_property("team", "core"),
		Entity::new("team-web", "Team", "Web").with_property("team", "web"),
		Entity::new("person-ana", "Person", "Ana Ortiz")
			.with_property("team", "core")
			.with_property("role", "Tech lead"),
		Entity::new("person-kim", "Person", "Kim Lee")
			.with_property("team", "web")
			.with_property("role", "Engineer"),
		Entity::new("person-sam", "Person", "Sam Reyes")
			.with_property("team", "core")
			.with_property("role", "SRE"),
		Entity::new("domain-identity", "Domain", "Identity").with_property("team", "core"),
		Entity::new("doc-runbook", "Document", "Gateway runbook").with_property("team", "core"),
		Entity::new("adr-0007", "Decision_Record", "ADR 7: event bus").with_property("team", "core"),
	];

	let relationships = vec![
		Relationship::new("r1", "proj-1", "repo-atlas-api", "HAS_REPO"),
		Relationship::new("r2", "proj-1", "repo-atlas-ui", "HAS_REPO"),
		Relationship::new("r3", "proj-2", "repo-beacon", "HAS_REPO"),
		Relationship::new("r4", "repo-atlas-api", "svc-gateway", "DEPLOYS"),
		Relationship::new("r5", "repo-atlas-api", "svc-search", "DEPLOYS"),
		Relationship::new("r6", "svc-gateway", "svc-search", "CALLS"),
		Relationship::new("r7", "repo-atlas-api", "person-ana", "OWNED_BY"),
		Relationship::new("r8", "repo-atlas-ui", "person-kim", "OWNED_BY"),
		Relationship::new("r9", "repo-beacon", "person-kim", "OWNED_BY"),
		Relationship::new("r10", "person-ana", "team-core", "MEMBER_OF"),
		Relationship::new("r11", "person-sam", "team-core", "MEMBER_OF"),
		Relationship::new("r12", "person-kim", "team-web", "MEMBER_OF"),
		Relationship::new("r13", "team-core", "proj-1", "OWNS"),
		Relationship::new("r14", "svc-gateway", "domain-identity", "PART_OF"),
		Relationship::new("r15", "doc-runbook", "svc-gateway", "DOCUMENTS"),
		Relationship::new("r16", "adr-0007", "svc-search", "AFFECTS"),
		Relationship::new("r17", "person-sam", "svc-gateway", "ON_CALL_FOR"),
		// Endpoint not in the loaded set; dropped before layout.
		Relationship::new("r18", "proj-2", "repo-archived", "HAS_REPO"),
	];

	GraphData {
		entities,
		relationships,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::sanitize;

	#[test]
	fn demo_graph_has_exactly_one_dangling_relationship() {
		let clean = sanitize(&demo_graph());
		assert_eq!(clean.dangling_relationships, vec!["r18".to_string()]);
		assert!(clean.duplicate_entities.is_empty());
	}
}
