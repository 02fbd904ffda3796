//! Shareable location parameters: the focused entity and the fetch scope.

use url::form_urlencoded;

use super::types::Scope;

/// Query parameter carrying the focused entity key.
pub const FOCUS_PARAM: &str = "focus";
/// Query parameter carrying the scope type.
pub const SCOPE_TYPE_PARAM: &str = "scopeType";
/// Query parameter carrying the scope key.
pub const SCOPE_KEY_PARAM: &str = "scopeKey";

fn pairs(query: &str) -> impl Iterator<Item = (String, String)> + '_ {
	form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
		.map(|(k, v)| (k.into_owned(), v.into_owned()))
}

fn param(query: &str, name: &str) -> Option<String> {
	pairs(query)
		.find(|(k, _)| k == name)
		.map(|(_, v)| v)
		.filter(|v| !v.is_empty())
}

/// Focus key in `query`; an empty value counts as absent.
pub fn focus_from_query(query: &str) -> Option<String> {
	param(query, FOCUS_PARAM)
}

/// Fetch scope named by `query`.
pub fn scope_from_query(query: &str) -> Scope {
	Scope {
		scope_type: param(query, SCOPE_TYPE_PARAM),
		scope_key: param(query, SCOPE_KEY_PARAM),
	}
}

/// Rewrites `query` so that `focus` is the only focus parameter, or removes
/// it when `focus` is `None`. Other parameters keep their order.
pub fn with_focus(query: &str, focus: Option<&str>) -> String {
	let mut out = form_urlencoded::Serializer::new(String::new());
	for (k, v) in pairs(query).filter(|(k, _)| k != FOCUS_PARAM) {
		out.append_pair(&k, &v);
	}
	if let Some(key) = focus {
		out.append_pair(FOCUS_PARAM, key);
	}
	out.finish()
}

/// Joins a path and a query string, omitting an empty `?`.
pub fn href(path: &str, query: &str) -> String {
	if query.is_empty() {
		path.to_string()
	} else {
		format!("{path}?{query}")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn focus_round_trip() {
		let query = with_focus("", Some("proj-1"));
		assert_eq!(query, "focus=proj-1");
		assert_eq!(focus_from_query(&query).as_deref(), Some("proj-1"));
		assert_eq!(with_focus(&query, None), "");
	}

	#[test]
	fn other_params_survive() {
		let query = with_focus("?scopeType=team&focus=old&scopeKey=core", Some("new key"));
		assert_eq!(query, "scopeType=team&scopeKey=core&focus=new+key");
		assert_eq!(focus_from_query(&query).as_deref(), Some("new key"));
		assert_eq!(scope_from_query(&query), Scope::new("team", "core"));
	}

	#[test]
	fn empty_values_are_absent() {
		assert_eq!(focus_from_query("focus="), None);
		assert!(scope_from_query("scopeType=&x=1").is_unscoped());
	}

	#[test]
	fn href_skips_empty_query() {
		assert_eq!(href("/", ""), "/");
		assert_eq!(href("/graph", "focus=a"), "/graph?focus=a");
	}
}
