//! Path pattern matcher
//!
//! Route definitions are compiled once into anchored regular expressions:
//! every `:name` token becomes a `([^/]+)` capture group and the literal
//! text around it is escaped. Lookups walk the definitions depth-first in
//! declaration order and the first route whose pattern matches wins.
//!
//! Successful lookups are memoized by raw path. The memo has no capacity
//! bound and lives as long as the matcher, which is fine because the set
//! of admin paths a dashboard hits is small.

use moka::sync::Cache;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

use crate::models::UserRole;

/// Matches `:name` parameter tokens inside a pattern
static PARAM_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("parameter token regex"));

/// A path pattern, the roles allowed on it and its nested routes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition {
    /// Pattern such as `/events/:id`; children are relative to the parent
    pub path: String,
    /// Permitted roles. Empty on a child means "same as parent".
    pub roles: Vec<UserRole>,
    pub children: Vec<RouteDefinition>,
}

impl RouteDefinition {
    pub fn new(path: impl Into<String>, roles: impl IntoIterator<Item = UserRole>) -> Self {
        Self {
            path: path.into(),
            roles: roles.into_iter().collect(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<RouteDefinition>) -> Self {
        self.children = children;
        self
    }
}

/// Result of matching a path against the route table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    pub matched: bool,
    pub params: HashMap<String, String>,
    pub roles: Vec<UserRole>,
}

impl RouteMatch {
    /// The result for a path no route accepts
    pub fn unmatched() -> Self {
        Self {
            matched: false,
            params: HashMap::new(),
            roles: Vec::new(),
        }
    }

    /// Whether `role` may access the matched route
    pub fn permits(&self, role: UserRole) -> bool {
        self.matched && self.roles.contains(&role)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Errors raised while compiling route definitions
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Route pattern '{0}' must start with '/'")]
    MissingLeadingSlash(String),

    #[error("Route pattern '{pattern}' declares parameter '{name}' more than once")]
    DuplicateParam { pattern: String, name: String },

    #[error("Route pattern '{pattern}' is not a valid expression: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

struct CompiledRoute {
    pattern: String,
    regex: Regex,
    param_names: Vec<String>,
    roles: Vec<UserRole>,
    children: Vec<CompiledRoute>,
}

impl CompiledRoute {
    fn compile(
        definition: &RouteDefinition,
        parent_pattern: &str,
        parent_roles: &[UserRole],
    ) -> Result<Self, RouteError> {
        if !definition.path.is_empty() && !definition.path.starts_with('/') {
            return Err(RouteError::MissingLeadingSlash(definition.path.clone()));
        }

        let pattern = join_patterns(parent_pattern, &definition.path);
        let (regex, param_names) = compile_pattern(&pattern)?;
        let roles = if definition.roles.is_empty() {
            parent_roles.to_vec()
        } else {
            definition.roles.clone()
        };

        let children = definition
            .children
            .iter()
            .map(|child| CompiledRoute::compile(child, &pattern, &roles))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            pattern,
            regex,
            param_names,
            roles,
            children,
        })
    }

    fn try_match(&self, path: &str) -> Option<RouteMatch> {
        let captures = self.regex.captures(path)?;
        let params = self
            .param_names
            .iter()
            .enumerate()
            .filter_map(|(idx, name)| {
                captures
                    .get(idx + 1)
                    .map(|value| (name.clone(), decode_segment(value.as_str())))
            })
            .collect();

        Some(RouteMatch {
            matched: true,
            params,
            roles: self.roles.clone(),
        })
    }
}

/// Role-aware route table with a per-path result cache
pub struct RouteMatcher {
    routes: Vec<CompiledRoute>,
    cache: Cache<String, RouteMatch>,
}

impl std::fmt::Debug for RouteMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMatcher")
            .field("patterns", &self.patterns())
            .field("cached_paths", &self.cache.entry_count())
            .finish()
    }
}

impl RouteMatcher {
    /// Compile `definitions`. Fails on the first invalid pattern.
    pub fn new(definitions: &[RouteDefinition]) -> Result<Self, RouteError> {
        let routes = definitions
            .iter()
            .map(|definition| CompiledRoute::compile(definition, "", &[]))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            routes,
            cache: Cache::builder().build(),
        })
    }

    /// Match `path`, returning the first route in declaration order
    pub fn match_path(&self, path: &str) -> RouteMatch {
        if let Some(hit) = self.cache.get(path) {
            return hit;
        }

        match find_match(&self.routes, path) {
            Some(found) => {
                self.cache.insert(path.to_string(), found.clone());
                found
            }
            None => RouteMatch::unmatched(),
        }
    }

    /// Whether a result for `path` is memoized
    pub fn is_cached(&self, path: &str) -> bool {
        self.cache.contains_key(path)
    }

    /// Every compiled pattern, depth-first
    pub fn patterns(&self) -> Vec<String> {
        fn collect(routes: &[CompiledRoute], out: &mut Vec<String>) {
            for route in routes {
                out.push(route.pattern.clone());
                collect(&route.children, out);
            }
        }

        let mut out = Vec::new();
        collect(&self.routes, &mut out);
        out
    }
}

fn find_match(routes: &[CompiledRoute], path: &str) -> Option<RouteMatch> {
    for route in routes {
        if let Some(found) = route.try_match(path) {
            return Some(found);
        }
        if let Some(found) = find_match(&route.children, path) {
            return Some(found);
        }
    }
    None
}

/// Append `child` to `parent`, avoiding a doubled slash at the seam
fn join_patterns(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        return child.to_string();
    }
    if child.is_empty() || child == "/" {
        return parent.to_string();
    }
    format!("{}{}", parent.trim_end_matches('/'), child)
}

/// Turn a pattern into an anchored regex plus its parameter names, in
/// capture-group order. A single trailing slash on the path is tolerated.
fn compile_pattern(pattern: &str) -> Result<(Regex, Vec<String>), RouteError> {
    let mut expr = String::from("^");
    let mut names: Vec<String> = Vec::new();
    let mut last = 0;

    for caps in PARAM_TOKEN.captures_iter(pattern) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let name = name.as_str();
        if names.iter().any(|existing| existing == name) {
            return Err(RouteError::DuplicateParam {
                pattern: pattern.to_string(),
                name: name.to_string(),
            });
        }

        expr.push_str(&regex::escape(&pattern[last..whole.start()]));
        expr.push_str("([^/]+)");
        names.push(name.to_string());
        last = whole.end();
    }

    let tail = &pattern[last..];
    expr.push_str(&regex::escape(tail.trim_end_matches('/')));
    expr.push_str("/?$");

    let regex = Regex::new(&expr).map_err(|source| RouteError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    Ok((regex, names))
}

/// Percent-decode a captured segment, keeping it raw if it is not UTF-8
fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use UserRole::*;

    fn sample_routes() -> Vec<RouteDefinition> {
        vec![
            RouteDefinition::new("/events", [Admin, Editor]),
            RouteDefinition::new("/events/:id", [Admin, Editor]),
            RouteDefinition::new("/events/:id/sessions/:session_id", [Admin]),
            RouteDefinition::new("/admin", [Admin, Editor, Author]).with_children(vec![
                RouteDefinition::new("/posts/:id", [Author]),
                RouteDefinition::new("/stats", []),
            ]),
        ]
    }

    fn matcher() -> RouteMatcher {
        RouteMatcher::new(&sample_routes()).unwrap()
    }

    #[test]
    fn test_extracts_named_params() {
        let result = matcher().match_path("/events/42/sessions/7");

        assert!(result.matched);
        assert_eq!(result.param("id"), Some("42"));
        assert_eq!(result.param("session_id"), Some("7"));
        assert_eq!(result.roles, vec![Admin]);
    }

    #[test]
    fn test_static_pattern_has_no_params() {
        let result = matcher().match_path("/events");
        assert!(result.matched);
        assert!(result.params.is_empty());
        assert_eq!(result.roles, vec![Admin, Editor]);
    }

    #[test]
    fn test_unmatched_path() {
        let m = matcher();
        let result = m.match_path("/unknown/place");

        assert_eq!(result, RouteMatch::unmatched());
        assert!(!result.matched);
        assert!(result.params.is_empty());
        assert!(result.roles.is_empty());
        assert!(!m.is_cached("/unknown/place"));
    }

    #[test]
    fn test_patterns_are_anchored() {
        let m = matcher();
        assert!(!m.match_path("/prefix/events").matched);
        assert!(!m.match_path("/events/1/extra").matched);
        assert!(!m.match_path("/events/1/sessions").matched);
    }

    #[test]
    fn test_trailing_slash_tolerated() {
        let result = matcher().match_path("/events/9/");
        assert!(result.matched);
        assert_eq!(result.param("id"), Some("9"));
    }

    #[test]
    fn test_children_join_parent_and_inherit_roles() {
        let m = matcher();

        let child = m.match_path("/admin/posts/3");
        assert!(child.matched);
        assert_eq!(child.roles, vec![Author]);
        assert_eq!(child.param("id"), Some("3"));

        let inherited = m.match_path("/admin/stats");
        assert_eq!(inherited.roles, vec![Admin, Editor, Author]);
    }

    #[test]
    fn test_first_route_in_list_order_wins() {
        let m = RouteMatcher::new(&[
            RouteDefinition::new("/posts/:slug", [Editor]),
            RouteDefinition::new("/posts/:id", [Admin]),
        ])
        .unwrap();

        let result = m.match_path("/posts/hello");
        assert_eq!(result.roles, vec![Editor]);
        assert_eq!(result.param("slug"), Some("hello"));
        assert!(result.param("id").is_none());
    }

    #[test]
    fn test_parent_is_tried_before_its_children() {
        let m = RouteMatcher::new(&[
            RouteDefinition::new("/a/:any", [Admin])
                .with_children(vec![RouteDefinition::new("", [Editor])]),
        ])
        .unwrap();

        assert_eq!(m.match_path("/a/x").roles, vec![Admin]);
    }

    #[test]
    fn test_literal_text_is_escaped() {
        let m = RouteMatcher::new(&[RouteDefinition::new("/files/v1.0/:name", [Admin])]).unwrap();

        assert!(m.match_path("/files/v1.0/report").matched);
        assert!(!m.match_path("/files/v1x0/report").matched);
    }

    #[test]
    fn test_params_are_percent_decoded() {
        let m = RouteMatcher::new(&[RouteDefinition::new("/tags/:name", [Admin])]).unwrap();
        assert_eq!(m.match_path("/tags/open%20house").param("name"), Some("open house"));
    }

    #[test]
    fn test_repeated_lookup_is_cached_and_identical() {
        let m = matcher();
        assert!(!m.is_cached("/events/5"));

        let first = m.match_path("/events/5");
        assert!(m.is_cached("/events/5"));
        let second = m.match_path("/events/5");

        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_param_rejected() {
        let err = RouteMatcher::new(&[RouteDefinition::new("/a/:id/b/:id", [Admin])]).unwrap_err();
        assert!(matches!(err, RouteError::DuplicateParam { ref name, .. } if name == "id"));
    }

    #[test]
    fn test_duplicate_param_across_parent_and_child_rejected() {
        let err = RouteMatcher::new(&[RouteDefinition::new("/events/:id", [Admin])
            .with_children(vec![RouteDefinition::new("/photos/:id", [])])])
        .unwrap_err();
        assert!(matches!(err, RouteError::DuplicateParam { .. }));
    }

    #[test]
    fn test_relative_pattern_rejected() {
        let err = RouteMatcher::new(&[RouteDefinition::new("events", [Admin])]).unwrap_err();
        assert!(matches!(err, RouteError::MissingLeadingSlash(_)));
    }

    #[test]
    fn test_patterns_listed_depth_first() {
        assert_eq!(
            matcher().patterns(),
            vec![
                "/events",
                "/events/:id",
                "/events/:id/sessions/:session_id",
                "/admin",
                "/admin/posts/:id",
                "/admin/stats",
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_segments_round_trip_into_params(
            a in "[a-z0-9_-]{1,12}",
            b in "[A-Za-z0-9_-]{1,12}",
        ) {
            let m = RouteMatcher::new(&[
                RouteDefinition::new("/units/:unit/members/:member", [Editor]),
            ]).unwrap();

            let path = format!("/units/{}/members/{}", a, b);
            let result = m.match_path(&path);

            prop_assert!(result.matched);
            prop_assert_eq!(result.param("unit"), Some(a.as_str()));
            prop_assert_eq!(result.param("member"), Some(b.as_str()));
            prop_assert_eq!(m.match_path(&path), result);
        }

        #[test]
        fn prop_paths_outside_table_never_match(segment in "[a-z]{1,10}") {
            prop_assume!(segment != "events" && segment != "admin");
            let m = matcher();
            let result = m.match_path(&format!("/{}", segment));
            prop_assert_eq!(result, RouteMatch::unmatched());
        }
    }
}
