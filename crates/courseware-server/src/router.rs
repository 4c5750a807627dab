//! Method and path routing.
//!
//! Routes map a method and a path template to an operation ID. Templates use
//! `{name}` for a single-segment parameter. Routes are tried in registration
//! order and the first match wins. Empty segments are ignored, so `/courses/`
//! matches `/courses`.
//!
//! # Example
//!
//! ```rust
//! use courseware_server::Router;
//! use http::Method;
//!
//! let router = Router::new()
//!     .with_route(Method::GET, "/courses", "listCourses")
//!     .with_route(Method::GET, "/courses/{id}", "getCourse");
//!
//! let matched = router.match_route(&Method::GET, "/courses/7").unwrap();
//! assert_eq!(matched.operation_id(), "getCourse");
//! assert_eq!(matched.param("id"), Some("7"));
//! ```

use std::collections::HashMap;

use http::Method;

/// A matched route with its path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    operation_id: String,
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// Creates a route match.
    #[must_use]
    pub fn new(operation_id: impl Into<String>, params: HashMap<String, String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            params,
        }
    }

    /// Returns the matched operation ID.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns all path parameters.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Returns one path parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Splits the match into its parts.
    #[must_use]
    pub fn into_parts(self) -> (String, HashMap<String, String>) {
        (self.operation_id, self.params)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')) {
            Some(name) => Self::Param(name.to_string()),
            None => Self::Literal(raw.to_string()),
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    segments: Vec<Segment>,
    operation_id: String,
}

impl Route {
    fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let actual: Vec<&str> = segments(path).collect();
        if actual.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, value) in self.segments.iter().zip(actual) {
            match segment {
                Segment::Literal(expected) if expected == value => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), value.to_string());
                }
            }
        }
        Some(params)
    }
}

/// Routes requests to operation IDs.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route.
    pub fn add_route(&mut self, method: Method, pattern: &str, operation_id: impl Into<String>) {
        self.routes.push(Route {
            method,
            segments: segments(pattern).map(Segment::parse).collect(),
            operation_id: operation_id.into(),
        });
    }

    /// Registers a route, builder style.
    #[must_use]
    pub fn with_route(mut self, method: Method, pattern: &str, operation_id: impl Into<String>) -> Self {
        self.add_route(method, pattern, operation_id);
        self
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Finds the first route matching `method` and `path`.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                route
                    .matches(path)
                    .map(|params| RouteMatch::new(route.operation_id.clone(), params))
            })
    }

    /// Returns `true` if some route uses `operation_id`.
    #[must_use]
    pub fn has_operation(&self, operation_id: &str) -> bool {
        self.routes.iter().any(|r| r.operation_id == operation_id)
    }

    /// Iterates over the registered operation IDs.
    pub fn operation_ids(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.operation_id.as_str())
    }
}
