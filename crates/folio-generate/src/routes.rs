//! Application routes that become static pages.

use std::path::Path;

/// How an endpoint produces its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndpointKind {
    /// Request handler (page, API, feed...).
    #[default]
    Handler,
    /// Static file middleware.
    StaticFiles,
}

/// An endpoint registered with the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Route template (e.g., `/blog/{slug}`).
    pub path: String,
    /// Accepted HTTP methods; empty means any.
    pub methods: Vec<String>,
    /// Endpoint kind.
    pub kind: EndpointKind,
}

impl Endpoint {
    /// Create a handler endpoint accepting GET.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            methods: vec!["GET".to_owned()],
            kind: EndpointKind::Handler,
        }
    }
}

/// Source of application routes.
///
/// `declared_routes` are routes the application declares up front (e.g.,
/// page components); `endpoints` are everything registered with the router.
pub trait RouteProvider: Send + Sync {
    /// Declared route templates.
    fn declared_routes(&self) -> Vec<String>;

    /// Registered endpoints.
    fn endpoints(&self) -> Vec<Endpoint> {
        Vec::new()
    }
}

/// Fixed route list, typically read from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticRouteProvider {
    routes: Vec<String>,
    endpoints: Vec<Endpoint>,
}

impl StaticRouteProvider {
    /// Create a provider declaring `routes`.
    #[must_use]
    pub fn new(routes: Vec<String>) -> Self {
        Self {
            routes,
            endpoints: Vec::new(),
        }
    }

    /// Also report `endpoints` as registered.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Vec<Endpoint>) -> Self {
        self.endpoints = endpoints;
        self
    }
}

impl RouteProvider for StaticRouteProvider {
    fn declared_routes(&self) -> Vec<String> {
        self.routes.clone()
    }

    fn endpoints(&self) -> Vec<Endpoint> {
        self.endpoints.clone()
    }
}

/// Check that a route template has no variable segments.
///
/// `{id}`, `:id` and `*rest` segments are variable.
#[must_use]
pub fn is_parameterless(route: &str) -> bool {
    route
        .split('/')
        .all(|segment| !(segment.contains(['{', '}']) || segment.starts_with([':', '*'])))
}

const INTERNAL_PREFIXES: [&str; 3] = ["/_framework", "/_blazor", "/_content"];

/// Check whether an endpoint can be generated as a static page.
///
/// Requires a parameterless GET handler outside the framework's internal
/// paths (any first segment starting with `_`).
#[must_use]
pub fn is_generatable_endpoint(endpoint: &Endpoint) -> bool {
    let path = endpoint.path.as_str();
    let answers_get = endpoint.methods.is_empty()
        || endpoint
            .methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case("GET"));
    let first_segment = path.trim_start_matches('/').split('/').next().unwrap_or("");

    endpoint.kind == EndpointKind::Handler
        && answers_get
        && is_parameterless(path)
        && !INTERNAL_PREFIXES.iter().any(|p| path.starts_with(p))
        && !first_segment.starts_with('_')
}

/// Map a route to its output file.
///
/// A route whose last segment has an extension is written as-is; any other
/// route becomes a directory holding `index_page`.
///
/// # Examples
///
/// ```
/// use folio_generate::output_file_for_route;
///
/// assert_eq!(output_file_for_route("/", "index.html"), "index.html");
/// assert_eq!(output_file_for_route("/about", "index.html"), "about/index.html");
/// assert_eq!(output_file_for_route("/feed.xml", "index.html"), "feed.xml");
/// ```
#[must_use]
pub fn output_file_for_route(route: &str, index_page: &str) -> String {
    let trimmed = route.trim_matches('/');
    if trimmed.is_empty() {
        return index_page.to_owned();
    }

    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    if Path::new(last).extension().is_some() {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/{index_page}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_parameterless() {
        assert!(is_parameterless("/"));
        assert!(is_parameterless("/about/team"));
        assert!(!is_parameterless("/blog/{slug}"));
        assert!(!is_parameterless("/blog/{*rest}"));
        assert!(!is_parameterless("/users/:id"));
        assert!(!is_parameterless("/files/*path"));
    }

    #[test]
    fn test_generatable_endpoint() {
        assert!(is_generatable_endpoint(&Endpoint::get("/feed.xml")));
        assert!(is_generatable_endpoint(&Endpoint {
            path: "/sitemap.xml".to_owned(),
            methods: Vec::new(),
            kind: EndpointKind::Handler,
        }));
    }

    #[test]
    fn test_endpoint_exclusions() {
        assert!(!is_generatable_endpoint(&Endpoint::get("/_framework/blazor.js")));
        assert!(!is_generatable_endpoint(&Endpoint::get("/_blazor")));
        assert!(!is_generatable_endpoint(&Endpoint::get("/_content/lib/site.css")));
        assert!(!is_generatable_endpoint(&Endpoint::get("/_health")));
        assert!(!is_generatable_endpoint(&Endpoint::get("/api/{id}")));
        assert!(!is_generatable_endpoint(&Endpoint {
            path: "/api/posts".to_owned(),
            methods: vec!["POST".to_owned()],
            kind: EndpointKind::Handler,
        }));
        assert!(!is_generatable_endpoint(&Endpoint {
            path: "/favicon.ico".to_owned(),
            methods: vec!["GET".to_owned()],
            kind: EndpointKind::StaticFiles,
        }));
    }

    #[test]
    fn test_output_file_for_route() {
        assert_eq!(output_file_for_route("", "index.html"), "index.html");
        assert_eq!(output_file_for_route("/", "index.html"), "index.html");
        assert_eq!(output_file_for_route("/blog/", "index.html"), "blog/index.html");
        assert_eq!(output_file_for_route("/docs/v1.2/intro", "index.html"), "docs/v1.2/intro/index.html");
        assert_eq!(output_file_for_route("/robots.txt", "index.html"), "robots.txt");
        assert_eq!(output_file_for_route("/about", "default.htm"), "about/default.htm");
    }

    #[test]
    fn test_static_route_provider() {
        let provider = StaticRouteProvider::new(vec!["/".to_owned(), "/about".to_owned()])
            .with_endpoints(vec![Endpoint::get("/feed.xml")]);

        assert_eq!(provider.declared_routes(), vec!["/", "/about"]);
        assert_eq!(provider.endpoints(), vec![Endpoint::get("/feed.xml")]);
    }
}
