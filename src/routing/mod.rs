//! Routing module
//!
//! Static route table mapping request paths to file operations. Routes match
//! on path only; the expected method travels with the route so the dispatcher
//! can answer 405 for a known path with the wrong verb.

mod matcher;

pub use matcher::{PathParams, RoutePattern};

use hyper::Method;

/// File operations exposed over HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    Download,
    List,
    View,
}

/// A single entry of the route table
#[derive(Debug, Clone)]
pub struct Route {
    pub operation: Operation,
    pub method: Method,
    pub pattern: RoutePattern,
}

/// Outcome of resolving a path against the table
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: PathParams,
}

/// Ordered route table, first match wins
#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: vec![
                route(Operation::Upload, Method::POST, "/upload"),
                route(Operation::Download, Method::GET, "/download/{name}"),
                route(Operation::List, Method::GET, "/files"),
                route(Operation::View, Method::GET, "/file/{name}"),
            ],
        }
    }

    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|route| {
            route
                .pattern
                .match_path(path)
                .map(|params| RouteMatch { route, params })
        })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

fn route(operation: Operation, method: Method, pattern: &'static str) -> Route {
    Route {
        operation,
        method,
        pattern: RoutePattern::parse(pattern),
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
