//! Route lookup.
//!
//! Routes are compiled once from configuration and never change. They are
//! checked in descending priority order, configuration order breaking ties;
//! the first match wins.

use axum::http::request::Parts;

use crate::config::FunctionConfig;
use crate::routing::matcher::{AndMatcher, HostMatcher, Matcher, PathPrefixMatcher};

#[derive(Debug)]
struct Route<T> {
    priority: u32,
    matcher: AndMatcher,
    target: T,
}

/// Maps requests to per-function targets.
#[derive(Debug)]
pub struct Router<T> {
    routes: Vec<Route<T>>,
}

impl<T> Router<T> {
    /// Compile routes from `(function config, target)` pairs.
    pub fn from_routes<'a>(routes: impl IntoIterator<Item = (&'a FunctionConfig, T)>) -> Self {
        let mut routes: Vec<Route<T>> = routes
            .into_iter()
            .map(|(config, target)| {
                let mut matchers: Vec<Box<dyn Matcher>> =
                    vec![Box::new(PathPrefixMatcher::new(config.path_prefix.clone()))];
                if let Some(host) = &config.host {
                    matchers.push(Box::new(HostMatcher::new(host.clone())));
                }
                Route {
                    priority: config.priority,
                    matcher: AndMatcher::new(matchers),
                    target,
                }
            })
            .collect();
        routes.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { routes }
    }

    /// Find the target for a request, if any route matches.
    pub fn match_request(&self, parts: &Parts) -> Option<&T> {
        self.routes
            .iter()
            .find(|route| route.matcher.matches(parts))
            .map(|route| &route.target)
    }

    /// Targets in match order.
    pub fn targets(&self) -> impl Iterator<Item = &T> {
        self.routes.iter().map(|route| &route.target)
    }
}
