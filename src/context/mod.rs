//! Per-request context handed to route handlers and middleware.

use std::collections::HashMap;

use crate::http::Request;

/// Named path captures from the matched route, e.g. `:id` → `"42"`.
#[derive(Default, Debug, Clone)]
pub struct PathParams {
    map: HashMap<String, String>,
}

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: String) {
        self.map.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }
}

/// The request plus whatever routing learned about it.
#[derive(Debug)]
pub struct Context {
    request: Request,
    params: PathParams,
}

impl Context {
    pub fn new(request: Request) -> Self {
        Self::with_params(request, PathParams::new())
    }

    pub fn with_params(request: Request, params: PathParams) -> Self {
        Self { request, params }
    }

    /// The underlying parsed request.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Value captured by the route's `:name` segment.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Shorthand for `ctx.request().query_param(name)`.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.request.query_param(name)
    }

    /// Gives the request back, dropping any captures.
    pub fn into_request(self) -> Request {
        self.request
    }
}
