//! Method + path routing.
//!
//! Two pattern styles are supported:
//!
//! | Pattern               | Example match          | Captured params            |
//! |-----------------------|------------------------|----------------------------|
//! | `/api/search`         | `/api/search`          | *(none)*                   |
//! | `/api/details/:type/:id` | `/api/details/tv/1399` | `type → "tv"`, `id → "1399"` |
//!
//! Trailing slashes are ignored on both sides. Routes are tried in
//! registration order and the first match wins; no match yields a JSON `404`.

use std::pin::Pin;
use std::sync::Arc;

use crate::context::{Context, PathParams};
use crate::http::{Method, Request, Response, StatusCode};

/// Type-erased async handler stored in the route table.
pub type Handler =
    Arc<dyn Fn(Context) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static>;

/// Anything callable as `Fn(Context) -> impl Future<Output = Response>`.
///
/// Blanket-implemented so route registration can take plain async closures.
pub trait IntoHandler: Send + Sync + 'static {
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin((self)(ctx))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Capture(String),
}

// Compiled route pattern: one entry per non-empty path segment.
#[derive(Debug, Clone)]
struct Pattern {
    segments: Vec<Segment>,
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

impl Pattern {
    fn parse(pattern: &str) -> Self {
        let segments = split_path(pattern)
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Capture(name.to_owned()),
                None => Segment::Literal(s.to_owned()),
            })
            .collect();
        Self { segments }
    }

    fn matches(&self, path: &str) -> Option<PathParams> {
        let mut params = PathParams::new();
        let mut parts = split_path(path);

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(lit) if lit != part => return None,
                Segment::Literal(_) => {}
                Segment::Capture(name) => params.insert(name.clone(), part.to_owned()),
            }
        }

        // Longer paths than the pattern don't match.
        match parts.next() {
            Some(_) => None,
            None => Some(params),
        }
    }
}

struct Route {
    method: Method,
    pattern: Pattern,
    handler: Handler,
}

/// Ordered route table.
///
/// # Examples
///
/// ```rust,no_run
/// use reelgate::context::Context;
/// use reelgate::router::Router;
/// use reelgate::http::{Response, StatusCode};
///
/// let mut router = Router::new();
/// router.get("/api/genres/:type", |ctx: Context| async move {
///     let kind = ctx.param("type").unwrap_or_default().to_owned();
///     Response::new(StatusCode::Ok).body(kind)
/// });
/// ```
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a `GET` route.
    pub fn get(&mut self, path: &str, handler: impl IntoHandler) {
        self.add(Method::Get, path, handler);
    }

    pub fn add(&mut self, method: Method, path: &str, handler: impl IntoHandler) {
        let handler: Handler = Arc::new(move |ctx| handler.call(ctx));
        self.routes.push(Route {
            method,
            pattern: Pattern::parse(path),
            handler,
        });
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Dispatches to the first route whose method and pattern both match.
    pub async fn route(&self, request: Request) -> Response {
        for route in &self.routes {
            if &route.method != request.method() {
                continue;
            }
            if let Some(params) = route.pattern.matches(request.path()) {
                let ctx = Context::with_params(request, params);
                return (route.handler)(ctx).await;
            }
        }

        Response::error(StatusCode::NotFound, "not found")
    }
}
