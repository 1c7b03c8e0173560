//! Middleware chain wrapped around the router.
//!
//! A [`Pipeline`] is an ordered list of [`Middleware`] layers ending in a
//! [`Router`]. Each layer receives the [`Context`] and a [`Next`] cursor and
//! may pass the request through, answer it directly, or decorate the
//! downstream response.
//!
//! ```rust,no_run
//! use reelgate::middleware::{LoggerMiddleware, Pipeline};
//! use reelgate::router::Router;
//! use reelgate::security::CorsMiddleware;
//!
//! let pipeline = Pipeline::new(Router::new())
//!     .layer(LoggerMiddleware)
//!     .layer(CorsMiddleware::new().allow_origin("http://localhost:3000"));
//! ```

use std::{future::Future, pin::Pin, sync::Arc};
use tokio::time::Instant;

use crate::{
    context::Context,
    http::{Request, Response, StatusCode},
    router::Router,
};

/// Boxed future every middleware returns.
pub type BoxResponse = Pin<Box<dyn Future<Output = Response> + Send>>;

/// A type-erased, cheaply cloneable chain entry.
pub type MiddlewareHandler = Arc<dyn Fn(Context, Next) -> BoxResponse + Send + Sync + 'static>;

/// Cursor into the rest of the chain for one request.
///
/// Consumed by [`run`](Self::run), so a layer can forward at most once.
pub struct Next {
    chain: Arc<[MiddlewareHandler]>,
    index: usize,
}

impl Next {
    pub fn new(chain: Arc<[MiddlewareHandler]>) -> Self {
        Self { chain, index: 0 }
    }

    /// Calls the next entry. Running off the end of the chain yields a `500`.
    pub async fn run(mut self, ctx: Context) -> Response {
        match self.chain.get(self.index).cloned() {
            Some(handler) => {
                self.index += 1;
                handler(ctx, self).await
            }
            None => Response::error(
                StatusCode::InternalServerError,
                "no response generated by middleware chain",
            ),
        }
    }
}

/// A layer in the chain.
///
/// Implementations are shared across connection tasks, so they must be
/// `Send + Sync` and must not hold locks across `.await`.
pub trait Middleware: Send + Sync {
    fn handle(&self, ctx: Context, next: Next) -> BoxResponse;
}

/// Erases a [`Middleware`] into a [`MiddlewareHandler`].
pub fn from_middleware<M>(middleware: Arc<M>) -> MiddlewareHandler
where
    M: Middleware + 'static,
{
    Arc::new(move |ctx: Context, next: Next| middleware.handle(ctx, next))
}

/// Logs one line per request: method, path, status, and elapsed time.
pub struct LoggerMiddleware;

impl Middleware for LoggerMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> BoxResponse {
        Box::pin(async move {
            let start = Instant::now();
            let method = ctx.request().method().to_string();
            let path = ctx.request().path().to_owned();

            let response = next.run(ctx).await;

            tracing::info!(
                %method,
                %path,
                status = response.status().as_u16(),
                elapsed = ?start.elapsed(),
                "request handled"
            );
            response
        })
    }
}

/// Middleware layers in front of a terminal [`Router`].
///
/// Layers run in the order they were added: the first `layer` call is the
/// outermost.
pub struct Pipeline {
    layers: Vec<MiddlewareHandler>,
    terminal: MiddlewareHandler,
    chain: Arc<[MiddlewareHandler]>,
}

impl Pipeline {
    pub fn new(router: Router) -> Self {
        let router = Arc::new(router);
        let terminal: MiddlewareHandler = Arc::new(move |ctx: Context, _next: Next| -> BoxResponse {
            let router = Arc::clone(&router);
            Box::pin(async move { router.route(ctx.into_request()).await })
        });
        let chain = Arc::from(vec![Arc::clone(&terminal)]);
        Self {
            layers: Vec::new(),
            terminal,
            chain,
        }
    }

    #[must_use]
    pub fn layer<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.layers.push(from_middleware(Arc::new(middleware)));
        self.chain = self
            .layers
            .iter()
            .chain(std::iter::once(&self.terminal))
            .cloned()
            .collect();
        self
    }

    pub async fn handle(&self, request: Request) -> Response {
        Next::new(Arc::clone(&self.chain))
            .run(Context::new(request))
            .await
    }
}
