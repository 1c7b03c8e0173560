//! Cross-origin policy for browser callers.

use crate::{
    context::Context,
    http::{Method, Response, StatusCode},
    middleware::{BoxResponse, Middleware, Next},
};

/// Seconds a browser may cache a preflight answer.
const PREFLIGHT_MAX_AGE: &str = "3600";

/// CORS middleware: checks `Origin`, answers preflights, decorates responses.
///
/// - Requests without an `Origin`, or from an origin not on the allow-list,
///   pass through untouched (the browser enforces the rest).
/// - A preflight (`OPTIONS` carrying `Access-Control-Request-Method`) from an
///   allowed origin is answered `204` without reaching the router.
/// - Any other request from an allowed origin runs normally and gets
///   `Access-Control-Allow-Origin` plus `Vary: Origin` for specific origins.
///
/// With the default header list (`*`), preflights echo back whatever
/// `Access-Control-Request-Headers` the browser asked for.
///
/// # Examples
///
/// ```rust
/// use reelgate::security::CorsMiddleware;
///
/// let cors = CorsMiddleware::new().allow_origin("http://localhost:3000");
/// ```
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    allowed_origins: Vec<String>,
    allowed_methods: Vec<String>,
    allowed_headers: Vec<String>,
}

impl Default for CorsMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl CorsMiddleware {
    /// No origins allowed yet; methods `GET, POST, PUT, DELETE, OPTIONS`; any header.
    pub fn new() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_headers: vec!["*".to_owned()],
        }
    }

    /// Adds an origin such as `"https://app.example.com"`, or `"*"` for any.
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origins.push(origin.into());
        self
    }

    /// Replaces the allowed request headers.
    #[must_use]
    pub fn allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    // The value for `Access-Control-Allow-Origin`, or `None` if the origin is refused.
    fn resolve_origin(&self, origin: &str) -> Option<String> {
        if self.allowed_origins.iter().any(|o| o == "*") {
            Some("*".to_owned())
        } else if self.allowed_origins.iter().any(|o| o == origin) {
            Some(origin.to_owned())
        } else {
            None
        }
    }

    fn preflight_headers(&self, requested: Option<&str>) -> String {
        match requested {
            Some(requested) if self.allowed_headers.iter().any(|h| h == "*") => requested.to_owned(),
            _ => self.allowed_headers.join(", "),
        }
    }
}

impl Middleware for CorsMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> BoxResponse {
        let headers = ctx.request().headers();
        let allow_origin = headers
            .get("origin")
            .and_then(|origin| self.resolve_origin(origin));
        let is_preflight = ctx.request().method() == &Method::Options
            && headers.contains("access-control-request-method");
        let preflight_headers =
            self.preflight_headers(headers.get("access-control-request-headers"));
        let methods = self.allowed_methods.join(", ");

        Box::pin(async move {
            let Some(allow_origin) = allow_origin else {
                return next.run(ctx).await;
            };
            let vary = allow_origin != "*";

            let mut response = if is_preflight {
                Response::new(StatusCode::NoContent)
                    .header("Access-Control-Allow-Methods", methods)
                    .header("Access-Control-Allow-Headers", preflight_headers)
                    .header("Access-Control-Max-Age", PREFLIGHT_MAX_AGE)
            } else {
                next.run(ctx).await
            };

            response.add_header("Access-Control-Allow-Origin", allow_origin);
            if vary {
                response.add_header("Vary", "Origin");
            }
            response
        })
    }
}
