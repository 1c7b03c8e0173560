//! Browser-facing security policy.

mod middleware;

pub use middleware::CorsMiddleware;
