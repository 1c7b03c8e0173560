//! # reelgate
//!
//! A caching gateway in front of the TMDB media catalog. Browser clients call
//! a small, stable `/api/...` surface; the gateway validates their input,
//! serves fresh upstream responses from a five-minute in-memory cache, and
//! only goes upstream on a miss.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use reelgate::gateway;
//! use reelgate::server::Server;
//! use reelgate::tmdb::{Catalog, TmdbClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = Arc::new(Catalog::new(TmdbClient::new("my-read-token")?));
//!     let pipeline = Arc::new(gateway::pipeline(catalog, "http://localhost:3000"));
//!
//!     let server = Server::bind("127.0.0.1:8080").await?;
//!     server
//!         .run(move |req| {
//!             let pipeline = Arc::clone(&pipeline);
//!             async move { pipeline.handle(req).await }
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

// ── Upstream side ─────────────────────────────────────────────────────────────
pub mod cache;
pub mod tmdb;

// ── Inbound side ──────────────────────────────────────────────────────────────
pub mod context;
pub mod gateway;
pub mod http;
pub mod middleware;
pub mod router;
pub mod security;
pub mod server;

pub mod config;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use cache::Cache;
pub use config::{Config, ConfigError};
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use server::{Server, ServerError};
pub use tmdb::{ApiError, Catalog, TmdbClient};
