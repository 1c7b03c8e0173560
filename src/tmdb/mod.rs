//! Client for the TMDB v3 catalog API.
//!
//! [`TmdbClient`] performs authenticated, cached GETs; [`Catalog`] layers one
//! typed accessor per resource on top of it.

mod catalog;
mod client;
mod error;
mod input;
mod query;
pub mod types;

pub use catalog::Catalog;
pub use client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, TmdbClient, TmdbClientBuilder};
pub use error::{ApiError, ValidationError};
pub use input::{GenreId, MediaId, MediaKind, Page, SearchQuery, TimeWindow};
pub use query::{Fingerprint, QueryParams};
