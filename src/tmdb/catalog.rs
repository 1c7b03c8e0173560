//! One accessor per catalog resource.
//!
//! Each accessor turns already-validated inputs into an upstream endpoint and
//! parameter set, then decodes the payload into its typed shape through the
//! shared [`TmdbClient`].

use super::client::TmdbClient;
use super::error::ApiError;
use super::input::{GenreId, MediaId, MediaKind, Page, SearchQuery, TimeWindow};
use super::query::QueryParams;
use super::types::{
    Credits, GenreList, ImageSet, MediaDetails, MediaPage, VideoList, WatchProviders,
};

const LANGUAGE: &str = "en-US";
const SORT_BY: &str = "popularity.desc";

fn localized() -> QueryParams {
    QueryParams::new().with("language", LANGUAGE)
}

// Parameters shared by discover and popular listings.
fn discovery(kind: MediaKind, page: Page) -> QueryParams {
    let mut params = localized()
        .with("include_adult", true)
        .with("page", page)
        .with("sort_by", SORT_BY);
    match kind {
        MediaKind::Movie => params.set("include_video", true),
        MediaKind::Tv => params.set("include_null_first_air_dates", false),
    };
    params
}

/// Typed, stateless view of the upstream catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    client: TmdbClient,
}

impl Catalog {
    /// Wraps `client`; every accessor goes through its cache.
    pub fn new(client: TmdbClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &TmdbClient {
        &self.client
    }

    pub async fn trending(&self, kind: MediaKind, window: TimeWindow) -> Result<MediaPage, ApiError> {
        let endpoint = format!("/trending/{kind}/{window}");
        self.client.fetch_as(&endpoint, &localized()).await
    }

    /// Mixed movie/show/person search.
    pub async fn search(&self, query: &SearchQuery, page: Page) -> Result<MediaPage, ApiError> {
        let params = localized()
            .with("query", query.as_str())
            .with("include_adult", true)
            .with("page", page);
        self.client.fetch_as("/search/multi", &params).await
    }

    pub async fn details(&self, kind: MediaKind, id: MediaId) -> Result<MediaDetails, ApiError> {
        let endpoint = format!("/{kind}/{id}");
        self.client.fetch_as(&endpoint, &localized()).await
    }

    pub async fn credits(&self, kind: MediaKind, id: MediaId) -> Result<Credits, ApiError> {
        let endpoint = format!("/{kind}/{id}/credits");
        self.client.fetch_as(&endpoint, &localized()).await
    }

    pub async fn genres(&self, kind: MediaKind) -> Result<GenreList, ApiError> {
        let endpoint = format!("/genre/{kind}/list");
        self.client.fetch_as(&endpoint, &localized()).await
    }

    /// Most popular titles in one genre.
    pub async fn discover(
        &self,
        kind: MediaKind,
        genre: GenreId,
        page: Page,
    ) -> Result<MediaPage, ApiError> {
        let endpoint = format!("/discover/{kind}");
        let params = discovery(kind, page).with("with_genres", genre);
        self.client.fetch_as(&endpoint, &params).await
    }

    /// Most popular titles across all genres.
    pub async fn popular(&self, kind: MediaKind, page: Page) -> Result<MediaPage, ApiError> {
        let endpoint = format!("/discover/{kind}");
        self.client.fetch_as(&endpoint, &discovery(kind, page)).await
    }

    /// First page of titles recommended alongside `id`.
    pub async fn recommendations(
        &self,
        kind: MediaKind,
        id: MediaId,
    ) -> Result<MediaPage, ApiError> {
        let endpoint = format!("/{kind}/{id}/recommendations");
        let params = localized().with("page", Page::FIRST);
        self.client.fetch_as(&endpoint, &params).await
    }

    pub async fn videos(&self, kind: MediaKind, id: MediaId) -> Result<VideoList, ApiError> {
        let endpoint = format!("/{kind}/{id}/videos");
        self.client.fetch_as(&endpoint, &localized()).await
    }

    // Images and providers are not localized upstream; no params at all.
    pub async fn images(&self, kind: MediaKind, id: MediaId) -> Result<ImageSet, ApiError> {
        let endpoint = format!("/{kind}/{id}/images");
        self.client.fetch_as(&endpoint, &QueryParams::new()).await
    }

    pub async fn watch_providers(
        &self,
        kind: MediaKind,
        id: MediaId,
    ) -> Result<WatchProviders, ApiError> {
        let endpoint = format!("/{kind}/{id}/watch/providers");
        self.client.fetch_as(&endpoint, &QueryParams::new()).await
    }
}
