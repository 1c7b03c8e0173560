//! Inbound `/api/...` routes backed by a [`Catalog`].
//!
//! Handlers parse path and query inputs into validated types, call one
//! accessor and serialize the typed result. Validation failures answer `400`
//! with the validation message; upstream failures answer `504` on timeout and
//! `500` otherwise, with a generic message while the detail goes to the log.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use crate::context::Context;
use crate::http::{Response, StatusCode};
use crate::middleware::{LoggerMiddleware, Pipeline};
use crate::router::Router;
use crate::security::CorsMiddleware;
use crate::tmdb::{
    ApiError, Catalog, GenreId, MediaId, MediaKind, Page, SearchQuery, TimeWindow,
    ValidationError,
};

/// Full inbound stack: request logging, CORS for `allowed_origin`, then the routes.
pub fn pipeline(catalog: Arc<Catalog>, allowed_origin: &str) -> Pipeline {
    Pipeline::new(routes(catalog))
        .layer(LoggerMiddleware)
        .layer(CorsMiddleware::new().allow_origin(allowed_origin))
}

pub fn routes(catalog: Arc<Catalog>) -> Router {
    let mut router = Router::new();

    mount(&mut router, "/api/trending/movies", &catalog, trending_movies);
    mount(&mut router, "/api/trending/tv", &catalog, trending_tv);
    mount(&mut router, "/api/search", &catalog, search);
    mount(&mut router, "/api/details/:type/:id", &catalog, details);
    mount(&mut router, "/api/credits/:type/:id", &catalog, credits);
    mount(&mut router, "/api/genres/:type", &catalog, genres);
    // Literal segment first so it wins over the genre capture.
    mount(&mut router, "/api/discover/:type/popular", &catalog, popular);
    mount(&mut router, "/api/discover/:type/:genre", &catalog, discover);
    mount(&mut router, "/api/videos/:type/:id", &catalog, videos);
    mount(&mut router, "/api/images/:type/:id", &catalog, images);
    mount(&mut router, "/api/watch/providers/:type/:id", &catalog, watch_providers);
    mount(&mut router, "/api/recommendations/:type/:id", &catalog, recommendations);

    router
}

fn mount<H, F>(router: &mut Router, path: &str, catalog: &Arc<Catalog>, handler: H)
where
    H: Fn(Arc<Catalog>, Context) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    let catalog = Arc::clone(catalog);
    router.get(path, move |ctx: Context| handler(Arc::clone(&catalog), ctx));
}

fn respond<T: Serialize>(result: Result<T, ApiError>, failure: &str) -> Response {
    match result {
        Ok(body) => Response::json(StatusCode::Ok, &body),
        Err(err) if err.is_validation() => Response::error(err.status_code(), err.to_string()),
        Err(err) => {
            tracing::error!(error = %err, "{failure}");
            Response::error(err.status_code(), failure)
        }
    }
}

fn kind_param(ctx: &Context) -> Result<MediaKind, ValidationError> {
    ctx.param("type").unwrap_or_default().parse()
}

fn id_param(ctx: &Context) -> Result<MediaId, ValidationError> {
    ctx.param("id").unwrap_or_default().parse()
}

// Absent or empty `page` means the first page.
fn page_query(ctx: &Context) -> Result<Page, ValidationError> {
    match ctx.query("page") {
        Some(raw) if !raw.is_empty() => raw.parse(),
        _ => Ok(Page::default()),
    }
}

fn window_query(ctx: &Context) -> Result<TimeWindow, ValidationError> {
    match ctx.query("time_window") {
        Some(raw) if !raw.is_empty() => raw.parse(),
        _ => Ok(TimeWindow::default()),
    }
}

async fn trending_movies(catalog: Arc<Catalog>, ctx: Context) -> Response {
    let result = async {
        let window = window_query(&ctx)?;
        catalog.trending(MediaKind::Movie, window).await
    };
    respond(result.await, "failed to fetch trending movies")
}

async fn trending_tv(catalog: Arc<Catalog>, ctx: Context) -> Response {
    let result = async {
        let window = window_query(&ctx)?;
        catalog.trending(MediaKind::Tv, window).await
    };
    respond(result.await, "failed to fetch trending TV shows")
}

async fn search(catalog: Arc<Catalog>, ctx: Context) -> Response {
    let result = async {
        let query = SearchQuery::new(ctx.query("query").unwrap_or_default())?;
        let page = page_query(&ctx)?;
        catalog.search(&query, page).await
    };
    respond(result.await, "failed to search")
}

async fn details(catalog: Arc<Catalog>, ctx: Context) -> Response {
    let result = async {
        let kind = kind_param(&ctx)?;
        let id = id_param(&ctx)?;
        catalog.details(kind, id).await
    };
    respond(result.await, "failed to fetch details")
}

async fn credits(catalog: Arc<Catalog>, ctx: Context) -> Response {
    let result = async {
        let kind = kind_param(&ctx)?;
        let id = id_param(&ctx)?;
        catalog.credits(kind, id).await
    };
    respond(result.await, "failed to fetch credits")
}

async fn genres(catalog: Arc<Catalog>, ctx: Context) -> Response {
    let result = async { catalog.genres(kind_param(&ctx)?).await };
    respond(result.await, "failed to fetch genres")
}

async fn discover(catalog: Arc<Catalog>, ctx: Context) -> Response {
    let result = async {
        let kind = kind_param(&ctx)?;
        let genre: GenreId = ctx.param("genre").unwrap_or_default().parse()?;
        let page = page_query(&ctx)?;
        catalog.discover(kind, genre, page).await
    };
    respond(result.await, "failed to fetch content")
}

async fn popular(catalog: Arc<Catalog>, ctx: Context) -> Response {
    let result = async {
        let kind = kind_param(&ctx)?;
        let page = page_query(&ctx)?;
        catalog.popular(kind, page).await
    };
    respond(result.await, "failed to fetch content")
}

async fn videos(catalog: Arc<Catalog>, ctx: Context) -> Response {
    let result = async {
        let kind = kind_param(&ctx)?;
        let id = id_param(&ctx)?;
        catalog.videos(kind, id).await
    };
    respond(result.await, "failed to fetch videos")
}

async fn images(catalog: Arc<Catalog>, ctx: Context) -> Response {
    let result = async {
        let kind = kind_param(&ctx)?;
        let id = id_param(&ctx)?;
        catalog.images(kind, id).await
    };
    respond(result.await, "failed to fetch images")
}

async fn watch_providers(catalog: Arc<Catalog>, ctx: Context) -> Response {
    let result = async {
        let kind = kind_param(&ctx)?;
        let id = id_param(&ctx)?;
        catalog.watch_providers(kind, id).await
    };
    respond(result.await, "failed to fetch watch providers")
}

async fn recommendations(catalog: Arc<Catalog>, ctx: Context) -> Response {
    let result = async {
        let kind = kind_param(&ctx)?;
        let id = id_param(&ctx)?;
        catalog.recommendations(kind, id).await
    };
    respond(result.await, "failed to fetch recommendations")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Request;
    use crate::tmdb::TmdbClient;
    use serde_json::Value;

    // Nothing listens on port 9; any request that gets past validation fails upstream.
    fn offline_catalog() -> Arc<Catalog> {
        let client = TmdbClient::builder("test-token")
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        Arc::new(Catalog::new(client))
    }

    fn get(path: &str) -> Request {
        let raw = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n");
        Request::parse(raw.as_bytes()).unwrap().0
    }

    async fn call(path: &str) -> (StatusCode, Value) {
        let router = routes(offline_catalog());
        let response = router.route(get(path)).await;
        let body = serde_json::from_slice(response.body_ref()).unwrap();
        (response.status(), body)
    }

    #[tokio::test]
    async fn bad_time_window_is_400() {
        let (status, body) = call("/api/trending/movies?time_window=month").await;
        assert_eq!(status, StatusCode::BadRequest);
        assert_eq!(body["error"], "invalid time_window parameter");
    }

    #[tokio::test]
    async fn search_requires_query() {
        let (status, body) = call("/api/search").await;
        assert_eq!(status, StatusCode::BadRequest);
        assert_eq!(body["error"], "query parameter is required");

        let (status, body) = call("/api/search?query=dune&page=zero").await;
        assert_eq!(status, StatusCode::BadRequest);
        assert_eq!(body["error"], "invalid page parameter");
    }

    #[tokio::test]
    async fn unknown_media_kind_is_400() {
        for path in [
            "/api/details/anime/1",
            "/api/credits/book/1",
            "/api/genres/radio",
            "/api/discover/game/28",
            "/api/videos/x/1",
            "/api/images/x/1",
            "/api/watch/providers/x/1",
            "/api/recommendations/x/1",
        ] {
            let (status, body) = call(path).await;
            assert_eq!(status, StatusCode::BadRequest, "{path}");
            assert_eq!(body["error"], "invalid media type", "{path}");
        }
    }

    #[tokio::test]
    async fn non_numeric_ids_are_400() {
        let (status, body) = call("/api/details/movie/abc").await;
        assert_eq!(status, StatusCode::BadRequest);
        assert_eq!(body["error"], "invalid id");

        let (status, body) = call("/api/discover/movie/action").await;
        assert_eq!(status, StatusCode::BadRequest);
        assert_eq!(body["error"], "invalid genre ID");
    }

    #[tokio::test]
    async fn upstream_failure_is_500_with_generic_message() {
        let (status, body) = call("/api/details/movie/550").await;
        assert_eq!(status, StatusCode::InternalServerError);
        assert_eq!(body["error"], "failed to fetch details");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (status, body) = call("/api/nothing/here").await;
        assert_eq!(status, StatusCode::NotFound);
        assert_eq!(body["error"], "not found");
    }

    #[tokio::test]
    async fn pipeline_answers_preflight() {
        let pipeline = pipeline(offline_catalog(), "http://localhost:3000");
        let raw = "OPTIONS /api/search HTTP/1.1\r\n\
                   Origin: http://localhost:3000\r\n\
                   Access-Control-Request-Method: GET\r\n\r\n";
        let request = Request::parse(raw.as_bytes()).unwrap().0;
        let response = pipeline.handle(request).await;

        assert_eq!(response.status(), StatusCode::NoContent);
        assert_eq!(
            response.headers().get("Access-Control-Allow-Origin"),
            Some("http://localhost:3000")
        );
    }
}
