//! End-to-end checks: inbound routes → catalog → cached client → fake upstream.
//!
//! The fake upstream is the crate's own [`Server`] on an ephemeral port. It
//! counts every request it receives and records the path, credentials and
//! query parameters so tests can assert on exactly what went over the wire.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use reelgate::cache::Cache;
use reelgate::gateway;
use reelgate::http::{Request, Response, StatusCode};
use reelgate::server::Server;
use reelgate::tmdb::{Catalog, Fingerprint, MediaKind, QueryParams, TmdbClient};

const TOKEN: &str = "test-token";

const TRACKED_PARAMS: &[&str] = &[
    "language",
    "page",
    "query",
    "include_adult",
    "include_video",
    "include_null_first_air_dates",
    "sort_by",
    "with_genres",
];

#[derive(Debug, Clone)]
struct Seen {
    path: String,
    authorization: Option<String>,
    accept: Option<String>,
    params: HashMap<String, String>,
}

impl Seen {
    fn from_request(req: &Request) -> Self {
        let params = TRACKED_PARAMS
            .iter()
            .filter_map(|key| req.query_param(key).map(|v| (key.to_string(), v.to_owned())))
            .collect();
        Self {
            path: req.path().to_owned(),
            authorization: req.headers().get("authorization").map(str::to_owned),
            accept: req.headers().get("accept").map(str::to_owned),
            params,
        }
    }
}

struct Upstream {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Upstream {
    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn last(&self) -> Seen {
        self.seen.lock().unwrap().last().cloned().expect("upstream saw no request")
    }

    fn client(&self) -> TmdbClient {
        TmdbClient::builder(TOKEN)
            .base_url(format!("http://{}", self.addr))
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap()
    }

    fn catalog(&self) -> Arc<Catalog> {
        Arc::new(Catalog::new(self.client()))
    }
}

fn media_page() -> Value {
    json!({
        "page": 1,
        "results": [
            { "id": 550, "title": "Fight Club", "media_type": "movie", "vote_average": 8.4 },
            { "id": 1399, "name": "Game of Thrones", "media_type": "tv", "vote_average": 8.5 }
        ],
        "total_pages": 1,
        "total_results": 2
    })
}

async fn answer(path: &str) -> Response {
    let ok = |body: Value| Response::json(StatusCode::Ok, &body);
    match path {
        "/trending/movie/week" | "/trending/movie/day" | "/trending/tv/week" | "/search/multi"
        | "/discover/movie" | "/discover/tv" | "/movie/550/recommendations" => ok(media_page()),
        "/movie/550" => ok(json!({
            "id": 550,
            "title": "Fight Club",
            "runtime": 139,
            "genres": [{ "id": 18, "name": "Drama" }]
        })),
        "/movie/550/credits" => ok(json!({
            "id": 550,
            "cast": [{ "id": 819, "name": "Edward Norton", "character": "The Narrator", "order": 0 }],
            "crew": [{ "id": 7467, "name": "David Fincher", "job": "Director", "department": "Directing" }]
        })),
        "/genre/movie/list" | "/genre/tv/list" => ok(json!({
            "genres": [{ "id": 28, "name": "Action" }, { "id": 18, "name": "Drama" }]
        })),
        "/movie/550/videos" => ok(json!({
            "id": 550,
            "results": [{ "key": "SUXWAEX2jlg", "name": "Trailer", "site": "YouTube", "type": "Trailer", "official": true }]
        })),
        "/movie/550/images" => ok(json!({
            "id": 550,
            "backdrops": [],
            "posters": [{ "file_path": "/p.jpg", "width": 500, "height": 750, "aspect_ratio": 0.667 }],
            "logos": []
        })),
        "/movie/550/watch/providers" => ok(json!({
            "id": 550,
            "results": { "US": { "link": "https://example.test/550", "rent": [] } }
        })),
        "/movie/42" => Response::error(StatusCode::ServiceUnavailable, "maintenance"),
        "/movie/13/credits" => Response::new(StatusCode::Ok).body("definitely not json"),
        "/tv/7" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            ok(json!({ "id": 7, "name": "Too Slow" }))
        }
        _ => Response::error(StatusCode::NotFound, "not found"),
    }
}

async fn spawn_upstream() -> Upstream {
    let server = Server::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr();
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let (counter, log) = (Arc::clone(&hits), Arc::clone(&seen));
    tokio::spawn(server.run(move |req: Request| {
        counter.fetch_add(1, Ordering::SeqCst);
        log.lock().unwrap().push(Seen::from_request(&req));
        let path = req.path().to_owned();
        async move { answer(&path).await }
    }));

    Upstream { addr, hits, seen }
}

fn get(path: &str) -> Request {
    let raw = format!("GET {path} HTTP/1.1\r\nHost: gateway.test\r\n\r\n");
    Request::parse(raw.as_bytes()).unwrap().0
}

async fn call(catalog: &Arc<Catalog>, path: &str) -> (StatusCode, Value) {
    let response = gateway::routes(Arc::clone(catalog)).route(get(path)).await;
    let body = serde_json::from_slice(response.body_ref()).unwrap();
    (response.status(), body)
}

fn localized() -> QueryParams {
    QueryParams::new().with("language", "en-US")
}

#[tokio::test]
async fn trending_is_served_from_cache_on_repeat() {
    let upstream = spawn_upstream().await;
    let catalog = upstream.catalog();

    let (first_status, first) = call(&catalog, "/api/trending/movies").await;
    let (second_status, second) = call(&catalog, "/api/trending/movies?time_window=week").await;

    assert_eq!(first_status, StatusCode::Ok);
    assert_eq!(second_status, StatusCode::Ok);
    assert_eq!(first, second);
    assert_eq!(first["results"][0]["title"], "Fight Club");
    assert_eq!(upstream.hits(), 1);

    let seen = upstream.last();
    assert_eq!(seen.path, "/trending/movie/week");
    assert_eq!(seen.params.get("language").map(String::as_str), Some("en-US"));
    assert_eq!(seen.authorization.as_deref(), Some("Bearer test-token"));
    assert_eq!(seen.accept.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn different_windows_are_cached_separately() {
    let upstream = spawn_upstream().await;
    let catalog = upstream.catalog();

    call(&catalog, "/api/trending/movies?time_window=day").await;
    call(&catalog, "/api/trending/movies?time_window=week").await;
    call(&catalog, "/api/trending/tv").await;

    assert_eq!(upstream.hits(), 3);
    assert_eq!(catalog.client().cache().len(), 3);
}

#[tokio::test]
async fn invalid_time_window_never_reaches_upstream() {
    let upstream = spawn_upstream().await;
    let catalog = upstream.catalog();

    let (status, body) = call(&catalog, "/api/trending/movies?time_window=month").await;

    assert_eq!(status, StatusCode::BadRequest);
    assert_eq!(body["error"], "invalid time_window parameter");
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn upstream_error_is_reported_and_not_cached() {
    let upstream = spawn_upstream().await;
    let catalog = upstream.catalog();

    let (status, body) = call(&catalog, "/api/details/movie/42").await;
    assert_eq!(status, StatusCode::InternalServerError);
    assert_eq!(body["error"], "failed to fetch details");

    let key = Fingerprint::new("/movie/42", &localized());
    assert_eq!(key.as_str(), "/movie/42?language=en-US");
    assert!(catalog.client().cache().get(key.as_str()).is_none());

    // Nothing cached, so the retry goes upstream again.
    call(&catalog, "/api/details/movie/42").await;
    assert_eq!(upstream.hits(), 2);
}

#[tokio::test]
async fn details_are_typed() {
    let upstream = spawn_upstream().await;
    let catalog = upstream.catalog();

    let (status, body) = call(&catalog, "/api/details/movie/550").await;
    assert_eq!(status, StatusCode::Ok);
    assert_eq!(body["runtime"], 139);
    assert_eq!(body["genres"][0]["name"], "Drama");
    assert!(body.get("name").is_none());
}

#[tokio::test]
async fn discover_sends_genre_and_fixed_params() {
    let upstream = spawn_upstream().await;
    let catalog = upstream.catalog();

    let (status, _) = call(&catalog, "/api/discover/movie/28").await;
    assert_eq!(status, StatusCode::Ok);

    let seen = upstream.last();
    assert_eq!(seen.path, "/discover/movie");
    let expected: HashMap<String, String> = [
        ("include_adult", "true"),
        ("include_video", "true"),
        ("language", "en-US"),
        ("page", "1"),
        ("sort_by", "popularity.desc"),
        ("with_genres", "28"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect();
    assert_eq!(seen.params, expected);
}

#[tokio::test]
async fn popular_route_drops_the_genre_filter() {
    let upstream = spawn_upstream().await;
    let catalog = upstream.catalog();

    let (status, _) = call(&catalog, "/api/discover/tv/popular?page=2").await;
    assert_eq!(status, StatusCode::Ok);

    let seen = upstream.last();
    assert_eq!(seen.path, "/discover/tv");
    assert_eq!(seen.params.get("page").map(String::as_str), Some("2"));
    assert_eq!(
        seen.params.get("include_null_first_air_dates").map(String::as_str),
        Some("false")
    );
    assert!(!seen.params.contains_key("with_genres"));
    assert!(!seen.params.contains_key("include_video"));
}

#[tokio::test]
async fn search_forwards_decoded_query() {
    let upstream = spawn_upstream().await;
    let catalog = upstream.catalog();

    let (status, body) = call(&catalog, "/api/search?query=star+wars&page=2").await;
    assert_eq!(status, StatusCode::Ok);
    assert_eq!(body["results"][1]["name"], "Game of Thrones");

    let seen = upstream.last();
    assert_eq!(seen.path, "/search/multi");
    assert_eq!(seen.params.get("query").map(String::as_str), Some("star wars"));
    assert_eq!(seen.params.get("include_adult").map(String::as_str), Some("true"));
    assert_eq!(seen.params.get("page").map(String::as_str), Some("2"));
}

#[tokio::test]
async fn recommendations_always_ask_for_first_page() {
    let upstream = spawn_upstream().await;
    let catalog = upstream.catalog();

    let (status, _) = call(&catalog, "/api/recommendations/movie/550").await;
    assert_eq!(status, StatusCode::Ok);

    let seen = upstream.last();
    assert_eq!(seen.path, "/movie/550/recommendations");
    assert_eq!(seen.params.get("page").map(String::as_str), Some("1"));
}

#[tokio::test]
async fn images_and_providers_carry_no_params() {
    let upstream = spawn_upstream().await;
    let catalog = upstream.catalog();

    let (status, body) = call(&catalog, "/api/images/movie/550").await;
    assert_eq!(status, StatusCode::Ok);
    assert_eq!(body["posters"][0]["width"], 500);
    assert!(upstream.last().params.is_empty());

    let (status, body) = call(&catalog, "/api/watch/providers/movie/550").await;
    assert_eq!(status, StatusCode::Ok);
    assert_eq!(body["results"]["US"]["link"], "https://example.test/550");
    assert!(upstream.last().params.is_empty());

    let cache = catalog.client().cache();
    assert!(cache.get("/movie/550/images").is_some());
    assert!(cache.get("/movie/550/watch/providers").is_some());
}

#[tokio::test]
async fn credits_videos_and_genres_round_out_the_catalog() {
    let upstream = spawn_upstream().await;
    let catalog = upstream.catalog();

    let (_, credits) = call(&catalog, "/api/credits/movie/550").await;
    assert_eq!(credits["cast"][0]["character"], "The Narrator");
    assert_eq!(credits["crew"][0]["job"], "Director");

    let (_, videos) = call(&catalog, "/api/videos/movie/550").await;
    assert_eq!(videos["results"][0]["type"], "Trailer");

    let (_, genres) = call(&catalog, "/api/genres/tv").await;
    assert_eq!(genres["genres"][0]["name"], "Action");
    assert_eq!(upstream.last().path, "/genre/tv/list");
}

#[tokio::test]
async fn undecodable_cached_payload_is_refetched() {
    let upstream = spawn_upstream().await;
    let catalog = upstream.catalog();
    let cache = catalog.client().cache();
    let key = Fingerprint::new("/genre/movie/list", &localized());

    cache.set(key.as_str(), json!({ "genres": "not a list" }));

    let genres = catalog.genres(MediaKind::Movie).await.unwrap();
    assert_eq!(genres.genres.len(), 2);
    assert_eq!(upstream.hits(), 1);
    assert_eq!(cache.get(key.as_str()).unwrap()["genres"][0]["id"], 28);
}

#[tokio::test]
async fn non_json_body_is_a_decode_failure() {
    let upstream = spawn_upstream().await;
    let catalog = upstream.catalog();

    let (status, body) = call(&catalog, "/api/credits/movie/13").await;
    assert_eq!(status, StatusCode::InternalServerError);
    assert_eq!(body["error"], "failed to fetch credits");
    assert!(catalog.client().cache().is_empty());
}

#[tokio::test]
async fn slow_upstream_is_a_gateway_timeout() {
    let upstream = spawn_upstream().await;
    let catalog = upstream.catalog();

    let (status, body) = call(&catalog, "/api/details/tv/7").await;
    assert_eq!(status, StatusCode::GatewayTimeout);
    assert_eq!(body["error"], "failed to fetch details");
    assert!(catalog.client().cache().is_empty());
}

#[tokio::test]
async fn expired_entries_go_back_upstream() {
    let upstream = spawn_upstream().await;
    let client = TmdbClient::builder(TOKEN)
        .base_url(format!("http://{}", upstream.addr))
        .cache(Arc::new(Cache::new(Duration::from_millis(150))))
        .build()
        .unwrap();
    let params = localized();

    client.fetch("/genre/movie/list", &params).await.unwrap();
    client.fetch("/genre/movie/list", &params).await.unwrap();
    assert_eq!(upstream.hits(), 1);

    tokio::time::sleep(Duration::from_millis(250)).await;
    client.fetch("/genre/movie/list", &params).await.unwrap();
    assert_eq!(upstream.hits(), 2);
}

#[tokio::test]
async fn shared_cache_spans_concurrent_callers() {
    let upstream = spawn_upstream().await;
    let catalog = upstream.catalog();

    call(&catalog, "/api/genres/movie").await;
    let calls: Vec<_> = (0..8)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            tokio::spawn(async move { catalog.genres(MediaKind::Movie).await })
        })
        .collect();
    for handle in calls {
        assert_eq!(handle.await.unwrap().unwrap().genres.len(), 2);
    }
    assert_eq!(upstream.hits(), 1);
}

#[tokio::test]
async fn full_stack_over_tcp_with_cors() {
    let upstream = spawn_upstream().await;
    let pipeline = Arc::new(gateway::pipeline(upstream.catalog(), "http://localhost:3000"));

    let server = Server::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr();
    tokio::spawn(server.run(move |req: Request| {
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.handle(req).await }
    }));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(
            b"GET /api/genres/movie HTTP/1.1\r\n\
              Host: gateway.test\r\n\
              Origin: http://localhost:3000\r\n\
              Connection: close\r\n\r\n",
        )
        .await
        .unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8(raw).unwrap();

    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"), "{text}");
    assert!(text.contains("Access-Control-Allow-Origin: http://localhost:3000\r\n"));
    assert!(text.contains("Content-Type: application/json\r\n"));
    assert!(text.ends_with(r#"{"genres":[{"id":28,"name":"Action"},{"id":18,"name":"Drama"}]}"#));
}
