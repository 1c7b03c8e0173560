//! Typed projections of upstream payloads.
//!
//! These are the shapes the gateway hands back to its callers. Unknown
//! upstream fields are dropped; missing or `null` fields fall back to empty
//! values rather than failing the decode, since the upstream is loose about
//! which fields it fills in.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

// Treats an explicit `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One page of movies and/or shows: trending, search, discover, recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPage {
    pub page: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<MediaItem>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

/// Summary card for a movie (`title`, `release_date`) or a show (`name`, `first_air_date`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub popularity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_air_date: Option<String>,
    /// Present on mixed results (trending, search); absent on per-kind lists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genre_ids: Vec<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_language: String,
}

/// Full record for one movie or show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDetails {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_air_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<Genre>,
    /// Minutes; movies only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_seasons: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_episodes: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cast: Vec<CastMember>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub character: String,
    #[serde(default)]
    pub profile_path: Option<String>,
    /// Billing order, lowest first.
    #[serde(default, deserialize_with = "null_as_default")]
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewMember {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub job: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub department: String,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<Video>,
}

/// A trailer, teaser, clip, or featurette hosted on a video site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    pub site: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub official: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSet {
    #[serde(default, deserialize_with = "null_as_default")]
    pub backdrops: Vec<Image>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub posters: Vec<Image>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logos: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub file_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub aspect_ratio: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub height: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub width: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_count: u32,
}

/// Where a title can be watched, keyed by ISO 3166-1 region code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchProviders {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: BTreeMap<String, RegionProviders>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionProviders {
    #[serde(default, deserialize_with = "null_as_default")]
    pub link: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub flatrate: Vec<Provider>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rent: Vec<Provider>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub buy: Vec<Provider>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub provider_id: u64,
    pub provider_name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_priority: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn media_page_tolerates_nulls_and_extra_fields() {
        let raw = json!({
            "page": 1,
            "results": [{
                "id": 550,
                "title": "Fight Club",
                "overview": null,
                "poster_path": null,
                "vote_average": 8.4,
                "genre_ids": [18],
                "adult": false,
                "video": false
            }],
            "total_pages": 1,
            "total_results": 1
        });
        let page: MediaPage = serde_json::from_value(raw).unwrap();
        let item = &page.results[0];
        assert_eq!(item.title.as_deref(), Some("Fight Club"));
        assert_eq!(item.overview, "");
        assert_eq!(item.poster_path, None);
        assert_eq!(item.genre_ids, vec![18]);
        assert_eq!(item.original_language, "");
    }

    #[test]
    fn media_item_omits_absent_titles_when_serialized() {
        let show: MediaItem = serde_json::from_value(json!({
            "id": 1399,
            "name": "Game of Thrones",
            "first_air_date": "2011-04-17"
        }))
        .unwrap();
        let out = serde_json::to_value(&show).unwrap();
        assert_eq!(out["name"], "Game of Thrones");
        assert!(out.get("title").is_none());
        assert!(out.get("release_date").is_none());
    }

    #[test]
    fn media_page_requires_page_number() {
        let err = serde_json::from_value::<MediaPage>(json!({ "results": [] }));
        assert!(err.is_err());
    }

    #[test]
    fn video_type_field_maps_to_kind() {
        let videos: VideoList = serde_json::from_value(json!({
            "id": 550,
            "results": [{ "key": "abc", "site": "YouTube", "type": "Trailer", "official": true }]
        }))
        .unwrap();
        assert_eq!(videos.results[0].kind, "Trailer");
        let out = serde_json::to_value(&videos.results[0]).unwrap();
        assert_eq!(out["type"], "Trailer");
    }

    #[test]
    fn watch_providers_by_region() {
        let providers: WatchProviders = serde_json::from_value(json!({
            "id": 550,
            "results": {
                "US": {
                    "link": "https://example.test/550",
                    "flatrate": [{ "provider_id": 8, "provider_name": "Netflix", "logo_path": "/n.png", "display_priority": 1 }]
                },
                "KE": { "link": "https://example.test/ke" }
            }
        }))
        .unwrap();
        assert_eq!(providers.results["US"].flatrate[0].provider_name, "Netflix");
        assert!(providers.results["KE"].rent.is_empty());
    }
}
