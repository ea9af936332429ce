use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::cache::ResponseCache;
use super::fallback::{sample_genres, sample_trending};
use super::http::{cache_key, endpoint, fetch_json, CatalogError};
use super::types::{
    Genre, Listing, ListingSource, MediaType, RawDetails, Title, TimeWindow, TitleDetails,
    TitlePage,
};
use crate::util::{validate_base_url, MAX_SEARCH_QUERY_LENGTH};

pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";

const DETAIL_APPENDS: &str = "credits,videos,recommendations,external_ids";

#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    total_pages: Option<u32>,
}

impl RawPage {
    fn into_page(self, default: MediaType, requested: u32) -> TitlePage {
        let page = self.page.unwrap_or(requested);
        TitlePage {
            titles: self
                .results
                .into_iter()
                .filter_map(|v| Title::from_value(v, default))
                .collect(),
            page,
            total_pages: self.total_pages.unwrap_or(page),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawGenres {
    #[serde(default)]
    genres: Vec<Genre>,
}

/// Client for the TMDB v3 API.
///
/// `try_*` methods report every failure. The plain methods never fail: they
/// log the error and hand back an empty page or built-in sample content, so
/// callers only ever see (possibly empty) results.
#[derive(Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    cache: Arc<ResponseCache>,
}

impl TmdbClient {
    /// # Errors
    ///
    /// Rejects a custom base URL that is not HTTPS (loopback excepted).
    pub fn new(
        http: reqwest::Client,
        api_key: Option<SecretString>,
        base_url: Option<&str>,
        cache: Arc<ResponseCache>,
    ) -> Result<Self, CatalogError> {
        let base_url = match base_url {
            Some(custom) => {
                let validated = validate_base_url(custom)?;
                tracing::info!(base_url = %validated, "Using custom TMDB base URL");
                validated
            }
            None => DEFAULT_TMDB_BASE_URL.to_string(),
        };

        Ok(Self {
            http,
            base_url,
            api_key: api_key.filter(|k| !k.expose_secret().trim().is_empty()),
            cache,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, CatalogError> {
        let api_key = self.api_key.as_ref().ok_or(CatalogError::MissingApiKey)?;

        let key = cache_key("tmdb", path, params);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(path, "TMDB cache hit");
            return Ok(hit);
        }

        let mut query = Vec::with_capacity(params.len() + 1);
        query.push(("api_key", api_key.expose_secret().to_string()));
        query.extend(params.iter().cloned());

        let url = endpoint(&self.base_url, path, &query)?;
        let value = fetch_json(&self.http, url).await?;
        self.cache.insert(key, value.clone());
        Ok(value)
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// `/search/multi`, skipping people.
    pub async fn try_search(&self, query: &str, page: u32) -> Result<TitlePage, CatalogError> {
        let query: String = query.trim().chars().take(MAX_SEARCH_QUERY_LENGTH).collect();
        let value = self
            .get(
                "/search/multi",
                &[
                    ("query", query),
                    ("page", page.to_string()),
                    ("include_adult", "false".to_string()),
                ],
            )
            .await?;
        let raw: RawPage = serde_json::from_value(value)?;
        Ok(raw.into_page(MediaType::Movie, page))
    }

    /// Search that never fails. A blank query returns an empty page without
    /// touching the network.
    pub async fn search(&self, query: &str, page: u32) -> TitlePage {
        if query.trim().is_empty() {
            return TitlePage::empty();
        }
        match self.try_search(query, page).await {
            Ok(results) => results,
            Err(e) => {
                log_fallback(&e, "search");
                TitlePage::empty()
            }
        }
    }

    // ========================================================================
    // Trending
    // ========================================================================

    pub async fn try_trending(
        &self,
        window: TimeWindow,
        page: u32,
    ) -> Result<TitlePage, CatalogError> {
        let path = format!("/trending/all/{}", window.as_str());
        let value = self.get(&path, &[("page", page.to_string())]).await?;
        let raw: RawPage = serde_json::from_value(value)?;
        Ok(raw.into_page(MediaType::Movie, page))
    }

    /// Trending titles, or the built-in sample list if the provider fails or
    /// returns nothing.
    pub async fn trending(&self, window: TimeWindow, page: u32) -> Listing {
        match self.try_trending(window, page).await {
            Ok(live) if !live.titles.is_empty() => Listing {
                page: live,
                source: ListingSource::Live,
            },
            Ok(_) => {
                tracing::warn!(window = window.as_str(), "Trending list empty, showing sample titles");
                sample_listing()
            }
            Err(e) => {
                log_fallback(&e, "trending");
                sample_listing()
            }
        }
    }

    // ========================================================================
    // Genres and Discovery
    // ========================================================================

    pub async fn try_genres(&self, media_type: MediaType) -> Result<Vec<Genre>, CatalogError> {
        let path = format!("/genre/{}/list", media_type.as_str());
        let value = self.get(&path, &[]).await?;
        let raw: RawGenres = serde_json::from_value(value)?;
        Ok(raw.genres)
    }

    /// Genre list for `media_type`, or the built-in taxonomy.
    pub async fn genres(&self, media_type: MediaType) -> (Vec<Genre>, ListingSource) {
        match self.try_genres(media_type).await {
            Ok(genres) if !genres.is_empty() => (genres, ListingSource::Live),
            Ok(_) => (sample_genres(), ListingSource::Sample),
            Err(e) => {
                log_fallback(&e, "genres");
                (sample_genres(), ListingSource::Sample)
            }
        }
    }

    /// `/discover/{type}` for one genre, most popular first.
    pub async fn try_discover(
        &self,
        genre_id: i64,
        media_type: MediaType,
        page: u32,
    ) -> Result<TitlePage, CatalogError> {
        let path = format!("/discover/{}", media_type.as_str());
        let value = self
            .get(
                &path,
                &[
                    ("with_genres", genre_id.to_string()),
                    ("page", page.to_string()),
                    ("sort_by", "popularity.desc".to_string()),
                ],
            )
            .await?;
        let raw: RawPage = serde_json::from_value(value)?;
        Ok(raw.into_page(media_type, page))
    }

    pub async fn discover(&self, genre_id: i64, media_type: MediaType, page: u32) -> TitlePage {
        match self.try_discover(genre_id, media_type, page).await {
            Ok(results) => results,
            Err(e) => {
                log_fallback(&e, "discover");
                TitlePage::empty()
            }
        }
    }

    // ========================================================================
    // Details
    // ========================================================================

    pub async fn try_details(
        &self,
        id: i64,
        media_type: MediaType,
    ) -> Result<Option<TitleDetails>, CatalogError> {
        let path = format!("/{}/{}", media_type.as_str(), id);
        let value = self
            .get(&path, &[("append_to_response", DETAIL_APPENDS.to_string())])
            .await?;
        let raw: RawDetails = serde_json::from_value(value)?;
        Ok(raw.into_details(media_type))
    }

    /// Full record for the detail overlay, or `None` on any failure.
    pub async fn details(&self, id: i64, media_type: MediaType) -> Option<TitleDetails> {
        match self.try_details(id, media_type).await {
            Ok(details) => details,
            Err(e) => {
                log_fallback(&e, "details");
                None
            }
        }
    }
}

fn sample_listing() -> Listing {
    Listing {
        page: TitlePage {
            titles: sample_trending(),
            page: 1,
            total_pages: 1,
        },
        source: ListingSource::Sample,
    }
}

fn log_fallback(error: &CatalogError, operation: &str) {
    match error {
        // Expected without configuration; not worth a warning per request
        CatalogError::MissingApiKey => {
            tracing::debug!(operation, "No TMDB API key, using fallback")
        }
        _ => tracing::warn!(operation, error = %error, "TMDB request failed, using fallback"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client(base_url: Option<&str>, key: Option<&str>) -> Result<TmdbClient, CatalogError> {
        TmdbClient::new(
            reqwest::Client::new(),
            key.map(SecretString::from),
            base_url,
            Arc::new(ResponseCache::new(16, Duration::from_secs(300))),
        )
    }

    #[test]
    fn test_insecure_base_url_rejected() {
        let result = client(Some("http://tmdb.example.com/3"), Some("k"));
        assert!(matches!(result, Err(CatalogError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_blank_key_treated_as_missing() {
        let tmdb = client(None, Some("   ")).unwrap();
        assert!(!tmdb.has_api_key());
    }

    #[tokio::test]
    async fn test_missing_key_falls_back_to_samples() {
        let tmdb = client(None, None).unwrap();

        let listing = tmdb.trending(TimeWindow::Week, 1).await;
        assert_eq!(listing.source, ListingSource::Sample);
        assert_eq!(listing.page.titles.len(), 6);

        let (genres, source) = tmdb.genres(MediaType::Tv).await;
        assert_eq!(source, ListingSource::Sample);
        assert_eq!(genres.len(), 19);

        assert!(tmdb.details(1, MediaType::Movie).await.is_none());
        assert!(tmdb.search("inception", 1).await.titles.is_empty());
    }

    #[test]
    fn test_raw_page_defaults() {
        let raw: RawPage = serde_json::from_value(serde_json::json!({
            "results": [{"id": 1, "title": "Heat"}, {"id": 2, "media_type": "person", "name": "Al Pacino"}]
        }))
        .unwrap();
        let page = raw.into_page(MediaType::Movie, 3);
        assert_eq!(page.page, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.titles.len(), 1);
    }
}
