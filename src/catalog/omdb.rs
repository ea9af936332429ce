use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;

use super::cache::ResponseCache;
use super::http::{cache_key, endpoint, fetch_json, CatalogError};
use crate::util::{strip_control_chars, validate_base_url};

pub const DEFAULT_OMDB_BASE_URL: &str = "https://www.omdbapi.com";

/// Ratings from the secondary provider. Fields OMDb reports as `N/A` are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalRatings {
    pub imdb_rating: Option<String>,
    pub imdb_votes: Option<String>,
    pub metascore: Option<String>,
    pub rotten_tomatoes: Option<String>,
    pub rated: Option<String>,
    pub awards: Option<String>,
    pub plot: Option<String>,
}

impl ExternalRatings {
    /// IMDb rating as a number, for colour tiers.
    pub fn imdb_score(&self) -> Option<f64> {
        self.imdb_rating.as_deref()?.parse().ok()
    }

    pub fn is_empty(&self) -> bool {
        self.imdb_rating.is_none()
            && self.metascore.is_none()
            && self.rotten_tomatoes.is_none()
            && self.rated.is_none()
            && self.awards.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct RawRating {
    #[serde(rename = "Source")]
    source: String,
    #[serde(rename = "Value")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct RawOmdb {
    #[serde(rename = "Response", default)]
    response: String,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: Option<String>,
    #[serde(rename = "imdbVotes", default)]
    imdb_votes: Option<String>,
    #[serde(rename = "Metascore", default)]
    metascore: Option<String>,
    #[serde(rename = "Rated", default)]
    rated: Option<String>,
    #[serde(rename = "Awards", default)]
    awards: Option<String>,
    #[serde(rename = "Plot", default)]
    plot: Option<String>,
    #[serde(rename = "Ratings", default)]
    ratings: Vec<RawRating>,
}

fn present(field: Option<String>) -> Option<String> {
    field
        .filter(|v| !v.is_empty() && v != "N/A")
        .map(|v| strip_control_chars(&v).into_owned())
}

impl RawOmdb {
    fn into_ratings(self) -> Option<ExternalRatings> {
        if self.response != "True" {
            return None;
        }
        let rotten_tomatoes = self
            .ratings
            .into_iter()
            .find(|r| r.source == "Rotten Tomatoes")
            .map(|r| r.value);

        Some(ExternalRatings {
            imdb_rating: present(self.imdb_rating),
            imdb_votes: present(self.imdb_votes),
            metascore: present(self.metascore),
            rotten_tomatoes: present(rotten_tomatoes),
            rated: present(self.rated),
            awards: present(self.awards),
            plot: present(self.plot),
        })
    }
}

/// Title + year lookups against OMDb.
#[derive(Clone)]
pub struct OmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    cache: Arc<ResponseCache>,
}

impl OmdbClient {
    pub fn new(
        http: reqwest::Client,
        api_key: Option<SecretString>,
        base_url: Option<&str>,
        cache: Arc<ResponseCache>,
    ) -> Result<Self, CatalogError> {
        let base_url = match base_url {
            Some(custom) => {
                let validated = validate_base_url(custom)?;
                tracing::info!(base_url = %validated, "Using custom OMDb base URL");
                validated
            }
            None => DEFAULT_OMDB_BASE_URL.to_string(),
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

    /// `Ok(None)` when OMDb answers `Response: "False"` (title not found).
    pub async fn try_ratings(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Result<Option<ExternalRatings>, CatalogError> {
        let api_key = self.api_key.as_ref().ok_or(CatalogError::MissingApiKey)?;

        let mut params = vec![("t", title.to_string()), ("plot", "short".to_string())];
        if let Some(year) = year {
            params.push(("y", year.to_string()));
        }

        let key = cache_key("omdb", "/", &params);
        let value = match self.cache.get(&key) {
            Some(hit) => hit,
            None => {
                let mut query = vec![("apikey", api_key.expose_secret().to_string())];
                query.extend(params.iter().cloned());
                let value = fetch_json(&self.http, endpoint(&self.base_url, "/", &query)?).await?;
                self.cache.insert(key, value.clone());
                value
            }
        };

        let raw: RawOmdb = serde_json::from_value(value)?;
        Ok(raw.into_ratings())
    }

    /// Ratings, or `None` for "not found" and for any failure.
    pub async fn ratings(&self, title: &str, year: Option<i32>) -> Option<ExternalRatings> {
        match self.try_ratings(title, year).await {
            Ok(ratings) => ratings,
            Err(CatalogError::MissingApiKey) => None,
            Err(e) => {
                tracing::warn!(error = %e, title, "OMDb lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_not_found_maps_to_none() {
        let raw: RawOmdb =
            serde_json::from_value(json!({"Response": "False", "Error": "Movie not found!"}))
                .unwrap();
        assert!(raw.into_ratings().is_none());
    }

    #[test]
    fn test_na_fields_omitted() {
        let raw: RawOmdb = serde_json::from_value(json!({
            "Response": "True",
            "imdbRating": "8.8",
            "imdbVotes": "2,600,000",
            "Metascore": "N/A",
            "Rated": "PG-13",
            "Ratings": [
                {"Source": "Internet Movie Database", "Value": "8.8/10"},
                {"Source": "Rotten Tomatoes", "Value": "87%"}
            ]
        }))
        .unwrap();
        let ratings = raw.into_ratings().unwrap();
        assert_eq!(ratings.imdb_score(), Some(8.8));
        assert_eq!(ratings.metascore, None);
        assert_eq!(ratings.rotten_tomatoes.as_deref(), Some("87%"));
        assert_eq!(ratings.awards, None);
        assert!(!ratings.is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_is_silent_none() {
        let omdb = OmdbClient::new(
            reqwest::Client::new(),
            None,
            None,
            Arc::new(ResponseCache::new(4, std::time::Duration::from_secs(60))),
        )
        .unwrap();
        assert!(!omdb.has_api_key());
        assert!(omdb.ratings("Inception", Some(2010)).await.is_none());
    }
}
