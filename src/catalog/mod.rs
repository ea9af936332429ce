//! Remote metadata: TMDB for titles, OMDb for extra ratings.

mod cache;
mod fallback;
mod http;
mod omdb;
mod tmdb;
mod types;

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;

pub use cache::ResponseCache;
pub use fallback::{backdrop_url, poster_url, sample_genres, sample_trending};
pub use http::{build_http_client, CatalogError};
pub use omdb::{ExternalRatings, OmdbClient, DEFAULT_OMDB_BASE_URL};
pub use tmdb::{TmdbClient, DEFAULT_TMDB_BASE_URL};
pub use types::{
    CastMember, Genre, Listing, ListingSource, MediaType, Movie, TimeWindow, Title, TitleDetails,
    TitleKey, TitlePage, TvShow, Video,
};

/// Both providers behind one shared HTTP client and response cache.
#[derive(Clone)]
pub struct Catalog {
    pub tmdb: TmdbClient,
    pub omdb: OmdbClient,
    cache: Arc<ResponseCache>,
}

impl Catalog {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = build_http_client()?;
        let cache = Arc::new(ResponseCache::new(
            config.cache_capacity,
            Duration::from_secs(config.cache_ttl_seconds),
        ));

        let tmdb = TmdbClient::new(
            http.clone(),
            config.tmdb_api_key(),
            config.tmdb_base_url.as_deref(),
            Arc::clone(&cache),
        )?;
        let omdb = OmdbClient::new(
            http,
            config.omdb_api_key(),
            config.omdb_base_url.as_deref(),
            Arc::clone(&cache),
        )?;

        if !tmdb.has_api_key() {
            tracing::info!("No TMDB API key configured; sample content will be shown");
        }

        Ok(Self { tmdb, omdb, cache })
    }

    /// Drop cached responses so a retry goes to the network.
    pub fn invalidate(&self) {
        self.cache.clear();
    }
}
