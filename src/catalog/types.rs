use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::util::{strip_control_chars, year_of};

// ============================================================================
// Media Type and Keys
// ============================================================================

/// Kind of title. Payloads that omit it are treated as movies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Movie,
    Tv,
}

impl MediaType {
    /// Wire name, also the TMDB path segment (`/movie/..`, `/tv/..`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Movie => "Movie",
            Self::Tv => "TV",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Movie => Self::Tv,
            Self::Tv => Self::Movie,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(Self::Movie),
            "tv" => Ok(Self::Tv),
            other => Err(format!("unsupported media type: {other}")),
        }
    }
}

/// Composite identity of a title: TMDB ids are only unique per media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TitleKey {
    pub id: i64,
    pub media_type: MediaType,
}

impl TitleKey {
    pub fn new(id: i64, media_type: MediaType) -> Self {
        Self { id, media_type }
    }
}

/// Trending window accepted by `/trending/all/{window}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    Day,
    #[default]
    Week,
}

impl TimeWindow {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Day => "Today",
            Self::Week => "This Week",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Day => Self::Week,
            Self::Week => Self::Day,
        }
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            other => Err(format!("unsupported time window: {other}")),
        }
    }
}

// ============================================================================
// Titles
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genre_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TvShow {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_air_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genre_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub origin_country: Vec<String>,
}

/// A movie or a TV show as returned by list endpoints.
///
/// Serializes with a `media_type` tag next to the record's own fields, which
/// is the same shape TMDB uses for mixed result lists. Deserialization goes
/// through a permissive raw record: `title`/`name` and
/// `release_date`/`first_air_date` are accepted on either variant, and a
/// missing tag means `movie`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "media_type", rename_all = "lowercase")]
pub enum Title {
    Movie(Movie),
    Tv(TvShow),
}

impl Title {
    pub fn id(&self) -> i64 {
        match self {
            Self::Movie(m) => m.id,
            Self::Tv(t) => t.id,
        }
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            Self::Movie(_) => MediaType::Movie,
            Self::Tv(_) => MediaType::Tv,
        }
    }

    pub fn key(&self) -> TitleKey {
        TitleKey::new(self.id(), self.media_type())
    }

    pub fn display_title(&self) -> &str {
        match self {
            Self::Movie(m) => &m.title,
            Self::Tv(t) => &t.name,
        }
    }

    /// Release date for movies, first air date for shows (ISO `YYYY-MM-DD`).
    pub fn release_date(&self) -> Option<&str> {
        match self {
            Self::Movie(m) => m.release_date.as_deref(),
            Self::Tv(t) => t.first_air_date.as_deref(),
        }
        .filter(|d| !d.is_empty())
    }

    pub fn year(&self) -> Option<i32> {
        year_of(self.release_date())
    }

    /// TMDB vote average on a 0-10 scale. Unrated titles report `None`.
    pub fn rating(&self) -> Option<f64> {
        let (avg, count) = match self {
            Self::Movie(m) => (m.vote_average, m.vote_count),
            Self::Tv(t) => (t.vote_average, t.vote_count),
        };
        match (avg, count) {
            (Some(_), Some(0)) => None,
            (Some(a), _) if a > 0.0 => Some(a),
            _ => None,
        }
    }

    pub fn popularity(&self) -> f64 {
        match self {
            Self::Movie(m) => m.popularity,
            Self::Tv(t) => t.popularity,
        }
        .unwrap_or(0.0)
    }

    pub fn overview(&self) -> &str {
        match self {
            Self::Movie(m) => m.overview.as_deref(),
            Self::Tv(t) => t.overview.as_deref(),
        }
        .unwrap_or("")
    }

    pub fn poster_path(&self) -> Option<&str> {
        match self {
            Self::Movie(m) => m.poster_path.as_deref(),
            Self::Tv(t) => t.poster_path.as_deref(),
        }
    }

    pub fn backdrop_path(&self) -> Option<&str> {
        match self {
            Self::Movie(m) => m.backdrop_path.as_deref(),
            Self::Tv(t) => t.backdrop_path.as_deref(),
        }
    }

    /// Parses one entry of a TMDB result list.
    ///
    /// `default` applies when the entry carries no `media_type` (single-type
    /// endpoints such as `/discover/movie`). Entries of other kinds, e.g.
    /// `person` results from `/search/multi`, yield `None`.
    pub fn from_value(value: serde_json::Value, default: MediaType) -> Option<Self> {
        match serde_json::from_value::<RawTitle>(value) {
            Ok(raw) => raw.into_title(default),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed title record");
                None
            }
        }
    }

    /// Serializes the title into the JSON object stored as watchlist metadata.
    pub fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl<'de> Deserialize<'de> for Title {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawTitle::deserialize(deserializer)?;
        let kind = raw.media_type.clone();
        raw.into_title(MediaType::Movie).ok_or_else(|| {
            de::Error::custom(format!(
                "unsupported media_type: {}",
                kind.as_deref().unwrap_or("?")
            ))
        })
    }
}

/// Loose record covering both movie and TV list entries.
#[derive(Debug, Deserialize)]
pub(crate) struct RawTitle {
    pub id: i64,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u64>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub genre_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub origin_country: Option<Vec<String>>,
}

fn clean(s: Option<String>) -> Option<String> {
    s.map(|s| strip_control_chars(&s).into_owned())
}

impl RawTitle {
    pub(crate) fn into_title(self, default: MediaType) -> Option<Title> {
        let media_type = match self.media_type.as_deref() {
            None => default,
            Some(kind) => kind.parse().ok()?,
        };

        let title = match media_type {
            MediaType::Movie => Title::Movie(Movie {
                id: self.id,
                title: clean(self.title.or(self.name)).unwrap_or_default(),
                original_title: clean(self.original_title),
                overview: clean(self.overview),
                poster_path: self.poster_path,
                backdrop_path: self.backdrop_path,
                release_date: self.release_date.or(self.first_air_date),
                vote_average: self.vote_average,
                vote_count: self.vote_count,
                popularity: self.popularity,
                genre_ids: self.genre_ids.unwrap_or_default(),
            }),
            MediaType::Tv => Title::Tv(TvShow {
                id: self.id,
                name: clean(self.name.or(self.title)).unwrap_or_default(),
                original_name: clean(self.original_name),
                overview: clean(self.overview),
                poster_path: self.poster_path,
                backdrop_path: self.backdrop_path,
                first_air_date: self.first_air_date.or(self.release_date),
                vote_average: self.vote_average,
                vote_count: self.vote_count,
                popularity: self.popularity,
                genre_ids: self.genre_ids.unwrap_or_default(),
                origin_country: self.origin_country.unwrap_or_default(),
            }),
        };
        Some(title)
    }
}

// ============================================================================
// Listings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// One page of a paginated list endpoint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TitlePage {
    pub titles: Vec<Title>,
    pub page: u32,
    pub total_pages: u32,
}

impl TitlePage {
    /// The empty fallback handed out when a provider call fails.
    pub fn empty() -> Self {
        Self {
            titles: Vec::new(),
            page: 1,
            total_pages: 0,
        }
    }

    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Where the titles of a listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSource {
    Live,
    /// Built-in placeholder content shown when the provider is unavailable.
    Sample,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub page: TitlePage,
    pub source: ListingSource,
}

// ============================================================================
// Details
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CastMember {
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Video {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Full record for the detail overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleDetails {
    pub title: Title,
    pub tagline: Option<String>,
    pub status: Option<String>,
    /// Movie runtime, or the first listed episode runtime for shows.
    pub runtime: Option<u32>,
    pub number_of_seasons: Option<u32>,
    pub number_of_episodes: Option<u32>,
    pub genres: Vec<Genre>,
    pub imdb_id: Option<String>,
    pub cast: Vec<CastMember>,
    pub videos: Vec<Video>,
    pub recommendations: Vec<Title>,
}

impl TitleDetails {
    /// First YouTube trailer, as a watch URL.
    pub fn trailer_url(&self) -> Option<String> {
        self.videos
            .iter()
            .find(|v| v.kind == "Trailer" && v.site == "YouTube")
            .map(|v| format!("https://www.youtube.com/watch?v={}", v.key))
    }

    pub fn imdb_url(&self) -> Option<String> {
        self.imdb_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(|id| format!("https://www.imdb.com/title/{}/", id))
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawResults<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCredits {
    #[serde(default)]
    cast: Vec<CastMember>,
}

#[derive(Debug, Default, Deserialize)]
struct RawExternalIds {
    #[serde(default)]
    imdb_id: Option<String>,
}

/// Detail record with `credits,videos,recommendations,external_ids` appended.
#[derive(Debug, Deserialize)]
pub(crate) struct RawDetails {
    #[serde(flatten)]
    base: RawTitle,
    #[serde(default)]
    tagline: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    runtime: Option<u32>,
    #[serde(default)]
    episode_run_time: Option<Vec<u32>>,
    #[serde(default)]
    number_of_seasons: Option<u32>,
    #[serde(default)]
    number_of_episodes: Option<u32>,
    #[serde(default)]
    genres: Option<Vec<Genre>>,
    #[serde(default)]
    imdb_id: Option<String>,
    #[serde(default)]
    external_ids: Option<RawExternalIds>,
    #[serde(default)]
    credits: Option<RawCredits>,
    #[serde(default)]
    videos: Option<RawResults<Video>>,
    #[serde(default)]
    recommendations: Option<RawResults<serde_json::Value>>,
}

/// Cast entries shown in the detail overlay.
const MAX_CAST: usize = 10;

impl RawDetails {
    pub(crate) fn into_details(self, media_type: MediaType) -> Option<TitleDetails> {
        let mut base = self.base;
        // Detail endpoints are single-type; trust the request over any tag in the body
        base.media_type = None;
        let title = base.into_title(media_type)?;

        let runtime = self
            .runtime
            .or_else(|| self.episode_run_time.and_then(|r| r.first().copied()));
        let imdb_id = self
            .imdb_id
            .or_else(|| self.external_ids.and_then(|ids| ids.imdb_id));

        let cast = self
            .credits
            .map(|c| c.cast)
            .unwrap_or_default()
            .into_iter()
            .take(MAX_CAST)
            .map(|c| CastMember {
                name: strip_control_chars(&c.name).into_owned(),
                character: clean(c.character),
            })
            .collect();

        let recommendations = self
            .recommendations
            .map(|r| r.results)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| Title::from_value(v, media_type))
            .collect();

        Some(TitleDetails {
            title,
            tagline: clean(self.tagline).filter(|t| !t.is_empty()),
            status: clean(self.status),
            runtime,
            number_of_seasons: self.number_of_seasons,
            number_of_episodes: self.number_of_episodes,
            genres: self.genres.unwrap_or_default(),
            imdb_id,
            cast,
            videos: self.videos.map(|v| v.results).unwrap_or_default(),
            recommendations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_movie_entry_parses_with_default_type() {
        let value = json!({
            "id": 27205,
            "title": "Inception",
            "release_date": "2010-07-16",
            "vote_average": 8.4,
            "vote_count": 35000,
            "popularity": 95.2
        });
        let title = Title::from_value(value, MediaType::Movie).unwrap();
        assert_eq!(title.key(), TitleKey::new(27205, MediaType::Movie));
        assert_eq!(title.display_title(), "Inception");
        assert_eq!(title.year(), Some(2010));
        assert_eq!(title.rating(), Some(8.4));
    }

    #[test]
    fn test_tagged_entry_overrides_default() {
        let value = json!({"id": 1396, "name": "Breaking Bad", "media_type": "tv", "first_air_date": "2008-01-20"});
        let title = Title::from_value(value, MediaType::Movie).unwrap();
        assert_eq!(title.media_type(), MediaType::Tv);
        assert_eq!(title.display_title(), "Breaking Bad");
        assert_eq!(title.release_date(), Some("2008-01-20"));
    }

    #[test]
    fn test_person_results_skipped() {
        let value = json!({"id": 6193, "name": "Leonardo DiCaprio", "media_type": "person"});
        assert!(Title::from_value(value, MediaType::Movie).is_none());
    }

    #[test]
    fn test_unrated_title_has_no_rating() {
        let value = json!({"id": 5, "title": "Upcoming", "vote_average": 0.0, "vote_count": 0});
        let title = Title::from_value(value, MediaType::Movie).unwrap();
        assert_eq!(title.rating(), None);
    }

    #[test]
    fn test_control_chars_stripped_from_text() {
        let value = json!({"id": 9, "title": "Evil\u{1b}[2JTitle", "overview": "a\u{7}b"});
        let title = Title::from_value(value, MediaType::Movie).unwrap();
        assert_eq!(title.display_title(), "EvilTitle");
        assert_eq!(title.overview(), "ab");
    }

    #[test]
    fn test_payload_round_trip_keeps_variant() {
        let show = Title::Tv(TvShow {
            id: 66732,
            name: "Stranger Things".to_string(),
            first_air_date: Some("2016-07-15".to_string()),
            vote_average: Some(8.7),
            ..Default::default()
        });
        let payload = show.to_payload().unwrap();
        assert_eq!(payload["media_type"], "tv");
        assert_eq!(payload["name"], "Stranger Things");

        let back: Title = serde_json::from_value(payload).unwrap();
        assert_eq!(back, show);
    }

    #[test]
    fn test_details_trailer_and_tv_runtime() {
        let value = json!({
            "id": 1396,
            "name": "Breaking Bad",
            "episode_run_time": [47, 45],
            "number_of_seasons": 5,
            "genres": [{"id": 18, "name": "Drama"}],
            "external_ids": {"imdb_id": "tt0903747"},
            "credits": {"cast": [{"name": "Bryan Cranston", "character": "Walter White"}]},
            "videos": {"results": [
                {"key": "teaser1", "site": "YouTube", "type": "Teaser"},
                {"key": "HhesaQXLuRY", "site": "YouTube", "type": "Trailer", "name": "Official Trailer"}
            ]},
            "recommendations": {"results": [{"id": 60059, "name": "Better Call Saul"}]}
        });
        let raw: RawDetails = serde_json::from_value(value).unwrap();
        let details = raw.into_details(MediaType::Tv).unwrap();

        assert_eq!(details.runtime, Some(47));
        assert_eq!(details.number_of_seasons, Some(5));
        assert_eq!(
            details.trailer_url().as_deref(),
            Some("https://www.youtube.com/watch?v=HhesaQXLuRY")
        );
        assert_eq!(
            details.imdb_url().as_deref(),
            Some("https://www.imdb.com/title/tt0903747/")
        );
        assert_eq!(details.cast[0].character.as_deref(), Some("Walter White"));
        assert_eq!(details.recommendations[0].key(), TitleKey::new(60059, MediaType::Tv));
    }

    #[test]
    fn test_time_window_and_media_type_parse() {
        assert_eq!("DAY".parse::<TimeWindow>(), Ok(TimeWindow::Day));
        assert!("month".parse::<TimeWindow>().is_err());
        assert_eq!("tv".parse::<MediaType>(), Ok(MediaType::Tv));
        assert_eq!(MediaType::Movie.toggle(), MediaType::Tv);
    }

    #[test]
    fn test_page_has_more() {
        let page = TitlePage {
            titles: Vec::new(),
            page: 1,
            total_pages: 3,
        };
        assert!(page.has_more());
        assert!(!TitlePage::empty().has_more());
    }
}
