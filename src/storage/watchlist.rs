//! Personal watchlist persisted as one JSON document in the key-value table.
//!
//! The in-memory list is authoritative for reads. Every mutation rewrites
//! the whole serialized list under [`WATCHLIST_KEY`] before returning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashSet;
use thiserror::Error;

use super::schema::Database;
use crate::catalog::{MediaType, Title, TitleKey};
use crate::util::year_of;

/// Slot holding the serialized watchlist.
pub const WATCHLIST_KEY: &str = "marquee.watchlist";

/// Identity of a saved title.
pub type WatchlistKey = TitleKey;

/// Fields owned by the store. Everything else in a payload is metadata.
const RESERVED_FIELDS: [&str; 5] = ["id", "media_type", "mediaType", "watched", "addedAt"];

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum WatchlistError {
    /// The key-value store failed to read or write the slot.
    #[error("Watchlist storage failed: {0:#}")]
    Storage(anyhow::Error),

    #[error("Failed to serialize watchlist: {0}")]
    Serialize(#[from] serde_json::Error),

    /// An added payload lacked a usable identity.
    #[error("Invalid watchlist entry: {0}")]
    InvalidPayload(String),
}

// ============================================================================
// Items
// ============================================================================

/// One saved title.
///
/// `metadata` carries whatever the caller supplied (title, poster path,
/// overview, rating, ...) and is written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistItem {
    pub id: i64,
    #[serde(default, alias = "mediaType")]
    pub media_type: MediaType,
    #[serde(rename = "addedAt")]
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub watched: bool,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl WatchlistItem {
    pub fn key(&self) -> WatchlistKey {
        TitleKey::new(self.id, self.media_type)
    }

    fn text(&self, field: &str) -> Option<&str> {
        self.metadata
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// `title` for movies, `name` for shows, whichever is present.
    pub fn display_title(&self) -> &str {
        self.text("title")
            .or_else(|| self.text("name"))
            .unwrap_or("Untitled")
    }

    pub fn rating(&self) -> Option<f64> {
        self.metadata
            .get("vote_average")
            .and_then(Value::as_f64)
            .filter(|r| *r > 0.0)
    }

    pub fn year(&self) -> Option<i32> {
        year_of(
            self.text("release_date")
                .or_else(|| self.text("first_air_date")),
        )
    }

    /// Rebuilds a catalog title from the stored metadata.
    pub fn to_title(&self) -> Option<Title> {
        let mut record = self.metadata.clone();
        record.insert("id".to_string(), Value::from(self.id));
        record.insert(
            "media_type".to_string(),
            Value::from(self.media_type.as_str()),
        );
        Title::from_value(Value::Object(record), self.media_type)
    }
}

// ============================================================================
// View Options
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchlistFilter {
    #[default]
    All,
    Unwatched,
    Watched,
}

impl WatchlistFilter {
    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Unwatched,
            Self::Unwatched => Self::Watched,
            Self::Watched => Self::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Unwatched => "To Watch",
            Self::Watched => "Watched",
        }
    }

    fn matches(self, item: &WatchlistItem) -> bool {
        match self {
            Self::All => true,
            Self::Unwatched => !item.watched,
            Self::Watched => item.watched,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchlistSort {
    /// Newest first
    #[default]
    Added,
    Title,
    /// Highest first, unrated last
    Rating,
}

impl WatchlistSort {
    pub fn next(self) -> Self {
        match self {
            Self::Added => Self::Title,
            Self::Title => Self::Rating,
            Self::Rating => Self::Added,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Added => "Date Added",
            Self::Title => "Title",
            Self::Rating => "Rating",
        }
    }
}

// ============================================================================
// Store
// ============================================================================

/// Session-owned watchlist.
///
/// Construct once with [`WatchlistStore::initialize`] and hand out `&mut`
/// to whoever mutates it.
pub struct WatchlistStore {
    db: Database,
    items: Vec<WatchlistItem>,
}

impl WatchlistStore {
    /// Loads the watchlist from its slot.
    ///
    /// A missing slot yields an empty list. A slot that does not parse as a
    /// list of items is logged and also yields an empty list; it is left in
    /// place until the next mutation overwrites it.
    ///
    /// # Errors
    ///
    /// Returns `WatchlistError::Storage` only if the database read itself fails.
    pub async fn initialize(db: Database) -> Result<Self, WatchlistError> {
        let raw = db
            .get_slot(WATCHLIST_KEY)
            .await
            .map_err(WatchlistError::Storage)?;

        let items = match raw {
            None => Vec::new(),
            Some(text) => match serde_json::from_str::<Vec<WatchlistItem>>(&text) {
                Ok(items) => dedupe(items),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        key = WATCHLIST_KEY,
                        "Stored watchlist is malformed, starting empty"
                    );
                    Vec::new()
                }
            },
        };

        tracing::info!(count = items.len(), "Watchlist loaded");
        Ok(Self { db, items })
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[WatchlistItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: i64, media_type: MediaType) -> Option<&WatchlistItem> {
        self.items
            .iter()
            .find(|item| item.id == id && item.media_type == media_type)
    }

    pub fn is_present(&self, id: i64, media_type: MediaType) -> bool {
        self.get(id, media_type).is_some()
    }

    pub fn count_watched(&self) -> usize {
        self.items.iter().filter(|item| item.watched).count()
    }

    pub fn count_unwatched(&self) -> usize {
        self.items.iter().filter(|item| !item.watched).count()
    }

    /// Adds a catalog title. See [`WatchlistStore::add_payload`].
    pub async fn add(&mut self, title: &Title) -> Result<bool, WatchlistError> {
        let payload = title.to_payload()?;
        self.add_payload(payload).await
    }

    /// Adds a raw metadata payload.
    ///
    /// The payload must be an object with an integer `id`. A missing
    /// `media_type` means `movie`. Returns `Ok(false)` without writing if the
    /// key is already saved.
    ///
    /// # Errors
    ///
    /// `InvalidPayload` for a payload without identity. `Storage` if the write
    /// fails, in which case the item stays in memory.
    pub async fn add_payload(&mut self, payload: Value) -> Result<bool, WatchlistError> {
        let Value::Object(mut fields) = payload else {
            return Err(WatchlistError::InvalidPayload(
                "payload is not an object".to_string(),
            ));
        };

        let id = fields
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| WatchlistError::InvalidPayload("missing integer id".to_string()))?;

        let media_type = match fields.get("media_type").or_else(|| fields.get("mediaType")) {
            None | Some(Value::Null) => MediaType::default(),
            Some(Value::String(kind)) => kind.parse().map_err(WatchlistError::InvalidPayload)?,
            Some(other) => {
                return Err(WatchlistError::InvalidPayload(format!(
                    "media_type must be a string, got {other}"
                )))
            }
        };

        if self.is_present(id, media_type) {
            tracing::debug!(id, %media_type, "Already on watchlist");
            return Ok(false);
        }

        for field in RESERVED_FIELDS {
            fields.remove(field);
        }

        self.items.push(WatchlistItem {
            id,
            media_type,
            added_at: Utc::now(),
            watched: false,
            metadata: fields,
        });
        self.persist().await?;
        Ok(true)
    }

    /// Removes the item if present and writes the list either way.
    ///
    /// Returns whether an item was removed.
    pub async fn remove(&mut self, id: i64, media_type: MediaType) -> Result<bool, WatchlistError> {
        let before = self.items.len();
        self.items
            .retain(|item| !(item.id == id && item.media_type == media_type));
        let removed = self.items.len() != before;
        self.persist().await?;
        Ok(removed)
    }

    /// Flips `watched` in place and writes the list.
    ///
    /// Returns the new flag, or `None` if the item is not saved.
    pub async fn toggle_watched(
        &mut self,
        id: i64,
        media_type: MediaType,
    ) -> Result<Option<bool>, WatchlistError> {
        let flag = self
            .items
            .iter_mut()
            .find(|item| item.id == id && item.media_type == media_type)
            .map(|item| {
                item.watched = !item.watched;
                item.watched
            });
        self.persist().await?;
        Ok(flag)
    }

    /// Filtered and sorted view for display.
    pub fn view(&self, filter: WatchlistFilter, sort: WatchlistSort) -> Vec<&WatchlistItem> {
        let mut view: Vec<&WatchlistItem> =
            self.items.iter().filter(|item| filter.matches(item)).collect();

        match sort {
            WatchlistSort::Added => {
                // Ties (same timestamp) put the later insertion first
                view.reverse();
                view.sort_by(|a, b| b.added_at.cmp(&a.added_at));
            }
            WatchlistSort::Title => {
                view.sort_by_cached_key(|item| item.display_title().to_lowercase());
            }
            WatchlistSort::Rating => {
                view.sort_by(|a, b| match (a.rating(), b.rating()) {
                    (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                });
            }
        }

        view
    }

    /// Writes the full list to the slot.
    async fn persist(&self) -> Result<(), WatchlistError> {
        let json = serde_json::to_string(&self.items)?;
        self.db
            .set_slot(WATCHLIST_KEY, &json)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, count = self.items.len(), "Failed to persist watchlist");
                WatchlistError::Storage(e)
            })
    }
}

/// Keeps the first occurrence of each key.
fn dedupe(items: Vec<WatchlistItem>) -> Vec<WatchlistItem> {
    let before = items.len();
    let mut seen = HashSet::with_capacity(items.len());
    let items: Vec<WatchlistItem> = items
        .into_iter()
        .filter(|item| seen.insert(item.key()))
        .collect();
    if items.len() != before {
        tracing::warn!(
            dropped = before - items.len(),
            "Dropped duplicate watchlist entries"
        );
    }
    items
}
