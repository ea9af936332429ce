//! Application state shared by the input, event and render layers.

use std::borrow::Cow;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

use crate::catalog::{
    Catalog, ExternalRatings, Genre, Listing, ListingSource, MediaType, TimeWindow, Title,
    TitleDetails, TitlePage,
};
use crate::config::Config;
use crate::search::{SearchRequest, SearchSession};
use crate::storage::{
    Database, WatchlistError, WatchlistFilter, WatchlistItem, WatchlistSort, WatchlistStore,
};
use crate::theme::{ColorPalette, ThemeVariant};
use crate::util::MAX_SEARCH_QUERY_LENGTH;

/// Slot holding the last selected theme.
pub const THEME_KEY: &str = "marquee.theme";

/// How long a status message stays visible.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Number of frames in the loading spinner animation.
pub const SPINNER_FRAMES: usize = 10;

// ============================================================================
// Tabs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Trending,
    Search,
    Genres,
    Watchlist,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Trending, Tab::Search, Tab::Genres, Tab::Watchlist];

    pub fn title(self) -> &'static str {
        match self {
            Self::Trending => "Trending",
            Self::Search => "Search",
            Self::Genres => "Genres",
            Self::Watchlist => "Watchlist",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Trending => 0,
            Self::Search => 1,
            Self::Genres => 2,
            Self::Watchlist => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

// ============================================================================
// Background Events
// ============================================================================

/// Completion events sent by background tasks to the main loop.
///
/// Every catalog result carries the generation it was requested under so the
/// handler can drop responses that arrive after the user moved on.
#[derive(Debug)]
pub enum AppEvent {
    TrendingLoaded {
        generation: u64,
        listing: Listing,
    },
    GenresLoaded {
        generation: u64,
        media_type: MediaType,
        genres: Vec<Genre>,
        source: ListingSource,
    },
    DiscoverLoaded {
        generation: u64,
        page: u32,
        results: TitlePage,
    },
    SearchCompleted {
        query: String,
        generation: u64,
        page: u32,
        results: TitlePage,
    },
    DetailsLoaded {
        generation: u64,
        details: Option<TitleDetails>,
    },
    RatingsLoaded {
        generation: u64,
        ratings: Option<ExternalRatings>,
    },
    /// A background task panicked. `task` names the spawner.
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

impl AppEvent {
    /// Variant name for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TrendingLoaded { .. } => "TrendingLoaded",
            Self::GenresLoaded { .. } => "GenresLoaded",
            Self::DiscoverLoaded { .. } => "DiscoverLoaded",
            Self::SearchCompleted { .. } => "SearchCompleted",
            Self::DetailsLoaded { .. } => "DetailsLoaded",
            Self::RatingsLoaded { .. } => "RatingsLoaded",
            Self::TaskPanicked { .. } => "TaskPanicked",
        }
    }
}

// ============================================================================
// Per-tab State
// ============================================================================

pub struct TrendingState {
    pub window: TimeWindow,
    pub listing: Option<Listing>,
    pub generation: u64,
    pub loading: bool,
    pub selected: usize,
}

impl TrendingState {
    fn new(window: TimeWindow) -> Self {
        Self {
            window,
            listing: None,
            generation: 0,
            loading: false,
            selected: 0,
        }
    }

    pub fn titles(&self) -> &[Title] {
        self.listing
            .as_ref()
            .map(|l| l.page.titles.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_sample(&self) -> bool {
        self.listing
            .as_ref()
            .is_some_and(|l| l.source == ListingSource::Sample)
    }

    /// Starts a new request and returns its generation.
    pub fn begin(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.loading = true;
        self.generation
    }

    pub fn apply(&mut self, generation: u64, listing: Listing) -> bool {
        if generation != self.generation {
            tracing::debug!(
                expected = self.generation,
                got = generation,
                "Ignoring stale trending results"
            );
            return false;
        }
        self.loading = false;
        self.listing = Some(listing);
        self.selected = 0;
        true
    }
}

/// Genre browser: the genre list for one media type and the discover
/// results for the highlighted genre.
pub struct GenreState {
    pub media_type: MediaType,
    pub genres: Vec<Genre>,
    pub source: ListingSource,
    pub selected_genre: usize,
    pub titles: Vec<Title>,
    pub page: u32,
    pub total_pages: u32,
    pub list_generation: u64,
    pub discover_generation: u64,
    pub loading: bool,
    pub selected: usize,
}

impl GenreState {
    fn new() -> Self {
        Self {
            media_type: MediaType::default(),
            genres: Vec::new(),
            source: ListingSource::Live,
            selected_genre: 0,
            titles: Vec::new(),
            page: 0,
            total_pages: 0,
            list_generation: 0,
            discover_generation: 0,
            loading: false,
            selected: 0,
        }
    }

    pub fn current_genre(&self) -> Option<&Genre> {
        self.genres.get(self.selected_genre)
    }

    pub fn has_more(&self) -> bool {
        self.page >= 1 && self.page < self.total_pages
    }

    /// Starts loading the genre list and returns its generation.
    pub fn begin_list(&mut self) -> u64 {
        self.list_generation = self.list_generation.wrapping_add(1);
        self.loading = true;
        self.list_generation
    }

    /// Starts loading a discover page and returns its generation.
    pub fn begin_discover(&mut self) -> u64 {
        self.discover_generation = self.discover_generation.wrapping_add(1);
        self.loading = true;
        self.discover_generation
    }

    pub fn apply_genres(
        &mut self,
        generation: u64,
        media_type: MediaType,
        genres: Vec<Genre>,
        source: ListingSource,
    ) -> bool {
        if generation != self.list_generation || media_type != self.media_type {
            tracing::debug!(
                expected = self.list_generation,
                got = generation,
                "Ignoring stale genre list"
            );
            return false;
        }
        self.loading = false;
        self.genres = genres;
        self.source = source;
        self.selected_genre = 0;
        self.reset_titles();
        true
    }

    /// Page 1 replaces the titles, later non-empty pages append.
    pub fn apply_discover(&mut self, generation: u64, page: u32, results: TitlePage) -> bool {
        if generation != self.discover_generation {
            tracing::debug!(
                expected = self.discover_generation,
                got = generation,
                "Ignoring stale discover results"
            );
            return false;
        }
        self.loading = false;
        if page <= 1 {
            self.titles = results.titles;
            self.page = 1;
            self.total_pages = results.total_pages;
            self.selected = 0;
        } else if !results.titles.is_empty() {
            self.titles.extend(results.titles);
            self.page = page;
            self.total_pages = results.total_pages.max(page);
        }
        true
    }

    /// Moves the genre highlight. Returns `true` if it changed.
    pub fn cycle_genre(&mut self, forward: bool) -> bool {
        let len = self.genres.len();
        if len < 2 {
            return false;
        }
        self.selected_genre = if forward {
            (self.selected_genre + 1) % len
        } else {
            (self.selected_genre + len - 1) % len
        };
        self.reset_titles();
        true
    }

    /// Switches movie/tv and drops everything loaded for the old type.
    pub fn toggle_media_type(&mut self) {
        self.media_type = self.media_type.toggle();
        self.genres.clear();
        self.selected_genre = 0;
        self.reset_titles();
    }

    fn reset_titles(&mut self) {
        self.titles.clear();
        self.page = 0;
        self.total_pages = 0;
        self.selected = 0;
    }
}

/// Detail overlay for one title.
pub struct DetailsState {
    /// Summary the overlay was opened from, shown until details arrive.
    pub title: Title,
    pub generation: u64,
    pub details: Option<TitleDetails>,
    pub ratings: Option<ExternalRatings>,
    pub loading: bool,
    pub ratings_loading: bool,
    pub scroll: u16,
}

impl DetailsState {
    /// Poster, trailer and IMDb links prefer the full record when loaded.
    pub fn current_title(&self) -> &Title {
        self.details.as_ref().map(|d| &d.title).unwrap_or(&self.title)
    }
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub db: Database,
    pub catalog: Catalog,
    pub watchlist: WatchlistStore,
    pub tab: Tab,

    pub trending: TrendingState,

    pub search: SearchSession,
    /// Text in the search box.
    pub search_input: String,
    /// Keys go to the search box instead of the key table.
    pub input_mode: bool,
    pub search_selected: usize,

    pub genres: GenreState,

    pub watchlist_filter: WatchlistFilter,
    pub watchlist_sort: WatchlistSort,
    pub watchlist_selected: usize,

    pub details: Option<DetailsState>,
    details_generation: u64,

    pub theme: ThemeVariant,
    pub palette: ColorPalette,

    pub status_message: Option<(Cow<'static, str>, Instant)>,
    /// Set whenever state changes; the loop redraws only when true.
    pub needs_redraw: bool,
    pub spinner_frame: usize,

    pub trending_handle: Option<JoinHandle<()>>,
    pub genres_handle: Option<JoinHandle<()>>,
    pub discover_handle: Option<JoinHandle<()>>,
    pub details_handle: Option<JoinHandle<()>>,
    pub ratings_handle: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(db: Database, catalog: Catalog, watchlist: WatchlistStore, config: &Config) -> Self {
        let theme = ThemeVariant::from_str_name(&config.theme).unwrap_or_else(|| {
            tracing::warn!(theme = %config.theme, "Unknown theme, using dark");
            ThemeVariant::Dark
        });

        Self {
            db,
            catalog,
            watchlist,
            tab: Tab::Trending,
            trending: TrendingState::new(config.time_window()),
            search: SearchSession::new(config.search_debounce()),
            search_input: String::new(),
            input_mode: false,
            search_selected: 0,
            genres: GenreState::new(),
            watchlist_filter: WatchlistFilter::default(),
            watchlist_sort: WatchlistSort::default(),
            watchlist_selected: 0,
            details: None,
            details_generation: 0,
            theme,
            palette: theme.palette(),
            status_message: None,
            needs_redraw: true,
            spinner_frame: 0,
            trending_handle: None,
            genres_handle: None,
            discover_handle: None,
            details_handle: None,
            ratings_handle: None,
        }
    }

    // ------------------------------------------------------------------------
    // Status bar
    // ------------------------------------------------------------------------

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired (older than 3 seconds)
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() >= STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    /// Whether the visible tab or overlay is waiting on a request.
    pub fn is_loading(&self) -> bool {
        if let Some(details) = &self.details {
            return details.loading;
        }
        match self.tab {
            Tab::Trending => self.trending.loading,
            Tab::Search => self.search.is_loading(),
            Tab::Genres => self.genres.loading,
            Tab::Watchlist => false,
        }
    }

    // ------------------------------------------------------------------------
    // Theme
    // ------------------------------------------------------------------------

    /// Applies the theme saved by a previous session, if any.
    pub async fn load_theme_preference(&mut self) {
        match self.db.get_slot(THEME_KEY).await {
            Ok(Some(name)) => match ThemeVariant::from_str_name(&name) {
                Some(variant) => {
                    self.theme = variant;
                    self.palette = variant.palette();
                }
                None => tracing::warn!(theme = %name, "Ignoring unknown saved theme"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to read saved theme"),
        }
    }

    /// Switches to the next theme and saves the choice.
    pub async fn cycle_theme(&mut self) {
        self.theme = self.theme.next();
        self.palette = self.theme.palette();

        if let Err(e) = self.db.set_slot(THEME_KEY, self.theme.key()).await {
            tracing::warn!(error = %e, "Failed to save theme");
            self.set_status(format!("Theme: {} (not saved)", self.theme.name()));
        } else {
            self.set_status(format!("Theme: {}", self.theme.name()));
        }
    }

    // ------------------------------------------------------------------------
    // Tabs and selection
    // ------------------------------------------------------------------------

    /// Switches tab. Leaving Search tears down its pending debounce timer.
    pub fn switch_tab(&mut self, tab: Tab) {
        if tab == self.tab {
            return;
        }
        if self.tab == Tab::Search {
            self.search.cancel();
            self.input_mode = false;
        }
        self.tab = tab;
        self.clamp_selections();
    }

    pub fn watchlist_view(&self) -> Vec<&WatchlistItem> {
        self.watchlist
            .view(self.watchlist_filter, self.watchlist_sort)
    }

    fn list_len(&self) -> usize {
        match self.tab {
            Tab::Trending => self.trending.titles().len(),
            Tab::Search => self.search.visible().len(),
            Tab::Genres => self.genres.titles.len(),
            Tab::Watchlist => self.watchlist_view().len(),
        }
    }

    fn selected_mut(&mut self) -> &mut usize {
        match self.tab {
            Tab::Trending => &mut self.trending.selected,
            Tab::Search => &mut self.search_selected,
            Tab::Genres => &mut self.genres.selected,
            Tab::Watchlist => &mut self.watchlist_selected,
        }
    }

    pub fn selected_index(&self) -> usize {
        match self.tab {
            Tab::Trending => self.trending.selected,
            Tab::Search => self.search_selected,
            Tab::Genres => self.genres.selected,
            Tab::Watchlist => self.watchlist_selected,
        }
    }

    pub fn nav_up(&mut self) {
        let selected = self.selected_mut();
        *selected = selected.saturating_sub(1);
    }

    pub fn nav_down(&mut self) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        let selected = self.selected_mut();
        *selected = selected.saturating_add(1).min(len - 1);
    }

    /// Keeps the active tab's selection inside its list.
    pub fn clamp_selections(&mut self) {
        let max_index = self.list_len().saturating_sub(1);
        let selected = self.selected_mut();
        *selected = (*selected).min(max_index);
    }

    /// Title under the cursor on the active tab.
    pub fn selected_title(&self) -> Option<Title> {
        match self.tab {
            Tab::Trending => self.trending.titles().get(self.trending.selected).cloned(),
            Tab::Search => self
                .search
                .visible()
                .get(self.search_selected)
                .map(|t| (*t).clone()),
            Tab::Genres => self.genres.titles.get(self.genres.selected).cloned(),
            Tab::Watchlist => self
                .watchlist_view()
                .get(self.watchlist_selected)
                .and_then(|item| item.to_title()),
        }
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------

    /// Appends a character to the search box. Returns `false` at the length cap.
    pub fn push_search_char(&mut self, c: char) -> bool {
        if self.search_input.chars().count() >= MAX_SEARCH_QUERY_LENGTH {
            return false;
        }
        self.search_input.push(c);
        self.search.input(self.search_input.clone());
        true
    }

    pub fn pop_search_char(&mut self) {
        if self.search_input.pop().is_some() {
            self.search.input(self.search_input.clone());
        }
    }

    /// Settles the search box now instead of waiting out the quiet period.
    pub fn submit_search(&mut self) -> Option<SearchRequest> {
        let value = self.search.debouncer.flush();
        self.search.on_settled(&value)
    }

    /// Handles a settled debounce value. A blank value clears the results.
    pub fn on_search_settled(&mut self, value: &str) -> Option<SearchRequest> {
        let request = self.search.on_settled(value);
        if request.is_none() {
            self.search_selected = 0;
        }
        request
    }

    pub fn apply_search(&mut self, generation: u64, page: u32, results: TitlePage) -> bool {
        if !self.search.apply(generation, page, results) {
            return false;
        }
        if page <= 1 {
            self.search_selected = 0;
        }
        if self.tab == Tab::Search {
            self.clamp_selections();
        }
        true
    }

    // ------------------------------------------------------------------------
    // Details overlay
    // ------------------------------------------------------------------------

    /// Opens the overlay for `title` and returns the generation its
    /// requests must carry.
    pub fn open_details(&mut self, title: Title) -> u64 {
        self.details_generation = self.details_generation.wrapping_add(1);
        self.details = Some(DetailsState {
            title,
            generation: self.details_generation,
            details: None,
            ratings: None,
            loading: true,
            ratings_loading: true,
            scroll: 0,
        });
        self.details_generation
    }

    pub fn close_details(&mut self) {
        self.details = None;
        for handle in [self.details_handle.take(), self.ratings_handle.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }

    pub fn apply_details(&mut self, generation: u64, details: Option<TitleDetails>) -> bool {
        match self.details.as_mut() {
            Some(state) if state.generation == generation => {
                state.loading = false;
                state.details = details;
                true
            }
            _ => {
                tracing::debug!(
                    expected = self.details_generation,
                    got = generation,
                    "Ignoring stale details"
                );
                false
            }
        }
    }

    pub fn apply_ratings(&mut self, generation: u64, ratings: Option<ExternalRatings>) -> bool {
        match self.details.as_mut() {
            Some(state) if state.generation == generation => {
                state.ratings_loading = false;
                state.ratings = ratings.filter(|r| !r.is_empty());
                true
            }
            _ => {
                tracing::debug!(
                    expected = self.details_generation,
                    got = generation,
                    "Ignoring stale ratings"
                );
                false
            }
        }
    }

    // ------------------------------------------------------------------------
    // Watchlist
    // ------------------------------------------------------------------------

    /// Adds `title` to the watchlist, or removes it if already saved.
    ///
    /// # Errors
    ///
    /// A failed write is returned after the in-memory list has changed.
    pub async fn toggle_watchlist(&mut self, title: &Title) -> Result<(), WatchlistError> {
        let name = title.display_title().to_string();
        if self.watchlist.is_present(title.id(), title.media_type()) {
            self.watchlist.remove(title.id(), title.media_type()).await?;
            self.set_status(format!("Removed \"{}\" from watchlist", name));
        } else {
            self.watchlist.add(title).await?;
            self.set_status(format!("Added \"{}\" to watchlist", name));
        }
        if self.tab == Tab::Watchlist {
            self.clamp_selections();
        }
        Ok(())
    }

    /// Flips the watched flag of the highlighted watchlist entry.
    pub async fn toggle_watched_selected(&mut self) -> Result<(), WatchlistError> {
        let Some(key) = self
            .watchlist_view()
            .get(self.watchlist_selected)
            .map(|item| item.key())
        else {
            return Ok(());
        };

        if let Some(watched) = self.watchlist.toggle_watched(key.id, key.media_type).await? {
            self.set_status(if watched {
                "Marked as watched"
            } else {
                "Marked as not watched"
            });
        }
        self.clamp_selections();
        Ok(())
    }

    /// Removes the highlighted watchlist entry.
    pub async fn remove_selected(&mut self) -> Result<(), WatchlistError> {
        let Some((key, name)) = self
            .watchlist_view()
            .get(self.watchlist_selected)
            .map(|item| (item.key(), item.display_title().to_string()))
        else {
            return Ok(());
        };

        self.watchlist.remove(key.id, key.media_type).await?;
        self.set_status(format!("Removed \"{}\" from watchlist", name));
        self.clamp_selections();
        Ok(())
    }

    pub fn cycle_watchlist_filter(&mut self) {
        self.watchlist_filter = self.watchlist_filter.next();
        self.watchlist_selected = 0;
    }

    pub fn cycle_watchlist_sort(&mut self) {
        self.watchlist_sort = self.watchlist_sort.next();
        self.watchlist_selected = 0;
    }

    /// Clears the loading flag owned by a task that panicked.
    pub fn task_failed(&mut self, task: &str) {
        match task {
            "trending" => self.trending.loading = false,
            "search" => self.search.fail(),
            "genres" | "discover" => self.genres.loading = false,
            "details" => {
                if let Some(state) = self.details.as_mut() {
                    state.loading = false;
                }
            }
            "ratings" => {
                if let Some(state) = self.details.as_mut() {
                    state.ratings_loading = false;
                }
            }
            _ => {}
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
