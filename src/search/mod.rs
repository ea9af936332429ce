//! Debounced title search with out-of-order response protection.

mod debounce;

use std::cmp::Ordering;
use tokio::time::Duration;

use crate::catalog::{MediaType, Title, TitlePage};

pub use debounce::{DebounceState, Debouncer, DEFAULT_QUIET_PERIOD};

/// A search the caller should issue. The response must be handed back to
/// [`SearchSession::apply`] together with `generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub page: u32,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaFilter {
    #[default]
    All,
    Movies,
    Tv,
}

impl MediaFilter {
    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Movies,
            Self::Movies => Self::Tv,
            Self::Tv => Self::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Movies => "Movies",
            Self::Tv => "TV Shows",
        }
    }

    fn matches(self, title: &Title) -> bool {
        match self {
            Self::All => true,
            Self::Movies => title.media_type() == MediaType::Movie,
            Self::Tv => title.media_type() == MediaType::Tv,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultSort {
    #[default]
    Popularity,
    Rating,
    /// Newest first
    ReleaseDate,
}

impl ResultSort {
    pub fn next(self) -> Self {
        match self {
            Self::Popularity => Self::Rating,
            Self::Rating => Self::ReleaseDate,
            Self::ReleaseDate => Self::Popularity,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Popularity => "Popularity",
            Self::Rating => "Rating",
            Self::ReleaseDate => "Release Date",
        }
    }
}

/// Descending order with missing values last.
fn desc<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Search tab state: the debouncer, the results it produced, and the
/// generation counter guarding against late responses.
pub struct SearchSession {
    pub debouncer: Debouncer,
    generation: u64,
    query: String,
    results: Vec<Title>,
    page: u32,
    total_pages: u32,
    loading: bool,
    pub filter: MediaFilter,
    pub sort: ResultSort,
}

impl SearchSession {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(quiet_period),
            generation: 0,
            query: String::new(),
            results: Vec::new(),
            page: 0,
            total_pages: 0,
            loading: false,
            filter: MediaFilter::default(),
            sort: ResultSort::default(),
        }
    }

    /// Feeds one keystroke's worth of input into the debouncer.
    pub fn input(&mut self, value: impl Into<String>) {
        self.debouncer.push(value);
    }

    /// Handles a settled value.
    ///
    /// Every settlement bumps the generation, so responses to earlier
    /// queries are dropped when they arrive. A blank value clears the
    /// results and issues nothing.
    pub fn on_settled(&mut self, value: &str) -> Option<SearchRequest> {
        self.generation = self.generation.wrapping_add(1);
        let query = value.trim();

        if query.is_empty() {
            tracing::debug!(generation = self.generation, "Blank query, clearing results");
            self.query.clear();
            self.results.clear();
            self.page = 0;
            self.total_pages = 0;
            self.loading = false;
            return None;
        }

        self.query = query.to_string();
        self.loading = true;
        Some(SearchRequest {
            query: self.query.clone(),
            page: 1,
            generation: self.generation,
        })
    }

    /// Request for the page after the last one applied, if there is one.
    pub fn next_page(&mut self) -> Option<SearchRequest> {
        if self.loading || !self.has_more() {
            return None;
        }
        self.generation = self.generation.wrapping_add(1);
        self.loading = true;
        Some(SearchRequest {
            query: self.query.clone(),
            page: self.page + 1,
            generation: self.generation,
        })
    }

    /// Applies a response. Returns `false` (and changes nothing) when the
    /// response belongs to a superseded request.
    ///
    /// Page 1 replaces the results; later pages are appended. An empty later
    /// page leaves the page counter alone so the request can be retried.
    pub fn apply(&mut self, generation: u64, requested_page: u32, response: TitlePage) -> bool {
        if generation != self.generation {
            tracing::debug!(
                expected = self.generation,
                got = generation,
                "Ignoring stale search results"
            );
            return false;
        }

        self.loading = false;
        if requested_page <= 1 {
            self.results = response.titles;
            self.page = 1;
            self.total_pages = response.total_pages;
        } else if !response.titles.is_empty() {
            self.results.extend(response.titles);
            self.page = requested_page;
            self.total_pages = response.total_pages.max(requested_page);
        }
        true
    }

    /// Clears the loading flag after the in-flight request died without a
    /// response. Results and paging stay as they were so `n` can retry.
    pub fn fail(&mut self) {
        self.loading = false;
    }

    /// Tears down the pending debounce timer (leaving the search tab).
    pub fn cancel(&mut self) {
        self.debouncer.cancel();
    }

    /// Results after the media filter and sort are applied.
    pub fn visible(&self) -> Vec<&Title> {
        let mut view: Vec<&Title> = self
            .results
            .iter()
            .filter(|t| self.filter.matches(t))
            .collect();

        match self.sort {
            ResultSort::Popularity => {
                view.sort_by(|a, b| desc(Some(a.popularity()), Some(b.popularity())))
            }
            ResultSort::Rating => view.sort_by(|a, b| desc(a.rating(), b.rating())),
            ResultSort::ReleaseDate => view.sort_by(|a, b| desc(a.release_date(), b.release_date())),
        }

        view
    }

    pub fn results(&self) -> &[Title] {
        &self.results
    }

    /// Query the current results belong to (or are loading for).
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn has_more(&self) -> bool {
        !self.query.is_empty() && self.page >= 1 && self.page < self.total_pages
    }
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Movie, TvShow};
    use pretty_assertions::assert_eq;

    fn movie(id: i64, title: &str, popularity: f64, rating: f64, date: &str) -> Title {
        Title::Movie(Movie {
            id,
            title: title.to_string(),
            popularity: Some(popularity),
            vote_average: Some(rating),
            release_date: Some(date.to_string()),
            ..Default::default()
        })
    }

    fn show(id: i64, name: &str, popularity: f64) -> Title {
        Title::Tv(TvShow {
            id,
            name: name.to_string(),
            popularity: Some(popularity),
            ..Default::default()
        })
    }

    fn page(titles: Vec<Title>, page: u32, total_pages: u32) -> TitlePage {
        TitlePage {
            titles,
            page,
            total_pages,
        }
    }

    fn names(session: &SearchSession) -> Vec<String> {
        session
            .visible()
            .iter()
            .map(|t| t.display_title().to_string())
            .collect()
    }

    #[test]
    fn test_blank_settlement_clears_and_issues_nothing() {
        let mut session = SearchSession::default();
        let req = session.on_settled("alien").unwrap();
        assert!(session.apply(req.generation, 1, page(vec![movie(1, "Alien", 50.0, 8.5, "1979-05-25")], 1, 1)));
        assert_eq!(session.results().len(), 1);

        assert!(session.on_settled("   ").is_none());
        assert!(session.results().is_empty());
        assert_eq!(session.query(), "");
        assert!(!session.is_loading());
    }

    #[test]
    fn test_blank_settlement_invalidates_in_flight() {
        let mut session = SearchSession::default();
        let req = session.on_settled("alien").unwrap();
        session.on_settled("");

        assert!(!session.apply(req.generation, 1, page(vec![movie(1, "Alien", 1.0, 1.0, "")], 1, 1)));
        assert!(session.results().is_empty());
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut session = SearchSession::default();
        let old = session.on_settled("rust").unwrap();
        let new = session.on_settled("python").unwrap();
        assert_ne!(old.generation, new.generation);

        // Newer response arrives first, older one late
        assert!(session.apply(new.generation, 1, page(vec![movie(2, "Monty Python", 10.0, 7.9, "1975-03-14")], 1, 1)));
        assert!(!session.apply(old.generation, 1, page(vec![movie(3, "Rust", 5.0, 6.0, "2024-11-21")], 1, 1)));

        assert_eq!(names(&session), vec!["Monty Python"]);
    }

    #[test]
    fn test_next_page_appends() {
        let mut session = SearchSession::default();
        let req = session.on_settled("star").unwrap();
        assert!(session.next_page().is_none(), "no paging while loading");

        session.apply(req.generation, 1, page(vec![movie(1, "Star Wars", 90.0, 8.2, "1977-05-25")], 1, 2));
        assert!(session.has_more());

        let req = session.next_page().unwrap();
        assert_eq!(req.page, 2);
        assert_eq!(req.query, "star");
        session.apply(req.generation, 2, page(vec![movie(2, "Star Trek", 60.0, 7.9, "2009-05-08")], 2, 2));

        assert_eq!(session.results().len(), 2);
        assert_eq!(session.page(), 2);
        assert!(!session.has_more());
        assert!(session.next_page().is_none());
    }

    #[test]
    fn test_failed_next_page_keeps_results() {
        let mut session = SearchSession::default();
        let req = session.on_settled("star").unwrap();
        session.apply(req.generation, 1, page(vec![movie(1, "Star Wars", 90.0, 8.2, "1977-05-25")], 1, 3));

        let req = session.next_page().unwrap();
        session.apply(req.generation, 2, TitlePage::empty());

        assert_eq!(session.results().len(), 1);
        assert_eq!(session.page(), 1);
        assert_eq!(session.next_page().map(|r| r.page), Some(2));
    }

    #[test]
    fn test_filter_and_sort() {
        let mut session = SearchSession::default();
        let req = session.on_settled("the").unwrap();
        session.apply(
            req.generation,
            1,
            page(
                vec![
                    movie(1, "The Thing", 30.0, 8.1, "1982-06-25"),
                    show(2, "The Wire", 80.0),
                    movie(3, "The Matrix", 70.0, 8.7, "1999-03-31"),
                ],
                1,
                1,
            ),
        );

        assert_eq!(names(&session), vec!["The Wire", "The Matrix", "The Thing"]);

        session.sort = ResultSort::Rating;
        assert_eq!(names(&session), vec!["The Matrix", "The Thing", "The Wire"]);

        session.sort = ResultSort::ReleaseDate;
        assert_eq!(names(&session), vec!["The Matrix", "The Thing", "The Wire"]);

        session.filter = MediaFilter::Tv;
        assert_eq!(names(&session), vec!["The Wire"]);

        session.filter = MediaFilter::Movies;
        session.sort = ResultSort::Popularity;
        assert_eq!(names(&session), vec!["The Matrix", "The Thing"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_issues_one_request() {
        let mut session = SearchSession::new(Duration::from_millis(500));
        for prefix in ["d", "du", "dun", "dune"] {
            session.input(prefix);
            tokio::time::advance(Duration::from_millis(100)).await;
        }

        let settled = session.debouncer.settled().await;
        let req = session.on_settled(&settled).unwrap();
        assert_eq!(req.query, "dune");
        assert_eq!(req.generation, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_on_teardown() {
        let mut session = SearchSession::default();
        session.input("dune");
        session.cancel();
        let fired =
            tokio::time::timeout(Duration::from_secs(2), session.debouncer.settled()).await;
        assert!(fired.is_err());
        assert_eq!(session.generation(), 0);
    }
}
