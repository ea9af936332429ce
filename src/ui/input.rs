//! Input handling for the TUI.
//!
//! This module processes keyboard input and dispatches to the appropriate
//! handler based on the overlay, input mode and active tab.

use crate::app::{App, AppEvent, Tab};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::{
    details_poster_url, open_url, retry_current, spawn_details, spawn_discover, spawn_genres,
    spawn_search, spawn_trending,
};
use super::Action;
use crate::util::MAX_SEARCH_QUERY_LENGTH;

/// Main input dispatch function.
pub(super) async fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    // Raw mode swallows SIGINT, so Ctrl+C arrives as a key
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Ok(Action::Quit);
    }

    if app.details.is_some() {
        return handle_details_input(app, code).await;
    }

    if app.input_mode {
        handle_search_input(app, code, event_tx);
        return Ok(Action::Continue);
    }

    handle_browse_input(app, code, event_tx).await
}

/// Switch tab and load its content the first time it is shown.
pub(super) fn switch_to(app: &mut App, tab: Tab, event_tx: &mpsc::Sender<AppEvent>) {
    app.switch_tab(tab);
    match tab {
        Tab::Trending if app.trending.listing.is_none() && !app.trending.loading => {
            spawn_trending(app, event_tx);
        }
        Tab::Genres if app.genres.genres.is_empty() && !app.genres.loading => {
            spawn_genres(app, event_tx);
        }
        _ => {}
    }
}

/// Handle input while the detail overlay is open.
async fn handle_details_input(app: &mut App, code: KeyCode) -> Result<Action> {
    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Esc | KeyCode::Backspace => app.close_details(),
        KeyCode::Char('j') | KeyCode::Down => {
            if let Some(state) = app.details.as_mut() {
                state.scroll = state.scroll.saturating_add(1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if let Some(state) = app.details.as_mut() {
                state.scroll = state.scroll.saturating_sub(1);
            }
        }
        KeyCode::Char('t') => {
            let trailer = app
                .details
                .as_ref()
                .and_then(|s| s.details.as_ref())
                .and_then(|d| d.trailer_url());
            match trailer {
                Some(url) => open_url(app, &url, "trailer"),
                None => app.set_status("No trailer available"),
            }
        }
        KeyCode::Char('i') => {
            let imdb = app
                .details
                .as_ref()
                .and_then(|s| s.details.as_ref())
                .and_then(|d| d.imdb_url());
            match imdb {
                Some(url) => open_url(app, &url, "IMDb page"),
                None => app.set_status("No IMDb page available"),
            }
        }
        KeyCode::Char('p') => {
            if let Some(url) = details_poster_url(app) {
                open_url(app, &url, "poster");
            }
        }
        KeyCode::Char('w') => {
            if let Some(title) = app.details.as_ref().map(|s| s.current_title().clone()) {
                app.toggle_watchlist(&title).await?;
            }
        }
        KeyCode::Char('T') => app.cycle_theme().await,
        _ => {}
    }
    Ok(Action::Continue)
}

/// Handle keys typed into the search box.
fn handle_search_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Esc => app.input_mode = false,
        KeyCode::Enter => {
            app.input_mode = false;
            if let Some(request) = app.submit_search() {
                spawn_search(request, app, event_tx);
            }
        }
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Down => app.nav_down(),
        KeyCode::Up => app.nav_up(),
        KeyCode::Char(c) => {
            if !app.push_search_char(c) {
                app.set_status(format!(
                    "Search query too long (max {} chars)",
                    MAX_SEARCH_QUERY_LENGTH
                ));
            }
        }
        _ => {}
    }
}

/// Handle input on the tab views.
async fn handle_browse_input(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Char(c @ '1'..='4') => {
            let index = c as usize - '1' as usize;
            if let Some(tab) = Tab::from_index(index) {
                switch_to(app, tab, event_tx);
            }
        }
        KeyCode::Tab => {
            let next = app.tab.next();
            switch_to(app, next, event_tx);
        }
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Enter => {
            if let Some(title) = app.selected_title() {
                spawn_details(app, title, event_tx);
            }
        }
        KeyCode::Char('/') => {
            switch_to(app, Tab::Search, event_tx);
            app.input_mode = true;
        }
        KeyCode::Esc => {
            if app.tab == Tab::Search {
                app.search.cancel();
            }
        }
        KeyCode::Char('w') => {
            if let Some(title) = app.selected_title() {
                app.toggle_watchlist(&title).await?;
            }
        }
        KeyCode::Char('r') => retry_current(app, event_tx),
        KeyCode::Char('T') => app.cycle_theme().await,
        _ => match app.tab {
            Tab::Trending => handle_trending_key(app, code, event_tx),
            Tab::Search => handle_results_key(app, code, event_tx),
            Tab::Genres => handle_genres_key(app, code, event_tx),
            Tab::Watchlist => handle_watchlist_key(app, code).await?,
        },
    }
    Ok(Action::Continue)
}

fn handle_trending_key(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    if code == KeyCode::Char('t') {
        app.trending.window = app.trending.window.toggle();
        app.set_status(format!("Trending: {}", app.trending.window.label()));
        spawn_trending(app, event_tx);
    }
}

fn handle_results_key(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Char('f') => {
            app.search.filter = app.search.filter.next();
            app.search_selected = 0;
            app.set_status(format!("Showing: {}", app.search.filter.label()));
        }
        KeyCode::Char('s') => {
            app.search.sort = app.search.sort.next();
            app.search_selected = 0;
            app.set_status(format!("Sorted by {}", app.search.sort.label()));
        }
        KeyCode::Char('n') => match app.search.next_page() {
            Some(request) => spawn_search(request, app, event_tx),
            None if app.search.is_loading() => app.set_status("Still loading..."),
            None => app.set_status("No more results"),
        },
        _ => {}
    }
}

fn handle_genres_key(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Char(']') => {
            if app.genres.cycle_genre(true) {
                spawn_discover(app, 1, event_tx);
            }
        }
        KeyCode::Char('[') => {
            if app.genres.cycle_genre(false) {
                spawn_discover(app, 1, event_tx);
            }
        }
        KeyCode::Char('v') => {
            app.genres.toggle_media_type();
            app.set_status(format!("Genres: {}", app.genres.media_type.label()));
            spawn_genres(app, event_tx);
        }
        KeyCode::Char('n') => {
            if app.genres.loading {
                app.set_status("Still loading...");
            } else if app.genres.has_more() {
                let next = app.genres.page + 1;
                spawn_discover(app, next, event_tx);
            } else {
                app.set_status("No more titles");
            }
        }
        _ => {}
    }
}

async fn handle_watchlist_key(app: &mut App, code: KeyCode) -> Result<()> {
    match code {
        KeyCode::Char('m') => app.toggle_watched_selected().await?,
        KeyCode::Char('x') => app.remove_selected().await?,
        KeyCode::Char('f') => {
            app.cycle_watchlist_filter();
            app.set_status(format!("Showing: {}", app.watchlist_filter.label()));
        }
        KeyCode::Char('s') => {
            app.cycle_watchlist_sort();
            app.set_status(format!("Sorted by {}", app.watchlist_sort.label()));
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Listing, ListingSource, Movie, Title, TitlePage};
    use crate::config::Config;
    use crate::storage::{Database, WatchlistStore};

    async fn test_app() -> App {
        let db = Database::open(":memory:").await.unwrap();
        let watchlist = WatchlistStore::initialize(db.clone()).await.unwrap();
        let config = Config::default();
        let catalog = Catalog::from_config(&config).unwrap();
        App::new(db, catalog, watchlist, &config)
    }

    async fn press(app: &mut App, code: KeyCode, tx: &mpsc::Sender<AppEvent>) -> Action {
        handle_input(app, code, KeyModifiers::NONE, tx).await.unwrap()
    }

    fn seed_trending(app: &mut App) {
        let generation = app.trending.begin();
        app.trending.apply(
            generation,
            Listing {
                page: TitlePage {
                    titles: vec![Title::Movie(Movie {
                        id: 27205,
                        title: "Inception".to_string(),
                        ..Default::default()
                    })],
                    page: 1,
                    total_pages: 1,
                },
                source: ListingSource::Live,
            },
        );
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = test_app().await;
        let (tx, _rx) = mpsc::channel(8);
        assert!(matches!(press(&mut app, KeyCode::Char('q'), &tx).await, Action::Quit));

        let action = handle_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL, &tx)
            .await
            .unwrap();
        assert!(matches!(action, Action::Quit));
    }

    #[tokio::test]
    async fn test_typing_goes_to_search_box() {
        let mut app = test_app().await;
        let (tx, _rx) = mpsc::channel(8);

        press(&mut app, KeyCode::Char('/'), &tx).await;
        assert_eq!(app.tab, Tab::Search);
        assert!(app.input_mode);

        // 'q' is text while typing
        for c in "qi".chars() {
            assert!(matches!(press(&mut app, KeyCode::Char(c), &tx).await, Action::Continue));
        }
        press(&mut app, KeyCode::Backspace, &tx).await;
        assert_eq!(app.search_input, "q");
        assert!(app.search.debouncer.is_pending());

        press(&mut app, KeyCode::Esc, &tx).await;
        assert!(!app.input_mode);
    }

    #[tokio::test]
    async fn test_w_toggles_selected_title() {
        let mut app = test_app().await;
        let (tx, _rx) = mpsc::channel(8);
        seed_trending(&mut app);

        press(&mut app, KeyCode::Char('w'), &tx).await;
        assert_eq!(app.watchlist.len(), 1);
        press(&mut app, KeyCode::Char('w'), &tx).await;
        assert!(app.watchlist.is_empty());
    }

    #[tokio::test]
    async fn test_watchlist_tab_keys() {
        let mut app = test_app().await;
        let (tx, _rx) = mpsc::channel(8);
        seed_trending(&mut app);
        press(&mut app, KeyCode::Char('w'), &tx).await;

        press(&mut app, KeyCode::Char('4'), &tx).await;
        assert_eq!(app.tab, Tab::Watchlist);

        press(&mut app, KeyCode::Char('m'), &tx).await;
        assert_eq!(app.watchlist.count_watched(), 1);
        press(&mut app, KeyCode::Char('x'), &tx).await;
        assert!(app.watchlist.is_empty());
    }

    #[tokio::test]
    async fn test_details_overlay_captures_keys() {
        let mut app = test_app().await;
        let (tx, _rx) = mpsc::channel(8);
        seed_trending(&mut app);

        press(&mut app, KeyCode::Enter, &tx).await;
        assert!(app.details.is_some());

        // Tab switching is disabled while the overlay is open
        press(&mut app, KeyCode::Char('2'), &tx).await;
        assert_eq!(app.tab, Tab::Trending);

        press(&mut app, KeyCode::Char('j'), &tx).await;
        assert_eq!(app.details.as_ref().map(|s| s.scroll), Some(1));

        press(&mut app, KeyCode::Esc, &tx).await;
        assert!(app.details.is_none());
    }
}
