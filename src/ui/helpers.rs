//! Helper functions for UI operations.
//!
//! Background catalog requests, panic capture for spawned tasks, and
//! opening links in the system browser.

use crate::app::{App, AppEvent, Tab};
use crate::catalog::{poster_url, Title};
use crate::search::SearchRequest;
use crate::util::validate_url_for_open;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Wraps a future to catch panics and convert them to errors.
///
/// Instead of the task silently disappearing (caught by Tokio's runtime but
/// not handled), panics are converted to `Err(String)` containing the panic
/// message.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else if let Some(e) = panic.downcast_ref::<Box<dyn std::error::Error + Send>>() {
                e.to_string()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

async fn send_event(tx: &mpsc::Sender<AppEvent>, event: AppEvent) {
    let name = event.name();
    if let Err(e) = tx.send(event).await {
        tracing::warn!(error = %e, event = name, "Channel send failed (receiver dropped)");
    }
}

/// Runs `work` on the runtime and delivers the event it produces.
///
/// A panic inside `work` is reported as `AppEvent::TaskPanicked`.
fn spawn_task<F>(task: &'static str, tx: mpsc::Sender<AppEvent>, work: F) -> JoinHandle<()>
where
    F: Future<Output = AppEvent> + Send + 'static,
{
    tokio::spawn(async move {
        match catch_task_panic(work).await {
            Ok(event) => send_event(&tx, event).await,
            Err(panic_msg) => {
                tracing::error!(task, error = %panic_msg, "Background task panicked");
                send_event(
                    &tx,
                    AppEvent::TaskPanicked {
                        task,
                        error: panic_msg,
                    },
                )
                .await;
            }
        }
    })
}

fn abort_previous(handle: &mut Option<JoinHandle<()>>, task: &'static str) {
    if let Some(handle) = handle.take() {
        handle.abort();
        tracing::debug!(task, "Aborted previous task");
    }
}

// ============================================================================
// Catalog Requests
// ============================================================================

/// Loads trending titles for the current window.
pub(super) fn spawn_trending(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    abort_previous(&mut app.trending_handle, "trending");

    let generation = app.trending.begin();
    let window = app.trending.window;
    let tmdb = app.catalog.tmdb.clone();

    tracing::debug!(window = window.as_str(), generation, "Spawning trending load");

    app.trending_handle = Some(spawn_task("trending", event_tx.clone(), async move {
        let listing = tmdb.trending(window, 1).await;
        AppEvent::TrendingLoaded {
            generation,
            listing,
        }
    }));
}

/// Issues a search request.
///
/// Superseded searches are left running; their responses are dropped by
/// generation when they arrive.
pub(super) fn spawn_search(request: SearchRequest, app: &App, event_tx: &mpsc::Sender<AppEvent>) {
    let tmdb = app.catalog.tmdb.clone();

    tracing::debug!(
        query = %request.query,
        page = request.page,
        generation = request.generation,
        "Spawning search"
    );

    spawn_task("search", event_tx.clone(), async move {
        let results = tmdb.search(&request.query, request.page).await;
        AppEvent::SearchCompleted {
            query: request.query,
            generation: request.generation,
            page: request.page,
            results,
        }
    });
}

/// Loads the genre list for the current media type.
pub(super) fn spawn_genres(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    abort_previous(&mut app.genres_handle, "genres");

    let generation = app.genres.begin_list();
    let media_type = app.genres.media_type;
    let tmdb = app.catalog.tmdb.clone();

    app.genres_handle = Some(spawn_task("genres", event_tx.clone(), async move {
        let (genres, source) = tmdb.genres(media_type).await;
        AppEvent::GenresLoaded {
            generation,
            media_type,
            genres,
            source,
        }
    }));
}

/// Loads `page` of the highlighted genre. Does nothing without a genre.
pub(super) fn spawn_discover(app: &mut App, page: u32, event_tx: &mpsc::Sender<AppEvent>) {
    let Some(genre_id) = app.genres.current_genre().map(|g| g.id) else {
        return;
    };
    abort_previous(&mut app.discover_handle, "discover");

    let generation = app.genres.begin_discover();
    let media_type = app.genres.media_type;
    let tmdb = app.catalog.tmdb.clone();

    tracing::debug!(genre_id, %media_type, page, generation, "Spawning discover");

    app.discover_handle = Some(spawn_task("discover", event_tx.clone(), async move {
        let results = tmdb.discover(genre_id, media_type, page).await;
        AppEvent::DiscoverLoaded {
            generation,
            page,
            results,
        }
    }));
}

/// Opens the detail overlay for `title` and requests the full record and
/// the external ratings side by side.
pub(super) fn spawn_details(app: &mut App, title: Title, event_tx: &mpsc::Sender<AppEvent>) {
    abort_previous(&mut app.details_handle, "details");
    abort_previous(&mut app.ratings_handle, "ratings");

    let id = title.id();
    let media_type = title.media_type();
    let name = title.display_title().to_string();
    let year = title.year();
    let generation = app.open_details(title);

    let tmdb = app.catalog.tmdb.clone();
    app.details_handle = Some(spawn_task("details", event_tx.clone(), async move {
        let details = tmdb.details(id, media_type).await;
        AppEvent::DetailsLoaded {
            generation,
            details,
        }
    }));

    let omdb = app.catalog.omdb.clone();
    app.ratings_handle = Some(spawn_task("ratings", event_tx.clone(), async move {
        let ratings = omdb.ratings(&name, year).await;
        AppEvent::RatingsLoaded {
            generation,
            ratings,
        }
    }));
}

/// Re-issues the active tab's request with the response cache dropped.
pub(super) fn retry_current(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    app.catalog.invalidate();
    match app.tab {
        Tab::Trending => spawn_trending(app, event_tx),
        Tab::Search => {
            let query = app.search.query().to_string();
            if let Some(request) = app.on_search_settled(&query) {
                spawn_search(request, app, event_tx);
            }
        }
        Tab::Genres => {
            if app.genres.genres.is_empty() {
                spawn_genres(app, event_tx);
            } else {
                spawn_discover(app, 1, event_tx);
            }
        }
        Tab::Watchlist => return,
    }
    app.set_status("Retrying...");
}

// ============================================================================
// Links
// ============================================================================

/// Validates `url` and hands it to the system opener.
pub(super) fn open_url(app: &mut App, url: &str, what: &str) {
    // Validate before open::that() so only http(s) reaches the opener
    if let Err(e) = validate_url_for_open(url) {
        app.set_status(format!("Cannot open {}: {}", what, e));
    } else if let Err(e) = open::that(url) {
        tracing::warn!(url, error = %e, "Failed to open URL");
        app.set_status(format!("Failed to open {}: {}", what, e));
    } else {
        app.set_status(format!("Opened {} in browser", what));
    }
}

/// Poster image for the overlay's title (a placeholder when it has none).
pub(super) fn details_poster_url(app: &App) -> Option<String> {
    app.details
        .as_ref()
        .map(|state| poster_url(state.current_title().poster_path()))
}
