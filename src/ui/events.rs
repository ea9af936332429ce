//! Application event handling.
//!
//! Applies background task results to the application state, dropping any
//! that belong to a superseded request.

use crate::app::{App, AppEvent, Tab};
use crate::catalog::ListingSource;
use tokio::sync::mpsc;

use super::helpers::spawn_discover;

/// Handle application events from background tasks.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent, event_tx: &mpsc::Sender<AppEvent>) {
    match event {
        AppEvent::TrendingLoaded {
            generation,
            listing,
        } => {
            let sample = listing.source == ListingSource::Sample;
            if app.trending.apply(generation, listing) && sample && app.tab == Tab::Trending {
                app.set_status("Showing sample titles (press r to retry)");
            }
        }
        AppEvent::GenresLoaded {
            generation,
            media_type,
            genres,
            source,
        } => {
            if app.genres.apply_genres(generation, media_type, genres, source) {
                if source == ListingSource::Sample && app.tab == Tab::Genres {
                    app.set_status("Genre list unavailable, showing defaults");
                }
                spawn_discover(app, 1, event_tx);
            }
        }
        AppEvent::DiscoverLoaded {
            generation,
            page,
            results,
        } => {
            let empty_follow_up = page > 1 && results.titles.is_empty();
            if app.genres.apply_discover(generation, page, results) && empty_follow_up {
                app.set_status("No more titles (press n to retry)");
            }
        }
        AppEvent::SearchCompleted {
            query,
            generation,
            page,
            results,
        } => {
            let empty_follow_up = page > 1 && results.titles.is_empty();
            if app.apply_search(generation, page, results) {
                tracing::debug!(query = %query, page, "Search results applied");
                if empty_follow_up {
                    app.set_status("Could not load more results (press n to retry)");
                }
            }
        }
        AppEvent::DetailsLoaded {
            generation,
            details,
        } => {
            let missing = details.is_none();
            if app.apply_details(generation, details) && missing {
                app.set_status("Details unavailable");
            }
        }
        AppEvent::RatingsLoaded {
            generation,
            ratings,
        } => {
            app.apply_ratings(generation, ratings);
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Background task panicked");
            app.task_failed(task);
            app.set_status(format!("Internal error in {} task", task));
        }
    }
}
