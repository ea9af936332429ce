//! Render functions for the TUI.
//!
//! This module lays out the tab bar, the active tab and the status bar, and
//! draws the detail overlay on top when it is open.

use crate::app::{App, Tab};
use crate::catalog::ListingSource;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::{details, status, titles, watchlist};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 12;

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_tabs(f, app, chunks[0]);
    match app.tab {
        Tab::Trending => render_trending(f, app, chunks[1]),
        Tab::Search => render_search(f, app, chunks[1]),
        Tab::Genres => render_genres(f, app, chunks[1]),
        Tab::Watchlist => watchlist::render(f, app, chunks[1]),
    }
    status::render(f, app, chunks[2]);

    if let Some(state) = &app.details {
        details::render(f, app, state);
    }
}

fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let labels: Vec<Line> = Tab::ALL
        .iter()
        .map(|tab| {
            let label = match tab {
                Tab::Watchlist => format!("{} {} ({})", tab.index() + 1, tab.title(), app.watchlist.len()),
                _ => format!("{} {}", tab.index() + 1, tab.title()),
            };
            Line::from(label)
        })
        .collect();

    let tabs = Tabs::new(labels)
        .select(app.tab.index())
        .style(app.palette.tab_inactive)
        .highlight_style(app.palette.tab_active)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.panel_border)
                .title(" marquee "),
        );
    f.render_widget(tabs, area);
}

fn render_trending(f: &mut Frame, app: &App, area: Rect) {
    let mut heading = vec![Span::raw(format!(" Trending {} ", app.trending.window.label()))];
    if app.trending.is_sample() {
        heading.push(Span::styled("[sample] ", app.palette.sample_badge));
    }

    let titles: Vec<_> = app.trending.titles().iter().collect();
    let empty = if app.trending.loading {
        "Loading..."
    } else {
        "Nothing trending right now (r to retry)"
    };
    titles::render(
        f,
        app,
        area,
        &titles,
        app.trending.selected,
        Line::from(heading),
        empty,
    );
}

fn render_search(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let cursor = if app.input_mode { "_" } else { "" };
    let border = if app.input_mode {
        app.palette.panel_border_focused
    } else {
        app.palette.panel_border
    };
    let input = Paragraph::new(Line::from(vec![
        Span::raw("> "),
        Span::styled(format!("{}{}", app.search_input, cursor), app.palette.input),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(" Search movies & TV (/ to type) "),
    );
    f.render_widget(input, chunks[0]);

    let visible = app.search.visible();
    let more = if app.search.has_more() {
        format!(" | page {}/{} (n for more)", app.search.page(), app.search.total_pages())
    } else {
        String::new()
    };
    let heading = Line::from(format!(
        " Results: {} | {} | Sort: {}{} ",
        visible.len(),
        app.search.filter.label(),
        app.search.sort.label(),
        more,
    ));

    let empty = if app.search.is_loading() {
        "Searching..."
    } else if app.search.query().is_empty() {
        "Type a title to search"
    } else {
        "No results"
    };
    titles::render(f, app, chunks[1], &visible, app.search_selected, heading, empty);
}

fn render_genres(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let genre_spans: Vec<Span> = app
        .genres
        .genres
        .iter()
        .enumerate()
        .flat_map(|(i, genre)| {
            let style = if i == app.genres.selected_genre {
                app.palette.tab_active
            } else {
                app.palette.tab_inactive
            };
            [Span::styled(genre.name.clone(), style), Span::raw("  ")]
        })
        .collect();

    let mut strip_title = format!(" {} genres ", app.genres.media_type.label());
    if app.genres.source == ListingSource::Sample {
        strip_title.push_str("[default list] ");
    }
    // Keep the highlighted genre in view on narrow terminals
    let offset: usize = app
        .genres
        .genres
        .iter()
        .take(app.genres.selected_genre)
        .map(|g| g.name.chars().count() + 2)
        .sum();
    let width = chunks[0].width.saturating_sub(2) as usize;
    let scroll = offset.saturating_sub(width / 2).min(u16::MAX as usize) as u16;

    let strip = Paragraph::new(Line::from(genre_spans))
        .scroll((0, scroll))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.panel_border)
                .title(strip_title),
        );
    f.render_widget(strip, chunks[0]);

    let titles: Vec<_> = app.genres.titles.iter().collect();
    let genre_name = app
        .genres
        .current_genre()
        .map(|g| g.name.as_str())
        .unwrap_or("-");
    let more = if app.genres.has_more() {
        format!(" | page {}/{} (n for more)", app.genres.page, app.genres.total_pages)
    } else {
        String::new()
    };
    let heading = Line::from(format!(" {}{} ", genre_name, more));
    let empty = if app.genres.loading {
        "Loading..."
    } else {
        "No titles (r to retry)"
    };
    titles::render(f, app, chunks[1], &titles, app.genres.selected, heading, empty);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{sample_trending, Catalog, Listing, TitlePage};
    use crate::config::Config;
    use crate::storage::{Database, WatchlistStore};
    use ratatui::{backend::TestBackend, Terminal};

    async fn test_app() -> App {
        let db = Database::open(":memory:").await.unwrap();
        let watchlist = WatchlistStore::initialize(db.clone()).await.unwrap();
        let config = Config::default();
        let catalog = Catalog::from_config(&config).unwrap();
        App::new(db, catalog, watchlist, &config)
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[tokio::test]
    async fn test_sample_trending_is_badged() {
        let mut app = test_app().await;
        let generation = app.trending.begin();
        app.trending.apply(
            generation,
            Listing {
                page: TitlePage {
                    titles: sample_trending(),
                    page: 1,
                    total_pages: 1,
                },
                source: ListingSource::Sample,
            },
        );

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        let text = screen(&terminal);

        assert!(text.contains("[sample]"));
        assert!(text.contains("Breaking Bad"));
        assert!(text.contains("4 Watchlist (0)"));
    }

    #[tokio::test]
    async fn test_small_terminal_message() {
        let app = test_app().await;
        let mut terminal = Terminal::new(TestBackend::new(40, 8)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        assert!(screen(&terminal).contains("Terminal too small"));
    }

    #[tokio::test]
    async fn test_empty_watchlist_hint() {
        let mut app = test_app().await;
        app.switch_tab(Tab::Watchlist);
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        assert!(screen(&terminal).contains("Your watchlist is empty"));
    }
}
