//! Title list widget shared by the Trending, Search and Genres tabs.

use crate::app::App;
use crate::catalog::Title;
use crate::util::{display_width, truncate_to_width};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// Width reserved right of the title for year, type and rating.
const META_WIDTH: usize = 22;

/// One list row: watchlist marker, title, then year, type and rating.
pub(super) fn title_line(app: &App, title: &Title, width: u16) -> Line<'static> {
    let palette = &app.palette;
    let mut spans = Vec::with_capacity(5);

    if app.watchlist.is_present(title.id(), title.media_type()) {
        spans.push(Span::styled("★ ", palette.watchlist_marker));
    } else {
        spans.push(Span::raw("  "));
    }

    let max_title = (width as usize).saturating_sub(META_WIDTH + 4).max(8);
    let name = truncate_to_width(title.display_title(), max_title);
    let padding = max_title.saturating_sub(display_width(&name));
    spans.push(Span::styled(
        format!("{}{}", name, " ".repeat(padding)),
        palette.title_normal,
    ));

    let year = title
        .year()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "----".to_string());
    spans.push(Span::styled(
        format!("  {}  {:<5}", year, title.media_type().label()),
        palette.title_meta,
    ));

    match title.rating() {
        Some(rating) => spans.push(Span::styled(
            format!(" {:>4.1}", rating),
            palette.rating(rating),
        )),
        None => spans.push(Span::styled("    -", palette.title_meta)),
    }

    Line::from(spans)
}

/// Render a bordered, scrollable title list.
pub(super) fn render(
    f: &mut Frame,
    app: &App,
    area: Rect,
    titles: &[&Title],
    selected: usize,
    heading: Line<'_>,
    empty_message: &str,
) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.palette.panel_border_focused)
        .title(heading);

    if titles.is_empty() {
        let list = List::new(vec![ListItem::new(Span::styled(
            empty_message.to_string(),
            app.palette.title_meta,
        ))])
        .block(block);
        f.render_widget(list, area);
        return;
    }

    let inner_width = area.width.saturating_sub(2);
    let items: Vec<ListItem> = titles
        .iter()
        .map(|title| ListItem::new(title_line(app, title, inner_width)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(app.palette.title_selected);

    let mut state = ListState::default().with_selected(Some(selected.min(titles.len() - 1)));
    f.render_stateful_widget(list, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Movie};
    use crate::config::Config;
    use crate::storage::{Database, WatchlistStore};

    async fn test_app() -> App {
        let db = Database::open(":memory:").await.unwrap();
        let watchlist = WatchlistStore::initialize(db.clone()).await.unwrap();
        let config = Config::default();
        let catalog = Catalog::from_config(&config).unwrap();
        App::new(db, catalog, watchlist, &config)
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[tokio::test]
    async fn test_title_line_shows_marker_and_rating() {
        let mut app = test_app().await;
        let title = Title::Movie(Movie {
            id: 27205,
            title: "Inception".to_string(),
            release_date: Some("2010-07-16".to_string()),
            vote_average: Some(8.4),
            vote_count: Some(35000),
            ..Default::default()
        });

        let text = line_text(&title_line(&app, &title, 60));
        assert!(text.starts_with("  Inception"));
        assert!(text.contains("2010"));
        assert!(text.contains("Movie"));
        assert!(text.ends_with(" 8.4"));

        app.watchlist.add(&title).await.unwrap();
        let text = line_text(&title_line(&app, &title, 60));
        assert!(text.starts_with("★ Inception"));
    }

    #[tokio::test]
    async fn test_title_line_unrated_and_undated() {
        let app = test_app().await;
        let title = Title::Movie(Movie {
            id: 1,
            title: "A very long title that will certainly not fit the row".to_string(),
            ..Default::default()
        });

        let text = line_text(&title_line(&app, &title, 40));
        assert!(text.contains("----"));
        assert!(text.ends_with("    -"));
        assert!(display_width(&text) <= 40);
    }
}
