//! Watchlist tab.

use crate::app::App;
use crate::util::{display_width, strip_control_chars, truncate_to_width};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// Render the saved titles with the active filter and sort.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let palette = &app.palette;
    let heading = format!(
        " Watchlist: {} ({}) | To Watch {} | Watched {} | Sort: {} ",
        app.watchlist_filter.label(),
        app.watchlist.len(),
        app.watchlist.count_unwatched(),
        app.watchlist.count_watched(),
        app.watchlist_sort.label(),
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.panel_border_focused)
        .title(heading);

    let view = app.watchlist_view();
    if view.is_empty() {
        let message = if app.watchlist.is_empty() {
            "Your watchlist is empty. Press w on any title to save it."
        } else {
            "Nothing matches this filter (f to change)"
        };
        let list = List::new(vec![ListItem::new(Span::styled(message, palette.title_meta))])
            .block(block);
        f.render_widget(list, area);
        return;
    }

    let max_title = (area.width as usize).saturating_sub(40).max(8);
    let items: Vec<ListItem> = view
        .iter()
        .map(|item| {
            let (marker, title_style) = if item.watched {
                ("[x] ", palette.title_watched)
            } else {
                ("[ ] ", palette.title_normal)
            };

            let clean = strip_control_chars(item.display_title());
            let name = truncate_to_width(&clean, max_title);
            let padding = max_title.saturating_sub(display_width(&name));

            let year = item
                .year()
                .map(|y| y.to_string())
                .unwrap_or_else(|| "----".to_string());

            let mut spans = vec![
                Span::styled(marker, palette.watchlist_marker),
                Span::styled(format!("{}{}", name, " ".repeat(padding)), title_style),
                Span::styled(
                    format!("  {}  {:<5}", year, item.media_type.label()),
                    palette.title_meta,
                ),
            ];
            match item.rating() {
                Some(rating) => spans.push(Span::styled(
                    format!(" {:>4.1}", rating),
                    palette.rating(rating),
                )),
                None => spans.push(Span::styled("    -", palette.title_meta)),
            }
            spans.push(Span::styled(
                format!("  added {}", item.added_at.format("%b %d, %Y")),
                palette.title_meta,
            ));

            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(palette.title_selected);
    let mut state =
        ListState::default().with_selected(Some(app.watchlist_selected.min(view.len() - 1)));
    f.render_stateful_widget(list, area, &mut state);
}
