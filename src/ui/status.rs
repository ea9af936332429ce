use crate::app::{App, Tab};
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    // Status bar needs at least 1 char width to be meaningful
    if area.width < 1 || area.height < 1 {
        return;
    }

    let mut style = app.palette.status_bar;

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        if msg.starts_with("Error") {
            style = app.palette.status_error;
        }
        Cow::Borrowed(msg.as_ref())
    } else if app.is_loading() {
        let frame = SPINNER[app.spinner_frame % SPINNER.len()];
        Cow::Owned(format!("{} Loading...", frame))
    } else if app.details.is_some() {
        Cow::Borrowed("[Esc]close [j/k]scroll [t]railer [i]mdb [p]oster [w]atchlist [q]uit")
    } else if app.input_mode {
        Cow::Borrowed("Type to search | ESC done | ENTER search now")
    } else {
        // Static keybinding hints - zero allocation
        match app.tab {
            Tab::Trending => Cow::Borrowed(
                "[1-4]tabs [j/k]move [Enter]details [w]atchlist [t]ime window [r]etry [T]heme [q]uit",
            ),
            Tab::Search => Cow::Borrowed(
                "[/]type [Enter]details [w]atchlist [f]ilter [s]ort [n]ext page [r]etry [q]uit",
            ),
            Tab::Genres => Cow::Borrowed(
                "[ [ ] ]genre [v]movie/tv [Enter]details [w]atchlist [n]ext page [r]etry [q]uit",
            ),
            Tab::Watchlist => Cow::Borrowed(
                "[m]ark watched [x]remove [f]ilter [s]ort [Enter]details [T]heme [q]uit",
            ),
        }
    };

    let paragraph = Paragraph::new(text).style(style);
    f.render_widget(paragraph, area);
}
