//! Detail overlay: full record, external ratings, cast and links.

use crate::app::{App, DetailsState};
use crate::catalog::{ExternalRatings, MediaType, TitleDetails};
use crate::theme::ColorPalette;
use crate::util::{format_date, format_runtime};
use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Cast members listed in the overlay.
const CAST_SHOWN: usize = 6;
/// Recommendations listed in the overlay.
const RECOMMENDATIONS_SHOWN: usize = 5;

/// Render the detail overlay on top of the current tab.
pub fn render(f: &mut Frame, app: &App, state: &DetailsState) {
    let overlay = centered_rect(80, 85, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }

    f.render_widget(Clear, overlay);

    let lines = build_lines(app, state);
    let title = if state.loading {
        " Details (loading...) ".to_string()
    } else {
        " Details (Esc to close) ".to_string()
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.panel_border_focused)
                .title(title),
        )
        .style(app.palette.detail_body)
        .wrap(Wrap { trim: false })
        .scroll((state.scroll, 0));

    f.render_widget(paragraph, overlay);
}

pub(super) fn build_lines(app: &App, state: &DetailsState) -> Vec<Line<'static>> {
    let palette = &app.palette;
    let title = state.current_title();
    let mut lines = Vec::new();

    let heading = match title.year() {
        Some(year) => format!("{} ({})", title.display_title(), year),
        None => title.display_title().to_string(),
    };
    lines.push(Line::from(Span::styled(heading, palette.detail_heading)));

    if let Some(tagline) = state
        .details
        .as_ref()
        .and_then(|d| d.tagline.as_deref())
        .filter(|t| !t.is_empty())
    {
        lines.push(Line::from(Span::styled(
            tagline.to_string(),
            palette.detail_body.add_modifier(Modifier::ITALIC),
        )));
    }

    let mut facts = vec![title.media_type().label().to_string()];
    if let Some(details) = &state.details {
        facts.extend(detail_facts(details));
    }
    let date_label = match title.media_type() {
        MediaType::Movie => "Released",
        MediaType::Tv => "First aired",
    };
    facts.push(format!("{} {}", date_label, format_date(title.release_date())));
    lines.push(Line::from(Span::styled(facts.join(" • "), palette.detail_label)));

    if app.watchlist.is_present(title.id(), title.media_type()) {
        lines.push(Line::from(Span::styled(
            "★ On your watchlist",
            palette.watchlist_marker,
        )));
    }
    lines.push(Line::from(""));

    lines.push(ratings_line(palette, title.rating(), state.ratings.as_ref()));
    if let Some(ratings) = &state.ratings {
        if let Some(awards) = &ratings.awards {
            lines.push(labelled(palette, "Awards", awards.clone()));
        }
    } else if state.ratings_loading {
        lines.push(Line::from(Span::styled(
            "Loading external ratings...",
            palette.detail_label,
        )));
    }
    lines.push(Line::from(""));

    let overview = title.overview();
    if overview.is_empty() {
        lines.push(Line::from(Span::styled(
            "No overview available.",
            palette.detail_label,
        )));
    } else {
        lines.push(Line::from(overview.to_string()));
    }

    if let Some(details) = &state.details {
        push_details_sections(&mut lines, palette, details);
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[t] trailer  [i] IMDb  [p] poster  [w] watchlist  [j/k] scroll",
        palette.detail_link,
    )));

    lines
}

/// Runtime, seasons, status and genres.
fn detail_facts(details: &TitleDetails) -> Vec<String> {
    let mut facts = Vec::new();
    if details.runtime.is_some() {
        facts.push(format_runtime(details.runtime));
    }
    if let Some(seasons) = details.number_of_seasons {
        let episodes = details
            .number_of_episodes
            .map(|e| format!(", {} episodes", e))
            .unwrap_or_default();
        let plural = if seasons == 1 { "" } else { "s" };
        facts.push(format!("{} season{}{}", seasons, plural, episodes));
    }
    if let Some(status) = details.status.as_deref().filter(|s| !s.is_empty()) {
        facts.push(status.to_string());
    }
    if !details.genres.is_empty() {
        let names: Vec<&str> = details.genres.iter().map(|g| g.name.as_str()).collect();
        facts.push(names.join(", "));
    }
    facts
}

fn ratings_line(
    palette: &ColorPalette,
    tmdb: Option<f64>,
    external: Option<&ExternalRatings>,
) -> Line<'static> {
    let mut spans = vec![Span::styled("Ratings  ", palette.detail_label)];

    match tmdb {
        Some(score) => spans.push(Span::styled(
            format!("TMDB {:.1}/10", score),
            palette.rating(score),
        )),
        None => spans.push(Span::styled("TMDB unrated", palette.detail_label)),
    }

    if let Some(ratings) = external {
        if let Some(imdb) = &ratings.imdb_rating {
            let style = ratings
                .imdb_score()
                .map(|s| palette.rating(s))
                .unwrap_or(palette.detail_body);
            let votes = ratings
                .imdb_votes
                .as_deref()
                .map(|v| format!(" ({} votes)", v))
                .unwrap_or_default();
            spans.push(Span::raw("   "));
            spans.push(Span::styled(format!("IMDb {}/10{}", imdb, votes), style));
        }
        if let Some(rt) = &ratings.rotten_tomatoes {
            spans.push(Span::raw("   "));
            spans.push(Span::styled(format!("Rotten Tomatoes {}", rt), palette.detail_body));
        }
        if let Some(meta) = &ratings.metascore {
            spans.push(Span::raw("   "));
            spans.push(Span::styled(format!("Metascore {}", meta), palette.detail_body));
        }
        if let Some(rated) = &ratings.rated {
            spans.push(Span::raw("   "));
            spans.push(Span::styled(format!("Rated {}", rated), palette.detail_label));
        }
    }

    Line::from(spans)
}

fn push_details_sections(lines: &mut Vec<Line<'static>>, palette: &ColorPalette, details: &TitleDetails) {
    if !details.cast.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Cast", palette.detail_heading)));
        for member in details.cast.iter().take(CAST_SHOWN) {
            let text = match member.character.as_deref().filter(|c| !c.is_empty()) {
                Some(character) => format!("  {} as {}", member.name, character),
                None => format!("  {}", member.name),
            };
            lines.push(Line::from(text));
        }
    }

    if !details.recommendations.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "You might also like",
            palette.detail_heading,
        )));
        for title in details.recommendations.iter().take(RECOMMENDATIONS_SHOWN) {
            let year = title.year().map(|y| format!(" ({})", y)).unwrap_or_default();
            lines.push(Line::from(format!("  {}{}", title.display_title(), year)));
        }
    }

    let mut links = Vec::new();
    if let Some(url) = details.trailer_url() {
        links.push(labelled(palette, "Trailer", url));
    }
    if let Some(url) = details.imdb_url() {
        links.push(labelled(palette, "IMDb", url));
    }
    if !links.is_empty() {
        lines.push(Line::from(""));
        lines.extend(links);
    }
}

fn labelled(palette: &ColorPalette, label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), palette.detail_label),
        Span::styled(value, palette.detail_link),
    ])
}

/// Create a centered rectangle with the given percentage of the parent area.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CastMember, Catalog, Genre, TvShow, Title, Video};
    use crate::config::Config;
    use crate::storage::{Database, WatchlistStore};

    async fn test_app() -> App {
        let db = Database::open(":memory:").await.unwrap();
        let watchlist = WatchlistStore::initialize(db.clone()).await.unwrap();
        let config = Config::default();
        let catalog = Catalog::from_config(&config).unwrap();
        App::new(db, catalog, watchlist, &config)
    }

    fn text(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn breaking_bad() -> Title {
        Title::Tv(TvShow {
            id: 1396,
            name: "Breaking Bad".to_string(),
            first_air_date: Some("2008-01-20".to_string()),
            vote_average: Some(8.9),
            vote_count: Some(15000),
            overview: Some("A chemistry teacher turns to crime.".to_string()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_summary_shown_while_loading() {
        let mut app = test_app().await;
        app.open_details(breaking_bad());
        let rendered = text(&build_lines(&app, app.details.as_ref().unwrap()));

        assert!(rendered.contains("Breaking Bad (2008)"));
        assert!(rendered.contains("First aired January 20, 2008"));
        assert!(rendered.contains("TMDB 8.9/10"));
        assert!(rendered.contains("Loading external ratings..."));
        assert!(rendered.contains("A chemistry teacher turns to crime."));
    }

    #[tokio::test]
    async fn test_full_record_sections() {
        let mut app = test_app().await;
        let generation = app.open_details(breaking_bad());
        app.apply_details(
            generation,
            Some(TitleDetails {
                title: breaking_bad(),
                tagline: Some("Remember my name".to_string()),
                status: Some("Ended".to_string()),
                runtime: Some(47),
                number_of_seasons: Some(5),
                number_of_episodes: Some(62),
                genres: vec![Genre {
                    id: 18,
                    name: "Drama".to_string(),
                }],
                imdb_id: Some("tt0903747".to_string()),
                cast: vec![CastMember {
                    name: "Bryan Cranston".to_string(),
                    character: Some("Walter White".to_string()),
                }],
                videos: vec![Video {
                    key: "HhesaQXLuRY".to_string(),
                    site: "YouTube".to_string(),
                    kind: "Trailer".to_string(),
                    name: None,
                }],
                recommendations: Vec::new(),
            }),
        );
        app.apply_ratings(
            generation,
            Some(ExternalRatings {
                imdb_rating: Some("9.5".to_string()),
                imdb_votes: Some("2,100,000".to_string()),
                ..Default::default()
            }),
        );

        let rendered = text(&build_lines(&app, app.details.as_ref().unwrap()));
        assert!(rendered.contains("Remember my name"));
        assert!(rendered.contains("TV • 47m • 5 seasons, 62 episodes • Ended • Drama"));
        assert!(rendered.contains("IMDb 9.5/10 (2,100,000 votes)"));
        assert!(rendered.contains("Bryan Cranston as Walter White"));
        assert!(rendered.contains("https://www.youtube.com/watch?v=HhesaQXLuRY"));
        assert!(rendered.contains("https://www.imdb.com/title/tt0903747/"));
        assert!(!rendered.contains("Loading external ratings"));
    }
}
