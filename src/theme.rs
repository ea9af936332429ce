//! Theme system for the TUI.
//!
//! Provides semantic color roles that map to ratatui `Style` values.
//! The `ThemeVariant` enum selects between Dark and Light palettes.

use ratatui::style::{Color, Modifier, Style};

use crate::util::RatingTier;

// ============================================================================
// Theme Variant
// ============================================================================

/// Available theme variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeVariant {
    #[default]
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name from a string (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    /// Build the `ColorPalette` for this variant.
    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// Cycle to the next variant: Dark → Light → Dark.
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    /// Human-readable name for status display.
    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }

    /// Lowercase name as written to config and the preference slot.
    pub fn key(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

// ============================================================================
// Color Palette
// ============================================================================

/// A complete color palette mapping every semantic UI role to a `Style`.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- Title lists --
    pub title_normal: Style,
    pub title_selected: Style,
    pub title_watched: Style,
    pub title_meta: Style,
    pub watchlist_marker: Style,
    pub sample_badge: Style,

    // -- Ratings --
    pub rating_high: Style,
    pub rating_medium: Style,
    pub rating_low: Style,

    // -- Details overlay --
    pub detail_heading: Style,
    pub detail_body: Style,
    pub detail_label: Style,
    pub detail_link: Style,

    // -- Chrome --
    pub tab_active: Style,
    pub tab_inactive: Style,
    pub input: Style,
    pub status_bar: Style,
    pub status_error: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            title_normal: Style::default(),
            title_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            title_watched: Style::default().fg(Color::Gray),
            title_meta: Style::default().fg(Color::DarkGray),
            watchlist_marker: Style::default().fg(Color::Yellow),
            sample_badge: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),

            rating_high: Style::default().fg(Color::Green),
            rating_medium: Style::default().fg(Color::Yellow),
            rating_low: Style::default().fg(Color::Red),

            detail_heading: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            detail_body: Style::default(),
            detail_label: Style::default().fg(Color::DarkGray),
            detail_link: Style::default().fg(Color::Blue),

            tab_active: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            input: Style::default().fg(Color::Yellow),
            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            status_error: Style::default().bg(Color::Red).fg(Color::White),
            panel_border: Style::default(),
            panel_border_focused: Style::default().fg(Color::Cyan),
        }
    }

    fn light() -> Self {
        Self {
            title_normal: Style::default().fg(Color::Black),
            title_selected: Style::default().bg(Color::Blue).fg(Color::White),
            title_watched: Style::default().fg(Color::DarkGray),
            title_meta: Style::default().fg(Color::DarkGray),
            watchlist_marker: Style::default().fg(Color::Magenta),
            sample_badge: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::ITALIC),

            rating_high: Style::default().fg(Color::Green),
            rating_medium: Style::default().fg(Color::Magenta),
            rating_low: Style::default().fg(Color::Red),

            detail_heading: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            detail_body: Style::default().fg(Color::Black),
            detail_label: Style::default().fg(Color::DarkGray),
            detail_link: Style::default().fg(Color::Blue),

            tab_active: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            input: Style::default().fg(Color::Magenta),
            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            status_error: Style::default().bg(Color::Red).fg(Color::White),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_focused: Style::default().fg(Color::Blue),
        }
    }

    /// Style for a 0-10 rating.
    pub fn rating(&self, rating: f64) -> Style {
        match RatingTier::of(rating) {
            RatingTier::High => self.rating_high,
            RatingTier::Medium => self.rating_medium,
            RatingTier::Low => self.rating_low,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
