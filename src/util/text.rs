use std::borrow::Cow;

use chrono::NaiveDate;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Terminal column width of a string (CJK and emoji count as two).
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

const ELLIPSIS: &str = "...";

/// Truncates `s` so it occupies at most `max_width` terminal columns.
///
/// When the string does not fit, the tail is replaced with `...`. Widths too
/// narrow for an ellipsis (three columns or fewer) get a hard cut instead.
/// Returns `Cow::Borrowed` when nothing had to be cut.
///
/// ```
/// use marquee::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Inception", 20), "Inception");
/// assert_eq!(truncate_to_width("The Shawshank Redemption", 10), "The Sha...");
/// assert_eq!(truncate_to_width("Heat", 2), "He");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let (budget, suffix) = if max_width <= ELLIPSIS.len() {
        (max_width, "")
    } else {
        (max_width - ELLIPSIS.len(), ELLIPSIS)
    };

    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }

    Cow::Owned(format!("{}{}", &s[..end], suffix))
}

/// Removes terminal control characters and ANSI escape sequences.
///
/// Titles, overviews and cast names come from a remote provider and are
/// printed straight into the terminal, so anything that could move the
/// cursor or retitle the window is dropped. Tab, newline and carriage return
/// survive. CSI (`ESC [ ... final`) and OSC (`ESC ] ... BEL|ST`) sequences are
/// removed whole; a lone ESC is removed by itself.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    fn is_unsafe(c: char) -> bool {
        c == '\u{1b}' || c == '\u{7f}' || (c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r'))
    }

    if !s.chars().any(is_unsafe) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            match chars.peek() {
                Some('[') => {
                    chars.next();
                    // Parameter and intermediate bytes run until a final byte in 0x40..=0x7e
                    for next in chars.by_ref() {
                        if ('\u{40}'..='\u{7e}').contains(&next) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == '\u{07}' {
                            break;
                        }
                        if next == '\u{1b}' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            }
        } else if !is_unsafe(c) {
            out.push(c);
        }
    }

    Cow::Owned(out)
}

/// Formats a runtime in minutes as `2h 28m`, `45m`, or `Unknown`.
pub fn format_runtime(minutes: Option<u32>) -> String {
    match minutes {
        None | Some(0) => "Unknown".to_string(),
        Some(m) if m >= 60 => format!("{}h {}m", m / 60, m % 60),
        Some(m) => format!("{}m", m),
    }
}

/// Formats an ISO `YYYY-MM-DD` date as `July 16, 2010`.
///
/// Missing or unparseable dates render as `Unknown`.
pub fn format_date(date: Option<&str>) -> String {
    date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Extracts the year from an ISO date string.
pub fn year_of(date: Option<&str>) -> Option<i32> {
    let date = date?;
    date.get(..4)?.parse().ok()
}

/// Coarse bucket for colouring a 0-10 rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingTier {
    High,
    Medium,
    Low,
}

impl RatingTier {
    pub fn of(rating: f64) -> Self {
        if rating >= 7.0 {
            Self::High
        } else if rating >= 5.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}
