//! Utility functions shared by the catalog client and the TUI.
//!
//! - **Text**: terminal-safe sanitizing, width-aware truncation, and the
//!   date/runtime/rating formatting used by the detail overlay
//! - **URLs**: base URL vetting for providers and scheme checks before
//!   opening links in the browser

mod text;
mod links;

pub use self::text::{
    display_width, format_date, format_runtime, strip_control_chars, truncate_to_width, year_of,
    RatingTier,
};
pub use self::links::{validate_base_url, validate_url_for_open, UrlValidationError};

/// Maximum allowed search query length.
pub const MAX_SEARCH_QUERY_LENGTH: usize = 256;
