//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `render` - Layout and view dispatch
//! - `helpers` - Task spawning and link opening
//! - `titles` - Title list widget
//! - `watchlist` - Watchlist tab widget
//! - `details` - Detail overlay widget
//! - `status` - Status bar widget

mod details;
mod events;
mod helpers;
mod input;
mod loop_runner;
mod render;
mod status;
mod titles;
mod watchlist;

// Re-export the public API
pub use loop_runner::{run, Action};
