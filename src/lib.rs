//! marquee: a terminal movie and TV discovery client with a local watchlist.

pub mod app;
pub mod catalog;
pub mod config;
pub mod search;
pub mod storage;
pub mod theme;
pub mod ui;
pub mod util;
