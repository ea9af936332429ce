mod kv;
mod schema;
mod types;
mod watchlist;

pub use schema::Database;
pub use types::DatabaseError;
pub use watchlist::{
    WatchlistError, WatchlistFilter, WatchlistItem, WatchlistKey, WatchlistSort, WatchlistStore,
    WATCHLIST_KEY,
};
