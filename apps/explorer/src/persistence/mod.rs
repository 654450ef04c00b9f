// Persistence bridge: snapshot export/import and the saved-search collection.

pub mod handlers;
pub mod saved_searches;
pub mod snapshot;

pub use saved_searches::{FileStorage, RedisStorage, SavedSearchBook, SearchStorage};
