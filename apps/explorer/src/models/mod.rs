pub mod career;
pub mod path;
pub mod saved_search;

pub use career::*;
pub use path::{NodeType, PathNode};
pub use saved_search::SavedSearch;
