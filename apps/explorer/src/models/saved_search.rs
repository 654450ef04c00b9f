use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named set of search filters kept in local storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedSearch {
    /// Creation time in epoch milliseconds.
    pub id: i64,
    pub name: String,
    /// Opaque to the explorer; stored exactly as given.
    #[serde(default)]
    pub filters: Map<String, Value>,
    /// ISO-8601 creation timestamp.
    pub timestamp: String,
}
