use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use thiserror::Error;

use crate::models::{NextStepCandidate, PathNode};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ImportParseError {
    #[error("Snapshot is not valid JSON: {0}")]
    Syntax(String),

    #[error("Snapshot does not describe a career path: {0}")]
    Shape(String),
}

impl From<serde_json::Error> for ImportParseError {
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            Category::Data => ImportParseError::Shape(err.to_string()),
            Category::Syntax | Category::Eof | Category::Io => {
                ImportParseError::Syntax(err.to_string())
            }
        }
    }
}

/// Portable copy of a path, as downloaded by the user.
///
/// Only `path` is required on import; documents written by hand or by older
/// clients may omit the rest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub path: Vec<PathNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recommendations: Vec<NextStepCandidate>,
}

impl Snapshot {
    pub fn capture(path: &[PathNode], recommendations: Vec<NextStepCandidate>) -> Self {
        Self {
            path: path.to_vec(),
            timestamp: Some(Utc::now()),
            recommendations,
        }
    }

    /// Suggested download name, e.g. `career-path-2024-05-01.json`.
    pub fn file_name(&self) -> String {
        let date = self.timestamp.unwrap_or_else(Utc::now).format("%Y-%m-%d");
        format!("career-path-{date}.json")
    }
}

pub fn parse(document: &str) -> Result<Snapshot, ImportParseError> {
    Ok(serde_json::from_str(document)?)
}
