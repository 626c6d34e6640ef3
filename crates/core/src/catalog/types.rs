//! Types for the library catalog (movies and series the worker keeps streams for).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of library item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Movie,
    Series,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Movie => "movie",
            ContentKind::Series => "series",
        }
    }
}

/// A library item as seen by the backfill scanner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentRef {
    /// Catalog row id (movie id or series id).
    pub id: i64,
    pub kind: ContentKind,
    pub title: String,
    /// External identifier used to query stream providers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl ContentRef {
    /// IMDb id, if present and non-blank.
    pub fn usable_imdb_id(&self) -> Option<&str> {
        self.imdb_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&ContentKind::Movie).unwrap(),
            "\"movie\""
        );
        assert_eq!(
            serde_json::to_string(&ContentKind::Series).unwrap(),
            "\"series\""
        );
    }

    #[test]
    fn test_usable_imdb_id() {
        let mut item = ContentRef {
            id: 1,
            kind: ContentKind::Movie,
            title: "Heat".to_string(),
            imdb_id: Some(" tt0113277 ".to_string()),
            year: Some(1995),
        };
        assert_eq!(item.usable_imdb_id(), Some("tt0113277"));

        item.imdb_id = Some("   ".to_string());
        assert_eq!(item.usable_imdb_id(), None);

        item.imdb_id = None;
        assert_eq!(item.usable_imdb_id(), None);
    }
}
