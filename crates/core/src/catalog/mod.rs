//! Library catalog - the movies and series whose streams are kept fresh.
//!
//! Catalog rows are owned by an external ingestion process; this crate only
//! pages through them.

mod sqlite;
mod types;

pub use sqlite::SqliteCatalog;
pub use types::*;

/// Read-only paging access to the library.
pub trait CatalogStore: Send + Sync {
    /// List items of one kind ordered by id.
    fn list_content(
        &self,
        kind: ContentKind,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ContentRef>, CatalogError>;

    /// Look up one item by id.
    fn get_content(&self, kind: ContentKind, id: i64) -> Result<Option<ContentRef>, CatalogError>;

    /// Total number of items of one kind.
    fn count_content(&self, kind: ContentKind) -> Result<u64, CatalogError>;
}
