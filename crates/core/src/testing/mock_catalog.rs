//! In-memory catalog for testing.

use std::sync::RwLock;

use crate::catalog::{CatalogError, CatalogStore, ContentKind, ContentRef};

/// Mock implementation of the CatalogStore trait backed by a vector.
#[derive(Debug, Default)]
pub struct MockCatalog {
    items: RwLock<Vec<ContentRef>>,
    fail: RwLock<bool>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_movie(&self, id: i64, title: &str, imdb_id: Option<&str>) {
        self.add(ContentKind::Movie, id, title, imdb_id);
    }

    pub fn add_series(&self, id: i64, title: &str, imdb_id: Option<&str>) {
        self.add(ContentKind::Series, id, title, imdb_id);
    }

    /// Make every call fail with a database error.
    pub fn set_failing(&self, fail: bool) {
        *self.fail.write().unwrap() = fail;
    }

    fn add(&self, kind: ContentKind, id: i64, title: &str, imdb_id: Option<&str>) {
        let mut items = self.items.write().unwrap();
        items.push(ContentRef {
            id,
            kind,
            title: title.to_string(),
            imdb_id: imdb_id.map(str::to_string),
            year: None,
        });
        items.sort_by_key(|item| item.id);
    }

    fn check(&self) -> Result<(), CatalogError> {
        if *self.fail.read().unwrap() {
            return Err(CatalogError::Database("catalog unavailable".to_string()));
        }
        Ok(())
    }
}

impl CatalogStore for MockCatalog {
    fn list_content(
        &self,
        kind: ContentKind,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ContentRef>, CatalogError> {
        self.check()?;
        Ok(self
            .items
            .read()
            .unwrap()
            .iter()
            .filter(|item| item.kind == kind)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    fn get_content(&self, kind: ContentKind, id: i64) -> Result<Option<ContentRef>, CatalogError> {
        self.check()?;
        Ok(self
            .items
            .read()
            .unwrap()
            .iter()
            .find(|item| item.kind == kind && item.id == id)
            .cloned())
    }

    fn count_content(&self, kind: ContentKind) -> Result<u64, CatalogError> {
        self.check()?;
        Ok(self
            .items
            .read()
            .unwrap()
            .iter()
            .filter(|item| item.kind == kind)
            .count() as u64)
    }
}
