//! SQLite-backed library catalog reader.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use super::{CatalogError, CatalogStore, ContentKind, ContentRef};

/// SQLite-backed library catalog.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Open the catalog, creating empty library tables if they do not exist yet.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path).map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory catalog (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS library_movies (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                imdb_id TEXT,
                year INTEGER
            );

            CREATE TABLE IF NOT EXISTS library_series (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                imdb_id TEXT,
                year INTEGER
            );
            "#,
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(())
    }

    fn table(kind: ContentKind) -> &'static str {
        match kind {
            ContentKind::Movie => "library_movies",
            ContentKind::Series => "library_series",
        }
    }
}

impl CatalogStore for SqliteCatalog {
    fn list_content(
        &self,
        kind: ContentKind,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ContentRef>, CatalogError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT id, title, imdb_id, year FROM {} ORDER BY id LIMIT ? OFFSET ?",
            Self::table(kind)
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let items = stmt
            .query_map(params![limit as i64, offset as i64], |row| {
                Ok(ContentRef {
                    id: row.get(0)?,
                    kind,
                    title: row.get(1)?,
                    imdb_id: row.get(2)?,
                    year: row.get(3)?,
                })
            })
            .map_err(|e| CatalogError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(items)
    }

    fn get_content(&self, kind: ContentKind, id: i64) -> Result<Option<ContentRef>, CatalogError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT id, title, imdb_id, year FROM {} WHERE id = ?",
            Self::table(kind)
        );

        let result = conn.query_row(&sql, params![id], |row| {
            Ok(ContentRef {
                id: row.get(0)?,
                kind,
                title: row.get(1)?,
                imdb_id: row.get(2)?,
                year: row.get(3)?,
            })
        });

        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CatalogError::Database(e.to_string())),
        }
    }

    fn count_content(&self, kind: ContentKind) -> Result<u64, CatalogError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", Self::table(kind)),
                [],
                |row| row.get(0),
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        Ok(count as u64)
    }
}
