//! SQLite storage sink for derived score records.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, Row};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::models::{Category, CategorySummary, ScoreRecord, StoredScore};
use crate::schema::sentiment_scores;

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Database manager owning the consumer's single store connection
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the store at `path` and make sure the table exists
    pub fn open(path: &Path) -> Result<Self> {
        if path.as_os_str().is_empty() {
            return Err(PipelineError::InvalidConfig("store path cannot be empty".to_string()));
        }

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::run_migrations(&conn)?;
        info!(path = %path.display(), "Opened sentiment store");

        Ok(Self { conn, path: Some(path.to_path_buf()) })
    }

    /// Open a private in-memory store
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::run_migrations(&conn)?;
        Ok(Self { conn, path: None })
    }

    /// Delete the store file so the next `open` starts empty
    pub fn reset(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => {
                info!(path = %path.display(), "Deleted existing sentiment store");
                Ok(())
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Create tables if they don't exist
    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(include_str!("../migrations/2025-01-29-000000_create_sentiment_scores/up.sql"))?;
        Ok(())
    }

    /// File backing this store, `None` for in-memory stores
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Insert one score record and return its row id
    pub fn insert_score(&self, record: &ScoreRecord) -> Result<i64> {
        self.conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4)",
                sentiment_scores::TABLE,
                sentiment_scores::AUTHOR,
                sentiment_scores::CATEGORY,
                sentiment_scores::SENTIMENT_SCORE,
                sentiment_scores::TIMESTAMP
            ),
            params![record.author, record.category, record.sentiment_score, record.timestamp],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!(row_id = id, "Inserted score row");
        Ok(id)
    }

    /// Number of stored rows
    pub fn count_scores(&self) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", sentiment_scores::TABLE),
            [],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// All stored rows in insertion order
    pub fn all_scores(&self) -> Result<Vec<StoredScore>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}, {}, {}, {}, {} FROM {} ORDER BY {}",
            sentiment_scores::ID,
            sentiment_scores::AUTHOR,
            sentiment_scores::CATEGORY,
            sentiment_scores::SENTIMENT_SCORE,
            sentiment_scores::TIMESTAMP,
            sentiment_scores::TABLE,
            sentiment_scores::ID
        ))?;

        let rows = stmt.query_map([], Self::map_stored_score)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Per-category aggregates, ordered by category name
    pub fn category_summaries(&self) -> Result<Vec<CategorySummary>> {
        let score = sentiment_scores::SENTIMENT_SCORE;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {category}, COUNT(*), AVG({score}), MIN({score}), MAX({score}) \
             FROM {table} GROUP BY {category} ORDER BY {category}",
            category = sentiment_scores::CATEGORY,
            table = sentiment_scores::TABLE,
        ))?;

        let rows = stmt.query_map([], |row| {
            let count: i64 = row.get(1)?;
            Ok(CategorySummary {
                category: row.get(0)?,
                count: u64::try_from(count).unwrap_or_default(),
                average_score: row.get(2)?,
                min_score: row.get(3)?,
                max_score: row.get(4)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn map_stored_score(row: &Row<'_>) -> rusqlite::Result<StoredScore> {
        Ok(StoredScore {
            id: row.get(0)?,
            record: ScoreRecord {
                author: row.get(1)?,
                category: row.get(2)?,
                sentiment_score: row.get(3)?,
                timestamp: row.get(4)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(author: &str, category: Category, score: f64) -> ScoreRecord {
        ScoreRecord {
            author: author.to_string(),
            category,
            sentiment_score: score,
            timestamp: NaiveDate::from_ymd_opt(2025, 1, 29).unwrap().and_hms_opt(14, 35, 20).unwrap(),
        }
    }

    #[test]
    fn test_insert_and_read_back() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_score(&record("Judy", Category::Skating, 0.5)).unwrap();

        let rows = db.all_scores().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].record, record("Judy", Category::Skating, 0.5));
    }

    #[test]
    fn test_category_summaries() {
        let db = Database::open_in_memory().unwrap();
        db.insert_score(&record("Bob", Category::Skiing, 0.4)).unwrap();
        db.insert_score(&record("Walter", Category::Skiing, -0.2)).unwrap();
        db.insert_score(&record("Judy", Category::Museum, 1.0)).unwrap();

        let summaries = db.category_summaries().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].category, Category::Museum);
        assert_eq!(summaries[1].category, Category::Skiing);
        assert_eq!(summaries[1].count, 2);
        assert!((summaries[1].average_score - 0.1).abs() < 1e-9);
        assert!((summaries[1].min_score + 0.2).abs() < 1e-9);
        assert!((summaries[1].max_score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_empty_path_is_rejected() {
        assert!(Database::open(Path::new("")).is_err());
    }
}
