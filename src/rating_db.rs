use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::StoreError;
use crate::store::RatingStore;
use crate::types::SkillRating;

// Reference sqlite-backed store. The pair write runs inside one transaction,
// which is what makes recordResult atomic across both entities.
pub struct SqliteRatingStore {
    conn: Mutex<Connection>,
}

impl SqliteRatingStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)
            .with_context(|| format!("open ratings db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory ratings db")?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS ratings (
            entity_id TEXT PRIMARY KEY,
            mu REAL NOT NULL,
            sigma REAL NOT NULL,
            matches_observed INTEGER NOT NULL,
            last_updated TEXT NOT NULL
        );
        "#,
    )
    .context("create ratings schema")?;
    Ok(())
}

fn upsert_rating(tx: &rusqlite::Transaction<'_>, r: &SkillRating) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO ratings(entity_id, mu, sigma, matches_observed, last_updated)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(entity_id) DO UPDATE SET
            mu = excluded.mu,
            sigma = excluded.sigma,
            matches_observed = excluded.matches_observed,
            last_updated = excluded.last_updated",
        params![
            r.entity_id,
            r.mu,
            r.sigma,
            r.matches_observed as i64,
            r.last_updated.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|err| StoreError::Backend(format!("bad last_updated '{raw}': {err}")))
}

impl RatingStore for SqliteRatingStore {
    fn read(&self, entity_id: &str) -> Result<Option<SkillRating>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Backend("ratings db lock poisoned".to_string()))?;
        let row = conn
            .query_row(
                "SELECT entity_id, mu, sigma, matches_observed, last_updated
                 FROM ratings WHERE entity_id = ?1",
                params![entity_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((entity_id, mu, sigma, matches_observed, last_updated)) => {
                Ok(Some(SkillRating {
                    entity_id,
                    mu,
                    sigma,
                    matches_observed: matches_observed.max(0) as u32,
                    last_updated: parse_timestamp(&last_updated)?,
                }))
            }
        }
    }

    fn write_pair(&self, a: &SkillRating, b: &SkillRating) -> Result<(), StoreError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Backend("ratings db lock poisoned".to_string()))?;
        let tx = conn.transaction()?;
        upsert_rating(&tx, a)?;
        upsert_rating(&tx, b)?;
        tx.commit()?;
        Ok(())
    }
}
