//! Transaction counter store.
//!
//! One row per photobooth visit, keyed by access id, holding the three
//! counters the dashboard aggregates. Counter columns are only reachable
//! through `CounterField`, so no request-supplied name ever lands in SQL.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::{debug, info};

use booth_models::{
    AccessId, ArtistSaveShareTotal, ArtistTotal, CounterField, DailyAggregate, TransactionReport,
    ARTIST_COUNT,
};

use crate::error::{DbError, DbResult};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    access_id TEXT NOT NULL UNIQUE,
    artist_id INTEGER NOT NULL,
    take_photo INTEGER NOT NULL DEFAULT 0,
    take_video INTEGER NOT NULL DEFAULT 0,
    save_and_share INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_transactions_created_at ON transactions (created_at);
CREATE INDEX IF NOT EXISTS idx_transactions_artist_id ON transactions (artist_id);
"#;

/// SQLite-backed store of per-visit transaction counters.
#[derive(Clone)]
pub struct TransactionStore {
    pool: SqlitePool,
}

impl TransactionStore {
    /// Connect and apply the schema.
    pub async fn connect(url: &str) -> DbResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        info!(url = url, "Transaction store ready");
        Ok(store)
    }

    /// In-memory store for tests.
    pub async fn in_memory() -> DbResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    async fn init_schema(&self) -> DbResult<()> {
        // Multi-statement schema, so raw_sql rather than a prepared query
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Record a new visit with zeroed counters.
    pub async fn create_access(
        &self,
        user_id: &str,
        access_id: &AccessId,
        artist_id: u32,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "INSERT INTO transactions (user_id, access_id, artist_id) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(access_id.as_str())
        .bind(artist_id as i64)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(access_id = access_id.as_str(), "Access recorded");
                Ok(())
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DbError::DuplicateAccess(access_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Increment one counter by exactly 1 and stamp `updated_at`.
    ///
    /// An unknown access id mutates nothing.
    pub async fn increment(&self, access_id: &AccessId, field: CounterField) -> DbResult<()> {
        // Column comes from the closed CounterField mapping, never from input
        let sql = format!(
            "UPDATE transactions SET {col} = {col} + 1, updated_at = datetime('now') \
             WHERE access_id = ?",
            col = field.column()
        );

        let result = sqlx::query(&sql)
            .bind(access_id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::access_not_found(access_id.as_str()));
        }

        debug!(
            access_id = access_id.as_str(),
            field = field.wire_name(),
            "Counter incremented"
        );
        Ok(())
    }

    /// Paginated per-day aggregates plus per-artist totals.
    ///
    /// Artist ids `1..=ARTIST_COUNT` are always present in the output,
    /// zero-filled when no rows exist.
    pub async fn report(&self, page: i64, limit: i64) -> DbResult<TransactionReport> {
        let page = page.max(1);
        let limit = limit.max(1);
        let offset = (page - 1) * limit;

        let (total_records,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM transactions")
                .fetch_one(&self.pool)
                .await?;

        let daily: Vec<(String, i64, i64, i64)> = sqlx::query_as(
            "SELECT DATE(created_at), COUNT(*), COUNT(DISTINCT user_id), \
             COALESCE(SUM(save_and_share), 0) \
             FROM transactions \
             GROUP BY DATE(created_at) \
             ORDER BY DATE(created_at) DESC \
             LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let rows_by_artist: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT artist_id, COUNT(*) FROM transactions \
             WHERE artist_id BETWEEN 1 AND ? \
             GROUP BY artist_id",
        )
        .bind(ARTIST_COUNT as i64)
        .fetch_all(&self.pool)
        .await?;

        let save_share_by_artist: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT artist_id, COALESCE(SUM(save_and_share), 0) FROM transactions \
             WHERE artist_id BETWEEN 1 AND ? \
             GROUP BY artist_id",
        )
        .bind(ARTIST_COUNT as i64)
        .fetch_all(&self.pool)
        .await?;

        let sum_by_artist = (1..=ARTIST_COUNT)
            .map(|artist_id| ArtistTotal {
                artist_id,
                total_rows: rows_by_artist
                    .iter()
                    .find(|(id, _)| *id == artist_id as i64)
                    .map(|(_, n)| *n)
                    .unwrap_or(0),
            })
            .collect();

        let save_share = (1..=ARTIST_COUNT)
            .map(|artist_id| ArtistSaveShareTotal {
                artist_id,
                total_save_and_share: save_share_by_artist
                    .iter()
                    .find(|(id, _)| *id == artist_id as i64)
                    .map(|(_, n)| *n)
                    .unwrap_or(0),
            })
            .collect();

        Ok(TransactionReport {
            total_records,
            total_pages: (total_records + limit - 1) / limit,
            current_page: page,
            page_size: limit,
            data: daily
                .into_iter()
                .map(|(date, total_rows, unique_users, total_save_and_share)| DailyAggregate {
                    date,
                    total_rows,
                    unique_users,
                    total_save_and_share,
                })
                .collect(),
            sum_by_artist,
            save_share_by_artist: save_share,
        })
    }

    /// Counter values for one access id (tests, diagnostics).
    pub async fn counters(&self, access_id: &AccessId) -> DbResult<(i64, i64, i64)> {
        sqlx::query_as(
            "SELECT take_photo, take_video, save_and_share FROM transactions WHERE access_id = ?",
        )
        .bind(access_id.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::access_not_found(access_id.as_str()))
    }

    /// `updated_at` for one access id.
    pub async fn updated_at(&self, access_id: &AccessId) -> DbResult<Option<String>> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT updated_at FROM transactions WHERE access_id = ?")
                .bind(access_id.as_str())
                .fetch_optional(&self.pool)
                .await?;
        row.map(|(v,)| v)
            .ok_or_else(|| DbError::access_not_found(access_id.as_str()))
    }
}
