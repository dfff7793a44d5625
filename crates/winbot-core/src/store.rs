//! Send-record persistence: one row per user holding the last delivery date.
//!
//! [`SendRecordStore`] is the port the conversation flow talks to; the default
//! implementation is [`SqliteSendStore`] over a single `users` table:
//!
//! ```sql
//! users(user_id INTEGER PRIMARY KEY, last_sent TEXT)  -- ISO `YYYY-MM-DD`
//! ```
//!
//! Queries use the runtime-checked `sqlx::query` form so no `DATABASE_URL`
//! is needed at compile time.

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::debug;

use crate::{
    clock::Clock,
    domain::UserId,
    gate::{self, Eligibility},
    Result,
};

#[async_trait]
pub trait SendRecordStore: Send + Sync {
    /// Eligible when there is no record, the record is unparseable, or it is
    /// strictly before today.
    async fn eligibility(&self, user_id: UserId) -> Result<Eligibility>;

    /// Upsert today's date for `user_id`. Call only after a successful delivery.
    async fn record_sent_today(&self, user_id: UserId) -> Result<()>;

    async fn is_eligible_today(&self, user_id: UserId) -> Result<bool> {
        Ok(self.eligibility(user_id).await?.is_eligible())
    }
}

#[derive(Clone)]
pub struct SqliteSendStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteSendStore {
    /// Open (or create) the database file at `path` and ensure the table exists.
    pub async fn open(path: &Path, clock: Arc<dyn Clock>) -> Result<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (\
                 user_id INTEGER PRIMARY KEY, \
                 last_sent TEXT\
             )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool, clock })
    }

    /// Raw stored value for `user_id`, if a row exists and holds text.
    ///
    /// Older databases declare `last_sent DATE` (NUMERIC affinity), so a
    /// corrupted value may come back as an integer, real or blob. Those, NULL,
    /// and text that is not UTF-8 all read as "no usable record".
    pub async fn last_sent_raw(&self, user_id: UserId) -> Result<Option<String>> {
        let row: Option<(Option<Vec<u8>>,)> = sqlx::query_as(
            "SELECT CASE WHEN typeof(last_sent) = 'text' \
                 THEN CAST(last_sent AS BLOB) END \
             FROM users WHERE user_id = ?1",
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row
            .and_then(|(v,)| v)
            .and_then(|bytes| String::from_utf8(bytes).ok()))
    }

    pub async fn last_sent(&self, user_id: UserId) -> Result<Option<NaiveDate>> {
        Ok(self
            .last_sent_raw(user_id)
            .await?
            .as_deref()
            .and_then(gate::parse_stored_date))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SendRecordStore for SqliteSendStore {
    async fn eligibility(&self, user_id: UserId) -> Result<Eligibility> {
        let stored = self.last_sent_raw(user_id).await?;
        let today = self.clock.today();
        let verdict = gate::evaluate(stored.as_deref(), today);
        debug!(user_id = user_id.0, ?stored, %today, ?verdict, "eligibility evaluated");
        Ok(verdict)
    }

    async fn record_sent_today(&self, user_id: UserId) -> Result<()> {
        let today = gate::format_stored_date(self.clock.today());
        sqlx::query(
            "INSERT INTO users (user_id, last_sent) VALUES (?1, ?2) \
             ON CONFLICT(user_id) DO UPDATE SET last_sent = excluded.last_sent",
        )
        .bind(user_id.0)
        .bind(&today)
        .execute(&self.pool)
        .await?;
        debug!(user_id = user_id.0, %today, "send recorded");
        Ok(())
    }
}
