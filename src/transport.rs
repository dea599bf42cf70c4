//! Transport records and their SQLite-backed repository.
//!
//! Transport queries bypass document retrieval entirely: the agent looks a
//! record up here and injects a formatted summary into the model context.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::config::TransportConfig;
use crate::db;

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// A scheduled transport (flight, train, bus) with its delay status.
#[derive(Debug, Clone, Serialize)]
pub struct Transport {
    pub id: i64,
    /// "Vol", "Train", or "Bus".
    pub kind: String,
    pub number: String,
    pub origin: String,
    pub destination: String,
    pub scheduled_departure: NaiveDateTime,
    pub estimated_departure: NaiveDateTime,
    pub status: String,
    pub delay_minutes: i64,
}

impl Transport {
    /// One-line English summary, phrased differently for delayed and
    /// on-schedule transports.
    pub fn describe(&self) -> String {
        if self.delay_minutes > 0 {
            format!(
                "{} {} ({} to {}) is currently {} with a delay of {} minutes. Estimated departure: {}.",
                self.kind,
                self.number,
                self.origin,
                self.destination,
                self.status,
                self.delay_minutes,
                self.estimated_departure.format(DATETIME_FORMAT)
            )
        } else {
            format!(
                "{} {} ({} to {}) is currently {} on schedule. Scheduled departure: {}.",
                self.kind,
                self.number,
                self.origin,
                self.destination,
                self.status,
                self.scheduled_departure.format(DATETIME_FORMAT)
            )
        }
    }
}

/// Lookup operations the agent needs against the transport store.
#[async_trait]
pub trait TransportRepository: Send + Sync {
    /// All transports whose status is "Delayed".
    async fn find_delayed(&self) -> Result<Vec<Transport>>;
    /// Look a transport up by its public number (e.g. "TGV123").
    async fn find_by_number(&self, number: &str) -> Result<Option<Transport>>;
}

/// SQLite-backed repository.
pub struct SqliteTransportRepository {
    pool: SqlitePool,
}

impl SqliteTransportRepository {
    /// Open the configured database, optionally (re)seeding the sample rows.
    pub async fn open(config: &TransportConfig) -> Result<Self> {
        let pool = db::connect(&config.db_path).await?;
        let repo = Self { pool };
        if config.seed_sample_data {
            repo.seed().await?;
        }
        Ok(repo)
    }

    /// Repository over an already-open pool (tests use an in-memory pool).
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Replace the table contents with the three sample transports.
    pub async fn seed(&self) -> Result<()> {
        sqlx::query("DELETE FROM transports")
            .execute(&self.pool)
            .await?;

        let base = chrono::NaiveDate::from_ymd_opt(2025, 11, 21)
            .context("invalid seed date")?;
        let samples = [
            ("Vol", "AF101", "Paris", "New York", base.and_hms_opt(10, 0, 0), "Scheduled", 0i64),
            ("Train", "TGV123", "Lyon", "Marseille", base.and_hms_opt(14, 30, 0), "Delayed", 15),
            ("Bus", "BUS456", "Nice", "Cannes", base.and_hms_opt(9, 15, 0), "On Time", 0),
        ];

        for (kind, number, origin, destination, scheduled, status, delay) in samples {
            let scheduled = scheduled.context("invalid seed time")?;
            let estimated = scheduled + Duration::minutes(delay);
            sqlx::query(
                "INSERT INTO transports
                 (kind, number, origin, destination, scheduled_departure, estimated_departure, status, delay_minutes)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(kind)
            .bind(number)
            .bind(origin)
            .bind(destination)
            .bind(scheduled.format(DATETIME_FORMAT).to_string())
            .bind(estimated.format(DATETIME_FORMAT).to_string())
            .bind(status)
            .bind(delay)
            .execute(&self.pool)
            .await?;
        }

        info!("transport sample data seeded");
        Ok(())
    }
}

#[async_trait]
impl TransportRepository for SqliteTransportRepository {
    async fn find_delayed(&self) -> Result<Vec<Transport>> {
        let rows = sqlx::query(
            "SELECT id, kind, number, origin, destination, scheduled_departure, estimated_departure, status, delay_minutes
             FROM transports WHERE status = 'Delayed' ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_transport).collect()
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<Transport>> {
        let row = sqlx::query(
            "SELECT id, kind, number, origin, destination, scheduled_departure, estimated_departure, status, delay_minutes
             FROM transports WHERE number = ?",
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_transport).transpose()
    }
}

fn row_to_transport(row: &sqlx::sqlite::SqliteRow) -> Result<Transport> {
    let scheduled: String = row.get("scheduled_departure");
    let estimated: String = row.get("estimated_departure");
    Ok(Transport {
        id: row.get("id"),
        kind: row.get("kind"),
        number: row.get("number"),
        origin: row.get("origin"),
        destination: row.get("destination"),
        scheduled_departure: NaiveDateTime::parse_from_str(&scheduled, DATETIME_FORMAT)
            .with_context(|| format!("bad scheduled_departure: {scheduled}"))?,
        estimated_departure: NaiveDateTime::parse_from_str(&estimated, DATETIME_FORMAT)
            .with_context(|| format!("bad estimated_departure: {estimated}"))?,
        status: row.get("status"),
        delay_minutes: row.get("delay_minutes"),
    })
}
