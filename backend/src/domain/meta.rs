use crate::db::{DayMetaRecord, DbConnection, MonthMetaRecord};
use crate::domain::checklist;
use anyhow::Result;
use chrono::Utc;
use shared::{DayMeta, MonthMeta, UpsertDayMetaRequest, UpsertMonthMetaRequest};
use tracing::info;

/// Service for per-day and per-month metadata documents.
///
/// Reads normalize legacy entries for display; writes store exactly what
/// the client sent and stamp `updated_at`. Both documents are upsert-only
/// with last-write-wins semantics.
#[derive(Clone)]
pub struct MetaService {
    db: DbConnection,
}

impl MetaService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Fetch a day's metadata, or the empty default when none is stored
    pub async fn get_day_meta(&self, year: u32, month: u32, day: u32) -> Result<DayMeta> {
        match self.db.get_day_meta(year, month, day).await? {
            Some(record) => Ok(DayMeta {
                year,
                month,
                day,
                todo: checklist::normalize(&record.todo),
                notes: record.notes,
                updated_at: Some(record.updated_at),
            }),
            None => Ok(DayMeta {
                year,
                month,
                day,
                todo: Vec::new(),
                notes: String::new(),
                updated_at: None,
            }),
        }
    }

    /// Upsert a day's metadata, keyed by (year, month, day)
    pub async fn upsert_day_meta(&self, request: UpsertDayMetaRequest) -> Result<()> {
        info!(
            "Upserting day_meta {}/{}/{}",
            request.year, request.month, request.day
        );

        let record = DayMetaRecord {
            year: request.year,
            month: request.month,
            day: request.day,
            todo: request.todo,
            notes: request.notes,
            updated_at: Utc::now().to_rfc3339(),
        };
        self.db.upsert_day_meta(&record).await
    }

    /// Fetch a month's metadata, or the empty default when none is stored
    pub async fn get_month_meta(&self, year: u32, month: u32) -> Result<MonthMeta> {
        match self.db.get_month_meta(year, month).await? {
            Some(record) => Ok(MonthMeta {
                year,
                month,
                goals: checklist::normalize(&record.goals),
                updated_at: Some(record.updated_at),
            }),
            None => Ok(MonthMeta {
                year,
                month,
                goals: Vec::new(),
                updated_at: None,
            }),
        }
    }

    /// Upsert a month's metadata, keyed by (year, month)
    pub async fn upsert_month_meta(&self, request: UpsertMonthMetaRequest) -> Result<()> {
        info!("Upserting month_meta {}/{}", request.year, request.month);

        let record = MonthMetaRecord {
            year: request.year,
            month: request.month,
            goals: request.goals,
            updated_at: Utc::now().to_rfc3339(),
        };
        self.db.upsert_month_meta(&record).await
    }
}
