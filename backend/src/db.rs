use anyhow::{Context, Result};
use shared::{ListEntry, Task};
use sqlx::{migrate::MigrateDatabase, Row, Sqlite, SqlitePool};
use std::sync::Arc;

// The database URL for the production database
const DATABASE_URL: &str = "sqlite:study_planner.db";

/// A day_meta row as stored. The todo list keeps whatever shape the last
/// writer sent (legacy strings included); normalization happens in the
/// domain layer on read.
#[derive(Debug, Clone, PartialEq)]
pub struct DayMetaRecord {
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub todo: Vec<ListEntry>,
    pub notes: String,
    pub updated_at: String,
}

/// A month_meta row as stored
#[derive(Debug, Clone, PartialEq)]
pub struct MonthMetaRecord {
    pub year: u32,
    pub month: u32,
    pub goals: Vec<ListEntry>,
    pub updated_at: String,
}

/// DbConnection manages database operations for the three collections:
/// tasks, day_meta and month_meta.
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        // Connect to the database
        let pool = SqlitePool::connect(url).await?;

        // Setup database schema
        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Initialize the standard database
    pub async fn init() -> Result<Self> {
        Self::new(DATABASE_URL).await
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        // Generate a unique database name for tests
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                subject TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Index for the month-overlap query
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_tasks_dates
            ON tasks(start_date, end_date);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS day_meta (
                year INTEGER NOT NULL,
                month INTEGER NOT NULL,
                day INTEGER NOT NULL,
                todo TEXT NOT NULL,
                notes TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (year, month, day)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS month_meta (
                year INTEGER NOT NULL,
                month INTEGER NOT NULL,
                goals TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (year, month)
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Store a new task
    pub async fn store_task(&self, task: &Task) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, title, subject, start_date, end_date, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.id)
        .bind(&task.title)
        .bind(&task.subject)
        .bind(&task.start_date)
        .bind(&task.end_date)
        .bind(&task.status)
        .bind(&task.created_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    /// Delete a task by ID. Returns true if a row was removed.
    pub async fn delete_task(&self, task_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(task_id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List tasks whose inclusive [start_date, end_date] range intersects
    /// the given window, in insertion order.
    ///
    /// Zero-padded YYYY-MM-DD strings compare in date order, so plain
    /// string comparison is the whole intersection test.
    pub async fn tasks_overlapping(&self, window_start: &str, window_end: &str) -> Result<Vec<Task>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, subject, start_date, end_date, status, created_at
            FROM tasks
            WHERE start_date <= ? AND end_date >= ?
            ORDER BY ROWID
            "#,
        )
        .bind(window_end)
        .bind(window_start)
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| Task {
                id: r.get("id"),
                title: r.get("title"),
                subject: r.get("subject"),
                start_date: r.get("start_date"),
                end_date: r.get("end_date"),
                status: r.get("status"),
                created_at: r.get("created_at"),
            })
            .collect())
    }

    /// Fetch the day_meta row for a (year, month, day) key, if any
    pub async fn get_day_meta(&self, year: u32, month: u32, day: u32) -> Result<Option<DayMetaRecord>> {
        let row = sqlx::query(
            r#"
            SELECT todo, notes, updated_at
            FROM day_meta
            WHERE year = ? AND month = ? AND day = ?
            "#,
        )
        .bind(year)
        .bind(month)
        .bind(day)
        .fetch_optional(&*self.pool)
        .await?;

        match row {
            Some(r) => {
                let todo_json: String = r.get("todo");
                let todo: Vec<ListEntry> = serde_json::from_str(&todo_json)
                    .context("decoding stored day_meta todo list")?;
                Ok(Some(DayMetaRecord {
                    year,
                    month,
                    day,
                    todo,
                    notes: r.get("notes"),
                    updated_at: r.get("updated_at"),
                }))
            }
            None => Ok(None),
        }
    }

    /// Insert-or-replace the day_meta row for its (year, month, day) key.
    /// Last write wins; there is no version check.
    pub async fn upsert_day_meta(&self, record: &DayMetaRecord) -> Result<()> {
        let todo_json = serde_json::to_string(&record.todo)?;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO day_meta (year, month, day, todo, notes, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.year)
        .bind(record.month)
        .bind(record.day)
        .bind(todo_json)
        .bind(&record.notes)
        .bind(&record.updated_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    /// Fetch the month_meta row for a (year, month) key, if any
    pub async fn get_month_meta(&self, year: u32, month: u32) -> Result<Option<MonthMetaRecord>> {
        let row = sqlx::query(
            r#"
            SELECT goals, updated_at
            FROM month_meta
            WHERE year = ? AND month = ?
            "#,
        )
        .bind(year)
        .bind(month)
        .fetch_optional(&*self.pool)
        .await?;

        match row {
            Some(r) => {
                let goals_json: String = r.get("goals");
                let goals: Vec<ListEntry> = serde_json::from_str(&goals_json)
                    .context("decoding stored month_meta goal list")?;
                Ok(Some(MonthMetaRecord {
                    year,
                    month,
                    goals,
                    updated_at: r.get("updated_at"),
                }))
            }
            None => Ok(None),
        }
    }

    /// Insert-or-replace the month_meta row for its (year, month) key
    pub async fn upsert_month_meta(&self, record: &MonthMetaRecord) -> Result<()> {
        let goals_json = serde_json::to_string(&record.goals)?;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO month_meta (year, month, goals, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(record.year)
        .bind(record.month)
        .bind(goals_json)
        .bind(&record.updated_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }
}
