use crate::db::DbConnection;
use crate::domain::calendar::CalendarService;
use anyhow::Result;
use chrono::Utc;
use shared::{CreateTaskRequest, Task};
use tracing::info;

/// Longest accepted task title
const MAX_TITLE_LENGTH: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum TaskValidationError {
    #[error("Title cannot be empty")]
    EmptyTitle,
    #[error("Title is too long")]
    TitleTooLong,
}

/// Service for creating, deleting and listing study tasks
#[derive(Clone)]
pub struct TaskService {
    db: DbConnection,
    calendar: CalendarService,
}

impl TaskService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            db,
            calendar: CalendarService::new(),
        }
    }

    /// List tasks whose date range intersects the given month, in
    /// insertion order
    pub async fn list_tasks_for_month(&self, month: u32, year: u32) -> Result<Vec<Task>> {
        info!("Listing tasks overlapping {}/{}", month, year);

        let month_start = format!("{:04}-{:02}-01", year, month);
        let month_end = format!(
            "{:04}-{:02}-{:02}",
            year,
            month,
            self.calendar.days_in_month(month, year)
        );

        self.db.tasks_overlapping(&month_start, &month_end).await
    }

    /// Create a new task. The backend assigns the id and creation
    /// timestamp; everything else is stored as sent.
    ///
    /// Note: start/end ordering is deliberately not checked. An inverted
    /// range is stored and simply never shows up on the grid.
    pub async fn create_task(&self, request: CreateTaskRequest) -> Result<Task> {
        info!("Creating task: {:?}", request.title);

        if request.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle.into());
        }
        if request.title.len() > MAX_TITLE_LENGTH {
            return Err(TaskValidationError::TitleTooLong.into());
        }

        let now = Utc::now();
        let task = Task {
            id: Task::generate_id(now.timestamp_millis().max(0) as u64),
            title: request.title,
            subject: request.subject,
            start_date: request.start_date,
            end_date: request.end_date,
            status: request.status,
            created_at: now.to_rfc3339(),
        };

        self.db.store_task(&task).await?;
        Ok(task)
    }

    /// Delete a task by ID. Deleting an id that no longer exists is a
    /// success; the end state is the same either way.
    pub async fn delete_task(&self, task_id: &str) -> Result<()> {
        let removed = self.db.delete_task(task_id).await?;
        if !removed {
            info!("Delete for unknown task {}, treating as done", task_id);
        }
        Ok(())
    }
}
