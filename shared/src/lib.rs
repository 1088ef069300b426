use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A multi-day study task shown on the calendar.
///
/// `start_date` and `end_date` are inclusive calendar dates in `YYYY-MM-DD`
/// form; a task appears on every day of that range. Tasks are created and
/// deleted but never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task ID in format: "task::<epoch_millis>::<uuid>"
    pub id: String,
    pub title: String,
    /// Free-form subject tag (e.g. "JS", "DSA"); may be empty
    pub subject: String,
    /// First day the task is active (YYYY-MM-DD, inclusive)
    pub start_date: String,
    /// Last day the task is active (YYYY-MM-DD, inclusive)
    pub end_date: String,
    pub status: String,
    /// RFC 3339 timestamp assigned by the backend at creation
    pub created_at: String,
}

impl Task {
    /// Generate a task ID from a creation timestamp plus a random tiebreaker
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("task::{}::{}", epoch_millis, uuid::Uuid::new_v4().simple())
    }
}

/// Request for creating a new task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub subject: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default = "default_task_status")]
    pub status: String,
}

fn default_task_status() -> String {
    "pending".to_string()
}

/// Response after creating a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskResponse {
    pub success: bool,
    pub id: String,
}

/// Request for deleting a task by ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteTaskRequest {
    pub id: String,
}

/// Generic acknowledgement for writes that return no data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// A single goal or to-do entry once normalized.
///
/// Monthly goals and daily to-dos share this shape; only the scope of the
/// owning document differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    #[serde(deserialize_with = "lenient_item_id")]
    pub id: String,
    pub text: String,
    pub completed: bool,
}

impl ChecklistItem {
    /// Generate an item ID from a timestamp plus a random tiebreaker
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("item::{}::{}", epoch_millis, uuid::Uuid::new_v4().simple())
    }
}

/// One entry of a persisted goal/todo list as it appears on the wire.
///
/// Older documents stored entries as bare strings; newer ones store
/// structured items. Both shapes are accepted on read and the legacy form is
/// upgraded in memory, never rewritten in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListEntry {
    Item(ChecklistItem),
    Legacy(String),
}

/// Item ids written by legacy clients are JSON numbers (epoch millis,
/// sometimes fractional); everything newer uses strings. Accept both and
/// canonicalize to a string.
fn lenient_item_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or numeric item id")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

/// Per-day metadata: the day's to-do list and free-form notes.
///
/// Keyed by (year, month, day); upsert-only, last write wins. The `todo`
/// list here is already normalized for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayMeta {
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub todo: Vec<ChecklistItem>,
    pub notes: String,
    /// RFC 3339 timestamp of the last upsert; absent for the empty default
    pub updated_at: Option<String>,
}

/// Request to upsert per-day metadata.
///
/// Entries are stored exactly as sent, so legacy strings round-tripped by an
/// old client stay legacy in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertDayMetaRequest {
    pub year: u32,
    pub month: u32,
    pub day: u32,
    #[serde(default)]
    pub todo: Vec<ListEntry>,
    #[serde(default)]
    pub notes: String,
}

/// Per-month metadata: the month's goal list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthMeta {
    pub year: u32,
    pub month: u32,
    pub goals: Vec<ChecklistItem>,
    pub updated_at: Option<String>,
}

/// Request to upsert per-month metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertMonthMetaRequest {
    pub year: u32,
    pub month: u32,
    #[serde(default)]
    pub goals: Vec<ListEntry>,
}

/// One cell of the month grid, computed per render and never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    /// Day-of-month number as displayed in the cell
    pub day: u32,
    /// Whether the cell belongs to the displayed month (padding cells don't)
    pub is_current_month: bool,
    /// Full calendar date of the cell (YYYY-MM-DD)
    pub date: String,
    /// 0 = Sunday, 1 = Monday, ..., 6 = Saturday
    pub weekday: u32,
}

/// A task chip as rendered inside a day cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskBadge {
    pub id: String,
    pub title: String,
    pub subject: String,
    /// Stable palette slot for this title; same title, same color
    pub color_index: u32,
}

/// A grid cell joined with the tasks active on that date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDayView {
    pub day: u32,
    pub is_current_month: bool,
    pub date: String,
    pub weekday: u32,
    /// All tasks overlapping this date, in stored order
    pub tasks: Vec<TaskBadge>,
    /// Distinct subjects among the day's tasks, first-seen order
    pub subjects: Vec<String>,
    /// True when more tasks overlap than the cell displays (3)
    pub has_overflow: bool,
    /// How many tasks the "+N more" affordance stands for
    pub hidden_count: u32,
}

/// A full month view: the 42-cell grid plus navigation targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarMonthView {
    pub year: u32,
    pub month: u32,
    pub month_name: String,
    pub days: Vec<CalendarDayView>,
    pub prev_year: u32,
    pub prev_month: u32,
    pub next_year: u32,
    pub next_month: u32,
}

/// Which side of today a compact three-day window covers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowDirection {
    /// {today-2, today-1, today}
    Prev,
    /// {today, today+1, today+2}
    Next,
}

/// Compact three-day view for narrow viewports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearTodayView {
    pub days: Vec<CalendarDayView>,
    /// Header labels matching the cells, e.g. "Yesterday", "Today"
    pub labels: Vec<String>,
}

/// Current date information from the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentDateResponse {
    pub month: u32,
    pub year: u32,
    pub day: u32,
    pub formatted_date: String, // e.g., "June 19, 2025"
    pub iso_date: String,       // e.g., "2025-06-19"
}
