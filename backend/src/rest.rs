use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Local;
use serde::Deserialize;
use shared::{
    CreateTaskRequest, CreateTaskResponse, DeleteTaskRequest, SuccessResponse, Task,
    UpsertDayMetaRequest, UpsertMonthMetaRequest, WindowDirection,
};
use tracing::{error, info};

use crate::domain::calendar::CalendarService;
use crate::domain::meta::MetaService;
use crate::domain::tasks::TaskService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub task_service: TaskService,
    pub meta_service: MetaService,
    pub calendar_service: CalendarService,
}

impl AppState {
    /// Create new application state with the given services
    pub fn new(
        task_service: TaskService,
        meta_service: MetaService,
        calendar_service: CalendarService,
    ) -> Self {
        Self {
            task_service,
            meta_service,
            calendar_service,
        }
    }
}

/// Query parameters selecting a month.
///
/// Kept as raw strings so a garbled value degrades to the empty default
/// instead of a rejection before the handler runs.
#[derive(Deserialize, Debug)]
pub struct MonthQuery {
    pub year: Option<String>,
    pub month: Option<String>,
}

impl MonthQuery {
    fn parse(&self) -> Option<(u32, u32)> {
        let year = self.year.as_deref()?.parse().ok()?;
        let month: u32 = self.month.as_deref()?.parse().ok()?;
        (1..=12).contains(&month).then_some((month, year))
    }
}

/// Query parameters selecting a single day
#[derive(Deserialize, Debug)]
pub struct DayQuery {
    pub year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
}

impl DayQuery {
    /// Unusable values fall back to a key no document is stored under, so
    /// the lookup lands on the empty default
    fn parse_or_default(&self) -> (u32, u32, u32) {
        let year = self
            .year
            .as_deref()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let month = self
            .month
            .as_deref()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let day = self
            .day
            .as_deref()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        (year, month, day)
    }
}

/// Query parameters for the compact near-today window
#[derive(Deserialize, Debug)]
pub struct WindowQuery {
    pub direction: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
}

/// Axum handler function for GET /api/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> impl IntoResponse {
    info!("GET /api/tasks - query: {:?}", query);

    let Some((month, year)) = query.parse() else {
        // Missing or garbled month selection behaves like an empty month
        return (StatusCode::OK, Json(Vec::<Task>::new())).into_response();
    };

    match state.task_service.list_tasks_for_month(month, year).await {
        Ok(tasks) => (StatusCode::OK, Json(tasks)).into_response(),
        Err(e) => {
            error!("Error listing tasks: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error listing tasks").into_response()
        }
    }
}

/// Axum handler function for POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    Json(request): Json<CreateTaskRequest>,
) -> impl IntoResponse {
    info!("POST /api/tasks - request: {:?}", request);

    match state.task_service.create_task(request).await {
        Ok(task) => (
            StatusCode::CREATED,
            Json(CreateTaskResponse {
                success: true,
                id: task.id,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Error creating task: {:?}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// Axum handler function for DELETE /api/tasks
pub async fn delete_task(
    State(state): State<AppState>,
    Json(request): Json<DeleteTaskRequest>,
) -> impl IntoResponse {
    info!("DELETE /api/tasks - id: {}", request.id);

    match state.task_service.delete_task(&request.id).await {
        Ok(()) => (StatusCode::OK, Json(SuccessResponse { success: true })).into_response(),
        Err(e) => {
            error!("Error deleting task: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error deleting task").into_response()
        }
    }
}

/// Axum handler function for GET /api/day-meta
pub async fn get_day_meta(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> impl IntoResponse {
    info!("GET /api/day-meta - query: {:?}", query);

    let (year, month, day) = query.parse_or_default();
    match state.meta_service.get_day_meta(year, month, day).await {
        Ok(meta) => (StatusCode::OK, Json(meta)).into_response(),
        Err(e) => {
            error!("Error fetching day meta: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error fetching day meta").into_response()
        }
    }
}

/// Axum handler function for POST /api/day-meta
pub async fn put_day_meta(
    State(state): State<AppState>,
    Json(request): Json<UpsertDayMetaRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/day-meta - {}/{}/{}",
        request.year, request.month, request.day
    );

    match state.meta_service.upsert_day_meta(request).await {
        Ok(()) => (StatusCode::OK, Json(SuccessResponse { success: true })).into_response(),
        Err(e) => {
            error!("Error saving day meta: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error saving day meta").into_response()
        }
    }
}

/// Axum handler function for GET /api/month-meta
pub async fn get_month_meta(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> impl IntoResponse {
    info!("GET /api/month-meta - query: {:?}", query);

    // A garbled key reads as a month nobody has written to yet
    let (month, year) = query.parse().unwrap_or((0, 0));
    match state.meta_service.get_month_meta(year, month).await {
        Ok(meta) => (StatusCode::OK, Json(meta)).into_response(),
        Err(e) => {
            error!("Error fetching month meta: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error fetching month meta",
            )
                .into_response()
        }
    }
}

/// Axum handler function for POST /api/month-meta
pub async fn put_month_meta(
    State(state): State<AppState>,
    Json(request): Json<UpsertMonthMetaRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/month-meta - {}/{}",
        request.year, request.month
    );

    match state.meta_service.upsert_month_meta(request).await {
        Ok(()) => (StatusCode::OK, Json(SuccessResponse { success: true })).into_response(),
        Err(e) => {
            error!("Error saving month meta: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error saving month meta").into_response()
        }
    }
}

/// Axum handler function for GET /api/calendar/:year/:month
pub async fn calendar_month(
    State(state): State<AppState>,
    Path((year, month)): Path<(u32, u32)>,
) -> impl IntoResponse {
    info!("GET /api/calendar/{}/{}", year, month);

    if !(1..=12).contains(&month) {
        return (StatusCode::BAD_REQUEST, "Invalid month/year").into_response();
    }

    let tasks = match state.task_service.list_tasks_for_month(month, year).await {
        Ok(tasks) => tasks,
        Err(e) => {
            error!("Error listing tasks for calendar: {:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error building calendar")
                .into_response();
        }
    };

    let view = state.calendar_service.build_month_view(month, year, &tasks);
    (StatusCode::OK, Json(view)).into_response()
}

/// Axum handler function for GET /api/calendar/window
pub async fn near_today_window(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> impl IntoResponse {
    info!("GET /api/calendar/window - query: {:?}", query);

    let direction = match query.direction.as_deref() {
        Some("prev") => WindowDirection::Prev,
        _ => WindowDirection::Next,
    };

    // The window is anchored at today; the displayed month defaults to
    // today's month when not given
    let today = Local::now().date_naive();
    let month_query = MonthQuery {
        year: query.year,
        month: query.month,
    };
    let current = state.calendar_service.get_current_date();
    let (month, year) = month_query.parse().unwrap_or((current.month, current.year));

    let tasks = match state.task_service.list_tasks_for_month(month, year).await {
        Ok(tasks) => tasks,
        Err(e) => {
            error!("Error listing tasks for window: {:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error building window")
                .into_response();
        }
    };

    let view = state
        .calendar_service
        .build_near_today_view(today, direction, month, year, &tasks);
    (StatusCode::OK, Json(view)).into_response()
}

/// Axum handler function for GET /api/calendar/current-date
pub async fn current_date(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/calendar/current-date");
    (StatusCode::OK, Json(state.calendar_service.get_current_date())).into_response()
}
