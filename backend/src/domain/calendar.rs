//! Calendar domain logic for the study planner.
//!
//! Everything date-shaped lives here: the month grid, the compact
//! near-today window, matching tasks onto days and the per-day task
//! aggregation the grid cells render. All of it is pure and synchronous;
//! handlers fetch tasks and hand them in.

use chrono::{Datelike, Days, Local, NaiveDate};
use shared::{
    CalendarDay, CalendarDayView, CalendarMonthView, CurrentDateResponse, NearTodayView, Task,
    TaskBadge, WindowDirection,
};
use tracing::debug;

/// Cells in the full month grid: six weeks of seven days
const GRID_CELLS: usize = 42;

/// How many task chips a day cell renders before collapsing to "+N more"
const VISIBLE_TASKS_PER_DAY: usize = 3;

/// Size of the fixed highlight palette task titles hash into
pub const HIGHLIGHT_PALETTE_SIZE: usize = 6;

/// Calendar service that handles all calendar-related business logic
#[derive(Clone, Default)]
pub struct CalendarService;

impl CalendarService {
    /// Create a new CalendarService instance
    pub fn new() -> Self {
        Self
    }

    /// Get the number of days in a given month and year
    pub fn days_in_month(&self, month: u32, year: u32) -> u32 {
        match month {
            2 => {
                if self.is_leap_year(year) {
                    29
                } else {
                    28
                }
            }
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    /// Check if a year is a leap year
    pub fn is_leap_year(&self, year: u32) -> bool {
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }

    /// Get the first day of month (0 = Sunday, 1 = Monday, etc.)
    pub fn first_day_of_month(&self, month: u32, year: u32) -> u32 {
        if let Some(date) = NaiveDate::from_ymd_opt(year as i32, month, 1) {
            // chrono's weekday(): Monday = 1, ..., Sunday = 7
            // Our format: Sunday = 0, Monday = 1, ..., Saturday = 6
            date.weekday().num_days_from_sunday()
        } else {
            // Invalid date, fallback to 0 (Sunday)
            0
        }
    }

    /// Get the human-readable name for a month number
    pub fn month_name(&self, month: u32) -> &'static str {
        match month {
            1 => "January",
            2 => "February",
            3 => "March",
            4 => "April",
            5 => "May",
            6 => "June",
            7 => "July",
            8 => "August",
            9 => "September",
            10 => "October",
            11 => "November",
            12 => "December",
            _ => "Invalid Month",
        }
    }

    /// Parse a calendar date out of a stored date string, ignoring any
    /// time-of-day suffix. Returns None for anything malformed.
    pub fn parse_calendar_date(date_str: &str) -> Option<NaiveDate> {
        let date_part = date_str.split('T').next()?;
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }

    /// Whether `date` falls inside a task's inclusive [start, end] range.
    ///
    /// Bounds are compared as calendar dates only. A bound that fails to
    /// parse never matches; malformed persisted records must not take a
    /// task onto every day (or panic the grid).
    pub fn date_in_range(&self, date: NaiveDate, start: &str, end: &str) -> bool {
        match (
            Self::parse_calendar_date(start),
            Self::parse_calendar_date(end),
        ) {
            (Some(start), Some(end)) => start <= date && date <= end,
            _ => false,
        }
    }

    /// Build the 42-cell grid for a month: trailing days of the previous
    /// month, the month itself, then leading days of the next month.
    ///
    /// Rollover at year boundaries comes out of chrono date arithmetic,
    /// never string manipulation.
    pub fn build_month_grid(&self, month: u32, year: u32) -> Vec<CalendarDay> {
        let Some(first_of_month) = NaiveDate::from_ymd_opt(year as i32, month, 1) else {
            return Vec::new();
        };
        let leading = self.first_day_of_month(month, year);

        debug!(
            "Building grid for {}/{}: {} leading cells",
            month, year, leading
        );

        let Some(start) = first_of_month.checked_sub_days(Days::new(u64::from(leading))) else {
            return Vec::new();
        };

        (0..GRID_CELLS as u64)
            .filter_map(|offset| {
                let date = start.checked_add_days(Days::new(offset))?;
                Some(self.day_cell(date, month, year))
            })
            .collect()
    }

    /// Build the compact three-day window around a reference date (today).
    ///
    /// `Prev` covers {ref-2, ref-1, ref}, `Next` covers {ref, ref+1, ref+2}.
    /// `is_current_month` is judged against the *displayed* month and year,
    /// which near a month boundary can differ from the window's own dates.
    pub fn build_near_today_window(
        &self,
        reference: NaiveDate,
        direction: WindowDirection,
        month: u32,
        year: u32,
    ) -> Vec<CalendarDay> {
        let offsets: [i64; 3] = match direction {
            WindowDirection::Prev => [-2, -1, 0],
            WindowDirection::Next => [0, 1, 2],
        };

        offsets
            .iter()
            .filter_map(|&offset| {
                let date = if offset < 0 {
                    reference.checked_sub_days(Days::new(offset.unsigned_abs()))?
                } else {
                    reference.checked_add_days(Days::new(offset as u64))?
                };
                Some(self.day_cell(date, month, year))
            })
            .collect()
    }

    /// Header labels matching the three window cells
    pub fn window_labels(&self, direction: WindowDirection) -> [&'static str; 3] {
        match direction {
            WindowDirection::Prev => ["2 Days Ago", "Yesterday", "Today"],
            WindowDirection::Next => ["Today", "Tomorrow", "Day After"],
        }
    }

    /// Filter the task set down to tasks active on `date`, preserving the
    /// caller's ordering
    pub fn tasks_for_day(&self, tasks: &[Task], date: NaiveDate) -> Vec<Task> {
        tasks
            .iter()
            .filter(|task| self.date_in_range(date, &task.start_date, &task.end_date))
            .cloned()
            .collect()
    }

    /// Distinct subjects among a day's tasks, first-seen order, empty
    /// subjects skipped
    pub fn unique_subjects(&self, day_tasks: &[Task]) -> Vec<String> {
        let mut subjects: Vec<String> = Vec::new();
        for task in day_tasks {
            if task.subject.is_empty() {
                continue;
            }
            if !subjects.contains(&task.subject) {
                subjects.push(task.subject.clone());
            }
        }
        subjects
    }

    /// Whether a day holds more tasks than its cell displays
    pub fn has_overflow(&self, day_tasks: &[Task]) -> bool {
        day_tasks.len() > VISIBLE_TASKS_PER_DAY
    }

    /// How many tasks the "+N more" affordance stands for (0 when none)
    pub fn hidden_task_count(&self, day_tasks: &[Task]) -> usize {
        day_tasks.len().saturating_sub(VISIBLE_TASKS_PER_DAY)
    }

    /// Map a task title to a stable slot in the highlight palette.
    ///
    /// 32-bit polynomial rolling hash over UTF-16 code units, folded by
    /// absolute value. The same title always lands on the same color,
    /// across cells and across renders.
    pub fn highlight_color_index(&self, title: &str) -> usize {
        let mut hash: i32 = 0;
        for unit in title.encode_utf16() {
            hash = hash
                .wrapping_shl(5)
                .wrapping_sub(hash)
                .wrapping_add(i32::from(unit));
        }
        hash.unsigned_abs() as usize % HIGHLIGHT_PALETTE_SIZE
    }

    /// Generate the full month view: the 42-cell grid joined against the
    /// month's tasks, plus navigation targets for the month switcher
    pub fn build_month_view(&self, month: u32, year: u32, tasks: &[Task]) -> CalendarMonthView {
        let days = self
            .build_month_grid(month, year)
            .into_iter()
            .map(|cell| self.day_view(cell, tasks))
            .collect();

        let (prev_month, prev_year) = self.previous_month(month, year);
        let (next_month, next_year) = self.next_month(month, year);

        CalendarMonthView {
            year,
            month,
            month_name: self.month_name(month).to_string(),
            days,
            prev_year,
            prev_month,
            next_year,
            next_month,
        }
    }

    /// Generate the three-day near-today view for narrow viewports
    pub fn build_near_today_view(
        &self,
        reference: NaiveDate,
        direction: WindowDirection,
        month: u32,
        year: u32,
        tasks: &[Task],
    ) -> NearTodayView {
        let days = self
            .build_near_today_window(reference, direction, month, year)
            .into_iter()
            .map(|cell| self.day_view(cell, tasks))
            .collect();

        NearTodayView {
            days,
            labels: self
                .window_labels(direction)
                .iter()
                .map(|label| label.to_string())
                .collect(),
        }
    }

    /// Navigate to the previous month
    pub fn previous_month(&self, current_month: u32, current_year: u32) -> (u32, u32) {
        if current_month == 1 {
            (12, current_year - 1)
        } else {
            (current_month - 1, current_year)
        }
    }

    /// Navigate to the next month
    pub fn next_month(&self, current_month: u32, current_year: u32) -> (u32, u32) {
        if current_month == 12 {
            (1, current_year + 1)
        } else {
            (current_month + 1, current_year)
        }
    }

    /// Get current date information
    pub fn get_current_date(&self) -> CurrentDateResponse {
        let now = Local::now();
        let month = now.month();
        let year = now.year() as u32;
        let day = now.day();

        let month_name = self.month_name(month);
        let formatted_date = format!("{} {}, {}", month_name, day, year);
        let iso_date = format!("{:04}-{:02}-{:02}", year, month, day);

        CurrentDateResponse {
            month,
            year,
            day,
            formatted_date,
            iso_date,
        }
    }

    fn day_cell(&self, date: NaiveDate, displayed_month: u32, displayed_year: u32) -> CalendarDay {
        CalendarDay {
            day: date.day(),
            is_current_month: date.month() == displayed_month
                && date.year() == displayed_year as i32,
            date: date.format("%Y-%m-%d").to_string(),
            weekday: date.weekday().num_days_from_sunday(),
        }
    }

    fn day_view(&self, cell: CalendarDay, tasks: &[Task]) -> CalendarDayView {
        let day_tasks = match Self::parse_calendar_date(&cell.date) {
            Some(date) => self.tasks_for_day(tasks, date),
            None => Vec::new(),
        };

        let subjects = self.unique_subjects(&day_tasks);
        let has_overflow = self.has_overflow(&day_tasks);
        let hidden_count = self.hidden_task_count(&day_tasks) as u32;

        CalendarDayView {
            day: cell.day,
            is_current_month: cell.is_current_month,
            date: cell.date,
            weekday: cell.weekday,
            tasks: day_tasks
                .into_iter()
                .map(|task| TaskBadge {
                    color_index: self.highlight_color_index(&task.title) as u32,
                    id: task.id,
                    title: task.title,
                    subject: task.subject,
                })
                .collect(),
            subjects,
            has_overflow,
            hidden_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_task(id: &str, title: &str, subject: &str, start: &str, end: &str) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            subject: subject.to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
            status: "pending".to_string(),
            created_at: "2024-03-01T09:00:00Z".to_string(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_in_month() {
        let service = CalendarService::new();

        assert_eq!(service.days_in_month(1, 2025), 31); // January
        assert_eq!(service.days_in_month(4, 2025), 30); // April
        assert_eq!(service.days_in_month(2, 2025), 28); // February (non-leap)
        assert_eq!(service.days_in_month(2, 2024), 29); // February (leap year)
    }

    #[test]
    fn test_is_leap_year() {
        let service = CalendarService::new();

        assert!(!service.is_leap_year(2025)); // Regular year
        assert!(service.is_leap_year(2024)); // Divisible by 4
        assert!(!service.is_leap_year(1900)); // Divisible by 100 but not 400
        assert!(service.is_leap_year(2000)); // Divisible by 400
    }

    #[test]
    fn test_month_name() {
        let service = CalendarService::new();

        assert_eq!(service.month_name(1), "January");
        assert_eq!(service.month_name(6), "June");
        assert_eq!(service.month_name(12), "December");
        assert_eq!(service.month_name(13), "Invalid Month");
    }

    #[test]
    fn test_navigation() {
        let service = CalendarService::new();

        assert_eq!(service.previous_month(6, 2025), (5, 2025));
        assert_eq!(service.previous_month(1, 2025), (12, 2024));

        assert_eq!(service.next_month(6, 2025), (7, 2025));
        assert_eq!(service.next_month(12, 2025), (1, 2026));
    }

    #[test]
    fn test_parse_calendar_date() {
        assert_eq!(
            CalendarService::parse_calendar_date("2024-03-05"),
            Some(date(2024, 3, 5))
        );

        // Time-of-day is dropped before comparison
        assert_eq!(
            CalendarService::parse_calendar_date("2024-03-05T09:30:00Z"),
            Some(date(2024, 3, 5))
        );

        assert_eq!(CalendarService::parse_calendar_date("not-a-date"), None);
        assert_eq!(CalendarService::parse_calendar_date("2024-13-40"), None);
    }

    #[test]
    fn test_date_in_range_inclusive_bounds() {
        let service = CalendarService::new();

        for day in [5, 6, 7] {
            assert!(
                service.date_in_range(date(2024, 3, day), "2024-03-05", "2024-03-07"),
                "March {} should match",
                day
            );
        }
        assert!(!service.date_in_range(date(2024, 3, 4), "2024-03-05", "2024-03-07"));
        assert!(!service.date_in_range(date(2024, 3, 8), "2024-03-05", "2024-03-07"));
    }

    #[test]
    fn test_date_in_range_malformed_bounds_never_match() {
        let service = CalendarService::new();

        assert!(!service.date_in_range(date(2024, 3, 5), "garbage", "2024-03-07"));
        assert!(!service.date_in_range(date(2024, 3, 5), "2024-03-05", ""));
    }

    #[test]
    fn test_inverted_range_never_matches() {
        // Nothing validates start <= end at creation; an inverted range is
        // simply a task that never appears
        let service = CalendarService::new();

        for day in 1..=31 {
            assert!(!service.date_in_range(date(2024, 3, day), "2024-03-20", "2024-03-10"));
        }
    }

    #[test]
    fn test_build_month_grid_shape() {
        let service = CalendarService::new();

        for (month, year) in [(1, 2024), (2, 2024), (2, 2025), (6, 2025), (12, 2023)] {
            let grid = service.build_month_grid(month, year);
            assert_eq!(grid.len(), 42, "{}/{} grid size", month, year);

            let in_month = grid.iter().filter(|c| c.is_current_month).count();
            assert_eq!(
                in_month as u32,
                service.days_in_month(month, year),
                "{}/{} current-month cell count",
                month,
                year
            );

            // Dates increase by exactly one day per cell, across month and
            // year boundaries
            for pair in grid.windows(2) {
                let a = CalendarService::parse_calendar_date(&pair[0].date).unwrap();
                let b = CalendarService::parse_calendar_date(&pair[1].date).unwrap();
                assert_eq!(b, a.succ_opt().unwrap());
            }

            // Weekday columns line up: cell 0 is a Sunday
            assert_eq!(grid[0].weekday, 0);
            assert_eq!(grid[41].weekday, 6);
        }
    }

    #[test]
    fn test_january_2024_trailing_december_cells() {
        let service = CalendarService::new();
        let grid = service.build_month_grid(1, 2024);

        // Jan 1, 2024 is a Monday, so exactly one trailing December cell
        assert_eq!(grid[0].date, "2023-12-31");
        assert!(!grid[0].is_current_month);
        assert_eq!(grid[1].date, "2024-01-01");
        assert!(grid[1].is_current_month);
        assert_eq!(grid[1].weekday, 1);
    }

    #[test]
    fn test_december_2023_leading_cells_roll_into_2024() {
        let service = CalendarService::new();
        let grid = service.build_month_grid(12, 2023);

        let leading: Vec<&CalendarDay> = grid
            .iter()
            .skip_while(|c| !c.is_current_month)
            .skip_while(|c| c.is_current_month)
            .collect();

        assert!(!leading.is_empty());
        for cell in leading {
            assert!(cell.date.starts_with("2024-01"), "cell {}", cell.date);
            assert!(!cell.is_current_month);
        }
    }

    #[test]
    fn test_tasks_for_day_filters_and_preserves_order() {
        let service = CalendarService::new();

        let tasks = vec![
            create_test_task("a", "Algebra", "DSA", "2024-03-05", "2024-03-07"),
            create_test_task("b", "Essay", "WEB", "2024-03-01", "2024-03-31"),
            create_test_task("c", "Lab", "DB", "2024-03-08", "2024-03-09"),
        ];

        let day_tasks = service.tasks_for_day(&tasks, date(2024, 3, 6));
        let ids: Vec<&str> = day_tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(service
            .tasks_for_day(&tasks, date(2024, 4, 1))
            .is_empty());
    }

    #[test]
    fn test_unique_subjects() {
        let service = CalendarService::new();

        let tasks = vec![
            create_test_task("a", "One", "JS", "2024-03-01", "2024-03-02"),
            create_test_task("b", "Two", "DB", "2024-03-01", "2024-03-02"),
            create_test_task("c", "Three", "JS", "2024-03-01", "2024-03-02"),
            create_test_task("d", "Four", "", "2024-03-01", "2024-03-02"),
            create_test_task("e", "Five", "js", "2024-03-01", "2024-03-02"),
        ];

        // First-seen order, case-sensitive as stored, empties skipped
        assert_eq!(service.unique_subjects(&tasks), vec!["JS", "DB", "js"]);
    }

    #[test]
    fn test_overflow_flags() {
        let service = CalendarService::new();

        let mut tasks: Vec<Task> = (0..3)
            .map(|i| {
                create_test_task(&format!("t{}", i), "Task", "JS", "2024-03-01", "2024-03-02")
            })
            .collect();

        assert!(!service.has_overflow(&tasks));
        assert_eq!(service.hidden_task_count(&tasks), 0);

        tasks.push(create_test_task("t3", "Task", "JS", "2024-03-01", "2024-03-02"));
        tasks.push(create_test_task("t4", "Task", "JS", "2024-03-01", "2024-03-02"));

        assert!(service.has_overflow(&tasks));
        assert_eq!(service.hidden_task_count(&tasks), 2);
    }

    #[test]
    fn test_highlight_color_is_deterministic() {
        let service = CalendarService::new();

        let first = service.highlight_color_index("Read chapter 4");
        let second = service.highlight_color_index("Read chapter 4");
        assert_eq!(first, second);
        assert!(first < HIGHLIGHT_PALETTE_SIZE);

        assert_eq!(service.highlight_color_index(""), 0);

        // Non-ASCII titles hash fine too
        let index = service.highlight_color_index("日本語の勉強");
        assert!(index < HIGHLIGHT_PALETTE_SIZE);
    }

    #[test]
    fn test_near_today_window_prev_and_next() {
        let service = CalendarService::new();
        let today = date(2025, 6, 15);

        let prev = service.build_near_today_window(today, WindowDirection::Prev, 6, 2025);
        let dates: Vec<&str> = prev.iter().map(|c| c.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-06-13", "2025-06-14", "2025-06-15"]);

        let next = service.build_near_today_window(today, WindowDirection::Next, 6, 2025);
        let dates: Vec<&str> = next.iter().map(|c| c.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-06-15", "2025-06-16", "2025-06-17"]);
    }

    #[test]
    fn test_near_today_window_against_other_displayed_month() {
        let service = CalendarService::new();

        // Viewing May while today is June 1: the whole window sits outside
        // the displayed month
        let window =
            service.build_near_today_window(date(2025, 6, 1), WindowDirection::Next, 5, 2025);
        assert!(window.iter().all(|c| !c.is_current_month));

        // The Prev window reaches back into the displayed month
        let window =
            service.build_near_today_window(date(2025, 6, 1), WindowDirection::Prev, 5, 2025);
        assert_eq!(
            window.iter().map(|c| c.is_current_month).collect::<Vec<_>>(),
            vec![true, true, false]
        );
    }

    #[test]
    fn test_window_crosses_year_boundary() {
        let service = CalendarService::new();

        let window =
            service.build_near_today_window(date(2024, 1, 1), WindowDirection::Prev, 1, 2024);
        let dates: Vec<&str> = window.iter().map(|c| c.date.as_str()).collect();
        assert_eq!(dates, vec!["2023-12-30", "2023-12-31", "2024-01-01"]);
    }

    #[test]
    fn test_window_labels() {
        let service = CalendarService::new();

        assert_eq!(
            service.window_labels(WindowDirection::Prev),
            ["2 Days Ago", "Yesterday", "Today"]
        );
        assert_eq!(
            service.window_labels(WindowDirection::Next),
            ["Today", "Tomorrow", "Day After"]
        );
    }

    #[test]
    fn test_build_month_view() {
        let service = CalendarService::new();

        let tasks = vec![
            create_test_task("a", "Graph theory", "DSA", "2024-03-05", "2024-03-07"),
            create_test_task("b", "Sql intro", "DB", "2024-03-06", "2024-03-06"),
        ];

        let view = service.build_month_view(3, 2024, &tasks);
        assert_eq!(view.days.len(), 42);
        assert_eq!(view.month_name, "March");
        assert_eq!((view.prev_month, view.prev_year), (2, 2024));
        assert_eq!((view.next_month, view.next_year), (4, 2024));

        let march_6 = view
            .days
            .iter()
            .find(|d| d.date == "2024-03-06")
            .unwrap();
        assert_eq!(march_6.tasks.len(), 2);
        assert_eq!(march_6.subjects, vec!["DSA", "DB"]);
        assert!(!march_6.has_overflow);

        // The same title carries the same color on every day it appears
        let march_5 = view
            .days
            .iter()
            .find(|d| d.date == "2024-03-05")
            .unwrap();
        assert_eq!(march_5.tasks[0].color_index, march_6.tasks[0].color_index);
    }

    #[test]
    fn test_build_month_view_overflow() {
        let service = CalendarService::new();

        let tasks: Vec<Task> = (0..5)
            .map(|i| {
                create_test_task(
                    &format!("t{}", i),
                    &format!("Task {}", i),
                    "JS",
                    "2024-03-10",
                    "2024-03-12",
                )
            })
            .collect();

        let view = service.build_month_view(3, 2024, &tasks);
        let march_11 = view
            .days
            .iter()
            .find(|d| d.date == "2024-03-11")
            .unwrap();

        // The view carries every overlapping task plus the overflow facts;
        // trimming to three chips is the renderer's job
        assert_eq!(march_11.tasks.len(), 5);
        assert!(march_11.has_overflow);
        assert_eq!(march_11.hidden_count, 2);
    }
}
