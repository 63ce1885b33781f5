//! Deadline progress and overdue detection for tasks and task collections.
//!
//! Progress is the elapsed fraction of a task's creation-to-deadline window:
//! 0 at creation, 1 at (or past) the deadline. Tasks without a usable window
//! count as fully elapsed. All functions are pure over the supplied `now`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::Task;

const ON_TRACK_THRESHOLD: f64 = 0.7;
const CAUTION_THRESHOLD: f64 = 0.3;

pub fn task_progress(
    created_at: Option<DateTime<Utc>>,
    deadline: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    let (Some(start), Some(end)) = (created_at, deadline) else {
        return 1.0;
    };
    if start >= end || now >= end {
        return 1.0;
    }
    if now <= start {
        return 0.0;
    }

    let span = (end - start).num_milliseconds() as f64;
    if span <= 0.0 {
        return 1.0;
    }
    let elapsed = (now - start).num_milliseconds() as f64;
    (elapsed / span).clamp(0.0, 1.0)
}

pub fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    !task.checked && task.deadline.map_or(false, |deadline| now > deadline)
}

pub fn has_overdue(tasks: &[Task], now: DateTime<Utc>) -> bool {
    tasks.iter().any(|task| is_overdue(task, now))
}

/// Mean progress of the unchecked tasks. Empty or fully checked collections
/// have nothing pending and report 1.
pub fn collection_progress(tasks: &[Task], now: DateTime<Utc>) -> f64 {
    let pending: Vec<f64> = tasks
        .iter()
        .filter(|task| !task.checked)
        .map(|task| task.progress(now))
        .collect();

    if pending.is_empty() {
        return 1.0;
    }
    pending.iter().sum::<f64>() / pending.len() as f64
}

impl Task {
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        task_progress(self.created_at, self.deadline, now)
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        is_overdue(self, now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Health {
    Done,
    OnTrack,
    Caution,
    AtRisk,
}

impl Health {
    pub fn from_score(score: f64) -> Self {
        if score >= ON_TRACK_THRESHOLD {
            Health::OnTrack
        } else if score >= CAUTION_THRESHOLD {
            Health::Caution
        } else {
            Health::AtRisk
        }
    }

    pub fn of_task(task: &Task, now: DateTime<Utc>) -> Self {
        if task.checked {
            Health::Done
        } else if task.is_overdue(now) {
            Health::AtRisk
        } else {
            Health::from_score(task.progress(now))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Health::Done => "done",
            Health::OnTrack => "on track",
            Health::Caution => "caution",
            Health::AtRisk => "at risk",
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Presentation-ready view of a single task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub task: Task,
    pub progress: f64,
    pub percent: u8,
    pub overdue: bool,
    pub health: Health,
}

impl TaskView {
    pub fn of(task: &Task, now: DateTime<Utc>) -> Self {
        let progress = task.progress(now);
        Self {
            task: task.clone(),
            progress,
            percent: as_percent(progress),
            overdue: task.is_overdue(now),
            health: Health::of_task(task, now),
        }
    }
}

/// Aggregate progress of an area checklist or a personal task list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSummary {
    pub total: usize,
    pub pending: usize,
    pub progress: f64,
    pub percent: u8,
    pub overdue: bool,
    pub health: Health,
}

impl CollectionSummary {
    pub fn of(tasks: &[Task], now: DateTime<Utc>) -> Self {
        let progress = collection_progress(tasks, now);
        let overdue = has_overdue(tasks, now);
        let health = if overdue {
            Health::AtRisk
        } else {
            Health::from_score(progress)
        };

        Self {
            total: tasks.len(),
            pending: tasks.iter().filter(|task| !task.checked).count(),
            progress,
            percent: as_percent(progress),
            overdue,
            health,
        }
    }
}

pub fn as_percent(progress: f64) -> u8 {
    (progress.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap()
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(seconds)
    }

    fn task(created: Option<i64>, deadline: Option<i64>, checked: bool) -> Task {
        Task {
            id: format!("{:?}-{:?}", created, deadline),
            name: "Water plants".into(),
            details: String::new(),
            deadline: deadline.map(at),
            created_at: created.map(at),
            checked,
        }
    }

    #[rstest]
    #[case::no_created_at(None, Some(10))]
    #[case::no_deadline(Some(0), None)]
    #[case::neither(None, None)]
    #[case::equal_bounds(Some(10), Some(10))]
    #[case::inverted_bounds(Some(20), Some(10))]
    fn degenerate_windows_are_fully_elapsed(
        #[case] created: Option<i64>,
        #[case] deadline: Option<i64>,
    ) {
        for now in [-100, 0, 5, 10, 100] {
            assert_eq!(task_progress(created.map(at), deadline.map(at), at(now)), 1.0);
        }
    }

    #[rstest]
    #[case::before_creation(-5, 0.0)]
    #[case::at_creation(0, 0.0)]
    #[case::midpoint(5, 0.5)]
    #[case::at_deadline(10, 1.0)]
    #[case::past_deadline(60, 1.0)]
    fn progress_is_elapsed_fraction(#[case] now: i64, #[case] expected: f64) {
        assert_eq!(task_progress(Some(at(0)), Some(at(10)), at(now)), expected);
    }

    #[test]
    fn degenerate_window_ignores_checked_flag() {
        assert_eq!(task(None, Some(10), true).progress(at(0)), 1.0);
        assert_eq!(task(None, Some(10), false).progress(at(0)), 1.0);
    }

    #[test]
    fn empty_collection_is_complete() {
        assert_eq!(collection_progress(&[], t0()), 1.0);
    }

    #[test]
    fn fully_checked_collection_is_complete() {
        let tasks = vec![task(Some(0), Some(10), true), task(Some(0), Some(100), true)];
        assert_eq!(collection_progress(&tasks, at(1)), 1.0);
    }

    #[test]
    fn collection_progress_averages_unchecked_only() {
        // Windows chosen so that at t=2 the scores are 0.2 and 0.8.
        let low = task(Some(0), Some(10), false);
        let high = task(Some(-6), Some(4), false);
        assert!((low.progress(at(2)) - 0.2).abs() < 1e-9);
        assert!((high.progress(at(2)) - 0.8).abs() < 1e-9);

        let pair = vec![low.clone(), high.clone()];
        let mean = collection_progress(&pair, at(2));
        assert!((mean - 0.5).abs() < 1e-9);

        let with_checked = vec![low, high, task(None, None, true)];
        assert_eq!(collection_progress(&with_checked, at(2)), mean);
    }

    #[test]
    fn overdue_requires_unchecked_task_past_deadline() {
        let mut late = task(Some(0), Some(10), false);
        assert!(late.is_overdue(at(11)));
        assert!(!late.is_overdue(at(10)));

        late.checked = true;
        assert!(!late.is_overdue(at(11)));

        let open_ended = task(Some(0), None, false);
        assert!(!open_ended.is_overdue(at(1_000_000)));
    }

    #[test]
    fn has_overdue_scans_collection() {
        let tasks = vec![task(Some(0), Some(100), false), task(Some(0), Some(10), false)];
        assert!(!has_overdue(&tasks, at(5)));
        assert!(has_overdue(&tasks, at(50)));
    }

    #[rstest]
    #[case(0.95, Health::OnTrack)]
    #[case(0.7, Health::OnTrack)]
    #[case(0.5, Health::Caution)]
    #[case(0.3, Health::Caution)]
    #[case(0.29, Health::AtRisk)]
    #[case(0.0, Health::AtRisk)]
    fn health_bands_follow_thresholds(#[case] score: f64, #[case] expected: Health) {
        assert_eq!(Health::from_score(score), expected);
    }

    #[test]
    fn overdue_forces_at_risk_and_checked_is_done() {
        let late = task(Some(0), Some(10), false);
        assert_eq!(Health::of_task(&late, at(20)), Health::AtRisk);

        let done = task(Some(0), Some(10), true);
        assert_eq!(Health::of_task(&done, at(20)), Health::Done);
    }

    #[test]
    fn summary_reports_overdue_area_as_at_risk() {
        let tasks = vec![
            task(Some(0), Some(10), false),
            task(None, None, false),
            task(Some(0), Some(10), true),
        ];
        let summary = CollectionSummary::of(&tasks, at(20));

        assert_eq!(summary.total, 3);
        assert_eq!(summary.pending, 2);
        assert_eq!(summary.percent, 100);
        assert!(summary.overdue);
        assert_eq!(summary.health, Health::AtRisk);
    }

    #[test]
    fn task_view_rounds_percent() {
        let view = TaskView::of(&task(Some(0), Some(3), false), at(1));
        assert_eq!(view.percent, 33);
        assert!(!view.overdue);
        assert_eq!(view.health, Health::Caution);
    }
}
