//! Derived views over a task snapshot: the list screen (filter + sort) and the
//! statistics screen (aggregate). Everything here is pure.

use std::cmp::Ordering;

use serde::Serialize;

use crate::models::{Category, Priority, SortMode, Status, Task, TaskFilters, Timestamp};

/// How many upcoming deadlines the statistics screen shows.
pub const UPCOMING_LIMIT: usize = 5;

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

pub fn filter(tasks: &[Task], filters: &TaskFilters) -> Vec<Task> {
    let query = filters
        .search_query
        .as_deref()
        .filter(|query| !query.is_empty())
        .map(str::to_lowercase);

    tasks
        .iter()
        .filter(|task| filters.show_completed || !task.completed)
        .filter(|task| filters.status.map_or(true, |status| task.status == status))
        .filter(|task| {
            filters
                .priority
                .map_or(true, |priority| task.priority == priority)
        })
        .filter(|task| {
            filters
                .category
                .map_or(true, |category| task.category == category)
        })
        .filter(|task| match &query {
            None => true,
            Some(query) => {
                task.title.to_lowercase().contains(query.as_str())
                    || task
                        .description
                        .as_deref()
                        .is_some_and(|description| {
                            description.to_lowercase().contains(query.as_str())
                        })
            }
        })
        .cloned()
        .collect()
}

/// Stable: tasks that compare equal keep their input order.
pub fn sort(tasks: &[Task], mode: SortMode) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| {
        a.completed
            .cmp(&b.completed)
            .then_with(|| compare_within(a, b, mode))
    });
    sorted
}

fn compare_within(a: &Task, b: &Task, mode: SortMode) -> Ordering {
    match mode {
        SortMode::Priority => b.priority.rank().cmp(&a.priority.rank()),
        SortMode::Deadline => match (a.deadline, b.deadline) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortMode::Created => b.created_at.cmp(&a.created_at),
    }
}

/// What the list screen renders for the current selections.
pub fn apply(tasks: &[Task], filters: &TaskFilters, mode: SortMode) -> Vec<Task> {
    sort(&filter(tasks, filters), mode)
}

/// A list row: the task plus its due badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListItem {
    #[serde(flatten)]
    pub task: Task,
    /// [`countdown`] to the deadline; open tasks with a deadline only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_in: Option<String>,
}

pub fn list(
    tasks: &[Task],
    filters: &TaskFilters,
    mode: SortMode,
    now: Timestamp,
) -> Vec<TaskListItem> {
    apply(tasks, filters, mode)
        .into_iter()
        .map(|task| {
            let due_in = task
                .deadline
                .filter(|_| !task.completed)
                .map(|deadline| countdown(deadline, now));
            TaskListItem { task, due_in }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityCounts {
    pub urgent: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl PriorityCounts {
    pub fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::Urgent => self.urgent,
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCounts {
    pub personal: usize,
    pub work: usize,
    pub shopping: usize,
    pub health: usize,
    pub other: usize,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Personal => self.personal,
            Category::Work => self.work,
            Category::Shopping => self.shopping,
            Category::Health => self.health,
            Category::Other => self.other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    /// `completed == true`.
    pub completed: usize,
    /// `completed == false`.
    pub open: usize,
    pub by_status: StatusCounts,
    /// Open tasks only.
    pub by_priority: PriorityCounts,
    pub by_category: CategoryCounts,
    /// Percent, rounded; 0 for an empty collection.
    pub completion_rate: u32,
    pub overdue: usize,
    pub upcoming: Vec<Task>,
}

pub fn aggregate(tasks: &[Task], now: Timestamp) -> TaskStats {
    let mut stats = TaskStats {
        total: tasks.len(),
        ..TaskStats::default()
    };

    for task in tasks {
        if task.completed {
            stats.completed += 1;
        } else {
            stats.open += 1;
            match task.priority {
                Priority::Urgent => stats.by_priority.urgent += 1,
                Priority::High => stats.by_priority.high += 1,
                Priority::Medium => stats.by_priority.medium += 1,
                Priority::Low => stats.by_priority.low += 1,
            }
        }

        match task.status {
            Status::Pending => stats.by_status.pending += 1,
            Status::InProgress => stats.by_status.in_progress += 1,
            Status::Completed => stats.by_status.completed += 1,
        }

        match task.category {
            Category::Personal => stats.by_category.personal += 1,
            Category::Work => stats.by_category.work += 1,
            Category::Shopping => stats.by_category.shopping += 1,
            Category::Health => stats.by_category.health += 1,
            Category::Other => stats.by_category.other += 1,
        }
    }

    stats.completion_rate = completion_rate(stats.completed, stats.total);
    stats.overdue = tasks
        .iter()
        .filter(|task| !task.completed && task.deadline.is_some_and(|deadline| deadline < now))
        .count();

    let mut upcoming: Vec<Task> = tasks
        .iter()
        .filter(|task| !task.completed && task.deadline.is_some_and(|deadline| deadline > now))
        .cloned()
        .collect();
    upcoming.sort_by_key(|task| task.deadline);
    upcoming.truncate(UPCOMING_LIMIT);
    stats.upcoming = upcoming;

    stats
}

fn completion_rate(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round() as u32
}

/// Short "time left" badge: `2d 3h`, `4h 10m`, `12m`, or `Overdue` under a minute.
pub fn countdown(deadline: Timestamp, now: Timestamp) -> String {
    let diff = deadline.saturating_sub(now);
    let days = diff / DAY_MS;
    let hours = (diff % DAY_MS) / HOUR_MS;
    let minutes = (diff % HOUR_MS) / MINUTE_MS;

    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        "Overdue".to_string()
    }
}
