use serde::{Deserialize, Deserializer, Serialize};

/// Milliseconds since the Unix epoch (UTC).
pub type Timestamp = i64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Highest first, the order the statistics screen lists them in.
    pub const ALL: [Priority; 4] = [
        Priority::Urgent,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    pub fn rank(self) -> u8 {
        match self {
            Priority::Urgent => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Personal,
    Work,
    Shopping,
    Health,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Personal,
        Category::Work,
        Category::Shopping,
        Category::Health,
        Category::Other,
    ];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl Status {
    pub fn is_completed(self) -> bool {
        self == Status::Completed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub category: Category,
    pub status: Status,
    #[serde(
        default,
        with = "timestamp::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<Timestamp>,
    #[serde(
        default,
        with = "timestamp::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub reminder_time: Option<Timestamp>,
    #[serde(with = "timestamp")]
    pub created_at: Timestamp,
    #[serde(with = "timestamp")]
    pub updated_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,
}

impl Task {
    /// A pending, medium-priority personal task with a fresh id.
    pub fn new(title: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id: new_task_id(now),
            title: title.into(),
            description: None,
            completed: false,
            priority: Priority::default(),
            category: Category::default(),
            status: Status::default(),
            deadline: None,
            reminder_time: None,
            created_at: now,
            updated_at: now,
            notification_id: None,
        }
    }
}

/// `<epoch millis>-<9 random hex chars>`.
pub fn new_task_id(now: Timestamp) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{now}-{}", &random[..9])
}

/// Partial update merged into a stored task.
///
/// Optional task fields use a double option: an absent key leaves the field alone,
/// an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub status: Option<Status>,
    #[serde(default, deserialize_with = "double_option")]
    pub deadline: Option<Option<Timestamp>>,
    #[serde(default, deserialize_with = "double_option")]
    pub reminder_time: Option<Option<Timestamp>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notification_id: Option<Option<String>>,
}

impl TaskPatch {
    pub fn notification(handle: Option<String>) -> Self {
        Self {
            notification_id: Some(handle),
            ..Self::default()
        }
    }

    /// Merges the patch into `task`. `updated_at` is left to the caller.
    ///
    /// When only one of `completed`/`status` is given the other follows it; when both
    /// are given they are taken as-is.
    pub fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(deadline) = self.deadline {
            task.deadline = deadline;
        }
        if let Some(reminder_time) = self.reminder_time {
            task.reminder_time = reminder_time;
        }
        if let Some(notification_id) = self.notification_id {
            task.notification_id = notification_id;
        }

        match (self.completed, self.status) {
            (Some(completed), Some(status)) => {
                if completed != status.is_completed() {
                    log::warn!(
                        "models: patch sets completed={completed} with status={status:?} id={}",
                        task.id
                    );
                }
                task.completed = completed;
                task.status = status;
            }
            (Some(completed), None) => {
                task.completed = completed;
                if completed {
                    task.status = Status::Completed;
                } else if task.status == Status::Completed {
                    task.status = Status::Pending;
                }
            }
            (None, Some(status)) => {
                task.status = status;
                task.completed = status.is_completed();
            }
            (None, None) => {}
        }
    }
}

impl From<&Task> for TaskPatch {
    /// Every editable field of `task`; used to replace a stored record wholesale.
    fn from(task: &Task) -> Self {
        Self {
            title: Some(task.title.clone()),
            description: Some(task.description.clone()),
            completed: Some(task.completed),
            priority: Some(task.priority),
            category: Some(task.category),
            status: Some(task.status),
            deadline: Some(task.deadline),
            reminder_time: Some(task.reminder_time),
            notification_id: Some(task.notification_id.clone()),
        }
    }
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// The editor form handed back on save. `id` is `None` in create mode.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub deadline: Option<Timestamp>,
    #[serde(default)]
    pub reminder_time: Option<Timestamp>,
}

/// Current list-screen selections.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilters {
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub search_query: Option<String>,
    #[serde(default = "default_show_completed")]
    pub show_completed: bool,
}

impl Default for TaskFilters {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            category: None,
            search_query: None,
            show_completed: default_show_completed(),
        }
    }
}

fn default_show_completed() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Priority,
    Deadline,
    Created,
}

/// Serde adapter for [`Timestamp`] fields.
///
/// Writes epoch millis. Reads epoch millis or an RFC 3339 string, which is how records
/// written by earlier app versions encode dates.
pub mod timestamp {
    use chrono::DateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::Timestamp;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Text(String),
    }

    fn resolve<E: de::Error>(raw: Raw) -> Result<Timestamp, E> {
        match raw {
            Raw::Millis(value) => Ok(value),
            Raw::Text(text) => DateTime::parse_from_rfc3339(text.trim())
                .map(|dt| dt.timestamp_millis())
                .map_err(|err| E::custom(format!("invalid timestamp `{text}`: {err}"))),
        }
    }

    pub fn serialize<S: Serializer>(value: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(*value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        resolve(Raw::deserialize(deserializer)?)
    }

    pub mod optional {
        use serde::{Deserialize, Deserializer, Serializer};

        use super::{resolve, Raw};
        use crate::models::Timestamp;

        pub fn serialize<S: Serializer>(
            value: &Option<Timestamp>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => serializer.serialize_some(value),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Timestamp>, D::Error> {
            Option::<Raw>::deserialize(deserializer)?
                .map(resolve)
                .transpose()
        }
    }
}
