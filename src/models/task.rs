use serde::{Deserialize, Serialize};

/// Lifecycle status of a task, as the API spells it on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// All statuses in board-column order.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// Column/section title for this status.
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }

    /// The status one column to the right, if any.
    pub fn next(&self) -> Option<TaskStatus> {
        match self {
            TaskStatus::Todo => Some(TaskStatus::InProgress),
            TaskStatus::InProgress => Some(TaskStatus::Done),
            TaskStatus::Done => None,
        }
    }

    /// The status one column to the left, if any.
    pub fn prev(&self) -> Option<TaskStatus> {
        match self {
            TaskStatus::Todo => None,
            TaskStatus::InProgress => Some(TaskStatus::Todo),
            TaskStatus::Done => Some(TaskStatus::InProgress),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A task as owned by the remote API. The client never invents these;
/// it only caches what the server returned and refetches after writes.
///
/// `created_at` and `deadline` travel as strings: the API emits RFC 3339
/// for creation timestamps but bare `YYYY-MM-DDTHH:MM` for deadlines, so
/// parsing is deferred to display time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "assignedTo", default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

impl Task {
    /// Build a full-field patch from this task, used when a status
    /// transition must send the whole record back to the server.
    pub fn to_patch(&self) -> TaskPatch {
        TaskPatch {
            title: Some(self.title.clone()),
            description: self.description.clone(),
            status: Some(self.status),
            assigned_to: self.assigned_to,
            deadline: self.deadline.clone(),
        }
    }
}

/// Partial task payload for create and update calls. Absent fields are
/// omitted from the JSON body entirely.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(rename = "assignedTo", skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

impl TaskPatch {
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Tasks partitioned into the three board columns. Every task lands in
/// exactly one column; order within a column follows the server's order.
#[derive(Debug, Clone, Default)]
pub struct TaskBoard {
    pub todo: Vec<Task>,
    pub in_progress: Vec<Task>,
    pub done: Vec<Task>,
}

impl TaskBoard {
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut board = Self::default();
        for task in tasks {
            match task.status {
                TaskStatus::Todo => board.todo.push(task),
                TaskStatus::InProgress => board.in_progress.push(task),
                TaskStatus::Done => board.done.push(task),
            }
        }
        board
    }

    pub fn column(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Done => &self.done,
        }
    }

    pub fn total(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: i64, status: TaskStatus) -> Task {
        Task {
            id,
            title: format!("task {}", id),
            description: None,
            status,
            created_at: None,
            assigned_to: None,
            deadline: None,
        }
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            r#""in_progress""#
        );
        let parsed: TaskStatus = serde_json::from_str(r#""todo""#).unwrap();
        assert_eq!(parsed, TaskStatus::Todo);
    }

    #[test]
    fn test_task_parses_api_shape() {
        let json = r#"{
            "id": 7,
            "title": "Write release notes",
            "description": "Cover the auth changes",
            "status": "in_progress",
            "createdAt": "2025-09-01T10:30:00Z",
            "assignedTo": 3,
            "deadline": "2025-09-18T18:00"
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, 7);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.assigned_to, Some(3));
        assert_eq!(task.deadline.as_deref(), Some("2025-09-18T18:00"));
    }

    #[test]
    fn test_task_optional_fields_absent() {
        let json = r#"{"id": 1, "title": "Bare", "status": "todo"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert!(task.description.is_none());
        assert!(task.created_at.is_none());
        assert!(task.deadline.is_none());
    }

    #[test]
    fn test_board_partition_exhaustive_and_disjoint() {
        let tasks = vec![
            task(1, TaskStatus::Todo),
            task(2, TaskStatus::InProgress),
            task(3, TaskStatus::Done),
        ];
        let board = TaskBoard::from_tasks(tasks);

        assert_eq!(board.todo.len(), 1);
        assert_eq!(board.in_progress.len(), 1);
        assert_eq!(board.done.len(), 1);
        assert_eq!(board.total(), 3);

        // No task appears in two columns
        let mut ids: Vec<i64> = board
            .todo
            .iter()
            .chain(&board.in_progress)
            .chain(&board.done)
            .map(|t| t.id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_patch_skips_absent_fields() {
        let patch = TaskPatch {
            title: Some("Retitle".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"title": "Retitle"}));
    }

    #[test]
    fn test_full_patch_from_task() {
        let t = Task {
            description: Some("notes".to_string()),
            deadline: Some("2025-09-18T18:00".to_string()),
            ..task(9, TaskStatus::Todo)
        };
        let patch = t.to_patch().with_status(TaskStatus::Done);
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["status"], "done");
        assert_eq!(json["title"], "task 9");
        assert_eq!(json["deadline"], "2025-09-18T18:00");
    }

    #[test]
    fn test_status_column_order() {
        assert_eq!(TaskStatus::Todo.next(), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::Done.next(), None);
        assert_eq!(TaskStatus::Done.prev(), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::Todo.prev(), None);
    }
}
