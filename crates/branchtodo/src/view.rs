use serde::Serialize;

use crate::error::{OpenError, StoreError};
use crate::task::{BranchName, Task};

/// One task as a host renders it.
///
/// `index` is the task's position in the full list, which stays valid when
/// the task is shown inside the pending or completed section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub index: usize,
    pub done: bool,
    pub text: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Stats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
}

/// Everything a host needs to draw the checklist for one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelView {
    pub branch: String,
    pub stats: Stats,
    /// The full list in stored order, as sent back in `update` messages.
    pub tasks: Vec<Task>,
    pub pending: Vec<TaskView>,
    pub completed: Vec<TaskView>,
}

impl PanelView {
    pub fn new(branch: &BranchName, tasks: &[Task]) -> Self {
        let (completed, pending): (Vec<TaskView>, Vec<TaskView>) = tasks
            .iter()
            .enumerate()
            .map(|(index, task)| TaskView {
                index,
                done: task.done,
                text: task.text.clone(),
                created_at: task.created_at.clone(),
                completed_at: task.completed_at.clone(),
            })
            .partition(|view| view.done);

        Self {
            branch: branch.to_string(),
            stats: Stats {
                total: tasks.len(),
                pending: pending.len(),
                completed: completed.len(),
            },
            tasks: tasks.to_vec(),
            pending,
            completed,
        }
    }

    /// "No tasks", "1 task", or "N tasks".
    pub fn tasks_count_label(&self) -> String {
        match self.stats.total {
            0 => "No tasks".to_string(),
            1 => "1 task".to_string(),
            n => format!("{} tasks", n),
        }
    }
}

/// The terminal error screen shown when a session fails to open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorView {
    pub title: String,
    pub message: String,
    pub suggestions: Vec<String>,
}

const SUGGESTIONS: &[&str] = &[
    "Make sure you're in a Git repository folder",
    "Check that Git is installed and accessible",
    "Verify you have write permissions to the repository",
    "Try running `git status` in the terminal",
    "If in a detached HEAD state, checkout a branch first",
];

impl From<&OpenError> for ErrorView {
    fn from(err: &OpenError) -> Self {
        let suggestions: Vec<String> = match err {
            OpenError::Store(StoreError::NotARepository { .. }) => vec![SUGGESTIONS[0]],
            OpenError::Store(StoreError::DetachedHead) => vec![SUGGESTIONS[4]],
            OpenError::Store(StoreError::PermissionDenied { .. }) => vec![SUGGESTIONS[2]],
            OpenError::Store(StoreError::GitUnavailable(_)) => vec![SUGGESTIONS[1]],
            OpenError::Decode(_) => {
                vec!["Fix or remove the malformed line with `git branch --edit-description`"]
            }
            OpenError::Store(StoreError::NotUtf8 { .. }) => {
                vec!["Rewrite the description with `git branch --edit-description`"]
            }
            _ => SUGGESTIONS.to_vec(),
        }
        .into_iter()
        .map(str::to_string)
        .collect();

        Self {
            title: "Git TODO Error".to_string(),
            message: err.to_string(),
            suggestions,
        }
    }
}

/// What a panel shows: the session lifecycle as seen by a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PanelState {
    Loading,
    Ready(PanelView),
    Error(ErrorView),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;

    fn branch() -> BranchName {
        BranchName::parse("main").unwrap()
    }

    #[test]
    fn test_sections_keep_original_indices() {
        let tasks = vec![
            Task::new("a", "t"),
            Task::new("b", "t").completed("t2"),
            Task::new("c", "t"),
        ];
        let view = PanelView::new(&branch(), &tasks);

        assert_eq!(
            view.stats,
            Stats {
                total: 3,
                pending: 2,
                completed: 1
            }
        );
        let pending: Vec<usize> = view.pending.iter().map(|t| t.index).collect();
        assert_eq!(pending, vec![0, 2]);
        assert_eq!(view.completed[0].index, 1);
        assert_eq!(view.completed[0].completed_at.as_deref(), Some("t2"));
        assert_eq!(view.tasks, tasks);
    }

    #[test]
    fn test_tasks_count_label() {
        let mut tasks = Vec::new();
        assert_eq!(PanelView::new(&branch(), &tasks).tasks_count_label(), "No tasks");
        tasks.push(Task::new("a", "t"));
        assert_eq!(PanelView::new(&branch(), &tasks).tasks_count_label(), "1 task");
        tasks.push(Task::new("b", "t"));
        assert_eq!(PanelView::new(&branch(), &tasks).tasks_count_label(), "2 tasks");
    }

    #[test]
    fn test_error_view_for_detached_head() {
        let err = OpenError::Store(StoreError::DetachedHead);
        let view = ErrorView::from(&err);
        assert_eq!(view.title, "Git TODO Error");
        assert!(view.message.contains("detached HEAD"));
        assert_eq!(view.suggestions.len(), 1);
    }

    #[test]
    fn test_error_view_generic_lists_all_suggestions() {
        let err = OpenError::Store(StoreError::BranchLookup("boom".into()));
        assert_eq!(ErrorView::from(&err).suggestions.len(), SUGGESTIONS.len());
    }

    #[test]
    fn test_error_view_for_decode() {
        let err = OpenError::Decode(DecodeError {
            line: 1,
            content: "[ ] x <!--y-->".into(),
            reason: "expected value".into(),
        });
        assert!(ErrorView::from(&err).message.contains("line 1"));
    }

    #[test]
    fn test_panel_state_json() {
        assert_eq!(
            serde_json::to_string(&PanelState::Loading).unwrap(),
            r#"{"state":"loading"}"#
        );
        let ready = PanelState::Ready(PanelView::new(&branch(), &[]));
        let json = serde_json::to_value(&ready).unwrap();
        assert_eq!(json["state"], "ready");
        assert_eq!(json["branch"], "main");
        assert_eq!(json["stats"]["total"], 0);
    }
}
