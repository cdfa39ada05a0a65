//! Messages exchanged with a panel host.
//!
//! Every message is a JSON object tagged by `command`:
//!
//! ```json
//! {"command": "update", "tasks": [ … ]}
//! {"command": "confirmDelete", "taskIndex": 2, "taskText": "buy milk"}
//! {"command": "showError", "error": "Failed to save TODO list …"}
//! {"command": "deleteConfirmed", "taskIndex": 2}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfirmError;
use crate::task::Task;

/// Host → session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Inbound {
    /// The full, current task list. Replaces the session's list and is
    /// written immediately.
    Update { tasks: Vec<Task> },
    /// The user asked to delete a task; the host must confirm natively.
    #[serde(rename_all = "camelCase")]
    ConfirmDelete { task_index: usize, task_text: String },
}

/// Session → host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Outbound {
    ShowError {
        error: String,
    },
    #[serde(rename_all = "camelCase")]
    DeleteConfirmed {
        task_index: usize,
    },
}

/// A host-native yes/no prompt.
pub trait Confirm {
    /// `Ok(true)` when the user agreed, `Ok(false)` when they declined, and
    /// an error when nobody could be asked.
    fn confirm(&mut self, prompt: &str) -> Result<bool, ConfirmError>;
}

/// Answers every prompt the same way.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool, ConfirmError> {
        Ok(self.0)
    }
}

/// Prompt shown before deleting the task labelled `text`.
pub fn delete_prompt(text: &str) -> String {
    format!("Are you sure you want to delete \"{}\"?", text)
}

impl Inbound {
    /// Parse one message from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Outbound {
    /// Serialize to a single line of JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update() {
        let msg = Inbound::from_json(
            r#"{"command":"update","tasks":[{"done":false,"text":"a","createdAt":"t0"}]}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            Inbound::Update {
                tasks: vec![Task::new("a", "t0")]
            }
        );
    }

    #[test]
    fn test_parse_confirm_delete() {
        let msg =
            Inbound::from_json(r#"{"command":"confirmDelete","taskIndex":3,"taskText":"milk"}"#)
                .unwrap();
        assert_eq!(
            msg,
            Inbound::ConfirmDelete {
                task_index: 3,
                task_text: "milk".into()
            }
        );
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(Inbound::from_json(r#"{"command":"explode"}"#).is_err());
    }

    #[test]
    fn test_outbound_json() {
        assert_eq!(
            Outbound::DeleteConfirmed { task_index: 1 }.to_json().unwrap(),
            r#"{"command":"deleteConfirmed","taskIndex":1}"#
        );
        assert_eq!(
            Outbound::ShowError {
                error: "nope".into()
            }
            .to_json()
            .unwrap(),
            r#"{"command":"showError","error":"nope"}"#
        );
    }

    #[test]
    fn test_delete_prompt() {
        assert_eq!(
            delete_prompt("buy milk"),
            "Are you sure you want to delete \"buy milk\"?"
        );
    }
}
