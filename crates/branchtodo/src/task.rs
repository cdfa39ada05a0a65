use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StoreError;

// ============================================================================
// Task
// ============================================================================

/// One checklist entry.
///
/// Timestamps are kept as the ISO-8601 strings they were stored with, so a
/// value read from a branch description is written back byte-for-byte.
///
/// # JSON shape
///
/// This is the shape exchanged with a panel host:
///
/// ```json
/// { "done": true, "text": "buy milk",
///   "createdAt": "2024-01-01T00:00:00.000Z",
///   "completedAt": "2024-01-02T00:00:00.000Z" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub done: bool,
    pub text: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl Task {
    /// Create a pending task created at `now`.
    pub fn new(text: impl Into<String>, now: impl Into<String>) -> Self {
        Self {
            done: false,
            text: text.into(),
            created_at: now.into(),
            completed_at: None,
        }
    }

    /// Mark done at `now`, or clear completion.
    ///
    /// Unchecking always drops `completed_at`; checking an already-done task
    /// keeps its original completion time.
    pub fn set_done(&mut self, done: bool, now: &str) {
        if done {
            if !self.done || self.completed_at.is_none() {
                self.completed_at = Some(now.to_string());
            }
        } else {
            self.completed_at = None;
        }
        self.done = done;
    }

    /// Builder-style variant of [`Task::set_done`].
    pub fn completed(mut self, now: &str) -> Self {
        self.set_done(true, now);
        self
    }
}

// ============================================================================
// BranchName
// ============================================================================

/// A symbolic branch name that a description can be attached to.
///
/// Never empty, never the literal `HEAD`, never containing whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BranchName(String);

impl BranchName {
    /// Validate a branch name as printed by git (surrounding whitespace is
    /// ignored). An empty name or `HEAD` means HEAD is detached.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let name = raw.trim();
        if name.is_empty() || name == "HEAD" {
            return Err(StoreError::DetachedHead);
        }
        if name.chars().any(char::is_whitespace) {
            return Err(StoreError::BranchLookup(format!(
                "invalid branch name '{}'",
                name
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The config key holding this branch's description.
    pub fn description_key(&self) -> String {
        format!("branch.{}.description", self.0)
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
