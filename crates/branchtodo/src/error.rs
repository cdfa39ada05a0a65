use std::path::PathBuf;
use thiserror::Error;

/// Failures of the branch metadata accessor.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(
        "This folder is not a Git repository: {}. Please open a folder that contains a Git repository.",
        .path.display()
    )]
    NotARepository { path: PathBuf },

    #[error("Unable to determine the current Git branch. You may be in a detached HEAD state.")]
    DetachedHead,

    #[error(
        "Cannot write branch description for '{branch}'. This may be due to insufficient permissions or Git configuration issues: {detail}"
    )]
    PermissionDenied { branch: String, detail: String },

    #[error("Failed to save TODO list for '{branch}': {detail}")]
    Write { branch: String, detail: String },

    #[error("Failed to get Git branch information: {0}")]
    BranchLookup(String),

    #[error("Failed to run git: {0}")]
    GitUnavailable(String),

    #[error(
        "The description of branch '{branch}' is not valid UTF-8. Edit it with `git branch --edit-description` before using the TODO list."
    )]
    NotUtf8 { branch: String },
}

/// A line of a branch description carried a metadata comment that could not
/// be parsed.
#[derive(Debug, Error)]
#[error("Malformed task metadata on line {line}: {reason} (in `{content}`)")]
pub struct DecodeError {
    /// 1-based line number within the description.
    pub line: usize,
    pub content: String,
    pub reason: String,
}

/// A task cannot be written without corrupting the line format.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Task {} text cannot contain line breaks or comment markers: {text:?}", .index + 1)]
    UnsafeText { index: usize, text: String },

    #[error("Task text cannot contain comment markers (<!-- or -->): {0:?}")]
    CommentMarker(String),

    #[error("Failed to serialize task metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Why a session could not reach the ready state.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// The host had no way to ask the user a yes/no question.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot confirm deletion: {0}")]
pub struct ConfirmError(pub String);

/// A mutation was rejected before it touched the task list.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("No task at position {} (the list has {len} tasks)", .index + 1)]
    OutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Text(#[from] EncodeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_distinct() {
        let messages = [
            StoreError::NotARepository {
                path: PathBuf::from("/tmp/x"),
            }
            .to_string(),
            StoreError::DetachedHead.to_string(),
            StoreError::PermissionDenied {
                branch: "main".into(),
                detail: "locked".into(),
            }
            .to_string(),
            StoreError::Write {
                branch: "main".into(),
                detail: "locked".into(),
            }
            .to_string(),
            StoreError::BranchLookup("boom".into()).to_string(),
            StoreError::GitUnavailable("not found".into()).to_string(),
            StoreError::NotUtf8 {
                branch: "main".into(),
            }
            .to_string(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_write_error_carries_detail() {
        let err = StoreError::Write {
            branch: "main".into(),
            detail: "could not lock config file".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("main"));
        assert!(msg.contains("could not lock config file"));
    }

    #[test]
    fn test_decode_error_names_line() {
        let err = DecodeError {
            line: 3,
            content: "[ ] foo <!--x-->".into(),
            reason: "expected value".into(),
        };
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_out_of_range_is_one_based() {
        let err = MutationError::OutOfRange { index: 4, len: 2 };
        assert_eq!(
            err.to_string(),
            "No task at position 5 (the list has 2 tasks)"
        );
    }
}
