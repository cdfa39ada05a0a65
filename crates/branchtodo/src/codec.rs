//! Conversion between a branch description and a task list.
//!
//! Each task occupies one line:
//!
//! ```text
//! Line    := Marker WS+ Body
//! Marker  := "[" <any char> "]"          ; only "[X]" means done
//! Body    := Text [ WS+ Comment ]
//! Comment := "<!--" Json "-->"           ; must end the line
//! ```
//!
//! Lines that do not start with a marker are not tasks and are dropped. A
//! metadata comment that is present but unparseable fails the whole decode.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::clock::{Clock, SystemClock};
use crate::error::{DecodeError, EncodeError};
use crate::task::Task;

pub const DONE_MARKER: &str = "[X]";
pub const PENDING_MARKER: &str = "[ ]";

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

// ============================================================================
// Line grammar
// ============================================================================

/// Result of tokenizing a single description line.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    /// Not a task line.
    Skip,
    Task {
        done: bool,
        text: &'a str,
        comment: Option<&'a str>,
    },
}

fn parse_line(line: &str) -> Line<'_> {
    let Some((mark, rest)) = split_marker(line) else {
        return Line::Skip;
    };
    if !rest.starts_with(char::is_whitespace) {
        return Line::Skip;
    }

    let (text, comment) = match find_comment(rest) {
        Some((open, payload)) => (&rest[..open], Some(payload)),
        None => (rest, None),
    };

    Line::Task {
        done: mark == 'X',
        text: text.trim(),
        comment,
    }
}

/// Split `[c]` off the front of a line.
fn split_marker(line: &str) -> Option<(char, &str)> {
    let rest = line.strip_prefix('[')?;
    let mut chars = rest.chars();
    let mark = chars.next()?;
    let rest = chars.as_str().strip_prefix(']')?;
    Some((mark, rest))
}

/// Locate the trailing metadata comment in the text after the marker.
///
/// Returns the byte offset of `<!--` within `body` and the payload between the
/// delimiters. The left-most opener wins, provided it is preceded by
/// whitespace that is not the single separator after the marker and the line
/// ends with `-->` after it.
fn find_comment(body: &str) -> Option<(usize, &str)> {
    let close = body.strip_suffix(COMMENT_CLOSE)?.len();

    for (open, _) in body.match_indices(COMMENT_OPEN) {
        let payload_start = open + COMMENT_OPEN.len();
        if payload_start > close {
            break;
        }
        let before = &body[..open];
        let Some(sep) = before.chars().next_back() else {
            continue;
        };
        // The marker's separator and the comment's separator can't share a char.
        if !sep.is_whitespace() || before.len() == sep.len_utf8() {
            continue;
        }
        return Some((open, &body[payload_start..close]));
    }
    None
}

// ============================================================================
// Metadata payload
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetaIn {
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    completed_at: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MetaOut<'a> {
    created_at: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<&'a str>,
}

fn parse_meta(payload: Option<&str>) -> Result<MetaIn, String> {
    let Some(payload) = payload.filter(|p| !p.is_empty()) else {
        return Ok(MetaIn::default());
    };
    let value: serde_json::Value = serde_json::from_str(payload).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err(format!("expected a JSON object, found {}", value));
    }
    serde_json::from_value(value).map_err(|e| e.to_string())
}

// ============================================================================
// Public API
// ============================================================================

/// Decode a branch description, stamping missing timestamps with the current
/// time.
pub fn decode(input: &str) -> Result<Vec<Task>, DecodeError> {
    decode_at(input, &SystemClock.now())
}

/// Decode a branch description, stamping missing timestamps with `now`.
///
/// # Examples
///
/// ```
/// use branchtodo::codec::decode_at;
///
/// let text = "notes that are not tasks\n[X] ship it <!--{\"createdAt\":\"2024-01-01T00:00:00.000Z\"}-->";
/// let tasks = decode_at(text, "2024-02-02T00:00:00.000Z").unwrap();
///
/// assert_eq!(tasks.len(), 1);
/// assert!(tasks[0].done);
/// assert_eq!(tasks[0].text, "ship it");
/// assert_eq!(tasks[0].completed_at.as_deref(), Some("2024-02-02T00:00:00.000Z"));
/// ```
pub fn decode_at(input: &str, now: &str) -> Result<Vec<Task>, DecodeError> {
    let mut tasks = Vec::new();

    for (idx, raw) in input.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        let (done, text, comment) = match parse_line(line) {
            Line::Skip => {
                if !line.trim().is_empty() {
                    trace!(line = idx + 1, "skipping non-task line");
                }
                continue;
            }
            Line::Task {
                done,
                text,
                comment,
            } => (done, text, comment),
        };

        let meta = parse_meta(comment).map_err(|reason| DecodeError {
            line: idx + 1,
            content: line.to_string(),
            reason,
        })?;

        let created_at = meta
            .created_at
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| now.to_string());
        let completed_at = if done {
            Some(
                meta.completed_at
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| now.to_string()),
            )
        } else {
            None
        };

        tasks.push(Task {
            done,
            text: text.to_string(),
            created_at,
            completed_at,
        });
    }

    Ok(tasks)
}

/// Encode tasks as a branch description: one line per task, joined by `\n`,
/// no trailing newline.
///
/// `completedAt` is only written for done tasks. Text that would break the
/// line format is rejected rather than escaped.
pub fn encode(tasks: &[Task]) -> Result<String, EncodeError> {
    let mut lines = Vec::with_capacity(tasks.len());
    for (index, task) in tasks.iter().enumerate() {
        lines.push(encode_line(index, task)?);
    }
    Ok(lines.join("\n"))
}

fn encode_line(index: usize, task: &Task) -> Result<String, EncodeError> {
    let text = task.text.trim();
    if !is_safe_text(text) {
        return Err(EncodeError::UnsafeText {
            index,
            text: task.text.clone(),
        });
    }

    let meta = MetaOut {
        created_at: &task.created_at,
        completed_at: if task.done {
            task.completed_at.as_deref()
        } else {
            None
        },
    };
    let marker = if task.done {
        DONE_MARKER
    } else {
        PENDING_MARKER
    };

    Ok(format!(
        "{} {} {}{}{}",
        marker,
        text,
        COMMENT_OPEN,
        serde_json::to_string(&meta)?,
        COMMENT_CLOSE
    ))
}

/// Whether `text` can be stored on a task line unchanged.
pub fn is_safe_text(text: &str) -> bool {
    !text.contains(['\n', '\r']) && !text.contains(COMMENT_OPEN) && !text.contains(COMMENT_CLOSE)
}

/// Normalize user-entered task text.
///
/// Line breaks collapse to single spaces and surrounding whitespace is
/// trimmed. Comment delimiters are refused. An empty result means "nothing
/// entered".
pub fn sanitize_text(raw: &str) -> Result<String, EncodeError> {
    let text = raw
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.contains(COMMENT_OPEN) || text.contains(COMMENT_CLOSE) {
        return Err(EncodeError::CommentMarker(text));
    }
    Ok(text)
}
