use anyhow::{Context, Result, bail};
use branchtodo::protocol::delete_prompt;
use branchtodo::{
    Confirm, ConfirmError, DescriptionStore, MutationError, Session, TaskView, WriteStatus,
};
use chrono::DateTime;
use clap::Subcommand;
use serde::Serialize;
use std::io::{BufRead, Write};

// ============================================================================
// CLI argument types
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum TaskOp {
    /// Show the checklist for the current branch
    List {
        /// Output the panel view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a task
    Add {
        /// Task text (words are joined with spaces)
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Mark a task as done
    Done {
        /// Task position, starting at 1
        position: usize,
    },
    /// Mark a task as not done
    Undo {
        /// Task position, starting at 1
        position: usize,
    },
    /// Change a task's text
    Edit {
        /// Task position, starting at 1
        position: usize,

        /// New text
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Delete a task
    Rm {
        /// Task position, starting at 1
        position: usize,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Move a task to another position
    Mv {
        /// Current position
        from: usize,

        /// New position
        to: usize,
    },
    /// Print the branch description as it is stored
    Raw,
}

// ============================================================================
// Helpers
// ============================================================================

/// Asks on the terminal and reads a y/N answer.
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, prompt: &str) -> Result<bool, ConfirmError> {
        write!(self.output, "{} [y/N] ", prompt)
            .and_then(|_| self.output.flush())
            .map_err(|e| ConfirmError(format!("cannot show prompt: {}", e)))?;
        let mut answer = String::new();
        self.input
            .read_line(&mut answer)
            .map_err(|e| ConfirmError(format!("cannot read answer: {}", e)))?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

/// Convert a 1-based position from the command line to an index.
fn to_index(position: usize) -> Result<usize> {
    if position == 0 {
        bail!("task positions start at 1");
    }
    Ok(position - 1)
}

/// Turn the storage outcome of a mutation into the command's result.
fn finish(status: WriteStatus, out: &mut impl Write, saved: &str, unchanged: &str) -> Result<()> {
    match status {
        WriteStatus::Saved => writeln!(out, "{}", saved)?,
        WriteStatus::Unchanged => writeln!(out, "{}", unchanged)?,
        WriteStatus::Failed(err) => return Err(err).context("changes were not saved"),
    }
    Ok(())
}

/// `2024-01-02T15:04:05.000Z` → `Jan 2, 15:04`; anything unparseable as-is.
fn short_date(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.format("%b %-d, %H:%M").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

fn format_task(task: &TaskView) -> String {
    let marker = if task.done { "[X]" } else { "[ ]" };
    let mut line = format!(
        "  {:>3}. {} {}  (added {}",
        task.index + 1,
        marker,
        task.text,
        short_date(&task.created_at)
    );
    if let Some(done) = &task.completed_at {
        line.push_str(&format!(", done {}", short_date(done)));
    }
    line.push(')');
    line
}

pub fn print_json<T: Serialize>(out: &mut impl Write, value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("failed to serialize output")?;
    writeln!(out, "{}", json)?;
    Ok(())
}

// ============================================================================
// Subcommand implementations
// ============================================================================

pub fn run<S: DescriptionStore>(
    op: TaskOp,
    store: S,
    input: impl BufRead,
    out: &mut impl Write,
    pretty: bool,
) -> Result<()> {
    let mut session = Session::open(store)?;

    match op {
        TaskOp::List { json } => run_list(&session, json, pretty, out),
        TaskOp::Add { text } => {
            let text = text.join(" ");
            let status = session.add(&text)?;
            let saved = format!("Added task {}", session.tasks().len());
            finish(status, out, &saved, "Nothing to add")
        }
        TaskOp::Done { position } => {
            let status = session.toggle(to_index(position)?, true)?;
            finish(status, out, &format!("Completed task {}", position), "Already done")
        }
        TaskOp::Undo { position } => {
            let status = session.toggle(to_index(position)?, false)?;
            finish(status, out, &format!("Reopened task {}", position), "Not done yet")
        }
        TaskOp::Edit { position, text } => {
            let status = session.edit(to_index(position)?, &text.join(" "))?;
            finish(status, out, &format!("Updated task {}", position), "No change")
        }
        TaskOp::Rm { position, yes } => {
            let index = to_index(position)?;
            let label = match session.tasks().get(index) {
                Some(task) => task.text.clone(),
                None => {
                    return Err(MutationError::OutOfRange {
                        index,
                        len: session.tasks().len(),
                    }
                    .into());
                }
            };
            if !yes {
                let mut prompt = PromptConfirm::new(input, &mut *out);
                if !prompt.confirm(&delete_prompt(&label))? {
                    writeln!(out, "Kept task {}", position)?;
                    return Ok(());
                }
            }
            let status = session.delete(index)?;
            finish(status, out, &format!("Deleted \"{}\"", label), "No change")
        }
        TaskOp::Mv { from, to } => {
            let status = session.reorder(to_index(from)?, to_index(to)?)?;
            finish(status, out, &format!("Moved task {} to {}", from, to), "No change")
        }
        TaskOp::Raw => {
            writeln!(out, "{}", session.encoded()?)?;
            Ok(())
        }
    }
}

fn run_list<S: DescriptionStore>(
    session: &Session<S>,
    json: bool,
    pretty: bool,
    out: &mut impl Write,
) -> Result<()> {
    let view = session.view();

    if json {
        return print_json(out, &view, pretty);
    }

    writeln!(
        out,
        "Branch: {} ({}, {} pending, {} completed)",
        view.branch,
        view.tasks_count_label(),
        view.stats.pending,
        view.stats.completed
    )?;
    if view.stats.total == 0 {
        writeln!(out)?;
        writeln!(out, "  No tasks yet. Add one with `git todo add <text>`.")?;
        return Ok(());
    }
    for (title, section) in [("Pending", &view.pending), ("Completed", &view.completed)] {
        if section.is_empty() {
            continue;
        }
        writeln!(out)?;
        writeln!(out, "{} ({})", title, section.len())?;
        for task in section {
            writeln!(out, "{}", format_task(task))?;
        }
    }
    Ok(())
}
