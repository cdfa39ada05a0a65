use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::codec;
use crate::error::{EncodeError, MutationError, OpenError, StoreError};
use crate::protocol::{Confirm, Inbound, Outbound, delete_prompt};
use crate::store::DescriptionStore;
use crate::task::{BranchName, Task};
use crate::view::PanelView;

/// Why a mutated list did not reach storage.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a mutation as far as storage is concerned.
#[derive(Debug)]
pub enum WriteStatus {
    /// The list changed and was written.
    Saved,
    /// Nothing changed; nothing was written.
    Unchanged,
    /// The list changed in memory but the write failed. The in-memory list is
    /// kept and stays authoritative for the rest of the session.
    Failed(SaveError),
}

impl WriteStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, WriteStatus::Saved)
    }

    /// The non-fatal report a host should display, if any.
    pub fn to_outbound(&self) -> Option<Outbound> {
        match self {
            WriteStatus::Failed(err) => Some(Outbound::ShowError {
                error: err.to_string(),
            }),
            _ => None,
        }
    }
}

/// One editing session against the checklist of a single branch.
///
/// The session owns its task list. It is read from storage once, when the
/// session opens, and afterwards every change is written straight back
/// without re-reading.
///
/// # Example
///
/// ```
/// use branchtodo::{BranchName, DescriptionStore, FixedClock, Session, StoreError};
/// use std::cell::RefCell;
///
/// #[derive(Default)]
/// struct Memory(RefCell<String>);
///
/// impl DescriptionStore for Memory {
///     fn resolve_current_branch(&self) -> Result<BranchName, StoreError> {
///         BranchName::parse("main")
///     }
///     fn read_description(&self, _: &BranchName) -> Result<String, StoreError> {
///         Ok(self.0.borrow().clone())
///     }
///     fn write_description(&self, _: &BranchName, text: &str) -> Result<(), StoreError> {
///         *self.0.borrow_mut() = text.to_string();
///         Ok(())
///     }
/// }
///
/// let store = Memory::default();
/// let clock = FixedClock::new("2024-01-01T00:00:00.000Z");
/// let mut session = Session::open_with_clock(&store, clock).unwrap();
///
/// assert!(session.add("write docs").unwrap().is_saved());
/// assert_eq!(
///     *store.0.borrow(),
///     "[ ] write docs <!--{\"createdAt\":\"2024-01-01T00:00:00.000Z\"}-->"
/// );
/// ```
pub struct Session<S, C = SystemClock> {
    store: S,
    clock: C,
    branch: BranchName,
    tasks: Vec<Task>,
}

impl<S: DescriptionStore> Session<S> {
    /// Open a session using wall-clock timestamps.
    pub fn open(store: S) -> Result<Self, OpenError> {
        Self::open_with_clock(store, SystemClock)
    }
}

impl<S: DescriptionStore, C: Clock> Session<S, C> {
    /// Resolve the current branch, read its description, and decode it.
    ///
    /// Any failure here is terminal for the session.
    pub fn open_with_clock(store: S, clock: C) -> Result<Self, OpenError> {
        let branch = store.resolve_current_branch()?;
        let description = store.read_description(&branch)?;
        let tasks = codec::decode_at(&description, &clock.now())?;

        info!(branch = %branch, tasks = tasks.len(), "opened branch checklist");
        Ok(Self {
            store,
            clock,
            branch,
            tasks,
        })
    }

    pub fn branch(&self) -> &BranchName {
        &self.branch
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn view(&self) -> PanelView {
        PanelView::new(&self.branch, &self.tasks)
    }

    /// The description text the current list encodes to.
    pub fn encoded(&self) -> Result<String, EncodeError> {
        codec::encode(&self.tasks)
    }

    // ── mutations ──────────────────────────────────────────────────────

    /// Check or uncheck the task at `index`.
    pub fn toggle(&mut self, index: usize, done: bool) -> Result<WriteStatus, MutationError> {
        self.check_index(index)?;
        if self.tasks[index].done == done {
            return Ok(WriteStatus::Unchanged);
        }
        let now = self.clock.now();
        self.tasks[index].set_done(done, &now);
        Ok(self.persist())
    }

    /// Append a new pending task. Blank text is ignored.
    pub fn add(&mut self, text: &str) -> Result<WriteStatus, MutationError> {
        let text = codec::sanitize_text(text)?;
        if text.is_empty() {
            return Ok(WriteStatus::Unchanged);
        }
        self.tasks.push(Task::new(text, self.clock.now()));
        Ok(self.persist())
    }

    /// Change the label of the task at `index`. Blank or identical text is
    /// ignored.
    pub fn edit(&mut self, index: usize, text: &str) -> Result<WriteStatus, MutationError> {
        self.check_index(index)?;
        let text = codec::sanitize_text(text)?;
        if text.is_empty() || text == self.tasks[index].text {
            return Ok(WriteStatus::Unchanged);
        }
        self.tasks[index].text = text;
        Ok(self.persist())
    }

    pub fn delete(&mut self, index: usize) -> Result<WriteStatus, MutationError> {
        self.check_index(index)?;
        let removed = self.tasks.remove(index);
        debug!(index, text = %removed.text, "deleted task");
        Ok(self.persist())
    }

    /// Move the task at `from` so that it ends up at position `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<WriteStatus, MutationError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(WriteStatus::Unchanged);
        }
        let task = self.tasks.remove(from);
        self.tasks.insert(to, task);
        Ok(self.persist())
    }

    /// Replace the whole list, as a host does with an `update` message.
    ///
    /// Texts are trimmed and pending tasks lose any completion time they
    /// carry, so the list in memory matches what gets stored.
    pub fn replace(&mut self, tasks: Vec<Task>) -> WriteStatus {
        self.tasks = tasks;
        for task in self.tasks.iter_mut() {
            let trimmed = task.text.trim();
            if trimmed.len() != task.text.len() {
                task.text = trimmed.to_string();
            }
            if !task.done {
                task.completed_at = None;
            }
        }
        self.persist()
    }

    // ── panel protocol ─────────────────────────────────────────────────

    /// React to one message from a panel host.
    pub fn handle(&mut self, message: Inbound, host: &mut impl Confirm) -> Vec<Outbound> {
        match message {
            Inbound::Update { tasks } => self.replace(tasks).to_outbound().into_iter().collect(),
            Inbound::ConfirmDelete {
                task_index,
                task_text,
            } => {
                match host.confirm(&delete_prompt(&task_text)) {
                    Ok(true) => vec![Outbound::DeleteConfirmed { task_index }],
                    Ok(false) => Vec::new(),
                    Err(err) => {
                        warn!(task_index, error = %err, "delete confirmation unavailable");
                        vec![Outbound::ShowError {
                            error: err.to_string(),
                        }]
                    }
                }
            }
        }
    }

    // ── helpers ────────────────────────────────────────────────────────

    fn check_index(&self, index: usize) -> Result<(), MutationError> {
        if index < self.tasks.len() {
            Ok(())
        } else {
            Err(MutationError::OutOfRange {
                index,
                len: self.tasks.len(),
            })
        }
    }

    fn persist(&self) -> WriteStatus {
        let result = codec::encode(&self.tasks)
            .map_err(SaveError::from)
            .and_then(|text| {
                self.store
                    .write_description(&self.branch, &text)
                    .map_err(SaveError::from)
            });

        match result {
            Ok(()) => {
                debug!(branch = %self.branch, tasks = self.tasks.len(), "saved checklist");
                WriteStatus::Saved
            }
            Err(err) => {
                warn!(branch = %self.branch, error = %err, "failed to save checklist");
                WriteStatus::Failed(err)
            }
        }
    }
}
