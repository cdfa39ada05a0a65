//! Line-delimited JSON bridge between a panel host and a checklist session.
//!
//! The first lines written are panel states (`loading`, then `ready` with
//! the full view or `error` with an error view). After that the bridge reads
//! one inbound message per line and writes any outbound messages, one per
//! line.

use anyhow::Result;
use branchtodo::{
    AutoConfirm, Confirm, ConfirmError, DescriptionStore, ErrorView, Inbound, Outbound, PanelState,
    Session,
};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use tracing::{debug, warn};

use crate::cmd_tasks::{PromptConfirm, print_json};

/// How delete confirmations are answered.
pub enum HostConfirm {
    Auto(AutoConfirm),
    Terminal(Box<dyn Confirm>),
    /// No way to ask; every confirmation is reported back as an error.
    Unavailable(String),
}

impl HostConfirm {
    /// Confirm everything when `yes`, otherwise prompt on the controlling
    /// terminal.
    pub fn new(yes: bool) -> Self {
        if yes {
            return HostConfirm::Auto(AutoConfirm(true));
        }
        let tty = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/tty")
            .and_then(|tty| Ok((tty.try_clone()?, tty)));
        match tty {
            Ok((reader, writer)) => {
                HostConfirm::Terminal(Box::new(PromptConfirm::new(BufReader::new(reader), writer)))
            }
            Err(e) => {
                warn!(error = %e, "no terminal for delete confirmations");
                HostConfirm::unavailable(&e)
            }
        }
    }

    fn unavailable(cause: &dyn std::fmt::Display) -> Self {
        HostConfirm::Unavailable(format!(
            "no terminal available ({}); run serve with --yes",
            cause
        ))
    }
}

impl Confirm for HostConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool, ConfirmError> {
        match self {
            HostConfirm::Auto(auto) => auto.confirm(prompt),
            HostConfirm::Terminal(term) => term.confirm(prompt),
            HostConfirm::Unavailable(reason) => Err(ConfirmError(reason.clone())),
        }
    }
}

pub fn run<S: DescriptionStore>(
    store: S,
    input: impl BufRead,
    out: &mut impl Write,
    host: &mut impl Confirm,
    pretty: bool,
) -> Result<()> {
    emit(out, &PanelState::Loading, pretty)?;

    let mut session = match Session::open(store) {
        Ok(session) => session,
        Err(err) => {
            emit(out, &PanelState::Error(ErrorView::from(&err)), pretty)?;
            return Err(err.into());
        }
    };
    emit(out, &PanelState::Ready(session.view()), pretty)?;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let replies = match Inbound::from_json(&line) {
            Ok(message) => {
                debug!(?message, "panel message");
                session.handle(message, host)
            }
            Err(e) => vec![Outbound::ShowError {
                error: format!("Invalid message: {}", e),
            }],
        };
        for reply in &replies {
            emit(out, reply, pretty)?;
        }
    }
    Ok(())
}

fn emit<T: serde::Serialize>(out: &mut impl Write, value: &T, pretty: bool) -> Result<()> {
    print_json(out, value, pretty)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use branchtodo::{BranchName, StoreError};
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::path::PathBuf;

    #[derive(Default)]
    struct MemoryStore {
        text: RefCell<String>,
        missing_repo: bool,
        fail_writes: bool,
    }

    impl DescriptionStore for MemoryStore {
        fn resolve_current_branch(&self) -> Result<BranchName, StoreError> {
            if self.missing_repo {
                return Err(StoreError::NotARepository {
                    path: PathBuf::from("/tmp/plain"),
                });
            }
            BranchName::parse("main")
        }
        fn read_description(&self, _: &BranchName) -> Result<String, StoreError> {
            Ok(self.text.borrow().clone())
        }
        fn write_description(&self, branch: &BranchName, text: &str) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::Write {
                    branch: branch.to_string(),
                    detail: "disk full".into(),
                });
            }
            *self.text.borrow_mut() = text.to_string();
            Ok(())
        }
    }

    fn serve(store: &MemoryStore, stdin: &str, yes: bool) -> (Result<()>, Vec<serde_json::Value>) {
        let mut out = Vec::new();
        let result = run(
            store,
            Cursor::new(stdin.to_string()),
            &mut out,
            &mut AutoConfirm(yes),
            false,
        );
        let lines = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (result, lines)
    }

    #[test]
    fn test_initial_states() {
        let store = MemoryStore::default();
        let (result, lines) = serve(&store, "", true);
        assert!(result.is_ok());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["state"], "loading");
        assert_eq!(lines[1]["state"], "ready");
        assert_eq!(lines[1]["branch"], "main");
    }

    #[test]
    fn test_open_error_is_reported_then_fails() {
        let store = MemoryStore {
            missing_repo: true,
            ..Default::default()
        };
        let (result, lines) = serve(&store, "{\"command\":\"update\",\"tasks\":[]}\n", true);
        assert!(result.is_err());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["state"], "error");
        assert_eq!(lines[1]["title"], "Git TODO Error");
        assert!(lines[1]["message"].as_str().unwrap().contains("not a Git repository"));
    }

    #[test]
    fn test_update_writes_description() {
        let store = MemoryStore::default();
        let stdin = "{\"command\":\"update\",\"tasks\":[{\"done\":true,\"text\":\"ship\",\"createdAt\":\"a\",\"completedAt\":\"b\"}]}\n";
        let (result, lines) = serve(&store, stdin, true);
        assert!(result.is_ok());
        assert_eq!(lines.len(), 2);
        assert_eq!(
            *store.text.borrow(),
            "[X] ship <!--{\"createdAt\":\"a\",\"completedAt\":\"b\"}-->"
        );
    }

    #[test]
    fn test_confirm_delete_round_trip() {
        let store = MemoryStore::default();
        let stdin = "{\"command\":\"confirmDelete\",\"taskIndex\":4,\"taskText\":\"x\"}\n\n";

        let (_, lines) = serve(&store, stdin, true);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2]["command"], "deleteConfirmed");
        assert_eq!(lines[2]["taskIndex"], 4);

        let (_, lines) = serve(&store, stdin, false);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_confirm_delete_without_terminal_is_reported() {
        let store = MemoryStore::default();
        let stdin = "{\"command\":\"confirmDelete\",\"taskIndex\":0,\"taskText\":\"one\"}\n";
        let mut host = HostConfirm::unavailable(&"No such device or address");
        let mut out = Vec::new();
        run(&store, Cursor::new(stdin.to_string()), &mut out, &mut host, false).unwrap();

        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2]["command"], "showError");
        let error = lines[2]["error"].as_str().unwrap();
        assert!(error.starts_with("Cannot confirm deletion: no terminal available"));
        assert!(error.contains("--yes"));
    }

    #[test]
    fn test_write_failure_is_not_fatal() {
        let store = MemoryStore {
            fail_writes: true,
            ..Default::default()
        };
        let stdin = "{\"command\":\"update\",\"tasks\":[]}\n{\"command\":\"confirmDelete\",\"taskIndex\":0,\"taskText\":\"x\"}\n";
        let (result, lines) = serve(&store, stdin, true);
        assert!(result.is_ok());
        assert_eq!(lines[2]["command"], "showError");
        assert!(lines[2]["error"].as_str().unwrap().contains("disk full"));
        assert_eq!(lines[3]["command"], "deleteConfirmed");
    }

    #[test]
    fn test_invalid_message_is_reported() {
        let store = MemoryStore::default();
        let (result, lines) = serve(&store, "not json\n", true);
        assert!(result.is_ok());
        assert_eq!(lines[2]["command"], "showError");
        assert!(lines[2]["error"].as_str().unwrap().starts_with("Invalid message"));
    }
}
