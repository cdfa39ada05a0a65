use branchtodo::{BranchName, DescriptionStore, StoreError};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// [`DescriptionStore`] that drives the `git` executable.
///
/// Arguments are passed as an argv vector, never through a shell, so task
/// text needs no quoting. Config keys and values follow `--` so a value
/// starting with `-` is never read as an option.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
    git: PathBuf,
}

/// Captured result of one git invocation.
#[derive(Debug)]
struct GitOutput {
    code: Option<i32>,
    /// Raw bytes; config values are not guaranteed to be UTF-8.
    stdout: Vec<u8>,
    stderr: String,
}

impl GitOutput {
    fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Best human-readable explanation of a failure.
    fn detail(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.code {
            Some(code) => format!("git exited with status {}", code),
            None => "git was terminated by a signal".to_string(),
        }
    }
}

impl GitCli {
    /// Operate on the repository containing `workdir`, using `git` from `PATH`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            git: PathBuf::from("git"),
        }
    }

    /// Use a specific git executable.
    pub fn with_git_binary(mut self, git: impl Into<PathBuf>) -> Self {
        self.git = git.into();
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn run(&self, args: &[&str]) -> Result<GitOutput, StoreError> {
        debug!(git = %self.git.display(), ?args, "running git");
        let output = Command::new(&self.git)
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|e| {
                StoreError::GitUnavailable(format!("{}: {}", self.git.display(), e))
            })?;

        let result = GitOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(code = ?result.code, "git finished");
        Ok(result)
    }

    fn set_description(&self, branch: &BranchName, text: &str) -> Result<(), String> {
        let key = branch.description_key();
        match self.run(&["config", "--", &key, text]) {
            Ok(out) if out.success() => Ok(()),
            Ok(out) => Err(out.detail()),
            Err(err) => Err(err.to_string()),
        }
    }
}

impl DescriptionStore for GitCli {
    fn resolve_current_branch(&self) -> Result<BranchName, StoreError> {
        let not_a_repo = || StoreError::NotARepository {
            path: self.workdir.clone(),
        };
        if !self.workdir.is_dir() {
            return Err(not_a_repo());
        }
        if !self.run(&["rev-parse", "--git-dir"])?.success() {
            return Err(not_a_repo());
        }

        // Works on unborn branches too, unlike `rev-parse --abbrev-ref HEAD`.
        let out = self.run(&["symbolic-ref", "--quiet", "--short", "HEAD"])?;
        match out.code {
            Some(0) => {
                let name = String::from_utf8(out.stdout).map_err(|_| {
                    StoreError::BranchLookup("branch name is not valid UTF-8".to_string())
                })?;
                BranchName::parse(&name)
            }
            // --quiet: status 1 with no output means HEAD is not symbolic
            Some(1) => Err(StoreError::DetachedHead),
            _ => Err(StoreError::BranchLookup(out.detail())),
        }
    }

    fn read_description(&self, branch: &BranchName) -> Result<String, StoreError> {
        let key = branch.description_key();
        let out = self.run(&["config", "--get", "--", &key])?;
        if out.success() {
            let mut value = String::from_utf8(out.stdout).map_err(|_| StoreError::NotUtf8 {
                branch: branch.to_string(),
            })?;
            if value.ends_with('\n') {
                value.pop();
            }
            return Ok(value);
        }

        debug!(branch = %branch, "no description yet, probing write access");
        self.set_description(branch, "")
            .map_err(|detail| StoreError::PermissionDenied {
                branch: branch.to_string(),
                detail,
            })?;
        Ok(String::new())
    }

    fn write_description(&self, branch: &BranchName, text: &str) -> Result<(), StoreError> {
        self.set_description(branch, text)
            .map_err(|detail| StoreError::Write {
                branch: branch.to_string(),
                detail,
            })
    }
}
