use branchtodo::{BranchName, DescriptionStore, StoreError};
use git2::Repository;
use std::path::{Path, PathBuf};
use tracing::debug;

/// [`DescriptionStore`] backed by libgit2, with no external process.
///
/// The repository is discovered from `workdir` on every call, so the store
/// holds no open handles between operations.
#[derive(Debug, Clone)]
pub struct LibGit2Store {
    workdir: PathBuf,
}

impl LibGit2Store {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn open(&self) -> Result<Repository, StoreError> {
        Repository::discover(&self.workdir).map_err(|e| {
            debug!(workdir = %self.workdir.display(), error = %e, "repository discovery failed");
            StoreError::NotARepository {
                path: self.workdir.clone(),
            }
        })
    }

    fn set_description(&self, branch: &BranchName, text: &str) -> Result<(), String> {
        let repo = self.open().map_err(|e| e.to_string())?;
        let mut config = repo.config().map_err(|e| e.message().to_string())?;
        config
            .set_str(&branch.description_key(), text)
            .map_err(|e| e.message().to_string())
    }
}

impl DescriptionStore for LibGit2Store {
    fn resolve_current_branch(&self) -> Result<BranchName, StoreError> {
        let repo = self.open()?;
        let head = repo
            .find_reference("HEAD")
            .map_err(|e| StoreError::BranchLookup(e.message().to_string()))?;

        // An unborn branch still has a symbolic HEAD.
        let target = head.symbolic_target().ok_or(StoreError::DetachedHead)?;
        let name = target
            .strip_prefix("refs/heads/")
            .ok_or(StoreError::DetachedHead)?;
        BranchName::parse(name)
    }

    fn read_description(&self, branch: &BranchName) -> Result<String, StoreError> {
        let repo = self.open()?;
        let key = branch.description_key();

        if let Ok(config) = repo.config() {
            match config.get_entry(&key) {
                Ok(entry) => {
                    return entry.value().map(str::to_string).ok_or_else(|| {
                        StoreError::NotUtf8 {
                            branch: branch.to_string(),
                        }
                    });
                }
                Err(e) => debug!(branch = %branch, error = %e, "no description yet"),
            }
        }

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
