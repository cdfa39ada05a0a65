#![doc = include_str!("../README.md")]

mod command;
mod libgit2;

pub use command::GitCli;
pub use libgit2::LibGit2Store;

use branchtodo::DescriptionStore;
use std::path::PathBuf;

// ============================================================================
// Configuration
// ============================================================================

/// Which implementation talks to the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Run the `git` executable.
    #[default]
    Cli,
    /// Use libgit2 in-process.
    LibGit2,
}

/// Configuration for opening a description store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Any directory inside the repository.
    pub workdir: PathBuf,
    pub backend: Backend,
    /// Executable used by [`Backend::Cli`].
    pub git_binary: PathBuf,
}

impl StoreConfig {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            backend: Backend::default(),
            git_binary: PathBuf::from("git"),
        }
    }

    /// Build the configured store.
    pub fn open(&self) -> Box<dyn DescriptionStore> {
        match self.backend {
            Backend::Cli => Box::new(
                GitCli::new(self.workdir.clone()).with_git_binary(self.git_binary.clone()),
            ),
            Backend::LibGit2 => Box::new(LibGit2Store::new(self.workdir.clone())),
        }
    }
}
