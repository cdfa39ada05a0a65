use crate::error::StoreError;
use crate::task::BranchName;

/// Read/write access to the one free-text field a version-control system
/// keeps per branch.
///
/// Implementations are blocking: each call may run an external command and
/// waits for it without a timeout.
pub trait DescriptionStore {
    /// Resolve the branch checked out in the working directory.
    ///
    /// Must verify the repository first and return
    /// [`StoreError::NotARepository`] without issuing any further command when
    /// that check fails. A HEAD that does not point at a named branch is
    /// [`StoreError::DetachedHead`].
    fn resolve_current_branch(&self) -> Result<BranchName, StoreError>;

    /// Return the stored description, or `""` when none exists yet.
    ///
    /// When no description exists, an empty one is written to prove the field
    /// is writable; a failed probe is [`StoreError::PermissionDenied`].
    fn read_description(&self, branch: &BranchName) -> Result<String, StoreError>;

    /// Replace the description with `text`.
    ///
    /// Always a full overwrite with last-write-wins semantics: there is no
    /// version check, so a concurrent writer's changes are silently replaced.
    /// Failures are reported as [`StoreError::Write`].
    fn write_description(&self, branch: &BranchName, text: &str) -> Result<(), StoreError>;
}

impl<S: DescriptionStore + ?Sized> DescriptionStore for &S {
    fn resolve_current_branch(&self) -> Result<BranchName, StoreError> {
        (**self).resolve_current_branch()
    }

    fn read_description(&self, branch: &BranchName) -> Result<String, StoreError> {
        (**self).read_description(branch)
    }

    fn write_description(&self, branch: &BranchName, text: &str) -> Result<(), StoreError> {
        (**self).write_description(branch, text)
    }
}

impl<S: DescriptionStore + ?Sized> DescriptionStore for Box<S> {
    fn resolve_current_branch(&self) -> Result<BranchName, StoreError> {
        (**self).resolve_current_branch()
    }

    fn read_description(&self, branch: &BranchName) -> Result<String, StoreError> {
        (**self).read_description(branch)
    }

    fn write_description(&self, branch: &BranchName, text: &str) -> Result<(), StoreError> {
        (**self).write_description(branch, text)
    }
}
