//! Git access for target repositories.
//!
//! The sync engine only talks to the [`VersionControl`] capability. [`GitCli`]
//! implements it by shelling out to the `git` binary through a
//! [`CommandRunner`]; credentials come from the ambient git configuration.

use std::path::{Path, PathBuf};

use crate::util::process::{CommandRunner, ProcessBuilder, ProcessError};

/// Version control operations needed to publish generated code.
pub trait VersionControl: Send + Sync {
    /// Clone `url` into the existing, empty directory `dest`.
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), ProcessError>;

    /// Stage every change in the working tree, including deletions.
    fn add_all(&self, repo: &Path) -> Result<(), ProcessError>;

    /// Commit staged changes.
    fn commit(&self, repo: &Path, message: &str) -> Result<(), ProcessError>;

    /// Abbreviated hash of the most recent commit, trimmed.
    fn short_hash(&self, repo: &Path) -> Result<String, ProcessError>;

    /// Create an annotated tag on HEAD.
    fn tag(&self, repo: &Path, name: &str, message: &str) -> Result<(), ProcessError>;

    /// Push the current branch to `branch` on `remote`.
    fn push(&self, repo: &Path, remote: &str, branch: &str) -> Result<(), ProcessError>;
}

/// [`VersionControl`] backed by the git command line client.
pub struct GitCli<'a> {
    program: PathBuf,
    runner: &'a dyn CommandRunner,
}

impl<'a> GitCli<'a> {
    pub fn new(program: impl Into<PathBuf>, runner: &'a dyn CommandRunner) -> Self {
        GitCli {
            program: program.into(),
            runner,
        }
    }

    // Prompting for credentials would block the run forever.
    fn git(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.program).env("GIT_TERMINAL_PROMPT", "0")
    }

    fn git_in(&self, repo: &Path) -> ProcessBuilder {
        self.git().arg("-C").arg(repo)
    }
}

impl VersionControl for GitCli<'_> {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), ProcessError> {
        tracing::info!("Cloning {}", url);
        let cmd = self.git().arg("clone").arg(url).arg(dest);
        self.runner.run_checked(&cmd).map(drop)
    }

    fn add_all(&self, repo: &Path) -> Result<(), ProcessError> {
        let cmd = self.git_in(repo).args(["add", "-A", "."]);
        self.runner.run_checked(&cmd).map(drop)
    }

    fn commit(&self, repo: &Path, message: &str) -> Result<(), ProcessError> {
        let cmd = self.git_in(repo).args(["commit", "-m", message]);
        self.runner.run_checked(&cmd).map(drop)
    }

    fn short_hash(&self, repo: &Path) -> Result<String, ProcessError> {
        let cmd = self.git_in(repo).args(["log", "--pretty=%h", "-1"]);
        let output = self.runner.run_checked(&cmd)?;
        Ok(output.output.trim().to_string())
    }

    fn tag(&self, repo: &Path, name: &str, message: &str) -> Result<(), ProcessError> {
        let cmd = self
            .git_in(repo)
            .args(["tag", "-a", name, "-m", message]);
        self.runner.run_checked(&cmd).map(drop)
    }

    fn push(&self, repo: &Path, remote: &str, branch: &str) -> Result<(), ProcessError> {
        let cmd = self
            .git_in(repo)
            .args(["push", "--follow-tags", remote, branch]);
        self.runner.run_checked(&cmd).map(drop)
    }
}
