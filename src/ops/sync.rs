//! Repository sync engine.
//!
//! Publishes one language target of one package:
//!
//! 1. create a temporary directory
//! 2. clone the target repository into it
//! 3. remove everything except the preserved entries (README, LICENSE, .git)
//! 4. run protoc for every proto file of the package
//! 5. stage all changes
//! 6. commit; a failed commit means there was nothing to commit
//! 7. read back the short hash
//! 8. tag the commit with that hash
//! 9. push to the configured branch
//! 10. remove the temporary directory
//!
//! Every external call is attempted once. The temporary directory is owned by
//! a [`SyncSession`] and released on every exit path.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::builder::ProtocGenerator;
use crate::core::{LanguageTarget, PackageUnit};
use crate::ops::errors::SyncError;
use crate::sources::VersionControl;
use crate::util::config::COMMIT_MESSAGE;
use crate::util::fs::reset_dir_except;
use crate::util::DeployConfig;

/// Remote that clones are pushed back to.
const REMOTE_NAME: &str = "origin";

/// Result of the commit step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A commit was created; holds its short hash.
    Committed(String),

    /// The commit command failed. This is read as "no changes", although
    /// other causes (e.g. missing author identity) end up here as well;
    /// `reason` keeps the tool output so they can be told apart.
    NothingToCommit { reason: String },
}

/// Terminal state of a successful sync session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// New code was committed, tagged and pushed.
    Deployed { revision: String, remote: String },

    /// Generated output matched the repository; nothing was pushed.
    NothingToCommit,
}

/// Working state of one sync: the temporary clone and, once committed, the
/// revision. Dropping the session removes the directory.
#[derive(Debug)]
pub struct SyncSession {
    dir: TempDir,
    revision: Option<String>,
}

impl SyncSession {
    /// Create a uniquely named directory under `parent` (or the system temp
    /// directory).
    pub fn create(prefix: &str, parent: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix);
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };

        Ok(SyncSession {
            dir,
            revision: None,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// Remove the directory, reporting failures instead of ignoring them.
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}

/// Runs sync sessions for (package, language target) pairs.
pub struct SyncEngine<'a> {
    config: &'a DeployConfig,
    vcs: &'a dyn VersionControl,
    generator: ProtocGenerator<'a>,
    prefix: String,
    temp_root: Option<PathBuf>,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        config: &'a DeployConfig,
        vcs: &'a dyn VersionControl,
        generator: ProtocGenerator<'a>,
    ) -> Self {
        SyncEngine {
            config,
            vcs,
            generator,
            prefix: "protodeploy-".to_string(),
            temp_root: None,
        }
    }

    /// Prefix for temporary clone directory names.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Create temporary clones under `dir` instead of the system temp dir.
    pub fn with_temp_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(dir.into());
        self
    }

    /// Regenerate and publish `target` for `unit`.
    pub fn sync(
        &self,
        unit: &PackageUnit,
        target: &LanguageTarget,
    ) -> Result<SyncOutcome, SyncError> {
        if !self.generator.supports(&target.language) {
            return Err(SyncError::UnsupportedLanguage {
                language: target.language.to_string(),
            });
        }
        if let Some(problem) = target.repository_problem() {
            return Err(SyncError::InvalidRepository {
                repository: target.repository.clone(),
                problem,
            });
        }

        let mut session = SyncSession::create(&self.prefix, self.temp_root.as_deref())
            .map_err(SyncError::Workspace)?;
        tracing::debug!("Working in {}", session.path().display());

        let result = self.run_session(&mut session, unit, target);

        let path = session.path().to_path_buf();
        if let Err(e) = session.close() {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
        }

        result
    }

    fn run_session(
        &self,
        session: &mut SyncSession,
        unit: &PackageUnit,
        target: &LanguageTarget,
    ) -> Result<SyncOutcome, SyncError> {
        let url = target.remote_url();
        let dir = session.path().to_path_buf();

        self.vcs
            .clone_repo(&url, &dir)
            .map_err(|source| SyncError::Clone {
                url: url.clone(),
                source,
            })?;

        let removed = reset_dir_except(&dir, |name| self.config.is_preserved_entry(name))
            .map_err(|source| SyncError::Reset {
                url: url.clone(),
                source,
            })?;
        if !removed.is_empty() {
            tracing::debug!("Reset removed {}", removed.join(", "));
        }

        for proto in unit.proto_paths() {
            self.generator
                .generate(&target.language, &dir, &proto)
                .map_err(|source| SyncError::Generation {
                    proto: proto.display().to_string(),
                    source,
                })?;
        }

        self.vcs.add_all(&dir).map_err(SyncError::Add)?;

        let revision = match self.commit(&dir)? {
            CommitOutcome::Committed(revision) => revision,
            CommitOutcome::NothingToCommit { reason } => {
                tracing::info!("Nothing to commit for {}", url);
                if !reason.is_empty() {
                    tracing::debug!("Commit declined: {}", reason.trim_end());
                }
                return Ok(SyncOutcome::NothingToCommit);
            }
        };
        session.revision = Some(revision.clone());

        self.vcs
            .tag(&dir, &revision, COMMIT_MESSAGE)
            .map_err(|source| SyncError::Tag {
                revision: revision.clone(),
                source,
            })?;

        tracing::info!("Deploying {} to {}", revision, url);
        self.vcs
            .push(&dir, REMOTE_NAME, &self.config.branch)
            .map_err(|source| SyncError::Push {
                revision: revision.clone(),
                url: url.clone(),
                source,
            })?;

        Ok(SyncOutcome::Deployed {
            revision,
            remote: url,
        })
    }

    /// Commit staged changes and resolve the new revision.
    pub fn commit(&self, dir: &Path) -> Result<CommitOutcome, SyncError> {
        if let Err(err) = self.vcs.commit(dir, COMMIT_MESSAGE) {
            let reason = err
                .output()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Ok(CommitOutcome::NothingToCommit { reason });
        }

        let revision = self
            .vcs
            .short_hash(dir)
            .map_err(|source| SyncError::RevisionLookup {
                source: Some(source),
            })?;
        if revision.is_empty() {
            return Err(SyncError::RevisionLookup { source: None });
        }

        Ok(CommitOutcome::Committed(revision))
    }
}
