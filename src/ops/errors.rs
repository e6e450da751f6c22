//! Deployment error types and diagnostics.

use std::io;

use thiserror::Error;

use crate::core::{DescriptorError, DiscoveryError};
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::process::ProcessError;

/// Failure of one sync session. Fatal to that (package, target) pair only.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("language `{language}` is not supported")]
    UnsupportedLanguage { language: String },

    #[error("repository `{repository}` {problem}")]
    InvalidRepository {
        repository: String,
        problem: &'static str,
    },

    #[error("failed to create a temporary clone directory")]
    Workspace(#[source] io::Error),

    #[error("failed to clone {url}")]
    Clone {
        url: String,
        #[source]
        source: ProcessError,
    },

    #[error("failed to reset the clone of {url}")]
    Reset {
        url: String,
        #[source]
        source: io::Error,
    },

    #[error("protoc failed for `{proto}`")]
    Generation {
        proto: String,
        #[source]
        source: ProcessError,
    },

    #[error("failed to stage generated files")]
    Add(#[source] ProcessError),

    #[error("failed to read back the commit hash")]
    RevisionLookup {
        #[source]
        source: Option<ProcessError>,
    },

    #[error("failed to tag revision {revision}")]
    Tag {
        revision: String,
        #[source]
        source: ProcessError,
    },

    #[error("failed to push {revision} to {url}")]
    Push {
        revision: String,
        url: String,
        #[source]
        source: ProcessError,
    },
}

impl SyncError {
    /// Short name of the step that failed.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::UnsupportedLanguage { .. } => "language",
            SyncError::InvalidRepository { .. } => "repository",
            SyncError::Workspace(_) => "workspace",
            SyncError::Clone { .. } => "clone",
            SyncError::Reset { .. } => "reset",
            SyncError::Generation { .. } => "generate",
            SyncError::Add(_) => "add",
            SyncError::RevisionLookup { .. } => "revision",
            SyncError::Tag { .. } => "tag",
            SyncError::Push { .. } => "push",
        }
    }

    fn process_error(&self) -> Option<&ProcessError> {
        match self {
            SyncError::Clone { source, .. }
            | SyncError::Generation { source, .. }
            | SyncError::Add(source)
            | SyncError::Tag { source, .. }
            | SyncError::Push { source, .. } => Some(source),
            SyncError::RevisionLookup { source } => source.as_ref(),
            _ => None,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.to_string());

        match self.process_error() {
            Some(err) => {
                diag = diag.with_context(err.to_string());
                if let Some(output) = err.output() {
                    diag = diag.with_output(output);
                }
                if matches!(err, ProcessError::Spawn { .. }) {
                    diag = diag.with_suggestion(suggestions::TOOL_MISSING);
                }
            }
            None => {
                if let SyncError::Workspace(err) | SyncError::Reset { source: err, .. } = self {
                    diag = diag.with_context(err.to_string());
                }
            }
        }

        match self {
            SyncError::UnsupportedLanguage { .. } => {
                diag.with_suggestion(suggestions::UNSUPPORTED_LANGUAGE)
            }
            SyncError::InvalidRepository { .. } => {
                diag.with_suggestion(suggestions::BAD_REPOSITORY)
            }
            SyncError::Clone { .. } => diag.with_suggestion(suggestions::CLONE_FAILED),
            SyncError::Push { .. } => diag.with_suggestion(suggestions::PUSH_FAILED),
            _ => diag,
        }
    }
}

/// Any failure the orchestrator isolates to a single directory or target.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl DeployError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            DeployError::Sync(err) => err.to_diagnostic(),
            DeployError::Descriptor(DescriptorError::Parse { source, .. }) => {
                Diagnostic::error(self.to_string())
                    .with_context(source.to_string())
                    .with_suggestion(suggestions::BAD_DESCRIPTOR)
            }
            DeployError::Descriptor(DescriptorError::Read { source, .. }) => {
                Diagnostic::error(self.to_string()).with_context(source.to_string())
            }
            DeployError::Discovery(err) => {
                let diag = Diagnostic::error(self.to_string());
                match std::error::Error::source(err) {
                    Some(source) => diag.with_context(source.to_string()),
                    None => diag,
                }
            }
        }
    }
}
