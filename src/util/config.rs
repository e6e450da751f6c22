//! Deployment configuration.
//!
//! A [`DeployConfig`] is built once at startup and passed by reference to
//! discovery, the reset step and the tool wrappers. Defaults reproduce the
//! fixed behaviour of a proto monorepo deploy; an optional `protodeploy.toml`
//! in the root directory can adjust tool locations, the push branch and the
//! parallelism, and can extend the ignore/keep sets.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Name of the optional configuration file looked up in the root directory.
pub const CONFIG_FILE_NAME: &str = "protodeploy.toml";

/// Name of the per-package descriptor file.
pub const DESCRIPTOR_FILE_NAME: &str = ".proto.yaml";

/// Message used for every generated commit and annotated tag.
pub const COMMIT_MESSAGE: &str = "Automatically updated library from protorepo";

/// Root-level directories that are never treated as packages.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[".git", ".idea", "tools"];

/// Top-level entries of a cloned repository that survive the reset step.
pub const DEFAULT_PRESERVED_ENTRIES: &[&str] = &[
    "README",
    "README.md",
    "readme.md",
    "LICENSE",
    "license",
    ".git",
];

/// Immutable settings for one deployment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    /// Directories under the root that are skipped during discovery
    pub ignored_dirs: BTreeSet<String>,

    /// Clone entries kept when the working tree is reset
    pub preserved_entries: BTreeSet<String>,

    /// Code generator program
    pub generator: PathBuf,

    /// Version control program
    pub vcs: PathBuf,

    /// Remote branch that deployments are pushed to
    pub branch: String,

    /// Number of sync sessions run concurrently
    pub jobs: usize,
}

impl Default for DeployConfig {
    fn default() -> Self {
        DeployConfig {
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|s| s.to_string()).collect(),
            preserved_entries: DEFAULT_PRESERVED_ENTRIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            generator: PathBuf::from("protoc"),
            vcs: PathBuf::from("git"),
            branch: "master".to_string(),
            jobs: 1,
        }
    }
}

/// On-disk form of `protodeploy.toml`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Tool locations
    pub tools: ToolsConfig,

    /// Deployment settings
    pub deploy: DeploySettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// Path or name of the protoc binary
    pub protoc: Option<PathBuf>,

    /// Path or name of the git binary
    pub git: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeploySettings {
    /// Branch to push to
    pub branch: Option<String>,

    /// Parallel sync sessions
    pub jobs: Option<usize>,

    /// Additional root directories to skip
    pub ignore: Vec<String>,

    /// Additional clone entries to preserve on reset
    pub preserve: Vec<String>,
}

impl ConfigFile {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }
}

impl DeployConfig {
    /// Apply a parsed config file on top of this configuration.
    pub fn merge(mut self, file: ConfigFile) -> Result<Self> {
        if let Some(protoc) = file.tools.protoc {
            self.generator = protoc;
        }
        if let Some(git) = file.tools.git {
            self.vcs = git;
        }
        if let Some(branch) = file.deploy.branch {
            self.branch = branch;
        }
        if let Some(jobs) = file.deploy.jobs {
            self = self.with_jobs(jobs)?;
        }
        self.ignored_dirs.extend(file.deploy.ignore);
        self.preserved_entries.extend(file.deploy.preserve);

        if self.branch.trim().is_empty() {
            bail!("deploy.branch must not be empty");
        }

        Ok(self)
    }

    /// Set the number of concurrent sync sessions.
    pub fn with_jobs(mut self, jobs: usize) -> Result<Self> {
        if jobs == 0 {
            bail!("jobs must be at least 1");
        }
        self.jobs = jobs;
        Ok(self)
    }

    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignored_dirs.contains(name)
    }

    pub fn is_preserved_entry(&self, name: &str) -> bool {
        self.preserved_entries.contains(name)
    }
}

/// Load the configuration for a run.
///
/// An explicit path must exist. Without one, `protodeploy.toml` in `root` is
/// used when present, and the defaults otherwise.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<DeployConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let candidate = root.join(CONFIG_FILE_NAME);
            candidate.is_file().then_some(candidate)
        }
    };

    match path {
        Some(path) => {
            tracing::debug!("Loading configuration from {}", path.display());
            DeployConfig::default().merge(ConfigFile::load(&path)?)
        }
        None => Ok(DeployConfig::default()),
    }
}
