//! Package discovery.
//!
//! Walks the immediate subdirectories of the monorepo root, skipping the
//! configured ignore set, and lists the `.proto` files directly inside each
//! one. Whether a directory is actually a package is decided later by its
//! descriptor.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::util::DeployConfig;

/// Error enumerating the monorepo.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The root itself cannot be read. Fatal to the run.
    #[error("failed to read root directory {}", .root.display())]
    ReadRoot {
        root: PathBuf,
        #[source]
        source: io::Error,
    },

    /// One directory cannot be listed. Only that directory is skipped.
    #[error("failed to list directory `{dir}`")]
    ListDir {
        dir: String,
        #[source]
        source: walkdir::Error,
    },
}

/// A non-ignored subdirectory of the root and its proto files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDir {
    /// Directory name relative to the root (e.g. `greeter`)
    pub name: String,

    /// Absolute path of the directory
    pub path: PathBuf,

    /// `.proto` files directly inside the directory, sorted by name
    pub proto_files: Vec<String>,
}

/// Scans a monorepo root for candidate package directories.
#[derive(Debug)]
pub struct PackageDiscovery<'a> {
    root: PathBuf,
    config: &'a DeployConfig,
}

impl<'a> PackageDiscovery<'a> {
    pub fn new(root: impl Into<PathBuf>, config: &'a DeployConfig) -> Self {
        PackageDiscovery {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start scanning.
    ///
    /// Fails only if the root cannot be read. The returned iterator is lazy:
    /// proto files of a directory are listed when that directory is reached.
    pub fn scan(&self) -> Result<DiscoveredDirs<'a>, DiscoveryError> {
        std::fs::read_dir(&self.root).map_err(|source| DiscoveryError::ReadRoot {
            root: self.root.clone(),
            source,
        })?;

        let entries = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter();

        Ok(DiscoveredDirs {
            entries,
            config: self.config,
        })
    }
}

/// Lazy, single-pass sequence of candidate directories.
pub struct DiscoveredDirs<'a> {
    entries: walkdir::IntoIter,
    config: &'a DeployConfig,
}

impl Iterator for DiscoveredDirs<'_> {
    type Item = Result<CandidateDir, DiscoveryError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(source) => {
                    let dir = source
                        .path()
                        .and_then(Path::file_name)
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    return Some(Err(DiscoveryError::ListDir { dir, source }));
                }
            };

            // Symlinks are not followed, so a linked directory is skipped here.
            if !entry.file_type().is_dir() {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::warn!(
                    "Skipping directory with a non UTF-8 name: {}",
                    entry.path().display()
                );
                continue;
            };
            if self.config.is_ignored_dir(&name) {
                tracing::debug!("Skipping ignored directory `{}`", name);
                continue;
            }

            let item = match list_proto_files(entry.path()) {
                Ok(proto_files) => Ok(CandidateDir {
                    name,
                    path: entry.path().to_path_buf(),
                    proto_files,
                }),
                Err(source) => Err(DiscoveryError::ListDir { dir: name, source }),
            };

            return Some(item);
        }
    }
}

/// Regular files with a `.proto` extension directly inside `dir`, sorted.
///
/// Names that are not valid UTF-8 are skipped with a warning.
pub fn list_proto_files(dir: &Path) -> Result<Vec<String>, walkdir::Error> {
    let mut protos = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.path().extension() != Some(OsStr::new("proto")) {
            continue;
        }
        match entry.file_name().to_str() {
            Some(name) => protos.push(name.to_string()),
            None => tracing::warn!(
                "Skipping proto file with a non UTF-8 name: {}",
                entry.path().display()
            ),
        }
    }

    Ok(protos)
}
