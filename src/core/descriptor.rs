//! `.proto.yaml` package descriptors.
//!
//! A descriptor names the language targets a package is generated for:
//!
//! ```yaml
//! languages:
//!   - language: go
//!     repository: github.com/acme/greeter-go
//! ```
//!
//! The file's presence is what makes a directory a package. A missing file
//! is not an error; a malformed one is.

use std::fmt;
use std::io;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::util::config::DESCRIPTOR_FILE_NAME;

/// Error loading a package descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to read {DESCRIPTOR_FILE_NAME} in `{dir}`")]
    Read {
        dir: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {DESCRIPTOR_FILE_NAME} in `{dir}`: {source}")]
    Parse {
        dir: String,
        #[source]
        source: serde_yaml_ng::Error,
    },
}

/// Output language of a target.
///
/// Unknown tags are kept verbatim so the descriptor still parses; the sync
/// engine rejects them per target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum Language {
    Go,
    Other(String),
}

impl Language {
    pub fn as_str(&self) -> &str {
        match self {
            Language::Go => "go",
            Language::Other(tag) => tag,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Language::Other(_))
    }
}

impl From<String> for Language {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "go" => Language::Go,
            _ => Language::Other(tag),
        }
    }
}

impl From<&str> for Language {
    fn from(tag: &str) -> Self {
        Language::from(tag.to_string())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (language, destination repository) pair of a package.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LanguageTarget {
    pub language: Language,

    /// Host and path of the repository, without scheme or `.git` suffix
    /// (e.g. `github.com/acme/greeter-go`).
    pub repository: String,
}

impl LanguageTarget {
    pub fn new(language: impl Into<Language>, repository: impl Into<String>) -> Self {
        LanguageTarget {
            language: language.into(),
            repository: repository.into(),
        }
    }

    /// Canonical clone/push URL of the target repository.
    pub fn remote_url(&self) -> String {
        format!("https://{}.git", self.repository)
    }

    /// Why `repository` cannot be turned into a remote URL, if it cannot.
    ///
    /// The slug must be a bare host and path: no scheme, no `.git` suffix.
    pub fn repository_problem(&self) -> Option<&'static str> {
        let repository = self.repository.trim();
        if repository.is_empty() {
            Some("is empty")
        } else if repository.contains("://") {
            Some("includes a URL scheme")
        } else if repository.ends_with(".git") {
            Some("ends with `.git`")
        } else {
            None
        }
    }
}

/// Parsed contents of a `.proto.yaml` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageDescriptor {
    /// Targets in file order. Duplicates are kept.
    #[serde(default)]
    pub languages: Vec<LanguageTarget>,
}

impl PackageDescriptor {
    /// Parse descriptor text. `dir` only labels errors.
    pub fn parse(dir: &str, contents: &str) -> Result<Self, DescriptorError> {
        if contents.trim().is_empty() {
            return Ok(PackageDescriptor::default());
        }

        serde_yaml_ng::from_str(contents).map_err(|source| DescriptorError::Parse {
            dir: dir.to_string(),
            source,
        })
    }

    /// Load the descriptor of the package directory `dir`.
    ///
    /// Returns `Ok(None)` when the directory has no descriptor file, meaning
    /// it is not a package.
    pub fn load(dir: &Path) -> Result<Option<Self>, DescriptorError> {
        let label = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());

        let contents = match std::fs::read_to_string(dir.join(DESCRIPTOR_FILE_NAME)) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(DescriptorError::Read { dir: label, source }),
        };

        Self::parse(&label, &contents).map(Some)
    }

    pub fn targets(&self) -> &[LanguageTarget] {
        &self.languages
    }
}
