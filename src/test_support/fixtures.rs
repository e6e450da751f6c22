//! Test fixtures for proto monorepos.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::core::{CandidateDir, LanguageTarget, PackageDescriptor, PackageUnit};
use crate::util::config::DESCRIPTOR_FILE_NAME;

/// A proto monorepo laid out in a temporary directory.
#[derive(Debug)]
pub struct MonorepoFixture {
    root: TempDir,
}

impl MonorepoFixture {
    /// Create an empty monorepo.
    pub fn new() -> Self {
        MonorepoFixture {
            root: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Create a directory without a descriptor.
    pub fn dir(&self, name: &str) -> PathBuf {
        let path = self.root().join(name);
        std::fs::create_dir_all(&path).expect("failed to create dir");
        path
    }

    /// Create a package directory with the given descriptor text and
    /// (empty-bodied) proto files.
    pub fn package(&self, name: &str, descriptor: &str, protos: &[&str]) -> PathBuf {
        let path = self.dir(name);
        std::fs::write(path.join(DESCRIPTOR_FILE_NAME), descriptor)
            .expect("failed to write descriptor");
        for proto in protos {
            std::fs::write(path.join(proto), minimal_proto(name))
                .expect("failed to write proto");
        }
        path
    }
}

impl Default for MonorepoFixture {
    fn default() -> Self {
        MonorepoFixture::new()
    }
}

/// Descriptor text with one target per `(language, repository)` pair.
pub fn descriptor(targets: &[(&str, &str)]) -> String {
    let mut text = String::from("languages:\n");
    for (language, repository) in targets {
        text.push_str(&format!(
            "  - language: {}\n    repository: {}\n",
            language, repository
        ));
    }
    text
}

/// Descriptor text with a Go target for each repository.
pub fn go_descriptor(repositories: &[&str]) -> String {
    let targets: Vec<_> = repositories.iter().map(|repo| ("go", *repo)).collect();
    descriptor(&targets)
}

/// A package unit that does not exist on disk.
pub fn package_unit(name: &str, protos: &[&str], targets: Vec<LanguageTarget>) -> PackageUnit {
    PackageUnit::new(
        CandidateDir {
            name: name.to_string(),
            path: PathBuf::from("/repo").join(name),
            proto_files: protos.iter().map(|p| p.to_string()).collect(),
        },
        PackageDescriptor { languages: targets },
    )
}

/// A minimal proto3 file.
pub fn minimal_proto(package: &str) -> String {
    format!(
        r#"syntax = "proto3";

package {package};

message Ping {{
  string id = 1;
}}
"#
    )
}
