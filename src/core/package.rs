//! Package units - a descriptor together with the directory it lives in.

use std::path::{Path, PathBuf};

use crate::core::descriptor::{LanguageTarget, PackageDescriptor};
use crate::core::discovery::CandidateDir;

/// A package directory that has a valid descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageUnit {
    /// Parsed `.proto.yaml`
    descriptor: PackageDescriptor,

    /// Directory name relative to the root (e.g. `greeter`)
    directory_name: String,

    /// Absolute path of the package directory
    path: PathBuf,

    /// `.proto` file names inside the directory
    proto_files: Vec<String>,
}

impl PackageUnit {
    pub fn new(candidate: CandidateDir, descriptor: PackageDescriptor) -> Self {
        PackageUnit {
            descriptor,
            directory_name: candidate.name,
            path: candidate.path,
            proto_files: candidate.proto_files,
        }
    }

    pub fn descriptor(&self) -> &PackageDescriptor {
        &self.descriptor
    }

    pub fn targets(&self) -> &[LanguageTarget] {
        self.descriptor.targets()
    }

    pub fn directory_name(&self) -> &str {
        &self.directory_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn proto_files(&self) -> &[String] {
        &self.proto_files
    }

    /// Proto paths relative to the monorepo root, as passed to the generator
    /// (e.g. `greeter/greeter.proto`).
    pub fn proto_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.proto_files
            .iter()
            .map(|file| Path::new(&self.directory_name).join(file))
    }
}
