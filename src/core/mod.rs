//! Core data structures.
//!
//! - Package descriptors and language targets (`.proto.yaml`)
//! - Discovery of candidate package directories
//! - Package units handed to the sync engine

pub mod descriptor;
pub mod discovery;
pub mod package;

pub use descriptor::{DescriptorError, Language, LanguageTarget, PackageDescriptor};
pub use discovery::{CandidateDir, DiscoveryError, PackageDiscovery};
pub use package::PackageUnit;
