//! protodeploy - publishes generated protobuf bindings from a proto monorepo.
//!
//! Every top-level directory of the monorepo that contains a `.proto.yaml`
//! descriptor is a package. For each language target it declares, the
//! target repository is cloned, its generated contents are replaced with
//! fresh protoc output, and the result is committed, tagged and pushed.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test doubles for the process gateway and version control.
///
/// Only compiled for unit tests.
#[cfg(test)]
pub mod test_support;

pub use core::{Language, LanguageTarget, PackageDescriptor, PackageDiscovery, PackageUnit};
pub use ops::{deploy, DeployReport, SyncEngine, SyncOutcome};
pub use util::DeployConfig;
