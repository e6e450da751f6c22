//! Target repository access.
//!
//! Generated code is published to independently versioned repositories;
//! this module wraps the version control tool used to reach them.

pub mod git;

pub use git::{GitCli, VersionControl};
