//! High-level operations.
//!
//! The sync engine publishes a single language target; the deployer runs it
//! for every package found under the root.

pub mod deploy;
pub mod errors;
pub mod sync;

pub use deploy::{deploy, preflight, DeployReport, Deployer, UnitReport};
pub use errors::{DeployError, SyncError};
pub use sync::{CommitOutcome, SyncEngine, SyncOutcome, SyncSession};
